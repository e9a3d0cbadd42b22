use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::entities::prelude::WhatsappLog;
use crate::entities::whatsapp_log;

/// The log viewer shows the latest page only; the worker keeps writing.
pub const RECENT_LOG_LIMIT: u64 = 50;

/// Latest conversation rows for the given patients. Rows whose patient was
/// deleted keep a null patient_id and stay visible to everyone.
pub async fn recent_for_patients(
    db: &DatabaseConnection,
    patient_ids: Vec<Uuid>,
) -> Result<Vec<whatsapp_log::Model>, DbErr> {
    if patient_ids.is_empty() {
        return Ok(vec![]);
    }
    WhatsappLog::find()
        .filter(
            Condition::any()
                .add(whatsapp_log::Column::PatientId.is_in(patient_ids))
                .add(whatsapp_log::Column::PatientId.is_null()),
        )
        .order_by_desc(whatsapp_log::Column::SentAt)
        .limit(RECENT_LOG_LIMIT)
        .all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::whatsapp_log::{MessageStatus, MessageType};
    use sea_orm::{ActiveEnum, DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn no_patients_means_no_log_fetch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let logs = recent_for_patients(&db, vec![]).await.unwrap();
        assert!(logs.is_empty());
        assert!(db.into_transaction_log().is_empty());
    }

    /// The bot and the dashboard agree on these words; neither side remaps
    /// them in transit.
    #[test]
    fn conversation_vocabulary_uses_the_stored_words() {
        let types = [MessageType::System, MessageType::User, MessageType::Caregiver];
        assert_eq!(
            types.map(|t| t.to_value()),
            ["system", "user", "caregiver"].map(String::from)
        );
        assert_eq!(
            types.map(|t| serde_json::to_value(t).unwrap()),
            ["system", "user", "caregiver"].map(serde_json::Value::from)
        );

        let statuses = [
            MessageStatus::Pending,
            MessageStatus::Delivered,
            MessageStatus::Read,
            MessageStatus::Failed,
            MessageStatus::Error,
            MessageStatus::Success,
            MessageStatus::Alert,
        ];
        assert_eq!(
            statuses.map(|s| s.to_value()),
            ["pending", "delivered", "read", "failed", "error", "success", "alert"]
                .map(String::from)
        );
        assert_eq!(
            statuses.map(|s| serde_json::to_value(s).unwrap()),
            ["pending", "delivered", "read", "failed", "error", "success", "alert"]
                .map(serde_json::Value::from)
        );
    }
}
