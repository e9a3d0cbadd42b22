use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::medication_history::{self, AdherenceStatus};
use crate::entities::prelude::MedicationHistory;

/// Filters for the history feed. All bounds are optional; the patient set
/// is how ownership scoping reaches this table.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub patient_ids: Vec<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AdherenceStatus>,
}

/// History rows newest-first: by date, then by scheduled clock time.
/// "HH:MM" strings sort the same as the times they name.
pub async fn query(
    db: &DatabaseConnection,
    filter: &HistoryFilter,
) -> Result<Vec<medication_history::Model>, DbErr> {
    if filter.patient_ids.is_empty() {
        return Ok(vec![]);
    }
    let mut select = MedicationHistory::find()
        .filter(medication_history::Column::PatientId.is_in(filter.patient_ids.iter().copied()));
    if let Some(start) = filter.start_date {
        select = select.filter(medication_history::Column::Date.gte(start));
    }
    if let Some(end) = filter.end_date {
        select = select.filter(medication_history::Column::Date.lte(end));
    }
    if let Some(status) = filter.status {
        select = select.filter(medication_history::Column::Status.eq(status));
    }
    select
        .order_by_desc(medication_history::Column::Date)
        .order_by_desc(medication_history::Column::ScheduledTime)
        .all(db)
        .await
}
