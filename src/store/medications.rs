use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::medication;
use crate::entities::prelude::Medication;

/// Active medications for the given patients, ordered by name. Archived
/// rows stay out of every listing.
pub async fn list_active(
    db: &DatabaseConnection,
    patient_ids: Vec<Uuid>,
) -> Result<Vec<medication::Model>, DbErr> {
    if patient_ids.is_empty() {
        return Ok(vec![]);
    }
    Medication::find()
        .filter(medication::Column::PatientId.is_in(patient_ids))
        .filter(medication::Column::Active.eq(true))
        .order_by_asc(medication::Column::Name)
        .all(db)
        .await
}

/// Medication lookup gated by ownership of its patient.
pub async fn find_owned(
    db: &DatabaseConnection,
    organization_id: Uuid,
    medication_id: Uuid,
) -> Result<Option<medication::Model>, DbErr> {
    let Some(med) = Medication::find_by_id(medication_id).one(db).await? else {
        return Ok(None);
    };
    match super::patients::find_owned(db, organization_id, med.patient_id).await? {
        Some(_) => Ok(Some(med)),
        None => Ok(None),
    }
}
