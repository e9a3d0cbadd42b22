use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entities::patient::PatientStatus;
use crate::entities::{medication, medication_history, patient, user};

pub async fn init_metrics(db: &DatabaseConnection) {
    let user_count = user::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("cuidamed_users_total").set(user_count as f64);

    let patient_count = patient::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("cuidamed_patients_total").set(patient_count as f64);

    let pending_count = patient::Entity::find()
        .filter(patient::Column::Status.eq(PatientStatus::Pending))
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("cuidamed_pending_patients_total").set(pending_count as f64);

    let medication_count = medication::Entity::find()
        .filter(medication::Column::Active.eq(true))
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("cuidamed_active_medications_total").set(medication_count as f64);

    let history_count = medication_history::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("cuidamed_history_rows_total").set(history_count as f64);

    tracing::info!(
        "Initialized metrics: Users={}, Patients={} ({} pending), Medications={}, History={}",
        user_count,
        patient_count,
        pending_count,
        medication_count,
        history_count
    );
}

pub fn increment_registrations() {
    metrics::counter!("cuidamed_registrations_total").increment(1);
}

/// `path` is "linked" when enrolment matched a pending bot registration,
/// "created" when a fresh pending row was inserted.
pub fn increment_patients_enrolled(path: &str) {
    metrics::counter!("cuidamed_patients_enrolled_total", "path" => path.to_string()).increment(1);
}

pub fn increment_patients_activated() {
    metrics::counter!("cuidamed_patients_activated_total").increment(1);
}

pub fn increment_medications_archived() {
    metrics::counter!("cuidamed_medications_archived_total").increment(1);
}
