use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait, Set,
};
use serde_json::json;
use std::sync::Arc;
use tracing::field::display;
use uuid::Uuid;

use crate::api::patients::PatientResponse;
use crate::entities::patient::{self, PatientStatus};
use crate::store;

/// Pending bot registrations, newest first. The approval page polls this
/// every ten seconds; the server keeps no state about that cadence.
pub async fn list_pending_patients(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    match store::patients::list_pending(&db).await {
        Ok(patients) => {
            let body: Vec<PatientResponse> = patients.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// pending -> active. Requires a linked messaging account: without a
/// telegram id the reminder bot could never reach the patient, so the
/// transition is refused. Activating an already-active patient is a
/// no-op success.
pub async fn activate_patient(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(patient_id): Path<Uuid>,
) -> Response {
    let existing = match patient::Entity::find_by_id(patient_id).one(&*db).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Patient not found"})),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    if existing.status == PatientStatus::Active {
        return (StatusCode::OK, Json(PatientResponse::from(existing))).into_response();
    }

    if existing.telegram_id.is_none() {
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": "Patient has no linked messaging account"})),
        )
            .into_response();
    }

    let mut active_patient = existing.into_active_model();
    active_patient.status = Set(PatientStatus::Active);
    active_patient.updated_at = Set(chrono::Utc::now().naive_utc());

    match active_patient.update(&*db).await {
        Ok(p) => {
            tracing::Span::current()
                .record("table", "patients")
                .record("action", "activate_patient")
                .record("patient_id", display(p.id))
                .record("business_event", "Patient activated");

            crate::metrics::increment_patients_activated();

            (StatusCode::OK, Json(PatientResponse::from(p))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Approval rejection: pending -> deleted. Active patients are not
/// touchable from here.
pub async fn reject_patient(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(patient_id): Path<Uuid>,
) -> Response {
    let existing = match patient::Entity::find_by_id(patient_id).one(&*db).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Patient not found"})),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    if existing.status != PatientStatus::Pending {
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": "Only pending patients can be rejected"})),
        )
            .into_response();
    }

    match existing.delete(&*db).await {
        Ok(_) => {
            tracing::Span::current()
                .record("table", "patients")
                .record("action", "reject_patient")
                .record("patient_id", display(patient_id))
                .record("business_event", "Pending registration rejected");

            (
                StatusCode::OK,
                Json(json!({"message": "Registration rejected"})),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
