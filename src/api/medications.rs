use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set,
};
use serde_json::json;
use std::sync::Arc;
use tracing::field::display;
use uuid::Uuid;

use crate::entities::medication;
use crate::store;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub times: Vec<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

impl From<medication::Model> for MedicationResponse {
    fn from(m: medication::Model) -> Self {
        Self {
            id: m.id,
            patient_id: m.patient_id,
            name: m.name,
            dosage: m.dosage,
            frequency: m.frequency,
            times: m.times,
            active: m.active,
            created_at: m.created_at,
        }
    }
}

#[derive(serde::Deserialize)]
pub struct MedicationListParams {
    patient_id: Option<Uuid>,
}

pub async fn list_medications(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<MedicationListParams>,
) -> Response {
    let patient_ids = if let Some(patient_id) = params.patient_id {
        match store::patients::find_owned(&db, user_id, patient_id).await {
            Ok(Some(_)) => vec![patient_id],
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
        }
    } else {
        match store::patients::ids_for_organization(&db, Some(user_id)).await {
            Ok(ids) => ids,
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": e.to_string()})),
                )
                    .into_response()
            }
        }
    };

    match store::medications::list_active(&db, patient_ids).await {
        Ok(meds) => {
            let body: Vec<MedicationResponse> = meds.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicationRequest {
    patient_id: Uuid,
    name: String,
    dosage: String,
    frequency: String,
    times: Vec<String>,
}

pub async fn create_medication(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Json(payload): Json<CreateMedicationRequest>,
) -> Response {
    match store::patients::find_owned(&db, user_id, payload.patient_id).await {
        Ok(Some(_)) => {}
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
    }

    let now = chrono::Utc::now().naive_utc();
    let new_medication = medication::ActiveModel {
        id: Set(Uuid::new_v4()),
        patient_id: Set(payload.patient_id),
        name: Set(payload.name),
        dosage: Set(payload.dosage),
        frequency: Set(payload.frequency),
        times: Set(payload.times),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match new_medication.insert(&*db).await {
        Ok(m) => {
            tracing::Span::current()
                .record("table", "medications")
                .record("action", "create_medication")
                .record("user_id", display(user_id))
                .record("patient_id", display(m.patient_id));

            (StatusCode::CREATED, Json(MedicationResponse::from(m))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicationRequest {
    patient_id: Option<Uuid>,
    name: Option<String>,
    dosage: Option<String>,
    frequency: Option<String>,
    times: Option<Vec<String>>,
}

pub async fn update_medication(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Path(medication_id): Path<Uuid>,
    Json(payload): Json<UpdateMedicationRequest>,
) -> Response {
    let existing = match store::medications::find_owned(&db, user_id, medication_id).await {
        Ok(Some(m)) => m,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Medication not found"})),
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

    // Re-homing a medication is allowed, but only onto another patient of
    // the same organization.
    if let Some(patient_id) = payload.patient_id {
        match store::patients::find_owned(&db, user_id, patient_id).await {
            Ok(Some(_)) => {}
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
        }
    }

    let mut active_medication = existing.into_active_model();
    if let Some(patient_id) = payload.patient_id {
        active_medication.patient_id = Set(patient_id);
    }
    if let Some(name) = payload.name {
        active_medication.name = Set(name);
    }
    if let Some(dosage) = payload.dosage {
        active_medication.dosage = Set(dosage);
    }
    if let Some(frequency) = payload.frequency {
        active_medication.frequency = Set(frequency);
    }
    if let Some(times) = payload.times {
        active_medication.times = Set(times);
    }
    active_medication.updated_at = Set(chrono::Utc::now().naive_utc());

    match active_medication.update(&*db).await {
        Ok(m) => (StatusCode::OK, Json(MedicationResponse::from(m))).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Hard delete, step one of the two-step removal. The database rejects it
/// while history rows still reference the medication; that rejection is
/// the client's cue to offer archiving instead. Nothing is archived
/// automatically here.
pub async fn delete_medication(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Path(medication_id): Path<Uuid>,
) -> Response {
    match store::medications::find_owned(&db, user_id, medication_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Medication not found"})),
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
    }

    match medication::Entity::delete_by_id(medication_id).exec(&*db).await {
        Ok(res) if res.rows_affected == 0 => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Medication not found"})),
        )
            .into_response(),
        Ok(_) => {
            tracing::Span::current()
                .record("table", "medications")
                .record("action", "delete_medication")
                .record("user_id", display(user_id));

            (
                StatusCode::OK,
                Json(json!({"message": "Medication deleted"})),
            )
                .into_response()
        }
        Err(e) if store::is_foreign_key_violation(&e) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Medication has recorded doses and cannot be deleted",
                "archivable": true,
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Step two of the removal protocol: keep the row, hide it from every
/// listing. History keeps pointing at the archived medication.
pub async fn archive_medication(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Path(medication_id): Path<Uuid>,
) -> Response {
    let existing = match store::medications::find_owned(&db, user_id, medication_id).await {
        Ok(Some(m)) => m,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Medication not found"})),
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

    let mut active_medication = existing.into_active_model();
    active_medication.active = Set(false);
    active_medication.updated_at = Set(chrono::Utc::now().naive_utc());

    match active_medication.update(&*db).await {
        Ok(m) => {
            tracing::Span::current()
                .record("table", "medications")
                .record("action", "archive_medication")
                .record("user_id", display(user_id))
                .record("business_event", "Medication archived");

            crate::metrics::increment_medications_archived();

            (StatusCode::OK, Json(MedicationResponse::from(m))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
