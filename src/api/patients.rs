use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, ModelTrait, Set,
};
use serde_json::json;
use std::sync::Arc;
use tracing::field::display;
use uuid::Uuid;

use crate::entities::patient::{self, PatientStatus};
use crate::entities::{organization, user};
use crate::store;

pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub id: Uuid,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub avatar: String,
    pub caregiver_name: Option<String>,
    pub caregiver_phone: Option<String>,
    pub telegram_id: Option<String>,
    pub username: Option<String>,
    pub status: PatientStatus,
    pub active: bool,
    pub timezone: String,
    /// Listings always report 0; the live figure is an explicit
    /// /history/summary?patient_id= call.
    pub last_adherence: u32,
    pub created_at: NaiveDateTime,
}

fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

impl From<patient::Model> for PatientResponse {
    fn from(p: patient::Model) -> Self {
        let today = Utc::now().date_naive();
        Self {
            id: p.id,
            avatar: p
                .avatar
                .unwrap_or_else(|| format!("https://picsum.photos/seed/{}/200/200", p.id)),
            age: p.birth_date.map(|b| age_on(b, today)),
            name: p.name,
            birth_date: p.birth_date,
            phone: p.phone,
            caregiver_name: p.caregiver_name,
            caregiver_phone: p.caregiver_phone,
            telegram_id: p.telegram_id,
            username: p.username,
            status: p.status,
            active: p.active,
            timezone: p.timezone,
            last_adherence: 0,
            created_at: p.created_at,
        }
    }
}

pub async fn list_patients(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
) -> Response {
    match store::patients::list_for_organization(&db, Some(user_id)).await {
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

pub async fn get_patient(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Path(patient_id): Path<Uuid>,
) -> Response {
    match store::patients::find_owned(&db, user_id, patient_id).await {
        Ok(Some(p)) => (StatusCode::OK, Json(PatientResponse::from(p))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Patient not found"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    name: String,
    birth_date: NaiveDate,
    phone: Option<String>,
    caregiver_name: Option<String>,
    caregiver_phone: Option<String>,
}

/// Enrolment. When a pending bot registration matches the entered name,
/// that row is claimed for this organization and comes back active (200).
/// Otherwise, a fresh patient is inserted as pending (201) and waits in
/// the approval queue. Both paths write `organization_id`, so the
/// organization row is upserted before either runs.
pub async fn create_patient(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Json(payload): Json<CreatePatientRequest>,
) -> Response {
    let user = match user::Entity::find_by_id(user_id).one(&*db).await {
        Ok(Some(u)) => u,
        // A cookie that outlived its account cannot enrol anyone.
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Unauthorized"})),
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

    if let Err(e) = ensure_organization(&db, &user).await {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response();
    }

    let candidates = match store::patients::find_link_candidates(&db, &payload.name).await {
        Ok(c) => c,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let now = chrono::Utc::now().naive_utc();

    if let Some(existing) = store::patients::choose_link_candidate(candidates) {
        let mut active_patient = existing.into_active_model();
        active_patient.organization_id = Set(Some(user_id));
        active_patient.birth_date = Set(Some(payload.birth_date));
        active_patient.phone = Set(payload.phone);
        active_patient.caregiver_name = Set(payload.caregiver_name);
        active_patient.caregiver_phone = Set(payload.caregiver_phone);
        active_patient.status = Set(PatientStatus::Active);
        active_patient.active = Set(true);
        active_patient.timezone = Set(DEFAULT_TIMEZONE.to_string());
        active_patient.updated_at = Set(now);

        return match active_patient.update(&*db).await {
            Ok(p) => {
                tracing::Span::current()
                    .record("table", "patients")
                    .record("action", "link_patient")
                    .record("user_id", display(user_id))
                    .record("patient_id", display(p.id))
                    .record("business_event", "Bot registration linked to organization");

                crate::metrics::increment_patients_enrolled("linked");

                (StatusCode::OK, Json(PatientResponse::from(p))).into_response()
            }
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response(),
        };
    }

    let new_patient = patient::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(Some(user_id)),
        name: Set(payload.name),
        birth_date: Set(Some(payload.birth_date)),
        phone: Set(payload.phone),
        avatar: Set(None),
        caregiver_name: Set(payload.caregiver_name),
        caregiver_phone: Set(payload.caregiver_phone),
        telegram_id: Set(None),
        username: Set(None),
        status: Set(PatientStatus::Pending),
        active: Set(true),
        timezone: Set(DEFAULT_TIMEZONE.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match new_patient.insert(&*db).await {
        Ok(p) => {
            tracing::Span::current()
                .record("table", "patients")
                .record("action", "create_patient")
                .record("user_id", display(user_id))
                .record("patient_id", display(p.id))
                .record("business_event", "Patient enrolled, awaiting approval");

            crate::metrics::increment_patients_enrolled("created");
            metrics::gauge!("cuidamed_patients_total").increment(1.0);

            (StatusCode::CREATED, Json(PatientResponse::from(p))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Lazily creates this account's organization row. The insert is keyed on
/// the account id, so a concurrent first-enrolment simply hits the
/// conflict arm and both requests proceed.
async fn ensure_organization(db: &DatabaseConnection, user: &user::Model) -> Result<(), DbErr> {
    let org = organization::ActiveModel {
        id: Set(user.id),
        name: Set(user.name.clone()),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };

    match organization::Entity::insert(org)
        .on_conflict(
            OnConflict::column(organization::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await
    {
        Ok(_) => Ok(()),
        // DO NOTHING inserts no row; the organization already exists.
        Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    name: Option<String>,
    birth_date: Option<NaiveDate>,
    phone: Option<String>,
    caregiver_name: Option<String>,
    caregiver_phone: Option<String>,
}

pub async fn update_patient(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Path(patient_id): Path<Uuid>,
    Json(payload): Json<UpdatePatientRequest>,
) -> Response {
    let existing = match store::patients::find_owned(&db, user_id, patient_id).await {
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

    let mut active_patient = existing.into_active_model();
    if let Some(name) = payload.name {
        active_patient.name = Set(name);
    }
    if let Some(birth_date) = payload.birth_date {
        active_patient.birth_date = Set(Some(birth_date));
    }
    if let Some(phone) = payload.phone {
        active_patient.phone = Set(Some(phone));
    }
    if let Some(caregiver_name) = payload.caregiver_name {
        active_patient.caregiver_name = Set(Some(caregiver_name));
    }
    if let Some(caregiver_phone) = payload.caregiver_phone {
        active_patient.caregiver_phone = Set(Some(caregiver_phone));
    }
    active_patient.updated_at = Set(chrono::Utc::now().naive_utc());

    match active_patient.update(&*db).await {
        Ok(p) => (StatusCode::OK, Json(PatientResponse::from(p))).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Hard delete. Medications and history cascade away with the patient;
/// message logs keep their rows with a nulled patient_id.
pub async fn delete_patient(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Path(patient_id): Path<Uuid>,
) -> Response {
    let existing = match store::patients::find_owned(&db, user_id, patient_id).await {
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

    match existing.delete(&*db).await {
        Ok(_) => {
            tracing::Span::current()
                .record("table", "patients")
                .record("action", "delete_patient")
                .record("user_id", display(user_id))
                .record("patient_id", display(patient_id))
                .record("business_event", "Patient deleted");

            metrics::gauge!("cuidamed_patients_total").decrement(1.0);

            (StatusCode::OK, Json(json!({"message": "Patient deleted"}))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[test]
    fn age_counts_completed_years_only() {
        let birth = NaiveDate::from_ymd_opt(1950, 6, 15).unwrap();
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2026, 6, 14).unwrap()), 75);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()), 76);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()), 76);
    }

    #[test]
    fn avatar_falls_back_to_a_seeded_placeholder() {
        let day = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();
        let p = patient::Model {
            id: Uuid::new_v4(),
            organization_id: None,
            name: "Ana".to_string(),
            birth_date: None,
            phone: None,
            avatar: None,
            caregiver_name: None,
            caregiver_phone: None,
            telegram_id: None,
            username: None,
            status: PatientStatus::Pending,
            active: true,
            timezone: DEFAULT_TIMEZONE.to_string(),
            created_at: day.and_hms_opt(10, 0, 0).unwrap(),
            updated_at: day.and_hms_opt(10, 0, 0).unwrap(),
        };
        let id = p.id;
        let view = PatientResponse::from(p);
        assert_eq!(
            view.avatar,
            format!("https://picsum.photos/seed/{}/200/200", id)
        );
        assert_eq!(view.age, None);
        assert_eq!(view.last_adherence, 0);
    }

    /// A caregiver's very first enrolment can land on the linking path,
    /// where the claimed row gets this organization's id. The organization
    /// row has to exist by then or the foreign key rejects the claim.
    #[tokio::test]
    async fn linking_upserts_the_organization_before_claiming_the_row() {
        let org = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();

        let rita = user::Model {
            id: org,
            email: "rita@example.com".to_string(),
            password_hash: "unused".to_string(),
            name: "Rita Nogueira".to_string(),
            phone: None,
            created_at: day.and_hms_opt(9, 0, 0).unwrap(),
            updated_at: day.and_hms_opt(9, 0, 0).unwrap(),
        };
        let pending = patient::Model {
            id: Uuid::new_v4(),
            organization_id: None,
            name: "Maria Silva".to_string(),
            birth_date: None,
            phone: None,
            avatar: None,
            caregiver_name: None,
            caregiver_phone: None,
            telegram_id: Some("5561999990000".to_string()),
            username: Some("maria".to_string()),
            status: PatientStatus::Pending,
            active: true,
            timezone: DEFAULT_TIMEZONE.to_string(),
            created_at: day.and_hms_opt(8, 0, 0).unwrap(),
            updated_at: day.and_hms_opt(8, 0, 0).unwrap(),
        };
        let mut linked = pending.clone();
        linked.organization_id = Some(org);
        linked.birth_date = NaiveDate::from_ymd_opt(1948, 2, 3);
        linked.status = PatientStatus::Active;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![rita]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![pending]])
            .append_query_results([vec![linked]])
            .into_connection();
        let db = Arc::new(db);

        let response = create_patient(
            Extension(db.clone()),
            Extension(org),
            Json(CreatePatientRequest {
                name: "Maria Silva".to_string(),
                birth_date: NaiveDate::from_ymd_opt(1948, 2, 3).unwrap(),
                phone: None,
                caregiver_name: None,
                caregiver_phone: None,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 4);

        let upsert = format!("{:?}", log[1]);
        assert!(upsert.contains("organizations"));
        assert!(upsert.contains("ON CONFLICT"));
        assert!(upsert.contains("DO NOTHING"));

        let claim = format!("{:?}", log[3]);
        assert!(claim.contains("UPDATE"));
        assert!(claim.contains("timezone"));
    }
}
