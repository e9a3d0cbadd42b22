use axum::{
    extract::{Extension, Json, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::adherence;
use crate::entities::medication_history::{self, AdherenceStatus};
use crate::store::{self, history::HistoryFilter};

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub medication_id: Option<Uuid>,
    pub scheduled_time: String,
    pub scheduled_minutes: i32,
    pub status: AdherenceStatus,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl From<medication_history::Model> for HistoryResponse {
    fn from(h: medication_history::Model) -> Self {
        Self {
            id: h.id,
            patient_id: h.patient_id,
            medication_id: h.medication_id,
            scheduled_time: h.scheduled_time,
            scheduled_minutes: h.scheduled_minutes,
            status: h.status,
            date: h.date,
            created_at: h.created_at,
        }
    }
}

#[derive(serde::Deserialize)]
pub struct HistoryParams {
    patient_id: Option<Uuid>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    status: Option<AdherenceStatus>,
}

/// Resolves which patients a history query may touch: one owned patient
/// when the filter names one, the whole organization otherwise.
async fn scoped_patient_ids(
    db: &DatabaseConnection,
    user_id: Uuid,
    patient_id: Option<Uuid>,
) -> Result<Vec<Uuid>, Response> {
    match patient_id {
        Some(patient_id) => match store::patients::find_owned(db, user_id, patient_id).await {
            Ok(Some(_)) => Ok(vec![patient_id]),
            Ok(None) => Err((
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Patient not found"})),
            )
                .into_response()),
            Err(e) => Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()),
        },
        None => store::patients::ids_for_organization(db, Some(user_id))
            .await
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": e.to_string()})),
                )
                    .into_response()
            }),
    }
}

pub async fn list_history(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let patient_ids = match scoped_patient_ids(&db, user_id, params.patient_id).await {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    let filter = HistoryFilter {
        patient_ids,
        start_date: params.start_date,
        end_date: params.end_date,
        status: params.status,
    };

    match store::history::query(&db, &filter).await {
        Ok(rows) => {
            let body: Vec<HistoryResponse> = rows.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Same fetch as the history feed, reduced to the per-status counts and
/// the rounded adherence rate.
pub async fn history_summary(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let patient_ids = match scoped_patient_ids(&db, user_id, params.patient_id).await {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    let filter = HistoryFilter {
        patient_ids,
        start_date: params.start_date,
        end_date: params.end_date,
        status: params.status,
    };

    match store::history::query(&db, &filter).await {
        Ok(rows) => (StatusCode::OK, Json(adherence::summarize(&rows))).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(serde::Deserialize)]
pub struct AlertParams {
    limit: Option<usize>,
}

/// Alert feed: missed, pending and delayed doses across the organization,
/// newest first. The dashboard asks for the first few, the alerts screen
/// for everything.
pub async fn list_alerts(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<AlertParams>,
) -> Response {
    let patient_ids = match store::patients::ids_for_organization(&db, Some(user_id)).await {
        Ok(ids) => ids,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let filter = HistoryFilter {
        patient_ids,
        ..Default::default()
    };

    match store::history::query(&db, &filter).await {
        Ok(rows) => {
            let mut alerts = adherence::alert_rows(rows);
            if let Some(limit) = params.limit {
                alerts.truncate(limit);
            }
            let body: Vec<HistoryResponse> = alerts.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
