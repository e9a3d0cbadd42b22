use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::adherence;
use crate::store::{self, history::HistoryFilter};

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsResponse {
    pub active_patients: usize,
    pub adherence_rate: u32,
    pub pending_alerts: usize,
    pub medications_today: usize,
}

/// Headline numbers for the dashboard: patient count, adherence over the
/// trailing seven days, today's unresolved doses, and doses scheduled per
/// day. An organization without patients answers all zeros from the first
/// query alone.
pub async fn dashboard_stats(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(user_id): Extension<Uuid>,
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

    if patient_ids.is_empty() {
        return (
            StatusCode::OK,
            Json(DashboardStatsResponse {
                active_patients: 0,
                adherence_rate: 0,
                pending_alerts: 0,
                medications_today: 0,
            }),
        )
            .into_response();
    }

    let today = chrono::Utc::now().date_naive();
    let window_start = today - chrono::Duration::days(7);

    let filter = HistoryFilter {
        patient_ids: patient_ids.clone(),
        start_date: Some(window_start),
        end_date: None,
        status: None,
    };
    let rows = match store::history::query(&db, &filter).await {
        Ok(rows) => rows,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let medications = match store::medications::list_active(&db, patient_ids.clone()).await {
        Ok(meds) => meds,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let summary = adherence::summarize(&rows);

    (
        StatusCode::OK,
        Json(DashboardStatsResponse {
            active_patients: patient_ids.len(),
            adherence_rate: summary.adherence_rate,
            pending_alerts: adherence::pending_alerts_today(&rows, today),
            medications_today: adherence::doses_per_day(&medications),
        }),
    )
        .into_response()
}
