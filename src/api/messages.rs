use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::store;

/// Latest bot-conversation messages for the caller's patients,
/// worker-written and read-only here. Rows are returned in their stored
/// shape; this viewer never remaps them.
pub async fn list_whatsapp_logs(
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

    match store::logs::recent_for_patients(&db, patient_ids).await {
        Ok(logs) => (StatusCode::OK, Json(logs)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
