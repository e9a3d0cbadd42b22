use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::config::Config;

pub const SESSION_COOKIE: &str = "cuidamed_session";

/// Resolves the caller once per request: the session cookie holds the
/// account id, which doubles as the organization scope for every query
/// downstream.
pub async fn auth_middleware(cookies: Cookies, mut request: Request, next: Next) -> Response {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        if let Ok(user_id) = cookie.value().parse::<Uuid>() {
            request.extensions_mut().insert(user_id);
            return next.run(request).await;
        }
    }
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"}))).into_response()
}

/// Gate for the /admin approval surface. The approval page sends the
/// shared key in x-api-key on every poll.
pub async fn admin_middleware(
    Extension(config): Extension<Arc<Config>>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());
    if provided == Some(config.admin_api_key.as_str()) {
        return next.run(request).await;
    }
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"}))).into_response()
}
