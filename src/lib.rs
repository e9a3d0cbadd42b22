use axum::{
    routing::{delete, get, patch, post},
    Extension, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod adherence;
pub mod api;
pub mod config;
pub mod entities;
pub mod metrics;
pub mod migrator;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use sea_orm;

async fn health_check() -> &'static str {
    "OK"
}

/// Builds the full application router. The prometheus layer and the
/// /metrics route are wired up by the server binary so that tests can
/// drive this router without installing a global metrics recorder.
///
/// The connection rides in an `Arc`: with the `mock` feature in the
/// build (the test suite turns it on), `DatabaseConnection` itself is
/// not `Clone`, which the extension layer requires.
pub fn router(db: DatabaseConnection, config: Config) -> Router {
    let db = Arc::new(db);
    let config = Arc::new(config);

    let public_routes = Router::new()
        .route("/register", post(api::auth::register))
        .route("/login", post(api::auth::login));

    let session_routes = Router::new()
        .route("/me", get(api::auth::me))
        .route("/logout", post(api::auth::logout))
        .route(
            "/patients",
            get(api::patients::list_patients).post(api::patients::create_patient),
        )
        .route(
            "/patients/:id",
            get(api::patients::get_patient)
                .patch(api::patients::update_patient)
                .delete(api::patients::delete_patient),
        )
        .route(
            "/medications",
            get(api::medications::list_medications).post(api::medications::create_medication),
        )
        .route(
            "/medications/:id",
            patch(api::medications::update_medication).delete(api::medications::delete_medication),
        )
        .route(
            "/medications/:id/archive",
            post(api::medications::archive_medication),
        )
        .route("/history", get(api::history::list_history))
        .route("/history/summary", get(api::history::history_summary))
        .route("/alerts", get(api::history::list_alerts))
        .route("/dashboard/stats", get(api::dashboard::dashboard_stats))
        .route("/whatsapp/logs", get(api::messages::list_whatsapp_logs))
        .route_layer(axum::middleware::from_fn(api::middleware::auth_middleware));

    // Approval endpoints for the bot operator, keyed by ADMIN_API_KEY
    // instead of a session cookie.
    let admin_routes = Router::new()
        .route(
            "/admin/patients/pending",
            get(api::admin::list_pending_patients),
        )
        .route(
            "/admin/patients/:id/activate",
            post(api::admin::activate_patient),
        )
        .route("/admin/patients/:id", delete(api::admin::reject_patient))
        .route_layer(axum::middleware::from_fn(api::middleware::admin_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .layer(Extension(db))
        .layer(Extension(config.clone()))
        .layer(tower_cookies::CookieManagerLayer::new())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // Span name "METHOD /path" (e.g. "POST /patients")
                    let span_name = if let Some(path) = matched_path {
                        format!("{} {}", request.method(), path)
                    } else {
                        format!("{} {}", request.method(), request.uri().path())
                    };

                    let user_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .or_else(|| {
                            request
                                .headers()
                                .get("x-real-ip")
                                .and_then(|v| v.to_str().ok())
                        })
                        .unwrap_or("unknown");

                    // Empty fields are filled in by handlers as the
                    // request progresses.
                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        user_ip = user_ip,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        table = tracing::field::Empty,
                        action = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        user_email = tracing::field::Empty,
                        patient_id = tracing::field::Empty,
                        medication_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(
                    |_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                        // The completion event carries the interesting
                        // fields; the default "started processing" log
                        // is noise.
                    },
                )
                .on_response(
                    |response: &axum::http::Response<axum::body::Body>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));

                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(
                    config
                        .dashboard_origin
                        .parse::<axum::http::HeaderValue>()
                        .expect("DASHBOARD_ORIGIN must be a valid origin"),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PATCH,
                    axum::http::Method::DELETE,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE])
                .allow_credentials(true),
        )
}
