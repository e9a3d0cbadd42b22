use axum::routing::get;
use cuidamed_server::{migrator, Config};
use sea_orm::Database;

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    cuidamed_server::telemetry::init_telemetry("cuidamed-server");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    let config = Config::from_env();

    // Database Connection
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    migrator::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    // Initialize Metrics
    cuidamed_server::metrics::init_metrics(&db).await;

    let bind_addr = config.bind_addr.clone();

    // /metrics sits outside the traced router so scrapes stay out of
    // the request logs.
    let app = cuidamed_server::router(db, config)
        .layer(prometheus_layer)
        .route("/metrics", get(|| async move { metric_handle.render() }));

    tracing::info!("listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
