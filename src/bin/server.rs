use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Extension, Router,
};
use denguewatch_server::early_warning::{start_early_warning_worker, EarlyWarningQueue};
use denguewatch_server::store::DbStore;
use denguewatch_server::{api, migrator};
use sea_orm::{Database, DatabaseConnection};

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    denguewatch_server::telemetry::init_telemetry("denguewatch-server");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    use sea_orm_migration::MigratorTrait;
    migrator::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    denguewatch_server::metrics::init_metrics(&db).await;

    let store = DbStore::new(db.clone());
    // Early-warning checks run on a detached worker fed by this queue so
    // case/report submissions never wait on them.
    let queue = start_early_warning_worker(Arc::new(store.clone()));

    let app = app(db, store, queue, prometheus_layer, metric_handle);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health_check() -> &'static str {
    "OK"
}

fn app(
    db: DatabaseConnection,
    store: DbStore,
    queue: EarlyWarningQueue,
    prometheus_layer: axum_prometheus::PrometheusMetricLayer<'static>,
    metric_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> Router {
    let surveillance_routes = Router::new()
        .route("/cases", get(api::cases::list_cases).post(api::cases::create_case))
        .route("/cases/:id", patch(api::cases::update_case))
        .route(
            "/reports",
            get(api::reports::list_reports).post(api::reports::create_report),
        )
        .route("/reports/:id", patch(api::reports::update_report))
        .route("/alerts", get(api::alerts::list_alerts))
        .route("/alerts/:id/status", patch(api::alerts::update_alert_status))
        .route("/alerts/:id/resolve", post(api::alerts::resolve_alert))
        .route("/dashboard/rankings", get(api::dashboard::get_barangay_rankings));

    let public_routes = Router::new()
        .route("/public/stats", get(api::public::get_stats))
        .route("/public/barangays", get(api::public::get_barangay_case_data))
        .route("/public/timeseries", get(api::public::get_time_series))
        .route("/public/alerts", get(api::public::get_alerts))
        .route("/public/forecast", get(api::public::get_forecast_summary));

    Router::new()
        .route("/health", get(health_check))
        .merge(surveillance_routes)
        .merge(public_routes)
        .layer(Extension(db))
        .layer(Extension(store))
        .layer(Extension(queue))
        .layer(prometheus_layer)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // Span name as "METHOD /path" so traces group by route.
                    let span_name = if let Some(path) = matched_path {
                        format!("{} {}", request.method(), path)
                    } else {
                        format!("{} {}", request.method(), request.uri().path())
                    };

                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        barangay_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(
                    |_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                        // The completion event carries everything useful.
                    },
                )
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .route("/metrics", get(|| async move { metric_handle.render() }))
}
