//! Web server module for the exporter.
//!
//! Serves the scrape endpoint, a liveness probe, the metric schema as JSON,
//! and a small landing page.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::collector::Exporter;
use crate::exposition;
use crate::metrics::MetricDesc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub exporter: Arc<Exporter>,
    pub metrics_path: String,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let metrics_path = state.metrics_path.clone();
    let app_state = Arc::new(state);

    Router::new()
        .route("/", get(landing_handler))
        .route("/healthz", get(healthz_handler))
        .route("/api/describe", get(describe_handler))
        .route(&metrics_path, get(scrape_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        .with_state(app_state)
}

/// Landing page linking to the scrape endpoint.
async fn landing_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(format!(
        "<html>\n<head><title>NetScaler Exporter</title></head>\n<body>\n\
         <h1>NetScaler Exporter</h1>\n\
         <p><a href=\"{path}\">Metrics</a></p>\n\
         <p>{targets} target(s) configured</p>\n\
         </body>\n</html>\n",
        path = state.metrics_path,
        targets = state.exporter.hosts().count(),
    ))
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Metric schema. Never touches the targets.
async fn describe_handler(State(state): State<Arc<AppState>>) -> Json<Vec<MetricDesc>> {
    Json(state.exporter.describe())
}

/// Run one collection cycle and render it in the text exposition format.
async fn scrape_handler(State(state): State<Arc<AppState>>) -> Response {
    let observations = state.exporter.collect_all().await;

    match exposition::encode(&state.exporter.describe(), &observations) {
        Ok(body) => ([(header::CONTENT_TYPE, exposition::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}
