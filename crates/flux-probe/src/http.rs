use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use flux_metrics::MetricRegistry;
use std::sync::Arc;
use tracing::error;

const INDEX_HTML: &str = r#"<html>
<head><title>SmartCitizen Exporter</title></head>
<body>
<h1>Prometheus Exporter for SmartCitizen devices</h1>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>"#;

pub fn create_router(registry: Arc<MetricRegistry>) -> Router {
    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/health", get(|| async { "OK" }))
        .route("/metrics", get(metrics))
        .with_state(registry)
}

async fn metrics(State(registry): State<Arc<MetricRegistry>>) -> Response {
    match registry.export() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
