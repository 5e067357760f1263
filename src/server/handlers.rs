//! HTTP request handlers
//!
//! Contains handlers for all HTTP endpoints.

use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::AppState;
use crate::emitter::MeasurementBuffer;
use crate::error::AppError;
use crate::format;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Health status
    status: String,
    /// Application version
    version: String,
}

/// Root endpoint - displays basic info
pub async fn root(State(state): State<AppState>) -> Html<String> {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>rostack-exporter</title>
</head>
<body>
    <h1>rostack-exporter</h1>
    <p>Version: {}</p>
    <ul>
        <li><a href="/health">Health Check</a></li>
        <li><a href="{}">Metrics</a></li>
    </ul>
</body>
</html>"#,
        env!("CARGO_PKG_VERSION"),
        state.config.server.path
    );
    Html(html)
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Metrics endpoint - runs one poll cycle and returns line protocol
///
/// Authentication failures surface as 502; per-service failures are logged
/// and the measurements from the surviving services are still served.
#[instrument(skip(state), name = "metrics_handler")]
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let start = Instant::now();

    let mut buffer = MeasurementBuffer::new();
    let outcome = state.plugin.run_cycle(&mut buffer).await?;

    for failure in &outcome.failures {
        warn!(
            service = %failure.service,
            error = %failure.error,
            "Service unavailable this cycle"
        );
    }
    for emit_error in &outcome.emit_errors {
        warn!(error = %emit_error, "Measurement rejected");
    }

    let output = format::format_measurements(&buffer.into_measurements());

    debug!(
        duration_ms = start.elapsed().as_millis() as u64,
        measurements = outcome.emitted,
        failed_services = outcome.failures.len(),
        "Poll cycle served"
    );

    Ok((
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        output,
    ))
}
