//! HTTP handlers for API endpoints.

use crate::telemetry::SensorReading;
use crate::web::AppState;
use axum::{
    extract::State,
    response::{Html, Json},
};
use serde_json::json;

/// Latest merged reading as JSON.
pub async fn get_latest(State(state): State<AppState>) -> Json<SensorReading> {
    Json(state.store.snapshot())
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "smart-counter",
        "version": env!("CARGO_PKG_VERSION"),
        "device": state.config.device_label,
        "updates_applied": state.store.updates_applied(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Human-readable status page.
pub async fn status_page(State(state): State<AppState>) -> Html<String> {
    let reading = state.store.snapshot();
    Html(render_status_page(&state.config.device_label, &reading))
}

/// Render the status page for `reading`.
pub fn render_status_page(device: &str, reading: &SensorReading) -> String {
    let pretty = serde_json::to_string_pretty(reading).unwrap_or_else(|_| format!("{:?}", reading));

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Smart Counter</title>
</head>
<body>
    <h1>Smart Counter Server Running</h1>
    <p>Data Source: {device}</p>
    <p>Latest Data:</p>
    <pre>{data}</pre>
    <p>Access the data via API: <a href="/api/latest">/api/latest</a></p>
</body>
</html>"#,
        device = escape_html(device),
        data = escape_html(&pretty),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
