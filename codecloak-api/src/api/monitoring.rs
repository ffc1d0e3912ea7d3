use crate::models::HealthResponse;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Result as ActixResult};
use tracing::error;

// Prometheus metrics endpoint
pub async fn metrics(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    match state.metrics.render_metrics() {
        Ok(metrics_text) => Ok(HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4; charset=utf-8")
            .body(metrics_text)),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to render metrics",
                "details": e.to_string()
            })))
        }
    }
}

pub async fn health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
    }))
}
