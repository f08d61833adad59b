use super::AppState;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    storage: String,
}

const PROBE_USER: &str = "__health__";

/// Basic health check; probes storage with a cheap read
pub async fn health_check(state: web::Data<Arc<AppState>>) -> impl Responder {
    let storage = match state.engine.experiments(PROBE_USER).await {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::warn!(error = %e, "Storage health probe failed");
            "unhealthy"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: if storage == "healthy" { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: storage.to_string(),
    })
}
