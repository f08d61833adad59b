//! HTTP handlers for the personalization API
pub mod experiments;
pub mod health;
pub mod users;

pub use experiments::*;
pub use health::*;
pub use users::*;

use crate::config::Config;
use crate::error::PersonalizationError;
use crate::services::PersonalizationEngine;
use actix_web::{web, HttpResponse};
use std::sync::Arc;

/// Shared state for all handlers
pub struct AppState {
    pub engine: Arc<PersonalizationEngine>,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl AppState {
    pub fn new(engine: Arc<PersonalizationEngine>, config: &Config) -> Self {
        Self {
            engine,
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }
}

/// Register every route under the application
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api/v1/users/{user_id}")
                .route("/interactions", web::post().to(users::log_interaction))
                .route("/recommendations", web::post().to(users::recommend))
                .route("/profile", web::get().to(users::get_profile))
                .route("/signals", web::get().to(users::get_signals))
                .route("/experiments", web::get().to(experiments::list_experiments))
                .route(
                    "/experiments/{experiment_id}",
                    web::get().to(experiments::get_experiment),
                )
                .route(
                    "/experiments/{experiment_id}/assignment",
                    web::post().to(experiments::assign_variant),
                )
                .route(
                    "/experiments/{experiment_id}/impressions",
                    web::post().to(experiments::record_impression),
                )
                .route(
                    "/experiments/{experiment_id}/conversions",
                    web::post().to(experiments::record_conversion),
                ),
        );
}

/// Map an engine error onto a JSON error response
pub(crate) fn error_response(err: PersonalizationError) -> HttpResponse {
    match err {
        PersonalizationError::InvalidArgument(msg) => {
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid argument",
                "message": msg
            }))
        }
        PersonalizationError::Timeout(msg) => {
            tracing::warn!("Request timed out: {}", msg);
            HttpResponse::GatewayTimeout().json(serde_json::json!({
                "error": "Timeout",
                "message": msg
            }))
        }
        PersonalizationError::Storage(msg) => {
            tracing::error!("Storage unavailable: {}", msg);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "Storage unavailable",
                "message": msg
            }))
        }
        e => {
            tracing::error!("Request failed: {:?}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }))
        }
    }
}
