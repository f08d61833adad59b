/// User-facing personalization endpoints: interactions, recommendations, profile
use super::{error_response, AppState};
use crate::models::{Action, ContentItem, RecommendOptions, PERSONALIZED_VARIANT};
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRequest {
    pub item_type: String,
    pub item: ContentItem,
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub item_type: String,
    /// Raw entries; anything that is not a JSON object is skipped
    #[serde(default)]
    pub candidates: Vec<serde_json::Value>,
    pub limit: Option<usize>,
    pub diversify: Option<bool>,
    pub variant: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub variant: String,
    pub items: Vec<ContentItem>,
}

/// POST /api/v1/users/{user_id}/interactions - Record an interaction
#[tracing::instrument(skip(state, req))]
pub async fn log_interaction(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    req: web::Json<InteractionRequest>,
) -> impl Responder {
    let user_id = path.into_inner();
    let req = req.into_inner();
    let action = req
        .action
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or(Action::View.as_str());

    state
        .engine
        .log_interaction(&user_id, &req.item_type, &req.item, action)
        .await;

    HttpResponse::Accepted().json(serde_json::json!({
        "status": "accepted"
    }))
}

/// POST /api/v1/users/{user_id}/recommendations - Rank caller-supplied candidates
#[tracing::instrument(skip(state, req))]
pub async fn recommend(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    req: web::Json<RecommendationRequest>,
) -> impl Responder {
    let user_id = path.into_inner();
    let req = req.into_inner();

    let options = RecommendOptions {
        limit: req.limit.unwrap_or(state.default_limit).min(state.max_limit),
        diversify: req.diversify.unwrap_or(true),
        variant: req
            .variant
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| PERSONALIZED_VARIANT.to_string()),
    };

    let supplied = req.candidates.len();
    let candidates: Vec<ContentItem> = req
        .candidates
        .into_iter()
        .filter(|value| value.is_object())
        .map(ContentItem::from_value)
        .collect();
    if candidates.len() < supplied {
        tracing::debug!(
            skipped = supplied - candidates.len(),
            "Ignoring candidates that are not JSON objects"
        );
    }

    let items = state
        .engine
        .get_recommendations(&user_id, &req.item_type, &candidates, &options)
        .await;

    HttpResponse::Ok().json(RecommendationResponse {
        variant: options.variant,
        items,
    })
}

/// GET /api/v1/users/{user_id}/profile - Normalized interest profile
#[tracing::instrument(skip(state))]
pub async fn get_profile(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.profile(&path.into_inner()).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/users/{user_id}/signals - Raw accumulated weights and recency
#[tracing::instrument(skip(state))]
pub async fn get_signals(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.signals(&path.into_inner()).await {
        Ok(signals) => HttpResponse::Ok().json(signals),
        Err(e) => error_response(e),
    }
}
