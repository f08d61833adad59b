/// Experiments API handlers - per-user variant assignment and counters
use super::{error_response, AppState};
use crate::models::{CONTROL_VARIANT, PERSONALIZED_VARIANT};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    /// Omitted means the two-arm control/personalized split
    #[serde(default = "default_variants")]
    pub variants: Vec<String>,
}

fn default_variants() -> Vec<String> {
    vec![CONTROL_VARIANT.to_string(), PERSONALIZED_VARIANT.to_string()]
}

#[derive(Debug, Deserialize)]
pub struct ImpressionRequest {
    pub variant: String,
    pub count: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ConversionRequest {
    pub variant: String,
    pub weight: Option<f64>,
}

/// GET /api/v1/users/{user_id}/experiments - All experiments for a user
#[tracing::instrument(skip(state))]
pub async fn list_experiments(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.experiments(&path.into_inner()).await {
        Ok(experiments) => HttpResponse::Ok().json(experiments),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/users/{user_id}/experiments/{experiment_id}
#[tracing::instrument(skip(state))]
pub async fn get_experiment(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (user_id, experiment_id) = path.into_inner();

    match state.engine.experiment(&user_id, &experiment_id).await {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Experiment not found",
            "experimentId": experiment_id
        })),
        Err(e) => error_response(e),
    }
}

/// POST /api/v1/users/{user_id}/experiments/{experiment_id}/assignment
#[tracing::instrument(skip(state))]
pub async fn assign_variant(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    req: web::Json<AssignmentRequest>,
) -> impl Responder {
    let (user_id, experiment_id) = path.into_inner();

    match state
        .engine
        .assign_variant(&user_id, &experiment_id, &req.variants)
        .await
    {
        Ok(variant) => HttpResponse::Ok().json(serde_json::json!({
            "experimentId": experiment_id,
            "variant": variant
        })),
        Err(e) => error_response(e),
    }
}

/// POST /api/v1/users/{user_id}/experiments/{experiment_id}/impressions
#[tracing::instrument(skip(state))]
pub async fn record_impression(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    req: web::Json<ImpressionRequest>,
) -> impl Responder {
    let (user_id, experiment_id) = path.into_inner();
    let count = req.count.unwrap_or(1.0);

    match state
        .engine
        .record_impression(&user_id, &experiment_id, &req.variant, count)
        .await
    {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => error_response(e),
    }
}

/// POST /api/v1/users/{user_id}/experiments/{experiment_id}/conversions
#[tracing::instrument(skip(state))]
pub async fn record_conversion(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    req: web::Json<ConversionRequest>,
) -> impl Responder {
    let (user_id, experiment_id) = path.into_inner();
    let weight = req.weight.unwrap_or(1.0);

    match state
        .engine
        .record_conversion(&user_id, &experiment_id, &req.variant, weight)
        .await
    {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variants_default_to_two_arm_split() {
        let req: AssignmentRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.variants, vec!["control", "personalized"]);

        let req: AssignmentRequest = serde_json::from_str(r#"{"variants": []}"#).unwrap();
        assert!(req.variants.is_empty());
    }
}
