use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use personalization_service::config::{Config, StorageBackend};
use personalization_service::handlers::{self, AppState};
use personalization_service::storage::{
    InMemoryRepository, PersonalizationRepository, RedisRepository,
};
use personalization_service::utils::{RandomSource, SeededRandom, ThreadRandom};
use personalization_service::PersonalizationEngine;
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize tracing (LOG_FORMAT=json for structured output)
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,personalization_service=debug".into()),
        )
        .with(json_logs.then(|| fmt::layer().json()))
        .with((!json_logs).then(fmt::layer))
        .init();

    info!("Starting personalization-service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;
    info!("Configuration loaded and validated");

    let repository: Arc<dyn PersonalizationRepository> = match config.storage_backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Arc::new(InMemoryRepository::new())
        }
        StorageBackend::Redis => {
            let client = redis::Client::open(config.redis_url.as_str())
                .context("Failed to create Redis client")?;
            info!(
                key_prefix = %config.redis_key_prefix,
                "Using Redis storage"
            );
            Arc::new(RedisRepository::new(client, config.redis_key_prefix.clone()))
        }
    };

    let rng: Arc<dyn RandomSource> = match config.rng_seed {
        Some(seed) => {
            info!(seed = seed, "Using seeded random source");
            Arc::new(SeededRandom::new(seed))
        }
        None => Arc::new(ThreadRandom),
    };

    let engine = Arc::new(PersonalizationEngine::new(
        repository,
        rng,
        config.engine_settings(),
    ));
    let state = Arc::new(AppState::new(engine, &config));

    let bind_addr = (config.http_host.clone(), config.http_port);
    info!("HTTP server listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(bind_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("personalization-service shut down");
    Ok(())
}
