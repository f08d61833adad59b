pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{PersonalizationError, Result};
pub use services::{EngineSettings, PersonalizationEngine};
pub use storage::{InMemoryRepository, PersonalizationRepository, RedisRepository};
