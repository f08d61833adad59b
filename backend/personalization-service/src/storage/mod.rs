//! Persistence for the two per-user records this service owns:
//! `signals` (learned interest) and `experiments` (assignments and counters).
//!
//! Scoring and diversification never touch storage directly; everything goes
//! through [`PersonalizationRepository`] so the engine runs unchanged against
//! Redis in production and [`InMemoryRepository`] in tests.
pub mod memory;
pub mod redis_store;

pub use memory::InMemoryRepository;
pub use redis_store::RedisRepository;

use crate::error::Result;
use crate::models::ExperimentRecord;
use async_trait::async_trait;
use std::collections::BTreeMap;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersonalizationRepository: Send + Sync {
    /// Raw serialized `signals` record, if one was ever written
    async fn load_signals(&self, user_id: &str) -> Result<Option<String>>;

    async fn save_signals(&self, user_id: &str, raw: &str) -> Result<()>;

    async fn get_experiment(
        &self,
        user_id: &str,
        experiment_id: &str,
    ) -> Result<Option<ExperimentRecord>>;

    async fn list_experiments(&self, user_id: &str) -> Result<BTreeMap<String, ExperimentRecord>>;

    /// Overwrite the record for one experiment
    async fn put_experiment(
        &self,
        user_id: &str,
        experiment_id: &str,
        record: &ExperimentRecord,
    ) -> Result<()>;

    /// Atomically upsert and increment counters, overwriting the stored variant
    async fn increment_experiment(
        &self,
        user_id: &str,
        experiment_id: &str,
        variant: &str,
        impressions: f64,
        conversions: f64,
    ) -> Result<ExperimentRecord>;
}
