// ============================================
// Redis Repository
// ============================================
//
// Redis keys:
// - {prefix}:{user_id}:signals                    - JSON `signals` record
// - {prefix}:{user_id}:experiments                - Set of experiment ids
// - {prefix}:{user_id}:experiment:{experiment_id} - Hash {variant, impressions, conversions}
//
// Counter updates run in a MULTI/EXEC pipeline with HINCRBYFLOAT, so
// concurrent increments never lose writes.

use super::PersonalizationRepository;
use crate::error::Result;
use crate::models::ExperimentRecord;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

pub struct RedisRepository {
    redis: redis::Client,
    key_prefix: String,
}

impl RedisRepository {
    pub fn new(redis: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            redis,
            key_prefix: key_prefix.into(),
        }
    }

    fn signals_key(&self, user_id: &str) -> String {
        format!("{}:{}:signals", self.key_prefix, user_id)
    }

    fn experiments_index_key(&self, user_id: &str) -> String {
        format!("{}:{}:experiments", self.key_prefix, user_id)
    }

    fn experiment_key(&self, user_id: &str, experiment_id: &str) -> String {
        format!("{}:{}:experiment:{}", self.key_prefix, user_id, experiment_id)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.redis.get_multiplexed_async_connection().await?)
    }
}

/// Decode an experiment hash; unreadable hashes are treated as absent
fn parse_record(key: &str, fields: &HashMap<String, String>) -> Option<ExperimentRecord> {
    if fields.is_empty() {
        return None;
    }

    let variant = fields.get("variant").filter(|v| !v.is_empty());
    let impressions = counter(fields, "impressions");
    let conversions = counter(fields, "conversions");

    match (variant, impressions, conversions) {
        (Some(variant), Some(impressions), Some(conversions)) => Some(ExperimentRecord {
            variant: variant.clone(),
            impressions,
            conversions,
        }),
        _ => {
            warn!(key = key, "Ignoring unreadable experiment record");
            None
        }
    }
}

fn counter(fields: &HashMap<String, String>, name: &str) -> Option<f64> {
    match fields.get(name) {
        None => Some(0.0),
        Some(raw) => raw.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

#[async_trait]
impl PersonalizationRepository for RedisRepository {
    async fn load_signals(&self, user_id: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(self.signals_key(user_id)).await?;
        Ok(raw)
    }

    async fn save_signals(&self, user_id: &str, raw: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(self.signals_key(user_id), raw).await?;

        debug!(user_id = user_id, bytes = raw.len(), "Signals saved");
        Ok(())
    }

    async fn get_experiment(
        &self,
        user_id: &str,
        experiment_id: &str,
    ) -> Result<Option<ExperimentRecord>> {
        let mut conn = self.connection().await?;
        let key = self.experiment_key(user_id, experiment_id);
        let fields: HashMap<String, String> = conn.hgetall(&key).await?;

        Ok(parse_record(&key, &fields))
    }

    async fn list_experiments(&self, user_id: &str) -> Result<BTreeMap<String, ExperimentRecord>> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn.smembers(self.experiments_index_key(user_id)).await?;

        let mut records = BTreeMap::new();
        for experiment_id in ids {
            let key = self.experiment_key(user_id, &experiment_id);
            let fields: HashMap<String, String> = conn.hgetall(&key).await?;
            if let Some(record) = parse_record(&key, &fields) {
                records.insert(experiment_id, record);
            }
        }

        Ok(records)
    }

    async fn put_experiment(
        &self,
        user_id: &str,
        experiment_id: &str,
        record: &ExperimentRecord,
    ) -> Result<()> {
        let mut conn = self.connection().await?;
        let key = self.experiment_key(user_id, experiment_id);

        let _: () = redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .hset_multiple(
                &key,
                &[
                    ("variant", record.variant.clone()),
                    ("impressions", record.impressions.to_string()),
                    ("conversions", record.conversions.to_string()),
                ],
            )
            .ignore()
            .sadd(self.experiments_index_key(user_id), experiment_id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn increment_experiment(
        &self,
        user_id: &str,
        experiment_id: &str,
        variant: &str,
        impressions: f64,
        conversions: f64,
    ) -> Result<ExperimentRecord> {
        let mut conn = self.connection().await?;
        let key = self.experiment_key(user_id, experiment_id);

        let (impressions_total, conversions_total): (f64, f64) = redis::pipe()
            .atomic()
            .hset(&key, "variant", variant)
            .ignore()
            .cmd("HINCRBYFLOAT")
            .arg(&key)
            .arg("impressions")
            .arg(impressions)
            .cmd("HINCRBYFLOAT")
            .arg(&key)
            .arg("conversions")
            .arg(conversions)
            .sadd(self.experiments_index_key(user_id), experiment_id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!(
            user_id = user_id,
            experiment_id = experiment_id,
            variant = variant,
            impressions = impressions_total,
            conversions = conversions_total,
            "Experiment counters incremented"
        );

        Ok(ExperimentRecord {
            variant: variant.to_string(),
            impressions: impressions_total,
            conversions: conversions_total,
        })
    }
}
