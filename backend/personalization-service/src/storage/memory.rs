use super::PersonalizationRepository;
use crate::error::Result;
use crate::models::ExperimentRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;

/// Process-local repository.
///
/// Each user's records live in their own map entry, so writes for different
/// users only meet when they hash to the same shard.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    signals: DashMap<String, String>,
    experiments: DashMap<String, BTreeMap<String, ExperimentRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonalizationRepository for InMemoryRepository {
    async fn load_signals(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.signals.get(user_id).map(|raw| raw.value().clone()))
    }

    async fn save_signals(&self, user_id: &str, raw: &str) -> Result<()> {
        self.signals.insert(user_id.to_string(), raw.to_string());
        Ok(())
    }

    async fn get_experiment(
        &self,
        user_id: &str,
        experiment_id: &str,
    ) -> Result<Option<ExperimentRecord>> {
        Ok(self
            .experiments
            .get(user_id)
            .and_then(|records| records.get(experiment_id).cloned()))
    }

    async fn list_experiments(&self, user_id: &str) -> Result<BTreeMap<String, ExperimentRecord>> {
        Ok(self
            .experiments
            .get(user_id)
            .map(|records| records.clone())
            .unwrap_or_default())
    }

    async fn put_experiment(
        &self,
        user_id: &str,
        experiment_id: &str,
        record: &ExperimentRecord,
    ) -> Result<()> {
        self.experiments
            .entry(user_id.to_string())
            .or_default()
            .insert(experiment_id.to_string(), record.clone());
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
        // The entry guard holds the shard write lock for the whole update
        let mut records = self.experiments.entry(user_id.to_string()).or_default();
        let record = records
            .entry(experiment_id.to_string())
            .or_insert_with(|| ExperimentRecord::new(variant));

        record.variant = variant.to_string();
        record.impressions += impressions;
        record.conversions += conversions;

        Ok(record.clone())
    }
}
