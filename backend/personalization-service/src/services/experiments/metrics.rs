/// Metrics Recorder - impression and conversion counters for experiments
use crate::error::{PersonalizationError, Result};
use crate::models::ExperimentRecord;
use crate::storage::PersonalizationRepository;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Upsert-and-increment counters on the per-user experiment record.
///
/// Counters only grow. Each write overwrites the stored variant label with
/// the caller's, so callers pass the sticky variant from the assigner.
pub struct MetricsRecorder {
    repository: Arc<dyn PersonalizationRepository>,
}

impl MetricsRecorder {
    pub fn new(repository: Arc<dyn PersonalizationRepository>) -> Self {
        Self { repository }
    }

    pub async fn record_impression(
        &self,
        user_id: &str,
        experiment_id: &str,
        variant: &str,
        count: f64,
    ) -> Result<ExperimentRecord> {
        validate(experiment_id, variant, "count", count)?;
        self.increment(user_id, experiment_id, variant, count, 0.0)
            .await
    }

    pub async fn record_conversion(
        &self,
        user_id: &str,
        experiment_id: &str,
        variant: &str,
        weight: f64,
    ) -> Result<ExperimentRecord> {
        validate(experiment_id, variant, "weight", weight)?;
        self.increment(user_id, experiment_id, variant, 0.0, weight)
            .await
    }

    /// One retry on storage failure, then the error goes back to the caller
    async fn increment(
        &self,
        user_id: &str,
        experiment_id: &str,
        variant: &str,
        impressions: f64,
        conversions: f64,
    ) -> Result<ExperimentRecord> {
        let first = self
            .repository
            .increment_experiment(user_id, experiment_id, variant, impressions, conversions)
            .await;

        let record = match first {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    user_id = user_id,
                    experiment_id = experiment_id,
                    error = %e,
                    "Counter write failed, retrying once"
                );
                self.repository
                    .increment_experiment(user_id, experiment_id, variant, impressions, conversions)
                    .await
                    .map_err(|e| {
                        error!(
                            user_id = user_id,
                            experiment_id = experiment_id,
                            error = %e,
                            "Counter write failed after retry"
                        );
                        e
                    })?
            }
        };

        debug!(
            user_id = user_id,
            experiment_id = experiment_id,
            variant = variant,
            impressions = record.impressions,
            conversions = record.conversions,
            "Experiment counters updated"
        );

        Ok(record)
    }
}

fn validate(experiment_id: &str, variant: &str, name: &str, amount: f64) -> Result<()> {
    if experiment_id.is_empty() {
        return Err(PersonalizationError::InvalidArgument(
            "experiment id must not be empty".to_string(),
        ));
    }
    if variant.is_empty() {
        return Err(PersonalizationError::InvalidArgument(
            "variant must not be empty".to_string(),
        ));
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err(PersonalizationError::InvalidArgument(format!(
            "{} must be a non-negative number, got {}",
            name, amount
        )));
    }
    Ok(())
}
