/// Assignment Service - sticky variant assignment per user and experiment
use crate::error::{PersonalizationError, Result};
use crate::models::ExperimentRecord;
use crate::storage::PersonalizationRepository;
use crate::utils::{KeyedLocks, RandomSource};
use std::sync::Arc;
use tracing::{debug, info};

/// Assigns each user one variant per experiment and never changes it while
/// that variant is still offered.
///
/// State per experiment: unassigned -> assigned(variant). A new assignment is
/// only drawn when nothing is stored or the stored variant was withdrawn from
/// the offered list.
pub struct ExperimentAssigner {
    repository: Arc<dyn PersonalizationRepository>,
    rng: Arc<dyn RandomSource>,
    locks: KeyedLocks,
}

impl ExperimentAssigner {
    pub fn new(repository: Arc<dyn PersonalizationRepository>, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            repository,
            rng,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn assign(
        &self,
        user_id: &str,
        experiment_id: &str,
        variants: &[String],
    ) -> Result<String> {
        if experiment_id.is_empty() {
            return Err(PersonalizationError::InvalidArgument(
                "experiment id must not be empty".to_string(),
            ));
        }
        if variants.is_empty() {
            return Err(PersonalizationError::InvalidArgument(format!(
                "no variants offered for experiment {}",
                experiment_id
            )));
        }

        // Check-then-write must not interleave for the same user and experiment
        let _guard = self.locks.lock(&lock_key(user_id, experiment_id)).await;

        if let Some(existing) = self.repository.get_experiment(user_id, experiment_id).await? {
            if variants.contains(&existing.variant) {
                debug!(
                    user_id = user_id,
                    experiment_id = experiment_id,
                    variant = %existing.variant,
                    "Existing assignment reused"
                );
                return Ok(existing.variant);
            }

            info!(
                user_id = user_id,
                experiment_id = experiment_id,
                withdrawn_variant = %existing.variant,
                "Stored variant no longer offered, reassigning"
            );
        }

        let variant = variants[self.rng.pick_index(variants.len())].clone();
        self.repository
            .put_experiment(user_id, experiment_id, &ExperimentRecord::new(variant.clone()))
            .await?;

        info!(
            user_id = user_id,
            experiment_id = experiment_id,
            variant = %variant,
            "Assigned user to variant"
        );

        Ok(variant)
    }
}

fn lock_key(user_id: &str, experiment_id: &str) -> String {
    format!("{}/{}", user_id, experiment_id)
}
