// ============================================
// Personalization Engine
// ============================================
//
// Entry point for the host application. One instance is built at startup
// and shared; every operation takes the user id explicitly.
//
// Recommendation flow:
//   1. Load the user's normalized profile (bounded by profile_timeout)
//   2. Score candidates (quality, or relevance + quality by variant)
//   3. Round-robin across categories (optional) and cut to `limit`

use crate::error::Result;
use crate::models::{ExperimentRecord, Rankable, RecommendOptions, UserProfile, UserSignals};
use crate::services::diversity::Diversifier;
use crate::services::experiments::{ExperimentAssigner, MetricsRecorder};
use crate::services::scoring::ScoringEngine;
use crate::services::signals::SignalStore;
use crate::storage::PersonalizationRepository;
use crate::utils::RandomSource;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound on profile loading during recommendations
    pub profile_timeout: Duration,
    /// Tie-break jitter magnitude
    pub tie_break_jitter: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            profile_timeout: Duration::from_millis(250),
            tie_break_jitter: crate::services::scoring::MAX_JITTER,
        }
    }
}

pub struct PersonalizationEngine {
    signals: SignalStore,
    scoring: ScoringEngine,
    diversifier: Diversifier,
    assigner: ExperimentAssigner,
    metrics: MetricsRecorder,
    repository: Arc<dyn PersonalizationRepository>,
    profile_timeout: Duration,
}

impl PersonalizationEngine {
    pub fn new(
        repository: Arc<dyn PersonalizationRepository>,
        rng: Arc<dyn RandomSource>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            signals: SignalStore::new(repository.clone()),
            scoring: ScoringEngine::new(rng.clone()).with_jitter(settings.tie_break_jitter),
            diversifier: Diversifier::new(),
            assigner: ExperimentAssigner::new(repository.clone(), rng),
            metrics: MetricsRecorder::new(repository.clone()),
            repository,
            profile_timeout: settings.profile_timeout,
        }
    }

    /// Record a user interaction. Never fails; storage problems are logged.
    pub async fn log_interaction<T>(&self, user_id: &str, item_type: &str, item: &T, action: &str)
    where
        T: Rankable + ?Sized,
    {
        if let Err(e) = self
            .signals
            .record_interaction(user_id, item_type, item, action)
            .await
        {
            warn!(
                user_id = user_id,
                item_type = item_type,
                action = action,
                error = %e,
                "Failed to record interaction"
            );
        }
    }

    /// Rank `candidates` for the user and return at most `options.limit` of
    /// them. Only items from `candidates` are returned, each at most once.
    ///
    /// If the profile cannot be loaded in time the ranking degrades to
    /// quality-only scoring instead of failing.
    pub async fn get_recommendations<T>(
        &self,
        user_id: &str,
        item_type: &str,
        candidates: &[T],
        options: &RecommendOptions,
    ) -> Vec<T>
    where
        T: Rankable + Clone,
    {
        if candidates.is_empty() || options.limit == 0 {
            return Vec::new();
        }

        let profile = self.profile_or_default(user_id).await;
        let scored = self.scoring.rank(candidates, &profile, &options.variant);
        let selected = self
            .diversifier
            .rerank(scored, options.limit, options.diversify);

        debug!(
            user_id = user_id,
            item_type = item_type,
            variant = %options.variant,
            candidates = candidates.len(),
            returned = selected.len(),
            diversify = options.diversify,
            "Recommendations ranked"
        );

        selected.into_iter().cloned().collect()
    }

    async fn profile_or_default(&self, user_id: &str) -> UserProfile {
        match tokio::time::timeout(self.profile_timeout, self.signals.load_profile(user_id)).await {
            Ok(Ok(profile)) => profile,
            Ok(Err(e)) => {
                warn!(
                    user_id = user_id,
                    error = %e,
                    "Profile unavailable, falling back to quality-only ranking"
                );
                UserProfile::default()
            }
            Err(_) => {
                warn!(
                    user_id = user_id,
                    timeout_ms = self.profile_timeout.as_millis() as u64,
                    "Profile load timed out, falling back to quality-only ranking"
                );
                UserProfile::default()
            }
        }
    }

    /// Normalized interest profile
    pub async fn profile(&self, user_id: &str) -> Result<UserProfile> {
        self.signals.load_profile(user_id).await
    }

    /// Raw accumulated signals
    pub async fn signals(&self, user_id: &str) -> Result<UserSignals> {
        self.signals.load_signals(user_id).await
    }

    pub async fn assign_variant(
        &self,
        user_id: &str,
        experiment_id: &str,
        variants: &[String],
    ) -> Result<String> {
        self.assigner.assign(user_id, experiment_id, variants).await
    }

    pub async fn record_impression(
        &self,
        user_id: &str,
        experiment_id: &str,
        variant: &str,
        count: f64,
    ) -> Result<ExperimentRecord> {
        self.metrics
            .record_impression(user_id, experiment_id, variant, count)
            .await
    }

    pub async fn record_conversion(
        &self,
        user_id: &str,
        experiment_id: &str,
        variant: &str,
        weight: f64,
    ) -> Result<ExperimentRecord> {
        self.metrics
            .record_conversion(user_id, experiment_id, variant, weight)
            .await
    }

    pub async fn experiment(
        &self,
        user_id: &str,
        experiment_id: &str,
    ) -> Result<Option<ExperimentRecord>> {
        self.repository.get_experiment(user_id, experiment_id).await
    }

    pub async fn experiments(&self, user_id: &str) -> Result<BTreeMap<String, ExperimentRecord>> {
        self.repository.list_experiments(user_id).await
    }
}
