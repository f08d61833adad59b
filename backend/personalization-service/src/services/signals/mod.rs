// ============================================
// Signal Store
// ============================================
//
// Learns per-user topical interest from interaction events.
//
// Weight update per interaction (w = action weight):
//   topics / categories / levels  += w
//   keywords                      += w / 2
//
// Weights never decay. The recency log keeps the newest interaction per item
// id at the front, capped at RECENCY_CAPACITY entries.

use crate::error::Result;
use crate::models::{
    action_weight, FeatureSet, Rankable, RecencyEntry, UserProfile, UserSignals,
    RECENCY_CAPACITY, RECENT_TOPICS_LIMIT,
};
use crate::storage::PersonalizationRepository;
use crate::utils::{normalize_weights, now_millis, KeyedLocks};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SignalStore {
    repository: Arc<dyn PersonalizationRepository>,
    locks: KeyedLocks,
}

impl SignalStore {
    pub fn new(repository: Arc<dyn PersonalizationRepository>) -> Self {
        Self {
            repository,
            locks: KeyedLocks::new(),
        }
    }

    /// Fold one interaction into the user's signals.
    ///
    /// Items without an id are ignored. The read-modify-write runs under the
    /// user's lock so concurrent interactions never drop weight.
    pub async fn record_interaction<T>(
        &self,
        user_id: &str,
        item_type: &str,
        item: &T,
        action: &str,
    ) -> Result<()>
    where
        T: Rankable + ?Sized,
    {
        let Some(item_id) = item.item_id() else {
            debug!(user_id = user_id, item_type = item_type, "Skipping interaction without item id");
            return Ok(());
        };

        let _guard = self.locks.lock(user_id).await;

        let mut signals = self.load_signals(user_id).await?;
        let weight = action_weight(action);
        apply_weights(&mut signals, &item.features(), weight);
        push_recency(
            &mut signals.recency,
            RecencyEntry {
                item_type: item_type.to_string(),
                id: item_id.clone(),
                category: item.primary_category().map(str::to_string),
                topics: item.recency_topics(),
                timestamp_millis: now_millis(),
            },
        );

        let raw = serde_json::to_string(&signals)?;
        self.repository.save_signals(user_id, &raw).await?;

        debug!(
            user_id = user_id,
            item_type = item_type,
            item_id = %item_id,
            action = action,
            weight = weight,
            recency_len = signals.recency.len(),
            "Interaction recorded"
        );

        Ok(())
    }

    /// Raw accumulated signals.
    ///
    /// A stored record that fails to parse is logged and replaced by the empty
    /// default; only storage failures are returned as errors.
    pub async fn load_signals(&self, user_id: &str) -> Result<UserSignals> {
        let Some(raw) = self.repository.load_signals(user_id).await? else {
            return Ok(UserSignals::default());
        };

        match serde_json::from_str::<UserSignals>(&raw) {
            Ok(signals) => Ok(signals),
            Err(e) => {
                warn!(
                    user_id = user_id,
                    error = %e,
                    "Failed to parse stored signals, starting from empty profile"
                );
                Ok(UserSignals::default())
            }
        }
    }

    /// Normalized profile used for relevance scoring
    pub async fn load_profile(&self, user_id: &str) -> Result<UserProfile> {
        let signals = self.load_signals(user_id).await?;
        Ok(build_profile(&signals))
    }
}

/// Normalize each bucket by its own total and collect the leading recent topics
pub fn build_profile(signals: &UserSignals) -> UserProfile {
    UserProfile {
        topics: normalize_weights(&signals.topics),
        categories: normalize_weights(&signals.categories),
        levels: normalize_weights(&signals.levels),
        keywords: normalize_weights(&signals.keywords),
        recent_topics: signals
            .recency
            .iter()
            .flat_map(|entry| entry.topics.iter().cloned())
            .take(RECENT_TOPICS_LIMIT)
            .collect(),
    }
}

fn apply_weights(signals: &mut UserSignals, features: &FeatureSet, weight: f64) {
    add_weight(&mut signals.topics, &features.topics, weight);
    add_weight(&mut signals.categories, &features.categories, weight);
    add_weight(&mut signals.levels, &features.levels, weight);
    add_weight(&mut signals.keywords, &features.keywords, weight / 2.0);
}

fn add_weight(bucket: &mut HashMap<String, f64>, keys: &[String], weight: f64) {
    for key in keys.iter().filter(|k| !k.is_empty()) {
        *bucket.entry(key.clone()).or_insert(0.0) += weight;
    }
}

fn push_recency(recency: &mut Vec<RecencyEntry>, entry: RecencyEntry) {
    recency.retain(|existing| existing.id != entry.id);
    recency.insert(0, entry);
    recency.truncate(RECENCY_CAPACITY);
}
