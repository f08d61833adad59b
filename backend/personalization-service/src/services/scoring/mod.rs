//! Scoring Module
//!
//! Ranks content items by blended quality and relevance.
//!
//! # Formulas
//! - **Quality**: `ln(1 + popularity) + rating * 0.6 + (promoted ? 1.2 : 0)`
//! - **Relevance**: per dimension, `Σ profile[dim][value] * multiplier`
//!   (topics 2.2, categories 1.8, levels 1.2, keywords 0.8), plus 0.4 when an
//!   item topic appears in the profile's recent topics
//! - **Final**: control variant = quality only; every other variant =
//!   relevance + quality
//!
//! A uniform jitter of at most `jitter` is added to the final score to break
//! exact ties; set it to 0 for fully deterministic orderings.
use crate::models::{Rankable, UserProfile, CONTROL_VARIANT};
use crate::utils::RandomSource;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// Upper bound for tie-break jitter
pub const MAX_JITTER: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    pub rating: f64,
    pub promotion_bonus: f64,
    pub topics: f64,
    pub categories: f64,
    pub levels: f64,
    pub keywords: f64,
    pub recent_topic_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            rating: 0.6,
            promotion_bonus: 1.2,
            topics: 2.2,
            categories: 1.8,
            levels: 1.2,
            keywords: 0.8,
            recent_topic_bonus: 0.4,
        }
    }
}

/// An item paired with its final score
#[derive(Debug, Clone)]
pub struct ScoredItem<'a, T> {
    pub item: &'a T,
    pub score: f64,
}

pub struct ScoringEngine {
    weights: ScoringWeights,
    jitter: f64,
    rng: Arc<dyn RandomSource>,
}

impl ScoringEngine {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self {
            weights: ScoringWeights::default(),
            jitter: MAX_JITTER,
            rng,
        }
    }

    /// Override the tie-break jitter, clamped to `[0, MAX_JITTER]`
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_finite() {
            jitter.clamp(0.0, MAX_JITTER)
        } else {
            0.0
        };
        self
    }

    pub fn quality_score<T: Rankable + ?Sized>(&self, item: &T) -> f64 {
        let popularity = item.popularity().max(0.0);
        let rating = item.rating();
        let promotion = if item.promoted() {
            self.weights.promotion_bonus
        } else {
            0.0
        };

        (1.0 + popularity).ln() + rating * self.weights.rating + promotion
    }

    pub fn relevance_score<T: Rankable + ?Sized>(&self, item: &T, profile: &UserProfile) -> f64 {
        let features = item.features();

        let topical = bucket_score(&features.topics, &profile.topics, self.weights.topics);
        let categorical =
            bucket_score(&features.categories, &profile.categories, self.weights.categories);
        let level_fit = bucket_score(&features.levels, &profile.levels, self.weights.levels);
        let keyword_fit =
            bucket_score(&features.keywords, &profile.keywords, self.weights.keywords);

        let recent_boost = if features
            .topics
            .iter()
            .any(|topic| profile.recent_topics.contains(topic))
        {
            self.weights.recent_topic_bonus
        } else {
            0.0
        };

        topical + categorical + level_fit + keyword_fit + recent_boost
    }

    /// Variant-aware score without jitter
    pub fn base_score<T: Rankable + ?Sized>(
        &self,
        item: &T,
        profile: &UserProfile,
        variant: &str,
    ) -> f64 {
        let quality = self.quality_score(item);
        if variant == CONTROL_VARIANT {
            quality
        } else {
            self.relevance_score(item, profile) + quality
        }
    }

    pub fn final_score<T: Rankable + ?Sized>(
        &self,
        item: &T,
        profile: &UserProfile,
        variant: &str,
    ) -> f64 {
        let base = self.base_score(item, profile, variant);
        if self.jitter > 0.0 {
            base + self.rng.next_f64() * self.jitter
        } else {
            base
        }
    }

    /// Score every item and sort descending; equal scores keep input order
    pub fn rank<'a, T: Rankable>(
        &self,
        items: &'a [T],
        profile: &UserProfile,
        variant: &str,
    ) -> Vec<ScoredItem<'a, T>> {
        let mut scored: Vec<ScoredItem<'a, T>> = items
            .iter()
            .map(|item| ScoredItem {
                item,
                score: self.final_score(item, profile, variant),
            })
            .collect();

        // NaN scores sort as equal
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored
    }
}

fn bucket_score(values: &[String], bucket: &HashMap<String, f64>, multiplier: f64) -> f64 {
    values
        .iter()
        .map(|value| bucket.get(value).copied().unwrap_or(0.0) * multiplier)
        .sum()
}
