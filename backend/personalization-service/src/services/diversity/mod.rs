use crate::models::Rankable;
use crate::services::scoring::ScoredItem;
use std::collections::{HashMap, VecDeque};

/// Diversity Layer - category round-robin
///
/// Buckets score-sorted items by category (first appearance order), then
/// takes one item from the front of each bucket per round until the limit
/// is reached, so one category cannot fill the whole list.
#[derive(Debug, Clone, Copy, Default)]
pub struct Diversifier;

impl Diversifier {
    pub fn new() -> Self {
        Self
    }

    /// Select up to `limit` items from a descending-score list.
    ///
    /// With `diversify == false` this is a plain truncation.
    pub fn rerank<'a, T: Rankable>(
        &self,
        scored: Vec<ScoredItem<'a, T>>,
        limit: usize,
        diversify: bool,
    ) -> Vec<&'a T> {
        if scored.is_empty() || limit == 0 {
            return Vec::new();
        }

        if !diversify {
            return scored.into_iter().take(limit).map(|s| s.item).collect();
        }

        let mut queues = self.bucket_by_category(scored);
        let mut selected: Vec<&'a T> = Vec::with_capacity(limit);

        while selected.len() < limit && queues.iter().any(|q| !q.is_empty()) {
            for queue in queues.iter_mut() {
                if selected.len() >= limit {
                    break;
                }
                if let Some(item) = queue.pop_front() {
                    selected.push(item);
                }
            }
        }

        selected
    }

    /// Group items into per-category queues, keeping score order inside each
    fn bucket_by_category<'a, T: Rankable>(
        &self,
        scored: Vec<ScoredItem<'a, T>>,
    ) -> Vec<VecDeque<&'a T>> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut queues: Vec<VecDeque<&'a T>> = Vec::new();

        for entry in scored {
            let bucket = entry.item.diversity_bucket();
            let slot = *index.entry(bucket).or_insert_with(|| {
                queues.push(VecDeque::new());
                queues.len() - 1
            });
            queues[slot].push_back(entry.item);
        }

        queues
    }
}
