use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

pub mod items;

pub use items::{ContentItem, Course, Event, Group, Paper};

/// Baseline arm: ranks by quality only.
pub const CONTROL_VARIANT: &str = "control";
pub const PERSONALIZED_VARIANT: &str = "personalized";

pub const DEFAULT_LIMIT: usize = 6;
/// Maximum number of entries kept in the recency log
pub const RECENCY_CAPACITY: usize = 25;
/// Number of topics drawn from the recency log into a profile
pub const RECENT_TOPICS_LIMIT: usize = 10;

/// Bucket name for items that carry no category at all
pub const GENERAL_BUCKET: &str = "general";

/// The four feature dimensions shared by user interest and item content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub topics: Vec<String>,
    pub categories: Vec<String>,
    pub levels: Vec<String>,
    pub keywords: Vec<String>,
}

/// Capability interface every rankable content kind implements.
///
/// Extraction and scoring only ever see items through this trait, so papers,
/// courses, groups, events and loosely-typed host records rank side by side.
pub trait Rankable {
    fn item_id(&self) -> Option<String>;

    /// Raw popularity proxy (views, enrollments, members, attendees)
    fn popularity(&self) -> f64;

    fn rating(&self) -> f64;

    /// Featured or trending
    fn promoted(&self) -> bool;

    fn features(&self) -> FeatureSet;

    fn primary_category(&self) -> Option<&str>;

    /// Topics remembered in the recency log for this item
    fn recency_topics(&self) -> Vec<String>;

    /// Category bucket used by the diversifier
    fn diversity_bucket(&self) -> String {
        self.features()
            .categories
            .into_iter()
            .next()
            .unwrap_or_else(|| GENERAL_BUCKET.to_string())
    }
}

/// Interaction kinds and their signal weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Click,
    Save,
    Enroll,
    Rsvp,
    Join,
    Complete,
    Search,
}

impl Action {
    pub fn weight(&self) -> f64 {
        match self {
            Action::View => 1.0,
            Action::Click => 3.0,
            Action::Save => 4.0,
            Action::Enroll => 5.0,
            Action::Rsvp => 4.0,
            Action::Join => 4.0,
            Action::Complete => 6.0,
            Action::Search => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Click => "click",
            Action::Save => "save",
            Action::Enroll => "enroll",
            Action::Rsvp => "rsvp",
            Action::Join => "join",
            Action::Complete => "complete",
            Action::Search => "search",
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Action::View),
            "click" => Ok(Action::Click),
            "save" => Ok(Action::Save),
            "enroll" => Ok(Action::Enroll),
            "rsvp" => Ok(Action::Rsvp),
            "join" => Ok(Action::Join),
            "complete" => Ok(Action::Complete),
            "search" => Ok(Action::Search),
            other => Err(format!("unknown action: {}", other)),
        }
    }
}

/// Weight for an action name; unrecognized actions count as 1
pub fn action_weight(action: &str) -> f64 {
    action
        .parse::<Action>()
        .map(|a| a.weight())
        .unwrap_or(1.0)
}

/// One entry of the per-user recency log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecencyEntry {
    #[serde(rename = "type")]
    pub item_type: String,
    pub id: String,
    pub category: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(rename = "timestampMillis", default)]
    pub timestamp_millis: i64,
}

/// Persisted `signals` record: raw accumulated weights plus the recency log.
///
/// Missing sections deserialize to empty, so partially written records still
/// load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSignals {
    pub topics: HashMap<String, f64>,
    pub categories: HashMap<String, f64>,
    pub levels: HashMap<String, f64>,
    pub keywords: HashMap<String, f64>,
    pub recency: Vec<RecencyEntry>,
}

/// Normalized read view of [`UserSignals`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub topics: HashMap<String, f64>,
    pub categories: HashMap<String, f64>,
    pub levels: HashMap<String, f64>,
    pub keywords: HashMap<String, f64>,
    pub recent_topics: Vec<String>,
}

impl UserProfile {
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
            && self.categories.is_empty()
            && self.levels.is_empty()
            && self.keywords.is_empty()
            && self.recent_topics.is_empty()
    }
}

/// Per-user state of one experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub variant: String,
    pub impressions: f64,
    pub conversions: f64,
}

impl ExperimentRecord {
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            impressions: 0.0,
            conversions: 0.0,
        }
    }

    pub fn conversion_rate(&self) -> f64 {
        if self.impressions > 0.0 {
            self.conversions / self.impressions
        } else {
            0.0
        }
    }
}

/// Options for a recommendation request
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendOptions {
    pub limit: usize,
    pub diversify: bool,
    pub variant: String,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            diversify: true,
            variant: PERSONALIZED_VARIANT.to_string(),
        }
    }
}
