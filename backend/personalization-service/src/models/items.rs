use super::{FeatureSet, Rankable};
use crate::services::features::{extract, RawFeatures};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Loosely-typed content record supplied by the host application.
///
/// The raw JSON object is kept as-is so ranked items go back to the caller
/// unchanged. Accessors read fields with the host's truthiness rules: a
/// field that is missing or has an unexpected type counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentItem(Map<String, Value>);

const POPULARITY_FIELDS: [&str; 4] = ["views", "studentsEnrolled", "memberCount", "attendeeCount"];

impl ContentItem {
    /// Build from any JSON value; non-objects become an empty item
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            _ => Self::default(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    fn text(&self, field: &str) -> Option<&str> {
        match self.0.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    fn list(&self, field: &str) -> Option<Vec<String>> {
        match self.0.get(field) {
            Some(Value::Array(values)) => Some(
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => None,
        }
    }

    fn number(&self, field: &str) -> Option<f64> {
        self.0
            .get(field)
            .and_then(Value::as_f64)
            .filter(|n| n.is_finite() && *n != 0.0)
    }

    fn flag(&self, field: &str) -> bool {
        self.0.get(field).map(is_truthy).unwrap_or(false)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Rankable for ContentItem {
    fn item_id(&self) -> Option<String> {
        match self.0.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    fn popularity(&self) -> f64 {
        POPULARITY_FIELDS
            .iter()
            .find_map(|field| self.number(field))
            .unwrap_or(0.0)
    }

    fn rating(&self) -> f64 {
        self.number("rating").unwrap_or(0.0)
    }

    fn promoted(&self) -> bool {
        self.flag("featured") || self.flag("trending")
    }

    fn features(&self) -> FeatureSet {
        let topics = self.list("topics").unwrap_or_default();
        let categories = self.list("categories").unwrap_or_default();
        let keywords = self.list("keywords").unwrap_or_default();
        let tags = self.list("tags").unwrap_or_default();

        extract(RawFeatures {
            topics: &topics,
            category: self.text("category"),
            categories: &categories,
            level: self.text("level"),
            keywords: &keywords,
            tags: &tags,
        })
    }

    fn primary_category(&self) -> Option<&str> {
        self.text("category")
    }

    fn recency_topics(&self) -> Vec<String> {
        self.list("topics")
            .or_else(|| self.list("tags"))
            .unwrap_or_default()
    }
}

// ============================================
// Typed content kinds
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Paper {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    pub topics: Vec<String>,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    pub rating: Option<f64>,
    pub views: u64,
    pub featured: bool,
    pub trending: bool,
}

impl Rankable for Paper {
    fn item_id(&self) -> Option<String> {
        non_empty_id(&self.id)
    }

    fn popularity(&self) -> f64 {
        self.views as f64
    }

    fn rating(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    fn promoted(&self) -> bool {
        self.featured || self.trending
    }

    fn features(&self) -> FeatureSet {
        extract(RawFeatures {
            topics: &self.topics,
            category: self.category.as_deref(),
            keywords: &self.keywords,
            tags: &self.tags,
            ..Default::default()
        })
    }

    fn primary_category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    fn recency_topics(&self) -> Vec<String> {
        first_non_empty(&self.topics, &self.tags)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    pub level: Option<String>,
    pub topics: Vec<String>,
    pub tags: Vec<String>,
    pub rating: Option<f64>,
    pub students_enrolled: u64,
    pub featured: bool,
}

impl Rankable for Course {
    fn item_id(&self) -> Option<String> {
        non_empty_id(&self.id)
    }

    fn popularity(&self) -> f64 {
        self.students_enrolled as f64
    }

    fn rating(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    fn promoted(&self) -> bool {
        self.featured
    }

    fn features(&self) -> FeatureSet {
        extract(RawFeatures {
            topics: &self.topics,
            category: self.category.as_deref(),
            level: self.level.as_deref(),
            tags: &self.tags,
            ..Default::default()
        })
    }

    fn primary_category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    fn recency_topics(&self) -> Vec<String> {
        first_non_empty(&self.topics, &self.tags)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub categories: Vec<String>,
    pub topics: Vec<String>,
    pub tags: Vec<String>,
    pub member_count: u64,
    pub trending: bool,
}

impl Rankable for Group {
    fn item_id(&self) -> Option<String> {
        non_empty_id(&self.id)
    }

    fn popularity(&self) -> f64 {
        self.member_count as f64
    }

    fn rating(&self) -> f64 {
        0.0
    }

    fn promoted(&self) -> bool {
        self.trending
    }

    fn features(&self) -> FeatureSet {
        extract(RawFeatures {
            topics: &self.topics,
            category: self.category.as_deref(),
            categories: &self.categories,
            tags: &self.tags,
            ..Default::default()
        })
    }

    fn primary_category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    fn recency_topics(&self) -> Vec<String> {
        first_non_empty(&self.topics, &self.tags)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    pub level: Option<String>,
    pub topics: Vec<String>,
    pub tags: Vec<String>,
    pub rating: Option<f64>,
    pub attendee_count: u64,
    pub featured: bool,
}

impl Rankable for Event {
    fn item_id(&self) -> Option<String> {
        non_empty_id(&self.id)
    }

    fn popularity(&self) -> f64 {
        self.attendee_count as f64
    }

    fn rating(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    fn promoted(&self) -> bool {
        self.featured
    }

    fn features(&self) -> FeatureSet {
        extract(RawFeatures {
            topics: &self.topics,
            category: self.category.as_deref(),
            level: self.level.as_deref(),
            tags: &self.tags,
            ..Default::default()
        })
    }

    fn primary_category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    fn recency_topics(&self) -> Vec<String> {
        first_non_empty(&self.topics, &self.tags)
    }
}

fn non_empty_id(id: &str) -> Option<String> {
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

fn first_non_empty(topics: &[String], tags: &[String]) -> Vec<String> {
    if topics.is_empty() {
        tags.to_vec()
    } else {
        topics.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> ContentItem {
        ContentItem::from_value(value)
    }

    #[test]
    fn test_popularity_uses_first_positive_proxy() {
        assert_eq!(item(json!({"views": 100})).popularity(), 100.0);
        assert_eq!(
            item(json!({"views": 0, "studentsEnrolled": 40})).popularity(),
            40.0
        );
        assert_eq!(item(json!({"attendeeCount": 7})).popularity(), 7.0);
        assert_eq!(item(json!({"views": "lots"})).popularity(), 0.0);
        assert_eq!(item(json!({})).popularity(), 0.0);
    }

    #[test]
    fn test_promotion_flags() {
        assert!(item(json!({"featured": true})).promoted());
        assert!(item(json!({"trending": true})).promoted());
        assert!(!item(json!({"featured": false, "trending": null})).promoted());
    }

    #[test]
    fn test_id_accepts_strings_and_numbers() {
        assert_eq!(item(json!({"id": "p1"})).item_id(), Some("p1".to_string()));
        assert_eq!(item(json!({"id": 17})).item_id(), Some("17".to_string()));
        assert_eq!(item(json!({"id": ""})).item_id(), None);
        assert_eq!(item(json!({"title": "no id"})).item_id(), None);
    }

    #[test]
    fn test_malformed_fields_degrade_to_empty() {
        let malformed = item(json!({
            "id": "m1",
            "topics": "not-a-list",
            "category": 12,
            "rating": "five",
            "tags": [1, "valid", null]
        }));

        let features = malformed.features();
        assert_eq!(features.topics, vec!["valid".to_string()]);
        assert!(features.categories.is_empty());
        assert_eq!(malformed.rating(), 0.0);
    }

    #[test]
    fn test_recency_topics_fall_back_to_tags() {
        assert_eq!(
            item(json!({"tags": ["mdma"]})).recency_topics(),
            vec!["mdma".to_string()]
        );
        assert_eq!(
            item(json!({"topics": ["ptsd"], "tags": ["mdma"]})).recency_topics(),
            vec!["ptsd".to_string()]
        );
    }

    #[test]
    fn test_diversity_bucket_fallbacks() {
        assert_eq!(item(json!({"category": "research"})).diversity_bucket(), "research");
        assert_eq!(
            item(json!({"categories": ["clinical", "policy"]})).diversity_bucket(),
            "clinical"
        );
        assert_eq!(item(json!({})).diversity_bucket(), "general");
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let raw = json!({"id": "c1", "title": "Intro", "instructor": {"name": "Ada"}});
        let parsed: ContentItem = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
    }

    #[test]
    fn test_typed_kinds_expose_popularity_proxies() {
        let course = Course {
            id: "c1".to_string(),
            level: Some("advanced".to_string()),
            students_enrolled: 250,
            ..Default::default()
        };
        assert_eq!(course.popularity(), 250.0);
        assert_eq!(course.features().levels, vec!["advanced".to_string()]);

        let group = Group {
            id: "g1".to_string(),
            categories: vec!["community".to_string()],
            member_count: 12,
            trending: true,
            ..Default::default()
        };
        assert!(group.promoted());
        assert_eq!(group.diversity_bucket(), "community");

        let event = Event {
            id: "e1".to_string(),
            attendee_count: 30,
            ..Default::default()
        };
        assert_eq!(event.popularity(), 30.0);
        assert_eq!(event.diversity_bucket(), "general");
    }
}
