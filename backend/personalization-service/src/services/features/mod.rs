// ============================================
// Feature Extraction
// ============================================
//
// Maps an item's metadata onto the four feature dimensions:
//   topics     = topics ++ tags
//   categories = [category] ++ categories
//   levels     = [level]
//   keywords   = keywords ++ tags
//
// Tags feed both the topic and the keyword dimension.
// Empty values are dropped; missing fields yield empty dimensions.

use crate::models::FeatureSet;

/// Borrowed view of the metadata fields features are drawn from
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFeatures<'a> {
    pub topics: &'a [String],
    pub category: Option<&'a str>,
    pub categories: &'a [String],
    pub level: Option<&'a str>,
    pub keywords: &'a [String],
    pub tags: &'a [String],
}

pub fn extract(raw: RawFeatures<'_>) -> FeatureSet {
    FeatureSet {
        topics: collect(raw.topics.iter().chain(raw.tags)),
        categories: collect(
            raw.category
                .into_iter()
                .chain(raw.categories.iter().map(String::as_str)),
        ),
        levels: collect(raw.level),
        keywords: collect(raw.keywords.iter().chain(raw.tags)),
    }
}

fn collect<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter(|v| !v.as_ref().is_empty())
        .map(|v| v.as_ref().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tags_fold_into_topics_and_keywords() {
        let topics = strings(&["neuroscience"]);
        let tags = strings(&["psilocybin"]);
        let keywords = strings(&["dmn"]);

        let features = extract(RawFeatures {
            topics: &topics,
            keywords: &keywords,
            tags: &tags,
            ..Default::default()
        });

        assert_eq!(features.topics, strings(&["neuroscience", "psilocybin"]));
        assert_eq!(features.keywords, strings(&["dmn", "psilocybin"]));
    }

    #[test]
    fn test_category_concatenated_with_categories() {
        let categories = strings(&["clinical", "education"]);
        let features = extract(RawFeatures {
            category: Some("research"),
            categories: &categories,
            level: Some("beginner"),
            ..Default::default()
        });

        assert_eq!(
            features.categories,
            strings(&["research", "clinical", "education"])
        );
        assert_eq!(features.levels, strings(&["beginner"]));
    }

    #[test]
    fn test_empty_input_yields_empty_features() {
        let features = extract(RawFeatures::default());
        assert_eq!(features, FeatureSet::default());
    }

    #[test]
    fn test_empty_values_are_dropped() {
        let topics = strings(&["", "therapy"]);
        let features = extract(RawFeatures {
            topics: &topics,
            category: Some(""),
            ..Default::default()
        });

        assert_eq!(features.topics, strings(&["therapy"]));
        assert!(features.categories.is_empty());
    }
}
