use personalization_service::models::{
    ContentItem, Course, RecommendOptions, CONTROL_VARIANT, PERSONALIZED_VARIANT,
};
use personalization_service::storage::{
    InMemoryRepository, PersonalizationRepository, RedisRepository,
};
use personalization_service::utils::SeededRandom;
use personalization_service::{EngineSettings, PersonalizationEngine, PersonalizationError};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

fn engine_with(repository: Arc<dyn PersonalizationRepository>, seed: u64) -> PersonalizationEngine {
    PersonalizationEngine::new(
        repository,
        Arc::new(SeededRandom::new(seed)),
        EngineSettings {
            tie_break_jitter: 0.0,
            ..Default::default()
        },
    )
}

fn engine() -> PersonalizationEngine {
    engine_with(Arc::new(InMemoryRepository::new()), 42)
}

fn items(values: Vec<serde_json::Value>) -> Vec<ContentItem> {
    values.into_iter().map(ContentItem::from_value).collect()
}

fn ids(items: &[ContentItem]) -> Vec<String> {
    items.iter().filter_map(|i| i.get("id")).filter_map(|v| v.as_str().map(String::from)).collect()
}

#[tokio::test]
async fn test_enrolled_topic_lifts_featured_paper() {
    let engine = engine();
    let papers = items(vec![
        json!({"id": "i1", "category": "research", "topics": ["psilocybin"], "rating": 4.5, "views": 100}),
        json!({"id": "i7", "category": "research", "topics": ["psilocybin", "neuroscience"], "rating": 4.8, "views": 300, "featured": true}),
    ]);

    engine
        .log_interaction(
            "student-1",
            "paper",
            &ContentItem::from_value(json!({"id": "x1", "topics": ["psilocybin"]})),
            "enroll",
        )
        .await;

    let options = RecommendOptions {
        limit: 2,
        diversify: false,
        variant: PERSONALIZED_VARIANT.to_string(),
    };
    let ranked = engine
        .get_recommendations("student-1", "paper", &papers, &options)
        .await;

    assert_eq!(ids(&ranked), vec!["i7", "i1"]);
}

#[tokio::test]
async fn test_personalization_reorders_against_control() {
    let engine = engine();
    let papers = items(vec![
        json!({"id": "popular", "category": "clinical", "topics": ["therapy"], "views": 500, "rating": 4.0}),
        json!({"id": "niche", "category": "research", "topics": ["ketamine"], "views": 20, "rating": 3.5}),
    ]);

    for i in 0..3 {
        let paper = ContentItem::from_value(json!({
            "id": format!("k{}", i),
            "category": "research",
            "topics": ["ketamine"]
        }));
        engine.log_interaction("u1", "paper", &paper, "complete").await;
    }

    let control = RecommendOptions {
        limit: 2,
        diversify: false,
        variant: CONTROL_VARIANT.to_string(),
    };
    let personalized = RecommendOptions {
        variant: PERSONALIZED_VARIANT.to_string(),
        ..control.clone()
    };

    let control_ids = ids(&engine.get_recommendations("u1", "paper", &papers, &control).await);
    let personalized_ids =
        ids(&engine.get_recommendations("u1", "paper", &papers, &personalized).await);

    assert_eq!(control_ids, vec!["popular", "niche"]);
    assert_eq!(personalized_ids, vec!["niche", "popular"]);
}

#[tokio::test]
async fn test_diversified_results_span_categories() {
    let engine = engine();
    let catalog = items(vec![
        json!({"id": "r1", "category": "research", "views": 900}),
        json!({"id": "r2", "category": "research", "views": 800}),
        json!({"id": "r3", "category": "research", "views": 700}),
        json!({"id": "c1", "category": "clinical", "views": 50}),
        json!({"id": "c2", "category": "clinical", "views": 40}),
        json!({"id": "e1", "category": "education", "views": 10}),
    ]);

    let options = RecommendOptions {
        limit: 3,
        ..Default::default()
    };
    let ranked = engine
        .get_recommendations("u1", "paper", &catalog, &options)
        .await;

    assert_eq!(ids(&ranked), vec!["r1", "c1", "e1"]);
    let categories: HashSet<String> = ranked
        .iter()
        .filter_map(|i| i.get("category").and_then(|v| v.as_str()).map(String::from))
        .collect();
    assert_eq!(categories.len(), 3);
}

#[tokio::test]
async fn test_typed_items_rank_by_their_own_popularity() {
    let engine = engine();
    let courses = vec![
        Course {
            id: "small".to_string(),
            students_enrolled: 10,
            ..Default::default()
        },
        Course {
            id: "large".to_string(),
            students_enrolled: 2000,
            ..Default::default()
        },
    ];

    let options = RecommendOptions {
        diversify: false,
        ..Default::default()
    };
    let ranked = engine
        .get_recommendations("u1", "course", &courses, &options)
        .await;

    let ranked_ids: Vec<&str> = ranked.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ranked_ids, vec!["large", "small"]);
}

#[tokio::test]
async fn test_recommendations_do_not_mutate_signals() {
    let engine = engine();
    let catalog = items(vec![json!({"id": "a", "topics": ["t"]})]);

    engine
        .get_recommendations("u1", "paper", &catalog, &RecommendOptions::default())
        .await;

    let signals = engine.signals("u1").await.unwrap();
    assert!(signals.topics.is_empty());
    assert!(signals.recency.is_empty());
}

#[tokio::test]
async fn test_sticky_assignment_and_counters() {
    let engine = engine();
    let variants = vec!["A".to_string(), "B".to_string()];

    let first = engine.assign_variant("u1", "exp1", &variants).await.unwrap();
    let second = engine.assign_variant("u1", "exp1", &variants).await.unwrap();
    assert_eq!(first, second);

    engine.record_conversion("u1", "exp1", &first, 1.0).await.unwrap();
    engine.record_conversion("u1", "exp1", &first, 1.0).await.unwrap();
    let record = engine.record_conversion("u1", "exp1", &first, 2.0).await.unwrap();
    assert_eq!(record.conversions, 4.0);

    engine.record_impression("u1", "exp1", &first, 3.0).await.unwrap();
    let record = engine.record_impression("u1", "exp1", &first, 5.0).await.unwrap();
    assert_eq!(record.impressions, 8.0);
    assert_eq!(record.conversion_rate(), 0.5);

    let all = engine.experiments("u1").await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all["exp1"].variant, first);
}

#[tokio::test]
async fn test_assignment_rejects_empty_variants() {
    let engine = engine();
    let result = engine.assign_variant("u1", "exp1", &[]).await;
    assert!(matches!(result, Err(PersonalizationError::InvalidArgument(_))));
    assert!(engine.experiment("u1", "exp1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_seeded_assignment_is_reproducible() {
    let variants: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();

    let mut first_run = Vec::new();
    let mut second_run = Vec::new();
    for (run, seed) in [(&mut first_run, 7u64), (&mut second_run, 7u64)] {
        let engine = engine_with(Arc::new(InMemoryRepository::new()), seed);
        for user in 0..10 {
            run.push(
                engine
                    .assign_variant(&format!("user-{}", user), "exp", &variants)
                    .await
                    .unwrap(),
            );
        }
    }

    assert_eq!(first_run, second_run);
}

#[tokio::test]
async fn test_redis_repository_roundtrip() {
    // Requires Redis running on localhost:6379
    let client = match redis::Client::open("redis://127.0.0.1:6379") {
        Ok(c) => c,
        Err(_) => {
            eprintln!("Skipping test: Redis not available");
            return;
        }
    };
    if client.get_multiplexed_async_connection().await.is_err() {
        eprintln!("Skipping test: Redis connection failed");
        return;
    }

    let prefix = format!("personalization-test-{}", chrono::Utc::now().timestamp_millis());
    let engine = engine_with(Arc::new(RedisRepository::new(client, prefix)), 3);

    engine
        .log_interaction(
            "u1",
            "paper",
            &ContentItem::from_value(json!({"id": "p1", "topics": ["t"]})),
            "save",
        )
        .await;
    assert_eq!(engine.signals("u1").await.unwrap().topics["t"], 4.0);

    let variant = engine
        .assign_variant("u1", "exp", &["A".to_string()])
        .await
        .unwrap();
    assert_eq!(variant, "A");
    let record = engine.record_conversion("u1", "exp", "A", 2.5).await.unwrap();
    assert_eq!(record.conversions, 2.5);
    assert_eq!(engine.experiments("u1").await.unwrap().len(), 1);
}
