//! Resolver cascade against in-memory and scripted sources

use agora_knowledge::{
    Article, Confidence, GroundingResolver, InMemorySource, KnowledgeSource, LookupError,
    TitleCache,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Exact-query search results and per-title fetch outcomes
#[derive(Debug, Default)]
struct ScriptedSource {
    searches: HashMap<String, Vec<String>>,
    pages: HashMap<String, Result<Article, LookupError>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn search_gives(mut self, query: &str, titles: &[&str]) -> Self {
        self.searches
            .insert(query.to_string(), titles.iter().map(|t| t.to_string()).collect());
        self
    }

    fn page(mut self, title: &str, outcome: Result<&str, LookupError>) -> Self {
        let outcome = outcome.map(|summary| Article {
            title: title.to_string(),
            summary: summary.to_string(),
        });
        self.pages.insert(title.to_string(), outcome);
        self
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, LookupError> {
        self.queries.lock().unwrap().push(query.to_string());
        let mut titles = self.searches.get(query).cloned().unwrap_or_default();
        titles.truncate(limit);
        Ok(titles)
    }

    async fn fetch_summary(&self, title: &str, _sentences: usize) -> Result<Article, LookupError> {
        self.pages
            .get(title)
            .cloned()
            .unwrap_or_else(|| Err(LookupError::NotFound(title.to_string())))
    }
}

const TOPIC: &str = "robots, quantum cuisine, and lasers";

fn quantum_cuisine() -> ScriptedSource {
    ScriptedSource::default()
        .search_gives(TOPIC, &["Quantum cuisine"])
        .page("Quantum cuisine", Err(LookupError::NotFound("Quantum cuisine".into())))
        .search_gives("cuisine", &["Cuisine"])
        .page("Cuisine", Ok("Cuisine is a style of cooking."))
}

#[tokio::test]
async fn direct_hit_is_high_and_related_topics_are_fresh() {
    let source = InMemorySource::new()
        .with_article("Privacy", "Privacy is the ability to seclude oneself. It is contested.")
        .with_article("Surveillance", "Surveillance is the monitoring of behavior.")
        .with_article("Surveillance capitalism", "An economic system.");
    let resolver = GroundingResolver::new(Arc::new(source)).with_seed(7);

    let result = resolver.resolve("AI's impact on privacy and surveillance").await;

    assert_eq!(result.confidence, Confidence::High);
    assert_eq!(
        result.summary.as_deref(),
        Some("Privacy is the ability to seclude oneself. It is contested.")
    );
    assert_eq!(result.key_points.len(), 2);
    // "Surveillance capitalism" falls under the relevance threshold
    assert_eq!(result.related_topics, vec!["Surveillance"]);
    for title in &result.related_topics {
        assert!(!resolver.cache().contains(title).await);
    }
}

#[tokio::test]
async fn jaguar_picks_best_disambiguation_option() {
    let source = InMemorySource::new()
        .with_disambiguation(
            "Jaguar",
            &["Jaguar (animal)", "Jaguar (car)", "Jaguar (operating system)"],
        )
        .with_article("Jaguar (animal)", "The jaguar is a large cat.")
        .with_article("Jaguar (car)", "Jaguar is a car maker.")
        .with_article("Jaguar (operating system)", "Mac OS X 10.2.");
    let resolver = GroundingResolver::new(Arc::new(source));

    let result = resolver.resolve("jaguar").await;

    assert_eq!(result.confidence, Confidence::Medium);
    assert_eq!(result.summary.as_deref(), Some("The jaguar is a large cat."));
    assert!(resolver.cache().contains("jaguar (animal)").await);
    assert!(!result.related_topics.iter().any(|t| t == "Jaguar (animal)"));
}

#[tokio::test]
async fn weak_disambiguation_options_are_not_forced() {
    let source = InMemorySource::new()
        .with_disambiguation("Jaguar", &["Panthera onca", "Land Rover"])
        .with_article("Panthera onca", "A big cat.")
        .with_article("Land Rover", "A car maker.");
    let resolver = GroundingResolver::new(Arc::new(source));

    let result = resolver.resolve("jaguar").await;

    assert_eq!(result.confidence, Confidence::None);
    assert_eq!(
        result.summary.as_deref(),
        Some("No information found for 'jaguar' or related terms.")
    );
    assert!(result.related_topics.is_empty());
    assert!(resolver.cache().is_empty().await);
}

#[tokio::test]
async fn cached_titles_are_skipped() {
    let cache = TitleCache::new();
    cache.insert("Privacy").await;
    let source = InMemorySource::new()
        .with_article("Privacy", "Old summary.")
        .with_article("Privacy law", "Privacy law regulates personal data.");
    let resolver = GroundingResolver::new(Arc::new(source)).with_cache(cache.clone());

    let result = resolver.resolve("privacy").await;

    assert_eq!(result.confidence, Confidence::High);
    assert_eq!(result.summary.as_deref(), Some("Privacy law regulates personal data."));
    assert!(cache.contains("privacy law").await);
    assert!(result.related_topics.is_empty());
}

#[tokio::test]
async fn lookup_errors_move_to_next_candidate() {
    let source = InMemorySource::new()
        .with_article("Privacy", "Unreachable.")
        .with_article("Information privacy", "Information privacy concerns data.")
        .with_outage("Privacy");
    let resolver = GroundingResolver::new(Arc::new(source));

    let result = resolver.resolve("privacy").await;

    assert_eq!(result.confidence, Confidence::High);
    assert_eq!(result.summary.as_deref(), Some("Information privacy concerns data."));
}

#[tokio::test]
async fn search_outage_degrades_to_none() {
    let source = InMemorySource::new()
        .with_article("Privacy", "Privacy.")
        .with_search_outage();
    let resolver = GroundingResolver::new(Arc::new(source));

    let result = resolver.resolve("privacy").await;
    assert_eq!(result.confidence, Confidence::None);
    assert!(result.key_points.is_empty());
}

#[tokio::test]
async fn full_topic_is_tried_after_every_key_term() {
    let source = Arc::new(
        ScriptedSource::default()
            .search_gives(TOPIC, &["Laser cooking robots"])
            .page(
                "Laser cooking robots",
                Ok("Laser cooking robots prepare food with light. They are experimental."),
            ),
    );
    let resolver = GroundingResolver::new(source.clone());

    let result = resolver.resolve(TOPIC).await;

    assert_eq!(result.confidence, Confidence::High);
    assert_eq!(
        result.summary.as_deref(),
        Some("Laser cooking robots prepare food with light. They are experimental.")
    );
    assert_eq!(result.key_points.len(), 2);
    assert!(result.related_topics.is_empty());
    assert!(resolver.cache().contains("laser cooking robots").await);

    let queries = source.queries();
    let full = queries.iter().position(|q| q == TOPIC).unwrap();
    let terms = agora_knowledge::terms::key_terms(TOPIC, resolver.config().key_terms);
    assert!(!terms.is_empty());
    for term in &terms {
        let at = queries.iter().position(|q| q == term).unwrap();
        assert!(at < full, "key term '{}' searched after the full topic", term);
    }
}

#[tokio::test]
async fn related_topic_fallback_demotes_confidence() {
    let source = quantum_cuisine()
        .search_gives("Quantum cuisine", &["Quantum cuisine theory"])
        .page("Quantum cuisine theory", Ok("Cuisine theory blends physics and cooking."));
    let resolver = GroundingResolver::new(Arc::new(source));

    let result = resolver.resolve(TOPIC).await;

    assert_eq!(result.confidence, Confidence::Medium);
    assert_eq!(
        result.summary.as_deref(),
        Some("Information on related topic 'Quantum cuisine': Cuisine theory blends physics and cooking.")
    );
    assert_eq!(result.related_topics, vec!["Quantum cuisine"]);
}

#[tokio::test]
async fn low_confidence_is_replaced_by_related_term() {
    let source = quantum_cuisine()
        .search_gives("Quantum cuisine", &["Cuisine (disambiguation)"])
        .page(
            "Cuisine (disambiguation)",
            Err(LookupError::Ambiguous {
                title: "Cuisine (disambiguation)".into(),
                options: vec!["Quantum cuisine theory".into()],
            }),
        )
        .page(
            "Quantum cuisine theory",
            Ok("Cuisine theory blends physics and cooking. Cuisine experiments are rare."),
        );
    let resolver = GroundingResolver::new(Arc::new(source));

    let result = resolver.resolve(TOPIC).await;

    assert_eq!(result.confidence, Confidence::Medium);
    assert_eq!(
        result.summary.as_deref(),
        Some("Information on related term 'cuisine': Cuisine is a style of cooking.")
    );
}

#[test]
fn demotion_steps_down_once() {
    assert_eq!(Confidence::High.demoted(), Confidence::Medium);
    assert_eq!(Confidence::Medium.demoted(), Confidence::Low);
    assert_eq!(Confidence::Low.demoted(), Confidence::Low);
    assert_eq!(Confidence::None.demoted(), Confidence::None);
    assert!(Confidence::High > Confidence::Low);
}
