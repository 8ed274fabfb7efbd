//! Topic grounding resolver
//!
//! Turns a free-text debate topic into a summary with a confidence level and
//! a set of related topics. The cascade stops at the first success:
//!
//! 1. each extracted key term, in order
//! 2. the full topic string
//! 3. related titles (shuffled, relevance-filtered), confidence demoted
//! 4. frequent words of a low-confidence summary, kept only if relevant
//!
//! A single lookup walks the search hits for a query, skipping titles that
//! were already used in this process, and picks the best disambiguation
//! option by TF-IDF similarity when a hit is ambiguous.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use crate::similarity::{best_option, tfidf_cosine};
use crate::source::{KnowledgeSource, LookupError};
use crate::terms::{frequent_terms, key_points, key_terms};

/// How much a grounding summary can be trusted
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Confidence {
    /// One step down; `Low` and `None` stay where they are
    pub fn demoted(self) -> Self {
        match self {
            Confidence::High => Confidence::Medium,
            Confidence::Medium | Confidence::Low => Confidence::Low,
            Confidence::None => Confidence::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::None => "none",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grounding for one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub query: String,
    pub summary: Option<String>,
    pub confidence: Confidence,
    /// At most five titles, none of them already used for a summary
    pub related_topics: Vec<String>,
    /// At most five leading sentences of the summary
    pub key_points: Vec<String>,
}

impl RetrievalResult {
    pub fn is_grounded(&self) -> bool {
        self.confidence != Confidence::None
    }
}

/// Titles already used for a summary, compared case-insensitively. Shared
/// by handle; entries are only ever added.
#[derive(Debug, Clone, Default)]
pub struct TitleCache {
    titles: Arc<RwLock<HashSet<String>>>,
}

impl TitleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, title: &str) -> bool {
        self.titles.read().await.contains(&title.to_lowercase())
    }

    pub async fn insert(&self, title: &str) {
        self.titles.write().await.insert(title.to_lowercase());
    }

    pub async fn len(&self) -> usize {
        self.titles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.titles.read().await.is_empty()
    }
}

/// Resolver tuning
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Sentences requested per summary
    pub sentences: usize,
    /// Key terms tried before the full topic
    pub key_terms: usize,
    /// Search hits requested per lookup and for related topics
    pub search_results: usize,
    /// Related topics reported
    pub max_related: usize,
    /// A disambiguation option must score strictly above this
    pub disambiguation_threshold: f64,
    /// Related titles and summary words must score at least this
    pub relevance_threshold: f64,
    /// Frequent summary words tried when confidence is low
    pub summary_terms: usize,
    pub key_points: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            sentences: 2,
            key_terms: 3,
            search_results: 10,
            max_related: 5,
            disambiguation_threshold: 0.1,
            relevance_threshold: 0.2,
            summary_terms: 5,
            key_points: 5,
        }
    }
}

#[derive(Debug, Clone)]
struct Hit {
    summary: String,
    confidence: Confidence,
}

/// Knowledge grounding resolver
#[derive(Debug)]
pub struct GroundingResolver {
    source: Arc<dyn KnowledgeSource>,
    cache: TitleCache,
    config: ResolverConfig,
    rng: Mutex<StdRng>,
}

impl GroundingResolver {
    pub fn new(source: Arc<dyn KnowledgeSource>) -> Self {
        Self::with_config(source, ResolverConfig::default())
    }

    pub fn with_config(source: Arc<dyn KnowledgeSource>, config: ResolverConfig) -> Self {
        Self {
            source,
            cache: TitleCache::new(),
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Share an existing title cache
    pub fn with_cache(mut self, cache: TitleCache) -> Self {
        self.cache = cache;
        self
    }

    /// Deterministic related-topic shuffling
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn cache(&self) -> &TitleCache {
        &self.cache
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn relevance(&self, original: &str, candidate: &str) -> bool {
        tfidf_cosine(original, candidate) >= self.config.relevance_threshold
    }

    /// Resolve a topic into grounding. Never fails; unresolvable topics come
    /// back with [`Confidence::None`].
    pub async fn resolve(&self, topic: &str) -> RetrievalResult {
        tracing::info!(topic, source = %self.source.name(), "Resolving grounding");

        let mut found = self.resolve_direct(topic).await;
        let related = self.related_candidates(topic).await;

        if found.is_none() {
            for title in &related {
                if let Some(hit) = self.resolve_direct(title).await {
                    // frequent words come from the article text, not the prefix
                    let body = hit.summary.clone();
                    found = Some(Hit {
                        summary: format!("Information on related topic '{}': {}", title, hit.summary),
                        confidence: hit.confidence.demoted(),
                    });
                    self.refine_low(topic, &body, &mut found).await;
                    break;
                }
            }
        }

        let result = match found {
            Some(hit) => {
                let mut related_topics = Vec::new();
                for title in related {
                    if related_topics.len() >= self.config.max_related {
                        break;
                    }
                    if !self.cache.contains(&title).await {
                        related_topics.push(title);
                    }
                }
                RetrievalResult {
                    query: topic.to_string(),
                    key_points: key_points(&hit.summary, self.config.key_points),
                    summary: Some(hit.summary),
                    confidence: hit.confidence,
                    related_topics,
                }
            }
            None => RetrievalResult {
                query: topic.to_string(),
                summary: Some(format!("No information found for '{}' or related terms.", topic)),
                confidence: Confidence::None,
                related_topics: Vec::new(),
                key_points: Vec::new(),
            },
        };

        tracing::info!(
            topic,
            confidence = %result.confidence,
            related = result.related_topics.len(),
            "Grounding resolved"
        );
        result
    }

    /// Key terms in order, then the full string
    async fn resolve_direct(&self, query: &str) -> Option<Hit> {
        for term in key_terms(query, self.config.key_terms) {
            if let Some(hit) = self.lookup(&term).await {
                return Some(hit);
            }
        }
        self.lookup(query).await
    }

    /// When only a low-confidence summary exists, try its most frequent
    /// words and keep a replacement whose demoted confidence is better
    async fn refine_low(&self, topic: &str, body: &str, found: &mut Option<Hit>) {
        let current = match found.as_ref() {
            Some(hit) if hit.confidence == Confidence::Low => hit.confidence,
            _ => return,
        };

        for term in frequent_terms(body, self.config.summary_terms) {
            if !self.relevance(topic, &term) {
                continue;
            }
            if let Some(hit) = self.resolve_direct(&term).await {
                let demoted = hit.confidence.demoted();
                if demoted > current {
                    *found = Some(Hit {
                        summary: format!("Information on related term '{}': {}", term, hit.summary),
                        confidence: demoted,
                    });
                    return;
                }
            }
        }
    }

    /// Search hits for the topic, shuffled, minus used and irrelevant titles
    async fn related_candidates(&self, topic: &str) -> Vec<String> {
        let mut titles = match self.source.search(topic, self.config.search_results).await {
            Ok(titles) => titles,
            Err(e) => {
                tracing::warn!(topic, error = %e, "Related topic search failed");
                return Vec::new();
            }
        };

        {
            let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            titles.shuffle(&mut *rng);
        }

        let mut related = Vec::new();
        for title in titles {
            if self.cache.contains(&title).await {
                continue;
            }
            if self.relevance(topic, &title) {
                related.push(title);
            }
        }
        tracing::debug!(topic, count = related.len(), "Related topic candidates");
        related
    }

    /// One search plus a walk over its hits
    async fn lookup(&self, term: &str) -> Option<Hit> {
        let titles = match self.source.search(term, self.config.search_results).await {
            Ok(titles) if titles.is_empty() => {
                tracing::debug!(term, "No search results");
                return None;
            }
            Ok(titles) => titles,
            Err(e) => {
                tracing::warn!(term, error = %e, "Search failed");
                return None;
            }
        };

        for title in titles {
            if self.cache.contains(&title).await {
                tracing::debug!(term, title = %title, "Skipping used title");
                continue;
            }

            match self.source.fetch_summary(&title, self.config.sentences).await {
                Ok(article) => {
                    self.cache.insert(&article.title).await;
                    self.cache.insert(&title).await;
                    tracing::debug!(term, title = %article.title, "Fetched summary");
                    return Some(Hit {
                        summary: article.summary,
                        confidence: Confidence::High,
                    });
                }
                Err(LookupError::Ambiguous { title: page, options }) => {
                    let Some((option, score)) =
                        best_option(term, &options, self.config.disambiguation_threshold)
                    else {
                        tracing::debug!(term, page = %page, "No disambiguation option cleared the threshold");
                        continue;
                    };
                    if self.cache.contains(&option).await {
                        continue;
                    }
                    match self.source.fetch_summary(&option, self.config.sentences).await {
                        Ok(article) => {
                            self.cache.insert(&article.title).await;
                            self.cache.insert(&option).await;
                            tracing::debug!(term, title = %article.title, score, "Fetched disambiguated summary");
                            return Some(Hit {
                                summary: article.summary,
                                confidence: Confidence::Medium,
                            });
                        }
                        Err(e) => {
                            tracing::warn!(term, option = %option, error = %e, "Disambiguated fetch failed");
                            continue;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(term, title = %title, error = %e, "Lookup failed");
                    continue;
                }
            }
        }
        None
    }
}
