//! # Agora Knowledge
//!
//! Grounds debate topics in encyclopedia summaries.
//!
//! - [`GroundingResolver`] - topic to summary, confidence and related topics
//! - [`GroundingCache`] - per-topic memoization in front of the resolver
//! - [`WikipediaSource`] / [`InMemorySource`] - [`KnowledgeSource`] backends
//! - [`similarity`] - two-document TF-IDF cosine scoring
//!
//! ```rust
//! use agora_knowledge::{Confidence, GroundingResolver, InMemorySource};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let source = InMemorySource::new()
//!     .with_article("Privacy", "Privacy is the ability to seclude oneself.");
//! let resolver = GroundingResolver::new(Arc::new(source));
//!
//! let result = resolver.resolve("privacy").await;
//! assert_eq!(result.confidence, Confidence::High);
//! # }
//! ```

pub mod cache;
pub mod memory;
pub mod resolver;
pub mod similarity;
pub mod source;
pub mod terms;
pub mod wikipedia;

pub use cache::{GroundingCache, GroundingCacheConfig};
pub use memory::InMemorySource;
pub use resolver::{Confidence, GroundingResolver, ResolverConfig, RetrievalResult, TitleCache};
pub use source::{Article, KnowledgeSource, LookupError};
pub use wikipedia::WikipediaSource;
