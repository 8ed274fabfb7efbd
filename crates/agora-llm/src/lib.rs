//! # Agora LLM
//!
//! Text-completion providers that give debaters their voices.
//!
//! ## Supported Backends
//!
//! | Provider | Type | Key Required |
//! |----------|------|--------------|
//! | Ollama | Local | None |
//! | OpenAI | API | `OPENAI_API_KEY` |
//! | Gemini | API | `GEMINI_API_KEY` |
//! | Mock | Testing | None |
//!
//! ## Quick Start
//!
//! ```rust
//! use agora_llm::{LlmProvider, MockProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = MockProvider::constant("Regulation lags the technology.");
//!     let response = llm.ask("Open the debate").await.unwrap();
//!     assert_eq!(response, "Regulation lags the technology.");
//! }
//! ```
//!
//! ## From the environment
//!
//! ```rust,ignore
//! use agora_llm::{LlmConfig, ResilientProvider};
//!
//! let provider = LlmConfig::from_env().build_provider()?;
//! let provider = ResilientProvider::wrap(provider);
//! ```

pub mod config;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod resilient_provider;

pub use config::{ConfigError, LlmConfig};
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::{GenerationError, LlmProvider, LlmRequest, LlmResponse};
pub use resilient_provider::{CircuitConfig, CircuitState, ResilientProvider};
