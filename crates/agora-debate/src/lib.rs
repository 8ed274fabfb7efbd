//! # Agora Debate
//!
//! Tokio-based debate orchestration: phases, turn scheduling, prompt
//! composition and the session controller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agora_debate::{DebateConfig, SessionController};
//! use agora_llm::MockProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (mut session, mut events) = SessionController::builder(Arc::new(MockProvider::smart()))
//!         .config(DebateConfig::immediate())
//!         .topic("AI's impact on privacy")
//!         .build();
//!
//!     session.start().await;
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

pub mod config;
pub mod events;
pub mod memory;
pub mod prompt;
pub mod scheduler;
pub mod session;
pub mod telemetry;

pub use config::{
    ConfigError, DebateConfig, DEFAULT_PHASES, DEFAULT_TOPICS, GUIDANCE_PHASE, OVERTIME_PHASE,
    QUESTION_PHASE, SESSION_PHASE,
};
pub use events::DebateEvent;
pub use prompt::{compose, GenerationPrompt, PromptContext, PromptSection};
pub use scheduler::{
    Cursor, SchedulerHandle, SchedulerState, Step, TurnScheduler, FAILURE_PLACEHOLDER,
    REPETITION_DIRECTIVE,
};
pub use session::{SessionBuilder, SessionController, SessionSnapshot};
pub use telemetry::TelemetrySink;
