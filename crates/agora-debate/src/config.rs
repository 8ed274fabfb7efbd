//! Debate engine configuration
//!
//! Defaults match the classic five-phase format. Every field can be
//! overridden from the environment with [`DebateConfig::from_env`].

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: String, value: String },
}

/// Structured phases, in order
pub const DEFAULT_PHASES: [&str; 5] = [
    "Opening Statements",
    "Arguments",
    "Rebuttals",
    "Cross-Examination",
    "Closing Arguments",
];

/// Topics drawn by [`crate::SessionController::random_topic`]
pub const DEFAULT_TOPICS: [&str; 5] = [
    "AI's role in future job markets",
    "The ethics of AI in healthcare",
    "AI's impact on privacy and surveillance",
    "The potential of AI in solving climate change",
    "AI's influence on art and creativity",
];

/// Tag for turns generated after the last phase
pub const OVERTIME_PHASE: &str = "Overtime";

/// Tag for session notices (start, topic changes, votes)
pub const SESSION_PHASE: &str = "Session";

/// Tag for user guidance and the responses to it
pub const GUIDANCE_PHASE: &str = "Guidance";

/// Tag for audience questions and the answers to them
pub const QUESTION_PHASE: &str = "Question";

/// Debate engine configuration
#[derive(Debug, Clone)]
pub struct DebateConfig {
    pub phases: Vec<String>,
    pub topics: Vec<String>,
    /// Pause after every turn (env: AGORA_TURN_DELAY_MS)
    pub turn_delay: Duration,
    /// Pause between overtime rounds
    pub overtime_yield: Duration,
    /// Upper bound on one completion call (env: AGORA_TURN_TIMEOUT_SECS)
    pub turn_timeout: Duration,
    /// Occurrences of a fingerprint tolerated before regenerating
    /// (env: AGORA_REPETITION_THRESHOLD)
    pub repetition_threshold: u32,
    /// Turns of history given to phase turns (env: AGORA_CONTEXT_WINDOW)
    pub context_window: usize,
    /// Turns of history given to guidance responses
    pub guidance_window: usize,
    /// Directory of `<name>_conversation.json` files (env: AGORA_MEMORY_DIR)
    pub memory_dir: Option<PathBuf>,
    /// Text injected into every prompt (env: AGORA_BACKGROUND_FILE)
    pub background_file: Option<PathBuf>,
    /// Telemetry listener address (env: AGORA_TELEMETRY_ADDR, "off" disables)
    pub telemetry_addr: Option<String>,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            phases: DEFAULT_PHASES.iter().map(|p| p.to_string()).collect(),
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            turn_delay: Duration::from_secs(2),
            overtime_yield: Duration::from_secs(1),
            turn_timeout: Duration::from_secs(60),
            repetition_threshold: agora_core::DEFAULT_REPETITION_THRESHOLD,
            context_window: 100,
            guidance_window: 10,
            memory_dir: Some(PathBuf::from("pre_debate_conversations")),
            background_file: None,
            telemetry_addr: Some("127.0.0.1:12345".to_string()),
        }
    }
}

fn parse_var<T: FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: var.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

impl DebateConfig {
    /// Load from environment, falling back to defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>("AGORA_TURN_DELAY_MS")? {
            config.turn_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>("AGORA_TURN_TIMEOUT_SECS")? {
            config.turn_timeout = Duration::from_secs(secs);
        }
        if let Some(threshold) = parse_var("AGORA_REPETITION_THRESHOLD")? {
            config.repetition_threshold = threshold;
        }
        if let Some(window) = parse_var("AGORA_CONTEXT_WINDOW")? {
            config.context_window = window;
        }
        if let Ok(dir) = env::var("AGORA_MEMORY_DIR") {
            config.memory_dir = Some(PathBuf::from(dir));
        }
        if let Ok(file) = env::var("AGORA_BACKGROUND_FILE") {
            config.background_file = Some(PathBuf::from(file));
        }
        if let Ok(addr) = env::var("AGORA_TELEMETRY_ADDR") {
            config.telemetry_addr = (!addr.eq_ignore_ascii_case("off")).then_some(addr);
        }

        Ok(config)
    }

    /// No delays, no telemetry, no files. For tests and scripted runs.
    pub fn immediate() -> Self {
        Self {
            turn_delay: Duration::ZERO,
            overtime_yield: Duration::ZERO,
            memory_dir: None,
            background_file: None,
            telemetry_addr: None,
            ..Self::default()
        }
    }
}
