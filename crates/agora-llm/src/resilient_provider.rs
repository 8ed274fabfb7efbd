//! Circuit breaker around a completion provider
//!
//! After `failure_threshold` consecutive backend failures the breaker opens
//! and every turn fails fast with [`GenerationError::CircuitOpen`] until the
//! cooldown passes. A single trial turn is then let through: success closes
//! the breaker, failure opens it for another cooldown. The debate keeps going
//! meanwhile; each rejected turn becomes a placeholder upstream.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::provider::{GenerationError, LlmProvider, LlmRequest, LlmResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    /// Cooldown elapsed; the next turn decides
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitConfig {
    /// Consecutive backend failures before opening
    pub failure_threshold: u32,
    /// Time spent failing fast before a trial turn
    pub cooldown: Duration,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct Breaker {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

impl Breaker {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
        }
    }

    /// Whether a turn may reach the backend at `now`
    fn admit(&mut self, config: &CircuitConfig, now: Instant) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen if self.trial_in_flight => false,
            CircuitState::HalfOpen => {
                self.trial_in_flight = true;
                true
            }
            CircuitState::Open => {
                let cooled = self
                    .opened_at
                    .map_or(true, |at| now.duration_since(at) >= config.cooldown);
                if cooled {
                    self.state = CircuitState::HalfOpen;
                    self.trial_in_flight = true;
                }
                cooled
            }
        }
    }

    /// Fold one outcome in. `None` means the outcome said nothing about the
    /// backend. Returns the new state when it changed.
    fn settle(
        &mut self,
        config: &CircuitConfig,
        healthy: Option<bool>,
        now: Instant,
    ) -> Option<CircuitState> {
        self.trial_in_flight = false;
        let before = self.state;
        match healthy {
            None => return None,
            Some(true) => {
                self.consecutive_failures = 0;
                self.state = CircuitState::Closed;
            }
            Some(false) => {
                self.consecutive_failures += 1;
                let tripped = before == CircuitState::HalfOpen
                    || self.consecutive_failures >= config.failure_threshold;
                if tripped {
                    self.state = CircuitState::Open;
                    self.opened_at = Some(now);
                }
            }
        }
        (self.state != before).then_some(self.state)
    }
}

/// Provider wrapper that stops a failing backend from stalling every turn
#[derive(Debug)]
pub struct ResilientProvider {
    inner: Arc<dyn LlmProvider>,
    config: CircuitConfig,
    breaker: Mutex<Breaker>,
}

impl ResilientProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, config: CircuitConfig) -> Self {
        Self {
            inner,
            config,
            breaker: Mutex::new(Breaker::closed()),
        }
    }

    pub fn wrap(inner: Arc<dyn LlmProvider>) -> Self {
        Self::new(inner, CircuitConfig::default())
    }

    pub async fn circuit_state(&self) -> CircuitState {
        self.breaker.lock().await.state
    }
}

#[async_trait]
impl LlmProvider for ResilientProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, GenerationError> {
        if !self.breaker.lock().await.admit(&self.config, Instant::now()) {
            return Err(GenerationError::CircuitOpen(self.inner.name().to_string()));
        }

        let result = self.inner.complete(request).await;
        let healthy = match &result {
            Ok(_) => Some(true),
            Err(e) if e.counts_against_backend() => Some(false),
            Err(_) => None,
        };

        let changed = self
            .breaker
            .lock()
            .await
            .settle(&self.config, healthy, Instant::now());
        match changed {
            Some(CircuitState::Open) => {
                tracing::warn!(provider = %self.inner.name(), cooldown = ?self.config.cooldown, "Circuit opened")
            }
            Some(CircuitState::Closed) => {
                tracing::info!(provider = %self.inner.name(), "Circuit closed, provider recovered")
            }
            _ => {}
        }
        result
    }
}
