//! Mock completion provider for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::provider::{GenerationError, LlmProvider, LlmRequest, LlmResponse};

#[derive(Debug)]
enum Behavior {
    /// Cycle through canned responses
    Canned(Vec<String>),
    /// Numbered responses that never share a prefix
    Smart,
    /// Fail every call
    Failing,
    /// Fail the given call indices (0-based), answer the rest smartly
    FailOn(Vec<usize>),
}

/// A mock provider that returns predefined responses and records every
/// request it receives.
#[derive(Debug)]
pub struct MockProvider {
    /// Name of this mock
    pub name: String,
    behavior: Behavior,
    index: AtomicUsize,
    latency: Duration,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    fn with_behavior(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            index: AtomicUsize::new(0),
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock provider with given responses (cycled)
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_behavior("mock", Behavior::Canned(responses))
    }

    /// Create a mock that always returns the same response
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Create a mock whose every response is distinct within its first characters
    pub fn smart() -> Self {
        Self::with_behavior("smart-mock", Behavior::Smart)
    }

    /// Create a mock that always fails with a connection error
    pub fn failing() -> Self {
        Self::with_behavior("failing-mock", Behavior::Failing)
    }

    /// Create a mock that fails on the given call indices
    pub fn failing_on(calls: Vec<usize>) -> Self {
        Self::with_behavior("flaky-mock", Behavior::FailOn(calls))
    }

    /// Simulate latency on every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    fn smart_response(idx: usize, request: &LlmRequest) -> String {
        let persona = request
            .system
            .strip_prefix("You are ")
            .and_then(|rest| rest.split([',', '.']).next())
            .unwrap_or("a debater");
        format!(
            "Point {} from {}: the evidence on this question deserves a closer look.",
            idx + 1,
            persona
        )
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, GenerationError> {
        let idx = self.index.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let content = match &self.behavior {
            Behavior::Canned(responses) if responses.is_empty() => String::new(),
            Behavior::Canned(responses) => responses[idx % responses.len()].clone(),
            Behavior::Smart => Self::smart_response(idx, &request),
            Behavior::Failing => {
                return Err(GenerationError::unreachable("mock", "mock failure"))
            }
            Behavior::FailOn(calls) if calls.contains(&idx) => {
                return Err(GenerationError::from_status(
                    "mock",
                    500,
                    &format!("mock failure on call {}", idx),
                ))
            }
            Behavior::FailOn(_) => Self::smart_response(idx, &request),
        };

        Ok(LlmResponse {
            content,
            model: self.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider() {
        let mock = MockProvider::constant("Hello, world!");
        let response = mock.ask("test").await.unwrap();
        assert_eq!(response, "Hello, world!");
    }

    #[tokio::test]
    async fn test_smart_mock_is_distinct() {
        let mock = MockProvider::smart();
        let a = mock.ask("one").await.unwrap();
        let b = mock.ask("two").await.unwrap();
        assert_ne!(a[..10], b[..10]);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_on_selected_calls() {
        let mock = MockProvider::failing_on(vec![1]);
        assert!(mock.ask("a").await.is_ok());
        assert!(mock.ask("b").await.is_err());
        assert!(mock.ask("c").await.is_ok());
        assert_eq!(mock.requests().len(), 3);
    }
}
