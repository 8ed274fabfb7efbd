//! Per-speaker repetition tracking
//!
//! A message's fingerprint is its first [`FINGERPRINT_LEN`]
//! characters. Short or templated replies collide on their prefix; that is an
//! accepted approximation.

use std::collections::HashMap;

/// Characters of a message used as its fingerprint
pub const FINGERPRINT_LEN: usize = 50;

/// Occurrences allowed before a fingerprint counts as repetitive
pub const DEFAULT_REPETITION_THRESHOLD: u32 = 3;

/// Outcome of observing a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fresh,
    Repetitive,
}

impl Verdict {
    pub fn is_repetitive(&self) -> bool {
        matches!(self, Verdict::Repetitive)
    }
}

/// Fingerprint counts per speaker. Counts only ever increase until
/// [`RepetitionTracker::reset`] at session end.
#[derive(Debug, Clone)]
pub struct RepetitionTracker {
    threshold: u32,
    counts: HashMap<String, HashMap<String, u32>>,
}

impl Default for RepetitionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_REPETITION_THRESHOLD)
    }
}

impl RepetitionTracker {
    /// Create a tracker with the given threshold
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            counts: HashMap::new(),
        }
    }

    /// Fingerprint of a message
    pub fn fingerprint(&self, message: &str) -> String {
        message.chars().take(FINGERPRINT_LEN).collect()
    }

    /// Record `message` for `speaker` and report whether it is repetitive.
    ///
    /// The count is incremented on every call; the verdict is repetitive once
    /// the count exceeds the threshold.
    pub fn observe(&mut self, speaker: &str, message: &str) -> Verdict {
        let key = self.fingerprint(message);
        let count = self
            .counts
            .entry(speaker.to_string())
            .or_default()
            .entry(key)
            .or_insert(0);
        *count += 1;

        if *count > self.threshold {
            tracing::debug!(speaker, count = *count, "Repetitive fingerprint");
            Verdict::Repetitive
        } else {
            Verdict::Fresh
        }
    }

    /// Current count for a message's fingerprint
    pub fn count(&self, speaker: &str, message: &str) -> u32 {
        let key = self.fingerprint(message);
        self.counts
            .get(speaker)
            .and_then(|m| m.get(&key))
            .copied()
            .unwrap_or(0)
    }

    /// Configured threshold
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Forget every count
    pub fn reset(&mut self) {
        self.counts.clear();
    }
}
