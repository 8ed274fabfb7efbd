//! Lexicon-based sentiment scoring for turn labelling

use serde::{Deserialize, Serialize};
use std::fmt;

const POSITIVE: &[&str] = &[
    "good", "great", "excellent", "amazing", "wonderful", "fantastic", "positive",
    "benefit", "beneficial", "best", "better", "love", "like", "agree", "happy",
    "hope", "hopeful", "progress", "success", "successful", "valuable", "brilliant",
    "exciting", "fair", "helpful", "improve", "improves", "improvement", "innovative",
    "opportunity", "promising", "safe", "strong", "win", "right", "correct",
];

const NEGATIVE: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "negative", "harm", "harmful", "worst",
    "worse", "hate", "dislike", "disagree", "sad", "fear", "afraid", "danger",
    "dangerous", "risk", "risky", "threat", "fail", "failure", "wrong", "flawed",
    "unfair", "weak", "lose", "loss", "problem", "problematic", "concern", "abuse",
    "invasive", "catastrophic", "absurd", "error",
];

const NEGATIONS: &[&str] = &["not", "no", "never", "n't", "hardly", "without"];

const INTENSIFIERS: &[&str] = &["very", "extremely", "incredibly", "really", "deeply"];

/// Polarity of `text` in [-1, 1].
///
/// Each sentiment word scores ±1, doubled after an intensifier and flipped
/// after a negation within the two preceding words; the total is averaged
/// over scored words and clamped.
pub fn polarity(text: &str) -> f64 {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    let mut total = 0.0;
    let mut scored = 0usize;

    for (i, word) in words.iter().enumerate() {
        let base = if POSITIVE.contains(&word.as_str()) {
            1.0
        } else if NEGATIVE.contains(&word.as_str()) {
            -1.0
        } else {
            continue;
        };

        let window = &words[i.saturating_sub(2)..i];
        let negated = window
            .iter()
            .any(|w| NEGATIONS.contains(&w.as_str()) || w.ends_with("n't"));
        let intensified = window.iter().any(|w| INTENSIFIERS.contains(&w.as_str()));

        let mut score = base;
        if intensified {
            score *= 2.0;
        }
        if negated {
            score *= -0.5;
        }

        total += score;
        scored += 1;
    }

    if scored == 0 {
        return 0.0;
    }
    (total / scored as f64).clamp(-1.0, 1.0)
}

/// Coarse emotion label attached to each turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Emotion {
    VeryPositive,
    Positive,
    #[default]
    Neutral,
    Negative,
    VeryNegative,
}

impl Emotion {
    /// Label a polarity score
    pub fn from_polarity(score: f64) -> Self {
        if score > 0.75 {
            Emotion::VeryPositive
        } else if score > 0.25 {
            Emotion::Positive
        } else if score < -0.75 {
            Emotion::VeryNegative
        } else if score < -0.25 {
            Emotion::Negative
        } else {
            Emotion::Neutral
        }
    }

    /// Label `text` directly
    pub fn detect(text: &str) -> Self {
        Self::from_polarity(polarity(text))
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Emotion::VeryPositive => "very positive",
            Emotion::Positive => "positive",
            Emotion::Neutral => "neutral",
            Emotion::Negative => "negative",
            Emotion::VeryNegative => "very negative",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_text() {
        assert_eq!(polarity("The committee meets on Tuesday."), 0.0);
        assert_eq!(Emotion::detect("The committee meets on Tuesday."), Emotion::Neutral);
    }

    #[test]
    fn test_positive_and_negative() {
        assert!(polarity("This is a great and helpful idea") > 0.25);
        assert!(polarity("This is a terrible and dangerous idea") < -0.25);
    }

    #[test]
    fn test_negation_flips() {
        assert!(polarity("This is not good") < 0.0);
    }

    #[test]
    fn test_intensifier_saturates() {
        assert_eq!(Emotion::detect("This is very good"), Emotion::VeryPositive);
    }
}
