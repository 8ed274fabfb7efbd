//! Live debate control parameters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-level band derived from a scalar in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    Low,
    Medium,
    High,
}

impl Band {
    /// `> 0.7` is high, `> 0.3` is medium, anything else is low.
    pub fn from_level(level: f64) -> Self {
        if level > 0.7 {
            Band::High
        } else if level > 0.3 {
            Band::Medium
        } else {
            Band::Low
        }
    }
}

/// Requested response length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseLength {
    VeryShort,
    Short,
    #[default]
    Medium,
    Long,
}

impl ResponseLength {
    /// Instruction text for the generation request
    pub fn directive(&self) -> &'static str {
        match self {
            ResponseLength::VeryShort => "Respond in a single sentence of no more than 15 words.",
            ResponseLength::Short => "Respond in 1-2 concise sentences.",
            ResponseLength::Medium => "Respond in 2-3 sentences.",
            ResponseLength::Long => "Provide a detailed response of 4-5 sentences.",
        }
    }

    /// Maximum sentences kept by [`ResponseLength::enforce`]
    pub fn max_sentences(&self) -> usize {
        match self {
            ResponseLength::VeryShort => 1,
            ResponseLength::Short => 2,
            ResponseLength::Medium => 3,
            ResponseLength::Long => 5,
        }
    }

    /// Trim `response` to this length by sentence count. Very short responses
    /// are further capped at 15 words.
    pub fn enforce(&self, response: &str) -> String {
        let sentences: Vec<&str> = response
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if sentences.is_empty() {
            return response.trim().to_string();
        }

        match self {
            ResponseLength::VeryShort => {
                let words: Vec<&str> = sentences[0].split_whitespace().take(15).collect();
                format!("{}.", words.join(" "))
            }
            _ => {
                let kept = &sentences[..sentences.len().min(self.max_sentences())];
                format!("{}.", kept.join(". "))
            }
        }
    }
}

impl std::str::FromStr for ResponseLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '_'], "-").as_str() {
            "very-short" => Ok(ResponseLength::VeryShort),
            "short" => Ok(ResponseLength::Short),
            "medium" => Ok(ResponseLength::Medium),
            "long" => Ok(ResponseLength::Long),
            other => Err(format!("unknown response length: {}", other)),
        }
    }
}

/// Conversational tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Casual,
    Formal,
    Creative,
    #[default]
    Debate,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tone::Casual => "casual",
            Tone::Formal => "formal",
            Tone::Creative => "creative",
            Tone::Debate => "debate",
        })
    }
}

impl std::str::FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "casual" => Ok(Tone::Casual),
            "formal" => Ok(Tone::Formal),
            "creative" => Ok(Tone::Creative),
            "debate" => Ok(Tone::Debate),
            other => Err(format!("unknown tone: {}", other)),
        }
    }
}

/// What responses should focus on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Focus {
    Agreeable,
    #[default]
    Challenging,
    Balanced,
    Informative,
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Focus::Agreeable => "agreeable",
            Focus::Challenging => "challenging",
            Focus::Balanced => "balanced",
            Focus::Informative => "informative",
        })
    }
}

impl std::str::FromStr for Focus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "agreeable" => Ok(Focus::Agreeable),
            "challenging" => Ok(Focus::Challenging),
            "balanced" => Ok(Focus::Balanced),
            "informative" => Ok(Focus::Informative),
            other => Err(format!("unknown focus: {}", other)),
        }
    }
}

/// Session-wide controls, adjustable while a debate runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlParameters {
    /// Directness (0.0 - 1.0)
    pub directness: f64,
    /// Assertiveness (0.0 - 1.0)
    pub assertiveness: f64,
    /// Controversy (0.0 - 1.0)
    pub controversy: f64,
    /// Complexity of language (0.0 - 1.0)
    pub complexity: f64,
    /// Probability of drifting into a subtopic (0.0 - 1.0)
    pub topic_evolution: f64,
    /// Humor applied to debaters on (re)initialization (0.0 - 1.0)
    pub humor: f64,
    /// Response length
    pub length: ResponseLength,
    /// Tone
    pub tone: Tone,
    /// Focus
    pub focus: Focus,
}

impl Default for ControlParameters {
    fn default() -> Self {
        Self {
            directness: 0.5,
            assertiveness: 0.5,
            controversy: 0.5,
            complexity: 0.5,
            topic_evolution: 0.7,
            humor: 0.5,
            length: ResponseLength::default(),
            tone: Tone::default(),
            focus: Focus::default(),
        }
    }
}

impl ControlParameters {
    /// Clamp every scalar into [0, 1]
    pub fn clamped(mut self) -> Self {
        self.directness = self.directness.clamp(0.0, 1.0);
        self.assertiveness = self.assertiveness.clamp(0.0, 1.0);
        self.controversy = self.controversy.clamp(0.0, 1.0);
        self.complexity = self.complexity.clamp(0.0, 1.0);
        self.topic_evolution = self.topic_evolution.clamp(0.0, 1.0);
        self.humor = self.humor.clamp(0.0, 1.0);
        self
    }
}
