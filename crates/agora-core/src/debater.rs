//! Debaters and the debate session they belong to

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::controls::ControlParameters;
use crate::personality::PersonalityProfile;
use crate::role::DebaterRole;

/// Per-debater tone scalars, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebaterTone {
    pub humor: f64,
    pub assertiveness: f64,
    pub directness: f64,
}

impl DebaterTone {
    pub fn clamped(self) -> Self {
        Self {
            humor: self.humor.clamp(0.0, 1.0),
            assertiveness: self.assertiveness.clamp(0.0, 1.0),
            directness: self.directness.clamp(0.0, 1.0),
        }
    }
}

/// A debate participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debater {
    /// Display name, also the speaker name in the transcript
    pub name: String,
    /// Role driving personality pools and role-specific instructions
    pub role: DebaterRole,
    /// Current generated personality
    pub profile: PersonalityProfile,
    /// Humor (0.0 - 1.0)
    pub humor: f64,
    /// Assertiveness (0.0 - 1.0)
    pub assertiveness: f64,
    /// Directness (0.0 - 1.0)
    pub directness: f64,
    /// Optional debaters only speak when enabled and armed
    pub optional: bool,
    /// Enabled by the user (always true for mandatory debaters)
    pub enabled: bool,
    /// Armed to speak once in the next round
    pub armed: bool,
}

impl Debater {
    /// Create a mandatory debater with a freshly generated profile
    pub fn new<R: Rng + ?Sized>(name: &str, role: DebaterRole, rng: &mut R) -> Self {
        Self {
            name: name.to_string(),
            role,
            profile: PersonalityProfile::generate(role, rng),
            humor: 0.5,
            assertiveness: 0.5,
            directness: 0.5,
            optional: false,
            enabled: true,
            armed: false,
        }
    }

    /// Create an optional debater; disabled until the user enables it
    pub fn optional<R: Rng + ?Sized>(name: &str, role: DebaterRole, rng: &mut R) -> Self {
        Self {
            optional: true,
            enabled: false,
            ..Self::new(name, role, rng)
        }
    }

    /// Regenerate the personality and re-apply the session's tone scalars
    pub fn reinitialize<R: Rng + ?Sized>(&mut self, controls: &ControlParameters, rng: &mut R) {
        self.profile = PersonalityProfile::generate(self.role, rng);
        self.apply_controls(controls);
    }

    /// Copy directness, assertiveness and humor from the session controls
    pub fn apply_controls(&mut self, controls: &ControlParameters) {
        self.directness = controls.directness;
        self.assertiveness = controls.assertiveness;
        self.humor = controls.humor;
    }

    pub fn tone(&self) -> DebaterTone {
        DebaterTone {
            humor: self.humor,
            assertiveness: self.assertiveness,
            directness: self.directness,
        }
    }

    /// Override this debater's tone scalars (clamped)
    pub fn set_tone(&mut self, tone: DebaterTone) {
        let tone = tone.clamped();
        self.humor = tone.humor;
        self.assertiveness = tone.assertiveness;
        self.directness = tone.directness;
    }

    /// Whether this debater may speak in the current round
    pub fn may_speak(&self) -> bool {
        !self.optional || (self.enabled && self.armed)
    }

    /// Whether this debater takes part in guidance rounds
    pub fn is_active(&self) -> bool {
        !self.optional || self.enabled
    }

    /// Sign-off line for prompts: "- Name, Signature"
    pub fn signature(&self) -> String {
        format!("- {}, {}", self.name, self.profile.signature)
    }
}

/// The standard three-debater roster: two mandatory, one optional wildcard
pub fn default_roster<R: Rng + ?Sized>(rng: &mut R) -> Vec<Debater> {
    vec![
        Debater::new("Analyst", DebaterRole::Analytical, rng),
        Debater::new("Muse", DebaterRole::Creative, rng),
        Debater::optional("Wildcard", DebaterRole::Chaotic, rng),
    ]
}

/// Topic, participants and controls of one debate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSession {
    /// Current topic
    pub topic: String,
    /// Debaters in speaking order
    pub debaters: Vec<Debater>,
    /// Live controls
    pub controls: ControlParameters,
}

impl DebateSession {
    /// Create a session
    pub fn new(topic: &str, debaters: Vec<Debater>, controls: ControlParameters) -> Self {
        Self {
            topic: topic.to_string(),
            debaters,
            controls,
        }
    }

    /// Regenerate every debater's personality
    pub fn reinitialize_personalities<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        tracing::info!(topic = %self.topic, "Initializing debate personalities");
        for debater in &mut self.debaters {
            debater.reinitialize(&self.controls, rng);
        }
    }

    /// Replace the controls, propagating tone scalars to every debater
    pub fn set_controls(&mut self, controls: ControlParameters) {
        self.controls = controls.clamped();
        for debater in &mut self.debaters {
            debater.apply_controls(&self.controls);
        }
    }

    /// Find a debater by name
    pub fn debater(&self, name: &str) -> Option<&Debater> {
        self.debaters.iter().find(|d| d.name == name)
    }

    /// Mutable lookup by name
    pub fn debater_mut(&mut self, name: &str) -> Option<&mut Debater> {
        self.debaters.iter_mut().find(|d| d.name == name)
    }

    /// Names of every debater except `name`, in speaking order
    pub fn opponents_of(&self, name: &str) -> Vec<String> {
        self.debaters
            .iter()
            .filter(|d| d.name != name && d.is_active())
            .map(|d| d.name.clone())
            .collect()
    }
}
