//! Debater roles

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of debater roles.
///
/// Every role-dependent branch in the engine matches on this enum, so adding a
/// role is a compile error until each branch handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebaterRole {
    /// Data-driven, systematic reasoning
    Analytical,
    /// Intuitive, narrative and philosophical reasoning
    Creative,
    /// Unpredictable wildcard
    Chaotic,
}

impl DebaterRole {
    /// All roles in canonical order
    pub const ALL: [DebaterRole; 3] = [
        DebaterRole::Analytical,
        DebaterRole::Creative,
        DebaterRole::Chaotic,
    ];

    /// Short lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            DebaterRole::Analytical => "analytical",
            DebaterRole::Creative => "creative",
            DebaterRole::Chaotic => "chaotic",
        }
    }

    /// Whether responses from this role get a hard length post-instruction
    /// and are trimmed to the configured length afterwards.
    pub fn enforces_length(&self) -> bool {
        matches!(self, DebaterRole::Chaotic)
    }
}

impl fmt::Display for DebaterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_chaotic_enforces_length() {
        assert!(!DebaterRole::Analytical.enforces_length());
        assert!(!DebaterRole::Creative.enforces_length());
        assert!(DebaterRole::Chaotic.enforces_length());
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&DebaterRole::Chaotic).unwrap();
        assert_eq!(json, "\"chaotic\"");
    }
}
