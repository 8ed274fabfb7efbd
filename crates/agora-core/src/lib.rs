//! # Agora Core
//!
//! Core types for the Agora debate engine:
//! - [`Debater`] - a participant with a role, a generated personality and tone scalars
//! - [`PersonalityProfile`] - randomized-but-structured traits drawn from fixed pools
//! - [`Turn`] / [`ConversationState`] - the append-only debate transcript
//! - [`RepetitionTracker`] - per-speaker prefix fingerprint counts
//! - [`ControlParameters`] - live debate controls (directness, length, tone, ...)
//!
//! ## Quick Start
//!
//! ```rust
//! use agora_core::{ConversationState, Debater, DebaterRole, Speaker, Turn};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let analyst = Debater::new("Analyst", DebaterRole::Analytical, &mut rng);
//! assert_eq!(analyst.profile.role(), DebaterRole::Analytical);
//!
//! let mut conversation = ConversationState::new();
//! conversation.append(Speaker::System, "Debate started", "Session");
//! assert_eq!(conversation.len(), 1);
//! ```

pub mod controls;
pub mod conversation;
pub mod debater;
pub mod personality;
pub mod repetition;
pub mod role;
pub mod sentiment;

pub use controls::{Band, ControlParameters, Focus, ResponseLength, Tone};
pub use conversation::{ConversationError, ConversationState, Speaker, Turn};
pub use debater::{default_roster, Debater, DebaterTone, DebateSession};
pub use personality::{PersonalityProfile, RoleFlavor};
pub use repetition::{RepetitionTracker, Verdict, FINGERPRINT_LEN, DEFAULT_REPETITION_THRESHOLD};
pub use role::DebaterRole;
pub use sentiment::{polarity, Emotion};
