//! Observer notifications

use agora_core::Turn;
use serde::Serialize;

use crate::scheduler::SchedulerState;

/// Everything a UI needs to follow a debate, in emission order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DebateEvent {
    SessionStarted { topic: String },
    TopicChanged { topic: String },
    PhaseStarted { phase: String },
    OvertimeStarted,
    /// A turn was appended to the conversation
    TurnRecorded(Turn),
    /// The first attempt repeated an earlier argument and was regenerated
    RepetitionDetected { speaker: String },
    /// Generation failed; the placeholder was recorded instead
    TurnFailed { speaker: String, error: String },
    /// The user voted for a debater's argument
    VoteCast { speaker: String, tally: u32 },
    StateChanged {
        from: SchedulerState,
        to: SchedulerState,
    },
}
