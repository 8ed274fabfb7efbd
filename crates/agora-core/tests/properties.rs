//! Property tests for the core data model

use agora_core::{ConversationState, RepetitionTracker, Speaker, Verdict};
use proptest::prelude::*;

proptest! {
    /// Counts for a fingerprint never decrease as messages are observed
    #[test]
    fn repetition_counts_never_decrease(messages in proptest::collection::vec("[a-c]{0,60}", 1..40)) {
        let mut tracker = RepetitionTracker::default();
        let mut previous = std::collections::HashMap::new();

        for message in &messages {
            tracker.observe("A", message);
            for seen in &messages {
                let count = tracker.count("A", seen);
                let before = previous.insert(tracker.fingerprint(seen), count).unwrap_or(0);
                prop_assert!(count >= before);
            }
        }
    }

    /// The verdict is repetitive exactly when the count exceeds the threshold
    #[test]
    fn verdict_matches_threshold(threshold in 0u32..6, repeats in 1usize..12) {
        let mut tracker = RepetitionTracker::new(threshold);
        for i in 1..=repeats {
            let verdict = tracker.observe("A", "the same opening line every time");
            prop_assert_eq!(verdict == Verdict::Repetitive, i as u32 > threshold);
        }
    }

    /// Export followed by import keeps speakers, messages and order
    #[test]
    fn export_import_round_trip(entries in proptest::collection::vec(("[A-Za-z]{1,8}", ".{0,80}"), 0..20)) {
        let mut state = ConversationState::new();
        for (speaker, message) in &entries {
            state.append(Speaker::from(speaker.clone()), message.clone(), "Arguments");
        }

        let restored = ConversationState::from_json(&state.to_json().unwrap()).unwrap();
        prop_assert_eq!(restored.len(), state.len());
        for (a, b) in state.turns().iter().zip(restored.turns()) {
            prop_assert_eq!(&a.speaker, &b.speaker);
            prop_assert_eq!(&a.message, &b.message);
            prop_assert_eq!(a.position, b.position);
        }
    }
}
