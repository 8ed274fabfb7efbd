//! Property tests for phase scheduling

use agora_core::{ControlParameters, DebateSession, Debater, DebaterRole};
use agora_debate::{DebateConfig, SchedulerHandle, Step, TurnScheduler};
use agora_llm::MockProvider;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

fn scheduler(phases: usize, debaters: usize) -> TurnScheduler {
    let mut rng = StdRng::seed_from_u64(9);
    let roster = (0..debaters)
        .map(|i| Debater::new(&format!("D{}", i), DebaterRole::ALL[i % 3], &mut rng))
        .collect();
    let config = DebateConfig {
        phases: (0..phases).map(|p| format!("Phase {}", p)).collect(),
        ..DebateConfig::immediate()
    };
    let session = DebateSession::new("Proptest topic", roster, ControlParameters::default());
    TurnScheduler::new(
        session,
        Arc::new(MockProvider::smart()),
        config,
        SchedulerHandle::new(),
    )
}

proptest! {
    #[test]
    fn every_mandatory_debater_speaks_once_per_phase(phases in 1usize..6, debaters in 1usize..4) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let mut s = scheduler(phases, debaters);
            s.begin(None);

            for p in 0..phases {
                for d in 0..debaters {
                    match s.step().await {
                        Step::Spoke(turn) => {
                            assert_eq!(turn.speaker.name(), format!("D{}", d));
                            assert_eq!(turn.phase, format!("Phase {}", p));
                        }
                        Step::RoundComplete => panic!("round ended inside a phase"),
                    }
                }
            }

            assert!(!s.in_overtime());
            match s.step().await {
                Step::Spoke(turn) => assert_eq!(turn.phase, "Overtime"),
                Step::RoundComplete => panic!("overtime round without speakers"),
            }
        });
    }
}
