//! Session controller
//!
//! The foreground control surface of a debate. Turn generation runs on a
//! spawned worker; every control call locks the scheduler, so it waits for
//! at most one in-flight turn. Pause, resume and interrupt only touch the
//! lifecycle state and never wait.

use agora_core::{
    default_roster, ControlParameters, ConversationError, ConversationState, DebateSession,
    Debater, DebaterTone, Turn,
};
use agora_knowledge::GroundingCache;
use agora_llm::LlmProvider;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{DebateConfig, DEFAULT_TOPICS};
use crate::events::DebateEvent;
use crate::memory::{load_background, load_viewpoints};
use crate::scheduler::{Cursor, SchedulerHandle, SchedulerState, Step, TurnScheduler};
use crate::telemetry::TelemetrySink;

/// Point-in-time view of a session
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SchedulerState,
    pub topic: String,
    pub phase: String,
    pub cursor: Cursor,
    pub controls: ControlParameters,
    pub votes: BTreeMap<String, u32>,
    pub conversation: ConversationState,
}

/// Builder for [`SessionController`]
pub struct SessionBuilder {
    provider: Arc<dyn LlmProvider>,
    config: DebateConfig,
    topic: Option<String>,
    roster: Option<Vec<Debater>>,
    controls: ControlParameters,
    grounding: Option<Arc<GroundingCache>>,
    background: Option<String>,
    telemetry: Option<Arc<TelemetrySink>>,
    seed: Option<u64>,
}

impl SessionBuilder {
    pub fn config(mut self, config: DebateConfig) -> Self {
        self.config = config;
        self
    }

    /// Opening topic; drawn from the configured list when unset
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Replace the default Analyst / Muse / Wildcard roster
    pub fn roster(mut self, debaters: Vec<Debater>) -> Self {
        self.roster = Some(debaters);
        self
    }

    pub fn controls(mut self, controls: ControlParameters) -> Self {
        self.controls = controls;
        self
    }

    pub fn grounding(mut self, grounding: Arc<GroundingCache>) -> Self {
        self.grounding = Some(grounding);
        self
    }

    pub fn background(mut self, text: impl Into<String>) -> Self {
        self.background = Some(text.into());
        self
    }

    pub fn telemetry(mut self, sink: Arc<TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the controller and the receiving end of its event stream
    pub fn build(self) -> (SessionController, mpsc::UnboundedReceiver<DebateEvent>) {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let roster = self.roster.unwrap_or_else(|| default_roster(&mut rng));
        let topic = self.topic.unwrap_or_else(|| {
            self.config
                .topics
                .choose(&mut rng)
                .cloned()
                .unwrap_or_else(|| DEFAULT_TOPICS[0].to_string())
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SchedulerHandle::new().with_events(tx);
        let session = DebateSession::new(&topic, roster, self.controls.clamped());

        let mut scheduler =
            TurnScheduler::new(session, self.provider, self.config.clone(), handle.clone());
        if let Some(seed) = self.seed {
            scheduler = scheduler.with_seed(seed);
        }
        if let Some(grounding) = self.grounding {
            scheduler = scheduler.with_grounding(grounding);
        }
        if let Some(sink) = self.telemetry {
            scheduler = scheduler.with_telemetry(sink);
        }
        scheduler.set_background(self.background);

        let controller = SessionController {
            scheduler: Arc::new(Mutex::new(scheduler)),
            handle,
            config: self.config,
            worker: None,
        };
        (controller, rx)
    }
}

/// Start, steer and stop a debate
pub struct SessionController {
    scheduler: Arc<Mutex<TurnScheduler>>,
    handle: SchedulerHandle,
    config: DebateConfig,
    worker: Option<JoinHandle<()>>,
}

impl SessionController {
    pub fn builder(provider: Arc<dyn LlmProvider>) -> SessionBuilder {
        SessionBuilder {
            provider,
            config: DebateConfig::default(),
            topic: None,
            roster: None,
            controls: ControlParameters::default(),
            grounding: None,
            background: None,
            telemetry: None,
            seed: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.handle.state()
    }

    pub fn handle(&self) -> &SchedulerHandle {
        &self.handle
    }

    /// Start a fresh session from `Idle`
    pub async fn start(&mut self) -> bool {
        if self.handle.state() != SchedulerState::Idle {
            return false;
        }
        if let Some(previous) = self.worker.take() {
            if let Err(e) = previous.await {
                warn!(error = %e, "Previous debate worker failed");
            }
        }

        let mut scheduler = self.scheduler.lock().await;
        let names: Vec<String> = scheduler
            .session()
            .debaters
            .iter()
            .map(|d| d.name.clone())
            .collect();
        let memory = match &self.config.memory_dir {
            Some(dir) => load_viewpoints(dir, &names).await,
            None => None,
        };
        if let Some(path) = &self.config.background_file {
            if let Some(text) = load_background(path).await {
                scheduler.set_background(Some(text));
            }
        }

        if !self.handle.start() {
            return false;
        }
        scheduler.begin(memory);
        drop(scheduler);

        self.worker = Some(tokio::spawn(run_worker(
            self.scheduler.clone(),
            self.handle.clone(),
            self.config.turn_delay,
            self.config.overtime_yield,
        )));
        true
    }

    pub fn pause(&self) -> bool {
        self.handle.pause()
    }

    pub fn resume(&self) -> bool {
        self.handle.resume()
    }

    pub fn interrupt(&self) -> bool {
        self.handle.interrupt()
    }

    /// Stop the session and wait for the worker to exit
    pub async fn end(&mut self) -> bool {
        if !self.handle.end() {
            return false;
        }
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!(error = %e, "Debate worker failed");
            }
        }
        self.scheduler.lock().await.finish();
        true
    }

    /// User guidance; only while `Interrupted`
    pub async fn guide(&self, guidance: &str) -> Option<Vec<Turn>> {
        if self.handle.state() != SchedulerState::Interrupted {
            return None;
        }
        let mut scheduler = self.scheduler.lock().await;
        // Resumed while we waited for the in-flight turn
        if self.handle.state() != SchedulerState::Interrupted {
            return None;
        }
        let turns = scheduler.guide(guidance).await;
        (!turns.is_empty()).then_some(turns)
    }

    /// Audience question; answered while the session is started
    pub async fn ask(&self, question: &str) -> Option<Vec<Turn>> {
        if self.handle.state() == SchedulerState::Idle {
            return None;
        }
        let mut scheduler = self.scheduler.lock().await;
        if self.handle.state() == SchedulerState::Idle {
            return None;
        }
        let turns = scheduler.ask(question).await;
        (!turns.is_empty()).then_some(turns)
    }

    /// Vote for a debater's argument; returns the new tally
    pub async fn vote(&self, name: &str) -> Option<u32> {
        self.scheduler.lock().await.vote(name)
    }

    pub async fn set_debater_tone(&self, name: &str, tone: DebaterTone) -> bool {
        self.scheduler.lock().await.set_debater_tone(name, tone)
    }

    pub async fn set_topic(&self, topic: &str) -> bool {
        self.scheduler.lock().await.set_topic(topic)
    }

    pub async fn random_topic(&self) -> Option<String> {
        self.scheduler.lock().await.random_topic()
    }

    pub async fn set_controls(&self, controls: ControlParameters) {
        self.scheduler.lock().await.set_controls(controls);
    }

    pub async fn set_optional_enabled(&self, name: &str, enabled: bool) -> bool {
        self.scheduler
            .lock()
            .await
            .set_optional_enabled(name, enabled)
    }

    pub async fn arm(&self, name: &str) -> bool {
        self.scheduler.lock().await.arm(name)
    }

    pub async fn export(&self) -> Result<String, ConversationError> {
        self.scheduler.lock().await.export()
    }

    /// Replace the transcript. Refused while turns are being generated.
    pub async fn import(&self, json: &str) -> Result<bool, ConversationError> {
        if self.handle.state().is_active() {
            return Ok(false);
        }
        self.scheduler.lock().await.import(json)?;
        Ok(true)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let scheduler = self.scheduler.lock().await;
        SessionSnapshot {
            state: self.handle.state(),
            topic: scheduler.session().topic.clone(),
            phase: scheduler.current_phase().to_string(),
            cursor: scheduler.cursor(),
            controls: scheduler.session().controls.clone(),
            votes: scheduler.votes().clone(),
            conversation: scheduler.conversation().clone(),
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

async fn run_worker(
    scheduler: Arc<Mutex<TurnScheduler>>,
    handle: SchedulerHandle,
    turn_delay: Duration,
    overtime_yield: Duration,
) {
    let mut state = handle.subscribe();
    info!("Debate worker started");

    loop {
        let current = *state.borrow_and_update();
        match current {
            SchedulerState::Idle => break,
            SchedulerState::Paused | SchedulerState::Interrupted => {
                if state.changed().await.is_err() {
                    break;
                }
                continue;
            }
            SchedulerState::Running | SchedulerState::Overtime => {}
        }

        let step = {
            let mut scheduler = scheduler.lock().await;
            if !handle.state().is_active() {
                continue;
            }
            scheduler.step().await
        };

        let wait = match step {
            Step::Spoke(_) => turn_delay,
            Step::RoundComplete => overtime_yield,
        };
        // The step itself may have moved Running to Overtime
        state.borrow_and_update();

        if wait.is_zero() {
            tokio::task::yield_now().await;
            continue;
        }
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    debug!("Debate worker stopped");
}
