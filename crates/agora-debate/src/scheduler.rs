//! Turn scheduler and lifecycle state machine
//!
//! [`SchedulerHandle`] owns the lifecycle state in a `watch` channel so that
//! pause and interrupt never wait for a turn to finish. [`TurnScheduler`]
//! owns the session, transcript and cursor, and produces one turn per
//! [`TurnScheduler::step`].

use agora_core::{
    ConversationError, ConversationState, ControlParameters, DebateSession, DebaterTone,
    RepetitionTracker, Speaker, Turn,
};
use agora_knowledge::{GroundingCache, RetrievalResult};
use agora_llm::{GenerationError, LlmProvider, LlmRequest};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::{DebateConfig, GUIDANCE_PHASE, OVERTIME_PHASE, QUESTION_PHASE, SESSION_PHASE};
use crate::events::DebateEvent;
use crate::prompt::{self, PromptContext};
use crate::telemetry::TelemetrySink;

/// Recorded in place of a turn whose generation failed
pub const FAILURE_PLACEHOLDER: &str =
    "I apologize, but I encountered an error while formulating my response.";

/// Directive for the single regeneration after a repetitive turn
pub const REPETITION_DIRECTIVE: &str = "Your previous argument was repetitive. Please provide a new perspective or introduce a related subtopic to advance the debate.";

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
    Overtime,
    Paused,
    Interrupted,
}

impl SchedulerState {
    /// Whether the worker generates turns in this state
    pub fn is_active(&self) -> bool {
        matches!(self, SchedulerState::Running | SchedulerState::Overtime)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
            SchedulerState::Overtime => "overtime",
            SchedulerState::Paused => "paused",
            SchedulerState::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// Shared lifecycle state and event channel
///
/// Transitions that are not allowed from the current state are no-ops
/// returning `false`.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    state: Arc<watch::Sender<SchedulerState>>,
    events: Option<mpsc::UnboundedSender<DebateEvent>>,
}

impl Default for SchedulerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerHandle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            state: Arc::new(state),
            events: None,
        }
    }

    /// Forward every [`DebateEvent`] to `events`
    pub fn with_events(mut self, events: mpsc::UnboundedSender<DebateEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// `Running`/`Overtime`/`Interrupted` to `Paused`
    pub fn pause(&self) -> bool {
        use SchedulerState::*;
        self.transition(&[Running, Overtime, Interrupted], Paused)
    }

    /// `Paused`/`Interrupted` to `Running`
    pub fn resume(&self) -> bool {
        use SchedulerState::*;
        self.transition(&[Paused, Interrupted], Running)
    }

    /// `Running`/`Overtime` to `Interrupted`
    pub fn interrupt(&self) -> bool {
        use SchedulerState::*;
        self.transition(&[Running, Overtime], Interrupted)
    }

    pub(crate) fn start(&self) -> bool {
        self.transition(&[SchedulerState::Idle], SchedulerState::Running)
    }

    pub(crate) fn enter_overtime(&self) -> bool {
        self.transition(&[SchedulerState::Running], SchedulerState::Overtime)
    }

    pub(crate) fn end(&self) -> bool {
        use SchedulerState::*;
        self.transition(&[Running, Overtime, Paused, Interrupted], Idle)
    }

    pub(crate) fn emit(&self, event: DebateEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver just means nobody is watching
            let _ = events.send(event);
        }
    }

    fn transition(&self, allowed: &[SchedulerState], to: SchedulerState) -> bool {
        let mut from = to;
        let changed = self.state.send_if_modified(|current| {
            if allowed.contains(current) {
                from = *current;
                *current = to;
                true
            } else {
                false
            }
        });

        if changed {
            debug!(%from, %to, "Scheduler state changed");
            self.emit(DebateEvent::StateChanged { from, to });
        }
        changed
    }
}

/// Position in the phase sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Cursor {
    /// Index into the phase list; equal to its length in overtime
    pub phase: usize,
    /// Next slot in the speaking order
    pub slot: usize,
    pub overtime_rounds: u64,
}

/// Outcome of one scheduler step
#[derive(Debug, Clone)]
pub enum Step {
    Spoke(Turn),
    /// An overtime round ended; the caller yields before the next one
    RoundComplete,
}

/// Produces debate turns
#[derive(Debug)]
pub struct TurnScheduler {
    session: DebateSession,
    conversation: ConversationState,
    tracker: RepetitionTracker,
    cursor: Cursor,
    config: DebateConfig,
    provider: Arc<dyn LlmProvider>,
    grounding: Option<Arc<GroundingCache>>,
    background: Option<String>,
    telemetry: Option<Arc<TelemetrySink>>,
    votes: BTreeMap<String, u32>,
    handle: SchedulerHandle,
    rng: StdRng,
}

impl TurnScheduler {
    pub fn new(
        session: DebateSession,
        provider: Arc<dyn LlmProvider>,
        config: DebateConfig,
        handle: SchedulerHandle,
    ) -> Self {
        Self {
            session,
            conversation: ConversationState::new(),
            tracker: RepetitionTracker::new(config.repetition_threshold),
            cursor: Cursor::default(),
            config,
            provider,
            grounding: None,
            background: None,
            telemetry: None,
            votes: BTreeMap::new(),
            handle,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_grounding(mut self, grounding: Arc<GroundingCache>) -> Self {
        self.grounding = Some(grounding);
        self
    }

    pub fn set_background(&mut self, background: Option<String>) {
        self.background = background;
    }

    pub fn with_telemetry(mut self, telemetry: Arc<TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Deterministic personalities, stances and topic draws
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn session(&self) -> &DebateSession {
        &self.session
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn handle(&self) -> &SchedulerHandle {
        &self.handle
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    /// Phase name at the cursor
    pub fn current_phase(&self) -> &str {
        self.config
            .phases
            .get(self.cursor.phase)
            .map(String::as_str)
            .unwrap_or(OVERTIME_PHASE)
    }

    pub fn in_overtime(&self) -> bool {
        self.cursor.phase >= self.config.phases.len()
    }

    /// Reset for a new session and record the opening entries
    pub fn begin(&mut self, memory: Option<String>) {
        self.session.reinitialize_personalities(&mut self.rng);
        self.conversation.clear();
        self.tracker.reset();
        self.votes.clear();
        self.cursor = Cursor::default();
        self.prefetch_grounding();

        let topic = self.session.topic.clone();
        info!(%topic, "Debate session started");
        self.handle.emit(DebateEvent::SessionStarted {
            topic: topic.clone(),
        });
        self.record(
            Speaker::System,
            format!("Debate started on: {}", topic),
            SESSION_PHASE,
        );
        if let Some(memory) = memory {
            self.record(Speaker::System, memory, SESSION_PHASE);
        }
        self.announce_phase();
    }

    /// Generate the next turn, or finish an overtime round
    pub async fn step(&mut self) -> Step {
        if self.in_overtime() && self.handle.state() == SchedulerState::Running {
            self.handle.enter_overtime();
        }

        let Some((index, phase)) = self.advance() else {
            debug!(round = self.cursor.overtime_rounds, "Overtime round complete");
            return Step::RoundComplete;
        };

        let directive = format!(
            "Continue the debate on {}. We are in the {} phase.",
            self.session.topic, phase
        );
        let context = self.conversation.context(self.config.context_window);
        let message = self.generate(index, &context, &directive).await;

        let debater = &mut self.session.debaters[index];
        if debater.optional {
            debater.armed = false;
        }
        let speaker = Speaker::debater(debater.name.clone());
        Step::Spoke(self.record(speaker, message, &phase))
    }

    /// Record user guidance and collect one response from every active debater
    pub async fn guide(&mut self, guidance: &str) -> Vec<Turn> {
        let guidance = guidance.trim();
        if guidance.is_empty() {
            return Vec::new();
        }

        info!(%guidance, "User guidance");
        self.record(Speaker::User, guidance, GUIDANCE_PHASE);
        let context = self.conversation.context(self.config.guidance_window);
        self.respond_all(&context, guidance, GUIDANCE_PHASE).await
    }

    /// Record an audience question and collect one answer from every active
    /// debater. Answering stops early if the session ends.
    pub async fn ask(&mut self, question: &str) -> Vec<Turn> {
        let question = question.trim();
        if question.is_empty() {
            return Vec::new();
        }

        info!(%question, "Audience question");
        self.record(Speaker::User, format!("Question: {}", question), QUESTION_PHASE);
        let context = self.conversation.context(self.config.context_window);
        let directive = format!(
            "Answer the following question based on the debate topic: {}",
            question
        );
        self.respond_all(&context, &directive, QUESTION_PHASE).await
    }

    /// Record a vote for the best argument. Returns the debater's new tally,
    /// or `None` for an unknown name.
    pub fn vote(&mut self, name: &str) -> Option<u32> {
        self.session.debater(name)?;
        let tally = self.votes.entry(name.to_string()).or_insert(0);
        *tally += 1;
        let tally = *tally;

        info!(debater = %name, tally, "Vote recorded");
        self.handle.emit(DebateEvent::VoteCast {
            speaker: name.to_string(),
            tally,
        });
        self.record(
            Speaker::System,
            format!("User voted for {} as the best argument.", name),
            SESSION_PHASE,
        );
        Some(tally)
    }

    /// Votes per debater since the session began
    pub fn votes(&self) -> &BTreeMap<String, u32> {
        &self.votes
    }

    /// Override one debater's tone scalars until the next control change
    /// or personality regeneration
    pub fn set_debater_tone(&mut self, name: &str, tone: DebaterTone) -> bool {
        match self.session.debater_mut(name) {
            Some(debater) => {
                debater.set_tone(tone);
                debug!(debater = %name, ?tone, "Debater tone updated");
                true
            }
            None => false,
        }
    }

    /// Change the topic. Empty text is ignored.
    pub fn set_topic(&mut self, topic: &str) -> bool {
        let topic = topic.trim();
        if topic.is_empty() {
            return false;
        }

        self.session.topic = topic.to_string();
        self.session.reinitialize_personalities(&mut self.rng);
        self.prefetch_grounding();
        self.handle.emit(DebateEvent::TopicChanged {
            topic: topic.to_string(),
        });
        self.record(
            Speaker::System,
            format!("New debate topic: {}", topic),
            SESSION_PHASE,
        );
        true
    }

    /// Switch to a topic drawn from the configured list
    pub fn random_topic(&mut self) -> Option<String> {
        let topic = self.config.topics.choose(&mut self.rng).cloned()?;
        self.set_topic(&topic).then_some(topic)
    }

    pub fn set_controls(&mut self, controls: ControlParameters) {
        self.session.set_controls(controls);
    }

    /// Enable or disable an optional debater. Disabling also disarms.
    pub fn set_optional_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.session.debater_mut(name) {
            Some(debater) if debater.optional => {
                debater.enabled = enabled;
                if !enabled {
                    debater.armed = false;
                }
                true
            }
            _ => false,
        }
    }

    /// Let an enabled optional debater speak once in the current round
    pub fn arm(&mut self, name: &str) -> bool {
        match self.session.debater_mut(name) {
            Some(debater) if debater.optional && debater.enabled => {
                debater.armed = true;
                true
            }
            _ => false,
        }
    }

    /// Forget repetition history at session end
    pub fn finish(&mut self) {
        self.tracker.reset();
        info!(turns = self.conversation.len(), "Debate session ended");
    }

    pub fn export(&self) -> Result<String, ConversationError> {
        self.conversation.to_json()
    }

    pub fn import(&mut self, json: &str) -> Result<(), ConversationError> {
        self.conversation = ConversationState::from_json(json)?;
        Ok(())
    }

    /// Mandatory debaters first, then optional ones, each in roster order
    fn speaking_order(&self) -> Vec<usize> {
        let debaters = &self.session.debaters;
        let mandatory = (0..debaters.len()).filter(|&i| !debaters[i].optional);
        let optional = (0..debaters.len()).filter(|&i| debaters[i].optional);
        mandatory.chain(optional).collect()
    }

    /// One response from every active debater, in speaking order
    async fn respond_all(&mut self, context: &str, directive: &str, phase: &str) -> Vec<Turn> {
        let responders: Vec<usize> = self
            .speaking_order()
            .into_iter()
            .filter(|&i| self.session.debaters[i].is_active())
            .collect();

        let mut turns = Vec::with_capacity(responders.len());
        for (n, index) in responders.into_iter().enumerate() {
            if self.handle.state() == SchedulerState::Idle {
                break;
            }
            if n > 0 && !self.config.turn_delay.is_zero() {
                tokio::time::sleep(self.config.turn_delay).await;
            }
            let message = self.generate(index, context, directive).await;
            let speaker = Speaker::debater(self.session.debaters[index].name.clone());
            turns.push(self.record(speaker, message, phase));
        }
        turns
    }

    /// Start resolving the current topic in the background
    fn prefetch_grounding(&self) {
        let Some(cache) = self.grounding.clone() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let topic = self.session.topic.clone();
        runtime.spawn(async move {
            cache.ground(&topic).await;
        });
    }

    /// Grounding for the current topic, bounded by the turn timeout
    async fn ground_topic(&self) -> Option<Arc<RetrievalResult>> {
        let cache = self.grounding.as_ref()?;
        let topic = &self.session.topic;
        match tokio::time::timeout(self.config.turn_timeout, cache.ground(topic)).await {
            Ok(result) => Some(result),
            Err(_) => {
                warn!(%topic, "Grounding timed out, continuing without it");
                None
            }
        }
    }

    /// Move the cursor to the next eligible speaker. `None` ends an overtime round.
    fn advance(&mut self) -> Option<(usize, String)> {
        let order = self.speaking_order();
        loop {
            if self.cursor.slot >= order.len() {
                self.cursor.slot = 0;
                if self.in_overtime() {
                    self.cursor.overtime_rounds += 1;
                    return None;
                }
                self.cursor.phase += 1;
                self.announce_phase();
                continue;
            }

            let index = order[self.cursor.slot];
            self.cursor.slot += 1;
            if self.session.debaters[index].may_speak() {
                return Some((index, self.current_phase().to_string()));
            }
        }
    }

    fn announce_phase(&mut self) {
        match self.config.phases.get(self.cursor.phase) {
            Some(phase) => {
                info!(%phase, "Phase started");
                self.handle.emit(DebateEvent::PhaseStarted {
                    phase: phase.clone(),
                });
            }
            None => {
                info!("Entering overtime");
                self.handle.emit(DebateEvent::OvertimeStarted);
                self.handle.enter_overtime();
            }
        }
    }

    async fn generate(&mut self, index: usize, context: &str, directive: &str) -> String {
        let name = self.session.debaters[index].name.clone();
        let grounding = self.ground_topic().await;

        let request = self.compose(index, context, directive, grounding.as_deref());
        let text = match self.complete(request).await {
            Ok(text) => text,
            Err(e) => return self.placeholder(&name, e),
        };

        let text = if self.tracker.observe(&name, &text).is_repetitive() {
            info!(debater = %name, "Repetitive argument, regenerating");
            self.handle.emit(DebateEvent::RepetitionDetected {
                speaker: name.clone(),
            });
            let retry = self.compose(index, context, REPETITION_DIRECTIVE, grounding.as_deref());
            match self.complete(retry).await {
                Ok(text) => text,
                Err(e) => return self.placeholder(&name, e),
            }
        } else {
            text
        };

        if self.session.debaters[index].role.enforces_length() {
            self.session.controls.length.enforce(&text)
        } else {
            text
        }
    }

    fn compose(
        &mut self,
        index: usize,
        context: &str,
        directive: &str,
        grounding: Option<&RetrievalResult>,
    ) -> LlmRequest {
        let debater = &self.session.debaters[index];
        let opponents = self.session.opponents_of(&debater.name);
        let ctx = PromptContext {
            debater,
            topic: &self.session.topic,
            controls: &self.session.controls,
            context,
            grounding,
            background: self.background.as_deref(),
            directive,
            opponents: &opponents,
        };
        prompt::compose(&ctx, &mut self.rng).into_request()
    }

    async fn complete(&self, request: LlmRequest) -> Result<String, GenerationError> {
        let timeout = self.config.turn_timeout;
        let response = tokio::time::timeout(timeout, self.provider.complete(request))
            .await
            .map_err(|_| GenerationError::Timeout(timeout.as_millis() as u64))??;

        let content = response.content.trim();
        if content.is_empty() {
            return Err(GenerationError::InvalidResponse("empty completion".to_string()));
        }
        Ok(content.to_string())
    }

    fn placeholder(&self, speaker: &str, error: GenerationError) -> String {
        warn!(debater = %speaker, provider = self.provider.name(), error = %error, "Turn generation failed");
        self.handle.emit(DebateEvent::TurnFailed {
            speaker: speaker.to_string(),
            error: error.to_string(),
        });
        FAILURE_PLACEHOLDER.to_string()
    }

    fn record(&mut self, speaker: Speaker, message: impl Into<String>, phase: &str) -> Turn {
        let turn = self.conversation.append(speaker, message, phase).clone();
        self.handle.emit(DebateEvent::TurnRecorded(turn.clone()));
        if let Some(sink) = &self.telemetry {
            sink.publish(&turn);
        }
        turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{default_roster, DebaterRole, ResponseLength};
    use agora_llm::MockProvider;
    use std::time::Duration;

    fn scheduler_with(provider: Arc<dyn LlmProvider>, config: DebateConfig) -> TurnScheduler {
        let mut rng = StdRng::seed_from_u64(3);
        let session = DebateSession::new(
            "AI's impact on privacy",
            default_roster(&mut rng),
            ControlParameters::default(),
        );
        TurnScheduler::new(session, provider, config, SchedulerHandle::new()).with_seed(3)
    }

    fn scheduler(provider: Arc<dyn LlmProvider>) -> TurnScheduler {
        scheduler_with(provider, DebateConfig::immediate())
    }

    async fn spoke(s: &mut TurnScheduler) -> Turn {
        match s.step().await {
            Step::Spoke(turn) => turn,
            Step::RoundComplete => panic!("expected a turn"),
        }
    }

    #[test]
    fn test_handle_transitions() {
        use SchedulerState::*;
        let handle = SchedulerHandle::new();
        assert_eq!(handle.state(), Idle);
        assert!(!handle.pause());
        assert!(!handle.resume());
        assert!(handle.start());
        assert!(!handle.start());
        assert!(handle.interrupt());
        assert!(!handle.interrupt());
        assert!(handle.pause());
        assert_eq!(handle.state(), Paused);
        assert!(handle.resume());
        assert!(handle.enter_overtime());
        assert!(handle.pause());
        assert!(handle.resume());
        assert_eq!(handle.state(), Running);
        assert!(handle.end());
        assert!(!handle.end());
        assert_eq!(handle.state(), Idle);
    }

    #[test]
    fn test_state_changes_are_emitted() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SchedulerHandle::new().with_events(tx);
        handle.start();
        handle.pause();
        handle.pause();

        assert_eq!(
            rx.try_recv().unwrap(),
            DebateEvent::StateChanged {
                from: SchedulerState::Idle,
                to: SchedulerState::Running
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            DebateEvent::StateChanged {
                from: SchedulerState::Running,
                to: SchedulerState::Paused
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_phases_then_overtime() {
        let mut s = scheduler(Arc::new(MockProvider::smart()));
        s.handle().start();
        s.begin(None);

        for i in 0..10 {
            let turn = spoke(&mut s).await;
            let expected = if i % 2 == 0 { "Analyst" } else { "Muse" };
            assert_eq!(turn.speaker.name(), expected);
            assert_eq!(turn.phase, s.config().phases[i / 2]);
        }
        assert_eq!(s.handle().state(), SchedulerState::Running);

        let turn = spoke(&mut s).await;
        assert_eq!(turn.phase, OVERTIME_PHASE);
        assert_eq!(s.handle().state(), SchedulerState::Overtime);
        spoke(&mut s).await;
        assert!(matches!(s.step().await, Step::RoundComplete));
        assert_eq!(s.cursor().overtime_rounds, 1);
    }

    #[tokio::test]
    async fn test_armed_optional_speaks_once() {
        let mut s = scheduler(Arc::new(MockProvider::smart()));
        s.begin(None);
        assert!(!s.arm("Wildcard"));
        assert!(s.set_optional_enabled("Wildcard", true));
        assert!(s.arm("Wildcard"));
        assert!(!s.arm("Analyst"));

        let speakers: Vec<String> = [
            spoke(&mut s).await,
            spoke(&mut s).await,
            spoke(&mut s).await,
            spoke(&mut s).await,
        ]
        .iter()
        .map(|t| t.speaker.name().to_string())
        .collect();
        assert_eq!(speakers, ["Analyst", "Muse", "Wildcard", "Analyst"]);
        assert!(!s.session().debater("Wildcard").unwrap().armed);

        assert!(s.arm("Wildcard"));
        assert!(s.set_optional_enabled("Wildcard", false));
        assert!(!s.session().debater("Wildcard").unwrap().armed);
    }

    #[tokio::test]
    async fn test_failure_records_placeholder_and_continues() {
        let mut s = scheduler(Arc::new(MockProvider::failing_on(vec![0])));
        let (tx, mut rx) = mpsc::unbounded_channel();
        s.handle = SchedulerHandle::new().with_events(tx);
        s.begin(None);

        let first = spoke(&mut s).await;
        assert_eq!(first.message, FAILURE_PLACEHOLDER);
        let second = spoke(&mut s).await;
        assert_eq!(second.speaker.name(), "Muse");
        assert_ne!(second.message, FAILURE_PLACEHOLDER);

        let mut failed = false;
        while let Ok(event) = rx.try_recv() {
            failed |= matches!(event, DebateEvent::TurnFailed { ref speaker, .. } if speaker == "Analyst");
        }
        assert!(failed);
    }

    #[tokio::test]
    async fn test_timeout_becomes_placeholder() {
        let provider = MockProvider::smart().with_latency(Duration::from_millis(500));
        let config = DebateConfig {
            turn_timeout: Duration::from_millis(20),
            ..DebateConfig::immediate()
        };
        let mut s = scheduler_with(Arc::new(provider), config);
        s.begin(None);
        assert_eq!(spoke(&mut s).await.message, FAILURE_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_repetition_regenerates_once() {
        let provider = Arc::new(MockProvider::constant(
            "Same argument every time, word for word, with no change at all.",
        ));
        let mut s = scheduler(provider.clone());
        s.begin(None);

        for _ in 0..6 {
            spoke(&mut s).await;
        }
        assert_eq!(provider.call_count(), 6);

        // Analyst's fourth identical argument
        spoke(&mut s).await;
        assert_eq!(provider.call_count(), 8);
        let retry = provider.requests().pop().unwrap();
        assert!(retry.prompt.contains(REPETITION_DIRECTIVE));
    }

    #[tokio::test]
    async fn test_chaotic_response_trimmed() {
        let provider = MockProvider::constant("First wild claim. Second wild claim. Third one.");
        let mut s = scheduler(Arc::new(provider));
        s.set_controls(ControlParameters {
            length: ResponseLength::Short,
            ..Default::default()
        });
        s.begin(None);
        s.set_optional_enabled("Wildcard", true);
        s.arm("Wildcard");

        let analyst = spoke(&mut s).await;
        assert_eq!(analyst.message, "First wild claim. Second wild claim. Third one.");
        spoke(&mut s).await;
        let wildcard = spoke(&mut s).await;
        assert_eq!(s.session().debater("Wildcard").unwrap().role, DebaterRole::Chaotic);
        assert_eq!(wildcard.message, "First wild claim. Second wild claim.");
    }

    #[tokio::test]
    async fn test_guidance_round() {
        let provider = Arc::new(MockProvider::smart());
        let mut s = scheduler(provider.clone());
        s.handle().start();
        s.begin(None);
        s.set_optional_enabled("Wildcard", true);

        let turns = s.guide("Focus on healthcare").await;
        let speakers: Vec<&str> = turns.iter().map(|t| t.speaker.name()).collect();
        assert_eq!(speakers, ["Analyst", "Muse", "Wildcard"]);
        assert!(turns.iter().all(|t| t.phase == GUIDANCE_PHASE));

        let user = &s.conversation().turns()[1];
        assert_eq!(user.speaker, Speaker::User);
        assert_eq!(user.message, "Focus on healthcare");
        assert!(provider.requests()[0]
            .prompt
            .contains("User Guidance: Focus on healthcare"));

        assert!(s.guide("   ").await.is_empty());
    }

    #[tokio::test]
    async fn test_begin_records_memory_and_topic_changes() {
        let mut s = scheduler(Arc::new(MockProvider::smart()));
        s.begin(Some("Pre-Debate AI Viewpoints:\n".to_string()));

        let turns = s.conversation().turns();
        assert_eq!(turns[0].message, "Debate started on: AI's impact on privacy");
        assert_eq!(turns[1].message, "Pre-Debate AI Viewpoints:\n");
        assert!(turns.iter().all(|t| t.speaker == Speaker::System));

        assert!(!s.set_topic("  "));
        assert!(s.set_topic("Robots in art"));
        assert_eq!(
            s.conversation().last().unwrap().message,
            "New debate topic: Robots in art"
        );

        let topic = s.random_topic().unwrap();
        assert!(s.config().topics.contains(&topic));
        assert_eq!(s.session().topic, topic);
    }

    #[tokio::test]
    async fn test_audience_question_round() {
        let provider = Arc::new(MockProvider::smart());
        let mut s = scheduler(provider.clone());
        s.handle().start();
        s.begin(None);

        let turns = s.ask("Who owns my health data?").await;
        let speakers: Vec<&str> = turns.iter().map(|t| t.speaker.name()).collect();
        assert_eq!(speakers, ["Analyst", "Muse"]);
        assert!(turns.iter().all(|t| t.phase == QUESTION_PHASE));

        let user = &s.conversation().turns()[1];
        assert_eq!(user.speaker, Speaker::User);
        assert_eq!(user.message, "Question: Who owns my health data?");
        assert!(provider.requests()[0].prompt.contains(
            "Answer the following question based on the debate topic: Who owns my health data?"
        ));

        assert!(s.ask("").await.is_empty());
    }

    #[tokio::test]
    async fn test_question_stops_when_session_ends() {
        let mut s = scheduler(Arc::new(MockProvider::smart()));
        s.begin(None);
        // Never started, so nobody answers
        assert!(s.ask("Anyone there?").await.is_empty());
        assert_eq!(s.conversation().last().unwrap().speaker, Speaker::User);
    }

    #[test]
    fn test_votes_are_tallied_and_recorded() {
        let mut s = scheduler(Arc::new(MockProvider::smart()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        s.handle = SchedulerHandle::new().with_events(tx);

        assert_eq!(s.vote("Muse"), Some(1));
        assert_eq!(s.vote("Muse"), Some(2));
        assert_eq!(s.vote("Analyst"), Some(1));
        assert_eq!(s.vote("Nobody"), None);

        assert_eq!(s.votes().get("Muse"), Some(&2));
        assert_eq!(s.votes().get("Analyst"), Some(&1));
        assert_eq!(
            s.conversation().last().unwrap().message,
            "User voted for Analyst as the best argument."
        );
        assert_eq!(s.conversation().len(), 3);
        assert_eq!(
            rx.try_recv().unwrap(),
            DebateEvent::VoteCast {
                speaker: "Muse".to_string(),
                tally: 1
            }
        );

        s.begin(None);
        assert!(s.votes().is_empty());
    }

    #[test]
    fn test_debater_tone_is_individual() {
        let mut s = scheduler(Arc::new(MockProvider::smart()));
        let tone = DebaterTone {
            humor: 0.9,
            assertiveness: 1.5,
            directness: 0.1,
        };
        assert!(s.set_debater_tone("Muse", tone));
        assert!(!s.set_debater_tone("Nobody", tone));

        let muse = s.session().debater("Muse").unwrap();
        assert_eq!(muse.humor, 0.9);
        assert_eq!(muse.assertiveness, 1.0);
        assert_eq!(muse.directness, 0.1);
        let analyst = s.session().debater("Analyst").unwrap();
        assert_eq!(analyst.humor, 0.5);
        assert_eq!(analyst.directness, 0.5);
    }

    #[tokio::test]
    async fn test_slow_grounding_is_skipped() {
        use agora_knowledge::{GroundingResolver, InMemorySource};

        let source = InMemorySource::new()
            .with_article("Privacy", "Privacy is the ability to seclude oneself.")
            .with_latency(Duration::from_millis(500));
        let resolver = GroundingResolver::new(Arc::new(source));
        let cache = Arc::new(GroundingCache::wrap(Arc::new(resolver)));
        let provider = Arc::new(MockProvider::smart());
        let config = DebateConfig {
            turn_timeout: Duration::from_millis(50),
            ..DebateConfig::immediate()
        };
        let mut s = scheduler_with(provider.clone(), config).with_grounding(cache);
        s.begin(None);

        let turn = tokio::time::timeout(Duration::from_millis(400), spoke(&mut s))
            .await
            .expect("grounding held up the turn");
        assert_ne!(turn.message, FAILURE_PLACEHOLDER);
        assert_eq!(provider.call_count(), 1);
    }
}
