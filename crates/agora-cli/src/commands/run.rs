//! Run command - Start a debate and steer it from the keyboard
//!
//! Usage:
//! ```bash
//! agora run "AI's impact on privacy and surveillance"
//! agora run --provider mock --no-grounding --turns 10
//! ```
//!
//! While running, type a command and press enter:
//! `p` pause, `r` resume, `i` interrupt, `g <text>` guidance (while
//! interrupted), `a <question>` audience question, `v <name>` vote,
//! `tone <name> <humor> <assertiveness> <directness>` per-debater tone,
//! `t [topic]` change topic, `w` arm the wildcard, `q` quit.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use agora_core::{ControlParameters, DebaterTone, Focus, ResponseLength, Speaker, Tone, Turn};
use agora_debate::{DebateConfig, DebateEvent, SessionController, TelemetrySink};
use agora_knowledge::{GroundingCache, GroundingResolver, WikipediaSource};
use agora_llm::{LlmConfig, LlmProvider, ResilientProvider};

use crate::{print_info, print_success, print_warning};

const OPTIONAL_DEBATER: &str = "Wildcard";

/// Arguments for the run command
#[derive(Args)]
pub struct RunArgs {
    /// Debate topic (drawn from the built-in list when omitted)
    topic: Option<String>,

    /// Completion provider: ollama, openai, gemini or mock
    #[arg(long, env = "AGORA_PROVIDER")]
    provider: Option<String>,

    /// Model name for the provider
    #[arg(long, env = "AGORA_MODEL")]
    model: Option<String>,

    /// Stop after this many debater turns
    #[arg(long)]
    turns: Option<usize>,

    /// Enable the optional Wildcard debater
    #[arg(long)]
    wildcard: bool,

    /// Response length: very-short, short, medium, long
    #[arg(long, default_value = "medium")]
    length: ResponseLength,

    /// Tone: casual, formal, creative, debate
    #[arg(long, default_value = "debate")]
    tone: Tone,

    /// Focus: agreeable, challenging, balanced, informative
    #[arg(long, default_value = "challenging")]
    focus: Focus,

    /// Probability of introducing subtopics (0 keeps debaters on topic)
    #[arg(long)]
    topic_evolution: Option<f64>,

    /// Skip Wikipedia grounding
    #[arg(long)]
    no_grounding: bool,

    /// Wikipedia language edition used for grounding
    #[arg(long, default_value = "en")]
    language: String,

    /// Telemetry listener address ("off" disables)
    #[arg(long)]
    telemetry: Option<String>,

    /// Delay between turns in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Write the transcript as JSON when the debate ends
    #[arg(long)]
    export: Option<PathBuf>,

    /// Seed for reproducible personalities
    #[arg(long)]
    seed: Option<u64>,
}

/// Run the run command
pub async fn run(args: RunArgs) -> Result<()> {
    let mut config = DebateConfig::from_env().context("Invalid debate configuration")?;
    if let Some(ms) = args.delay_ms {
        config.turn_delay = Duration::from_millis(ms);
    }
    if let Some(addr) = &args.telemetry {
        config.telemetry_addr = (!addr.eq_ignore_ascii_case("off")).then(|| addr.clone());
    }

    let mut llm = LlmConfig::from_env();
    if let Some(provider) = args.provider {
        llm.provider = provider;
    }
    if let Some(model) = args.model {
        llm.model = Some(model);
    }
    let provider = llm
        .build_provider()
        .context("Failed to configure completion provider")?;
    let provider: Arc<dyn LlmProvider> = Arc::new(ResilientProvider::wrap(provider));

    let defaults = ControlParameters::default();
    let controls = ControlParameters {
        length: args.length,
        tone: args.tone,
        focus: args.focus,
        topic_evolution: args.topic_evolution.unwrap_or(defaults.topic_evolution),
        ..defaults
    };

    let mut builder = SessionController::builder(provider)
        .config(config.clone())
        .controls(controls);
    if let Some(topic) = args.topic {
        builder = builder.topic(topic);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    if !args.no_grounding {
        let source = WikipediaSource::with_language(&args.language, Duration::from_secs(10));
        let resolver = GroundingResolver::new(Arc::new(source));
        builder = builder.grounding(Arc::new(GroundingCache::wrap(Arc::new(resolver))));
    }
    if let Some(addr) = &config.telemetry_addr {
        match TelemetrySink::bind(addr).await {
            Ok(sink) => {
                print_info(&format!("Telemetry on {}", sink.local_addr()));
                builder = builder.telemetry(Arc::new(sink));
            }
            Err(e) => print_warning(&format!("Telemetry disabled ({}): {}", addr, e)),
        }
    }

    let (mut session, mut events) = builder.build();
    if args.wildcard {
        session.set_optional_enabled(OPTIONAL_DEBATER, true).await;
    }

    println!("{}", "Agora Debate".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!(
        "{}",
        "p pause · r resume · i interrupt · g <text> guide · a <question> · v <name> · t [topic] · w wildcard · q quit"
            .dimmed()
    );
    println!();

    session.start().await;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut spoken = 0usize;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if print_event(&event) {
                    spoken += 1;
                    if args.turns.is_some_and(|max| spoken >= max) {
                        break;
                    }
                }
            }
            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_command(&session, line.trim()).await {
                            break;
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        print_warning(&format!("Keyboard input unavailable: {}", e));
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.end().await;
    info!(turns = spoken, "Debate ended");
    println!();
    print_success(&format!("Debate ended after {} turns", spoken));

    if let Some(path) = args.export {
        let json = session.export().await.context("Failed to export transcript")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        print_success(&format!("Transcript written to {}", path.display()));
    }

    Ok(())
}

/// Apply one keyboard command. Returns `false` to quit.
async fn handle_command(session: &SessionController, line: &str) -> bool {
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "p" | "pause" => report(session.pause(), "Paused", "Nothing to pause"),
        "r" | "resume" => report(session.resume(), "Resumed", "Nothing to resume"),
        "i" | "interrupt" => report(
            session.interrupt(),
            "Interrupted; guide with g <text>, then r to resume",
            "Nothing to interrupt",
        ),
        "g" | "guide" => {
            if session.guide(rest).await.is_none() {
                print_warning("Guidance needs text and an interrupted debate (press i first)");
            }
        }
        "a" | "ask" => {
            if session.ask(rest).await.is_none() {
                print_warning("Questions need text and a running debate");
            }
        }
        "v" | "vote" => match session.vote(rest).await {
            Some(_) => {}
            None => print_warning(&format!("No debater named '{}'", rest)),
        },
        "tone" => match parse_tone(rest) {
            Some((name, tone)) => report(
                session.set_debater_tone(name, tone).await,
                &format!("{} tone updated", name),
                &format!("No debater named '{}'", name),
            ),
            None => print_warning("Usage: tone <name> <humor> <assertiveness> <directness>"),
        },
        "t" | "topic" if rest.is_empty() => {
            if let Some(topic) = session.random_topic().await {
                print_info(&format!("Topic: {}", topic));
            }
        }
        "t" | "topic" => {
            session.set_topic(rest).await;
        }
        "w" | "wildcard" => report(
            session.arm(OPTIONAL_DEBATER).await,
            "Wildcard will speak this round",
            "Wildcard is disabled (start with --wildcard)",
        ),
        "q" | "quit" => return false,
        other => print_warning(&format!("Unknown command '{}'", other)),
    }
    true
}

/// `<name> <humor> <assertiveness> <directness>`
fn parse_tone(args: &str) -> Option<(&str, DebaterTone)> {
    let mut parts = args.split_whitespace();
    let name = parts.next()?;
    let mut level = || parts.next()?.parse::<f64>().ok();
    let tone = DebaterTone {
        humor: level()?,
        assertiveness: level()?,
        directness: level()?,
    };
    Some((name, tone))
}

fn report(ok: bool, success: &str, failure: &str) {
    if ok {
        print_info(success);
    } else {
        print_warning(failure);
    }
}

/// Print one event. Returns `true` for debater turns.
fn print_event(event: &DebateEvent) -> bool {
    match event {
        DebateEvent::PhaseStarted { phase } => {
            println!();
            println!("{}", format!("══ {} ══", phase).bold().cyan());
        }
        DebateEvent::OvertimeStarted => {
            println!();
            println!("{}", "══ Overtime ══".bold().magenta());
        }
        DebateEvent::TurnRecorded(turn) => {
            print_turn(turn);
            return turn.speaker.is_debater();
        }
        DebateEvent::TurnFailed { speaker, error } => {
            print_warning(&format!("{} could not respond: {}", speaker, error));
        }
        DebateEvent::RepetitionDetected { speaker } => {
            println!("{}", format!("({} repeated themself, regenerating)", speaker).dimmed());
        }
        DebateEvent::VoteCast { speaker, tally } => {
            print_info(&format!("{} now has {} vote(s)", speaker, tally));
        }
        DebateEvent::SessionStarted { .. }
        | DebateEvent::TopicChanged { .. }
        | DebateEvent::StateChanged { .. } => {}
    }
    false
}

fn print_turn(turn: &Turn) {
    let name = match &turn.speaker {
        Speaker::System => turn.speaker.name().yellow().bold(),
        Speaker::User => turn.speaker.name().blue().bold(),
        Speaker::Debater(name) => name.green().bold(),
    };
    println!();
    println!("{} {}", name, format!("({})", turn.emotion).dimmed());
    println!("{}", turn.message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tone() {
        let (name, tone) = parse_tone("Muse 0.9 0.2 1").unwrap();
        assert_eq!(name, "Muse");
        assert_eq!(
            tone,
            DebaterTone {
                humor: 0.9,
                assertiveness: 0.2,
                directness: 1.0
            }
        );
        assert!(parse_tone("Muse 0.9 high 1").is_none());
        assert!(parse_tone("Muse 0.9").is_none());
    }
}
