//! Info command - Show providers, phases and topics
//!
//! Usage:
//! ```bash
//! agora info
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use agora_debate::{DEFAULT_PHASES, DEFAULT_TOPICS};
use agora_llm::LlmConfig;

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs;

/// Run the info command
pub fn run(_args: InfoArgs) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let llm = LlmConfig::from_env();

    println!("{}", "Agora - Multi-party AI Debates".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Completion Providers:".bold());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Provider").fg(Color::Cyan),
            Cell::new("Configured").fg(Color::Cyan),
            Cell::new("Selected").fg(Color::Cyan),
        ]);
    for name in ["ollama", "openai", "gemini", "mock"] {
        let configured = if llm.is_configured(name) {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::Red)
        };
        let selected = if llm.provider == name { "●" } else { "" };
        table.add_row(vec![Cell::new(name), configured, Cell::new(selected)]);
    }
    println!("{table}");
    println!();

    println!("{}", "Phases:".bold());
    for (i, phase) in DEFAULT_PHASES.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).cyan(), phase);
    }
    println!("  {} {}", "∞".cyan(), "Overtime".dimmed());
    println!();

    println!("{}", "Topics:".bold());
    for topic in DEFAULT_TOPICS {
        println!("  {} {}", "•".cyan(), topic.green());
    }
    println!();

    println!("{}", "Configuration:".bold());
    for var in [
        "AGORA_PROVIDER",
        "AGORA_MODEL",
        "OLLAMA_URL",
        "OPENAI_API_KEY",
        "GEMINI_API_KEY",
        "AGORA_TURN_DELAY_MS",
        "AGORA_TURN_TIMEOUT_SECS",
        "AGORA_REPETITION_THRESHOLD",
        "AGORA_CONTEXT_WINDOW",
        "AGORA_MEMORY_DIR",
        "AGORA_BACKGROUND_FILE",
        "AGORA_TELEMETRY_ADDR",
    ] {
        let state = if std::env::var(var).is_ok() {
            "set".green()
        } else {
            "unset".dimmed()
        };
        println!("  {} {}", format!("{:<28}", var).dimmed(), state);
    }
    println!();

    Ok(())
}
