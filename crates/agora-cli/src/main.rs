//! Agora CLI - run and steer multi-party AI debates
//!
//! # Usage
//!
//! ```bash
//! # Debate a topic with the configured provider
//! agora run "AI's impact on privacy and surveillance"
//!
//! # Offline run with the mock provider, ten turns, transcript saved
//! agora run --provider mock --no-grounding --turns 10 --export debate.json
//!
//! # Ground a topic against Wikipedia
//! agora resolve "jaguar"
//!
//! # Show providers, phases and topics
//! agora info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{info, resolve, run};

/// Agora - structured debates between AI personalities
#[derive(Parser)]
#[command(
    name = "agora",
    version,
    about = "Agora CLI - Multi-party AI Debates",
    long_about = "Agora runs phase-structured debates between AI debaters with\n\
                  generated personalities, grounded in retrieved knowledge."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a debate session
    #[command(name = "run")]
    Run(run::RunArgs),

    /// Ground a topic and print the retrieval result
    #[command(name = "resolve")]
    Resolve(resolve::ResolveArgs),

    /// Show providers, phases and topics
    #[command(name = "info")]
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => run::run(args).await,
        Commands::Resolve(args) => resolve::run(args).await,
        Commands::Info(args) => info::run(args),
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print an info message
pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}
