//! Resolve command - Ground a topic against Wikipedia
//!
//! Usage:
//! ```bash
//! agora resolve "AI's impact on privacy"
//! agora resolve jaguar --raw
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;

use agora_knowledge::terms::prepare_topic;
use agora_knowledge::{Confidence, GroundingResolver, WikipediaSource};

/// Arguments for the resolve command
#[derive(Args)]
pub struct ResolveArgs {
    /// Topic to ground
    topic: String,

    /// Wikipedia language edition
    #[arg(long, default_value = "en")]
    language: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Output raw JSON (no formatting)
    #[arg(long)]
    raw: bool,
}

/// Run the resolve command
pub async fn run(args: ResolveArgs) -> Result<()> {
    let source = WikipediaSource::with_language(&args.language, Duration::from_secs(args.timeout));
    let resolver = GroundingResolver::new(Arc::new(source));
    let topic = prepare_topic(&args.topic);

    if !args.raw {
        println!("{} Grounding '{}'...", "⚙".blue(), topic.green());
        println!();
    }

    let result = resolver.resolve(&topic).await;

    if args.raw {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let confidence = match result.confidence {
        Confidence::High => result.confidence.as_str().green(),
        Confidence::Medium => result.confidence.as_str().yellow(),
        Confidence::Low => result.confidence.as_str().red(),
        Confidence::None => result.confidence.as_str().dimmed(),
    };
    println!("{} {}", "Confidence:".bold(), confidence.bold());
    println!();

    if let Some(summary) = &result.summary {
        println!("{}", "Summary:".bold());
        println!("  {}", summary);
        println!();
    }

    if !result.key_points.is_empty() {
        println!("{}", "Key points:".bold());
        for point in &result.key_points {
            println!("  {} {}", "•".cyan(), point);
        }
        println!();
    }

    if !result.related_topics.is_empty() {
        println!("{}", "Related topics:".bold());
        for title in &result.related_topics {
            println!("  {} {}", "→".cyan(), title.green());
        }
        println!();
    }

    Ok(())
}
