//! Pre-debate memory and background text
//!
//! Each debater may have a `<name>_conversation.json` file from an earlier
//! one-on-one chat. Files that are missing or unreadable are skipped.

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SavedConversation {
    #[serde(default)]
    summary: Option<String>,
}

/// Path of a debater's saved conversation inside `dir`
pub fn memory_file(dir: &Path, name: &str) -> std::path::PathBuf {
    dir.join(format!("{}_conversation.json", name))
}

/// Combined viewpoint summaries, or `None` when no debater has one
pub async fn load_viewpoints(dir: &Path, names: &[String]) -> Option<String> {
    let mut entry = String::from("Pre-Debate AI Viewpoints:\n");
    let mut found = false;

    for name in names {
        let path = memory_file(dir, name);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No pre-debate memory");
                continue;
            }
        };
        match serde_json::from_str::<SavedConversation>(&raw) {
            Ok(SavedConversation {
                summary: Some(summary),
            }) if !summary.trim().is_empty() => {
                entry.push_str(&format!("\n{}'s Viewpoint Summary:\n{}\n", name, summary.trim()));
                found = true;
            }
            Ok(_) => debug!(debater = %name, "Pre-debate memory has no summary"),
            Err(e) => warn!(path = %path.display(), error = %e, "Unreadable pre-debate memory"),
        }
    }

    found.then_some(entry)
}

/// Background text for every prompt; `None` when the file is absent or blank
pub async fn load_background(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Background file unavailable");
            None
        }
    }
}
