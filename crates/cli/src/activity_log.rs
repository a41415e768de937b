//! Append-only record of audit entries produced by `labbook update`.
//!
//! One JSON object per line in `<root>/.labbook/activity.jsonl`.

use anyhow::{Context, Result};
use labbook_project::{AuditEntry, ProjectPaths};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOG_NAME: &str = "activity.jsonl";

fn log_path(root: &Path) -> PathBuf {
    ProjectPaths::for_root(root).base_dir.join(LOG_NAME)
}

pub(crate) fn append(root: &Path, entry: &AuditEntry) -> Result<()> {
    let path = log_path(root);
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("Failed to append to {}", path.display()))?;
    Ok(())
}

/// Entries in write order. Unreadable lines are skipped with a warning.
pub(crate) fn read(root: &Path) -> Result<Vec<AuditEntry>> {
    let path = log_path(root);
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let raw =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let entries = raw
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match serde_json::from_str(line) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Skipping {} line {}: {err}", path.display(), idx + 1);
                None
            }
        })
        .collect();
    Ok(entries)
}
