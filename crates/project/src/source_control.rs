use crate::{Result, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub message: String,
    pub committer: String,
    pub timestamp: DateTime<Utc>,
}

/// History provider for a project directory
pub trait SourceControl {
    fn has_source_control_enabled(&self, path: &Path) -> bool;

    /// Commits newest first
    fn history(&self, path: &Path) -> Result<Vec<CommitRecord>>;
}

/// Reads history by shelling out to `git`
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

const FIELD_SEP: char = '\u{1f}';

impl SourceControl for GitCli {
    fn has_source_control_enabled(&self, path: &Path) -> bool {
        if !path.exists() {
            return false;
        }
        Command::new("git")
            .arg("-C")
            .arg(path)
            .args(["rev-parse", "--is-inside-work-tree"])
            .output()
            .map(|out| {
                out.status.success() && String::from_utf8_lossy(&out.stdout).trim() == "true"
            })
            .unwrap_or(false)
    }

    fn history(&self, path: &Path) -> Result<Vec<CommitRecord>> {
        if !self.has_source_control_enabled(path) {
            return Ok(Vec::new());
        }
        let output = Command::new("git")
            .arg("-C")
            .arg(path)
            .args(["log", "--format=%cI%x1f%cn%x1f%s"])
            .output()
            .map_err(|err| StoreError::io(path, err))?;
        if !output.status.success() {
            // A repository without commits has no history.
            log::debug!(
                "git log failed in {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(Vec::new());
        }
        Ok(parse_git_log(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn parse_git_log(raw: &str) -> Vec<CommitRecord> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.splitn(3, FIELD_SEP);
            let timestamp = DateTime::parse_from_rfc3339(fields.next()?.trim()).ok()?;
            let committer = fields.next()?.to_string();
            let message = fields.next().unwrap_or_default().to_string();
            Some(CommitRecord {
                message,
                committer,
                timestamp: timestamp.with_timezone(&Utc),
            })
        })
        .collect()
}
