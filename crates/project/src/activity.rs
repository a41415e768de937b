use crate::action::AuditEntry;
use crate::source_control::CommitRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    Project,
    SourceControl,
}

/// One line of the combined activity view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayEntry {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub description: String,
    pub source: EntrySource,
}

/// Merge project audit entries and commits, newest first
pub fn display_log(audit: &[AuditEntry], commits: &[CommitRecord]) -> Vec<DisplayEntry> {
    let mut entries: Vec<DisplayEntry> = audit
        .iter()
        .map(|entry| DisplayEntry {
            timestamp: entry.timestamp,
            user: entry.user.clone(),
            description: entry.description.clone(),
            source: EntrySource::Project,
        })
        .chain(commits.iter().map(|commit| DisplayEntry {
            timestamp: commit.timestamp,
            user: commit.committer.clone(),
            description: commit.message.clone(),
            source: EntrySource::SourceControl,
        }))
        .collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}

/// What changed since a user last opened the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectUpdates {
    FirstView,
    UpToDate,
    Updated {
        users: Vec<String>,
        entries: Vec<DisplayEntry>,
    },
}

impl ProjectUpdates {
    pub fn summary(&self) -> String {
        match self {
            ProjectUpdates::FirstView => "First time viewing this project".to_string(),
            ProjectUpdates::UpToDate => "There are no updates".to_string(),
            ProjectUpdates::Updated { users, entries } => format!(
                "{} by {}",
                plural(entries.len(), "update"),
                plural(users.len(), "user")
            ),
        }
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("1 {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Entries newer than `last_viewed`, ignoring the current user's own.
/// `log` must be sorted newest first, as [`display_log`] returns it.
/// Entries with a blank user count as one anonymous user.
pub fn project_updates(
    last_viewed: Option<DateTime<Utc>>,
    current_user: &str,
    log: &[DisplayEntry],
) -> ProjectUpdates {
    let Some(last_viewed) = last_viewed else {
        return ProjectUpdates::FirstView;
    };

    let mut users: Vec<String> = Vec::new();
    let mut entries = Vec::new();
    for entry in log.iter().take_while(|entry| entry.timestamp > last_viewed) {
        let user = entry.user.trim();
        if !user.is_empty() && user == current_user {
            continue;
        }
        if !users.iter().any(|seen| seen == user) {
            users.push(user.to_string());
        }
        entries.push(entry.clone());
    }

    if entries.is_empty() {
        ProjectUpdates::UpToDate
    } else {
        ProjectUpdates::Updated { users, entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, EntityKind};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn audit(hour: u32, user: &str) -> AuditEntry {
        AuditEntry {
            action: ActionKind::NoteAdd,
            entity: EntityKind::Project,
            entity_key: "p".into(),
            description: format!("note by {user}"),
            user: user.into(),
            timestamp: at(hour),
            details: Value::Null,
        }
    }

    fn commit(hour: u32, who: &str) -> CommitRecord {
        CommitRecord {
            message: format!("commit by {who}"),
            committer: who.into(),
            timestamp: at(hour),
        }
    }

    #[test]
    fn merges_newest_first() {
        let log = display_log(&[audit(9, "ann"), audit(12, "bo")], &[commit(10, "cy")]);
        let order: Vec<(u32, EntrySource)> = log
            .iter()
            .map(|entry| (chrono::Timelike::hour(&entry.timestamp), entry.source))
            .collect();
        assert_eq!(
            order,
            vec![
                (12, EntrySource::Project),
                (10, EntrySource::SourceControl),
                (9, EntrySource::Project),
            ]
        );
    }

    #[test]
    fn updates_since_last_view() {
        let log = display_log(
            &[audit(8, "ann"), audit(11, "me"), audit(12, "bo"), audit(13, "")],
            &[commit(10, "bo")],
        );

        assert_eq!(project_updates(None, "me", &log), ProjectUpdates::FirstView);
        assert_eq!(project_updates(Some(at(14)), "me", &log), ProjectUpdates::UpToDate);

        let updates = project_updates(Some(at(9)), "me", &log);
        match &updates {
            ProjectUpdates::Updated { users, entries } => {
                assert_eq!(users, &vec!["".to_string(), "bo".to_string()]);
                assert_eq!(entries.len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(updates.summary(), "3 updates by 2 users");

        let only_mine = project_updates(Some(at(10)), "me", &display_log(&[audit(11, "me")], &[]));
        assert_eq!(only_mine, ProjectUpdates::UpToDate);
    }
}
