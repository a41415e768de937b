use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User-authored note attached to a project, asset, person or group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub author: String,
    pub content: String,
    pub updated: DateTime<Utc>,
}

impl Note {
    /// Create a note with a fresh v4 id, stamped with the current time
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author: author.into(),
            content: content.into(),
            updated: Utc::now(),
        }
    }

    /// Replace the content. Returns `false` (and leaves `updated` alone)
    /// when the content is unchanged.
    pub fn update_content(&mut self, content: &str) -> bool {
        if self.content == content {
            return false;
        }
        self.content = content.to_string();
        self.updated = Utc::now();
        true
    }
}
