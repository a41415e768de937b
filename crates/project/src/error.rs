use crate::action::{ActionKind, EntityKind};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures reading or writing the project document. All of these are hard
/// failures: nothing is written and no default document is substituted.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Project document not found: {0}")]
    NotFound(PathBuf),

    #[error("Malformed project document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize project document: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Invalid project document: {0}")]
    Validation(String),

    #[error("Project is locked by another writer: {0}")]
    LockUnavailable(PathBuf),

    #[error("Project already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error(transparent)]
    Assets(#[from] labbook_assets::AssetError),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why an update action was not applied. Everything except `Store` is a
/// resolution failure the caller turns into a user-facing message.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unknown action kind: {0}")]
    UnknownAction(String),

    #[error("Unknown entity kind: {0}")]
    UnknownEntity(String),

    #[error("No {entity} with key {key}")]
    EntityNotFound { entity: &'static str, key: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Action {} does not apply to entity {}", .action.as_str(), .entity.as_str())]
    UnsupportedAction {
        action: ActionKind,
        entity: EntityKind,
    },

    #[error("Checklist updates are not enabled yet")]
    ChecklistPendingConfirmation,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MergeError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }

    /// True for hard storage failures, false for resolution failures
    pub fn is_store_failure(&self) -> bool {
        matches!(self, MergeError::Store(_))
    }
}
