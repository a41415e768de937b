//! # Labbook Project
//!
//! The persisted project document and the only way to change it.
//!
//! ## Update cycle
//!
//! ```text
//! Host action (action kind, entity kind, key, payload)
//!     │
//!     ├──> Project lock (.labbook/project.lock)
//!     │
//!     ├──> Load document from disk (never cached)
//!     │
//!     ├──> Merge engine
//!     │      └─> Mutated document + audit entry
//!     │
//!     └──> Atomic save, unlock
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use labbook_project::{update_project, ActionKind, EntityKind, MergeRequest};
//! use serde_json::json;
//! use std::path::Path;
//!
//! let request = MergeRequest::new(
//!     ActionKind::NoteAdd,
//!     EntityKind::Asset,
//!     "analysis/model.py",
//!     json!({ "content": "Uses the 2023 cohort" }),
//! );
//! let outcome = update_project(Path::new("/path/to/project"), &request, "ada")?;
//! assert!(outcome.changed);
//! # Ok::<(), labbook_project::MergeError>(())
//! ```

mod action;
mod activity;
mod document;
mod error;
mod lock;
mod merge;
mod source_control;
mod store;

pub use action::{ActionKind, AuditEntry, EntityKind, MergeRequest};
pub use activity::{display_log, project_updates, DisplayEntry, EntrySource, ProjectUpdates};
pub use document::{
    empty_external_assets, AssetGroup, Person, ProjectDocument, EXTERNAL_ASSETS_KEY,
    FORMAT_VERSION,
};
pub use error::{MergeError, Result, StoreError};
pub use lock::{lock_project_file, try_lock_project_file, unlock_project_file, ProjectLock};
pub use merge::{apply_action, load_and_merge_project_updates, payload_from_str, MergeOutcome};
pub use source_control::{CommitRecord, GitCli, SourceControl};
pub use store::{
    create_project, load_project_file, save_project_file, save_scanned_assets, update_project,
    validate_document, ProjectPaths, BASE_DIR_NAME,
};
