use crate::action::MergeRequest;
use crate::document::{ProjectDocument, FORMAT_VERSION};
use crate::lock::{lock_project_file, unlock_project_file};
use crate::merge::{load_and_merge_project_updates, MergeOutcome};
use crate::{MergeError, Result, StoreError};
use labbook_assets::tree::sort_by_key;
use labbook_assets::{merge_annotations, AssetNode};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const BASE_DIR_NAME: &str = ".labbook";
const DOCUMENT_NAME: &str = "project.json";
const LOCK_NAME: &str = "project.lock";

/// Where a project's files live, relative to its root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub base_dir: PathBuf,
    pub document: PathBuf,
    pub lock: PathBuf,
}

impl ProjectPaths {
    pub fn for_root(root: &Path) -> Self {
        let base_dir = root.join(BASE_DIR_NAME);
        Self {
            root: root.to_path_buf(),
            document: base_dir.join(DOCUMENT_NAME),
            lock: base_dir.join(LOCK_NAME),
            base_dir,
        }
    }

    /// Create the base directory if it is missing
    pub fn ensure_base_dir(&self) -> Result<()> {
        if self.base_dir.is_dir() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.base_dir).map_err(|err| StoreError::io(&self.base_dir, err))
    }
}

/// Read the document from disk. Never served from a cache.
pub fn load_project_file(root: &Path) -> Result<ProjectDocument> {
    let path = ProjectPaths::for_root(root).document;
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path));
        }
        Err(err) => return Err(StoreError::io(&path, err)),
    };
    serde_json::from_str(&raw).map_err(|source| StoreError::Parse { path, source })
}

pub fn validate_document(document: &ProjectDocument) -> Result<()> {
    if document.format_version != FORMAT_VERSION {
        return Err(StoreError::Validation(format!(
            "unsupported format version {:?}",
            document.format_version
        )));
    }
    if document.id.trim().is_empty() {
        return Err(StoreError::Validation("project id is required".to_string()));
    }
    Ok(())
}

/// Validate, then replace the whole document file
pub fn save_project_file(root: &Path, document: &ProjectDocument) -> Result<()> {
    validate_document(document)?;

    let paths = ProjectPaths::for_root(root);
    paths.ensure_base_dir()?;
    let bytes = serde_json::to_vec_pretty(document).map_err(StoreError::Serialize)?;
    write_atomic(&paths.document, &bytes)?;
    log::info!("Saved project {} to {}", document.id, paths.document.display());
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::Validation(format!("{} has no parent", path.display())))?;
    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DOCUMENT_NAME),
        std::process::id()
    ));

    {
        let mut file = File::create(&tmp).map_err(|err| StoreError::io(&tmp, err))?;
        file.write_all(bytes)
            .map_err(|err| StoreError::io(&tmp, err))?;
        file.sync_all().map_err(|err| StoreError::io(&tmp, err))?;
    }

    std::fs::rename(&tmp, path).map_err(|err| StoreError::io(path, err))
}

/// Start a new project at `root`. Refuses to replace an existing document.
pub fn create_project(root: &Path, name: &str) -> Result<ProjectDocument> {
    let _lock = lock_project_file(root)?;
    let paths = ProjectPaths::for_root(root);
    if paths.document.exists() {
        return Err(StoreError::AlreadyExists(paths.document));
    }
    let document = ProjectDocument::new(name);
    save_project_file(root, &document)?;
    Ok(document)
}

/// Apply one action under the project lock: reload, merge, save if anything
/// changed. Nothing is written when the merge fails.
pub fn update_project(
    root: &Path,
    request: &MergeRequest,
    user: &str,
) -> std::result::Result<MergeOutcome, MergeError> {
    let lock = lock_project_file(root)?;
    let outcome = load_and_merge_project_updates(root, request, user)?;
    if outcome.changed {
        save_project_file(root, &outcome.document)?;
    } else {
        log::debug!("{} left project unchanged", request.action.as_str());
    }
    unlock_project_file(lock);
    Ok(outcome)
}

/// Store a freshly scanned tree (already converted to root-relative keys).
///
/// Notes and attributes are carried over from the document reloaded under
/// the lock, so annotations saved while the scan ran are kept.
pub fn save_scanned_assets(root: &Path, fresh: AssetNode) -> Result<ProjectDocument> {
    let lock = lock_project_file(root)?;
    let mut document = load_project_file(root)?;
    let mut assets = match document.assets.take() {
        Some(persisted) => merge_annotations(fresh, &persisted),
        None => fresh,
    };
    sort_by_key(&mut assets);
    document.assets = Some(assets);
    save_project_file(root, &document)?;
    unlock_project_file(lock);
    Ok(document)
}
