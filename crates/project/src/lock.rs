use crate::store::ProjectPaths;
use crate::{Result, StoreError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Waits longer than this are logged as warnings
const SLOW_LOCK_MS: u128 = 1_000;

/// Exclusive advisory lock on one project's document. Released on drop.
pub struct ProjectLock {
    file: File,
    path: PathBuf,
}

impl ProjectLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            log::warn!("Failed to release {}: {err}", self.path.display());
        }
    }
}

fn open_lock_file(root: &Path) -> Result<(File, PathBuf)> {
    let paths = ProjectPaths::for_root(root);
    paths.ensure_base_dir()?;

    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&paths.lock)
        .map_err(|err| StoreError::io(&paths.lock, err))?;
    Ok((file, paths.lock))
}

/// Block until this caller holds the project's lock
pub fn lock_project_file(root: &Path) -> Result<ProjectLock> {
    let (file, path) = open_lock_file(root)?;

    let start = Instant::now();
    file.lock_exclusive()
        .map_err(|err| StoreError::io(&path, err))?;
    let waited = start.elapsed().as_millis();
    if waited >= SLOW_LOCK_MS {
        log::warn!("Waited {waited}ms for {}", path.display());
    } else {
        log::debug!("Acquired {} after {waited}ms", path.display());
    }

    Ok(ProjectLock { file, path })
}

/// Take the lock only if nobody else holds it
pub fn try_lock_project_file(root: &Path) -> Result<ProjectLock> {
    let (file, path) = open_lock_file(root)?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(ProjectLock { file, path }),
        Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
            Err(StoreError::LockUnavailable(path))
        }
        Err(err) => Err(StoreError::io(&path, err)),
    }
}

pub fn unlock_project_file(lock: ProjectLock) {
    log::debug!("Releasing {}", lock.path().display());
    drop(lock);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_writer_fails_fast_until_release() {
        let dir = tempdir().unwrap();
        let held = lock_project_file(dir.path()).unwrap();
        assert!(held.path().ends_with("project.lock"));

        assert!(matches!(
            try_lock_project_file(dir.path()),
            Err(StoreError::LockUnavailable(_))
        ));

        unlock_project_file(held);
        let again = try_lock_project_file(dir.path()).unwrap();
        drop(again);
    }

    #[test]
    fn blocked_writer_proceeds_after_release() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let held = lock_project_file(&root).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let waiter = std::thread::spawn(move || {
            let lock = lock_project_file(&root).unwrap();
            tx.send(()).unwrap();
            drop(lock);
        });

        assert!(rx
            .recv_timeout(std::time::Duration::from_millis(200))
            .is_err());
        drop(held);
        rx.recv_timeout(std::time::Duration::from_secs(10)).unwrap();
        waiter.join().unwrap();
    }
}
