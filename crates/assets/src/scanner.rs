use crate::classifier::classify_key;
use crate::handler::HandlerPipeline;
use crate::node::{AssetKind, AssetNode};
use crate::tree::count_nodes;
use crate::{AssetError, Result};
use std::fs::{self, FileType};
use std::path::Path;

/// Builds the asset tree for a directory and runs every node through the
/// handler pipeline. Read-only: nothing under the root is ever written.
pub struct AssetScanner {
    pipeline: HandlerPipeline,
}

impl AssetScanner {
    pub fn new(pipeline: HandlerPipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &HandlerPipeline {
        &self.pipeline
    }

    /// Scan `root`. An inaccessible root, or a directory below it that
    /// cannot be listed, fails the whole scan.
    pub fn scan(&self, root: impl AsRef<Path>) -> Result<AssetNode> {
        let root = root.as_ref();
        let tree = self.scan_path(root)?;
        log::info!(
            "Scanned {} assets under {}",
            count_nodes(&tree),
            root.display()
        );
        Ok(tree)
    }

    fn scan_path(&self, path: &Path) -> Result<AssetNode> {
        let details = fs::symlink_metadata(path).map_err(|err| AssetError::access(path, err))?;
        let key = path.to_string_lossy().to_string();

        let mut node = match asset_kind(&details.file_type()) {
            AssetKind::Directory { .. } => {
                let entries = fs::read_dir(path).map_err(|err| AssetError::access(path, err))?;
                let mut children = Vec::new();
                for entry in entries {
                    let entry = entry.map_err(|err| AssetError::access(path, err))?;
                    children.push(self.scan_path(&entry.path())?);
                }
                AssetNode::directory(key, children)
            }
            kind => AssetNode::new(key, kind),
        };

        if node.is_file() {
            node.content_types = classify_key(&node.key);
        }
        log::debug!("{} {}", node.kind.as_str(), node.key);

        Ok(self.pipeline.apply(node))
    }
}

impl Default for AssetScanner {
    fn default() -> Self {
        Self::new(HandlerPipeline::standard())
    }
}

fn asset_kind(file_type: &FileType) -> AssetKind {
    if file_type.is_dir() {
        return AssetKind::Directory {
            children: Vec::new(),
        };
    }
    if file_type.is_file() {
        return AssetKind::File;
    }
    if file_type.is_symlink() {
        return AssetKind::Symlink;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if file_type.is_socket() {
            return AssetKind::Socket;
        }
    }
    AssetKind::Other
}
