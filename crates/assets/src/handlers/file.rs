use crate::handler::{map_children, AssetHandler};
use crate::key;
use crate::node::{AssetNode, FileMetadata, HandlerId, HandlerMetadata};
use crate::Result;
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};

pub const ACCESS_ERROR: &str = "Unable to access asset";

/// File names excluded from the project view unless configured otherwise
pub const DEFAULT_HIDDEN: &[&str] = &[".DS_Store", "Thumbs.db", ".labbook"];

/// Records filesystem stats for files and directories
pub struct FileHandler {
    hidden: GlobSet,
}

impl FileHandler {
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(Self {
            hidden: builder.build()?,
        })
    }

    fn is_hidden(&self, asset_key: &str) -> bool {
        key::asset_name(asset_key).is_some_and(|name| self.hidden.is_match(name))
    }

    fn stat(&self, asset_key: &str) -> FileMetadata {
        let include = !self.is_hidden(asset_key);
        match std::fs::metadata(asset_key) {
            Ok(meta) => FileMetadata {
                size: Some(meta.len()),
                last_accessed: meta.accessed().ok().map(DateTime::<Utc>::from),
                last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
                created: meta.created().ok().map(DateTime::<Utc>::from),
                include,
                error: None,
            },
            Err(err) => {
                log::warn!("Unable to stat {asset_key}: {err}");
                FileMetadata {
                    size: None,
                    last_accessed: None,
                    last_modified: None,
                    created: None,
                    include,
                    error: Some(ACCESS_ERROR.to_string()),
                }
            }
        }
    }
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::with_patterns(DEFAULT_HIDDEN).unwrap_or_else(|_| Self {
            hidden: GlobSet::empty(),
        })
    }
}

impl AssetHandler for FileHandler {
    fn id(&self) -> HandlerId {
        HandlerId::File
    }

    fn scan(&self, mut node: AssetNode) -> AssetNode {
        if !(node.is_file() || node.is_directory()) || node.has_metadata(self.id()) {
            return node;
        }

        let record = self.stat(&node.key);
        node.push_metadata(HandlerMetadata::File(record));
        map_children(node, |child| self.scan(child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AssetKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn records_stats_and_include_flag() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("data.csv"), "a,b\n1,2\n").unwrap();
        fs::write(root.join(".DS_Store"), "x").unwrap();

        let key = |name: &str| root.join(name).to_string_lossy().to_string();
        let tree = AssetNode::directory(
            root.to_string_lossy(),
            vec![AssetNode::file(key("data.csv")), AssetNode::file(key(".DS_Store"))],
        );

        let scanned = FileHandler::default().scan(tree);
        let children = scanned.children().unwrap();

        let data = children[0].file_metadata().unwrap();
        assert_eq!(data.size, Some(8));
        assert!(data.include);
        assert!(data.last_modified.is_some());

        assert!(!children[1].file_metadata().unwrap().include);
        assert!(scanned.file_metadata().unwrap().include);
    }

    #[test]
    fn unreadable_asset_records_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone.txt");
        let node = FileHandler::default().scan(AssetNode::file(missing.to_string_lossy()));

        let meta = node.file_metadata().unwrap();
        assert_eq!(meta.error.as_deref(), Some(ACCESS_ERROR));
        assert_eq!(meta.size, None);
    }

    #[test]
    fn other_kinds_and_existing_records_pass_through() {
        let handler = FileHandler::default();
        let socket = AssetNode::new("/tmp/app.sock", AssetKind::Socket);
        assert_eq!(handler.scan(socket.clone()), socket);

        let once = handler.scan(AssetNode::file("/definitely/not/here.txt"));
        let twice = handler.scan(once.clone());
        assert_eq!(twice, once);
        assert_eq!(twice.metadata.len(), 1);
    }

    #[test]
    fn custom_patterns() {
        let handler = FileHandler::with_patterns(&["*.bak"]).unwrap();
        let node = handler.scan(AssetNode::file("/nowhere/notes.bak"));
        assert!(!node.is_included());
        assert!(FileHandler::with_patterns(&["[unclosed"]).is_err());
    }
}
