//! Pure functions over asset trees.

use crate::node::{AssetNode, HandlerId};
use crate::note::Note;
use crate::{AssetError, Result};
use serde::Serialize;
use std::path::{Component, Path};

pub fn count_nodes(node: &AssetNode) -> usize {
    1 + node
        .children()
        .map(|children| children.iter().map(count_nodes).sum())
        .unwrap_or(0)
}

/// Direct child of `node` with the given key
pub fn find_child<'a>(node: &'a AssetNode, key: &str) -> Option<&'a AssetNode> {
    node.children()?.iter().find(|child| child.key == key)
}

/// Depth-first search including `node` itself
pub fn find_descendant<'a>(node: &'a AssetNode, key: &str) -> Option<&'a AssetNode> {
    if node.key == key {
        return Some(node);
    }
    node.children()?
        .iter()
        .find_map(|child| find_descendant(child, key))
}

pub fn find_descendant_mut<'a>(node: &'a mut AssetNode, key: &str) -> Option<&'a mut AssetNode> {
    if node.key == key {
        return Some(node);
    }
    node.children_mut()?
        .iter_mut()
        .find_map(|child| find_descendant_mut(child, key))
}

/// Detach the node with `key` from below `node`. The root itself is never
/// removed.
pub fn remove_descendant(node: &mut AssetNode, key: &str) -> Option<AssetNode> {
    let children = node.children_mut()?;
    if let Some(pos) = children.iter().position(|child| child.key == key) {
        return Some(children.remove(pos));
    }
    children
        .iter_mut()
        .find_map(|child| remove_descendant(child, key))
}

/// Keys of every ancestor of `key` up to and including `root_key`, nearest
/// first. Empty when `key` does not live under `root_key`.
pub fn ancestor_keys(key: &str, root_key: &str) -> Vec<String> {
    let root = root_key.trim_end_matches(['/', '\\']);
    let mut ancestors = Vec::new();
    let under_root = key
        .strip_prefix(root)
        .is_some_and(|rest| rest.len() > 1 && rest.starts_with(['/', '\\']));
    if !under_root {
        return ancestors;
    }

    let mut current = key;
    while let Some(pos) = current.rfind(['/', '\\']) {
        current = &current[..pos];
        if current.len() < root.len() {
            break;
        }
        ancestors.push(current.to_string());
        if current == root {
            break;
        }
    }
    ancestors
}

/// Deep copy with file and directory keys made relative to `root`, always
/// using `/` separators. The root itself becomes the empty key. Other kinds
/// (URLs, sockets) are left as they are.
pub fn to_relative_keys(tree: &AssetNode, root: &Path) -> Result<AssetNode> {
    let mut copy = tree.clone();
    relativize(&mut copy, root)?;
    Ok(copy)
}

fn relativize(node: &mut AssetNode, root: &Path) -> Result<()> {
    if node.is_file() || node.is_directory() {
        let relative = Path::new(&node.key)
            .strip_prefix(root)
            .map_err(|_| AssetError::InvalidKey(node.key.clone()))?;
        node.key = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            relativize(child, root)?;
        }
    }
    Ok(())
}

/// Inverse of [`to_relative_keys`]
pub fn to_absolute_keys(tree: &AssetNode, root: &Path) -> Result<AssetNode> {
    let mut copy = tree.clone();
    absolutize(&mut copy, root)?;
    Ok(copy)
}

fn absolutize(node: &mut AssetNode, root: &Path) -> Result<()> {
    if node.is_file() || node.is_directory() {
        if Path::new(&node.key).is_absolute() {
            return Err(AssetError::InvalidKey(node.key.clone()));
        }
        let absolute = node
            .key
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(root.to_path_buf(), |path, part| path.join(part));
        node.key = absolute.to_string_lossy().to_string();
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            absolutize(child, root)?;
        }
    }
    Ok(())
}

/// Copy of the tree without nodes the file handler marked as excluded.
/// `None` when the root itself is excluded.
pub fn filter_included(node: &AssetNode) -> Option<AssetNode> {
    if !node.is_included() {
        return None;
    }
    let mut copy = node.clone();
    if let Some(children) = copy.children_mut() {
        let kept = children.iter().filter_map(filter_included).collect();
        *children = kept;
    }
    Some(copy)
}

/// Sort children by key at every level
pub fn sort_by_key(node: &mut AssetNode) {
    if let Some(children) = node.children_mut() {
        children.sort_by(|a, b| a.key.cmp(&b.key));
        children.iter_mut().for_each(sort_by_key);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetNote {
    pub key: String,
    pub note: Note,
}

/// Every note in the tree with the key of the node carrying it, depth first
pub fn collect_notes(node: &AssetNode) -> Vec<AssetNote> {
    let mut notes = Vec::new();
    walk(node, &mut |current| {
        notes.extend(current.notes.iter().map(|note| AssetNote {
            key: current.key.clone(),
            note: note.clone(),
        }));
    });
    notes
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDependencies {
    pub key: String,
    pub handler: HandlerId,
    pub libraries: Vec<String>,
}

/// Libraries found by the code handlers, one entry per (file, handler)
pub fn collect_dependencies(node: &AssetNode) -> Vec<AssetDependencies> {
    let mut dependencies = Vec::new();
    walk(node, &mut |current| {
        for record in &current.metadata {
            if record.handler_id() == HandlerId::File {
                continue;
            }
            dependencies.push(AssetDependencies {
                key: current.key.clone(),
                handler: record.handler_id(),
                libraries: record
                    .library_ids()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            });
        }
    });
    dependencies
}

fn walk(node: &AssetNode, visit: &mut impl FnMut(&AssetNode)) {
    visit(node);
    for child in node.children().into_iter().flatten() {
        walk(child, visit);
    }
}
