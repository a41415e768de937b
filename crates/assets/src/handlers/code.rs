use crate::handler::{map_children, AssetHandler};
use crate::key;
use crate::node::{AssetKind, AssetNode, HandlerMetadata, Library};
use std::collections::HashSet;

pub const READ_ERROR: &str = "Unable to read code file";

/// Whether a handler with `extensions` should process the asset at `asset_key`.
///
/// URL keys are matched on the last segment of their path, so query strings
/// never decide the outcome. The name needs a non-blank stem and the
/// lower-cased final extension must be listed.
pub fn include_file(asset_key: &str, extensions: &[&str]) -> bool {
    if asset_key.trim().is_empty() {
        return false;
    }
    let Some(name) = key::asset_name(asset_key) else {
        return false;
    };

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() < 2 || parts[0].trim().is_empty() {
        return false;
    }
    let ext = parts[parts.len() - 1].to_lowercase();
    extensions.iter().any(|candidate| *candidate == ext)
}

/// Shared traversal for dependency-extracting handlers. Directories recurse,
/// included files get exactly one record built from their text (or the
/// read error), everything else passes through.
pub(crate) fn scan_code_node<H, F>(
    handler: &H,
    extensions: &[&str],
    mut node: AssetNode,
    build: F,
) -> AssetNode
where
    H: AssetHandler + ?Sized,
    F: Fn(std::io::Result<String>) -> HandlerMetadata,
{
    match node.kind {
        AssetKind::Directory { .. } => map_children(node, |child| handler.scan(child)),
        AssetKind::File => {
            if !include_file(&node.key, extensions) || node.has_metadata(handler.id()) {
                return node;
            }
            let text = std::fs::read_to_string(&node.key);
            if let Err(err) = &text {
                log::warn!("{}: cannot read {}: {err}", handler.id().as_str(), node.key);
            }
            let record = build(text);
            log::debug!(
                "{} found {} libraries in {}",
                handler.id().as_str(),
                record.library_ids().len(),
                node.key
            );
            node.push_metadata(record);
            node
        }
        _ => node,
    }
}

/// Keep the first library for each id, preserving order
pub(crate) fn dedupe_by_id<L: Library>(libraries: Vec<L>) -> Vec<L> {
    let mut seen = HashSet::new();
    libraries
        .into_iter()
        .filter(|library| seen.insert(library.id().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PY: &[&str] = &["py", "py3", "pyi"];

    #[test]
    fn include_file_rejects_blank_and_stemless_names() {
        assert!(!include_file("", PY));
        assert!(!include_file("   ", PY));
        assert!(!include_file(".py", PY));
        assert!(!include_file("/project/.py", PY));
        assert!(!include_file("/project/python", PY));
    }

    #[test]
    fn include_file_matches_last_extension_case_insensitively() {
        assert!(include_file("/project/test.py", PY));
        assert!(include_file("/project/TEST.PY3", PY));
        assert!(include_file("  /project/stubs.pyi  ", PY));
        assert!(!include_file("/project/python.py.zip", PY));
    }

    #[test]
    fn include_file_uses_url_path() {
        assert!(!include_file("http://test.py", PY));
        assert!(include_file(
            "https://github.com/test/content/test.py?ref=_1234&test2.py4",
            PY
        ));
        assert!(!include_file("https://example.org/download?file=test.py", PY));
    }
}
