use super::code::{dedupe_by_id, scan_code_node, READ_ERROR};
use crate::handler::AssetHandler;
use crate::node::{AssetNode, CodeMetadata, HandlerId, HandlerMetadata, ImportLibrary};
use once_cell::sync::Lazy;
use regex::Regex;

pub const PYTHON_EXTENSIONS: &[&str] = &["py", "py3", "pyi"];

// One match per line: optional `from <module>`, then `import <names>`.
static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mR)^(?:from[ ]+(\S+)[ ]+)?import[ ]+(.+?)[ ]*$").expect("valid import regex")
});
static ALIAS_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ ]+as[ ]+(\S+)$").expect("valid alias regex"));

const UNKNOWN_LIBRARY: &str = "(unknown)";

/// Extracts `import` / `from ... import` statements from Python sources
pub struct PythonHandler;

impl AssetHandler for PythonHandler {
    fn id(&self) -> HandlerId {
        HandlerId::Python
    }

    fn scan(&self, node: AssetNode) -> AssetNode {
        scan_code_node(self, PYTHON_EXTENSIONS, node, |text| {
            HandlerMetadata::Python(match text {
                Ok(text) => CodeMetadata::with_libraries(parse_python_libraries(&text)),
                Err(_) => CodeMetadata::with_error(READ_ERROR),
            })
        })
    }
}

fn library_id(module: Option<&str>, import: Option<&str>) -> String {
    match (module, import) {
        (Some(module), Some(import)) => format!("{module}.{import}"),
        (Some(module), None) => module.to_string(),
        (None, Some(import)) => import.to_string(),
        (None, None) => UNKNOWN_LIBRARY.to_string(),
    }
}

/// Line-anchored import extraction. `import` keeps the whole names clause,
/// `alias` is the trailing `as <name>` if present.
pub fn parse_python_libraries(text: &str) -> Vec<ImportLibrary> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let libraries = IMPORT_LINE
        .captures_iter(text)
        .map(|caps| {
            let module = caps.get(1).map(|m| m.as_str());
            let import = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty());
            let alias = import
                .and_then(|names| ALIAS_SUFFIX.captures(names))
                .and_then(|alias| alias.get(1))
                .map(|m| m.as_str().to_string());
            ImportLibrary {
                id: library_id(module, import),
                module: module.map(str::to_string),
                import: import.map(str::to_string),
                alias,
            }
        })
        .collect();
    dedupe_by_id(libraries)
}
