use super::code::{dedupe_by_id, scan_code_node, READ_ERROR};
use crate::handler::AssetHandler;
use crate::node::{AssetNode, CodeMetadata, HandlerId, HandlerMetadata, ImportLibrary};
use once_cell::sync::Lazy;
use regex::Regex;

pub const JAVA_EXTENSIONS: &[&str] = &["java"];

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"import\s+(?:static\s+)?([^;]+)\s*;").expect("valid java import regex")
});

/// Extracts `import` declarations from Java sources
pub struct JavaHandler;

impl AssetHandler for JavaHandler {
    fn id(&self) -> HandlerId {
        HandlerId::Java
    }

    fn scan(&self, node: AssetNode) -> AssetNode {
        scan_code_node(self, JAVA_EXTENSIONS, node, |text| {
            HandlerMetadata::Java(match text {
                Ok(text) => CodeMetadata::with_libraries(parse_java_libraries(&text)),
                Err(_) => CodeMetadata::with_error(READ_ERROR),
            })
        })
    }
}

/// `import a.b.C;` becomes module `a.b`, import `C`. A name without a dot is
/// a whole-package import (`*`). The declaring file's own `package` is not a
/// dependency and is not reported.
pub fn parse_java_libraries(text: &str) -> Vec<ImportLibrary> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let libraries = IMPORT
        .captures_iter(text)
        .map(|caps| {
            let full = caps[1].trim();
            let (module, import) = full.rsplit_once('.').unwrap_or((full, "*"));
            ImportLibrary {
                id: format!("{module}.{import}"),
                module: Some(module.to_string()),
                import: Some(import.to_string()),
                alias: None,
            }
        })
        .collect();
    dedupe_by_id(libraries)
}
