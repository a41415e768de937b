use super::code::{dedupe_by_id, scan_code_node, READ_ERROR};
use crate::handler::AssetHandler;
use crate::node::{AssetNode, CodeMetadata, HandlerId, HandlerMetadata, PackageLibrary};
use once_cell::sync::Lazy;
use regex::Regex;

pub const STATA_EXTENSIONS: &[&str] = &["do", "ado"];

// `do file` / `run file` / `ru file`, optionally `, nostop`
static RUN_BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)(?:do|ru[n]?)\s+([^,"]+?)(?:,\s+nostop)?\s?$"#).expect("valid do regex")
});
static RUN_QUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)(?:do|ru[n]?)\s+"(.+?)"(?:,\s+nostop)?\s?$"#)
        .expect("valid quoted do regex")
});
// `program <handle>, plugin`
static PLUGIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)pr(?:ogram)?\s+(.+),\s+plug(?:in)?\s?$").expect("valid plugin regex")
});
// `program <handle>, plugin using("<location>")`
static PLUGIN_USING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)pr(?:ogram)?\s+(.+),\s+plug(?:in)?\s*(?:using\s*\(\s*"(.+?)"\s*\))"#)
        .expect("valid plugin using regex")
});

/// Extracts executed do-files and loaded plugins from Stata sources
pub struct StataHandler;

impl AssetHandler for StataHandler {
    fn id(&self) -> HandlerId {
        HandlerId::Stata
    }

    fn scan(&self, node: AssetNode) -> AssetNode {
        scan_code_node(self, STATA_EXTENSIONS, node, |text| {
            HandlerMetadata::Stata(match text {
                Ok(text) => CodeMetadata::with_libraries(parse_stata_libraries(&text)),
                Err(_) => CodeMetadata::with_error(READ_ERROR),
            })
        })
    }
}

fn library_id(package: &str, location: Option<&str>) -> String {
    match (package.trim(), location.map(str::trim)) {
        ("", _) => "(unknown)".to_string(),
        (package, Some(location)) => format!("{package} ({location})"),
        (package, None) => package.to_string(),
    }
}

/// Executed files (bare, then quoted), then plugins, then plugins loaded
/// from an explicit location. Plugins with a location are identified as
/// `handle (location)`.
pub fn parse_stata_libraries(text: &str) -> Vec<PackageLibrary> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut libraries = Vec::new();
    for pattern in [&*RUN_BARE, &*RUN_QUOTED, &*PLUGIN] {
        for caps in pattern.captures_iter(text) {
            let package = caps[1].trim();
            libraries.push(PackageLibrary {
                id: library_id(package, None),
                package: package.to_string(),
            });
        }
    }
    for caps in PLUGIN_USING.captures_iter(text) {
        libraries.push(PackageLibrary {
            id: library_id(&caps[1], caps.get(2).map(|m| m.as_str())),
            package: caps[1].trim().to_string(),
        });
    }
    dedupe_by_id(libraries)
}
