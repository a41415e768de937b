use super::code::{dedupe_by_id, scan_code_node, READ_ERROR};
use crate::handler::AssetHandler;
use crate::node::{AssetNode, CodeMetadata, HandlerId, HandlerMetadata, PackageLibrary};
use once_cell::sync::Lazy;
use regex::Regex;

pub const R_EXTENSIONS: &[&str] = &["r", "rmd"];

static LIBRARY_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mR)^\s*(?:library|require)\s*\(\s*(\S+)\s*\)\s*$")
        .expect("valid library regex")
});

/// Extracts `library()` / `require()` calls from R sources
pub struct RHandler;

impl AssetHandler for RHandler {
    fn id(&self) -> HandlerId {
        HandlerId::R
    }

    fn scan(&self, node: AssetNode) -> AssetNode {
        scan_code_node(self, R_EXTENSIONS, node, |text| {
            HandlerMetadata::R(match text {
                Ok(text) => CodeMetadata::with_libraries(parse_r_libraries(&text)),
                Err(_) => CodeMetadata::with_error(READ_ERROR),
            })
        })
    }
}

pub fn parse_r_libraries(text: &str) -> Vec<PackageLibrary> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let libraries = LIBRARY_CALL
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            let package = m.as_str().replace(['\'', '"'], "");
            PackageLibrary {
                id: if package.is_empty() {
                    "(unknown)".to_string()
                } else {
                    package.clone()
                },
                package,
            }
        })
        .collect();
    dedupe_by_id(libraries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn packages(text: &str) -> Vec<String> {
        parse_r_libraries(text)
            .into_iter()
            .map(|library| library.package)
            .collect()
    }

    #[test]
    fn strips_quotes() {
        assert_eq!(
            parse_r_libraries("library(\"dplyr\")"),
            vec![PackageLibrary {
                id: "dplyr".to_string(),
                package: "dplyr".to_string(),
            }]
        );
        assert_eq!(packages("require('ggplot2')"), vec!["ggplot2"]);
    }

    #[test]
    fn one_call_per_line() {
        let text = "library(dplyr)\n  require( tidyr )\r\nx <- library(stats); y\nlibrary(dplyr)\n";
        assert_eq!(packages(text), vec!["dplyr", "tidyr"]);
    }

    #[test]
    fn rmd_files_are_scanned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.Rmd");
        fs::write(&path, "```{r}\nlibrary(knitr)\n```\n").unwrap();

        let scanned = RHandler.scan(AssetNode::file(path.to_string_lossy()));
        assert_eq!(scanned.metadata[0].library_ids(), vec!["knitr"]);
    }

    #[test]
    fn directories_recurse_without_own_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.r");
        fs::write(&path, "library(MASS)\n").unwrap();

        let tree = AssetNode::directory(
            dir.path().to_string_lossy(),
            vec![AssetNode::file(path.to_string_lossy())],
        );
        let scanned = RHandler.scan(tree);

        assert!(scanned.metadata.is_empty());
        assert_eq!(
            scanned.children().unwrap()[0].metadata[0].library_ids(),
            vec!["MASS"]
        );
    }
}
