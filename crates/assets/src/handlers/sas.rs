use super::code::{dedupe_by_id, scan_code_node, READ_ERROR};
use crate::handler::AssetHandler;
use crate::node::{AssetNode, CodeMetadata, HandlerId, HandlerMetadata, PackageLibrary};
use once_cell::sync::Lazy;
use regex::Regex;

pub const SAS_EXTENSIONS: &[&str] = &["sas"];

// `%include '<path>';`
static INCLUDE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)%inc(?:lude)?\s+'(.+)'\s?;").expect("valid include path regex")
});
// `%include <fileref>;`
static INCLUDE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)%inc(?:lude)?\s+([^']+)\s?;").expect("valid include ref regex")
});
// `filename <fileref> '<path>' [encoding="..."];`
static FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?im)filename\s+(.+)\s+'(.+)'\s?(?:encoding\s?=\s?".*")?;"#)
        .expect("valid filename regex")
});
// `libname <libref> '<path>';`
static LIBNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)libname\s+(.+)\s+'(.+)'\s?;").expect("valid libname regex")
});

/// Extracts macro includes, file references and library references from SAS
/// programs
pub struct SasHandler;

impl AssetHandler for SasHandler {
    fn id(&self) -> HandlerId {
        HandlerId::Sas
    }

    fn scan(&self, node: AssetNode) -> AssetNode {
        scan_code_node(self, SAS_EXTENSIONS, node, |text| {
            HandlerMetadata::Sas(match text {
                Ok(text) => CodeMetadata::with_libraries(parse_sas_libraries(&text)),
                Err(_) => CodeMetadata::with_error(READ_ERROR),
            })
        })
    }
}

fn library(id: &str, package: &str) -> PackageLibrary {
    PackageLibrary {
        id: if id.is_empty() {
            "(unknown)".to_string()
        } else {
            id.to_string()
        },
        package: package.to_string(),
    }
}

/// Included paths first, then included filerefs, then `filename` and
/// `libname` statements. A reference's id is its label, its package the
/// path it points at.
pub fn parse_sas_libraries(text: &str) -> Vec<PackageLibrary> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut libraries = Vec::new();
    for caps in INCLUDE_PATH.captures_iter(text) {
        libraries.push(library(&caps[1], &caps[1]));
    }
    for caps in INCLUDE_REF.captures_iter(text) {
        let reference = caps[1].trim();
        libraries.push(library(reference, reference));
    }
    for caps in FILENAME.captures_iter(text) {
        libraries.push(library(&caps[1], &caps[2]));
    }
    for caps in LIBNAME.captures_iter(text) {
        libraries.push(library(&caps[1], &caps[2]));
    }
    dedupe_by_id(libraries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn pairs(text: &str) -> Vec<(String, String)> {
        parse_sas_libraries(text)
            .into_iter()
            .map(|library| (library.id, library.package))
            .collect()
    }

    fn pair(id: &str, package: &str) -> (String, String) {
        (id.to_string(), package.to_string())
    }

    #[test]
    fn includes_by_path_and_reference() {
        let text = "%include '/shared/macros/setup.sas';\n%INC common;\n";
        assert_eq!(
            pairs(text),
            vec![
                pair("/shared/macros/setup.sas", "/shared/macros/setup.sas"),
                pair("common", "common"),
            ]
        );
    }

    #[test]
    fn filename_and_libname_map_label_to_path() {
        let text = "filename tools 'C:\\sas\\tools.sas' encoding=\"utf-8\";\n\
                    libname trial '/data/trial';\n";
        assert_eq!(
            pairs(text),
            vec![
                pair("tools", "C:\\sas\\tools.sas"),
                pair("trial", "/data/trial"),
            ]
        );
    }

    #[test]
    fn empty_text_has_no_libraries() {
        assert!(parse_sas_libraries("").is_empty());
        assert!(parse_sas_libraries("data x; set y; run;").is_empty());
    }

    #[test]
    fn scan_records_libraries_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.sas");
        fs::write(&path, "libname raw '/data/raw';\n").unwrap();

        let scanned = SasHandler.scan(SasHandler.scan(AssetNode::file(path.to_string_lossy())));
        assert_eq!(scanned.metadata.len(), 1);
        assert_eq!(scanned.metadata[0].library_ids(), vec!["raw"]);

        let other = AssetNode::file("/project/clean.do");
        assert_eq!(SasHandler.scan(other.clone()), other);
    }
}
