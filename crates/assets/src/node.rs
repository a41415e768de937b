use crate::classifier::{default_content_types, ContentType};
use crate::note::Note;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One node of the asset tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetNode {
    /// Absolute or root-relative path, or a URL for external assets
    pub key: String,

    #[serde(flatten)]
    pub kind: AssetKind,

    #[serde(default = "default_content_types")]
    pub content_types: BTreeSet<ContentType>,

    /// At most one record per handler id
    #[serde(default)]
    pub metadata: Vec<HandlerMetadata>,

    #[serde(default)]
    pub notes: Vec<Note>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

/// What the key points at. Only directories carry children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetKind {
    File,
    Directory { children: Vec<AssetNode> },
    Socket,
    Symlink,
    Other,
    Unknown,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::File => "file",
            AssetKind::Directory { .. } => "directory",
            AssetKind::Socket => "socket",
            AssetKind::Symlink => "symlink",
            AssetKind::Other => "other",
            AssetKind::Unknown => "unknown",
        }
    }
}

impl AssetNode {
    pub fn new(key: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            key: key.into(),
            kind,
            content_types: default_content_types(),
            metadata: Vec::new(),
            notes: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn file(key: impl Into<String>) -> Self {
        Self::new(key, AssetKind::File)
    }

    pub fn directory(key: impl Into<String>, children: Vec<AssetNode>) -> Self {
        Self::new(key, AssetKind::Directory { children })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, AssetKind::File)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, AssetKind::Directory { .. })
    }

    pub fn children(&self) -> Option<&[AssetNode]> {
        match &self.kind {
            AssetKind::Directory { children } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<AssetNode>> {
        match &mut self.kind {
            AssetKind::Directory { children } => Some(children),
            _ => None,
        }
    }

    pub fn metadata_for(&self, id: HandlerId) -> Option<&HandlerMetadata> {
        self.metadata.iter().find(|record| record.handler_id() == id)
    }

    pub fn has_metadata(&self, id: HandlerId) -> bool {
        self.metadata_for(id).is_some()
    }

    /// Append a record unless one with the same handler id is already present
    pub fn push_metadata(&mut self, record: HandlerMetadata) -> bool {
        if self.has_metadata(record.handler_id()) {
            return false;
        }
        self.metadata.push(record);
        true
    }

    pub fn file_metadata(&self) -> Option<&FileMetadata> {
        match self.metadata_for(HandlerId::File) {
            Some(HandlerMetadata::File(meta)) => Some(meta),
            _ => None,
        }
    }

    /// False only when the file handler explicitly excluded this node
    pub fn is_included(&self) -> bool {
        self.file_metadata().map_or(true, |meta| meta.include)
    }
}

/// Identifier of a scanner stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerId {
    File,
    Python,
    R,
    Sas,
    Stata,
    Java,
}

impl HandlerId {
    pub const ALL: [HandlerId; 6] = [
        HandlerId::File,
        HandlerId::Python,
        HandlerId::R,
        HandlerId::Sas,
        HandlerId::Stata,
        HandlerId::Java,
    ];

    /// Id written into metadata records
    pub fn as_str(self) -> &'static str {
        match self {
            HandlerId::File => "labbook.file",
            HandlerId::Python => "labbook.python",
            HandlerId::R => "labbook.r",
            HandlerId::Sas => "labbook.sas",
            HandlerId::Stata => "labbook.stata",
            HandlerId::Java => "labbook.java",
        }
    }

    /// Short name used in configuration files
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "file" => Some(HandlerId::File),
            "python" => Some(HandlerId::Python),
            "r" => Some(HandlerId::R),
            "sas" => Some(HandlerId::Sas),
            "stata" => Some(HandlerId::Stata),
            "java" => Some(HandlerId::Java),
            _ => None,
        }
    }
}

/// Result record produced by one handler for one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id")]
pub enum HandlerMetadata {
    #[serde(rename = "labbook.file")]
    File(FileMetadata),
    #[serde(rename = "labbook.python")]
    Python(CodeMetadata<ImportLibrary>),
    #[serde(rename = "labbook.r")]
    R(CodeMetadata<PackageLibrary>),
    #[serde(rename = "labbook.sas")]
    Sas(CodeMetadata<PackageLibrary>),
    #[serde(rename = "labbook.stata")]
    Stata(CodeMetadata<PackageLibrary>),
    #[serde(rename = "labbook.java")]
    Java(CodeMetadata<ImportLibrary>),
}

impl HandlerMetadata {
    pub fn handler_id(&self) -> HandlerId {
        match self {
            HandlerMetadata::File(_) => HandlerId::File,
            HandlerMetadata::Python(_) => HandlerId::Python,
            HandlerMetadata::R(_) => HandlerId::R,
            HandlerMetadata::Sas(_) => HandlerId::Sas,
            HandlerMetadata::Stata(_) => HandlerId::Stata,
            HandlerMetadata::Java(_) => HandlerId::Java,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            HandlerMetadata::File(meta) => meta.error.as_deref(),
            HandlerMetadata::Python(meta) | HandlerMetadata::Java(meta) => meta.error.as_deref(),
            HandlerMetadata::R(meta)
            | HandlerMetadata::Sas(meta)
            | HandlerMetadata::Stata(meta) => meta.error.as_deref(),
        }
    }

    /// Library ids extracted by a code handler, in declaration order
    pub fn library_ids(&self) -> Vec<&str> {
        match self {
            HandlerMetadata::File(_) => Vec::new(),
            HandlerMetadata::Python(meta) | HandlerMetadata::Java(meta) => meta.library_ids(),
            HandlerMetadata::R(meta)
            | HandlerMetadata::Sas(meta)
            | HandlerMetadata::Stata(meta) => meta.library_ids(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default = "default_include")]
    pub include: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_include() -> bool {
    true
}

/// Output of a dependency-extracting handler. `libraries` is omitted when
/// the file could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "L: Serialize", deserialize = "L: Deserialize<'de>"))]
pub struct CodeMetadata<L> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libraries: Option<Vec<L>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<L: Library> CodeMetadata<L> {
    pub fn with_libraries(libraries: Vec<L>) -> Self {
        Self {
            libraries: Some(libraries),
            error: None,
        }
    }

    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            libraries: None,
            error: Some(error.into()),
        }
    }

    pub fn library_ids(&self) -> Vec<&str> {
        self.libraries
            .iter()
            .flatten()
            .map(|library| library.id())
            .collect()
    }
}

/// A dependency reference extracted from source text
pub trait Library {
    fn id(&self) -> &str;
}

/// `module` / `import` pair from Python or Java import statements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportLibrary {
    pub id: String,
    pub module: Option<String>,
    pub import: Option<String>,
    pub alias: Option<String>,
}

impl Library for ImportLibrary {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Named package or file reference (R, SAS, Stata)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageLibrary {
    pub id: String,
    pub package: String,
}

impl Library for PackageLibrary {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn children_are_absent_for_files() {
        let tree = AssetNode::directory("/p", vec![AssetNode::file("/p/a.py")]);
        let value = serde_json::to_value(&tree).unwrap();

        assert_eq!(value["type"], "directory");
        assert_eq!(value["children"][0]["type"], "file");
        assert!(value["children"][0].get("children").is_none());
        assert_eq!(value["contentTypes"], json!(["other"]));
    }

    #[test]
    fn metadata_records_carry_handler_id() {
        let mut node = AssetNode::file("/p/a.R");
        assert!(node.push_metadata(HandlerMetadata::R(CodeMetadata::with_libraries(vec![
            PackageLibrary {
                id: "dplyr".into(),
                package: "dplyr".into(),
            }
        ]))));
        assert!(!node.push_metadata(HandlerMetadata::R(CodeMetadata::with_error("again"))));

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value["metadata"],
            json!([{ "id": "labbook.r", "libraries": [{ "id": "dplyr", "package": "dplyr" }] }])
        );

        let parsed: AssetNode = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, node);
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let node: AssetNode = serde_json::from_value(json!({
            "key": "data",
            "type": "directory",
            "children": [{ "key": "data/raw.csv", "type": "file", "contentTypes": ["data"] }]
        }))
        .unwrap();

        assert_eq!(node.content_types, default_content_types());
        let child = &node.children().unwrap()[0];
        assert!(child.notes.is_empty());
        assert!(child.is_included());
        assert_eq!(child.content_types, BTreeSet::from([ContentType::Data]));
    }

    #[test]
    fn handler_names_resolve() {
        assert_eq!(HandlerId::from_name("Python"), Some(HandlerId::Python));
        assert_eq!(HandlerId::from_name(" r "), Some(HandlerId::R));
        assert_eq!(HandlerId::from_name("STATA"), Some(HandlerId::Stata));
        assert_eq!(HandlerId::from_name("julia"), None);
        assert_eq!(HandlerId::File.as_str(), "labbook.file");
        assert_eq!(HandlerId::Java.as_str(), "labbook.java");
    }

    #[test]
    fn code_records_round_trip_for_every_language() {
        let package = || {
            CodeMetadata::with_libraries(vec![PackageLibrary {
                id: "macros".into(),
                package: "/lib/macros.sas".into(),
            }])
        };
        let records = vec![
            HandlerMetadata::Sas(package()),
            HandlerMetadata::Stata(CodeMetadata::with_error("gone")),
            HandlerMetadata::Java(CodeMetadata::with_libraries(vec![ImportLibrary {
                id: "java.util.List".into(),
                module: Some("java.util".into()),
                import: Some("List".into()),
                alias: None,
            }])),
        ];

        let value = serde_json::to_value(&records).unwrap();
        assert_eq!(value[0]["id"], "labbook.sas");
        assert_eq!(value[1], json!({ "id": "labbook.stata", "error": "gone" }));
        assert_eq!(value[2]["libraries"][0]["module"], "java.util");

        let parsed: Vec<HandlerMetadata> = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, records);
        assert_eq!(parsed[0].library_ids(), vec!["macros"]);
        assert_eq!(parsed[1].error(), Some("gone"));
        assert_eq!(parsed[2].handler_id(), HandlerId::Java);
    }
}
