use labbook_assets::{AssetNode, Note};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Written into every saved document and compared for equality only
pub const FORMAT_VERSION: &str = "1";

/// Key of the container node holding external assets
pub const EXTERNAL_ASSETS_KEY: &str = "external";

/// The persisted source of truth for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    #[serde(default)]
    pub format_version: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub people: Vec<Person>,
    /// Last scanned tree, with root-relative keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetNode>,
    #[serde(default = "empty_external_assets")]
    pub external_assets: AssetNode,
    #[serde(default)]
    pub asset_groups: Vec<AssetGroup>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl ProjectDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            categories: Vec::new(),
            people: Vec::new(),
            assets: None,
            external_assets: empty_external_assets(),
            asset_groups: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }

    pub fn asset_group(&self, id: &str) -> Option<&AssetGroup> {
        self.asset_groups.iter().find(|group| group.id == id)
    }
}

pub fn empty_external_assets() -> AssetNode {
    AssetNode::directory(EXTERNAL_ASSETS_KEY, Vec::new())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub affiliation: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

/// Named set of asset keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub member_keys: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
}
