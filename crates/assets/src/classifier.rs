use crate::key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Coarse category assigned to an asset by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Code,
    Data,
    Documentation,
    Image,
    Other,
}

impl ContentType {
    /// Look up a lower- or mixed-case extension (no leading dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "r" | "rmd" | "rnw" | "snw" | "py" | "py3" | "pyi" | "sas" | "do" | "ado" | "mata"
            | "java" => Some(ContentType::Code),
            "csv" | "tsv" | "xls" | "xlsx" | "dta" | "rda" | "rdata" | "sas7bdat" | "sas7bvew"
            | "sas7bndx" | "sd7" | "sv7" | "si7" | "s7" => Some(ContentType::Data),
            "md" | "txt" | "pdf" | "doc" | "docx" | "rtf" => Some(ContentType::Documentation),
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "svg" | "tif" | "tiff" => {
                Some(ContentType::Image)
            }
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Code => "code",
            ContentType::Data => "data",
            ContentType::Documentation => "documentation",
            ContentType::Image => "image",
            ContentType::Other => "other",
        }
    }
}

/// Content types for a file key. Never empty: unmatched keys are `other`.
pub fn classify_key(key: &str) -> BTreeSet<ContentType> {
    let content_type = key::extension(key)
        .and_then(|ext| ContentType::from_extension(&ext))
        .unwrap_or(ContentType::Other);
    BTreeSet::from([content_type])
}

pub fn default_content_types() -> BTreeSet<ContentType> {
    BTreeSet::from([ContentType::Other])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliesTo {
    All,
    ContentTypes(&'static [ContentType]),
}

/// Boolean flag a user can set on an asset. All flags default to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDefinition {
    pub id: &'static str,
    pub display: &'static str,
    pub details: &'static str,
    pub applies_to: AppliesTo,
}

impl AttributeDefinition {
    pub fn applies(&self, content_types: &BTreeSet<ContentType>) -> bool {
        match self.applies_to {
            AppliesTo::All => true,
            AppliesTo::ContentTypes(types) => types.iter().any(|ty| content_types.contains(ty)),
        }
    }
}

pub const ATTRIBUTES: &[AttributeDefinition] = &[
    AttributeDefinition {
        id: "archived",
        display: "Archived",
        details: "Is this asset no longer actively used within the project?",
        applies_to: AppliesTo::All,
    },
    AttributeDefinition {
        id: "entrypoint",
        display: "Entry Point",
        details: "Is this asset an entry point for a programmatic workflow?",
        applies_to: AppliesTo::ContentTypes(&[ContentType::Code]),
    },
    AttributeDefinition {
        id: "sensitive",
        display: "Sensitive Info",
        details: "Does this asset contain sensitive information (PHI, PII, passwords, secrets)?",
        applies_to: AppliesTo::ContentTypes(&[
            ContentType::Code,
            ContentType::Data,
            ContentType::Documentation,
        ]),
    },
];

pub fn attribute_definition(id: &str) -> Option<&'static AttributeDefinition> {
    ATTRIBUTES.iter().find(|def| def.id == id)
}

pub fn applicable_attributes(
    content_types: &BTreeSet<ContentType>,
) -> Vec<&'static AttributeDefinition> {
    ATTRIBUTES
        .iter()
        .filter(|def| def.applies(content_types))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extension_lookup_is_case_insensitive() {
        assert_eq!(ContentType::from_extension("R"), Some(ContentType::Code));
        assert_eq!(ContentType::from_extension("Rmd"), Some(ContentType::Code));
        assert_eq!(ContentType::from_extension("SAS7BDAT"), Some(ContentType::Data));
        assert_eq!(ContentType::from_extension("md"), Some(ContentType::Documentation));
        assert_eq!(ContentType::from_extension("jpeg"), Some(ContentType::Image));
        assert_eq!(ContentType::from_extension("exe"), None);
    }

    #[test]
    fn test_classify_key() {
        assert_eq!(
            classify_key("/project/analysis/model.py"),
            BTreeSet::from([ContentType::Code])
        );
        assert_eq!(
            classify_key("/project/data/raw.CSV"),
            BTreeSet::from([ContentType::Data])
        );
        assert_eq!(
            classify_key("/project/.Rprofile"),
            BTreeSet::from([ContentType::Other])
        );
        assert_eq!(
            classify_key("https://example.org/docs/README.md?plain=1"),
            BTreeSet::from([ContentType::Documentation])
        );
    }

    #[test]
    fn test_applicable_attributes() {
        let ids = |types: BTreeSet<ContentType>| {
            applicable_attributes(&types)
                .into_iter()
                .map(|def| def.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(
            ids(BTreeSet::from([ContentType::Code])),
            vec!["archived", "entrypoint", "sensitive"]
        );
        assert_eq!(ids(BTreeSet::from([ContentType::Image])), vec!["archived"]);
        assert_eq!(
            ids(BTreeSet::from([ContentType::Data])),
            vec!["archived", "sensitive"]
        );
        assert!(attribute_definition("entrypoint").is_some());
        assert!(attribute_definition("colour").is_none());
    }
}
