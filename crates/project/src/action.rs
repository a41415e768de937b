use crate::MergeError;
use chrono::{DateTime, Utc};
use labbook_assets::ContentType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Fixed taxonomy of document mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    NoteAdd,
    NoteUpdate,
    NoteDelete,
    AttributeSet,
    PersonAdd,
    PersonUpdate,
    PersonDelete,
    ExternalAssetAdd,
    ExternalAssetUpdate,
    ExternalAssetDelete,
    AssetGroupAdd,
    AssetGroupUpdate,
    AssetGroupDelete,
    AboutDetailsUpdate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 14] = [
        ActionKind::NoteAdd,
        ActionKind::NoteUpdate,
        ActionKind::NoteDelete,
        ActionKind::AttributeSet,
        ActionKind::PersonAdd,
        ActionKind::PersonUpdate,
        ActionKind::PersonDelete,
        ActionKind::ExternalAssetAdd,
        ActionKind::ExternalAssetUpdate,
        ActionKind::ExternalAssetDelete,
        ActionKind::AssetGroupAdd,
        ActionKind::AssetGroupUpdate,
        ActionKind::AssetGroupDelete,
        ActionKind::AboutDetailsUpdate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::NoteAdd => "note_add",
            ActionKind::NoteUpdate => "note_update",
            ActionKind::NoteDelete => "note_delete",
            ActionKind::AttributeSet => "attribute_set",
            ActionKind::PersonAdd => "person_add",
            ActionKind::PersonUpdate => "person_update",
            ActionKind::PersonDelete => "person_delete",
            ActionKind::ExternalAssetAdd => "external_asset_add",
            ActionKind::ExternalAssetUpdate => "external_asset_update",
            ActionKind::ExternalAssetDelete => "external_asset_delete",
            ActionKind::AssetGroupAdd => "asset_group_add",
            ActionKind::AssetGroupUpdate => "asset_group_update",
            ActionKind::AssetGroupDelete => "asset_group_delete",
            ActionKind::AboutDetailsUpdate => "about_details_update",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

/// Addressable targets inside a project document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Asset,
    ExternalAsset,
    Person,
    Checklist,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Project,
        EntityKind::Asset,
        EntityKind::ExternalAsset,
        EntityKind::Person,
        EntityKind::Checklist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Asset => "asset",
            EntityKind::ExternalAsset => "external_asset",
            EntityKind::Person => "person",
            EntityKind::Checklist => "checklist",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

/// One typed update against one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub action: ActionKind,
    pub entity: EntityKind,
    pub entity_key: String,
    pub payload: Value,
}

impl MergeRequest {
    pub fn new(
        action: ActionKind,
        entity: EntityKind,
        entity_key: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            action,
            entity,
            entity_key: entity_key.into(),
            payload,
        }
    }

    /// Build a request from loosely typed host input. Every part must be
    /// present; a `null` payload counts as missing.
    pub fn parse(
        action: Option<&str>,
        entity: Option<&str>,
        entity_key: Option<&str>,
        payload: Option<Value>,
    ) -> Result<Self, MergeError> {
        let action = present(action).ok_or(MergeError::MissingField("action"))?;
        let entity = present(entity).ok_or(MergeError::MissingField("entity"))?;
        let entity_key = present(entity_key).ok_or(MergeError::MissingField("entityKey"))?;
        let payload = payload
            .filter(|value| !value.is_null())
            .ok_or(MergeError::MissingField("payload"))?;

        let action =
            ActionKind::parse(action).ok_or_else(|| MergeError::UnknownAction(action.to_string()))?;
        let entity =
            EntityKind::parse(entity).ok_or_else(|| MergeError::UnknownEntity(entity.to_string()))?;

        Ok(Self::new(action, entity, entity_key, payload))
    }

    pub(crate) fn payload_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, MergeError> {
        serde_json::from_value(self.payload.clone()).map_err(|err| {
            MergeError::invalid(format!("{} payload: {err}", self.action.as_str()))
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Record of one applied mutation, for the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub action: ActionKind,
    pub entity: EntityKind,
    pub entity_key: String,
    pub description: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotePayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttributePayload {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PersonPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExternalAssetPayload {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub content_types: Option<BTreeSet<ContentType>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssetGroupPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub member_keys: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AboutDetailsPayload {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds_round_trip_through_names() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::parse(kind.as_str()), Some(kind));
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::parse("note_rename"), None);
    }

    #[test]
    fn parse_requires_every_part() {
        let payload = Some(json!({ "content": "x" }));
        assert!(matches!(
            MergeRequest::parse(None, Some("asset"), Some("k"), payload.clone()),
            Err(MergeError::MissingField("action"))
        ));
        assert!(matches!(
            MergeRequest::parse(Some("note_add"), Some(" "), Some("k"), payload.clone()),
            Err(MergeError::MissingField("entity"))
        ));
        assert!(matches!(
            MergeRequest::parse(Some("note_add"), Some("asset"), None, payload.clone()),
            Err(MergeError::MissingField("entityKey"))
        ));
        assert!(matches!(
            MergeRequest::parse(Some("note_add"), Some("asset"), Some("k"), Some(Value::Null)),
            Err(MergeError::MissingField("payload"))
        ));
        assert!(matches!(
            MergeRequest::parse(Some("frobnicate"), Some("asset"), Some("k"), payload.clone()),
            Err(MergeError::UnknownAction(action)) if action == "frobnicate"
        ));
        assert!(matches!(
            MergeRequest::parse(Some("note_add"), Some("galaxy"), Some("k"), payload.clone()),
            Err(MergeError::UnknownEntity(_))
        ));

        let request =
            MergeRequest::parse(Some("note_add"), Some("asset"), Some("k"), payload).unwrap();
        assert_eq!(request.action, ActionKind::NoteAdd);
        assert_eq!(request.entity, EntityKind::Asset);
    }
}
