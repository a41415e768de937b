//! Applies one [`MergeRequest`] to a freshly loaded document.
//!
//! Each action is a small transformation of the resolved entity. The
//! functions here never touch the disk except for the initial load in
//! [`load_and_merge_project_updates`]; saving is the caller's job, inside
//! the project lock.

use crate::action::{
    AboutDetailsPayload, ActionKind, AssetGroupPayload, AttributePayload, AuditEntry, EntityKind,
    ExternalAssetPayload, MergeRequest, NotePayload, PersonPayload,
};
use crate::document::{AssetGroup, Person, ProjectDocument, EXTERNAL_ASSETS_KEY};
use crate::store::load_project_file;
use crate::MergeError;
use chrono::Utc;
use labbook_assets::tree::{find_descendant, find_descendant_mut, remove_descendant};
use labbook_assets::{attribute_definition, classify_key, AssetKind, AssetNode, Note};
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

type MergeResult<T> = std::result::Result<T, MergeError>;

/// Short description of an applied change, `None` for a no-op
type Applied = Option<&'static str>;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The whole document, mutated or not
    pub document: ProjectDocument,
    /// False when the action turned out to be a no-op
    pub changed: bool,
    /// Present only when something changed
    pub audit: Option<AuditEntry>,
}

/// Load the document at `root` and apply `request` to it. The request is
/// checked before any I/O happens.
pub fn load_and_merge_project_updates(
    root: &Path,
    request: &MergeRequest,
    user: &str,
) -> MergeResult<MergeOutcome> {
    if root.as_os_str().is_empty() {
        return Err(MergeError::MissingField("path"));
    }
    if request.entity_key.trim().is_empty() {
        return Err(MergeError::MissingField("entityKey"));
    }
    if request.payload.is_null() {
        return Err(MergeError::MissingField("payload"));
    }

    let document = load_project_file(root)?;
    apply_action(document, request, user).inspect_err(|err| {
        if !err.is_store_failure() {
            log::warn!(
                "Rejected {} on {} {}: {err}",
                request.action.as_str(),
                request.entity.as_str(),
                request.entity_key
            );
        }
    })
}

/// Dispatch on (action, entity) and apply the matching transformation
pub fn apply_action(
    mut document: ProjectDocument,
    request: &MergeRequest,
    user: &str,
) -> MergeResult<MergeOutcome> {
    let key = request.entity_key.as_str();
    let applied = match (request.action, request.entity) {
        (_, EntityKind::Checklist) => return Err(MergeError::ChecklistPendingConfirmation),

        (ActionKind::NoteAdd | ActionKind::NoteUpdate | ActionKind::NoteDelete, entity) => {
            let notes = resolve_notes(&mut document, entity, key)?;
            apply_note(notes, request, user)?
        }

        (ActionKind::AttributeSet, EntityKind::Asset | EntityKind::ExternalAsset) => {
            let node = resolve_asset(&mut document, request.entity, key)?;
            set_attribute(node, request)?
        }

        (ActionKind::PersonAdd, EntityKind::Project) => {
            ensure_project(&document, key)?;
            add_person(&mut document.people, request)?
        }
        (ActionKind::PersonUpdate, EntityKind::Person) => {
            let person = resolve_person(&mut document.people, key)?;
            update_person(person, request)?
        }
        (ActionKind::PersonDelete, EntityKind::Person) => {
            resolve_person(&mut document.people, key)?;
            document.people.retain(|person| person.id != key);
            Some("Deleted person")
        }

        (ActionKind::ExternalAssetAdd, EntityKind::Project) => {
            ensure_project(&document, key)?;
            add_external_asset(&mut document.external_assets, request)?
        }
        (ActionKind::ExternalAssetUpdate, EntityKind::ExternalAsset) => {
            update_external_asset(&mut document.external_assets, key, request)?
        }
        (ActionKind::ExternalAssetDelete, EntityKind::ExternalAsset) => {
            if key == EXTERNAL_ASSETS_KEY {
                return Err(MergeError::invalid(
                    "the external assets root cannot be deleted",
                ));
            }
            remove_descendant(&mut document.external_assets, key)
                .ok_or_else(|| MergeError::not_found("external asset", key))?;
            Some("Deleted external asset")
        }

        (
            ActionKind::AssetGroupAdd | ActionKind::AssetGroupUpdate | ActionKind::AssetGroupDelete,
            EntityKind::Project,
        ) => {
            ensure_project(&document, key)?;
            apply_asset_group(&mut document.asset_groups, request)?
        }

        (ActionKind::AboutDetailsUpdate, EntityKind::Project) => {
            ensure_project(&document, key)?;
            update_about_details(&mut document, request)?
        }

        (action, entity) => return Err(MergeError::UnsupportedAction { action, entity }),
    };

    let audit = applied.map(|description| AuditEntry {
        action: request.action,
        entity: request.entity,
        entity_key: request.entity_key.clone(),
        description: format!(
            "{description} ({} {})",
            request.entity.as_str(),
            request.entity_key
        ),
        user: user.to_string(),
        timestamp: Utc::now(),
        details: request.payload.clone(),
    });
    if let Some(audit) = &audit {
        log::info!("{} by {}", audit.description, audit.user);
    }

    Ok(MergeOutcome {
        document,
        changed: audit.is_some(),
        audit,
    })
}

fn ensure_project(document: &ProjectDocument, key: &str) -> MergeResult<()> {
    if document.id == key {
        Ok(())
    } else {
        Err(MergeError::not_found("project", key))
    }
}

fn resolve_asset<'a>(
    document: &'a mut ProjectDocument,
    entity: EntityKind,
    key: &str,
) -> MergeResult<&'a mut AssetNode> {
    let tree = match entity {
        EntityKind::Asset => document.assets.as_mut(),
        _ => Some(&mut document.external_assets),
    };
    tree.and_then(|tree| find_descendant_mut(tree, key))
        .ok_or_else(|| MergeError::not_found(entity.as_str(), key))
}

fn resolve_person<'a>(people: &'a mut [Person], key: &str) -> MergeResult<&'a mut Person> {
    people
        .iter_mut()
        .find(|person| person.id == key)
        .ok_or_else(|| MergeError::not_found("person", key))
}

fn resolve_notes<'a>(
    document: &'a mut ProjectDocument,
    entity: EntityKind,
    key: &str,
) -> MergeResult<&'a mut Vec<Note>> {
    match entity {
        EntityKind::Project => {
            ensure_project(document, key)?;
            Ok(&mut document.notes)
        }
        EntityKind::Asset | EntityKind::ExternalAsset => {
            Ok(&mut resolve_asset(document, entity, key)?.notes)
        }
        EntityKind::Person => Ok(&mut resolve_person(&mut document.people, key)?.notes),
        EntityKind::Checklist => Err(MergeError::ChecklistPendingConfirmation),
    }
}

fn apply_note(notes: &mut Vec<Note>, request: &MergeRequest, user: &str) -> MergeResult<Applied> {
    let payload: NotePayload = request.payload_as()?;

    if request.action == ActionKind::NoteDelete {
        let id = payload
            .id
            .ok_or_else(|| MergeError::invalid("note_delete needs an id"))?;
        let before = notes.len();
        notes.retain(|note| note.id != id);
        if notes.len() == before {
            return Err(MergeError::not_found("note", id));
        }
        return Ok(Some("Deleted note"));
    }

    let content = payload
        .content
        .ok_or_else(|| MergeError::invalid("note content is required"))?;

    if request.action == ActionKind::NoteUpdate {
        if let Some(existing) = payload
            .id
            .as_deref()
            .and_then(|id| notes.iter_mut().find(|note| note.id == id))
        {
            return Ok(existing.update_content(&content).then_some("Updated note"));
        }
    }

    let author = payload
        .author
        .filter(|author| !author.trim().is_empty())
        .unwrap_or_else(|| user.to_string());
    notes.push(Note::new(author, content));
    Ok(Some("Added note"))
}

fn set_attribute(node: &mut AssetNode, request: &MergeRequest) -> MergeResult<Applied> {
    let payload: AttributePayload = request.payload_as()?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(MergeError::invalid("attribute name is required"));
    }
    let flag_value = payload.value.is_boolean() || payload.value.is_null();
    if attribute_definition(name).is_some() && !flag_value {
        return Err(MergeError::invalid(format!("attribute {name} takes true or false")));
    }

    if payload.value.is_null() {
        return Ok(node.attributes.remove(name).map(|_| "Cleared attribute"));
    }
    if node.attributes.get(name) == Some(&payload.value) {
        return Ok(None);
    }
    node.attributes.insert(name.to_string(), payload.value);
    Ok(Some("Set attribute"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn add_person(people: &mut Vec<Person>, request: &MergeRequest) -> MergeResult<Applied> {
    let payload: PersonPayload = request.payload_as()?;
    let name =
        non_blank(payload.name).ok_or_else(|| MergeError::invalid("person name is required"))?;
    let id = non_blank(payload.id).unwrap_or_else(|| Uuid::new_v4().to_string());
    if people.iter().any(|person| person.id == id) {
        return Err(MergeError::invalid(format!("person {id} already exists")));
    }

    people.push(Person {
        id,
        name,
        affiliation: payload.affiliation.unwrap_or_default(),
        roles: payload.roles.unwrap_or_default(),
        notes: Vec::new(),
    });
    Ok(Some("Added person"))
}

fn update_person(person: &mut Person, request: &MergeRequest) -> MergeResult<Applied> {
    let payload: PersonPayload = request.payload_as()?;
    let mut changed = false;

    if let Some(name) = payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(MergeError::invalid("person name cannot be blank"));
        }
        changed |= replace(&mut person.name, name.to_string());
    }
    if let Some(affiliation) = payload.affiliation {
        changed |= replace(&mut person.affiliation, affiliation);
    }
    if let Some(roles) = payload.roles {
        changed |= replace(&mut person.roles, roles);
    }
    Ok(changed.then_some("Updated person"))
}

fn add_external_asset(external: &mut AssetNode, request: &MergeRequest) -> MergeResult<Applied> {
    let payload: ExternalAssetPayload = request.payload_as()?;
    let key = non_blank(payload.key)
        .ok_or_else(|| MergeError::invalid("external asset key is required"))?;
    if find_descendant(external, &key).is_some() {
        return Err(MergeError::invalid(format!("external asset {key} already exists")));
    }

    let mut node = AssetNode::new(key, AssetKind::Other);
    node.content_types = payload
        .content_types
        .filter(|types| !types.is_empty())
        .unwrap_or_else(|| classify_key(&node.key));

    match external.children_mut() {
        Some(children) => children.push(node),
        None => return Err(MergeError::invalid("external assets root is not a container")),
    }
    Ok(Some("Added external asset"))
}

fn update_external_asset(
    external: &mut AssetNode,
    key: &str,
    request: &MergeRequest,
) -> MergeResult<Applied> {
    if key == EXTERNAL_ASSETS_KEY {
        return Err(MergeError::invalid("the external assets root cannot be updated"));
    }
    let payload: ExternalAssetPayload = request.payload_as()?;
    let new_key = non_blank(payload.key);
    if let Some(new_key) = &new_key {
        if new_key != key && find_descendant(external, new_key).is_some() {
            return Err(MergeError::invalid(format!(
                "external asset {new_key} already exists"
            )));
        }
    }

    let node = find_descendant_mut(external, key)
        .ok_or_else(|| MergeError::not_found("external asset", key))?;
    let mut changed = false;
    if let Some(new_key) = new_key {
        changed |= replace(&mut node.key, new_key);
    }
    if let Some(types) = payload.content_types.filter(|types| !types.is_empty()) {
        changed |= replace(&mut node.content_types, types);
    }
    Ok(changed.then_some("Updated external asset"))
}

fn apply_asset_group(
    groups: &mut Vec<AssetGroup>,
    request: &MergeRequest,
) -> MergeResult<Applied> {
    let payload: AssetGroupPayload = request.payload_as()?;

    match request.action {
        ActionKind::AssetGroupDelete => {
            let id = non_blank(payload.id)
                .ok_or_else(|| MergeError::invalid("asset group id is required"))?;
            let before = groups.len();
            groups.retain(|group| group.id != id);
            // Deleting a group that is already gone is not an error.
            Ok((groups.len() != before).then_some("Deleted asset group"))
        }
        ActionKind::AssetGroupAdd => {
            let name = group_name(payload.name)?;
            let id = non_blank(payload.id).unwrap_or_else(|| Uuid::new_v4().to_string());
            if groups.iter().any(|group| group.id == id) {
                return Err(MergeError::invalid(format!("asset group {id} already exists")));
            }
            groups.push(AssetGroup {
                id,
                name,
                details: payload.details.unwrap_or_default(),
                member_keys: payload.member_keys.unwrap_or_default(),
                notes: Vec::new(),
            });
            Ok(Some("Added asset group"))
        }
        _ => {
            let id = non_blank(payload.id)
                .ok_or_else(|| MergeError::invalid("asset group id is required"))?;
            let name = group_name(payload.name)?;
            let group = groups
                .iter_mut()
                .find(|group| group.id == id)
                .ok_or_else(|| MergeError::not_found("asset group", &id))?;

            let mut changed = replace(&mut group.name, name);
            if let Some(details) = payload.details {
                changed |= replace(&mut group.details, details);
            }
            if let Some(member_keys) = payload.member_keys {
                changed |= replace(&mut group.member_keys, member_keys);
            }
            Ok(changed.then_some("Updated asset group"))
        }
    }
}

fn group_name(name: Option<String>) -> MergeResult<String> {
    non_blank(name)
        .ok_or_else(|| MergeError::invalid("asset group name must contain a non-space character"))
}

fn update_about_details(
    document: &mut ProjectDocument,
    request: &MergeRequest,
) -> MergeResult<Applied> {
    let payload: AboutDetailsPayload = request.payload_as()?;
    if payload.description.is_none() && payload.categories.is_none() {
        return Err(MergeError::invalid("about details need a description or categories"));
    }

    let mut changed = false;
    if let Some(description) = payload.description {
        changed |= replace(&mut document.description, description);
    }
    if let Some(categories) = payload.categories {
        changed |= replace(&mut document.categories, categories);
    }
    Ok(changed.then_some("Updated project details"))
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Convenience for hosts holding raw JSON
pub fn payload_from_str(raw: &str) -> MergeResult<Value> {
    serde_json::from_str(raw)
        .map_err(|err| MergeError::invalid(format!("payload is not JSON: {err}")))
}
