use labbook_assets::tree::find_descendant;
use labbook_assets::AssetNode;
use labbook_project::{
    create_project, load_and_merge_project_updates, load_project_file, save_project_file,
    save_scanned_assets, update_project, ActionKind, EntityKind, MergeError, MergeRequest,
    ProjectPaths, StoreError,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn new_project(root: &Path) -> String {
    let doc = create_project(root, "Trial").unwrap();
    save_scanned_assets(
        root,
        AssetNode::directory(
            "",
            vec![AssetNode::directory(
                "code",
                vec![AssetNode::file("code/fit.R")],
            )],
        ),
    )
    .unwrap();
    doc.id
}

fn note(key: &str, content: &str) -> MergeRequest {
    MergeRequest::new(
        ActionKind::NoteAdd,
        EntityKind::Asset,
        key,
        json!({ "content": content }),
    )
}

#[test]
fn back_to_back_updates_see_each_other() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let project_id = new_project(root);

    let first = update_project(root, &note("code/fit.R", "first"), "ann").unwrap();
    assert!(first.changed);

    let about = MergeRequest::new(
        ActionKind::AboutDetailsUpdate,
        EntityKind::Project,
        project_id,
        json!({ "description": "Dose finding" }),
    );
    let second = update_project(root, &about, "bo").unwrap();

    // The second cycle reloaded from disk and kept the first note.
    let fit = find_descendant(second.document.assets.as_ref().unwrap(), "code/fit.R").unwrap();
    assert_eq!(fit.notes.len(), 1);
    assert_eq!(fit.notes[0].author, "ann");

    let stored = load_project_file(root).unwrap();
    assert_eq!(stored, second.document);
    assert_eq!(stored.description, "Dose finding");
}

#[test]
fn concurrent_writers_do_not_lose_updates() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    new_project(&root);

    let writers: Vec<_> = (0..8)
        .map(|i| {
            let root = root.clone();
            std::thread::spawn(move || {
                update_project(&root, &note("code/fit.R", &format!("note {i}")), "worker")
                    .unwrap();
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let stored = load_project_file(&root).unwrap();
    let fit = find_descendant(stored.assets.as_ref().unwrap(), "code/fit.R").unwrap();
    assert_eq!(fit.notes.len(), 8);
}

#[test]
fn saving_a_scan_keeps_notes_added_while_it_ran() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    new_project(root);

    // The scan starts from the document as it was, without a note.
    let fresh = AssetNode::directory(
        "",
        vec![
            AssetNode::directory(
                "code",
                vec![AssetNode::file("code/fit.R"), AssetNode::file("code/clean.sas")],
            ),
            AssetNode::file("README.md"),
        ],
    );
    update_project(root, &note("code/fit.R", "added mid-scan"), "ann").unwrap();
    let attribute = MergeRequest::new(
        ActionKind::AttributeSet,
        EntityKind::Asset,
        "code",
        json!({ "name": "owner", "value": "stats team" }),
    );
    update_project(root, &attribute, "bo").unwrap();

    let saved = save_scanned_assets(root, fresh).unwrap();
    assert_eq!(load_project_file(root).unwrap(), saved);

    let assets = saved.assets.as_ref().unwrap();
    let fit = find_descendant(assets, "code/fit.R").unwrap();
    assert_eq!(fit.notes.len(), 1);
    assert_eq!(fit.notes[0].content, "added mid-scan");
    let code = find_descendant(assets, "code").unwrap();
    assert_eq!(code.attributes.get("owner"), Some(&json!("stats team")));
    assert!(find_descendant(assets, "code/clean.sas").is_some());

    // Children come back in key order.
    let keys: Vec<&str> = assets
        .children()
        .unwrap()
        .iter()
        .map(|child| child.key.as_str())
        .collect();
    assert_eq!(keys, vec!["README.md", "code"]);
}

#[test]
fn rejected_actions_write_nothing() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    new_project(root);
    let document_path = ProjectPaths::for_root(root).document;
    let before = fs::read(&document_path).unwrap();

    let unknown = MergeRequest::parse(
        Some("note_rename"),
        Some("asset"),
        Some("code/fit.R"),
        Some(json!({ "content": "x" })),
    );
    assert!(matches!(unknown, Err(MergeError::UnknownAction(_))));

    let err = update_project(root, &note("code/missing.R", "x"), "ann").unwrap_err();
    assert!(matches!(err, MergeError::EntityNotFound { .. }));
    assert!(!err.is_store_failure());

    assert_eq!(fs::read(&document_path).unwrap(), before);
}

#[test]
fn missing_payload_fails_before_io() {
    let dir = tempdir().unwrap();
    let request = MergeRequest::new(
        ActionKind::NoteAdd,
        EntityKind::Asset,
        "code/fit.R",
        serde_json::Value::Null,
    );
    // No project exists here, so any I/O would surface as NotFound.
    assert!(matches!(
        load_and_merge_project_updates(dir.path(), &request, "ann"),
        Err(MergeError::MissingField("payload"))
    ));
}

#[test]
fn malformed_document_is_a_hard_failure() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    new_project(root);
    fs::write(ProjectPaths::for_root(root).document, "[1, 2").unwrap();

    let err = update_project(root, &note("code/fit.R", "x"), "ann").unwrap_err();
    assert!(matches!(err, MergeError::Store(StoreError::Parse { .. })));
    assert!(err.is_store_failure());
}

#[test]
fn merge_does_not_persist() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    new_project(root);

    let outcome =
        load_and_merge_project_updates(root, &note("code/fit.R", "draft"), "ann").unwrap();
    assert!(outcome.changed);
    let stored = load_project_file(root).unwrap();
    let fit = find_descendant(stored.assets.as_ref().unwrap(), "code/fit.R").unwrap();
    assert!(fit.notes.is_empty());

    save_project_file(root, &outcome.document).unwrap();
    assert_eq!(load_project_file(root).unwrap(), outcome.document);
}
