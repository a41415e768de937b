use crate::node::AssetNode;
use std::collections::HashMap;

/// Re-attach persisted notes and attributes onto a freshly scanned tree.
///
/// The root always takes the persisted root's annotations. Below it, a node
/// takes the annotations of the persisted node with the same key, wherever
/// that node sits in the persisted tree; fresh nodes with no counterpart end
/// up with none. Persisted nodes missing from the fresh tree are dropped.
pub fn merge_annotations(mut fresh: AssetNode, persisted: &AssetNode) -> AssetNode {
    let mut index = HashMap::new();
    index_by_key(persisted, &mut index);

    fresh.notes = persisted.notes.clone();
    fresh.attributes = persisted.attributes.clone();

    let mut carried = 0;
    if let Some(children) = fresh.children_mut() {
        for child in children {
            carry(child, &index, &mut carried);
        }
    }
    log::debug!("Carried annotations onto {carried} nodes under {}", fresh.key);
    fresh
}

fn index_by_key<'a>(node: &'a AssetNode, index: &mut HashMap<&'a str, &'a AssetNode>) {
    index.entry(node.key.as_str()).or_insert(node);
    for child in node.children().into_iter().flatten() {
        index_by_key(child, index);
    }
}

fn carry(node: &mut AssetNode, index: &HashMap<&str, &AssetNode>, carried: &mut usize) {
    match index.get(node.key.as_str()) {
        Some(previous) => {
            node.notes = previous.notes.clone();
            node.attributes = previous.attributes.clone();
            *carried += 1;
        }
        None => {
            node.notes.clear();
            node.attributes.clear();
        }
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            carry(child, index, carried);
        }
    }
}
