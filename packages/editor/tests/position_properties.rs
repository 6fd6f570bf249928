//! Property-based tests for tree invariants
//!
//! For randomly grown and reshuffled trees:
//!  - every node has at most one parent, and its parent lists it as a child
//!  - no node is its own strict ancestor
//!  - compare_position is reflexive (Same) and antisymmetric
//!    (Contains ⇔ ContainedBy)
//!  - contains(a, b) ⇔ a == b ∨ compare_position(a, b) == Contains
//!  - undoing every edit restores the initial export

use proptest::prelude::*;
use easel_editor::{Document, DocumentSchema, NodeSchema, PositionNo, TransformStage};

/// Each entry picks the parent of node `i + 1` among the nodes before it
fn parents_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(any::<prop::sample::Index>(), 1..24)
        .prop_map(|picks| picks.iter().enumerate().map(|(i, pick)| pick.index(i + 1)).collect())
}

fn moves_strategy() -> impl Strategy<Value = Vec<(prop::sample::Index, prop::sample::Index)>> {
    prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>()), 0..16)
}

fn id(i: usize) -> String {
    if i == 0 {
        "root".to_string()
    } else {
        format!("n{i}")
    }
}

fn grow(parents: &[usize]) -> Document {
    let mut doc = Document::new(Some(DocumentSchema::new(NodeSchema::new("Page").with_id("root"))));
    for (i, parent) in parents.iter().enumerate() {
        let child = doc.create_node(NodeSchema::new("Box").with_id(id(i + 1)));
        assert!(doc.insert(&id(*parent), child.as_str(), None));
    }
    doc
}

fn ids(doc: &Document) -> Vec<String> {
    let mut ids: Vec<String> = doc
        .root_node()
        .map(|root| {
            std::iter::once(root)
                .chain(root.descendants())
                .map(|node| node.id().to_string())
                .collect()
        })
        .unwrap_or_default();
    ids.sort();
    ids
}

/// Move `node` under `target` unless that would create a cycle
fn apply_move(doc: &mut Document, node: &str, target: &str) -> bool {
    let creates_cycle = doc.node(node).map_or(true, |n| n.contains(target));
    if creates_cycle || node == "root" {
        return false;
    }
    doc.insert(target, node, None)
}

fn check_structure(doc: &Document) -> Result<(), TestCaseError> {
    let all = ids(doc);
    for a in &all {
        let node = doc.node(a).unwrap();

        let holders = all
            .iter()
            .filter(|p| doc.node(p).unwrap().child_ids().iter().any(|c| c == a.as_str()))
            .count();
        prop_assert!(holders <= 1, "{a} held by {holders} parents");

        match node.parent() {
            Some(parent) => {
                prop_assert_eq!(holders, 1);
                prop_assert!(parent.children().unwrap().contains(a));
            }
            None => prop_assert_eq!(a.as_str(), "root"),
        }

        prop_assert!(node.ancestors().iter().all(|ancestor| ancestor.id() != a.as_str()));
        prop_assert_eq!(node.ancestors().len(), node.z_level());
    }
    Ok(())
}

fn check_positions(doc: &Document) -> Result<(), TestCaseError> {
    let all = ids(doc);
    for a in &all {
        let na = doc.node(a).unwrap();
        prop_assert_eq!(na.compare_position(a), PositionNo::Same);

        for b in &all {
            let nb = doc.node(b).unwrap();
            let ab = na.compare_position(b);
            let ba = nb.compare_position(a);

            prop_assert_eq!(ab == PositionNo::Contains, ba == PositionNo::ContainedBy);
            prop_assert_eq!(na.contains(b), a == b || ab == PositionNo::Contains);
            prop_assert_eq!(na.contains(b) && a != b, nb.ancestors().iter().any(|n| n.id() == a.as_str()));
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn grown_trees_hold_invariants(parents in parents_strategy()) {
        let doc = grow(&parents);
        prop_assert_eq!(ids(&doc).len(), parents.len() + 1);
        check_structure(&doc)?;
        check_positions(&doc)?;
    }

    #[test]
    fn reshuffled_trees_hold_invariants(parents in parents_strategy(), moves in moves_strategy()) {
        let mut doc = grow(&parents);
        let initial = doc.export(TransformStage::Serialize);
        let base = doc.history().undo_levels();
        let count = parents.len() + 1;

        for (node, target) in &moves {
            apply_move(&mut doc, &id(node.index(count)), &id(target.index(count)));
        }

        check_structure(&doc)?;
        check_positions(&doc)?;

        // moves that leave the tree unchanged record nothing
        while doc.history().undo_levels() > base {
            prop_assert!(doc.undo());
        }
        prop_assert_eq!(doc.export(TransformStage::Serialize), initial);
    }
}
