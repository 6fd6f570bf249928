//! # Position Algorithms
//!
//! Depth and containment queries over any parent-linked tree.
//!
//! Every function here walks the live parent chain and is O(depth); nothing
//! is cached, so results always reflect the tree as it is right now.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Parent-chain access needed by the position algorithms
pub trait TreeLookup {
    fn parent_of(&self, id: &str) -> Option<&NodeId>;

    /// Whether `id` currently has at least one child
    fn has_children(&self, id: &str) -> bool;
}

/// Relative position of two nodes
///
/// Discriminants follow the DOM `compareDocumentPosition` bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PositionNo {
    Same = 0,
    BeforeOrAfter = 2,
    ContainedBy = 8,
    Contains = 16,
}

/// Depth of `id` (a node without parent is at level 0)
pub fn z_level<T: TreeLookup + ?Sized>(tree: &T, id: &str) -> usize {
    let mut level = 0;
    let mut current = id;
    while let Some(parent) = tree.parent_of(current) {
        level += 1;
        current = parent.as_str();
    }
    level
}

/// The ancestor of `id` (or `id` itself) sitting at depth `target`.
///
/// `None` when `target` is deeper than `id`.
pub fn get_z_level_top<'a, T: TreeLookup + ?Sized>(tree: &'a T, id: &'a str, target: usize) -> Option<&'a str> {
    let mut level = z_level(tree, id);
    if level < target {
        return None;
    }

    let mut current = id;
    while level > target {
        current = tree.parent_of(current)?.as_str();
        level -= 1;
    }
    Some(current)
}

/// Whether `a` contains `b` (a node contains itself)
pub fn contains<T: TreeLookup + ?Sized>(tree: &T, a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if !tree.has_children(a) || tree.parent_of(b).is_none() {
        return false;
    }

    get_z_level_top(tree, b, z_level(tree, a)) == Some(a)
}

/// Compare the positions of `a` and `b`.
///
/// Nodes at equal depth are reported as [`PositionNo::BeforeOrAfter`]
/// whether they are siblings or unrelated.
pub fn compare_position<T: TreeLookup + ?Sized>(tree: &T, a: &str, b: &str) -> PositionNo {
    if a == b {
        return PositionNo::Same;
    }

    let la = z_level(tree, a);
    let lb = z_level(tree, b);
    if la == lb {
        return PositionNo::BeforeOrAfter;
    }

    if la < lb {
        if get_z_level_top(tree, b, la) == Some(a) {
            return PositionNo::Contains;
        }
        return PositionNo::BeforeOrAfter;
    }

    if get_z_level_top(tree, a, lb) == Some(b) {
        return PositionNo::ContainedBy;
    }
    PositionNo::BeforeOrAfter
}
