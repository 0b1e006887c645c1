//! The creator tree.
//!
//! Parent/child bookkeeping between creators, kept apart from the widget hierarchy so it can be
//! walked (and reconciled) before any widget exists. Both directions are weak: a creator's
//! lifetime is governed by its widget or by whoever holds it, never by the tree.

use crate::creator::{Creator, CreatorInner, OwnershipState};
use core::fmt::Write;
use core::ptr;
use std::sync::{Arc, Weak};

#[derive(Default)]
pub(crate) struct TreeNode {
    parent: Weak<CreatorInner>,
    leaves: Vec<Leaf>,
}

/// A weak reference to a child creator.
struct Leaf(Weak<CreatorInner>);

impl Leaf {
    fn get(&self) -> Option<Creator> {
        self.0.upgrade().map(Creator)
    }

    fn is(&self, creator: &Creator) -> bool {
        ptr::eq(self.0.as_ptr(), Arc::as_ptr(&creator.0))
    }
}

impl Creator {
    /// The creator this one is a leaf of.
    pub fn parent(&self) -> Option<Creator> {
        self.0.tree.lock().parent.upgrade().map(Creator)
    }

    /// Live leaves, in order.
    pub fn leaves(&self) -> Vec<Creator> {
        self.0.tree.lock().leaves.iter().filter_map(Leaf::get).collect()
    }

    /// Position of `leaf` among this creator's leaves.
    pub fn index_of_leaf(&self, leaf: &Creator) -> Option<usize> {
        self.0.tree.lock().leaves.iter().position(|l| l.is(leaf))
    }

    pub fn contains_leaf(&self, leaf: &Creator) -> bool {
        self.index_of_leaf(leaf).is_some()
    }

    fn has_ancestor(&self, creator: &Creator) -> bool {
        let mut current = self.parent();
        while let Some(parent) = current {
            if parent.ptr_eq(creator) {
                return true;
            }
            current = parent.parent();
        }
        false
    }

    /// Appends a leaf, removing it from its previous parent first.
    ///
    /// # Panics
    /// - if `leaf` is this creator or one of its ancestors
    pub fn append(&self, leaf: &Creator) {
        self.adopt(leaf, None);
    }

    /// Inserts a leaf at `index` (clamped to the leaf count), removing it from its previous
    /// parent first.
    ///
    /// # Panics
    /// - if `leaf` is this creator or one of its ancestors
    pub fn insert(&self, leaf: &Creator, index: usize) {
        self.adopt(leaf, Some(index));
    }

    fn adopt(&self, leaf: &Creator, index: Option<usize>) {
        if self.ptr_eq(leaf) {
            panic!("Tree: {} {} cannot be its own leaf", self.kind().name(), self.id());
        }
        if self.has_ancestor(leaf) {
            panic!(
                "Tree: {} {} is an ancestor of {}",
                leaf.kind().name(),
                leaf.id(),
                self.id()
            );
        }

        if let Some(parent) = leaf.parent() {
            parent.remove(leaf);
        }
        {
            let mut tree = self.0.tree.lock();
            let len = tree.leaves.len();
            let index = index.map_or(len, |index| index.min(len));
            tree.leaves.insert(index, Leaf(leaf.downgrade().0));
        }
        leaf.0.tree.lock().parent = self.downgrade().0;
    }

    /// Removes a leaf.
    ///
    /// # Panics
    /// - if `leaf` is not a leaf of this creator
    pub fn remove(&self, leaf: &Creator) {
        {
            let mut tree = self.0.tree.lock();
            match tree.leaves.iter().position(|l| l.is(leaf)) {
                Some(index) => {
                    tree.leaves.remove(index);
                }
                None => panic!(
                    "Tree::remove: {} {} is not a leaf of {} {}",
                    leaf.kind().name(),
                    leaf.id(),
                    self.kind().name(),
                    self.id()
                ),
            }
        }
        leaf.0.tree.lock().parent = Weak::new();
    }

    /// Prints the creator hierarchy below this creator to stdout. For debugging.
    pub fn print_creator_trace(&self) {
        print!("{}", self.creator_trace());
    }

    /// The text printed by [`print_creator_trace`](Creator::print_creator_trace).
    pub fn creator_trace(&self) -> String {
        let mut out = String::new();
        self.write_trace(&mut out, 0);
        out
    }

    fn write_trace(&self, out: &mut String, depth: usize) {
        let ownership = match self.ownership_state() {
            OwnershipState::Unset => "unset",
            OwnershipState::Owned => "owned",
            OwnershipState::Attached => "attached",
        };
        let _ = write!(out, "{}{} [{}", "  ".repeat(depth), self.kind().name(), ownership);
        if let Some(state) = self.render_state() {
            let _ = write!(out, ", {:?}", state);
        }
        let _ = writeln!(out, "]");
        for leaf in self.leaves() {
            leaf.write_trace(out, depth + 1);
        }
    }
}
