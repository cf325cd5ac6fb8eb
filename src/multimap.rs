//! An in-memory multimap from integer keys to lists of integer values, based
//! on a B-Tree.
//!
//! Insertions make a single pass from the root down to a leaf. Any full node
//! on that path is split *before* it is entered, while its parent is known to
//! have room for the promoted median. A leaf reached this way always has room
//! for one more entry, so nothing is ever pushed back up the tree. The tree
//! only grows in height when the root itself is full: a new root is created
//! above it and the old root is split beneath it.
//!
//! ```text
//!                          [ ... M   Y ... ]
//!                                  |
//!                     [ N  O  P  Q  R  S ]        <- full child, B = 6
//!
//!   after splitting the child before descending:
//!
//!                        [ ... M  Q  Y ... ]
//!                                / \
//!                     [ N  O  P ]   [ R  S ]
//! ```
mod allocator;
mod iter;
mod node;
#[cfg(test)]
mod proptests;
mod validate;
mod values;

pub use allocator::AllocationStats;
pub use iter::{Iter, Keys};
pub use validate::InvariantError;
pub use values::VALUE_BLOCK;

use crate::types::{Key, Value};
use allocator::Allocator;
use iter::Entries;
use node::{KeyEntry, Node, NodeType};
use std::fmt;
use tracing::{debug, trace};

/// The maximum number of entries per node unless specified otherwise.
pub const DEFAULT_FANOUT: usize = 6;

/// An ordered multimap backed by a B-Tree whose nodes hold at most `B` entries.
///
/// Each key is stored once and owns every value inserted under it, in
/// insertion order. Duplicate values are kept.
///
/// # Examples
///
/// ```rust
/// use btree_multimap::MultiMap;
///
/// let mut map = MultiMap::new();
/// map.insert(5, 99);
/// map.insert(5, 100);
///
/// assert_eq!(map.get(5), Some(&[99, 100][..]));
/// assert_eq!(map.num_keys(), 1);
/// assert_eq!(map.len(), 2);
/// ```
pub struct MultiMap<const B: usize = DEFAULT_FANOUT> {
    root: Option<Box<Node<B>>>,
    allocator: Allocator,

    // The number of distinct keys.
    num_keys: u64,

    // The number of (key, value) pairs.
    length: u64,
}

impl MultiMap {
    /// Creates an empty multimap with [`DEFAULT_FANOUT`].
    pub fn new() -> Self {
        Self::with_fanout()
    }
}

impl<const B: usize> MultiMap<B> {
    const FANOUT_CHECK: () = assert!(B >= 2, "a B-Tree node needs a fanout of at least 2");

    /// Creates an empty multimap whose nodes hold at most `B` entries.
    pub fn with_fanout() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FANOUT_CHECK;

        Self {
            root: None,
            allocator: Allocator::new(),
            num_keys: 0,
            length: 0,
        }
    }

    /// Adds `value` to the values of `key`, creating the key if it's absent.
    pub fn insert(&mut self, key: Key, value: Value) {
        let grew = self.entry_mut(key).push_value(value);
        if grew {
            self.allocator.record_value_block();
        }
        self.length += 1;
    }

    /// Returns true if the key exists.
    pub fn contains_key(&self, key: Key) -> bool {
        self.find(key).is_some()
    }

    /// Returns true if `value` has been inserted under `key`.
    pub fn contains_pair(&self, key: Key, value: Value) -> bool {
        self.find(key)
            .is_some_and(|entry| entry.value_list().contains(value))
    }

    /// Returns the values of `key` in insertion order, if the key exists.
    pub fn get(&self, key: Key) -> Option<&[Value]> {
        self.find(key).map(KeyEntry::values)
    }

    /// Calls `visitor` once for every `(key, value)` pair.
    ///
    /// Keys are visited in ascending order and the values of a key in the
    /// order they were inserted.
    pub fn traverse<F>(&self, mut visitor: F)
    where
        F: FnMut(Key, Value),
    {
        if let Some(root) = self.root.as_deref() {
            Self::traverse_node(root, &mut visitor);
        }
    }

    /// Returns an iterator over the `(key, value)` pairs, in the same order as
    /// [`MultiMap::traverse`].
    pub fn iter(&self) -> Iter<'_, B> {
        Iter::new(self)
    }

    /// Returns an iterator over the distinct keys in ascending order.
    pub fn keys(&self) -> Keys<'_, B> {
        Keys::new(self)
    }

    /// Returns the number of `(key, value)` pairs in the map.
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Returns the number of distinct keys in the map.
    pub fn num_keys(&self) -> u64 {
        self.num_keys
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the smallest key in the map.
    pub fn first_key(&self) -> Option<Key> {
        self.root.as_deref().and_then(Self::first_key_in)
    }

    /// Returns the largest key in the map.
    pub fn last_key(&self) -> Option<Key> {
        self.root.as_deref().and_then(Self::last_key_in)
    }

    /// Returns the number of levels in the tree. An empty map has height 0.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut node = self.root.as_deref();
        while let Some(n) = node {
            height += 1;
            node = n.children().first().map(|child| &**child);
        }
        height
    }

    /// Returns the number of nodes and value blocks currently owned by the map.
    pub fn allocation_stats(&self) -> AllocationStats {
        self.allocator.stats()
    }

    /// Removes all elements from the map, freeing every node and value list.
    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            let before = self.allocator.stats();
            Self::destroy_subtree(&mut self.allocator, root);
            debug!(
                nodes = before.nodes,
                value_blocks = before.value_blocks,
                "freed multimap"
            );
        }
        self.num_keys = 0;
        self.length = 0;

        debug_assert_eq!(self.allocator.stats(), AllocationStats::default());
    }

    pub(crate) fn root(&self) -> Option<&Node<B>> {
        self.root.as_deref()
    }

    /// Looks up the entry of `key` without modifying the tree.
    fn find(&self, key: Key) -> Option<&KeyEntry> {
        let mut node = self.root.as_deref()?;
        loop {
            match node.search(key) {
                Ok(idx) => return Some(node.entry(idx)),
                Err(idx) => match node.node_type() {
                    // At a leaf: key not present.
                    NodeType::Leaf => return None,
                    // Continue search in child.
                    NodeType::Internal => node = node.child(idx),
                },
            }
        }
    }

    /// Returns the entry of `key`, creating it if it's absent.
    fn entry_mut(&mut self, key: Key) -> &mut KeyEntry {
        let root = match self.root.take() {
            // No root present. Allocate one.
            None => self.allocator.allocate_node(NodeType::Leaf),
            Some(root) if root.is_full() => {
                // The root is full. Allocate a new node that will be used as the new root.
                let mut new_root: Box<Node<B>> = self.allocator.allocate_node(NodeType::Internal);

                // The new root has the old root as its only child.
                new_root.push_child(root);

                // Split the old (full) root.
                Self::split_child(&mut self.allocator, &mut new_root, 0);
                debug!(nodes = self.allocator.stats().nodes, "grew a new root");

                new_root
            }
            Some(root) => root,
        };

        let root = self.root.insert(root);
        let (entry, created) = Self::locate_or_create(&mut self.allocator, root, key);
        if created {
            self.num_keys += 1;
        }
        entry
    }

    /// Finds the entry of `key` in the subtree of a node that is *not full*,
    /// creating it if it's absent.
    ///
    /// Returns the entry and whether it has just been created.
    fn locate_or_create<'a>(
        allocator: &mut Allocator,
        node: &'a mut Node<B>,
        key: Key,
    ) -> (&'a mut KeyEntry, bool) {
        let idx = match node.search(key) {
            // The key is already in the node.
            Ok(idx) => return (node.entry_mut(idx), false),
            // `idx` is where the key belongs, or the child that holds it.
            Err(idx) => idx,
        };

        match node.node_type() {
            NodeType::Leaf => {
                // The node is a non-full leaf.
                // Insert an entry without values at the proper location.
                node.insert_entry(idx, KeyEntry::new(key));
                (node.entry_mut(idx), true)
            }
            NodeType::Internal => {
                if node.child(idx).is_full() {
                    Self::split_child(allocator, node, idx);

                    // The median moved into this node and may be the key we
                    // are looking for, or the key now belongs in the new
                    // sibling. Search this node again.
                    return Self::locate_or_create(allocator, node, key);
                }

                Self::locate_or_create(allocator, node.child_mut(idx), key)
            }
        }
    }

    /// Splits the full child at `full_child_idx` of the non-full `node` in two.
    ///
    /// The child's entry at `len / 2` moves up into `node` at `full_child_idx`
    /// and the entries after it move into a new sibling, installed as the
    /// child right after the promoted entry. With a fanout of 4:
    ///
    /// ```text
    ///          [ 10  50 ]                      [ 10  30  50 ]
    ///              |               =>                / \
    ///     [ 20  25  30  40 ]              [ 20  25 ]   [ 40 ]
    /// ```
    fn split_child(allocator: &mut Allocator, node: &mut Node<B>, full_child_idx: usize) {
        // The node must not be full.
        assert!(
            !node.is_full(),
            "cannot split a child into a full parent ({} entries)",
            node.entries_len()
        );

        // The node's child must be full.
        let full_child = node.child_mut(full_child_idx);
        assert!(
            full_child.is_full(),
            "cannot split a child holding {} entries (capacity {})",
            full_child.entries_len(),
            B
        );

        // Create a sibling to this full child (which has to be the same type).
        let mut sibling: Box<Node<B>> = allocator.allocate_node(full_child.node_type());
        let median = full_child.split(&mut sibling);
        trace!(
            median = median.key(),
            position = full_child_idx,
            "split full child"
        );

        // Add sibling as a new child in the node, to the right of the median.
        node.insert_child(full_child_idx + 1, sibling);
        node.insert_entry(full_child_idx, median);
    }

    // Visits the child before each entry, the entry, and finally the last child.
    fn traverse_node<F>(node: &Node<B>, visitor: &mut F)
    where
        F: FnMut(Key, Value),
    {
        for (idx, entry) in node.entries().iter().enumerate() {
            if node.node_type() == NodeType::Internal {
                Self::traverse_node(node.child(idx), visitor);
            }
            for value in entry.values() {
                visitor(entry.key(), *value);
            }
        }

        // One more subtree at the far right of the node.
        if node.node_type() == NodeType::Internal {
            Self::traverse_node(node.child(node.entries_len()), visitor);
        }
    }

    // Frees a subtree in the same left to right order as the traversal.
    fn destroy_subtree(allocator: &mut Allocator, mut node: Box<Node<B>>) {
        let (entries, children) = node.take_contents();
        let mut children = children.into_iter();

        for entry in entries {
            if let Some(child) = children.next() {
                Self::destroy_subtree(allocator, child);
            }
            allocator.release_value_blocks(entry.into_values().blocks());
        }
        if let Some(last) = children.next() {
            Self::destroy_subtree(allocator, last);
        }
        debug_assert!(children.next().is_none());

        allocator.deallocate_node(node);
    }

    fn first_key_in(node: &Node<B>) -> Option<Key> {
        // A node split with a fanout of 2 may leave an empty sibling behind,
        // so fall back to the node's own entries when a subtree has no keys.
        node.children()
            .first()
            .and_then(|child| Self::first_key_in(child))
            .or_else(|| node.entries().first().map(KeyEntry::key))
    }

    fn last_key_in(node: &Node<B>) -> Option<Key> {
        node.children()
            .last()
            .and_then(|child| Self::last_key_in(child))
            .or_else(|| node.entries().last().map(KeyEntry::key))
    }
}

impl<const B: usize> Default for MultiMap<B> {
    fn default() -> Self {
        Self::with_fanout()
    }
}

impl<const B: usize> Drop for MultiMap<B> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<const B: usize> fmt::Debug for MultiMap<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(Entries::new(self).map(|entry| (entry.key(), entry.values())))
            .finish()
    }
}

impl<const B: usize> Extend<(Key, Value)> for MultiMap<B> {
    fn extend<I: IntoIterator<Item = (Key, Value)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<const B: usize> FromIterator<(Key, Value)> for MultiMap<B> {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        let mut map = Self::with_fanout();
        map.extend(iter);
        map
    }
}

impl<'a, const B: usize> IntoIterator for &'a MultiMap<B> {
    type Item = (Key, Value);
    type IntoIter = Iter<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
