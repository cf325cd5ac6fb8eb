use super::values::ValueList;
use crate::types::{Key, Value};


#[derive(Debug, PartialEq, Copy, Clone, Eq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum NodeType {
    Leaf,
    Internal,
}

/// A key together with every value inserted under it.
#[derive(Debug)]
pub struct KeyEntry {
    key: Key,
    values: ValueList,
}

impl KeyEntry {
    /// Creates an entry for `key` without any values.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            values: ValueList::new(),
        }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn values(&self) -> &[Value] {
        self.values.as_slice()
    }

    pub fn value_list(&self) -> &ValueList {
        &self.values
    }

    /// Appends a value, returning true if the value list reserved a new block.
    pub fn push_value(&mut self, value: Value) -> bool {
        self.values.push(value)
    }

    pub fn into_values(self) -> ValueList {
        self.values
    }
}

/// A node of a B-Tree holding at most `B` entries.
///
/// Entries are sorted strictly ascending by key. An internal node has exactly
/// one more child than it has entries: for the entry at position I,
/// children[I] holds the keys smaller than it and children[I + 1] the keys
/// larger than it.
#[derive(Debug)]
pub struct Node<const B: usize> {
    node_type: NodeType,
    entries: Vec<KeyEntry>,
    children: Vec<Box<Node<B>>>,
}

impl<const B: usize> Node<B> {
    /// Creates an empty node. Use [`Allocator::allocate_node`](super::allocator::Allocator::allocate_node)
    /// for nodes that become part of a tree.
    pub fn new(node_type: NodeType) -> Self {
        let children = match node_type {
            NodeType::Leaf => Vec::new(),
            NodeType::Internal => Vec::with_capacity(B + 1),
        };
        Self {
            node_type,
            entries: Vec::with_capacity(B),
            children,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns true if the node cannot store anymore entries, false otherwise.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= B
    }

    /// Returns the number of entries in the node.
    pub fn entries_len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    pub fn entry(&self, idx: usize) -> &KeyEntry {
        &self.entries[idx]
    }

    pub fn entry_mut(&mut self, idx: usize) -> &mut KeyEntry {
        &mut self.entries[idx]
    }

    /// Returns the smallest index whose key is greater than or equal to `key`,
    /// or the number of entries if every key is smaller.
    ///
    /// This is both the position where `key` belongs among the entries and
    /// the index of the child to descend into when looking for it.
    pub fn locate(&self, key: Key) -> usize {
        self.entries.partition_point(|entry| entry.key < key)
    }

    /// Searches for the key in the node's entries.
    ///
    /// If the key is found then `Result::Ok` is returned, containing the index
    /// of the matching entry. Otherwise `Result::Err` is returned, containing
    /// the index where the key could be inserted while maintaining sorted order.
    pub fn search(&self, key: Key) -> Result<usize, usize> {
        let idx = self.locate(key);
        match self.entries.get(idx) {
            Some(entry) if entry.key == key => Ok(idx),
            _ => Err(idx),
        }
    }

    /// Inserts a new entry at the specified index.
    pub fn insert_entry(&mut self, idx: usize, entry: KeyEntry) {
        assert!(
            !self.is_full(),
            "cannot insert key {} into a node holding {} entries (capacity {})",
            entry.key,
            self.entries.len(),
            B
        );
        self.entries.insert(idx, entry);
    }

    pub fn children(&self) -> &[Box<Node<B>>] {
        &self.children
    }

    pub fn children_len(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, idx: usize) -> &Node<B> {
        &self.children[idx]
    }

    pub fn child_mut(&mut self, idx: usize) -> &mut Node<B> {
        &mut self.children[idx]
    }

    /// Inserts the given child at the given index.
    pub fn insert_child(&mut self, idx: usize, child: Box<Node<B>>) {
        debug_assert_eq!(self.node_type, NodeType::Internal);
        self.children.insert(idx, child)
    }

    /// Pushes the child to the far right of the node.
    pub fn push_child(&mut self, child: Box<Node<B>>) {
        debug_assert_eq!(self.node_type, NodeType::Internal);
        self.children.push(child)
    }

    /// Moves the entries above the median into `sibling` and returns the median.
    ///
    /// With `mid = len / 2`, the node keeps the entries before `mid`, the
    /// sibling receives the entries after it and, for internal nodes, the
    /// children to their left and right.
    ///
    /// PRECONDITION:
    ///   * `self` is full.
    ///   * `sibling` is empty and has the same node type as `self`.
    pub fn split(&mut self, sibling: &mut Node<B>) -> KeyEntry {
        assert!(self.is_full(), "only a full node can be split");
        assert_eq!(self.node_type, sibling.node_type);
        assert!(sibling.entries.is_empty() && sibling.children.is_empty());

        let mid = self.entries.len() / 2;
        sibling.entries = self.entries.split_off(mid + 1);
        if self.node_type == NodeType::Internal {
            sibling.children = self.children.split_off(mid + 1);
        }

        self.entries
            .pop()
            .expect("A full node holds at least two entries")
    }

    /// Moves all the entries and children out of the node, leaving it empty.
    pub fn take_contents(&mut self) -> (Vec<KeyEntry>, Vec<Box<Node<B>>>) {
        (
            std::mem::take(&mut self.entries),
            std::mem::take(&mut self.children),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.children.is_empty()
    }
}
