use super::{
    node::{KeyEntry, Node, NodeType},
    MultiMap,
};
use crate::types::{Key, Value};
use std::iter::FusedIterator;

/// A position inside a node: the next child or entry to visit.
struct Cursor<'a, const B: usize> {
    node: &'a Node<B>,
    next: Index,
}

/// An index into a node's child or entry.
enum Index {
    Child(usize),
    Entry(usize),
}

impl<'a, const B: usize> Cursor<'a, B> {
    fn start(node: &'a Node<B>) -> Self {
        Self {
            node,
            next: match node.node_type() {
                // Iterate on internal nodes starting from the first child.
                NodeType::Internal => Index::Child(0),
                // Iterate on leaf nodes starting from the first entry.
                NodeType::Leaf => Index::Entry(0),
            },
        }
    }
}

/// Walks the key entries of a tree in ascending key order.
pub(crate) struct Entries<'a, const B: usize> {
    // A stack of cursors indicating the current position in the tree.
    cursors: Vec<Cursor<'a, B>>,
}

impl<'a, const B: usize> Entries<'a, B> {
    pub(crate) fn new(map: &'a MultiMap<B>) -> Self {
        Self {
            cursors: map.root().map(Cursor::start).into_iter().collect(),
        }
    }
}

impl<'a, const B: usize> Iterator for Entries<'a, B> {
    type Item = &'a KeyEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Cursor { node, next } = self.cursors.pop()?;
            match next {
                Index::Child(child_idx) => {
                    // After iterating on the child, iterate on the next _entry_ in this node.
                    // The entry immediately after the child has the same index as the child's.
                    self.cursors.push(Cursor {
                        node,
                        next: Index::Entry(child_idx),
                    });

                    // Add the child to the top of the cursors to be iterated on first.
                    self.cursors.push(Cursor::start(node.child(child_idx)));
                }
                Index::Entry(entry_idx) => {
                    if entry_idx >= node.entries_len() {
                        // No more entries to iterate on in this node.
                        continue;
                    }

                    self.cursors.push(Cursor {
                        node,
                        next: match node.node_type() {
                            NodeType::Internal => Index::Child(entry_idx + 1),
                            NodeType::Leaf => Index::Entry(entry_idx + 1),
                        },
                    });

                    return Some(node.entry(entry_idx));
                }
            }
        }
    }
}

/// An iterator over the `(key, value)` pairs of a [`MultiMap`].
///
/// Pairs come in ascending key order; the values of a key come in the order
/// they were inserted.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, const B: usize> {
    entries: Entries<'a, B>,
    // The key whose values are being yielded, along with the values left.
    current: Option<(Key, std::slice::Iter<'a, Value>)>,
    remaining: usize,
}

impl<'a, const B: usize> Iter<'a, B> {
    pub(crate) fn new(map: &'a MultiMap<B>) -> Self {
        Self {
            entries: Entries::new(map),
            current: None,
            remaining: map.len() as usize,
        }
    }
}

impl<const B: usize> Iterator for Iter<'_, B> {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, values)) = self.current.as_mut() {
                if let Some(value) = values.next() {
                    self.remaining -= 1;
                    return Some((*key, *value));
                }
            }

            let entry = self.entries.next()?;
            self.current = Some((entry.key(), entry.values().iter()));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const B: usize> ExactSizeIterator for Iter<'_, B> {}

impl<const B: usize> FusedIterator for Iter<'_, B> {}

/// An iterator over the distinct keys of a [`MultiMap`], in ascending order.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, const B: usize> {
    entries: Entries<'a, B>,
}

impl<'a, const B: usize> Keys<'a, B> {
    pub(crate) fn new(map: &'a MultiMap<B>) -> Self {
        Self {
            entries: Entries::new(map),
        }
    }
}

impl<const B: usize> Iterator for Keys<'_, B> {
    type Item = Key;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(KeyEntry::key)
    }
}

impl<const B: usize> FusedIterator for Keys<'_, B> {}
