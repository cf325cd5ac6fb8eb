use super::{
    node::{Node, NodeType},
    MultiMap,
};
use crate::types::Key;
use std::error;
use std::fmt::{Display, Formatter};

/// A structural invariant of the tree that does not hold.
#[derive(Debug, PartialEq, Eq)]
pub enum InvariantError {
    /// A key is out of order with respect to its neighbours or ancestors.
    Unordered { key: Key },
    /// A node holds more entries than the fanout allows.
    Overfull { entries: usize, fanout: usize },
    /// A node has the wrong number of children for its entries.
    ChildCount { expected: usize, actual: usize },
    /// Two leaves sit at different depths.
    Unbalanced { expected: usize, actual: usize },
    /// The root exists but holds no entries.
    EmptyRoot,
    /// A key is present without any value.
    EmptyValues { key: Key },
    /// The recorded number of keys or pairs disagrees with the tree's contents.
    CountMismatch {
        what: &'static str,
        recorded: u64,
        actual: u64,
    },
}

impl Display for InvariantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unordered { key } => write!(f, "key {key} is out of order"),
            Self::Overfull { entries, fanout } => {
                write!(f, "node holds {entries} entries but the fanout is {fanout}")
            }
            Self::ChildCount { expected, actual } => {
                write!(f, "node has {actual} children, expected {expected}")
            }
            Self::Unbalanced { expected, actual } => {
                write!(f, "leaf at depth {actual}, expected depth {expected}")
            }
            Self::EmptyRoot => write!(f, "the root holds no entries"),
            Self::EmptyValues { key } => write!(f, "key {key} has no values"),
            Self::CountMismatch {
                what,
                recorded,
                actual,
            } => write!(f, "recorded {recorded} {what} but the tree holds {actual}"),
        }
    }
}

impl error::Error for InvariantError {}

#[derive(Default)]
struct Walk {
    leaf_depth: Option<usize>,
    keys: u64,
    pairs: u64,
}

impl<const B: usize> MultiMap<B> {
    /// Checks the structural invariants of the tree.
    ///
    /// Verifies that keys ascend strictly across the whole tree, that no node
    /// exceeds the fanout, that internal nodes have one more child than
    /// entries and leaves none, that every leaf sits at the same depth, and
    /// that the recorded lengths match the contents. Returns the first
    /// violation found.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let mut walk = Walk::default();
        if let Some(root) = self.root() {
            if root.entries_len() == 0 {
                return Err(InvariantError::EmptyRoot);
            }
            check_node(root, 0, None, None, &mut walk)?;
        }

        if walk.keys != self.num_keys() {
            return Err(InvariantError::CountMismatch {
                what: "keys",
                recorded: self.num_keys(),
                actual: walk.keys,
            });
        }
        if walk.pairs != self.len() {
            return Err(InvariantError::CountMismatch {
                what: "pairs",
                recorded: self.len(),
                actual: walk.pairs,
            });
        }
        Ok(())
    }
}

// Keys in `node` must lie strictly between `lower` and `upper` when present.
fn check_node<const B: usize>(
    node: &Node<B>,
    depth: usize,
    lower: Option<Key>,
    upper: Option<Key>,
    walk: &mut Walk,
) -> Result<(), InvariantError> {
    if node.entries_len() > B {
        return Err(InvariantError::Overfull {
            entries: node.entries_len(),
            fanout: B,
        });
    }

    let mut previous = lower;
    for entry in node.entries() {
        let key = entry.key();
        if previous.is_some_and(|p| p >= key) || upper.is_some_and(|u| key >= u) {
            return Err(InvariantError::Unordered { key });
        }
        if entry.value_list().is_empty() {
            return Err(InvariantError::EmptyValues { key });
        }
        previous = Some(key);
        walk.keys += 1;
        walk.pairs += entry.value_list().len() as u64;
    }

    match node.node_type() {
        NodeType::Leaf => {
            if node.children_len() != 0 {
                return Err(InvariantError::ChildCount {
                    expected: 0,
                    actual: node.children_len(),
                });
            }
            match walk.leaf_depth {
                None => walk.leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(InvariantError::Unbalanced {
                        expected,
                        actual: depth,
                    })
                }
                Some(_) => {}
            }
        }
        NodeType::Internal => {
            if node.children_len() != node.entries_len() + 1 {
                return Err(InvariantError::ChildCount {
                    expected: node.entries_len() + 1,
                    actual: node.children_len(),
                });
            }
            for (idx, child) in node.children().iter().enumerate() {
                // The child at `idx` sits between the entries at `idx - 1` and `idx`.
                let child_lower = match idx {
                    0 => lower,
                    _ => Some(node.entry(idx - 1).key()),
                };
                let child_upper = node.entries().get(idx).map(|e| e.key()).or(upper);
                check_node(child.as_ref(), depth + 1, child_lower, child_upper, walk)?;
            }
        }
    }
    Ok(())
}
