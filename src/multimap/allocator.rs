use super::node::{Node, NodeType};

/// Counts of the live allocations owned by a multimap.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct AllocationStats {
    /// The number of nodes in the tree.
    pub nodes: u64,
    /// The number of value blocks reserved by all the value lists.
    pub value_blocks: u64,
}

/// Hands out the nodes of a tree and keeps count of what is outstanding.
///
/// Every node allocated here must be returned through
/// [`Allocator::deallocate_node`], and every value block recorded must be
/// released, so that a torn down tree leaves both counters at zero.
#[derive(Debug, Default)]
pub struct Allocator {
    stats: AllocationStats,
}

impl Allocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an empty node of the given type.
    pub fn allocate_node<const B: usize>(&mut self, node_type: NodeType) -> Box<Node<B>> {
        self.stats.nodes += 1;
        Box::new(Node::new(node_type))
    }

    /// Frees a node whose entries and children have already been moved out.
    pub fn deallocate_node<const B: usize>(&mut self, node: Box<Node<B>>) {
        assert!(node.is_empty(), "cannot deallocate a node that still owns data");
        assert!(self.stats.nodes > 0, "deallocating more nodes than were allocated");
        self.stats.nodes -= 1;
    }

    /// Records that a value list reserved one more block.
    pub fn record_value_block(&mut self) {
        self.stats.value_blocks += 1;
    }

    /// Records that a value list holding `blocks` blocks has been freed.
    pub fn release_value_blocks(&mut self, blocks: usize) {
        let blocks = blocks as u64;
        assert!(
            self.stats.value_blocks >= blocks,
            "releasing {} value blocks while only {} are reserved",
            blocks,
            self.stats.value_blocks
        );
        self.stats.value_blocks -= blocks;
    }

    pub fn stats(&self) -> AllocationStats {
        self.stats
    }
}
