//! Checks that dropping or clearing a multimap frees every allocation it made.
//!
//! The allocator counts bytes for the whole process, so every check lives in
//! the single test of this binary and no other test thread can move the count.
use btree_multimap::{AllocationStats, MultiMap};
use cap::Cap;
use std::alloc::System;

#[global_allocator]
static ALLOCATOR: Cap<System> = Cap::new(System, usize::MAX);

fn fill<const B: usize>(map: &mut MultiMap<B>, pairs: i32) {
    for i in 0..pairs {
        map.insert((i * 7_919) % 1_013, i);
    }
}

fn assert_drop_frees_everything<const B: usize>() {
    let before = ALLOCATOR.allocated();
    let mut map = MultiMap::<B>::with_fanout();
    fill(&mut map, 5_000);

    assert!(map.allocation_stats().nodes > 1);
    assert!(ALLOCATOR.allocated() > before);

    drop(map);
    assert_eq!(ALLOCATOR.allocated(), before, "fanout {}", B);
}

fn assert_clear_frees_everything() {
    let mut map = MultiMap::new();
    let before = ALLOCATOR.allocated();

    fill(&mut map, 2_000);
    assert!(ALLOCATOR.allocated() > before);

    map.clear();
    assert_eq!(map.allocation_stats(), AllocationStats::default());
    assert_eq!(ALLOCATOR.allocated(), before);

    // The cleared map is reusable and frees its new contents too.
    fill(&mut map, 500);
    map.clear();
    assert_eq!(ALLOCATOR.allocated(), before);
}

fn assert_empty_drop_is_a_no_op() {
    let before = ALLOCATOR.allocated();
    let map = MultiMap::new();
    assert!(map.is_empty());
    drop(map);
    assert_eq!(ALLOCATOR.allocated(), before);
}

#[test]
fn teardown_frees_every_node_and_value_list() {
    // Warm up so that one-off lazy initialisation is not mistaken for a leak.
    let mut map = MultiMap::<3>::with_fanout();
    fill(&mut map, 100);
    map.clear();
    drop(map);

    assert_drop_frees_everything::<2>();
    assert_drop_frees_everything::<3>();
    assert_drop_frees_everything::<6>();
    assert_drop_frees_everything::<32>();
    assert_clear_frees_everything();
    assert_empty_drop_is_a_no_op();
}
