use crate::{
    multimap::{AllocationStats, MultiMap},
    types::{Key, Value},
};
use proptest::collection::vec as pvec;
use proptest::prelude::*;
use std::collections::BTreeMap as StdBTreeMap;
use test_strategy::proptest;

#[derive(Debug, Clone)]
enum Operation {
    Insert { key: Key, value: Value },
    ContainsKey(Key),
    ContainsPair { key: Key, value: Value },
    Get(Key),
    Iter { from: usize, len: usize },
    Validate,
}

// A custom strategy that gives unequal weights to the different operations.
// Keys and values are drawn from small ranges so that keys collect several
// values and lookups hit existing pairs often.
fn op_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        5 => (-200..200i32, -5..5i32).prop_map(|(key, value)| Operation::Insert { key, value }),
        2 => (-210..210i32).prop_map(Operation::ContainsKey),
        2 => (-210..210i32, -6..6i32)
            .prop_map(|(key, value)| Operation::ContainsPair { key, value }),
        1 => (-210..210i32).prop_map(Operation::Get),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(from, len)| Operation::Iter { from, len }),
        1 => Just(Operation::Validate),
    ]
}

// Runs the operations against a multimap of fanout `B` and validates every
// result against a standard BTreeMap of value vectors.
fn run_operations<const B: usize>(ops: &[Operation]) {
    let mut map = MultiMap::<B>::with_fanout();
    let mut std_map = StdBTreeMap::new();

    for op in ops {
        execute_operation(&mut std_map, &mut map, op.clone());
    }

    assert_eq!(map.validate(), Ok(()));
    map.clear();
    assert_eq!(map.allocation_stats(), AllocationStats::default());
}

// Runs a comprehensive test for the major multimap operations.
#[proptest(cases = 10)]
fn comprehensive(#[strategy(pvec(op_strategy(), 100..3_000))] ops: Vec<Operation>) {
    run_operations::<2>(&ops);
    run_operations::<3>(&ops);
    run_operations::<4>(&ops);
    run_operations::<6>(&ops);
    run_operations::<17>(&ops);
}

// A comprehensive fuzz test that runs until it's explicitly terminated. To run:
//
// ```
// cargo t comprehensive_fuzz -- --ignored --nocapture 2> comprehensive_fuzz.log
// ```
//
// comprehensive_fuzz.log contains all the operations to help triage a failure.
#[test]
#[ignore]
fn comprehensive_fuzz() {
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;
    let mut runner = TestRunner::default();

    let mut map = MultiMap::<3>::with_fanout();
    let mut std_map = StdBTreeMap::new();

    let mut i = 0;

    loop {
        let op = op_strategy().new_tree(&mut runner).unwrap().current();
        eprintln!("{op:?}");
        execute_operation(&mut std_map, &mut map, op);
        i += 1;
        if i % 1000 == 0 {
            println!("=== Step {i} ===");
            println!("=== Pairs: {}, height: {}", map.len(), map.height());
        }
    }
}

#[proptest]
fn insertions_keep_invariants(
    #[strategy(pvec((any::<Key>(), any::<Value>()), 0..300))] pairs: Vec<(Key, Value)>,
) {
    fn check<const B: usize>(pairs: &[(Key, Value)]) {
        let mut map = MultiMap::<B>::with_fanout();
        for (key, value) in pairs {
            map.insert(*key, *value);
            assert_eq!(map.validate(), Ok(()));
        }
        assert_eq!(map.len(), pairs.len() as u64);
    }

    check::<2>(&pairs);
    check::<5>(&pairs);
    check::<8>(&pairs);
}

#[proptest]
fn traversal_is_grouped_by_ascending_key(
    #[strategy(pvec((-50..50i32, any::<Value>()), 0..500))] pairs: Vec<(Key, Value)>,
) {
    let map: MultiMap<3> = pairs.iter().copied().collect();

    let mut expected: StdBTreeMap<Key, Vec<Value>> = StdBTreeMap::new();
    for (key, value) in &pairs {
        expected.entry(*key).or_default().push(*value);
    }
    let expected: Vec<(Key, Value)> = expected
        .into_iter()
        .flat_map(|(key, values)| values.into_iter().map(move |value| (key, value)))
        .collect();

    let mut traversed = vec![];
    map.traverse(|key, value| traversed.push((key, value)));

    assert_eq!(traversed, expected);
    assert_eq!(map.iter().collect::<Vec<_>>(), expected);
}

#[proptest]
fn min_max(#[strategy(pvec(any::<Key>(), 1..100))] keys: Vec<Key>) {
    let mut map = MultiMap::<2>::with_fanout();
    assert_eq!(map.first_key(), None);
    assert_eq!(map.last_key(), None);

    for (n, key) in keys.iter().enumerate() {
        map.insert(*key, 0);

        let min = keys[0..=n].iter().min().copied();
        let max = keys[0..=n].iter().max().copied();
        assert_eq!(map.first_key(), min);
        assert_eq!(map.last_key(), max);
    }
}

fn execute_operation<const B: usize>(
    std_map: &mut StdBTreeMap<Key, Vec<Value>>,
    map: &mut MultiMap<B>,
    op: Operation,
) {
    match op {
        Operation::Insert { key, value } => {
            std_map.entry(key).or_default().push(value);
            map.insert(key, value);
            assert_eq!(std_map.len() as u64, map.num_keys());
        }
        Operation::ContainsKey(key) => {
            assert_eq!(map.contains_key(key), std_map.contains_key(&key));
        }
        Operation::ContainsPair { key, value } => {
            let expected = std_map
                .get(&key)
                .is_some_and(|values| values.contains(&value));
            assert_eq!(map.contains_pair(key, value), expected);
        }
        Operation::Get(key) => {
            assert_eq!(map.get(key), std_map.get(&key).map(Vec::as_slice));
        }
        Operation::Iter { from, len } => {
            let total = map.len() as usize;
            if total == 0 {
                assert_eq!(map.iter().next(), None);
                return;
            }

            let from = from % total;
            let len = len % total;

            let std_iter = std_map
                .iter()
                .flat_map(|(key, values)| values.iter().map(move |value| (*key, *value)))
                .skip(from)
                .take(len);
            let iter = map.iter().skip(from).take(len);
            assert!(std_iter.eq(iter));
        }
        Operation::Validate => {
            assert_eq!(map.validate(), Ok(()));
        }
    };
}
