use std::collections::HashMap as StdHashMap;

use proptest::prelude::*;

use crate::hash_table::FnOps;
use crate::hash_table::HashTable;

type TestOps = FnOps<fn(&u16, &u16) -> bool, fn(&u16) -> u64>;

/// Well-distributed hash: odd-constant multiply over the full 64 bits.
fn mixing_ops() -> TestOps {
    FnOps::new(
        |a, b| a == b,
        |key| u64::from(*key).wrapping_mul(0x9E3779B97F4A7C15),
    )
}

/// Deliberately terrible hash: every key lands in one of eight home slots,
/// forcing long probe runs, wraparound placement, and non-trivial gap
/// repair on almost every removal.
fn clustered_ops() -> TestOps {
    FnOps::new(|a, b| a == b, |key| u64::from(*key) & 7)
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    Remove(u16),
    Get(u16),
    Clear,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    // A small key space makes overwrites, re-inserts after removal, and
    // collisions common within a single sequence.
    let key = 0u16..256;
    let op = prop_oneof![
        45 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        30 => key.clone().prop_map(Op::Remove),
        24 => key.prop_map(Op::Get),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=800)
}

fn run_against_model(ops: Vec<Op>, table_ops: TestOps) {
    let mut table: HashTable<u16, u32, TestOps> = HashTable::with_capacity(4, table_ops);
    let mut model: StdHashMap<u16, u32> = StdHashMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                let old_t = table.insert(key, value);
                let old_m = model.insert(key, value);
                assert_eq!(old_t, old_m, "insert({key}) returned a different previous value");
            }
            Op::Remove(key) => {
                let old_t = table.remove(&key);
                let old_m = model.remove(&key);
                assert_eq!(old_t, old_m, "remove({key}) disagreed with the model");
                table.check_invariants();
            }
            Op::Get(key) => {
                assert_eq!(table.get(&key), model.get(&key), "get({key}) disagreed");
            }
            Op::Clear => {
                table.clear();
                model.clear();
            }
        }
        assert_eq!(table.len(), model.len());
    }

    table.check_invariants();
    let mut visited = 0usize;
    table.for_each(|key, value| {
        visited += 1;
        assert_eq!(model.get(key), Some(value), "for_each produced a stale entry");
    });
    assert_eq!(visited, model.len(), "for_each missed or duplicated entries");
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_mixing_hash(ops in ops_strategy()) {
        run_against_model(ops, mixing_ops());
    }

    #[test]
    fn prop_equivalence_clustered_hash(ops in ops_strategy()) {
        run_against_model(ops, clustered_ops());
    }

    #[test]
    fn prop_insert_all_then_remove_all(
        mut keys in prop::collection::hash_set(any::<u16>(), 1..200),
        removal_seed in any::<u64>(),
    ) {
        let keys: Vec<u16> = keys.drain().collect();
        let mut table = HashTable::with_capacity(4, clustered_ops());
        for &k in &keys {
            table.insert(k, u32::from(k));
        }
        prop_assert_eq!(table.len(), keys.len());
        prop_assert!(table.len() * 2 <= table.capacity());

        // Remove in an arbitrary order derived from the seed.
        let mut ranked: Vec<(u64, u16)> = keys
            .iter()
            .map(|&k| {
                let rank = (removal_seed ^ u64::from(k))
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (rank, k)
            })
            .collect();
        ranked.sort_unstable();
        let order: Vec<u16> = ranked.into_iter().map(|(_, k)| k).collect();

        for &k in &order {
            prop_assert_eq!(table.remove(&k), Some(u32::from(k)));
            table.check_invariants();
        }
        prop_assert_eq!(table.len(), 0);
        for &k in &keys {
            prop_assert!(table.get(&k).is_none());
        }
    }

    #[test]
    fn prop_churn_at_standing_load(rounds in prop::collection::vec(any::<u16>(), 0..400)) {
        // Hold the table at its maximum standing load (half of capacity,
        // which never triggers another grow) and churn removals through it
        // with a clustering hash, so gap repair runs against the longest
        // probe chains the table can legally contain.
        let mut table = HashTable::with_capacity(32, clustered_ops());
        for k in 0..16u16 {
            table.insert(k, 0);
        }
        prop_assert_eq!(table.capacity(), 32);

        let mut resident: Vec<u16> = (0..16).collect();
        for (round, key) in rounds.into_iter().enumerate() {
            let slot = usize::from(key) % resident.len();
            let evicted = resident[slot];
            prop_assert!(table.remove(&evicted).is_some());
            table.check_invariants();

            // Replacement keys are fresh each round, so occupancy holds at
            // exactly half of capacity for the whole run.
            let replacement = 16 + round as u16;
            table.insert(replacement, round as u32);
            resident[slot] = replacement;
            table.check_invariants();
            prop_assert_eq!(table.capacity(), 32, "churn must not trigger growth");
        }
    }
}
