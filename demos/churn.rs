use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use clap::Parser;
use probe_hash::hash_table::FnOps;
use probe_hash::hash_table::HashTable;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 's', long = "slots", default_value_t = 1024)]
    slots: usize,

    #[arg(short = 'r', long = "rounds", default_value_t = 10000)]
    rounds: u64,
}

fn hash_u64(value: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn main() {
    let args = Args::parse();

    println!("Creating table with {} slots", args.slots);
    let ops: FnOps<fn(&u64, &u64) -> bool, fn(&u64) -> u64> =
        FnOps::new(|a, b| a == b, |key| hash_u64(*key));
    let mut table = HashTable::with_capacity(args.slots, ops);
    println!("Actual capacity: {} slots", table.capacity());

    // Fill to the standing maximum: half of the slots.
    let fill = (table.capacity() / 2) as u64;
    println!("Inserting {fill} entries...");
    for key in 0..fill {
        table.insert(key, key * 2);
    }
    println!(
        "Occupancy: {}/{} slots ({:.1}%)",
        table.len(),
        table.capacity(),
        100.0 * table.len() as f64 / table.capacity() as f64
    );

    println!("Churning {} remove/insert rounds...", args.rounds);
    let mut next = fill;
    let mut missing = 0u64;
    for round in 0..args.rounds {
        let victim = round.wrapping_mul(2654435761) % next;
        if table.remove(&victim).is_none() {
            missing += 1;
        }
        table.insert(next, next * 2);
        next += 1;
    }
    println!("Rounds with an already-removed victim: {missing}");

    let mut checksum = 0u64;
    table.for_each(|key, value| checksum = checksum.wrapping_add(key ^ value));
    println!(
        "Final: {} entries in {} slots, checksum {checksum:#018X}",
        table.len(),
        table.capacity()
    );
}
