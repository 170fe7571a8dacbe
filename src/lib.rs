#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A HashMap implementation for keys that implement `Hash + Eq`.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with configurable hashers.
pub mod hash_map;

pub mod hash_table;

pub use hash_map::DefaultHashBuilder;
pub use hash_map::HashMap;
pub use hash_table::AllocError;
pub use hash_table::FnOps;
pub use hash_table::HashTable;
pub use hash_table::KeyOps;

#[cfg(all(test, feature = "std"))]
mod proptests;
