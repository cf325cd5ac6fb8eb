#![doc = include_str!("../README.md")]
pub mod multimap;
mod types;

pub use multimap::{
    AllocationStats, InvariantError, Iter, Keys, MultiMap, DEFAULT_FANOUT, VALUE_BLOCK,
};
pub use types::{Key, Value};
