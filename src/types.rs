/// The key of a multimap entry.
pub type Key = i32;

/// A value stored under a key.
pub type Value = i32;
