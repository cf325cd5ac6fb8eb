use crate::types::Value;

/// The number of values a value list reserves at a time.
///
/// Sixteen 4-byte values fill a 64-byte cache line.
pub const VALUE_BLOCK: usize = 16;

/// The values stored under a single key, in insertion order.
///
/// The backing buffer grows one block of [`VALUE_BLOCK`] values at a time, so
/// the reserved capacity is always the smallest multiple of the block size
/// that holds every value.
#[derive(Debug, Default)]
pub struct ValueList {
    values: Vec<Value>,
    // The number of blocks reserved so far.
    blocks: usize,
}

impl ValueList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to the end of the list.
    ///
    /// Returns true if a new block had to be reserved to make room for it.
    pub fn push(&mut self, value: Value) -> bool {
        let grew = self.values.len() == self.reserved();
        if grew {
            self.values.reserve_exact(VALUE_BLOCK);
            self.blocks += 1;
        }

        // There is always room for the value at this point.
        debug_assert!(self.values.len() < self.reserved());
        self.values.push(value);
        grew
    }

    /// Returns true if `value` has been pushed into the list at least once.
    pub fn contains(&self, value: Value) -> bool {
        self.values.iter().any(|v| *v == value)
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of blocks reserved by the list.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Returns the number of values the list can hold before it grows again.
    pub fn reserved(&self) -> usize {
        self.blocks * VALUE_BLOCK
    }
}
