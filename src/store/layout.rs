//! Offset Translator
//!
//! Pure address arithmetic: maps a linear byte offset onto the quantum-set
//! chain. Never allocates, never touches device state.

/// Where a linear byte offset lands within the chain.
///
/// A chain node spans `quantum * qset_size` bytes (its itemsize); within a
/// node, each slot spans `quantum` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Position {
    /// Index of the quantum set in the chain.
    ///
    /// Kept as u64: offsets near the top of the address space produce set
    /// indices that may not fit in usize; callers decide how to treat that.
    pub set: u64,

    /// Slot within the set's array (always < qset_size).
    pub slot: usize,

    /// Byte offset inside the slot's quantum buffer (always < quantum).
    pub offset: usize,
}

/// Decompose `offset` into chain coordinates for the given geometry.
///
/// Total for all offsets as long as `quantum` and `qset_size` are positive
/// and their product fits in u64 (enforced by config validation).
pub(crate) fn translate(offset: u64, quantum: usize, qset_size: usize) -> Position {
    let itemsize = quantum as u64 * qset_size as u64;
    let rest = offset % itemsize;

    Position {
        set: offset / itemsize,
        slot: (rest / quantum as u64) as usize,
        offset: (rest % quantum as u64) as usize,
    }
}
