//! Storage Engine
//!
//! The quantum-set chain: a growable sequence of sets, each holding a lazily
//! allocated array of slots, each slot owning at most one quantum buffer.
//!
//! ## Responsibilities
//! - Extend the chain on demand up to a requested set index
//! - Allocate slot arrays and quantum buffers on first write
//! - Reclaim the entire structure in one cascading drop
//!
//! Ownership is strictly nested: the chain owns its sets, a set owns its slot
//! array, a slot owns its buffer. Growth allocations go through
//! `Vec::try_reserve` so exhaustion surfaces as `OutOfMemory` instead of an
//! abort; anything allocated before a failure stays attached to the chain and
//! is retained for future writes.

use crate::error::Result;

/// One chain node: a lazily allocated array of quantum slots.
///
/// Set `i` covers the byte range `[i * quantum * qset_size,
/// (i + 1) * quantum * qset_size)`. The slot array itself is not allocated
/// until the first write lands in this set.
pub(crate) struct QuantumSet {
    slots: Option<Box<[Option<Box<[u8]>>]>>,
}

impl QuantumSet {
    fn new() -> Self {
        Self { slots: None }
    }

    /// Borrow the buffer in `slot` if it has ever been allocated.
    pub(crate) fn quantum(&self, slot: usize) -> Option<&[u8]> {
        self.slots.as_ref()?.get(slot)?.as_deref()
    }

    /// Borrow the buffer in `slot`, allocating the slot array and the
    /// quantum buffer on first touch.
    ///
    /// Each allocation is individually fallible. A slot array created here
    /// survives a later buffer allocation failure.
    pub(crate) fn quantum_mut(
        &mut self,
        slot: usize,
        qset_size: usize,
        quantum: usize,
    ) -> Result<&mut [u8]> {
        if self.slots.is_none() {
            let mut array: Vec<Option<Box<[u8]>>> = Vec::new();
            array.try_reserve_exact(qset_size)?;
            array.resize_with(qset_size, || None);
            self.slots = Some(array.into_boxed_slice());
        }
        let slots = self.slots.as_mut().expect("slot array allocated above");

        if slots[slot].is_none() {
            let mut bytes: Vec<u8> = Vec::new();
            bytes.try_reserve_exact(quantum)?;
            bytes.resize(quantum, 0);
            slots[slot] = Some(bytes.into_boxed_slice());
        }
        Ok(slots[slot].as_deref_mut().expect("quantum allocated above"))
    }

    /// Number of quantum buffers currently allocated in this set.
    pub(crate) fn allocated(&self) -> usize {
        match &self.slots {
            Some(slots) => slots.iter().filter(|slot| slot.is_some()).count(),
            None => 0,
        }
    }
}

/// The ordered chain of quantum sets owned by one device.
pub(crate) struct Chain {
    sets: Vec<QuantumSet>,
}

impl Chain {
    pub(crate) fn new() -> Self {
        Self { sets: Vec::new() }
    }

    /// Number of sets currently in the chain.
    pub(crate) fn len(&self) -> usize {
        self.sets.len()
    }

    /// Locate set `index` without allocating; `None` beyond the chain end.
    ///
    /// This is the read-side lookup: reads must never grow the store.
    pub(crate) fn follow(&self, index: usize) -> Option<&QuantumSet> {
        self.sets.get(index)
    }

    /// Locate set `index`, extending the chain with empty sets as needed.
    ///
    /// If an allocation fails partway, the sets created so far remain in the
    /// chain; the caller must not assume the requested index was reached.
    pub(crate) fn follow_or_grow(&mut self, index: usize) -> Result<&mut QuantumSet> {
        while self.sets.len() <= index {
            self.sets.try_reserve(1)?;
            self.sets.push(QuantumSet::new());
        }
        Ok(&mut self.sets[index])
    }

    /// Drop every buffer, slot array, and set, detaching the chain.
    ///
    /// Safe on an empty chain.
    pub(crate) fn reclaim(&mut self) {
        self.sets = Vec::new();
    }

    /// Allocated quantum count per set, in chain order.
    pub(crate) fn allocation_map(&self) -> Vec<usize> {
        self.sets.iter().map(QuantumSet::allocated).collect()
    }
}
