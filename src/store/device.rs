//! Device
//!
//! The user-facing store: logical size, geometry, and the lock-protected
//! quantum-set chain, composed into position-based read/write/trim
//! operations.
//!
//! ## Concurrency Model
//!
//! - Every operation on one device acquires the same exclusive lock for its
//!   full duration; reads and writes are fully serialized
//! - The lock wait is cancellable for read/write (`Interrupted`); trim and
//!   snapshots acquire uncancellably because they have no interrupted outcome
//! - Distinct devices share no state

use std::io::{Read, Write};

use crate::error::{Result, StoreError};

use super::chain::Chain;
use super::layout::translate;
use super::serializer::{CancelToken, InterruptibleLock};

/// One independent sparse byte store.
pub struct Device {
    /// Geometry restored by trim
    quantum_default: usize,
    qset_default: usize,

    /// Everything a read/write/trim touches, behind one lock
    state: InterruptibleLock<DeviceState>,
}

/// Lock-protected device state
struct DeviceState {
    /// Bytes per quantum buffer
    quantum: usize,

    /// Slots per quantum set
    qset_size: usize,

    /// Furthest position reached by any successful write since the last trim
    size: u64,

    /// The quantum-set chain
    chain: Chain,
}

impl Device {
    /// Create an empty device with the given geometry.
    ///
    /// Both values must be positive and their product (the byte span of one
    /// chain set) must not overflow.
    pub fn new(quantum: usize, qset_size: usize) -> Result<Self> {
        if quantum == 0 {
            return Err(StoreError::Config("quantum must be positive".to_string()));
        }
        if qset_size == 0 {
            return Err(StoreError::Config("qset_size must be positive".to_string()));
        }
        if quantum.checked_mul(qset_size).is_none() {
            return Err(StoreError::Config(format!(
                "quantum {} x qset_size {} overflows",
                quantum, qset_size
            )));
        }

        Ok(Self {
            quantum_default: quantum,
            qset_default: qset_size,
            state: InterruptibleLock::new(DeviceState {
                quantum,
                qset_size,
                size: 0,
                chain: Chain::new(),
            }),
        })
    }

    /// Read up to `len` bytes starting at `pos` into `dst`.
    ///
    /// Returns the number of bytes produced, which may be less than `len`:
    /// a single call never crosses a quantum boundary, and both end-of-store
    /// and holes yield 0 bytes without error. The caller loops for more.
    ///
    /// Steps:
    /// 1. Acquire the device lock (cancellable wait)
    /// 2. Return 0 at or past the logical size
    /// 3. Clamp to the logical size, then locate the target quantum
    ///    without allocating (an absent set, slot array, or buffer is a hole)
    /// 4. Clamp to the end of the quantum and transfer
    pub fn read_at<W: Write>(
        &self,
        pos: u64,
        len: usize,
        dst: &mut W,
        token: &CancelToken,
    ) -> Result<usize> {
        let state = self.state.lock(token)?;

        // End-of-store: not an error.
        if pos >= state.size {
            return Ok(0);
        }

        // Only read up to the logical size.
        let avail = state.size - pos;
        let mut count = len.min(usize::try_from(avail).unwrap_or(usize::MAX));

        let at = translate(pos, state.quantum, state.qset_size);
        let set_index = match usize::try_from(at.set) {
            Ok(index) => index,
            // Beyond any chain this process could hold: nothing there.
            Err(_) => return Ok(0),
        };

        // Holes read as zero bytes, never as an error.
        let buf = match state
            .chain
            .follow(set_index)
            .and_then(|set| set.quantum(at.slot))
        {
            Some(buf) => buf,
            None => return Ok(0),
        };

        // Stop at the end of this quantum; the caller loops for more.
        count = count.min(state.quantum - at.offset);

        dst.write_all(&buf[at.offset..at.offset + count])
            .map_err(|e| StoreError::BoundaryFault(e.to_string()))?;

        Ok(count)
    }

    /// Write up to `len` bytes from `src` at `pos`.
    ///
    /// Returns the number of bytes consumed, which may be less than `len`: a
    /// single call never crosses a quantum boundary; the caller loops.
    ///
    /// Steps:
    /// 1. Acquire the device lock (cancellable wait)
    /// 2. Extend the chain up to the target set; allocate the slot array and
    ///    quantum buffer on first touch; any allocation failure reports
    ///    `OutOfMemory` with size untouched, and allocations that already
    ///    succeeded stay attached for future writes
    /// 3. Clamp to the end of the quantum and transfer; a source failure
    ///    reports `BoundaryFault` with size untouched
    /// 4. Advance the size watermark
    pub fn write_at<R: Read>(
        &self,
        pos: u64,
        len: usize,
        src: &mut R,
        token: &CancelToken,
    ) -> Result<usize> {
        let mut state = self.state.lock(token)?;
        let quantum = state.quantum;
        let qset_size = state.qset_size;

        let at = translate(pos, quantum, qset_size);
        let set_index = usize::try_from(at.set).map_err(|_| StoreError::OutOfMemory)?;

        let grown_from = state.chain.len();
        let set = state.chain.follow_or_grow(set_index)?;
        let buf = set.quantum_mut(at.slot, qset_size, quantum)?;

        let count = len.min(quantum - at.offset);
        src.read_exact(&mut buf[at.offset..at.offset + count])
            .map_err(|e| StoreError::BoundaryFault(e.to_string()))?;

        if set_index >= grown_from {
            tracing::trace!(
                "chain extended to {} sets for write at {}",
                set_index + 1,
                pos
            );
        }

        // Size tracks the furthest position reached, holes included.
        let end = pos + count as u64;
        if state.size < end {
            state.size = end;
        }

        Ok(count)
    }

    /// Release the entire chain and reset the device to its initial state.
    ///
    /// Size returns to 0 and the geometry to its configured defaults.
    /// Idempotent on an empty device; never fails and cannot be interrupted.
    /// Not coordinated with in-flight caller loops: a trim may land between
    /// two calls of another caller's read or write loop.
    pub fn trim(&self) {
        let mut state = self.state.lock_uncancellable();
        let released = state.chain.len();
        state.chain.reclaim();
        state.size = 0;
        state.quantum = self.quantum_default;
        state.qset_size = self.qset_default;
        if released > 0 {
            tracing::debug!("trim released {} quantum sets", released);
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current logical size in bytes.
    pub fn size(&self) -> u64 {
        self.state.lock_uncancellable().size
    }

    /// Snapshot of the device's geometry and allocation state.
    pub fn stats(&self) -> DeviceStats {
        let state = self.state.lock_uncancellable();
        DeviceStats {
            size: state.size,
            quantum: state.quantum,
            qset_size: state.qset_size,
            sets: state.chain.allocation_map(),
        }
    }
}

/// Point-in-time view of one device, for diagnostics.
#[derive(Debug, Clone)]
pub struct DeviceStats {
    /// Logical size in bytes
    pub size: u64,

    /// Bytes per quantum buffer
    pub quantum: usize,

    /// Slots per quantum set
    pub qset_size: usize,

    /// Allocated quantum count per chain set, in chain order
    pub sets: Vec<usize>,
}

impl DeviceStats {
    /// Number of sets in the chain.
    pub fn chain_len(&self) -> usize {
        self.sets.len()
    }

    /// Total allocated quantum buffers across the chain.
    pub fn allocated_quanta(&self) -> usize {
        self.sets.iter().sum()
    }

    /// Total bytes held by allocated quantum buffers.
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_quanta() as u64 * self.quantum as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> CancelToken {
        CancelToken::new()
    }

    /// Loop a write until `data` is fully consumed.
    fn write_all(device: &Device, mut pos: u64, data: &[u8]) -> Vec<usize> {
        let mut src = data;
        let mut counts = Vec::new();
        while !src.is_empty() {
            let n = device.write_at(pos, src.len(), &mut src, &token()).unwrap();
            counts.push(n);
            pos += n as u64;
        }
        counts
    }

    /// Loop a read until `len` bytes arrive or the device yields 0.
    fn read_all(device: &Device, mut pos: u64, len: usize) -> Vec<u8> {
        let mut out = Vec::new();
        while out.len() < len {
            let n = device
                .read_at(pos, len - out.len(), &mut out, &token())
                .unwrap();
            if n == 0 {
                break;
            }
            pos += n as u64;
        }
        out
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn new_device_is_empty() {
        let device = Device::new(4, 2).unwrap();
        assert_eq!(device.size(), 0);
        assert_eq!(device.stats().chain_len(), 0);
    }

    #[test]
    fn degenerate_geometry_rejected() {
        assert!(matches!(Device::new(0, 2), Err(StoreError::Config(_))));
        assert!(matches!(Device::new(4, 0), Err(StoreError::Config(_))));
        assert!(matches!(
            Device::new(usize::MAX, 2),
            Err(StoreError::Config(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Quantum-boundary clamping
    // -----------------------------------------------------------------------

    #[test]
    fn write_splits_at_quantum_boundaries() {
        // quantum 4, qset 2: boundaries at offsets 4 and 8.
        let device = Device::new(4, 2).unwrap();
        let counts = write_all(&device, 0, b"ABCDEFGHIJ");
        assert_eq!(counts, vec![4, 4, 2]);
        assert_eq!(device.size(), 10);
    }

    #[test]
    fn roundtrip_across_sets() {
        let device = Device::new(4, 2).unwrap();
        write_all(&device, 0, b"ABCDEFGHIJ");
        assert_eq!(read_all(&device, 0, 10), b"ABCDEFGHIJ");
    }

    #[test]
    fn roundtrip_misaligned_start() {
        let device = Device::new(4, 2).unwrap();
        write_all(&device, 3, b"xyz");
        assert_eq!(device.size(), 6);
        assert_eq!(read_all(&device, 3, 3), b"xyz");
    }

    #[test]
    fn read_never_crosses_quantum_boundary() {
        let device = Device::new(4, 2).unwrap();
        write_all(&device, 0, b"ABCDEFGH");

        let mut out = Vec::new();
        let n = device.read_at(2, 6, &mut out, &token()).unwrap();
        assert_eq!(n, 2); // stops at the end of the first quantum
        assert_eq!(out, b"CD");
    }

    // -----------------------------------------------------------------------
    // End-of-store and holes
    // -----------------------------------------------------------------------

    #[test]
    fn read_at_size_returns_zero() {
        let device = Device::new(4, 2).unwrap();
        write_all(&device, 0, b"AB");

        let mut out = Vec::new();
        assert_eq!(device.read_at(2, 4, &mut out, &token()).unwrap(), 0);
        assert_eq!(device.read_at(100, 4, &mut out, &token()).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn read_clamps_to_size() {
        let device = Device::new(16, 4).unwrap();
        write_all(&device, 0, b"hello");

        let mut out = Vec::new();
        let n = device.read_at(0, 100, &mut out, &token()).unwrap();
        assert_eq!(n, 5);
        assert_eq!(out, b"hello");
    }

    #[test]
    fn hole_reads_as_zero_bytes() {
        // Write far into the store; everything before it is a hole.
        let device = Device::new(4, 2).unwrap();
        write_all(&device, 9, b"Z");
        assert_eq!(device.size(), 10);

        let mut out = Vec::new();
        // Set 0 exists (growth walked through it) but owns no slot array.
        assert_eq!(device.read_at(0, 4, &mut out, &token()).unwrap(), 0);
        assert_eq!(device.read_at(4, 4, &mut out, &token()).unwrap(), 0);
        assert!(out.is_empty());

        // The written byte itself is reachable.
        assert_eq!(read_all(&device, 9, 1), b"Z");
    }

    #[test]
    fn sparse_write_allocates_only_target_quantum() {
        let device = Device::new(4, 2).unwrap();
        write_all(&device, 9, b"Z");

        let stats = device.stats();
        assert_eq!(stats.chain_len(), 2);
        assert_eq!(stats.sets, vec![0, 1]);
        assert_eq!(stats.allocated_bytes(), 4);
    }

    // -----------------------------------------------------------------------
    // Size watermark
    // -----------------------------------------------------------------------

    #[test]
    fn size_is_monotonic_across_writes() {
        let device = Device::new(4, 2).unwrap();
        write_all(&device, 0, b"ABCDEFGH");
        assert_eq!(device.size(), 8);

        // Rewriting earlier bytes does not shrink the store.
        write_all(&device, 0, b"xy");
        assert_eq!(device.size(), 8);
        assert_eq!(read_all(&device, 0, 8), b"xyCDEFGH");
    }

    #[test]
    fn zero_length_write_allocates_and_moves_watermark() {
        let device = Device::new(4, 2).unwrap();
        let n = device
            .write_at(9, 0, &mut std::io::empty(), &token())
            .unwrap();
        assert_eq!(n, 0);

        // The addressed quantum was allocated and the watermark reached 9.
        assert_eq!(device.size(), 9);
        assert_eq!(device.stats().sets, vec![0, 1]);
    }

    #[test]
    fn zero_length_read_is_ok() {
        let device = Device::new(4, 2).unwrap();
        write_all(&device, 0, b"AB");
        let mut out = Vec::new();
        assert_eq!(device.read_at(0, 0, &mut out, &token()).unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Boundary faults
    // -----------------------------------------------------------------------

    #[test]
    fn short_destination_is_boundary_fault() {
        let device = Device::new(8, 2).unwrap();
        write_all(&device, 0, b"ABCDEF");

        let mut short = [0u8; 2];
        let mut dst: &mut [u8] = &mut short;
        let result = device.read_at(0, 6, &mut dst, &token());
        assert!(matches!(result, Err(StoreError::BoundaryFault(_))));
    }

    #[test]
    fn short_source_is_boundary_fault_and_size_unchanged() {
        let device = Device::new(8, 2).unwrap();

        let mut src: &[u8] = b"ab";
        let result = device.write_at(0, 6, &mut src, &token());
        assert!(matches!(result, Err(StoreError::BoundaryFault(_))));
        assert_eq!(device.size(), 0);

        // The device stays fully usable afterwards.
        write_all(&device, 0, b"hello");
        assert_eq!(read_all(&device, 0, 5), b"hello");
    }

    // -----------------------------------------------------------------------
    // Trim
    // -----------------------------------------------------------------------

    #[test]
    fn trim_resets_to_empty() {
        let device = Device::new(4, 2).unwrap();
        write_all(&device, 0, b"ABCDEFGHIJ");

        device.trim();
        assert_eq!(device.size(), 0);
        assert_eq!(device.stats().chain_len(), 0);

        let mut out = Vec::new();
        assert_eq!(device.read_at(0, 10, &mut out, &token()).unwrap(), 0);
    }

    #[test]
    fn trim_is_idempotent() {
        let device = Device::new(4, 2).unwrap();
        device.trim();
        device.trim();
        assert_eq!(device.size(), 0);
    }

    #[test]
    fn device_is_reusable_after_trim() {
        let device = Device::new(4, 2).unwrap();
        write_all(&device, 0, b"first");
        device.trim();
        write_all(&device, 0, b"second!");
        assert_eq!(read_all(&device, 0, 7), b"second!");
        assert_eq!(device.size(), 7);
    }
}
