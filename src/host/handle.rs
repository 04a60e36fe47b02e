//! Handle
//!
//! One opened view of a device: an access mode, a position, and a cancel
//! token polled by this handle's lock waits.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::store::{CancelToken, Device};

use super::OpenMode;

/// An open device handle.
///
/// Reads and writes delegate directly to the device with this handle's
/// position and advance it by the count actually transferred. Both follow
/// the partial-completion contract: a single call may transfer fewer bytes
/// than requested (it never crosses a quantum boundary), and callers loop
/// for more.
pub struct Handle {
    device: Arc<Device>,
    mode: OpenMode,
    pos: u64,
    token: CancelToken,
}

impl Handle {
    pub(crate) fn new(device: Arc<Device>, mode: OpenMode) -> Self {
        Self {
            device,
            mode,
            pos: 0,
            token: CancelToken::new(),
        }
    }

    /// Read up to `len` bytes at the current position.
    ///
    /// Returns however many bytes the device produced, possibly fewer than
    /// requested and possibly none (end-of-store or a hole), and advances
    /// the position by that count.
    pub fn read(&mut self, len: usize) -> Result<Bytes> {
        if !self.mode.can_read() {
            return Err(StoreError::BadMode("reading"));
        }
        let mut out = Vec::new();
        let count = self.device.read_at(self.pos, len, &mut out, &self.token)?;
        self.pos += count as u64;
        Ok(Bytes::from(out))
    }

    /// Write `data` at the current position.
    ///
    /// Returns the count actually consumed and advances the position by it.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        if !self.mode.can_write() {
            return Err(StoreError::BadMode("writing"));
        }
        let mut src = data;
        let count = self
            .device
            .write_at(self.pos, data.len(), &mut src, &self.token)?;
        self.pos += count as u64;
        Ok(count)
    }

    /// Reposition the handle.
    pub fn seek(&mut self, pos: u64) {
        self.pos = pos;
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// The mode this handle was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// The device behind this handle.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Clone of the token polled by this handle's lock waits, so an
    /// external party can cancel them.
    pub fn canceller(&self) -> CancelToken {
        self.token.clone()
    }

    /// Close the handle.
    ///
    /// No action required: every write is already reflected in the device;
    /// there is nothing to flush.
    pub fn close(self) {}
}
