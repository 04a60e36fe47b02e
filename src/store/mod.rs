//! Store Module
//!
//! The sparse two-level storage engine behind each device.
//!
//! ## Responsibilities
//! - Translate linear byte offsets into chain coordinates
//! - Grow the quantum-set chain lazily on write
//! - Reclaim the entire chain on trim
//! - Serialize all access to one device behind one interruptible lock

mod chain;
mod device;
mod layout;
mod serializer;

pub use device::{Device, DeviceStats};
pub use serializer::CancelToken;
