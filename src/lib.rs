//! # SparseDev
//!
//! An in-memory, dynamically growable, byte-addressable store exposed as a
//! set of numbered pseudo-devices:
//! - Sparse two-level storage: a chain of quantum sets, each holding
//!   independently allocated fixed-size buffers
//! - Lazy allocation on write, full reclamation on trim
//! - One interruptible exclusive lock per device
//! - Position-based read/write handles with partial-completion semantics
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      DeviceRegistry                          │
//! │              (numbering, open, diagnostics)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Handle (mode, position)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Device                                │
//! │        size / quantum / qset_size  +  one lock               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ translate(offset)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Chain                                 │
//! │      QuantumSet ── QuantumSet ── QuantumSet ── …             │
//! │      (lazy slot arrays, lazy quantum buffers)                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod host;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use config::Config;
pub use store::{CancelToken, Device, DeviceStats};
pub use host::{DeviceRegistry, Handle, OpenMode};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SparseDev
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
