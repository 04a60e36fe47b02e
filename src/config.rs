//! Configuration for SparseDev
//!
//! Centralized configuration with sensible defaults.

use crate::error::{Result, StoreError};

/// Default quantum size in bytes
pub const DEFAULT_QUANTUM: usize = 4000;

/// Default number of slots per quantum set
pub const DEFAULT_QSET_SIZE: usize = 1000;

/// Default number of independent devices
pub const DEFAULT_DEVICE_COUNT: usize = 4;

/// Main configuration for a SparseDev registry
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Geometry
    // -------------------------------------------------------------------------
    /// Bytes per quantum buffer (the smallest unit of lazy allocation)
    pub quantum: usize,

    /// Slots per quantum set (buffers addressed by a single chain node)
    pub qset_size: usize,

    // -------------------------------------------------------------------------
    // Host Configuration
    // -------------------------------------------------------------------------
    /// Number of independent devices to create
    pub device_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            qset_size: DEFAULT_QSET_SIZE,
            device_count: DEFAULT_DEVICE_COUNT,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validate the configuration
    ///
    /// All values must be positive, and `quantum * qset_size` (the byte span
    /// of one chain node) must fit in the address arithmetic.
    pub fn validate(&self) -> Result<()> {
        if self.quantum == 0 {
            return Err(StoreError::Config("quantum must be positive".to_string()));
        }
        if self.qset_size == 0 {
            return Err(StoreError::Config("qset_size must be positive".to_string()));
        }
        if self.device_count == 0 {
            return Err(StoreError::Config(
                "device_count must be positive".to_string(),
            ));
        }
        if self.quantum.checked_mul(self.qset_size).is_none() {
            return Err(StoreError::Config(format!(
                "quantum {} x qset_size {} overflows",
                self.quantum, self.qset_size
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the quantum size (bytes per buffer)
    pub fn quantum(mut self, bytes: usize) -> Self {
        self.config.quantum = bytes;
        self
    }

    /// Set the quantum set capacity (slots per chain node)
    pub fn qset_size(mut self, slots: usize) -> Self {
        self.config.qset_size = slots;
        self
    }

    /// Set the number of devices to create
    pub fn device_count(mut self, count: usize) -> Self {
        self.config.device_count = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
