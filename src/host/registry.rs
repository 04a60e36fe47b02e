//! Device Registry
//!
//! Owns the numbered devices and hands out handles.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::store::Device;

use super::{Handle, OpenMode};

/// Registry of independent, numbered devices built from one Config.
pub struct DeviceRegistry {
    config: Config,
    devices: Vec<Arc<Device>>,
}

impl DeviceRegistry {
    /// Validate `config` and create its devices, numbered from 0.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut devices = Vec::with_capacity(config.device_count);
        for _ in 0..config.device_count {
            devices.push(Arc::new(Device::new(config.quantum, config.qset_size)?));
        }

        tracing::debug!(
            "registered {} devices (quantum {}, qset_size {})",
            config.device_count,
            config.quantum,
            config.qset_size
        );

        Ok(Self { config, devices })
    }

    /// Create a registry with the default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::default())
    }

    /// Open device `index` in `mode`.
    ///
    /// A write-only open trims the device before the handle is returned, so
    /// no prior contents are visible through it. The trim is not coordinated
    /// with handles already open on the same device: it may land between two
    /// calls of another caller's read or write loop.
    pub fn open(&self, index: usize, mode: OpenMode) -> Result<Handle> {
        let device = Arc::clone(self.device(index)?);

        if mode == OpenMode::WriteOnly {
            device.trim();
        }

        tracing::debug!("opened device {} ({:?})", index, mode);
        Ok(Handle::new(device, mode))
    }

    /// Direct access to device `index`.
    pub fn device(&self, index: usize) -> Result<&Arc<Device>> {
        self.devices
            .get(index)
            .ok_or(StoreError::NoSuchDevice(index))
    }

    /// Number of devices in the registry.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// The configuration the registry was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render a diagnostic listing of every device's chain.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (index, device) in self.devices.iter().enumerate() {
            let stats = device.stats();
            let _ = writeln!(
                out,
                "device {}: qset {}, quantum {}, size {}",
                index, stats.qset_size, stats.quantum, stats.size
            );
            for (set, allocated) in stats.sets.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  set {}: {}/{} quanta allocated",
                    set, allocated, stats.qset_size
                );
            }
        }
        out
    }
}
