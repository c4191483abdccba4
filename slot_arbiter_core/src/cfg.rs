use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::key::Key;

/// Construction input: the fixed device set and the initial placement.
///
/// Plain data, so callers can load it from whatever format they like:
///
/// ```
/// use slot_arbiter_core::ArbiterCfg;
///
/// let cfg: ArbiterCfg<String, String> = ArbiterCfg::new()
///     .with_device("disk-a".to_string(), 2)
///     .with_component("blob-1".to_string(), "disk-a".to_string());
/// assert!(cfg.check().is_ok());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "D: Serialize + Eq + Hash, C: Serialize + Eq + Hash",
    deserialize = "D: Deserialize<'de> + Eq + Hash, C: Deserialize<'de> + Eq + Hash"
))]
pub struct ArbiterCfg<D, C> {
    /// Total slot count of every device. Must be non-empty, every value > 0.
    pub device_slots: HashMap<D, usize>,
    /// Device each pre-existing component lives on.
    #[serde(default)]
    pub placement: HashMap<C, D>,
}

impl<D: Key, C: Key> Default for ArbiterCfg<D, C> {
    fn default() -> Self {
        Self {
            device_slots: HashMap::new(),
            placement: HashMap::new(),
        }
    }
}

impl<D: Key, C: Key> ArbiterCfg<D, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, device: D, slots: usize) -> Self {
        self.device_slots.insert(device, slots);
        self
    }

    pub fn with_component(mut self, component: C, device: D) -> Self {
        self.placement.insert(component, device);
        self
    }

    /// Validate the configuration and count the initial occupancy of every device.
    pub fn check(&self) -> Result<HashMap<D, usize>, ConfigError<D, C>> {
        if self.device_slots.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        if let Some((device, _)) = self.device_slots.iter().find(|(_, slots)| **slots == 0) {
            return Err(ConfigError::ZeroCapacity(device.clone()));
        }

        let mut occupied: HashMap<D, usize> = HashMap::with_capacity(self.device_slots.len());
        for (component, device) in &self.placement {
            let Some(&capacity) = self.device_slots.get(device) else {
                return Err(ConfigError::UnknownPlacementDevice {
                    component: component.clone(),
                    device: device.clone(),
                });
            };
            let used = occupied.entry(device.clone()).or_insert(0);
            if *used == capacity {
                return Err(ConfigError::DeviceOverCommitted {
                    device: device.clone(),
                    capacity,
                });
            }
            *used += 1;
        }
        Ok(occupied)
    }
}
