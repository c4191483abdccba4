use std::collections::HashMap;

use serde::Serialize;

use crate::cfg::ArbiterCfg;
use crate::error::ConfigError;
use crate::key::Key;
use crate::ledger::DeviceSlots;

/// What the arbiter knows about one registered component.
#[derive(Clone, Debug)]
pub(crate) struct ComponentRecord<D, C> {
    /// `None` while the component's create is still in flight.
    pub(crate) device: Option<D>,
    pub(crate) operating: bool,
    /// Released for performing once this component finished preparing.
    pub(crate) successor: Option<C>,
}

impl<D, C> ComponentRecord<D, C> {
    fn placed(device: D) -> Self {
        Self {
            device: Some(device),
            operating: false,
            successor: None,
        }
    }
}

/// All bookkeeping of one storage system: device ledgers and the component registry.
///
/// Single-threaded; the supervisor crate puts it behind a lock.
#[derive(Clone, Debug)]
pub struct ArbiterState<D, C> {
    pub(crate) devices: HashMap<D, DeviceSlots<C>>,
    pub(crate) components: HashMap<C, ComponentRecord<D, C>>,
}

impl<D: Key, C: Key> ArbiterState<D, C> {
    pub fn new(cfg: ArbiterCfg<D, C>) -> Result<Self, ConfigError<D, C>> {
        let occupied = cfg.check()?;

        let devices = cfg
            .device_slots
            .into_iter()
            .map(|(device, slots)| {
                let used = occupied.get(&device).copied().unwrap_or(0);
                (device, DeviceSlots::new(slots, used))
            })
            .collect();
        let components = cfg
            .placement
            .into_iter()
            .map(|(component, device)| (component, ComponentRecord::placed(device)))
            .collect();

        Ok(Self { devices, components })
    }

    #[inline]
    pub fn has_device(&self, device: &D) -> bool {
        self.devices.contains_key(device)
    }

    pub fn slots(&self, device: &D) -> Option<&DeviceSlots<C>> {
        self.devices.get(device)
    }

    /// Committed device of `component`.
    pub fn device_of(&self, component: &C) -> Option<&D> {
        self.components.get(component)?.device.as_ref()
    }

    pub fn is_registered(&self, component: &C) -> bool {
        self.components.contains_key(component)
    }

    pub fn is_operating(&self, component: &C) -> bool {
        self.components.get(component).is_some_and(|r| r.operating)
    }

    /// Components with a transfer in flight.
    pub fn in_flight(&self) -> impl Iterator<Item = &C> {
        self.components
            .iter()
            .filter(|(_, r)| r.operating)
            .map(|(c, _)| c)
    }

    /// Number of components whose committed device is `device`.
    pub fn occupied(&self, device: &D) -> usize {
        self.components
            .values()
            .filter(|r| r.device.as_ref() == Some(device))
            .count()
    }

    pub fn snapshot(&self) -> ArbiterSnapshot<D, C> {
        let devices = self
            .devices
            .iter()
            .map(|(device, slots)| DeviceSnapshot {
                device: device.clone(),
                capacity: slots.capacity(),
                free: slots.free(),
                shifting: slots.shifting(),
                occupied: self.occupied(device),
                queued: slots.waiting().cloned().collect(),
                vacating: slots.vacating().cloned().collect(),
            })
            .collect();
        let placement = self
            .components
            .iter()
            .filter_map(|(c, r)| r.device.clone().map(|d| (c.clone(), d)))
            .collect();

        ArbiterSnapshot {
            devices,
            placement,
            in_flight: self.in_flight().cloned().collect(),
        }
    }
}

/// Point-in-time view of one device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceSnapshot<D, C> {
    pub device: D,
    pub capacity: usize,
    pub free: usize,
    pub shifting: usize,
    pub occupied: usize,
    /// Blocked requests, oldest first.
    pub queued: Vec<C>,
    /// Departing components whose slot nobody claimed yet.
    pub vacating: Vec<C>,
}

impl<D, C> DeviceSnapshot<D, C> {
    /// `free + shifting + occupied == capacity`. Holds whenever no transfer is in flight.
    pub fn is_balanced(&self) -> bool {
        self.free + self.shifting + self.occupied == self.capacity
    }
}

/// Point-in-time view of the whole system.
///
/// Devices and placement are in no particular order; see [`ArbiterSnapshot::sorted`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArbiterSnapshot<D, C> {
    pub devices: Vec<DeviceSnapshot<D, C>>,
    /// Committed `(component, device)` pairs.
    pub placement: Vec<(C, D)>,
    pub in_flight: Vec<C>,
}

impl<D: PartialEq, C> ArbiterSnapshot<D, C> {
    pub fn device(&self, device: &D) -> Option<&DeviceSnapshot<D, C>> {
        self.devices.iter().find(|d| &d.device == device)
    }

    pub fn is_balanced(&self) -> bool {
        self.devices.iter().all(DeviceSnapshot::is_balanced)
    }
}

impl<D: Ord, C: Ord> ArbiterSnapshot<D, C> {
    /// Deterministic ordering: devices, placement and in-flight ids sorted by id.
    pub fn sorted(mut self) -> Self {
        self.devices.sort_by(|a, b| a.device.cmp(&b.device));
        self.placement.sort();
        self.in_flight.sort();
        self
    }
}
