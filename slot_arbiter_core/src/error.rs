use thiserror::Error;

/// Why a transfer was rejected.
///
/// Every variant is detected before the arbiter mutates anything, so the caller
/// may simply retry later.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransferError<D, C> {
    /// Neither a source nor a destination was given.
    #[error("transfer of component {0:?} names neither a source nor a destination")]
    InvalidTransferType(C),
    /// A create for a component that is already registered. `device` is its
    /// current device, or `None` while its own create is still in flight.
    #[error("component {component:?} already exists (device: {device:?})")]
    ComponentAlreadyExists { component: C, device: Option<D> },
    /// Another transfer of the same component is in flight.
    #[error("component {0:?} is already being operated on")]
    ComponentBusy(C),
    #[error("device {0:?} does not exist")]
    DeviceDoesNotExist(D),
    /// The component is not registered on the given source device.
    #[error("component {component:?} does not exist on device {device:?}")]
    ComponentDoesNotExist { component: C, device: D },
    /// Source and destination are the same device.
    #[error("component {component:?} already resides on device {device:?}")]
    ComponentDoesNotNeedTransfer { component: C, device: D },
}

/// Invalid construction input.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError<D, C> {
    #[error("no devices configured")]
    NoDevices,
    #[error("device {0:?} has no slots")]
    ZeroCapacity(D),
    #[error("component {component:?} is placed on unknown device {device:?}")]
    UnknownPlacementDevice { component: C, device: D },
    #[error("device {device:?} holds more components than its {capacity} slots")]
    DeviceOverCommitted { device: D, capacity: usize },
}
