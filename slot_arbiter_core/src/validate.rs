use crate::error::TransferError;
use crate::key::Key;
use crate::request::{TransferKind, TransferRequest};
use crate::state::ArbiterState;

/// Check a transfer against the current state without touching it.
///
/// The checks run in a fixed order and the first failing one is reported, so a
/// create racing its own earlier create reports `ComponentAlreadyExists` rather
/// than `ComponentBusy`.
pub fn validate<D: Key, C: Key>(
    req: &TransferRequest<D, C>,
    state: &ArbiterState<D, C>,
) -> Result<(), TransferError<D, C>> {
    let component = &req.component;
    let record = state.components.get(component);

    let Some(kind) = req.kind() else {
        return Err(TransferError::InvalidTransferType(component.clone()));
    };

    if kind == TransferKind::Create && record.is_some_and(|r| r.device.is_none()) {
        return Err(TransferError::ComponentAlreadyExists {
            component: component.clone(),
            device: None,
        });
    }

    if state.is_operating(component) {
        return Err(TransferError::ComponentBusy(component.clone()));
    }

    if kind == TransferKind::Create {
        if let Some(device) = record.and_then(|r| r.device.clone()) {
            return Err(TransferError::ComponentAlreadyExists {
                component: component.clone(),
                device: Some(device),
            });
        }
    }

    if let Some(source) = &req.source {
        if !state.has_device(source) {
            return Err(TransferError::DeviceDoesNotExist(source.clone()));
        }
        if record.and_then(|r| r.device.as_ref()) != Some(source) {
            return Err(TransferError::ComponentDoesNotExist {
                component: component.clone(),
                device: source.clone(),
            });
        }
    }

    if let Some(destination) = &req.destination {
        if !state.has_device(destination) {
            return Err(TransferError::DeviceDoesNotExist(destination.clone()));
        }
        if req.source.as_ref() == Some(destination) {
            return Err(TransferError::ComponentDoesNotNeedTransfer {
                component: component.clone(),
                device: destination.clone(),
            });
        }
    }

    Ok(())
}
