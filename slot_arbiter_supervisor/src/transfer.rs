//! Caller side of a transfer: which component goes where, and the two callbacks
//! that move its data.

use slot_arbiter_core::TransferRequest;

/// A transfer submitted to the supervisor.
///
/// `prepare` and `perform` are each called exactly once, on the submitting
/// thread, with no arbiter lock held. They may block but must return.
pub trait ComponentTransfer<D, C> {
    fn component_id(&self) -> C;

    /// Device the component currently lives on; `None` for a create.
    fn source_device(&self) -> Option<D>;

    /// Device the component should end up on; `None` for a delete.
    fn destination_device(&self) -> Option<D>;

    /// Runs once the transfer was admitted. When it returns, the component has
    /// logically given up its source slot.
    fn prepare(&self);

    /// Runs once the destination slot is physically free.
    fn perform(&self);

    fn request(&self) -> TransferRequest<D, C> {
        TransferRequest::new(self.component_id(), self.source_device(), self.destination_device())
    }
}

/// Closure-backed transfer for callers that do not need their own type.
#[derive(Clone, Debug)]
pub struct FnTransfer<D, C, P, F> {
    request: TransferRequest<D, C>,
    prepare: P,
    perform: F,
}

impl<D, C, P, F> FnTransfer<D, C, P, F>
where
    P: Fn(),
    F: Fn(),
{
    pub fn new(request: TransferRequest<D, C>, prepare: P, perform: F) -> Self {
        Self {
            request,
            prepare,
            perform,
        }
    }
}

impl<D, C, P, F> ComponentTransfer<D, C> for FnTransfer<D, C, P, F>
where
    D: Clone,
    C: Clone,
    P: Fn(),
    F: Fn(),
{
    fn component_id(&self) -> C {
        self.request.component.clone()
    }

    fn source_device(&self) -> Option<D> {
        self.request.source.clone()
    }

    fn destination_device(&self) -> Option<D> {
        self.request.destination.clone()
    }

    fn prepare(&self) {
        (self.prepare)()
    }

    fn perform(&self) {
        (self.perform)()
    }

    fn request(&self) -> TransferRequest<D, C> {
        self.request.clone()
    }
}
