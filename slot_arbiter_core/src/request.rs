/// What a transfer does to its component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferKind {
    /// No source: the component enters the system.
    Create,
    /// Source and destination: the component changes device.
    Move,
    /// No destination: the component leaves the system.
    Delete,
}

/// One submitted transfer, stripped of its callbacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest<D, C> {
    pub component: C,
    pub source: Option<D>,
    pub destination: Option<D>,
}

impl<D, C> TransferRequest<D, C> {
    pub fn new(component: C, source: Option<D>, destination: Option<D>) -> Self {
        Self {
            component,
            source,
            destination,
        }
    }

    pub fn create(component: C, destination: D) -> Self {
        Self::new(component, None, Some(destination))
    }

    pub fn relocate(component: C, source: D, destination: D) -> Self {
        Self::new(component, Some(source), Some(destination))
    }

    pub fn delete(component: C, source: D) -> Self {
        Self::new(component, Some(source), None)
    }

    /// `None` for the invalid shape with neither endpoint.
    pub fn kind(&self) -> Option<TransferKind> {
        match (&self.source, &self.destination) {
            (None, Some(_)) => Some(TransferKind::Create),
            (Some(_), Some(_)) => Some(TransferKind::Move),
            (Some(_), None) => Some(TransferKind::Delete),
            (None, None) => None,
        }
    }
}
