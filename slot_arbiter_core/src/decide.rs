//! Lock-held halves of a transfer's life: admission, prepare commit, perform commit.
//!
//! None of these block. They return [`Signals`] naming whose gates the caller must
//! open; the supervisor owns the gates and the threads waiting on them.

use crate::error::TransferError;
use crate::key::Key;
use crate::ledger::Claim;
use crate::request::TransferRequest;
use crate::state::{ArbiterState, ComponentRecord};
use crate::validate::validate;

/// Gates to open after a state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signals<C> {
    /// Components now allowed to start preparing.
    pub prepare: Vec<C>,
    /// Components now allowed to start performing.
    pub perform: Vec<C>,
}

impl<C> Default for Signals<C> {
    fn default() -> Self {
        Self {
            prepare: Vec::new(),
            perform: Vec::new(),
        }
    }
}

impl<C> Signals<C> {
    pub fn is_empty(&self) -> bool {
        self.prepare.is_empty() && self.perform.is_empty()
    }
}

/// How an admitted transfer obtained its destination slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// A free slot, or no slot needed at all (delete). Prepare and perform are both open.
    Immediate,
    /// A slot still being vacated; perform opens once its occupant prepared.
    Reserved,
    /// A rotation of blocked moves closed by this one.
    Cycle,
    /// Nothing available; the transfer waits for a chain to release it.
    Queued,
}

/// Result of admitting one transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision<C> {
    pub admission: Admission,
    pub signals: Signals<C>,
}

impl<D: Key, C: Key> ArbiterState<D, C> {
    /// Validate `req` and, if it passes, admit it.
    ///
    /// On error nothing changed. On success the component is marked operating (and
    /// registered, for a create); the returned signals may include the requester
    /// itself as well as previously blocked transfers released by it.
    pub fn admit(&mut self, req: &TransferRequest<D, C>) -> Result<Decision<C>, TransferError<D, C>> {
        if let Err(err) = validate(req, self) {
            tracing::debug!(component = ?req.component, error = %err, "arbiter.reject");
            return Err(err);
        }

        let component = req.component.clone();
        self.components
            .entry(component.clone())
            .or_insert_with(|| ComponentRecord {
                device: None,
                operating: false,
                successor: None,
            })
            .operating = true;

        let claim = match &req.destination {
            Some(destination) => self
                .devices
                .get_mut(destination)
                .expect("validated destination exists")
                .try_claim(),
            None => Claim::Immediate,
        };

        let mut signals = Signals::default();
        let admission = match claim {
            Claim::Immediate => {
                signals.perform.push(component.clone());
                self.release_chain(component, req.source.clone(), &mut signals);
                Admission::Immediate
            }
            Claim::Reserved(waker) => {
                self.components
                    .get_mut(&waker)
                    .expect("reserved slot's occupant is registered")
                    .successor = Some(component.clone());
                self.release_chain(component, req.source.clone(), &mut signals);
                Admission::Reserved
            }
            Claim::Blocked => {
                let destination = req.destination.as_ref().expect("blocked claims have a destination");
                match &req.source {
                    Some(source) => match self.find_cycle(source, destination) {
                        Some(ring) => {
                            self.release_cycle(component, ring, &mut signals);
                            Admission::Cycle
                        }
                        None => {
                            self.enqueue(destination, component, true);
                            Admission::Queued
                        }
                    },
                    None => {
                        self.enqueue(destination, component, false);
                        Admission::Queued
                    }
                }
            }
        };

        tracing::debug!(
            component = ?req.component,
            source = ?req.source,
            destination = ?req.destination,
            admission = ?admission,
            released = signals.prepare.len(),
            "arbiter.admit"
        );
        Ok(Decision { admission, signals })
    }

    /// Commit the end of `req`'s prepare phase.
    ///
    /// A component leaving a device hands its slot to the recorded successor, or
    /// turns the reservation back into a free slot when nobody claimed it.
    pub fn prepared(&mut self, req: &TransferRequest<D, C>) -> Signals<C> {
        let mut signals = Signals::default();
        let Some(source) = &req.source else {
            return signals;
        };

        let successor = self
            .components
            .get_mut(&req.component)
            .and_then(|record| record.successor.take());
        match successor {
            Some(next) => {
                tracing::trace!(component = ?req.component, successor = ?next, "arbiter.handoff");
                signals.perform.push(next);
            }
            None => {
                if let Some(slots) = self.devices.get_mut(source) {
                    slots.complete_vacate(&req.component);
                }
            }
        }
        signals
    }

    /// Commit the end of `req`'s perform phase: record the new placement, or forget
    /// the component on delete.
    pub fn performed(&mut self, req: &TransferRequest<D, C>) {
        match &req.destination {
            Some(destination) => {
                if let Some(record) = self.components.get_mut(&req.component) {
                    record.device = Some(destination.clone());
                    record.operating = false;
                    record.successor = None;
                }
            }
            None => {
                self.components.remove(&req.component);
            }
        }
        tracing::trace!(component = ?req.component, destination = ?req.destination, "arbiter.commit");
    }

    fn enqueue(&mut self, destination: &D, component: C, occupies_device: bool) {
        if let Some(slots) = self.devices.get_mut(destination) {
            slots.enqueue(component, occupies_device);
        }
    }

    /// `head` got leave to prepare; release every waiter its departure unblocks.
    fn release_chain(&mut self, head: C, source: Option<D>, signals: &mut Signals<C>) {
        let chain = self.discover_chain(head, source);

        let tail = chain.last().expect("chain starts at its head");
        if let Some(device) = self.device_of(tail).cloned() {
            if let Some(slots) = self.devices.get_mut(&device) {
                slots.begin_vacate(tail.clone());
            }
        }

        self.link_successors(&chain, None);
        if chain.len() > 1 {
            tracing::debug!(links = chain.len(), "arbiter.chain");
        }
        signals.prepare.extend(chain);
    }

    /// Close a rotation: `origin` takes the slot of the last participant, every
    /// participant takes the slot of the one before it.
    fn release_cycle(&mut self, origin: C, ring: Vec<(D, C)>, signals: &mut Signals<C>) {
        let mut members = Vec::with_capacity(ring.len() + 1);
        members.push(origin.clone());
        for (queue_device, participant) in ring {
            if let Some(slots) = self.devices.get_mut(&queue_device) {
                slots.withdraw(&participant);
            }
            members.push(participant);
        }

        self.link_successors(&members, Some(origin));
        tracing::debug!(members = members.len(), "arbiter.cycle");
        signals.prepare.extend(members);
    }
}
