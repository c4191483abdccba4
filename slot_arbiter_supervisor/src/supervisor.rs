//! Thread-facing slot supervisor.
//!
//! This is the outside-world facing layer around `slot_arbiter_core`:
//! - owns the `ArbiterState` behind one lock
//! - allocates a pair of one-shot gates per admitted transfer
//! - opens gates as the core's signals say
//! - runs the caller's `prepare`/`perform` on the submitting thread, lock released
//!
//! No async. Every submitting thread parks on its own gates, so a blocked transfer
//! never holds up unrelated bookkeeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use slot_arbiter_core::{
    Admission, ArbiterCfg, ArbiterSnapshot, ArbiterState, ConfigError, Key, Signals, TransferError,
};

use crate::gate::GatePair;
use crate::transfer::ComponentTransfer;

/// Running counters of a supervisor, for logging/monitoring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SupervisorStats {
    /// Transfers that failed validation.
    pub rejected: u64,
    /// Admitted with a free slot, or deletes.
    pub immediate: u64,
    /// Admitted onto a slot still being vacated.
    pub reserved: u64,
    /// Admitted by closing a rotation (counts the closing transfer only).
    pub cycles: u64,
    /// Had to wait in a device queue.
    pub queued: u64,
    /// Transfers that finished perform.
    pub completed: u64,
}

impl SupervisorStats {
    fn record(&mut self, admission: Admission) {
        match admission {
            Admission::Immediate => self.immediate += 1,
            Admission::Reserved => self.reserved += 1,
            Admission::Cycle => self.cycles += 1,
            Admission::Queued => self.queued += 1,
        }
    }
}

#[derive(Debug)]
struct Inner<D, C> {
    state: ArbiterState<D, C>,
    /// Gates of every admitted, not yet completed transfer.
    gates: HashMap<C, Arc<GatePair>>,
    stats: SupervisorStats,
}

impl<D: Key, C: Key> Inner<D, C> {
    fn gates_of(&self, component: &C) -> &GatePair {
        self.gates
            .get(component)
            .expect("signalled component has no gates")
    }

    fn open(&self, signals: &Signals<C>) {
        for component in &signals.prepare {
            tracing::trace!(component = ?component, "slot_arbiter.gate.prepare");
            self.gates_of(component).prepare.open();
        }
        for component in &signals.perform {
            tracing::trace!(component = ?component, "slot_arbiter.gate.perform");
            self.gates_of(component).perform.open();
        }
    }
}

/// Coordinates concurrent create/move/delete transfers over a fixed device set.
///
/// Share it between threads by reference (or in an `Arc`); every method takes `&self`.
#[derive(Debug)]
pub struct SlotSupervisor<D, C> {
    inner: Mutex<Inner<D, C>>,
}

impl<D: Key, C: Key> SlotSupervisor<D, C> {
    pub fn new(cfg: ArbiterCfg<D, C>) -> Result<Self, ConfigError<D, C>> {
        let state = ArbiterState::new(cfg)?;
        Ok(Self {
            inner: Mutex::new(Inner {
                state,
                gates: HashMap::new(),
                stats: SupervisorStats::default(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner<D, C>> {
        self.inner.lock().expect("slot supervisor mutex poisoned")
    }

    /// Run one transfer to completion.
    ///
    /// Fails synchronously, without side effects, if the transfer is invalid against
    /// the current state. Otherwise blocks the calling thread until the transfer's
    /// slot is available, `prepare` and `perform` have run, and the new placement is
    /// committed.
    pub fn execute<T>(&self, transfer: &T) -> Result<(), TransferError<D, C>>
    where
        T: ComponentTransfer<D, C> + ?Sized,
    {
        let req = transfer.request();

        let gates = {
            let mut inner = self.lock();
            let decision = match inner.state.admit(&req) {
                Ok(decision) => decision,
                Err(err) => {
                    inner.stats.rejected += 1;
                    return Err(err);
                }
            };
            let gates = Arc::new(GatePair::default());
            inner.gates.insert(req.component.clone(), Arc::clone(&gates));
            inner.stats.record(decision.admission);
            inner.open(&decision.signals);
            gates
        };

        tracing::trace!(component = ?req.component, "slot_arbiter.wait.prepare");
        gates.prepare.wait();
        transfer.prepare();

        {
            let mut inner = self.lock();
            let signals = inner.state.prepared(&req);
            inner.open(&signals);
        }

        tracing::trace!(component = ?req.component, "slot_arbiter.wait.perform");
        gates.perform.wait();
        transfer.perform();

        let mut inner = self.lock();
        inner.state.performed(&req);
        inner.gates.remove(&req.component);
        inner.stats.completed += 1;
        tracing::debug!(
            component = ?req.component,
            source = ?req.source,
            destination = ?req.destination,
            "slot_arbiter.done"
        );
        Ok(())
    }

    /// Committed device of `component`, if it is placed.
    pub fn device_of(&self, component: &C) -> Option<D> {
        self.lock().state.device_of(component).cloned()
    }

    /// Number of admitted transfers not yet completed, queued ones included.
    pub fn in_flight(&self) -> usize {
        self.lock().gates.len()
    }

    /// Export the ledger, queues and placement as plain data.
    pub fn snapshot(&self) -> ArbiterSnapshot<D, C> {
        self.lock().state.snapshot()
    }

    pub fn stats(&self) -> SupervisorStats {
        self.lock().stats
    }
}
