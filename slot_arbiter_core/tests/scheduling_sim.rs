//! Single-threaded scheduling simulation.
//!
//! Stands in for the supervisor: keeps every admitted transfer with its two gates,
//! opens gates as the arbiter's signals say, and advances a random ready transfer
//! one phase at a time. Tracks physical residency to check that no device ever
//! holds more components than slots.

use std::collections::HashMap;

use proptest::prelude::*;
use slot_arbiter_core::*;

type Id = &'static str;

const DEVICES: [(Id, usize); 4] = [("d0", 2), ("d1", 1), ("d2", 3), ("d3", 2)];
const COMPONENTS: [Id; 8] = ["c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Prepare,
    Perform,
}

#[derive(Debug)]
struct Flight {
    req: TransferRequest<Id, Id>,
    phase: Phase,
    prepare_open: bool,
    perform_open: bool,
}

impl Flight {
    fn ready(&self) -> bool {
        match self.phase {
            Phase::Prepare => self.prepare_open,
            Phase::Perform => self.perform_open,
        }
    }
}

struct Sim {
    state: ArbiterState<Id, Id>,
    flights: Vec<Flight>,
    resident: HashMap<Id, usize>,
}

impl Sim {
    /// Every device full: slot `i` of the flattened device list holds `COMPONENTS[i]`.
    fn saturated() -> Self {
        let mut cfg = ArbiterCfg::new();
        let mut resident = HashMap::new();
        let mut next = COMPONENTS.iter();
        for (device, slots) in DEVICES {
            cfg = cfg.with_device(device, slots);
            for _ in 0..slots {
                let component = next.next().expect("enough components");
                cfg = cfg.with_component(*component, device);
            }
            resident.insert(device, slots);
        }
        Self {
            state: ArbiterState::new(cfg).expect("valid cfg"),
            flights: Vec::new(),
            resident,
        }
    }

    fn capacity(device: Id) -> usize {
        DEVICES
            .iter()
            .find(|(d, _)| *d == device)
            .map(|(_, slots)| *slots)
            .expect("known device")
    }

    fn flight(&mut self, component: Id) -> &mut Flight {
        self.flights
            .iter_mut()
            .find(|f| f.req.component == component)
            .expect("signal for an admitted transfer")
    }

    fn open(&mut self, signals: Signals<Id>) {
        for c in signals.prepare {
            let f = self.flight(c);
            assert!(!f.prepare_open, "prepare gate of {c} opened twice");
            f.prepare_open = true;
        }
        for c in signals.perform {
            let f = self.flight(c);
            assert!(!f.perform_open, "perform gate of {c} opened twice");
            f.perform_open = true;
        }
    }

    fn submit(&mut self, req: TransferRequest<Id, Id>) -> bool {
        let before = self.state.snapshot().sorted();
        match self.state.admit(&req) {
            Ok(decision) => {
                self.flights.push(Flight {
                    req,
                    phase: Phase::Prepare,
                    prepare_open: false,
                    perform_open: false,
                });
                self.open(decision.signals);
                true
            }
            Err(_) => {
                assert_eq!(self.state.snapshot().sorted(), before, "rejection mutated state");
                false
            }
        }
    }

    /// Advance one ready transfer by one phase. `false` once nothing can move.
    fn step(&mut self, pick: usize) -> bool {
        let ready: Vec<usize> = (0..self.flights.len()).filter(|&i| self.flights[i].ready()).collect();
        if ready.is_empty() {
            return false;
        }
        let idx = ready[pick % ready.len()];

        match self.flights[idx].phase {
            Phase::Prepare => {
                let req = self.flights[idx].req.clone();
                if let Some(source) = req.source {
                    *self.resident.get_mut(source).expect("known device") -= 1;
                }
                self.flights[idx].phase = Phase::Perform;
                let signals = self.state.prepared(&req);
                self.open(signals);
            }
            Phase::Perform => {
                let flight = self.flights.remove(idx);
                if let Some(destination) = flight.req.destination {
                    let here = self.resident.get_mut(destination).expect("known device");
                    *here += 1;
                    assert!(
                        *here <= Self::capacity(destination),
                        "{destination} over capacity while {} performs",
                        flight.req.component
                    );
                }
                self.state.performed(&flight.req);
            }
        }
        true
    }

    fn drain(&mut self) {
        while self.step(0) {}
    }

    fn check_quiescent(&self) {
        let snap = self.state.snapshot();
        assert!(snap.is_balanced(), "ledger out of balance: {snap:?}");

        for device in &snap.devices {
            assert_eq!(self.resident[device.device], device.occupied);
            if !device.queued.is_empty() {
                assert_eq!((device.free, device.shifting), (0, 0), "{} has room but waiters", device.device);
            }
        }

        // Whatever is left waits in a queue; nothing was let in and then forgotten.
        for f in &self.flights {
            assert_eq!(f.phase, Phase::Prepare);
            assert!(!f.prepare_open);
            let destination = f.req.destination.expect("only transfers with a destination block");
            let queued = &snap.device(&destination).expect("known device").queued;
            assert!(queued.contains(&f.req.component));
        }
    }
}

#[derive(Clone, Debug)]
enum Action {
    Create(usize, usize),
    Move(usize, usize),
    Delete(usize),
    Step(usize),
}

fn action() -> impl Strategy<Value = Action> {
    let c = 0..COMPONENTS.len();
    let d = 0..DEVICES.len();
    prop_oneof![
        1 => (c.clone(), d.clone()).prop_map(|(c, d)| Action::Create(c, d)),
        3 => (c.clone(), d).prop_map(|(c, d)| Action::Move(c, d)),
        1 => c.prop_map(Action::Delete),
        4 => any::<usize>().prop_map(Action::Step),
    ]
}

proptest! {
    #[test]
    fn random_workload_never_overfills_or_strands(actions in prop::collection::vec(action(), 1..80)) {
        let mut sim = Sim::saturated();
        for action in actions {
            match action {
                Action::Create(c, d) => {
                    sim.submit(TransferRequest::create(COMPONENTS[c], DEVICES[d].0));
                }
                Action::Move(c, d) => {
                    let component = COMPONENTS[c];
                    let source = sim.state.device_of(&component).copied().unwrap_or("d0");
                    sim.submit(TransferRequest::relocate(component, source, DEVICES[d].0));
                }
                Action::Delete(c) => {
                    let component = COMPONENTS[c];
                    let source = sim.state.device_of(&component).copied().unwrap_or("d1");
                    sim.submit(TransferRequest::delete(component, source));
                }
                Action::Step(pick) => {
                    sim.step(pick);
                }
            }
        }
        sim.drain();
        sim.check_quiescent();
    }

    #[test]
    fn any_reshuffle_of_a_full_system_completes(
        target in Just((0..COMPONENTS.len()).collect::<Vec<usize>>()).prop_shuffle(),
        order in Just((0..COMPONENTS.len()).collect::<Vec<usize>>()).prop_shuffle(),
        picks in prop::collection::vec(any::<usize>(), COMPONENTS.len()),
    ) {
        let slots: Vec<Id> = DEVICES
            .iter()
            .flat_map(|(device, n)| std::iter::repeat(*device).take(*n))
            .collect();
        let mut sim = Sim::saturated();

        for (n, &i) in order.iter().enumerate() {
            let (source, destination) = (slots[i], slots[target[i]]);
            if source != destination {
                prop_assert!(sim.submit(TransferRequest::relocate(COMPONENTS[i], source, destination)));
            }
            for _ in 0..picks[n] % 3 {
                sim.step(picks[n]);
            }
        }
        sim.drain();

        prop_assert!(sim.flights.is_empty(), "stranded: {:?}", sim.flights);
        sim.check_quiescent();
        for (i, &t) in target.iter().enumerate() {
            prop_assert_eq!(sim.state.device_of(&COMPONENTS[i]), Some(&slots[t]));
        }
    }
}
