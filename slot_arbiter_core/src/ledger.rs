//! Per-device slot accounting.
//!
//! Every slot of a device is in exactly one of three states:
//! - free: physically empty and unclaimed
//! - shifting: its occupant has been granted leave to vacate, but has not yet
//!   finished preparing; the slot is promised to whoever claims it next
//! - occupied: holds a live component
//!
//! `free + shifting + occupied == capacity` whenever no transition is in progress.

use std::collections::VecDeque;

/// Outcome of trying to claim one slot on a device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Claim<C> {
    /// A free slot was taken; the claimant may prepare and perform right away.
    Immediate,
    /// A shifting slot was taken. The claimant may prepare, but must not perform
    /// before the carried component (the slot's current occupant) finished preparing.
    Reserved(C),
    /// Nothing is available.
    Blocked,
}

/// Slot counters and wait queues of one device.
#[derive(Clone, Debug)]
pub struct DeviceSlots<C> {
    capacity: usize,
    free: usize,
    shifting: usize,
    /// Every blocked request targeting this device, in arrival order.
    general_queue: VecDeque<C>,
    /// The blocked moves among `general_queue` (requesters that occupy a device).
    cycle_queue: VecDeque<C>,
    /// Components leaving this device whose slot is not yet claimed by anyone.
    vacating: VecDeque<C>,
}

impl<C: PartialEq> DeviceSlots<C> {
    pub fn new(capacity: usize, occupied: usize) -> Self {
        Self {
            capacity,
            free: capacity.saturating_sub(occupied),
            shifting: 0,
            general_queue: VecDeque::new(),
            cycle_queue: VecDeque::new(),
            vacating: VecDeque::new(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn free(&self) -> usize {
        self.free
    }

    #[inline]
    pub fn shifting(&self) -> usize {
        self.shifting
    }

    pub fn queued(&self) -> usize {
        self.general_queue.len()
    }

    /// Every blocked request, oldest first.
    pub fn waiting(&self) -> impl Iterator<Item = &C> {
        self.general_queue.iter()
    }

    pub fn vacating(&self) -> impl Iterator<Item = &C> {
        self.vacating.iter()
    }

    /// Blocked moves, oldest first.
    pub fn cycle_queue(&self) -> impl Iterator<Item = &C> {
        self.cycle_queue.iter()
    }

    pub fn try_claim(&mut self) -> Claim<C> {
        if self.free > 0 {
            self.free -= 1;
            return Claim::Immediate;
        }
        if self.shifting > 0 {
            if let Some(waker) = self.vacating.pop_front() {
                self.shifting -= 1;
                return Claim::Reserved(waker);
            }
        }
        Claim::Blocked
    }

    /// Park a blocked request. Only requesters that currently occupy a device can
    /// take part in a rotation, so fresh creations stay out of the cycle queue.
    pub fn enqueue(&mut self, component: C, occupies_device: bool)
    where
        C: Clone,
    {
        if occupies_device {
            self.cycle_queue.push_back(component.clone());
        }
        self.general_queue.push_back(component);
    }

    /// Pop the oldest blocked request, whatever its kind.
    pub fn dequeue_oldest(&mut self) -> Option<C> {
        let next = self.general_queue.pop_front()?;
        remove_first(&mut self.cycle_queue, &next);
        Some(next)
    }

    /// Remove one specific blocked request from both queues.
    pub fn withdraw(&mut self, component: &C) {
        remove_first(&mut self.general_queue, component);
        remove_first(&mut self.cycle_queue, component);
    }

    pub fn begin_vacate(&mut self, component: C) {
        self.shifting += 1;
        self.vacating.push_back(component);
    }

    /// Turn the reservation held by `component` back into a free slot.
    /// Only valid when nobody claimed it in the meantime.
    pub fn complete_vacate(&mut self, component: &C) {
        debug_assert!(self.shifting > 0, "complete_vacate without a shifting slot");
        self.shifting -= 1;
        self.free += 1;
        remove_first(&mut self.vacating, component);
    }
}

fn remove_first<C: PartialEq>(queue: &mut VecDeque<C>, component: &C) -> bool {
    match queue.iter().position(|c| c == component) {
        Some(idx) => {
            queue.remove(idx);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_prefers_free_then_shifting() {
        let mut slots: DeviceSlots<&str> = DeviceSlots::new(2, 1);
        assert_eq!(slots.try_claim(), Claim::Immediate);
        assert_eq!(slots.try_claim(), Claim::Blocked);

        slots.begin_vacate("a");
        slots.begin_vacate("b");
        assert_eq!(slots.try_claim(), Claim::Reserved("a"));
        assert_eq!(slots.shifting(), 1);
        assert_eq!(slots.vacating().copied().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn complete_vacate_frees_the_slot() {
        let mut slots: DeviceSlots<&str> = DeviceSlots::new(1, 1);
        slots.begin_vacate("a");
        slots.complete_vacate(&"a");
        assert_eq!((slots.free(), slots.shifting()), (1, 0));
        assert_eq!(slots.vacating().count(), 0);
    }

    #[test]
    fn creations_skip_the_cycle_queue() {
        let mut slots: DeviceSlots<&str> = DeviceSlots::new(1, 1);
        slots.enqueue("new", false);
        slots.enqueue("mover", true);
        assert_eq!(slots.queued(), 2);
        assert_eq!(slots.cycle_queue().copied().collect::<Vec<_>>(), vec!["mover"]);

        assert_eq!(slots.dequeue_oldest(), Some("new"));
        assert_eq!(slots.dequeue_oldest(), Some("mover"));
        assert_eq!(slots.cycle_queue().count(), 0);
        assert_eq!(slots.dequeue_oldest(), None);
    }

    #[test]
    fn withdraw_removes_from_both_queues() {
        let mut slots: DeviceSlots<u32> = DeviceSlots::new(1, 1);
        slots.enqueue(1, true);
        slots.enqueue(2, true);
        slots.withdraw(&1);
        assert_eq!(slots.queued(), 1);
        assert_eq!(slots.cycle_queue().copied().collect::<Vec<_>>(), vec![2]);
    }
}
