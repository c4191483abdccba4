//! Wait-graph resolution among blocked transfers.
//!
//! Blocked moves form a graph: a device points at every component queued to
//! enter it, and a component points at the device it currently occupies. Two
//! shapes in this graph let blocked transfers proceed without an externally
//! freed slot:
//!
//! - a **cycle**: components that each want the slot the next one vacates
//! - a **chain**: a departing component frees a slot for the oldest waiter of its
//!   device, whose departure frees a slot for the next waiter, and so on
//!
//! Cycles are searched when a move blocks; chains are released whenever a
//! transfer is granted leave to prepare. Both take the first match in queue
//! arrival order.

use std::collections::HashSet;

use crate::key::Key;
use crate::state::ArbiterState;

impl<D: Key, C: Key> ArbiterState<D, C> {
    /// Search for blocked moves that close a rotation from `source` back to `destination`.
    ///
    /// Walks the cycle queue of `source` (moves waiting for the slot the requester
    /// will vacate), then the cycle queue of each visited component's device, until a
    /// component currently on `destination` is reached. Returns the participants in
    /// walk order, each paired with the device whose queue it waits in.
    pub(crate) fn find_cycle(&self, source: &D, destination: &D) -> Option<Vec<(D, C)>> {
        // (device whose cycle queue is being walked, next queue index)
        let mut frames: Vec<(D, usize)> = vec![(source.clone(), 0)];
        // path[i] was found in frames[i].0's queue and opened frames[i + 1]
        let mut path: Vec<(D, C)> = Vec::new();
        // The graph does not change during the search, so a device is walked at most once.
        let mut explored: HashSet<D> = HashSet::new();
        explored.insert(source.clone());

        loop {
            let (device, cursor) = frames.last_mut()?;
            let entry = self
                .devices
                .get(&*device)
                .and_then(|slots| slots.cycle_queue().nth(*cursor).cloned());
            *cursor += 1;
            let device = device.clone();

            let Some(next) = entry else {
                frames.pop();
                path.pop();
                continue;
            };
            let Some(next_device) = self.device_of(&next).cloned() else {
                continue;
            };

            path.push((device, next));
            if &next_device == destination {
                return Some(path);
            }
            if explored.insert(next_device.clone()) {
                frames.push((next_device, 0));
            } else {
                path.pop();
            }
        }
    }

    /// Pop the chain of waiters unblocked by `head` leaving `source`.
    ///
    /// Returns the links head first. The terminal link either is a fresh creation,
    /// or sits on a device nobody waits for.
    pub(crate) fn discover_chain(&mut self, head: C, source: Option<D>) -> Vec<C> {
        let mut chain = vec![head];
        let mut device = source;
        while let Some(current) = device {
            let Some(next) = self.devices.get_mut(&current).and_then(|slots| slots.dequeue_oldest()) else {
                break;
            };
            device = self.device_of(&next).cloned();
            chain.push(next);
        }
        chain
    }

    /// Point every link at the one after it; the last link hands off to `last`.
    pub(crate) fn link_successors(&mut self, links: &[C], last: Option<C>) {
        let mut next = last;
        for link in links.iter().rev() {
            if let Some(record) = self.components.get_mut(link) {
                record.successor = next;
            }
            next = Some(link.clone());
        }
    }
}
