use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{EdgeId, Node};

/// A scheduled, tagged transition — no boxed closures in the queue (Design
/// Notes §9: "prefer explicit tagged variants... avoids boxing function
/// pointers").
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Transmission { source_edge: EdgeId, target: Node },
    Recovery { node: Node },
}

#[derive(Debug, Clone)]
struct Scheduled {
    time: f64,
    seq: u64,
    event: SimEvent,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the smallest
        // (time, seq) pair first — the idiom used throughout event-driven
        // simulators built on `std::collections::BinaryHeap`.
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Bounded-horizon min-priority queue of scheduled events, ordered strictly
/// by `(time, seq)` so that events sharing a timestamp run in insertion
/// order — the deterministic tie-break spec.md §4.B and §5 require.
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    tmax: f64,
    next_seq: u64,
}

impl EventQueue {
    pub fn new(tmax: f64) -> Self {
        Self {
            heap: BinaryHeap::new(),
            tmax,
            next_seq: 0,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(f64::INFINITY)
    }

    /// Enqueues `event` at `time`. Silently dropped if `time >= tmax`.
    pub fn add(&mut self, time: f64, event: SimEvent) {
        if time < self.tmax {
            self.heap.push(Scheduled {
                time,
                seq: self.next_seq,
                event,
            });
            self.next_seq += 1;
        }
    }

    /// Removes and returns the earliest-time entry, if any.
    pub fn pop(&mut self) -> Option<(f64, SimEvent)> {
        self.heap.pop().map(|s| (s.time, s.event))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut q = EventQueue::unbounded();
        q.add(3.0, SimEvent::Recovery { node: 1 });
        q.add(1.0, SimEvent::Recovery { node: 2 });
        q.add(2.0, SimEvent::Recovery { node: 3 });

        let order: Vec<f64> = std::iter::from_fn(|| q.pop().map(|(t, _)| t)).collect();
        assert_eq!(order, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let mut q = EventQueue::unbounded();
        q.add(1.0, SimEvent::Recovery { node: 1 });
        q.add(1.0, SimEvent::Recovery { node: 2 });
        q.add(1.0, SimEvent::Recovery { node: 3 });

        let order: Vec<Node> = std::iter::from_fn(|| {
            q.pop().map(|(_, e)| match e {
                SimEvent::Recovery { node } => node,
                _ => unreachable!(),
            })
        })
        .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn events_past_tmax_are_dropped() {
        let mut q = EventQueue::new(5.0);
        q.add(4.9, SimEvent::Recovery { node: 1 });
        q.add(5.0, SimEvent::Recovery { node: 2 });
        q.add(10.0, SimEvent::Recovery { node: 3 });
        assert_eq!(q.len(), 1);
    }
}
