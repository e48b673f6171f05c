use ahash::AHashMap;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use crate::hypergraph::Hypergraph;
use crate::status::Status;
use crate::{EdgeId, EventRecord, Node};

/// The explicit, single-owner simulation context that every driver in this
/// crate threads state through, replacing the "ambient module globals (RNG,
/// defaultdict-style status)" the original Python used (Design Notes §9).
///
/// A `Simulation` owns the hypergraph reference, the current status table,
/// the seeded RNG, and the event-emission buffer. Driver-specific auxiliary
/// state (the `IS[k]` weighted indices for the Gillespie driver, the event
/// queue and `rec_time`/`pred_inf_time` maps for the event-driven driver) is
/// built by each driver on top of this shared context rather than folded
/// into it, since those structures are meaningful only to one driver family.
pub struct Simulation<'h> {
    pub hypergraph: &'h Hypergraph,
    pub status: AHashMap<Node, Status>,
    pub rng: Pcg64Mcg,
    pub events: Vec<EventRecord>,
}

impl<'h> Simulation<'h> {
    pub fn new(hypergraph: &'h Hypergraph, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => Pcg64Mcg::seed_from_u64(s),
            // No seed given: still deterministic for a fixed process, just
            // not pinned to a caller-chosen value (spec.md §6: "if null, an
            // unspecified but deterministic seed is chosen").
            None => Pcg64Mcg::seed_from_u64(0x5eed_0000_dead_beef),
        };
        Self {
            hypergraph,
            status: AHashMap::default(),
            rng,
            events: Vec::new(),
        }
    }

    pub fn record_event(
        &mut self,
        time: f64,
        source: Option<EdgeId>,
        target: Node,
        old_state: Status,
        new_state: Status,
    ) {
        self.events.push(EventRecord {
            time,
            source,
            target,
            old_state,
            new_state,
        });
    }

    pub fn set_status(&mut self, node: Node, status: Status) {
        self.status.insert(node, status);
    }

    pub fn status_of(&self, node: Node) -> Status {
        self.status.get(&node).copied().unwrap_or(Status::Susceptible)
    }
}
