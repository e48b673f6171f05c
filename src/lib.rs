//! Event-driven simulation of stochastic spreading processes on
//! hypergraphs: SIR/SIS contagion with group-mediated transmission rules,
//! and opinion dynamics (Deffuant–Weisbuch, Hegselmann–Krause, voter).
//!
//! The crate is organised bottom-up around three tightly coupled pieces:
//! a weighted sampling structure ([`weighted_index`]), a time-ordered event
//! queue ([`event_queue`]), and the Gillespie / event-driven drivers built
//! on top of a read-only [`hypergraph::Hypergraph`] view and a pluggable
//! [`kernels::ContagionKernel`].
//!
//! Hypergraph construction/generation, visualisation, and CLI/demo code are
//! deliberately out of scope; this crate exposes a programmatic simulation
//! API only.

pub mod drivers;
pub mod error;
pub mod event_queue;
pub mod hyperedge;
pub mod hypergraph;
pub mod kernels;
pub mod opinions;
pub mod simulation;
pub mod status;
pub mod weighted_index;

pub use error::HyperContagionError;
pub use status::{OpinionStatus, Status};

/// An opaque node label. The crate never interprets node values beyond
/// hashing and equality.
pub type Node = u64;

/// An opaque hyperedge id, assigned sequentially at
/// [`hypergraph::Hypergraph`] construction.
pub type EdgeId = usize;

/// One state transition, emitted when a driver is asked for full event
/// data (`return_event_data = true`).
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub time: f64,
    pub source: Option<EdgeId>,
    pub target: Node,
    pub old_state: Status,
    pub new_state: Status,
}

/// The initial infected set for an epidemic driver: either an explicit
/// node list or a fraction of the hypergraph's nodes to sample uniformly.
/// Replacing the (optional, optional) parameter pair from spec.md §6 with
/// an enum makes "both given" unrepresentable for callers who construct a
/// variant directly. Callers still carrying the original optional-pair
/// shape (e.g. a CLI or FFI boundary parsing `initial_infecteds`/`rho`
/// separately) should go through [`InitialCondition::from_parts`], which
/// returns [`HyperContagionError::ConflictingParameters`] if both are
/// supplied instead of silently picking one.
#[derive(Debug, Clone)]
pub enum InitialCondition {
    Nodes(Vec<Node>),
    Fraction(f64),
}

impl InitialCondition {
    /// Builds an [`InitialCondition`] from the legacy "maybe a node list,
    /// maybe a fraction" parameter pair (spec.md §6), rejecting the case
    /// where both are given rather than preferring one. `(None, None)`
    /// resolves to an empty initial infected set.
    pub fn from_parts(
        nodes: Option<Vec<Node>>,
        rho: Option<f64>,
    ) -> Result<Self, HyperContagionError> {
        match (nodes, rho) {
            (Some(_), Some(_)) => Err(HyperContagionError::ConflictingParameters(
                "initial_infecteds and rho are mutually exclusive",
            )),
            (Some(nodes), None) => Ok(InitialCondition::Nodes(nodes)),
            (None, Some(rho)) => Ok(InitialCondition::Fraction(rho)),
            (None, None) => Ok(InitialCondition::Nodes(Vec::new())),
        }
    }
}

/// Output of an epidemic driver: either the `(times, S, I[, R])` parallel
/// arrays, or the raw event stream, depending on `return_event_data`.
#[derive(Debug, Clone)]
pub enum SimulationOutput {
    Sir {
        times: Vec<f64>,
        s: Vec<usize>,
        i: Vec<usize>,
        r: Vec<usize>,
    },
    Sis {
        times: Vec<f64>,
        s: Vec<usize>,
        i: Vec<usize>,
    },
    Events(Vec<EventRecord>),
}

impl SimulationOutput {
    pub fn events(self) -> Option<Vec<EventRecord>> {
        match self {
            SimulationOutput::Events(events) => Some(events),
            _ => None,
        }
    }
}
