use crate::Node;

/// Errors surfaced by the crate's public driver and collection APIs.
///
/// Rates of zero and empty absorbing states are *not* errors (see spec
/// `S + I (+ R) = |V|` boundary behaviors); this enum only covers the
/// conditions spec.md §7 documents as domain errors or caller-contract
/// violations.
#[derive(Debug, thiserror::Error)]
pub enum HyperContagionError {
    #[error("conflicting parameters: {0}")]
    ConflictingParameters(&'static str),

    #[error("rate `{name}` must be non-negative, got {value}")]
    NegativeRate { name: &'static str, value: f64 },

    #[error("kernel returned a non-finite value for node {node}")]
    NonFiniteKernel { node: Node },

    #[error("choose_random called on an empty WeightedIndex")]
    EmptySample,

    #[error("node {0} is not present in the hypergraph")]
    UnknownNode(Node),
}

pub type Result<T> = std::result::Result<T, HyperContagionError>;
