pub mod discrete;
pub mod event_driven;
pub mod gillespie;

use ahash::AHashMap;
use rand::Rng;

use crate::error::{HyperContagionError, Result};
use crate::hypergraph::Hypergraph;
use crate::{EdgeId, InitialCondition, Node};

/// Resolves an [`InitialCondition`] against a hypergraph, validating the
/// "ρ and initial_infecteds are mutually exclusive" rule documented in
/// spec.md §4.E / §6 — callers only ever hit this through the enum's two
/// variants, but a caller-constructed `Fraction` outside `[0, 1]` is still
/// checked here.
pub(crate) fn resolve_initial_infecteds(
    hypergraph: &Hypergraph,
    initial: &InitialCondition,
    rng: &mut impl Rng,
) -> Result<Vec<Node>> {
    match initial {
        InitialCondition::Nodes(nodes) => {
            validate_known_nodes(hypergraph, nodes)?;
            Ok(nodes.clone())
        }
        InitialCondition::Fraction(rho) => {
            if !(0.0..=1.0).contains(rho) {
                return Err(HyperContagionError::NegativeRate {
                    name: "rho",
                    value: *rho,
                });
            }
            let all: Vec<Node> = hypergraph.nodes().collect();
            let count = (all.len() as f64 * rho).round() as usize;
            Ok(sample_without_replacement(&all, count, rng))
        }
    }
}

fn sample_without_replacement(pool: &[Node], count: usize, rng: &mut impl Rng) -> Vec<Node> {
    use rand::seq::SliceRandom;
    let mut shuffled = pool.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(count.min(shuffled.len()));
    shuffled
}

/// Rejects any node not present in `hypergraph` — callers build
/// `InitialCondition::Nodes`/`initial_recovereds` from their own bookkeeping,
/// so a stale or mistyped node id is a caller-contract violation, not a
/// silent no-op (spec.md §7).
pub(crate) fn validate_known_nodes(hypergraph: &Hypergraph, nodes: &[Node]) -> Result<()> {
    for &node in nodes {
        if !hypergraph.contains_node(node) {
            return Err(HyperContagionError::UnknownNode(node));
        }
    }
    Ok(())
}

/// Rejects a non-finite contagion value returned by a (possibly
/// caller-supplied) [`crate::kernels::ContagionKernel`] before it reaches
/// rate bookkeeping or `WeightedIndex` — the five built-in kernels only ever
/// return `0.0`, `1.0`, or a non-negative integer count, so this only fires
/// for a custom kernel implementation (spec.md §7, "kernel returns a
/// non-finite value").
pub(crate) fn check_finite(contagion: f64, node: Node) -> Result<f64> {
    if contagion.is_finite() {
        Ok(contagion)
    } else {
        Err(HyperContagionError::NonFiniteKernel { node })
    }
}

pub(crate) fn validate_rates(tau: &AHashMap<usize, f64>, gamma: f64) -> Result<()> {
    if gamma < 0.0 {
        return Err(HyperContagionError::NegativeRate {
            name: "gamma",
            value: gamma,
        });
    }
    for (&size, &rate) in tau {
        if rate < 0.0 {
            return Err(HyperContagionError::NegativeRate {
                name: "tau",
                value: rate,
            });
        }
        let _ = size;
    }
    Ok(())
}

pub(crate) fn edge_weight_lookup<'a>(
    hypergraph: &'a Hypergraph,
    weights: Option<&'a AHashMap<EdgeId, f64>>,
) -> impl Fn(EdgeId) -> f64 + 'a {
    move |edge_id| {
        weights
            .and_then(|w| w.get(&edge_id).copied())
            .unwrap_or_else(|| hypergraph.edge_weight(edge_id).unwrap_or(1.0))
    }
}

pub(crate) fn node_weight_lookup<'a>(
    weights: Option<&'a AHashMap<Node, f64>>,
) -> impl Fn(Node) -> f64 + 'a {
    move |node| weights.and_then(|w| w.get(&node).copied()).unwrap_or(1.0)
}
