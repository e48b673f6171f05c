//! Opinion-dynamics scheduling drivers (spec.md §4.G): three ways of
//! deciding which nodes/groups update on a given step, layered over the
//! pure functions in [`super::kernels`].

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use super::kernels::{deffuant_weisbuch_group, hegselmann_krause, voter_model};
use crate::hypergraph::Hypergraph;
use crate::status::OpinionStatus;
use crate::{EdgeId, Node};

fn seeded_rng(seed: Option<u64>) -> Pcg64Mcg {
    match seed {
        Some(s) => Pcg64Mcg::seed_from_u64(s),
        None => Pcg64Mcg::seed_from_u64(0x5eed_0000_dead_beef),
    }
}

fn edge_ids(hypergraph: &Hypergraph) -> Vec<EdgeId> {
    hypergraph.iter_edges().map(|(&id, _)| id).collect()
}

/// Random-group continuous driver: each step, pick one hyperedge uniformly
/// and apply [`deffuant_weisbuch_group`] across its members. Returns the
/// opinion snapshot after every step (`trace[0]` is the initial state).
pub fn run_random_group_deffuant_weisbuch(
    hypergraph: &Hypergraph,
    initial: AHashMap<Node, f64>,
    epsilon: f64,
    mu: f64,
    steps: usize,
    seed: Option<u64>,
) -> Vec<AHashMap<Node, f64>> {
    let mut rng = seeded_rng(seed);
    let edges = edge_ids(hypergraph);
    let mut opinions = initial;
    let mut trace = vec![opinions.clone()];

    if edges.is_empty() {
        return trace;
    }

    for _ in 0..steps {
        let edge_id = edges[rng.gen_range(0..edges.len())];
        let members = hypergraph.members(edge_id).unwrap();
        let current: Vec<f64> = members.iter().map(|n| opinions[n]).collect();
        if let Some(updated) = deffuant_weisbuch_group(&current, epsilon, mu) {
            for (&node, value) in members.iter().zip(updated) {
                opinions.insert(node, value);
            }
        }
        trace.push(opinions.clone());
    }
    trace
}

/// Random-node-and-group discrete driver: each step, pick a node uniformly,
/// then a random incident hyperedge of that node, then adopt the edge's
/// unanimous other-member opinion (if any) with probability `p_adoption` via
/// [`voter_model`]. A node with no incident edges is simply never chosen to
/// update (it is skipped and re-drawn).
pub fn run_random_node_voter_model(
    hypergraph: &Hypergraph,
    initial: AHashMap<Node, OpinionStatus>,
    p_adoption: f64,
    steps: usize,
    seed: Option<u64>,
) -> Vec<AHashMap<Node, OpinionStatus>> {
    let mut rng = seeded_rng(seed);
    let nodes: Vec<Node> = hypergraph.nodes().collect();
    let mut opinions = initial;
    let mut trace = vec![opinions.clone()];

    if nodes.is_empty() {
        return trace;
    }

    for _ in 0..steps {
        let node = nodes[rng.gen_range(0..nodes.len())];
        let memberships: Vec<EdgeId> = hypergraph.memberships(node).iter().copied().collect();
        if memberships.is_empty() {
            trace.push(opinions.clone());
            continue;
        }
        let edge_id = memberships[rng.gen_range(0..memberships.len())];
        let members = hypergraph.members(edge_id).unwrap();
        let own = opinions[&node];
        let neighbor_opinions: Vec<OpinionStatus> = members
            .iter()
            .filter(|&&m| m != node)
            .map(|m| opinions[m])
            .collect();
        let new_opinion = voter_model(own, &neighbor_opinions, p_adoption, &mut rng);
        opinions.insert(node, new_opinion);
        trace.push(opinions.clone());
    }
    trace
}

/// Synchronous continuous driver: every step, every node's next opinion is
/// the [`hegselmann_krause`] average over the subset of its incident edges
/// whose own discordance is low enough, computed from a frozen snapshot so
/// the update order cannot matter (same "read snapshot, write disjoint map"
/// discipline as [`crate::drivers::discrete`]).
pub fn run_synchronous_hegselmann_krause(
    hypergraph: &Hypergraph,
    initial: AHashMap<Node, f64>,
    epsilon: f64,
    steps: usize,
) -> Vec<AHashMap<Node, f64>> {
    let mut opinions = initial;
    let mut trace = vec![opinions.clone()];

    for _ in 0..steps {
        let snapshot = opinions.clone();
        let mut next = AHashMap::with_capacity(snapshot.len());
        for (&node, &own) in &snapshot {
            let edges: Vec<Vec<f64>> = hypergraph
                .memberships(node)
                .iter()
                .map(|&edge_id| {
                    hypergraph
                        .members(edge_id)
                        .unwrap()
                        .iter()
                        .map(|m| snapshot[m])
                        .collect()
                })
                .collect();
            next.insert(node, hegselmann_krause(own, &edges, epsilon));
        }
        opinions = next;
        trace.push(opinions.clone());
    }
    trace
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph() -> Hypergraph {
        Hypergraph::from_edges(vec![vec![1, 2], vec![2, 3], vec![3, 4]])
    }

    #[test]
    fn random_group_dw_preserves_node_set() {
        let hg = line_graph();
        let initial: AHashMap<Node, f64> = [(1, 0.1), (2, 0.15), (3, 0.8), (4, 0.85)]
            .into_iter()
            .collect();
        let trace = run_random_group_deffuant_weisbuch(&hg, initial, 0.2, 0.5, 50, Some(11));
        for snapshot in &trace {
            assert_eq!(snapshot.len(), 4);
        }
    }

    #[test]
    fn synchronous_hk_converges_within_a_tight_bound() {
        let hg = line_graph();
        let initial: AHashMap<Node, f64> = [(1, 0.50), (2, 0.51), (3, 0.49), (4, 0.50)]
            .into_iter()
            .collect();
        let trace = run_synchronous_hegselmann_krause(&hg, initial, 1.0, 10);
        let last = trace.last().unwrap();
        let spread = last.values().cloned().fold(f64::MIN, f64::max)
            - last.values().cloned().fold(f64::MAX, f64::min);
        assert!(spread < 0.05);
    }

    #[test]
    fn voter_model_keeps_every_opinion_in_the_original_set() {
        let hg = line_graph();
        let initial: AHashMap<Node, OpinionStatus> = [
            (1, OpinionStatus::Discrete(0)),
            (2, OpinionStatus::Discrete(1)),
            (3, OpinionStatus::Discrete(0)),
            (4, OpinionStatus::Discrete(1)),
        ]
        .into_iter()
        .collect();
        let trace = run_random_node_voter_model(&hg, initial, 1.0, 30, Some(4));
        for snapshot in &trace {
            for v in snapshot.values() {
                assert!(matches!(v, OpinionStatus::Discrete(0) | OpinionStatus::Discrete(1)));
            }
        }
    }
}
