//! Discrete-time SIR/SIS driver (spec.md §4.F-adjacent synchronous-update
//! variant): every node's next status is computed from a frozen snapshot of
//! the current step, then the whole population is swapped over at once.
//!
//! The reference implementation this crate is grounded on computes
//! `new_status` by aliasing the live status table (`new_status = status`)
//! and then mutates entries of `new_status` while still reading from it for
//! later nodes in the same step, which makes the update order-dependent.
//! This driver reads only from an immutable snapshot while building a
//! disjoint map of next-states, so a step's outcome cannot depend on
//! iteration order over `hypergraph.nodes()`.

use ahash::AHashMap;
use rand::Rng;

use super::{
    check_finite, edge_weight_lookup, node_weight_lookup, resolve_initial_infecteds,
    validate_known_nodes, validate_rates,
};
use crate::error::Result;
use crate::hypergraph::Hypergraph;
use crate::kernels::ContagionKernel;
use crate::simulation::Simulation;
use crate::status::Status;
use crate::{EdgeId, InitialCondition, Node, SimulationOutput};

enum Kind {
    Sir,
    Sis,
}

struct Options<'a> {
    tau: &'a AHashMap<usize, f64>,
    gamma: f64,
    dt: f64,
    kernel: &'a dyn ContagionKernel,
    initial_infecteds: InitialCondition,
    initial_recovereds: Vec<Node>,
    tmin: f64,
    tmax: f64,
    recovery_weight: Option<&'a AHashMap<Node, f64>>,
    transmission_weight: Option<&'a AHashMap<EdgeId, f64>>,
    return_event_data: bool,
    seed: Option<u64>,
}

fn run_discrete(hypergraph: &Hypergraph, opts: Options, kind: Kind) -> Result<SimulationOutput> {
    validate_rates(opts.tau, opts.gamma)?;
    if opts.dt <= 0.0 {
        return Err(crate::error::HyperContagionError::NegativeRate {
            name: "dt",
            value: opts.dt,
        });
    }
    validate_known_nodes(hypergraph, &opts.initial_recovereds)?;

    let mut sim = Simulation::new(hypergraph, opts.seed);
    let edgeweight = edge_weight_lookup(hypergraph, opts.transmission_weight);
    let nodeweight = node_weight_lookup(opts.recovery_weight);

    let initial_infecteds =
        resolve_initial_infecteds(hypergraph, &opts.initial_infecteds, &mut sim.rng)?;
    for &node in &opts.initial_recovereds {
        sim.set_status(node, Status::Recovered);
    }
    for &node in &initial_infecteds {
        sim.set_status(node, Status::Infected);
    }

    let nodes: Vec<Node> = hypergraph.nodes().collect();
    let mut times = vec![opts.tmin];
    let mut s_series = vec![hypergraph.num_nodes() - initial_infecteds.len() - opts.initial_recovereds.len()];
    let mut i_series = vec![initial_infecteds.len()];
    let mut r_series = vec![opts.initial_recovereds.len()];

    let mut t = opts.tmin;
    while t < opts.tmax {
        let snapshot = sim.status.clone();
        let any_infected = snapshot.values().any(|s| s.is_infected());
        if !any_infected {
            break;
        }

        let mut next = AHashMap::with_capacity(snapshot.len());
        for &node in &nodes {
            let current = snapshot.get(&node).copied().unwrap_or(Status::Susceptible);
            let updated = match current {
                Status::Infected => {
                    let recovery_prob = 1.0 - (-opts.gamma * nodeweight(node) * opts.dt).exp();
                    if sim.rng.gen::<f64>() < recovery_prob {
                        match kind {
                            Kind::Sir => Status::Recovered,
                            Kind::Sis => Status::Susceptible,
                        }
                    } else {
                        Status::Infected
                    }
                }
                Status::Susceptible => {
                    let mut total_rate = 0.0;
                    for &edge_id in hypergraph.memberships(node) {
                        let members = hypergraph.members(edge_id).unwrap();
                        let contagion = check_finite(
                            opts.kernel.evaluate(node, &snapshot, members, &mut sim.rng),
                            node,
                        )?;
                        if contagion <= 0.0 {
                            continue;
                        }
                        let rate = opts.tau.get(&members.len()).copied().unwrap_or(0.0);
                        total_rate += rate * contagion * edgeweight(edge_id);
                    }
                    let infection_prob = 1.0 - (-total_rate * opts.dt).exp();
                    if total_rate > 0.0 && sim.rng.gen::<f64>() < infection_prob {
                        Status::Infected
                    } else {
                        Status::Susceptible
                    }
                }
                Status::Recovered => Status::Recovered,
            };
            if updated != current && opts.return_event_data {
                sim.record_event(t + opts.dt, None, node, current, updated);
            }
            next.insert(node, updated);
        }
        sim.status = next;
        t += opts.dt;

        let s = sim.status.values().filter(|s| s.is_susceptible()).count();
        let i = sim.status.values().filter(|s| s.is_infected()).count();
        let r = sim.status.values().filter(|s| s.is_recovered()).count();
        times.push(t);
        s_series.push(s);
        i_series.push(i);
        r_series.push(r);
    }

    if opts.return_event_data {
        return Ok(SimulationOutput::Events(sim.events));
    }
    match kind {
        Kind::Sir => Ok(SimulationOutput::Sir {
            times,
            s: s_series,
            i: i_series,
            r: r_series,
        }),
        Kind::Sis => Ok(SimulationOutput::Sis {
            times,
            s: s_series,
            i: i_series,
        }),
    }
}

/// Discrete-time, synchronous-update SIR simulation with fixed step `dt`.
#[allow(clippy::too_many_arguments)]
pub fn run_discrete_sir(
    hypergraph: &Hypergraph,
    tau: &AHashMap<usize, f64>,
    gamma: f64,
    dt: f64,
    kernel: &dyn ContagionKernel,
    initial_infecteds: InitialCondition,
    initial_recovereds: Vec<Node>,
    tmin: f64,
    tmax: f64,
    recovery_weight: Option<&AHashMap<Node, f64>>,
    transmission_weight: Option<&AHashMap<EdgeId, f64>>,
    return_event_data: bool,
    seed: Option<u64>,
) -> Result<SimulationOutput> {
    run_discrete(
        hypergraph,
        Options {
            tau,
            gamma,
            dt,
            kernel,
            initial_infecteds,
            initial_recovereds,
            tmin,
            tmax,
            recovery_weight,
            transmission_weight,
            return_event_data,
            seed,
        },
        Kind::Sir,
    )
}

/// Discrete-time, synchronous-update SIS simulation with fixed step `dt`.
#[allow(clippy::too_many_arguments)]
pub fn run_discrete_sis(
    hypergraph: &Hypergraph,
    tau: &AHashMap<usize, f64>,
    gamma: f64,
    dt: f64,
    kernel: &dyn ContagionKernel,
    initial_infecteds: InitialCondition,
    tmin: f64,
    tmax: f64,
    recovery_weight: Option<&AHashMap<Node, f64>>,
    transmission_weight: Option<&AHashMap<EdgeId, f64>>,
    return_event_data: bool,
    seed: Option<u64>,
) -> Result<SimulationOutput> {
    run_discrete(
        hypergraph,
        Options {
            tau,
            gamma,
            dt,
            kernel,
            initial_infecteds,
            initial_recovereds: Vec::new(),
            tmin,
            tmax,
            recovery_weight,
            transmission_weight,
            return_event_data,
            seed,
        },
        Kind::Sis,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::Collective;

    #[test]
    fn sis_discrete_conserves_population_each_step() {
        let hg = Hypergraph::from_edges(vec![vec![1, 2, 3], vec![3, 4]]);
        let tau: AHashMap<usize, f64> = [(2, 1.0), (3, 1.0)].into_iter().collect();
        let output = run_discrete_sis(
            &hg,
            &tau,
            0.5,
            0.1,
            &Collective,
            InitialCondition::Nodes(vec![1, 2]),
            0.0,
            5.0,
            None,
            None,
            false,
            Some(3),
        )
        .unwrap();
        match output {
            SimulationOutput::Sis { s, i, .. } => {
                for idx in 0..s.len() {
                    assert_eq!(s[idx] + i[idx], hg.num_nodes());
                }
            }
            _ => panic!("expected Sis output"),
        }
    }

    #[test]
    fn rejects_non_positive_dt() {
        let hg = Hypergraph::from_edges(vec![vec![1, 2]]);
        let tau: AHashMap<usize, f64> = [(2, 1.0)].into_iter().collect();
        let result = run_discrete_sis(
            &hg,
            &tau,
            0.5,
            0.0,
            &Collective,
            InitialCondition::Nodes(vec![1]),
            0.0,
            5.0,
            None,
            None,
            false,
            Some(1),
        );
        assert!(result.is_err());
    }
}
