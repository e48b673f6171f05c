//! Continuous-time Gillespie direct-method SIR/SIS driver (spec.md §4.E).

use ahash::AHashMap;
use rand::Rng;
use rand_distr::{Distribution, Exp};

use super::{
    check_finite, edge_weight_lookup, node_weight_lookup, resolve_initial_infecteds,
    validate_known_nodes, validate_rates,
};
use crate::error::Result;
use crate::hypergraph::Hypergraph;
use crate::kernels::ContagionKernel;
use crate::simulation::Simulation;
use crate::status::Status;
use crate::weighted_index::WeightedIndex;
use crate::{EdgeId, InitialCondition, Node, SimulationOutput};

enum Kind {
    Sir,
    Sis,
}

struct Options<'a> {
    tau: &'a AHashMap<usize, f64>,
    gamma: f64,
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

/// Maintains `IS[k]` (the susceptible-target transmission opportunities of
/// size-`k` edges) and `infecteds`, and keeps `total_rates` in sync with
/// them, per the Gillespie state described in spec.md §4.E.
struct GillespieState {
    infecteds: WeightedIndex<Node>,
    is_links: AHashMap<usize, WeightedIndex<(EdgeId, Node)>>,
    total_rates: AHashMap<usize, f64>,
}

impl GillespieState {
    fn new(hypergraph: &Hypergraph) -> Self {
        let is_links = hypergraph
            .unique_edge_sizes()
            .iter()
            .map(|&size| (size, WeightedIndex::new()))
            .collect();
        Self {
            infecteds: WeightedIndex::new(),
            is_links,
            total_rates: AHashMap::default(),
        }
    }

    fn recompute_rates(&mut self, tau: &AHashMap<usize, f64>, gamma: f64) {
        self.total_rates.clear();
        self.total_rates
            .insert(0, gamma * self.infecteds.total_weight());
        for (&size, links) in &self.is_links {
            let rate = tau.get(&size).copied().unwrap_or(0.0);
            self.total_rates.insert(size, rate * links.total_weight());
        }
    }

    fn total_rate(&self) -> f64 {
        self.total_rates.values().sum()
    }

    /// Two-level rejection sampler over the channel keys: draw uniformly,
    /// accept with probability `rate / total`, repeat (spec.md §4.E step 2).
    fn choose_channel(&self, total: f64, rng: &mut dyn rand::RngCore) -> usize {
        let keys: Vec<usize> = self.total_rates.keys().copied().collect();
        loop {
            let candidate = keys[rng.gen_range(0..keys.len())];
            let rate = self.total_rates[&candidate];
            if rng.gen::<f64>() < rate / total {
                return candidate;
            }
        }
    }

    /// Re-evaluates the kernel for every susceptible neighbor of every edge
    /// incident to `node` and updates `IS[k]` membership accordingly.
    /// Shared by the post-infection and post-recovery incidence updates.
    fn refresh_susceptible_neighbors(
        &mut self,
        hypergraph: &Hypergraph,
        status: &AHashMap<Node, Status>,
        kernel: &dyn ContagionKernel,
        edgeweight: &dyn Fn(EdgeId) -> f64,
        node: Node,
        rng: &mut dyn rand::RngCore,
    ) -> Result<()> {
        for &edge_id in hypergraph.memberships(node) {
            let members = hypergraph.members(edge_id).unwrap();
            let size = members.len();
            for &v in members {
                if v == node {
                    continue;
                }
                if status.get(&v).copied().unwrap_or(Status::Susceptible).is_susceptible() {
                    let contagion = check_finite(kernel.evaluate(v, status, members, rng), v)?;
                    let key = (edge_id, v);
                    if contagion != 0.0 {
                        self.is_links
                            .entry(size)
                            .or_default()
                            .insert(key, edgeweight(edge_id));
                    } else {
                        self.is_links.entry(size).or_default().remove(&key);
                    }
                }
            }
        }
        Ok(())
    }

    fn remove_susceptible_opportunities(&mut self, hypergraph: &Hypergraph, node: Node) {
        for &edge_id in hypergraph.memberships(node) {
            let size = hypergraph.edge_size(edge_id).unwrap();
            self.is_links.entry(size).or_default().remove(&(edge_id, node));
        }
    }
}

fn run_gillespie(
    hypergraph: &Hypergraph,
    opts: Options,
    kind: Kind,
) -> Result<SimulationOutput> {
    validate_rates(opts.tau, opts.gamma)?;
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

    let mut state = GillespieState::new(hypergraph);
    for &node in &initial_infecteds {
        state.infecteds.update(node, nodeweight(node));
    }
    for &node in &initial_infecteds {
        state.refresh_susceptible_neighbors(
            hypergraph,
            &sim.status,
            opts.kernel,
            &edgeweight,
            node,
            &mut sim.rng,
        )?;
    }

    let mut times = vec![opts.tmin];
    let mut s_series = vec![hypergraph.num_nodes() - initial_infecteds.len() - opts.initial_recovereds.len()];
    let mut i_series = vec![initial_infecteds.len()];
    let mut r_series = vec![opts.initial_recovereds.len()];

    state.recompute_rates(opts.tau, opts.gamma);
    let mut t = opts.tmin;

    loop {
        let total = state.total_rate();
        let delay = if total > 0.0 {
            Exp::new(total).unwrap().sample(&mut sim.rng)
        } else {
            f64::INFINITY
        };
        t += delay;
        if t >= opts.tmax || state.infecteds.is_empty() {
            log::info!(
                "gillespie run terminated at t={} (tmax={}, infecteds={})",
                t,
                opts.tmax,
                state.infecteds.len()
            );
            break;
        }

        let channel = state.choose_channel(total, &mut sim.rng);

        if channel == 0 {
            let recovering = state.infecteds.random_removal(&mut sim.rng)?;
            let new_status = match kind {
                Kind::Sir => Status::Recovered,
                Kind::Sis => Status::Susceptible,
            };
            let old_status = sim.status_of(recovering);
            sim.set_status(recovering, new_status);
            if opts.return_event_data {
                sim.record_event(t, None, recovering, old_status, new_status);
            }

            state.refresh_susceptible_neighbors(
                hypergraph,
                &sim.status,
                opts.kernel,
                &edgeweight,
                recovering,
                &mut sim.rng,
            )?;
            if matches!(kind, Kind::Sis) {
                // Re-susceptibility: the recovered-to-susceptible node may
                // itself now be a live transmission target through edges
                // where its neighbors are infected (spec.md §4.E).
                for &edge_id in hypergraph.memberships(recovering) {
                    let members = hypergraph.members(edge_id).unwrap();
                    let contagion = check_finite(
                        opts.kernel.evaluate(recovering, &sim.status, members, &mut sim.rng),
                        recovering,
                    )?;
                    if contagion != 0.0 {
                        state
                            .is_links
                            .entry(members.len())
                            .or_default()
                            .insert((edge_id, recovering), edgeweight(edge_id));
                    }
                }
            }

            times.push(t);
            s_series.push(s_series.last().unwrap() + usize::from(matches!(kind, Kind::Sis)));
            i_series.push(i_series.last().unwrap() - 1);
            if matches!(kind, Kind::Sir) {
                r_series.push(r_series.last().unwrap() + 1);
            }
        } else {
            let &(edge_id, recipient) = state.is_links.get(&channel).unwrap().choose_random(&mut sim.rng)?;
            let old_status = sim.status_of(recipient);
            sim.set_status(recipient, Status::Infected);
            if opts.return_event_data {
                sim.record_event(t, Some(edge_id), recipient, old_status, Status::Infected);
            }

            state.infecteds.update(recipient, nodeweight(recipient));
            state.remove_susceptible_opportunities(hypergraph, recipient);
            state.refresh_susceptible_neighbors(
                hypergraph,
                &sim.status,
                opts.kernel,
                &edgeweight,
                recipient,
                &mut sim.rng,
            )?;

            times.push(t);
            s_series.push(s_series.last().unwrap() - 1);
            i_series.push(i_series.last().unwrap() + 1);
            if matches!(kind, Kind::Sir) {
                r_series.push(*r_series.last().unwrap());
            }
        }

        state.recompute_rates(opts.tau, opts.gamma);
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

/// Continuous-time Gillespie direct-method SIR simulation.
#[allow(clippy::too_many_arguments)]
pub fn run_gillespie_sir(
    hypergraph: &Hypergraph,
    tau: &AHashMap<usize, f64>,
    gamma: f64,
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
    run_gillespie(
        hypergraph,
        Options {
            tau,
            gamma,
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

/// Continuous-time Gillespie direct-method SIS simulation.
#[allow(clippy::too_many_arguments)]
pub fn run_gillespie_sis(
    hypergraph: &Hypergraph,
    tau: &AHashMap<usize, f64>,
    gamma: f64,
    kernel: &dyn ContagionKernel,
    initial_infecteds: InitialCondition,
    tmin: f64,
    tmax: f64,
    recovery_weight: Option<&AHashMap<Node, f64>>,
    transmission_weight: Option<&AHashMap<EdgeId, f64>>,
    return_event_data: bool,
    seed: Option<u64>,
) -> Result<SimulationOutput> {
    run_gillespie(
        hypergraph,
        Options {
            tau,
            gamma,
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
