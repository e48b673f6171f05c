//! Non-Markovian event-driven SIR/SIS driver (spec.md §4.F): inter-event
//! delays come from a pluggable [`TimeProvider`] rather than being baked
//! into a single exponential-clock assumption, which is what lets this
//! driver stand apart from [`super::gillespie`].

use ahash::AHashMap;
use rand::RngCore;
use rand_distr::{Distribution, Exp};

use super::{check_finite, edge_weight_lookup, resolve_initial_infecteds, validate_known_nodes};
use crate::error::Result;
use crate::event_queue::{EventQueue, SimEvent};
use crate::hypergraph::Hypergraph;
use crate::kernels::ContagionKernel;
use crate::simulation::Simulation;
use crate::status::Status;
use crate::{EdgeId, InitialCondition, Node, SimulationOutput};

/// Supplies the inter-event delay distributions an event-driven run
/// samples from. `MarkovianProvider` recovers the same exponential-clock
/// semantics as [`super::gillespie`]; a custom implementation can give
/// heavy-tailed or fixed recovery/transmission delays without touching the
/// driver loop (Design Notes §9).
pub trait TimeProvider {
    fn recovery_delay(&self, rng: &mut dyn RngCore) -> f64;
    fn transmission_delay(&self, edge_size: usize, contagion: f64, rng: &mut dyn RngCore) -> f64;
}

/// The exponential-clock `TimeProvider`: `Exp(gamma)` for recovery,
/// `Exp(tau[size] * contagion)` for transmission — a contagion of zero
/// yields an infinite delay (no transmission), matching spec.md §4.D's
/// "rate multiplier" framing of kernel outputs.
pub struct MarkovianProvider<'a> {
    pub tau: &'a AHashMap<usize, f64>,
    pub gamma: f64,
}

impl TimeProvider for MarkovianProvider<'_> {
    fn recovery_delay(&self, rng: &mut dyn RngCore) -> f64 {
        Exp::new(self.gamma).unwrap().sample(rng)
    }

    fn transmission_delay(&self, edge_size: usize, contagion: f64, rng: &mut dyn RngCore) -> f64 {
        let rate = self.tau.get(&edge_size).copied().unwrap_or(0.0) * contagion;
        if rate > 0.0 {
            Exp::new(rate).unwrap().sample(rng)
        } else {
            f64::INFINITY
        }
    }
}

enum Kind {
    Sir,
    Sis,
}

struct Options<'a> {
    provider: &'a dyn TimeProvider,
    kernel: &'a dyn ContagionKernel,
    initial_infecteds: InitialCondition,
    initial_recovereds: Vec<Node>,
    tmin: f64,
    tmax: f64,
    transmission_weight: Option<&'a AHashMap<EdgeId, f64>>,
    return_event_data: bool,
    seed: Option<u64>,
}

/// `pred_inf_time[v]` is the earliest transmission time currently pending
/// for susceptible node `v` — new candidates are only enqueued when they
/// beat it, which bounds queue growth without affecting correctness: a
/// `Transmission` event always re-validates its precondition against the
/// live status table when it fires (see `run_event_driven`), so a
/// pending-but-unscheduled later transmission is never silently missed.
struct EventDrivenState {
    pred_inf_time: AHashMap<Node, f64>,
}

impl EventDrivenState {
    fn new() -> Self {
        Self {
            pred_inf_time: AHashMap::default(),
        }
    }

    /// Re-scans every edge incident to `changed` (a node that just became
    /// infected) and schedules a transmission for every currently-susceptible
    /// member of those edges whose kernel-evaluated contagion is positive.
    /// An SIS node that recovers back to susceptible is not re-scheduled
    /// directly from that transition; it only becomes a candidate again the
    /// next time one of its edge-mates is the `changed` node here.
    #[allow(clippy::too_many_arguments)]
    fn schedule_around(
        &mut self,
        hypergraph: &Hypergraph,
        queue: &mut EventQueue,
        provider: &dyn TimeProvider,
        kernel: &dyn ContagionKernel,
        edgeweight: &dyn Fn(EdgeId) -> f64,
        status: &AHashMap<Node, Status>,
        rng: &mut dyn RngCore,
        changed: Node,
        now: f64,
    ) -> Result<()> {
        for &edge_id in hypergraph.memberships(changed) {
            let members = hypergraph.members(edge_id).unwrap();
            let size = members.len();
            for &target in members {
                if !status.get(&target).copied().unwrap_or(Status::Susceptible).is_susceptible() {
                    continue;
                }
                let contagion = check_finite(kernel.evaluate(target, status, members, rng), target)?
                    * edgeweight(edge_id);
                if contagion <= 0.0 {
                    continue;
                }
                let delay = provider.transmission_delay(size, contagion, rng);
                let candidate = now + delay;
                let best = self.pred_inf_time.get(&target).copied().unwrap_or(f64::INFINITY);
                if candidate < best {
                    self.pred_inf_time.insert(target, candidate);
                    queue.add(
                        candidate,
                        SimEvent::Transmission {
                            source_edge: edge_id,
                            target,
                        },
                    );
                }
            }
        }
        Ok(())
    }
}

fn run_event_driven(hypergraph: &Hypergraph, opts: Options, kind: Kind) -> Result<SimulationOutput> {
    validate_known_nodes(hypergraph, &opts.initial_recovereds)?;
    let edgeweight = edge_weight_lookup(hypergraph, opts.transmission_weight);

    let mut sim = Simulation::new(hypergraph, opts.seed);
    let mut queue = EventQueue::new(opts.tmax);
    let mut state = EventDrivenState::new();

    let initial_infecteds =
        resolve_initial_infecteds(hypergraph, &opts.initial_infecteds, &mut sim.rng)?;

    for &node in &opts.initial_recovereds {
        sim.set_status(node, Status::Recovered);
    }
    for &node in &initial_infecteds {
        sim.set_status(node, Status::Infected);
        let rec_at = opts.tmin + opts.provider.recovery_delay(&mut sim.rng);
        queue.add(rec_at, SimEvent::Recovery { node });
    }
    for &node in &initial_infecteds {
        state.schedule_around(
            hypergraph,
            &mut queue,
            opts.provider,
            opts.kernel,
            &edgeweight,
            &sim.status,
            &mut sim.rng,
            node,
            opts.tmin,
        )?;
    }

    let mut times = vec![opts.tmin];
    let mut s_series = vec![hypergraph.num_nodes() - initial_infecteds.len() - opts.initial_recovereds.len()];
    let mut i_series = vec![initial_infecteds.len()];
    let mut r_series = vec![opts.initial_recovereds.len()];

    while let Some((t, event)) = queue.pop() {
        if t >= opts.tmax {
            break;
        }

        match event {
            SimEvent::Recovery { node } => {
                if !sim.status_of(node).is_infected() {
                    continue; // stale: already processed via some other path
                }
                let new_status = match kind {
                    Kind::Sir => Status::Recovered,
                    Kind::Sis => Status::Susceptible,
                };
                let old_status = sim.status_of(node);
                sim.set_status(node, new_status);
                if opts.return_event_data {
                    sim.record_event(t, None, node, old_status, new_status);
                }

                times.push(t);
                s_series.push(s_series.last().unwrap() + usize::from(matches!(kind, Kind::Sis)));
                i_series.push(i_series.last().unwrap() - 1);
                if matches!(kind, Kind::Sir) {
                    r_series.push(r_series.last().unwrap() + 1);
                }
                // A recovered-to-susceptible SIS node does not pre-schedule
                // its own future infections; it only becomes a transmission
                // target again once a neighbour's Transmission event fires
                // and re-scans the edges incident to that neighbour.
            }
            SimEvent::Transmission { source_edge, target } => {
                if !sim.status_of(target).is_susceptible() {
                    continue; // stale: target already transitioned
                }
                let members = hypergraph.members(source_edge).unwrap();
                let contagion =
                    check_finite(opts.kernel.evaluate(target, &sim.status, members, &mut sim.rng), target)?
                        * edgeweight(source_edge);
                if contagion <= 0.0 {
                    continue; // stale: the precondition no longer holds
                }

                let old_status = sim.status_of(target);
                sim.set_status(target, Status::Infected);
                if opts.return_event_data {
                    sim.record_event(t, Some(source_edge), target, old_status, Status::Infected);
                }

                let rec_at = t + opts.provider.recovery_delay(&mut sim.rng);
                queue.add(rec_at, SimEvent::Recovery { node: target });

                times.push(t);
                s_series.push(s_series.last().unwrap() - 1);
                i_series.push(i_series.last().unwrap() + 1);
                if matches!(kind, Kind::Sir) {
                    r_series.push(*r_series.last().unwrap());
                }

                state.schedule_around(
                    hypergraph,
                    &mut queue,
                    opts.provider,
                    opts.kernel,
                    &edgeweight,
                    &sim.status,
                    &mut sim.rng,
                    target,
                    t,
                )?;
            }
        }
    }

    log::info!(
        "event-driven run exhausted queue at tmax={} with {} recorded transitions",
        opts.tmax,
        times.len() - 1
    );

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

/// Non-Markovian event-driven SIR simulation.
#[allow(clippy::too_many_arguments)]
pub fn run_event_driven_sir(
    hypergraph: &Hypergraph,
    provider: &dyn TimeProvider,
    kernel: &dyn ContagionKernel,
    initial_infecteds: InitialCondition,
    initial_recovereds: Vec<Node>,
    tmin: f64,
    tmax: f64,
    transmission_weight: Option<&AHashMap<EdgeId, f64>>,
    return_event_data: bool,
    seed: Option<u64>,
) -> Result<SimulationOutput> {
    run_event_driven(
        hypergraph,
        Options {
            provider,
            kernel,
            initial_infecteds,
            initial_recovereds,
            tmin,
            tmax,
            transmission_weight,
            return_event_data,
            seed,
        },
        Kind::Sir,
    )
}

/// Non-Markovian event-driven SIS simulation.
#[allow(clippy::too_many_arguments)]
pub fn run_event_driven_sis(
    hypergraph: &Hypergraph,
    provider: &dyn TimeProvider,
    kernel: &dyn ContagionKernel,
    initial_infecteds: InitialCondition,
    tmin: f64,
    tmax: f64,
    transmission_weight: Option<&AHashMap<EdgeId, f64>>,
    return_event_data: bool,
    seed: Option<u64>,
) -> Result<SimulationOutput> {
    run_event_driven(
        hypergraph,
        Options {
            provider,
            kernel,
            initial_infecteds,
            initial_recovereds: Vec::new(),
            tmin,
            tmax,
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
    use crate::hypergraph::Hypergraph;
    use crate::kernels::Individual;

    #[test]
    fn sir_event_driven_terminates_and_conserves_population() {
        let hg = Hypergraph::from_edges(vec![vec![1, 2, 3], vec![2, 4]]);
        let tau: AHashMap<usize, f64> = [(2, 2.0), (3, 1.5)].into_iter().collect();
        let provider = MarkovianProvider { tau: &tau, gamma: 1.0 };
        let output = run_event_driven_sir(
            &hg,
            &provider,
            &Individual,
            InitialCondition::Nodes(vec![1]),
            Vec::new(),
            0.0,
            50.0,
            None,
            false,
            Some(1),
        )
        .unwrap();
        match output {
            SimulationOutput::Sir { s, i, r, .. } => {
                for idx in 0..s.len() {
                    assert_eq!(s[idx] + i[idx] + r[idx], hg.num_nodes());
                }
            }
            _ => panic!("expected Sir output"),
        }
    }

    #[test]
    fn sis_event_driven_conserves_population_and_recovery_never_pre_schedules() {
        let hg = Hypergraph::from_edges(vec![vec![1, 2, 3], vec![2, 4]]);
        let tau: AHashMap<usize, f64> = [(2, 2.0), (3, 1.5)].into_iter().collect();
        let provider = MarkovianProvider { tau: &tau, gamma: 1.0 };
        let output = run_event_driven_sis(
            &hg,
            &provider,
            &Individual,
            InitialCondition::Nodes(vec![1]),
            0.0,
            50.0,
            None,
            false,
            Some(1),
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
}
