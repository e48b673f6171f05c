use ahash::AHashMap;
use rand::Rng;

use crate::status::Status;
use crate::Node;

/// A contagion kernel: a pure (except for `majority_vote`'s documented
/// tie-break) per-edge predicate returning a non-negative rate multiplier.
///
/// `N = edge_members \ {target}`; implementations must not mutate
/// `status`. Matches spec.md §4.D exactly; `rng` is threaded through so
/// that `majority_vote`'s exact-0.5 coin flip draws from the run's own
/// seeded stream rather than an ambient global RNG (Design Notes §9, Open
/// Question: "Reimplementers should document the exact comparison used and
/// ensure deterministic behaviour under the chosen RNG").
pub trait ContagionKernel {
    fn evaluate(
        &self,
        target: Node,
        status: &AHashMap<Node, Status>,
        edge_members: &[Node],
        rng: &mut dyn rand::RngCore,
    ) -> f64;
}

fn infected_neighbor_count(target: Node, status: &AHashMap<Node, Status>, edge_members: &[Node]) -> (usize, usize) {
    let mut infected = 0usize;
    let mut total = 0usize;
    for &v in edge_members {
        if v == target {
            continue;
        }
        total += 1;
        if status.get(&v).copied().unwrap_or(Status::Susceptible).is_infected() {
            infected += 1;
        }
    }
    (infected, total)
}

/// 1 iff every other member is infected.
pub struct Collective;

impl ContagionKernel for Collective {
    fn evaluate(
        &self,
        target: Node,
        status: &AHashMap<Node, Status>,
        edge_members: &[Node],
        _rng: &mut dyn rand::RngCore,
    ) -> f64 {
        let (infected, total) = infected_neighbor_count(target, status, edge_members);
        if total > 0 && infected == total {
            1.0
        } else {
            0.0
        }
    }
}

/// 1 iff at least one other member is infected.
pub struct Individual;

impl ContagionKernel for Individual {
    fn evaluate(
        &self,
        target: Node,
        status: &AHashMap<Node, Status>,
        edge_members: &[Node],
        _rng: &mut dyn rand::RngCore,
    ) -> f64 {
        let (infected, _) = infected_neighbor_count(target, status, edge_members);
        if infected > 0 {
            1.0
        } else {
            0.0
        }
    }
}

/// 1 iff the infected fraction of `N` is `>= theta`; an empty `N` never
/// fires.
pub struct Threshold {
    pub theta: f64,
}

impl Default for Threshold {
    fn default() -> Self {
        Self { theta: 0.5 }
    }
}

impl ContagionKernel for Threshold {
    fn evaluate(
        &self,
        target: Node,
        status: &AHashMap<Node, Status>,
        edge_members: &[Node],
        _rng: &mut dyn rand::RngCore,
    ) -> f64 {
        let (infected, total) = infected_neighbor_count(target, status, edge_members);
        if total == 0 {
            return 0.0;
        }
        let fraction = infected as f64 / total as f64;
        if fraction >= self.theta {
            1.0
        } else {
            0.0
        }
    }
}

/// 1 if the infected fraction of `N` is strictly above one half, 0 if
/// strictly below, and an unbiased coin flip (drawn from `rng`) exactly at
/// one half.
pub struct MajorityVote;

impl ContagionKernel for MajorityVote {
    fn evaluate(
        &self,
        target: Node,
        status: &AHashMap<Node, Status>,
        edge_members: &[Node],
        rng: &mut dyn rand::RngCore,
    ) -> f64 {
        let (infected, total) = infected_neighbor_count(target, status, edge_members);
        if total == 0 {
            return 0.0;
        }
        let fraction = infected as f64 / total as f64;
        match fraction.partial_cmp(&0.5).unwrap() {
            std::cmp::Ordering::Less => 0.0,
            std::cmp::Ordering::Greater => 1.0,
            std::cmp::Ordering::Equal => {
                if rng.gen::<bool>() {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// The number of infected members of `N` (an integer `>= 0`).
pub struct SizeDependent;

impl ContagionKernel for SizeDependent {
    fn evaluate(
        &self,
        target: Node,
        status: &AHashMap<Node, Status>,
        edge_members: &[Node],
        _rng: &mut dyn rand::RngCore,
    ) -> f64 {
        let (infected, _) = infected_neighbor_count(target, status, edge_members);
        infected as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn status_map(infected: &[Node]) -> AHashMap<Node, Status> {
        infected.iter().map(|&n| (n, Status::Infected)).collect()
    }

    #[test]
    fn threshold_boundary_cases() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let edge = vec![1, 2, 3, 4, 5, 6];
        // target=1, neighbors={2,3,4,5,6}; 2 of 5 infected -> 0.4
        let status = status_map(&[2, 3]);
        let k = Threshold { theta: 0.3 };
        assert_eq!(k.evaluate(1, &status, &edge, &mut rng), 1.0);

        let status = status_map(&[2]);
        assert_eq!(k.evaluate(1, &status, &edge, &mut rng), 0.0);
    }

    #[test]
    fn collective_requires_all_neighbors_infected() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let edge = vec![1, 2, 3];
        let status = status_map(&[2]); // 3 stays susceptible
        assert_eq!(Collective.evaluate(1, &status, &edge, &mut rng), 0.0);

        let status = status_map(&[2, 3]);
        assert_eq!(Collective.evaluate(1, &status, &edge, &mut rng), 1.0);
    }

    #[test]
    fn majority_vote_exact_half_is_a_coin_flip() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let edge = vec![1, 2, 3, 4, 5];
        // target=1, neighbors={2,3,4,5}; 2 infected -> exactly 0.5
        let status = status_map(&[2, 3]);
        let mut saw_zero = false;
        let mut saw_one = false;
        for _ in 0..200 {
            match MajorityVote.evaluate(1, &status, &edge, &mut rng) {
                0.0 => saw_zero = true,
                1.0 => saw_one = true,
                _ => panic!("majority_vote must return 0 or 1"),
            }
        }
        assert!(saw_zero && saw_one);
    }

    #[test]
    fn size_dependent_counts_infected_neighbors() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let edge = vec![1, 2, 3, 4];
        let status = status_map(&[2, 3]);
        assert_eq!(SizeDependent.evaluate(1, &status, &edge, &mut rng), 2.0);
    }
}
