//! Pure opinion-update functions (spec.md §4.G), analogous in spirit to
//! [`crate::kernels`]'s contagion predicates but operating on continuous or
//! discrete opinion values instead of epidemic status.

use rand::Rng;

use crate::status::OpinionStatus;

/// Sample variance (Bessel-corrected, divisor `n - 1`) of a group's
/// opinions — the "discordance" of a hyperedge, used as the gate for both
/// Deffuant–Weisbuch and Hegselmann–Krause updates. A singleton or empty
/// edge has no variance to speak of and is defined as `+infinity`, which
/// blocks any update gated on it rather than looking artificially
/// concordant.
pub fn discordance(opinions: &[f64]) -> f64 {
    if opinions.len() < 2 {
        return f64::INFINITY;
    }
    let mean = opinions.iter().sum::<f64>() / opinions.len() as f64;
    opinions.iter().map(|o| (o - mean).powi(2)).sum::<f64>() / (opinions.len() - 1) as f64
}

/// Classic pairwise Deffuant–Weisbuch bounded-confidence update: `a` and `b`
/// move toward each other by a factor `mu` if they are within `epsilon` of
/// one another, and are otherwise left unchanged (`None`).
pub fn deffuant_weisbuch_pair(a: f64, b: f64, epsilon: f64, mu: f64) -> Option<(f64, f64)> {
    if (a - b).abs() < epsilon {
        Some((a + mu * (b - a), b + mu * (a - b)))
    } else {
        None
    }
}

/// Group generalisation of the pairwise rule: every member of the group
/// moves toward the group mean by `mu`, but only if the group's
/// [`discordance`] is below `epsilon` — a whole hyperedge either reaches
/// partial consensus together or stays put.
pub fn deffuant_weisbuch_group(opinions: &[f64], epsilon: f64, mu: f64) -> Option<Vec<f64>> {
    if discordance(opinions) >= epsilon {
        return None;
    }
    let mean = opinions.iter().sum::<f64>() / opinions.len() as f64;
    Some(opinions.iter().map(|o| o + mu * (mean - o)).collect())
}

/// Hegselmann–Krause synchronous update for one node: `edges` holds, for
/// every hyperedge incident to the node, that edge's full opinion vector
/// (the node's own opinion included, at whatever position it occupies).
/// `L(v)` is the subset of those edges whose [`discordance`] is below
/// `epsilon`; the new opinion is the mean, over `L(v)`, of each qualifying
/// edge's own members-without-`own` mean. If `L(v)` is empty the node's
/// opinion is left unchanged.
pub fn hegselmann_krause(own: f64, edges: &[Vec<f64>], epsilon: f64) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for edge in edges {
        if edge.len() < 2 || discordance(edge) >= epsilon {
            continue;
        }
        let others_sum: f64 = edge.iter().sum::<f64>() - own;
        let others_len = edge.len() - 1;
        sum += others_sum / others_len as f64;
        count += 1;
    }
    if count == 0 {
        own
    } else {
        sum / count as f64
    }
}

/// Voter model: if every other member of the edge shares a single opinion,
/// the node adopts it with probability `p_adoption`; otherwise (no
/// unanimity, or the adoption roll fails) the node keeps `own`.
pub fn voter_model(
    own: OpinionStatus,
    neighbor_opinions: &[OpinionStatus],
    p_adoption: f64,
    rng: &mut impl Rng,
) -> OpinionStatus {
    let Some((&first, rest)) = neighbor_opinions.split_first() else {
        return own;
    };
    let unanimous = rest.iter().all(|o| *o == first);
    if unanimous && rng.gen::<f64>() <= p_adoption {
        first
    } else {
        own
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn discordance_of_identical_opinions_is_zero() {
        assert_eq!(discordance(&[0.5, 0.5, 0.5]), 0.0);
    }

    #[test]
    fn discordance_of_a_singleton_edge_is_infinite() {
        assert_eq!(discordance(&[0.5]), f64::INFINITY);
        assert_eq!(discordance(&[]), f64::INFINITY);
    }

    #[test]
    fn pairwise_dw_moves_only_within_bound() {
        assert!(deffuant_weisbuch_pair(0.0, 0.9, 0.5, 0.5).is_none());
        let (a, b) = deffuant_weisbuch_pair(0.0, 0.2, 0.5, 0.5).unwrap();
        assert!((a - 0.1).abs() < 1e-12);
        assert!((b - 0.1).abs() < 1e-12);
    }

    #[test]
    fn group_dw_requires_low_discordance() {
        assert!(deffuant_weisbuch_group(&[0.0, 0.9], 0.1, 0.5).is_none());
        let updated = deffuant_weisbuch_group(&[0.4, 0.5, 0.6], 0.5, 1.0).unwrap();
        for o in updated {
            assert!((o - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn hegselmann_krause_averages_only_low_discordance_edges() {
        // edge_far is too discordant at epsilon=0.01 and is excluded;
        // edge_near qualifies and its members-without-own mean (0.52) wins.
        let edges = vec![vec![0.5, 0.9, 0.95], vec![0.5, 0.52]];
        let result = hegselmann_krause(0.5, &edges, 0.01);
        assert!((result - 0.52).abs() < 1e-12);
    }

    #[test]
    fn hegselmann_krause_keeps_own_opinion_when_no_edge_qualifies() {
        let edges = vec![vec![0.5, 0.9, 0.95]];
        assert_eq!(hegselmann_krause(0.5, &edges, 0.01), 0.5);
    }

    #[test]
    fn voter_model_adopts_unanimous_neighbours_with_certainty() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let own = OpinionStatus::Discrete(0);
        let neighbors = [OpinionStatus::Discrete(1), OpinionStatus::Discrete(1)];
        for _ in 0..20 {
            assert_eq!(voter_model(own, &neighbors, 1.0, &mut rng), OpinionStatus::Discrete(1));
        }
    }

    #[test]
    fn voter_model_never_adopts_with_zero_adoption_probability() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let own = OpinionStatus::Discrete(0);
        let neighbors = [OpinionStatus::Discrete(1), OpinionStatus::Discrete(1)];
        for _ in 0..20 {
            assert_eq!(voter_model(own, &neighbors, 0.0, &mut rng), own);
        }
    }

    #[test]
    fn voter_model_keeps_own_opinion_without_unanimity() {
        let mut rng = Pcg64Mcg::seed_from_u64(2);
        let own = OpinionStatus::Discrete(0);
        let neighbors = [OpinionStatus::Discrete(1), OpinionStatus::Discrete(2)];
        for _ in 0..20 {
            assert_eq!(voter_model(own, &neighbors, 1.0, &mut rng), own);
        }
    }
}
