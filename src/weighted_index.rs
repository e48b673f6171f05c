use std::hash::Hash;

use ahash::AHashMap;
use rand::Rng;

use crate::error::{HyperContagionError, Result};

/// A container of distinct items supporting O(1)-amortised insert / remove /
/// update and a weighted random draw by rejection sampling.
///
/// This is the weighted analogue of the teacher hypergraph library's
/// `incidence_list` pattern (dynamic array + `item -> position` map for
/// O(1) removal via swap-with-last), carrying the Python
/// `_ListDict_`/`MockSamplableSet` rejection-sampling algorithm from
/// `hypercontagion.utilities` (see `examples/original_source/`). Generic
/// over `T` so the same structure backs both `infecteds: WeightedIndex<Node>`
/// and `IS[k]: WeightedIndex<(EdgeId, Node)>`.
///
/// Design Notes §9 calls out this exact slot as "where a Fenwick tree would
/// drop in" if item cardinality grows large enough that rejection sampling's
/// expected `max_weight / mean_weight` retries become a bottleneck; the
/// public surface (`insert`/`update`/`remove`/`choose_random`) is kept
/// narrow enough that such a swap would not touch call sites.
pub struct WeightedIndex<T> {
    items: Vec<T>,
    item_to_position: AHashMap<T, usize>,
    weight: AHashMap<T, f64>,
    total_weight: f64,
    max_weight: f64,
    max_weight_count: usize,
}

impl<T> WeightedIndex<T>
where
    T: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            item_to_position: AHashMap::new(),
            weight: AHashMap::new(),
            total_weight: 0.0,
            max_weight: 0.0,
            max_weight_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.item_to_position.contains_key(item)
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// If `item` is already present, overwrites its weight; if `weight` is
    /// zero, removes the item (and does not re-insert it).
    pub fn insert(&mut self, item: T, weight: f64) {
        if self.contains(&item) {
            self.remove(&item);
        }
        if weight != 0.0 {
            self.push_new(item, weight);
        }
    }

    /// If `item` is absent, inserts it with weight `delta`; else increments
    /// its existing weight by `delta` (which may be negative). The running
    /// total must stay `>= 0`, which callers are expected to uphold by
    /// never decrementing past an item's own current weight.
    pub fn update(&mut self, item: T, delta: f64) {
        match self.weight.get(&item).copied() {
            None => self.push_new(item, delta),
            Some(current) => {
                let updated = current + delta;
                self.set_weight(&item, updated);
            }
        }
    }

    fn push_new(&mut self, item: T, weight: f64) {
        self.item_to_position.insert(item.clone(), self.items.len());
        self.items.push(item.clone());
        self.weight.insert(item, weight);
        self.total_weight += weight;
        self.account_new_weight(weight);
    }

    fn set_weight(&mut self, item: &T, new_weight: f64) {
        let old_weight = *self.weight.get(item).unwrap();
        self.total_weight += new_weight - old_weight;
        if old_weight == self.max_weight {
            self.max_weight_count -= 1;
        }
        self.weight.insert(item.clone(), new_weight);
        self.account_new_weight(new_weight);
    }

    fn account_new_weight(&mut self, weight: f64) {
        if weight > self.max_weight {
            self.max_weight = weight;
            self.max_weight_count = 1;
        } else if weight == self.max_weight {
            self.max_weight_count += 1;
        } else if self.max_weight_count == 0 {
            // last holder of the old max already left via set_weight;
            // recompute now that nothing claims the bound.
            self.recompute_max_weight();
        }
    }

    fn recompute_max_weight(&mut self) {
        let mut max = 0.0_f64;
        let mut count = 0usize;
        for &w in self.weight.values() {
            if w > max {
                max = w;
                count = 1;
            } else if w == max {
                count += 1;
            }
        }
        self.max_weight = max;
        self.max_weight_count = count;
    }

    /// Removes `item`. Cost O(1): swap with the last array slot and pop.
    pub fn remove(&mut self, item: &T) {
        let Some(position) = self.item_to_position.remove(item) else {
            return;
        };
        let last = self.items.pop().unwrap();
        if position < self.items.len() {
            self.items[position] = last.clone();
            self.item_to_position.insert(last, position);
        }

        if let Some(weight) = self.weight.remove(item) {
            self.total_weight -= weight;
            if weight == self.max_weight {
                self.max_weight_count -= 1;
                if self.max_weight_count == 0 && !self.items.is_empty() {
                    self.recompute_max_weight();
                }
            }
        }
        if self.items.is_empty() {
            self.max_weight = 0.0;
            self.max_weight_count = 0;
        }
    }

    /// Returns an item sampled with probability proportional to its
    /// weight, via rejection sampling: pick uniformly, accept with
    /// probability `weight[item] / max_weight`, else repeat.
    ///
    /// `max_weight` is always a valid upper bound on the true maximum (it
    /// is only recomputed once the last holder of the previous maximum
    /// leaves), so the algorithm is always correct; it may simply do more
    /// rejections if `max_weight` lags above the true maximum.
    pub fn choose_random(&self, rng: &mut impl Rng) -> Result<&T> {
        if self.items.is_empty() {
            return Err(HyperContagionError::EmptySample);
        }
        loop {
            let idx = rng.gen_range(0..self.items.len());
            let candidate = &self.items[idx];
            let w = *self.weight.get(candidate).unwrap_or(&1.0);
            if self.max_weight <= 0.0 || rng.gen::<f64>() < w / self.max_weight {
                return Ok(candidate);
            }
        }
    }

    /// `choose_random` followed by removal of the chosen item.
    pub fn random_removal(&mut self, rng: &mut impl Rng) -> Result<T> {
        let chosen = self.choose_random(rng)?.clone();
        self.remove(&chosen);
        Ok(chosen)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T> Default for WeightedIndex<T>
where
    T: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Unweighted container: every present item has weight 1, `choose_random`
/// degenerates to a uniform draw, `total_weight` degenerates to `len`.
/// Built directly on top of [`WeightedIndex`] rather than duplicated, since
/// "unweighted" is simply "every insert uses weight 1.0".
pub struct UnweightedIndex<T>(WeightedIndex<T>);

impl<T> UnweightedIndex<T>
where
    T: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self(WeightedIndex::new())
    }

    pub fn insert(&mut self, item: T) {
        self.0.insert(item, 1.0);
    }

    pub fn remove(&mut self, item: &T) {
        self.0.remove(item);
    }

    pub fn contains(&self, item: &T) -> bool {
        self.0.contains(item)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn choose_random(&self, rng: &mut impl Rng) -> Result<&T> {
        self.0.choose_random(rng)
    }

    pub fn random_removal(&mut self, rng: &mut impl Rng) -> Result<T> {
        self.0.random_removal(rng)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T> Default for UnweightedIndex<T>
where
    T: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn insert_then_remove_restores_empty_state() {
        let mut idx: WeightedIndex<u64> = WeightedIndex::new();
        idx.insert(7, 2.5);
        idx.remove(&7);
        assert_eq!(idx.len(), 0);
        assert_eq!(idx.total_weight(), 0.0);
        assert_eq!(idx.max_weight, 0.0);
        assert_eq!(idx.max_weight_count, 0);
    }

    #[test]
    fn insert_zero_weight_removes_existing() {
        let mut idx: WeightedIndex<u64> = WeightedIndex::new();
        idx.insert(1, 3.0);
        idx.insert(1, 0.0);
        assert!(!idx.contains(&1));
        assert_eq!(idx.total_weight(), 0.0);
    }

    #[test]
    fn update_inserts_absent_and_increments_present() {
        let mut idx: WeightedIndex<u64> = WeightedIndex::new();
        idx.update(1, 2.0);
        assert_eq!(idx.total_weight(), 2.0);
        idx.update(1, 3.0);
        assert_eq!(idx.total_weight(), 5.0);
        idx.update(1, -1.0);
        assert_eq!(idx.total_weight(), 4.0);
    }

    #[test]
    fn total_weight_matches_sum_after_churn() {
        let mut idx: WeightedIndex<u64> = WeightedIndex::new();
        idx.insert(1, 1.0);
        idx.insert(2, 5.0);
        idx.insert(3, 2.0);
        idx.remove(&2);
        idx.insert(4, 9.0);
        assert_eq!(idx.total_weight(), 1.0 + 2.0 + 9.0);
        assert_eq!(idx.max_weight, 9.0);
    }

    #[test]
    fn choose_random_only_returns_members() {
        let mut idx: WeightedIndex<u64> = WeightedIndex::new();
        idx.insert(10, 1.0);
        idx.insert(20, 100.0);
        idx.insert(30, 1.0);
        let mut rng = Pcg64Mcg::seed_from_u64(42);
        for _ in 0..200 {
            let chosen = *idx.choose_random(&mut rng).unwrap();
            assert!([10, 20, 30].contains(&chosen));
        }
    }

    #[test]
    fn choose_random_on_empty_errors() {
        let idx: WeightedIndex<u64> = WeightedIndex::new();
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        assert!(matches!(
            idx.choose_random(&mut rng),
            Err(HyperContagionError::EmptySample)
        ));
    }

    #[test]
    fn unweighted_is_uniform_cardinality() {
        let mut idx: UnweightedIndex<u64> = UnweightedIndex::new();
        idx.insert(1);
        idx.insert(2);
        idx.insert(3);
        assert_eq!(idx.len(), 3);
        idx.remove(&2);
        assert_eq!(idx.len(), 2);
        assert!(!idx.contains(&2));
    }
}
