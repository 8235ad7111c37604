//! [`WeightedChoice`], a quantile-biased selector.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;
use rand::SeedableRng as _;
use rand::seq::SliceRandom as _;
use rand_xoshiro::Xoshiro256Plus;

/// Collects keys with weights, then chooses one of them, biased toward the
/// highest-weighted.
///
/// Weights are only compared, never summed for probabilities, so they may be
/// negative. This makes `WeightedChoice` suitable for choosing among scored
/// candidates whose scores have no natural zero.
///
/// ```
/// use kitbash::weighted::WeightedChoice;
///
/// let mut choice = WeightedChoice::new();
/// choice.add("low", 1.0);
/// choice.add("middle", 2.0);
/// choice.add("high", 3.0);
/// assert_eq!(choice.choose_by_quantile(0.5, 0.5), Some(&"middle"));
/// assert_eq!(choice.choose_by_quantile(0.999, 0.5), Some(&"high"));
/// ```
#[derive(Clone, Debug)]
pub struct WeightedChoice<K> {
    entries: Vec<(K, f64)>,
    index: HashMap<K, usize>,
}

impl<K: Clone + Eq + Hash> WeightedChoice<K> {
    /// Constructs an empty [`WeightedChoice`].
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds `weight` to the weight of `key`, which is zero if it was not added before.
    pub fn add(&mut self, key: K, weight: f64) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += weight,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, weight));
            }
        }
    }

    /// Returns the accumulated weight of `key`.
    pub fn weight(&self, key: &K) -> Option<f64> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no keys were added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chooses a key.
    ///
    /// `noise` is a uniformly distributed number in `0.0..1.0`, and `quantile_fifty`
    /// is the quantile (in `0.0..1.0`, by ascending weight) which will be chosen with
    /// 50% probability; that is, with `quantile_fifty = 0.99`, half of all choices will
    /// land in the top 1%. `0.5` gives a uniform choice.
    ///
    /// Keys of equal weight are ordered pseudo-randomly, but deterministically, from
    /// `noise`. Returns [`None`] if no keys were added.
    pub fn choose_by_quantile(&self, noise: f64, quantile_fifty: f64) -> Option<&K> {
        if self.entries.is_empty() {
            return None;
        }
        let mut sorted: Vec<&(K, f64)> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut rng = Xoshiro256Plus::seed_from_u64(noise.to_bits());
        for run in sorted.chunk_by_mut(|a, b| a.1 == b.1) {
            if run.len() > 1 {
                run.shuffle(&mut rng);
            }
        }

        let exponent = quantile_fifty.ln() / 0.5f64.ln();
        let mapped = noise.clamp(0.0, 1.0).powf(exponent);
        let count = sorted.len();
        let index = if mapped.is_finite() {
            ((mapped * count as f64).floor() as usize).min(count - 1)
        } else {
            count - 1
        };
        Some(&sorted[index].0)
    }
}

impl<K: Clone + Eq + Hash> Default for WeightedChoice<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash> Extend<(K, f64)> for WeightedChoice<K> {
    fn extend<T: IntoIterator<Item = (K, f64)>>(&mut self, iter: T) {
        for (key, weight) in iter {
            self.add(key, weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn five() -> WeightedChoice<u32> {
        // Inserted out of order to check that sorting happens.
        let mut choice = WeightedChoice::new();
        choice.extend([(3, 30.0), (1, 10.0), (5, 50.0), (2, 20.0), (4, 40.0)]);
        choice
    }

    #[test]
    fn add_accumulates() {
        let mut choice = WeightedChoice::new();
        choice.add('a', 1.5);
        choice.add('b', 1.0);
        choice.add('a', 2.0);
        assert_eq!(choice.len(), 2);
        assert_eq!(choice.weight(&'a'), Some(3.5));
        assert_eq!(choice.weight(&'c'), None);
    }

    #[test]
    fn empty() {
        assert_eq!(WeightedChoice::<u32>::new().choose_by_quantile(0.5, 0.5), None);
    }

    #[rstest]
    #[case(0.0, 1)]
    #[case(0.1, 1)]
    #[case(0.5, 3)]
    #[case(0.79, 4)]
    #[case(0.999999, 5)]
    fn uniform_quantile(#[case] noise: f64, #[case] expected: u32) {
        assert_eq!(five().choose_by_quantile(noise, 0.5), Some(&expected));
    }

    #[test]
    fn high_quantile_favors_top() {
        let choice = five();
        // With q50 = 0.9, noise 0.5 maps to 0.9.
        assert_eq!(choice.choose_by_quantile(0.5, 0.9), Some(&5));
        let top_count = (0..1000)
            .filter(|&i| choice.choose_by_quantile(f64::from(i) / 1000.0, 0.9) == Some(&5))
            .count();
        assert!(top_count > 500, "{top_count}");
    }

    #[test]
    fn negative_weights_are_ordered() {
        let mut choice = WeightedChoice::new();
        choice.extend([("worst", -100.0), ("best", -1.0), ("middle", -10.0)]);
        assert_eq!(choice.choose_by_quantile(0.5, 0.5), Some(&"middle"));
        assert_eq!(choice.choose_by_quantile(0.99, 0.5), Some(&"best"));
    }

    #[test]
    fn ties_are_deterministic_but_not_insertion_ordered() {
        let mut choice = WeightedChoice::new();
        choice.extend((0..20u32).map(|i| (i, 1.0)));
        let picks: Vec<u32> = (0..20)
            .map(|i| *choice.choose_by_quantile(f64::from(i) / 20.0, 0.5).unwrap())
            .collect();
        let again: Vec<u32> = (0..20)
            .map(|i| *choice.choose_by_quantile(f64::from(i) / 20.0, 0.5).unwrap())
            .collect();
        assert_eq!(picks, again);
        assert_ne!(picks, (0..20).collect::<Vec<u32>>());
    }
}
