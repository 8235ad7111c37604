//! Target quotas for a construction ([`RequirementSeed`]) and scoring against them.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use arcstr::ArcStr;

use crate::noise::SeedNoise;
use crate::stats::BlockSetInfo;

/// Resource id whose throughput is net power: production minus consumption.
pub const ELECTRICITY: &str = "electricity";

/// Coefficients of the error terms computed by [`RequirementSeed::compute_error()`].
///
/// Each term is `coefficient * (relative difference)²`, where the coefficient is the
/// `*_deficit` one if the current value is below the target and the `*_surplus` one
/// otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs)]
pub struct ErrorWeights {
    #[allow(missing_docs)]
    pub resource_deficit: f64,
    #[allow(missing_docs)]
    pub resource_surplus: f64,
    #[allow(missing_docs)]
    pub block_count_deficit: f64,
    #[allow(missing_docs)]
    pub block_count_surplus: f64,
    #[allow(missing_docs)]
    pub inventory_deficit: f64,
    #[allow(missing_docs)]
    pub inventory_surplus: f64,
}

impl Default for ErrorWeights {
    fn default() -> Self {
        Self {
            resource_deficit: 10.0,
            resource_surplus: 0.05,
            block_count_deficit: 10.0,
            block_count_surplus: 0.1,
            inventory_deficit: 5.0,
            inventory_surplus: 0.01,
        }
    }
}

/// Target storage and throughput of one resource.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs)]
pub struct ResourceTarget {
    #[allow(missing_docs)]
    pub storage: f64,
    #[allow(missing_docs)]
    pub throughput: f64,
}

/// What an [`ErrorTerm`] measures.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum TermKind {
    /// Storage of a resource.
    Storage,
    /// Throughput of a resource.
    Throughput,
    /// Number of blocks in a category.
    BlockCount,
    /// Inventory volume.
    Inventory,
}

/// One contribution to the error computed by [`RequirementSeed::compute_error()`],
/// passed to its diagnostic callback.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct ErrorTerm {
    /// What is measured.
    pub kind: TermKind,
    /// Resource id or block category; empty for [`TermKind::Inventory`].
    pub name: ArcStr,
    /// Value in the construction.
    pub current: f64,
    /// Target value.
    pub target: f64,
    /// Contribution to the total, after normalization.
    pub error: f64,
}

/// Externally supplied target quotas for a construction, and the seed of all its
/// random choices.
///
/// ```
/// use kitbash::requirement::RequirementSeed;
/// use kitbash::stats::BlockSetInfo;
///
/// let seed = RequirementSeed::new(42)
///     .with_population(100.0)
///     .with_resource_per_capita("oxygen", 1.0, 0.5)
///     .with_block_count("medical", 2);
/// assert_eq!(seed.resource_target("oxygen").unwrap().storage, 100.0);
/// assert!(seed.compute_error(&BlockSetInfo::new(), None) > 0.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequirementSeed {
    noise: SeedNoise,
    population: f64,
    absolute: BTreeMap<ArcStr, ResourceTarget>,
    per_capita: BTreeMap<ArcStr, ResourceTarget>,
    block_counts: BTreeMap<ArcStr, i64>,
    inventory_volume: f64,
    weights: ErrorWeights,
}

impl RequirementSeed {
    /// Constructs a seed with no targets.
    pub fn new(seed: u64) -> Self {
        Self {
            noise: SeedNoise::new(seed),
            population: 0.0,
            absolute: BTreeMap::new(),
            per_capita: BTreeMap::new(),
            block_counts: BTreeMap::new(),
            inventory_volume: 0.0,
            weights: ErrorWeights::default(),
        }
    }

    /// Sets the population, which scales per-capita targets.
    #[must_use]
    pub fn with_population(mut self, population: f64) -> Self {
        self.population = population;
        self
    }

    /// Adds a fixed resource target.
    #[must_use]
    pub fn with_resource(
        mut self,
        resource: impl Into<ArcStr>,
        storage: f64,
        throughput: f64,
    ) -> Self {
        let target = self.absolute.entry(resource.into()).or_default();
        target.storage += storage;
        target.throughput += throughput;
        self
    }

    /// Adds a resource target proportional to the population.
    #[must_use]
    pub fn with_resource_per_capita(
        mut self,
        resource: impl Into<ArcStr>,
        storage: f64,
        throughput: f64,
    ) -> Self {
        let target = self.per_capita.entry(resource.into()).or_default();
        target.storage += storage;
        target.throughput += throughput;
        self
    }

    /// Sets the target number of blocks in `category`.
    #[must_use]
    pub fn with_block_count(mut self, category: impl Into<ArcStr>, count: i64) -> Self {
        self.block_counts.insert(category.into(), count);
        self
    }

    /// Sets the target inventory volume.
    #[must_use]
    pub fn with_inventory_volume(mut self, volume: f64) -> Self {
        self.inventory_volume = volume;
        self
    }

    /// Replaces the error coefficients.
    #[must_use]
    pub fn with_weights(mut self, weights: ErrorWeights) -> Self {
        self.weights = weights;
        self
    }

    /// The source of all random choices made for this construction.
    pub fn seed_noise(&self) -> SeedNoise {
        self.noise
    }

    /// Returns deterministic noise in `0.0..1.0` for `salt`.
    pub fn noise(&self, salt: u64) -> f64 {
        self.noise.noise(salt)
    }

    /// The population.
    pub fn population(&self) -> f64 {
        self.population
    }

    /// The error coefficients.
    pub fn weights(&self) -> &ErrorWeights {
        &self.weights
    }

    /// Returns the effective target for `resource`, if it has one.
    pub fn resource_target(&self, resource: &str) -> Option<ResourceTarget> {
        let absolute = self.absolute.get(resource).copied();
        let per_capita = self.per_capita.get(resource).map(|t| ResourceTarget {
            storage: t.storage * self.population,
            throughput: t.throughput * self.population,
        });
        match (absolute, per_capita) {
            (None, None) => None,
            (a, p) => {
                let (a, p) = (a.unwrap_or_default(), p.unwrap_or_default());
                Some(ResourceTarget {
                    storage: a.storage + p.storage,
                    throughput: a.throughput + p.throughput,
                })
            }
        }
    }

    /// Every resource with a target, in order.
    pub fn resources(&self) -> impl Iterator<Item = &ArcStr> + '_ {
        let mut keys: Vec<&ArcStr> =
            self.absolute.keys().chain(self.per_capita.keys()).collect();
        keys.sort();
        keys.dedup();
        keys.into_iter()
    }

    /// Target block counts by category.
    pub fn block_counts(&self) -> &BTreeMap<ArcStr, i64> {
        &self.block_counts
    }

    /// Computes how far `stats` is from the targets. The result is nonnegative, and zero
    /// if every target is exactly met.
    ///
    /// The resource terms are averaged over the targeted resources, and the block count
    /// terms over the targeted categories, so that neither dominates merely by having
    /// more entries. If `log` is given, it is called with each term.
    ///
    /// This is a pure function of `self` and `stats`.
    pub fn compute_error(
        &self,
        stats: &BlockSetInfo,
        mut log: Option<&mut dyn FnMut(&ErrorTerm)>,
    ) -> f64 {
        let w = &self.weights;
        let mut emit = |kind, name: &ArcStr, current: f64, target: f64, coefficients, divisor| {
            let error = term(current, target, coefficients) / divisor;
            if let Some(log) = log.as_deref_mut() {
                log(&ErrorTerm {
                    kind,
                    name: name.clone(),
                    current,
                    target,
                    error,
                });
            }
            error
        };
        let mut total = 0.0;

        let resources: Vec<&ArcStr> = self.resources().collect();
        let resource_divisor = resources.len().max(1) as f64;
        let resource_weights = (w.resource_deficit, w.resource_surplus);
        for resource in resources {
            let Some(target) = self.resource_target(resource) else {
                continue;
            };
            let throughput = if resource.as_str() == ELECTRICITY {
                stats.power_production() - stats.power_consumption()
            } else {
                stats.resource_throughput(resource)
            };
            total += emit(
                TermKind::Storage,
                resource,
                stats.resource_storage(resource).to_f64(),
                target.storage,
                resource_weights,
                resource_divisor,
            );
            total += emit(
                TermKind::Throughput,
                resource,
                throughput.to_f64(),
                target.throughput,
                resource_weights,
                resource_divisor,
            );
        }

        let count_divisor = self.block_counts.len().max(1) as f64;
        for (category, &target) in &self.block_counts {
            total += emit(
                TermKind::BlockCount,
                category,
                stats.category_count(category) as f64,
                target as f64,
                (w.block_count_deficit, w.block_count_surplus),
                count_divisor,
            );
        }

        if self.inventory_volume > 0.0 {
            total += emit(
                TermKind::Inventory,
                &ArcStr::new(),
                stats.inventory_volume().to_f64(),
                self.inventory_volume,
                (w.inventory_deficit, w.inventory_surplus),
                1.0,
            );
        }

        total
    }
}

/// Computes one asymmetric quadratic error term.
fn term(current: f64, target: f64, (deficit, surplus): (f64, f64)) -> f64 {
    let scale = target.abs().max(1.0);
    let delta = (current - target) / scale;
    let coefficient = if delta < 0.0 { deficit } else { surplus };
    coefficient * delta * delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{BlockDescriptor, PowerUse, ResourceSupply};
    use pretty_assertions::assert_eq;

    fn stats_of(blocks: &[BlockDescriptor]) -> BlockSetInfo {
        let mut stats = BlockSetInfo::new();
        for block in blocks {
            stats.add_block(block);
        }
        stats
    }

    fn water(storage: f64) -> BlockDescriptor {
        BlockDescriptor::new("tank", [0, 0, 0])
            .with_resource(ResourceSupply::new("water", storage, 0.0))
    }

    #[test]
    fn no_targets_no_error() {
        let seed = RequirementSeed::new(0);
        assert_eq!(seed.compute_error(&stats_of(&[water(5.0)]), None), 0.0);
    }

    #[test]
    fn deficit_then_met() {
        let seed = RequirementSeed::new(0).with_resource("water", 10.0, 0.0);
        let empty = seed.compute_error(&BlockSetInfo::new(), None);
        let met = seed.compute_error(&stats_of(&[water(10.0)]), None);
        assert!(empty > 0.0);
        assert_eq!(met, 0.0);
    }

    #[test]
    fn deficit_is_monotonic() {
        let seed = RequirementSeed::new(0).with_resource("water", 10.0, 0.0);
        let errors: Vec<f64> = (0..=10)
            .map(|i| seed.compute_error(&stats_of(&[water(f64::from(i))]), None))
            .collect();
        for pair in errors.windows(2) {
            assert!(pair[1] <= pair[0], "{errors:?}");
        }
    }

    #[test]
    fn surplus_is_cheaper_than_deficit() {
        let seed = RequirementSeed::new(0).with_resource("water", 10.0, 0.0);
        let under = seed.compute_error(&stats_of(&[water(5.0)]), None);
        let over = seed.compute_error(&stats_of(&[water(15.0)]), None);
        assert!(over > 0.0);
        assert!(over < under / 10.0);
    }

    #[test]
    fn electricity_is_net_power() {
        let seed = RequirementSeed::new(0).with_resource(ELECTRICITY, 0.0, 5.0);
        let blocks = [
            BlockDescriptor::new("reactor", [0, 0, 0])
                .with_power(PowerUse::Producer { amount: 8.0 }),
            BlockDescriptor::new("lamp", [1, 0, 0]).with_power(PowerUse::Consumer {
                group: "lights".into(),
                amount: 3.0,
            }),
        ];
        assert_eq!(seed.compute_error(&stats_of(&blocks), None), 0.0);
    }

    #[test]
    fn per_capita_scales() {
        let seed = RequirementSeed::new(0)
            .with_population(4.0)
            .with_resource_per_capita("water", 2.5, 0.0)
            .with_resource("water", 1.0, 0.0);
        assert_eq!(
            seed.resource_target("water"),
            Some(ResourceTarget {
                storage: 11.0,
                throughput: 0.0
            })
        );
        assert_eq!(seed.resource_target("air"), None);
        assert_eq!(seed.resources().collect::<Vec<_>>(), vec!["water"]);
    }

    #[test]
    fn terms_are_logged_and_normalized() {
        let seed = RequirementSeed::new(0)
            .with_resource("water", 10.0, 0.0)
            .with_resource("air", 10.0, 0.0)
            .with_block_count("medical", 1)
            .with_inventory_volume(2.0);
        let mut terms = Vec::new();
        let total = seed.compute_error(
            &BlockSetInfo::new(),
            Some(&mut |t: &ErrorTerm| terms.push(t.clone())),
        );
        assert_eq!(
            terms.iter().map(|t| (t.kind, t.name.as_str())).collect::<Vec<_>>(),
            vec![
                (TermKind::Storage, "air"),
                (TermKind::Throughput, "air"),
                (TermKind::Storage, "water"),
                (TermKind::Throughput, "water"),
                (TermKind::BlockCount, "medical"),
                (TermKind::Inventory, ""),
            ]
        );
        // Each storage term is 10 * 1² / 2 resources.
        assert_eq!(terms[0].error, 5.0);
        assert_eq!(terms.iter().map(|t| t.error).sum::<f64>(), total);
        assert_eq!(total, 5.0 + 5.0 + 10.0 + 5.0);
    }
}
