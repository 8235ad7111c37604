//! Aggregate statistics of a set of blocks ([`BlockSetInfo`]).

use alloc::collections::BTreeMap;
use core::fmt;
use core::iter::Sum;
use core::ops;

use arcstr::ArcStr;

use crate::descriptor::{BlockDescriptor, PowerUse};

/// A fixed-point quantity with a resolution of one millionth.
///
/// Aggregates are kept in this form rather than [`f64`] so that adding a room's
/// statistics and then subtracting them again restores exactly the previous value.
/// Arithmetic saturates at the limits of the range instead of overflowing.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Amount(i64);

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(0);

    const SCALE: f64 = 1_000_000.0;

    /// Converts from floating point, rounding to the nearest representable value.
    /// Non-finite inputs become zero.
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Self((value * Self::SCALE).round() as i64)
        } else {
            Self::ZERO
        }
    }

    /// Converts to floating point.
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE
    }

    /// Returns whether this is zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_f64(), f)
    }
}

impl ops::Add for Amount {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}
impl ops::AddAssign for Amount {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}
impl ops::Sub for Amount {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}
impl ops::SubAssign for Amount {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}
impl ops::Neg for Amount {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}
impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}
impl num_traits::Zero for Amount {
    #[inline]
    fn zero() -> Self {
        Self::ZERO
    }
    #[inline]
    fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Aggregate statistics of a set of blocks: counts, costs, power, and resources.
///
/// A [`Part`](crate::part::Part) computes one of these over its blocks, and a
/// [`Construction`](crate::construction::Construction) keeps the sum over its rooms.
/// Entries which become zero are removed, so two sets that contain the same amounts
/// compare equal regardless of history.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockSetInfo {
    block_count: i64,
    block_count_by_type: BTreeMap<ArcStr, i64>,
    block_count_by_category: BTreeMap<ArcStr, i64>,
    component_cost: BTreeMap<ArcStr, Amount>,
    power_consumption_by_group: BTreeMap<ArcStr, Amount>,
    power_production: Amount,
    resource_storage: BTreeMap<ArcStr, Amount>,
    resource_throughput: BTreeMap<ArcStr, Amount>,
    inventory_volume: Amount,
}

impl BlockSetInfo {
    /// Returns the statistics of no blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one block's statistics.
    pub fn add_block(&mut self, block: &BlockDescriptor) {
        self.block_count += 1;
        bump(&mut self.block_count_by_type, &block.type_id, 1);
        if let Some(category) = &block.category {
            bump(&mut self.block_count_by_category, category, 1);
        }
        for (component, amount) in &block.components {
            bump(&mut self.component_cost, component, Amount::from_f64(*amount));
        }
        match &block.power {
            Some(PowerUse::Consumer { group, amount }) => {
                bump(
                    &mut self.power_consumption_by_group,
                    group,
                    Amount::from_f64(*amount),
                );
            }
            Some(PowerUse::Producer { amount }) => {
                self.power_production += Amount::from_f64(*amount);
            }
            None => {}
        }
        for supply in &block.resources {
            bump(
                &mut self.resource_storage,
                &supply.resource,
                Amount::from_f64(supply.storage),
            );
            bump(
                &mut self.resource_throughput,
                &supply.resource,
                Amount::from_f64(supply.throughput),
            );
        }
        self.inventory_volume += Amount::from_f64(block.inventory_volume);
    }

    /// Adds all of `other`'s statistics into `self`.
    pub fn register(&mut self, other: &BlockSetInfo) {
        self.combine(other, 1);
    }

    /// Subtracts all of `other`'s statistics from `self`; the inverse of
    /// [`BlockSetInfo::register()`].
    pub fn remove(&mut self, other: &BlockSetInfo) {
        self.combine(other, -1);
    }

    fn combine(&mut self, other: &BlockSetInfo, sign: i64) {
        let signed = |a: Amount| if sign < 0 { -a } else { a };
        self.block_count += sign * other.block_count;
        for (k, &v) in &other.block_count_by_type {
            bump(&mut self.block_count_by_type, k, sign * v);
        }
        for (k, &v) in &other.block_count_by_category {
            bump(&mut self.block_count_by_category, k, sign * v);
        }
        for (k, &v) in &other.component_cost {
            bump(&mut self.component_cost, k, signed(v));
        }
        for (k, &v) in &other.power_consumption_by_group {
            bump(&mut self.power_consumption_by_group, k, signed(v));
        }
        self.power_production += signed(other.power_production);
        for (k, &v) in &other.resource_storage {
            bump(&mut self.resource_storage, k, signed(v));
        }
        for (k, &v) in &other.resource_throughput {
            bump(&mut self.resource_throughput, k, signed(v));
        }
        self.inventory_volume += signed(other.inventory_volume);
    }

    /// Total number of blocks.
    pub fn block_count(&self) -> i64 {
        self.block_count
    }

    /// Number of blocks of each type.
    pub fn block_count_by_type(&self) -> &BTreeMap<ArcStr, i64> {
        &self.block_count_by_type
    }

    /// Number of blocks in the given category.
    pub fn category_count(&self, category: &str) -> i64 {
        self.block_count_by_category
            .get(category)
            .copied()
            .unwrap_or(0)
    }

    /// Number of blocks in each category.
    pub fn block_count_by_category(&self) -> &BTreeMap<ArcStr, i64> {
        &self.block_count_by_category
    }

    /// Total build cost, per component.
    pub fn component_cost(&self) -> &BTreeMap<ArcStr, Amount> {
        &self.component_cost
    }

    /// Power consumption, per consumer group.
    pub fn power_consumption_by_group(&self) -> &BTreeMap<ArcStr, Amount> {
        &self.power_consumption_by_group
    }

    /// Total power consumption over all groups.
    pub fn power_consumption(&self) -> Amount {
        self.power_consumption_by_group.values().copied().sum()
    }

    /// Total power production.
    pub fn power_production(&self) -> Amount {
        self.power_production
    }

    /// Storage capacity for the given resource.
    pub fn resource_storage(&self, resource: &str) -> Amount {
        self.resource_storage
            .get(resource)
            .copied()
            .unwrap_or_default()
    }

    /// Throughput of the given resource.
    pub fn resource_throughput(&self, resource: &str) -> Amount {
        self.resource_throughput
            .get(resource)
            .copied()
            .unwrap_or_default()
    }

    /// Total inventory volume.
    pub fn inventory_volume(&self) -> Amount {
        self.inventory_volume
    }
}

/// Adds `delta` to the entry for `key`, removing the entry if it becomes zero.
fn bump<V>(map: &mut BTreeMap<ArcStr, V>, key: &ArcStr, delta: V)
where
    V: Copy + num_traits::Zero,
{
    if delta.is_zero() {
        return;
    }
    let value = map.entry(key.clone()).or_insert_with(V::zero);
    *value = *value + delta;
    if value.is_zero() {
        map.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ResourceSupply;
    use pretty_assertions::assert_eq;

    fn reactor() -> BlockDescriptor {
        BlockDescriptor::new("reactor", [0, 0, 0])
            .with_category("power")
            .with_power(PowerUse::Producer { amount: 12.5 })
            .with_component("steel", 30.0)
    }

    fn tank() -> BlockDescriptor {
        BlockDescriptor::new("tank", [1, 0, 0])
            .with_resource(ResourceSupply::new("hydrogen", 100.0, 0.1))
            .with_power(PowerUse::Consumer {
                group: "utility".into(),
                amount: 0.3,
            })
            .with_inventory_volume(0.7)
    }

    #[test]
    fn huge_amounts_saturate() {
        let huge = Amount::from_f64(1e300);
        assert_eq!(huge + huge, huge);
        assert_eq!(-huge - huge, Amount(i64::MIN));

        let mut stats = BlockSetInfo::new();
        let block = BlockDescriptor::new("silo", [0, 0, 0]).with_inventory_volume(1e300);
        stats.add_block(&block);
        stats.add_block(&block);
        assert_eq!(stats.inventory_volume(), huge);
    }

    #[test]
    fn add_blocks() {
        let mut info = BlockSetInfo::new();
        info.add_block(&reactor());
        info.add_block(&tank());
        assert_eq!(info.block_count(), 2);
        assert_eq!(info.category_count("power"), 1);
        assert_eq!(info.category_count("armor"), 0);
        assert_eq!(info.power_production(), Amount::from_f64(12.5));
        assert_eq!(info.power_consumption(), Amount::from_f64(0.3));
        assert_eq!(info.resource_storage("hydrogen"), Amount::from_f64(100.0));
        assert_eq!(info.resource_throughput("hydrogen"), Amount::from_f64(0.1));
        assert_eq!(info.inventory_volume(), Amount::from_f64(0.7));
        assert_eq!(info.component_cost()["steel"], Amount::from_f64(30.0));
    }

    #[test]
    fn register_then_remove_is_exact() {
        let mut part = BlockSetInfo::new();
        part.add_block(&reactor());
        part.add_block(&tank());

        let mut total = BlockSetInfo::new();
        total.add_block(&tank());
        let before = total.clone();

        for _ in 0..10 {
            total.register(&part);
        }
        for _ in 0..10 {
            total.remove(&part);
        }
        assert_eq!(total, before);

        total.remove(&before);
        assert_eq!(total, BlockSetInfo::new());
    }

    #[test]
    fn amount_rounding() {
        assert_eq!(Amount::from_f64(0.1) + Amount::from_f64(0.2), Amount::from_f64(0.3));
        assert_eq!(Amount::from_f64(f64::NAN), Amount::ZERO);
        assert_eq!(Amount::from_f64(-2.5).to_f64(), -2.5);
    }
}
