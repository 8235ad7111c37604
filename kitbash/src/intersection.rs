//! Collision tests between placed parts, and their cache.

use core::mem;
use std::sync::Mutex;

use hashbrown::HashMap;

use crate::math::{Cube, DiscreteTransform, GridAab, GridRotation};
use crate::part::{Part, PartKey, ReservedZone};
use crate::util::lock;

/// A [`Part`] together with the transform placing it, and that transform's inverse.
#[derive(Clone, Copy, Debug)]
pub struct PlacedPart<'a> {
    part: &'a Part,
    transform: DiscreteTransform,
    inverse: DiscreteTransform,
}

impl<'a> PlacedPart<'a> {
    /// Places `part` at `transform`.
    pub fn new(part: &'a Part, transform: DiscreteTransform) -> Self {
        Self {
            part,
            transform,
            inverse: transform.inverse(),
        }
    }

    /// Constructs a [`PlacedPart`] from an already computed inverse.
    pub(crate) fn with_inverse(
        part: &'a Part,
        transform: DiscreteTransform,
        inverse: DiscreteTransform,
    ) -> Self {
        debug_assert_eq!(transform.inverse(), inverse);
        Self {
            part,
            transform,
            inverse,
        }
    }

    /// The part.
    pub fn part(&self) -> &'a Part {
        self.part
    }

    /// The transform from the part's frame to the world.
    pub fn transform(&self) -> DiscreteTransform {
        self.transform
    }

    /// Returns the transform from `other`'s frame into this part's frame.
    fn relative(&self, other: &PlacedPart<'_>) -> DiscreteTransform {
        self.inverse * other.transform
    }
}

/// Returns whether two placed parts collide.
///
/// They collide if
///
/// 1. a reserved zone of each overlaps, unless either zone is shared;
/// 2. a reserved zone of one overlaps a block of the other; or
/// 3. a block of each occupies the same cube.
///
/// Optional zones are considered only if `test_optional` is true. The result does not
/// depend on the order of the arguments.
pub fn intersects(a: &PlacedPart<'_>, b: &PlacedPart<'_>, test_optional: bool) -> bool {
    let b_in_a = a.relative(b);
    let a_in_b = b.relative(a);

    if !a
        .part
        .footprint()
        .intersects(b.part.footprint().transform(b_in_a))
    {
        return false;
    }

    zones_intersect(a.part, b.part, b_in_a, test_optional)
        || zones_hit_blocks(a.part, b.part, b_in_a, a_in_b, test_optional)
        || zones_hit_blocks(b.part, a.part, a_in_b, b_in_a, test_optional)
        || blocks_intersect(a.part, b.part, b_in_a, a_in_b)
}

fn tested_zones(part: &Part, test_optional: bool) -> impl Iterator<Item = &ReservedZone> {
    part.reserved_zones()
        .iter()
        .filter(move |zone| zone.is_tested(test_optional))
}

/// Reserved zones against reserved zones, in `a`'s frame.
fn zones_intersect(a: &Part, b: &Part, b_in_a: DiscreteTransform, test_optional: bool) -> bool {
    let (Some(a_bounds), Some(b_bounds)) = (a.reserved_bounds(), b.reserved_bounds()) else {
        return false;
    };
    if !a_bounds.intersects(b_bounds.transform(b_in_a)) {
        return false;
    }
    tested_zones(a, test_optional)
        .filter(|za| !za.shared)
        .any(|za| {
            tested_zones(b, test_optional)
                .filter(|zb| !zb.shared)
                .any(|zb| za.bounds.intersects(zb.bounds.transform(b_in_a)))
        })
}

/// `zone_part`'s reserved zones against `block_part`'s blocks, in `zone_part`'s frame.
fn zones_hit_blocks(
    zone_part: &Part,
    block_part: &Part,
    blocks_in_zones: DiscreteTransform,
    zones_in_blocks: DiscreteTransform,
    test_optional: bool,
) -> bool {
    let block_bounds = block_part.bounds().transform(blocks_in_zones);
    tested_zones(zone_part, test_optional).any(|zone| {
        let Some(clipped) = zone.bounds.intersection_cubes(block_bounds) else {
            return false;
        };
        box_hits_blocks(clipped, block_part, blocks_in_zones, zones_in_blocks)
    })
}

/// Returns whether any of `part`'s blocks, moved by `part_to_box`, is inside `region`.
///
/// Iterates whichever of the region's cubes and the part's blocks is fewer.
fn box_hits_blocks(
    region: GridAab,
    part: &Part,
    part_to_box: DiscreteTransform,
    box_to_part: DiscreteTransform,
) -> bool {
    let volume = region.volume().unwrap_or(usize::MAX);
    if volume <= part.occupied_cubes().len() {
        region
            .interior_iter()
            .any(|cube| part.is_occupied(box_to_part.transform_cube(cube)))
    } else {
        part.occupied_cubes()
            .iter()
            .any(|&cube| region.contains_cube(part_to_box.transform_cube(cube)))
    }
}

/// Blocks against blocks, iterating the smaller part.
fn blocks_intersect(
    a: &Part,
    b: &Part,
    b_in_a: DiscreteTransform,
    a_in_b: DiscreteTransform,
) -> bool {
    let Some(overlap) = a.bounds().intersection_cubes(b.bounds().transform(b_in_a)) else {
        return false;
    };
    if a.occupied_cubes().len() <= b.occupied_cubes().len() {
        cubes_hit(a, b, overlap, a_in_b)
    } else {
        cubes_hit(b, a, overlap.transform(a_in_b), b_in_a)
    }
}

/// Returns whether any of `small`'s cubes within `region` is occupied in `large`.
fn cubes_hit(
    small: &Part,
    large: &Part,
    region: GridAab,
    small_to_large: DiscreteTransform,
) -> bool {
    small
        .occupied_cubes()
        .iter()
        .filter(|&&cube| region.contains_cube(cube))
        .any(|&cube| large.is_occupied(small_to_large.transform_cube(cube)))
}

/// Number of hits, misses, and evictions of an [`IntersectionCache`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups which had to compute the answer.
    pub misses: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
    /// Entries currently stored.
    pub len: usize,
}

type CacheKey = (PartKey, PartKey, DiscreteTransform, bool);

/// Memoizes [`intersects()`] by the parts' keys and their relative placement.
///
/// Since parts are immutable once loaded, entries never become stale; the cache is
/// bounded only to limit memory. Entries are kept in two generations: when the
/// current generation fills to half the capacity, the previous generation is dropped
/// and the current one takes its place. Entries found in the previous generation are
/// promoted, so frequently used entries survive.
///
/// The cache may be shared among threads; the computation happens outside the lock.
#[derive(Debug)]
pub struct IntersectionCache {
    generation_capacity: usize,
    state: Mutex<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    current: HashMap<CacheKey, bool>,
    previous: HashMap<CacheKey, bool>,
    stats: CacheStats,
}

impl IntersectionCache {
    /// Entry budget used by [`Default`].
    pub const DEFAULT_CAPACITY: usize = 1 << 18;

    /// Constructs a cache which holds at most about `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            generation_capacity: (capacity / 2).max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns whether two placed parts collide, as per [`intersects()`].
    pub fn intersects(&self, a: &PlacedPart<'_>, b: &PlacedPart<'_>, test_optional: bool) -> bool {
        let key = Self::key(a, b, test_optional);
        {
            let state = &mut *lock(&self.state);
            if let Some(&hit) = state.current.get(&key) {
                state.stats.hits += 1;
                return hit;
            }
            if let Some(hit) = state.previous.remove(&key) {
                state.stats.hits += 1;
                self.insert(state, key, hit);
                return hit;
            }
            state.stats.misses += 1;
        }

        let result = intersects(a, b, test_optional);
        self.insert(&mut lock(&self.state), key, result);
        result
    }

    /// Returns the statistics so far.
    pub fn stats(&self) -> CacheStats {
        let state = lock(&self.state);
        CacheStats {
            len: state.current.len() + state.previous.len(),
            ..state.stats
        }
    }

    /// Drops all entries. Statistics are kept.
    pub fn clear(&self) {
        let state = &mut *lock(&self.state);
        state.current.clear();
        state.previous.clear();
    }

    fn insert(&self, state: &mut CacheState, key: CacheKey, value: bool) {
        if state.current.len() >= self.generation_capacity {
            let dropped = mem::replace(&mut state.previous, mem::take(&mut state.current));
            state.stats.evictions += dropped.len() as u64;
            log::debug!(
                "intersection cache rotated, {} entries dropped; {:?}",
                dropped.len(),
                state.stats
            );
        }
        state.current.insert(key, value);
    }

    /// Builds a key which is the same for either order of the arguments.
    fn key(a: &PlacedPart<'_>, b: &PlacedPart<'_>, test_optional: bool) -> CacheKey {
        let (first, second) = match a.part.key().cmp(b.part.key()) {
            core::cmp::Ordering::Less => (a, b),
            core::cmp::Ordering::Greater => (b, a),
            core::cmp::Ordering::Equal => {
                // The same part on both sides: pick whichever relative transform
                // sorts first.
                if transform_order(a.relative(b)) <= transform_order(b.relative(a)) {
                    (a, b)
                } else {
                    (b, a)
                }
            }
        };
        (
            first.part.key().clone(),
            second.part.key().clone(),
            first.relative(second),
            test_optional,
        )
    }
}

impl Default for IntersectionCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

fn transform_order(t: DiscreteTransform) -> (GridRotation, [i32; 3]) {
    (t.rotation, t.translation.to_array())
}

/// Returns whether any cube of `region` (in world coordinates) is occupied by `placed`.
pub fn region_hits_blocks(region: GridAab, placed: &PlacedPart<'_>) -> bool {
    let Some(clipped) = region.intersection_cubes(placed.part.bounds().transform(placed.transform))
    else {
        return false;
    };
    box_hits_blocks(clipped, placed.part, placed.transform, placed.inverse)
}

/// Returns whether `cube` (in world coordinates) is occupied by `placed`.
pub fn cube_is_occupied(cube: Cube, placed: &PlacedPart<'_>) -> bool {
    placed.part.is_occupied(placed.inverse.transform_cube(cube))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{BlockDescriptor, PartDescriptor};
    use crate::math::{Face6, GridVector};
    use crate::part::CubeSize;
    use alloc::vec::Vec;
    use rand::seq::IndexedRandom as _;
    use rand::{Rng as _, SeedableRng as _};
    use rstest::rstest;

    fn part(name: &str, blocks: Vec<BlockDescriptor>) -> Part {
        Part::from_descriptor(PartDescriptor::new(name, CubeSize::Large, blocks)).unwrap()
    }

    fn single() -> Part {
        part("single", vec![BlockDescriptor::new("b", [0, 0, 0])])
    }

    /// An L-shaped part with a reserved zone in front of it.
    fn ell(name: &str, zone_flags: &str) -> Part {
        part(
            name,
            vec![
                BlockDescriptor::new("b", [0, 0, 0]),
                BlockDescriptor::new("b", [1, 0, 0]),
                BlockDescriptor::new("b", [0, 1, 0])
                    .with_tag(format!("reserved NE:0:0:2 {zone_flags}")),
            ],
        )
    }

    fn at(part: &Part, translation: [i32; 3]) -> PlacedPart<'_> {
        PlacedPart::new(part, DiscreteTransform::from_translation(translation))
    }

    #[test]
    fn identical_placement_intersects() {
        let p = single();
        assert!(intersects(&at(&p, [5, 5, 5]), &at(&p, [5, 5, 5]), false));
    }

    #[test]
    fn disjoint_placement_does_not_intersect() {
        let p = single();
        assert!(!intersects(&at(&p, [0, 0, 0]), &at(&p, [1, 0, 0]), true));
        assert!(!intersects(&at(&p, [0, 0, 0]), &at(&p, [10, -3, 2]), true));
    }

    #[test]
    fn rotation_is_accounted_for() {
        let l = ell("ell", "");
        let origin = at(&l, [0, 0, 0]);
        let half_turn = |translation: [i32; 3]| {
            PlacedPart::new(
                &l,
                DiscreteTransform {
                    rotation: GridRotation::CLOCKWISE * GridRotation::CLOCKWISE,
                    translation: translation.into(),
                },
            )
        };
        // Blocks at (1, 0, 0), (0, 0, 0) and (1, 1, 0).
        assert!(intersects(&origin, &half_turn([2, 0, 1]), false));
        // Blocks at z = 4, zone at z = 4..7.
        assert!(!intersects(&origin, &half_turn([2, 0, 5]), true));
        assert!(!intersects(&origin, &at(&l, [0, 0, 4]), true));
        // Block (0, 1, -2) is in the zone.
        assert!(intersects(&origin, &at(&l, [0, 1, -2]), true));
    }

    #[rstest]
    #[case::plain("", true)]
    #[case::shared("shared", true)]
    #[case::optional("optional", false)]
    fn zone_against_block(#[case] flags: &str, #[case] expected_relaxed: bool) {
        let zoned = ell("zoned", flags);
        let p = single();
        // The zone is (0, 1, -2..1), including the tagged block itself.
        let zoned_placed = at(&zoned, [0, 0, 0]);
        let block_in_zone = at(&p, [0, 1, -1]);
        assert!(intersects(&zoned_placed, &block_in_zone, true));
        assert_eq!(
            intersects(&zoned_placed, &block_in_zone, false),
            expected_relaxed
        );
        assert!(!intersects(&zoned_placed, &at(&p, [0, 1, -3]), true));
    }

    #[rstest]
    #[case::plain_plain("", "", true)]
    #[case::shared_plain("shared", "", false)]
    #[case::shared_shared("shared", "shared", false)]
    fn zone_against_zone(#[case] flags_a: &str, #[case] flags_b: &str, #[case] expected: bool) {
        let a = ell("a", flags_a);
        let b = ell("b", flags_b);
        // a's zone is (0, 1, -2..1).
        let pa = at(&a, [0, 0, 0]);
        // b's block (0, 1, -1) is inside a's zone.
        let pb = at(&b, [0, 0, -1]);
        // Blocks at z = -3 and zone (0, 1, -3..0): only the zones overlap.
        let pb_turned = PlacedPart::new(
            &b,
            DiscreteTransform {
                rotation: GridRotation::CLOCKWISE * GridRotation::CLOCKWISE,
                translation: GridVector::new(1, 0, -2),
            },
        );
        assert!(intersects(&pa, &pb, true));
        assert_eq!(intersects(&pa, &pb_turned, true), expected);
        assert_eq!(intersects(&pb_turned, &pa, false), expected);
    }

    /// Intersection does not depend on argument order, with or without a cache.
    #[test]
    fn symmetry() {
        let parts = [single(), ell("ell", ""), ell("shared", "shared optional")];
        let cache = IntersectionCache::new(64);
        let mut rng = rand_xoshiro::Xoshiro256Plus::seed_from_u64(12345);
        for _ in 0..2000 {
            let pa = parts.choose(&mut rng).unwrap();
            let pb = parts.choose(&mut rng).unwrap();
            let mut random_transform = || DiscreteTransform {
                rotation: *GridRotation::ALL.choose(&mut rng).unwrap(),
                translation: GridVector::new(
                    rng.random_range(-3..=3),
                    rng.random_range(-3..=3),
                    rng.random_range(-3..=3),
                ),
            };
            let a = PlacedPart::new(pa, random_transform());
            let b = PlacedPart::new(pb, random_transform());
            let test_optional = rng.random_bool(0.5);
            let ab = intersects(&a, &b, test_optional);
            assert_eq!(ab, intersects(&b, &a, test_optional), "{a:?} {b:?}");
            assert_eq!(ab, cache.intersects(&a, &b, test_optional));
            assert_eq!(ab, cache.intersects(&b, &a, test_optional));
        }
        let stats = cache.stats();
        assert!(stats.hits > 0);
        assert!(stats.evictions > 0);
        assert!(stats.len <= 64);
    }

    #[test]
    fn cache_counts_hits_and_misses() {
        let p = single();
        let cache = IntersectionCache::new(100);
        let a = at(&p, [0, 0, 0]);
        let b = at(&p, [0, 0, 0]);
        assert!(cache.intersects(&a, &b, false));
        assert!(cache.intersects(&b, &a, false));
        // Same relative placement, different absolute position.
        assert!(cache.intersects(&at(&p, [3, 3, 3]), &at(&p, [3, 3, 3]), false));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 2,
                misses: 1,
                evictions: 0,
                len: 1
            }
        );
        cache.clear();
        assert_eq!(cache.stats().len, 0);
    }

    #[test]
    fn world_queries() {
        let l = ell("ell", "");
        let placed = at(&l, [10, 0, 0]);
        assert!(cube_is_occupied(Cube::new(11, 0, 0), &placed));
        assert!(!cube_is_occupied(Cube::new(11, 1, 0), &placed));
        assert!(region_hits_blocks(
            GridAab::from_lower_upper([11, 0, 0], [20, 20, 20]),
            &placed
        ));
        assert!(!region_hits_blocks(
            GridAab::single_cube(Cube::new(10, 0, 0).adjacent(Face6::NZ)),
            &placed
        ));
    }
}
