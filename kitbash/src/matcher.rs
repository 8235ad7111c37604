//! Finding the transforms which line up one mount point with another.

use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::Mutex;

use hashbrown::HashMap;
use itertools::Itertools as _;

use crate::math::{DiscreteTransform, GridRotation};
use crate::part::{MountKey, MountPoint, MountPointBlock, Part, PartKey, groups_mate};
use crate::util::lock;

type MatchKey = (PartKey, MountKey, PartKey, MountKey);

/// Computes and memoizes mount alignments.
///
/// Given mount `mine` of one part and mount `other` of another, a *match* is a
/// transform which, applied to the other part, causes `other`'s anchor blocks to mate
/// with `mine`'s; see [`MountPointBlock::mates_with()`]. The result is in the
/// coordinates of `mine`'s part, so to place the other part in the world it must be
/// composed with the world transform of `mine`'s part.
///
/// Results depend only on the two (immutable) mounts, so they are cached forever.
/// Only one direction of each pair is stored; the other is derived by inverting each
/// transform.
#[derive(Debug, Default)]
pub struct MountMatcher {
    cache: Mutex<HashMap<MatchKey, Arc<[DiscreteTransform]>>>,
}

impl MountMatcher {
    /// Constructs an empty [`MountMatcher`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every transform that makes `other_mount` of `other_part` mate with
    /// `mine_mount` of `mine_part`.
    ///
    /// Incompatible mount types produce no transforms, and are not cached.
    pub fn match_transforms(
        &self,
        mine_part: &Part,
        mine_mount: &MountPoint,
        other_part: &Part,
        other_mount: &MountPoint,
    ) -> Arc<[DiscreteTransform]> {
        if !mine_mount.is_compatible(other_mount) {
            return Arc::from([]);
        }
        let mine_id = (mine_part.key(), mine_mount.key());
        let other_id = (other_part.key(), other_mount.key());
        let swapped = other_id < mine_id;
        let key: MatchKey = if swapped {
            (other_id.0.clone(), other_id.1.clone(), mine_id.0.clone(), mine_id.1.clone())
        } else {
            (mine_id.0.clone(), mine_id.1.clone(), other_id.0.clone(), other_id.1.clone())
        };

        let cached = lock(&self.cache).get(&key).cloned();
        let stored = match cached {
            Some(stored) => stored,
            None => {
                let computed: Arc<[DiscreteTransform]> = if swapped {
                    align(other_mount.blocks(), mine_mount.blocks()).into()
                } else {
                    align(mine_mount.blocks(), other_mount.blocks()).into()
                };
                log::trace!(
                    "matched {}/{} with {}/{}: {} transforms",
                    key.0,
                    key.1,
                    key.2,
                    key.3,
                    computed.len()
                );
                // If another thread computed the same entry meanwhile, keep the first.
                lock(&self.cache).entry(key).or_insert(computed).clone()
            }
        };

        if swapped {
            stored.iter().map(|t| t.inverse()).collect()
        } else {
            stored
        }
    }

    /// Number of cached mount pairs.
    pub fn cached_pairs(&self) -> usize {
        lock(&self.cache).len()
    }
}

/// Returns every transform which, applied to the `other` anchor group, causes every
/// block of the smaller group to mate with some block of the larger group.
///
/// The larger group stays fixed, or `mine` if the sizes are equal; candidates are
/// generated by pairing the first block of the smaller group with each block of the
/// larger. Results are in order of discovery, without duplicates. Empty groups match
/// nothing.
pub fn align(mine: &[MountPointBlock], other: &[MountPointBlock]) -> Vec<DiscreteTransform> {
    let swapped = other.len() > mine.len();
    let (fixed, moving) = if swapped { (other, mine) } else { (mine, other) };
    let Some(first) = moving.first() else {
        return Vec::new();
    };

    fixed
        .iter()
        .flat_map(|target| get_transforms(target, first))
        .filter(|&t| {
            let moved: Vec<MountPointBlock> = moving.iter().map(|b| b.transformed(t)).collect();
            groups_mate(fixed, &moved)
        })
        .map(|t| if swapped { t.inverse() } else { t })
        .unique()
        .collect()
}

/// Returns the transforms which make the single block `moving` mate with `fixed`.
///
/// There are four if the pieces are equal (one for each rotation about the shared
/// facing axis), and none otherwise.
pub fn get_transforms(
    fixed: &MountPointBlock,
    moving: &MountPointBlock,
) -> impl Iterator<Item = DiscreteTransform> + use<> {
    let wanted_facing = fixed.facing.opposite();
    let target = fixed.mount_location();
    let pieces_match = fixed.piece == moving.piece;
    let MountPointBlock { anchor, facing, .. } = *moving;
    GridRotation::ALL
        .into_iter()
        .filter(move |rotation| pieces_match && rotation.transform(facing) == wanted_facing)
        .map(move |rotation| {
            let rotated =
                DiscreteTransform::from_rotation_about_origin(rotation).transform_cube(anchor);
            DiscreteTransform {
                rotation,
                translation: target - rotated,
            }
        })
}
