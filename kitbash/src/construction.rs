//! [`Construction`], the structure being grown, and its [`Room`]s.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::{HashMap, HashSet};

use crate::intersection::{IntersectionCache, PlacedPart};
use crate::math::{Cube, DiscreteTransform, Face6, GridAab};
use crate::part::{CubeSize, MountKey, MountPointBlock, Part, PartKey, groups_mate};
use crate::requirement::{ErrorTerm, RequirementSeed};
use crate::stats::BlockSetInfo;

/// Identifies a room within its [`Construction`]. Ids are issued in increasing order
/// and never reused.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomId(u64);

impl RoomId {
    /// Returns the numeric value of the id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies one mount of one room.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs)]
pub struct RoomMountId {
    #[allow(missing_docs)]
    pub room: RoomId,
    #[allow(missing_docs)]
    pub mount: MountKey,
}

/// A placed instance of a [`Part`].
///
/// A room is created detached, by [`Construction::generate_room()`], and becomes part
/// of the construction with [`Construction::register_room()`].
#[derive(Clone)]
pub struct Room {
    part: Arc<Part>,
    transform: DiscreteTransform,
    inverse: DiscreteTransform,
    bounds: GridAab,
    reserved_bounds: Option<GridAab>,
}

impl Room {
    /// Places `part` at `transform`.
    pub fn new(part: Arc<Part>, transform: DiscreteTransform) -> Self {
        let bounds = part.bounds().transform(transform);
        let reserved_bounds = part.reserved_bounds().map(|b| b.transform(transform));
        Self {
            part,
            transform,
            inverse: transform.inverse(),
            bounds,
            reserved_bounds,
        }
    }

    /// The part.
    pub fn part(&self) -> &Arc<Part> {
        &self.part
    }

    /// Transform from the part's frame to the construction's.
    pub fn transform(&self) -> DiscreteTransform {
        self.transform
    }

    /// Bounding box of the blocks, in the construction's frame.
    pub fn bounds(&self) -> GridAab {
        self.bounds
    }

    /// Bounding box of the reserved zones, in the construction's frame.
    pub fn reserved_bounds(&self) -> Option<GridAab> {
        self.reserved_bounds
    }

    /// Bounding box of the blocks and reserved zones, in the construction's frame.
    pub fn footprint(&self) -> GridAab {
        match self.reserved_bounds {
            Some(reserved) => self.bounds.union_cubes(reserved),
            None => self.bounds,
        }
    }

    /// The room as input to the intersection engine.
    pub fn placed(&self) -> PlacedPart<'_> {
        PlacedPart::with_inverse(&self.part, self.transform, self.inverse)
    }

    /// Returns the anchor blocks of the given mount, in the construction's frame.
    pub fn mount_blocks(&self, mount: &MountKey) -> Vec<MountPointBlock> {
        self.part
            .mount(mount)
            .map(|m| m.blocks().iter().map(|b| b.transformed(self.transform)).collect())
            .unwrap_or_default()
    }

    /// Returns whether a block of this room occupies `cube` (in the construction's frame).
    pub fn is_occupied(&self, cube: Cube) -> bool {
        self.bounds.contains_cube(cube) && self.part.is_occupied(self.inverse.transform_cube(cube))
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("part", self.part.key())
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}

/// Violation of a [`Construction`]'s contract by its caller.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ConstructionError {
    /// A room's part has a different cube size than the construction.
    #[error("part {part:?} has cube size {part_size:?} but the construction has {construction:?}")]
    CubeSizeMismatch {
        /// The part.
        part: PartKey,
        /// The part's cube size.
        part_size: CubeSize,
        /// The construction's cube size.
        construction: CubeSize,
    },
    /// No such room is registered.
    #[error("room {0} is not in the construction")]
    UnknownRoom(RoomId),
}

/// One entry of [`Construction::blueprint()`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub struct PlacedRoom {
    /// The room's id.
    pub id: RoomId,
    /// Key of the room's part in the [`PartLibrary`](crate::library::PartLibrary).
    pub part: PartKey,
    /// Placement of the part.
    pub transform: DiscreteTransform,
}

/// The structure being grown: a set of [`Room`]s, their aggregate statistics, and the
/// [`RequirementSeed`] it is scored against.
///
/// All changes to the set of rooms go through [`Construction::register_room()`] and
/// [`Construction::remove_room()`], so that [`Construction::stats()`] is always exactly
/// the sum of the rooms' parts' statistics.
///
/// Which mounts are attached to which is derived from the rooms' positions, and kept
/// up to date as rooms are registered and removed.
pub struct Construction {
    cube_size: CubeSize,
    seed: Arc<RequirementSeed>,
    rooms: HashMap<RoomId, Room>,
    /// Ids of `rooms` in order of registration.
    order: Vec<RoomId>,
    next_id: u64,
    stats: BlockSetInfo,
    /// Incremented on every change to `rooms` outside of trials.
    version: u64,
    /// Every mount, under the anchor and facing of each of its blocks, in the
    /// construction's frame.
    anchors: HashMap<(Cube, Face6), BTreeSet<RoomMountId>>,
    /// Symmetric attachment relation.
    attached: BTreeMap<RoomMountId, RoomMountId>,
    /// Open mounts which have been searched for attachments without success.
    scanned: HashSet<RoomMountId>,
    /// The library generation `scanned` was populated at.
    scanned_generation: u64,
}

impl Construction {
    /// Constructs an empty construction.
    pub fn new(cube_size: CubeSize, seed: Arc<RequirementSeed>) -> Self {
        Self {
            cube_size,
            seed,
            rooms: HashMap::new(),
            order: Vec::new(),
            next_id: 0,
            stats: BlockSetInfo::new(),
            version: 0,
            anchors: HashMap::new(),
            attached: BTreeMap::new(),
            scanned: HashSet::new(),
            scanned_generation: 0,
        }
    }

    /// The cube size every room's part must have.
    pub fn cube_size(&self) -> CubeSize {
        self.cube_size
    }

    /// The targets.
    pub fn seed(&self) -> &Arc<RequirementSeed> {
        &self.seed
    }

    /// Sum of the statistics of every room's part.
    pub fn stats(&self) -> &BlockSetInfo {
        &self.stats
    }

    /// Changes whenever a room is added or removed, except by
    /// [`with_trial_room()`](Self::with_trial_room).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Creates a detached room. It does not affect the construction until registered.
    pub fn generate_room(&self, part: Arc<Part>, transform: DiscreteTransform) -> Room {
        Room::new(part, transform)
    }

    /// Adds `room` to the construction and returns its new id.
    pub fn register_room(&mut self, room: Room) -> Result<RoomId, ConstructionError> {
        if room.part.cube_size() != self.cube_size {
            return Err(ConstructionError::CubeSizeMismatch {
                part: room.part.key().clone(),
                part_size: room.part.cube_size(),
                construction: self.cube_size,
            });
        }
        let id = RoomId(self.next_id);
        self.next_id += 1;
        self.stats.register(room.part.stats());
        self.rooms.insert(id, room);
        self.order.push(id);
        self.version += 1;
        for mount in self.index_mounts(id) {
            self.resolve(mount);
        }
        Ok(id)
    }

    /// Removes a room, returning it detached.
    ///
    /// Any room may be removed; removing the most recently registered one is fastest.
    pub fn remove_room(&mut self, id: RoomId) -> Result<Room, ConstructionError> {
        let room = self
            .rooms
            .remove(&id)
            .ok_or(ConstructionError::UnknownRoom(id))?;
        if self.order.last() == Some(&id) {
            self.order.pop();
        } else {
            log::trace!("removing room {id} out of order");
            self.order.retain(|&other| other != id);
        }
        self.stats.remove(room.part.stats());
        self.scanned.retain(|m| m.room != id);
        self.version += 1;

        let mut freed = Vec::new();
        for mount in room.part.mounts() {
            let mount_id = RoomMountId {
                room: id,
                mount: mount.key().clone(),
            };
            for block in room.mount_blocks(mount.key()) {
                let key = (block.anchor, block.facing);
                if let Some(set) = self.anchors.get_mut(&key) {
                    set.remove(&mount_id);
                    if set.is_empty() {
                        self.anchors.remove(&key);
                    }
                }
            }
            if let Some(partner) = self.attached.remove(&mount_id) {
                self.attached.remove(&partner);
                freed.push(partner);
            }
        }
        // A freed mount may mate with one that was left open because it was taken.
        for mount in freed {
            self.resolve(mount);
        }
        Ok(room)
    }

    /// Registers `room`, calls `f` with the construction and the room's id, then removes
    /// the room again, also when `f` panics.
    ///
    /// Afterwards the construction is as it was before the call, [`version()`](Self::version)
    /// included. The trial room's id is not reused.
    pub fn with_trial_room<R>(
        &mut self,
        room: Room,
        f: impl FnOnce(&Self, RoomId) -> R,
    ) -> Result<R, ConstructionError> {
        let version = self.version;
        let id = self.register_room(room)?;
        let trial = scopeguard::guard(self, move |c| {
            if let Err(error) = c.remove_room(id) {
                log::error!("trial room could not be removed: {error}");
            }
            c.version = version;
        });
        Ok(f(&**trial, id))
    }

    /// Returns the room with the given id.
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    /// Every room, in order of registration.
    pub fn rooms(&self) -> impl Iterator<Item = (RoomId, &Room)> + '_ {
        self.order.iter().map(|&id| (id, &self.rooms[&id]))
    }

    /// Number of rooms.
    pub fn room_count(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no rooms.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Computes the error of the current statistics against the seed; see
    /// [`RequirementSeed::compute_error()`].
    pub fn compute_error(&self, log: Option<&mut dyn FnMut(&ErrorTerm)>) -> f64 {
        self.seed.compute_error(&self.stats, log)
    }

    /// Returns the mount which `mount` is attached to, if any. The relation is
    /// symmetric.
    pub fn attached_to(&self, mount: &RoomMountId) -> Option<RoomMountId> {
        self.attached.get(mount).cloned()
    }

    /// Returns whether `mount` is attached to anything.
    pub fn is_attached(&self, mount: &RoomMountId) -> bool {
        self.attached.contains_key(mount)
    }

    /// Every mount of every room which is not attached, in order of room registration
    /// and then mount key.
    pub fn open_mounts(&self) -> Vec<RoomMountId> {
        self.all_mounts()
            .filter(|id| !self.attached.contains_key(id))
            .collect()
    }

    /// Number of mounts which are not attached.
    pub fn open_mount_count(&self) -> usize {
        let total: usize = self.rooms.values().map(|r| r.part.mount_count()).sum();
        total - self.attached.len()
    }

    /// Open mounts of the given room.
    pub fn open_mounts_of(&self, room: RoomId) -> Vec<RoomMountId> {
        let Some(r) = self.rooms.get(&room) else {
            return Vec::new();
        };
        r.part
            .mounts()
            .map(|m| RoomMountId {
                room,
                mount: m.key().clone(),
            })
            .filter(|id| !self.attached.contains_key(id))
            .collect()
    }

    fn all_mounts(&self) -> impl Iterator<Item = RoomMountId> + '_ {
        self.rooms().flat_map(|(room, r)| {
            r.part.mounts().map(move |m| RoomMountId {
                room,
                mount: m.key().clone(),
            })
        })
    }

    /// Adds the mounts of a newly registered room to the anchor index, returning them
    /// in key order.
    fn index_mounts(&mut self, room_id: RoomId) -> Vec<RoomMountId> {
        let Some(room) = self.rooms.get(&room_id) else {
            return Vec::new();
        };
        let mut ids = Vec::with_capacity(room.part.mount_count());
        for mount in room.part.mounts() {
            let id = RoomMountId {
                room: room_id,
                mount: mount.key().clone(),
            };
            for block in room.mount_blocks(mount.key()) {
                self.anchors
                    .entry((block.anchor, block.facing))
                    .or_default()
                    .insert(id.clone());
            }
            ids.push(id);
        }
        ids
    }

    /// Attaches `id` to the first open mount, in (room, key) order, whose anchor group
    /// mates with its own and which both adjacency rules permit.
    fn resolve(&mut self, id: RoomMountId) {
        if self.attached.contains_key(&id) {
            return;
        }
        if let Some(partner) = self.find_partner(&id) {
            self.attached.insert(partner.clone(), id.clone());
            self.attached.insert(id, partner);
        }
    }

    fn find_partner(&self, id: &RoomMountId) -> Option<RoomMountId> {
        let room = self.rooms.get(&id.room)?;
        let mount = room.part.mount(&id.mount)?;
        let blocks = room.mount_blocks(&id.mount);
        let candidates: BTreeSet<&RoomMountId> = blocks
            .iter()
            .filter_map(|b| self.anchors.get(&(b.mount_location(), b.facing.opposite())))
            .flatten()
            .collect();
        candidates
            .into_iter()
            .find(|&other| {
                if other.room == id.room || self.attached.contains_key(other) {
                    return false;
                }
                let Some(other_room) = self.rooms.get(&other.room) else {
                    return false;
                };
                let Some(other_mount) = other_room.part.mount(&other.mount) else {
                    return false;
                };
                mount.is_compatible(other_mount)
                    && mount.adjacency().permits(
                        room.part.key(),
                        &id.mount,
                        other_room.part.key(),
                        &other.mount,
                    )
                    && other_mount.adjacency().permits(
                        other_room.part.key(),
                        &other.mount,
                        room.part.key(),
                        &id.mount,
                    )
                    && groups_mate(&blocks, &other_room.mount_blocks(&other.mount))
            })
            .cloned()
    }

    /// Returns whether `room` collides with any room of the construction other than
    /// `exclude`.
    pub fn intersects_any(
        &self,
        room: &Room,
        cache: &IntersectionCache,
        test_optional: bool,
        exclude: Option<RoomId>,
    ) -> bool {
        let footprint = room.footprint();
        let placed = room.placed();
        self.rooms().any(|(id, other)| {
            Some(id) != exclude
                && footprint.intersects(other.footprint())
                && cache.intersects(&placed, &other.placed(), test_optional)
        })
    }

    /// Returns whether `mount` has been searched without success since the library
    /// last changed.
    pub fn is_scanned(&self, mount: &RoomMountId) -> bool {
        self.scanned.contains(mount)
    }

    /// Records that `mount` was searched without success, as of the given library
    /// generation. Records from earlier generations are forgotten, since new parts
    /// may succeed where the old ones failed.
    pub fn mark_scanned(&mut self, mount: RoomMountId, library_generation: u64) {
        self.forget_stale_scans(library_generation);
        self.scanned.insert(mount);
    }

    /// Forgets scans made before `library_generation`.
    pub fn forget_stale_scans(&mut self, library_generation: u64) {
        if self.scanned_generation != library_generation {
            self.scanned.clear();
            self.scanned_generation = library_generation;
        }
    }

    /// Forgets all scans.
    pub fn clear_scanned(&mut self) {
        self.scanned.clear();
    }

    /// Returns every room, in order, as plain data for an external consumer to spawn
    /// or save.
    pub fn blueprint(&self) -> Vec<PlacedRoom> {
        self.rooms()
            .map(|(id, room)| PlacedRoom {
                id,
                part: room.part.key().clone(),
                transform: room.transform,
            })
            .collect()
    }
}

impl fmt::Debug for Construction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Construction")
            .field("cube_size", &self.cube_size)
            .field("rooms", &self.rooms().collect::<Vec<_>>())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{BlockDescriptor, PartDescriptor, ResourceSupply};
    use crate::math::{GridRotation, GridVector};
    use pretty_assertions::assert_eq;

    fn part(name: &str, size: CubeSize, blocks: Vec<BlockDescriptor>) -> Arc<Part> {
        Arc::new(Part::from_descriptor(PartDescriptor::new(name, size, blocks)).unwrap())
    }

    /// A one-block corridor with a dock on each end, along Z.
    fn corridor() -> Arc<Part> {
        part(
            "corridor",
            CubeSize::Large,
            vec![
                BlockDescriptor::new("hall", [0, 0, 0])
                    .with_tag("mount dock:A front")
                    .with_resource(ResourceSupply::new("air", 2.0, 0.0)),
                BlockDescriptor::new("hall", [0, 0, 1]).with_tag("mount dock:A back D:PZ"),
            ],
        )
    }

    fn construction() -> Construction {
        Construction::new(
            CubeSize::Large,
            Arc::new(RequirementSeed::new(1).with_resource("air", 10.0, 0.0)),
        )
    }

    fn mount(room: RoomId, instance: &str) -> RoomMountId {
        RoomMountId {
            room,
            mount: MountKey::new("dock", instance),
        }
    }

    #[test]
    fn register_and_remove_restore_exactly() {
        let mut c = construction();
        let first = c.register_room(Room::new(corridor(), DiscreteTransform::IDENTITY)).unwrap();
        let stats_before = c.stats().clone();
        let error_before = c.compute_error(None);

        let second = c
            .register_room(
                c.generate_room(corridor(), DiscreteTransform::from_translation([0, 0, 2])),
            )
            .unwrap();
        assert_ne!(c.stats(), &stats_before);
        assert!(c.compute_error(None) < error_before);

        c.remove_room(second).unwrap();
        assert_eq!(c.stats(), &stats_before);
        assert_eq!(c.compute_error(None), error_before);
        assert_eq!(c.rooms().map(|(id, _)| id).collect::<Vec<_>>(), vec![first]);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut c = construction();
        let a = c.register_room(Room::new(corridor(), DiscreteTransform::IDENTITY)).unwrap();
        c.remove_room(a).unwrap();
        let b = c.register_room(Room::new(corridor(), DiscreteTransform::IDENTITY)).unwrap();
        assert_ne!(a, b);
        assert_eq!(c.remove_room(a).unwrap_err(), ConstructionError::UnknownRoom(a));
    }

    #[test]
    fn cube_size_mismatch() {
        let mut c = construction();
        let small = part("small", CubeSize::Small, vec![BlockDescriptor::new("x", [0, 0, 0])]);
        assert!(matches!(
            c.register_room(Room::new(small, DiscreteTransform::IDENTITY)),
            Err(ConstructionError::CubeSizeMismatch { .. })
        ));
        assert!(c.is_empty());
    }

    #[test]
    fn attachments_follow_changes() {
        let mut c = construction();
        let a = c.register_room(Room::new(corridor(), DiscreteTransform::IDENTITY)).unwrap();
        assert_eq!(c.open_mount_count(), 2);

        // Behind the first corridor, the same way around.
        let b = c
            .register_room(Room::new(corridor(), DiscreteTransform::from_translation([0, 0, 2])))
            .unwrap();
        assert_eq!(c.attached_to(&mount(a, "back")), Some(mount(b, "front")));
        assert_eq!(c.attached_to(&mount(b, "front")), Some(mount(a, "back")));
        assert_eq!(c.open_mounts(), vec![mount(a, "front"), mount(b, "back")]);
        assert_eq!(c.open_mounts_of(b), vec![mount(b, "back")]);

        // Removing the first room leaves the second one's front open again.
        c.remove_room(a).unwrap();
        assert_eq!(c.attached_to(&mount(b, "front")), None);
        assert_eq!(c.open_mount_count(), 2);
    }

    #[test]
    fn freed_mount_takes_waiting_partner() {
        let mut c = construction();
        let a = c.register_room(Room::new(corridor(), DiscreteTransform::IDENTITY)).unwrap();
        let behind = DiscreteTransform::from_translation([0, 0, 2]);
        let b = c.register_room(Room::new(corridor(), behind)).unwrap();
        // Same place as `b`; its front finds `a`'s back already taken.
        let waiting = c.register_room(Room::new(corridor(), behind)).unwrap();
        assert_eq!(c.attached_to(&mount(a, "back")), Some(mount(b, "front")));
        assert_eq!(c.attached_to(&mount(waiting, "front")), None);
        let version = c.version();

        c.remove_room(b).unwrap();
        assert!(c.version() > version);
        assert_eq!(c.attached_to(&mount(a, "back")), Some(mount(waiting, "front")));
        assert_eq!(c.open_mounts(), vec![mount(a, "front"), mount(waiting, "back")]);
    }

    #[test]
    fn trial_room_is_undone() {
        let mut c = construction();
        let a = c.register_room(Room::new(corridor(), DiscreteTransform::IDENTITY)).unwrap();
        let version = c.version();
        let stats = c.stats().clone();

        let behind = Room::new(corridor(), DiscreteTransform::from_translation([0, 0, 2]));
        let seen = c
            .with_trial_room(behind, |c, id| {
                (c.room_count(), c.attached_to(&mount(a, "back")) == Some(mount(id, "front")))
            })
            .unwrap();
        assert_eq!(seen, (2, true));
        assert_eq!(c.version(), version);
        assert_eq!(c.stats(), &stats);
        assert_eq!(c.room_count(), 1);
        assert_eq!(c.attached_to(&mount(a, "back")), None);
        assert_eq!(c.open_mount_count(), 2);
    }

    #[test]
    fn trial_room_is_undone_on_panic() {
        let mut c = construction();
        c.register_room(Room::new(corridor(), DiscreteTransform::IDENTITY)).unwrap();
        let version = c.version();

        let behind = Room::new(corridor(), DiscreteTransform::from_translation([0, 0, 2]));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            c.with_trial_room(behind, |_, _| panic!("trial check failed"))
        }));
        assert!(result.is_err());
        assert_eq!(c.version(), version);
        assert_eq!(c.room_count(), 1);
        assert_eq!(c.open_mount_count(), 2);
    }

    #[test]
    fn turned_around_room_attaches() {
        let mut c = construction();
        let a = c.register_room(Room::new(corridor(), DiscreteTransform::IDENTITY)).unwrap();
        // A half turn about Y puts the second corridor's "back" at z = 2, facing -Z.
        let turned = DiscreteTransform {
            rotation: GridRotation::CLOCKWISE * GridRotation::CLOCKWISE,
            translation: GridVector::new(1, 0, 4),
        };
        let b = c.register_room(Room::new(corridor(), turned)).unwrap();
        assert_eq!(c.attached_to(&mount(a, "back")), Some(mount(b, "back")));
        assert_eq!(c.open_mount_count(), 2);
    }

    #[test]
    fn removal_out_of_order() {
        let mut c = construction();
        let ids: Vec<RoomId> = (0..3)
            .map(|i| {
                let t = DiscreteTransform::from_translation([0, 0, 2 * i]);
                c.register_room(Room::new(corridor(), t)).unwrap()
            })
            .collect();
        assert_eq!(c.open_mount_count(), 2);
        c.remove_room(ids[1]).unwrap();
        assert_eq!(c.rooms().map(|(id, _)| id).collect::<Vec<_>>(), vec![ids[0], ids[2]]);
        assert_eq!(c.open_mount_count(), 4);
    }

    #[test]
    fn intersects_any_respects_exclusion() {
        let mut c = construction();
        let cache = IntersectionCache::new(100);
        let a = c.register_room(Room::new(corridor(), DiscreteTransform::IDENTITY)).unwrap();
        let overlapping = Room::new(corridor(), DiscreteTransform::from_translation([0, 0, 1]));
        let apart = Room::new(corridor(), DiscreteTransform::from_translation([0, 0, 2]));
        assert!(c.intersects_any(&overlapping, &cache, true, None));
        assert!(!c.intersects_any(&overlapping, &cache, true, Some(a)));
        assert!(!c.intersects_any(&apart, &cache, true, None));
    }

    #[test]
    fn scanned_mounts_expire_with_library_generation() {
        let mut c = construction();
        let a = c.register_room(Room::new(corridor(), DiscreteTransform::IDENTITY)).unwrap();
        c.mark_scanned(mount(a, "front"), 3);
        assert!(c.is_scanned(&mount(a, "front")));
        c.forget_stale_scans(3);
        assert!(c.is_scanned(&mount(a, "front")));
        c.forget_stale_scans(4);
        assert!(!c.is_scanned(&mount(a, "front")));
    }

    #[test]
    fn blueprint() {
        let mut c = construction();
        let t = DiscreteTransform::from_translation([0, 0, 2]);
        let a = c.register_room(Room::new(corridor(), DiscreteTransform::IDENTITY)).unwrap();
        let b = c.register_room(Room::new(corridor(), t)).unwrap();
        assert_eq!(
            c.blueprint(),
            vec![
                PlacedRoom {
                    id: a,
                    part: "corridor".into(),
                    transform: DiscreteTransform::IDENTITY,
                },
                PlacedRoom {
                    id: b,
                    part: "corridor".into(),
                    transform: t,
                },
            ]
        );
    }
}
