//! Immutable part templates ([`Part`]) and their mount points.

use alloc::collections::BTreeMap;
use alloc::string::ToString as _;
use alloc::vec::Vec;
use core::fmt;

use arcstr::ArcStr;
use hashbrown::HashMap;

use crate::descriptor::{BlockDescriptor, Extents, PartDescriptor, SourceError};
use crate::math::{Axis, Cube, DiscreteTransform, Face6, GridAab, GridVector};
use crate::stats::BlockSetInfo;
use crate::tag::{Direction, Directive, MountTag, ReservedTag, parse_tag};

pub use crate::tag::TagError;

/// Key identifying a [`Part`] within a [`PartLibrary`](crate::library::PartLibrary).
pub type PartKey = ArcStr;

/// Grid scale of a part's blocks. Parts of different sizes never connect.
#[expect(clippy::exhaustive_enums)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CubeSize {
    #[allow(missing_docs)]
    Large,
    #[allow(missing_docs)]
    Small,
}

/// Restricts what a mount point may be attached to.
///
/// Rules are ordered from least to most restrictive.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum AdjacencyRule {
    /// Any compatible mount.
    #[default]
    Any,
    /// Not the same mount of another instance of the same part.
    ExcludeSelfMount,
    /// Not any mount of another instance of the same part.
    ExcludeSelfPart,
}

impl AdjacencyRule {
    /// Returns whether a mount `own_mount` of part `own_part`, having this rule, may
    /// attach to mount `other_mount` of part `other_part`.
    pub fn permits(
        self,
        own_part: &str,
        own_mount: &MountKey,
        other_part: &str,
        other_mount: &MountKey,
    ) -> bool {
        match self {
            AdjacencyRule::Any => true,
            AdjacencyRule::ExcludeSelfMount => {
                !(own_part == other_part && own_mount == other_mount)
            }
            AdjacencyRule::ExcludeSelfPart => own_part != other_part,
        }
    }
}

/// Identifies a [`MountPoint`] within its part: its type and its instance name.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs)]
pub struct MountKey {
    /// Mount type. Only mounts of equal type may attach.
    pub mount_type: ArcStr,
    /// Instance name, distinguishing mounts of the same type on one part.
    pub instance: ArcStr,
}

impl MountKey {
    /// Constructs a [`MountKey`].
    pub fn new(mount_type: impl Into<ArcStr>, instance: impl Into<ArcStr>) -> Self {
        Self {
            mount_type: mount_type.into(),
            instance: instance.into(),
        }
    }
}

impl fmt::Debug for MountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.mount_type, self.instance)
    }
}

impl fmt::Display for MountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One anchor block of a [`MountPoint`]: a position and an outward facing direction.
///
/// The cube adjacent to the anchor in the facing direction is the *mount location*.
/// Two anchor blocks mate when each one's anchor is the other's mount location, they
/// face opposite directions, and their pieces are equal.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_structs)]
pub struct MountPointBlock {
    /// The cube containing the anchor block.
    pub anchor: Cube,
    /// Outward facing direction.
    pub facing: Face6,
    /// Piece name; only anchor blocks with equal pieces mate.
    pub piece: ArcStr,
}

impl MountPointBlock {
    /// Returns the cube where a mating anchor block must be.
    #[inline]
    pub fn mount_location(&self) -> Cube {
        self.anchor.adjacent(self.facing)
    }

    /// Returns this anchor block moved by `transform`.
    #[must_use]
    pub fn transformed(&self, transform: DiscreteTransform) -> Self {
        Self {
            anchor: transform.transform_cube(self.anchor),
            facing: transform.transform_face(self.facing),
            piece: self.piece.clone(),
        }
    }

    /// Returns whether `self` and `other`, in the same frame, mate with each other.
    /// This relation is symmetric.
    pub fn mates_with(&self, other: &MountPointBlock) -> bool {
        other.facing == self.facing.opposite()
            && other.anchor == self.mount_location()
            && other.piece == self.piece
    }
}

/// Returns whether two anchor groups, in the same frame, are attached: every block of
/// the smaller group mates with some block of the larger group.
///
/// Empty groups are never attached.
pub fn groups_mate(a: &[MountPointBlock], b: &[MountPointBlock]) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    !small.is_empty() && small.iter().all(|s| large.iter().any(|l| s.mates_with(l)))
}

/// A named, typed attachment interface on a [`Part`], made of up to
/// [`MountPoint::MAX_BLOCKS`] anchor blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct MountPoint {
    key: MountKey,
    blocks: Vec<MountPointBlock>,
    adjacency: AdjacencyRule,
}

impl MountPoint {
    /// Largest number of anchor blocks a mount point may have.
    ///
    /// Matching mount points tries every pairing of anchor blocks, so this is kept small.
    pub const MAX_BLOCKS: usize = 4;

    /// Returns this mount's key.
    pub fn key(&self) -> &MountKey {
        &self.key
    }

    /// Returns this mount's type.
    pub fn mount_type(&self) -> &ArcStr {
        &self.key.mount_type
    }

    /// Returns the anchor blocks, in the part's frame.
    pub fn blocks(&self) -> &[MountPointBlock] {
        &self.blocks
    }

    /// Returns the adjacency rule.
    pub fn adjacency(&self) -> AdjacencyRule {
        self.adjacency
    }

    /// Returns whether this mount may ever attach to `other`, judging by type alone.
    pub fn is_compatible(&self, other: &MountPoint) -> bool {
        self.key.mount_type == other.key.mount_type
    }
}

/// A reserved zone: a box, in its part's frame, that other parts must not overlap.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_structs)]
pub struct ReservedZone {
    /// The zone's extent.
    pub bounds: GridAab,
    /// Shared zones never conflict with other reserved zones, only with blocks.
    pub shared: bool,
    /// Optional zones are a hint, ignored during relaxed validation.
    pub optional: bool,
}

impl ReservedZone {
    /// Returns whether this zone participates in a test that does or does not include
    /// optional zones.
    #[inline]
    pub fn is_tested(&self, test_optional: bool) -> bool {
        test_optional || !self.optional
    }
}

/// Failure to build a [`Part`] at all. The part is left out of the library.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The source has no such part.
    #[error("part {0:?} not found")]
    NotFound(PartKey),
    /// The descriptor has no blocks.
    #[error("part {0:?} has no blocks")]
    NoBlocks(PartKey),
    /// Two blocks occupy the same cube.
    #[error("part {part:?} has more than one block at {cube:?}")]
    DuplicateBlock {
        /// The part.
        part: PartKey,
        /// The cube.
        cube: Cube,
    },
    /// The source failed.
    #[error("part {part:?} could not be read")]
    Source {
        /// The part.
        part: PartKey,
        /// The source's error.
        #[source]
        error: SourceError,
    },
}

/// An immutable, reusable template of voxel occupancy, reserved zones, and mount points.
///
/// Built once from a [`PartDescriptor`]; see [`Part::from_descriptor()`].
pub struct Part {
    key: PartKey,
    cube_size: CubeSize,
    blocks: Vec<BlockDescriptor>,
    /// Index into `blocks` for each occupied cube.
    occupancy: HashMap<Cube, usize>,
    /// Sorted, for deterministic iteration.
    occupied_cubes: Vec<Cube>,
    bounds: GridAab,
    reserved: Vec<ReservedZone>,
    reserved_bounds: Option<GridAab>,
    mounts: BTreeMap<MountKey, MountPoint>,
    stats: BlockSetInfo,
}

impl Part {
    /// Builds a part from its descriptor.
    ///
    /// Problems with individual tags are logged and the affected mount block or reserved
    /// zone is skipped; only problems with the geometry as a whole are errors.
    pub fn from_descriptor(descriptor: PartDescriptor) -> Result<Part, LoadError> {
        let PartDescriptor {
            name: key,
            cube_size,
            blocks,
        } = descriptor;
        if blocks.is_empty() {
            return Err(LoadError::NoBlocks(key));
        }

        let mut occupancy = HashMap::new();
        let mut bounds = GridAab::ORIGIN_EMPTY;
        let mut stats = BlockSetInfo::new();
        let mut reserved = Vec::new();
        let mut mount_blocks: BTreeMap<MountKey, (Vec<MountPointBlock>, AdjacencyRule)> =
            BTreeMap::new();

        for (index, block) in blocks.iter().enumerate() {
            let block_box = block_bounds(block);
            for cube in block_box.interior_iter() {
                if occupancy.insert(cube, index).is_some() {
                    return Err(LoadError::DuplicateBlock { part: key, cube });
                }
            }
            bounds = bounds.union_cubes(block_box);
            stats.add_block(block);

            let Some(tag) = &block.tag else { continue };
            let mut ignored = Vec::new();
            let directive = parse_tag(tag, &mut ignored);
            for error in ignored {
                log::warn!("part {key:?}: tag {tag:?} at {:?}: ignored: {error}", block.position);
            }
            match directive {
                Ok(None) => {}
                Ok(Some(Directive::Mount(mount))) => {
                    if let Some(extents) = mount.reserved {
                        reserved.push(ReservedZone {
                            bounds: zone_around(block, extents),
                            shared: mount.shared,
                            optional: mount.optional,
                        });
                    }
                    let (anchor_blocks, rule) = mount_blocks
                        .entry(MountKey::new(mount.mount_type.clone(), mount.instance.clone()))
                        .or_default();
                    anchor_blocks.push(anchor_block(block, &mount));
                    *rule = (*rule).max(mount.adjacency);
                }
                Ok(Some(Directive::Reserved(tag_zone))) => {
                    match reserved_extents(block, &tag_zone) {
                        Some(extents) => reserved.push(ReservedZone {
                            bounds: zone_around(block, extents),
                            shared: tag_zone.shared,
                            optional: tag_zone.optional,
                        }),
                        None => log::warn!(
                            "part {key:?}: tag {tag:?} at {:?}: {}",
                            block.position,
                            TagError::NoExtents
                        ),
                    }
                }
                Err(error) => {
                    log::warn!("part {key:?}: tag {tag:?} at {:?}: {error}", block.position);
                }
            }
        }

        let mounts = mount_blocks
            .into_iter()
            .filter_map(|(mount_key, (anchor_blocks, adjacency))| {
                if anchor_blocks.len() > MountPoint::MAX_BLOCKS {
                    let error = TagError::TooManyAnchors {
                        mount: mount_key.to_string(),
                        count: anchor_blocks.len(),
                        max: MountPoint::MAX_BLOCKS,
                    };
                    log::warn!("part {key:?}: {error}");
                    return None;
                }
                Some((
                    mount_key.clone(),
                    MountPoint {
                        key: mount_key,
                        blocks: anchor_blocks,
                        adjacency,
                    },
                ))
            })
            .collect();

        let reserved_bounds = reserved
            .iter()
            .map(|zone| zone.bounds)
            .reduce(GridAab::union_cubes);

        let mut occupied_cubes: Vec<Cube> = occupancy.keys().copied().collect();
        occupied_cubes.sort_unstable();

        Ok(Part {
            key,
            cube_size,
            blocks,
            occupancy,
            occupied_cubes,
            bounds,
            reserved,
            reserved_bounds,
            mounts,
            stats,
        })
    }

    /// Returns the key this part is known by.
    pub fn key(&self) -> &PartKey {
        &self.key
    }

    /// Returns the grid scale of this part's blocks.
    pub fn cube_size(&self) -> CubeSize {
        self.cube_size
    }

    /// Returns the blocks this part was built from.
    pub fn blocks(&self) -> &[BlockDescriptor] {
        &self.blocks
    }

    /// Number of blocks (not cubes; a block may occupy several cubes).
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns whether any block occupies `cube`.
    #[inline]
    pub fn is_occupied(&self, cube: Cube) -> bool {
        self.occupancy.contains_key(&cube)
    }

    /// Returns the block occupying `cube`, if any.
    pub fn block_at(&self, cube: Cube) -> Option<&BlockDescriptor> {
        self.occupancy.get(&cube).map(|&index| &self.blocks[index])
    }

    /// Every occupied cube, in ascending order.
    pub fn occupied_cubes(&self) -> &[Cube] {
        &self.occupied_cubes
    }

    /// Bounding box of the occupied cubes.
    pub fn bounds(&self) -> GridAab {
        self.bounds
    }

    /// The reserved zones.
    pub fn reserved_zones(&self) -> &[ReservedZone] {
        &self.reserved
    }

    /// Bounding box of the reserved zones, or [`None`] if there are none.
    pub fn reserved_bounds(&self) -> Option<GridAab> {
        self.reserved_bounds
    }

    /// Bounding box of everything a placement of this part affects: blocks and
    /// reserved zones.
    pub fn footprint(&self) -> GridAab {
        match self.reserved_bounds {
            Some(reserved) => self.bounds.union_cubes(reserved),
            None => self.bounds,
        }
    }

    /// All mount points, ordered by key.
    pub fn mounts(&self) -> impl Iterator<Item = &MountPoint> + '_ {
        self.mounts.values()
    }

    /// Number of mount points.
    pub fn mount_count(&self) -> usize {
        self.mounts.len()
    }

    /// Looks up a mount point.
    pub fn mount(&self, key: &MountKey) -> Option<&MountPoint> {
        self.mounts.get(key)
    }

    /// Aggregate statistics of all blocks.
    pub fn stats(&self) -> &BlockSetInfo {
        &self.stats
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Part")
            .field("key", &self.key)
            .field("cube_size", &self.cube_size)
            .field("blocks", &self.blocks.len())
            .field("bounds", &self.bounds)
            .field("reserved", &self.reserved)
            .field("mounts", &self.mounts.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn block_bounds(block: &BlockDescriptor) -> GridAab {
    let size = block.size;
    GridAab::from_lower_size(
        block.position,
        [size.width.max(1), size.height.max(1), size.depth.max(1)],
    )
}

/// Returns the block's bounds extended by `extents`, which are in the block's own frame.
fn zone_around(block: &BlockDescriptor, extents: Extents) -> GridAab {
    let mut zone = block_bounds(block);
    for axis in Axis::ALL {
        let [negative, positive] = axis.faces().map(|face| block.orientation.transform(face));
        zone = zone
            .expand_toward(negative, extents.negative[axis])
            .expand_toward(positive, extents.positive[axis]);
    }
    zone
}

/// Combines the extents written in a `reserved` tag with the block's sensor field.
fn reserved_extents(block: &BlockDescriptor, tag: &ReservedTag) -> Option<Extents> {
    match (tag.negative, tag.positive, block.sensor_field) {
        (Some(negative), Some(positive), _) => Some(Extents { negative, positive }),
        (None, None, field) => field,
        (negative, positive, field) => {
            let field = field.unwrap_or_default();
            Some(Extents {
                negative: negative.unwrap_or(field.negative),
                positive: positive.unwrap_or(field.positive),
            })
        }
    }
}

fn anchor_block(block: &BlockDescriptor, tag: &MountTag) -> MountPointBlock {
    let offset = tag.anchor_offset.unwrap_or(GridVector::zero());
    let facing = match tag.direction {
        None => block.orientation.transform(Face6::NZ),
        Some(Direction::Absolute(face)) => face,
        Some(Direction::Relative(face)) => block.orientation.transform(face),
    };
    MountPointBlock {
        anchor: block.position + block.orientation.transform_vector(offset),
        facing,
        piece: tag.piece.clone(),
    }
}
