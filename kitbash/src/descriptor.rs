//! Raw part templates ([`PartDescriptor`]), as supplied by whatever loads them from
//! asset files, and the [`PartSource`] trait through which they are pulled.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use arcstr::ArcStr;

use crate::math::{Cube, GridRotation, GridSize, GridSizeCoord};
use crate::part::CubeSize;

/// Error type returned by [`PartSource`] implementations for failures other than
/// “there is no such part”.
pub type SourceError = Box<dyn core::error::Error + Send + Sync>;

/// A pull-based, keyed supply of [`PartDescriptor`]s.
///
/// The [`PartLibrary`](crate::library::PartLibrary) calls [`PartSource::descriptor()`] at
/// most once per successfully loaded key, so implementations need not cache.
pub trait PartSource: fmt::Debug + Send + Sync {
    /// Returns the descriptor for `key`, or [`None`] if there is no such part.
    fn descriptor(&self, key: &str) -> Result<Option<PartDescriptor>, SourceError>;

    /// Returns every key this source can supply, in a stable order.
    fn keys(&self) -> Vec<ArcStr>;
}

/// The raw description of one part: its blocks, each with its own position, tag, and
/// statistics.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct PartDescriptor {
    /// Unique name, used as the part's key in the library.
    pub name: ArcStr,
    /// Grid scale of the blocks.
    pub cube_size: CubeSize,
    /// The blocks. Each must occupy cubes that no other block occupies.
    pub blocks: Vec<BlockDescriptor>,
}

impl PartDescriptor {
    /// Constructs a [`PartDescriptor`].
    pub fn new(name: impl Into<ArcStr>, cube_size: CubeSize, blocks: Vec<BlockDescriptor>) -> Self {
        Self {
            name: name.into(),
            cube_size,
            blocks,
        }
    }
}

/// One block of a [`PartDescriptor`].
///
/// Blocks are in the part's local frame. A block's own frame, in which tag offsets and
/// extents are written, is its `orientation` applied to the canonical frame where
/// forward is −Z, up is +Y and right is +X.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct BlockDescriptor {
    /// Block type identifier, counted in [`BlockSetInfo`](crate::stats::BlockSetInfo).
    pub type_id: ArcStr,
    /// Category used for requirement block-count targets, if any.
    pub category: Option<ArcStr>,
    /// Lowest corner cube of the block.
    pub position: Cube,
    /// Number of cubes occupied along each axis of the part's frame.
    pub size: GridSize,
    /// Rotation from the canonical block frame to the part's frame.
    pub orientation: GridRotation,
    /// Name tag, parsed for `mount` and `reserved` directives.
    pub tag: Option<ArcStr>,
    /// The configured field of a sensor-like block, used as the default extents of a
    /// `reserved` tag on this block.
    pub sensor_field: Option<Extents>,
    /// Inventory storage volume contributed by this block.
    pub inventory_volume: f64,
    /// Electric power produced or consumed.
    pub power: Option<PowerUse>,
    /// Resource storage and throughput contributed.
    pub resources: Vec<ResourceSupply>,
    /// Build cost, as (component id, amount) pairs.
    pub components: Vec<(ArcStr, f64)>,
}

impl BlockDescriptor {
    /// Constructs a single-cube block with no tag, canonical orientation, and no
    /// statistics other than its type.
    pub fn new(type_id: impl Into<ArcStr>, position: impl Into<Cube>) -> Self {
        Self {
            type_id: type_id.into(),
            category: None,
            position: position.into(),
            size: GridSize::new(1, 1, 1),
            orientation: GridRotation::IDENTITY,
            tag: None,
            sensor_field: None,
            inventory_volume: 0.0,
            power: None,
            resources: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Sets the name tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<ArcStr>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: GridRotation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the size in cubes.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<GridSize>) -> Self {
        self.size = size.into();
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<ArcStr>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the sensor field.
    #[must_use]
    pub fn with_sensor_field(mut self, field: Extents) -> Self {
        self.sensor_field = Some(field);
        self
    }

    /// Sets the inventory volume.
    #[must_use]
    pub fn with_inventory_volume(mut self, volume: f64) -> Self {
        self.inventory_volume = volume;
        self
    }

    /// Sets the power use.
    #[must_use]
    pub fn with_power(mut self, power: PowerUse) -> Self {
        self.power = Some(power);
        self
    }

    /// Adds a resource supply.
    #[must_use]
    pub fn with_resource(mut self, supply: ResourceSupply) -> Self {
        self.resources.push(supply);
        self
    }

    /// Adds a component cost.
    #[must_use]
    pub fn with_component(mut self, component: impl Into<ArcStr>, amount: f64) -> Self {
        self.components.push((component.into(), amount));
        self
    }
}

/// Distances outward from a block, in the block's own frame, indexed by axis.
///
/// `negative[0]` is the distance toward the block's left, `positive[1]` toward its top,
/// `positive[2]` toward its back, and so on.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs)]
pub struct Extents {
    #[allow(missing_docs)]
    pub negative: [GridSizeCoord; 3],
    #[allow(missing_docs)]
    pub positive: [GridSizeCoord; 3],
}

/// Electric power produced or consumed by a block.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum PowerUse {
    /// Consumes `amount` as part of the named consumer group.
    Consumer {
        /// Consumer group, e.g. `"thrust"` or `"life-support"`.
        group: ArcStr,
        /// Consumption at full load.
        amount: f64,
    },
    /// Produces `amount`.
    Producer {
        /// Production at full load.
        amount: f64,
    },
}

/// Storage and throughput of one resource contributed by a block.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct ResourceSupply {
    /// Resource id.
    pub resource: ArcStr,
    /// Capacity to hold the resource.
    pub storage: f64,
    /// Rate at which the resource is produced.
    pub throughput: f64,
}

impl ResourceSupply {
    /// Constructs a [`ResourceSupply`].
    pub fn new(resource: impl Into<ArcStr>, storage: f64, throughput: f64) -> Self {
        Self {
            resource: resource.into(),
            storage,
            throughput,
        }
    }
}

/// A [`PartSource`] holding descriptors in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    descriptors: BTreeMap<ArcStr, PartDescriptor>,
}

impl MemorySource {
    /// Constructs an empty [`MemorySource`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor, keyed by its name, replacing any previous one of that name.
    pub fn insert(&mut self, descriptor: PartDescriptor) {
        self.descriptors.insert(descriptor.name.clone(), descriptor);
    }
}

impl FromIterator<PartDescriptor> for MemorySource {
    fn from_iter<I: IntoIterator<Item = PartDescriptor>>(iter: I) -> Self {
        let mut source = Self::new();
        for descriptor in iter {
            source.insert(descriptor);
        }
        source
    }
}

impl PartSource for MemorySource {
    fn descriptor(&self, key: &str) -> Result<Option<PartDescriptor>, SourceError> {
        Ok(self.descriptors.get(key).cloned())
    }

    fn keys(&self) -> Vec<ArcStr> {
        self.descriptors.keys().cloned().collect()
    }
}
