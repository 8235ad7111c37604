//! Kitbash procedurally assembles large structures out of a library of pre-authored
//! voxel “parts”, by repeatedly choosing a compatible part and attaching it to an open
//! mount point until a set of target quotas is approximately met and the mount points
//! are closed.
//!
//! ## Overview
//!
//! * A [`Part`] is an immutable template: which cubes its blocks occupy, which
//!   reserved zones must stay clear around it, and which named mount points it offers.
//!   Parts are built from [`PartDescriptor`]s pulled from a [`PartSource`] and are
//!   memoized by a [`PartLibrary`].
//! * A [`DiscreteTransform`] (one of the 24 rotations of a cube plus an integer
//!   translation) places a part in the world. [`MountMatcher`] finds every transform
//!   that lines up one mount point with another.
//! * The [`intersection`] engine decides whether two placed parts collide.
//! * A [`Construction`] is the structure being grown: its rooms, their aggregate
//!   statistics, and which mount points are attached to which.
//! * [`RequirementSeed`] holds the quotas, and scores a construction against them.
//! * The [`generator`] grows a construction step by step, then closes its open mounts.
//!
//! ## Crate features
//!
//! This crate, `kitbash`, defines the following feature flags:
//!
//! * `serde`:
//!   Enable [`serde`] serialization of configuration types and blueprints.
//! * `auto-threads`:
//!   Enable use of threads for [`generator::generate_batch()`], via
//!   [`rayon`]’s global thread pool.
//!   This feature does not affect the public API, only performance and dependencies.
//!
//! ## Dependencies and global state
//!
//! `kitbash` has no global state. All randomness is derived from the seed carried by the
//! [`RequirementSeed`], so that the same inputs always produce the same construction.
//! It does write log messages using the [`log`] crate and is therefore subject to that
//! global configuration; see [`util::standard_filter()`].
//!
//! [`Construction`]: crate::construction::Construction
//! [`DiscreteTransform`]: crate::math::DiscreteTransform
//! [`MountMatcher`]: crate::matcher::MountMatcher
//! [`Part`]: crate::part::Part
//! [`PartDescriptor`]: crate::descriptor::PartDescriptor
//! [`PartLibrary`]: crate::library::PartLibrary
//! [`PartSource`]: crate::descriptor::PartSource
//! [`RequirementSeed`]: crate::requirement::RequirementSeed
#![cfg_attr(not(feature = "serde"), doc = "[`serde`]: https://docs.rs/serde/")]
#![cfg_attr(not(feature = "auto-threads"), doc = "[`rayon`]: https://docs.rs/rayon/")]
#![no_std]
// Crate-specific lint settings. (General settings can be found in the workspace manifest.)
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    warn(clippy::std_instead_of_core, clippy::std_instead_of_alloc)
)]
// Lenience for tests.
#![cfg_attr(test,
    allow(clippy::float_cmp), // deterministic tests
    allow(clippy::redundant_clone), // prefer regularity over efficiency
)]

#[allow(unused_imports)] // false positive unused macro_use
#[macro_use]
extern crate alloc;
#[cfg_attr(test, macro_use)]
extern crate std;

/// Integer grid math: cubes, boxes, directions, and rigid transforms.
pub mod math {
    pub use kitbash_base::math::*;
}

pub mod construction;
pub mod descriptor;
pub mod generator;
pub mod intersection;
pub mod library;
pub mod matcher;
pub mod noise;
pub mod part;
pub mod requirement;
pub mod stats;
mod tag;
pub mod util;
pub mod weighted;

/// Re-export the version of the `euclid` vector math library we're using.
pub use kitbash_base::euclid;

/// Re-export the string type used for part keys, mount names, and resource ids.
pub use arcstr::ArcStr;
