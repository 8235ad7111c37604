//! Numeric types used for coordinates and related quantities.

use euclid::{Point3D, Size3D, Vector3D};

use crate::math::Cube;

/// Coordinates that are locked to the cube grid.
pub type GridCoordinate = i32;

/// Numeric type in a [`GridSize`].
pub type GridSizeCoord = u32;

/// Positions that are locked to the cube grid.
pub type GridPoint = Point3D<GridCoordinate, Cube>;

/// Vectors that are locked to the cube grid.
pub type GridVector = Vector3D<GridCoordinate, Cube>;

/// Sizes of grid-aligned objects.
pub type GridSize = Size3D<GridSizeCoord, Cube>;
