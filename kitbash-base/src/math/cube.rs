use core::fmt;
use core::ops;

use crate::math::{Axis, Face6, GridAab, GridCoordinate, GridPoint, GridVector};
use crate::math::axis::index_fields_by_axis;

/// A unit cube of the grid, identified by its most negative corner.
///
/// Every block of a part occupies one or more cubes, and every mount anchor is a cube.
/// Keeping cubes distinct from [`GridPoint`]s matters under rotation: a point maps to a
/// point, but a cube maps to the cube whose *opposite* corner is the rotated corner
/// (see [`DiscreteTransform::transform_cube()`](crate::math::DiscreteTransform::transform_cube)).
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs, clippy::exhaustive_structs)]
pub struct Cube {
    pub x: GridCoordinate,
    pub y: GridCoordinate,
    pub z: GridCoordinate,
}

impl Cube {
    /// The cube whose lower corner is the origin.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    #[allow(missing_docs)]
    #[inline]
    pub const fn new(x: GridCoordinate, y: GridCoordinate, z: GridCoordinate) -> Self {
        Self { x, y, z }
    }

    /// The corner with the most negative coordinates.
    #[inline]
    pub fn lower_bounds(self) -> GridPoint {
        GridPoint::new(self.x, self.y, self.z)
    }

    /// The corner with the most positive coordinates.
    ///
    /// Panics if a coordinate is [`GridCoordinate::MAX`].
    #[inline]
    #[track_caller]
    pub fn upper_bounds(self) -> GridPoint {
        self.lower_bounds() + GridVector::new(1, 1, 1)
    }

    /// This cube as a box of volume 1.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{Cube, GridAab};
    ///
    /// assert_eq!(
    ///     Cube::new(4, 0, -1).grid_aab(),
    ///     GridAab::from_lower_size([4, 0, -1], [1, 1, 1]),
    /// );
    /// ```
    #[inline]
    #[track_caller]
    pub fn grid_aab(self) -> GridAab {
        GridAab::single_cube(self)
    }

    /// The neighboring cube across `face`. This is where a mount anchor facing `face`
    /// expects its partner's anchor.
    #[inline]
    #[must_use]
    pub fn adjacent(self, face: Face6) -> Self {
        self + face.normal_vector()
    }
}

impl fmt::Debug for Cube {
    #[allow(clippy::missing_inline_in_public_items)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+}, {:+}, {:+})", self.x, self.y, self.z)
    }
}

impl ops::Add<GridVector> for Cube {
    type Output = Self;
    #[inline]
    fn add(self, offset: GridVector) -> Self {
        (self.lower_bounds() + offset).into()
    }
}

impl ops::Sub<GridVector> for Cube {
    type Output = Self;
    #[inline]
    fn sub(self, offset: GridVector) -> Self {
        (self.lower_bounds() - offset).into()
    }
}

/// The offset from `rhs` to `self`.
impl ops::Sub for Cube {
    type Output = GridVector;
    #[inline]
    fn sub(self, rhs: Self) -> GridVector {
        self.lower_bounds() - rhs.lower_bounds()
    }
}

index_fields_by_axis!(Cube, GridCoordinate);

impl From<[GridCoordinate; 3]> for Cube {
    #[inline]
    fn from([x, y, z]: [GridCoordinate; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<GridPoint> for Cube {
    #[inline]
    fn from(point: GridPoint) -> Self {
        Self::new(point.x, point.y, point.z)
    }
}

impl From<Cube> for [GridCoordinate; 3] {
    #[inline]
    fn from(cube: Cube) -> Self {
        [cube.x, cube.y, cube.z]
    }
}

impl From<Cube> for GridPoint {
    #[inline]
    fn from(cube: Cube) -> Self {
        cube.lower_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn adjacent_cubes_are_one_face_apart() {
        let cube = Cube::new(-3, 0, 7);
        for face in Face6::ALL {
            let neighbor = cube.adjacent(face);
            assert_eq!(neighbor - cube, face.normal_vector());
            assert_eq!(neighbor.adjacent(face.opposite()), cube);
            assert!(!neighbor.grid_aab().contains_cube(cube));
        }
    }

    #[test]
    fn axis_indexing() {
        let mut cube = Cube::new(1, 2, 3);
        cube[Axis::Z] = -3;
        assert_eq!([cube[Axis::X], cube[Axis::Y], cube[Axis::Z]], [1, 2, -3]);
        assert_eq!(<[GridCoordinate; 3]>::from(cube), [1, 2, -3]);
    }

    #[test]
    fn debug_shows_signs() {
        assert_eq!(format!("{:?}", Cube::new(1, -2, 0)), "(+1, -2, +0)");
    }
}
