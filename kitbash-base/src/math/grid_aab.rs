//! Axis-aligned integer-coordinate box volumes ([`GridAab`]).

use core::fmt;
use core::ops::Range;

use crate::math::{
    Axis, Cube, DiscreteTransform, Face6, GridCoordinate, GridIter, GridPoint, GridSize,
    GridSizeCoord, GridVector, sort_two,
};

/// An axis-aligned box with integer coordinates, whose volume is no larger than [`usize::MAX`].
///
/// [`GridAab`]s are used to specify the bounding box of a part's blocks, the extent of
/// its reserved zones, and the lattice region that intersection tests iterate over.
///
/// A [`GridAab`] may have a zero-size range in any direction, thus making its total
/// volume zero. The different possibilities are not considered equal; thus, points,
/// lines, and planes may be represented, which may be useful for procedural-generation
/// purposes.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridAab {
    lower_bounds: GridPoint,
    /// Constructor checks ensure this is not smaller than `lower_bounds`.
    upper_bounds: GridPoint,
}

impl GridAab {
    /// Box containing the unit cube from `[0, 0, 0]` to `[1, 1, 1]`.
    pub const ORIGIN_CUBE: GridAab = GridAab {
        lower_bounds: GridPoint::new(0, 0, 0),
        upper_bounds: GridPoint::new(1, 1, 1),
    };

    /// Box of zero size at `[0, 0, 0]`.
    ///
    /// Use this box as the canonical placeholder “nothing” value when it is necessary to
    /// have *some* box.
    pub const ORIGIN_EMPTY: GridAab = GridAab {
        lower_bounds: GridPoint::new(0, 0, 0),
        upper_bounds: GridPoint::new(0, 0, 0),
    };

    /// Constructs a [`GridAab`] from inclusive lower bounds and exclusive upper bounds.
    ///
    /// Returns [`Err`] if any of the `upper_bounds` are less than the `lower_bounds`.
    #[allow(clippy::missing_inline_in_public_items, reason = "is generic already")]
    pub fn checked_from_lower_upper(
        lower_bounds: impl Into<GridPoint>,
        upper_bounds: impl Into<GridPoint>,
    ) -> Result<Self, GridOverflowError> {
        let lower_bounds = lower_bounds.into();
        let upper_bounds = upper_bounds.into();
        if upper_bounds.x < lower_bounds.x
            || upper_bounds.y < lower_bounds.y
            || upper_bounds.z < lower_bounds.z
        {
            return Err(GridOverflowError {
                lower_bounds,
                upper_bounds,
            });
        }
        Ok(GridAab {
            lower_bounds,
            upper_bounds,
        })
    }

    /// Constructs a [`GridAab`] from inclusive lower bounds and exclusive upper bounds.
    ///
    /// For example, if on one axis the lower bound is 5 and the upper bound is 10,
    /// then the positions where blocks can exist are numbered 5 through 9
    /// (inclusive) and the occupied volume (from a perspective of continuous
    /// rather than discrete coordinates) spans 5 to 10.
    ///
    /// Panics if any of the `upper_bounds` are less than the `lower_bounds`.
    #[track_caller]
    #[allow(clippy::missing_inline_in_public_items, reason = "is generic already")]
    pub fn from_lower_upper(
        lower_bounds: impl Into<GridPoint>,
        upper_bounds: impl Into<GridPoint>,
    ) -> GridAab {
        match Self::checked_from_lower_upper(lower_bounds, upper_bounds) {
            Ok(aab) => aab,
            Err(e) => panic!("GridAab::from_lower_upper: {e}"),
        }
    }

    /// Constructs a [`GridAab`] from coordinate lower bounds and sizes.
    ///
    /// Panics if the resulting range would cause numeric overflow.
    #[track_caller]
    #[allow(clippy::missing_inline_in_public_items, reason = "is generic already")]
    pub fn from_lower_size(lower_bounds: impl Into<GridPoint>, sizes: impl Into<GridSize>) -> Self {
        let lower_bounds = lower_bounds.into();
        let sizes = sizes.into();
        let upper = |lower: GridCoordinate, size: u32| -> GridCoordinate {
            GridCoordinate::try_from(size)
                .ok()
                .and_then(|size| lower.checked_add(size))
                .unwrap_or_else(|| panic!("GridAab::from_lower_size: size {size} overflows"))
        };
        Self::from_lower_upper(
            lower_bounds,
            GridPoint::new(
                upper(lower_bounds.x, sizes.width),
                upper(lower_bounds.y, sizes.height),
                upper(lower_bounds.z, sizes.depth),
            ),
        )
    }

    /// Constructs a [`GridAab`] with a volume of 1, containing the specified cube.
    ///
    /// Panics if `cube` has any coordinates equal to [`GridCoordinate::MAX`]
    /// since that is not valid, as per [`GridAab::from_lower_size()`].
    #[inline]
    #[track_caller]
    pub fn single_cube(cube: Cube) -> GridAab {
        GridAab {
            lower_bounds: cube.lower_bounds(),
            upper_bounds: cube.upper_bounds(),
        }
    }

    /// Computes the volume of this box in cubes, i.e. the product of all sizes.
    ///
    /// Returns [`None`] if the volume does not fit in a `usize`.
    #[inline]
    pub fn volume(&self) -> Option<usize> {
        let size = self.size();
        usize::try_from(size.width)
            .ok()?
            .checked_mul(usize::try_from(size.height).ok()?)?
            .checked_mul(usize::try_from(size.depth).ok()?)
    }

    /// Returns whether the box contains no cubes (its volume is zero).
    #[inline]
    pub fn is_empty(&self) -> bool {
        Axis::ALL
            .into_iter()
            .any(|axis| self.upper_bounds[axis] == self.lower_bounds[axis])
    }

    /// Inclusive lower bounds on cube coordinates, or the most negative corner of the
    /// box.
    #[inline]
    pub fn lower_bounds(&self) -> GridPoint {
        self.lower_bounds
    }

    /// Exclusive upper bounds on cube coordinates, or the most positive corner of the
    /// box.
    #[inline]
    pub fn upper_bounds(&self) -> GridPoint {
        self.upper_bounds
    }

    /// Size of the box in each axis; equivalent to
    /// `self.upper_bounds() - self.lower_bounds()`, except that the result is
    /// unsigned (which is necessary so that it cannot overflow).
    #[inline]
    pub fn size(&self) -> GridSize {
        GridSize::new(
            self.upper_bounds.x.abs_diff(self.lower_bounds.x),
            self.upper_bounds.y.abs_diff(self.lower_bounds.y),
            self.upper_bounds.z.abs_diff(self.lower_bounds.z),
        )
    }

    /// The range of coordinates for cubes within this box along the given axis.
    #[inline]
    pub fn axis_range(&self, axis: Axis) -> Range<GridCoordinate> {
        self.lower_bounds()[axis]..self.upper_bounds()[axis]
    }

    /// Iterate over all cubes that this contains.
    ///
    /// The order of iteration is deterministic: X is the outermost loop and Z the innermost.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{GridAab, Cube};
    ///
    /// let b = GridAab::from_lower_size([10, 20, 30], [1, 2, 2]);
    /// assert_eq!(
    ///     b.interior_iter().collect::<Vec<Cube>>(),
    ///     &[
    ///         Cube::new(10, 20, 30),
    ///         Cube::new(10, 20, 31),
    ///         Cube::new(10, 21, 30),
    ///         Cube::new(10, 21, 31),
    ///     ])
    /// ```
    #[inline]
    pub fn interior_iter(self) -> GridIter {
        GridIter::new(self)
    }

    /// Returns whether the box includes the given cube position in its volume.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{GridAab, Cube};
    ///
    /// let b = GridAab::from_lower_size([4, 4, 4], [6, 6, 6]);
    /// assert!(!b.contains_cube(Cube::new(3, 5, 5)));
    /// assert!(b.contains_cube(Cube::new(4, 5, 5)));
    /// assert!(b.contains_cube(Cube::new(9, 5, 5)));
    /// assert!(!b.contains_cube(Cube::new(10, 5, 5)));
    /// ```
    #[inline]
    pub fn contains_cube(&self, cube: Cube) -> bool {
        Axis::ALL.into_iter().all(|axis| {
            cube[axis] >= self.lower_bounds[axis] && cube[axis] < self.upper_bounds[axis]
        })
    }

    /// Returns the intersection of `self` and `other`, defined as the box which contains
    /// every cube that both `self` and `other` do, and no others.
    ///
    /// Returns [`None`] if there are no such cubes.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::GridAab;
    ///
    /// assert_eq!(
    ///     GridAab::from_lower_size([0, 0, 0], [2, 2, 2])
    ///         .intersection_cubes(GridAab::from_lower_size([1, 0, 0], [2, 1, 2])),
    ///     Some(GridAab::from_lower_size([1, 0, 0], [1, 1, 2])),
    /// );
    ///
    /// // Boxes which only touch on their faces are not considered to intersect.
    /// assert_eq!(
    ///     GridAab::from_lower_size([0, 0, 0], [2, 2, 2])
    ///         .intersection_cubes(GridAab::from_lower_size([2, 0, 0], [2, 1, 2])),
    ///     None,
    /// );
    /// ```
    #[inline]
    #[must_use]
    pub fn intersection_cubes(self, other: GridAab) -> Option<GridAab> {
        let lower = self.lower_bounds().max(other.lower_bounds());
        let upper = self.upper_bounds().min(other.upper_bounds());
        for axis in Axis::ALL {
            if upper[axis] <= lower[axis] {
                return None;
            }
        }
        Some(GridAab {
            lower_bounds: lower,
            upper_bounds: upper,
        })
    }

    /// Returns whether `self` and `other` have at least one cube in common.
    #[inline]
    pub fn intersects(self, other: GridAab) -> bool {
        self.intersection_cubes(other).is_some()
    }

    /// Returns the smallest [`GridAab`] which fully encloses the two inputs' cubes.
    ///
    /// The boundaries of empty boxes are ignored.
    /// If both inputs are empty, then `self` is returned.
    #[inline]
    #[must_use]
    pub fn union_cubes(self, other: Self) -> Self {
        if other.is_empty() {
            self
        } else if self.is_empty() {
            other
        } else {
            GridAab {
                lower_bounds: self.lower_bounds.min(other.lower_bounds),
                upper_bounds: self.upper_bounds.max(other.upper_bounds),
            }
        }
    }

    /// Extend the bounds of `self` as needed to enclose `other`.
    #[inline]
    #[must_use]
    pub fn union_cube(self, other: Cube) -> Self {
        self.union_cubes(other.grid_aab())
    }

    /// Displaces the box by the given `offset`, leaving its size unchanged.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{GridAab, GridVector};
    ///
    /// assert_eq!(
    ///     GridAab::from_lower_size([0, 0, 0], [10, 20, 30]).translate(GridVector::new(-10, 0, 0)),
    ///     GridAab::from_lower_size([-10, 0, 0], [10, 20, 30]),
    /// );
    /// ```
    #[must_use]
    #[inline]
    pub fn translate(&self, offset: GridVector) -> Self {
        GridAab {
            lower_bounds: self.lower_bounds + offset,
            upper_bounds: self.upper_bounds + offset,
        }
    }

    /// Moves the `face` side of the box outward by `distance`, leaving the other five
    /// sides in place.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{Face6, GridAab};
    ///
    /// assert_eq!(
    ///     GridAab::ORIGIN_CUBE.expand_toward(Face6::NY, 2),
    ///     GridAab::from_lower_upper([0, -2, 0], [1, 1, 1]),
    /// );
    /// ```
    #[must_use]
    #[inline]
    pub fn expand_toward(self, face: Face6, distance: GridSizeCoord) -> Self {
        let distance = GridCoordinate::try_from(distance).unwrap_or(GridCoordinate::MAX);
        let mut result = self;
        let axis = face.axis();
        if face.is_positive() {
            result.upper_bounds[axis] = result.upper_bounds[axis].saturating_add(distance);
        } else {
            result.lower_bounds[axis] = result.lower_bounds[axis].saturating_sub(distance);
        }
        result
    }

    /// Translate and rotate the box according to the given transform.
    ///
    /// Every cube inside `self` transformed by [`DiscreteTransform::transform_cube()`]
    /// is inside the result.
    #[must_use]
    #[inline]
    pub fn transform(self, transform: DiscreteTransform) -> Self {
        let mut p1 = transform.transform_point(self.lower_bounds());
        let mut p2 = transform.transform_point(self.upper_bounds());

        // Swap coordinates in case of rotation.
        for axis in Axis::ALL {
            sort_two(&mut p1[axis], &mut p2[axis]);
        }
        GridAab {
            lower_bounds: p1,
            upper_bounds: p2,
        }
    }
}

impl fmt::Debug for GridAab {
    #[allow(clippy::missing_inline_in_public_items)]
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_tuple("GridAab")
            .field(&self.axis_range(Axis::X))
            .field(&self.axis_range(Axis::Y))
            .field(&self.axis_range(Axis::Z))
            .finish()
    }
}

/// Error when a [`GridAab`] cannot be constructed from the given input.
#[derive(Clone, Copy, Debug, displaydoc::Display, Eq, PartialEq)]
#[displaydoc("upper bounds {upper_bounds:?} are less than lower bounds {lower_bounds:?}")]
pub struct GridOverflowError {
    lower_bounds: GridPoint,
    upper_bounds: GridPoint,
}

impl core::error::Error for GridOverflowError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::GridRotation;
    use pretty_assertions::assert_eq;

    #[test]
    fn debug() {
        assert_eq!(
            format!("{:?}", GridAab::from_lower_size([1, 2, 3], [1, 1, 2])),
            "GridAab(1..2, 2..3, 3..5)"
        );
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert!(GridAab::checked_from_lower_upper([0, 0, 0], [1, -1, 1]).is_err());
        assert!(GridAab::checked_from_lower_upper([0, 0, 0], [0, 0, 0]).is_ok());
    }

    #[test]
    fn volume_and_emptiness() {
        let b = GridAab::from_lower_size([-1, -1, -1], [2, 3, 4]);
        assert_eq!(b.volume(), Some(24));
        assert!(!b.is_empty());
        assert_eq!(GridAab::ORIGIN_EMPTY.volume(), Some(0));
        assert!(GridAab::ORIGIN_EMPTY.is_empty());
        assert_eq!(b.interior_iter().count(), 24);
    }

    #[test]
    fn union_ignores_empty() {
        let b = GridAab::from_lower_size([5, 5, 5], [1, 1, 1]);
        assert_eq!(b.union_cubes(GridAab::ORIGIN_EMPTY), b);
        assert_eq!(GridAab::ORIGIN_EMPTY.union_cubes(b), b);
        assert_eq!(
            b.union_cube(Cube::new(0, 0, 0)),
            GridAab::from_lower_upper([0, 0, 0], [6, 6, 6])
        );
    }

    /// Transforming a box must agree with transforming each of its cubes.
    #[test]
    fn transform_agrees_with_transform_cube() {
        let b = GridAab::from_lower_size([1, 2, 3], [2, 3, 4]);
        for rotation in GridRotation::ALL {
            let t = DiscreteTransform {
                rotation,
                translation: GridVector::new(7, -3, 100),
            };
            let transformed = b.transform(t);
            assert_eq!(transformed.volume(), b.volume(), "{t:?}");
            for cube in b.interior_iter() {
                assert!(
                    transformed.contains_cube(t.transform_cube(cube)),
                    "{t:?} {cube:?}"
                );
            }
        }
    }

    #[test]
    fn translate_by_face() {
        let b = GridAab::ORIGIN_CUBE;
        assert_eq!(
            b.translate(Face6::PX.normal_vector()),
            Cube::new(1, 0, 0).grid_aab()
        );
    }
}
