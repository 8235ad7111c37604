//! Axis-aligned unit vectors: the [`Face6`] type.
//! This module is private but reexported by its parent.

use core::fmt;
use core::ops;
use core::str::FromStr;

use crate::math::{Axis, GridCoordinate, GridVector};

/// Identifies a face of a cube or an orthogonal unit vector.
///
/// In part templates, this is how the outward-facing direction of a mount anchor block
/// is expressed, and a [`GridRotation`](crate::math::GridRotation) is a bijection on
/// these six values.
#[expect(clippy::exhaustive_enums)]
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd, exhaust::Exhaust)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Face6 {
    /// Negative X; the face whose normal vector is `(-1, 0, 0)`.
    NX = 1,
    /// Negative Y; the face whose normal vector is `(0, -1, 0)`; downward.
    NY = 2,
    /// Negative Z; the face whose normal vector is `(0, 0, -1)`.
    NZ = 3,
    /// Positive X; the face whose normal vector is `(1, 0, 0)`.
    PX = 4,
    /// Positive Y; the face whose normal vector is `(0, 1, 0)`; upward.
    PY = 5,
    /// Positive Z; the face whose normal vector is `(0, 0, 1)`.
    PZ = 6,
}

impl Face6 {
    /// All the values of [`Face6`].
    pub const ALL: [Face6; 6] = [
        Face6::NX,
        Face6::NY,
        Face6::NZ,
        Face6::PX,
        Face6::PY,
        Face6::PZ,
    ];

    /// Returns which axis this face's normal vector is parallel to.
    #[inline]
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::NX | Self::PX => Axis::X,
            Self::NY | Self::PY => Axis::Y,
            Self::NZ | Self::PZ => Axis::Z,
        }
    }

    /// Returns whether this face is a “positive” face: one whose unit vector's nonzero
    /// coordinate is positive.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::Face6;
    ///
    /// assert_eq!(Face6::PX.is_positive(), true);
    /// assert_eq!(Face6::NX.is_positive(), false);
    /// ```
    #[inline]
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::PX | Self::PY | Self::PZ)
    }

    /// Returns whether this face is a negative face: one whose unit vector's nonzero
    /// coordinate is negative.
    #[inline]
    pub const fn is_negative(self) -> bool {
        matches!(self, Self::NX | Self::NY | Self::NZ)
    }

    /// Returns the sign of the nonzero coordinate of this face's unit vector.
    #[inline]
    pub const fn signum(self) -> GridCoordinate {
        match self {
            Self::NX | Self::NY | Self::NZ => -1,
            Self::PX | Self::PY | Self::PZ => 1,
        }
    }

    /// Returns the opposite face (maps [`PX`](Self::PX) to [`NX`](Self::NX) and so on).
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Face6 {
        match self {
            Face6::NX => Face6::PX,
            Face6::NY => Face6::PY,
            Face6::NZ => Face6::PZ,
            Face6::PX => Face6::NX,
            Face6::PY => Face6::NY,
            Face6::PZ => Face6::NZ,
        }
    }

    /// Returns the face whose normal is the cross product of these faces' normals,
    /// or [`None`] if they are parallel (the cross product is zero).
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::Face6::*;
    ///
    /// assert_eq!(PX.cross(PY), Some(PZ));
    /// assert_eq!(PY.cross(PX), Some(NZ));
    /// assert_eq!(PX.cross(NX), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn cross(self, other: Self) -> Option<Face6> {
        Face6::try_from(self.normal_vector().cross(other.normal_vector())).ok()
    }

    /// Returns the axis-aligned unit vector normal to this face.
    #[inline]
    #[must_use]
    pub const fn normal_vector(self) -> GridVector {
        match self {
            Face6::NX => GridVector::new(-1, 0, 0),
            Face6::NY => GridVector::new(0, -1, 0),
            Face6::NZ => GridVector::new(0, 0, -1),
            Face6::PX => GridVector::new(1, 0, 0),
            Face6::PY => GridVector::new(0, 1, 0),
            Face6::PZ => GridVector::new(0, 0, 1),
        }
    }
}

impl ops::Neg for Face6 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self::Output {
        self.opposite()
    }
}

impl TryFrom<GridVector> for Face6 {
    /// Returns the original vector on failure.
    /// (An error message would probably be too lacking context to be helpful.)
    type Error = GridVector;

    /// Recovers a `Face6` from its corresponding unit normal vector. All other vectors
    /// are rejected.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{Face6, GridVector};
    ///
    /// for face in Face6::ALL {
    ///     assert_eq!(Face6::try_from(face.normal_vector()), Ok(face));
    /// }
    ///
    /// let v = GridVector::new(1, 2, 3);
    /// assert_eq!(Face6::try_from(v), Err(v));
    /// ```
    #[rustfmt::skip]
    #[allow(clippy::missing_inline_in_public_items)]
    fn try_from(value: GridVector) -> Result<Self, Self::Error> {
        use Face6::*;
        match value {
            GridVector { _unit: _, x: 1, y: 0, z: 0 } => Ok(PX),
            GridVector { _unit: _, x: 0, y: 1, z: 0 } => Ok(PY),
            GridVector { _unit: _, x: 0, y: 0, z: 1 } => Ok(PZ),
            GridVector { _unit: _, x: -1, y: 0, z: 0 } => Ok(NX),
            GridVector { _unit: _, x: 0, y: -1, z: 0 } => Ok(NY),
            GridVector { _unit: _, x: 0, y: 0, z: -1 } => Ok(NZ),
            not_unit_vector => Err(not_unit_vector),
        }
    }
}

/// Formats as the variant name, e.g. `PX`. This is the same syntax [`FromStr`] accepts.
impl fmt::Display for Face6 {
    #[allow(clippy::missing_inline_in_public_items)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Parses `PX`, `NY`, etc., ignoring ASCII case, as well as the signed-axis spellings
/// `+x`, `-y`, etc.
impl FromStr for Face6 {
    type Err = ParseFaceError;

    #[allow(clippy::missing_inline_in_public_items)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Face6::*;
        let face = if s.eq_ignore_ascii_case("px") || s.eq_ignore_ascii_case("+x") {
            PX
        } else if s.eq_ignore_ascii_case("py") || s.eq_ignore_ascii_case("+y") {
            PY
        } else if s.eq_ignore_ascii_case("pz") || s.eq_ignore_ascii_case("+z") {
            PZ
        } else if s.eq_ignore_ascii_case("nx") || s.eq_ignore_ascii_case("-x") {
            NX
        } else if s.eq_ignore_ascii_case("ny") || s.eq_ignore_ascii_case("-y") {
            NY
        } else if s.eq_ignore_ascii_case("nz") || s.eq_ignore_ascii_case("-z") {
            NZ
        } else {
            return Err(ParseFaceError);
        };
        Ok(face)
    }
}

/// Error from parsing a [`Face6`] from a string which does not name a face.
#[derive(Copy, Clone, Debug, Eq, PartialEq, displaydoc::Display)]
#[displaydoc("not a face name; expected one of PX, PY, PZ, NX, NY, NZ")]
#[expect(clippy::exhaustive_structs)]
pub struct ParseFaceError;

impl core::error::Error for ParseFaceError {}

#[cfg(test)]
mod tests {
    use super::*;
    use exhaust::Exhaust as _;
    use pretty_assertions::assert_eq;

    #[test]
    fn all_is_exhaustive() {
        assert_eq!(Face6::exhaust().collect::<std::vec::Vec<_>>(), Face6::ALL.to_vec());
    }

    #[test]
    fn opposite_and_neg() {
        for face in Face6::ALL {
            assert_eq!(face.opposite().opposite(), face);
            assert_eq!(-face, face.opposite());
            assert_eq!(face.opposite().normal_vector(), -face.normal_vector());
            assert_eq!(face.is_positive(), !face.is_negative());
        }
    }

    #[test]
    fn cross_is_right_handed() {
        use Face6::*;
        assert_eq!(PY.cross(PZ), Some(PX));
        assert_eq!(PZ.cross(PX), Some(PY));
        for a in Face6::ALL {
            for b in Face6::ALL {
                let expected = a.normal_vector().cross(b.normal_vector());
                match a.cross(b) {
                    Some(c) => assert_eq!(c.normal_vector(), expected, "{a:?} × {b:?}"),
                    None => assert_eq!(a.axis(), b.axis(), "{a:?} × {b:?}"),
                }
            }
        }
    }

    #[test]
    fn parse_round_trip_of_display() {
        for face in Face6::ALL {
            assert_eq!(format!("{face}").parse::<Face6>(), Ok(face));
        }
        assert_eq!("-y".parse::<Face6>(), Ok(Face6::NY));
        assert_eq!("pz".parse::<Face6>(), Ok(Face6::PZ));
        assert_eq!("up".parse::<Face6>(), Err(ParseFaceError));
    }
}
