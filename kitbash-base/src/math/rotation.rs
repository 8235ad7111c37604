//! Rotations which exchange axes (thus not leaving the integer grid).
//! This module is private but reexported by its parent.

use core::ops::Mul;

use crate::math::{Axis, DiscreteTransform, Face6, GridCoordinate, GridVector};

/// One of the 24 proper rotations of a cube: an exchange of axes, with sign changes,
/// that does not mirror.
///
/// A rotation is stored as its basis: the three faces which the positive X, Y, and Z
/// unit vectors are respectively rotated onto. It therefore acts as a bijection on the
/// six [`Face6`] values, and equality and hashing compare that bijection.
///
/// Reflections are not representable; [`GridRotation::from_basis()`] rejects them.
/// This is the rotation part of a [`DiscreteTransform`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "[Face6; 3]", into = "[Face6; 3]"))]
pub struct GridRotation {
    basis: [Face6; 3],
}

const fn r(x: Face6, y: Face6, z: Face6) -> GridRotation {
    GridRotation { basis: [x, y, z] }
}

impl GridRotation {
    /// All 24 rotations, in a stable order beginning with the identity.
    #[rustfmt::skip]
    pub const ALL: [Self; 24] = {
        use Face6::*;
        [
            r(PX, PY, PZ), r(PX, NY, NZ), r(NX, PY, NZ), r(NX, NY, PZ),
            r(PX, PZ, NY), r(PX, NZ, PY), r(NX, PZ, PY), r(NX, NZ, NY),
            r(PY, PX, NZ), r(PY, NX, PZ), r(NY, PX, PZ), r(NY, NX, NZ),
            r(PY, PZ, PX), r(PY, NZ, NX), r(NY, PZ, NX), r(NY, NZ, PX),
            r(PZ, PX, PY), r(PZ, NX, NY), r(NZ, PX, NY), r(NZ, NX, PY),
            r(PZ, PY, NX), r(PZ, NY, PX), r(NZ, PY, PX), r(NZ, NY, NX),
        ]
    };

    /// The identity rotation, which leaves every face unchanged.
    pub const IDENTITY: Self = r(Face6::PX, Face6::PY, Face6::PZ);

    /// The rotation that is clockwise, about the Y axis, in our Y-up right-handed
    /// coordinate system.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{Face6::*, GridRotation};
    ///
    /// assert_eq!(GridRotation::CLOCKWISE.transform(PX), PZ);
    /// assert_eq!(GridRotation::CLOCKWISE.transform(PZ), NX);
    /// assert_eq!(GridRotation::CLOCKWISE.transform(PY), PY);
    /// ```
    pub const CLOCKWISE: Self = r(Face6::PZ, Face6::PY, Face6::NX);

    /// The inverse of [`GridRotation::CLOCKWISE`].
    pub const COUNTERCLOCKWISE: Self = r(Face6::NZ, Face6::PY, Face6::PX);

    /// Constructs a rotation from a basis: that is, the returned rotation will
    /// rotate `PX` into `basis[0]`, `PY` into `basis[1]`, and `PZ` into `basis[2]`.
    ///
    /// Returns an error if the basis faces are not perpendicular, or if they describe
    /// a reflection.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{Face6::*, GridRotation};
    ///
    /// assert_eq!(GridRotation::from_basis([PZ, PY, NX]), Ok(GridRotation::CLOCKWISE));
    /// assert!(GridRotation::from_basis([NX, PY, PZ]).is_err()); // mirror
    /// assert!(GridRotation::from_basis([PX, PX, PZ]).is_err()); // degenerate
    /// ```
    #[inline]
    pub fn from_basis(basis: [Face6; 3]) -> Result<Self, RotationError> {
        let [x, y, z] = basis;
        match x.cross(y) {
            Some(c) if c == z => Ok(Self { basis }),
            Some(_) => Err(RotationError::Reflection(basis)),
            None => Err(RotationError::NotPerpendicular(basis)),
        }
    }

    /// Finds the rotation which takes the canonical orientation, facing [`Face6::NZ`]
    /// with [`Face6::PY`] upward, to one facing `forward` with `up` upward.
    ///
    /// Returns [`None`] if `forward` and `up` are parallel.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{Face6::*, GridRotation};
    ///
    /// assert_eq!(GridRotation::from_forward_up(NZ, PY), Some(GridRotation::IDENTITY));
    /// let r = GridRotation::from_forward_up(PX, PZ).unwrap();
    /// assert_eq!((r.transform(NZ), r.transform(PY)), (PX, PZ));
    /// ```
    #[inline]
    pub fn from_forward_up(forward: Face6, up: Face6) -> Option<Self> {
        let back = forward.opposite();
        let right = up.cross(back)?;
        Self::from_basis([right, up, back]).ok()
    }

    /// Returns the faces which `PX`, `PY`, and `PZ` are rotated onto.
    #[inline]
    pub const fn to_basis(self) -> [Face6; 3] {
        self.basis
    }

    /// Rotate the face by this rotation.
    #[inline]
    #[must_use]
    pub fn transform(self, face: Face6) -> Face6 {
        let image = self.basis[face.axis()];
        if face.is_negative() {
            image.opposite()
        } else {
            image
        }
    }

    /// Rotate the vector by this rotation.
    ///
    /// May panic or wrap if `vector` has any components equal to [`GridCoordinate::MIN`].
    #[inline]
    #[must_use]
    pub fn transform_vector(self, vector: GridVector) -> GridVector {
        let mut result = GridVector::zero();
        for axis in Axis::ALL {
            let image = self.basis[axis];
            result[image.axis()] = vector[axis] * image.signum();
        }
        result
    }

    /// Returns the inverse of this rotation; the one which undoes this.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::GridRotation;
    ///
    /// for rotation in GridRotation::ALL {
    ///     assert_eq!(rotation * rotation.inverse(), GridRotation::IDENTITY);
    /// }
    /// ```
    #[must_use]
    #[inline]
    pub fn inverse(self) -> Self {
        let mut basis = self.basis;
        for axis in Axis::ALL {
            let image = self.basis[axis];
            basis[image.axis()] = if image.is_positive() {
                axis.positive_face()
            } else {
                axis.negative_face()
            };
        }
        Self { basis }
    }

    /// Returns a transform which applies this rotation and then translates so that a
    /// box of `size` cubes in each axis, occupying the positive octant, still occupies
    /// the positive octant.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{Cube, GridRotation};
    ///
    /// let rotation = GridRotation::CLOCKWISE.to_positive_octant_transform(4);
    /// assert_eq!(rotation.transform_cube(Cube::new(0, 0, 0)), Cube::new(3, 0, 0));
    /// assert_eq!(rotation.transform_cube(Cube::new(3, 0, 0)), Cube::new(3, 0, 3));
    /// assert_eq!(rotation.transform_cube(Cube::new(3, 0, 3)), Cube::new(0, 0, 3));
    /// assert_eq!(rotation.transform_cube(Cube::new(0, 0, 3)), Cube::new(0, 0, 0));
    /// ```
    #[inline]
    pub fn to_positive_octant_transform(self, size: GridCoordinate) -> DiscreteTransform {
        let mut translation = GridVector::zero();
        for image in self.basis {
            if image.is_negative() {
                translation[image.axis()] += size;
            }
        }
        DiscreteTransform {
            rotation: self,
            translation,
        }
    }

    /// Generates the sequence of rotations that may be obtained by multiplying
    /// this rotation with itself repeatedly, starting with the identity and ending
    /// just before the identity would be produced again.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::GridRotation;
    ///
    /// assert_eq!(
    ///     GridRotation::CLOCKWISE.iterate().collect::<Vec<_>>(),
    ///     vec![
    ///         GridRotation::IDENTITY,
    ///         GridRotation::CLOCKWISE,
    ///         GridRotation::CLOCKWISE * GridRotation::CLOCKWISE,
    ///         GridRotation::COUNTERCLOCKWISE,
    ///    ],
    /// );
    /// ```
    #[allow(clippy::missing_inline_in_public_items)]
    pub fn iterate(self) -> impl Iterator<Item = Self> {
        let mut item = Self::IDENTITY;
        core::iter::once(Self::IDENTITY).chain(core::iter::from_fn(move || {
            item = item * self;
            (item != Self::IDENTITY).then_some(item)
        }))
    }
}

impl Default for GridRotation {
    /// Returns the identity (no rotation).
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl num_traits::One for GridRotation {
    /// Returns the identity (no rotation).
    #[inline]
    fn one() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Self> for GridRotation {
    type Output = Self;

    /// Multiplication is concatenation: `self * rhs` is equivalent to
    /// applying `rhs` and then applying `self`.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{Face6::*, GridRotation};
    ///
    /// let transform_1 = GridRotation::from_basis([NY, PX, PZ]).unwrap();
    /// let transform_2 = GridRotation::from_basis([PY, NZ, NX]).unwrap();
    ///
    /// // Demonstrate the directionality of concatenation.
    /// for face in [PX, PY, PZ] {
    ///     assert_eq!(
    ///         (transform_1 * transform_2).transform(face),
    ///         transform_1.transform(transform_2.transform(face)),
    ///     );
    /// }
    /// ```
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            basis: rhs.basis.map(|face| self.transform(face)),
        }
    }
}

impl TryFrom<[Face6; 3]> for GridRotation {
    type Error = RotationError;
    #[inline]
    fn try_from(basis: [Face6; 3]) -> Result<Self, Self::Error> {
        Self::from_basis(basis)
    }
}

impl From<GridRotation> for [Face6; 3] {
    #[inline]
    fn from(value: GridRotation) -> Self {
        value.basis
    }
}

/// Error from [`GridRotation::from_basis()`] when the basis is not a proper rotation.
#[derive(Clone, Copy, Debug, displaydoc::Display, Eq, PartialEq)]
#[non_exhaustive]
pub enum RotationError {
    /// basis {0:?} is not made of three perpendicular faces
    NotPerpendicular([Face6; 3]),
    /// basis {0:?} is a reflection, not a rotation
    Reflection([Face6; 3]),
}

impl core::error::Error for RotationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;
    use exhaust::Exhaust as _;
    use pretty_assertions::assert_eq;
    use Face6::*;

    #[test]
    fn all_are_distinct_proper_rotations() {
        let set: BTreeSet<GridRotation> = GridRotation::ALL.into_iter().collect();
        assert_eq!(set.len(), 24);
        assert_eq!(GridRotation::ALL[0], GridRotation::IDENTITY);
        for rotation in GridRotation::ALL {
            assert_eq!(GridRotation::from_basis(rotation.to_basis()), Ok(rotation));
        }
    }

    #[test]
    fn group_is_closed() {
        let set: BTreeSet<GridRotation> = GridRotation::ALL.into_iter().collect();
        for a in GridRotation::ALL {
            assert!(set.contains(&a.inverse()), "{a:?}");
            for b in GridRotation::ALL {
                assert!(set.contains(&(a * b)), "{a:?} * {b:?}");
            }
        }
    }

    #[test]
    fn inverse_axioms() {
        for rotation in GridRotation::ALL {
            assert_eq!(rotation.inverse().inverse(), rotation);
            assert_eq!(rotation * rotation.inverse(), GridRotation::IDENTITY);
            assert_eq!(rotation.inverse() * rotation, GridRotation::IDENTITY);
            for face in Face6::exhaust() {
                assert_eq!(rotation.inverse().transform(rotation.transform(face)), face);
            }
        }
    }

    #[test]
    fn is_bijection_on_faces() {
        for rotation in GridRotation::ALL {
            let images: BTreeSet<Face6> = Face6::exhaust().map(|f| rotation.transform(f)).collect();
            assert_eq!(images.len(), 6, "{rotation:?}");
            for face in Face6::exhaust() {
                assert_eq!(rotation.transform(-face), -rotation.transform(face));
            }
        }
    }

    #[test]
    fn transform_vector_agrees_with_transform() {
        for rotation in GridRotation::ALL {
            for face in Face6::exhaust() {
                assert_eq!(
                    rotation.transform_vector(face.normal_vector()),
                    rotation.transform(face).normal_vector(),
                    "{rotation:?} {face:?}"
                );
            }
        }
    }

    #[test]
    fn from_basis_errors() {
        assert_eq!(
            GridRotation::from_basis([PX, PY, NZ]),
            Err(RotationError::Reflection([PX, PY, NZ]))
        );
        assert_eq!(
            GridRotation::from_basis([PX, NX, PZ]),
            Err(RotationError::NotPerpendicular([PX, NX, PZ]))
        );
    }

    #[test]
    fn from_forward_up_covers_everything() {
        let mut found = BTreeSet::new();
        for forward in Face6::exhaust() {
            for up in Face6::exhaust() {
                if let Some(rotation) = GridRotation::from_forward_up(forward, up) {
                    assert_eq!(rotation.transform(NZ), forward);
                    assert_eq!(rotation.transform(PY), up);
                    found.insert(rotation);
                } else {
                    assert_eq!(forward.axis(), up.axis());
                }
            }
        }
        assert_eq!(found.len(), 24);
    }

    #[test]
    fn clockwise_inverse() {
        assert_eq!(GridRotation::CLOCKWISE.inverse(), GridRotation::COUNTERCLOCKWISE);
        assert_eq!(GridRotation::CLOCKWISE.iterate().count(), 4);
    }
}
