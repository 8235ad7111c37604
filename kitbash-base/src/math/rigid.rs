use core::fmt;
use core::ops::Mul;

#[cfg(doc)]
use crate::math::GridAab;
use crate::math::{Cube, Face6, GridPoint, GridRotation, GridVector};

/// A [rigid transformation] that is composed of a [`GridRotation`] followed by an
/// integer-valued translation.
///
/// This is how parts are placed: every room in a construction is a part's local frame
/// pushed through one of these. The transforms form a group under [`Mul`]
/// (concatenation), with [`DiscreteTransform::IDENTITY`] as its identity and
/// [`DiscreteTransform::inverse()`] as inversion. Equality and hashing are structural,
/// so these may be used as map keys.
///
/// [rigid transformation]: https://en.wikipedia.org/wiki/Rigid_transformation
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscreteTransform {
    /// Rotation component. Applied before the translation.
    pub rotation: GridRotation,
    /// Translation component. Applied after the rotation.
    pub translation: GridVector,
}

impl DiscreteTransform {
    /// The identity transform, which leaves points unchanged.
    pub const IDENTITY: Self = Self {
        rotation: GridRotation::IDENTITY,
        translation: GridVector::new(0, 0, 0),
    };

    /// Constructs a [`DiscreteTransform`] that only performs rotation.
    ///
    /// Note that this is a rotation about the origin _point_ `[0, 0, 0]`, not the _cube_
    /// that is identified by that point (that is, not the center of [`GridAab::ORIGIN_CUBE`]).
    #[inline]
    pub const fn from_rotation_about_origin(rotation: GridRotation) -> Self {
        Self {
            rotation,
            translation: GridVector::new(0, 0, 0),
        }
    }

    /// Constructs a [`DiscreteTransform`] that only performs translation.
    #[inline]
    pub fn from_translation(translation: impl Into<GridVector>) -> Self {
        Self {
            rotation: GridRotation::IDENTITY,
            translation: translation.into(),
        }
    }

    /// Applies this transform to the given point: rotate, then translate.
    ///
    /// Note that a point is not a unit cube; if the point identifies a cube then use
    /// [`DiscreteTransform::transform_cube()`] instead.
    #[inline]
    #[must_use]
    pub fn transform_point(self, point: GridPoint) -> GridPoint {
        (self.rotation.transform_vector(point.to_vector()) + self.translation).to_point()
    }

    /// Applies only the rotation part of this transform to a vector (a direction or
    /// an offset), ignoring translation.
    #[inline]
    #[must_use]
    pub fn transform_vector(self, vector: GridVector) -> GridVector {
        self.rotation.transform_vector(vector)
    }

    /// Returns the direction which `face` points in after this transform.
    #[inline]
    #[must_use]
    pub fn transform_face(self, face: Face6) -> Face6 {
        self.rotation.transform(face)
    }

    /// Transforms `cube` considered as a solid unit cube, the same as a
    /// [`GridAab::single_cube`] containing that cube would be transformed.
    ///
    /// This differs from [`DiscreteTransform::transform_point()`] applied to the cube's
    /// lower corner whenever the rotation flips an axis, because the cube's coordinates
    /// name its most negative corner.
    ///
    /// ```
    /// # extern crate kitbash_base as kitbash;
    /// use kitbash::math::{Cube, DiscreteTransform, GridPoint, GridRotation, GridVector};
    ///
    /// // Translation without rotation has the usual definition.
    /// let t = DiscreteTransform::from_translation([10, 0, 0]);
    /// assert_eq!(t.transform_cube(Cube::new(1, 1, 1)), Cube::new(11, 1, 1));
    ///
    /// // A half turn about Y sends x to -x, so the cube at 1 ends up at -2.
    /// let turned = DiscreteTransform::from_rotation_about_origin(
    ///     GridRotation::CLOCKWISE * GridRotation::CLOCKWISE,
    /// );
    /// assert_eq!(turned.transform_point(GridPoint::new(1, 5, 5)), GridPoint::new(-1, 5, -5));
    /// assert_eq!(turned.transform_cube(Cube::new(1, 5, 5)), Cube::new(-2, 5, -6));
    /// ```
    #[inline]
    #[must_use]
    pub fn transform_cube(self, cube: Cube) -> Cube {
        Cube::from(
            self.transform_point(cube.lower_bounds())
                .min(self.transform_point(cube.upper_bounds())),
        )
    }

    /// Returns the transform which maps the outputs of this one to the inputs of this one.
    ///
    /// May panic or wrap (as per the Rust `overflow-checks` compilation option)
    /// if `self.translation` has any components equal to [`GridCoordinate::MIN`].
    ///
    /// [`GridCoordinate::MIN`]: crate::math::GridCoordinate
    #[must_use]
    #[inline]
    pub fn inverse(self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            rotation,
            translation: rotation.transform_vector(-self.translation),
        }
    }
}

impl Default for DiscreteTransform {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for DiscreteTransform {
    type Output = Self;

    /// Concatenation: `outer * inner` applies `inner` first, then `outer`.
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            rotation: self.rotation * rhs.rotation,
            translation: self.transform_point(rhs.translation.to_point()).to_vector(),
        }
    }
}

impl From<GridRotation> for DiscreteTransform {
    #[inline]
    fn from(value: GridRotation) -> Self {
        Self::from_rotation_about_origin(value)
    }
}

impl fmt::Debug for DiscreteTransform {
    #[inline(never)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::IDENTITY {
            return f.pad("DiscreteTransform::IDENTITY");
        }
        let &Self {
            rotation,
            translation,
        } = self;
        let mut ds = f.debug_struct("DiscreteTransform");
        if rotation != GridRotation::IDENTITY {
            ds.field("rotation", &rotation.to_basis());
        }
        if translation != GridVector::zero() {
            ds.field("translation", &[translation.x, translation.y, translation.z]);
        }
        ds.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::seq::IndexedRandom as _;
    use rand::{Rng, SeedableRng as _};
    use rand_xoshiro::Xoshiro256Plus;

    fn random_transform(rng: &mut impl Rng) -> DiscreteTransform {
        DiscreteTransform {
            rotation: *GridRotation::ALL.choose(rng).unwrap(),
            translation: GridVector::new(
                rng.random_range(-100..=100),
                rng.random_range(-100..=100),
                rng.random_range(-100..=100),
            ),
        }
    }

    #[test]
    fn inverse_axioms() {
        let mut rng = Xoshiro256Plus::seed_from_u64(2897358920346590823);
        for _ in 0..200 {
            let t = random_transform(&mut rng);
            assert_eq!(t * t.inverse(), DiscreteTransform::IDENTITY, "{t:?}");
            assert_eq!(t.inverse() * t, DiscreteTransform::IDENTITY, "{t:?}");
            assert_eq!(t.inverse().inverse(), t);
        }
    }

    #[test]
    fn identity_is_neutral() {
        let mut rng = Xoshiro256Plus::seed_from_u64(5933089223468901296);
        for _ in 0..100 {
            let t = random_transform(&mut rng);
            assert_eq!(t * DiscreteTransform::IDENTITY, t);
            assert_eq!(DiscreteTransform::IDENTITY * t, t);
        }
    }

    #[test]
    fn concatenation_is_application_order() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        for _ in 0..100 {
            let outer = random_transform(&mut rng);
            let inner = random_transform(&mut rng);
            let cube = Cube::new(
                rng.random_range(-50..50),
                rng.random_range(-50..50),
                rng.random_range(-50..50),
            );
            assert_eq!(
                (outer * inner).transform_cube(cube),
                outer.transform_cube(inner.transform_cube(cube))
            );
            let point = cube.lower_bounds();
            assert_eq!(
                (outer * inner).transform_point(point),
                outer.transform_point(inner.transform_point(point))
            );
        }
    }

    #[test]
    fn inverse_undoes_transform_cube() {
        let mut rng = Xoshiro256Plus::seed_from_u64(77);
        for _ in 0..100 {
            let t = random_transform(&mut rng);
            let cube = Cube::new(3, -4, 5);
            assert_eq!(t.inverse().transform_cube(t.transform_cube(cube)), cube);
        }
    }

    #[test]
    fn transform_face_matches_vector() {
        for rotation in GridRotation::ALL {
            let t = DiscreteTransform {
                rotation,
                translation: GridVector::new(9, 9, 9),
            };
            for face in Face6::ALL {
                assert_eq!(
                    t.transform_vector(face.normal_vector()),
                    t.transform_face(face).normal_vector()
                );
            }
        }
    }

    #[test]
    fn debug_is_concise() {
        assert_eq!(
            format!("{:?}", DiscreteTransform::IDENTITY),
            "DiscreteTransform::IDENTITY"
        );
        assert_eq!(
            format!("{:?}", DiscreteTransform::from_translation([1, 2, 3])),
            "DiscreteTransform { translation: [1, 2, 3] }"
        );
    }
}
