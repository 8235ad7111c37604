use core::ops;

use crate::math::Face6;

/// One of the three axes of the grid.
///
/// Indexes 3-element arrays, vectors, points, and [`Cube`](crate::math::Cube)s, so that
/// per-axis code can be written once and looped over [`Axis::ALL`].
#[expect(clippy::exhaustive_enums)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, exhaust::Exhaust)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    /// [X, Y, Z].
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// The face pointing toward +∞ on this axis.
    #[inline]
    pub const fn positive_face(self) -> Face6 {
        self.faces()[1]
    }

    /// The face pointing toward −∞ on this axis.
    #[inline]
    pub const fn negative_face(self) -> Face6 {
        self.faces()[0]
    }

    /// The negative and positive faces of this axis, in that order.
    #[inline]
    pub const fn faces(self) -> [Face6; 2] {
        match self {
            Axis::X => [Face6::NX, Face6::PX],
            Axis::Y => [Face6::NY, Face6::PY],
            Axis::Z => [Face6::NZ, Face6::PZ],
        }
    }

    /// Position of this axis's component in `[x, y, z]`.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl<T> ops::Index<Axis> for [T; 3] {
    type Output = T;

    #[inline]
    fn index(&self, axis: Axis) -> &T {
        &self[axis.index()]
    }
}

impl<T> ops::IndexMut<Axis> for [T; 3] {
    #[inline]
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        &mut self[axis.index()]
    }
}

/// Implements indexing by [`Axis`] for a type with `x`, `y`, and `z` fields.
macro_rules! index_fields_by_axis {
    ($type:ty, $element:ty $(, $generic:ident)*) => {
        impl<$($generic),*> ops::Index<Axis> for $type {
            type Output = $element;

            #[inline]
            fn index(&self, axis: Axis) -> &$element {
                match axis {
                    Axis::X => &self.x,
                    Axis::Y => &self.y,
                    Axis::Z => &self.z,
                }
            }
        }

        impl<$($generic),*> ops::IndexMut<Axis> for $type {
            #[inline]
            fn index_mut(&mut self, axis: Axis) -> &mut $element {
                match axis {
                    Axis::X => &mut self.x,
                    Axis::Y => &mut self.y,
                    Axis::Z => &mut self.z,
                }
            }
        }
    };
}
pub(crate) use index_fields_by_axis;

index_fields_by_axis!(euclid::Vector3D<T, U>, T, T, U);
index_fields_by_axis!(euclid::Point3D<T, U>, T, T, U);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{GridPoint, GridVector};
    use exhaust::Exhaust as _;

    #[test]
    fn faces_lie_on_their_axis() {
        for axis in Axis::exhaust() {
            let [negative, positive] = axis.faces();
            assert_eq!(negative.axis(), axis);
            assert_eq!(positive.axis(), axis);
            assert_eq!(negative.opposite(), positive);
            assert_eq!(Axis::ALL[axis.index()], axis);
        }
    }

    #[test]
    fn indexing_agrees_across_types() {
        let mut array = [10, 20, 30];
        let vector = GridVector::new(10, 20, 30);
        let mut point = GridPoint::new(10, 20, 30);
        for axis in Axis::ALL {
            assert_eq!(array[axis], vector[axis]);
            assert_eq!(point[axis], vector[axis]);
        }
        array[Axis::Y] = 0;
        point[Axis::Z] += 1;
        assert_eq!(array, [10, 0, 30]);
        assert_eq!(point, GridPoint::new(10, 20, 31));
    }
}
