use core::iter::FusedIterator;
use core::ops::Range;

use crate::math::{Axis, Cube, GridAab, GridCoordinate};

/// Iterator produced by [`GridAab::interior_iter()`].
///
/// Yields cubes in X-major, Z-minor order.
#[derive(Clone, Debug)]
pub struct GridIter {
    x_range: Range<GridCoordinate>,
    y_range: Range<GridCoordinate>,
    z_range: Range<GridCoordinate>,
    /// Next cube to produce; when `next.x` reaches the end of `x_range`, iteration is done.
    next: Cube,
}

impl GridIter {
    #[inline]
    pub(in crate::math) fn new(bounds: GridAab) -> Self {
        let lower = Cube::from(bounds.lower_bounds());
        Self {
            x_range: bounds.axis_range(Axis::X),
            y_range: bounds.axis_range(Axis::Y),
            z_range: bounds.axis_range(Axis::Z),
            next: if bounds.is_empty() {
                // Start out already exhausted.
                Cube::new(bounds.upper_bounds().x, lower.y, lower.z)
            } else {
                lower
            },
        }
    }

    fn remaining(&self) -> usize {
        let Ok(planes) = usize::try_from(self.x_range.end - self.next.x - 1) else {
            return 0;
        };
        let rows = planes * self.y_range.len()
            + usize::try_from(self.y_range.end - self.next.y - 1).unwrap_or(0);
        rows * self.z_range.len() + usize::try_from(self.z_range.end - self.next.z).unwrap_or(0)
    }
}

impl Iterator for GridIter {
    type Item = Cube;

    #[inline]
    fn next(&mut self) -> Option<Cube> {
        if self.next.x >= self.x_range.end {
            return None;
        }
        let result = self.next;

        self.next.z += 1;
        if self.next.z >= self.z_range.end {
            self.next.z = self.z_range.start;
            self.next.y += 1;
            if self.next.y >= self.y_range.end {
                self.next.y = self.y_range.start;
                self.next.x += 1;
            }
        }

        Some(result)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for GridIter {}
impl FusedIterator for GridIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn zero_items() {
        for size in [[0, 0, 0], [0, 1, 1], [1, 0, 1], [1, 1, 0]] {
            let b = GridAab::from_lower_size([3, 4, 5], size);
            assert_eq!(b.interior_iter().collect::<Vec<_>>(), vec![], "{b:?}");
            assert_eq!(b.interior_iter().len(), 0);
        }
    }

    #[test]
    fn size_hint_is_exact_throughout() {
        let b = GridAab::from_lower_size([-2, 0, 7], [3, 4, 5]);
        let mut iter = b.interior_iter();
        for remaining in (1..=60).rev() {
            assert_eq!(iter.size_hint(), (remaining, Some(remaining)));
            assert!(iter.next().is_some());
        }
        assert_eq!(iter.size_hint(), (0, Some(0)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn produces_every_cube_once() {
        let b = GridAab::from_lower_size([0, 0, 0], [2, 3, 2]);
        let cubes: Vec<Cube> = b.interior_iter().collect();
        assert_eq!(cubes.len(), 12);
        let mut sorted = cubes.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, cubes);
        assert!(cubes.iter().all(|&c| b.contains_cube(c)));
    }
}
