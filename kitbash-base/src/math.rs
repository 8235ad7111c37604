//! Integer grid math: cubes, boxes, axis-aligned directions, and the rigid
//! transformations which map the grid onto itself.

mod axis;
pub use axis::*;
mod coord;
pub use coord::*;
mod cube;
pub use cube::Cube;
mod face;
pub use face::*;
mod grid_aab;
pub use grid_aab::*;
mod grid_iter;
pub use grid_iter::*;
mod rigid;
pub use rigid::*;
mod rotation;
pub use rotation::*;

// We make an assumption in several places that `usize` is at least 32 bits.
#[cfg(target_pointer_width = "16")]
compile_error!("kitbash does not support platforms with less than 32-bit `usize`");

/// Sort exactly two items; swap them if `a > b`.
#[inline]
#[doc(hidden)]
pub fn sort_two<T: PartialOrd>(a: &mut T, b: &mut T) {
    if *a > *b {
        core::mem::swap(a, b);
    }
}
