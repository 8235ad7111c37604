//! This library is an internal component of [`kitbash`],
//! which defines the integer grid math that part placement is built on.
//! Do not depend on this library; use only [`kitbash`] instead.
//!
//! [`kitbash`]: https://crates.io/crates/kitbash/

#![no_std]
// Crate-specific lint settings. (General settings can be found in the workspace manifest.)
#![cfg_attr(
    not(test),
    warn(clippy::std_instead_of_core, clippy::std_instead_of_alloc)
)]
#![warn(clippy::missing_inline_in_public_items)]

#[cfg(any(feature = "std", test))]
#[cfg_attr(test, macro_use)]
extern crate std;
#[cfg_attr(test, macro_use)]
extern crate alloc;

/// Do not use this module directly; its contents are re-exported from `kitbash`.
pub mod math;

// reexport for convenience of our tests
#[doc(hidden)]
pub use euclid;
