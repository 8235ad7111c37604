//! Tools that we could imagine being in the Rust standard library, but aren't,
//! and the log filter recommended for programs embedding the engine.

use core::error::Error;
use core::fmt;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Provides the recommended log filter for programs which embed `kitbash`.
///
/// The guiding principle for this filtering is that at [`log::Level::Debug`] or lower
/// level, there should be no messages produced for every candidate placement unless
/// something is wrong. The matching and intersection modules log at
/// [`log::Level::Trace`] per candidate; those messages are excluded, while trace
/// messages from the rest of the crate (one or a few per generation step) are kept.
#[allow(clippy::missing_inline_in_public_items)]
pub fn standard_filter(metadata: &log::Metadata<'_>) -> bool {
    let target = metadata.target();
    let noisy =
        target.starts_with("kitbash::matcher") || target.starts_with("kitbash::intersection");
    !(noisy && metadata.level() >= log::Level::Trace)
}

/// Formatting wrapper which prints an [`Error`] followed by each of its `source()`s,
/// on one line, so that the whole chain fits in one log message.
#[derive(Clone, Copy, Debug)]
#[expect(clippy::exhaustive_structs)]
pub struct ErrorChain<'a>(pub &'a (dyn Error + 'a));

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut error = self.0;
        write!(f, "{error}")?;
        while let Some(source) = error.source() {
            error = source;
            write!(f, ": {error}")?;
        }
        Ok(())
    }
}

/// Locks a mutex, ignoring poisoning.
///
/// All of our mutex-protected state is caches whose every intermediate state is valid,
/// so a panic in another thread while holding the lock does not corrupt them.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Read-locks a [`RwLock`], ignoring poisoning, as per [`lock()`].
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write-locks a [`RwLock`], ignoring poisoning, as per [`lock()`].
pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::LoadError;
    use alloc::string::ToString as _;

    #[test]
    fn error_chain() {
        let error = LoadError::Source {
            part: "hull".into(),
            error: "no such file".into(),
        };
        assert_eq!(
            ErrorChain(&error).to_string(),
            "part \"hull\" could not be read: no such file"
        );
    }

    #[test]
    fn filter() {
        let meta = |target: &'static str, level| {
            log::Metadata::builder().target(target).level(level).build()
        };
        assert!(!standard_filter(&meta(
            "kitbash::matcher",
            log::Level::Trace
        )));
        assert!(!standard_filter(&meta(
            "kitbash::intersection::cache",
            log::Level::Trace
        )));
        assert!(standard_filter(&meta(
            "kitbash::intersection",
            log::Level::Debug
        )));
        assert!(standard_filter(&meta(
            "kitbash::generator",
            log::Level::Trace
        )));
        assert!(standard_filter(&meta(
            "some_random_crate",
            log::Level::Trace
        )));
    }
}
