//! [`PartLibrary`], the memoizing factory of [`Part`]s.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use arcstr::ArcStr;
use hashbrown::HashMap;

use crate::descriptor::PartSource;
use crate::intersection::IntersectionCache;
use crate::math::DiscreteTransform;
use crate::matcher::MountMatcher;
use crate::part::{LoadError, MountKey, Part, PartKey};
use crate::util::{lock, read, write};

/// The smallest part which can close a given mount: it has exactly that one mount.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct TerminalAttachment {
    /// The terminal part.
    pub part: Arc<Part>,
    /// Its only mount.
    pub mount: MountKey,
    /// Places the terminal part, relative to the frame of the part being closed.
    pub transform: DiscreteTransform,
}

/// Loads [`Part`]s from a [`PartSource`] on first use and keeps them for its lifetime.
///
/// A part is built at most once. Concurrent first requests for the same part are
/// resolved by a double-checked lock, so losing the race is harmless. Parts which
/// fail to load are logged and remembered as absent; they never affect other parts.
///
/// The library also owns the caches which depend only on parts: the
/// [`MountMatcher`] and the [`IntersectionCache`].
pub struct PartLibrary {
    source: Box<dyn PartSource>,
    loaded: RwLock<Loaded>,
    /// Incremented whenever a part is added.
    generation: AtomicU64,
    matcher: MountMatcher,
    intersections: IntersectionCache,
    terminals: Mutex<HashMap<(PartKey, MountKey), Option<TerminalAttachment>>>,
}

#[derive(Default)]
struct Loaded {
    parts: BTreeMap<PartKey, Arc<Part>>,
    failed: BTreeSet<PartKey>,
    /// For each mount type, every (part, mount) having it.
    by_mount_type: BTreeMap<ArcStr, BTreeSet<(PartKey, MountKey)>>,
}

impl PartLibrary {
    /// Constructs a library which loads parts from `source`, with the default
    /// intersection cache capacity.
    pub fn new(source: impl PartSource + 'static) -> Self {
        Self::with_cache_capacity(source, IntersectionCache::DEFAULT_CAPACITY)
    }

    /// Constructs a library whose intersection cache holds about `capacity` entries.
    pub fn with_cache_capacity(source: impl PartSource + 'static, capacity: usize) -> Self {
        Self {
            source: Box::new(source),
            loaded: RwLock::new(Loaded::default()),
            generation: AtomicU64::new(0),
            matcher: MountMatcher::new(),
            intersections: IntersectionCache::new(capacity),
            terminals: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the part for `key`, building it from the source if it was not already.
    ///
    /// Returns [`None`] if the source has no such part or it fails to load; the
    /// failure is logged once and remembered.
    pub fn load(&self, key: &str) -> Option<Arc<Part>> {
        {
            let loaded = read(&self.loaded);
            if let Some(part) = loaded.parts.get(key) {
                return Some(part.clone());
            }
            if loaded.failed.contains(key) {
                return None;
            }
        }

        let loaded = &mut *write(&self.loaded);
        // Another thread may have loaded it while we waited for the lock.
        if let Some(part) = loaded.parts.get(key) {
            return Some(part.clone());
        }
        if loaded.failed.contains(key) {
            return None;
        }

        let key = ArcStr::from(key);
        match self.build(&key) {
            Ok(part) => {
                let part = Arc::new(part);
                for mount in part.mounts() {
                    loaded
                        .by_mount_type
                        .entry(mount.mount_type().clone())
                        .or_default()
                        .insert((key.clone(), mount.key().clone()));
                }
                loaded.parts.insert(key.clone(), part.clone());
                self.generation.fetch_add(1, Ordering::Release);
                // A new part may be a smaller terminal for anything.
                lock(&self.terminals).clear();
                log::debug!("loaded part {part:?}");
                Some(part)
            }
            Err(error) => {
                log::warn!("{}", crate::util::ErrorChain(&error));
                loaded.failed.insert(key);
                None
            }
        }
    }

    fn build(&self, key: &PartKey) -> Result<Part, LoadError> {
        let mut descriptor = self
            .source
            .descriptor(key)
            .map_err(|error| LoadError::Source {
                part: key.clone(),
                error,
            })?
            .ok_or_else(|| LoadError::NotFound(key.clone()))?;
        descriptor.name = key.clone();
        Part::from_descriptor(descriptor)
    }

    /// Loads every part the source offers. Returns the number now loaded.
    pub fn load_all(&self) -> usize {
        for key in self.source.keys() {
            self.load(&key);
        }
        read(&self.loaded).parts.len()
    }

    /// Returns the part for `key` if it has been loaded, without loading it.
    pub fn get(&self, key: &str) -> Option<Arc<Part>> {
        read(&self.loaded).parts.get(key).cloned()
    }

    /// Every loaded part, in key order.
    pub fn parts(&self) -> Vec<Arc<Part>> {
        read(&self.loaded).parts.values().cloned().collect()
    }

    /// Every loaded part having a mount of `mount_type`, with that mount's key, ordered
    /// by part key and then mount key.
    pub fn parts_with_mount_type(&self, mount_type: &str) -> Vec<(Arc<Part>, MountKey)> {
        let loaded = read(&self.loaded);
        let Some(entries) = loaded.by_mount_type.get(mount_type) else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|(part_key, mount_key)| {
                Some((loaded.parts.get(part_key)?.clone(), mount_key.clone()))
            })
            .collect()
    }

    /// Counts the parts that have been added. Changes whenever a new part is loaded.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The mount matcher, whose cache is shared by all users of this library.
    pub fn matcher(&self) -> &MountMatcher {
        &self.matcher
    }

    /// The intersection cache, shared by all users of this library.
    pub fn intersections(&self) -> &IntersectionCache {
        &self.intersections
    }

    /// Returns the smallest loaded part (by block count, then key) which has exactly
    /// one mount, compatible with `mount` of `part` and permitted by both adjacency
    /// rules, and the first transform that attaches it.
    ///
    /// The result is cached until another part is loaded.
    pub fn smallest_terminal_attachment(
        &self,
        part: &Part,
        mount: &MountKey,
    ) -> Option<TerminalAttachment> {
        let cache_key = (part.key().clone(), mount.clone());
        if let Some(cached) = lock(&self.terminals).get(&cache_key) {
            return cached.clone();
        }

        let generation = self.generation();
        let result = self.find_terminal(part, mount);
        if self.generation() == generation {
            lock(&self.terminals).insert(cache_key, result.clone());
        }
        result
    }

    fn find_terminal(&self, part: &Part, mount_key: &MountKey) -> Option<TerminalAttachment> {
        let mount = part.mount(mount_key)?;
        let mut best: Option<TerminalAttachment> = None;
        for (candidate, candidate_key) in self.parts_with_mount_type(mount.mount_type()) {
            if candidate.mount_count() != 1 || candidate.cube_size() != part.cube_size() {
                continue;
            }
            if best
                .as_ref()
                .is_some_and(|b| b.part.block_count() <= candidate.block_count())
            {
                continue;
            }
            let Some(candidate_mount) = candidate.mount(&candidate_key) else {
                continue;
            };
            let permitted = mount.adjacency().permits(
                part.key(),
                mount_key,
                candidate.key(),
                &candidate_key,
            ) && candidate_mount.adjacency().permits(
                candidate.key(),
                &candidate_key,
                part.key(),
                mount_key,
            );
            if !permitted {
                continue;
            }
            let transforms = self
                .matcher
                .match_transforms(part, mount, &candidate, candidate_mount);
            if let Some(&transform) = transforms.first() {
                best = Some(TerminalAttachment {
                    part: candidate,
                    mount: candidate_key,
                    transform,
                });
            }
        }
        best
    }
}

impl fmt::Debug for PartLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loaded = read(&self.loaded);
        f.debug_struct("PartLibrary")
            .field("source", &self.source)
            .field("loaded", &loaded.parts.len())
            .field("failed", &loaded.failed)
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}
