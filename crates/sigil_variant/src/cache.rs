//! Variant Caches
//!
//! Both caches are sorted vectors keyed by variant hash: `O(log n)` lookup and
//! insertion, and adding a hash that is already present is a no-op (the first
//! writer wins, later payloads are dropped).
//!
//! - [`RenderableCache`]: renderable hash -> snapshot of the renderable
//!   properties. Internally locked, shared by all requests.
//! - [`ShaderProgramCache`]: final hash -> compiled stage programs. Not locked
//!   itself; the variant manager keeps it behind the mutex that serializes
//!   compilation.

use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

use sigil_core::{PropertyTable, ShaderStage};

use crate::compiler::ProgramHandle;

/// Sorted `hash -> value` map with first-writer-wins insertion.
#[derive(Debug, Clone)]
pub struct VariantCache<T> {
    entries: Vec<(u32, T)>,
}

impl<T> Default for VariantCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VariantCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts `value` under `hash` unless the hash is already cached.
    ///
    /// Returns `true` when the value was inserted.
    pub fn add(&mut self, hash: u32, value: T) -> bool {
        match self.entries.binary_search_by_key(&hash, |&(h, _)| h) {
            Ok(_) => false,
            Err(idx) => {
                self.entries.insert(idx, (hash, value));
                true
            }
        }
    }

    #[must_use]
    pub fn get(&self, hash: u32) -> Option<&T> {
        self.entries
            .binary_search_by_key(&hash, |&(h, _)| h)
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    #[must_use]
    pub fn contains(&self, hash: u32) -> bool {
        self.get(hash).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached hashes in ascending order.
    pub fn hashes(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|&(h, _)| h)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ============================================================================
// Renderable cache
// ============================================================================

/// Renderable hash -> property snapshot.
///
/// Snapshots are shared as `Arc`s so a request can read one after releasing
/// the lock.
#[derive(Debug, Default)]
pub struct RenderableCache {
    inner: RwLock<VariantCache<Arc<PropertyTable>>>,
}

impl RenderableCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caches a snapshot of `properties` unless `hash` is already known.
    pub fn add(&self, hash: u32, properties: &PropertyTable) -> bool {
        if self.inner.read().contains(hash) {
            return false;
        }
        self.inner.write().add(hash, Arc::new(properties.clone()))
    }

    #[must_use]
    pub fn get(&self, hash: u32) -> Option<Arc<PropertyTable>> {
        self.inner.read().get(hash).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }
}

// ============================================================================
// Shader program cache
// ============================================================================

/// The compiled programs of one shader variant, one slot per stage.
///
/// Stages without a main template stay `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPrograms {
    hash: u32,
    stages: [Option<ProgramHandle>; ShaderStage::COUNT],
}

impl ShaderPrograms {
    #[must_use]
    pub fn new(hash: u32, stages: [Option<ProgramHandle>; ShaderStage::COUNT]) -> Self {
        Self { hash, stages }
    }

    /// Final hash the programs were generated for.
    #[must_use]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    #[must_use]
    pub fn get(&self, stage: ShaderStage) -> Option<&ProgramHandle> {
        self.stages[stage.index()].as_ref()
    }

    /// Stages that produced a program, in pipeline order.
    #[must_use]
    pub fn stages(&self) -> SmallVec<[ShaderStage; ShaderStage::COUNT]> {
        ShaderStage::ALL
            .into_iter()
            .filter(|&stage| self.get(stage).is_some())
            .collect()
    }

    /// Whether both sets hold the very same program objects.
    #[must_use]
    pub fn same_programs(&self, other: &Self) -> bool {
        self.stages
            .iter()
            .zip(&other.stages)
            .all(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => a.ptr_eq(b),
                (None, None) => true,
                _ => false,
            })
    }
}

/// A cached variant plus, when collision checks are enabled, the properties it
/// was generated from.
#[derive(Debug, Clone)]
pub struct ProgramEntry {
    pub programs: Arc<ShaderPrograms>,
    pub properties: Option<PropertyTable>,
}

/// Final hash -> compiled programs.
#[derive(Debug, Default)]
pub struct ShaderProgramCache {
    entries: VariantCache<ProgramEntry>,
}

impl ShaderProgramCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caches `programs` under its own hash. No-op when the hash is cached.
    pub fn add(&mut self, programs: Arc<ShaderPrograms>, properties: Option<PropertyTable>) -> bool {
        let hash = programs.hash();
        self.entries.add(
            hash,
            ProgramEntry {
                programs,
                properties,
            },
        )
    }

    #[must_use]
    pub fn get(&self, hash: u32) -> Option<&ProgramEntry> {
        self.entries.get(hash)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_writer_wins() {
        let mut cache = VariantCache::new();
        assert!(cache.add(7, "first"));
        assert!(!cache.add(7, "second"));
        assert_eq!(cache.get(7), Some(&"first"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sorted_regardless_of_insertion_order() {
        let mut cache = VariantCache::new();
        for hash in [30, 10, 20, u32::MAX, 0] {
            cache.add(hash, ());
        }
        assert_eq!(cache.hashes().collect::<Vec<_>>(), vec![0, 10, 20, 30, u32::MAX]);
        assert!(cache.get(15).is_none());
    }

    #[test]
    fn test_renderable_cache_keeps_snapshot() {
        let cache = RenderableCache::new();
        let mut props = PropertyTable::from([("hlms_normal", 1)]);
        assert!(cache.add(1, &props));

        props.set("hlms_normal", 0);
        assert!(!cache.add(1, &props));
        assert_eq!(cache.get(1).map(|p| p.get("hlms_normal")), Some(1));
    }

    #[test]
    fn test_shader_programs_stages() {
        let vs = ProgramHandle::new(());
        let programs = ShaderPrograms::new(5, [Some(vs.clone()), None, None, None, None]);
        assert_eq!(programs.stages().as_slice(), &[ShaderStage::Vertex]);
        assert_eq!(programs.get(ShaderStage::Vertex), Some(&vs));
        assert!(programs.get(ShaderStage::Pixel).is_none());
        assert!(programs.same_programs(&programs.clone()));
    }
}
