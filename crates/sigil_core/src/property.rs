//! Property Tables
//!
//! A [`PropertyTable`] is the shader-generation context: an ordered set of
//! `(key, i32)` pairs such as `hlms_uv_count = 2` or `hlms_skeleton = 1`.
//! Templates query it through `@property`, `@foreach`, `@counter` and the
//! arithmetic directives, and the variant hasher packs selected entries into
//! integer hashes.
//!
//! # Layout
//!
//! Entries are stored in a `Vec<(Symbol, i32)>` sorted by [`Symbol`], so
//! lookups and insertions are binary searches and two tables with the same
//! contents always compare and hash equal regardless of insertion order.
//!
//! ```rust,ignore
//! use sigil_core::PropertyTable;
//!
//! let mut props = PropertyTable::new();
//! props.set("hlms_uv_count", 2);
//! assert_eq!(props.get("hlms_uv_count"), 2);
//! assert!(!props.is_enabled("hlms_skeleton"));
//! ```

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::interner::{self, Symbol};

/// A single key/value entry of a [`PropertyTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Property {
    pub key: Symbol,
    pub value: i32,
}

/// Sorted collection of integer properties keyed by interned names.
///
/// # Performance
///
/// - Insertion/lookup: O(log n) binary search (insertion may shift the tail)
/// - Merge: O(m log n)
/// - Comparison and hashing: O(n) over the sorted entries
#[derive(Debug, Clone, Default)]
pub struct PropertyTable {
    entries: Vec<(Symbol, i32)>,
}

impl PropertyTable {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Sets `key` to `value`, overwriting an existing entry in place.
    pub fn set(&mut self, key: &str, value: i32) {
        self.set_symbol(interner::intern(key), value);
    }

    /// Sets a property by `Symbol` (avoids re-interning on hot paths).
    #[inline]
    pub fn set_symbol(&mut self, key: Symbol, value: i32) {
        match self.entries.binary_search_by_key(&key, |&(k, _)| k) {
            Ok(idx) => {
                self.entries[idx].1 = value;
            }
            Err(idx) => {
                self.entries.insert(idx, (key, value));
            }
        }
    }

    /// Returns the value of `key`, or `0` when absent.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> i32 {
        self.get_or(key, 0)
    }

    /// Returns the value of `key`, or `default` when absent.
    #[must_use]
    pub fn get_or(&self, key: &str, default: i32) -> i32 {
        // A name that was never interned cannot be in any table.
        interner::get(key).map_or(default, |sym| self.get_symbol_or(sym, default))
    }

    #[inline]
    #[must_use]
    pub fn get_symbol(&self, key: Symbol) -> i32 {
        self.get_symbol_or(key, 0)
    }

    #[inline]
    #[must_use]
    pub fn get_symbol_or(&self, key: Symbol, default: i32) -> i32 {
        self.entries
            .binary_search_by_key(&key, |&(k, _)| k)
            .map_or(default, |idx| self.entries[idx].1)
    }

    /// Boolean interpretation used by templates and hashing: `value != 0`.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key) != 0
    }

    #[inline]
    #[must_use]
    pub fn is_enabled_symbol(&self, key: Symbol) -> bool {
        self.get_symbol(key) != 0
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        interner::get(key).is_some_and(|sym| self.contains_symbol(sym))
    }

    #[inline]
    #[must_use]
    pub fn contains_symbol(&self, key: Symbol) -> bool {
        self.entries.binary_search_by_key(&key, |&(k, _)| k).is_ok()
    }

    pub fn remove(&mut self, key: &str) -> bool {
        interner::get(key).is_some_and(|sym| self.remove_symbol(sym))
    }

    pub fn remove_symbol(&mut self, key: Symbol) -> bool {
        if let Ok(idx) = self.entries.binary_search_by_key(&key, |&(k, _)| k) {
            self.entries.remove(idx);
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = Property> + '_ {
        self.entries
            .iter()
            .map(|&(key, value)| Property { key, value })
    }

    /// Iterates entries as `(name, value)` pairs.
    pub fn iter_named(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.entries
            .iter()
            .map(|&(k, v)| (interner::resolve(k), v))
    }

    /// Applies every entry of `other` on top of `self` (last writer wins).
    pub fn merge(&mut self, other: &PropertyTable) {
        self.entries.reserve(other.len());
        for &(key, value) in &other.entries {
            self.set_symbol(key, value);
        }
    }

    #[must_use]
    pub fn merged_with(&self, other: &PropertyTable) -> PropertyTable {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[(Symbol, i32)] {
        &self.entries
    }

    /// 64-bit hash of the contents, for quick inequality checks.
    #[must_use]
    pub fn compute_hash(&self) -> u64 {
        use std::hash::BuildHasher;
        rustc_hash::FxBuildHasher.hash_one(self)
    }
}

/// Serialized as a `name -> value` map ordered by name.
impl Serialize for PropertyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sorted: BTreeMap<&str, i32> = self.iter_named().collect();
        sorted.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, i32>::deserialize(deserializer)?;
        let mut table = Self::with_capacity(map.len());
        for (key, value) in &map {
            table.set(key, *value);
        }
        Ok(table)
    }
}

impl Hash for PropertyTable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.hash(state);
    }
}

impl PartialEq for PropertyTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for PropertyTable {}

impl From<&[(&str, i32)]> for PropertyTable {
    fn from(values: &[(&str, i32)]) -> Self {
        let mut table = Self::with_capacity(values.len());
        for &(k, v) in values {
            table.set(k, v);
        }
        table
    }
}

impl<const N: usize> From<[(&str, i32); N]> for PropertyTable {
    fn from(values: [(&str, i32); N]) -> Self {
        Self::from(&values[..])
    }
}

impl FromIterator<(Symbol, i32)> for PropertyTable {
    fn from_iter<I: IntoIterator<Item = (Symbol, i32)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (k, v) in iter {
            table.set_symbol(k, v);
        }
        table
    }
}
