//! Ordered, keyed in-memory collection owned by a single view.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Entity contract used by [`EntityCache`].
pub trait CachedEntity: Clone {
    type Key: Clone + Eq + Hash + Debug;
    type Patch;

    fn key(&self) -> &Self::Key;

    fn patch_key(patch: &Self::Patch) -> &Self::Key;

    /// Shallow merge of `patch` into `self`. Returns whether anything changed.
    fn merge(&mut self, patch: &Self::Patch) -> bool;
}

/// Result of a point merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    /// The patch matched the cached values already.
    Unchanged,
    /// No cached entity has the patch's key; nothing was inserted.
    UnknownKey,
}

/// Keyed set of entities that keeps server order.
#[derive(Debug, Clone)]
pub struct EntityCache<T: CachedEntity> {
    entries: Vec<T>,
    index: HashMap<T::Key, usize>,
}

impl<T: CachedEntity> Default for EntityCache<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: CachedEntity> EntityCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<T>) -> Self {
        let mut cache = Self::new();
        cache.replace(entries);
        cache
    }

    /// Replaces the contents wholesale.
    ///
    /// A key repeated in `entries` keeps its first position and its last value.
    pub fn replace(&mut self, entries: Vec<T>) {
        self.entries.clear();
        self.index.clear();
        for entity in entries {
            match self.index.get(entity.key()) {
                Some(&position) => self.entries[position] = entity,
                None => {
                    self.index.insert(entity.key().clone(), self.entries.len());
                    self.entries.push(entity);
                }
            }
        }
    }

    /// Point merge keyed by the patch's key. Unknown keys are ignored.
    pub fn merge(&mut self, patch: &T::Patch) -> MergeOutcome {
        let Some(&position) = self.index.get(T::patch_key(patch)) else {
            return MergeOutcome::UnknownKey;
        };
        if self.entries[position].merge(patch) {
            MergeOutcome::Applied
        } else {
            MergeOutcome::Unchanged
        }
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.index.get(key).map(|&position| &self.entries[position])
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.entries.clone()
    }
}

impl<'a, T: CachedEntity> IntoIterator for &'a EntityCache<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
