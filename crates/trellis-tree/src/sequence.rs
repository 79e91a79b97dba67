//! Ordered child index.
//!
//! A container keeps its children's ids in a [`Sequence`]. The ids are the
//! stable iterators: inserting or removing other entries never invalidates
//! them, and positional lookup goes through the index.

use std::cmp::Ordering;

/// An ordered list of stable keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence<K> {
    order: Vec<K>,
}

impl<K> Default for Sequence<K> {
    fn default() -> Self {
        Self { order: Vec::new() }
    }
}

impl<K> FromIterator<K> for Sequence<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            order: iter.into_iter().collect(),
        }
    }
}

impl<K: Copy + PartialEq> Sequence<K> {
    /// Create an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The key at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<K> {
        self.order.get(index).copied()
    }

    /// The position of `key`.
    #[must_use]
    pub fn position(&self, key: K) -> Option<usize> {
        self.order.iter().position(|k| *k == key)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.order.contains(&key)
    }

    /// First key.
    #[must_use]
    pub fn first(&self) -> Option<K> {
        self.order.first().copied()
    }

    /// Last key.
    #[must_use]
    pub fn last(&self) -> Option<K> {
        self.order.last().copied()
    }

    /// Insert `key` before the entry at `position`; `None` or an
    /// out-of-range position appends. Returns the final index.
    pub fn insert(&mut self, key: K, position: Option<usize>) -> usize {
        match position {
            Some(index) if index < self.order.len() => {
                self.order.insert(index, key);
                index
            }
            _ => {
                self.order.push(key);
                self.order.len() - 1
            }
        }
    }

    /// Insert `key` after every entry that does not compare greater than it.
    ///
    /// The sequence must already be sorted by `compare`. Equal keys keep
    /// their insertion order. Returns the final index.
    pub fn insert_sorted_by<F>(&mut self, key: K, mut compare: F) -> usize
    where
        F: FnMut(&K, &K) -> Ordering,
    {
        let index = self
            .order
            .partition_point(|probe| compare(probe, &key) != Ordering::Greater);
        self.order.insert(index, key);
        index
    }

    /// Remove `key`, returning its former index.
    pub fn remove(&mut self, key: K) -> Option<usize> {
        let index = self.position(key)?;
        let _ = self.order.remove(index);
        Some(index)
    }

    /// Move `key` so that it ends up at `position` (clamped to the end).
    /// Returns `false` if the key is absent.
    pub fn move_to(&mut self, key: K, position: Option<usize>) -> bool {
        if self.remove(key).is_none() {
            return false;
        }
        let _ = self.insert(key, position);
        true
    }

    /// Stable sort by `compare`.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&K, &K) -> Ordering,
    {
        self.order.sort_by(|a, b| compare(a, b));
    }

    /// The entry after `key`.
    #[must_use]
    pub fn next(&self, key: K) -> Option<K> {
        self.position(key).and_then(|index| self.get(index + 1))
    }

    /// The entry before `key`.
    #[must_use]
    pub fn prev(&self, key: K) -> Option<K> {
        self.position(key)
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| self.get(index))
    }

    /// Iterate in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = K> + '_ {
        self.order.iter().copied()
    }

    /// The keys as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[K] {
        &self.order
    }
}
