// src/core/counts.rs
//! Count tables shared by the frequency models.

use crate::core::context::Context;
use crate::core::types::CellId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Occurrence counts keyed by `K`.
///
/// A key that was never incremented reads as zero; reads never insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize + Eq + Hash",
    deserialize = "K: Deserialize<'de> + Eq + Hash"
))]
pub struct CountTable<K> {
    counts: HashMap<K, u64>,
}

impl<K: Eq + Hash> Default for CountTable<K> {
    fn default() -> Self {
        Self { counts: HashMap::new() }
    }
}

impl<K: Eq + Hash> CountTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: K) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys with a non-zero count.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(k, &v)| (k, v))
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

/// Observed successors of each context.
///
/// Successor sets are ordered, so candidate enumeration (and with it
/// tie-breaking) is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Adjacency {
    next: HashMap<Context, BTreeSet<CellId>>,
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, context: Context, successor: CellId) {
        self.next.entry(context).or_default().insert(successor);
    }

    /// Successors of `context`; empty for an unseen context.
    pub fn successors(&self, context: &Context) -> impl Iterator<Item = &CellId> {
        self.next.get(context).into_iter().flatten()
    }

    pub fn degree(&self, context: &Context) -> usize {
        self.next.get(context).map_or(0, BTreeSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }

    pub fn clear(&mut self) {
        self.next.clear();
    }
}

/// Cell with the highest count, ties going to the smallest cell.
pub fn most_frequent<I>(counts: I) -> Option<CellId>
where
    I: IntoIterator<Item = (CellId, u64)>,
{
    counts
        .into_iter()
        .max_by(|(cell_a, count_a), (cell_b, count_b)| {
            count_a.cmp(count_b).then_with(|| cell_b.cmp(cell_a))
        })
        .map(|(cell, _)| cell)
}
