//! Series aggregation.
//!
//! Reductions over joined row sets:
//! - Grouping rows by series (leaf group) id
//! - Mid-series change detection
//! - Distinct-value counts
//! - Frequency ranking and maxima
//!
//! Columns are selected with key closures so every reduction is checked
//! against the row type at compile time. Nothing here rounds values.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use thiserror::Error;

/// Errors raised by reductions that need at least one row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("Empty input: {operation} needs at least one row")]
    EmptyInput { operation: &'static str },
}

/// Rows partitioned by a group key, in first-seen key order.
#[derive(Debug)]
pub struct SeriesGroups<'r, K, R> {
    keys: Vec<K>,
    rows: HashMap<K, Vec<&'r R>>,
}

impl<'r, K, R> SeriesGroups<'r, K, R>
where
    K: Eq + Hash + Clone,
{
    /// Number of distinct groups.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Rows of one group.
    pub fn get(&self, key: &K) -> Option<&[&'r R]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[&'r R])> {
        self.keys
            .iter()
            .map(move |k| (k, self.rows[k].as_slice()))
    }
}

/// Partition `rows` by `key`, preserving first-seen order of keys.
pub fn group_by<'r, R, K, F>(rows: &'r [R], key: F) -> SeriesGroups<'r, K, R>
where
    K: Eq + Hash + Clone,
    F: Fn(&R) -> K,
{
    let mut keys = Vec::new();
    let mut grouped: HashMap<K, Vec<&'r R>> = HashMap::new();

    for row in rows {
        let k = key(row);
        match grouped.get_mut(&k) {
            Some(bucket) => bucket.push(row),
            None => {
                keys.push(k.clone());
                grouped.insert(k, vec![row]);
            }
        }
    }

    SeriesGroups {
        keys,
        rows: grouped,
    }
}

/// Number of distinct `key` values across `rows`.
pub fn distinct_count<R, K, F>(rows: &[R], key: F) -> usize
where
    K: Eq + Hash,
    F: Fn(&R) -> K,
{
    rows.iter().map(key).collect::<HashSet<_>>().len()
}

/// Fraction of groups whose rows carry more than one distinct `value`.
///
/// Each group counts once regardless of its row count. Returns `None` when
/// `rows` is empty, since there are no groups to average over.
pub fn mid_series_change_rate<R, G, V, FG, FV>(rows: &[R], group: FG, value: FV) -> Option<f64>
where
    G: Eq + Hash + Clone,
    V: Eq + Hash,
    FG: Fn(&R) -> G,
    FV: Fn(&R) -> V,
{
    let groups = group_by(rows, group);
    if groups.is_empty() {
        return None;
    }

    let changed = groups
        .iter()
        .filter(|(_, members)| {
            members
                .iter()
                .map(|r| value(*r))
                .collect::<HashSet<_>>()
                .len()
                > 1
        })
        .count();

    Some(changed as f64 / groups.len() as f64)
}

/// Row counts per `key` value, in first-seen order.
pub fn frequencies<R, K, F>(rows: &[R], key: F) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    F: Fn(&R) -> K,
{
    group_by(rows, key)
        .iter()
        .map(|(k, members)| (k.clone(), members.len()))
        .collect()
}

/// The `key` value with the most rows.
///
/// Ties go to the value encountered first in `rows`.
pub fn most_frequent<R, K, F>(rows: &[R], key: F) -> Result<K, AggregateError>
where
    K: Eq + Hash + Clone,
    F: Fn(&R) -> K,
{
    let mut best: Option<(K, usize)> = None;
    for (k, count) in frequencies(rows, key) {
        let replace = best.as_ref().map_or(true, |(_, top)| count > *top);
        if replace {
            best = Some((k, count));
        }
    }

    best.map(|(k, _)| k).ok_or(AggregateError::EmptyInput {
        operation: "most_frequent",
    })
}

/// Maximum `key` value across `rows`.
pub fn latest<R, K, F>(rows: &[R], key: F) -> Result<K, AggregateError>
where
    K: Ord,
    F: Fn(&R) -> K,
{
    rows.iter()
        .map(key)
        .max()
        .ok_or(AggregateError::EmptyInput { operation: "latest" })
}
