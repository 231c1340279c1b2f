//! Fast hash map and hash set type aliases.
//!
//! Grouping in the planner and the master deduplicator is keyed by short
//! strings, which is where the Fx hash from `rustc-hash` pays off. Hash maps
//! are only used for lookup and grouping; every output list is sorted before
//! it leaves a planning call, so iteration order never reaches a report.
//!
//! # Examples
//!
//! ```
//! use mg_core::{FxHashMap, fx_hash_map};
//!
//! let mut groups: FxHashMap<&str, Vec<&str>> = fx_hash_map();
//! groups.entry("App").or_default().push("src/App.js");
//! assert_eq!(groups["App"].len(), 1);
//! ```

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// Creates a new empty [`FxHashMap`].
#[inline]
#[must_use]
pub fn fx_hash_map<K, V>() -> FxHashMap<K, V> {
    FxHashMap::default()
}

/// Creates a new empty [`FxHashSet`].
#[inline]
#[must_use]
pub fn fx_hash_set<V>() -> FxHashSet<V> {
    FxHashSet::default()
}
