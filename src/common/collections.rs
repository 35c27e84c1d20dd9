//! Collection aliases used across the crate.
//!
//! Keys are window ids and small strings, so the fast non-cryptographic
//! hasher is used everywhere a hash map is needed.

pub use std::collections::{BTreeMap, btree_map};

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;
