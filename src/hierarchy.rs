//! Parent-chain resolution shared by self-referential entities
//!
//! Scenarios, templates, and template types all form trees via a nullable
//! `parent_id`, and all resolve inherited state the same way: a key bound on
//! the child shadows the same key on any ancestor, and the nearest ancestor
//! wins among the rest. Rather than duplicating that walk per entity, callers
//! load the relevant rows into a [`ParentChain`] arena and ask for the
//! ancestor chain or a merged key/value view.

use std::collections::HashMap;
use std::collections::HashSet;
use std::hash::Hash;

/// Arena of tree nodes keyed by id with parent pointers.
#[derive(Debug, Default)]
pub struct ParentChain {
    parents: HashMap<i32, Option<i32>>,
}

impl ParentChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node and its parent pointer.
    pub fn insert(&mut self, id: i32, parent_id: Option<i32>) {
        self.parents.insert(id, parent_id);
    }

    pub fn contains(&self, id: i32) -> bool {
        self.parents.contains_key(&id)
    }

    /// Ancestors of `id` from nearest to farthest, excluding `id` itself.
    ///
    /// Stops at a root, at a parent id missing from the arena, or on a cycle.
    pub fn ancestors(&self, id: i32) -> Vec<i32> {
        let mut seen = HashSet::new();
        seen.insert(id);
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(Some(parent)) = self.parents.get(&current) {
            if !seen.insert(*parent) {
                // Cycle in parent pointers; treat the last unique node as root.
                break;
            }
            chain.push(*parent);
            current = *parent;
        }
        chain
    }

    /// Chain of `id` followed by its ancestors, nearest first.
    pub fn lineage(&self, id: i32) -> Vec<i32> {
        let mut chain = vec![id];
        chain.extend(self.ancestors(id));
        chain
    }
}

/// Merge per-node keyed values over a lineage, override by presence.
///
/// `lineage` is ordered nearest first, as returned by [`ParentChain::lineage`].
/// The first node in the lineage that binds a key supplies its value; farther
/// ancestors never overwrite it.
pub fn resolve_inherited<K, V, F>(lineage: &[i32], mut bindings_of: F) -> HashMap<K, V>
where
    K: Eq + Hash,
    F: FnMut(i32) -> Vec<(K, V)>,
{
    let mut resolved: HashMap<K, V> = HashMap::new();
    for node_id in lineage {
        for (key, value) in bindings_of(*node_id) {
            resolved.entry(key).or_insert(value);
        }
    }
    resolved
}
