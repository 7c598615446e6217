//! Transitive closure of a parent edge map.
//!
//! Every walk keeps a visited set, so cyclic input terminates and a node never
//! appears in its own closure.
use std::collections::{BTreeMap, BTreeSet};

use super::sorter::linearize;

pub struct TransitiveClosure;

impl TransitiveClosure {
    /// Ancestors of every key of `parents`, ordered ancestors first with ties
    /// broken by the node order.
    #[must_use]
    pub fn compute<N: Ord + Clone>(parents: &BTreeMap<N, BTreeSet<N>>) -> BTreeMap<N, Vec<N>> {
        Self::compute_with(parents, |node: &N| node.clone())
    }

    /// Same as [`TransitiveClosure::compute`] with an explicit tie-break key.
    ///
    /// Ancestors caught in a cycle cannot be linearized; they follow the
    /// ordered prefix in key order.
    #[must_use]
    pub fn compute_with<N, K, F>(parents: &BTreeMap<N, BTreeSet<N>>, tie_break: F) -> BTreeMap<N, Vec<N>>
    where
        N: Ord + Clone,
        K: Ord,
        F: Fn(&N) -> K,
    {
        parents
            .keys()
            .map(|node| {
                let ancestors = ancestors(parents, node);
                let (mut ordered, unresolved) = linearize(&ancestors, parents, &tie_break);
                ordered.extend(unresolved);
                (node.clone(), ordered)
            })
            .collect()
    }
}

/// Every node reachable from `node` through `parents`, excluding `node`.
#[must_use]
pub fn ancestors<N: Ord + Clone>(parents: &BTreeMap<N, BTreeSet<N>>, node: &N) -> BTreeSet<N> {
    let (mut reached, _) = reach(parents, node);
    reached.remove(node);
    reached
}

/// Nodes that reach themselves through `parents`.
#[must_use]
pub fn cyclic_nodes<N: Ord + Clone>(parents: &BTreeMap<N, BTreeSet<N>>) -> BTreeSet<N> {
    parents
        .keys()
        .filter(|node| reach(parents, node).1)
        .cloned()
        .collect()
}

/// Depth-first reachability; the flag reports whether the start was revisited.
fn reach<N: Ord + Clone>(parents: &BTreeMap<N, BTreeSet<N>>, start: &N) -> (BTreeSet<N>, bool) {
    let mut visited = BTreeSet::new();
    let mut revisited = false;
    let mut stack: Vec<&N> = parents.get(start).into_iter().flatten().collect();
    while let Some(current) = stack.pop() {
        if current == start {
            revisited = true;
        }
        if !visited.insert(current.clone()) {
            continue;
        }
        if let Some(next) = parents.get(current) {
            stack.extend(next.iter());
        }
    }
    (visited, revisited)
}
