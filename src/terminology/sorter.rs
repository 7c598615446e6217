//! Deterministic linearization of a concept hierarchy.
//!
//! Kahn's algorithm with an ordered ready set: among the nodes whose
//! ancestors are all placed, the one with the smallest tie-break key goes
//! next. The same node set, edge map and key function always produce the same
//! sequence.
use std::collections::{BTreeMap, BTreeSet};

/// Nodes that could not be placed because they sit on, or below, a cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleError<N> {
    pub unresolved: Vec<N>,
}

pub struct HierarchySorter;

impl HierarchySorter {
    /// Orders `nodes` so that every node follows all of its ancestors that
    /// are also in `nodes`. Ancestors outside the set still constrain the
    /// order of the nodes below them.
    pub fn sort<N, K, F>(
        nodes: impl IntoIterator<Item = N>,
        parents: &BTreeMap<N, BTreeSet<N>>,
        tie_break: F,
    ) -> Result<Vec<N>, CycleError<N>>
    where
        N: Ord + Clone,
        K: Ord,
        F: Fn(&N) -> K,
    {
        let nodes: BTreeSet<N> = nodes.into_iter().collect();
        let (ordered, unresolved) = linearize(&nodes, parents, &tie_break);
        if unresolved.is_empty() {
            Ok(ordered)
        } else {
            Err(CycleError { unresolved })
        }
    }
}

/// Kahn's algorithm. Returns the placed prefix and, ordered by key, the nodes
/// that could not be placed.
pub(crate) fn linearize<N, K, F>(
    nodes: &BTreeSet<N>,
    parents: &BTreeMap<N, BTreeSet<N>>,
    tie_break: &F,
) -> (Vec<N>, Vec<N>)
where
    N: Ord + Clone,
    K: Ord,
    F: Fn(&N) -> K,
{
    let mut pending: BTreeMap<N, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<N, BTreeSet<N>> = BTreeMap::new();
    for node in nodes {
        let constraints = nearest_members(node, nodes, parents);
        pending.insert(node.clone(), constraints.len());
        for ancestor in constraints {
            dependents.entry(ancestor).or_default().insert(node.clone());
        }
    }

    let mut ready: BTreeSet<(K, N)> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| (tie_break(node), node.clone()))
        .collect();

    let mut ordered = Vec::with_capacity(nodes.len());
    while let Some((_, node)) = ready.pop_first() {
        pending.remove(&node);
        if let Some(children) = dependents.get(&node) {
            for child in children {
                let Some(count) = pending.get_mut(child) else {
                    continue;
                };
                *count = count.saturating_sub(1);
                if *count == 0 {
                    ready.insert((tie_break(child), child.clone()));
                }
            }
        }
        ordered.push(node);
    }

    let mut unresolved: Vec<(K, N)> = pending
        .into_keys()
        .map(|node| (tie_break(&node), node))
        .collect();
    unresolved.sort();
    (ordered, unresolved.into_iter().map(|(_, node)| node).collect())
}

/// Closest ancestors of `node` that belong to `members`, looking through
/// ancestors that do not.
fn nearest_members<N: Ord + Clone>(
    node: &N,
    members: &BTreeSet<N>,
    parents: &BTreeMap<N, BTreeSet<N>>,
) -> BTreeSet<N> {
    let mut found = BTreeSet::new();
    let mut visited = BTreeSet::from([node.clone()]);
    let mut stack: Vec<N> = parents.get(node).into_iter().flatten().cloned().collect();
    while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        if members.contains(&current) {
            found.insert(current);
        } else if let Some(next) = parents.get(&current) {
            stack.extend(next.iter().cloned());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use rstest::rstest;

    use super::{CycleError, HierarchySorter};

    fn edges(pairs: &[(&'static str, &'static str)]) -> BTreeMap<&'static str, BTreeSet<&'static str>> {
        let mut map: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (child, parent) in pairs {
            map.entry(*child).or_default().insert(*parent);
        }
        map
    }

    fn position(order: &[&str], node: &str) -> usize {
        order.iter().position(|n| *n == node).expect("node placed")
    }

    #[test]
    fn ancestors_precede_descendants() {
        let parents = edges(&[("b", "a"), ("c", "a"), ("d", "b"), ("d", "c"), ("e", "d")]);
        let order = HierarchySorter::sort(["e", "d", "c", "b", "a"], &parents, |n| *n)
            .expect("acyclic");
        assert_eq!(order, vec!["a", "b", "c", "d", "e"]);
        for (child, ancestors) in &parents {
            for ancestor in ancestors {
                assert!(position(&order, ancestor) < position(&order, child));
            }
        }
    }

    #[rstest]
    #[case(&["zeta", "alpha", "mid"], &["alpha", "mid", "zeta"])]
    #[case(&["mid", "zeta", "alpha"], &["alpha", "mid", "zeta"])]
    fn unconstrained_nodes_follow_tie_break(#[case] input: &[&'static str], #[case] expected: &[&'static str]) {
        let order = HierarchySorter::sort(input.iter().copied(), &BTreeMap::new(), |n| *n)
            .expect("acyclic");
        assert_eq!(order, expected);
    }

    #[test]
    fn tie_break_key_overrides_node_order() {
        let tags = BTreeMap::from([("x", "3"), ("y", "1"), ("z", "2")]);
        let order = HierarchySorter::sort(["x", "y", "z"], &BTreeMap::new(), |n| tags[n])
            .expect("acyclic");
        assert_eq!(order, vec!["y", "z", "x"]);
    }

    #[test]
    fn ancestors_outside_the_set_still_constrain() {
        // c -> b -> a, with b left out of the input set
        let parents = edges(&[("c", "b"), ("b", "a")]);
        let order = HierarchySorter::sort(["c", "a"], &parents, |n| match *n {
            "c" => 0,
            _ => 1,
        })
        .expect("acyclic");
        assert_eq!(order, vec!["a", "c"]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let parents = edges(&[("b", "a"), ("c", "a"), ("d", "c"), ("f", "e")]);
        let first = HierarchySorter::sort(["f", "e", "d", "c", "b", "a"], &parents, |n| *n);
        let second = HierarchySorter::sort(["a", "b", "c", "d", "e", "f"], &parents, |n| *n);
        assert_eq!(first, second);
    }

    #[test]
    fn cycles_fail_fast_with_the_unplaced_nodes() {
        let parents = edges(&[("a", "b"), ("b", "a"), ("c", "b"), ("d", "x")]);
        let err = HierarchySorter::sort(["a", "b", "c", "d", "x"], &parents, |n| *n)
            .expect_err("cycle");
        assert_eq!(
            err,
            CycleError {
                unresolved: vec!["a", "b", "c"]
            }
        );
    }
}
