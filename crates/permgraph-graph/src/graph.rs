//! Dependency graph: the collaborator interface and its default in-memory implementation.

use crate::types::CyclePolicy;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Operations the permission engine needs from an inheritance graph.
///
/// Implementations own their cycle and self-loop policy; callers never
/// re-check it.
pub trait DependencyGraph<N> {
    /// Record that `inheritor` depends on `origin`.
    /// Returns false if the edge already existed or was refused.
    fn add_dependency(&mut self, inheritor: N, origin: N) -> bool;

    /// Drop the edge `inheritor -> origin`. Returns false if it was absent.
    fn remove_dependency(&mut self, inheritor: &N, origin: &N) -> bool;

    /// Nodes `node` depends on through a single edge. Empty for unknown nodes.
    fn direct_dependencies(&self, node: &N) -> &HashSet<N>;

    /// True iff a path of one or more edges leads from `inheritor` to `origin`.
    fn is_depends(&self, inheritor: &N, origin: &N) -> bool;

    /// Remove every edge.
    fn clear(&mut self);
}

/// Adjacency-set graph keyed by inheritor.
///
/// Nodes only exist while they have at least one outgoing edge, so an
/// inheritor whose last edge is removed leaves nothing behind.
#[derive(Debug, Clone)]
pub struct InheritanceGraph<N> {
    dependencies: HashMap<N, HashSet<N>>,
    /// Returned for unknown nodes so lookups never allocate.
    empty: HashSet<N>,
    policy: CyclePolicy,
}

impl<N> Default for InheritanceGraph<N> {
    fn default() -> Self {
        Self::with_policy(CyclePolicy::default())
    }
}

impl<N> InheritanceGraph<N> {
    /// Create an empty graph that rejects cycles.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CyclePolicy) -> Self {
        Self {
            dependencies: HashMap::new(),
            empty: HashSet::new(),
            policy,
        }
    }

    pub fn policy(&self) -> CyclePolicy {
        self.policy
    }

    /// Number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

impl<N: Eq + Hash + Clone> InheritanceGraph<N> {
    /// Iterate over every `(inheritor, origin)` edge in arbitrary order.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N)> + '_ {
        self.dependencies
            .iter()
            .flat_map(|(inheritor, origins)| origins.iter().map(move |origin| (inheritor, origin)))
    }
}

impl<N: Eq + Hash + Clone> DependencyGraph<N> for InheritanceGraph<N> {
    fn add_dependency(&mut self, inheritor: N, origin: N) -> bool {
        if inheritor == origin {
            tracing::debug!("Rejected self-referencing inheritance edge");
            return false;
        }

        if self.policy == CyclePolicy::Reject && self.is_depends(&origin, &inheritor) {
            tracing::debug!("Rejected inheritance edge that would close a cycle");
            return false;
        }

        self.dependencies
            .entry(inheritor)
            .or_default()
            .insert(origin)
    }

    fn remove_dependency(&mut self, inheritor: &N, origin: &N) -> bool {
        let Some(origins) = self.dependencies.get_mut(inheritor) else {
            return false;
        };

        let removed = origins.remove(origin);
        if origins.is_empty() {
            self.dependencies.remove(inheritor);
        }
        removed
    }

    fn direct_dependencies(&self, node: &N) -> &HashSet<N> {
        self.dependencies.get(node).unwrap_or(&self.empty)
    }

    fn is_depends(&self, inheritor: &N, origin: &N) -> bool {
        let mut visited: HashSet<&N> = HashSet::new();
        let mut stack: Vec<&N> = self.direct_dependencies(inheritor).iter().collect();

        while let Some(node) = stack.pop() {
            if node == origin {
                return true;
            }
            if visited.insert(node) {
                stack.extend(self.direct_dependencies(node).iter());
            }
        }

        false
    }

    fn clear(&mut self) {
        self.dependencies.clear();
    }
}
