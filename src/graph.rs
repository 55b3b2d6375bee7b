//! Dependency graph over resolved binding nodes.
//!
//! Nodes are (scope, key) pairs: the same key bound in two sibling private
//! scopes is two independent nodes. Edges are tagged eager or deferred;
//! cycle detection and topological ordering consider eager edges only,
//! since deferred (provider-wrapped) construction is lazily triggered and
//! may legally participate in a cycle.

use crate::model::BindingKey;
use crate::modules::scope::ScopeId;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

/// One resolved binding node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub scope: ScopeId,
    pub key: BindingKey,
}

impl NodeRef {
    pub fn new(scope: ScopeId, key: BindingKey) -> Self {
        Self { scope, key }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Whether an edge participates in eager construction ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Eager,
    Deferred,
}

/// Adjacency structure built incrementally during resolution.
#[derive(Debug, Default)]
pub struct BindingGraph {
    nodes: IndexSet<NodeRef>,
    /// node -> the nodes it eagerly requires
    eager: FxHashMap<NodeRef, Vec<NodeRef>>,
    deferred: FxHashMap<NodeRef, Vec<NodeRef>>,
}

impl BindingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: NodeRef) {
        self.nodes.insert(node);
    }

    pub fn add_edge(&mut self, from: NodeRef, to: NodeRef, kind: EdgeKind) {
        self.nodes.insert(from.clone());
        self.nodes.insert(to.clone());
        let edges = match kind {
            EdgeKind::Eager => self.eager.entry(from).or_default(),
            EdgeKind::Deferred => self.deferred.entry(from).or_default(),
        };
        if !edges.contains(&to) {
            edges.push(to);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: &NodeRef) -> bool {
        self.nodes.contains(node)
    }

    pub fn eager_dependencies(&self, node: &NodeRef) -> &[NodeRef] {
        self.eager.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn deferred_dependencies(&self, node: &NodeRef) -> &[NodeRef] {
        self.deferred.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeRef> {
        self.nodes.iter()
    }

    /// Find all distinct cycles over eager edges.
    ///
    /// DFS with a visiting set; when a back edge closes a cycle the current
    /// path slice is extracted. Each cycle is reported once regardless of
    /// which node the traversal entered it from.
    pub fn find_cycles(&self) -> Vec<Vec<NodeRef>> {
        let mut cycles = Vec::new();
        let mut signatures: FxHashSet<Vec<String>> = FxHashSet::default();
        let mut visited: FxHashSet<NodeRef> = FxHashSet::default();
        let mut visiting: FxHashSet<NodeRef> = FxHashSet::default();
        let mut path: Vec<NodeRef> = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node) {
                self.visit(
                    node,
                    &mut visited,
                    &mut visiting,
                    &mut path,
                    &mut cycles,
                    &mut signatures,
                );
            }
        }
        cycles
    }

    fn visit(
        &self,
        node: &NodeRef,
        visited: &mut FxHashSet<NodeRef>,
        visiting: &mut FxHashSet<NodeRef>,
        path: &mut Vec<NodeRef>,
        cycles: &mut Vec<Vec<NodeRef>>,
        signatures: &mut FxHashSet<Vec<String>>,
    ) {
        visiting.insert(node.clone());
        path.push(node.clone());

        for dep in self.eager_dependencies(node) {
            if visiting.contains(dep) {
                // Back edge: the cycle is the path suffix from `dep`
                let start = path
                    .iter()
                    .position(|n| n == dep)
                    .expect("visiting node is on the path");
                let cycle: Vec<NodeRef> = path[start..].to_vec();
                let mut signature: Vec<String> = cycle
                    .iter()
                    .map(|n| format!("{}#{}", n.scope.index(), n.key))
                    .collect();
                signature.sort();
                if signatures.insert(signature) {
                    cycles.push(cycle);
                }
            } else if !visited.contains(dep) {
                self.visit(dep, visited, visiting, path, cycles, signatures);
            }
        }

        path.pop();
        visiting.remove(node);
        visited.insert(node.clone());
    }

    /// Deterministic topological order over eager edges, dependencies first.
    ///
    /// Kahn's algorithm; when several nodes are ready at once the one with
    /// the smallest `priority` is emitted first, so callers can encode
    /// declaration-order tie-breaking. Returns the nodes left unordered
    /// when the eager subgraph is cyclic.
    pub fn topological_order(
        &self,
        priority: impl Fn(&NodeRef) -> (usize, usize),
    ) -> Result<Vec<NodeRef>, Vec<NodeRef>> {
        let mut indegree: IndexMap<&NodeRef, usize> = IndexMap::new();
        let mut dependents: FxHashMap<&NodeRef, Vec<&NodeRef>> = FxHashMap::default();
        for node in &self.nodes {
            let deps = self.eager_dependencies(node);
            indegree.insert(node, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(node);
            }
        }

        // (priority, insertion index) fully orders ready nodes
        let rank = |node: &NodeRef| {
            let (a, b) = priority(node);
            let index = self.nodes.get_index_of(node).unwrap_or(usize::MAX);
            (a, b, index)
        };

        let mut ready: Vec<&NodeRef> = indegree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&n, _)| n)
            .collect();
        let mut sorted = Vec::with_capacity(self.nodes.len());

        while !ready.is_empty() {
            let mut next_index = 0;
            for i in 1..ready.len() {
                if rank(ready[i]) < rank(ready[next_index]) {
                    next_index = i;
                }
            }
            let node = ready.swap_remove(next_index);
            sorted.push(node.clone());

            if let Some(deps) = dependents.get(node) {
                for &dependent in deps {
                    let degree = indegree
                        .get_mut(dependent)
                        .expect("all nodes have an indegree");
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(dependent);
                    }
                }
            }
        }

        if sorted.len() < self.nodes.len() {
            let emitted: FxHashSet<&NodeRef> = sorted.iter().collect();
            let remaining = self
                .nodes
                .iter()
                .filter(|n| !emitted.contains(n))
                .cloned()
                .collect();
            return Err(remaining);
        }
        Ok(sorted)
    }
}
