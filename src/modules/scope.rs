use crate::model::{Binding, BindingKey};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// Index of a scope node within its [ScopeTree].
///
/// Ids are assigned in installation order; the root scope is always id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);

    pub(crate) fn new(index: u32) -> Self {
        ScopeId(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the tree of installation scopes.
///
/// The root scope is the injector itself; each private module creates a
/// child scope. Plain modules merge their bindings into the scope that
/// installed them. Local bindings keep declaration order (IndexMap) so the
/// emitted plan is deterministic.
#[derive(Debug)]
pub struct ScopeNode {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Name of the module (or injector) this scope belongs to
    pub module: String,
    pub private: bool,
    bindings: IndexMap<BindingKey, Arc<Binding>>,
    exposed: IndexSet<BindingKey>,
}

impl ScopeNode {
    pub fn binding(&self, key: &BindingKey) -> Option<&Arc<Binding>> {
        self.bindings.get(key)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&BindingKey, &Arc<Binding>)> {
        self.bindings.iter()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn exposes(&self, key: &BindingKey) -> bool {
        self.exposed.contains(key)
    }

    pub fn exposed_keys(&self) -> impl Iterator<Item = &BindingKey> {
        self.exposed.iter()
    }
}

/// Result of a visibility-aware binding lookup.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found {
        owner: ScopeId,
        binding: Arc<Binding>,
    },
    /// More than one candidate at the same scope level; no tie-break
    Ambiguous {
        candidates: Vec<(ScopeId, Arc<Binding>)>,
    },
    Missing,
}

/// The tree of installation scopes for one injector.
///
/// Built by the collector; mutable during resolution only for memoizing
/// just-in-time bindings, read-only afterwards.
#[derive(Debug)]
pub struct ScopeTree {
    nodes: Vec<ScopeNode>,
}

impl ScopeTree {
    pub fn new(root_module: impl Into<String>) -> Self {
        Self {
            nodes: vec![ScopeNode {
                id: ScopeId::ROOT,
                parent: None,
                children: Vec::new(),
                module: root_module.into(),
                private: false,
                bindings: IndexMap::new(),
                exposed: IndexSet::new(),
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    pub fn add_child(&mut self, parent: ScopeId, module: impl Into<String>) -> ScopeId {
        let id = ScopeId::new(self.nodes.len() as u32);
        self.nodes.push(ScopeNode {
            id,
            parent: Some(parent),
            children: Vec::new(),
            module: module.into(),
            private: true,
            bindings: IndexMap::new(),
            exposed: IndexSet::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn node(&self, id: ScopeId) -> &ScopeNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All scopes in installation order (root first).
    pub fn iter(&self) -> impl Iterator<Item = &ScopeNode> {
        self.nodes.iter()
    }

    /// Insert a local binding; on a duplicate key the existing binding is
    /// returned unchanged so the caller can report both locations.
    pub fn insert_binding(
        &mut self,
        id: ScopeId,
        binding: Binding,
    ) -> Result<Arc<Binding>, Arc<Binding>> {
        let bindings = &mut self.nodes[id.index()].bindings;
        if let Some(existing) = bindings.get(binding.key()) {
            return Err(existing.clone());
        }
        let binding = Arc::new(binding);
        bindings.insert(binding.key().clone(), binding.clone());
        Ok(binding)
    }

    /// Replace an existing local binding (scoping overrides).
    pub fn replace_binding(&mut self, id: ScopeId, binding: Binding) {
        let bindings = &mut self.nodes[id.index()].bindings;
        bindings.insert(binding.key().clone(), Arc::new(binding));
    }

    pub fn expose(&mut self, id: ScopeId, key: BindingKey) {
        self.nodes[id.index()].exposed.insert(key);
    }

    /// Look up a key from `from`, honoring scope visibility.
    ///
    /// At each level of the scope chain the candidates are the level's own
    /// local binding plus anything its direct children expose; exposure is
    /// transitive only through explicit re-exposure, so a grandchild's
    /// un-exposed binding never reaches a grandparent. Two candidates at
    /// one level is an ambiguity, reported rather than tie-broken.
    pub fn find_visible(&self, from: ScopeId, key: &BindingKey) -> LookupOutcome {
        let mut level = Some(from);
        while let Some(current) = level {
            let mut candidates = Vec::new();
            if let Some(binding) = self.node(current).binding(key) {
                candidates.push((current, binding.clone()));
            }
            for &child in &self.node(current).children {
                if self.node(child).exposes(key) {
                    match self.exposed_candidate(child, key) {
                        LookupOutcome::Found { owner, binding } => {
                            candidates.push((owner, binding));
                        }
                        ambiguous @ LookupOutcome::Ambiguous { .. } => return ambiguous,
                        // exposed but unbound: already a declaration error
                        LookupOutcome::Missing => {}
                    }
                }
            }
            match candidates.len() {
                0 => level = self.node(current).parent,
                1 => {
                    let (owner, binding) = candidates.pop().expect("one candidate");
                    return LookupOutcome::Found { owner, binding };
                }
                _ => return LookupOutcome::Ambiguous { candidates },
            }
        }
        LookupOutcome::Missing
    }

    /// Resolve an exposed key within `scope`'s subtree: its own local
    /// binding, else whatever its direct children expose (recursively).
    /// No upward walk — exposure never reaches past the declaring subtree.
    fn exposed_candidate(&self, scope: ScopeId, key: &BindingKey) -> LookupOutcome {
        let mut candidates = Vec::new();
        if let Some(binding) = self.node(scope).binding(key) {
            candidates.push((scope, binding.clone()));
        }
        for &child in &self.node(scope).children {
            if self.node(child).exposes(key) {
                match self.exposed_candidate(child, key) {
                    LookupOutcome::Found { owner, binding } => {
                        candidates.push((owner, binding));
                    }
                    ambiguous @ LookupOutcome::Ambiguous { .. } => return ambiguous,
                    LookupOutcome::Missing => {}
                }
            }
        }
        match candidates.len() {
            0 => LookupOutcome::Missing,
            1 => {
                let (owner, binding) = candidates.pop().expect("one candidate");
                LookupOutcome::Found { owner, binding }
            }
            _ => LookupOutcome::Ambiguous { candidates },
        }
    }

    /// Whether an expose of `key` from `scope` can be satisfied (locally or
    /// through a child's exposure). Used to validate expose statements.
    pub fn resolvable_via_exposure(&self, scope: ScopeId, key: &BindingKey) -> bool {
        !matches!(self.exposed_candidate(scope, key), LookupOutcome::Missing)
    }

    /// Every scope that declares `key` locally, visible or not.
    /// Used to upgrade "unresolved" diagnostics to "not visible" ones.
    pub fn scopes_declaring(&self, key: &BindingKey) -> Vec<ScopeId> {
        self.nodes
            .iter()
            .filter(|n| n.bindings.contains_key(key))
            .map(|n| n.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::SourceLocation;
    use crate::model::{BindingKind, Scoping};

    fn class_binding(key: BindingKey) -> Binding {
        let class = key.base_type_name().to_string();
        Binding::new(
            key,
            BindingKind::Class { class },
            Scoping::Unscoped,
            SourceLocation::declared("Test", 0),
        )
    }

    #[test]
    fn test_local_binding_wins() {
        let mut tree = ScopeTree::new("Root");
        let key = BindingKey::of_type("Foo");
        tree.insert_binding(tree.root(), class_binding(key.clone()))
            .unwrap();

        match tree.find_visible(tree.root(), &key) {
            LookupOutcome::Found { owner, .. } => assert_eq!(owner, tree.root()),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut tree = ScopeTree::new("Root");
        let key = BindingKey::of_type("Foo");
        tree.insert_binding(tree.root(), class_binding(key.clone()))
            .unwrap();
        assert!(tree
            .insert_binding(tree.root(), class_binding(key))
            .is_err());
    }

    #[test]
    fn test_ancestor_binding_visible_in_child() {
        let mut tree = ScopeTree::new("Root");
        let key = BindingKey::of_type("Foo");
        tree.insert_binding(tree.root(), class_binding(key.clone()))
            .unwrap();
        let child = tree.add_child(tree.root(), "Private");

        match tree.find_visible(child, &key) {
            LookupOutcome::Found { owner, .. } => assert_eq!(owner, tree.root()),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_unexposed_child_binding_invisible_to_parent() {
        let mut tree = ScopeTree::new("Root");
        let child = tree.add_child(tree.root(), "Private");
        let key = BindingKey::of_type("Foo");
        tree.insert_binding(child, class_binding(key.clone())).unwrap();

        assert!(matches!(
            tree.find_visible(tree.root(), &key),
            LookupOutcome::Missing
        ));
    }

    #[test]
    fn test_exposed_child_binding_visible_to_parent_only() {
        let mut tree = ScopeTree::new("Root");
        let child = tree.add_child(tree.root(), "Child");
        let grandchild = tree.add_child(child, "Grandchild");
        let key = BindingKey::of_type("Foo");
        tree.insert_binding(grandchild, class_binding(key.clone()))
            .unwrap();
        tree.expose(grandchild, key.clone());

        // Visible in the child (direct parent of the exposing scope)
        match tree.find_visible(child, &key) {
            LookupOutcome::Found { owner, .. } => assert_eq!(owner, grandchild),
            other => panic!("expected Found, got {:?}", other),
        }
        // Not visible in the grandparent without re-exposure
        assert!(matches!(
            tree.find_visible(tree.root(), &key),
            LookupOutcome::Missing
        ));
    }

    #[test]
    fn test_reexposure_reaches_grandparent() {
        let mut tree = ScopeTree::new("Root");
        let child = tree.add_child(tree.root(), "Child");
        let grandchild = tree.add_child(child, "Grandchild");
        let key = BindingKey::of_type("Foo");
        tree.insert_binding(grandchild, class_binding(key.clone()))
            .unwrap();
        tree.expose(grandchild, key.clone());
        tree.expose(child, key.clone());

        match tree.find_visible(tree.root(), &key) {
            LookupOutcome::Found { owner, .. } => assert_eq!(owner, grandchild),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_sibling_exposure_not_visible_to_sibling_locals() {
        // A sibling's un-exposed binding must stay invisible even when the
        // requesting scope is itself private.
        let mut tree = ScopeTree::new("Root");
        let left = tree.add_child(tree.root(), "Left");
        let right = tree.add_child(tree.root(), "Right");
        let key = BindingKey::of_type("Foo");
        tree.insert_binding(left, class_binding(key.clone())).unwrap();

        assert!(matches!(
            tree.find_visible(right, &key),
            LookupOutcome::Missing
        ));
    }

    #[test]
    fn test_two_exposing_children_is_ambiguous() {
        let mut tree = ScopeTree::new("Root");
        let left = tree.add_child(tree.root(), "Left");
        let right = tree.add_child(tree.root(), "Right");
        let key = BindingKey::of_type("Foo");
        tree.insert_binding(left, class_binding(key.clone())).unwrap();
        tree.insert_binding(right, class_binding(key.clone())).unwrap();
        tree.expose(left, key.clone());
        tree.expose(right, key.clone());

        match tree.find_visible(tree.root(), &key) {
            LookupOutcome::Ambiguous { candidates } => assert_eq!(candidates.len(), 2),
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_local_and_exposed_is_ambiguous() {
        let mut tree = ScopeTree::new("Root");
        let child = tree.add_child(tree.root(), "Child");
        let key = BindingKey::of_type("Foo");
        tree.insert_binding(tree.root(), class_binding(key.clone()))
            .unwrap();
        tree.insert_binding(child, class_binding(key.clone())).unwrap();
        tree.expose(child, key.clone());

        assert!(matches!(
            tree.find_visible(tree.root(), &key),
            LookupOutcome::Ambiguous { .. }
        ));
    }

    #[test]
    fn test_scopes_declaring_finds_hidden_binding() {
        let mut tree = ScopeTree::new("Root");
        let child = tree.add_child(tree.root(), "Private");
        let key = BindingKey::of_type("Foo");
        tree.insert_binding(child, class_binding(key.clone())).unwrap();

        assert_eq!(tree.scopes_declaring(&key), vec![child]);
    }
}
