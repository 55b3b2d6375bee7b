//! Binding resolver core: drives end-to-end resolution for one injector.
//!
//! A work-list of (scope, key) requests is seeded from the injector's
//! required keys, its member-injection targets, and every declared eager
//! singleton. Each request is answered by the visibility-aware scope
//! lookup, falling back to just-in-time synthesis. Resolution is
//! best-effort: every problem becomes a diagnostic and the pass continues,
//! so one compilation attempt reports the maximal useful set.

use crate::config::ResolverOptions;
use crate::diagnostics::{error_codes, Diagnostic, DiagnosticCode, DiagnosticHandler};
use crate::graph::{BindingGraph, EdgeKind, NodeRef};
use crate::location::SourceLocation;
use crate::metadata::{ConstructorProblem, TypeOracle};
use crate::model::{Binding, BindingKey, Dependency};
use crate::modules::collector::FlattenedInjector;
use crate::modules::scope::{LookupOutcome, ScopeId, ScopeTree};
use crate::phases::explore::{DependencyExplorer, ExploreError};
use crate::phases::implicit::{ImplicitBindingCreator, ImplicitFailure};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace};

/// One fully resolved binding with its explored dependencies.
#[derive(Debug, Clone)]
pub struct ResolvedBinding {
    pub binding: Arc<Binding>,
    pub owner: ScopeId,
    pub dependencies: Vec<Dependency>,
    /// Optional dependencies that could not be satisfied (degraded to absent)
    pub absent: FxHashSet<BindingKey>,
}

/// Output of the resolution phase.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Resolved bindings in discovery order
    pub resolved: IndexMap<NodeRef, ResolvedBinding>,
    pub graph: BindingGraph,
}

/// Per-request outcome memo.
///
/// Requests are memoized per (requesting scope, key): sibling scopes
/// requesting the same key are independent requests that may resolve to
/// different owners.
enum Outcome {
    Resolved(NodeRef),
    Failed {
        /// An error-level diagnostic was already emitted for this request
        errored: bool,
        code: DiagnosticCode,
        message: String,
    },
}

struct WorkItem {
    /// Scope the request resolves against
    scope: ScopeId,
    key: BindingKey,
    /// Key chain from the injector root, ending with `key`
    path: Vec<BindingKey>,
    requested_by: Option<NodeRef>,
    edge: EdgeKind,
    optional: bool,
    /// Location diagnostics attach to (requesting declaration)
    origin: SourceLocation,
}

/// Resolve every reachable binding, recording edges for cycle detection.
///
/// The scope tree is mutable only to memoize just-in-time bindings into
/// the requesting scope; it is read-only after this phase returns.
pub fn resolve_bindings(
    tree: &mut ScopeTree,
    injector: &FlattenedInjector,
    oracle: &dyn TypeOracle,
    options: &ResolverOptions,
    handler: &dyn DiagnosticHandler,
) -> Resolution {
    let mut driver = Driver {
        tree,
        explorer: DependencyExplorer::new(oracle),
        implicit: ImplicitBindingCreator::new(oracle, options),
        handler,
        resolution: Resolution::default(),
        memo: FxHashMap::default(),
        queue: VecDeque::new(),
    };

    driver.seed(injector);
    driver.run();
    driver.detect_cycles();
    if options.report_unused {
        driver.warn_unused();
    }

    debug!(
        resolved = driver.resolution.resolved.len(),
        nodes = driver.resolution.graph.node_count(),
        "resolution pass complete"
    );
    driver.resolution
}

struct Driver<'a> {
    tree: &'a mut ScopeTree,
    explorer: DependencyExplorer<'a>,
    implicit: ImplicitBindingCreator<'a>,
    handler: &'a dyn DiagnosticHandler,
    resolution: Resolution,
    memo: FxHashMap<(ScopeId, BindingKey), Outcome>,
    queue: VecDeque<WorkItem>,
}

impl<'a> Driver<'a> {
    fn seed(&mut self, injector: &FlattenedInjector) {
        let root = self.tree.root();
        let injector_location = SourceLocation::injector(&injector.name);

        for required in &injector.required {
            self.queue.push_back(WorkItem {
                scope: root,
                key: required.key.clone(),
                path: vec![required.key.clone()],
                requested_by: None,
                edge: EdgeKind::Eager,
                optional: false,
                origin: injector_location.clone(),
            });
        }

        // inject-members-into(T): T's member slots are required keys too
        for class in &injector.member_injections {
            match self.explorer.member_dependencies(class) {
                Ok(deps) => {
                    for dep in deps {
                        self.queue.push_back(WorkItem {
                            scope: root,
                            key: dep.key.clone(),
                            path: vec![BindingKey::of_type(class.clone()), dep.key],
                            requested_by: None,
                            edge: if dep.deferred {
                                EdgeKind::Deferred
                            } else {
                                EdgeKind::Eager
                            },
                            optional: dep.optional,
                            origin: injector_location.clone(),
                        });
                    }
                }
                Err(err) => self.report_explore_error(
                    &err,
                    &injector_location,
                    vec![BindingKey::of_type(class.clone())],
                ),
            }
        }

        // Eager singletons are constructed at startup whether or not an
        // accessor requires them, so they are resolution roots as well
        let eager_roots: Vec<(ScopeId, BindingKey, SourceLocation)> = self
            .tree
            .iter()
            .flat_map(|scope| {
                scope
                    .bindings()
                    .filter(|(_, b)| b.scoping().is_eager())
                    .map(|(k, b)| (scope.id, k.clone(), b.origin().clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (scope, key, origin) in eager_roots {
            self.queue.push_back(WorkItem {
                scope,
                key: key.clone(),
                path: vec![key],
                requested_by: None,
                edge: EdgeKind::Eager,
                optional: false,
                origin,
            });
        }
    }

    fn run(&mut self) {
        while let Some(item) = self.queue.pop_front() {
            self.process(item);
        }
    }

    fn process(&mut self, item: WorkItem) {
        trace!(key = %item.key, scope = item.scope.index(), "processing request");

        let memo_key = (item.scope, item.key.clone());
        let memoized = match self.memo.get(&memo_key) {
            Some(Outcome::Resolved(node)) => Some(Ok(node.clone())),
            Some(Outcome::Failed {
                errored,
                code,
                message,
            }) => Some(Err((*errored, *code, message.clone()))),
            None => None,
        };
        if let Some(memoized) = memoized {
            match memoized {
                Ok(node) => self.record_edge(&item, &node),
                Err((errored, code, message)) => {
                    // A key that first failed an optional request and is now
                    // required gets its error-level diagnostic after all
                    if !errored && !item.optional {
                        self.handler.report(
                            Diagnostic::error_with_code(
                                item.origin.clone(),
                                code,
                                message.clone(),
                            )
                            .with_key_path(item.path.clone()),
                        );
                        self.memo.insert(
                            memo_key,
                            Outcome::Failed {
                                errored: true,
                                code,
                                message,
                            },
                        );
                    }
                    self.mark_absent(&item);
                }
            }
            return;
        }

        match self.tree.find_visible(item.scope, &item.key) {
            LookupOutcome::Found { owner, binding } => {
                self.accept(item, owner, binding);
            }
            LookupOutcome::Ambiguous { candidates } => {
                let mut diagnostic = Diagnostic::error_with_code(
                    item.origin.clone(),
                    error_codes::AMBIGUOUS_BINDING,
                    format!(
                        "{} has {} candidate bindings visible at the same scope level",
                        item.key,
                        candidates.len()
                    ),
                )
                .with_key_path(item.path.clone());
                for (_, candidate) in &candidates {
                    diagnostic =
                        diagnostic.with_related(candidate.origin().clone(), "candidate bound here");
                }
                self.handler.report(diagnostic);
                self.memo.insert(
                    (item.scope, item.key.clone()),
                    Outcome::Failed {
                        errored: true,
                        code: error_codes::AMBIGUOUS_BINDING,
                        message: format!("{} is ambiguous", item.key),
                    },
                );
            }
            LookupOutcome::Missing => {
                let scope_name = self.tree.node(item.scope).module.clone();
                match self.implicit.try_create(&item.key, &scope_name) {
                    Ok(binding) => {
                        let scope = item.scope;
                        let binding = self
                            .tree
                            .insert_binding(scope, binding)
                            .unwrap_or_else(|existing| existing);
                        self.accept(item, scope, binding);
                    }
                    Err(failure) => self.report_miss(item, failure),
                }
            }
        }
    }

    /// A binding answered the request: record the edge, memoize, and
    /// explore its dependencies against the owner scope (lexical scoping:
    /// dependencies resolve where the binding was declared, not where it
    /// was requested).
    fn accept(&mut self, item: WorkItem, owner: ScopeId, binding: Arc<Binding>) {
        let node = NodeRef::new(owner, item.key.clone());
        self.memo.insert(
            (item.scope, item.key.clone()),
            Outcome::Resolved(node.clone()),
        );
        self.record_edge(&item, &node);

        if self.resolution.resolved.contains_key(&node) {
            return;
        }
        self.resolution.graph.add_node(node.clone());

        match self.explorer.dependencies_of(&binding) {
            Ok(dependencies) => {
                for dep in &dependencies {
                    let mut path = item.path.clone();
                    path.push(dep.key.clone());
                    self.queue.push_back(WorkItem {
                        scope: owner,
                        key: dep.key.clone(),
                        path,
                        requested_by: Some(node.clone()),
                        edge: if dep.deferred {
                            EdgeKind::Deferred
                        } else {
                            EdgeKind::Eager
                        },
                        optional: dep.optional,
                        origin: binding.origin().clone(),
                    });
                }
                self.resolution.resolved.insert(
                    node,
                    ResolvedBinding {
                        binding,
                        owner,
                        dependencies,
                        absent: FxHashSet::default(),
                    },
                );
            }
            Err(err) => {
                self.report_explore_error(&err, binding.origin(), item.path.clone());
                self.resolution.resolved.insert(
                    node,
                    ResolvedBinding {
                        binding,
                        owner,
                        dependencies: Vec::new(),
                        absent: FxHashSet::default(),
                    },
                );
            }
        }
    }

    fn record_edge(&mut self, item: &WorkItem, node: &NodeRef) {
        if let Some(from) = &item.requested_by {
            self.resolution
                .graph
                .add_edge(from.clone(), node.clone(), item.edge);
        }
    }

    /// No explicit binding and no just-in-time synthesis. Pick the most
    /// useful diagnostic: a key that exists in a non-visible scope is a
    /// visibility problem, not a missing binding.
    fn report_miss(&mut self, item: WorkItem, failure: ImplicitFailure) {
        let hidden = self.tree.scopes_declaring(&item.key);
        let (code, message) = if let Some(&hiding) = hidden.first() {
            let module = self.tree.node(hiding).module.clone();
            (
                error_codes::BINDING_NOT_VISIBLE,
                format!(
                    "{} is bound in private scope '{}' but not exposed to this scope",
                    item.key, module
                ),
            )
        } else {
            miss_diagnostic(&item.key, &failure)
        };

        if item.optional {
            self.handler.report(
                Diagnostic::warning(
                    item.origin.clone(),
                    format!(
                        "optional dependency {} is absent: {}",
                        item.key, message
                    ),
                )
                .with_code(error_codes::OPTIONAL_UNSATISFIED)
                .with_key_path(item.path.clone()),
            );
        } else {
            self.handler.report(
                Diagnostic::error_with_code(item.origin.clone(), code, message.clone())
                    .with_key_path(item.path.clone()),
            );
        }
        self.memo.insert(
            (item.scope, item.key.clone()),
            Outcome::Failed {
                errored: !item.optional,
                code,
                message,
            },
        );
        self.mark_absent(&item);
    }

    /// Record an unsatisfied optional slot on the requesting binding so the
    /// plan can omit it.
    fn mark_absent(&mut self, item: &WorkItem) {
        if !item.optional {
            return;
        }
        if let Some(from) = &item.requested_by {
            if let Some(resolved) = self.resolution.resolved.get_mut(from) {
                resolved.absent.insert(item.key.clone());
            }
        }
    }

    fn report_explore_error(
        &self,
        err: &ExploreError,
        origin: &SourceLocation,
        path: Vec<BindingKey>,
    ) {
        let (code, message) = explore_diagnostic(err);
        self.handler.report(
            Diagnostic::error_with_code(origin.clone(), code, message).with_key_path(path),
        );
    }

    /// After the work list drains: every cycle over eager edges is fatal.
    /// A cycle made up entirely of eager singletons gets its own code since
    /// no lazy edge could ever break it.
    fn detect_cycles(&mut self) {
        for cycle in self.resolution.graph.find_cycles() {
            let all_eager = cycle.iter().all(|n| {
                self.resolution
                    .resolved
                    .get(n)
                    .map(|r| r.binding.scoping().is_eager())
                    .unwrap_or(false)
            });
            let code = if all_eager {
                error_codes::EAGER_SINGLETON_CYCLE
            } else {
                error_codes::CIRCULAR_DEPENDENCY
            };

            let mut trace: Vec<BindingKey> = cycle.iter().map(|n| n.key.clone()).collect();
            trace.push(cycle[0].key.clone());
            let rendered = trace
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            let location = self
                .resolution
                .resolved
                .get(&cycle[0])
                .map(|r| r.binding.origin().clone())
                .unwrap_or_else(|| SourceLocation::synthesized("unknown"));

            let kind = if all_eager {
                "eager singleton cycle"
            } else {
                "circular dependency"
            };
            self.handler.report(
                Diagnostic::error_with_code(location, code, format!("{}: {}", kind, rendered))
                    .with_key_path(trace),
            );
        }
    }

    /// Explicit bindings never reached from any resolution root.
    fn warn_unused(&self) {
        for scope in self.tree.iter() {
            for (key, binding) in scope.bindings() {
                if binding.is_implicit() {
                    continue;
                }
                let node = NodeRef::new(scope.id, key.clone());
                if !self.resolution.resolved.contains_key(&node) {
                    self.handler.report(
                        Diagnostic::warning(
                            binding.origin().clone(),
                            format!("{} is bound but never used by the injector", key),
                        )
                        .with_code(error_codes::UNUSED_BINDING),
                    );
                }
            }
        }
    }
}

fn miss_diagnostic(key: &BindingKey, failure: &ImplicitFailure) -> (DiagnosticCode, String) {
    match failure {
        ImplicitFailure::Disabled => (
            error_codes::UNRESOLVED_DEPENDENCY,
            format!(
                "no binding found for {} (just-in-time bindings are disabled)",
                key
            ),
        ),
        ImplicitFailure::QualifiedKey => (
            error_codes::IMPLICIT_QUALIFIED,
            format!("no binding found for {}: qualified keys need an explicit binding", key),
        ),
        ImplicitFailure::ProviderKey => (
            error_codes::UNRESOLVED_DEPENDENCY,
            format!("no binding found for {}", key),
        ),
        ImplicitFailure::TypeNotFound { name } => (
            error_codes::TYPE_NOT_FOUND,
            format!("no binding found for {}: type '{}' not found", key, name),
        ),
        ImplicitFailure::NotInstantiable { class, problem } => (
            error_codes::NO_SUITABLE_CONSTRUCTOR,
            format!(
                "no binding found for {}: {}",
                key,
                constructor_problem(class, problem)
            ),
        ),
    }
}

fn explore_diagnostic(err: &ExploreError) -> (DiagnosticCode, String) {
    match err {
        ExploreError::TypeNotFound { name } => (
            error_codes::TYPE_NOT_FOUND,
            format!("type '{}' not found", name),
        ),
        ExploreError::NoConstructor { class, problem } => (
            error_codes::NO_SUITABLE_CONSTRUCTOR,
            constructor_problem(class, problem),
        ),
    }
}

fn constructor_problem(class: &str, problem: &ConstructorProblem) -> String {
    match problem {
        ConstructorProblem::NotInstantiable => {
            format!("'{}' is an interface or abstract class and cannot be constructed", class)
        }
        ConstructorProblem::NoEligibleConstructor => {
            format!("'{}' has no suitable constructor", class)
        }
        ConstructorProblem::MultipleInjectable => {
            format!("'{}' has more than one injectable constructor", class)
        }
    }
}
