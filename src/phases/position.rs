//! Binding positioner: assemble per-scope plan tables and compute the
//! eager-singleton initialization order.
//!
//! Each resolved binding already knows its owning scope from resolution
//! (lexical scoping: a binding's dependencies resolve against the scope
//! that declared it). The positioner turns that into the generator-facing
//! tables and orders eager singletons so every one of them is constructed
//! after all of its non-deferred dependencies, with ties broken by module
//! installation order, then statement declaration order.

use crate::diagnostics::{error_codes, Diagnostic, DiagnosticHandler, DiagnosticLevel};
use crate::graph::NodeRef;
use crate::location::SourceLocation;
use crate::modules::scope::ScopeTree;
use crate::phases::resolve::Resolution;
use crate::plan::{InjectorPlan, PlanKeyRef, PlannedBinding, ScopePlan};
use rustc_hash::FxHashMap;
use tracing::debug;

pub fn build_plan(
    tree: &ScopeTree,
    resolution: &Resolution,
    module_order: &FxHashMap<String, usize>,
    injector_name: &str,
    handler: &dyn DiagnosticHandler,
) -> InjectorPlan {
    let mut scopes = Vec::with_capacity(tree.len());
    for scope in tree.iter() {
        let mut bindings = Vec::new();
        // Declaration order within the scope, with memoized just-in-time
        // bindings following the explicit ones
        for (key, binding) in scope.bindings() {
            let node = NodeRef::new(scope.id, key.clone());
            let Some(resolved) = resolution.resolved.get(&node) else {
                // Never requested; not part of the plan
                continue;
            };
            let dependencies = resolved
                .dependencies
                .iter()
                .filter(|d| !resolved.absent.contains(&d.key))
                .cloned()
                .collect();
            bindings.push(PlannedBinding {
                key: key.clone(),
                strategy: binding.kind().clone(),
                scoping: binding.scoping(),
                dependencies,
                exposed: scope.exposes(key),
                implicit: binding.is_implicit(),
                origin: binding.origin().clone(),
            });
        }
        scopes.push(ScopePlan {
            module: scope.module.clone(),
            private: scope.private,
            parent: scope.parent.map(|p| p.index()),
            bindings,
        });
    }

    let eager_order = eager_singleton_order(resolution, module_order, handler);

    let warnings = handler
        .get_diagnostics()
        .into_iter()
        .filter(|d| d.level == DiagnosticLevel::Warning)
        .collect();

    debug!(
        scopes = scopes.len(),
        eager = eager_order.len(),
        "assembled injector plan"
    );

    InjectorPlan {
        injector: injector_name.to_string(),
        scopes,
        eager_order,
        warnings,
    }
}

/// Dependency-respecting order over the eager singletons.
///
/// The full eager-edge subgraph is ordered (an eager singleton may depend
/// on unscoped bindings that in turn depend on another eager singleton),
/// then filtered down to the eager nodes.
fn eager_singleton_order(
    resolution: &Resolution,
    module_order: &FxHashMap<String, usize>,
    handler: &dyn DiagnosticHandler,
) -> Vec<PlanKeyRef> {
    let priority = |node: &NodeRef| -> (usize, usize) {
        match resolution.resolved.get(node) {
            Some(resolved) => {
                let origin = resolved.binding.origin();
                let module_rank = match origin {
                    SourceLocation::Declared { module, .. } => {
                        module_order.get(module).copied().unwrap_or(usize::MAX)
                    }
                    _ => usize::MAX,
                };
                (module_rank, origin.statement_index())
            }
            None => (usize::MAX, usize::MAX),
        }
    };

    let ordered = match resolution.graph.topological_order(priority) {
        Ok(ordered) => ordered,
        Err(remaining) => {
            // Resolution already failed the pass for any eager cycle; this
            // only fires if the plan is built despite it
            let keys: Vec<String> = remaining.iter().map(|n| n.key.to_string()).collect();
            handler.report(Diagnostic::error_with_code(
                SourceLocation::synthesized("eager ordering"),
                error_codes::EAGER_SINGLETON_CYCLE,
                format!("no initialization order exists for: {}", keys.join(", ")),
            ));
            return Vec::new();
        }
    };

    ordered
        .into_iter()
        .filter(|node| {
            resolution
                .resolved
                .get(node)
                .map(|r| r.binding.scoping().is_eager())
                .unwrap_or(false)
        })
        .map(|node| PlanKeyRef {
            scope: node.scope.index(),
            key: node.key,
        })
        .collect()
}
