//! Module collector: walks declared modules (and transitive installs) into
//! a [ScopeTree] with local bindings and exposed keys populated.
//!
//! The collector is a pure transformation over the declaration lists; all
//! recoverable problems are reported through the diagnostic handler so one
//! pass surfaces every declaration error. Only structurally fatal problems
//! (a private module installed twice) abort immediately.

use crate::diagnostics::{error_codes, Diagnostic, DiagnosticHandler};
use crate::errors::ResolveError;
use crate::location::SourceLocation;
use crate::model::{Binding, BindingKey, BindingKind, Dependency, Scoping};
use crate::modules::scope::{ScopeId, ScopeTree};
use crate::modules::{BindTarget, BindingStatement, InjectorDecl, ModuleDecl, RequiredKey};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// An injector declaration with its interface inheritance flattened away.
///
/// The required-key set is the union of the injector's own declarations and
/// every ancestor interface's, resolved once. A key redeclared identically
/// by a parent and a child collapses to a single requirement.
#[derive(Debug, Clone)]
pub struct FlattenedInjector {
    pub name: String,
    pub modules: Vec<ModuleDecl>,
    pub required: Vec<RequiredKey>,
    pub member_injections: Vec<String>,
}

impl FlattenedInjector {
    pub fn from_decl(decl: &InjectorDecl) -> Self {
        let mut required: IndexMap<BindingKey, RequiredKey> = IndexMap::new();
        let mut modules: IndexMap<String, ModuleDecl> = IndexMap::new();
        let mut members: IndexSet<String> = IndexSet::new();
        Self::gather(decl, &mut required, &mut modules, &mut members);
        Self {
            name: decl.name().to_string(),
            modules: modules.into_values().collect(),
            required: required.into_values().collect(),
            member_injections: members.into_iter().collect(),
        }
    }

    /// Ancestors contribute first so their declaration order is preserved
    /// in the union; duplicates keep the first occurrence.
    fn gather(
        decl: &InjectorDecl,
        required: &mut IndexMap<BindingKey, RequiredKey>,
        modules: &mut IndexMap<String, ModuleDecl>,
        members: &mut IndexSet<String>,
    ) {
        for parent in decl.parents() {
            Self::gather(parent, required, modules, members);
        }
        for module in decl.modules() {
            modules
                .entry(module.name().to_string())
                .or_insert_with(|| module.clone());
        }
        for req in decl.required() {
            required.entry(req.key.clone()).or_insert_with(|| req.clone());
        }
        for class in decl.member_injections() {
            members.insert(class.clone());
        }
    }
}

/// Output of the collection phase.
pub struct CollectedScopes {
    pub tree: ScopeTree,
    /// Installation index per module name, for eager-order tie-breaking
    pub module_order: FxHashMap<String, usize>,
}

/// Build the scope tree for a flattened injector.
pub fn collect_scopes(
    injector: &FlattenedInjector,
    handler: &dyn DiagnosticHandler,
) -> Result<CollectedScopes, ResolveError> {
    let mut collector = Collector {
        tree: ScopeTree::new(injector.name.clone()),
        module_order: FxHashMap::default(),
        installed: FxHashSet::default(),
        handler,
    };

    let root = collector.tree.root();
    let mut root_overrides = Vec::new();
    let mut root_exposes = Vec::new();
    for module in &injector.modules {
        collector.install(root, module, &mut root_exposes, &mut root_overrides)?;
    }
    collector.apply_overrides(root, root_overrides);
    collector.apply_exposes(root, root_exposes);

    debug!(
        scopes = collector.tree.len(),
        modules = collector.module_order.len(),
        "collected scope tree"
    );

    Ok(CollectedScopes {
        tree: collector.tree,
        module_order: collector.module_order,
    })
}

struct Collector<'a> {
    tree: ScopeTree,
    module_order: FxHashMap<String, usize>,
    installed: FxHashSet<String>,
    handler: &'a dyn DiagnosticHandler,
}

type PendingExpose = (BindingKey, SourceLocation);
type PendingScoping = (BindingKey, Scoping, SourceLocation);

impl<'a> Collector<'a> {
    /// Install one module into `scope`. Private modules open a child scope
    /// with their own expose/scoping lists; plain modules merge into the
    /// installer's scope and share its pending lists.
    fn install(
        &mut self,
        scope: ScopeId,
        module: &ModuleDecl,
        exposes: &mut Vec<PendingExpose>,
        overrides: &mut Vec<PendingScoping>,
    ) -> Result<(), ResolveError> {
        if self.installed.contains(module.name()) {
            if module.is_private() {
                return Err(ResolveError::DuplicateInstall(module.name().to_string()));
            }
            // Plain modules deduplicate silently: the name is the identity
            return Ok(());
        }
        self.installed.insert(module.name().to_string());
        let order = self.module_order.len();
        self.module_order.insert(module.name().to_string(), order);

        if module.is_private() {
            let child = self.tree.add_child(scope, module.name());
            let mut my_exposes = Vec::new();
            let mut my_overrides = Vec::new();
            self.statements(child, module, &mut my_exposes, &mut my_overrides)?;
            self.apply_overrides(child, my_overrides);
            self.apply_exposes(child, my_exposes);
        } else {
            self.statements(scope, module, exposes, overrides)?;
        }
        Ok(())
    }

    fn statements(
        &mut self,
        scope: ScopeId,
        module: &ModuleDecl,
        exposes: &mut Vec<PendingExpose>,
        overrides: &mut Vec<PendingScoping>,
    ) -> Result<(), ResolveError> {
        for (index, statement) in module.statements().iter().enumerate() {
            let location = SourceLocation::declared(module.name(), index);
            match statement {
                BindingStatement::Bind {
                    key,
                    target,
                    scoping,
                } => {
                    if let Some(kind) = self.binding_kind(key, target, &location) {
                        self.insert(scope, Binding::new(key.clone(), kind, *scoping, location));
                    }
                }
                BindingStatement::Provides {
                    key,
                    method,
                    params,
                    scoping,
                } => {
                    let kind = BindingKind::ProviderMethod {
                        module: module.name().to_string(),
                        method: method.clone(),
                        params: params
                            .iter()
                            .map(|p| Dependency::from_declared(p.key.clone(), p.optional))
                            .collect(),
                    };
                    self.insert(scope, Binding::new(key.clone(), kind, *scoping, location));
                }
                BindingStatement::Install(sub) => {
                    self.install(scope, sub, exposes, overrides)?;
                }
                BindingStatement::Expose(key) => {
                    if module.is_private() {
                        exposes.push((key.clone(), location));
                    } else {
                        self.handler.report(
                            Diagnostic::error_with_code(
                                location,
                                error_codes::EXPOSE_OUTSIDE_PRIVATE,
                                format!(
                                    "cannot expose {}: module '{}' is not private",
                                    key,
                                    module.name()
                                ),
                            ),
                        );
                    }
                }
                BindingStatement::ScopeAs { key, scoping } => {
                    overrides.push((key.clone(), *scoping, location));
                }
            }
        }
        Ok(())
    }

    /// Translate a bind target into a binding kind, or report why it can't
    /// be translated.
    fn binding_kind(
        &self,
        key: &BindingKey,
        target: &BindTarget,
        location: &SourceLocation,
    ) -> Option<BindingKind> {
        match target {
            BindTarget::Untargetted => self.untargetted_kind(key, location),
            BindTarget::ToClass(class) => {
                if !key.is_qualified() && !key.is_provider() && key.base_type_name() == class {
                    Some(BindingKind::Class {
                        class: class.clone(),
                    })
                } else {
                    // Indirection through the implementation's own key so the
                    // implementation is resolved (and shared) like any other
                    Some(BindingKind::Linked {
                        target: BindingKey::of_type(class.clone()),
                    })
                }
            }
            BindTarget::ToKey(target_key) => Some(BindingKind::Linked {
                target: target_key.clone(),
            }),
            BindTarget::ToProvider(provider) => Some(BindingKind::ProviderClass {
                provider: provider.clone(),
            }),
            BindTarget::ToConstant(value) => Some(BindingKind::Constant {
                value: value.clone(),
            }),
            BindTarget::ToInstance(token) => Some(BindingKind::Instance {
                token: token.clone(),
            }),
            BindTarget::ToAssistedFactory { class, assisted } => Some(BindingKind::Assisted {
                class: class.clone(),
                assisted: assisted.clone(),
            }),
        }
    }

    fn untargetted_kind(
        &self,
        key: &BindingKey,
        location: &SourceLocation,
    ) -> Option<BindingKind> {
        if key.is_provider() {
            self.handler.report(Diagnostic::error_with_code(
                location.clone(),
                error_codes::INVALID_SCOPE_TARGET,
                format!("cannot bind {} without a target", key),
            ));
            return None;
        }
        Some(BindingKind::Class {
            class: key.base_type_name().to_string(),
        })
    }

    fn insert(&mut self, scope: ScopeId, binding: Binding) {
        let key = binding.key().clone();
        let location = binding.origin().clone();
        if let Err(existing) = self.tree.insert_binding(scope, binding) {
            self.handler.report(
                Diagnostic::error_with_code(
                    location,
                    error_codes::DUPLICATE_BINDING,
                    format!("{} is already bound in this scope", key),
                )
                .with_related(existing.origin().clone(), "first bound here"),
            );
        }
    }

    /// Apply mark-as-singleton / mark-as-eager statements once the scope's
    /// full statement list (including plain sub-installs) is known, so the
    /// statement may precede or follow the binding it scopes.
    fn apply_overrides(&mut self, scope: ScopeId, overrides: Vec<PendingScoping>) {
        for (key, scoping, location) in overrides {
            let existing = self.tree.node(scope).binding(&key).cloned();
            if let Some(existing) = existing {
                self.tree
                    .replace_binding(scope, existing.with_scoping(scoping));
            } else if let Some(kind) = self.untargetted_kind(&key, &location) {
                // Scope statement with no bind: an untargetted binding
                let binding = Binding::new(key, kind, scoping, location);
                self.insert(scope, binding);
            }
        }
    }

    fn apply_exposes(&mut self, scope: ScopeId, exposes: Vec<PendingExpose>) {
        for (key, location) in exposes {
            if self.tree.resolvable_via_exposure(scope, &key) {
                self.tree.expose(scope, key);
            } else {
                self.handler.report(Diagnostic::error_with_code(
                    location,
                    error_codes::EXPOSE_WITHOUT_BINDING,
                    format!("cannot expose {}: no binding in this scope", key),
                ));
            }
        }
    }
}
