use crate::config::ResolverOptions;
use crate::diagnostics::DiagnosticHandler;
use crate::errors::ResolveError;
use crate::metadata::TypeOracle;
use crate::modules::collector::{collect_scopes, FlattenedInjector};
use crate::modules::InjectorDecl;
use crate::phases::position::build_plan;
use crate::phases::resolve::resolve_bindings;
use crate::plan::InjectorPlan;
use std::sync::Arc;
use tracing::debug;

/// Drives end-to-end binding resolution for injector declarations.
///
/// One resolver can serve multiple independent injectors; each call to
/// [BindingResolver::resolve] is a self-contained batch run over state
/// private to that run. The metadata oracle is a read-only cache safe to
/// share across runs.
pub struct BindingResolver {
    oracle: Arc<dyn TypeOracle>,
    handler: Arc<dyn DiagnosticHandler>,
    options: ResolverOptions,
}

impl BindingResolver {
    pub fn new(oracle: Arc<dyn TypeOracle>, handler: Arc<dyn DiagnosticHandler>) -> Self {
        Self {
            oracle,
            handler,
            options: ResolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn handler(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.handler
    }

    /// Resolve one injector declaration into a construction plan.
    ///
    /// All diagnostics accumulate on the handler; the run fails iff any
    /// error-level diagnostic was recorded, and no plan is produced in
    /// that case. Structurally fatal declaration problems (a malformed
    /// injector, a private module installed twice) abort immediately.
    pub fn resolve(&self, injector: &InjectorDecl) -> Result<InjectorPlan, ResolveError> {
        if injector.name().is_empty() {
            return Err(ResolveError::MalformedDeclaration(
                "injector has no name".to_string(),
            ));
        }

        let flattened = FlattenedInjector::from_decl(injector);
        debug!(
            injector = %flattened.name,
            modules = flattened.modules.len(),
            required = flattened.required.len(),
            "starting resolution"
        );

        let collected = collect_scopes(&flattened, self.handler.as_ref())?;
        let mut tree = collected.tree;

        let resolution = resolve_bindings(
            &mut tree,
            &flattened,
            self.oracle.as_ref(),
            &self.options,
            self.handler.as_ref(),
        );

        if self.handler.has_errors() {
            return Err(ResolveError::ResolutionFailed(self.handler.error_count()));
        }

        let plan = build_plan(
            &tree,
            &resolution,
            &collected.module_order,
            &flattened.name,
            self.handler.as_ref(),
        );
        if self.handler.has_errors() {
            return Err(ResolveError::ResolutionFailed(self.handler.error_count()));
        }
        Ok(plan)
    }
}
