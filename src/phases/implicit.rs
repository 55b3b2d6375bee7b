//! Implicit binding creator: just-in-time synthesis for keys with no
//! explicit declaration.

use crate::config::ResolverOptions;
use crate::location::SourceLocation;
use crate::metadata::{ConstructorProblem, TypeOracle};
use crate::model::{Binding, BindingKey, BindingKind, Scoping};
use tracing::debug;

/// Why a just-in-time binding could not be synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplicitFailure {
    /// Implicit bindings are disabled by configuration
    Disabled,
    /// Qualified keys always need an explicit binding
    QualifiedKey,
    /// Provider keys are never constructed directly
    ProviderKey,
    TypeNotFound {
        name: String,
    },
    NotInstantiable {
        class: String,
        problem: ConstructorProblem,
    },
}

pub struct ImplicitBindingCreator<'a> {
    oracle: &'a dyn TypeOracle,
    options: &'a ResolverOptions,
}

impl<'a> ImplicitBindingCreator<'a> {
    pub fn new(oracle: &'a dyn TypeOracle, options: &'a ResolverOptions) -> Self {
        Self { oracle, options }
    }

    /// Attempt to synthesize a class binding for `key`.
    ///
    /// Succeeds when the key is unqualified and its type is a concrete
    /// class with a usable constructor (a single injection-annotated one,
    /// or a single public no-arg constructor if none is annotated). The
    /// caller registers the result into the requesting scope so repeated
    /// requests reuse it.
    pub fn try_create(
        &self,
        key: &BindingKey,
        requesting_scope: &str,
    ) -> Result<Binding, ImplicitFailure> {
        if !self.options.allow_implicit {
            return Err(ImplicitFailure::Disabled);
        }
        if key.is_provider() {
            return Err(ImplicitFailure::ProviderKey);
        }
        if key.is_qualified() {
            return Err(ImplicitFailure::QualifiedKey);
        }

        let class = key.base_type_name();
        let meta = self
            .oracle
            .lookup(class)
            .map_err(|_| ImplicitFailure::TypeNotFound {
                name: class.to_string(),
            })?;
        meta.select_constructor()
            .map_err(|problem| ImplicitFailure::NotInstantiable {
                class: class.to_string(),
                problem,
            })?;

        debug!(%key, scope = requesting_scope, "synthesized just-in-time binding");
        Ok(Binding::new(
            key.clone(),
            BindingKind::Class {
                class: class.to_string(),
            },
            Scoping::Unscoped,
            SourceLocation::synthesized(requesting_scope),
        ))
    }
}
