//! Dependency explorer: given a binding, enumerate the keys it depends on
//! without resolving them.
//!
//! Class-backed bindings walk the oracle metadata in a stable order: the
//! chosen constructor's parameters first, then injectable members over the
//! supertype chain ancestor-to-descendant, fields before methods within a
//! class, declaration order within a class.

use crate::errors::OracleError;
use crate::metadata::{ConstructorProblem, TypeMetadata, TypeOracle};
use crate::model::{Binding, BindingKind, Dependency};
use rustc_hash::FxHashSet;

/// Why a binding's dependencies could not be enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExploreError {
    TypeNotFound { name: String },
    NoConstructor {
        class: String,
        problem: ConstructorProblem,
    },
}

impl From<OracleError> for ExploreError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::TypeNotFound(name) => Self::TypeNotFound { name },
        }
    }
}

pub struct DependencyExplorer<'a> {
    oracle: &'a dyn TypeOracle,
}

impl<'a> DependencyExplorer<'a> {
    pub fn new(oracle: &'a dyn TypeOracle) -> Self {
        Self { oracle }
    }

    /// Ordered dependency list for one binding.
    pub fn dependencies_of(&self, binding: &Binding) -> Result<Vec<Dependency>, ExploreError> {
        match binding.kind() {
            BindingKind::Linked { target } => {
                Ok(vec![Dependency::from_declared(target.clone(), false)])
            }
            BindingKind::Class { class } => self.construction_dependencies(class),
            // The provider class is itself constructed via injection
            BindingKind::ProviderClass { provider } => self.construction_dependencies(provider),
            // Provider-method parameters were normalized at collection time
            BindingKind::ProviderMethod { params, .. } => Ok(params.clone()),
            BindingKind::Constant { .. } | BindingKind::Instance { .. } => Ok(Vec::new()),
            BindingKind::Assisted { class, assisted } => {
                // Caller-supplied parameters are not graph dependencies; the
                // rest is resolved through providers at factory call time,
                // so every remaining edge is deferred.
                let deps = self.construction_dependencies(class)?;
                Ok(deps
                    .into_iter()
                    .filter(|d| !assisted.contains(&d.key))
                    .map(Dependency::deferred)
                    .collect())
            }
        }
    }

    /// Constructor parameters plus injectable members for a class.
    pub fn construction_dependencies(&self, class: &str) -> Result<Vec<Dependency>, ExploreError> {
        let meta = self.oracle.lookup(class)?;
        let ctor = meta
            .select_constructor()
            .map_err(|problem| ExploreError::NoConstructor {
                class: class.to_string(),
                problem,
            })?;

        let mut deps: Vec<Dependency> = ctor
            .params
            .iter()
            .map(|p| Dependency::from_declared(p.key.clone(), p.optional))
            .collect();
        deps.extend(self.member_dependencies(class)?);
        Ok(deps)
    }

    /// Injectable field and method dependencies only (no constructor).
    /// Also drives inject-members-into(existing instance) requests.
    pub fn member_dependencies(&self, class: &str) -> Result<Vec<Dependency>, ExploreError> {
        let mut deps = Vec::new();
        for meta in self.ancestry(class)? {
            for field in &meta.fields {
                deps.push(Dependency::from_declared(field.key.clone(), field.optional));
            }
            for method in &meta.methods {
                for param in &method.params {
                    deps.push(Dependency::from_declared(
                        param.key.clone(),
                        param.optional || method.optional,
                    ));
                }
            }
        }
        Ok(deps)
    }

    /// Supertype chain, root ancestor first.
    fn ancestry(&self, class: &str) -> Result<Vec<&TypeMetadata>, ExploreError> {
        let mut chain = Vec::new();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut current = Some(class.to_string());
        while let Some(name) = current {
            let meta = self.oracle.lookup(&name)?;
            if !seen.insert(&meta.name) {
                // Malformed metadata with a supertype loop; stop walking
                break;
            }
            chain.push(meta);
            current = meta.superclass.clone();
        }
        chain.reverse();
        Ok(chain)
    }
}
