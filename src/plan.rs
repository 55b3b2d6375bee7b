//! Finalized binding tables consumed by the code generator.
//!
//! The plan is the full contract: per-scope binding tables (construction
//! strategy, scope, ordered dependency list, exposure flag), the global
//! eager-singleton initialization order, and any warnings that survived
//! resolution. Everything serializes so the generator can run out of
//! process.

use crate::diagnostics::Diagnostic;
use crate::location::SourceLocation;
use crate::model::{BindingKey, BindingKind, Dependency, Scoping};
use serde::{Deserialize, Serialize};

/// One finalized binding in a scope's table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedBinding {
    pub key: BindingKey,
    /// Construction strategy (the resolved recipe)
    pub strategy: BindingKind,
    pub scoping: Scoping,
    /// Ordered dependency list; unsatisfied optional slots are omitted
    pub dependencies: Vec<Dependency>,
    /// Whether the owning scope exposes this key to its parent
    pub exposed: bool,
    /// Whether the binding was synthesized just-in-time
    pub implicit: bool,
    pub origin: SourceLocation,
}

/// The binding table for one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopePlan {
    pub module: String,
    pub private: bool,
    /// Index of the parent scope in [InjectorPlan::scopes]
    pub parent: Option<usize>,
    pub bindings: Vec<PlannedBinding>,
}

/// A key pinned to the scope that owns its construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanKeyRef {
    pub scope: usize,
    pub key: BindingKey,
}

/// The finalized, ordered construction plan for one injector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectorPlan {
    pub injector: String,
    /// Scope tables in installation order; index 0 is the injector root
    pub scopes: Vec<ScopePlan>,
    /// Global eager-singleton initialization order, dependencies first
    pub eager_order: Vec<PlanKeyRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Diagnostic>,
}

impl InjectorPlan {
    pub fn root(&self) -> &ScopePlan {
        &self.scopes[0]
    }

    pub fn scope(&self, module: &str) -> Option<&ScopePlan> {
        self.scopes.iter().find(|s| s.module == module)
    }

    pub fn binding(&self, module: &str, key: &BindingKey) -> Option<&PlannedBinding> {
        self.scope(module)?.bindings.iter().find(|b| &b.key == key)
    }

    pub fn binding_count(&self) -> usize {
        self.scopes.iter().map(|s| s.bindings.len()).sum()
    }

    /// Serialized form handed to the code generator.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let plan = InjectorPlan {
            injector: "App".to_string(),
            scopes: vec![ScopePlan {
                module: "App".to_string(),
                private: false,
                parent: None,
                bindings: vec![PlannedBinding {
                    key: BindingKey::of_type("Foo"),
                    strategy: BindingKind::Class {
                        class: "Foo".to_string(),
                    },
                    scoping: Scoping::Singleton,
                    dependencies: vec![Dependency::required(BindingKey::of_type("Bar"))],
                    exposed: false,
                    implicit: false,
                    origin: SourceLocation::declared("M", 0),
                }],
            }],
            eager_order: vec![PlanKeyRef {
                scope: 0,
                key: BindingKey::of_type("Foo"),
            }],
            warnings: Vec::new(),
        };

        let json = plan.to_json().unwrap();
        let back: InjectorPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, back);
    }

    #[test]
    fn test_lookup_helpers() {
        let plan = InjectorPlan {
            injector: "App".to_string(),
            scopes: vec![ScopePlan {
                module: "App".to_string(),
                private: false,
                parent: None,
                bindings: Vec::new(),
            }],
            eager_order: Vec::new(),
            warnings: Vec::new(),
        };

        assert_eq!(plan.root().module, "App");
        assert!(plan.scope("Nope").is_none());
        assert_eq!(plan.binding_count(), 0);
    }
}
