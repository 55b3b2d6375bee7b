//! Compile-time dependency-injection binding resolver.
//!
//! Given declarative modules (binding rules) and an injector interface
//! (the keys an application needs constructed), `wiregen` statically
//! resolves a complete, dependency-ordered construction plan: explicit and
//! just-in-time bindings, hierarchical private scopes with selective
//! exposure, cycle detection over non-deferred edges, and an eager-
//! singleton initialization order. The finalized [plan::InjectorPlan] is
//! what a code generator turns into reflection-free construction source.
//!
//! ```
//! use std::sync::Arc;
//! use wiregen::{
//!     BindingKey, BindingResolver, CollectingDiagnosticHandler, InjectorDecl,
//!     ModuleDecl, StaticTypeOracle, TypeMetadata,
//! };
//!
//! let mut oracle = StaticTypeOracle::new();
//! oracle.register(TypeMetadata::class("Engine").public_constructor(vec![]).build());
//!
//! let injector = InjectorDecl::new("App")
//!     .install(
//!         ModuleDecl::module("CoreModule")
//!             .bind_class(BindingKey::of_type("Engine"), "Engine")
//!             .build(),
//!     )
//!     .require(BindingKey::of_type("Engine"));
//!
//! let resolver = BindingResolver::new(
//!     Arc::new(oracle),
//!     Arc::new(CollectingDiagnosticHandler::new()),
//! );
//! let plan = resolver.resolve(&injector).expect("resolution succeeds");
//! assert_eq!(plan.root().bindings.len(), 1);
//! ```

pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod graph;
pub mod location;
pub mod metadata;
pub mod model;
pub mod modules;
pub mod phases;
pub mod plan;
mod resolver;

pub use config::ResolverOptions;
pub use diagnostics::{
    CollectingDiagnosticHandler, ConsoleDiagnosticHandler, Diagnostic, DiagnosticCode,
    DiagnosticHandler, DiagnosticLevel,
};
pub use errors::{OracleError, ResolveError};
pub use location::SourceLocation;
pub use metadata::{ParamMetadata, StaticTypeOracle, TypeMetadata, TypeOracle};
pub use model::{Binding, BindingKey, BindingKind, ConstantValue, Dependency, Scoping, TypeRef};
pub use modules::{InjectorDecl, ModuleDecl};
pub use plan::{InjectorPlan, PlanKeyRef, PlannedBinding, ScopePlan};
pub use resolver::BindingResolver;
