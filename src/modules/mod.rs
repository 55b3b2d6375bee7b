//! Module and injector declarations.
//!
//! Declarations are explicit, validated statement lists rather than live
//! builder chains: the collector consumes a finished [ModuleDecl], never
//! builder state. Module names are identities — installing the same name
//! twice refers to the same module.

pub mod collector;
pub mod scope;

pub use collector::{collect_scopes, FlattenedInjector};
pub use scope::{LookupOutcome, ScopeId, ScopeNode, ScopeTree};

use crate::metadata::ParamMetadata;
use crate::model::{BindingKey, ConstantValue, Scoping};

/// What a `bind` statement points the key at.
#[derive(Debug, Clone, PartialEq)]
pub enum BindTarget {
    /// No explicit target: construct the key's own type
    Untargetted,
    /// An implementation class
    ToClass(String),
    /// Another binding key (alias / qualifier redirection)
    ToKey(BindingKey),
    /// A provider class constructed via injection
    ToProvider(String),
    /// A literal value
    ToConstant(ConstantValue),
    /// A pre-existing bootstrap object identified by token
    ToInstance(String),
    /// A generated factory producing `class`; `assisted` constructor
    /// parameters are supplied by the factory caller
    ToAssistedFactory {
        class: String,
        assisted: Vec<BindingKey>,
    },
}

/// One declarative statement inside a module.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingStatement {
    Bind {
        key: BindingKey,
        target: BindTarget,
        scoping: Scoping,
    },
    /// A provider method declared on the module itself
    Provides {
        key: BindingKey,
        method: String,
        params: Vec<ParamMetadata>,
        scoping: Scoping,
    },
    Install(ModuleDecl),
    /// Make a local key visible to the enclosing scope (private modules only)
    Expose(BindingKey),
    /// Apply a scoping to a key declared in this module
    ScopeAs { key: BindingKey, scoping: Scoping },
}

/// A named set of binding declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDecl {
    name: String,
    private: bool,
    statements: Vec<BindingStatement>,
}

impl ModuleDecl {
    pub fn module(name: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            name: name.into(),
            private: false,
            statements: Vec::new(),
        }
    }

    pub fn private_module(name: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            name: name.into(),
            private: true,
            statements: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn statements(&self) -> &[BindingStatement] {
        &self.statements
    }
}

/// Accumulates the ordered statement list for one module.
pub struct ModuleBuilder {
    name: String,
    private: bool,
    statements: Vec<BindingStatement>,
}

impl ModuleBuilder {
    /// Untargetted binding: construct the key's own type.
    pub fn bind(self, key: BindingKey) -> Self {
        self.bind_in(key, Scoping::Unscoped)
    }

    pub fn bind_in(mut self, key: BindingKey, scoping: Scoping) -> Self {
        self.statements.push(BindingStatement::Bind {
            key,
            target: BindTarget::Untargetted,
            scoping,
        });
        self
    }

    pub fn bind_class(self, key: BindingKey, class: impl Into<String>) -> Self {
        self.bind_class_in(key, class, Scoping::Unscoped)
    }

    pub fn bind_class_in(
        mut self,
        key: BindingKey,
        class: impl Into<String>,
        scoping: Scoping,
    ) -> Self {
        self.statements.push(BindingStatement::Bind {
            key,
            target: BindTarget::ToClass(class.into()),
            scoping,
        });
        self
    }

    pub fn bind_key(mut self, key: BindingKey, target: BindingKey) -> Self {
        self.statements.push(BindingStatement::Bind {
            key,
            target: BindTarget::ToKey(target),
            scoping: Scoping::Unscoped,
        });
        self
    }

    pub fn bind_provider(self, key: BindingKey, provider: impl Into<String>) -> Self {
        self.bind_provider_in(key, provider, Scoping::Unscoped)
    }

    pub fn bind_provider_in(
        mut self,
        key: BindingKey,
        provider: impl Into<String>,
        scoping: Scoping,
    ) -> Self {
        self.statements.push(BindingStatement::Bind {
            key,
            target: BindTarget::ToProvider(provider.into()),
            scoping,
        });
        self
    }

    pub fn bind_constant(mut self, key: BindingKey, value: ConstantValue) -> Self {
        self.statements.push(BindingStatement::Bind {
            key,
            target: BindTarget::ToConstant(value),
            scoping: Scoping::Unscoped,
        });
        self
    }

    pub fn bind_instance(mut self, key: BindingKey, token: impl Into<String>) -> Self {
        self.statements.push(BindingStatement::Bind {
            key,
            target: BindTarget::ToInstance(token.into()),
            scoping: Scoping::Unscoped,
        });
        self
    }

    pub fn bind_assisted_factory(
        mut self,
        key: BindingKey,
        class: impl Into<String>,
        assisted: Vec<BindingKey>,
    ) -> Self {
        self.statements.push(BindingStatement::Bind {
            key,
            target: BindTarget::ToAssistedFactory {
                class: class.into(),
                assisted,
            },
            scoping: Scoping::Unscoped,
        });
        self
    }

    pub fn provides(
        self,
        key: BindingKey,
        method: impl Into<String>,
        params: Vec<ParamMetadata>,
    ) -> Self {
        self.provides_in(key, method, params, Scoping::Unscoped)
    }

    pub fn provides_in(
        mut self,
        key: BindingKey,
        method: impl Into<String>,
        params: Vec<ParamMetadata>,
        scoping: Scoping,
    ) -> Self {
        self.statements.push(BindingStatement::Provides {
            key,
            method: method.into(),
            params,
            scoping,
        });
        self
    }

    pub fn install(mut self, module: ModuleDecl) -> Self {
        self.statements.push(BindingStatement::Install(module));
        self
    }

    pub fn expose(mut self, key: BindingKey) -> Self {
        self.statements.push(BindingStatement::Expose(key));
        self
    }

    /// mark-as-singleton
    pub fn singleton(mut self, key: BindingKey) -> Self {
        self.statements.push(BindingStatement::ScopeAs {
            key,
            scoping: Scoping::Singleton,
        });
        self
    }

    /// mark-as-eager-singleton
    pub fn eager_singleton(mut self, key: BindingKey) -> Self {
        self.statements.push(BindingStatement::ScopeAs {
            key,
            scoping: Scoping::Eager,
        });
        self
    }

    pub fn build(self) -> ModuleDecl {
        ModuleDecl {
            name: self.name,
            private: self.private,
            statements: self.statements,
        }
    }
}

/// One accessor method on the injector interface.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredKey {
    pub key: BindingKey,
    pub accessor: String,
}

/// The entry-point contract: the keys an application needs constructed.
///
/// Injector interfaces may extend other injector interfaces; a child's
/// required-key set is the union of its own declarations and all ancestors'.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectorDecl {
    name: String,
    modules: Vec<ModuleDecl>,
    required: Vec<RequiredKey>,
    member_injections: Vec<String>,
    extends: Vec<InjectorDecl>,
}

impl InjectorDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: Vec::new(),
            required: Vec::new(),
            member_injections: Vec::new(),
            extends: Vec::new(),
        }
    }

    pub fn install(mut self, module: ModuleDecl) -> Self {
        self.modules.push(module);
        self
    }

    /// Declare a required key; the accessor name defaults to `get<Type>`.
    pub fn require(self, key: BindingKey) -> Self {
        let accessor = format!("get{}", key.base_type_name());
        self.require_as(key, accessor)
    }

    pub fn require_as(mut self, key: BindingKey, accessor: impl Into<String>) -> Self {
        self.required.push(RequiredKey {
            key,
            accessor: accessor.into(),
        });
        self
    }

    /// Declare an inject-members-into(existing instance) method for a type.
    pub fn inject_members(mut self, class: impl Into<String>) -> Self {
        self.member_injections.push(class.into());
        self
    }

    pub fn extends(mut self, parent: InjectorDecl) -> Self {
        self.extends.push(parent);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modules(&self) -> &[ModuleDecl] {
        &self.modules
    }

    pub fn required(&self) -> &[RequiredKey] {
        &self.required
    }

    pub fn member_injections(&self) -> &[String] {
        &self.member_injections
    }

    pub fn parents(&self) -> &[InjectorDecl] {
        &self.extends
    }
}
