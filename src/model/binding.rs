use crate::location::SourceLocation;
use crate::model::key::BindingKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a binding's product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scoping {
    /// A fresh instance on every request
    #[default]
    Unscoped,
    /// One instance per scope, created on first use
    Singleton,
    /// One instance per scope, created at injector startup
    Eager,
}

impl Scoping {
    pub fn is_eager(self) -> bool {
        matches!(self, Self::Eager)
    }
}

/// A literal value carried by a constant binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConstantValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    EnumVariant { enum_type: String, variant: String },
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "\"{}\"", v),
            Self::EnumVariant { enum_type, variant } => {
                write!(f, "{}.{}", enum_type, variant)
            }
        }
    }
}

/// The construction recipe behind a binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingKind {
    /// Delegates to another key
    Linked { target: BindingKey },
    /// Constructs a class via its injectable constructor, then injects members
    Class { class: String },
    /// Delegates construction to an injected provider class
    ProviderClass { provider: String },
    /// Delegates construction to a method on a declared module
    ProviderMethod {
        module: String,
        method: String,
        params: Vec<Dependency>,
    },
    /// A literal primitive/string/enum value
    Constant { value: ConstantValue },
    /// A single pre-existing value identified by a bootstrap token
    Instance { token: String },
    /// A factory-generated binding: `assisted` parameters are supplied by the
    /// factory caller at call time, everything else is injected lazily
    Assisted {
        class: String,
        assisted: Vec<BindingKey>,
    },
}

impl BindingKind {
    /// Short label used in diagnostics and logs.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Linked { .. } => "linked",
            Self::Class { .. } => "class",
            Self::ProviderClass { .. } => "provider class",
            Self::ProviderMethod { .. } => "provider method",
            Self::Constant { .. } => "constant",
            Self::Instance { .. } => "instance",
            Self::Assisted { .. } => "assisted factory",
        }
    }
}

/// A resolved recipe for producing the value of a key.
///
/// Bindings are created once (by the collector or the implicit creator) and
/// are immutable afterwards; dependency lists are computed by the explorer
/// and carried alongside in resolution results.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    key: BindingKey,
    kind: BindingKind,
    scoping: Scoping,
    origin: SourceLocation,
}

impl Binding {
    pub fn new(
        key: BindingKey,
        kind: BindingKind,
        scoping: Scoping,
        origin: SourceLocation,
    ) -> Self {
        Self {
            key,
            kind,
            scoping,
            origin,
        }
    }

    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }

    pub fn scoping(&self) -> Scoping {
        self.scoping
    }

    pub fn origin(&self) -> &SourceLocation {
        &self.origin
    }

    /// Same binding with a different scoping (used when a separate
    /// scope statement overrides the declaration).
    pub fn with_scoping(&self, scoping: Scoping) -> Self {
        Self {
            scoping,
            ..self.clone()
        }
    }

    pub fn is_implicit(&self) -> bool {
        self.origin.is_synthesized()
    }
}

/// A single dependency slot discovered by the explorer.
///
/// `deferred` marks provider-wrapped (or assisted) requirements whose
/// construction is lazily triggered; those edges are exempt from the
/// acyclicity requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub key: BindingKey,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deferred: bool,
}

impl Dependency {
    pub fn required(key: BindingKey) -> Self {
        Self {
            key,
            optional: false,
            deferred: false,
        }
    }

    pub fn optional(key: BindingKey) -> Self {
        Self {
            key,
            optional: true,
            deferred: false,
        }
    }

    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    /// Normalize a raw declared key: a `Provider<K>`-typed slot becomes a
    /// deferred dependency on `K` itself.
    pub fn from_declared(key: BindingKey, optional: bool) -> Self {
        match key.provided() {
            Some(inner) => Self {
                key: inner,
                optional,
                deferred: true,
            },
            None => Self {
                key,
                optional,
                deferred: false,
            },
        }
    }
}
