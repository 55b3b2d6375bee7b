use serde::{Deserialize, Serialize};
use std::fmt;

/// A type descriptor appearing in binding keys and dependency slots.
///
/// Provider wrappers are represented structurally so the explorer can
/// distinguish a deferred requirement on `T` from a direct one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeRef {
    /// A named class or interface type
    Named { name: String },
    /// A deferred-provider wrapper around another type
    Provider { of: Box<TypeRef> },
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }

    pub fn provider(of: TypeRef) -> Self {
        Self::Provider { of: Box::new(of) }
    }

    /// The named type at the bottom of any provider nesting.
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named { name } => name,
            Self::Provider { of } => of.base_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name } => write!(f, "{}", name),
            Self::Provider { of } => write!(f, "Provider<{}>", of),
        }
    }
}

/// Identifies an injectable dependency: a type plus an optional qualifier.
///
/// Two keys are equal iff both the type and the qualifier match exactly.
/// Keys are immutable and used as map keys throughout resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingKey {
    type_ref: TypeRef,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    qualifier: Option<String>,
}

impl BindingKey {
    pub fn new(type_ref: TypeRef, qualifier: Option<String>) -> Self {
        Self {
            type_ref,
            qualifier,
        }
    }

    /// Unqualified key for a named type
    pub fn of_type(name: impl Into<String>) -> Self {
        Self::new(TypeRef::named(name), None)
    }

    /// Qualified key for a named type
    pub fn named(name: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self::new(TypeRef::named(name), Some(qualifier.into()))
    }

    /// Key for a deferred provider of this key's type, same qualifier
    pub fn provider_of(&self) -> Self {
        Self::new(
            TypeRef::provider(self.type_ref.clone()),
            self.qualifier.clone(),
        )
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }

    pub fn is_provider(&self) -> bool {
        matches!(self.type_ref, TypeRef::Provider { .. })
    }

    /// Unwrap one provider level, keeping the qualifier.
    ///
    /// Returns `None` when the key is not provider-wrapped.
    pub fn provided(&self) -> Option<BindingKey> {
        match &self.type_ref {
            TypeRef::Provider { of } => {
                Some(Self::new((**of).clone(), self.qualifier.clone()))
            }
            TypeRef::Named { .. } => None,
        }
    }

    /// The named type this key ultimately resolves around.
    pub fn base_type_name(&self) -> &str {
        self.type_ref.base_name()
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "@\"{}\" {}", q, self.type_ref),
            None => write!(f, "{}", self.type_ref),
        }
    }
}
