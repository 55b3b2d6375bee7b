use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a binding declaration came from.
///
/// Declarations are statement lists rather than source text, so a location
/// is the owning declaration plus a statement index instead of a line/column
/// span. Synthesized bindings record the scope that requested them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum SourceLocation {
    /// A statement inside a declared module
    Declared { module: String, statement: usize },
    /// The injector interface itself (required keys, member injection)
    Injector { injector: String },
    /// A just-in-time binding synthesized during resolution
    Synthesized { scope: String },
}

impl SourceLocation {
    pub fn declared(module: impl Into<String>, statement: usize) -> Self {
        Self::Declared {
            module: module.into(),
            statement,
        }
    }

    pub fn injector(name: impl Into<String>) -> Self {
        Self::Injector {
            injector: name.into(),
        }
    }

    pub fn synthesized(scope: impl Into<String>) -> Self {
        Self::Synthesized {
            scope: scope.into(),
        }
    }

    /// Statement index for declaration-order tie-breaking.
    ///
    /// Non-declared locations sort after every declared statement.
    pub fn statement_index(&self) -> usize {
        match self {
            Self::Declared { statement, .. } => *statement,
            _ => usize::MAX,
        }
    }

    /// True for bindings that were synthesized rather than declared.
    pub fn is_synthesized(&self) -> bool {
        matches!(self, Self::Synthesized { .. })
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared { module, statement } => {
                write!(f, "{} (statement {})", module, statement)
            }
            Self::Injector { injector } => write!(f, "injector {}", injector),
            Self::Synthesized { scope } => write!(f, "synthesized in {}", scope),
        }
    }
}
