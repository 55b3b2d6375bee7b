use crate::location::SourceLocation;
use crate::model::BindingKey;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

/// Diagnostic code for categorization and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Numeric code (e.g., 1001, 2004)
    pub code: u16,
    /// Category prefix (e.g., "E" for error, "W" for warning)
    pub prefix: char,
}

impl DiagnosticCode {
    pub const fn new(prefix: char, code: u16) -> Self {
        Self { code, prefix }
    }

    /// Format as string (e.g., "E1001", "W5002")
    pub fn as_str(&self) -> String {
        format!("{}{:04}", self.prefix, self.code)
    }
}

/// Additional context from another declaration site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRelatedInformation {
    pub location: SourceLocation,
    pub message: String,
}

/// A diagnostic with location, severity, and the key path that led to it.
///
/// The key path is the chain of binding keys from the injector's required
/// key down to the key the diagnostic is about, so a missing dependency
/// deep in the graph is traceable to the accessor that pulled it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub location: SourceLocation,
    pub message: String,
    pub code: Option<DiagnosticCode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_path: Vec<BindingKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    pub fn error(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            location,
            message: message.into(),
            code: None,
            key_path: Vec::new(),
            related_information: Vec::new(),
        }
    }

    pub fn warning(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            location,
            message: message.into(),
            code: None,
            key_path: Vec::new(),
            related_information: Vec::new(),
        }
    }

    /// Create an error with a diagnostic code
    pub fn error_with_code(
        location: SourceLocation,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            location,
            message: message.into(),
            code: Some(code),
            key_path: Vec::new(),
            related_information: Vec::new(),
        }
    }

    /// Set the diagnostic code
    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach the request path from the injector root to the failing key
    pub fn with_key_path(mut self, path: Vec<BindingKey>) -> Self {
        self.key_path = path;
        self
    }

    /// Add related information to this diagnostic
    pub fn with_related(
        mut self,
        location: SourceLocation,
        message: impl Into<String>,
    ) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            location,
            message: message.into(),
        });
        self
    }

    /// Render the key path as `A -> B -> C` for messages and logs.
    pub fn key_path_trace(&self) -> String {
        self.key_path
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Trait for handling diagnostics
/// This allows for dependency injection and testing with mock handlers
pub trait DiagnosticHandler: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    fn error(&self, location: SourceLocation, message: &str) {
        self.report(Diagnostic::error(location, message.to_string()));
    }

    fn warning(&self, location: SourceLocation, message: &str) {
        self.report(Diagnostic::warning(location, message.to_string()));
    }

    fn has_errors(&self) -> bool;
    fn error_count(&self) -> usize;
    fn warning_count(&self) -> usize;
    fn get_diagnostics(&self) -> Vec<Diagnostic>;
}

/// Diagnostic handler that accumulates everything in memory
pub struct CollectingDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnosticHandler {
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
        }
    }
}

impl Default for CollectingDiagnosticHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticHandler for CollectingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().unwrap().push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.diagnostics
            .lock()
            .unwrap()
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error)
    }

    fn error_count(&self) -> usize {
        self.diagnostics
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }

    fn warning_count(&self) -> usize {
        self.diagnostics
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
            .count()
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().unwrap().clone()
    }
}

/// Console-based diagnostic handler that prints to stderr as it collects
pub struct ConsoleDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
    pretty: bool,
}

impl ConsoleDiagnosticHandler {
    pub fn new(pretty: bool) -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            pretty,
        }
    }
}

impl DiagnosticHandler for ConsoleDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        let level_str = match diagnostic.level {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Info => "info",
        };

        let code_str = if let Some(code) = &diagnostic.code {
            format!("[{}] ", code.as_str())
        } else {
            String::new()
        };

        if self.pretty {
            eprintln!(
                "\x1b[1m{}\x1b[0m {}at {}: {}",
                level_str, code_str, diagnostic.location, diagnostic.message
            );
        } else {
            eprintln!(
                "{} {}at {}: {}",
                level_str, code_str, diagnostic.location, diagnostic.message
            );
        }

        if !diagnostic.key_path.is_empty() {
            eprintln!("  requested via: {}", diagnostic.key_path_trace());
        }
        for related in &diagnostic.related_information {
            eprintln!("  note at {}: {}", related.location, related.message);
        }

        self.diagnostics.lock().unwrap().push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.diagnostics
            .lock()
            .unwrap()
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error)
    }

    fn error_count(&self) -> usize {
        self.diagnostics
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }

    fn warning_count(&self) -> usize {
        self.diagnostics
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
            .count()
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().unwrap().clone()
    }
}

/// Error codes for binding-resolution diagnostics
///
/// Error codes are organized by component:
/// - E1000-E1999: Declaration errors (module collector)
/// - E2000-E2999: Resolution errors
/// - E3000-E3999: Structural errors (dependency graph)
/// - E4000-E4999: Visibility errors
/// - W5000-W5999: Warnings
pub mod error_codes {
    use super::DiagnosticCode;

    // ========================================
    // Declaration Errors (E1000-E1999)
    // ========================================

    /// Duplicate binding for the same key within one scope
    pub const DUPLICATE_BINDING: DiagnosticCode = DiagnosticCode::new('E', 1001);

    /// Exposed key has no binding in the exposing scope
    pub const EXPOSE_WITHOUT_BINDING: DiagnosticCode = DiagnosticCode::new('E', 1002);

    /// Expose statement in a module that is not private
    pub const EXPOSE_OUTSIDE_PRIVATE: DiagnosticCode = DiagnosticCode::new('E', 1003);

    /// Untargetted or scope-only binding for a key that cannot be constructed
    pub const INVALID_SCOPE_TARGET: DiagnosticCode = DiagnosticCode::new('E', 1004);

    // ========================================
    // Resolution Errors (E2000-E2999)
    // ========================================

    /// No explicit or implicit binding found for a requested key
    pub const UNRESOLVED_DEPENDENCY: DiagnosticCode = DiagnosticCode::new('E', 2001);

    /// Concrete class has zero or multiple eligible constructors
    pub const NO_SUITABLE_CONSTRUCTOR: DiagnosticCode = DiagnosticCode::new('E', 2002);

    /// Metadata oracle does not know the requested type
    pub const TYPE_NOT_FOUND: DiagnosticCode = DiagnosticCode::new('E', 2003);

    /// More than one candidate binding visible at the same scope level
    pub const AMBIGUOUS_BINDING: DiagnosticCode = DiagnosticCode::new('E', 2004);

    /// Qualified key with no explicit binding (no implicit synthesis)
    pub const IMPLICIT_QUALIFIED: DiagnosticCode = DiagnosticCode::new('E', 2005);

    // ========================================
    // Structural Errors (E3000-E3999)
    // ========================================

    /// Dependency cycle with no deferred edge to break it
    pub const CIRCULAR_DEPENDENCY: DiagnosticCode = DiagnosticCode::new('E', 3001);

    /// Dependency cycle made up entirely of eager singletons
    pub const EAGER_SINGLETON_CYCLE: DiagnosticCode = DiagnosticCode::new('E', 3002);

    // ========================================
    // Visibility Errors (E4000-E4999)
    // ========================================

    /// Reference to a private-scope binding that was not exposed
    pub const BINDING_NOT_VISIBLE: DiagnosticCode = DiagnosticCode::new('E', 4001);

    // ========================================
    // Warnings (W5000-W5999)
    // ========================================

    /// Optional dependency could not be resolved and degraded to absent
    pub const OPTIONAL_UNSATISFIED: DiagnosticCode = DiagnosticCode::new('W', 5001);

    /// Explicit binding never reached from the injector's required keys
    pub const UNUSED_BINDING: DiagnosticCode = DiagnosticCode::new('W', 5002);
}
