use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("malformed injector declaration: {0}")]
    MalformedDeclaration(String),

    #[error("private module '{0}' installed more than once")]
    DuplicateInstall(String),

    #[error("binding resolution failed with {0} errors")]
    ResolutionFailed(usize),

    #[error("plan serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("type not found: {0}")]
    TypeNotFound(String),
}
