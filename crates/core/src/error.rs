//! Request validation errors.

/// Result alias for request construction.
pub type Result<T> = std::result::Result<T, RequestError>;

/// A structured request could not be built from caller input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// Target path missing or blank
    #[error("target path must not be empty")]
    EmptyTarget,

    /// Target path that `aid` would read as an option
    #[error("target path must not start with '-': {0}")]
    FlagLikeTarget(String),

    /// AI action identifier outside the supported set
    #[error("unknown ai action: {0}")]
    UnknownAiAction(String),

    /// Output format identifier outside the supported set
    #[error("unknown output format: {0}")]
    UnknownFormat(String),

    /// Documentation type identifier outside the supported set
    #[error("unknown documentation type: {0}")]
    UnknownDocType(String),
}
