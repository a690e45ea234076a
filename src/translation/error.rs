//! Errors for query translation.

/// Translation error. Any error aborts the run; no partial statement is
/// returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranslationError {
    #[error("Operator '{0}' is not supported")]
    UnsupportedOperator(String),

    #[error("Type '{0}' has no SQL mapping")]
    UnsupportedType(String),

    #[error("Member '{member}' not found on '{entity}'")]
    UnresolvedMember { entity: String, member: String },

    #[error("Entity '{0}' not found in schema")]
    UnknownEntity(String),

    #[error("Parameter '{0}' is not bound")]
    UnboundParameter(String),

    #[error("Malformed projection: {0}")]
    MalformedProjection(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Internal error, translation stack out of balance: {0}")]
    InternalStackInvariantViolation(String),
}

/// Result alias for translation.
pub type TranslationResult<T> = Result<T, TranslationError>;
