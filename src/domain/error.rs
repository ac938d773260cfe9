//! Error types for example resolution and provider registration

use thiserror::Error;

/// Errors raised while resolving a descriptor into an example value
#[derive(Debug, Error)]
pub enum MockError {
    /// The resolver met a shape it cannot synthesize
    #[error("Unsupported schema: {0}")]
    UnsupportedSchema(String),

    /// A script provider declares a parameter count other than 0 or 1
    #[error("Provider for '{type_key}' takes {arity} parameters, expected 0 or 1")]
    ProviderArity { type_key: String, arity: usize },

    /// A provider failed while generating a value
    #[error("Provider for '{type_key}' failed: {reason}")]
    Provider { type_key: String, reason: String },

    /// Nesting exceeded the resolver's depth limit
    #[error("Recursion limit of {0} exceeded while resolving schema")]
    RecursionLimit(usize),

    /// A JSON Schema document could not be converted
    #[error("Invalid JSON schema: {0}")]
    InvalidSchema(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MockError {
    /// Whether this error only means "no example available".
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedSchema(_))
    }

    /// Short label used for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnsupportedSchema(_) => "unsupported_schema",
            Self::ProviderArity { .. } => "provider_arity",
            Self::Provider { .. } => "provider",
            Self::RecursionLimit(_) => "recursion_limit",
            Self::InvalidSchema(_) => "invalid_schema",
            Self::Json(_) => "json",
        }
    }
}

/// Misuse of the provider registry, fatal at setup time
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("'{0}' is not a type token")]
    NotAType(String),

    #[error("Record types cannot be registered; their fields are resolved individually")]
    RecordType,

    #[error("The null type is builtin and cannot be overridden")]
    NullType,

    #[error("Invalid provider script for '{type_key}': {reason}")]
    Script { type_key: String, reason: String },

    #[error("Invalid provider for '{type_key}': {reason}")]
    InvalidProvider { type_key: String, reason: String },
}
