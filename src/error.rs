//! Error types for phrase loading, template resolution and dispatch
//!
//! Each concern has its own thiserror enum; `DispatchError` is the single
//! error a caller of the dispatcher has to deal with.

use thiserror::Error;

/// Errors raised while locating or parsing a phrase bank document
#[derive(Error, Debug)]
pub enum PhraseBankError {
    #[error("Phrase bank resource not found: {path}")]
    NotFound { path: String },

    #[error("Phrase bank {path} is not well-formed: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read phrase bank {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch phrase bank {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Refusing to build a phrase bank path for locale '{0}'")]
    InvalidLocale(String),
}

/// Errors raised while turning raw phrases into final text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Phrase reference '${{{name}}}' could not be resolved")]
    UnresolvedReference { name: String },

    #[error("Cyclic phrase reference: {}", chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    #[error("Phrase reference '${{{name}}}' exceeds maximum expansion depth {max_depth}")]
    DepthExceeded { name: String, max_depth: usize },

    #[error("Placeholder {{{name}}} in phrase for '{intent}' has no corresponding slot")]
    UnresolvedSlot { name: String, intent: String },

    #[error("No utterance for intent '{intent}' in locale {locale}")]
    NoUtterance { intent: String, locale: String },
}

/// Invalid construction or registration input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Intent name must not be blank")]
    BlankIntentName,

    #[error("Locale must not be blank")]
    BlankLocale,

    #[error("Invalid locale '{0}': expected a language tag such as en-US")]
    InvalidLocale(String),

    #[error("Unknown output format '{0}'")]
    UnknownOutputFormat(String),

    #[error("Invalid resource location '{0}': must be non-blank and end with .yml")]
    InvalidResourceLocation(String),

    #[error("No handler registered for {0}")]
    MissingRegistration(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error surfaced for a failed request
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("No eligible handler found for {intent}")]
    HandlerNotFound { intent: String },

    #[error("Phrase bank error: {0}")]
    PhraseBank(#[from] PhraseBankError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Handler error path failed: {0}")]
    Handler(#[source] anyhow::Error),
}

impl DispatchError {
    /// True for failures caused by something missing: a handler, a phrase
    /// bank resource or the source of a placeholder
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DispatchError::HandlerNotFound { .. }
                | DispatchError::PhraseBank(PhraseBankError::NotFound { .. })
                | DispatchError::Resolution(ResolutionError::UnresolvedSlot { .. })
        )
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
