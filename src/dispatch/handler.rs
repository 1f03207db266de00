//! Request handlers and the errors they raise

use async_trait::async_trait;
use thiserror::Error;

use super::request::RequestContext;
use crate::error::ConfigurationError;
use crate::output::OutputDescriptor;

/// Error raised by a handler's own logic
///
/// Caught by the dispatcher and passed to [`RequestHandler::handle_error`],
/// enriched with the request it was raised for.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    error_intent: Option<String>,
    #[source]
    source: Option<anyhow::Error>,
    request: Option<String>,
    locale: Option<String>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_intent: None,
            source: None,
            request: None,
            locale: None,
        }
    }

    /// Response intent the error path should speak
    pub fn with_error_intent(mut self, intent: impl Into<String>) -> Self {
        self.error_intent = Some(intent.into());
        self
    }

    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Record the request this error was raised for, unless already set
    pub fn for_request(mut self, request: &RequestContext) -> Self {
        if self.request.is_none() {
            self.request = Some(request.kind().to_string());
        }
        if self.locale.is_none() {
            self.locale = Some(request.locale().to_string());
        }
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_intent(&self) -> Option<&str> {
        self.error_intent.as_deref()
    }

    /// Intent name of the failed request, or `launch`
    pub fn request(&self) -> Option<&str> {
        self.request.as_deref()
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }
}

impl From<ConfigurationError> for HandlerError {
    fn from(err: ConfigurationError) -> Self {
        Self::new(err.to_string()).with_source(err.into())
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err.to_string()).with_source(err)
    }
}

/// Handles one kind of request and describes the response
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Whether this handler takes the request; an error counts as "no"
    fn verify(&self, request: &RequestContext) -> anyhow::Result<bool> {
        let _ = request;
        Ok(true)
    }

    async fn handle(&self, request: &RequestContext) -> Result<OutputDescriptor, HandlerError>;

    /// Response for a failed [`RequestHandler::handle`]
    fn handle_error(
        &self,
        request: &RequestContext,
        error: &HandlerError,
    ) -> anyhow::Result<OutputDescriptor>;
}
