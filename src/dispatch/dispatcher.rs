//! Request dispatch
//!
//! ```text
//! RequestContext
//!     ↓ HandlerCatalog::select
//! RequestHandler::handle ──Err──→ RequestHandler::handle_error
//!     ↓ persist attached state models          ↓
//! OutputDescriptor ←──────────────────────────┘
//!     ↓ ResponseAssembler::assemble
//! SkillResponse
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use super::registry::HandlerCatalog;
use super::request::{InboundRequest, RequestContext};
use crate::assembler::ResponseAssembler;
use crate::error::{ConfigurationError, DispatchError, DispatchResult};
use crate::output::{Card, OutputDescriptor, StateStore, StateStoreExt};

/// Response handed back to the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillResponse {
    pub output_speech: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<String>,
    pub should_end_session: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
}

pub struct Dispatcher {
    catalog: Arc<dyn HandlerCatalog>,
    assembler: Arc<ResponseAssembler>,
}

impl Dispatcher {
    pub fn new(catalog: Arc<dyn HandlerCatalog>, assembler: Arc<ResponseAssembler>) -> Self {
        Self { catalog, assembler }
    }

    pub fn assembler(&self) -> &ResponseAssembler {
        &self.assembler
    }

    /// Select a handler, run it and assemble its output
    pub async fn dispatch(&self, request: &RequestContext) -> DispatchResult<SkillResponse> {
        let handler = self.catalog.select(request)?;

        let output = match handler.handle(request).await {
            Ok(output) => {
                persist_states(request.state(), &output);
                output
            }
            Err(err) => {
                let err = err.for_request(request);
                error!("Handler failed for {}: {:#}", request.kind(), err);
                handler
                    .handle_error(request, &err)
                    .map_err(DispatchError::Handler)?
            }
        };

        self.respond(&output, request.locale()).await
    }

    /// Decode a JSON request and dispatch it
    pub async fn dispatch_json(
        &self,
        json: &str,
        state: Arc<dyn StateStore>,
    ) -> DispatchResult<SkillResponse> {
        let inbound = InboundRequest::from_json(json)
            .map_err(|e| ConfigurationError::Invalid(format!("malformed request: {}", e)))?;
        let request = inbound.into_context(self.assembler.default_locale(), state)?;
        info!("Dispatching {} ({})", request.kind(), request.locale());
        self.dispatch(&request).await
    }

    /// Assemble an output outside of a handler
    pub async fn respond(
        &self,
        output: &OutputDescriptor,
        locale: &str,
    ) -> DispatchResult<SkillResponse> {
        let resolved = self.assembler.assemble(output, Some(locale)).await?;
        Ok(SkillResponse {
            output_speech: resolved.speech,
            reprompt: resolved.reprompt,
            should_end_session: output.should_end_session(),
            card: output.card().cloned(),
        })
    }
}

/// Write back every attached state model that offers a snapshot
fn persist_states(store: &dyn StateStore, output: &OutputDescriptor) {
    for model in output.states() {
        match store.save_state(model.as_ref()) {
            Ok(true) => debug!("Saved {} state '{}'", model.scope(), model.state_key()),
            Ok(false) => {}
            Err(e) => error!(
                "Failed to save {} state '{}': {:#}",
                model.scope(),
                model.state_key(),
                e
            ),
        }
    }
}
