//! Voice Reply - intent dispatch and phrase-bank response templating
//!
//! Turns a conversational request (an intent with named slots) into spoken
//! SSML, using per-locale phrase banks instead of hard-coded strings.
//!
//! ## Flow
//! Request -> Handler Registry (priority + verify) -> Handler -> OutputDescriptor
//! -> Response Assembler (phrase bank, references, alternations, slots) -> SSML
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voice_reply::{
//!     OutputDescriptor, OutputFormat, ResponseAssembler, StaticPhraseSource,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = StaticPhraseSource::new("calc")
//!     .with_document("en-US", "Add: [[\"{a} plus {b} is {result}\"]]");
//! let assembler = ResponseAssembler::new(Arc::new(source));
//!
//! let output = OutputDescriptor::tell("Add")
//!     .put_slot("a", 5)
//!     .put_slot("b", 3)
//!     .put_slot_formatted("result", 8, OutputFormat::Number)
//!     .build()?;
//! let response = assembler.assemble(&output, Some("en-US")).await?;
//! assert_eq!(
//!     response.speech,
//!     "<speak>5 plus 3 is <say-as interpret-as=\"number\">8</say-as></speak>"
//! );
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Engine configuration and logging setup
pub mod config;
pub mod telemetry;

// Phrase bank loading and templating
pub mod phrases;
pub mod templates;

// Output side: descriptors, slots, formats, state
pub mod output;

// Response assembly and intent dispatch
pub mod assembler;
pub mod dispatch;

pub use assembler::{ResolvedResponse, ResponseAssembler, DEFAULT_LOCALE};
pub use config::{EngineConfig, PhraseSourceConfig};
pub use dispatch::{
    BuiltInIntent, Dispatcher, HandlerCatalog, HandlerDescriptor, HandlerError, HandlerRegistry,
    InboundRequest, IntentTarget, RequestContext, RequestHandler, RequestKind, SkillResponse,
};
pub use error::{
    ConfigurationError, DispatchError, DispatchResult, PhraseBankError, ResolutionError,
};
pub use output::{
    Card, InMemoryStateStore, OutputBuilder, OutputDescriptor, OutputFormat, OutputSlot,
    SlotValue, StateModel, StateScope, StateStore, StateStoreExt,
};
pub use phrases::{
    validate_locale, FilePhraseSource, HttpPhraseSource, PhraseBank, PhraseBankCache,
    PhraseSource, ResourceLocation, StaticPhraseSource,
};
pub use templates::{PhrasePicker, RandomPicker, ScriptedPicker, TemplateResolver};
