//! Handler Registry & Selector
//!
//! Handlers are registered once at startup as [`HandlerDescriptor`]s. For each
//! request the selector gathers the descriptors serving it, orders them by
//! priority (highest first) and returns the first handler whose `verify`
//! accepts the request.
//!
//! ## Example
//!
//! ```ignore
//! let registry = HandlerRegistry::new()
//!     .with_handler(HandlerDescriptor::new("add", || AddHandler).for_intent("Add"))?
//!     .with_handler(
//!         HandlerDescriptor::new("add-big", || BigAddHandler)
//!             .for_intent("Add")
//!             .with_priority(10),
//!     )?;
//! ```
//!
//! Handlers with equal priority keep registration order. This is not a
//! contract; give competing handlers distinct priorities.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::handler::RequestHandler;
use super::request::{BuiltInIntent, RequestContext, RequestKind};
use crate::error::{ConfigurationError, DispatchError, DispatchResult};

/// What a handler responds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentTarget {
    Launch,
    BuiltIn(BuiltInIntent),
    Custom(String),
}

impl IntentTarget {
    pub fn matches(&self, kind: &RequestKind) -> bool {
        match (self, kind) {
            (IntentTarget::Launch, RequestKind::Launch) => true,
            (IntentTarget::BuiltIn(b), RequestKind::Intent(name)) => name == b.intent_name(),
            (IntentTarget::Custom(intent), RequestKind::Intent(name)) => intent == name,
            _ => false,
        }
    }
}

impl fmt::Display for IntentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentTarget::Launch => f.write_str("launch"),
            IntentTarget::BuiltIn(b) => write!(f, "{}", b),
            IntentTarget::Custom(name) => f.write_str(name),
        }
    }
}

/// Builds a fresh handler per request
pub type HandlerFactory = Arc<dyn Fn() -> Box<dyn RequestHandler> + Send + Sync>;

/// Registration entry for one handler
#[derive(Clone)]
pub struct HandlerDescriptor {
    name: String,
    targets: Vec<IntentTarget>,
    priority: i32,
    factory: HandlerFactory,
}

impl HandlerDescriptor {
    pub fn new<H, F>(name: impl Into<String>, factory: F) -> Self
    where
        H: RequestHandler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            targets: Vec::new(),
            priority: 0,
            factory: Arc::new(move || Box::new(factory()) as Box<dyn RequestHandler>),
        }
    }

    pub fn for_intent(mut self, intent_name: impl Into<String>) -> Self {
        self.targets.push(IntentTarget::Custom(intent_name.into()));
        self
    }

    pub fn for_built_in(mut self, intent: BuiltInIntent) -> Self {
        self.targets.push(IntentTarget::BuiltIn(intent));
        self
    }

    pub fn for_launch(mut self) -> Self {
        self.targets.push(IntentTarget::Launch);
        self
    }

    /// Higher wins; defaults to 0
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn targets(&self) -> &[IntentTarget] {
        &self.targets
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn serves(&self, kind: &RequestKind) -> bool {
        self.targets.iter().any(|t| t.matches(kind))
    }

    pub fn construct(&self) -> Box<dyn RequestHandler> {
        (self.factory)()
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.targets.is_empty() {
            return Err(ConfigurationError::MissingRegistration(format!(
                "handler '{}' (no intent targets)",
                self.name
            )));
        }
        for target in &self.targets {
            if let IntentTarget::Custom(intent) = target {
                if intent.trim().is_empty() {
                    return Err(ConfigurationError::BlankIntentName);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("targets", &self.targets)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Source of handler descriptors per request
pub trait HandlerCatalog: Send + Sync {
    /// Descriptors serving a request kind, in registration order
    fn candidates(&self, kind: &RequestKind) -> Vec<&HandlerDescriptor>;

    /// Highest-priority eligible handler for a request
    fn select(&self, request: &RequestContext) -> DispatchResult<Box<dyn RequestHandler>> {
        let mut candidates = self.candidates(request.kind());
        let not_found = || DispatchError::HandlerNotFound {
            intent: request.kind().to_string(),
        };

        if request.is_launch() {
            let first = candidates.first().ok_or_else(not_found)?;
            if candidates.len() > 1 {
                warn!(
                    "{} launch handlers registered, using '{}'",
                    candidates.len(),
                    first.name()
                );
            }
            return Ok(first.construct());
        }

        candidates.sort_by(|a, b| b.priority().cmp(&a.priority()));

        for descriptor in candidates {
            let handler = descriptor.construct();
            match handler.verify(request) {
                Ok(true) => {
                    debug!(
                        "Selected handler '{}' (priority {}) for {}",
                        descriptor.name(),
                        descriptor.priority(),
                        request.kind()
                    );
                    return Ok(handler);
                }
                Ok(false) => debug!(
                    "Handler '{}' declined {}",
                    descriptor.name(),
                    request.kind()
                ),
                Err(e) => warn!(
                    "Handler '{}' failed to verify {}, skipping: {}",
                    descriptor.name(),
                    request.kind(),
                    e
                ),
            }
        }

        Err(not_found())
    }
}

/// Handler descriptors registered at startup
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    descriptors: Vec<HandlerDescriptor>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: HandlerDescriptor) -> Result<(), ConfigurationError> {
        descriptor.validate()?;
        debug!(
            "Registered handler '{}' for {:?}",
            descriptor.name(),
            descriptor.targets()
        );
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn with_handler(mut self, descriptor: HandlerDescriptor) -> Result<Self, ConfigurationError> {
        self.register(descriptor)?;
        Ok(self)
    }

    pub fn descriptors(&self) -> &[HandlerDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl HandlerCatalog for HandlerRegistry {
    fn candidates(&self, kind: &RequestKind) -> Vec<&HandlerDescriptor> {
        self.descriptors.iter().filter(|d| d.serves(kind)).collect()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.descriptors.iter()).finish()
    }
}
