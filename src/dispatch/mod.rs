//! Intent dispatch: request context, handlers, selection and response

mod dispatcher;
mod handler;
mod registry;
mod request;

pub use dispatcher::{Dispatcher, SkillResponse};
pub use handler::{HandlerError, RequestHandler};
pub use registry::{HandlerCatalog, HandlerDescriptor, HandlerFactory, HandlerRegistry, IntentTarget};
pub use request::{BuiltInIntent, InboundKind, InboundRequest, RequestContext, RequestKind};
