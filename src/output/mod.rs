//! Output side of a request: descriptors, slots, formats and state models

mod descriptor;
mod format;
mod resolver;
mod slot;
mod state;

pub use descriptor::{Card, OutputBuilder, OutputDescriptor};
pub use format::{OutputFormat, SlotValue, DATE_PATTERN};
pub use resolver::{resolve_slot, ResolvedSlot, SlotOrigin};
pub use slot::OutputSlot;
pub use state::{InMemoryStateStore, StateModel, StateScope, StateStore, StateStoreExt};
