//! Phrase templating: references, alternations and slot placeholders

mod picker;
mod resolver;

pub use picker::{pick_from, PhrasePicker, RandomPicker, ScriptedPicker};
pub use resolver::{TemplateResolver, DEFAULT_MAX_REFERENCE_DEPTH};
