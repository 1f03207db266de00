//! Output slots: named, formatted values that fill `{placeholders}`

use serde::{Deserialize, Serialize};

use super::format::{OutputFormat, SlotValue};

/// A named value plus the format it is spoken in
///
/// Used both for slots put directly on an output and for the tagged fields a
/// state model exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSlot {
    pub name: String,
    pub value: SlotValue,
    #[serde(default)]
    pub format: OutputFormat,
}

impl OutputSlot {
    /// Slot rendered as plain text
    pub fn new(name: impl Into<String>, value: impl Into<SlotValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            format: OutputFormat::Text,
        }
    }

    pub fn format_as(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// SSML fragment for this slot
    pub fn ssml(&self) -> String {
        self.format.apply(&self.value)
    }
}
