//! Slot Formatter
//!
//! Maps a typed slot value and an output format onto the SSML fragment that
//! is substituted into a phrase. Every format wraps the value exactly once.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Calendar format applied to date-typed values before wrapping
pub const DATE_PATTERN: &str = "%Y%m%d";

/// How a slot value is rendered in speech markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Value as plain text
    #[default]
    Text,
    /// Value is a URL to an audio file
    Audio,
    /// Value is an IPA phoneme string
    PhonemeIpa,
    /// Value is an X-SAMPA phoneme string
    PhonemeXSampa,
    SpellOut,
    Number,
    Ordinal,
    Digits,
    Fraction,
    Unit,
    Date,
    Time,
    Telephone,
    Address,
    Noun,
    VerbPresent,
    VerbPast,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 17] = [
        OutputFormat::Text,
        OutputFormat::Audio,
        OutputFormat::PhonemeIpa,
        OutputFormat::PhonemeXSampa,
        OutputFormat::SpellOut,
        OutputFormat::Number,
        OutputFormat::Ordinal,
        OutputFormat::Digits,
        OutputFormat::Fraction,
        OutputFormat::Unit,
        OutputFormat::Date,
        OutputFormat::Time,
        OutputFormat::Telephone,
        OutputFormat::Address,
        OutputFormat::Noun,
        OutputFormat::VerbPresent,
        OutputFormat::VerbPast,
    ];

    /// Kebab-case name used in config files and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Audio => "audio",
            OutputFormat::PhonemeIpa => "phoneme-ipa",
            OutputFormat::PhonemeXSampa => "phoneme-x-sampa",
            OutputFormat::SpellOut => "spell-out",
            OutputFormat::Number => "number",
            OutputFormat::Ordinal => "ordinal",
            OutputFormat::Digits => "digits",
            OutputFormat::Fraction => "fraction",
            OutputFormat::Unit => "unit",
            OutputFormat::Date => "date",
            OutputFormat::Time => "time",
            OutputFormat::Telephone => "telephone",
            OutputFormat::Address => "address",
            OutputFormat::Noun => "noun",
            OutputFormat::VerbPresent => "verb-present",
            OutputFormat::VerbPast => "verb-past",
        }
    }

    /// Markup placed before and after the value
    fn markup(&self) -> (&'static str, &'static str) {
        match self {
            OutputFormat::Text => ("", ""),
            OutputFormat::Audio => ("<audio src=\"", "\" /> "),
            OutputFormat::PhonemeIpa => ("<phoneme alphabet=\"ipa\" ph=\"", "\"></phoneme>"),
            OutputFormat::PhonemeXSampa => {
                ("<phoneme alphabet=\"x-sampa\" ph=\"", "\"></phoneme>")
            }
            OutputFormat::Noun => ("<w role=\"ivona:NN\">", "</w>"),
            OutputFormat::VerbPresent => ("<w role=\"ivona:VB\">", "</w>"),
            OutputFormat::VerbPast => ("<w role=\"ivona:VBD\">", "</w>"),
            OutputFormat::SpellOut => ("<say-as interpret-as=\"spell-out\">", "</say-as>"),
            OutputFormat::Number => ("<say-as interpret-as=\"number\">", "</say-as>"),
            OutputFormat::Ordinal => ("<say-as interpret-as=\"ordinal\">", "</say-as>"),
            OutputFormat::Digits => ("<say-as interpret-as=\"digits\">", "</say-as>"),
            OutputFormat::Fraction => ("<say-as interpret-as=\"fraction\">", "</say-as>"),
            OutputFormat::Unit => ("<say-as interpret-as=\"unit\">", "</say-as>"),
            OutputFormat::Date => ("<say-as interpret-as=\"date\">", "</say-as>"),
            OutputFormat::Time => ("<say-as interpret-as=\"time\">", "</say-as>"),
            OutputFormat::Telephone => ("<say-as interpret-as=\"telephone\">", "</say-as>"),
            OutputFormat::Address => ("<say-as interpret-as=\"address\">", "</say-as>"),
        }
    }

    /// Render a value as SSML in this format
    pub fn apply(&self, value: &SlotValue) -> String {
        let (open, close) = self.markup();
        format!("{}{}{}", open, value.spoken_form(), close)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        OutputFormat::ALL
            .iter()
            .copied()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| ConfigurationError::UnknownOutputFormat(s.to_string()))
    }
}

/// A typed value carried by an output slot
///
/// Serialized with its variant spelled out, `{type: text, value: "007"}`, so a
/// string never comes back as a number or a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SlotValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl SlotValue {
    /// The string substituted into the markup template
    pub fn spoken_form(&self) -> String {
        match self {
            SlotValue::Text(s) => s.clone(),
            SlotValue::Integer(i) => i.to_string(),
            SlotValue::Float(x) => x.to_string(),
            SlotValue::Bool(b) => b.to_string(),
            SlotValue::Decimal(d) => d.normalize().to_string(),
            SlotValue::Date(d) => d.format(DATE_PATTERN).to_string(),
            SlotValue::DateTime(dt) => dt.format(DATE_PATTERN).to_string(),
        }
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spoken_form())
    }
}

impl From<&str> for SlotValue {
    fn from(v: &str) -> Self {
        SlotValue::Text(v.to_string())
    }
}

impl From<String> for SlotValue {
    fn from(v: String) -> Self {
        SlotValue::Text(v)
    }
}

impl From<i64> for SlotValue {
    fn from(v: i64) -> Self {
        SlotValue::Integer(v)
    }
}

impl From<i32> for SlotValue {
    fn from(v: i32) -> Self {
        SlotValue::Integer(v.into())
    }
}

impl From<u32> for SlotValue {
    fn from(v: u32) -> Self {
        SlotValue::Integer(v.into())
    }
}

impl From<f64> for SlotValue {
    fn from(v: f64) -> Self {
        SlotValue::Float(v)
    }
}

impl From<bool> for SlotValue {
    fn from(v: bool) -> Self {
        SlotValue::Bool(v)
    }
}

impl From<Decimal> for SlotValue {
    fn from(v: Decimal) -> Self {
        SlotValue::Decimal(v)
    }
}

impl From<NaiveDate> for SlotValue {
    fn from(v: NaiveDate) -> Self {
        SlotValue::Date(v)
    }
}

impl From<NaiveDateTime> for SlotValue {
    fn from(v: NaiveDateTime) -> Self {
        SlotValue::DateTime(v)
    }
}
