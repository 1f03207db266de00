//! Request Context
//!
//! What a handler sees of an inbound request: launch or intent, the locale,
//! the slot values the user filled and the state accessor. Immutable once
//! built.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rphonetic::{Cologne, DoubleMetaphone, Encoder};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::output::{InMemoryStateStore, StateStore};
use crate::phrases::validate_locale;

/// Platform intents every skill may receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltInIntent {
    Help,
    Next,
    No,
    Repeat,
    StartOver,
    Cancel,
    Stop,
    Yes,
}

impl BuiltInIntent {
    pub const ALL: [BuiltInIntent; 8] = [
        BuiltInIntent::Help,
        BuiltInIntent::Next,
        BuiltInIntent::No,
        BuiltInIntent::Repeat,
        BuiltInIntent::StartOver,
        BuiltInIntent::Cancel,
        BuiltInIntent::Stop,
        BuiltInIntent::Yes,
    ];

    /// Intent name as sent by the platform
    pub fn intent_name(&self) -> &'static str {
        match self {
            BuiltInIntent::Help => "AMAZON.HelpIntent",
            BuiltInIntent::Next => "AMAZON.NextIntent",
            BuiltInIntent::No => "AMAZON.NoIntent",
            BuiltInIntent::Repeat => "AMAZON.RepeatIntent",
            BuiltInIntent::StartOver => "AMAZON.StartOverIntent",
            BuiltInIntent::Cancel => "AMAZON.CancelIntent",
            BuiltInIntent::Stop => "AMAZON.StopIntent",
            BuiltInIntent::Yes => "AMAZON.YesIntent",
        }
    }

    pub fn from_intent_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.intent_name() == name)
    }
}

impl fmt::Display for BuiltInIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.intent_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Session opened without an intent
    Launch,
    Intent(String),
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Launch => f.write_str("launch"),
            RequestKind::Intent(name) => f.write_str(name),
        }
    }
}

/// One inbound request as seen by handlers
#[derive(Clone)]
pub struct RequestContext {
    kind: RequestKind,
    locale: String,
    slots: HashMap<String, Option<String>>,
    state: Arc<dyn StateStore>,
}

impl RequestContext {
    pub fn new(kind: RequestKind, locale: impl Into<String>) -> Self {
        Self {
            kind,
            locale: locale.into(),
            slots: HashMap::new(),
            state: Arc::new(InMemoryStateStore::new()),
        }
    }

    pub fn launch(locale: impl Into<String>) -> Self {
        Self::new(RequestKind::Launch, locale)
    }

    pub fn intent(name: impl Into<String>, locale: impl Into<String>) -> Self {
        Self::new(RequestKind::Intent(name.into()), locale)
    }

    pub fn with_slot(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.insert(name.into(), Some(value.into()));
        self
    }

    /// Slot the platform sent without a value
    pub fn with_empty_slot(mut self, name: impl Into<String>) -> Self {
        self.slots.insert(name.into(), None);
        self
    }

    pub fn with_state(mut self, state: Arc<dyn StateStore>) -> Self {
        self.state = state;
        self
    }

    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    pub fn is_launch(&self) -> bool {
        self.kind == RequestKind::Launch
    }

    /// Intent name, `None` for launch requests
    pub fn intent_name(&self) -> Option<&str> {
        match &self.kind {
            RequestKind::Intent(name) => Some(name.as_str()),
            RequestKind::Launch => None,
        }
    }

    pub fn built_in(&self) -> Option<BuiltInIntent> {
        self.intent_name().and_then(BuiltInIntent::from_intent_name)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn state(&self) -> &dyn StateStore {
        self.state.as_ref()
    }

    pub fn state_handle(&self) -> Arc<dyn StateStore> {
        self.state.clone()
    }

    // ========================================================================
    // SLOT HELPERS
    // ========================================================================

    /// Slot was sent, with or without a value
    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn slot_value(&self, name: &str) -> Option<&str> {
        self.slots.get(name).and_then(|v| v.as_deref())
    }

    pub fn has_slot_not_blank(&self, name: &str) -> bool {
        self.slot_value(name).is_some_and(|v| !v.trim().is_empty())
    }

    pub fn has_slot_is_number(&self, name: &str) -> bool {
        self.slot_value(name)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .is_some_and(f64::is_finite)
    }

    /// `true`, `yes`, `on`, `y` and `t` in any case
    pub fn has_slot_is_true(&self, name: &str) -> bool {
        self.slot_value(name).is_some_and(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "on" | "y" | "t"
            )
        })
    }

    /// Exact match; a missing value only equals `None`
    pub fn has_slot_is_equal(&self, name: &str, value: Option<&str>) -> bool {
        self.slot_value(name) == value
    }

    /// Parsed slot value, `None` if missing or unparsable
    pub fn slot_as<T: FromStr>(&self, name: &str) -> Option<T> {
        self.slot_value(name).and_then(|v| v.trim().parse().ok())
    }

    /// Non-blank slot whose primary Double Metaphone code matches `value`
    pub fn has_slot_is_double_metaphone_equal(&self, name: &str, value: &str) -> bool {
        let encoder = DoubleMetaphone::default();
        self.has_slot_encoded_equal(name, value, &encoder)
    }

    /// Non-blank slot whose Cologne phonetic code matches `value`
    pub fn has_slot_is_cologne_equal(&self, name: &str, value: &str) -> bool {
        self.has_slot_encoded_equal(name, value, &Cologne)
    }

    /// Cologne phonetics for German requests, Double Metaphone otherwise
    pub fn has_slot_is_phonetically_equal(&self, name: &str, value: &str) -> bool {
        if self.is_german() {
            self.has_slot_is_cologne_equal(name, value)
        } else {
            self.has_slot_is_double_metaphone_equal(name, value)
        }
    }

    fn has_slot_encoded_equal<E: Encoder>(&self, name: &str, value: &str, encoder: &E) -> bool {
        match self.slot_value(name) {
            Some(slot) if !slot.trim().is_empty() => {
                encoder.encode(slot.trim()) == encoder.encode(value.trim())
            }
            _ => false,
        }
    }

    fn is_german(&self) -> bool {
        self.locale
            .split('-')
            .next()
            .is_some_and(|language| language.eq_ignore_ascii_case("de"))
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("kind", &self.kind)
            .field("locale", &self.locale)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// INBOUND REQUEST
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundKind {
    #[serde(alias = "LaunchRequest")]
    Launch,
    #[serde(alias = "IntentRequest")]
    Intent,
}

/// JSON shape of an inbound request
///
/// ```json
/// {"type": "intent", "locale": "en-US", "intent": "Add", "slots": {"a": "5", "b": "3"}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundRequest {
    #[serde(rename = "type")]
    pub kind: InboundKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default)]
    pub slots: HashMap<String, Option<String>>,
}

impl InboundRequest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Request context with the default locale applied when none was sent
    pub fn into_context(
        self,
        default_locale: &str,
        state: Arc<dyn StateStore>,
    ) -> Result<RequestContext, ConfigurationError> {
        let kind = match self.kind {
            InboundKind::Launch => RequestKind::Launch,
            InboundKind::Intent => match self.intent {
                Some(name) if !name.trim().is_empty() => RequestKind::Intent(name),
                _ => return Err(ConfigurationError::BlankIntentName),
            },
        };

        let locale = self
            .locale
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| default_locale.to_string());
        validate_locale(&locale)?;

        Ok(RequestContext {
            kind,
            locale,
            slots: self.slots,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RequestContext {
        RequestContext::intent("Add", "en-US")
            .with_slot("a", "5")
            .with_slot("b", " 3.5 ")
            .with_slot("name", "  ")
            .with_slot("confirm", "Yes")
            .with_empty_slot("c")
    }

    #[test]
    fn test_slot_presence() {
        let ctx = ctx();
        assert!(ctx.has_slot("a"));
        assert!(ctx.has_slot("c"));
        assert!(!ctx.has_slot("d"));
        assert_eq!(ctx.slot_value("c"), None);
        assert!(ctx.has_slot_not_blank("a"));
        assert!(!ctx.has_slot_not_blank("name"));
        assert!(!ctx.has_slot_not_blank("c"));
    }

    #[test]
    fn test_slot_predicates() {
        let ctx = ctx();
        assert!(ctx.has_slot_is_number("a"));
        assert!(ctx.has_slot_is_number("b"));
        assert!(!ctx.has_slot_is_number("name"));
        assert!(ctx.has_slot_is_true("confirm"));
        assert!(!ctx.has_slot_is_true("a"));
        assert!(ctx.has_slot_is_equal("a", Some("5")));
        assert!(!ctx.has_slot_is_equal("a", Some("05")));
        assert!(ctx.has_slot_is_equal("c", None));
    }

    #[test]
    fn test_double_metaphone_equal() {
        let ctx = RequestContext::intent("Answer", "en-US")
            .with_slot("word", "value")
            .with_slot("flag", "true")
            .with_slot("blank", "")
            .with_empty_slot("none");
        assert!(ctx.has_slot_is_double_metaphone_equal("word", "valui"));
        assert!(!ctx.has_slot_is_double_metaphone_equal("word", "not-value"));
        assert!(ctx.has_slot_is_double_metaphone_equal("flag", "drew"));
        assert!(!ctx.has_slot_is_double_metaphone_equal("flag", "false"));
        assert!(!ctx.has_slot_is_double_metaphone_equal("blank", ""));
        assert!(!ctx.has_slot_is_double_metaphone_equal("none", "value"));
        assert!(!ctx.has_slot_is_double_metaphone_equal("missing", "value"));
    }

    #[test]
    fn test_cologne_equal() {
        let ctx = RequestContext::intent("Answer", "de-DE")
            .with_slot("word", "value")
            .with_slot("flag", "true")
            .with_slot("blank", "")
            .with_empty_slot("none");
        assert!(ctx.has_slot_is_cologne_equal("word", "walu"));
        assert!(!ctx.has_slot_is_cologne_equal("word", "not-value"));
        assert!(ctx.has_slot_is_cologne_equal("flag", "truhe"));
        assert!(!ctx.has_slot_is_cologne_equal("flag", "false"));
        assert!(!ctx.has_slot_is_cologne_equal("blank", ""));
        assert!(!ctx.has_slot_is_cologne_equal("none", "value"));
    }

    #[test]
    fn test_phonetic_equality_follows_locale() {
        let german = RequestContext::intent("Answer", "de-DE").with_slot("flag", "true");
        assert!(german.has_slot_is_phonetically_equal("flag", "truhe"));
        assert!(!german.has_slot_is_phonetically_equal("flag", "drew"));

        let english = RequestContext::intent("Answer", "en-US").with_slot("flag", "true");
        assert!(!english.has_slot_is_phonetically_equal("flag", "truhe"));
        assert!(english.has_slot_is_phonetically_equal("flag", "drew"));
    }

    #[test]
    fn test_slot_as() {
        let ctx = ctx();
        assert_eq!(ctx.slot_as::<i64>("a"), Some(5));
        assert_eq!(ctx.slot_as::<f64>("b"), Some(3.5));
        assert_eq!(ctx.slot_as::<i64>("b"), None);
        assert_eq!(ctx.slot_as::<i64>("missing"), None);
    }

    #[test]
    fn test_built_in_intents() {
        assert_eq!(
            BuiltInIntent::from_intent_name("AMAZON.StopIntent"),
            Some(BuiltInIntent::Stop)
        );
        assert_eq!(BuiltInIntent::from_intent_name("Stop"), None);
        let ctx = RequestContext::intent("AMAZON.HelpIntent", "en-US");
        assert_eq!(ctx.built_in(), Some(BuiltInIntent::Help));
        assert_eq!(RequestContext::launch("en-US").built_in(), None);
    }

    #[test]
    fn test_inbound_intent_request() {
        let request = InboundRequest::from_json(
            r#"{"type": "intent", "intent": "Add", "slots": {"a": "5", "b": null}}"#,
        )
        .unwrap();
        let ctx = request
            .into_context("en-GB", Arc::new(InMemoryStateStore::new()))
            .unwrap();
        assert_eq!(ctx.intent_name(), Some("Add"));
        assert_eq!(ctx.locale(), "en-GB");
        assert_eq!(ctx.slot_value("a"), Some("5"));
        assert!(ctx.has_slot("b"));
    }

    #[test]
    fn test_inbound_launch_request() {
        let request =
            InboundRequest::from_json(r#"{"type": "LaunchRequest", "locale": "de-DE"}"#).unwrap();
        let ctx = request
            .into_context("en-US", Arc::new(InMemoryStateStore::new()))
            .unwrap();
        assert!(ctx.is_launch());
        assert_eq!(ctx.locale(), "de-DE");
    }

    #[test]
    fn test_inbound_intent_without_name_fails() {
        let request = InboundRequest::from_json(r#"{"type": "intent"}"#).unwrap();
        let err = request
            .into_context("en-US", Arc::new(InMemoryStateStore::new()))
            .unwrap_err();
        assert_eq!(err, ConfigurationError::BlankIntentName);
    }

    #[test]
    fn test_inbound_locale_must_be_language_tag() {
        let request = InboundRequest::from_json(
            r#"{"type": "intent", "intent": "Add", "locale": "../../etc"}"#,
        )
        .unwrap();
        let err = request
            .into_context("en-US", Arc::new(InMemoryStateStore::new()))
            .unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidLocale("../../etc".into()));
    }
}
