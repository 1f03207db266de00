//! Output Descriptor
//!
//! What a handler hands back: the response intent whose phrases should be
//! spoken, the values that fill their placeholders, and how the session
//! continues. Built incrementally with [`OutputBuilder`] and frozen by
//! [`OutputBuilder::build`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::format::{OutputFormat, SlotValue};
use super::slot::OutputSlot;
use super::state::StateModel;
use crate::error::ConfigurationError;
use crate::phrases::{validate_locale, PhraseSource};

/// Display card attached to a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Card {
    pub fn simple(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image_url: None,
        }
    }
}

/// A frozen response description produced by a handler
#[derive(Clone)]
pub struct OutputDescriptor {
    intent_name: String,
    end_session: bool,
    reprompt: bool,
    slots: Vec<OutputSlot>,
    states: Vec<Arc<dyn StateModel>>,
    card: Option<Card>,
    locale: Option<String>,
    source: Option<Arc<dyn PhraseSource>>,
}

impl OutputDescriptor {
    /// Response that closes the session once delivered
    pub fn tell(intent_name: impl Into<String>) -> OutputBuilder {
        OutputBuilder::new(intent_name.into(), true)
    }

    /// Response that keeps the session open for the user's answer
    pub fn ask(intent_name: impl Into<String>) -> OutputBuilder {
        OutputBuilder::new(intent_name.into(), false)
    }

    pub fn intent_name(&self) -> &str {
        &self.intent_name
    }

    pub fn should_end_session(&self) -> bool {
        self.end_session
    }

    pub fn should_reprompt(&self) -> bool {
        self.reprompt
    }

    /// Slots put directly on this output, in insertion order
    pub fn slots(&self) -> &[OutputSlot] {
        &self.slots
    }

    /// Attached state models, in attachment order
    pub fn states(&self) -> &[Arc<dyn StateModel>] {
        &self.states
    }

    pub fn card(&self) -> Option<&Card> {
        self.card.as_ref()
    }

    /// Locale override; the request locale applies when unset
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Phrase source override; the engine's source applies when unset
    pub fn source(&self) -> Option<&Arc<dyn PhraseSource>> {
        self.source.as_ref()
    }
}

impl fmt::Debug for OutputDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputDescriptor")
            .field("intent_name", &self.intent_name)
            .field("end_session", &self.end_session)
            .field("reprompt", &self.reprompt)
            .field("slots", &self.slots)
            .field(
                "states",
                &self.states.iter().map(|s| s.state_key()).collect::<Vec<_>>(),
            )
            .field("card", &self.card)
            .field("locale", &self.locale)
            .field("source", &self.source.as_ref().map(|s| s.describe()))
            .finish()
    }
}

/// Incremental builder for [`OutputDescriptor`]
pub struct OutputBuilder {
    intent_name: String,
    end_session: bool,
    reprompt: bool,
    slots: Vec<OutputSlot>,
    states: Vec<Arc<dyn StateModel>>,
    card: Option<Card>,
    locale: Option<String>,
    source: Option<Arc<dyn PhraseSource>>,
}

impl OutputBuilder {
    fn new(intent_name: String, end_session: bool) -> Self {
        Self {
            intent_name,
            end_session,
            reprompt: false,
            slots: Vec::new(),
            states: Vec::new(),
            card: None,
            locale: None,
            source: None,
        }
    }

    /// Slot spoken as plain text
    pub fn put_slot(self, name: impl Into<String>, value: impl Into<SlotValue>) -> Self {
        self.put_output_slot(OutputSlot::new(name, value))
    }

    pub fn put_slot_formatted(
        self,
        name: impl Into<String>,
        value: impl Into<SlotValue>,
        format: OutputFormat,
    ) -> Self {
        self.put_output_slot(OutputSlot::new(name, value).format_as(format))
    }

    pub fn put_output_slot(mut self, slot: OutputSlot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Attach a state model; the same instance is only attached once
    pub fn put_state(mut self, model: Arc<dyn StateModel>) -> Self {
        if !self.states.iter().any(|m| same_model(m, &model)) {
            self.states.push(model);
        }
        self
    }

    pub fn put_states<I>(self, models: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn StateModel>>,
    {
        models.into_iter().fold(self, |b, m| b.put_state(m))
    }

    pub fn with_card(mut self, card: Card) -> Self {
        self.card = Some(card);
        self
    }

    /// Ask for a reprompt taken from the second phrase group
    pub fn with_reprompt(mut self, reprompt: bool) -> Self {
        self.reprompt = reprompt;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_source(mut self, source: Arc<dyn PhraseSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn build(self) -> Result<OutputDescriptor, ConfigurationError> {
        if self.intent_name.trim().is_empty() {
            return Err(ConfigurationError::BlankIntentName);
        }
        if let Some(locale) = &self.locale {
            validate_locale(locale)?;
        }

        Ok(OutputDescriptor {
            intent_name: self.intent_name,
            end_session: self.end_session,
            reprompt: self.reprompt,
            slots: self.slots,
            states: self.states,
            card: self.card,
            locale: self.locale,
            source: self.source,
        })
    }
}

/// Identity comparison that ignores vtable differences
fn same_model(a: &Arc<dyn StateModel>, b: &Arc<dyn StateModel>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Score(i64);

    impl StateModel for Score {
        fn state_key(&self) -> &str {
            "score"
        }

        fn tagged_slots(&self) -> Vec<OutputSlot> {
            vec![OutputSlot::new("score", self.0)]
        }
    }

    #[test]
    fn test_blank_intent_name_fails() {
        assert_eq!(
            OutputDescriptor::tell("").build().unwrap_err(),
            ConfigurationError::BlankIntentName
        );
        assert_eq!(
            OutputDescriptor::ask("   ").build().unwrap_err(),
            ConfigurationError::BlankIntentName
        );
    }

    #[test]
    fn test_blank_locale_override_fails() {
        let err = OutputDescriptor::tell("SayHello")
            .with_locale(" ")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::BlankLocale);
    }

    #[test]
    fn test_tell_and_ask_defaults() {
        let tell = OutputDescriptor::tell("SayBye").build().unwrap();
        assert!(tell.should_end_session());
        assert!(!tell.should_reprompt());
        assert!(tell.locale().is_none());

        let ask = OutputDescriptor::ask("SayWelcome")
            .with_reprompt(true)
            .build()
            .unwrap();
        assert!(!ask.should_end_session());
        assert!(ask.should_reprompt());
    }

    #[test]
    fn test_same_state_attached_once() {
        let score: Arc<dyn StateModel> = Arc::new(Score(3));
        let output = OutputDescriptor::tell("SayScore")
            .put_state(score.clone())
            .put_state(score.clone())
            .put_states(vec![score])
            .build()
            .unwrap();
        assert_eq!(output.states().len(), 1);
    }

    #[test]
    fn test_distinct_states_with_equal_content_are_kept() {
        let output = OutputDescriptor::tell("SayScore")
            .put_state(Arc::new(Score(3)))
            .put_state(Arc::new(Score(3)))
            .build()
            .unwrap();
        assert_eq!(output.states().len(), 2);
    }

    #[test]
    fn test_slots_keep_insertion_order() {
        let output = OutputDescriptor::ask("SayResult")
            .put_slot("a", 5)
            .put_slot_formatted("result", 8, OutputFormat::Number)
            .with_card(Card::simple("Result", "5 + 3 = 8"))
            .build()
            .unwrap();
        let names: Vec<_> = output.slots().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "result"]);
        assert_eq!(output.card().unwrap().content, "5 + 3 = 8");
    }
}
