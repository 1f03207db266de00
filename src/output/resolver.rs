//! Output Slot Resolver
//!
//! Finds the value for a `{placeholder}` on an output descriptor. Slots put
//! directly on the output win; attached state models are searched after, in
//! the order they were attached.

use super::descriptor::OutputDescriptor;
use super::slot::OutputSlot;

/// Where a resolved slot came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOrigin {
    /// Put directly on the output
    Explicit,
    /// Tagged field of the state model with this key
    State(String),
}

/// A slot found for a placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSlot {
    pub slot: OutputSlot,
    pub origin: SlotOrigin,
}

impl ResolvedSlot {
    pub fn ssml(&self) -> String {
        self.slot.ssml()
    }
}

/// Resolve a placeholder name against an output descriptor
pub fn resolve_slot(output: &OutputDescriptor, name: &str) -> Option<ResolvedSlot> {
    if let Some(slot) = output.slots().iter().find(|s| s.name == name) {
        return Some(ResolvedSlot {
            slot: slot.clone(),
            origin: SlotOrigin::Explicit,
        });
    }

    output.states().iter().find_map(|model| {
        model.tagged_slot(name).map(|slot| ResolvedSlot {
            slot,
            origin: SlotOrigin::State(model.state_key().to_string()),
        })
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::output::format::{OutputFormat, SlotValue};
    use crate::output::state::StateModel;

    struct Tally {
        key: &'static str,
        total: i64,
    }

    impl StateModel for Tally {
        fn state_key(&self) -> &str {
            self.key
        }

        fn tagged_slots(&self) -> Vec<OutputSlot> {
            vec![OutputSlot::new("total", self.total).format_as(OutputFormat::Number)]
        }
    }

    #[test]
    fn test_explicit_slot_wins_over_state() {
        let output = OutputDescriptor::tell("SayTotal")
            .put_state(Arc::new(Tally { key: "tally", total: 9 }))
            .put_slot("total", "nine")
            .build()
            .unwrap();

        let resolved = resolve_slot(&output, "total").unwrap();
        assert_eq!(resolved.origin, SlotOrigin::Explicit);
        assert_eq!(resolved.slot.value, SlotValue::Text("nine".into()));
    }

    #[test]
    fn test_first_explicit_match_wins() {
        let output = OutputDescriptor::tell("SayName")
            .put_slot("name", "Joe")
            .put_slot("name", "Ann")
            .build()
            .unwrap();
        assert_eq!(resolve_slot(&output, "name").unwrap().ssml(), "Joe");
    }

    #[test]
    fn test_states_searched_in_attachment_order() {
        let output = OutputDescriptor::tell("SayTotal")
            .put_state(Arc::new(Tally { key: "first", total: 1 }))
            .put_state(Arc::new(Tally { key: "second", total: 2 }))
            .build()
            .unwrap();

        let resolved = resolve_slot(&output, "total").unwrap();
        assert_eq!(resolved.origin, SlotOrigin::State("first".into()));
        assert_eq!(
            resolved.ssml(),
            "<say-as interpret-as=\"number\">1</say-as>"
        );
    }

    #[test]
    fn test_unknown_slot_is_none() {
        let output = OutputDescriptor::tell("SayTotal")
            .put_state(Arc::new(Tally { key: "tally", total: 1 }))
            .build()
            .unwrap();
        assert!(resolve_slot(&output, "missing").is_none());
    }
}
