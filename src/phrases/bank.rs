//! Parsed phrase bank for a single locale
//!
//! The document maps response intent names to phrase groups. Group 0 holds
//! the alternative utterances, group 1 the alternative reprompts:
//!
//! ```yaml
//! SayAddResult:
//!   - ["{a} plus {b} is {result}", "[That makes|The result is] {result}"]
//!   - ["Anything else to add?"]
//! SayWelcome: ["Welcome to ${SkillName}"]
//! SkillName: "the calculator"
//! ```
//!
//! A value may also be a mapping; its values are flattened in document order.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{ConfigurationError, PhraseBankError};

/// Group index of the utterances
pub const UTTERANCE_GROUP: usize = 0;
/// Group index of the reprompts
pub const REPROMPT_GROUP: usize = 1;

/// Phrase groups of one intent, in document order
pub type PhraseGroups = Vec<Vec<String>>;

#[derive(Debug)]
pub struct PhraseBank {
    locale: String,
    path: String,
    content: Mapping,
    flattened: RwLock<HashMap<String, Arc<PhraseGroups>>>,
}

impl PhraseBank {
    /// Parse a phrase bank document; an empty document is an empty bank
    pub fn parse(
        locale: impl Into<String>,
        path: impl Into<String>,
        bytes: &[u8],
    ) -> Result<Self, PhraseBankError> {
        let path = path.into();
        let is_blank = bytes.iter().all(|b| b.is_ascii_whitespace());

        let content = if is_blank {
            Mapping::new()
        } else {
            serde_yaml::from_slice::<Mapping>(bytes).map_err(|source| PhraseBankError::Parse {
                path: path.clone(),
                source,
            })?
        };

        Ok(Self {
            locale: locale.into(),
            path,
            content,
            flattened: RwLock::new(HashMap::new()),
        })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of top-level intent entries
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn contains(&self, intent_name: &str) -> bool {
        self.entry(intent_name).is_some()
    }

    /// All phrase groups of an intent; empty if the intent is absent
    pub fn groups(&self, intent_name: &str) -> Result<Arc<PhraseGroups>, ConfigurationError> {
        if intent_name.trim().is_empty() {
            return Err(ConfigurationError::BlankIntentName);
        }

        if let Some(groups) = self
            .flattened
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(intent_name)
        {
            return Ok(groups.clone());
        }

        let groups = Arc::new(
            self.entry(intent_name)
                .map(flatten_groups)
                .unwrap_or_default(),
        );
        debug!(
            "Flattened {} phrase groups for '{}' ({})",
            groups.len(),
            intent_name,
            self.locale
        );

        let mut cache = self.flattened.write().unwrap_or_else(|e| e.into_inner());
        Ok(cache
            .entry(intent_name.to_string())
            .or_insert(groups)
            .clone())
    }

    /// Raw phrases of one group, before any placeholder handling
    pub fn phrases(
        &self,
        intent_name: &str,
        group: usize,
    ) -> Result<Vec<String>, ConfigurationError> {
        Ok(self
            .groups(intent_name)?
            .get(group)
            .cloned()
            .unwrap_or_default())
    }

    pub fn utterances(&self, intent_name: &str) -> Result<Vec<String>, ConfigurationError> {
        self.phrases(intent_name, UTTERANCE_GROUP)
    }

    pub fn reprompts(&self, intent_name: &str) -> Result<Vec<String>, ConfigurationError> {
        self.phrases(intent_name, REPROMPT_GROUP)
    }

    fn entry(&self, intent_name: &str) -> Option<&Value> {
        self.content
            .iter()
            .find(|(k, _)| k.as_str() == Some(intent_name))
            .map(|(_, v)| v)
    }
}

fn flatten_groups(value: &Value) -> PhraseGroups {
    match value {
        Value::Null => Vec::new(),
        Value::Mapping(map) => map.values().flat_map(flatten_groups).collect(),
        Value::Sequence(items) if items.iter().all(is_leaf) => vec![leaves(value)],
        Value::Sequence(items) => items.iter().map(leaves).collect(),
        Value::Tagged(tagged) => flatten_groups(&tagged.value),
        scalar => vec![scalar_text(scalar).into_iter().collect()],
    }
}

fn is_leaf(value: &Value) -> bool {
    !matches!(value, Value::Sequence(_) | Value::Mapping(_))
}

/// Every scalar below a node, depth first
fn leaves(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().flat_map(leaves).collect(),
        Value::Mapping(map) => map.values().flat_map(leaves).collect(),
        Value::Tagged(tagged) => leaves(&tagged.value),
        scalar => scalar_text(scalar).into_iter().collect(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
