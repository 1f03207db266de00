//! Template Resolver
//!
//! Turns a raw phrase from the phrase bank into plain text.
//!
//! ## Syntax
//!
//! - `${Name}` - first utterance of the phrase bank entry `Name`, expanded recursively
//! - `[one|two|three]` - one option chosen at random
//! - `{slot}` - value of an output slot, see [`TemplateResolver::resolve_slots`]
//!
//! ## Pipeline
//!
//! ```text
//! "[Hi|Hello], ${Greeting} {name}"
//!     ↓ 1. expand references (recursive, cycle and depth guarded)
//! "[Hi|Hello], welcome to [the calculator|calc] {name}"
//!     ↓ 2. alternations (single pass, no nesting)
//! "Hello, welcome to calc {name}"
//!     ↓ 3. slots
//! "Hello, welcome to calc <say-as interpret-as=\"spell-out\">Joe</say-as>"
//! ```

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use super::picker::{pick_from, PhrasePicker};
use crate::error::{DispatchResult, ResolutionError};
use crate::phrases::{PhraseBank, REPROMPT_GROUP, UTTERANCE_GROUP};

/// Default bound on nested `${}` references
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 16;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap())
}

fn alternation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([^\[\]]*)\]").unwrap())
}

fn slot_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([^{}]+)\}").unwrap())
}

/// Resolves raw phrases of one phrase bank
pub struct TemplateResolver<'a> {
    bank: &'a PhraseBank,
    picker: &'a dyn PhrasePicker,
    max_depth: usize,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(bank: &'a PhraseBank, picker: &'a dyn PhrasePicker) -> Self {
        Self {
            bank,
            picker,
            max_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn bank(&self) -> &PhraseBank {
        self.bank
    }

    /// Expand references, then pick alternations
    pub fn resolve(&self, raw: &str) -> Result<String, ResolutionError> {
        let expanded = self.expand_references(raw)?;
        Ok(self.resolve_alternations(&expanded))
    }

    /// Resolve a phrase that belongs to `intent_name`; the intent itself counts
    /// as already visited so `A: ["${A}"]` is reported as a cycle
    pub fn resolve_for(&self, intent_name: &str, raw: &str) -> Result<String, ResolutionError> {
        let mut chain = vec![intent_name.to_string()];
        let expanded = self.expand(raw, &mut chain, 1)?;
        Ok(self.resolve_alternations(&expanded))
    }

    /// Replace every `${Name}` with the first utterance of `Name`
    pub fn expand_references(&self, raw: &str) -> Result<String, ResolutionError> {
        self.expand(raw, &mut Vec::new(), 0)
    }

    /// `chain[..base]` only seeds cycle detection and does not count towards the depth
    fn expand(
        &self,
        text: &str,
        chain: &mut Vec<String>,
        base: usize,
    ) -> Result<String, ResolutionError> {
        let pattern = reference_pattern();
        if !pattern.is_match(text) {
            return Ok(text.to_string());
        }

        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for cap in pattern.captures_iter(text) {
            let Some(full_match) = cap.get(0) else {
                continue;
            };
            result.push_str(&text[last..full_match.start()]);
            result.push_str(&self.expand_reference(cap[1].trim(), chain, base)?);
            last = full_match.end();
        }
        result.push_str(&text[last..]);
        Ok(result)
    }

    fn expand_reference(
        &self,
        name: &str,
        chain: &mut Vec<String>,
        base: usize,
    ) -> Result<String, ResolutionError> {
        if chain.iter().any(|visited| visited == name) {
            let mut cycle = chain.clone();
            cycle.push(name.to_string());
            return Err(ResolutionError::CyclicReference { chain: cycle });
        }
        let depth = chain.len().saturating_sub(base);
        if depth >= self.max_depth {
            return Err(ResolutionError::DepthExceeded {
                name: name.to_string(),
                max_depth: self.max_depth,
            });
        }

        let first = self
            .bank
            .utterances(name)
            .ok()
            .and_then(|phrases| phrases.into_iter().next())
            .ok_or_else(|| ResolutionError::UnresolvedReference {
                name: name.to_string(),
            })?;
        debug!("Expanding ${{{}}} at depth {}", name, depth);

        chain.push(name.to_string());
        let expanded = self.expand(&first, chain, base);
        chain.pop();
        expanded
    }

    /// Replace every `[a|b|c]` with one randomly chosen option
    pub fn resolve_alternations(&self, text: &str) -> String {
        alternation_pattern()
            .replace_all(text, |cap: &Captures| {
                let options: Vec<&str> = cap[1].split('|').collect();
                let choice = pick_from(self.picker, &options).copied().unwrap_or_default();
                if choice.trim().is_empty() {
                    warn!(
                        "Empty alternative chosen from '{}' in {}",
                        &cap[0],
                        self.bank.path()
                    );
                }
                choice.to_string()
            })
            .into_owned()
    }

    /// Replace every `{slot}` using `lookup`; the first failed lookup aborts
    pub fn resolve_slots<F>(&self, text: &str, mut lookup: F) -> Result<String, ResolutionError>
    where
        F: FnMut(&str) -> Result<String, ResolutionError>,
    {
        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for cap in slot_pattern().captures_iter(text) {
            let Some(full_match) = cap.get(0) else {
                continue;
            };
            result.push_str(&text[last..full_match.start()]);
            result.push_str(&lookup(cap[1].trim())?);
            last = full_match.end();
        }
        result.push_str(&text[last..]);
        Ok(result)
    }

    /// One random phrase of a group with its references expanded
    pub fn random_phrase(&self, intent_name: &str, group: usize) -> DispatchResult<Option<String>> {
        let phrases = self.bank.phrases(intent_name, group)?;
        match pick_from(self.picker, &phrases) {
            Some(raw) => {
                let mut chain = vec![intent_name.to_string()];
                Ok(Some(self.expand(raw, &mut chain, 1)?))
            }
            None => Ok(None),
        }
    }

    pub fn random_utterance(&self, intent_name: &str) -> DispatchResult<Option<String>> {
        self.random_phrase(intent_name, UTTERANCE_GROUP)
    }

    pub fn random_reprompt(&self, intent_name: &str) -> DispatchResult<Option<String>> {
        self.random_phrase(intent_name, REPROMPT_GROUP)
    }
}
