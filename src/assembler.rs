//! Response Assembler
//!
//! Turns an [`OutputDescriptor`] into final SSML:
//!
//! 1. Load the phrase bank for the output's locale (output override, then
//!    request locale, then the engine default)
//! 2. Pick a random utterance of the response intent and expand its references
//! 3. Pick alternations, then fill `{slot}` placeholders from the output
//! 4. Wrap in `<speak>`
//! 5. Same again for the reprompt group if a reprompt was asked for

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{DispatchResult, ResolutionError};
use crate::output::{resolve_slot, OutputDescriptor};
use crate::phrases::{validate_locale, PhraseBank, PhraseBankCache, PhraseSource};
use crate::templates::{PhrasePicker, RandomPicker, TemplateResolver, DEFAULT_MAX_REFERENCE_DEPTH};

/// Locale used when neither the output nor the request carries one
pub const DEFAULT_LOCALE: &str = "en-US";

const SPEAK_OPEN: &str = "<speak>";
const SPEAK_CLOSE: &str = "</speak>";

/// Final speech of a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedResponse {
    pub speech: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<String>,
}

pub struct ResponseAssembler {
    source: Arc<dyn PhraseSource>,
    cache: Arc<PhraseBankCache>,
    picker: Arc<dyn PhrasePicker>,
    default_locale: String,
    max_depth: usize,
}

impl ResponseAssembler {
    pub fn new(source: Arc<dyn PhraseSource>) -> Self {
        Self {
            source,
            cache: Arc::new(PhraseBankCache::new()),
            picker: Arc::new(RandomPicker::from_entropy()),
            default_locale: DEFAULT_LOCALE.to_string(),
            max_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }

    pub fn with_picker(mut self, picker: Arc<dyn PhrasePicker>) -> Self {
        self.picker = picker;
        self
    }

    /// Share a cache between assemblers
    pub fn with_cache(mut self, cache: Arc<PhraseBankCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn source(&self) -> &Arc<dyn PhraseSource> {
        &self.source
    }

    pub fn cache(&self) -> &Arc<PhraseBankCache> {
        &self.cache
    }

    /// Locale an output is rendered in
    pub fn locale_for<'a>(
        &'a self,
        output: &'a OutputDescriptor,
        request_locale: Option<&'a str>,
    ) -> &'a str {
        output
            .locale()
            .or(request_locale.filter(|l| !l.trim().is_empty()))
            .unwrap_or(&self.default_locale)
    }

    /// Phrase bank an output is rendered from
    pub async fn bank_for(
        &self,
        output: &OutputDescriptor,
        request_locale: Option<&str>,
    ) -> DispatchResult<Arc<PhraseBank>> {
        let source = output.source().unwrap_or(&self.source);
        let locale = self.locale_for(output, request_locale);
        validate_locale(locale)?;
        Ok(self.cache.load(source.as_ref(), locale).await?)
    }

    pub async fn assemble(
        &self,
        output: &OutputDescriptor,
        request_locale: Option<&str>,
    ) -> DispatchResult<ResolvedResponse> {
        let bank = self.bank_for(output, request_locale).await?;
        let resolver =
            TemplateResolver::new(&bank, self.picker.as_ref()).with_max_depth(self.max_depth);
        let intent = output.intent_name();

        let utterance =
            resolver
                .random_utterance(intent)?
                .ok_or_else(|| ResolutionError::NoUtterance {
                    intent: intent.to_string(),
                    locale: bank.locale().to_string(),
                })?;
        let speech = render(&resolver, output, &utterance)?;
        debug!("Assembled speech for {}: {}", intent, speech);

        let reprompt = if output.should_reprompt() {
            match resolver.random_reprompt(intent)? {
                Some(raw) => Some(render(&resolver, output, &raw)?),
                None => {
                    warn!(
                        "No reprompt for '{}' in {}, response goes out without one",
                        intent,
                        bank.path()
                    );
                    None
                }
            }
        } else {
            None
        };

        Ok(ResolvedResponse { speech, reprompt })
    }
}

/// Alternations and slots of an already expanded phrase, wrapped in `<speak>`
fn render(
    resolver: &TemplateResolver<'_>,
    output: &OutputDescriptor,
    expanded: &str,
) -> Result<String, ResolutionError> {
    let text = resolver.resolve_alternations(expanded);
    let text = resolver.resolve_slots(&text, |name| {
        resolve_slot(output, name)
            .map(|resolved| resolved.ssml())
            .ok_or_else(|| ResolutionError::UnresolvedSlot {
                name: name.to_string(),
                intent: output.intent_name().to_string(),
            })
    })?;
    Ok(format!("{}{}{}", SPEAK_OPEN, text, SPEAK_CLOSE))
}
