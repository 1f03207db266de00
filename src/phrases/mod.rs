//! Phrase Bank Loader
//!
//! Reads locale-specific phrase bank documents from a [`PhraseSource`],
//! parses them into [`PhraseBank`]s and keeps them in a [`PhraseBankCache`].

mod bank;
mod cache;
mod source;

pub use bank::{PhraseBank, PhraseGroups, REPROMPT_GROUP, UTTERANCE_GROUP};
pub use cache::PhraseBankCache;
pub use source::{
    validate_locale, FilePhraseSource, HttpPhraseSource, PhraseSource, ResourceLocation,
    StaticPhraseSource,
};
