//! Loaded phrase banks, cached per (source, locale)
//!
//! Concurrent first loads of the same key share one read of the underlying
//! resource. Failed loads are not cached.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::bank::PhraseBank;
use super::source::PhraseSource;
use crate::error::PhraseBankError;

type CacheKey = (String, String);

#[derive(Debug, Default)]
pub struct PhraseBankCache {
    entries: Mutex<HashMap<CacheKey, Arc<OnceCell<Arc<PhraseBank>>>>>,
}

impl PhraseBankCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the phrase bank for a locale, reading the source at most once
    pub async fn load(
        &self,
        source: &dyn PhraseSource,
        locale: &str,
    ) -> Result<Arc<PhraseBank>, PhraseBankError> {
        let key = (source.describe(), locale.to_string());
        let cell = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        if let Some(bank) = cell.get() {
            debug!("Phrase bank cache hit for {} ({})", source.describe(), locale);
            return Ok(bank.clone());
        }

        let loaded = cell
            .get_or_try_init(|| async {
                let path = source.resource_path(locale);
                let bytes = source.read(locale).await?;
                let bank = PhraseBank::parse(locale, path.as_str(), &bytes)?;
                info!("Loaded {} phrase entries from {}", bank.len(), path);
                Ok::<_, PhraseBankError>(Arc::new(bank))
            })
            .await;

        match loaded {
            Ok(bank) => Ok(bank.clone()),
            Err(e) => {
                self.forget_failed(&key, &cell);
                Err(e)
            }
        }
    }

    /// Drop the entry of a failed load unless another caller has filled it meanwhile
    fn forget_failed(&self, key: &CacheKey, cell: &Arc<OnceCell<Arc<PhraseBank>>>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let stale = entries
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, cell) && !current.initialized());
        if stale {
            entries.remove(key);
        }
    }

    /// Drop every cached locale of a source so the next load re-reads it
    pub fn invalidate(&self, source: &dyn PhraseSource) {
        let id = source.describe();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|(source_id, _), _| *source_id != id);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Number of successfully loaded banks
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
