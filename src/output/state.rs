//! State models and the scoped state accessor
//!
//! A state model is any object a handler keeps between turns. It exposes its
//! tagged fields as [`OutputSlot`]s so phrases can refer to them, and can
//! optionally snapshot itself for persistence after the request completes.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::slot::OutputSlot;

/// Lifetime of persisted state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateScope {
    /// Lives as long as the conversation session
    Session,
    /// Bound to the user across sessions
    User,
    /// Shared by all users of the application
    Application,
}

impl fmt::Display for StateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateScope::Session => f.write_str("session"),
            StateScope::User => f.write_str("user"),
            StateScope::Application => f.write_str("application"),
        }
    }
}

/// A state-carrying object whose tagged fields can fill placeholders
pub trait StateModel: Send + Sync {
    /// Key the model is stored under within its scope
    fn state_key(&self) -> &str;

    /// Every tagged field as a named, formatted slot
    fn tagged_slots(&self) -> Vec<OutputSlot>;

    /// Tagged field with the given slot name, if exposed
    fn tagged_slot(&self, name: &str) -> Option<OutputSlot> {
        self.tagged_slots().into_iter().find(|s| s.name == name)
    }

    fn scope(&self) -> StateScope {
        StateScope::Session
    }

    /// JSON snapshot written back to the state store; `None` skips persistence
    fn snapshot(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Scoped key-value persistence used by handlers
pub trait StateStore: Send + Sync {
    fn read(&self, scope: StateScope, key: &str) -> Result<Option<serde_json::Value>>;

    fn write(&self, scope: StateScope, key: &str, value: serde_json::Value) -> Result<()>;

    fn remove(&self, scope: StateScope, key: &str) -> Result<Option<serde_json::Value>>;
}

/// Typed helpers over any [`StateStore`]
pub trait StateStoreExt {
    /// Read and decode a model
    fn read_model<T: DeserializeOwned>(&self, scope: StateScope, key: &str) -> Result<Option<T>>;

    /// Read a model or fall back to its default
    fn read_or_create_model<T: DeserializeOwned + Default>(
        &self,
        scope: StateScope,
        key: &str,
    ) -> Result<T>;

    fn write_model<T: Serialize>(&self, scope: StateScope, key: &str, model: &T) -> Result<()>;

    /// Persist a state model's snapshot, if it provides one
    fn save_state(&self, model: &dyn StateModel) -> Result<bool>;
}

impl<S: StateStore + ?Sized> StateStoreExt for S {
    fn read_model<T: DeserializeOwned>(&self, scope: StateScope, key: &str) -> Result<Option<T>> {
        match self.read(scope, key)? {
            Some(value) => {
                let model = serde_json::from_value(value)
                    .with_context(|| format!("Failed to decode {} state '{}'", scope, key))?;
                Ok(Some(model))
            }
            None => Ok(None),
        }
    }

    fn read_or_create_model<T: DeserializeOwned + Default>(
        &self,
        scope: StateScope,
        key: &str,
    ) -> Result<T> {
        Ok(self.read_model(scope, key)?.unwrap_or_default())
    }

    fn write_model<T: Serialize>(&self, scope: StateScope, key: &str, model: &T) -> Result<()> {
        let value = serde_json::to_value(model)
            .with_context(|| format!("Failed to encode {} state '{}'", scope, key))?;
        self.write(scope, key, value)
    }

    fn save_state(&self, model: &dyn StateModel) -> Result<bool> {
        match model.snapshot() {
            Some(value) => {
                self.write(model.scope(), model.state_key(), value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Process-local state store, one map per scope
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    entries: RwLock<HashMap<(StateScope, String), serde_json::Value>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateStore for InMemoryStateStore {
    fn read(&self, scope: StateScope, key: &str) -> Result<Option<serde_json::Value>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(&(scope, key.to_string())).cloned())
    }

    fn write(&self, scope: StateScope, key: &str, value: serde_json::Value) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert((scope, key.to_string()), value);
        Ok(())
    }

    fn remove(&self, scope: StateScope, key: &str) -> Result<Option<serde_json::Value>> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Ok(entries.remove(&(scope, key.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::format::OutputFormat;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Counter {
        hits: i64,
    }

    impl StateModel for Counter {
        fn state_key(&self) -> &str {
            "counter"
        }

        fn tagged_slots(&self) -> Vec<OutputSlot> {
            vec![OutputSlot::new("hits", self.hits).format_as(OutputFormat::Number)]
        }

        fn scope(&self) -> StateScope {
            StateScope::User
        }

        fn snapshot(&self) -> Option<serde_json::Value> {
            serde_json::to_value(self).ok()
        }
    }

    #[test]
    fn test_scopes_are_isolated() {
        let store = InMemoryStateStore::new();
        store
            .write(StateScope::Session, "k", serde_json::json!(1))
            .unwrap();
        store.write(StateScope::User, "k", serde_json::json!(2)).unwrap();

        assert_eq!(
            store.read(StateScope::Session, "k").unwrap(),
            Some(serde_json::json!(1))
        );
        assert_eq!(
            store.read(StateScope::User, "k").unwrap(),
            Some(serde_json::json!(2))
        );
        assert_eq!(store.read(StateScope::Application, "k").unwrap(), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_typed_round_trip_and_create() {
        let store = InMemoryStateStore::new();
        let created: Counter = store
            .read_or_create_model(StateScope::User, "counter")
            .unwrap();
        assert_eq!(created, Counter::default());

        store
            .write_model(StateScope::User, "counter", &Counter { hits: 4 })
            .unwrap();
        let read: Option<Counter> = store.read_model(StateScope::User, "counter").unwrap();
        assert_eq!(read, Some(Counter { hits: 4 }));
    }

    #[test]
    fn test_save_state_uses_model_scope() {
        let store = InMemoryStateStore::new();
        let saved = store.save_state(&Counter { hits: 7 }).unwrap();
        assert!(saved);
        assert_eq!(
            store.read(StateScope::User, "counter").unwrap(),
            Some(serde_json::json!({"hits": 7}))
        );
    }

    #[test]
    fn test_tagged_slot_lookup() {
        let counter = Counter { hits: 3 };
        let slot = counter.tagged_slot("hits").unwrap();
        assert_eq!(slot.format, OutputFormat::Number);
        assert!(counter.tagged_slot("misses").is_none());
    }

    #[test]
    fn test_decode_failure_is_error() {
        let store = InMemoryStateStore::new();
        store
            .write(StateScope::Session, "counter", serde_json::json!("nope"))
            .unwrap();
        let result: Result<Option<Counter>> = store.read_model(StateScope::Session, "counter");
        assert!(result.is_err());
    }
}
