use std::collections::HashMap;

use serde_json::Value as JsonValue;

/// Key/value storage scoped to one operator session.
///
/// Values survive repeated render cycles but not a process restart.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<JsonValue>;
    fn set(&mut self, key: &str, value: JsonValue);
    fn remove(&mut self, key: &str) -> Option<JsonValue>;
}

impl<S> SessionStore for &mut S
where
    S: SessionStore + ?Sized,
{
    fn get(&self, key: &str) -> Option<JsonValue> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: JsonValue) {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Option<JsonValue> {
        (**self).remove(key)
    }
}

/// In-memory session store for the CLI and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    inner: HashMap<String, JsonValue>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Option<JsonValue> {
        self.inner.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: JsonValue) {
        self.inner.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.inner.remove(key)
    }
}
