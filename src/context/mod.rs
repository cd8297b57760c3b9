//! Log context: the key/value overlay merged into every record.
//!
//! A [`LogContext`] is an ordered list of extra fields. Keys keep the
//! position of their first insertion; updating a key replaces its value in
//! place. A [`ContextFrame`] is a frozen copy used to roll the context back
//! when a scoped block ends.

use serde_json::Value;

/// Mutable extra fields of one logger.
///
/// ## Example
///
/// ```
/// use formatter_logger::context::LogContext;
/// use serde_json::json;
///
/// let mut context = LogContext::new();
/// context.set([("request_id", Some(json!("r-1"))), ("user", Some(json!(7)))]);
/// context.set([("user", None::<serde_json::Value>)]);
///
/// assert_eq!(context.get("request_id"), Some(&json!("r-1")));
/// assert_eq!(context.get("user"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogContext {
    entries: Vec<(String, Value)>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `pairs` into the context.
    ///
    /// A `None` value removes the key; removing an absent key is a no-op.
    pub fn set<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Option<Value>>,
    {
        for (key, value) in pairs {
            let key = key.into();
            match value.into() {
                Some(value) => self.insert(key, value),
                None => {
                    self.remove(&key);
                }
            }
        }
    }

    /// Upserts a single key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Clears every key.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Freezes the current state.
    pub fn snapshot(&self) -> ContextFrame {
        ContextFrame {
            entries: self.entries.clone(),
        }
    }

    /// Resets the context, then merges `frame` back in.
    pub fn restore(&mut self, frame: ContextFrame) {
        self.reset();
        for (key, value) in frame.entries {
            self.insert(key, value);
        }
    }
}

/// An immutable snapshot of a [`LogContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContextFrame {
    entries: Vec<(String, Value)>,
}

impl ContextFrame {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
