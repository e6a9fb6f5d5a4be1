use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Transport unit of the queue: an identifier, optional metadata, and
/// an opaque payload. Delivery state lives on [`Job`](crate::job::Job),
/// never here.
///
/// The id is generated on construction but may be reassigned before the
/// message is pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    /// String-keyed dynamic metadata. An empty map means "no metadata";
    /// backends are free to persist it as NULL.
    pub metadata: HashMap<String, Value>,
    pub payload: Vec<u8>,
}

impl Message {
    /// New message with a time-ordered v7 id, no metadata and no payload.
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            metadata: HashMap::new(),
            payload: Vec::new(),
        }
    }

    /// New message carrying the given payload.
    pub fn with_payload(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::new()
        }
    }

    /// Metadata value for `key`, deserialized into `T`. Returns `None`
    /// when the key is absent or the stored value does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.metadata.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> serde_json::Result<()> {
        self.metadata.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}
