//! Incoming call records.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload key carrying the display title of an incoming call.
pub const PAYLOAD_TITLE: &str = "title";
/// Payload key carrying the display body of an incoming call.
pub const PAYLOAD_BODY: &str = "body";

/// Unique id of one incoming call event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One incoming call-like event.
///
/// Immutable once created. The lifecycle owns the record while it rings and
/// discards it at resolution; identity lives on in the emitted events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingCall {
    pub id: CallId,
    pub title: Option<String>,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IncomingCall {
    pub fn new(title: Option<String>, body: Option<String>) -> Self {
        Self {
            id: CallId::new(),
            title,
            body,
            created_at: Utc::now(),
        }
    }

    /// Render the display fields back into the inbound payload map shape.
    ///
    /// Absent fields are omitted rather than serialized as empty strings.
    pub fn payload(&self) -> HashMap<String, String> {
        let mut payload = HashMap::new();
        if let Some(title) = &self.title {
            payload.insert(PAYLOAD_TITLE.to_string(), title.clone());
        }
        if let Some(body) = &self.body {
            payload.insert(PAYLOAD_BODY.to_string(), body.clone());
        }
        payload
    }
}
