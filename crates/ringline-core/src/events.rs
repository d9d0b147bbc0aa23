use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::call::CallId;
use crate::lifecycle::CallState;

/// Every lifecycle transition produces an Event.
/// Host shells subscribe to the stream; the tag survives serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A call entered RINGING: alert requested, ring session armed.
    RingStarted {
        call_id: CallId,
        title: Option<String>,
        body: Option<String>,
        at: DateTime<Utc>,
    },
    CallAccepted {
        call_id: CallId,
        ringing_ms: u64,
        at: DateTime<Utc>,
    },
    CallRejected {
        call_id: CallId,
        ringing_ms: u64,
        at: DateTime<Utc>,
    },
    /// The ring window elapsed without user action.
    CallTimedOut {
        call_id: CallId,
        ringing_ms: u64,
        at: DateTime<Utc>,
    },
    /// The alert was dismissed from outside the lifecycle.
    CallCancelled {
        call_id: CallId,
        ringing_ms: u64,
        at: DateTime<Utc>,
    },
    /// Complete lifecycle state at a point in time, for host-shell resync.
    StateSnapshot {
        state: CallState,
        call_id: Option<CallId>,
        title: Option<String>,
        ringing_ms: Option<u64>,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_carry_a_type_tag() {
        let event = Event::CallAccepted {
            call_id: CallId::new(),
            ringing_ms: 1200,
            at: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "CallAccepted");
        assert_eq!(value["ringing_ms"], 1200);
    }
}
