//! Inbound action routing.
//!
//! Raw action tokens arrive from alert taps, push payloads, or host input.
//! The router maps them onto the closed [`ActionToken`] vocabulary; anything
//! outside it becomes a logged `NoOp`. Routing never mutates lifecycle state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::call::{PAYLOAD_BODY, PAYLOAD_TITLE};
use crate::error::LifecycleError;

/// Raw token: accept the ringing call.
pub const ACTION_ACCEPT_CALL: &str = "accept_call";
/// Raw token: reject the ringing call.
pub const ACTION_REJECT_CALL: &str = "reject_call";
/// Raw token: ring a new incoming call; payload carries title/body.
pub const ACTION_FULL_SCREEN: &str = "full_screen";
/// Raw token: the alert was dismissed outside the lifecycle.
pub const ACTION_DISMISS_ALERT: &str = "dismiss_alert";

/// Closed vocabulary of lifecycle transition requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionToken {
    /// Ring a new incoming call.
    Ring {
        title: Option<String>,
        body: Option<String>,
    },
    Accept,
    Reject,
    /// The ring window elapsed. Produced internally by the ring timer,
    /// never routed from raw input.
    Timeout,
    ExternalCancel,
    /// Absorbed unknown input; applying it changes nothing.
    NoOp,
}

impl ActionToken {
    /// Stable name used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ActionToken::Ring { .. } => "ring",
            ActionToken::Accept => "accept",
            ActionToken::Reject => "reject",
            ActionToken::Timeout => "timeout",
            ActionToken::ExternalCancel => "external_cancel",
            ActionToken::NoOp => "noop",
        }
    }
}

/// Map a raw token to its [`ActionToken`], failing on vocabulary misses.
///
/// The payload map is consulted only for `full_screen`.
pub fn try_route(
    raw: &str,
    payload: &HashMap<String, String>,
) -> Result<ActionToken, LifecycleError> {
    match raw {
        ACTION_ACCEPT_CALL => Ok(ActionToken::Accept),
        ACTION_REJECT_CALL => Ok(ActionToken::Reject),
        ACTION_DISMISS_ALERT => Ok(ActionToken::ExternalCancel),
        ACTION_FULL_SCREEN => Ok(ActionToken::Ring {
            title: payload.get(PAYLOAD_TITLE).cloned(),
            body: payload.get(PAYLOAD_BODY).cloned(),
        }),
        other => Err(LifecycleError::UnknownAction {
            action: other.to_string(),
        }),
    }
}

/// Total form of [`try_route`]: unknown tokens are logged and become `NoOp`.
pub fn route(raw: &str, payload: &HashMap<String, String>) -> ActionToken {
    try_route(raw, payload).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring inbound action");
        ActionToken::NoOp
    })
}
