use std::collections::HashMap;

use crate::call::{CallId, IncomingCall};

/// Alert surface of the host platform.
/// Implementations must be cheap and non-blocking -- the lifecycle
/// dispatches to them fire-and-forget, outside its lock.
pub trait NotificationSurface: Send + Sync {
    /// Show the alert for a ringing call. The offered actions are the raw
    /// `accept_call` / `reject_call` tokens.
    fn post(&self, call: &IncomingCall);

    /// Remove the alert. Must tolerate an id that was never posted.
    fn cancel(&self, id: CallId);
}

/// Screens reachable from a resolved call.
pub trait Navigator: Send + Sync {
    /// Open the main experience, forwarding the call payload.
    fn open_main(&self, payload: HashMap<String, String>);

    /// Tear down any call-specific presentation.
    fn end_presentation(&self) {} // default no-op
}

/// Read-only permission check consulted before posting an alert.
///
/// A denied permission suppresses only the visual alert: the call still
/// rings and still enters RINGING.
pub trait PermissionGate: Send + Sync {
    fn notifications_granted(&self) -> bool;
}

/// Gate that always grants. For hosts without a permission model.
pub struct AlwaysGranted;

impl PermissionGate for AlwaysGranted {
    fn notifications_granted(&self) -> bool {
        true
    }
}
