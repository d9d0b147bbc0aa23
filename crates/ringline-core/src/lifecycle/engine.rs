//! Incoming-call lifecycle state machine.
//!
//! The engine is pure: it validates a transition, rotates the phase and
//! emits the side-effect commands for the caller to execute. It performs no
//! I/O and holds no locks -- [`CallLifecycle`](super::service::CallLifecycle)
//! provides the serialization point and runs the commands.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Ringing -> (Accepted | Rejected | TimedOut | Cancelled) -> Idle
//! ```
//!
//! Terminal states admit no transition; `consume()` observes the outcome and
//! returns the machine to `Idle` for the next call.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::call::{CallId, IncomingCall};
use crate::error::LifecycleError;
use crate::events::Event;
use crate::router::ActionToken;

/// How long a call rings before timing out. Fixed, not configurable.
pub const RING_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Idle,
    Ringing,
    Accepted,
    Rejected,
    TimedOut,
    Cancelled,
}

impl CallState {
    /// Terminal states admit no further transition until consumed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallState::Accepted | CallState::Rejected | CallState::TimedOut | CallState::Cancelled
        )
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Idle => "idle",
            CallState::Ringing => "ringing",
            CallState::Accepted => "accepted",
            CallState::Rejected => "rejected",
            CallState::TimedOut => "timed_out",
            CallState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Side effects requested by a transition.
///
/// Executed by the service after the critical section releases; all are
/// fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Post the incoming-call alert, subject to the permission gate.
    PostAlert { call: IncomingCall },
    /// Remove the alert.
    CancelAlert { id: CallId },
    /// Start the ring session with the timeout armed.
    StartRinger { id: CallId, timeout: Duration },
    /// Stop the ring session. Idempotent at the ringer.
    StopRinger { id: CallId },
    /// Navigate to the main experience with the call payload.
    OpenMain { payload: HashMap<String, String> },
    /// Tear down the call presentation.
    EndPresentation,
}

/// Result of a successful transition.
#[derive(Debug, Clone)]
pub struct Transition {
    /// State after the transition.
    pub state: CallState,
    /// Event to publish, if the transition produced one.
    pub event: Option<Event>,
    /// Side effects to execute, in order.
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    /// A call owns the machine; `since` is when ringing began.
    Ringing {
        call: IncomingCall,
        since: DateTime<Utc>,
    },
    /// `outcome` is always terminal.
    Resolved { outcome: CallState },
}

/// Pure incoming-call state machine.
///
/// Holds at most one call. A ringing phase without a record is
/// unrepresentable.
#[derive(Debug, Clone)]
pub struct CallEngine {
    phase: Phase,
}

impl CallEngine {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CallState {
        match &self.phase {
            Phase::Idle => CallState::Idle,
            Phase::Ringing { .. } => CallState::Ringing,
            Phase::Resolved { outcome } => *outcome,
        }
    }

    /// The call currently ringing, if any.
    pub fn active_call(&self) -> Option<&IncomingCall> {
        match &self.phase {
            Phase::Ringing { call, .. } => Some(call),
            _ => None,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let (call_id, title, ringing_ms) = match &self.phase {
            Phase::Ringing { call, since } => {
                (Some(call.id), call.title.clone(), Some(elapsed_ms(*since)))
            }
            _ => (None, None, None),
        };
        Event::StateSnapshot {
            state: self.state(),
            call_id,
            title,
            ringing_ms,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Enter `Ringing` for a fresh call.
    ///
    /// Fails with `AlreadyActive` unless the machine is `Idle`: a ringing
    /// call must resolve, and a resolved call must be consumed first.
    pub fn begin(&mut self, call: IncomingCall) -> Result<Transition, LifecycleError> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(LifecycleError::AlreadyActive {
                state: self.state(),
            });
        }
        let event = Event::RingStarted {
            call_id: call.id,
            title: call.title.clone(),
            body: call.body.clone(),
            at: Utc::now(),
        };
        let commands = vec![
            Command::PostAlert { call: call.clone() },
            Command::StartRinger {
                id: call.id,
                timeout: RING_TIMEOUT,
            },
        ];
        self.phase = Phase::Ringing {
            call,
            since: Utc::now(),
        };
        Ok(Transition {
            state: CallState::Ringing,
            event: Some(event),
            commands,
        })
    }

    /// Apply an action token.
    ///
    /// Only one resolving action ever succeeds per call; whichever arrives
    /// second at the serialization point gets `InvalidTransition`.
    pub fn apply(&mut self, action: ActionToken) -> Result<Transition, LifecycleError> {
        let name = action.name();
        match action {
            ActionToken::NoOp => Ok(Transition {
                state: self.state(),
                event: None,
                commands: Vec::new(),
            }),
            // Ring entry goes through `begin`.
            ActionToken::Ring { .. } => Err(LifecycleError::InvalidTransition {
                action: name,
                state: self.state(),
            }),
            ActionToken::Accept => self.resolve(name, CallState::Accepted),
            ActionToken::Reject => self.resolve(name, CallState::Rejected),
            ActionToken::Timeout => self.resolve(name, CallState::TimedOut),
            ActionToken::ExternalCancel => self.resolve(name, CallState::Cancelled),
        }
    }

    /// Observe a terminal outcome and return to `Idle`.
    pub fn consume(&mut self) -> Option<CallState> {
        match self.phase {
            Phase::Resolved { outcome } => {
                self.phase = Phase::Idle;
                Some(outcome)
            }
            _ => None,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn resolve(
        &mut self,
        action: &'static str,
        outcome: CallState,
    ) -> Result<Transition, LifecycleError> {
        match std::mem::replace(&mut self.phase, Phase::Resolved { outcome }) {
            Phase::Ringing { call, since } => {
                let ringing_ms = elapsed_ms(since);
                let at = Utc::now();
                let event = match outcome {
                    CallState::Accepted => Event::CallAccepted {
                        call_id: call.id,
                        ringing_ms,
                        at,
                    },
                    CallState::Rejected => Event::CallRejected {
                        call_id: call.id,
                        ringing_ms,
                        at,
                    },
                    CallState::TimedOut => Event::CallTimedOut {
                        call_id: call.id,
                        ringing_ms,
                        at,
                    },
                    _ => Event::CallCancelled {
                        call_id: call.id,
                        ringing_ms,
                        at,
                    },
                };
                let commands = match outcome {
                    CallState::Accepted => vec![
                        Command::StopRinger { id: call.id },
                        Command::CancelAlert { id: call.id },
                        Command::OpenMain {
                            payload: call.payload(),
                        },
                    ],
                    // The alert is already gone when the dismissal reaches us.
                    CallState::Cancelled => vec![Command::StopRinger { id: call.id }],
                    _ => vec![
                        Command::StopRinger { id: call.id },
                        Command::CancelAlert { id: call.id },
                        Command::EndPresentation,
                    ],
                };
                Ok(Transition {
                    state: outcome,
                    event: Some(event),
                    commands,
                })
            }
            phase => {
                self.phase = phase;
                Err(LifecycleError::InvalidTransition {
                    action,
                    state: self.state(),
                })
            }
        }
    }
}

impl Default for CallEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_ms(since: DateTime<Utc>) -> u64 {
    (Utc::now() - since).num_milliseconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call() -> IncomingCall {
        IncomingCall::new(Some("Alice".into()), Some("wants to talk".into()))
    }

    #[test]
    fn begin_rings_and_arms_the_ringer() {
        let mut engine = CallEngine::new();
        let transition = engine.begin(call()).unwrap();
        assert_eq!(engine.state(), CallState::Ringing);
        assert_eq!(transition.state, CallState::Ringing);

        let active = engine.active_call().unwrap().clone();
        assert_eq!(
            transition.commands,
            vec![
                Command::PostAlert {
                    call: active.clone()
                },
                Command::StartRinger {
                    id: active.id,
                    timeout: RING_TIMEOUT,
                },
            ]
        );
        assert!(matches!(transition.event, Some(Event::RingStarted { .. })));
    }

    #[test]
    fn begin_while_active_is_rejected() {
        let mut engine = CallEngine::new();
        let first = call();
        let first_id = first.id;
        engine.begin(first).unwrap();

        let err = engine.begin(call()).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::AlreadyActive {
                state: CallState::Ringing,
            }
        );
        assert_eq!(engine.active_call().unwrap().id, first_id);
    }

    #[test]
    fn accept_resolves_with_navigation() {
        let mut engine = CallEngine::new();
        engine.begin(call()).unwrap();
        let id = engine.active_call().unwrap().id;

        let transition = engine.apply(ActionToken::Accept).unwrap();
        assert_eq!(transition.state, CallState::Accepted);
        assert_eq!(engine.state(), CallState::Accepted);
        assert!(engine.active_call().is_none());

        assert_eq!(transition.commands[0], Command::StopRinger { id });
        assert_eq!(transition.commands[1], Command::CancelAlert { id });
        match &transition.commands[2] {
            Command::OpenMain { payload } => {
                assert_eq!(payload.get("title").map(String::as_str), Some("Alice"));
            }
            other => panic!("expected OpenMain, got {other:?}"),
        }
    }

    #[test]
    fn reject_ends_the_presentation() {
        let mut engine = CallEngine::new();
        engine.begin(call()).unwrap();
        let id = engine.active_call().unwrap().id;

        let transition = engine.apply(ActionToken::Reject).unwrap();
        assert_eq!(transition.state, CallState::Rejected);
        assert_eq!(
            transition.commands,
            vec![
                Command::StopRinger { id },
                Command::CancelAlert { id },
                Command::EndPresentation,
            ]
        );
    }

    #[test]
    fn timeout_resolves_like_a_rejection() {
        let mut engine = CallEngine::new();
        engine.begin(call()).unwrap();

        let transition = engine.apply(ActionToken::Timeout).unwrap();
        assert_eq!(transition.state, CallState::TimedOut);
        assert!(matches!(transition.event, Some(Event::CallTimedOut { .. })));
        assert!(transition
            .commands
            .contains(&Command::EndPresentation));
    }

    #[test]
    fn timeout_after_resolution_is_invalid() {
        let mut engine = CallEngine::new();
        engine.begin(call()).unwrap();
        engine.apply(ActionToken::Accept).unwrap();

        let err = engine.apply(ActionToken::Timeout).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidTransition {
                action: "timeout",
                state: CallState::Accepted,
            }
        );
        assert_eq!(engine.state(), CallState::Accepted);
    }

    #[test]
    fn external_cancel_only_stops_the_ringer() {
        let mut engine = CallEngine::new();
        engine.begin(call()).unwrap();
        let id = engine.active_call().unwrap().id;

        let transition = engine.apply(ActionToken::ExternalCancel).unwrap();
        assert_eq!(transition.state, CallState::Cancelled);
        assert_eq!(transition.commands, vec![Command::StopRinger { id }]);
    }

    #[test]
    fn terminal_outcome_must_be_consumed() {
        let mut engine = CallEngine::new();
        engine.begin(call()).unwrap();
        engine.apply(ActionToken::Reject).unwrap();

        assert!(engine.begin(call()).is_err());
        assert_eq!(engine.consume(), Some(CallState::Rejected));
        assert_eq!(engine.state(), CallState::Idle);
        assert!(engine.begin(call()).is_ok());
    }

    #[test]
    fn consume_outside_terminal_is_none() {
        let mut engine = CallEngine::new();
        assert_eq!(engine.consume(), None);
        engine.begin(call()).unwrap();
        assert_eq!(engine.consume(), None);
        assert_eq!(engine.state(), CallState::Ringing);
    }

    #[test]
    fn noop_changes_nothing() {
        let mut engine = CallEngine::new();
        let transition = engine.apply(ActionToken::NoOp).unwrap();
        assert_eq!(transition.state, CallState::Idle);
        assert!(transition.commands.is_empty());
        assert!(transition.event.is_none());

        engine.begin(call()).unwrap();
        let transition = engine.apply(ActionToken::NoOp).unwrap();
        assert_eq!(transition.state, CallState::Ringing);
        assert!(transition.commands.is_empty());
    }

    #[test]
    fn ring_token_is_not_applicable() {
        let mut engine = CallEngine::new();
        let err = engine
            .apply(ActionToken::Ring {
                title: None,
                body: None,
            })
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[test]
    fn snapshot_reflects_the_ringing_call() {
        let mut engine = CallEngine::new();
        let snap = engine.snapshot();
        assert!(matches!(
            snap,
            Event::StateSnapshot {
                state: CallState::Idle,
                call_id: None,
                ..
            }
        ));

        engine.begin(call()).unwrap();
        let id = engine.active_call().unwrap().id;
        match engine.snapshot() {
            Event::StateSnapshot {
                state,
                call_id,
                title,
                ..
            } => {
                assert_eq!(state, CallState::Ringing);
                assert_eq!(call_id, Some(id));
                assert_eq!(title.as_deref(), Some("Alice"));
            }
            other => panic!("expected StateSnapshot, got {other:?}"),
        }
    }
}
