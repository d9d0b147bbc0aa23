//! Concurrency boundary around the call engine.
//!
//! Every transition runs under one mutex: read state, decide validity,
//! write state, collect commands. Command execution happens strictly after
//! the lock releases; collaborator calls never run under it, so they can
//! be slow or reentrant-hostile without risk. Concurrent triggers (user tap,
//! ring timeout, external dismissal) serialize at the mutex; the first
//! writer wins and losers get a benign `InvalidTransition`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, watch};

use crate::call::{CallId, IncomingCall};
use crate::error::LifecycleError;
use crate::events::Event;
use crate::ringer::{Ringer, RingerBackend, RingerHandle};
use crate::router::{route, ActionToken};
use crate::surface::{Navigator, NotificationSurface, PermissionGate};

use super::engine::{CallEngine, CallState, Command, Transition};

const EVENT_CAPACITY: usize = 64;

/// Shared handle to the incoming-call lifecycle. Cheap to clone.
///
/// Requires a tokio runtime: ring timeouts are scheduled as tasks.
#[derive(Clone)]
pub struct CallLifecycle {
    inner: Arc<Shared>,
}

struct Shared {
    engine: Mutex<CallEngine>,
    ringer: Ringer,
    /// Handle of the active ring session, held between the start and stop
    /// commands.
    active_ring: Mutex<Option<RingerHandle>>,
    surface: Box<dyn NotificationSurface>,
    navigator: Box<dyn Navigator>,
    permissions: Box<dyn PermissionGate>,
    state_tx: watch::Sender<CallState>,
    events_tx: broadcast::Sender<Event>,
}

impl CallLifecycle {
    pub fn new(
        surface: Box<dyn NotificationSurface>,
        navigator: Box<dyn Navigator>,
        permissions: Box<dyn PermissionGate>,
        audio: Box<dyn RingerBackend>,
    ) -> Self {
        let (state_tx, _) = watch::channel(CallState::Idle);
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Shared {
                engine: Mutex::new(CallEngine::new()),
                ringer: Ringer::new(audio),
                active_ring: Mutex::new(None),
                surface,
                navigator,
                permissions,
                state_tx,
                events_tx,
            }),
        }
    }

    // ── Triggers ─────────────────────────────────────────────────────

    /// Ring a fresh call: post the alert (permission-gated) and start the
    /// ring session with the timeout armed.
    pub fn begin(&self, call: IncomingCall) -> Result<(), LifecycleError> {
        let transition = {
            let mut engine = self.lock_engine();
            engine.begin(call)?
        };
        self.finish(transition);
        Ok(())
    }

    /// Apply a routed action and return the resulting state.
    ///
    /// The losing side of a resolution race gets `InvalidTransition`;
    /// callers log it and move on.
    pub fn apply(&self, action: ActionToken) -> Result<CallState, LifecycleError> {
        let transition = {
            let mut engine = self.lock_engine();
            engine.apply(action)?
        };
        let state = transition.state;
        self.finish(transition);
        Ok(state)
    }

    /// Route one raw inbound token and drive the lifecycle with it.
    ///
    /// `full_screen` begins a new call from the payload; everything else
    /// applies to the current one.
    pub fn handle(
        &self,
        raw: &str,
        payload: &HashMap<String, String>,
    ) -> Result<CallState, LifecycleError> {
        match route(raw, payload) {
            ActionToken::Ring { title, body } => {
                self.begin(IncomingCall::new(title, body))?;
                Ok(CallState::Ringing)
            }
            token => self.apply(token),
        }
    }

    /// Observe the terminal outcome and return the machine to `Idle`.
    pub fn consume(&self) -> Option<CallState> {
        let outcome = {
            let mut engine = self.lock_engine();
            engine.consume()
        };
        if outcome.is_some() {
            self.inner.state_tx.send_replace(CallState::Idle);
        }
        outcome
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn current(&self) -> CallState {
        self.lock_engine().state()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        self.lock_engine().snapshot()
    }

    /// Watch lifecycle state changes.
    pub fn watch_state(&self) -> watch::Receiver<CallState> {
        self.inner.state_tx.subscribe()
    }

    /// Subscribe to the lifecycle event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.events_tx.subscribe()
    }

    /// Wait until the current call reaches a terminal state.
    pub async fn resolved(&self) -> CallState {
        let mut rx = self.watch_state();
        // The wait_for borrow must end before `rx` drops; keep the binding.
        let terminal = rx.wait_for(|state| state.is_terminal()).await;
        match terminal {
            Ok(state) => *state,
            Err(_) => self.current(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Execute a transition's side effects and publish it. Runs strictly
    /// after the engine lock is released.
    fn finish(&self, transition: Transition) {
        let Transition {
            state,
            event,
            commands,
        } = transition;
        for command in commands {
            self.run_command(command);
        }
        if let Some(event) = event {
            let _ = self.inner.events_tx.send(event);
        }
        self.inner.state_tx.send_replace(state);
    }

    fn run_command(&self, command: Command) {
        match command {
            Command::PostAlert { call } => {
                if self.inner.permissions.notifications_granted() {
                    self.inner.surface.post(&call);
                } else {
                    tracing::debug!(call_id = %call.id, "notification permission not granted; alert skipped");
                }
            }
            Command::CancelAlert { id } => self.inner.surface.cancel(id),
            Command::StartRinger { id, timeout } => {
                // A resolve can overtake this command. Start only while the
                // call is still the one ringing; the ringer's tombstone
                // covers the window after this check.
                if self.lock_engine().active_call().map(|call| call.id) != Some(id) {
                    tracing::debug!(call_id = %id, "ring start for a resolved call skipped");
                    return;
                }
                let lifecycle = self.clone();
                let handle = self
                    .inner
                    .ringer
                    .start(id, timeout, move || lifecycle.timeout_fired(id));
                *self.lock_active_ring() = Some(handle);
            }
            Command::StopRinger { id } => {
                let handle = {
                    let mut active = self.lock_active_ring();
                    match *active {
                        Some(handle) if handle.session() == id => active.take(),
                        _ => None,
                    }
                };
                match handle {
                    Some(handle) => self.inner.ringer.stop(handle),
                    // No handle stored: the start has not completed, so the
                    // ringer retires the session.
                    None => self.inner.ringer.retire(id),
                }
            }
            Command::OpenMain { payload } => self.inner.navigator.open_main(payload),
            Command::EndPresentation => self.inner.navigator.end_presentation(),
        }
    }

    /// Timeout entry used by the ring timer task.
    ///
    /// Checked against the session id so a timer that survives its own
    /// cancellation can never resolve a later call.
    fn timeout_fired(&self, session: CallId) {
        let transition = {
            let mut engine = self.lock_engine();
            if engine.active_call().map(|call| call.id) != Some(session) {
                tracing::debug!(call_id = %session, "ring timeout for a resolved call ignored");
                return;
            }
            match engine.apply(ActionToken::Timeout) {
                Ok(transition) => transition,
                Err(err) => {
                    tracing::debug!(call_id = %session, error = %err, "late ring timeout ignored");
                    return;
                }
            }
        };
        self.finish(transition);
    }

    fn lock_engine(&self) -> MutexGuard<'_, CallEngine> {
        self.inner.engine.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn lock_active_ring(&self) -> MutexGuard<'_, Option<RingerHandle>> {
        self.inner
            .active_ring
            .lock()
            .unwrap_or_else(|err| err.into_inner())
    }
}
