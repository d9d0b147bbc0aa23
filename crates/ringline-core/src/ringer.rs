//! Ringer control: exclusive ownership of the audible-alert resource and
//! the ring-timeout timer.
//!
//! A ring session starts when a call begins ringing and is stopped exactly
//! once when the call resolves. Stopping is idempotent. Transition side
//! effects execute outside the lifecycle lock, so a resolve can overtake
//! its own session's start: retiring a session that never started leaves a
//! tombstone for that id, and the belated start is suppressed when it
//! arrives, even when other sessions start in between.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::call::CallId;
use crate::error::ResourceUnavailable;

/// Provider of the exclusive audible-alert resource.
///
/// Acquisition may fail when the environment withholds the resource; the
/// ring session then proceeds silently. Losing the resource mid-ring mutes
/// playback but never forces a lifecycle transition.
pub trait RingerBackend: Send + Sync {
    fn acquire(&self) -> Result<Box<dyn RingerOutput>, ResourceUnavailable>;

    /// Return a stopped output to the environment.
    fn release(&self, output: Box<dyn RingerOutput>);
}

/// A playable audible output.
pub trait RingerOutput: Send {
    /// Loop playback until `stop`.
    fn play_looping(&mut self);

    fn stop(&mut self);
}

/// Backend that always acquires a no-op output.
pub struct SilentBackend;

impl RingerBackend for SilentBackend {
    fn acquire(&self) -> Result<Box<dyn RingerOutput>, ResourceUnavailable> {
        Ok(Box::new(SilentOutput))
    }

    fn release(&self, _output: Box<dyn RingerOutput>) {}
}

struct SilentOutput;

impl RingerOutput for SilentOutput {
    fn play_looping(&mut self) {}

    fn stop(&mut self) {}
}

/// Cancellation token for one ring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingerHandle {
    session: CallId,
}

impl RingerHandle {
    pub fn session(&self) -> CallId {
        self.session
    }
}

/// One ringing period: the acquired output (if any) and the armed timer.
struct RingerSession {
    session: CallId,
    started_at: DateTime<Utc>,
    output: Option<Box<dyn RingerOutput>>,
    timer: JoinHandle<()>,
}

struct Sessions {
    /// The session owning the resource, if any.
    active: Option<RingerSession>,
    /// Ids resolved before their start arrived; each entry suppresses
    /// exactly one belated start.
    retired: HashSet<CallId>,
}

/// Owner of the ring sessions. At most one session is active.
///
/// Requires a tokio runtime: the ring timeout is a spawned sleep task.
pub struct Ringer {
    backend: Box<dyn RingerBackend>,
    sessions: Mutex<Sessions>,
}

impl Ringer {
    pub fn new(backend: Box<dyn RingerBackend>) -> Self {
        Self {
            backend,
            sessions: Mutex::new(Sessions {
                active: None,
                retired: HashSet::new(),
            }),
        }
    }

    /// Start a ring session: acquire the audible resource and arm the
    /// timeout. `on_timeout` fires once unless the session is stopped first.
    ///
    /// Acquisition failure is soft: the session rings silently. A session
    /// already retired by [`Ringer::retire`] returns its handle without
    /// acquiring anything or arming the timer.
    pub fn start<F>(&self, session: CallId, timeout: Duration, on_timeout: F) -> RingerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = RingerHandle { session };
        let mut sessions = self.lock_sessions();
        if sessions.retired.remove(&session) {
            tracing::debug!(session = %session, "ring start suppressed; session already resolved");
            return handle;
        }
        if let Some(stale) = sessions.active.take() {
            tracing::warn!(stale = %stale.session, "replacing a leftover ring session");
            self.teardown(stale);
        }
        let output = match self.backend.acquire() {
            Ok(mut output) => {
                output.play_looping();
                Some(output)
            }
            Err(err) => {
                tracing::warn!(session = %session, error = %err, "ringing silently");
                None
            }
        };
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            on_timeout();
        });
        sessions.active = Some(RingerSession {
            session,
            started_at: Utc::now(),
            output,
            timer,
        });
        handle
    }

    /// Stop a ring session: abort the timer, stop playback, release the
    /// resource. Idempotent; the release happens at most once per session.
    pub fn stop(&self, handle: RingerHandle) {
        let mut sessions = self.lock_sessions();
        match take_matching(&mut sessions.active, handle.session) {
            Some(active) => self.teardown(active),
            // The handle proves the start ran; nothing to suppress.
            None => {
                tracing::debug!(session = %handle.session, "stop for a non-active session ignored");
            }
        }
    }

    /// Record that `session` resolved before its start command executed; the
    /// belated start is suppressed when it arrives, even if other sessions
    /// start in between. Tears the session down instead when its start got
    /// in first.
    pub fn retire(&self, session: CallId) {
        let mut sessions = self.lock_sessions();
        match take_matching(&mut sessions.active, session) {
            Some(active) => self.teardown(active),
            None => {
                sessions.retired.insert(session);
            }
        }
    }

    /// Id of the active ring session, if any.
    pub fn active_session(&self) -> Option<CallId> {
        self.lock_sessions()
            .active
            .as_ref()
            .map(|active| active.session)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn teardown(&self, mut session: RingerSession) {
        session.timer.abort();
        if let Some(mut output) = session.output.take() {
            output.stop();
            self.backend.release(output);
        }
        let ringing_ms = (Utc::now() - session.started_at).num_milliseconds();
        tracing::debug!(session = %session.session, ringing_ms, "ring session stopped");
    }

    fn lock_sessions(&self) -> MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(|err| err.into_inner())
    }
}

/// Take the active session out only when its id matches.
fn take_matching(active: &mut Option<RingerSession>, session: CallId) -> Option<RingerSession> {
    if matches!(active, Some(current) if current.session == session) {
        active.take()
    } else {
        None
    }
}
