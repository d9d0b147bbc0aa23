//! # Ringline Core Library
//!
//! This library provides the core logic for Ringline, an incoming-call
//! alert system. The lifecycle of one call -- ring, then exactly one of
//! accept / reject / timeout / external cancel -- is driven by a pure state
//! machine, with platform I/O (alert surface, navigation, audio) behind
//! collaborator traits so host shells stay thin.
//!
//! ## Architecture
//!
//! - **Lifecycle**: [`CallEngine`] validates transitions and emits commands;
//!   [`CallLifecycle`] serializes concurrent triggers, executes commands
//!   outside its lock and publishes state/events over tokio channels
//! - **Ringer**: exclusive audible-resource ownership and the fixed 30 s
//!   ring timeout, soft-failing to a silent ring
//! - **Router**: maps raw inbound action tokens onto the closed
//!   [`ActionToken`] vocabulary
//! - **Storage**: TOML configuration and device push-token persistence
//!
//! ## Key Components
//!
//! - [`CallEngine`]: pure incoming-call state machine
//! - [`CallLifecycle`]: concurrency boundary and command runner
//! - [`Ringer`]: ring session owner
//! - [`Config`]: application configuration management

pub mod call;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod ringer;
pub mod router;
pub mod storage;
pub mod surface;

pub use call::{CallId, IncomingCall};
pub use error::{ConfigError, LifecycleError, ResourceUnavailable};
pub use events::Event;
pub use lifecycle::{CallEngine, CallLifecycle, CallState, Command, Transition, RING_TIMEOUT};
pub use ringer::{Ringer, RingerBackend, RingerHandle, RingerOutput, SilentBackend};
pub use router::{route, try_route, ActionToken};
pub use storage::{Config, DeviceTokenStore};
pub use surface::{AlwaysGranted, Navigator, NotificationSurface, PermissionGate};
