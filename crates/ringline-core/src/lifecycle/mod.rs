mod engine;
mod service;

pub use engine::{CallEngine, CallState, Command, Transition, RING_TIMEOUT};
pub use service::CallLifecycle;
