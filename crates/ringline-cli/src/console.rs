//! Terminal implementations of the platform collaborators.
//!
//! The alert surface prints a banner, the navigator prints destination
//! lines, and the ringer backend loops the terminal bell. None of these
//! block; the lifecycle dispatches to them from its command runner.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ringline_core::call::{PAYLOAD_BODY, PAYLOAD_TITLE};
use ringline_core::{
    CallId, IncomingCall, Navigator, NotificationSurface, PermissionGate, ResourceUnavailable,
    RingerBackend, RingerOutput,
};

/// Alert surface that draws a call banner on stdout.
pub struct ConsoleSurface;

impl NotificationSurface for ConsoleSurface {
    fn post(&self, call: &IncomingCall) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        println!();
        println!("── incoming call ─────────────────────── {stamp}");
        if let Some(title) = &call.title {
            println!("   {title}");
        }
        if let Some(body) = &call.body {
            println!("   {body}");
        }
        println!("   [a]ccept  [r]eject  [d]ismiss");
    }

    fn cancel(&self, _id: CallId) {
        println!("── alert dismissed ────────────────────────────");
    }
}

/// Navigator that narrates screen changes on stdout.
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn open_main(&self, payload: HashMap<String, String>) {
        println!();
        match payload.get(PAYLOAD_TITLE) {
            Some(title) => println!("connected: {title}"),
            None => println!("connected"),
        }
        if let Some(body) = payload.get(PAYLOAD_BODY) {
            println!("{body}");
        }
    }

    fn end_presentation(&self) {
        println!();
        println!("call screen closed");
    }
}

/// Permission gate backed by the `notifications.enabled` config key.
pub struct ConfigGate {
    granted: bool,
}

impl ConfigGate {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }
}

impl PermissionGate for ConfigGate {
    fn notifications_granted(&self) -> bool {
        self.granted
    }
}

/// Rings by writing the terminal bell character on a loop.
pub struct TerminalBell;

impl RingerBackend for TerminalBell {
    fn acquire(&self) -> Result<Box<dyn RingerOutput>, ResourceUnavailable> {
        Ok(Box::new(BellLoop {
            running: Arc::new(AtomicBool::new(false)),
        }))
    }

    fn release(&self, _output: Box<dyn RingerOutput>) {}
}

struct BellLoop {
    running: Arc<AtomicBool>,
}

impl RingerOutput for BellLoop {
    fn play_looping(&mut self) {
        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        std::thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                print!("\x07");
                let _ = std::io::stdout().flush();
                std::thread::sleep(Duration::from_secs(2));
            }
        });
    }

    fn stop(&mut self) {
        // The bell thread exits at its next wake.
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for BellLoop {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
