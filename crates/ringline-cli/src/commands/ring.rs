use std::collections::HashMap;
use std::io::BufRead;

use clap::Args;
use ringline_core::router::{ACTION_ACCEPT_CALL, ACTION_DISMISS_ALERT, ACTION_REJECT_CALL};
use ringline_core::{CallLifecycle, Config, IncomingCall, RingerBackend, SilentBackend};

use crate::console::{ConfigGate, ConsoleNavigator, ConsoleSurface, TerminalBell};

#[derive(Args)]
pub struct RingArgs {
    /// Caller name shown on the alert
    #[arg(long)]
    pub title: Option<String>,
    /// Alert body line
    #[arg(long)]
    pub body: Option<String>,
    /// Ring without the terminal bell
    #[arg(long)]
    pub silent: bool,
    /// Stream lifecycle events as JSON lines instead of the banner
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: RingArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(ring_session(args, config))
}

async fn ring_session(args: RingArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let audio: Box<dyn RingerBackend> = if args.silent || !config.ring.sound {
        Box::new(SilentBackend)
    } else {
        Box::new(TerminalBell)
    };
    let lifecycle = CallLifecycle::new(
        Box::new(ConsoleSurface),
        Box::new(ConsoleNavigator),
        Box::new(ConfigGate::new(config.notifications.enabled)),
        audio,
    );
    let mut events = lifecycle.subscribe();

    lifecycle.begin(IncomingCall::new(args.title, args.body))?;

    // Blocking stdin reader bridged into the select loop.
    let (line_tx, mut line_rx) = tokio::sync::mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut stdin_open = true;
    let outcome = loop {
        tokio::select! {
            state = lifecycle.resolved() => break state,
            event = events.recv(), if args.json => {
                if let Ok(event) = event {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
            line = line_rx.recv(), if stdin_open => match line {
                Some(input) => dispatch(&lifecycle, input.trim()),
                None => stdin_open = false,
            },
        }
    };

    if args.json {
        // Flush events that raced the terminal transition.
        while let Ok(event) = events.try_recv() {
            println!("{}", serde_json::to_string(&event)?);
        }
    } else {
        println!();
        println!("{outcome}");
    }
    lifecycle.consume();
    Ok(())
}

fn dispatch(lifecycle: &CallLifecycle, input: &str) {
    let raw = match input {
        "" => return,
        "a" | "accept" => ACTION_ACCEPT_CALL,
        "r" | "reject" => ACTION_REJECT_CALL,
        "d" | "dismiss" => ACTION_DISMISS_ALERT,
        other => other,
    };
    if let Err(err) = lifecycle.handle(raw, &HashMap::new()) {
        tracing::debug!(error = %err, "input ignored");
    }
}
