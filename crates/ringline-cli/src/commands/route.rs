use std::collections::HashMap;

use clap::Args;
use ringline_core::call::{PAYLOAD_BODY, PAYLOAD_TITLE};
use ringline_core::route;

#[derive(Args)]
pub struct RouteArgs {
    /// Raw action token (e.g. "accept_call", "full_screen")
    pub raw: String,
    /// Payload title, read by full_screen
    #[arg(long)]
    pub title: Option<String>,
    /// Payload body, read by full_screen
    #[arg(long)]
    pub body: Option<String>,
}

pub fn run(args: RouteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut payload = HashMap::new();
    if let Some(title) = args.title {
        payload.insert(PAYLOAD_TITLE.to_string(), title);
    }
    if let Some(body) = args.body {
        payload.insert(PAYLOAD_BODY.to_string(), body);
    }

    let token = route(&args.raw, &payload);
    println!("{}", serde_json::to_string_pretty(&token)?);
    Ok(())
}
