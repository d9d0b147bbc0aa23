use clap::Subcommand;
use ringline_core::DeviceTokenStore;

#[derive(Subcommand)]
pub enum TokenAction {
    /// Print the stored device push token
    Get,
    /// Store a device push token
    Set {
        /// Token issued by the push transport
        token: String,
    },
    /// Remove the stored token
    Clear,
}

pub fn run(action: TokenAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = DeviceTokenStore::open()?;
    match action {
        TokenAction::Get => match store.get()? {
            Some(token) => println!("{token}"),
            None => println!("no token stored"),
        },
        TokenAction::Set { token } => {
            store.set(&token)?;
            println!("ok");
        }
        TokenAction::Clear => {
            store.clear()?;
            println!("ok");
        }
    }
    Ok(())
}
