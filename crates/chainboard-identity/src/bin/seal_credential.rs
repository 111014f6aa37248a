//! Seal a provider token for storage
//!
//! Reads the token from stdin and prints the sealed credential JSON, ready
//! for `TWITTER_BEARER_TOKEN_SEALED` / `DISCORD_BOT_TOKEN_SEALED` or the
//! dashboard's credential store. Uses the same `CREDENTIAL_SECRET` as the
//! service.
//!
//! ```sh
//! printf '%s' "$TOKEN" | CREDENTIAL_SECRET=... seal-credential
//! ```

use std::io::Read;
use std::process::ExitCode;

use credential_vault::{Vault, VaultConfig};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("seal-credential: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout carries only the sealed JSON
    let env_filter = EnvFilter::from_default_env().add_directive("credential_vault=warn".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let vault = Vault::new(&VaultConfig::from_env()?)?;

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let token = input.trim_end_matches(['\r', '\n']);

    let sealed = vault
        .seal(token)?
        .ok_or("no token on stdin; nothing to seal")?;

    println!("{}", serde_json::to_string(&sealed)?);
    Ok(())
}
