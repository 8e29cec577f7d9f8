//! Subcommand implementations and the plumbing they share.

pub mod alarm;
pub mod auth;
pub mod completions;
pub mod config;
pub mod friends;

use std::io::{self, BufRead, Write};

use chrono::NaiveDateTime;
use wakapp_core::{ApiClient, Config, Confirmation, Database, Session};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn open_session() -> Result<Session, wakapp_core::CoreError> {
    Ok(Session::restored(Database::open()?))
}

pub fn api(config: &Config) -> Result<ApiClient, wakapp_core::CoreError> {
    ApiClient::from_config(&config.api)
}

pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Ask the user to confirm. `assume_yes` skips the prompt.
pub fn confirm<T>(confirmation: &Confirmation<T>, assume_yes: bool) -> io::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    eprint!("{confirmation} [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
