//! Map validated CLI matches to the action the binary executes.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{ARG_CLAIM, ARG_DSN, ARG_MAX_CONNECTIONS, ARG_PORT};
use crate::pin::Claims;
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let max_connections = matches
        .get_one::<u32>(ARG_MAX_CONNECTIONS)
        .copied()
        .unwrap_or(5);

    // Without explicit claims every PIN carries the placeholder pairs.
    let claims = matches
        .get_many::<(String, String)>(ARG_CLAIM)
        .map_or_else(Claims::default, |pairs| pairs.cloned().collect());

    Ok(Action::Server(Args {
        port,
        dsn: SecretString::from(dsn),
        max_connections,
        claims,
    }))
}
