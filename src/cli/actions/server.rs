use crate::{
    api,
    cli::telemetry,
    pin::{Claims, Issuer, OsRandom, PgPinStore},
};
use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: SecretString,
    pub max_connections: u32,
    pub claims: Claims,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the DSN is invalid, the database is unreachable, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let dsn = parse_dsn(args.dsn.expose_secret())?;

    log_startup_args(&args, &dsn);

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(args.max_connections)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn.as_str())
        .await
        .context("Failed to connect to database")?;

    let store = PgPinStore::new(pool.clone());
    store.ensure_schema().await?;

    let issuer = Arc::new(Issuer::new(
        Arc::new(store),
        Arc::new(OsRandom),
        args.claims,
    ));

    let result = api::new(args.port, pool, issuer).await;

    telemetry::shutdown_tracer();

    result
}

fn parse_dsn(dsn: &str) -> Result<Url> {
    let url = Url::parse(dsn).context("Invalid database connection string")?;

    match url.scheme() {
        "postgres" | "postgresql" => Ok(url),
        scheme => Err(anyhow!(
            "Unsupported database scheme {scheme}, expected postgres://"
        )),
    }
}

fn redact_dsn(dsn: &Url) -> String {
    let mut redacted = dsn.clone();
    if redacted.password().is_some() {
        let _ = redacted.set_password(Some("REDACTED"));
    }
    redacted.to_string()
}

fn log_startup_args(args: &Args, dsn: &Url) {
    let claims = args
        .claims
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(", ");

    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(dsn)),
        ("max_connections", args.max_connections.to_string()),
        ("claims", claims),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
