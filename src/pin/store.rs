//! PIN persistence.

use super::{Claims, Risk};
use anyhow::{Context, Result};
use sqlx::PgPool;
use std::{future::Future, pin::Pin, time::Duration};
use tracing::{info_span, instrument, Instrument};
use uuid::Uuid;

pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A PIN as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRecord {
    pub id: Uuid,
    pub code: String,
    pub risks: Vec<Risk>,
    pub claims: Claims,
    pub valid_for: Duration,
}

/// Persistence capability needed to issue PINs.
pub trait PinStore: Send + Sync {
    /// Insert a new PIN. Implementations must not overwrite an existing code.
    fn insert_pin<'a>(
        &'a self,
        code: &'a str,
        risks: &'a [Risk],
        claims: &'a Claims,
        valid_for: Duration,
    ) -> StoreFuture<'a, PinRecord>;
}

#[derive(Debug, Clone)]
pub struct PgPinStore {
    pool: PgPool,
}

impl PgPinStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `pins` table and its indexes when missing.
    ///
    /// # Errors
    /// Returns an error if the schema statements fail.
    pub async fn ensure_schema(&self) -> Result<()> {
        let span = info_span!("db.query", db.system = "postgresql", db.operation = "CREATE");
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to apply pins schema")?;
        Ok(())
    }

    #[instrument(skip(self, code, claims))]
    async fn insert(
        &self,
        code: &str,
        risks: &[Risk],
        claims: &Claims,
        valid_for: Duration,
    ) -> Result<PinRecord> {
        let query = r"
            INSERT INTO pins (id, code, risks, claims, valid_until)
            VALUES ($1, $2, $3::jsonb, $4::jsonb, NOW() + make_interval(secs => $5))
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );

        let id = Uuid::now_v7();
        let risks_json = serde_json::to_string(risks).context("failed to encode risks")?;
        let claims_json = serde_json::to_string(claims).context("failed to encode claims")?;

        sqlx::query(query)
            .bind(id)
            .bind(code)
            .bind(risks_json)
            .bind(claims_json)
            .bind(valid_for.as_secs_f64())
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert PIN")?;

        Ok(PinRecord {
            id,
            code: code.to_string(),
            risks: risks.to_vec(),
            claims: claims.clone(),
            valid_for,
        })
    }
}

impl PinStore for PgPinStore {
    fn insert_pin<'a>(
        &'a self,
        code: &'a str,
        risks: &'a [Risk],
        claims: &'a Claims,
        valid_for: Duration,
    ) -> StoreFuture<'a, PinRecord> {
        Box::pin(self.insert(code, risks, claims, valid_for))
    }
}
