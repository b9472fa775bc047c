use super::{generate_code, Claims, PinRecord, PinStore, RandomSource, Risk};
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, error, instrument};

/// Why a PIN could not be issued. Both variants carry the underlying message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
    Entropy(String),
    Store(String),
}

impl IssueError {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Entropy(message) | Self::Store(message) => message,
        }
    }
}

impl fmt::Display for IssueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for IssueError {}

/// Issues PINs: draws a code, attaches the claims, stores it once.
pub struct Issuer {
    store: Arc<dyn PinStore>,
    random: Arc<dyn RandomSource>,
    claims: Claims,
}

impl Issuer {
    #[must_use]
    pub fn new(store: Arc<dyn PinStore>, random: Arc<dyn RandomSource>, claims: Claims) -> Self {
        Self {
            store,
            random,
            claims,
        }
    }

    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Issue a new PIN.
    ///
    /// Makes exactly one store call, and none when the random source fails.
    ///
    /// # Errors
    /// [`IssueError::Entropy`] if no random bytes could be drawn,
    /// [`IssueError::Store`] if the insert failed.
    #[instrument(skip(self))]
    pub async fn issue(
        &self,
        risks: &[Risk],
        valid_for: Duration,
    ) -> Result<PinRecord, IssueError> {
        let code = generate_code(self.random.as_ref()).map_err(|err| {
            error!("Failed to generate PIN: {:#}", err);
            IssueError::Entropy(format!("{err:#}"))
        })?;

        let record = self
            .store
            .insert_pin(&code, risks, &self.claims, valid_for)
            .await
            .map_err(|err| {
                error!("Failed to store PIN: {:#}", err);
                IssueError::Store(format!("{err:#}"))
            })?;

        debug!("Issued PIN record {}", record.id);

        Ok(record)
    }
}

impl fmt::Debug for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Issuer")
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}
