//! PIN issuance core.
//!
//! A PIN is 6 bytes of OS randomness encoded with the standard base64 alphabet
//! without padding (always 8 characters). Every issued PIN is stored with the
//! caller supplied risks, the process wide claims and a validity window.
//! Uniqueness is left to the store: the `pins.code` column is `UNIQUE`.

pub mod claims;
pub mod code;
pub mod issuer;
pub mod store;
pub mod valid_for;

pub use self::claims::Claims;
pub use self::code::{generate_code, OsRandom, RandomSource, PIN_BYTES, PIN_LENGTH};
pub use self::issuer::{IssueError, Issuer};
pub use self::store::{PgPinStore, PinRecord, PinStore, StoreFuture};
pub use self::valid_for::ValidFor;

use serde::{Deserialize, Serialize};

/// Risk classification attached to an issued PIN. Opaque to this service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Risk(String);

impl Risk {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
