//! PIN code generation.

use anyhow::{anyhow, Result};
use base64ct::{Base64Unpadded, Encoding};
use rand::{rngs::OsRng, RngCore};

/// Random bytes drawn per PIN.
pub const PIN_BYTES: usize = 6;

/// Length of the encoded PIN, `ceil(PIN_BYTES * 4 / 3)` with no padding.
pub const PIN_LENGTH: usize = 8;

/// Source of cryptographically secure random bytes.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    ///
    /// # Errors
    /// Returns an error if the source cannot supply the bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// Operating system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|err| anyhow!("failed to read random bytes: {err}"))
    }
}

/// Draw [`PIN_BYTES`] from `source` and encode them as an unpadded base64 code.
///
/// # Errors
/// Returns the random source error unchanged.
pub fn generate_code(source: &dyn RandomSource) -> Result<String> {
    let mut bytes = [0u8; PIN_BYTES];
    source.fill(&mut bytes)?;
    Ok(Base64Unpadded::encode_string(&bytes))
}
