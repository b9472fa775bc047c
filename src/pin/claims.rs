//! Claims attached to every issued PIN.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_CLAIMS: [(&str, &str); 2] = [("lab", "test r us"), ("batch", "test batch number")];

/// Fixed key/value metadata describing where issued PINs come from.
///
/// The same map is attached to every PIN issued by one process; it is never
/// derived from request input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Claims(BTreeMap<String, String>);

impl Claims {
    #[must_use]
    pub fn new(claims: BTreeMap<String, String>) -> Self {
        Self(claims)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for Claims {
    fn default() -> Self {
        DEFAULT_CLAIMS.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Claims {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parse a single `key=value` claim. The key is trimmed, the value is kept as is.
///
/// # Errors
/// Returns an error if the `=` separator is missing or the key is empty.
pub fn parse_pair(pair: &str) -> Result<(String, String)> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid claim {pair:?}, expected key=value"))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("invalid claim {pair:?}, key must not be empty"));
    }

    Ok((key.to_string(), value.to_string()))
}
