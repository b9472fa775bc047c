//! Validity window of an issued PIN.
//!
//! Accepted on the wire either as a duration string (`"24h"`, `"1h30m"`,
//! `"1.5h"`, `"250ms"`) or as an integer number of nanoseconds.

use anyhow::{anyhow, Result};
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};
use std::{fmt, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidFor(Duration);

impl ValidFor {
    /// Build a validity window, rejecting zero length windows.
    ///
    /// # Errors
    /// Returns an error if `duration` is zero.
    pub fn new(duration: Duration) -> Result<Self> {
        if duration.is_zero() {
            return Err(anyhow!("validFor must be greater than zero"));
        }
        Ok(Self(duration))
    }

    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        self.0
    }
}

impl TryFrom<&str> for ValidFor {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(parse_duration(value)?)
    }
}

const NANOSECOND: u128 = 1;
const MICROSECOND: u128 = 1_000 * NANOSECOND;
const MILLISECOND: u128 = 1_000 * MICROSECOND;
const SECOND: u128 = 1_000 * MILLISECOND;
const MINUTE: u128 = 60 * SECOND;
const HOUR: u128 = 60 * MINUTE;

// Digits past this are dropped, they are below nanosecond precision anyway.
const MAX_FRACTION_DIGITS: u32 = 18;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(NANOSECOND),
        "us" | "µs" | "μs" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Parse a duration string made of `<number><unit>` terms, e.g. `1h30m`.
///
/// # Errors
/// Returns an error on empty input, negative values, a missing or unknown unit,
/// or an overflowing total.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let original = input;
    let mut rest = input.trim();

    if rest.starts_with('-') {
        return Err(anyhow!("invalid duration {original:?}: must not be negative"));
    }
    rest = rest.strip_prefix('+').unwrap_or(rest);

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(anyhow!("invalid duration {original:?}"));
    }

    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                after_dot.split_at(frac_len)
            }
            None => ("", after_int),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(anyhow!("invalid duration {original:?}"));
        }

        let unit_len = after_number
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_number.len());
        let (unit, remainder) = after_number.split_at(unit_len);

        if unit.is_empty() {
            return Err(anyhow!("missing unit in duration {original:?}"));
        }
        let scale = unit_nanos(unit)
            .ok_or_else(|| anyhow!("unknown unit {unit:?} in duration {original:?}"))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| anyhow!("invalid duration {original:?}"))?
        };

        let mut term = whole
            .checked_mul(scale)
            .ok_or_else(|| anyhow!("invalid duration {original:?}: overflow"))?;

        if !frac_part.is_empty() {
            let digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS as usize)];
            let fraction: u128 = digits
                .parse()
                .map_err(|_| anyhow!("invalid duration {original:?}"))?;
            let divisor = 10u128.pow(u32::try_from(digits.len()).unwrap_or(MAX_FRACTION_DIGITS));
            term = fraction
                .checked_mul(scale)
                .map(|scaled| scaled / divisor)
                .and_then(|fraction_nanos| term.checked_add(fraction_nanos))
                .ok_or_else(|| anyhow!("invalid duration {original:?}: overflow"))?;
        }

        total = total
            .checked_add(term)
            .ok_or_else(|| anyhow!("invalid duration {original:?}: overflow"))?;
        rest = remainder;
    }

    let nanos =
        u64::try_from(total).map_err(|_| anyhow!("invalid duration {original:?}: overflow"))?;

    Ok(Duration::from_nanos(nanos))
}

struct ValidForVisitor;

impl Visitor<'_> for ValidForVisitor {
    type Value = ValidFor;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a duration string such as \"24h\" or an integer number of nanoseconds")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        ValidFor::try_from(value).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        ValidFor::new(Duration::from_nanos(value)).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        let nanos = u64::try_from(value)
            .map_err(|_| E::custom("validFor must not be negative"))?;
        self.visit_u64(nanos)
    }
}

impl<'de> Deserialize<'de> for ValidFor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValidForVisitor)
    }
}
