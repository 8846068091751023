use std::{fmt, str::FromStr};

use crate::StagingError;

/// Signed amount in **minor units** (cents) of the row's own currency.
///
/// Currency is informational in staging: amounts are never converted, only
/// validated and handed back to the ledger as decimals.
///
/// # Examples
///
/// ```rust
/// use staging::Amount;
///
/// assert_eq!("12,5".parse::<Amount>().unwrap().minor(), 1250);
/// assert_eq!(Amount::new(-1500).to_string(), "-15.00");
/// assert!("1.005".parse::<Amount>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Converts a parser-provided decimal, rounding to the nearest cent.
    ///
    /// Returns `None` for NaN, infinities and values outside the `i64` range.
    #[must_use]
    pub fn from_major(value: f64) -> Option<Self> {
        let scaled = (value * 100.0).round();
        if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Self(scaled as i64))
    }

    /// Decimal value sent to the ledger.
    #[must_use]
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Amount {
    type Err = StagingError;

    /// Parses user input such as `15`, `-12.50` or `12,5`.
    ///
    /// At most two fractional digits; no thousands separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = |reason: &str| StagingError::InvalidAmount(reason.to_string());

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, trimmed[1..].trim_start()),
            Some(b'+') => (false, trimmed[1..].trim_start()),
            _ => (false, trimmed),
        };
        if digits.is_empty() {
            return Err(reject("empty amount"));
        }

        let normalized = digits.replace(',', ".");
        let (whole, fraction) = match normalized.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (normalized.as_str(), ""),
        };

        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) {
            return Err(reject("not a number"));
        }
        if fraction.len() > 2 {
            return Err(reject("too many decimals"));
        }

        let too_large = || reject("amount too large");
        let whole: i64 = whole.parse().map_err(|_| too_large())?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| reject("not a number"))? * 10,
            _ => fraction.parse::<i64>().map_err(|_| reject("not a number"))?,
        };

        let total = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(too_large)?;

        Ok(Self(if negative { -total } else { total }))
    }
}
