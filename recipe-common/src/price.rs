//! Fixed-point recipe price
//!
//! Prices are decimals with at most 5 significant digits and 2 decimal
//! places (`999.99` is the largest value). They are stored as integer cents
//! and rendered as strings with exactly two decimals, e.g. `"5.00"`.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Total significant digits allowed
pub const MAX_DIGITS: usize = 5;

/// Digits allowed after the decimal point
pub const DECIMAL_PLACES: usize = 2;

/// Reasons a price string is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("A valid number is required.")]
    Invalid,

    #[error("Ensure that there are no more than {} digits in total.", MAX_DIGITS)]
    TooManyDigits,

    #[error("Ensure that there are no more than {} decimal places.", DECIMAL_PLACES)]
    TooManyDecimalPlaces,

    #[error("Ensure that there are no more than {} digits before the decimal point.", MAX_DIGITS - DECIMAL_PLACES)]
    TooManyWholeDigits,
}

/// Price in integer cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price {
    cents: i64,
}

impl Price {
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub const fn cents(&self) -> i64 {
        self.cents
    }

    /// Parse a JSON string or number
    pub fn from_json(value: &Value) -> Result<Self, PriceError> {
        match value {
            Value::String(s) => s.parse(),
            Value::Number(n) => n.to_string().parse(),
            _ => Err(PriceError::Invalid),
        }
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(PriceError::Invalid);
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PriceError::Invalid);
        }

        // Significant digits: leading zeros never count, but decimal places always do
        let significant = format!("{}{}", whole, fraction);
        let significant = significant.trim_start_matches('0').len();
        let decimals = fraction.len();
        let digits = significant.max(decimals);

        if digits > MAX_DIGITS {
            return Err(PriceError::TooManyDigits);
        }
        if decimals > DECIMAL_PLACES {
            return Err(PriceError::TooManyDecimalPlaces);
        }
        if digits - decimals > MAX_DIGITS - DECIMAL_PLACES {
            return Err(PriceError::TooManyWholeDigits);
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| PriceError::Invalid)?
        };
        let fraction: i64 = format!("{:0<2}", fraction).parse().map_err(|_| PriceError::Invalid)?;

        let cents = whole * 100 + fraction;
        Ok(Self::from_cents(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Price::from_json(&value).map_err(de::Error::custom)
    }
}
