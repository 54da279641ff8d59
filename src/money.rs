//! Currency amounts as integer cents.
//!
//! Every monetary value in the engine (allocations, surpluses, estimates,
//! contracted values, reservations) is a [`Money`], so admission decisions never
//! depend on floating-point rounding.

use crate::errors::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Signed money amount represented as integer cents.
///
/// Displayed and serialized as a decimal string with two places:
///
/// ```rust
/// use pca_budget::money::Money;
///
/// let amount: Money = "60000,5".parse().unwrap();
/// assert_eq!(amount.cents(), 6_000_050);
/// assert_eq!(amount.to_string(), "60000.50");
/// assert!("1.234".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from integer cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole currency units.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// Raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `self + rhs`, or `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// `self - rhs`, or `None` on overflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// `self - rhs`, clamped to the representable range.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// `self + rhs`, failing with `InvalidInput` when the result does not fit.
    pub fn try_add(self, rhs: Self) -> Result<Self> {
        self.checked_add(rhs).ok_or_else(|| out_of_range(self, "+", rhs))
    }

    /// `self - rhs`, failing with `InvalidInput` when the result does not fit.
    pub fn try_sub(self, rhs: Self) -> Result<Self> {
        self.checked_sub(rhs).ok_or_else(|| out_of_range(self, "-", rhs))
    }

    /// Sum of `amounts`, failing with `InvalidInput` on overflow.
    pub fn try_sum<I>(amounts: I) -> Result<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |total, amount| total.try_add(amount))
    }
}

fn out_of_range(lhs: Money, op: &str, rhs: Money) -> Error {
    Error::InvalidInput {
        message: format!("{lhs} {op} {rhs} is out of the supported amount range"),
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidInput {
            message: format!("'{s}' is not a valid amount (use up to two decimals)"),
        };

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let normalized = digits.replace(',', ".");
        let (whole, frac) = normalized
            .split_once('.')
            .unwrap_or((normalized.as_str(), ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole_cents = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<i64>()
                .ok()
                .and_then(|w| w.checked_mul(100))
                .ok_or_else(invalid)?
        };
        let frac_cents = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse::<i64>().map_err(|_| invalid())?,
        };

        let cents = whole_cents.checked_add(frac_cents).ok_or_else(invalid)?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_accepts_common_forms() {
        assert_eq!("100000".parse::<Money>().unwrap().cents(), 10_000_000);
        assert_eq!("100000.01".parse::<Money>().unwrap().cents(), 10_000_001);
        assert_eq!("10,5".parse::<Money>().unwrap().cents(), 1050);
        assert_eq!(".5".parse::<Money>().unwrap().cents(), 50);
        assert_eq!("-20".parse::<Money>().unwrap().cents(), -2000);
        assert_eq!(" 7.00 ".parse::<Money>().unwrap(), Money::from_units(7));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "-", ".", "abc", "1.234", "1.2.3", "1e5", "--3", "99999999999999999999"] {
            let result = input.parse::<Money>();
            assert!(
                matches!(result, Err(Error::InvalidInput { .. })),
                "expected rejection for {input:?}"
            );
        }
    }

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-12_34).to_string(), "-12.34");
        assert_eq!(Money::from_units(130_000).to_string(), "130000.00");
    }

    #[test]
    fn test_sum_and_ordering() {
        let total =
            Money::try_sum([Money::from_units(50_000), Money::from_units(70_000)]).unwrap();
        assert_eq!(total, Money::from_units(120_000));
        assert!(total < Money::from_units(130_000));
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::ZERO.is_positive());
    }

    #[test]
    fn test_arithmetic_near_the_limit_fails_instead_of_wrapping() {
        let max = Money::from_cents(i64::MAX);
        let half = Money::from_cents(5_000_000_000_000_000_000);

        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert!(matches!(half.try_add(half), Err(Error::InvalidInput { .. })));
        assert!(matches!(
            Money::try_sum([half, half]),
            Err(Error::InvalidInput { .. })
        ));
        assert!(Money::from_cents(i64::MIN).try_sub(Money::from_cents(1)).is_err());
        assert_eq!(max.try_sub(half).unwrap().cents(), i64::MAX - 5_000_000_000_000_000_000);
        assert_eq!(
            Money::from_cents(i64::MIN).saturating_sub(max),
            Money::from_cents(i64::MIN)
        );

        // The largest amount the parser accepts is still representable
        let parsed: Money = "92233720368547758.07".parse().unwrap();
        assert_eq!(parsed, max);
        assert!("92233720368547758.08".parse::<Money>().is_err());
    }

    #[test]
    fn test_serde_uses_decimal_strings() {
        let json = serde_json::to_string(&Money::from_cents(6_000_050)).unwrap();
        assert_eq!(json, "\"60000.50\"");
        let back: Money = serde_json::from_str("\"60000.50\"").unwrap();
        assert_eq!(back.cents(), 6_000_050);
        assert!(serde_json::from_str::<Money>("\"1.999\"").is_err());
    }
}
