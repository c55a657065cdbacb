//! Monetary amounts.

use serde::{Deserialize, Serialize};

use juris_core::DomainError;

/// An amount held as integer cents.
///
/// On the wire it is a JSON number with two decimal places (`50000.0`,
/// `1234.56`); strings such as `"1234.56"` are accepted on input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "AmountRepr", into = "f64")]
pub struct Money {
    cents: i64,
}

/// Largest absolute value a `NUMERIC(15, 2)` column holds, in cents.
const MAX_CENTS: i64 = 999_999_999_999_999;

impl Money {
    pub const ZERO: Money = Money { cents: 0 };

    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Reject a negative amount, naming `field` in the error.
    pub fn non_negative(self, field: &str) -> Result<Self, DomainError> {
        if self.is_negative() {
            return Err(DomainError::field(field, "must not be negative"));
        }
        Ok(self)
    }

    /// Round a decimal amount to the nearest cent.
    pub fn from_decimal(amount: f64) -> Result<Self, DomainError> {
        if !amount.is_finite() {
            return Err(DomainError::validation("amount must be a finite number"));
        }
        let cents = (amount * 100.0).round();
        if cents.abs() > MAX_CENTS as f64 {
            return Err(DomainError::validation("amount is out of range"));
        }
        Ok(Self {
            cents: cents as i64,
        })
    }

    pub fn to_decimal(self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<AmountRepr> for Money {
    type Error = DomainError;

    fn try_from(repr: AmountRepr) -> Result<Self, Self::Error> {
        match repr {
            AmountRepr::Number(n) => Money::from_decimal(n),
            AmountRepr::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| DomainError::validation(format!("invalid amount: {s}")))
                .and_then(Money::from_decimal),
        }
    }
}

impl From<Money> for f64 {
    fn from(m: Money) -> f64 {
        m.to_decimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_numbers_and_strings() {
        let m: Money = serde_json::from_str("50000.00").unwrap();
        assert_eq!(m.cents(), 5_000_000);
        let m: Money = serde_json::from_str("\"1234.56\"").unwrap();
        assert_eq!(m.cents(), 123_456);
        let m: Money = serde_json::from_str("7").unwrap();
        assert_eq!(m.cents(), 700);
    }

    #[test]
    fn rounds_to_the_cent() {
        assert_eq!(Money::from_decimal(0.105).unwrap().cents(), 11);
        assert_eq!(Money::from_decimal(19.999).unwrap().cents(), 2000);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Money>("\"abc\"").is_err());
        assert!(serde_json::from_str::<Money>("1e30").is_err());
    }

    #[test]
    fn displays_two_places() {
        assert_eq!(Money::from_cents(5_000_000).to_string(), "50000.00");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
    }

    proptest! {
        #[test]
        fn wire_value_preserves_cents(cents in -MAX_CENTS / 1000..MAX_CENTS / 1000) {
            let m = Money::from_cents(cents);
            let json = serde_json::to_string(&m).unwrap();
            prop_assert_eq!(serde_json::from_str::<Money>(&json).unwrap(), m);
        }
    }
}
