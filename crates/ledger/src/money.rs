use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Money amount represented as **integer centavos**.
///
/// Every monetary value in the ledger (entry amounts, daily totals) uses this
/// type to keep summation exact regardless of iteration order.
///
/// # Examples
///
/// ```rust
/// use ledger::Money;
///
/// let amount = Money::new(150_000);
/// assert_eq!(amount.format(), "1.500,00");
/// assert_eq!(amount.to_string(), "R$ 1.500,00");
/// ```
///
/// Parsing from a display string (`.` groups thousands, `,` separates
/// decimals; rejects more than 2 decimals and negative input):
///
/// ```rust
/// use ledger::Money;
///
/// assert_eq!("1.500,00".parse::<Money>().unwrap().centavos(), 150_000);
/// assert_eq!("150".parse::<Money>().unwrap().centavos(), 15_000);
/// assert!("12,345".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer centavos.
    #[must_use]
    pub const fn new(centavos: i64) -> Self {
        Self(centavos)
    }

    /// Returns the raw value in centavos.
    #[must_use]
    pub const fn centavos(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Renders the amount without the currency symbol: `1.500,00`.
    ///
    /// This is the editable-input and CSV form. The `Display` impl prepends
    /// the symbol for read-only views.
    #[must_use]
    pub fn format(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = group_thousands(abs / 100);
        let centavos = abs % 100;
        format!("{sign}{units},{centavos:02}")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = Money::new(self.0.wrapping_abs());
        write!(f, "{sign}R$ {}", abs.format())
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

/// Re-renders accumulated keystrokes as a masked amount string.
///
/// All non-digit characters are dropped and the remaining digits are read
/// right-to-left as centavos, so typing `1`, `5`, `0` yields `0,01` →
/// `0,15` → `1,50`. Empty input yields `0,00`. The mask is idempotent:
/// feeding its own output back through the digit filter reproduces it.
#[must_use]
pub fn mask_digits(raw: &str) -> String {
    let centavos = raw
        .chars()
        .filter(char::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10)
                .saturating_add(i64::from(digit as u8 - b'0'))
        });
    Money::new(centavos).format()
}

fn group_thousands(units: u64) -> String {
    let digits = units.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && i % 3 == offset {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

impl FromStr for Money {
    type Err = LedgerError;

    /// Parses a display amount into centavos.
    ///
    /// `.` is treated as a thousands separator and stripped, `,` as the
    /// decimal separator. Validation rules:
    /// - max 2 fractional digits (rejects `12,345`)
    /// - rejects empty, negative and otherwise malformed strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || LedgerError::InvalidAmount("empty amount".to_string());
        let invalid = || LedgerError::InvalidAmount("invalid amount".to_string());
        let overflow = || LedgerError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }
        if trimmed.starts_with('-') {
            return Err(LedgerError::InvalidAmount(
                "negative amounts are not accepted".to_string(),
            ));
        }

        let normalized = trimmed.replace('.', "");
        let mut parts = normalized.split(',');
        let units_str = parts.next().ok_or_else(invalid)?;
        let centavos_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = units_str.parse().map_err(|_| invalid())?;

        let centavos: i64 = match centavos_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => {
                        return Err(LedgerError::InvalidAmount(
                            "too many decimals".to_string(),
                        ));
                    }
                }
            }
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(centavos))
            .ok_or_else(overflow)?;

        Ok(Money(total))
    }
}
