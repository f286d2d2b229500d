use crate::error::QrisError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Largest unique code accepted alongside a base amount (inclusive).
pub const MAX_UNIQUE_CODE: u32 = 999;

/// A strictly positive transaction amount.
///
/// Wraps `rust_decimal::Decimal` so the value written into tag 54 is always
/// rendered with exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MonetaryAmount(Decimal);

impl MonetaryAmount {
    pub fn new(value: Decimal) -> Result<Self, QrisError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(QrisError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    /// Builds an amount from a whole number of currency units.
    pub fn from_units(units: u64) -> Result<Self, QrisError> {
        Self::new(Decimal::from(units))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Fixed-point rendering with two fractional digits, e.g. `10338.00`.
    pub fn to_field(&self) -> String {
        let mut value = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(2);
        value.to_string()
    }
}

impl TryFrom<Decimal> for MonetaryAmount {
    type Error = QrisError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MonetaryAmount> for Decimal {
    fn from(amount: MonetaryAmount) -> Self {
        amount.0
    }
}

/// How the caller expresses the amount of a dynamic payload.
///
/// Either a base amount plus a small unique code that makes the total
/// distinguishable on the merchant's statement, or the total itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountInput {
    BaseWithCode { base: u64, unique_code: u32 },
    Total(u64),
}

impl AmountInput {
    /// Validates the loose optional fields a request carries.
    ///
    /// Exactly one of `amount` or `base_amount` must be present; `unique_code`
    /// is required with, and only meaningful for, `base_amount`.
    pub fn from_parts(
        base_amount: Option<i64>,
        unique_code: Option<i64>,
        amount: Option<i64>,
    ) -> Result<Self, QrisError> {
        match (base_amount, amount) {
            (Some(_), Some(_)) => Err(QrisError::ValidationError(
                "Provide either base_amount + unique_code, or amount, not both".to_string(),
            )),
            (None, None) => Err(QrisError::ValidationError(
                "Provide either base_amount + unique_code, or amount".to_string(),
            )),
            (None, Some(total)) => {
                let total = positive(total, "amount")?;
                Ok(AmountInput::Total(total))
            }
            (Some(base), None) => {
                let base = positive(base, "base_amount")?;
                let code = unique_code.ok_or_else(|| {
                    QrisError::ValidationError(
                        "unique_code is required when using base_amount".to_string(),
                    )
                })?;
                let unique_code = u32::try_from(code)
                    .ok()
                    .filter(|c| *c <= MAX_UNIQUE_CODE)
                    .ok_or_else(|| {
                        QrisError::ValidationError(format!(
                            "unique_code must be an integer between 0 and {}",
                            MAX_UNIQUE_CODE
                        ))
                    })?;
                Ok(AmountInput::BaseWithCode { base, unique_code })
            }
        }
    }

    pub fn total(&self) -> Result<u64, QrisError> {
        match *self {
            AmountInput::Total(total) => Ok(total),
            AmountInput::BaseWithCode { base, unique_code } => base
                .checked_add(u64::from(unique_code))
                .ok_or_else(|| QrisError::ValidationError("Invalid total amount".to_string())),
        }
    }

    pub fn base_amount(&self) -> Option<u64> {
        match *self {
            AmountInput::BaseWithCode { base, .. } => Some(base),
            AmountInput::Total(_) => None,
        }
    }

    pub fn unique_code(&self) -> Option<u32> {
        match *self {
            AmountInput::BaseWithCode { unique_code, .. } => Some(unique_code),
            AmountInput::Total(_) => None,
        }
    }
}

fn positive(value: i64, field: &str) -> Result<u64, QrisError> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| QrisError::ValidationError(format!("Invalid {}", field)))
}
