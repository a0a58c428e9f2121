use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const QUANTITY_MAX: u32 = 999;

/// Monetary amount in integer cents. Arithmetic is checked; overflow is a
/// validation error, never a wrap.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Result<Self, ValidationError> {
        if cents < 0 {
            return Err(ValidationError("amount must not be negative".to_string()));
        }
        Ok(Self(cents))
    }

    #[must_use]
    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Result<Money, ValidationError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| ValidationError("amount overflow".to_string()))
    }

    pub fn checked_mul(self, factor: Quantity) -> Result<Money, ValidationError> {
        self.0
            .checked_mul(i64::from(factor.get()))
            .map(Money)
            .ok_or_else(|| ValidationError("amount overflow".to_string()))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// A positive line quantity, capped to keep cart arithmetic bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value == 0 {
            return Err(ValidationError("quantity must be positive".to_string()));
        }
        if value > QUANTITY_MAX {
            return Err(ValidationError(format!(
                "quantity exceeds max {QUANTITY_MAX}"
            )));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
