//! Monetary value object and domain errors.
//!
//! All amounts in the system (order totals, item prices, account balances)
//! are exact decimals. Floating point never touches money.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Monetary amounts must be non-negative
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Item quantities must be positive
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Orders must contain at least one item
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// Unknown order status string
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),
}

// =============================================================================
// Amount
// =============================================================================

/// Amount represents a non-negative monetary value
///
/// # Invariants
/// - Must be >= 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new Amount with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidAmount` if value < 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO {
            return Err(DomainError::InvalidAmount(
                "Amount must be non-negative".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// The zero amount
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// True if this amount can cover `other` in full
    pub fn covers(&self, other: Amount) -> bool {
        self.0 >= other.0
    }

    /// Add another amount
    pub fn plus(&self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }

    /// Subtract another amount
    ///
    /// # Errors
    /// Returns `DomainError::InvalidAmount` if the result would be negative
    pub fn minus(&self, other: Amount) -> Result<Amount, DomainError> {
        Amount::new(self.0 - other.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_rejects_negative() {
        assert!(Amount::new(dec!(-0.01)).is_err());
        assert!(Amount::new(dec!(0)).is_ok());
        assert!(Amount::new(dec!(25.0)).is_ok());
    }

    #[test]
    fn test_amount_covers() {
        let balance = Amount::new(dec!(100)).unwrap();
        assert!(balance.covers(Amount::new(dec!(50)).unwrap()));
        assert!(balance.covers(Amount::new(dec!(100)).unwrap()));
        assert!(!balance.covers(Amount::new(dec!(100.01)).unwrap()));
    }

    #[test]
    fn test_amount_minus_never_goes_negative() {
        let balance = Amount::new(dec!(10)).unwrap();
        let debit = Amount::new(dec!(40)).unwrap();
        assert!(balance.minus(debit).is_err());

        let remaining = Amount::new(dec!(60))
            .unwrap()
            .minus(Amount::new(dec!(40)).unwrap())
            .unwrap();
        assert_eq!(remaining.as_decimal(), dec!(20));
    }

    #[test]
    fn test_amount_serializes_transparently() {
        let amount = Amount::new(dec!(50.0)).unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
