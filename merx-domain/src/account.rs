//! Account and user entities (payment side).

use crate::money::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an Account
pub type AccountId = Uuid;

/// A user's monetary balance ledger
///
/// The account row is the per-user serialisation point of the payment
/// saga: it is read and debited under a row-level exclusive lock.
///
/// # Invariants
/// - `balance >= 0` at every committed state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: String,
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Open an account with a zero balance
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            balance: Amount::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// True if the balance covers `amount` in full
    pub fn can_cover(&self, amount: Amount) -> bool {
        self.balance.covers(amount)
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_account_starts_empty() {
        let account = Account::new("u1");
        assert_eq!(account.balance, Amount::zero());
        assert_eq!(account.user_id, "u1");
    }

    #[test]
    fn test_can_cover() {
        let mut account = Account::new("u1");
        account.balance = Amount::new(dec!(50)).unwrap();

        assert!(account.can_cover(Amount::new(dec!(50)).unwrap()));
        assert!(!account.can_cover(Amount::new(dec!(50.01)).unwrap()));
    }
}
