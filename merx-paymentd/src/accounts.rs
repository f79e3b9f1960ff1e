//! Account and user services backing the HTTP boundary.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use merx_domain::{Account, Amount, User};

use crate::error::{PaymentdError, PaymentdResult};
use crate::store::{AccountRepository, UserRepository};

/// Coordinates account lifecycle and balance operations
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { accounts, users }
    }

    /// Open an account for a user
    ///
    /// # Errors
    /// `Conflict` if the user already has an account.
    pub async fn create_account(&self, user_id: &str) -> PaymentdResult<Account> {
        let account = Account::new(user_id);
        self.accounts.create(&account).await?;

        info!(user_id, account_id = %account.id, "Account created");
        Ok(account)
    }

    /// Look up an account by user id
    pub async fn get_account(&self, user_id: &str) -> PaymentdResult<Option<Account>> {
        self.accounts.get_by_user_id(user_id).await
    }

    /// Add funds to an account
    pub async fn deposit(&self, user_id: &str, amount: Decimal) -> PaymentdResult<()> {
        let amount = positive_amount(amount)?;

        let updated = self.accounts.credit(user_id, amount).await?;
        if updated == 0 {
            return Err(PaymentdError::NotFound(format!(
                "account not found: {}",
                user_id
            )));
        }

        info!(user_id, %amount, "Deposit applied");
        Ok(())
    }

    /// Remove funds from an account
    ///
    /// # Errors
    /// `BusinessRule` when the balance does not cover the amount.
    pub async fn withdraw(&self, user_id: &str, amount: Decimal) -> PaymentdResult<()> {
        let amount = positive_amount(amount)?;

        // Existence first, so a missing account is a 404 rather than a
        // funds error.
        if self.accounts.get_by_user_id(user_id).await?.is_none() {
            return Err(PaymentdError::NotFound(format!(
                "account not found: {}",
                user_id
            )));
        }

        let updated = self.accounts.debit_guarded(user_id, amount).await?;
        if updated == 0 {
            return Err(PaymentdError::BusinessRule("insufficient funds".to_string()));
        }

        info!(user_id, %amount, "Withdrawal applied");
        Ok(())
    }

    /// Register a user
    pub async fn create_user(&self, name: &str) -> PaymentdResult<User> {
        let user = User::new(name);
        self.users.create(&user).await?;
        Ok(user)
    }

    /// Look up a user
    pub async fn get_user(&self, id: Uuid) -> PaymentdResult<Option<User>> {
        self.users.get(id).await
    }

    /// List all users
    pub async fn list_users(&self) -> PaymentdResult<Vec<User>> {
        self.users.list().await
    }
}

fn positive_amount(amount: Decimal) -> PaymentdResult<Amount> {
    if amount <= Decimal::ZERO {
        return Err(PaymentdError::InvalidCommand(
            "amount must be positive".to_string(),
        ));
    }
    Ok(Amount::new(amount)?)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryAccountStore, MemoryUserStore};
    use rust_decimal_macros::dec;

    fn service() -> AccountService {
        AccountService::new(
            Arc::new(MemoryAccountStore::new()),
            Arc::new(MemoryUserStore::new()),
        )
    }

    #[tokio::test]
    async fn test_create_account_then_deposit() {
        let service = service();
        service.create_account("u1").await.unwrap();

        service.deposit("u1", dec!(100)).await.unwrap();

        let account = service.get_account("u1").await.unwrap().unwrap();
        assert_eq!(account.balance.as_decimal(), dec!(100));
    }

    #[tokio::test]
    async fn test_duplicate_account_is_conflict() {
        let service = service();
        service.create_account("u1").await.unwrap();

        let result = service.create_account("u1").await;
        assert!(matches!(result, Err(PaymentdError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds_is_business_rule() {
        let service = service();
        service.create_account("u1").await.unwrap();
        service.deposit("u1", dec!(10)).await.unwrap();

        let result = service.withdraw("u1", dec!(40)).await;
        assert!(matches!(result, Err(PaymentdError::BusinessRule(_))));

        // Balance untouched
        let account = service.get_account("u1").await.unwrap().unwrap();
        assert_eq!(account.balance.as_decimal(), dec!(10));
    }

    #[tokio::test]
    async fn test_withdraw_from_missing_account_is_not_found() {
        let result = service().withdraw("ghost", dec!(5)).await;
        assert!(matches!(result, Err(PaymentdError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_positive_amounts_are_rejected() {
        let service = service();
        service.create_account("u1").await.unwrap();

        assert!(matches!(
            service.deposit("u1", dec!(0)).await,
            Err(PaymentdError::InvalidCommand(_))
        ));
        assert!(matches!(
            service.withdraw("u1", dec!(-5)).await,
            Err(PaymentdError::InvalidCommand(_))
        ));
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let service = service();

        let user = service.create_user("Alice").await.unwrap();
        let fetched = service.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Alice");

        assert_eq!(service.list_users().await.unwrap().len(), 1);
    }
}
