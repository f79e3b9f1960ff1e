//! Payment service persistence.
//!
//! Repositories back the HTTP boundary (account/user lifecycle). The
//! payment saga does not go through these: it owns its transaction and
//! locks the account row directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use merx_domain::{Account, Amount, User};

use crate::error::PaymentdResult;

// =============================================================================
// Repository Traits
// =============================================================================

/// Repository for Account entities
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create an account; the user id is unique
    async fn create(&self, account: &Account) -> PaymentdResult<()>;

    /// Find an account by user id
    async fn get_by_user_id(&self, user_id: &str) -> PaymentdResult<Option<Account>>;

    /// Add funds. Returns the number of rows updated (0 = no such account).
    async fn credit(&self, user_id: &str, amount: Amount) -> PaymentdResult<u64>;

    /// Remove funds, guarded so the balance never goes negative.
    ///
    /// Returns the number of rows updated (0 = no such account or
    /// insufficient balance).
    async fn debit_guarded(&self, user_id: &str, amount: Amount) -> PaymentdResult<u64>;
}

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> PaymentdResult<()>;
    async fn get(&self, id: Uuid) -> PaymentdResult<Option<User>>;
    async fn list(&self) -> PaymentdResult<Vec<User>>;
}

// =============================================================================
// PostgreSQL Implementations
// =============================================================================

/// PostgreSQL-backed account repository
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_account(row: &PgRow) -> PaymentdResult<Account> {
    let balance: Decimal = row.try_get("balance")?;

    Ok(Account {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        balance: Amount::new(balance)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl AccountRepository for PgAccountStore {
    async fn create(&self, account: &Account) -> PaymentdResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, user_id, balance, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.id)
        .bind(&account.user_id)
        .bind(account.balance.as_decimal())
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_user_id(&self, user_id: &str) -> PaymentdResult<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, balance, created_at, updated_at
            FROM accounts
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn credit(&self, user_id: &str, amount: Amount) -> PaymentdResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance + $1, updated_at = NOW()
            WHERE user_id = $2
            "#,
        )
        .bind(amount.as_decimal())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn debit_guarded(&self, user_id: &str, amount: Amount) -> PaymentdResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance - $1, updated_at = NOW()
            WHERE user_id = $2 AND balance >= $1
            "#,
        )
        .bind(amount.as_decimal())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// PostgreSQL-backed user repository
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &PgRow) -> PaymentdResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl UserRepository for PgUserStore {
    async fn create(&self, user: &User) -> PaymentdResult<()> {
        sqlx::query("INSERT INTO users (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(&user.name)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> PaymentdResult<Option<User>> {
        let row = sqlx::query("SELECT id, name, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn list(&self) -> PaymentdResult<Vec<User>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_user).collect()
    }
}

// =============================================================================
// In-Memory Implementations (for tests)
// =============================================================================

/// In-memory account repository
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: std::sync::Mutex<Vec<Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountStore {
    async fn create(&self, account: &Account) -> PaymentdResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|a| a.user_id == account.user_id) {
            return Err(crate::error::PaymentdError::Conflict(
                "account already exists".to_string(),
            ));
        }
        accounts.push(account.clone());
        Ok(())
    }

    async fn get_by_user_id(&self, user_id: &str) -> PaymentdResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user_id == user_id)
            .cloned())
    }

    async fn credit(&self, user_id: &str, amount: Amount) -> PaymentdResult<u64> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.iter_mut().find(|a| a.user_id == user_id) {
            Some(account) => {
                account.balance = account.balance.plus(amount);
                account.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn debit_guarded(&self, user_id: &str, amount: Amount) -> PaymentdResult<u64> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.iter_mut().find(|a| a.user_id == user_id) {
            Some(account) if account.balance.covers(amount) => {
                account.balance = account.balance.minus(amount)?;
                account.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

/// In-memory user repository
#[derive(Default)]
pub struct MemoryUserStore {
    users: std::sync::Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserStore {
    async fn create(&self, user: &User) -> PaymentdResult<()> {
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> PaymentdResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn list(&self) -> PaymentdResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }
}
