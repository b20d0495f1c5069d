//! User accounts and the cash balance.
//!
//! Balance mutation goes through `tsim-ledger::cash` inside a write
//! transaction: read the row, apply the rule, persist the result. An error
//! from the rule layer rolls the transaction back, so a rejected withdrawal
//! leaves the stored balance untouched.

use sqlx::SqliteConnection;
use tsim_ledger::{cash, Money};

use crate::auth;
use crate::error::is_unique_violation;
use crate::{Store, StoreError};

impl Store {
    /// Register a new user with a salted-hash credential and zero balance.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<i64, StoreError> {
        let hash = auth::hash_password(password);
        let res = sqlx::query(
            "insert into users (username, password_hash, email) values (?1, ?2, ?3)",
        )
        .bind(username)
        .bind(&hash)
        .bind(email)
        .execute(self.pool())
        .await;

        match res {
            Ok(done) => {
                tracing::info!(username, "user created");
                Ok(done.last_insert_rowid())
            }
            Err(e) if is_unique_violation(&e, "users.username") => {
                Err(StoreError::DuplicateUsername {
                    username: username.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check a login credential. Unknown users fail verification the same
    /// way a wrong password does.
    pub async fn verify_user(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("select password_hash from users where username = ?1")
                .bind(username)
                .fetch_optional(self.pool())
                .await?;

        Ok(match row {
            Some((stored,)) => auth::verify_password(&stored, password),
            None => false,
        })
    }

    /// Numeric id for a username.
    pub async fn user_id(&self, username: &str) -> Result<i64, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as("select id from users where username = ?1")
            .bind(username)
            .fetch_optional(self.pool())
            .await?;
        row.map(|(id,)| id).ok_or_else(|| StoreError::UnknownUser {
            username: username.to_string(),
        })
    }

    /// Delete a user. Portfolios and their positions go with it (cascade).
    pub async fn delete_user(&self, username: &str) -> Result<(), StoreError> {
        let done = sqlx::query("delete from users where username = ?1")
            .bind(username)
            .execute(self.pool())
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::UnknownUser {
                username: username.to_string(),
            });
        }
        tracing::info!(username, "user deleted");
        Ok(())
    }

    /// Current cash balance.
    pub async fn balance(&self, username: &str) -> Result<Money, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("select balance_micros from users where username = ?1")
                .bind(username)
                .fetch_optional(self.pool())
                .await?;
        row.map(|(b,)| Money::new(b))
            .ok_or_else(|| StoreError::UnknownUser {
                username: username.to_string(),
            })
    }

    /// Credit the balance. Persisted before returning; the new balance is
    /// the returned value.
    pub async fn deposit(&self, username: &str, amount: Money) -> Result<Money, StoreError> {
        let mut tx = self.begin().await?;
        let new_balance = Self::deposit_tx(&mut tx, username, amount).await?;
        tx.commit().await?;
        Ok(new_balance)
    }

    /// Debit the balance; fails without side effect when it would go
    /// negative.
    pub async fn withdraw(&self, username: &str, amount: Money) -> Result<Money, StoreError> {
        let mut tx = self.begin().await?;
        let new_balance = Self::withdraw_tx(&mut tx, username, amount).await?;
        tx.commit().await?;
        Ok(new_balance)
    }

    /// Transaction-scoped deposit, for composition inside a trade.
    pub async fn deposit_tx(
        tx: &mut sqlx::Transaction<'static, sqlx::Sqlite>,
        username: &str,
        amount: Money,
    ) -> Result<Money, StoreError> {
        let balance = Self::balance_in(&mut **tx, username).await?;
        let new_balance = cash::deposit(balance, amount)?;
        Self::set_balance_in(&mut **tx, username, new_balance).await?;
        Ok(new_balance)
    }

    /// Transaction-scoped withdrawal, for composition inside a trade.
    pub async fn withdraw_tx(
        tx: &mut sqlx::Transaction<'static, sqlx::Sqlite>,
        username: &str,
        amount: Money,
    ) -> Result<Money, StoreError> {
        let balance = Self::balance_in(&mut **tx, username).await?;
        let new_balance = cash::withdraw(balance, amount)?;
        Self::set_balance_in(&mut **tx, username, new_balance).await?;
        Ok(new_balance)
    }

    /// Transaction-scoped balance read.
    pub async fn balance_tx(
        tx: &mut sqlx::Transaction<'static, sqlx::Sqlite>,
        username: &str,
    ) -> Result<Money, StoreError> {
        Self::balance_in(&mut **tx, username).await
    }

    async fn balance_in(conn: &mut SqliteConnection, username: &str) -> Result<Money, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("select balance_micros from users where username = ?1")
                .bind(username)
                .fetch_optional(conn)
                .await?;
        row.map(|(b,)| Money::new(b))
            .ok_or_else(|| StoreError::UnknownUser {
                username: username.to_string(),
            })
    }

    async fn set_balance_in(
        conn: &mut SqliteConnection,
        username: &str,
        balance: Money,
    ) -> Result<(), StoreError> {
        sqlx::query("update users set balance_micros = ?1 where username = ?2")
            .bind(balance.raw())
            .bind(username)
            .execute(conn)
            .await?;
        Ok(())
    }
}
