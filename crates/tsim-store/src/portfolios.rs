//! Portfolio rows: each belongs to exactly one user, named uniquely within
//! that user. Deleting one cascades to its positions.

use crate::error::is_unique_violation;
use crate::{Store, StoreError};

impl Store {
    /// Create a portfolio for `user_id`.
    pub async fn create_portfolio(&self, user_id: i64, name: &str) -> Result<i64, StoreError> {
        let res = sqlx::query("insert into portfolios (user_id, name) values (?1, ?2)")
            .bind(user_id)
            .bind(name)
            .execute(self.pool())
            .await;

        match res {
            Ok(done) => {
                tracing::info!(user_id, name, "portfolio created");
                Ok(done.last_insert_rowid())
            }
            Err(e) if is_unique_violation(&e, "portfolios.user_id") => {
                Err(StoreError::DuplicatePortfolioName {
                    name: name.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a portfolio by owner + name. Positions cascade.
    pub async fn delete_portfolio(&self, user_id: i64, name: &str) -> Result<(), StoreError> {
        let done = sqlx::query("delete from portfolios where user_id = ?1 and name = ?2")
            .bind(user_id)
            .bind(name)
            .execute(self.pool())
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::UnknownPortfolio {
                portfolio: name.to_string(),
            });
        }
        tracing::info!(user_id, name, "portfolio deleted");
        Ok(())
    }

    /// Resolve a (user, name) pair to the portfolio id.
    pub async fn portfolio_id(&self, user_id: i64, name: &str) -> Result<i64, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("select id from portfolios where user_id = ?1 and name = ?2")
                .bind(user_id)
                .bind(name)
                .fetch_optional(self.pool())
                .await?;
        row.map(|(id,)| id)
            .ok_or_else(|| StoreError::UnknownPortfolio {
                portfolio: name.to_string(),
            })
    }

    /// All portfolio names belonging to a user, in creation order.
    pub async fn portfolio_names(&self, user_id: i64) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("select name from portfolios where user_id = ?1 order by id")
                .bind(user_id)
                .fetch_all(self.pool())
                .await?;
        Ok(rows.into_iter().map(|(n,)| n).collect())
    }
}
