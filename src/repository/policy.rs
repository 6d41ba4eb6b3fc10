//! Policy repository (singleton lending policy row)

use sqlx::{Pool, Postgres};

use crate::{
    config::PolicyDefaults,
    error::{AppError, AppResult},
    models::policy::{Policy, UpdatePolicy},
};

const POLICY_COLUMNS: &str = "max_borrow_limit, max_renewal_limit, expiry_date_days, \
                              consecutive_borrow_limit_days, categories, updated_at";

#[derive(Clone)]
pub struct PolicyRepository {
    pool: Pool<Postgres>,
}

impl PolicyRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Read the current policy. Fails with `NotFound` before the row is created.
    pub async fn get(&self) -> AppResult<Policy> {
        sqlx::query_as::<_, Policy>(&format!(
            "SELECT {} FROM policy WHERE id = 1",
            POLICY_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Lending policy has not been configured".to_string()))
    }

    /// Create the policy row from defaults if it does not exist yet.
    /// Returns true when a row was inserted.
    pub async fn ensure(&self, defaults: &PolicyDefaults) -> AppResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO policy (id, max_borrow_limit, max_renewal_limit, expiry_date_days,
                                consecutive_borrow_limit_days, categories)
            VALUES (1, $1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(defaults.max_borrow_limit)
        .bind(defaults.max_renewal_limit)
        .bind(defaults.expiry_date_days)
        .bind(defaults.consecutive_borrow_limit_days)
        .bind(&defaults.categories)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(inserted == 1)
    }

    /// Replace the policy values in place
    pub async fn upsert(&self, update: &UpdatePolicy, categories: &[String]) -> AppResult<Policy> {
        let policy = sqlx::query_as::<_, Policy>(&format!(
            r#"
            INSERT INTO policy (id, max_borrow_limit, max_renewal_limit, expiry_date_days,
                                consecutive_borrow_limit_days, categories, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, NOW())
            ON CONFLICT (id) DO UPDATE SET
                max_borrow_limit = EXCLUDED.max_borrow_limit,
                max_renewal_limit = EXCLUDED.max_renewal_limit,
                expiry_date_days = EXCLUDED.expiry_date_days,
                consecutive_borrow_limit_days = EXCLUDED.consecutive_borrow_limit_days,
                categories = EXCLUDED.categories,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            POLICY_COLUMNS
        ))
        .bind(update.max_borrow_limit)
        .bind(update.max_renewal_limit)
        .bind(update.expiry_date_days)
        .bind(update.consecutive_borrow_limit_days)
        .bind(categories)
        .fetch_one(&self.pool)
        .await?;
        Ok(policy)
    }
}
