//! Repository layer for database operations

pub mod copies;
pub mod loans;
pub mod members;
pub mod policy;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub copies: copies::CopiesRepository,
    pub loans: loans::LoansRepository,
    pub members: members::MembersRepository,
    pub policy: policy::PolicyRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            copies: copies::CopiesRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            members: members::MembersRepository::new(pool.clone()),
            policy: policy::PolicyRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
