//! Lending policy service

use crate::{
    config::PolicyDefaults,
    error::{AppError, AppResult},
    models::policy::{Policy, UpdatePolicy},
    repository::Repository,
};

#[derive(Clone)]
pub struct PolicyService {
    repository: Repository,
}

impl PolicyService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_policy(&self) -> AppResult<Policy> {
        self.repository.policy.get().await
    }

    /// Replace the policy. Loans already open keep their due dates.
    pub async fn update_policy(&self, update: UpdatePolicy) -> AppResult<Policy> {
        let categories = update.normalized_categories();
        if categories.is_empty() {
            return Err(AppError::Validation(
                "At least one non-blank category is required".to_string(),
            ));
        }
        let policy = self.repository.policy.upsert(&update, &categories).await?;
        tracing::info!(
            max_borrow_limit = policy.max_borrow_limit,
            max_renewal_limit = policy.max_renewal_limit,
            expiry_date_days = policy.expiry_date_days,
            consecutive_borrow_limit_days = policy.consecutive_borrow_limit_days,
            "Lending policy updated"
        );
        Ok(policy)
    }

    /// Startup precondition: the policy row must exist before any borrow
    pub async fn ensure_policy(&self, defaults: &PolicyDefaults) -> AppResult<Policy> {
        if self.repository.policy.ensure(defaults).await? {
            tracing::info!("Lending policy initialized from configuration defaults");
        }
        self.repository.policy.get().await
    }
}
