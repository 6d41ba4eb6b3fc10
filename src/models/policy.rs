//! Lending policy (singleton configuration row)

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// System-wide borrowing constraints
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Maximum number of concurrent active loans per member
    pub max_borrow_limit: i32,
    /// Maximum number of renewals per loan
    pub max_renewal_limit: i32,
    /// Loan duration in days
    pub expiry_date_days: i32,
    /// Days a member must wait before borrowing a copy they returned
    pub consecutive_borrow_limit_days: i32,
    /// Valid copy categories
    pub categories: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    pub fn loan_duration(&self) -> Duration {
        Duration::days(i64::from(self.expiry_date_days))
    }

    pub fn cooldown(&self) -> Duration {
        Duration::days(i64::from(self.consecutive_borrow_limit_days))
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// Update policy request (admin only)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePolicy {
    #[validate(range(min = 1, message = "Borrow limit must be at least 1"))]
    pub max_borrow_limit: i32,
    #[validate(range(min = 0, message = "Renewal limit cannot be negative"))]
    pub max_renewal_limit: i32,
    #[validate(range(min = 1, max = 365, message = "Loan duration must be 1-365 days"))]
    pub expiry_date_days: i32,
    #[validate(range(min = 0, max = 365, message = "Cool-down must be 0-365 days"))]
    pub consecutive_borrow_limit_days: i32,
    #[validate(length(min = 1, message = "At least one category is required"))]
    pub categories: Vec<String>,
}

impl UpdatePolicy {
    /// Trimmed, non-empty, deduplicated categories in first-seen order
    pub fn normalized_categories(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.categories.len());
        for c in &self.categories {
            let c = c.trim();
            if !c.is_empty() && !out.iter().any(|seen| seen == c) {
                out.push(c.to_string());
            }
        }
        out
    }
}

/// How a renewal computes the new due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalBase {
    /// Restart the full loan duration from the renewal time
    #[default]
    FromNow,
    /// Add the loan duration to the current due date
    FromPreviousExpiry,
}

impl RenewalBase {
    /// New due date for a renewal. Never earlier than the current due date,
    /// even if the policy duration was shortened since the loan started.
    pub fn renewed_expiry(
        self,
        now: DateTime<Utc>,
        current_expiry: DateTime<Utc>,
        duration: Duration,
    ) -> DateTime<Utc> {
        let base = match self {
            RenewalBase::FromNow => now,
            RenewalBase::FromPreviousExpiry => current_expiry,
        };
        (base + duration).max(current_expiry)
    }
}
