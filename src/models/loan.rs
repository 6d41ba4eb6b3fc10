//! Loan (borrow record) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Loan row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub copy_id: i32,
    pub member_id: i32,
    pub borrowed_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub returned: bool,
    pub renewal_count: i32,
    pub reminder_email_sent: bool,
}

/// Loan with the borrowed copy's title, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetails {
    pub id: i32,
    pub copy_id: i32,
    pub book_code: String,
    pub name: String,
    pub member_id: i32,
    pub borrowed_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub renewal_count: i32,
}

/// Ledger row used by dashboards: loan state plus the copy's category
#[derive(Debug, Clone, FromRow)]
pub struct LedgerEntry {
    pub loan_id: i32,
    pub member_id: i32,
    pub category: String,
    pub returned: bool,
    pub expiry_date: DateTime<Utc>,
}

impl LedgerEntry {
    /// Active and past its due date
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.returned && self.expiry_date <= now
    }
}

/// Active loan that is close to expiry and has not been reminded yet
#[derive(Debug, Clone, FromRow)]
pub struct DueLoan {
    pub loan_id: i32,
    pub member_name: String,
    pub member_email: String,
    pub book_name: String,
    pub expiry_date: DateTime<Utc>,
}
