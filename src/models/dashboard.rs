//! Dashboard rollups over the loan ledger

use serde::Serialize;
use utoipa::ToSchema;

use super::loan::LoanDetails;

/// Loan counts shared by both dashboard scopes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanCounts {
    /// Every loan ever recorded in scope
    pub total: i64,
    /// Loans not yet returned
    pub active: i64,
    /// Loans not yet returned whose due date has passed
    pub expired: i64,
}

/// Borrow statistics for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: String,
    pub total_loans: i64,
    pub active_loans: i64,
}

/// Library-wide dashboard (staff)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemDashboard {
    pub loans: LoanCounts,
    pub categories: Vec<CategoryStats>,
}

/// Dashboard for a single member
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberDashboard {
    pub member_id: i32,
    pub loans: LoanCounts,
    pub active_loans: Vec<LoanDetails>,
}

/// Either dashboard, tagged with its scope on the wire
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum Dashboard {
    System(SystemDashboard),
    Member(MemberDashboard),
}
