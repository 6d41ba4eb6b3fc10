//! Dashboard service: read-only rollups over the loan ledger

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        dashboard::{CategoryStats, Dashboard, LoanCounts, MemberDashboard, SystemDashboard},
        loan::LedgerEntry,
        member::DashboardScope,
    },
    repository::Repository,
};

/// Total, active and expired-but-unreturned counts
pub fn loan_counts(entries: &[LedgerEntry], now: DateTime<Utc>) -> LoanCounts {
    entries.iter().fold(LoanCounts::default(), |mut counts, entry| {
        counts.total += 1;
        if !entry.returned {
            counts.active += 1;
        }
        if entry.is_expired(now) {
            counts.expired += 1;
        }
        counts
    })
}

/// Per-category totals. Every configured category is listed, zero-filled;
/// categories only found in the ledger follow in alphabetical order.
pub fn category_stats(entries: &[LedgerEntry], categories: &[String]) -> Vec<CategoryStats> {
    let mut stats: Vec<CategoryStats> = categories
        .iter()
        .map(|c| CategoryStats {
            category: c.clone(),
            total_loans: 0,
            active_loans: 0,
        })
        .collect();
    let configured = stats.len();

    for entry in entries {
        let idx = match stats.iter().position(|s| s.category == entry.category) {
            Some(idx) => idx,
            None => {
                stats.push(CategoryStats {
                    category: entry.category.clone(),
                    total_loans: 0,
                    active_loans: 0,
                });
                stats.len() - 1
            }
        };
        stats[idx].total_loans += 1;
        if !entry.returned {
            stats[idx].active_loans += 1;
        }
    }

    stats[configured..].sort_by(|a, b| a.category.cmp(&b.category));
    stats
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
}

impl DashboardService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_dashboard(&self, scope: DashboardScope) -> AppResult<Dashboard> {
        match scope {
            DashboardScope::System => Ok(Dashboard::System(self.system().await?)),
            DashboardScope::Member(id) => Ok(Dashboard::Member(self.member(id).await?)),
        }
    }

    async fn system(&self) -> AppResult<SystemDashboard> {
        let entries = self.repository.loans.ledger(None).await?;
        let categories = match self.repository.policy.get().await {
            Ok(policy) => policy.categories,
            Err(AppError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        Ok(SystemDashboard {
            loans: loan_counts(&entries, Utc::now()),
            categories: category_stats(&entries, &categories),
        })
    }

    async fn member(&self, member_id: i32) -> AppResult<MemberDashboard> {
        if !self.repository.members.exists(member_id).await? {
            return Err(AppError::NotFound(format!("Member with id {} not found", member_id)));
        }
        let entries = self.repository.loans.ledger(Some(member_id)).await?;
        let active_loans = self.repository.loans.active_by_member(member_id).await?;

        Ok(MemberDashboard {
            member_id,
            loans: loan_counts(&entries, Utc::now()),
            active_loans,
        })
    }
}
