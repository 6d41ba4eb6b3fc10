//! Lending engine: borrow, return and renew
//!
//! Borrow and renew report per-item outcomes so a batch can partly succeed.
//! Return is all-or-nothing. Losing a race for a copy is not an error, the
//! copy is simply left out of the successes.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        copy::CopyRef,
        loan::LoanDetails,
        policy::{Policy, RenewalBase},
    },
    repository::Repository,
};

pub const RENEWAL_LIMIT_REACHED: &str = "max renewal limit reached";
pub const RENEWAL_NOT_APPLIED: &str = "loan could not be renewed";
pub const RENEWAL_OVERDUE: &str = "loan is overdue";

/// A copy the member returned too recently to borrow again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestrictedCopy {
    pub copy_id: i32,
    pub name: String,
    /// First instant the member may borrow this copy again
    pub available_from: DateTime<Utc>,
}

/// Outcome for one requested copy
#[derive(Debug, Clone, PartialEq)]
pub enum BorrowItem {
    Borrowed(LoanDetails),
    Restricted(RestrictedCopy),
    /// Unknown, withdrawn or already on loan
    Invalid(i32),
    /// Taken by a concurrent request between the check and the write
    Lost(i32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorrowResult {
    pub items: Vec<BorrowItem>,
}

impl BorrowResult {
    pub fn borrowed(&self) -> Vec<&LoanDetails> {
        self.items
            .iter()
            .filter_map(|i| match i {
                BorrowItem::Borrowed(loan) => Some(loan),
                _ => None,
            })
            .collect()
    }

    pub fn invalid_ids(&self) -> Vec<i32> {
        self.items
            .iter()
            .filter_map(|i| match i {
                BorrowItem::Invalid(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn restricted(&self) -> Vec<&RestrictedCopy> {
        self.items
            .iter()
            .filter_map(|i| match i {
                BorrowItem::Restricted(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn lost_ids(&self) -> Vec<i32> {
        self.items
            .iter()
            .filter_map(|i| match i {
                BorrowItem::Lost(id) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BorrowOutcome {
    /// At least one copy was eligible; see the items for what was borrowed
    Completed(BorrowResult),
    /// The batch would exceed the member's borrow limit; nothing was done
    LimitExceeded { remaining: i64 },
    /// No requested copy was eligible; nothing was done
    NothingBorrowable {
        invalid: Vec<i32>,
        restricted: Vec<RestrictedCopy>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnResult {
    pub returned_count: usize,
    pub copy_ids: Vec<i32>,
}

/// A loan that was not renewed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenewalRejection {
    pub loan_id: i32,
    pub copy_id: i32,
    pub name: String,
    pub reason: String,
}

impl RenewalRejection {
    fn new(loan: &LoanDetails, reason: &str) -> Self {
        Self {
            loan_id: loan.id,
            copy_id: loan.copy_id,
            name: loan.name.clone(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenewItem {
    Renewed(LoanDetails),
    LimitReached(RenewalRejection),
    /// The guarded update matched no row (returned or renewed concurrently)
    Failed(RenewalRejection),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenewResult {
    pub items: Vec<RenewItem>,
}

impl RenewResult {
    pub fn successful(&self) -> Vec<&LoanDetails> {
        self.items
            .iter()
            .filter_map(|i| match i {
                RenewItem::Renewed(loan) => Some(loan),
                _ => None,
            })
            .collect()
    }

    pub fn limit_reached(&self) -> Vec<&RenewalRejection> {
        self.items
            .iter()
            .filter_map(|i| match i {
                RenewItem::LimitReached(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn failed(&self) -> Vec<&RenewalRejection> {
        self.items
            .iter()
            .filter_map(|i| match i {
                RenewItem::Failed(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

/// Requested ids without repeats, first occurrence order kept
pub fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

/// Deduplicated ids of a batch request; an empty batch is a validation error
pub fn requested_ids(ids: &[i32]) -> AppResult<Vec<i32>> {
    let requested = dedup_ids(ids);
    if requested.is_empty() {
        return Err(AppError::Validation("No book ids given".to_string()));
    }
    Ok(requested)
}

/// How many more loans the member may open
pub fn remaining_capacity(active: i64, max_borrow_limit: i32) -> i64 {
    (i64::from(max_borrow_limit) - active).max(0)
}

/// True if the member returned the copy within the cool-down window
pub fn within_cooldown(returned_date: DateTime<Utc>, now: DateTime<Utc>, cooldown: Duration) -> bool {
    returned_date >= now - cooldown
}

/// Eligibility of each requested copy before any write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorrowPlan {
    pub allowed: Vec<CopyRef>,
    pub restricted: Vec<RestrictedCopy>,
    pub invalid: Vec<i32>,
}

/// Split requested ids into allowed, restricted (cool-down) and invalid
/// (not available). `last_returns` holds the member's latest return date per
/// copy.
pub fn plan_borrow(
    requested: &[i32],
    available: &[CopyRef],
    last_returns: &[(i32, DateTime<Utc>)],
    now: DateTime<Utc>,
    cooldown: Duration,
) -> BorrowPlan {
    let mut plan = BorrowPlan::default();

    for id in requested {
        let Some(copy) = available.iter().find(|c| c.id == *id) else {
            plan.invalid.push(*id);
            continue;
        };

        let recent = last_returns
            .iter()
            .filter(|(copy_id, _)| copy_id == id)
            .map(|(_, returned)| *returned)
            .filter(|returned| within_cooldown(*returned, now, cooldown))
            .max();

        match recent {
            Some(returned) => plan.restricted.push(RestrictedCopy {
                copy_id: copy.id,
                name: copy.name.clone(),
                available_from: returned + cooldown,
            }),
            None => plan.allowed.push(copy.clone()),
        }
    }

    plan
}

/// Active loans of a renew request, sorted by what happens to them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenewalPartition {
    pub renewable: Vec<LoanDetails>,
    pub at_limit: Vec<LoanDetails>,
    /// Past their due date; a loan can only be renewed before it expires
    pub overdue: Vec<LoanDetails>,
}

/// Sort loans into renewable, at the renewal limit, and overdue.
/// The limit is checked first.
pub fn partition_renewals(
    loans: Vec<LoanDetails>,
    max_renewal_limit: i32,
    now: DateTime<Utc>,
) -> RenewalPartition {
    let mut partition = RenewalPartition::default();
    for loan in loans {
        if loan.renewal_count >= max_renewal_limit {
            partition.at_limit.push(loan);
        } else if loan.expiry_date <= now {
            partition.overdue.push(loan);
        } else {
            partition.renewable.push(loan);
        }
    }
    partition
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    renewal_base: RenewalBase,
}

impl LoansService {
    pub fn new(repository: Repository, renewal_base: RenewalBase) -> Self {
        Self {
            repository,
            renewal_base,
        }
    }

    async fn require_member(&self, member_id: i32) -> AppResult<()> {
        if self.repository.members.exists(member_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Member with id {} not found", member_id)))
        }
    }

    /// Active loans of a member
    pub async fn get_member_loans(&self, member_id: i32) -> AppResult<Vec<LoanDetails>> {
        self.require_member(member_id).await?;
        self.repository.loans.active_by_member(member_id).await
    }

    /// Borrow a batch of copies for a member
    pub async fn borrow(&self, member_id: i32, copy_ids: &[i32]) -> AppResult<BorrowOutcome> {
        let requested = requested_ids(copy_ids)?;
        self.require_member(member_id).await?;

        let policy: Policy = self.repository.policy.get().await?;
        let now = Utc::now();

        let active = self.repository.loans.count_active_by_member(member_id).await?;
        if active + requested.len() as i64 > i64::from(policy.max_borrow_limit) {
            let remaining = remaining_capacity(active, policy.max_borrow_limit);
            tracing::info!(
                member_id,
                active,
                requested = requested.len(),
                remaining,
                "Borrow rejected: limit exceeded"
            );
            return Ok(BorrowOutcome::LimitExceeded { remaining });
        }

        let available = self.repository.copies.get_available(&requested).await?;
        let available_ids: Vec<i32> = available.iter().map(|c| c.id).collect();
        let last_returns = if available_ids.is_empty() {
            Vec::new()
        } else {
            self.repository
                .loans
                .recent_returns(member_id, &available_ids, now - policy.cooldown())
                .await?
        };

        let plan = plan_borrow(&requested, &available, &last_returns, now, policy.cooldown());

        if plan.allowed.is_empty() {
            tracing::info!(
                member_id,
                invalid = plan.invalid.len(),
                restricted = plan.restricted.len(),
                "Borrow rejected: no eligible copies"
            );
            return Ok(BorrowOutcome::NothingBorrowable {
                invalid: plan.invalid,
                restricted: plan.restricted,
            });
        }

        let expiry_date = now + policy.loan_duration();
        let mut items = Vec::with_capacity(requested.len());
        for id in &requested {
            if let Some(copy) = plan.allowed.iter().find(|c| c.id == *id) {
                match self
                    .repository
                    .loans
                    .create_for_copy(member_id, copy.id, now, expiry_date)
                    .await?
                {
                    Some(loan) => items.push(BorrowItem::Borrowed(LoanDetails {
                        id: loan.id,
                        copy_id: loan.copy_id,
                        book_code: copy.book_code.clone(),
                        name: copy.name.clone(),
                        member_id: loan.member_id,
                        borrowed_date: loan.borrowed_date,
                        expiry_date: loan.expiry_date,
                        renewal_count: loan.renewal_count,
                    })),
                    None => {
                        tracing::debug!(member_id, copy_id = copy.id, "Copy taken by a concurrent borrow");
                        items.push(BorrowItem::Lost(copy.id));
                    }
                }
            } else if let Some(r) = plan.restricted.iter().find(|r| r.copy_id == *id) {
                items.push(BorrowItem::Restricted(r.clone()));
            } else {
                items.push(BorrowItem::Invalid(*id));
            }
        }

        let result = BorrowResult { items };
        tracing::info!(
            member_id,
            borrowed = result.borrowed().len(),
            invalid = result.invalid_ids().len(),
            restricted = result.restricted().len(),
            lost = result.lost_ids().len(),
            "Borrow processed"
        );
        Ok(BorrowOutcome::Completed(result))
    }

    /// Return a batch of copies. Either every matched loan is closed or none is.
    pub async fn return_loans(&self, member_id: i32, copy_ids: &[i32]) -> AppResult<ReturnResult> {
        let requested = requested_ids(copy_ids)?;
        self.require_member(member_id).await?;

        let copy_ids = self
            .repository
            .loans
            .return_for_member(member_id, &requested, Utc::now())
            .await?;

        tracing::info!(member_id, returned = copy_ids.len(), "Return processed");
        Ok(ReturnResult {
            returned_count: copy_ids.len(),
            copy_ids,
        })
    }

    /// Renew a batch of active loans, each independently
    pub async fn renew(&self, member_id: i32, copy_ids: &[i32]) -> AppResult<RenewResult> {
        let requested = requested_ids(copy_ids)?;
        self.require_member(member_id).await?;

        let loans = self
            .repository
            .loans
            .active_for_copies(member_id, &requested)
            .await?;
        if loans.is_empty() {
            return Err(AppError::NotFound(
                "No active loans found for the given books".to_string(),
            ));
        }

        let policy = self.repository.policy.get().await?;
        let now = Utc::now();
        let partition = partition_renewals(loans, policy.max_renewal_limit, now);

        let mut items: Vec<RenewItem> = partition
            .at_limit
            .iter()
            .map(|loan| RenewItem::LimitReached(RenewalRejection::new(loan, RENEWAL_LIMIT_REACHED)))
            .collect();
        items.extend(
            partition
                .overdue
                .iter()
                .map(|loan| RenewItem::Failed(RenewalRejection::new(loan, RENEWAL_OVERDUE))),
        );

        for loan in partition.renewable {
            let expiry = self
                .renewal_base
                .renewed_expiry(now, loan.expiry_date, policy.loan_duration());
            match self
                .repository
                .loans
                .renew(loan.id, expiry, policy.max_renewal_limit)
                .await?
            {
                Some(renewed) => items.push(RenewItem::Renewed(renewed)),
                None => {
                    tracing::debug!(member_id, loan_id = loan.id, "Renewal matched no active loan");
                    items.push(RenewItem::Failed(RenewalRejection::new(&loan, RENEWAL_NOT_APPLIED)));
                }
            }
        }

        let result = RenewResult { items };
        tracing::info!(
            member_id,
            renewed = result.successful().len(),
            limit_reached = result.limit_reached().len(),
            failed = result.failed().len(),
            "Renewal processed"
        );
        Ok(result)
    }
}
