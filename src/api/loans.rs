//! Borrow, return and renew endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{loan::LoanDetails, member::Capability},
    services::loans::{BorrowOutcome, RenewResult, RenewalRejection, RestrictedCopy, ReturnResult},
};

use super::AuthenticatedMember;

/// Batch of copy ids handled on behalf of one member
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanBatchRequest {
    /// Member the operation applies to
    #[validate(range(min = 1, message = "Member id must be positive"))]
    pub member_id: i32,
    /// Copy ids (duplicates are ignored)
    #[validate(length(min = 1, max = 50, message = "Between 1 and 50 book ids are required"))]
    pub book_ids: Vec<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowResponse {
    pub message: String,
    pub borrowed_books: Vec<LoanDetails>,
    pub invalid_books_ids: Vec<i32>,
    pub restricted_books: Vec<RestrictedCopy>,
    /// Loans the member may still take, set when the borrow limit rejected the batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i64>,
}

impl From<BorrowOutcome> for BorrowResponse {
    fn from(outcome: BorrowOutcome) -> Self {
        match outcome {
            BorrowOutcome::LimitExceeded { remaining } => Self {
                message: format!(
                    "Borrow limit exceeded, you can borrow {} more book(s)",
                    remaining
                ),
                borrowed_books: Vec::new(),
                invalid_books_ids: Vec::new(),
                restricted_books: Vec::new(),
                remaining: Some(remaining),
            },
            BorrowOutcome::NothingBorrowable { invalid, restricted } => Self {
                message: "None of the requested books can be borrowed".to_string(),
                borrowed_books: Vec::new(),
                invalid_books_ids: invalid,
                restricted_books: restricted,
                remaining: None,
            },
            BorrowOutcome::Completed(result) => {
                let borrowed_books: Vec<LoanDetails> = result.borrowed().into_iter().cloned().collect();
                let invalid_books_ids = result.invalid_ids();
                let restricted_books: Vec<RestrictedCopy> =
                    result.restricted().into_iter().cloned().collect();

                let message = if borrowed_books.len() == result.items.len() {
                    "Books borrowed successfully"
                } else if borrowed_books.is_empty() {
                    "None of the requested books can be borrowed"
                } else {
                    "Some books could not be borrowed"
                };

                Self {
                    message: message.to_string(),
                    borrowed_books,
                    invalid_books_ids,
                    restricted_books,
                    remaining: None,
                }
            }
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnResponse {
    pub message: String,
    pub returned_count: usize,
    pub returned_book_ids: Vec<i32>,
}

impl From<ReturnResult> for ReturnResponse {
    fn from(result: ReturnResult) -> Self {
        Self {
            message: "Books returned successfully".to_string(),
            returned_count: result.returned_count,
            returned_book_ids: result.copy_ids,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenewResponse {
    pub message: String,
    #[serde(rename = "successfullRenews")]
    pub successful_renews: Vec<LoanDetails>,
    /// Loans already at the renewal limit
    pub invalid_renewal_books: Vec<RenewalRejection>,
    /// Loans that could not be renewed for another reason
    pub failed_renew: Vec<RenewalRejection>,
}

impl From<RenewResult> for RenewResponse {
    fn from(result: RenewResult) -> Self {
        let successful_renews: Vec<LoanDetails> = result.successful().into_iter().cloned().collect();
        let message = if successful_renews.len() == result.items.len() {
            "Books renewed successfully"
        } else if successful_renews.is_empty() {
            "None of the books could be renewed"
        } else {
            "Some books could not be renewed"
        };

        Self {
            message: message.to_string(),
            invalid_renewal_books: result.limit_reached().into_iter().cloned().collect(),
            failed_renew: result.failed().into_iter().cloned().collect(),
            successful_renews,
        }
    }
}

/// Get the active loans of a member
#[utoipa::path(
    get,
    path = "/members/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member's active loans", body = Vec<LoanDetails>),
        (status = 403, description = "Not allowed to read this member's loans"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member_loans(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(member_id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require(Capability::ActForMember(member_id))?;

    let loans = state.services.loans.get_member_loans(member_id).await?;
    Ok(Json(loans))
}

/// Borrow a batch of copies
#[utoipa::path(
    post,
    path = "/book/borrow",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = LoanBatchRequest,
    responses(
        (status = 200, description = "Batch processed, see per-book results", body = BorrowResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Not allowed to borrow for this member"),
        (status = 404, description = "Member or lending policy not found")
    )
)]
pub async fn borrow_books(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Json(request): Json<LoanBatchRequest>,
) -> AppResult<Json<BorrowResponse>> {
    claims.require(Capability::ActForMember(request.member_id))?;
    request.validate()?;

    let outcome = state
        .services
        .loans
        .borrow(request.member_id, &request.book_ids)
        .await?;

    if let BorrowOutcome::Completed(result) = &outcome {
        let borrowed: Vec<LoanDetails> = result.borrowed().into_iter().cloned().collect();
        state
            .services
            .notifications
            .spawn_borrow_confirmation(request.member_id, borrowed);
    }

    Ok(Json(BorrowResponse::from(outcome)))
}

/// Return a batch of borrowed copies
#[utoipa::path(
    post,
    path = "/book/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = LoanBatchRequest,
    responses(
        (status = 200, description = "Books returned", body = ReturnResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Member not found or no active loans for the given books"),
        (status = 409, description = "Loans changed concurrently, nothing was returned")
    )
)]
pub async fn return_books(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Json(request): Json<LoanBatchRequest>,
) -> AppResult<Json<ReturnResponse>> {
    claims.require(Capability::ActForMember(request.member_id))?;
    request.validate()?;

    let result = state
        .services
        .loans
        .return_loans(request.member_id, &request.book_ids)
        .await?;

    Ok(Json(ReturnResponse::from(result)))
}

/// Renew a batch of active loans
#[utoipa::path(
    post,
    path = "/book/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = LoanBatchRequest,
    responses(
        (status = 200, description = "Batch processed, see per-book results", body = RenewResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Member, policy or active loans not found")
    )
)]
pub async fn renew_books(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Json(request): Json<LoanBatchRequest>,
) -> AppResult<Json<RenewResponse>> {
    claims.require(Capability::ActForMember(request.member_id))?;
    request.validate()?;

    let result = state
        .services
        .loans
        .renew(request.member_id, &request.book_ids)
        .await?;

    Ok(Json(RenewResponse::from(result)))
}
