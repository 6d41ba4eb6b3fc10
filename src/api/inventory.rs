//! Inventory (stock) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        copy::{BookCopy, NewStock, StockSummary},
        member::Capability,
    },
};

use super::AuthenticatedMember;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RemoveStockQuery {
    /// Number of available copies to withdraw
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBookResponse {
    pub book_code: String,
    pub removed_copies: u64,
}

/// List the copies of a title
#[utoipa::path(
    get,
    path = "/book/{book_code}/copies",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(
        ("book_code" = String, Path, description = "Book code shared by the copies")
    ),
    responses(
        (status = 200, description = "Copies in stock", body = Vec<BookCopy>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn list_copies(
    State(state): State<crate::AppState>,
    AuthenticatedMember(_claims): AuthenticatedMember,
    Path(book_code): Path<String>,
) -> AppResult<Json<Vec<BookCopy>>> {
    let copies = state.services.inventory.list_copies(&book_code).await?;
    Ok(Json(copies))
}

/// Add copies of a title (staff only)
#[utoipa::path(
    post,
    path = "/book/stock",
    tag = "inventory",
    security(("bearer_auth" = [])),
    request_body = NewStock,
    responses(
        (status = 201, description = "Copies created", body = Vec<BookCopy>),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Staff only"),
        (status = 422, description = "Unknown category")
    )
)]
pub async fn add_stock(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Json(request): Json<NewStock>,
) -> AppResult<(StatusCode, Json<Vec<BookCopy>>)> {
    claims.require(Capability::ManageInventory)?;
    request.validate()?;

    let copies = state.services.inventory.add_stock(request).await?;
    Ok((StatusCode::CREATED, Json(copies)))
}

/// Withdraw available copies of a title (staff only)
#[utoipa::path(
    delete,
    path = "/book/{book_code}/stock",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(
        ("book_code" = String, Path, description = "Book code"),
        RemoveStockQuery
    ),
    responses(
        (status = 200, description = "Remaining stock", body = StockSummary),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Not enough available copies")
    )
)]
pub async fn remove_stock(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(book_code): Path<String>,
    Query(query): Query<RemoveStockQuery>,
) -> AppResult<Json<StockSummary>> {
    claims.require(Capability::ManageInventory)?;

    let summary = state
        .services
        .inventory
        .remove_stock(&book_code, query.count)
        .await?;
    Ok(Json(summary))
}

/// Withdraw every copy of a title (staff only)
#[utoipa::path(
    delete,
    path = "/book/{book_code}",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(
        ("book_code" = String, Path, description = "Book code")
    ),
    responses(
        (status = 200, description = "Book withdrawn", body = DeleteBookResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Copies are still on loan")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Path(book_code): Path<String>,
) -> AppResult<Json<DeleteBookResponse>> {
    claims.require(Capability::ManageInventory)?;

    let removed_copies = state.services.inventory.delete_book(&book_code).await?;
    Ok(Json(DeleteBookResponse {
        book_code,
        removed_copies,
    }))
}
