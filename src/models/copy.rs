//! Copy (physical inventory unit) model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// One loanable copy of a title. All copies of a title share `book_code`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookCopy {
    pub id: i32,
    pub book_code: String,
    pub name: String,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub published_year: Option<i32>,
    pub pages: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub cost: Option<Decimal>,
    pub category: String,
    /// True iff no active loan references this copy
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

/// Minimal copy projection used by the borrowing engine
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CopyRef {
    pub id: i32,
    pub book_code: String,
    pub name: String,
}

/// Add-stock request: creates `quantity` copies sharing the same book code
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewStock {
    #[validate(length(min = 1, max = 64, message = "Book code must be 1-64 characters"))]
    pub book_code: String,
    #[validate(length(min = 1, max = 512, message = "Name must be 1-512 characters"))]
    pub name: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub published_year: Option<i32>,
    #[validate(range(min = 1, message = "Pages must be positive"))]
    pub pages: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub cost: Option<Decimal>,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(range(min = 1, max = 500, message = "Quantity must be between 1 and 500"))]
    pub quantity: i32,
}

/// Copy counts for one book code
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub book_code: String,
    pub total: i64,
    pub available: i64,
}
