//! Inventory service: stock management for book copies

use crate::{
    error::{AppError, AppResult},
    models::copy::{BookCopy, NewStock, StockSummary},
    repository::Repository,
};

#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
}

impl InventoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Copies in stock for a book code
    pub async fn list_copies(&self, book_code: &str) -> AppResult<Vec<BookCopy>> {
        let copies = self.repository.copies.list_by_code(book_code).await?;
        if copies.is_empty() {
            return Err(AppError::NotFound(format!("Book {} not found", book_code)));
        }
        Ok(copies)
    }

    /// Add copies of a title. The category must be one the policy knows.
    pub async fn add_stock(&self, stock: NewStock) -> AppResult<Vec<BookCopy>> {
        let policy = self.repository.policy.get().await?;
        if !policy.has_category(&stock.category) {
            return Err(AppError::BusinessRule(format!(
                "Unknown category '{}', expected one of: {}",
                stock.category,
                policy.categories.join(", ")
            )));
        }

        let copies = self.repository.copies.add_stock(&stock).await?;
        tracing::info!(
            book_code = %stock.book_code,
            added = copies.len(),
            "Stock added"
        );
        Ok(copies)
    }

    /// Withdraw `count` available copies of a title
    pub async fn remove_stock(&self, book_code: &str, count: i64) -> AppResult<StockSummary> {
        if count < 1 {
            return Err(AppError::Validation("count must be at least 1".to_string()));
        }
        let summary = self.repository.copies.remove_stock(book_code, count).await?;
        tracing::info!(book_code, removed = count, remaining = summary.total, "Stock removed");
        Ok(summary)
    }

    /// Withdraw a title entirely; refused while any copy is on loan
    pub async fn delete_book(&self, book_code: &str) -> AppResult<u64> {
        let removed = self.repository.copies.delete_book(book_code).await?;
        tracing::info!(book_code, removed, "Book deleted");
        Ok(removed)
    }
}
