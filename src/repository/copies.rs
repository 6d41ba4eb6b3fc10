//! Copies repository (inventory store)

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::copy::{BookCopy, CopyRef, NewStock, StockSummary},
};

const COPY_COLUMNS: &str = "id, book_code, name, authors, publisher, published_year, pages, \
                            cost, category, available, created_at";

#[derive(Clone)]
pub struct CopiesRepository {
    pool: Pool<Postgres>,
}

impl CopiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Copies among `ids` that can be borrowed right now
    pub async fn get_available(&self, ids: &[i32]) -> AppResult<Vec<CopyRef>> {
        let copies = sqlx::query_as::<_, CopyRef>(
            r#"
            SELECT id, book_code, name
            FROM copies
            WHERE id = ANY($1) AND available = TRUE AND archived_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// List the copies in stock for a book code
    pub async fn list_by_code(&self, book_code: &str) -> AppResult<Vec<BookCopy>> {
        let copies = sqlx::query_as::<_, BookCopy>(&format!(
            "SELECT {} FROM copies WHERE book_code = $1 AND archived_at IS NULL ORDER BY id",
            COPY_COLUMNS
        ))
        .bind(book_code)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Insert `quantity` copies of a title in a single statement
    pub async fn add_stock(&self, stock: &NewStock) -> AppResult<Vec<BookCopy>> {
        let copies = sqlx::query_as::<_, BookCopy>(&format!(
            r#"
            INSERT INTO copies (book_code, name, authors, publisher, published_year, pages, cost, category, available)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, TRUE
            FROM generate_series(1, $9)
            RETURNING {}
            "#,
            COPY_COLUMNS
        ))
        .bind(&stock.book_code)
        .bind(&stock.name)
        .bind(&stock.authors)
        .bind(&stock.publisher)
        .bind(stock.published_year)
        .bind(stock.pages)
        .bind(stock.cost)
        .bind(&stock.category)
        .bind(stock.quantity)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Withdraw `count` available copies of a title. Copies on loan are never touched.
    pub async fn remove_stock(&self, book_code: &str, count: i64) -> AppResult<StockSummary> {
        let mut tx = self.pool.begin().await?;

        let ids: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT id FROM copies
            WHERE book_code = $1 AND archived_at IS NULL
            ORDER BY id DESC
            FOR UPDATE
            "#,
        )
        .bind(book_code)
        .fetch_all(&mut *tx)
        .await?;

        if ids.is_empty() {
            return Err(AppError::NotFound(format!("Book {} not found", book_code)));
        }

        let removed = sqlx::query(
            r#"
            UPDATE copies SET archived_at = $3
            WHERE id IN (
                SELECT id FROM copies
                WHERE book_code = $1 AND available = TRUE AND archived_at IS NULL
                ORDER BY id DESC
                LIMIT $2
            )
            "#,
        )
        .bind(book_code)
        .bind(count)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if (removed as i64) < count {
            // Dropping the transaction rolls back the partial removal
            return Err(AppError::BusinessRule(format!(
                "Only {} available copies of {} can be removed",
                removed, book_code
            )));
        }

        tx.commit().await?;
        self.stock_summary(book_code).await
    }

    /// Withdraw every copy of a title, refused while any copy is on loan
    pub async fn delete_book(&self, book_code: &str) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<(i32, bool)> = sqlx::query_as(
            "SELECT id, available FROM copies WHERE book_code = $1 AND archived_at IS NULL FOR UPDATE",
        )
        .bind(book_code)
        .fetch_all(&mut *tx)
        .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound(format!("Book {} not found", book_code)));
        }

        let on_loan = rows.iter().filter(|(_, available)| !available).count();
        if on_loan > 0 {
            return Err(AppError::Conflict(format!(
                "{} copies of {} are on loan",
                on_loan, book_code
            )));
        }

        let ids: Vec<i32> = rows.into_iter().map(|(id, _)| id).collect();
        let removed = sqlx::query("UPDATE copies SET archived_at = $2 WHERE id = ANY($1)")
            .bind(&ids)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(removed)
    }

    /// Total and available copy counts for a book code
    pub async fn stock_summary(&self, book_code: &str) -> AppResult<StockSummary> {
        let (total, available): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE available)
            FROM copies
            WHERE book_code = $1 AND archived_at IS NULL
            "#,
        )
        .bind(book_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(StockSummary {
            book_code: book_code.to_string(),
            total,
            available,
        })
    }
}
