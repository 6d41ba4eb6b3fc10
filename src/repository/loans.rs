//! Loans repository (loan ledger)
//!
//! Every write here that touches both a loan and its copy runs inside one
//! transaction. Conditional updates report a lost race through their row
//! count instead of holding locks across requests.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::loan::{DueLoan, LedgerEntry, Loan, LoanDetails},
};

/// Columns of `LoanDetails`, for queries joining `loans l` with `copies c`
const DETAILS_COLUMNS: &str = "l.id, l.copy_id, c.book_code, c.name, l.member_id, \
                               l.borrowed_date, l.expiry_date, l.renewal_count";

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Count a member's active loans
    pub async fn count_active_by_member(&self, member_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE member_id = $1 AND returned = FALSE",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Latest return date per copy, for copies the member returned on or after `since`
    pub async fn recent_returns(
        &self,
        member_id: i32,
        copy_ids: &[i32],
        since: DateTime<Utc>,
    ) -> AppResult<Vec<(i32, DateTime<Utc>)>> {
        let rows = sqlx::query_as::<_, (i32, DateTime<Utc>)>(
            r#"
            SELECT copy_id, MAX(returned_date)
            FROM loans
            WHERE member_id = $1
              AND copy_id = ANY($2)
              AND returned = TRUE
              AND returned_date >= $3
            GROUP BY copy_id
            "#,
        )
        .bind(member_id)
        .bind(copy_ids)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Borrow one copy: flag it unavailable and open the loan in one transaction.
    ///
    /// Returns `None` when another request took the copy first.
    pub async fn create_for_copy(
        &self,
        member_id: i32,
        copy_id: i32,
        borrowed_date: DateTime<Utc>,
        expiry_date: DateTime<Utc>,
    ) -> AppResult<Option<Loan>> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            r#"
            UPDATE copies SET available = FALSE
            WHERE id = $1 AND available = TRUE AND archived_at IS NULL
            "#,
        )
        .bind(copy_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (copy_id, member_id, borrowed_date, expiry_date, returned, renewal_count)
            VALUES ($1, $2, $3, $4, FALSE, 0)
            RETURNING *
            "#,
        )
        .bind(copy_id)
        .bind(member_id)
        .bind(borrowed_date)
        .bind(expiry_date)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(loan) => {
                tx.commit().await?;
                Ok(Some(loan))
            }
            // Another active loan already holds this copy
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Close the member's active loans on `copy_ids` and release the copies.
    ///
    /// All-or-nothing: returns the released copy ids, `NotFound` when no
    /// active loan matches and `Conflict` when the copy rows disagree with
    /// the ledger.
    pub async fn return_for_member(
        &self,
        member_id: i32,
        copy_ids: &[i32],
        returned_date: DateTime<Utc>,
    ) -> AppResult<Vec<i32>> {
        let mut tx = self.pool.begin().await?;

        let returned: Vec<i32> = sqlx::query_scalar(
            r#"
            UPDATE loans
            SET returned = TRUE, returned_date = $3, renewal_count = 0
            WHERE member_id = $1 AND copy_id = ANY($2) AND returned = FALSE
            RETURNING copy_id
            "#,
        )
        .bind(member_id)
        .bind(copy_ids)
        .bind(returned_date)
        .fetch_all(&mut *tx)
        .await?;

        if returned.is_empty() {
            tx.rollback().await?;
            return Err(AppError::NotFound(
                "No active loans found for the given books".to_string(),
            ));
        }

        let released = sqlx::query(
            "UPDATE copies SET available = TRUE WHERE id = ANY($1) AND available = FALSE",
        )
        .bind(&returned)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if released != returned.len() as u64 {
            tx.rollback().await?;
            return Err(AppError::Conflict(format!(
                "Inventory out of sync: {} loans closed but {} copies released",
                returned.len(),
                released
            )));
        }

        tx.commit().await?;
        Ok(returned)
    }

    /// Active loans of a member restricted to the given copies
    pub async fn active_for_copies(
        &self,
        member_id: i32,
        copy_ids: &[i32],
    ) -> AppResult<Vec<LoanDetails>> {
        let loans = sqlx::query_as::<_, LoanDetails>(&format!(
            r#"
            SELECT {}
            FROM loans l
            JOIN copies c ON c.id = l.copy_id
            WHERE l.member_id = $1 AND l.copy_id = ANY($2) AND l.returned = FALSE
            ORDER BY l.id
            "#,
            DETAILS_COLUMNS
        ))
        .bind(member_id)
        .bind(copy_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// All active loans of a member
    pub async fn active_by_member(&self, member_id: i32) -> AppResult<Vec<LoanDetails>> {
        let loans = sqlx::query_as::<_, LoanDetails>(&format!(
            r#"
            SELECT {}
            FROM loans l
            JOIN copies c ON c.id = l.copy_id
            WHERE l.member_id = $1 AND l.returned = FALSE
            ORDER BY l.expiry_date
            "#,
            DETAILS_COLUMNS
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Push the due date of one active loan and count the renewal.
    ///
    /// The update is guarded by the renewal limit so a concurrent renewal
    /// can never push `renewal_count` past it. The reminder flag is cleared so
    /// the new due date is reminded too. Returns `None` when nothing matched.
    pub async fn renew(
        &self,
        loan_id: i32,
        expiry_date: DateTime<Utc>,
        max_renewals: i32,
    ) -> AppResult<Option<LoanDetails>> {
        let loan = sqlx::query_as::<_, LoanDetails>(&format!(
            r#"
            WITH l AS (
                UPDATE loans
                SET expiry_date = GREATEST(expiry_date, $2),
                    renewal_count = renewal_count + 1,
                    reminder_email_sent = FALSE
                WHERE id = $1 AND returned = FALSE AND renewal_count < $3
                RETURNING *
            )
            SELECT {}
            FROM l
            JOIN copies c ON c.id = l.copy_id
            "#,
            DETAILS_COLUMNS
        ))
        .bind(loan_id)
        .bind(expiry_date)
        .bind(max_renewals)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    /// Ledger rows for dashboards, optionally for a single member
    pub async fn ledger(&self, member_id: Option<i32>) -> AppResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT l.id AS loan_id, l.member_id, c.category, l.returned, l.expiry_date
            FROM loans l
            JOIN copies c ON c.id = l.copy_id
            WHERE $1::INTEGER IS NULL OR l.member_id = $1
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Active loans due before `until` whose reminder has not been sent
    pub async fn due_for_reminder(&self, until: DateTime<Utc>) -> AppResult<Vec<DueLoan>> {
        let rows = sqlx::query_as::<_, DueLoan>(
            r#"
            SELECT l.id AS loan_id, m.name AS member_name, m.email AS member_email,
                   c.name AS book_name, l.expiry_date
            FROM loans l
            JOIN members m ON m.id = l.member_id
            JOIN copies c ON c.id = l.copy_id
            WHERE l.returned = FALSE
              AND l.reminder_email_sent = FALSE
              AND l.expiry_date <= $1
            ORDER BY l.expiry_date
            "#,
        )
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn mark_reminder_sent(&self, loan_id: i32) -> AppResult<()> {
        sqlx::query("UPDATE loans SET reminder_email_sent = TRUE WHERE id = $1")
            .bind(loan_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
