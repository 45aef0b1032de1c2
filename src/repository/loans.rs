//! Loans repository: the transactional loan lifecycle
//!
//! Every mutation here runs as a single Postgres transaction with row-level
//! locks on the loan/item rows involved, so no concurrent operation can
//! observe an item marked ON_LOAN without its loan record or act on a stale
//! loan status. Dropping the transaction without commit rolls everything back.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        item::ItemStatus,
        loan::{
            DecidedLoan, LoanDecision, LoanHistoryEntry, LoanOverview, LoanStatus, RequestedLoan,
            ReturnedLoan,
        },
    },
    repository::is_unique_violation,
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a loan request, reserving one available copy of the title.
    ///
    /// The copy is picked deterministically (lowest id first) under
    /// `FOR UPDATE SKIP LOCKED`, so two concurrent requests can never reserve
    /// the same row: the second transaction skips the locked copy and either
    /// takes the next one or observes out-of-stock.
    pub async fn create_request(
        &self,
        user_id: Uuid,
        title_id: Uuid,
        due_date: DateTime<Utc>,
    ) -> AppResult<RequestedLoan> {
        let mut tx = self.pool.begin().await?;

        // Resolve the title first so an unknown id fails NotFound, not OutOfStock
        let title_name: String = sqlx::query_scalar("SELECT title FROM titles WHERE id = $1")
            .bind(title_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Title {} not found", title_id)))?;

        let item_row = sqlx::query(
            r#"
            SELECT id, barcode_sn FROM items
            WHERE title_id = $1 AND status = 'AVAILABLE'
            ORDER BY id
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(title_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(item_row) = item_row else {
            return Err(AppError::OutOfStock(format!(
                "No copy of '{}' is currently available",
                title_name
            )));
        };
        let item_id: Uuid = item_row.get("id");
        let item_barcode: String = item_row.get("barcode_sn");

        let loan_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO loans (id, user_id, item_id, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(item_id)
        .bind(due_date)
        .bind(LoanStatus::Requested.as_code())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE items SET status = $1 WHERE id = $2")
            .bind(ItemStatus::OnLoan.as_code())
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(RequestedLoan {
            loan_id,
            due_date,
            item_barcode,
            title_name,
        })
    }

    /// Approve or reject a requested loan.
    ///
    /// The loan row is re-read under `FOR UPDATE` and the REQUESTED status
    /// re-checked inside the transaction, so two admins racing on the same
    /// request cannot both decide it.
    pub async fn decide(&self, loan_id: Uuid, decision: LoanDecision) -> AppResult<DecidedLoan> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT l.status, l.item_id,
                   u.name as borrower_name, u.email as borrower_email,
                   t.title as title_name
            FROM loans l
            JOIN users u ON u.id = l.user_id
            JOIN items i ON i.id = l.item_id
            JOIN titles t ON t.id = i.title_id
            WHERE l.id = $1
            FOR UPDATE OF l
            "#,
        )
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", loan_id)))?;

        let current = LoanStatus::from(row.get::<String, _>("status").as_str());
        let next = match decision {
            LoanDecision::Approve => LoanStatus::Approved,
            LoanDecision::Reject => LoanStatus::Rejected,
        };

        if !current.can_transition_to(next) {
            return Err(AppError::InvalidState(format!(
                "Loan is {}, only REQUESTED loans can be decided",
                current.as_code()
            )));
        }

        sqlx::query("UPDATE loans SET status = $1 WHERE id = $2")
            .bind(next.as_code())
            .bind(loan_id)
            .execute(&mut *tx)
            .await?;

        // An approved loan keeps its copy reserved; a rejected one frees it
        if next == LoanStatus::Rejected {
            let item_id: Uuid = row.get("item_id");
            sqlx::query("UPDATE items SET status = $1 WHERE id = $2")
                .bind(ItemStatus::Available.as_code())
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(DecidedLoan {
            loan_id,
            status: next,
            borrower_name: row.get("borrower_name"),
            borrower_email: row.get("borrower_email"),
            title_name: row.get("title_name"),
        })
    }

    /// Return an approved loan, optionally recording a review.
    ///
    /// When a review is present, the review insert, the borrower's
    /// finished-books increment and the title's mean-rating recompute commit
    /// atomically with the RETURNED transition. A duplicate review aborts the
    /// whole transaction: the loan stays APPROVED and the item ON_LOAN.
    pub async fn return_loan(
        &self,
        loan_id: Uuid,
        user_id: Uuid,
        review: Option<(i32, String)>,
    ) -> AppResult<ReturnedLoan> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT l.user_id, l.status, l.item_id, i.title_id
            FROM loans l
            JOIN items i ON i.id = l.item_id
            WHERE l.id = $1
            FOR UPDATE OF l
            "#,
        )
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", loan_id)))?;

        let owner: Uuid = row.get("user_id");
        if owner != user_id {
            return Err(AppError::Authorization(
                "Loan does not belong to the caller".to_string(),
            ));
        }

        let current = LoanStatus::from(row.get::<String, _>("status").as_str());
        if !current.can_transition_to(LoanStatus::Returned) {
            return Err(AppError::InvalidState(format!(
                "Loan is {}, only APPROVED loans can be returned",
                current.as_code()
            )));
        }

        let item_id: Uuid = row.get("item_id");
        let title_id: Uuid = row.get("title_id");

        sqlx::query("UPDATE loans SET status = $1, return_date = $2 WHERE id = $3")
            .bind(LoanStatus::Returned.as_code())
            .bind(now)
            .bind(loan_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE items SET status = $1 WHERE id = $2")
            .bind(ItemStatus::Available.as_code())
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        let mut review_created = false;
        if let Some((rating, body)) = review {
            let inserted = sqlx::query(
                r#"
                INSERT INTO reviews (id, user_id, title_id, rating, body)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(title_id)
            .bind(rating)
            .bind(&body)
            .execute(&mut *tx)
            .await;

            if let Err(e) = inserted {
                if is_unique_violation(&e) {
                    return Err(AppError::DuplicateReview(
                        "You have already reviewed this title".to_string(),
                    ));
                }
                return Err(e.into());
            }

            sqlx::query(
                "UPDATE users SET total_books_finished = total_books_finished + 1 WHERE id = $1",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            // Mean over all reviews of the title, including the one just added
            let avg: Option<f64> =
                sqlx::query_scalar("SELECT AVG(rating)::float8 FROM reviews WHERE title_id = $1")
                    .bind(title_id)
                    .fetch_one(&mut *tx)
                    .await?;

            sqlx::query("UPDATE titles SET avg_rating = $1 WHERE id = $2")
                .bind(avg.unwrap_or(0.0))
                .bind(title_id)
                .execute(&mut *tx)
                .await?;

            review_created = true;
        }

        tx.commit().await?;

        Ok(ReturnedLoan {
            loan_id,
            return_date: now,
            review_created,
        })
    }

    /// Loans awaiting a decision or currently out, oldest request first
    pub async fn list_outstanding(&self) -> AppResult<Vec<LoanOverview>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.borrow_date, l.due_date, l.status,
                   u.id as borrower_id, u.name as borrower_name, u.email as borrower_email,
                   i.barcode_sn, t.title as title_name
            FROM loans l
            JOIN users u ON u.id = l.user_id
            JOIN items i ON i.id = l.item_id
            JOIN titles t ON t.id = i.title_id
            WHERE l.status IN ('REQUESTED', 'APPROVED')
            ORDER BY l.borrow_date
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| LoanOverview {
                id: row.get("id"),
                borrow_date: row.get("borrow_date"),
                due_date: row.get("due_date"),
                status: LoanStatus::from(row.get::<String, _>("status").as_str()),
                borrower_id: row.get("borrower_id"),
                borrower_name: row.get("borrower_name"),
                borrower_email: row.get("borrower_email"),
                item_barcode: row.get("barcode_sn"),
                title_name: row.get("title_name"),
            })
            .collect())
    }

    /// A member's full borrow history, newest first
    pub async fn get_user_history(&self, user_id: Uuid) -> AppResult<Vec<LoanHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.borrow_date, l.due_date, l.return_date, l.status,
                   i.barcode_sn, t.id as title_id, t.title as title_name,
                   t.author as title_author, t.cover_url
            FROM loans l
            JOIN items i ON i.id = l.item_id
            JOIN titles t ON t.id = i.title_id
            WHERE l.user_id = $1
            ORDER BY l.borrow_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| LoanHistoryEntry {
                id: row.get("id"),
                borrow_date: row.get("borrow_date"),
                due_date: row.get("due_date"),
                return_date: row.get("return_date"),
                status: LoanStatus::from(row.get::<String, _>("status").as_str()),
                item_barcode: row.get("barcode_sn"),
                title_id: row.get("title_id"),
                title_name: row.get("title_name"),
                title_author: row.get("title_author"),
                cover_url: row.get("cover_url"),
            })
            .collect())
    }
}
