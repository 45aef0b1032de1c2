//! Loan lifecycle service
//!
//! Orchestrates the transactional repository operations and dispatches
//! best-effort email notifications after commit. A failed send is logged and
//! never affects the outcome of the operation.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{
            validate_due_date, CreateLoan, DecidedLoan, LoanDecision, LoanHistoryEntry,
            LoanOverview, RequestedLoan, ReturnLoan, ReturnedLoan,
        },
        review::rating_in_range,
        user::UserClaims,
    },
    repository::Repository,
    services::email::EmailService,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    email: EmailService,
}

impl LoansService {
    pub fn new(repository: Repository, email: EmailService) -> Self {
        Self { repository, email }
    }

    /// Request a loan for a title, reserving one available copy
    pub async fn request_loan(
        &self,
        claims: &UserClaims,
        request: CreateLoan,
    ) -> AppResult<RequestedLoan> {
        if !validate_due_date(request.due_date, Utc::now()) {
            return Err(AppError::Validation(
                "Requested due date must be in the future".to_string(),
            ));
        }

        // Verify the borrower still exists before opening the transaction
        let borrower = self.repository.users.get_by_id(claims.sub).await?;

        let requested = self
            .repository
            .loans
            .create_request(borrower.id, request.title_id, request.due_date)
            .await?;

        // Staff notification is fire-and-forget: the loan is already committed
        let email = self.email.clone();
        let notice = requested.clone();
        let borrower_name = borrower.name.clone();
        let borrower_email = borrower.email.clone();
        tokio::spawn(async move {
            if let Err(e) = email
                .send_loan_request_notice(&notice, &borrower_name, &borrower_email)
                .await
            {
                tracing::warn!("Failed to send loan request notification: {}", e);
            }
        });

        Ok(requested)
    }

    /// Approve or reject a requested loan (admin only)
    pub async fn decide_loan(
        &self,
        claims: &UserClaims,
        loan_id: Uuid,
        decision: LoanDecision,
    ) -> AppResult<DecidedLoan> {
        claims.require_admin()?;

        let decided = self.repository.loans.decide(loan_id, decision).await?;

        let email = self.email.clone();
        let notice = decided.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send_decision_notice(&notice).await {
                tracing::warn!("Failed to send loan decision notification: {}", e);
            }
        });

        Ok(decided)
    }

    /// Return an approved loan, optionally with a review.
    ///
    /// Rating and review text are accepted only as a pair: a return with
    /// neither succeeds without creating a review, a return with exactly one
    /// of them is rejected before any state changes.
    pub async fn return_loan(
        &self,
        claims: &UserClaims,
        loan_id: Uuid,
        request: ReturnLoan,
    ) -> AppResult<ReturnedLoan> {
        let review = match (request.rating, request.review_text) {
            (Some(rating), Some(text)) => {
                if !rating_in_range(rating) {
                    return Err(AppError::Validation(
                        "Rating must be between 1 and 5".to_string(),
                    ));
                }
                if text.trim().is_empty() {
                    return Err(AppError::Validation(
                        "Review text must not be empty".to_string(),
                    ));
                }
                Some((rating, text))
            }
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "Rating and review text must be provided together".to_string(),
                ));
            }
        };

        self.repository
            .loans
            .return_loan(loan_id, claims.sub, review)
            .await
    }

    /// Loans awaiting a decision or currently out (admin only)
    pub async fn list_outstanding(&self, claims: &UserClaims) -> AppResult<Vec<LoanOverview>> {
        claims.require_admin()?;
        self.repository.loans.list_outstanding().await
    }

    /// The caller's borrow history
    pub async fn get_history(&self, claims: &UserClaims) -> AppResult<Vec<LoanHistoryEntry>> {
        self.repository.loans.get_user_history(claims.sub).await
    }
}
