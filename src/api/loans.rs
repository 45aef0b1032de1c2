//! Loan lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::loan::{CreateLoan, LoanDecision, LoanHistoryEntry, LoanOverview, LoanStatus, ReturnLoan},
};

use super::AuthenticatedUser;

/// Loan request response
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    /// Loan ID
    pub id: Uuid,
    /// Due date (ISO 8601 format)
    pub due_date: DateTime<Utc>,
    /// Status message
    pub message: String,
}

/// Decision request body
#[derive(Deserialize, ToSchema)]
pub struct DecideLoanRequest {
    pub action: LoanDecision,
}

/// Decision response
#[derive(Serialize, ToSchema)]
pub struct DecideLoanResponse {
    pub id: Uuid,
    pub status: LoanStatus,
    pub message: String,
}

/// Return response
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub id: Uuid,
    pub return_date: DateTime<Utc>,
    pub review_created: bool,
    pub message: String,
}

/// Request a loan for a title
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan requested", body = LoanResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Title not found"),
        (status = 409, description = "No copy available")
    )
)]
pub async fn request_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    let requested = state.services.loans.request_loan(&claims, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            id: requested.loan_id,
            due_date: requested.due_date,
            message: "Loan request submitted successfully".to_string(),
        }),
    ))
}

/// Approve or reject a requested loan (admin)
#[utoipa::path(
    patch,
    path = "/admin/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Loan ID")
    ),
    request_body = DecideLoanRequest,
    responses(
        (status = 200, description = "Decision applied", body = DecideLoanResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Loan not in REQUESTED state")
    )
)]
pub async fn decide_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
    Json(request): Json<DecideLoanRequest>,
) -> AppResult<Json<DecideLoanResponse>> {
    let decided = state
        .services
        .loans
        .decide_loan(&claims, loan_id, request.action)
        .await?;

    Ok(Json(DecideLoanResponse {
        id: decided.loan_id,
        status: decided.status,
        message: format!("Loan successfully {}", decided.status.as_code()),
    }))
}

/// Return an approved loan, optionally with a review
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Loan ID")
    ),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Item returned", body = ReturnResponse),
        (status = 400, description = "Invalid review payload"),
        (status = 403, description = "Loan belongs to another member"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already reviewed this title"),
        (status = 422, description = "Loan not in APPROVED state")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
    Json(request): Json<ReturnLoan>,
) -> AppResult<Json<ReturnResponse>> {
    let returned = state
        .services
        .loans
        .return_loan(&claims, loan_id, request)
        .await?;

    Ok(Json(ReturnResponse {
        id: returned.loan_id,
        return_date: returned.return_date,
        review_created: returned.review_created,
        message: "Book successfully returned".to_string(),
    }))
}

/// List loans awaiting a decision or currently out (admin)
#[utoipa::path(
    get,
    path = "/admin/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Outstanding loans, oldest request first", body = Vec<LoanOverview>),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_outstanding_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanOverview>>> {
    let loans = state.services.loans.list_outstanding(&claims).await?;
    Ok(Json(loans))
}

/// The caller's borrow history
#[utoipa::path(
    get,
    path = "/loans/history",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Borrow history, newest first", body = Vec<LoanHistoryEntry>)
    )
)]
pub async fn get_loan_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanHistoryEntry>>> {
    let history = state.services.loans.get_history(&claims).await?;
    Ok(Json(history))
}
