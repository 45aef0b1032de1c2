//! Loan (borrow transaction) model and lifecycle types
//!
//! A loan only ever moves forward: REQUESTED -> APPROVED -> RETURNED, or
//! REQUESTED -> REJECTED. RETURNED and REJECTED are terminal. The associated
//! item is reserved (ON_LOAN) for the whole REQUESTED/APPROVED window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Requested,
    Approved,
    Rejected,
    Returned,
}

impl LoanStatus {
    /// Return the string code stored in the database
    pub fn as_code(&self) -> &'static str {
        match self {
            LoanStatus::Requested => "REQUESTED",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Rejected => "REJECTED",
            LoanStatus::Returned => "RETURNED",
        }
    }

    /// Whether no further transition can leave this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Rejected | LoanStatus::Returned)
    }

    /// Whether the loan still reserves its item
    pub fn is_outstanding(&self) -> bool {
        matches!(self, LoanStatus::Requested | LoanStatus::Approved)
    }

    /// Legal forward transitions of the lifecycle
    pub fn can_transition_to(&self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Requested, LoanStatus::Approved)
                | (LoanStatus::Requested, LoanStatus::Rejected)
                | (LoanStatus::Approved, LoanStatus::Returned)
        )
    }
}

impl From<&str> for LoanStatus {
    fn from(s: &str) -> Self {
        match s {
            "APPROVED" => LoanStatus::Approved,
            "REJECTED" => LoanStatus::Rejected,
            "RETURNED" => LoanStatus::Returned,
            _ => LoanStatus::Requested,
        }
    }
}

/// Admin decision on a requested loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanDecision {
    Approve,
    Reject,
}

/// Loan request payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoan {
    /// Catalog title to borrow (one copy is picked automatically)
    pub title_id: Uuid,
    /// Requested return date, must be in the future
    pub due_date: DateTime<Utc>,
}

/// Return payload; rating and review text must be given together
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReturnLoan {
    pub rating: Option<i32>,
    pub review_text: Option<String>,
}

/// Result of a committed loan request, fed into the staff notification
#[derive(Debug, Clone)]
pub struct RequestedLoan {
    pub loan_id: Uuid,
    pub due_date: DateTime<Utc>,
    pub item_barcode: String,
    pub title_name: String,
}

/// Result of a committed decision, fed into the borrower notification
#[derive(Debug, Clone)]
pub struct DecidedLoan {
    pub loan_id: Uuid,
    pub status: LoanStatus,
    pub borrower_name: String,
    pub borrower_email: String,
    pub title_name: String,
}

/// Result of a committed return
#[derive(Debug, Clone)]
pub struct ReturnedLoan {
    pub loan_id: Uuid,
    pub return_date: DateTime<Utc>,
    pub review_created: bool,
}

/// Loan with borrower and title info for the admin panel
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanOverview {
    pub id: Uuid,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub status: LoanStatus,
    pub borrower_id: Uuid,
    pub borrower_name: String,
    pub borrower_email: String,
    pub item_barcode: String,
    pub title_name: String,
}

/// One row of a member's borrow history
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanHistoryEntry {
    pub id: Uuid,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub item_barcode: String,
    pub title_id: Uuid,
    pub title_name: String,
    pub title_author: String,
    pub cover_url: Option<String>,
}

/// Check that a requested due date lies in the future
pub fn validate_due_date(due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    due_date > now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_forward_transitions_only() {
        assert!(LoanStatus::Requested.can_transition_to(LoanStatus::Approved));
        assert!(LoanStatus::Requested.can_transition_to(LoanStatus::Rejected));
        assert!(LoanStatus::Approved.can_transition_to(LoanStatus::Returned));

        assert!(!LoanStatus::Requested.can_transition_to(LoanStatus::Returned));
        assert!(!LoanStatus::Approved.can_transition_to(LoanStatus::Rejected));
        assert!(!LoanStatus::Approved.can_transition_to(LoanStatus::Requested));
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for terminal in [LoanStatus::Rejected, LoanStatus::Returned] {
            assert!(terminal.is_terminal());
            for next in [
                LoanStatus::Requested,
                LoanStatus::Approved,
                LoanStatus::Rejected,
                LoanStatus::Returned,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_outstanding_states_reserve_item() {
        assert!(LoanStatus::Requested.is_outstanding());
        assert!(LoanStatus::Approved.is_outstanding());
        assert!(!LoanStatus::Rejected.is_outstanding());
        assert!(!LoanStatus::Returned.is_outstanding());
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            LoanStatus::Requested,
            LoanStatus::Approved,
            LoanStatus::Rejected,
            LoanStatus::Returned,
        ] {
            assert_eq!(LoanStatus::from(status.as_code()), status);
        }
    }

    #[test]
    fn test_due_date_must_be_future() {
        let now = Utc::now();
        assert!(validate_due_date(now + Duration::days(7), now));
        assert!(!validate_due_date(now - Duration::days(1), now));
        assert!(!validate_due_date(now, now));
    }
}
