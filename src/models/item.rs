//! Physical item (circulating copy) types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Availability of a physical copy.
///
/// ON_LOAN covers the whole outstanding window: the copy is reserved as soon
/// as a loan request is created, not only once it is approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Available,
    OnLoan,
}

impl ItemStatus {
    /// Return the string code stored in the database
    pub fn as_code(&self) -> &'static str {
        match self {
            ItemStatus::Available => "AVAILABLE",
            ItemStatus::OnLoan => "ON_LOAN",
        }
    }
}
