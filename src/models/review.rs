//! Review model

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Review with the author's display name, for title detail pages.
/// At most one review per (user, title) pair, enforced by a unique constraint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewView {
    pub id: Uuid,
    pub rating: i32,
    pub body: String,
    pub review_date: DateTime<Utc>,
    pub reviewer_name: String,
}

/// Check that a rating lies in the accepted 1..=5 range
pub fn rating_in_range(rating: i32) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(!rating_in_range(0));
        assert!(rating_in_range(1));
        assert!(rating_in_range(3));
        assert!(rating_in_range(5));
        assert!(!rating_in_range(6));
        assert!(!rating_in_range(-1));
    }
}
