//! Catalog title model and related types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::review::ReviewView;

/// Catalog listing entry
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TitleSummary {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub synopsis: Option<String>,
    pub cover_url: Option<String>,
    pub avg_rating: f64,
    pub categories: Vec<String>,
}

/// Title detail with reviews
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TitleDetail {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub synopsis: Option<String>,
    pub cover_url: Option<String>,
    pub avg_rating: f64,
    pub categories: Vec<String>,
    pub reviews: Vec<ReviewView>,
}

/// Admin payload registering a title (created if new) plus one physical copy
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    #[validate(length(min = 1, max = 120))]
    pub author: String,
    pub synopsis: Option<String>,
    #[validate(length(min = 1, max = 60))]
    pub category: String,
    #[validate(length(min = 1, max = 60))]
    pub barcode_sn: String,
    pub condition: Option<String>,
    pub cover_url: Option<String>,
}

/// Result of registering a book
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedBook {
    pub title_id: Uuid,
    pub item_id: Uuid,
    pub title_created: bool,
}
