//! Catalog and admin book management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::title::{CreateBook, CreatedBook, TitleDetail, TitleSummary},
};

use super::AuthenticatedUser;

/// Book registration response
#[derive(Serialize, ToSchema)]
pub struct CreateBookResponse {
    pub message: String,
    #[serde(flatten)]
    pub created: CreatedBook,
}

/// List all catalog titles
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "Catalog titles", body = Vec<TitleSummary>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<TitleSummary>>> {
    let titles = state.services.catalog.list_titles().await?;
    Ok(Json(titles))
}

/// Get a title with its reviews
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = Uuid, Path, description = "Title ID")
    ),
    responses(
        (status = 200, description = "Title detail", body = TitleDetail),
        (status = 404, description = "Title not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TitleDetail>> {
    let detail = state.services.catalog.get_title(id).await?;
    Ok(Json(detail))
}

/// Register a book title plus one physical copy (admin)
#[utoipa::path(
    post,
    path = "/admin/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book registered", body = CreateBookResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Admin access required"),
        (status = 409, description = "Barcode already registered")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<CreateBookResponse>)> {
    claims.require_admin()?;

    let created = state.services.catalog.add_book(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookResponse {
            message: "Book successfully registered".to_string(),
            created,
        }),
    ))
}

/// Delete a title with its copies and reviews (admin)
#[utoipa::path(
    delete,
    path = "/admin/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Title ID")
    ),
    responses(
        (status = 204, description = "Title deleted"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Title not found"),
        (status = 409, description = "Copies still on loan")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.catalog.delete_title(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
