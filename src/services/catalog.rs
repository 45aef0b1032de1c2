//! Catalog browsing and admin book management service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::title::{CreateBook, CreatedBook, TitleDetail, TitleSummary},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all catalog titles
    pub async fn list_titles(&self) -> AppResult<Vec<TitleSummary>> {
        self.repository.titles.list().await
    }

    /// Get a title with its categories and reviews
    pub async fn get_title(&self, id: Uuid) -> AppResult<TitleDetail> {
        self.repository.titles.get_detail(id).await
    }

    /// Register a book title (reused if it already exists) plus one copy
    pub async fn add_book(&self, book: CreateBook) -> AppResult<CreatedBook> {
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.repository.titles.create_book(&book).await
    }

    /// Delete a title with its items and reviews
    pub async fn delete_title(&self, id: Uuid) -> AppResult<()> {
        self.repository.titles.delete_title(id).await
    }
}
