//! Titles repository: catalog reads and admin book registration

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        review::ReviewView,
        title::{CreateBook, CreatedBook, TitleDetail, TitleSummary},
    },
    repository::is_unique_violation,
};

#[derive(Clone)]
pub struct TitlesRepository {
    pool: Pool<Postgres>,
}

impl TitlesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all titles with their categories, ordered by title
    pub async fn list(&self) -> AppResult<Vec<TitleSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.title, t.author, t.synopsis, t.cover_url, t.avg_rating,
                   COALESCE(array_agg(c.name ORDER BY c.name)
                            FILTER (WHERE c.name IS NOT NULL), '{}') as categories
            FROM titles t
            LEFT JOIN title_categories tc ON tc.title_id = t.id
            LEFT JOIN categories c ON c.id = tc.category_id
            GROUP BY t.id
            ORDER BY t.title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TitleSummary {
                id: row.get("id"),
                title: row.get("title"),
                author: row.get("author"),
                synopsis: row.get("synopsis"),
                cover_url: row.get("cover_url"),
                avg_rating: row.get("avg_rating"),
                categories: row.get("categories"),
            })
            .collect())
    }

    /// Title detail with categories and reviews
    pub async fn get_detail(&self, id: Uuid) -> AppResult<TitleDetail> {
        let row = sqlx::query(
            r#"
            SELECT t.id, t.title, t.author, t.synopsis, t.cover_url, t.avg_rating,
                   COALESCE(array_agg(c.name ORDER BY c.name)
                            FILTER (WHERE c.name IS NOT NULL), '{}') as categories
            FROM titles t
            LEFT JOIN title_categories tc ON tc.title_id = t.id
            LEFT JOIN categories c ON c.id = tc.category_id
            WHERE t.id = $1
            GROUP BY t.id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Title {} not found", id)))?;

        let review_rows = sqlx::query(
            r#"
            SELECT r.id, r.rating, r.body, r.review_date, u.name as reviewer_name
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.title_id = $1
            ORDER BY r.review_date DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let reviews = review_rows
            .into_iter()
            .map(|r| ReviewView {
                id: r.get("id"),
                rating: r.get("rating"),
                body: r.get("body"),
                review_date: r.get("review_date"),
                reviewer_name: r.get("reviewer_name"),
            })
            .collect();

        Ok(TitleDetail {
            id: row.get("id"),
            title: row.get("title"),
            author: row.get("author"),
            synopsis: row.get("synopsis"),
            cover_url: row.get("cover_url"),
            avg_rating: row.get("avg_rating"),
            categories: row.get("categories"),
            reviews,
        })
    }

    /// Register a book: reuse the title when one with the same name exists
    /// (refreshing its cover if a new one is given), then add one physical
    /// copy. All inside one transaction.
    pub async fn create_book(&self, book: &CreateBook) -> AppResult<CreatedBook> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM titles WHERE title = $1")
            .bind(&book.title)
            .fetch_optional(&mut *tx)
            .await?;

        let (title_id, title_created) = match existing {
            Some(id) => {
                if book.cover_url.is_some() {
                    sqlx::query("UPDATE titles SET cover_url = $1 WHERE id = $2")
                        .bind(&book.cover_url)
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
                (id, false)
            }
            None => {
                let id: Uuid = sqlx::query_scalar(
                    r#"
                    INSERT INTO titles (id, title, author, synopsis, cover_url)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(&book.title)
                .bind(&book.author)
                .bind(&book.synopsis)
                .bind(&book.cover_url)
                .fetch_one(&mut *tx)
                .await?;
                (id, true)
            }
        };

        let category_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO categories (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.category)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO title_categories (title_id, category_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(title_id)
        .bind(category_id)
        .execute(&mut *tx)
        .await?;

        let item_result: Result<Uuid, sqlx::Error> = sqlx::query_scalar(
            r#"
            INSERT INTO items (id, title_id, barcode_sn, condition)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title_id)
        .bind(&book.barcode_sn)
        .bind(&book.condition)
        .fetch_one(&mut *tx)
        .await;

        let item_id = match item_result {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(format!(
                    "Barcode/SN '{}' is already registered",
                    book.barcode_sn
                )));
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        Ok(CreatedBook {
            title_id,
            item_id,
            title_created,
        })
    }

    /// Delete a title and everything hanging off it, as explicit ordered
    /// statements in one transaction (dependents before parent). Refused while
    /// any copy is still out.
    pub async fn delete_title(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM titles WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("Title {} not found", id)));
        }

        let on_loan: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM items WHERE title_id = $1 AND status = 'ON_LOAN')",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if on_loan {
            return Err(AppError::Conflict(
                "Title has copies currently on loan".to_string(),
            ));
        }

        sqlx::query("DELETE FROM reviews WHERE title_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "DELETE FROM loans WHERE item_id IN (SELECT id FROM items WHERE title_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM title_categories WHERE title_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM items WHERE title_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
