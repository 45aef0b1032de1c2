//! Repository layer for database operations

pub mod loans;
pub mod titles;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct bundling the per-aggregate repositories
#[derive(Clone)]
pub struct Repository {
    pub titles: titles::TitlesRepository,
    pub users: users::UsersRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            titles: titles::TitlesRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool),
        }
    }
}

/// Check whether a sqlx error is a Postgres unique-constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
