//! Repository for the `franchises` table.

use sqlx::PgPool;

use crate::models::game::Franchise;

const COLUMNS: &str = "id, name, slug";

/// Provides lookup and upsert for franchises.
pub struct FranchiseRepo;

impl FranchiseRepo {
    /// Insert a franchise or return the existing row for its slug.
    pub async fn upsert(pool: &PgPool, name: &str, slug: &str) -> Result<Franchise, sqlx::Error> {
        let query = format!(
            "INSERT INTO franchises (name, slug)
             VALUES ($1, $2)
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Franchise>(&query)
            .bind(name)
            .bind(slug)
            .fetch_one(pool)
            .await
    }

    /// Find a franchise by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Franchise>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM franchises WHERE slug = $1");
        sqlx::query_as::<_, Franchise>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }
}
