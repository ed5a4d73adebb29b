//! Repository for the `games` table.

use chrono::NaiveDate;
use guessityet_core::types::DbId;
use sqlx::PgPool;

use crate::models::game::{CreateGame, Game};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, external_id, provider, title, developer, release_year, genres, \
     platforms, rating, franchise_id, video_url, loop_path, used_date, created_at, updated_at";

/// Provides CRUD operations for games.
pub struct GameRepo;

impl GameRepo {
    /// Insert a game, or refresh its catalog metadata when the
    /// `(provider, external_id)` pair already exists. Curation state
    /// (`loop_path`, `used_date`) is never touched by the upsert.
    pub async fn upsert(pool: &PgPool, input: &CreateGame) -> Result<Game, sqlx::Error> {
        let query = format!(
            "INSERT INTO games (external_id, provider, title, developer, release_year,
                                genres, platforms, rating, franchise_id, video_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (provider, external_id) DO UPDATE SET
                title = EXCLUDED.title,
                developer = EXCLUDED.developer,
                release_year = EXCLUDED.release_year,
                genres = EXCLUDED.genres,
                platforms = EXCLUDED.platforms,
                rating = EXCLUDED.rating,
                franchise_id = EXCLUDED.franchise_id,
                video_url = EXCLUDED.video_url,
                updated_at = now()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Game>(&query)
            .bind(input.external_id)
            .bind(&input.provider)
            .bind(&input.title)
            .bind(&input.developer)
            .bind(input.release_year)
            .bind(&input.genres)
            .bind(&input.platforms)
            .bind(input.rating)
            .bind(input.franchise_id)
            .bind(&input.video_url)
            .fetch_one(pool)
            .await
    }

    /// Find a game by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Game>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM games WHERE id = $1");
        sqlx::query_as::<_, Game>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// External IDs of already-published games for one provider, used
    /// to filter selection rounds.
    pub async fn used_external_ids(pool: &PgPool, provider: &str) -> Result<Vec<i64>, sqlx::Error> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT external_id FROM games WHERE provider = $1 AND used_date IS NOT NULL",
        )
        .bind(provider)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Mark a game as published on `date`. The last step of producing
    /// a daily challenge, so a crash mid-pipeline leaves the game
    /// eligible for a retry.
    pub async fn mark_used(pool: &PgPool, id: DbId, date: NaiveDate) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE games SET used_date = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(date)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the rendered GIF loop locator.
    pub async fn set_loop_path(
        pool: &PgPool,
        id: DbId,
        loop_path: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE games SET loop_path = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(loop_path)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Published games that have a source video but no rendered loop
    /// yet, oldest first. Feeds the loop-media backfill.
    pub async fn list_missing_loop(pool: &PgPool, limit: i64) -> Result<Vec<Game>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM games
             WHERE video_url IS NOT NULL AND loop_path IS NULL AND used_date IS NOT NULL
             ORDER BY used_date ASC
             LIMIT $1"
        );
        sqlx::query_as::<_, Game>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Published games whose screenshots were never zoom-processed,
    /// oldest first. Feeds the curation backfill.
    pub async fn list_missing_curation(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<Game>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM games g
             WHERE g.used_date IS NOT NULL
               AND NOT EXISTS (
                 SELECT 1 FROM screenshots s
                 WHERE s.game_id = g.id AND s.processed_path IS NOT NULL
               )
             ORDER BY g.used_date ASC
             LIMIT $1"
        );
        sqlx::query_as::<_, Game>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
