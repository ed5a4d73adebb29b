//! Repository for the `screenshots` table.

use guessityet_core::types::DbId;
use sqlx::PgPool;

use crate::models::screenshot::{CreateScreenshot, Screenshot};

const COLUMNS: &str = "id, game_id, image_url, processed_path, difficulty, \
     revelation_score, visual_score, ai_score, created_at";

/// Provides ladder storage for screenshots.
pub struct ScreenshotRepo;

impl ScreenshotRepo {
    /// Replace a game's entire screenshot ladder in one transaction.
    /// Curation always writes the full ladder, never individual rows,
    /// so readers see either the old ladder or the new one.
    pub async fn replace_for_game(
        pool: &PgPool,
        game_id: DbId,
        shots: &[CreateScreenshot],
    ) -> Result<Vec<Screenshot>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM screenshots WHERE game_id = $1")
            .bind(game_id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO screenshots (game_id, image_url, processed_path, difficulty,
                                      revelation_score, visual_score, ai_score)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let mut inserted = Vec::with_capacity(shots.len());
        for shot in shots {
            let row = sqlx::query_as::<_, Screenshot>(&query)
                .bind(game_id)
                .bind(&shot.image_url)
                .bind(&shot.processed_path)
                .bind(shot.difficulty)
                .bind(shot.revelation_score)
                .bind(shot.visual_score)
                .bind(shot.ai_score)
                .fetch_one(&mut *tx)
                .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// A game's ladder, hardest first.
    pub async fn list_by_game(pool: &PgPool, game_id: DbId) -> Result<Vec<Screenshot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM screenshots
             WHERE game_id = $1
             ORDER BY difficulty ASC"
        );
        sqlx::query_as::<_, Screenshot>(&query)
            .bind(game_id)
            .fetch_all(pool)
            .await
    }

    /// Ladder length for one game.
    pub async fn count_by_game(pool: &PgPool, game_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM screenshots WHERE game_id = $1")
                .bind(game_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
