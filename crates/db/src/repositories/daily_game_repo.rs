//! Repository for the `daily_games` table.

use chrono::NaiveDate;
use guessityet_core::types::DbId;
use sqlx::PgPool;

use crate::models::daily_game::DailyGame;

const COLUMNS: &str = "id, game_id, date, created_at";

/// Provides the one-game-per-date schedule.
pub struct DailyGameRepo;

impl DailyGameRepo {
    /// Schedule a game for a date. Fails with a unique violation when
    /// the date is already taken; callers check [`Self::find_by_date`]
    /// first unless they want that as a guard.
    pub async fn create(
        pool: &PgPool,
        game_id: DbId,
        date: NaiveDate,
    ) -> Result<DailyGame, sqlx::Error> {
        let query = format!(
            "INSERT INTO daily_games (game_id, date)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DailyGame>(&query)
            .bind(game_id)
            .bind(date)
            .fetch_one(pool)
            .await
    }

    /// The challenge scheduled for a date, if any.
    pub async fn find_by_date(
        pool: &PgPool,
        date: NaiveDate,
    ) -> Result<Option<DailyGame>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM daily_games WHERE date = $1");
        sqlx::query_as::<_, DailyGame>(&query)
            .bind(date)
            .fetch_optional(pool)
            .await
    }

    /// Remove the schedule entry for a date. Returns `true` if a row
    /// was removed. Used by forced re-generation.
    pub async fn delete_by_date(pool: &PgPool, date: NaiveDate) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM daily_games WHERE date = $1")
            .bind(date)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Latest scheduled date, if the table is non-empty.
    pub async fn latest_date(pool: &PgPool) -> Result<Option<NaiveDate>, sqlx::Error> {
        let (latest,): (Option<NaiveDate>,) = sqlx::query_as("SELECT MAX(date) FROM daily_games")
            .fetch_one(pool)
            .await?;
        Ok(latest)
    }
}
