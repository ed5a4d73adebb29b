//! Daily challenge entity model.

use chrono::NaiveDate;
use guessityet_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `daily_games` table. One game per calendar date,
/// enforced by a unique index on `date`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DailyGame {
    pub id: DbId,
    pub game_id: DbId,
    pub date: NaiveDate,
    pub created_at: Timestamp,
}
