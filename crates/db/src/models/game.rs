//! Game and franchise entity models.

use chrono::NaiveDate;
use guessityet_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `games` table.
///
/// `(provider, external_id)` identifies the game in its source catalog
/// and is unique; `used_date` is set once the game has been published
/// as a daily challenge and keeps it out of later selection rounds.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Game {
    pub id: DbId,
    pub external_id: i64,
    /// Source catalog tag (`igdb` or `rawg`).
    pub provider: String,
    pub title: String,
    pub developer: Option<String>,
    pub release_year: Option<i32>,
    /// Comma-joined genre names.
    pub genres: Option<String>,
    /// Comma-joined platform names.
    pub platforms: Option<String>,
    pub rating: Option<f64>,
    pub franchise_id: Option<DbId>,
    pub video_url: Option<String>,
    /// Locator of the rendered GIF loop, once transcoded.
    pub loop_path: Option<String>,
    pub used_date: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting or upserting a game from catalog detail.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGame {
    pub external_id: i64,
    pub provider: String,
    pub title: String,
    pub developer: Option<String>,
    pub release_year: Option<i32>,
    pub genres: Option<String>,
    pub platforms: Option<String>,
    pub rating: Option<f64>,
    pub franchise_id: Option<DbId>,
    pub video_url: Option<String>,
}

/// A row from the `franchises` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Franchise {
    pub id: DbId,
    pub name: String,
    pub slug: String,
}
