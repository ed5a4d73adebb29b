//! Screenshot entity models.

use guessityet_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `screenshots` table.
///
/// `difficulty` is the ladder rank: 1 is the hardest (least revealing)
/// screenshot shown first, counting up to the easiest. Score columns
/// are nullable because curation can run without the AI half.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Screenshot {
    pub id: DbId,
    pub game_id: DbId,
    pub image_url: String,
    /// Locator of the zoom-processed rendition served to players.
    pub processed_path: Option<String>,
    pub difficulty: i16,
    pub revelation_score: Option<f64>,
    pub visual_score: Option<f64>,
    pub ai_score: Option<f64>,
    pub created_at: Timestamp,
}

/// DTO for the bulk ladder replace after curation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScreenshot {
    pub image_url: String,
    pub processed_path: Option<String>,
    pub difficulty: i16,
    pub revelation_score: Option<f64>,
    pub visual_score: Option<f64>,
    pub ai_score: Option<f64>,
}
