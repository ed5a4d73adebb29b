//! Screenshot curation.
//!
//! Downloads a game's screenshot pool, scores each image (pixel
//! heuristics blended with the optional vision model), selects the
//! difficulty ladder, renders the per-rank zoom treatment, and
//! replaces the game's stored ladder in one transaction.

use std::time::Duration;

use guessityet_core::analysis::{self, RevelationAnalysis};
use guessityet_core::curation::{select_ladder, target_count, ShotScores};
use guessityet_core::types::DbId;
use guessityet_core::zoom::render_tier;
use guessityet_db::models::screenshot::CreateScreenshot;
use guessityet_db::repositories::ScreenshotRepo;
use guessityet_providers::VisionScorer;
use image::RgbImage;
use sqlx::PgPool;

use crate::error::PipelineError;
use crate::store::{screenshot_name, MediaStore};

/// Per-image download timeout.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// JPEG quality for processed renditions.
const OUTPUT_JPEG_QUALITY: u8 = 90;

/// One downloaded, scored screenshot awaiting ladder selection.
///
/// `image` is `None` when the bytes would not decode; the screenshot
/// still participates in the ladder with a neutral score, it just
/// never gets a processed rendition.
struct ScoredShot {
    url: String,
    image: Option<RgbImage>,
    analysis: RevelationAnalysis,
}

/// Builds difficulty ladders for selected games.
pub struct Curator {
    http: reqwest::Client,
    vision: Option<VisionScorer>,
}

impl Curator {
    pub fn new(vision: Option<VisionScorer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            vision,
        }
    }

    /// Curate one game's ladder from its screenshot URLs. Returns the
    /// ladder length. Individual images that fail to download or
    /// decode stay in the pool at the neutral score; only an empty URL
    /// list fails the run.
    pub async fn curate(
        &self,
        pool: &PgPool,
        store: &dyn MediaStore,
        game_id: DbId,
        urls: &[String],
        has_loop: bool,
    ) -> Result<usize, PipelineError> {
        let scored = self.score_pool(urls).await;
        if scored.is_empty() {
            return Err(PipelineError::Download(format!(
                "no usable screenshots out of {} for game {game_id}",
                urls.len()
            )));
        }

        let rows = build_ladder_rows(store, game_id, &scored, has_loop).await?;
        let ladder_len = rows.len();
        ScreenshotRepo::replace_for_game(pool, game_id, &rows).await?;

        tracing::info!(game_id, ladder_len, pool = scored.len(), "Curated ladder");
        Ok(ladder_len)
    }

    /// Download and score every screenshot. An unreachable image is
    /// treated like an undecodable one: kept at the neutral score so
    /// one flaky CDN entry never shrinks the ladder pool.
    async fn score_pool(&self, urls: &[String]) -> Vec<ScoredShot> {
        let mut scored = Vec::with_capacity(urls.len());
        for url in urls {
            match self.fetch_and_score(url).await {
                Ok(shot) => scored.push(shot),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Screenshot fetch failed, scoring neutral");
                    scored.push(ScoredShot {
                        url: url.clone(),
                        image: None,
                        analysis: RevelationAnalysis::neutral(),
                    });
                }
            }
        }
        scored
    }

    async fn fetch_and_score(&self, url: &str) -> Result<ScoredShot, PipelineError> {
        let response = self
            .http
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| PipelineError::Download(e.to_string()))?;
        if !response.status().is_success() {
            return Err(PipelineError::Download(format!(
                "{url} returned {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Download(e.to_string()))?;

        // A corrupt image is still a usable ladder entry at a neutral
        // score; only an unreachable one is dropped.
        let dynamic = match image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(url, error = %e, "Screenshot failed to decode, scoring neutral");
                return Ok(ScoredShot {
                    url: url.to_string(),
                    image: None,
                    analysis: RevelationAnalysis::neutral(),
                });
            }
        };
        let rgb = dynamic.to_rgb8();

        let visual = analysis::analyze_image(&rgb);
        let ai_score = match &self.vision {
            Some(scorer) => scorer.score(&dynamic).await,
            None => None,
        };

        Ok(ScoredShot {
            url: url.to_string(),
            image: Some(rgb),
            analysis: RevelationAnalysis::from_scores(visual.visual_score, ai_score),
        })
    }
}

/// Select the ladder, render each rank's zoom treatment into the
/// store, and assemble the rows for the transactional replace.
async fn build_ladder_rows(
    store: &dyn MediaStore,
    game_id: DbId,
    scored: &[ScoredShot],
    has_loop: bool,
) -> Result<Vec<CreateScreenshot>, PipelineError> {
    let pool_scores: Vec<ShotScores> = scored
        .iter()
        .map(|s| ShotScores {
            revelation: s.analysis.final_score,
            visual: s.analysis.visual_score,
        })
        .collect();

    let ladder = select_ladder(&pool_scores, target_count(has_loop));

    let mut rows = Vec::with_capacity(ladder.len());
    for entry in &ladder {
        let shot = &scored[entry.index];
        let difficulty = entry.rank as i16;

        let processed_path = match &shot.image {
            Some(image) => {
                let rendered = render_tier(image, entry.rank);
                let mut jpeg = Vec::new();
                let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                    &mut jpeg,
                    OUTPUT_JPEG_QUALITY,
                );
                rendered.write_with_encoder(encoder)?;
                Some(
                    store
                        .save(&jpeg, &screenshot_name(game_id, difficulty))
                        .await?,
                )
            }
            None => None,
        };

        rows.push(CreateScreenshot {
            image_url: shot.url.clone(),
            processed_path,
            difficulty,
            revelation_score: Some(shot.analysis.final_score),
            visual_score: Some(shot.analysis.visual_score),
            ai_score: shot.analysis.ai_score,
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
