//! End-to-end daily challenge production.
//!
//! One entry point per worker command: produce the challenge for a
//! date, backfill missing GIF loops, backfill missing curation. Steps
//! are ordered so a crash leaves the system retryable: the game's
//! `used_date` is only written after everything else succeeded.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use guessityet_core::types::DbId;
use guessityet_db::models::game::CreateGame;
use guessityet_db::repositories::{DailyGameRepo, FranchiseRepo, GameRepo};
use guessityet_providers::{MetadataProvider, VisionScorer};
use sqlx::PgPool;

use crate::config::PipelineConfig;
use crate::curator::Curator;
use crate::error::PipelineError;
use crate::selector::Selector;
use crate::store::MediaStore;
use crate::transcode::LoopTranscoder;

/// Result of a produce run.
#[derive(Debug)]
pub enum ProduceOutcome {
    /// The date already had a challenge and `force` was not set.
    AlreadyScheduled { date: NaiveDate, game_id: DbId },
    /// A new challenge was produced and scheduled.
    Produced {
        date: NaiveDate,
        game_id: DbId,
        title: String,
        ladder_len: usize,
        has_loop: bool,
    },
}

impl std::fmt::Display for ProduceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProduceOutcome::AlreadyScheduled { date, game_id } => {
                write!(f, "{date}: already scheduled (game {game_id}), nothing to do")
            }
            ProduceOutcome::Produced {
                date,
                game_id,
                title,
                ladder_len,
                has_loop,
            } => write!(
                f,
                "{date}: scheduled \"{title}\" (game {game_id}), {ladder_len} screenshots{}",
                if *has_loop { ", with loop" } else { "" }
            ),
        }
    }
}

/// Result of a backfill run.
#[derive(Debug)]
pub enum BackfillOutcome {
    LoopMedia { scanned: usize, rendered: u32 },
    Curation { scanned: usize, curated: u32 },
}

impl std::fmt::Display for BackfillOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackfillOutcome::LoopMedia { scanned, rendered } => {
                write!(f, "loop backfill: rendered {rendered} of {scanned} pending games")
            }
            BackfillOutcome::Curation { scanned, curated } => {
                write!(f, "curation backfill: curated {curated} of {scanned} pending games")
            }
        }
    }
}

/// Owns the pipeline stages and the schedule.
pub struct Orchestrator {
    pool: PgPool,
    provider: Arc<dyn MetadataProvider>,
    store: Arc<dyn MediaStore>,
    selector: Selector,
    curator: Curator,
    transcoder: LoopTranscoder,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        pool: PgPool,
        provider: Arc<dyn MetadataProvider>,
        store: Arc<dyn MediaStore>,
        vision: Option<VisionScorer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            selector: Selector::new(provider.clone(), config.selector.clone()),
            curator: Curator::new(vision),
            transcoder: LoopTranscoder::new(config.transcode.clone()),
            pool,
            provider,
            store,
            config,
        }
    }

    /// Produce the challenge for `date`. Idempotent per date unless
    /// `force` re-generates over an existing schedule entry.
    pub async fn produce_game_for_date(
        &self,
        date: NaiveDate,
        force: bool,
    ) -> Result<ProduceOutcome, PipelineError> {
        let existing = DailyGameRepo::find_by_date(&self.pool, date).await?;
        if let Some(outcome) = schedule_noop(date, existing.as_ref().map(|e| e.game_id), force) {
            return Ok(outcome);
        }
        if existing.is_some() {
            tracing::info!(%date, "Forced re-generation, dropping existing schedule entry");
            DailyGameRepo::delete_by_date(&self.pool, date).await?;
        }

        let used: HashSet<i64> =
            GameRepo::used_external_ids(&self.pool, self.provider.name())
                .await?
                .into_iter()
                .collect();

        let candidate = self.selector.select_candidate(&used).await?;

        let franchise_id = match &candidate.franchise {
            Some(franchise) => {
                let slug = franchise
                    .slug
                    .clone()
                    .unwrap_or_else(|| slugify(&franchise.name));
                Some(
                    FranchiseRepo::upsert(&self.pool, &franchise.name, &slug)
                        .await?
                        .id,
                )
            }
            None => None,
        };

        let game = GameRepo::upsert(
            &self.pool,
            &CreateGame {
                external_id: candidate.external_id,
                provider: self.provider.name().to_string(),
                title: candidate.title.clone(),
                developer: candidate.developer.clone(),
                release_year: candidate.release_year,
                genres: join_list(&candidate.genres),
                platforms: join_list(&candidate.platforms),
                rating: candidate.rating,
                franchise_id,
                video_url: candidate.video_url.clone(),
            },
        )
        .await?;

        let loop_path = match &game.video_url {
            Some(url) => {
                // Loop media is optional; a transcode failure must not
                // sink a run that can still ship the screenshot ladder.
                match self
                    .transcoder
                    .render_loop(self.store.as_ref(), game.id, url)
                    .await
                {
                    Ok(path) => path,
                    Err(e) => {
                        tracing::warn!(game_id = game.id, error = %e, "Loop render failed, continuing without loop media");
                        None
                    }
                }
            }
            None => None,
        };
        let has_loop = loop_path.is_some();
        if let Some(path) = &loop_path {
            GameRepo::set_loop_path(&self.pool, game.id, path).await?;
        }

        let urls = self
            .provider
            .get_screenshots(candidate.external_id, self.config.max_screenshots)
            .await?;
        let ladder_len = self
            .curator
            .curate(&self.pool, self.store.as_ref(), game.id, &urls, has_loop)
            .await?;

        DailyGameRepo::create(&self.pool, game.id, date).await?;
        // Last step: only a fully produced game leaves the candidate
        // pool, so failures above stay retryable.
        GameRepo::mark_used(&self.pool, game.id, date).await?;

        tracing::info!(
            %date,
            game_id = game.id,
            title = %game.title,
            ladder_len,
            has_loop,
            "Produced daily challenge"
        );
        Ok(ProduceOutcome::Produced {
            date,
            game_id: game.id,
            title: game.title,
            ladder_len,
            has_loop,
        })
    }

    /// Render loops for published games that have a source video but
    /// no GIF yet.
    pub async fn backfill_loop_media(&self, limit: i64) -> Result<BackfillOutcome, PipelineError> {
        let games = GameRepo::list_missing_loop(&self.pool, limit).await?;
        let scanned = games.len();
        let mut rendered = 0;
        for game in games {
            let Some(url) = &game.video_url else { continue };
            match self
                .transcoder
                .render_loop(self.store.as_ref(), game.id, url)
                .await
            {
                Ok(Some(path)) => {
                    GameRepo::set_loop_path(&self.pool, game.id, &path).await?;
                    rendered += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(game_id = game.id, error = %e, "Loop backfill failed");
                }
            }
        }
        tracing::info!(rendered, "Loop media backfill finished");
        Ok(BackfillOutcome::LoopMedia { scanned, rendered })
    }

    /// Re-curate published games whose ladders were never processed.
    pub async fn backfill_curation(&self, limit: i64) -> Result<BackfillOutcome, PipelineError> {
        let games = GameRepo::list_missing_curation(&self.pool, limit).await?;
        let scanned = games.len();
        let mut curated = 0;
        for game in games {
            let urls = match self
                .provider
                .get_screenshots(game.external_id, self.config.max_screenshots)
                .await
            {
                Ok(urls) => urls,
                Err(e) => {
                    tracing::warn!(game_id = game.id, error = %e, "Screenshot fetch failed");
                    continue;
                }
            };
            match self
                .curator
                .curate(
                    &self.pool,
                    self.store.as_ref(),
                    game.id,
                    &urls,
                    game.loop_path.is_some(),
                )
                .await
            {
                Ok(_) => curated += 1,
                Err(e) => {
                    tracing::warn!(game_id = game.id, error = %e, "Curation backfill failed");
                }
            }
        }
        tracing::info!(curated, "Curation backfill finished");
        Ok(BackfillOutcome::Curation { scanned, curated })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The no-op outcome for a date that is already scheduled, unless the
/// run is forced. `None` means production should proceed.
fn schedule_noop(date: NaiveDate, existing: Option<DbId>, force: bool) -> Option<ProduceOutcome> {
    match existing {
        Some(game_id) if !force => Some(ProduceOutcome::AlreadyScheduled { date, game_id }),
        _ => None,
    }
}

/// Comma-join a name list for the flat text columns; `None` when empty.
fn join_list(items: &[String]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}

/// Fallback slug for franchises whose catalog omits one.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("The Legend of Zelda"), "the-legend-of-zelda");
        assert_eq!(slugify("Baldur's Gate II"), "baldur-s-gate-ii");
        assert_eq!(slugify("  F.E.A.R.  "), "f-e-a-r");
    }

    #[test]
    fn outcome_status_lines_are_readable() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let noop = ProduceOutcome::AlreadyScheduled { date, game_id: 4 };
        assert_eq!(
            noop.to_string(),
            "2026-08-29: already scheduled (game 4), nothing to do"
        );

        let produced = ProduceOutcome::Produced {
            date,
            game_id: 9,
            title: "Chrono Quest".into(),
            ladder_len: 5,
            has_loop: true,
        };
        assert_eq!(
            produced.to_string(),
            "2026-08-29: scheduled \"Chrono Quest\" (game 9), 5 screenshots, with loop"
        );
    }

    #[test]
    fn second_run_for_a_scheduled_date_is_a_noop_unless_forced() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();

        let outcome = schedule_noop(date, Some(4), false).unwrap();
        assert!(matches!(
            outcome,
            ProduceOutcome::AlreadyScheduled { game_id: 4, .. }
        ));

        // Forced runs replace the entry; open dates always proceed.
        assert!(schedule_noop(date, Some(4), true).is_none());
        assert!(schedule_noop(date, None, false).is_none());
    }

    #[test]
    fn backfill_status_lines_are_readable() {
        let loops = BackfillOutcome::LoopMedia {
            scanned: 5,
            rendered: 3,
        };
        assert_eq!(
            loops.to_string(),
            "loop backfill: rendered 3 of 5 pending games"
        );

        let curation = BackfillOutcome::Curation {
            scanned: 2,
            curated: 2,
        };
        assert_eq!(
            curation.to_string(),
            "curation backfill: curated 2 of 2 pending games"
        );
    }

    #[test]
    fn join_list_flattens_names() {
        assert_eq!(
            join_list(&["RPG".into(), "Strategy".into()]),
            Some("RPG, Strategy".into())
        );
        assert_eq!(join_list(&[]), None);
    }
}
