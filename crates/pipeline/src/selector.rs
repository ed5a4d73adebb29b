//! Randomized candidate selection.
//!
//! Each round draws a random release-year window and page offset,
//! discovers a catalog slice there, samples a handful of games for the
//! expensive detail fetch, and scores them. The first round that
//! yields a playable candidate wins; a round can come up empty without
//! failing the run.

use std::collections::HashSet;
use std::sync::Arc;

use guessityet_core::candidate::{pick_best, priority_score, CandidateGame, PriorityWeights};
use guessityet_providers::{DiscoverQuery, GameSummary, MetadataProvider};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::config::SelectorConfig;
use crate::error::PipelineError;

/// Picks one unused game from the catalog.
pub struct Selector {
    provider: Arc<dyn MetadataProvider>,
    config: SelectorConfig,
    weights: PriorityWeights,
}

impl Selector {
    pub fn new(provider: Arc<dyn MetadataProvider>, config: SelectorConfig) -> Self {
        Self {
            provider,
            config,
            weights: PriorityWeights::default(),
        }
    }

    /// Run selection rounds until a candidate emerges or the round
    /// budget runs out. `used` holds external IDs of games already
    /// published from this provider.
    pub async fn select_candidate(
        &self,
        used: &HashSet<i64>,
    ) -> Result<CandidateGame, PipelineError> {
        for round in 1..=self.config.max_rounds {
            let query = self.draw_query(&mut rand::rng());
            tracing::debug!(
                round,
                start_year = query.start_year,
                end_year = query.end_year,
                offset = query.offset,
                "Selection round"
            );

            match self.run_round(&query, used).await {
                Ok(Some(candidate)) => {
                    tracing::info!(
                        round,
                        external_id = candidate.external_id,
                        title = %candidate.title,
                        priority = candidate.priority,
                        has_video = candidate.has_video(),
                        "Selected candidate"
                    );
                    return Ok(candidate);
                }
                Ok(None) => {}
                Err(e) if e.is_transient() => {
                    tracing::warn!(round, error = %e, "Selection round failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(PipelineError::Exhausted {
            rounds: self.config.max_rounds,
        })
    }

    /// Random year window and page offset for one round.
    fn draw_query<R: Rng>(&self, rng: &mut R) -> DiscoverQuery {
        let c = &self.config;
        let span = rng.random_range(c.min_span..=c.max_span);
        let start_year = rng.random_range(c.min_year..=(c.max_year - span).max(c.min_year));
        DiscoverQuery {
            start_year,
            end_year: (start_year + span).min(c.max_year),
            min_rating: c.min_rating,
            max_rating: c.max_rating,
            limit: c.discover_limit,
            offset: rng.random_range(0..=c.max_offset),
        }
    }

    /// One round: discover, filter, sample, detail-fetch, score.
    async fn run_round(
        &self,
        query: &DiscoverQuery,
        used: &HashSet<i64>,
    ) -> Result<Option<CandidateGame>, guessityet_providers::ProviderError> {
        let discovered = self.provider.discover(query).await?;

        let fresh: Vec<GameSummary> = discovered
            .into_iter()
            .filter(|g| !used.contains(&g.id))
            .collect();
        if fresh.is_empty() {
            return Ok(None);
        }

        let sampled: Vec<&GameSummary> = fresh
            .choose_multiple(&mut rand::rng(), self.config.sample_size)
            .collect();

        let mut candidates = Vec::with_capacity(sampled.len());
        for summary in sampled {
            match self.assess(summary.id).await {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(external_id = summary.id, error = %e, "Detail fetch failed");
                }
            }
        }

        Ok(pick_best(candidates))
    }

    /// Detail-fetch one game and score it; `None` when it is unknown
    /// or not playable.
    async fn assess(
        &self,
        id: i64,
    ) -> Result<Option<CandidateGame>, guessityet_providers::ProviderError> {
        let Some(detail) = self.provider.get_details(id).await? else {
            return Ok(None);
        };

        // The detail payload's count hint can undercount; confirm with
        // the screenshot endpoint before rejecting.
        let screenshot_count = if detail.screenshot_count >= self.config.min_screenshots {
            detail.screenshot_count
        } else {
            let shots = self
                .provider
                .get_screenshots(id, self.config.min_screenshots)
                .await?;
            shots.len() as u32
        };
        if screenshot_count < self.config.min_screenshots {
            tracing::debug!(
                external_id = id,
                screenshot_count,
                "Rejected: too few screenshots"
            );
            return Ok(None);
        }

        // Only directly fetchable sources count: a streaming page can
        // never become loop media, so it earns no priority bonus.
        let video_url = self
            .provider
            .get_videos(id)
            .await?
            .into_iter()
            .find(|url| crate::transcode::is_direct_video(url));

        let priority = priority_score(
            &self.weights,
            detail.rating,
            video_url.is_some(),
            screenshot_count,
        );
        Ok(Some(CandidateGame {
            external_id: detail.id,
            title: detail.name,
            developer: detail.developer,
            release_year: detail.release_year,
            genres: detail.genres,
            platforms: detail.platforms,
            rating: detail.rating,
            franchise: detail.franchise,
            video_url,
            screenshot_count,
            priority,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use guessityet_providers::{GameDetail, ProviderError};
    use std::collections::HashMap;

    /// Canned catalog for selector tests.
    struct FakeCatalog {
        games: Vec<GameSummary>,
        details: HashMap<i64, GameDetail>,
        screenshots: HashMap<i64, usize>,
        videos: HashMap<i64, Vec<String>>,
    }

    impl FakeCatalog {
        fn empty() -> Self {
            Self {
                games: Vec::new(),
                details: HashMap::new(),
                screenshots: HashMap::new(),
                videos: HashMap::new(),
            }
        }

        fn with_game(mut self, id: i64, rating: f64, shots: usize, video: bool) -> Self {
            self.games.push(GameSummary {
                id,
                name: format!("Game {id}"),
                rating: Some(rating),
            });
            self.details.insert(
                id,
                GameDetail {
                    id,
                    name: format!("Game {id}"),
                    developer: Some("Studio".into()),
                    release_year: Some(1998),
                    genres: vec!["Action".into()],
                    platforms: vec!["PC".into()],
                    rating: Some(rating),
                    franchise: None,
                    screenshot_count: shots as u32,
                },
            );
            self.screenshots.insert(id, shots);
            if video {
                self.videos
                    .insert(id, vec![format!("https://cdn/clip_{id}.mp4")]);
            }
            self
        }

        fn with_videos(mut self, id: i64, urls: &[&str]) -> Self {
            self.videos
                .insert(id, urls.iter().map(|u| u.to_string()).collect());
            self
        }
    }

    #[async_trait]
    impl MetadataProvider for FakeCatalog {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn search(&self, _q: &str, _limit: u32) -> Result<Vec<GameSummary>, ProviderError> {
            Ok(self.games.clone())
        }

        async fn discover(&self, _q: &DiscoverQuery) -> Result<Vec<GameSummary>, ProviderError> {
            Ok(self.games.clone())
        }

        async fn get_details(&self, id: i64) -> Result<Option<GameDetail>, ProviderError> {
            Ok(self.details.get(&id).cloned())
        }

        async fn get_screenshots(&self, id: i64, max: u32) -> Result<Vec<String>, ProviderError> {
            let count = self.screenshots.get(&id).copied().unwrap_or(0);
            Ok((0..count.min(max as usize))
                .map(|i| format!("https://cdn/shot_{id}_{i}.png"))
                .collect())
        }

        async fn get_videos(&self, id: i64) -> Result<Vec<String>, ProviderError> {
            Ok(self.videos.get(&id).cloned().unwrap_or_default())
        }
    }

    fn selector(catalog: FakeCatalog) -> Selector {
        let config = SelectorConfig {
            max_rounds: 3,
            ..SelectorConfig::default()
        };
        Selector::new(Arc::new(catalog), config)
    }

    // -- selection -----------------------------------------------------------

    #[tokio::test]
    async fn picks_video_candidate_over_higher_rated() {
        let catalog = FakeCatalog::empty()
            .with_game(1, 95.0, 15, false)
            .with_game(2, 62.0, 9, true);
        let picked = selector(catalog)
            .select_candidate(&HashSet::new())
            .await
            .unwrap();
        assert_eq!(picked.external_id, 2);
        assert!(picked.has_video());
    }

    #[tokio::test]
    async fn streaming_only_videos_earn_no_video_bonus() {
        // A YouTube page cannot be turned into loop media, so the
        // higher-rated game must not outrank the direct-video one.
        let catalog = FakeCatalog::empty()
            .with_game(1, 95.0, 15, false)
            .with_videos(1, &["https://www.youtube.com/watch?v=abc"])
            .with_game(2, 62.0, 9, true);
        let picked = selector(catalog)
            .select_candidate(&HashSet::new())
            .await
            .unwrap();
        assert_eq!(picked.external_id, 2);
    }

    #[tokio::test]
    async fn streaming_only_video_is_not_recorded() {
        let catalog = FakeCatalog::empty()
            .with_game(1, 80.0, 12, false)
            .with_videos(1, &["https://youtu.be/abc", "https://www.youtube.com/watch?v=d"]);
        let picked = selector(catalog)
            .select_candidate(&HashSet::new())
            .await
            .unwrap();
        assert!(picked.video_url.is_none());
        assert!(!picked.has_video());
    }

    #[tokio::test]
    async fn used_games_are_filtered_out() {
        let catalog = FakeCatalog::empty()
            .with_game(1, 80.0, 12, true)
            .with_game(2, 70.0, 10, false);
        let used: HashSet<i64> = [1].into();
        let picked = selector(catalog).select_candidate(&used).await.unwrap();
        assert_eq!(picked.external_id, 2);
    }

    #[tokio::test]
    async fn screenshot_poor_games_are_rejected() {
        let catalog = FakeCatalog::empty()
            .with_game(1, 90.0, 3, true)
            .with_game(2, 65.0, 11, false);
        let picked = selector(catalog)
            .select_candidate(&HashSet::new())
            .await
            .unwrap();
        assert_eq!(picked.external_id, 2);
    }

    #[tokio::test]
    async fn exhaustion_when_catalog_has_nothing_usable() {
        let err = selector(FakeCatalog::empty())
            .select_candidate(&HashSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Exhausted { rounds: 3 }));
    }

    // -- query drawing -------------------------------------------------------

    #[test]
    fn drawn_queries_respect_config_bounds() {
        let sel = selector(FakeCatalog::empty());
        let mut rng = rand::rng();
        for _ in 0..200 {
            let q = sel.draw_query(&mut rng);
            assert!(q.start_year >= 1980);
            assert!(q.end_year <= 2020);
            let span = q.end_year - q.start_year;
            assert!((3..=7).contains(&span), "span {span} out of range");
            assert!(q.offset <= 200);
        }
    }
}
