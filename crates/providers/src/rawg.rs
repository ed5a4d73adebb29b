//! RAWG catalog integration.
//!
//! RAWG is the key-authenticated fallback catalog. Responses are paged
//! under a `results` array; ratings come from the Metacritic score so
//! both catalogs speak the same 0-100 scale.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::provider::{DiscoverQuery, MetadataProvider};
use crate::types::{GameDetail, GameSummary};

const BASE_URL: &str = "https://api.rawg.io/api";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// RAWG metadata provider.
pub struct RawgProvider {
    client: reqwest::Client,
    api_key: String,
}

impl RawgProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    /// Build from `RAWG_API_KEY`.
    pub fn from_env() -> Option<Self> {
        std::env::var("RAWG_API_KEY").ok().map(Self::new)
    }

    /// GET a RAWG endpoint with the API key plus extra query params.
    async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{BASE_URL}/{path}");

        tracing::debug!(path, "RAWG request");

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(format!("{path}: {e}")))
    }
}

// ---------------------------------------------------------------------------
// RAWG payload structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RawgGame {
    id: i64,
    name: Option<String>,
    metacritic: Option<f64>,
    released: Option<String>,
    #[serde(default)]
    genres: Vec<Named>,
    #[serde(default)]
    platforms: Vec<PlatformEntry>,
    #[serde(default)]
    developers: Vec<Named>,
    screenshots_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlatformEntry {
    platform: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct RawgScreenshot {
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawgMovie {
    #[serde(default)]
    data: MovieData,
}

#[derive(Debug, Default, Deserialize)]
struct MovieData {
    max: Option<String>,
    #[serde(rename = "480")]
    sd: Option<String>,
}

// ---------------------------------------------------------------------------
// Pure mapping helpers
// ---------------------------------------------------------------------------

/// Year prefix of a RAWG `YYYY-MM-DD` release date.
fn release_year(released: Option<&str>) -> Option<i32> {
    released?.get(..4)?.parse().ok()
}

/// Prefer the full-quality rendition, fall back to 480p.
fn movie_url(movie: RawgMovie) -> Option<String> {
    movie.data.max.or(movie.data.sd)
}

fn detail_from_game(game: RawgGame) -> GameDetail {
    // RAWG has no franchise endpoint worth querying per game; series
    // membership is derived later from title matching when needed.
    GameDetail {
        id: game.id,
        name: game.name.unwrap_or_default(),
        developer: game.developers.into_iter().find_map(|d| d.name),
        release_year: release_year(game.released.as_deref()),
        genres: game.genres.into_iter().filter_map(|g| g.name).collect(),
        platforms: game
            .platforms
            .into_iter()
            .filter_map(|p| p.platform.and_then(|n| n.name))
            .collect(),
        rating: game.metacritic,
        franchise: None,
        screenshot_count: game.screenshots_count.unwrap_or(0),
    }
}

// ---------------------------------------------------------------------------
// MetadataProvider implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl MetadataProvider for RawgProvider {
    fn name(&self) -> &'static str {
        "rawg"
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<GameSummary>, ProviderError> {
        let page: Page<RawgGame> = self
            .request(
                "games",
                &[
                    ("search", query.to_string()),
                    ("page_size", limit.to_string()),
                ],
            )
            .await?;
        Ok(page
            .results
            .into_iter()
            .map(|g| GameSummary {
                id: g.id,
                name: g.name.unwrap_or_default(),
                rating: g.metacritic,
            })
            .collect())
    }

    async fn discover(&self, query: &DiscoverQuery) -> Result<Vec<GameSummary>, ProviderError> {
        // RAWG pages are 1-based; translate the row offset.
        let page_number = query.offset / query.limit.max(1) + 1;
        let page: Page<RawgGame> = self
            .request(
                "games",
                &[
                    (
                        "dates",
                        format!("{}-01-01,{}-12-31", query.start_year, query.end_year),
                    ),
                    (
                        "metacritic",
                        format!("{},{}", query.min_rating as i64, query.max_rating as i64),
                    ),
                    ("ordering", "-metacritic".to_string()),
                    ("page", page_number.to_string()),
                    ("page_size", query.limit.to_string()),
                ],
            )
            .await?;
        Ok(page
            .results
            .into_iter()
            .map(|g| GameSummary {
                id: g.id,
                name: g.name.unwrap_or_default(),
                rating: g.metacritic,
            })
            .collect())
    }

    async fn get_details(&self, id: i64) -> Result<Option<GameDetail>, ProviderError> {
        match self.request::<RawgGame>(&format!("games/{id}"), &[]).await {
            Ok(game) => Ok(Some(detail_from_game(game))),
            Err(ProviderError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_screenshots(&self, id: i64, max: u32) -> Result<Vec<String>, ProviderError> {
        let page: Page<RawgScreenshot> = self
            .request(
                &format!("games/{id}/screenshots"),
                &[("page_size", max.to_string())],
            )
            .await?;
        Ok(page.results.into_iter().filter_map(|s| s.image).collect())
    }

    async fn get_videos(&self, id: i64) -> Result<Vec<String>, ProviderError> {
        let page: Page<RawgMovie> = self.request(&format!("games/{id}/movies"), &[]).await?;
        Ok(page.results.into_iter().filter_map(movie_url).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- release year --------------------------------------------------------

    #[test]
    fn year_parsed_from_release_date() {
        assert_eq!(release_year(Some("1998-11-20")), Some(1998));
        assert_eq!(release_year(Some("bad")), None);
        assert_eq!(release_year(None), None);
    }

    // -- movie rendition choice ----------------------------------------------

    #[test]
    fn max_rendition_preferred_over_sd() {
        let movie: RawgMovie = serde_json::from_value(serde_json::json!({
            "data": {"max": "https://cdn/max.mp4", "480": "https://cdn/sd.mp4"}
        }))
        .unwrap();
        assert_eq!(movie_url(movie), Some("https://cdn/max.mp4".into()));

        let sd_only: RawgMovie = serde_json::from_value(serde_json::json!({
            "data": {"480": "https://cdn/sd.mp4"}
        }))
        .unwrap();
        assert_eq!(movie_url(sd_only), Some("https://cdn/sd.mp4".into()));
    }

    // -- detail mapping ------------------------------------------------------

    #[test]
    fn detail_mapping_full_payload() {
        let game: RawgGame = serde_json::from_value(serde_json::json!({
            "id": 3498,
            "name": "Grand Adventure V",
            "metacritic": 92,
            "released": "2013-09-17",
            "genres": [{"name": "Action", "slug": "action"}],
            "platforms": [{"platform": {"name": "PC", "slug": "pc"}}],
            "developers": [{"name": "Big Studio", "slug": "big-studio"}],
            "screenshots_count": 12
        }))
        .unwrap();
        let detail = detail_from_game(game);
        assert_eq!(detail.rating, Some(92.0));
        assert_eq!(detail.release_year, Some(2013));
        assert_eq!(detail.developer, Some("Big Studio".into()));
        assert_eq!(detail.platforms, vec!["PC"]);
        assert_eq!(detail.screenshot_count, 12);
    }

    #[test]
    fn detail_mapping_tolerates_missing_fields() {
        let game: RawgGame =
            serde_json::from_value(serde_json::json!({"id": 1, "name": "Bare"})).unwrap();
        let detail = detail_from_game(game);
        assert!(detail.rating.is_none());
        assert!(detail.release_year.is_none());
        assert!(detail.developer.is_none());
        assert_eq!(detail.screenshot_count, 0);
    }

    #[test]
    fn page_decodes_without_results_field() {
        let page: Page<RawgGame> = serde_json::from_str("{}").unwrap();
        assert!(page.results.is_empty());
    }
}
