//! IGDB catalog integration.
//!
//! IGDB authenticates with Twitch OAuth client credentials. The access
//! token is cached behind a mutex and reused until shortly before
//! expiry, then refreshed just-in-time — the only in-process cache the
//! pipeline carries.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use guessityet_core::candidate::Franchise;
use guessityet_core::types::Timestamp;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::ProviderError;
use crate::provider::{DiscoverQuery, MetadataProvider};
use crate::types::{GameDetail, GameSummary};

const BASE_URL: &str = "https://api.igdb.com/v4";
const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tokens are refreshed this many seconds before their reported expiry.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 300;

/// A cached Twitch OAuth access token.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Timestamp,
}

impl CachedToken {
    fn is_valid_at(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}

/// IGDB metadata provider.
pub struct IgdbProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl IgdbProvider {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            token: Mutex::new(None),
        }
    }

    /// Build from `IGDB_CLIENT_ID` / `IGDB_CLIENT_SECRET`.
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("IGDB_CLIENT_ID").ok()?;
        let client_secret = std::env::var("IGDB_CLIENT_SECRET").ok()?;
        Some(Self::new(client_id, client_secret))
    }

    /// Return a valid access token, refreshing it when stale.
    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut guard = self.token.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.is_valid_at(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            #[serde(default = "default_expires_in")]
            expires_in: i64,
        }
        fn default_expires_in() -> i64 {
            3600
        }

        let response = self
            .client
            .post(TOKEN_URL)
            .timeout(REQUEST_TIMEOUT)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("bad token response: {e}")))?;

        let cached = CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(token.expires_in - TOKEN_REFRESH_MARGIN_SECS),
        };
        *guard = Some(cached);

        tracing::debug!("Refreshed IGDB access token");
        Ok(token.access_token)
    }

    /// POST an IGDB query-language body to an endpoint.
    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<Vec<T>, ProviderError> {
        let token = self.access_token().await?;
        let url = format!("{BASE_URL}/{endpoint}");

        tracing::debug!(endpoint, query, "IGDB request");

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("Client-ID", &self.client_id)
            .header("Authorization", format!("Bearer {token}"))
            .body(query.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(format!("{endpoint}: {e}")))
    }
}

// ---------------------------------------------------------------------------
// IGDB payload structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct IgdbGame {
    id: i64,
    name: Option<String>,
    aggregated_rating: Option<f64>,
    first_release_date: Option<i64>,
    #[serde(default)]
    genres: Vec<Named>,
    #[serde(default)]
    platforms: Vec<Named>,
    #[serde(default)]
    involved_companies: Vec<InvolvedCompany>,
    #[serde(default)]
    franchises: Vec<IgdbFranchise>,
    #[serde(default)]
    screenshots: Vec<IgdbImage>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvolvedCompany {
    company: Option<Named>,
    #[serde(default)]
    developer: bool,
}

#[derive(Debug, Deserialize)]
struct IgdbFranchise {
    name: Option<String>,
    slug: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IgdbImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IgdbVideo {
    video_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Pure mapping helpers
// ---------------------------------------------------------------------------

/// Strip characters that would break out of an IGDB quoted search term.
fn escape_search_term(term: &str) -> String {
    term.replace(['"', ';'], "")
}

/// Upgrade an IGDB thumbnail URL to the large screenshot rendition and
/// fix the scheme-relative form the API returns.
fn normalize_image_url(url: &str) -> String {
    let upgraded = url.replace("t_thumb", "t_screenshot_big");
    if upgraded.starts_with("http") {
        upgraded
    } else if let Some(rest) = upgraded.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        format!("https:{upgraded}")
    }
}

/// IGDB only stores YouTube video ids.
fn youtube_watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Release year from a Unix timestamp, when in representable range.
fn release_year(first_release_date: Option<i64>) -> Option<i32> {
    use chrono::Datelike;
    let ts = first_release_date?;
    Utc.timestamp_opt(ts, 0).single().map(|dt| dt.year())
}

/// Developer name: the company flagged as developer, else the first
/// involved company.
fn developer_name(companies: &[InvolvedCompany]) -> Option<String> {
    companies
        .iter()
        .find(|c| c.developer)
        .or_else(|| companies.first())
        .and_then(|c| c.company.as_ref())
        .and_then(|c| c.name.clone())
}

fn named_list(items: &[Named]) -> Vec<String> {
    items.iter().filter_map(|n| n.name.clone()).collect()
}

fn detail_from_game(game: IgdbGame) -> GameDetail {
    let franchise = game.franchises.into_iter().next().and_then(|f| {
        f.name.map(|name| Franchise {
            name,
            slug: f.slug,
        })
    });

    GameDetail {
        id: game.id,
        name: game.name.unwrap_or_default(),
        developer: developer_name(&game.involved_companies),
        release_year: release_year(game.first_release_date),
        genres: named_list(&game.genres),
        platforms: named_list(&game.platforms),
        rating: game.aggregated_rating,
        franchise,
        screenshot_count: game.screenshots.len() as u32,
    }
}

/// Unix timestamp bounds for a calendar-year window.
fn year_window_timestamps(start_year: i32, end_year: i32) -> (i64, i64) {
    let start = Utc
        .with_ymd_and_hms(start_year, 1, 1, 0, 0, 0)
        .single()
        .map(|dt| dt.timestamp())
        .unwrap_or(0);
    let end = Utc
        .with_ymd_and_hms(end_year, 12, 31, 23, 59, 59)
        .single()
        .map(|dt| dt.timestamp())
        .unwrap_or(i64::MAX);
    (start, end)
}

// ---------------------------------------------------------------------------
// MetadataProvider implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl MetadataProvider for IgdbProvider {
    fn name(&self) -> &'static str {
        "igdb"
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<GameSummary>, ProviderError> {
        let body = format!(
            "search \"{}\"; fields name, aggregated_rating; limit {limit};",
            escape_search_term(query)
        );
        let games: Vec<IgdbGame> = self.request("games", &body).await?;
        Ok(games
            .into_iter()
            .map(|g| GameSummary {
                id: g.id,
                name: g.name.unwrap_or_default(),
                rating: g.aggregated_rating,
            })
            .collect())
    }

    async fn discover(&self, query: &DiscoverQuery) -> Result<Vec<GameSummary>, ProviderError> {
        let (start_ts, end_ts) = year_window_timestamps(query.start_year, query.end_year);
        let body = format!(
            "fields name, id, aggregated_rating, first_release_date; \
             where aggregated_rating >= {} & aggregated_rating <= {} & screenshots != null & \
             first_release_date > {start_ts} & first_release_date < {end_ts}; \
             sort aggregated_rating desc; limit {}; offset {};",
            query.min_rating, query.max_rating, query.limit, query.offset,
        );
        let games: Vec<IgdbGame> = self.request("games", &body).await?;
        Ok(games
            .into_iter()
            .map(|g| GameSummary {
                id: g.id,
                name: g.name.unwrap_or_default(),
                rating: g.aggregated_rating,
            })
            .collect())
    }

    async fn get_details(&self, id: i64) -> Result<Option<GameDetail>, ProviderError> {
        let body = format!(
            "fields name, first_release_date, genres.name, platforms.name, \
             involved_companies.company.name, involved_companies.developer, \
             aggregated_rating, screenshots.url, franchises.name, franchises.slug; \
             where id = {id};"
        );
        let games: Vec<IgdbGame> = self.request("games", &body).await?;
        Ok(games.into_iter().next().map(detail_from_game))
    }

    async fn get_screenshots(&self, id: i64, max: u32) -> Result<Vec<String>, ProviderError> {
        let body = format!("fields url; where game = {id}; limit {max};");
        let shots: Vec<IgdbImage> = self.request("screenshots", &body).await?;
        Ok(shots
            .into_iter()
            .filter_map(|s| s.url)
            .map(|url| normalize_image_url(&url))
            .collect())
    }

    async fn get_videos(&self, id: i64) -> Result<Vec<String>, ProviderError> {
        let body = format!("fields video_id; where game = {id};");
        let videos: Vec<IgdbVideo> = self.request("game_videos", &body).await?;
        Ok(videos
            .into_iter()
            .filter_map(|v| v.video_id)
            .filter(|id| !id.is_empty())
            .map(|id| youtube_watch_url(&id))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- URL normalization ---------------------------------------------------

    #[test]
    fn thumbnail_upgraded_and_scheme_fixed() {
        let url = "//images.igdb.com/igdb/image/upload/t_thumb/abc123.jpg";
        assert_eq!(
            normalize_image_url(url),
            "https://images.igdb.com/igdb/image/upload/t_screenshot_big/abc123.jpg"
        );
    }

    #[test]
    fn absolute_url_kept() {
        let url = "https://images.igdb.com/igdb/image/upload/t_screenshot_big/abc.jpg";
        assert_eq!(normalize_image_url(url), url);
    }

    #[test]
    fn youtube_url_from_video_id() {
        assert_eq!(
            youtube_watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    // -- release year --------------------------------------------------------

    #[test]
    fn release_year_from_timestamp() {
        // 2001-03-22
        assert_eq!(release_year(Some(985219200)), Some(2001));
        assert_eq!(release_year(None), None);
    }

    // -- developer extraction ------------------------------------------------

    fn company(name: &str, developer: bool) -> InvolvedCompany {
        InvolvedCompany {
            company: Some(Named {
                name: Some(name.to_string()),
            }),
            developer,
        }
    }

    #[test]
    fn flagged_developer_preferred() {
        let companies = vec![company("Publisher Corp", false), company("Dev House", true)];
        assert_eq!(developer_name(&companies), Some("Dev House".into()));
    }

    #[test]
    fn first_company_as_fallback() {
        let companies = vec![company("Only Corp", false)];
        assert_eq!(developer_name(&companies), Some("Only Corp".into()));
        assert_eq!(developer_name(&[]), None);
    }

    // -- query building ------------------------------------------------------

    #[test]
    fn search_term_escaped() {
        assert_eq!(escape_search_term("half\"; fields *;"), "half fields *");
    }

    #[test]
    fn year_window_is_ordered() {
        let (start, end) = year_window_timestamps(1995, 1999);
        assert!(start < end);
        assert_eq!(release_year(Some(start)), Some(1995));
        assert_eq!(release_year(Some(end)), Some(1999));
    }

    // -- token cache ---------------------------------------------------------

    #[test]
    fn token_validity_window() {
        let now = Utc::now();
        let fresh = CachedToken {
            access_token: "t".into(),
            expires_at: now + chrono::Duration::seconds(60),
        };
        let stale = CachedToken {
            access_token: "t".into(),
            expires_at: now - chrono::Duration::seconds(1),
        };
        assert!(fresh.is_valid_at(now));
        assert!(!stale.is_valid_at(now));
    }

    // -- detail mapping ------------------------------------------------------

    #[test]
    fn detail_mapping_tolerates_missing_fields() {
        let game: IgdbGame = serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "Mystery Game"
        }))
        .unwrap();
        let detail = detail_from_game(game);
        assert_eq!(detail.id, 42);
        assert_eq!(detail.name, "Mystery Game");
        assert!(detail.rating.is_none());
        assert!(detail.franchise.is_none());
        assert_eq!(detail.screenshot_count, 0);
    }

    #[test]
    fn detail_mapping_full_payload() {
        let game: IgdbGame = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "Chrono Quest",
            "aggregated_rating": 85.5,
            "first_release_date": 985219200i64,
            "genres": [{"name": "RPG"}, {"name": "Adventure"}],
            "platforms": [{"name": "PC"}],
            "involved_companies": [
                {"company": {"name": "Big Pub"}, "developer": false},
                {"company": {"name": "Tiny Dev"}, "developer": true}
            ],
            "franchises": [{"name": "Chrono", "slug": "chrono"}],
            "screenshots": [{"url": "//a"}, {"url": "//b"}, {"url": "//c"}]
        }))
        .unwrap();
        let detail = detail_from_game(game);
        assert_eq!(detail.developer, Some("Tiny Dev".into()));
        assert_eq!(detail.release_year, Some(2001));
        assert_eq!(detail.genres, vec!["RPG", "Adventure"]);
        assert_eq!(detail.screenshot_count, 3);
        assert_eq!(detail.franchise.unwrap().slug, Some("chrono".into()));
    }
}
