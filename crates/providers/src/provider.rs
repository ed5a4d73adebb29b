//! The metadata-provider capability.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{GameDetail, GameSummary};

/// A randomized slice of the catalog to discover candidates in.
///
/// The release-year window and page offset are drawn at random each
/// selection round to dodge the provider's default popularity bias.
#[derive(Debug, Clone)]
pub struct DiscoverQuery {
    pub start_year: i32,
    pub end_year: i32,
    /// Inclusive aggregated-rating range filter.
    pub min_rating: f64,
    pub max_rating: f64,
    pub limit: u32,
    pub offset: u32,
}

/// Capability contract shared by all game catalogs.
///
/// Implementations must treat missing optional fields (rating,
/// franchise, videos) as feature-not-present, never as an error, and
/// must put an explicit timeout on every request.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short provider tag persisted alongside selected games.
    fn name(&self) -> &'static str;

    /// Search games by title.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<GameSummary>, ProviderError>;

    /// Fetch a randomized, rating-filtered catalog slice.
    async fn discover(&self, query: &DiscoverQuery) -> Result<Vec<GameSummary>, ProviderError>;

    /// Fetch full detail for one game; `None` when the id is unknown.
    async fn get_details(&self, id: i64) -> Result<Option<GameDetail>, ProviderError>;

    /// Fetch up to `max` screenshot URLs for one game.
    async fn get_screenshots(&self, id: i64, max: u32) -> Result<Vec<String>, ProviderError>;

    /// Fetch video URLs for one game. Empty when none exist.
    async fn get_videos(&self, id: i64) -> Result<Vec<String>, ProviderError>;
}
