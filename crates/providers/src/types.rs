//! Provider-agnostic catalog payloads.

use guessityet_core::candidate::Franchise;

/// A catalog entry as returned by search/discover, before the
/// expensive per-game detail fetch.
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub id: i64,
    pub name: String,
    /// Aggregated quality score in [0, 100], when the catalog has one.
    pub rating: Option<f64>,
}

/// Full detail for one game. Every optional field is feature-absent
/// rather than an error when the catalog omits it.
#[derive(Debug, Clone)]
pub struct GameDetail {
    pub id: i64,
    pub name: String,
    pub developer: Option<String>,
    pub release_year: Option<i32>,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub rating: Option<f64>,
    pub franchise: Option<Franchise>,
    /// Screenshot count hint embedded in the detail payload, when any.
    pub screenshot_count: u32,
}
