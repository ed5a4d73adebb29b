//! External metadata-provider integrations.
//!
//! Two game catalogs implement the shared [`MetadataProvider`]
//! capability — [`IgdbProvider`] (Twitch-authenticated) and
//! [`RawgProvider`] (API-key) — so the selection pipeline never cares
//! which one it is talking to. The optional [`VisionScorer`] wraps an
//! OpenAI vision model for the AI half of revelation scoring.

pub mod error;
pub mod igdb;
pub mod provider;
pub mod rawg;
pub mod types;
pub mod vision;

pub use error::ProviderError;
pub use igdb::IgdbProvider;
pub use provider::{DiscoverQuery, MetadataProvider};
pub use rawg::RawgProvider;
pub use types::{GameDetail, GameSummary};
pub use vision::VisionScorer;
