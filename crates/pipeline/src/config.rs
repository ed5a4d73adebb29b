//! Pipeline configuration loaded from environment variables.
//!
//! All fields have defaults suitable for local development. In
//! production, override via environment variables.

use std::path::PathBuf;

/// Candidate-selection tuning.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Earliest release year the random window may start at.
    pub min_year: i32,
    /// Latest release year the random window may end at.
    pub max_year: i32,
    /// Inclusive bounds on the random window span, in years.
    pub min_span: i32,
    pub max_span: i32,
    /// Aggregated-rating filter passed to the catalog.
    pub min_rating: f64,
    pub max_rating: f64,
    /// Random page offset upper bound, to escape popularity bias.
    pub max_offset: u32,
    /// Catalog page size per discover call.
    pub discover_limit: u32,
    /// How many discovered games get the expensive detail fetch.
    pub sample_size: usize,
    /// Games with fewer screenshots than this are not playable.
    pub min_screenshots: u32,
    /// Rounds before selection gives up.
    pub max_rounds: u32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            min_year: 1980,
            max_year: 2020,
            min_span: 3,
            max_span: 7,
            min_rating: 60.0,
            max_rating: 100.0,
            max_offset: 200,
            discover_limit: 50,
            sample_size: 5,
            min_screenshots: 8,
            max_rounds: 10,
        }
    }
}

/// GIF-loop transcode budgets.
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    /// Sources whose advertised size exceeds this are skipped outright.
    pub max_source_bytes: u64,
    /// Hard cap on bytes actually streamed to disk.
    pub max_download_bytes: u64,
    /// Finished GIFs larger than this are discarded.
    pub max_output_bytes: u64,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            max_source_bytes: 500 * 1024 * 1024,
            max_download_bytes: 300 * 1024 * 1024,
            max_output_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub selector: SelectorConfig,
    pub transcode: TranscodeConfig,
    /// Root directory for stored media.
    pub media_root: PathBuf,
    /// Upper bound on screenshots fetched per game before curation.
    pub max_screenshots: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            selector: SelectorConfig::default(),
            transcode: TranscodeConfig::default(),
            media_root: PathBuf::from("./media"),
            max_screenshots: 20,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default   |
    /// |----------------------------|-----------|
    /// | `MEDIA_ROOT`               | `./media` |
    /// | `SELECTOR_MIN_YEAR`        | `1980`    |
    /// | `SELECTOR_MAX_YEAR`        | `2020`    |
    /// | `SELECTOR_MIN_RATING`      | `60`      |
    /// | `SELECTOR_MAX_ROUNDS`      | `10`      |
    /// | `SELECTOR_MIN_SCREENSHOTS` | `8`       |
    /// | `MAX_SCREENSHOTS`          | `20`      |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            selector: SelectorConfig {
                min_year: env_parse("SELECTOR_MIN_YEAR", defaults.selector.min_year),
                max_year: env_parse("SELECTOR_MAX_YEAR", defaults.selector.max_year),
                min_rating: env_parse("SELECTOR_MIN_RATING", defaults.selector.min_rating),
                max_rounds: env_parse("SELECTOR_MAX_ROUNDS", defaults.selector.max_rounds),
                min_screenshots: env_parse(
                    "SELECTOR_MIN_SCREENSHOTS",
                    defaults.selector.min_screenshots,
                ),
                ..defaults.selector
            },
            transcode: defaults.transcode,
            media_root: std::env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            max_screenshots: env_parse("MAX_SCREENSHOTS", defaults.max_screenshots),
        }
    }
}

/// Parse an env var, falling back to the default when unset or malformed.
fn env_parse<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(name, raw = %raw, "Ignoring malformed env var");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let config = SelectorConfig::default();
        assert!(config.min_year < config.max_year);
        assert!(config.min_span <= config.max_span);
        assert!(config.min_rating < config.max_rating);
        assert!(config.sample_size > 0);
    }

    #[test]
    fn transcode_budgets_are_ordered() {
        let config = TranscodeConfig::default();
        assert!(config.max_download_bytes < config.max_source_bytes);
        assert!(config.max_output_bytes < config.max_download_bytes);
    }
}
