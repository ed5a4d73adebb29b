//! Pipeline error taxonomy.

use guessityet_core::ffmpeg::FfmpegError;
use guessityet_providers::ProviderError;

/// Errors that abort a pipeline stage.
///
/// Size-budget rejections and per-image failures are handled inline
/// as soft degradations and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Catalog provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Transcode error: {0}")]
    Transcode(#[from] FfmpegError),

    #[error("Media storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Media download failed: {0}")]
    Download(String),

    /// No viable candidate after every selection round.
    #[error("Candidate selection exhausted after {rounds} rounds")]
    Exhausted { rounds: u32 },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
