//! Video-to-GIF loop rendering.
//!
//! Every budget violation and media failure here is a soft skip
//! (`Ok(None)`), never a pipeline failure: a daily challenge without a
//! loop is still a valid challenge, it just gets the longer screenshot
//! ladder instead. Only local storage errors propagate.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use guessityet_core::ffmpeg::{
    encode_gif_palette, encode_gif_simple, parse_duration, parse_resolution, probe_video,
};
use guessityet_core::trim::{select_output_width, select_trim_window, LOOP_FPS};
use guessityet_core::types::DbId;

use crate::config::TranscodeConfig;
use crate::error::PipelineError;
use crate::store::{gif_name, MediaStore};

/// Timeout for the size-probing HEAD request.
const HEAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Overall download timeout.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Renders looping GIFs from source videos.
pub struct LoopTranscoder {
    http: reqwest::Client,
    config: TranscodeConfig,
}

impl LoopTranscoder {
    pub fn new(config: TranscodeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Render the GIF loop for one game. Returns the stored locator,
    /// or `None` when the source is unusable (not directly fetchable,
    /// unreachable, over budget, or the encode failed).
    pub async fn render_loop(
        &self,
        store: &dyn MediaStore,
        game_id: DbId,
        video_url: &str,
    ) -> Result<Option<String>, PipelineError> {
        if !is_direct_video(video_url) {
            tracing::debug!(game_id, video_url, "Skipping non-direct video source");
            return Ok(None);
        }

        if let Some(advertised) = self.advertised_size(video_url).await {
            if advertised > self.config.max_source_bytes {
                tracing::info!(game_id, advertised, "Source over size budget, skipping loop");
                return Ok(None);
            }
        }

        // Scratch dir owns both the source download and the encoded
        // GIF; dropped (and deleted) on every exit path.
        let scratch = tempfile::tempdir()?;
        let source_path = scratch.path().join("source.mp4");

        match self.download_source(video_url, &source_path).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(game_id, "Download exceeded byte budget, skipping loop");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(game_id, error = %e, "Source download failed, skipping loop");
                return Ok(None);
            }
        }

        let gif_path = scratch.path().join("loop.gif");
        match self.encode(&source_path, &gif_path).await {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(e) => {
                tracing::warn!(game_id, error = %e, "Encode failed, skipping loop");
                return Ok(None);
            }
        }

        let metadata = tokio::fs::metadata(&gif_path).await?;
        if metadata.len() > self.config.max_output_bytes {
            tracing::info!(
                game_id,
                size = metadata.len(),
                "Encoded GIF over output budget, discarding"
            );
            return Ok(None);
        }

        let bytes = tokio::fs::read(&gif_path).await?;
        let locator = store.save(&bytes, &gif_name(game_id)).await?;
        tracing::info!(game_id, locator = %locator, size = bytes.len(), "Rendered GIF loop");
        Ok(Some(locator))
    }

    /// Content length from a HEAD request, when the server reports one.
    async fn advertised_size(&self, url: &str) -> Option<u64> {
        let response = self
            .http
            .head(url)
            .timeout(HEAD_TIMEOUT)
            .send()
            .await
            .ok()?;
        response.content_length()
    }

    /// Stream the source to disk, aborting once the byte budget is
    /// exceeded. Returns `false` on abort.
    async fn download_source(&self, url: &str, dest: &Path) -> Result<bool, PipelineError> {
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

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PipelineError::Download(e.to_string()))?;
            downloaded += chunk.len() as u64;
            if downloaded > self.config.max_download_bytes {
                return Ok(false);
            }
            tokio::io::AsyncWriteExt::write_all(&mut file, &chunk).await?;
        }
        tokio::io::AsyncWriteExt::flush(&mut file).await?;
        Ok(true)
    }

    /// Probe, trim, and encode. Palette-optimized first, plain
    /// single-pass as fallback. Returns `false` when both fail.
    async fn encode(&self, source: &Path, gif: &Path) -> Result<bool, PipelineError> {
        let probe = probe_video(source).await?;
        let duration = parse_duration(&probe);
        if duration <= 0.0 {
            tracing::warn!("Source has no usable duration, skipping loop");
            return Ok(false);
        }
        let (source_width, _) = parse_resolution(&probe);

        let window = select_trim_window(duration);
        let width = select_output_width(source_width);

        if let Err(e) = encode_gif_palette(source, gif, window, LOOP_FPS, width).await {
            tracing::warn!(error = %e, "Palette encode failed, trying plain encode");
            if let Err(e) = encode_gif_simple(source, gif, window, LOOP_FPS, width).await {
                tracing::warn!(error = %e, "Plain encode failed, skipping loop");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Whether a URL points at a directly fetchable video file rather
/// than a streaming page.
pub(crate) fn is_direct_video(url: &str) -> bool {
    !(url.contains("youtube.com") || url.contains("youtu.be"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Store that records nothing; these tests never reach it.
    struct NullStore;

    #[async_trait]
    impl MediaStore for NullStore {
        async fn save(&self, _bytes: &[u8], name: &str) -> Result<String, std::io::Error> {
            Ok(name.to_string())
        }
    }

    #[tokio::test]
    async fn unreachable_source_is_a_soft_skip() {
        // Port 9 refuses connections; the run must degrade to
        // screenshots-only instead of failing.
        let transcoder = LoopTranscoder::new(crate::config::TranscodeConfig::default());
        let locator = transcoder
            .render_loop(&NullStore, 1, "http://127.0.0.1:9/clip.mp4")
            .await
            .unwrap();
        assert!(locator.is_none());
    }

    #[tokio::test]
    async fn streaming_page_is_a_soft_skip() {
        let transcoder = LoopTranscoder::new(crate::config::TranscodeConfig::default());
        let locator = transcoder
            .render_loop(&NullStore, 1, "https://www.youtube.com/watch?v=abc")
            .await
            .unwrap();
        assert!(locator.is_none());
    }

    #[test]
    fn youtube_pages_are_not_direct_sources() {
        assert!(!is_direct_video("https://www.youtube.com/watch?v=abc"));
        assert!(!is_direct_video("https://youtu.be/abc"));
    }

    #[test]
    fn cdn_files_are_direct_sources() {
        assert!(is_direct_video("https://media.rawg.io/movies/clip.mp4"));
        assert!(is_direct_video("http://cdn.example.com/v/123.mp4"));
    }
}
