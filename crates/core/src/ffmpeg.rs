//! FFmpeg/FFprobe command utilities for loop-media extraction.
//!
//! Thin wrappers around the `ffprobe` and `ffmpeg` binaries plus
//! parsers for the probe JSON. The transcoder drives these; nothing
//! here decides trim windows or budgets.

use std::path::Path;

use serde::Deserialize;

use crate::trim::TrimWindow;

/// Error type for FFmpeg/FFprobe operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("video file not found: {0}")]
    VideoNotFound(String),
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    pub streams: Vec<FfprobeStream>,
    pub format: FfprobeFormat,
}

/// A single stream from ffprobe output.
#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub index: i32,
    pub codec_name: Option<String>,
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration: Option<String>,
}

/// Format-level metadata from ffprobe.
#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
    pub size: Option<String>,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub async fn probe_video(path: &Path) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| FfmpegError::ParseError(format!("{e}: {stdout}")))
}

/// Encode a trimmed, resized, palette-optimized looping GIF.
///
/// Uses a palettegen/paletteuse filter graph in a single invocation
/// for a much smaller output than the default dithering.
pub async fn encode_gif_palette(
    input: &Path,
    output: &Path,
    window: TrimWindow,
    fps: u32,
    width: u32,
) -> Result<(), FfmpegError> {
    let filter = format!(
        "fps={fps},scale={width}:-1:flags=lanczos,split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse"
    );
    run_gif_encode(input, output, window, &filter).await
}

/// Fallback encoder configuration: plain single-pass GIF output.
pub async fn encode_gif_simple(
    input: &Path,
    output: &Path,
    window: TrimWindow,
    fps: u32,
    width: u32,
) -> Result<(), FfmpegError> {
    let filter = format!("fps={fps},scale={width}:-1:flags=lanczos");
    run_gif_encode(input, output, window, &filter).await
}

async fn run_gif_encode(
    input: &Path,
    output: &Path,
    window: TrimWindow,
    filter: &str,
) -> Result<(), FfmpegError> {
    if !input.exists() {
        return Err(FfmpegError::VideoNotFound(
            input.to_string_lossy().to_string(),
        ));
    }

    let result = tokio::process::Command::new("ffmpeg")
        .args([
            "-y",
            "-ss",
            &format!("{:.3}", window.start),
            "-t",
            &format!("{:.3}", window.duration()),
            "-i",
        ])
        .arg(input)
        .args(["-vf", filter, "-loop", "0"])
        .arg(output)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !result.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: result.status.code(),
            stderr: String::from_utf8_lossy(&result.stderr).to_string(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Find the first video stream in the ffprobe output.
fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Parse the video duration in seconds from ffprobe output.
pub fn parse_duration(probe: &FfprobeOutput) -> f64 {
    // Try format-level duration first.
    if let Some(d) = &probe.format.duration {
        if let Ok(secs) = d.parse::<f64>() {
            return secs;
        }
    }
    // Fall back to the first video stream's duration.
    if let Some(stream) = first_video_stream(probe) {
        if let Some(d) = &stream.duration {
            if let Ok(secs) = d.parse::<f64>() {
                return secs;
            }
        }
    }
    0.0
}

/// Find the first video stream's resolution.
pub fn parse_resolution(probe: &FfprobeOutput) -> (u32, u32) {
    first_video_stream(probe)
        .map(|s| {
            (
                s.width.unwrap_or(0).max(0) as u32,
                s.height.unwrap_or(0).max(0) as u32,
            )
        })
        .unwrap_or((0, 0))
}
