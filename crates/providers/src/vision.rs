//! AI-assisted revelation scoring.
//!
//! Wraps an OpenAI vision model behind a soft interface: every failure
//! path (missing key, HTTP error, unparseable reply) degrades to
//! `None` so curation falls back to the local visual heuristics alone.

use std::time::Duration;

use base64::Engine as _;
use image::DynamicImage;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::error::ProviderError;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-4o-mini";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Images are downscaled before upload to keep token cost flat.
const MAX_UPLOAD_DIMENSION: u32 = 1024;

/// JPEG quality for the uploaded rendition.
const UPLOAD_JPEG_QUALITY: u8 = 85;

const PROMPT: &str = "Rate how much this game screenshot reveals about which game it is, \
     on a scale from 0 (reveals nothing) to 100 (instantly identifiable: \
     title screen, logo, iconic character). Reply with a single number.";

/// Scores screenshots with a vision model.
pub struct VisionScorer {
    client: reqwest::Client,
    api_key: String,
}

impl VisionScorer {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    /// Build from `OPENAI_API_KEY`; `None` disables AI scoring.
    pub fn from_env() -> Option<Self> {
        std::env::var("OPENAI_API_KEY").ok().map(Self::new)
    }

    /// Score one screenshot in [0, 100]. Returns `None` on any failure;
    /// the caller treats that as "no AI opinion", not an error.
    pub async fn score(&self, img: &DynamicImage) -> Option<f64> {
        let data_url = match encode_for_upload(img) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Vision upload encode failed: {e}");
                return None;
            }
        };

        match self.request_score(&data_url).await {
            Ok(reply) => {
                let score = parse_score(&reply);
                if score.is_none() {
                    tracing::warn!(reply = %reply, "Vision model reply had no usable number");
                }
                score
            }
            Err(e) => {
                tracing::warn!("Vision scoring request failed: {e}");
                None
            }
        }
    }

    async fn request_score(&self, data_url: &str) -> Result<String, ProviderError> {
        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct Message {
            content: Option<String>,
        }

        let body = json!({
            "model": MODEL,
            "max_tokens": 10,
            "temperature": 0.1,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": PROMPT},
                    {"type": "image_url", "image_url": {"url": data_url, "detail": "low"}}
                ]
            }]
        });

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("chat completion: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Decode("empty chat completion".into()))
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Downscale, re-encode as JPEG, and wrap as a base64 data URL.
fn encode_for_upload(img: &DynamicImage) -> Result<String, image::ImageError> {
    let scaled = if img.width() > MAX_UPLOAD_DIMENSION || img.height() > MAX_UPLOAD_DIMENSION {
        img.resize(
            MAX_UPLOAD_DIMENSION,
            MAX_UPLOAD_DIMENSION,
            image::imageops::FilterType::Triangle,
        )
    } else {
        img.clone()
    };

    let mut jpeg = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, UPLOAD_JPEG_QUALITY);
    scaled.to_rgb8().write_with_encoder(encoder)?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&jpeg);
    Ok(format!("data:image/jpeg;base64,{encoded}"))
}

/// First number in the model's reply, clamped to [0, 100].
fn parse_score(reply: &str) -> Option<f64> {
    // Infallible pattern, compiled per call; scoring volume is tiny.
    let re = Regex::new(r"\d+(\.\d+)?").ok()?;
    let matched = re.find(reply)?;
    let value: f64 = matched.as_str().parse().ok()?;
    Some(value.clamp(0.0, 100.0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- reply parsing -------------------------------------------------------

    #[test]
    fn bare_number_parsed() {
        assert_eq!(parse_score("85"), Some(85.0));
        assert_eq!(parse_score("42.5"), Some(42.5));
    }

    #[test]
    fn number_extracted_from_prose() {
        assert_eq!(parse_score("I'd rate this 70 out of 100."), Some(70.0));
        assert_eq!(parse_score("Score: 15"), Some(15.0));
    }

    #[test]
    fn out_of_range_clamped() {
        assert_eq!(parse_score("150"), Some(100.0));
    }

    #[test]
    fn no_number_yields_none() {
        assert_eq!(parse_score("hard to say"), None);
        assert_eq!(parse_score(""), None);
    }

    // -- upload encoding -----------------------------------------------------

    #[test]
    fn large_image_downscaled_into_data_url() {
        let img = DynamicImage::new_rgb8(2048, 1024);
        let url = encode_for_upload(&img).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        // Round-trip the payload to check the downscale took effect.
        let b64 = url.trim_start_matches("data:image/jpeg;base64,");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(decoded.width() <= MAX_UPLOAD_DIMENSION);
        assert!(decoded.height() <= MAX_UPLOAD_DIMENSION);
    }

    #[test]
    fn small_image_kept_at_size() {
        let img = DynamicImage::new_rgb8(320, 240);
        let url = encode_for_upload(&img).unwrap();
        let b64 = url.trim_start_matches("data:image/jpeg;base64,");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }
}
