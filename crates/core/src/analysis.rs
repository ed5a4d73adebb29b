//! Visual revelation scoring for screenshots.
//!
//! Estimates, from pixels alone, how strongly a screenshot identifies
//! its source game on a 0–100 scale (100 = most identifying). The
//! score is a weighted blend of four independent heuristics: color
//! complexity, edge density, contrast, and UI likelihood. When an
//! external vision model is available its verdict is blended in with
//! the higher weight; when anything fails, callers substitute
//! [`RevelationAnalysis::neutral`] so a single bad image never aborts
//! a curation run.

use image::{imageops, RgbImage};

// ---------------------------------------------------------------------------
// Blend weights
// ---------------------------------------------------------------------------

/// Weight of color complexity in the visual score.
pub const WEIGHT_COLOR: f64 = 0.2;
/// Weight of edge density in the visual score.
pub const WEIGHT_EDGES: f64 = 0.3;
/// Weight of contrast in the visual score.
pub const WEIGHT_CONTRAST: f64 = 0.2;
/// Weight of UI likelihood in the visual score.
pub const WEIGHT_UI: f64 = 0.3;

/// Weight of the visual score when a vision-model score is present.
pub const BLEND_VISUAL: f64 = 0.3;
/// Weight of the vision-model score when present.
pub const BLEND_AI: f64 = 0.7;

/// Score substituted when an image cannot be fetched or decoded.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Luma gradient above which a pixel counts as an edge pixel.
const EDGE_THRESHOLD: i32 = 50;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Per-heuristic sub-scores plus the weighted visual score, all in [0, 100].
#[derive(Debug, Clone, Copy)]
pub struct VisualAnalysis {
    pub color_complexity: f64,
    pub edge_density: f64,
    pub contrast: f64,
    pub ui_likelihood: f64,
    /// Weighted blend of the four sub-scores.
    pub visual_score: f64,
}

/// Final revelation verdict for one screenshot.
#[derive(Debug, Clone)]
pub struct RevelationAnalysis {
    /// Pixel-heuristic score in [0, 100].
    pub visual_score: f64,
    /// Vision-model score in [0, 100], when one was obtained.
    pub ai_score: Option<f64>,
    /// Blended score used for ranking.
    pub final_score: f64,
    /// Human-readable band description.
    pub description: &'static str,
}

impl RevelationAnalysis {
    /// Combine a visual score with an optional vision-model score.
    pub fn from_scores(visual_score: f64, ai_score: Option<f64>) -> Self {
        let final_score = match ai_score {
            Some(ai) => visual_score * BLEND_VISUAL + ai * BLEND_AI,
            None => visual_score,
        };
        Self {
            visual_score,
            ai_score,
            final_score,
            description: describe(final_score),
        }
    }

    /// Neutral fallback used when fetch or decode fails.
    pub fn neutral() -> Self {
        Self {
            visual_score: NEUTRAL_SCORE,
            ai_score: None,
            final_score: NEUTRAL_SCORE,
            description: "Analysis failed - neutral default score",
        }
    }
}

/// Human-readable description of a revelation score band.
pub fn describe(score: f64) -> &'static str {
    if score >= 80.0 {
        "Highly revealing - UI, text, or distinctive elements visible"
    } else if score >= 60.0 {
        "Quite revealing - recognizable characters or environments"
    } else if score >= 40.0 {
        "Moderately revealing - some visual hints available"
    } else if score >= 20.0 {
        "Barely revealing - mostly generic scenery"
    } else {
        "Hardly revealing - abstract or very generic"
    }
}

// ---------------------------------------------------------------------------
// Top-level analysis
// ---------------------------------------------------------------------------

/// Score a decoded screenshot with all four visual heuristics.
pub fn analyze_image(image: &RgbImage) -> VisualAnalysis {
    let color = color_complexity(image);
    let edges = edge_density(image);
    let contrast = contrast_spread(image);
    let ui = ui_likelihood(image);

    let visual = (color * WEIGHT_COLOR
        + edges * WEIGHT_EDGES
        + contrast * WEIGHT_CONTRAST
        + ui * WEIGHT_UI)
        .clamp(0.0, 100.0);

    VisualAnalysis {
        color_complexity: color,
        edge_density: edges,
        contrast,
        ui_likelihood: ui,
        visual_score: visual,
    }
}

// ---------------------------------------------------------------------------
// Color complexity
// ---------------------------------------------------------------------------

/// Count coarse color buckets after downsampling. More distinct
/// buckets means a busier, more identifying image.
pub fn color_complexity(image: &RgbImage) -> f64 {
    let small = imageops::resize(image, 100, 100, imageops::FilterType::Triangle);

    let mut buckets = std::collections::HashSet::new();
    for pixel in small.pixels() {
        // Quantize each channel into 32-wide groups.
        let grouped = (
            pixel.0[0] / 32 * 32,
            pixel.0[1] / 32 * 32,
            pixel.0[2] / 32 * 32,
        );
        buckets.insert(grouped);
    }

    ((buckets.len() as f64 / 50.0) * 100.0).min(100.0)
}

// ---------------------------------------------------------------------------
// Edge density
// ---------------------------------------------------------------------------

/// Fraction of high-gradient pixels, amplified x2 and capped at 100.
pub fn edge_density(image: &RgbImage) -> f64 {
    let gray = imageops::grayscale(image);
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let mut edge_pixels = 0u64;
    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let here = gray.get_pixel(x, y).0[0] as i32;
            let dx = gray.get_pixel(x + 1, y).0[0] as i32 - here;
            let dy = gray.get_pixel(x, y + 1).0[0] as i32 - here;
            if dx.abs() + dy.abs() > EDGE_THRESHOLD {
                edge_pixels += 1;
            }
        }
    }

    let total = ((width - 1) as u64 * (height - 1) as u64).max(1);
    let density = (edge_pixels as f64 / total as f64) * 100.0;
    (density * 2.0).min(100.0)
}

// ---------------------------------------------------------------------------
// Contrast
// ---------------------------------------------------------------------------

/// Spread between the 5th and 95th percentile of the luma histogram,
/// normalized to [0, 100].
pub fn contrast_spread(image: &RgbImage) -> f64 {
    let gray = imageops::grayscale(image);
    let total = (gray.width() as u64 * gray.height() as u64) as f64;
    if total == 0.0 {
        return NEUTRAL_SCORE;
    }

    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let mut cumulative = 0u64;
    let mut p5 = 0usize;
    let mut p95 = 255usize;
    let mut p5_found = false;
    for (i, count) in histogram.iter().enumerate() {
        cumulative += count;
        let fraction = cumulative as f64 / total;
        if fraction >= 0.05 && !p5_found {
            p5 = i;
            p5_found = true;
        }
        if fraction >= 0.95 {
            p95 = i;
            break;
        }
    }

    (((p95 - p5) as f64 / 255.0) * 100.0).min(100.0)
}

// ---------------------------------------------------------------------------
// UI likelihood
// ---------------------------------------------------------------------------

/// Weight of repeated horizontal bands (menus, bars) in the UI score.
const UI_WEIGHT_BANDS: f64 = 0.4;
/// Weight of monotonic row gradients (health/progress bars).
const UI_WEIGHT_GRADIENTS: f64 = 0.3;
/// Weight of repeated small pixel blocks (icons, buttons).
const UI_WEIGHT_BLOCKS: f64 = 0.3;

/// Heuristic likelihood that the image contains UI chrome, in [0, 100].
///
/// UI elements (menus, HUDs, health bars, icon grids) are the single
/// strongest giveaway in a screenshot, so three cheap detectors are
/// combined: repeated near-identical horizontal bands, monotonic row
/// gradients, and repeated 2x2 pixel blocks.
pub fn ui_likelihood(image: &RgbImage) -> f64 {
    let score = detect_horizontal_bands(image) * UI_WEIGHT_BANDS
        + detect_row_gradients(image) * UI_WEIGHT_GRADIENTS
        + detect_repeated_blocks(image) * UI_WEIGHT_BLOCKS;
    (score * 100.0).min(100.0)
}

/// Fraction (0..=1) of adjacent row pairs that are near-identical in color.
fn detect_horizontal_bands(image: &RgbImage) -> f64 {
    let small = imageops::resize(image, 50, 50, imageops::FilterType::Triangle);
    let (width, height) = small.dimensions();

    let mut similar_pairs = 0u32;
    for y in 0..height - 1 {
        let mut total_diff = 0.0f64;
        for x in 0..width {
            let a = small.get_pixel(x, y).0;
            let b = small.get_pixel(x, y + 1).0;
            let diff: i32 = a
                .iter()
                .zip(b.iter())
                .map(|(p, q)| (*p as i32 - *q as i32).abs())
                .sum();
            total_diff += diff as f64 / 3.0;
        }
        if total_diff / (width as f64) < 30.0 {
            similar_pairs += 1;
        }
    }

    (similar_pairs as f64 / (height as f64 * 0.3)).min(1.0)
}

/// Fraction (0..=1) of rows whose luma forms a monotonic gradient.
fn detect_row_gradients(image: &RgbImage) -> f64 {
    let gray = imageops::resize(
        &imageops::grayscale(image),
        50,
        50,
        imageops::FilterType::Triangle,
    );
    let (width, height) = gray.dimensions();

    let mut gradient_rows = 0u32;
    for y in 0..height {
        let row: Vec<i32> = (0..width).map(|x| gray.get_pixel(x, y).0[0] as i32).collect();
        if is_gradient(&row) {
            gradient_rows += 1;
        }
    }

    (gradient_rows as f64 / (height as f64 * 0.2)).min(1.0)
}

/// A row is a gradient when more than 60% of its significant
/// consecutive differences trend in one direction.
fn is_gradient(values: &[i32]) -> bool {
    const MIN_CHANGE: i32 = 5;
    if values.len() < 3 {
        return false;
    }

    let mut positive = 0u32;
    let mut negative = 0u32;
    for pair in values.windows(2) {
        let diff = pair[1] - pair[0];
        if diff > MIN_CHANGE {
            positive += 1;
        } else if diff < -MIN_CHANGE {
            negative += 1;
        }
    }

    let significant = positive + negative;
    if significant == 0 {
        return false;
    }
    let dominant = positive.max(negative) as f64;
    dominant / significant as f64 > 0.6
}

/// Fraction (0..=1) of 2x2 pixel blocks that repeat elsewhere in the image.
fn detect_repeated_blocks(image: &RgbImage) -> f64 {
    let small = imageops::resize(image, 20, 20, imageops::FilterType::Nearest);
    let (width, height) = small.dimensions();

    let mut counts: std::collections::HashMap<[[u8; 3]; 4], u32> =
        std::collections::HashMap::new();
    let mut total_blocks = 0u32;
    for y in (0..height.saturating_sub(1)).step_by(2) {
        for x in (0..width.saturating_sub(1)).step_by(2) {
            let block = [
                small.get_pixel(x, y).0,
                small.get_pixel(x + 1, y).0,
                small.get_pixel(x, y + 1).0,
                small.get_pixel(x + 1, y + 1).0,
            ];
            *counts.entry(block).or_insert(0) += 1;
            total_blocks += 1;
        }
    }

    if total_blocks == 0 {
        return 0.0;
    }
    let repeated = counts.values().filter(|&&c| c > 1).count() as f64;
    (repeated / total_blocks as f64).min(1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
