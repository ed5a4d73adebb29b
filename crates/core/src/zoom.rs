//! Zoomed/cropped renders for the hardest difficulty tiers.
//!
//! Tiers 1–3 show progressively less aggressive crops of the source
//! screenshot; tier 4 gets a barely perceptible softening so it reads
//! slightly different from the untouched easy tiers; tiers 5–6 pass
//! through unmodified.

use image::{imageops, GrayImage, RgbImage};

/// Output resolution of zoomed renders.
pub const RENDER_WIDTH: u32 = 800;
pub const RENDER_HEIGHT: u32 = 600;

/// Highest tier that receives a zoomed crop.
pub const MAX_ZOOM_TIER: u32 = 3;
/// Tier that receives the minimal filter instead of a crop.
pub const FILTER_TIER: u32 = 4;

/// Where the crop window is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Upper-left quadrant offset.
    Corner,
    /// Top-center band.
    Edge,
    /// Image center.
    Center,
    /// Sub-region with the highest edge activity.
    Interesting,
}

/// Zoom factor and focus strategy for one difficulty tier.
fn tier_config(tier: u32) -> Option<(f64, Focus)> {
    match tier {
        1 => Some((3.0, Focus::Corner)),
        2 => Some((2.5, Focus::Edge)),
        3 => Some((2.0, Focus::Interesting)),
        _ => None,
    }
}

/// Render the image for a difficulty tier.
pub fn render_tier(image: &RgbImage, tier: u32) -> RgbImage {
    match tier_config(tier) {
        Some((zoom, focus)) => zoomed_crop(image, zoom, focus),
        None if tier == FILTER_TIER => minimal_filter(image),
        None => image.clone(),
    }
}

/// Crop a `1/zoom`-sized window around the focus point and scale it to
/// the standard render resolution.
pub fn zoomed_crop(image: &RgbImage, zoom: f64, focus: Focus) -> RgbImage {
    let (width, height) = image.dimensions();
    let crop_width = ((width as f64 / zoom) as u32).max(1);
    let crop_height = ((height as f64 / zoom) as u32).max(1);

    let (focus_x, focus_y) = match focus {
        Focus::Corner => (crop_width / 4, crop_height / 4),
        Focus::Edge => (crop_width / 2, crop_height / 4),
        Focus::Center => (width / 2, height / 2),
        Focus::Interesting => find_interesting_point(image, crop_width, crop_height),
    };

    let mut left = focus_x.saturating_sub(crop_width / 2);
    let mut top = focus_y.saturating_sub(crop_height / 2);
    let right = (left + crop_width).min(width);
    let bottom = (top + crop_height).min(height);

    // Pull the window back inside the image if it ran off an edge.
    if right - left < crop_width {
        left = right.saturating_sub(crop_width);
    }
    if bottom - top < crop_height {
        top = bottom.saturating_sub(crop_height);
    }

    let cropped = imageops::crop_imm(image, left, top, right - left, bottom - top).to_image();
    imageops::resize(
        &cropped,
        RENDER_WIDTH,
        RENDER_HEIGHT,
        imageops::FilterType::Lanczos3,
    )
}

/// Tier-4 softening: a whisper of blur plus a small contrast cut, so
/// the boundary tier is distinguishable without hiding anything.
pub fn minimal_filter(image: &RgbImage) -> RgbImage {
    let blurred = imageops::blur(image, 0.3);
    imageops::contrast(&blurred, -5.0)
}

/// Grid-search the edge-activity map for the busiest crop center.
///
/// The image is divided into an 8x8 grid; each cell whose surrounding
/// crop window fits inside the image is scored by summing gradient
/// magnitudes above a noise floor in the half-sized region around it.
pub fn find_interesting_point(image: &RgbImage, crop_width: u32, crop_height: u32) -> (u32, u32) {
    const GRID: u32 = 8;
    const NOISE_FLOOR: u8 = 50;

    let (width, height) = image.dimensions();
    let edges = edge_magnitude(image);

    let mut best = (width / 2, height / 2);
    let mut max_activity = 0u64;

    for i in 0..GRID {
        for j in 0..GRID {
            let x = ((i as f64 + 0.5) * width as f64 / GRID as f64) as u32;
            let y = ((j as f64 + 0.5) * height as f64 / GRID as f64) as u32;

            // The full crop window must fit around this center.
            if x < crop_width / 2
                || x + crop_width / 2 > width
                || y < crop_height / 2
                || y + crop_height / 2 > height
            {
                continue;
            }

            let left = x.saturating_sub(crop_width / 4);
            let top = y.saturating_sub(crop_height / 4);
            let right = (x + crop_width / 4).min(width);
            let bottom = (y + crop_height / 4).min(height);

            let mut activity = 0u64;
            for ey in top..bottom {
                for ex in left..right {
                    let v = edges.get_pixel(ex, ey).0[0];
                    if v > NOISE_FLOOR {
                        activity += v as u64;
                    }
                }
            }

            if activity > max_activity {
                max_activity = activity;
                best = (x, y);
            }
        }
    }

    best
}

/// Per-pixel gradient magnitude of the grayscale image, clamped to u8.
fn edge_magnitude(image: &RgbImage) -> GrayImage {
    let gray = imageops::grayscale(image);
    let (width, height) = gray.dimensions();

    GrayImage::from_fn(width, height, |x, y| {
        if x + 1 >= width || y + 1 >= height {
            return image::Luma([0]);
        }
        let here = gray.get_pixel(x, y).0[0] as i32;
        let dx = gray.get_pixel(x + 1, y).0[0] as i32 - here;
        let dy = gray.get_pixel(x, y + 1).0[0] as i32 - here;
        image::Luma([(dx.abs() + dy.abs()).min(255) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn base_image() -> RgbImage {
        RgbImage::from_pixel(1024, 768, Rgb([60, 60, 60]))
    }

    #[test]
    fn zoom_tiers_render_at_standard_resolution() {
        let img = base_image();
        for tier in 1..=3 {
            let rendered = render_tier(&img, tier);
            assert_eq!(rendered.dimensions(), (RENDER_WIDTH, RENDER_HEIGHT));
        }
    }

    #[test]
    fn filter_tier_keeps_source_dimensions() {
        let img = base_image();
        let rendered = render_tier(&img, 4);
        assert_eq!(rendered.dimensions(), img.dimensions());
    }

    #[test]
    fn easy_tiers_pass_through_unmodified() {
        let img = base_image();
        for tier in [5, 6] {
            assert_eq!(render_tier(&img, tier), img);
        }
    }

    #[test]
    fn crop_window_stays_inside_bounds() {
        // A corner focus at 3x zoom would run off the top-left without
        // the clamp; just exercising it must not panic.
        let img = RgbImage::from_pixel(321, 243, Rgb([10, 20, 30]));
        for focus in [Focus::Corner, Focus::Edge, Focus::Center, Focus::Interesting] {
            let rendered = zoomed_crop(&img, 3.0, focus);
            assert_eq!(rendered.dimensions(), (RENDER_WIDTH, RENDER_HEIGHT));
        }
    }

    #[test]
    fn interesting_focus_finds_the_busy_region() {
        // Flat image with a high-frequency patch in the lower-right.
        let mut img = RgbImage::from_pixel(800, 600, Rgb([128, 128, 128]));
        for y in 400..560 {
            for x in 560..760 {
                let v = if (x + y) % 2 == 0 { 0 } else { 255 };
                img.put_pixel(x, y, Rgb([v, v, v]));
            }
        }

        let (x, y) = find_interesting_point(&img, 400, 300);
        assert!(x > 400, "expected focus on the right half, got x={x}");
        assert!(y > 300, "expected focus on the bottom half, got y={y}");
    }
}
