//! Candidate games and priority scoring.
//!
//! A [`CandidateGame`] is ephemeral: it exists only while the selector
//! is weighing options fetched from an external catalog, and is
//! promoted to a persisted game record once chosen.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------
//
// The bonus values are empirically chosen; they are exposed through
// [`PriorityWeights`] rather than hard-coded so deployments can tune
// them without a rebuild.

/// Default rating assumed when the catalog reports none.
pub const DEFAULT_RATING_BASELINE: f64 = 60.0;
/// Rating at and above which the excellent-title bonus applies.
pub const RATING_EXCELLENT_THRESHOLD: f64 = 80.0;
/// Bonus for excellent titles.
pub const RATING_EXCELLENT_BONUS: f64 = 20.0;
/// Rating at and above which the good-title bonus applies.
pub const RATING_GOOD_THRESHOLD: f64 = 70.0;
/// Bonus for good titles.
pub const RATING_GOOD_BONUS: f64 = 10.0;
/// Flat bonus when any video is available.
pub const VIDEO_BONUS: f64 = 200.0;
/// Bonus per screenshot above the minimum threshold.
pub const PER_EXTRA_SCREENSHOT_BONUS: f64 = 5.0;
/// Minimum screenshots a candidate must offer for quality curation.
pub const MIN_SCREENSHOTS: u32 = 8;

/// Tunable priority-score parameters.
#[derive(Debug, Clone)]
pub struct PriorityWeights {
    pub rating_baseline: f64,
    pub excellent_threshold: f64,
    pub excellent_bonus: f64,
    pub good_threshold: f64,
    pub good_bonus: f64,
    pub video_bonus: f64,
    pub per_extra_screenshot: f64,
    pub min_screenshots: u32,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            rating_baseline: DEFAULT_RATING_BASELINE,
            excellent_threshold: RATING_EXCELLENT_THRESHOLD,
            excellent_bonus: RATING_EXCELLENT_BONUS,
            good_threshold: RATING_GOOD_THRESHOLD,
            good_bonus: RATING_GOOD_BONUS,
            video_bonus: VIDEO_BONUS,
            per_extra_screenshot: PER_EXTRA_SCREENSHOT_BONUS,
            min_screenshots: MIN_SCREENSHOTS,
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Franchise identity reported by the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Franchise {
    pub name: String,
    pub slug: Option<String>,
}

/// A game under consideration, assembled from catalog detail calls.
#[derive(Debug, Clone)]
pub struct CandidateGame {
    /// Catalog-specific identifier.
    pub external_id: i64,
    pub title: String,
    pub developer: Option<String>,
    pub release_year: Option<i32>,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    /// Aggregated quality score in [0, 100], when reported.
    pub rating: Option<f64>,
    pub franchise: Option<Franchise>,
    /// First available video locator, when any.
    pub video_url: Option<String>,
    /// Screenshot-count hint from the detail fetch.
    pub screenshot_count: u32,
    /// Computed priority; higher wins.
    pub priority: f64,
}

impl CandidateGame {
    pub fn has_video(&self) -> bool {
        self.video_url.is_some()
    }
}

// ---------------------------------------------------------------------------
// Priority scoring
// ---------------------------------------------------------------------------

/// Multi-attribute priority of a candidate.
///
/// Base is the aggregated rating (baseline when absent) with tiered
/// bonuses for well-reviewed titles, a large flat bonus for video
/// availability, and a small per-screenshot bonus above the minimum.
pub fn priority_score(
    weights: &PriorityWeights,
    rating: Option<f64>,
    has_video: bool,
    screenshot_count: u32,
) -> f64 {
    let mut score = match rating {
        Some(r) if r >= weights.excellent_threshold => r + weights.excellent_bonus,
        Some(r) if r >= weights.good_threshold => r + weights.good_bonus,
        Some(r) => r,
        None => weights.rating_baseline,
    };

    if has_video {
        score += weights.video_bonus;
    }

    if screenshot_count > weights.min_screenshots {
        score += (screenshot_count - weights.min_screenshots) as f64
            * weights.per_extra_screenshot;
    }

    score
}

/// Pick the best candidate, preferring any candidate with a video.
///
/// Candidates are partitioned by video availability; the top-priority
/// member of the video group wins when that group is non-empty,
/// otherwise the top of the no-video group.
pub fn pick_best(mut candidates: Vec<CandidateGame>) -> Option<CandidateGame> {
    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by(|a, b| b.priority.total_cmp(&a.priority));

    let with_video = candidates.iter().position(|c| c.has_video());
    match with_video {
        Some(i) => Some(candidates.swap_remove(i)),
        None => Some(candidates.swap_remove(0)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64, rating: Option<f64>, video: bool, shots: u32) -> CandidateGame {
        let weights = PriorityWeights::default();
        CandidateGame {
            external_id: id,
            title: format!("Game {id}"),
            developer: None,
            release_year: None,
            genres: Vec::new(),
            platforms: Vec::new(),
            rating,
            franchise: None,
            video_url: video.then(|| "https://example.com/v.mp4".to_string()),
            screenshot_count: shots,
            priority: priority_score(&weights, rating, video, shots),
        }
    }

    // -- priority score ------------------------------------------------------

    #[test]
    fn worked_example_scores_325() {
        // Rating 85 (+20 excellent bonus), one video (+200),
        // 12 screenshots (4 above minimum, +5 each).
        let score = priority_score(&PriorityWeights::default(), Some(85.0), true, 12);
        assert!((score - 325.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_rating_uses_baseline() {
        let score = priority_score(&PriorityWeights::default(), None, false, 8);
        assert!((score - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn monotonic_in_rating() {
        let w = PriorityWeights::default();
        let mut last = f64::MIN;
        for rating in [40.0, 55.0, 69.9, 70.0, 79.9, 80.0, 95.0, 100.0] {
            let score = priority_score(&w, Some(rating), false, 8);
            assert!(score >= last, "rating {rating} dropped the score");
            last = score;
        }
    }

    #[test]
    fn monotonic_in_screenshot_count() {
        let w = PriorityWeights::default();
        let mut last = f64::MIN;
        for shots in [8, 9, 10, 12, 15, 20] {
            let score = priority_score(&w, Some(70.0), false, shots);
            assert!(score >= last, "{shots} screenshots dropped the score");
            last = score;
        }
    }

    #[test]
    fn video_strictly_beats_no_video() {
        let w = PriorityWeights::default();
        let with = priority_score(&w, Some(75.0), true, 10);
        let without = priority_score(&w, Some(75.0), false, 10);
        assert!(with > without);
        assert!((with - without - 200.0).abs() < f64::EPSILON);
    }

    // -- pick_best -----------------------------------------------------------

    #[test]
    fn video_group_wins_even_at_lower_priority() {
        let picked = pick_best(vec![
            candidate(1, Some(95.0), false, 15),
            candidate(2, Some(62.0), true, 8),
        ])
        .unwrap();
        assert_eq!(picked.external_id, 2);
    }

    #[test]
    fn top_priority_wins_within_video_group() {
        let picked = pick_best(vec![
            candidate(1, Some(65.0), true, 9),
            candidate(2, Some(88.0), true, 14),
            candidate(3, Some(70.0), true, 10),
        ])
        .unwrap();
        assert_eq!(picked.external_id, 2);
    }

    #[test]
    fn falls_back_to_no_video_group() {
        let picked = pick_best(vec![
            candidate(1, Some(65.0), false, 9),
            candidate(2, Some(80.0), false, 9),
        ])
        .unwrap();
        assert_eq!(picked.external_id, 2);
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(pick_best(Vec::new()).is_none());
    }
}
