//! Difficulty-ladder selection and ordering.
//!
//! Given revelation/visual scores for a pool of screenshots, pick a
//! target-sized subset that is diverse across the revelation axis and
//! order it into a difficulty ladder: rank 1 is the hardest (least
//! identifying) reveal, rank K the easiest.

// ---------------------------------------------------------------------------
// Quality-score constants
// ---------------------------------------------------------------------------

/// Weight of the blended revelation score in the quality score.
pub const QUALITY_WEIGHT_REVELATION: f64 = 0.6;
/// Weight of the visual score in the quality score.
pub const QUALITY_WEIGHT_VISUAL: f64 = 0.4;

/// Revelation above this is discounted (obvious logos and menus).
pub const PENALTY_HIGH_START: f64 = 90.0;
/// Per-point penalty growth above [`PENALTY_HIGH_START`].
pub const PENALTY_HIGH_FACTOR: f64 = 2.0;
/// Revelation below this is discounted (pure noise, featureless shots).
pub const PENALTY_LOW_START: f64 = 10.0;
/// Per-point penalty growth below [`PENALTY_LOW_START`].
pub const PENALTY_LOW_FACTOR: f64 = 1.5;

/// Number of equal revelation bands used for diversity selection.
const REVELATION_BANDS: usize = 5;

/// Ladder size with a looping image as the final reveal.
pub const TARGET_WITH_LOOP: usize = 5;
/// Ladder size without one; the extra screenshot is the bonus hint tier.
pub const TARGET_WITHOUT_LOOP: usize = 6;

/// Ladder size for a game, depending on loop-media availability.
pub fn target_count(has_loop_media: bool) -> usize {
    if has_loop_media {
        TARGET_WITH_LOOP
    } else {
        TARGET_WITHOUT_LOOP
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Scores for one pooled screenshot, produced by the revelation scorer.
#[derive(Debug, Clone, Copy)]
pub struct ShotScores {
    /// Blended revelation score in [0, 100].
    pub revelation: f64,
    /// Pixel-heuristic visual score in [0, 100].
    pub visual: f64,
}

/// One selected ladder entry, referring back into the input pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LadderEntry {
    /// Index into the input slice.
    pub index: usize,
    /// Difficulty rank: 1 = hardest, contiguous and unique.
    pub rank: u32,
    /// Revelation score of the selected screenshot.
    pub revelation: f64,
    /// Quality score used during selection.
    pub quality: f64,
}

// ---------------------------------------------------------------------------
// Quality score
// ---------------------------------------------------------------------------

/// Puzzle quality of a screenshot, in [0, 100].
///
/// Both extremes of the revelation axis make poor puzzle images: a
/// title screen gives the game away and pure noise discriminates
/// nothing, so revelation outside [10, 90] is penalized linearly.
pub fn quality_score(revelation: f64, visual: f64) -> f64 {
    let penalty_high = if revelation > PENALTY_HIGH_START {
        (revelation - PENALTY_HIGH_START) * PENALTY_HIGH_FACTOR
    } else {
        0.0
    };
    let penalty_low = if revelation < PENALTY_LOW_START {
        (PENALTY_LOW_START - revelation) * PENALTY_LOW_FACTOR
    } else {
        0.0
    };

    (revelation * QUALITY_WEIGHT_REVELATION + visual * QUALITY_WEIGHT_VISUAL
        - penalty_high
        - penalty_low)
        .clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Ladder selection
// ---------------------------------------------------------------------------

/// Select `target` screenshots from the pool and order them into a
/// difficulty ladder.
///
/// Selection walks the five equal revelation bands and takes the
/// highest-quality unselected shot from each, so the ladder spans the
/// revelation axis instead of clustering on the globally best images.
/// Remaining slots are filled by global quality. The selected set is
/// then sorted by revelation ascending and assigned ranks `1..=K`.
///
/// Pools no larger than `target` are returned whole — scarcity never
/// shrinks the ladder below the available supply.
pub fn select_ladder(pool: &[ShotScores], target: usize) -> Vec<LadderEntry> {
    let mut selected: Vec<usize> = Vec::with_capacity(target);

    if pool.len() <= target {
        selected.extend(0..pool.len());
    } else {
        // One pick per revelation band, best quality first.
        for band in 0..REVELATION_BANDS {
            if selected.len() >= target {
                break;
            }
            let low = band as f64 * 100.0 / REVELATION_BANDS as f64;
            let high = low + 100.0 / REVELATION_BANDS as f64;
            let best = pool
                .iter()
                .enumerate()
                .filter(|(i, s)| {
                    !selected.contains(i)
                        && s.revelation >= low
                        && (s.revelation < high || (band == REVELATION_BANDS - 1 && s.revelation <= 100.0))
                })
                .max_by(|(_, a), (_, b)| {
                    quality_score(a.revelation, a.visual)
                        .total_cmp(&quality_score(b.revelation, b.visual))
                });
            if let Some((i, _)) = best {
                selected.push(i);
            }
        }

        // Fill any remaining slots with the next-best quality overall.
        while selected.len() < target {
            let best = pool
                .iter()
                .enumerate()
                .filter(|(i, _)| !selected.contains(i))
                .max_by(|(_, a), (_, b)| {
                    quality_score(a.revelation, a.visual)
                        .total_cmp(&quality_score(b.revelation, b.visual))
                });
            match best {
                Some((i, _)) => selected.push(i),
                None => break,
            }
        }
    }

    // Hardest first: lowest revelation gets rank 1.
    selected.sort_by(|&a, &b| pool[a].revelation.total_cmp(&pool[b].revelation));

    selected
        .into_iter()
        .enumerate()
        .map(|(pos, index)| LadderEntry {
            index,
            rank: pos as u32 + 1,
            revelation: pool[index].revelation,
            quality: quality_score(pool[index].revelation, pool[index].visual),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn shot(revelation: f64, visual: f64) -> ShotScores {
        ShotScores { revelation, visual }
    }

    // -- quality score -------------------------------------------------------

    #[test]
    fn penalty_zero_inside_safe_range() {
        for rev in [10.0, 30.0, 50.0, 70.0, 90.0] {
            let expected = rev * 0.6 + 50.0 * 0.4;
            assert!((quality_score(rev, 50.0) - expected).abs() < 1e-9, "rev={rev}");
        }
    }

    #[test]
    fn penalty_grows_above_ninety() {
        let q91 = quality_score(91.0, 50.0);
        let q95 = quality_score(95.0, 50.0);
        let q90 = quality_score(90.0, 50.0);
        assert!(q91 < q90);
        assert!(q95 < q91);
    }

    #[test]
    fn penalty_grows_below_ten() {
        let q9 = quality_score(9.0, 50.0);
        let q2 = quality_score(2.0, 50.0);
        let q10 = quality_score(10.0, 50.0);
        assert!(q9 < q10);
        assert!(q2 < q9);
    }

    #[test]
    fn quality_clamped_to_range() {
        assert!(quality_score(100.0, 0.0) >= 0.0);
        assert!(quality_score(0.0, 0.0) >= 0.0);
        assert!(quality_score(90.0, 100.0) <= 100.0);
    }

    // -- target count --------------------------------------------------------

    #[test]
    fn target_depends_on_loop_media() {
        assert_eq!(target_count(true), 5);
        assert_eq!(target_count(false), 6);
    }

    // -- ladder shape --------------------------------------------------------

    #[test]
    fn ladder_has_contiguous_unique_ranks_sorted_by_revelation() {
        let pool: Vec<ShotScores> = vec![
            shot(75.0, 60.0),
            shot(15.0, 40.0),
            shot(55.0, 70.0),
            shot(35.0, 50.0),
            shot(95.0, 80.0),
            shot(85.0, 65.0),
            shot(5.0, 30.0),
            shot(45.0, 55.0),
            shot(65.0, 45.0),
            shot(25.0, 60.0),
        ];

        let ladder = select_ladder(&pool, 5);
        assert_eq!(ladder.len(), 5);

        for (pos, entry) in ladder.iter().enumerate() {
            assert_eq!(entry.rank, pos as u32 + 1);
        }
        for pair in ladder.windows(2) {
            assert!(pair[0].revelation <= pair[1].revelation);
        }

        let mut indices: Vec<usize> = ladder.iter().map(|e| e.index).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), 5, "no screenshot may appear twice");
    }

    #[test]
    fn ladder_spans_revelation_bands() {
        // Two shots per band; the selection must take one from each.
        let pool: Vec<ShotScores> = vec![
            shot(12.0, 50.0),
            shot(18.0, 60.0),
            shot(32.0, 50.0),
            shot(38.0, 60.0),
            shot(52.0, 50.0),
            shot(58.0, 60.0),
            shot(72.0, 50.0),
            shot(78.0, 60.0),
            shot(82.0, 50.0),
            shot(88.0, 60.0),
        ];

        let ladder = select_ladder(&pool, 5);
        let bands: Vec<usize> = ladder
            .iter()
            .map(|e| (e.revelation / 20.0).floor() as usize)
            .collect();
        for band in 0..5 {
            assert!(bands.contains(&band), "band {band} missing from {bands:?}");
        }
    }

    #[test]
    fn scarce_pool_returned_whole() {
        let pool: Vec<ShotScores> = (0..5).map(|i| shot(i as f64 * 20.0, 50.0)).collect();
        let ladder = select_ladder(&pool, 5);
        assert_eq!(ladder.len(), 5);
    }

    #[test]
    fn undersized_pool_not_padded() {
        let pool: Vec<ShotScores> = (0..3).map(|i| shot(i as f64 * 30.0, 50.0)).collect();
        let ladder = select_ladder(&pool, 6);
        assert_eq!(ladder.len(), 3);
        assert_eq!(ladder.last().map(|e| e.rank), Some(3));
    }

    #[test]
    fn empty_band_filled_by_quality() {
        // Nothing below revelation 40: bands 0 and 1 are empty, so the
        // two extra slots fall back to the best remaining quality.
        let pool: Vec<ShotScores> = vec![
            shot(45.0, 90.0),
            shot(48.0, 20.0),
            shot(55.0, 85.0),
            shot(65.0, 50.0),
            shot(75.0, 70.0),
            shot(85.0, 60.0),
            shot(88.0, 10.0),
        ];
        let ladder = select_ladder(&pool, 5);
        assert_eq!(ladder.len(), 5);
    }

    #[test]
    fn top_band_includes_exact_hundred() {
        // Revelation 100 is the only shot in the top band; a half-open
        // final band would silently drop it.
        let pool: Vec<ShotScores> = vec![
            shot(100.0, 50.0),
            shot(10.0, 50.0),
            shot(15.0, 50.0),
            shot(30.0, 50.0),
            shot(50.0, 50.0),
            shot(70.0, 50.0),
        ];
        let ladder = select_ladder(&pool, 5);
        assert_eq!(ladder.len(), 5);
        assert!((ladder.last().unwrap().revelation - 100.0).abs() < 1e-9);
    }
}
