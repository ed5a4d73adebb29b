//! Trim-window and output-size selection for loop-media extraction.

/// Sources shorter than this are used whole.
pub const SHORT_SOURCE_SECS: f64 = 10.0;
/// Sources longer than this get an early-biased window: very long
/// videos are usually trailers or menu footage past the interesting
/// part.
pub const LONG_SOURCE_SECS: f64 = 300.0;
/// Length of the extracted segment.
pub const SEGMENT_SECS: f64 = 10.0;
/// Latest start for the early-biased window.
const EARLY_START_CAP_SECS: f64 = 30.0;

/// Frame rate of the encoded looping image.
pub const LOOP_FPS: u32 = 15;

/// The segment of the source video to extract, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimWindow {
    pub start: f64,
    pub end: f64,
}

impl TrimWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Choose the segment to extract from a source of the given duration.
///
/// Short clips are used whole; very long sources get a window starting
/// at `min(30s, 20% of duration)`; everything else gets a 10-second
/// window centered on the midpoint.
pub fn select_trim_window(duration_secs: f64) -> TrimWindow {
    if duration_secs < SHORT_SOURCE_SECS {
        return TrimWindow {
            start: 0.0,
            end: duration_secs.max(0.0),
        };
    }

    if duration_secs > LONG_SOURCE_SECS {
        let start = EARLY_START_CAP_SECS.min(duration_secs * 0.2);
        return TrimWindow {
            start,
            end: (start + SEGMENT_SECS).min(duration_secs),
        };
    }

    let middle = duration_secs / 2.0;
    let start = (middle - SEGMENT_SECS / 2.0).max(0.0);
    TrimWindow {
        start,
        end: (start + SEGMENT_SECS).min(duration_secs),
    }
}

/// Output width for the looping image, chosen from the source width.
///
/// Larger sources are downscaled harder to keep the encoded file small.
pub fn select_output_width(source_width: u32) -> u32 {
    if source_width > 800 {
        400
    } else if source_width > 600 {
        500
    } else if source_width < 300 {
        300
    } else {
        600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_clip_used_whole() {
        let window = select_trim_window(8.0);
        assert_eq!(window, TrimWindow { start: 0.0, end: 8.0 });
    }

    #[test]
    fn medium_clip_centered_on_midpoint() {
        let window = select_trim_window(60.0);
        assert!((window.start - 25.0).abs() < 1e-9);
        assert!((window.end - 35.0).abs() < 1e-9);
    }

    #[test]
    fn long_source_biased_early() {
        let window = select_trim_window(400.0);
        assert!(window.start <= 400.0 * 0.2, "start must fall in the first 20%");
        assert!(window.duration() <= SEGMENT_SECS + 1e-9);
    }

    #[test]
    fn very_long_source_start_capped() {
        let window = select_trim_window(3600.0);
        assert!((window.start - 30.0).abs() < 1e-9);
    }

    #[test]
    fn window_never_exceeds_duration() {
        for secs in [0.0, 5.0, 10.0, 12.0, 61.3, 299.0, 301.0, 4000.0] {
            let window = select_trim_window(secs);
            assert!(window.start >= 0.0);
            assert!(window.end <= secs + 1e-9, "duration {secs}");
            assert!(window.end >= window.start);
        }
    }

    #[test]
    fn output_width_buckets() {
        assert_eq!(select_output_width(1920), 400);
        assert_eq!(select_output_width(801), 400);
        assert_eq!(select_output_width(800), 500);
        assert_eq!(select_output_width(640), 500);
        assert_eq!(select_output_width(601), 500);
        assert_eq!(select_output_width(600), 600);
        assert_eq!(select_output_width(300), 600);
        assert_eq!(select_output_width(299), 300);
    }
}
