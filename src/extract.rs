//! Quality-scored frame extraction.
//!
//! A fixed timestamp is a bad place to take a poster from: it may land on a
//! fade-to-black, a title card, or a motion-blurred pan. This module samples
//! candidate frames at random timestamps inside a configurable window of the
//! video, scores each for brightness and sharpness, and returns the best one
//! found within a bounded number of attempts.
//!
//! The random source is injected ([`rand::Rng`]) so tests can supply a
//! seeded, deterministic generator.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use postergen::{ExtractOptions, FfmpegFrameSource, extract_best_frame};
//!
//! let mut source = FfmpegFrameSource::new();
//! let options = ExtractOptions::new().with_window(20.0, 80.0);
//! let best = extract_best_frame(
//!     &mut source,
//!     Path::new("episode.mkv"),
//!     &options,
//!     &mut rand::thread_rng(),
//! )?;
//! println!("picked {:?} (score {:.2})", best.timestamp, best.quality.score);
//! # Ok::<(), postergen::PosterError>(())
//! ```

use std::{path::Path, time::Duration};

use image::{DynamicImage, imageops::FilterType};
use rand::Rng;

use crate::{error::PosterError, progress::CancellationToken, source::FrameSource};

/// Longest side of the downscaled analysis copy, in pixels.
const ANALYSIS_MAX_DIMENSION: u32 = 200;

/// Normalised BT.709 brightness above which a frame is considered well lit.
const BRIGHTNESS_FLOOR: f64 = 0.25;

/// Mean squared Laplacian (over 0..255 luma) above which a frame is
/// considered sharp.
const SHARPNESS_FLOOR: f64 = 100.0;

/// Combined score that ends the search once enough attempts have been made.
const EARLY_EXIT_SCORE: f64 = 0.6;

/// Minimum attempts before the early-exit score is consulted.
const EARLY_EXIT_MIN_ATTEMPTS: u32 = 5;

/// Default seek window as percentages of the video duration.
const DEFAULT_WINDOW: (f64, f64) = (20.0, 80.0);

/// Per-frame quality metrics.
///
/// Computed from a downscaled analysis copy of a candidate frame; never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameQuality {
    /// Mean perceptual brightness (ITU-R BT.709 weighted RGB), 0..1.
    pub brightness: f64,
    /// Mean squared discrete Laplacian over interior luma pixels, ≥ 0.
    /// Higher means more local contrast (a blur proxy).
    pub sharpness: f64,
    /// Weighted combination of brightness and sharpness, each normalised
    /// against its floor and capped at 1.0, then averaged 50/50. Range 0..1.
    pub score: f64,
}

impl FrameQuality {
    /// Measure quality metrics for a frame.
    ///
    /// Builds a small analysis copy (longest side ≈ 200 px) so the cost is
    /// independent of source resolution.
    ///
    /// # Errors
    ///
    /// Returns [`PosterError::AnalysisError`] for degenerate (zero-sized)
    /// frames.
    pub fn measure(image: &DynamicImage) -> Result<Self, PosterError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(PosterError::AnalysisError(format!(
                "Frame has degenerate dimensions {width}x{height}"
            )));
        }

        let analysis = analysis_copy(image);
        let luma = bt709_luma(&analysis);
        let (width, height) = (analysis.width() as usize, analysis.height() as usize);

        let brightness = mean_brightness(&luma);
        let sharpness = laplacian_sharpness(&luma, width, height);

        Ok(Self {
            brightness,
            sharpness,
            score: combined_score(brightness, sharpness),
        })
    }

    /// Whether both metrics clear their floors outright, allowing the
    /// search to accept this frame without further attempts.
    pub fn is_good_enough(&self) -> bool {
        self.brightness > BRIGHTNESS_FLOOR && self.sharpness > SHARPNESS_FLOOR
    }
}

/// A candidate frame promoted to "best": the decoded image, its quality
/// metrics, and the timestamp it was taken from.
#[derive(Debug, Clone)]
pub struct ScoredFrame {
    /// The decoded frame, owned by the caller.
    pub image: DynamicImage,
    /// Quality metrics measured on the analysis copy.
    pub quality: FrameQuality,
    /// Timestamp within the video the frame was decoded at.
    pub timestamp: Duration,
}

/// Configuration for [`extract_best_frame`].
///
/// Builder-style; a default-constructed value samples the middle 20–80% of
/// the video with up to 30 attempts and no cancellation.
#[derive(Debug, Clone)]
#[must_use]
pub struct ExtractOptions {
    /// Start of the seek window as a percentage of duration. Default 20.
    pub window_start_pct: f64,
    /// End of the seek window as a percentage of duration. Default 80.
    pub window_end_pct: f64,
    /// Maximum decode attempts before giving up. Default 30.
    pub max_attempts: u32,
    /// Cancellation token. `None` means never cancelled.
    pub cancellation: Option<CancellationToken>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            window_start_pct: DEFAULT_WINDOW.0,
            window_end_pct: DEFAULT_WINDOW.1,
            max_attempts: 30,
            cancellation: None,
        }
    }
}

impl ExtractOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seek window as percentages of the video duration.
    ///
    /// Validation happens at extraction time, not here, so that
    /// configuration loading never fails: out-of-range percentages are
    /// clamped to 0–100, and a window that is still invalid afterwards
    /// (start ≥ end, or non-finite values) is replaced by the 20–80%
    /// default with a warning.
    pub fn with_window(mut self, start_pct: f64, end_pct: f64) -> Self {
        self.window_start_pct = start_pct;
        self.window_end_pct = end_pct;
        self
    }

    /// Set the maximum number of decode attempts. Clamped to a minimum of 1.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the retry loop stops before the next
    /// attempt and returns [`PosterError::Cancelled`].
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Resolve the seek window, falling back to defaults when invalid.
    ///
    /// Non-finite percentages are rejected wholesale; out-of-range ones are
    /// clamped to 0–100 before the start/end comparison, so the resolved
    /// window always yields non-negative timestamps within the duration.
    pub(crate) fn resolved_window(&self) -> (f64, f64) {
        if !self.window_start_pct.is_finite() || !self.window_end_pct.is_finite() {
            log::warn!(
                "Non-finite extraction window ({}%..{}%), falling back to {}%..{}%",
                self.window_start_pct,
                self.window_end_pct,
                DEFAULT_WINDOW.0,
                DEFAULT_WINDOW.1,
            );
            return DEFAULT_WINDOW;
        }

        let start = self.window_start_pct.clamp(0.0, 100.0);
        let end = self.window_end_pct.clamp(0.0, 100.0);
        if start >= end {
            log::warn!(
                "Invalid extraction window ({}%..{}%), falling back to {}%..{}%",
                self.window_start_pct,
                self.window_end_pct,
                DEFAULT_WINDOW.0,
                DEFAULT_WINDOW.1,
            );
            DEFAULT_WINDOW
        } else {
            (start, end)
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// Extract the best-quality frame from a video.
///
/// Draws uniformly random timestamps within the configured window, decodes a
/// candidate at each, and scores it. A frame that clears both quality floors
/// is accepted immediately; otherwise the highest-scoring candidate seen so
/// far is retained (superseded candidates are dropped, so at most two frame
/// buffers are live at any time). After [`EARLY_EXIT_MIN_ATTEMPTS`] attempts
/// the search also stops as soon as the best score exceeds 0.6.
///
/// Per-attempt decode and analysis errors are retried; the attempt budget is
/// shared across them.
///
/// # Errors
///
/// - [`PosterError::InvalidInput`] if the video reports zero duration.
/// - [`PosterError::FileOpen`] / [`PosterError::NoVideoStream`] immediately
///   (these do not improve with retries).
/// - [`PosterError::Cancelled`] if the token is cancelled mid-search.
/// - [`PosterError::NoUsableFrame`] when the attempt budget is exhausted
///   without a single decodable candidate.
pub fn extract_best_frame<S, R>(
    source: &mut S,
    path: &Path,
    options: &ExtractOptions,
    rng: &mut R,
) -> Result<ScoredFrame, PosterError>
where
    S: FrameSource,
    R: Rng + ?Sized,
{
    let (start_pct, end_pct) = options.resolved_window();

    let duration = source.duration(path)?;
    if duration.is_zero() {
        return Err(PosterError::InvalidInput(format!(
            "Video at {} reports zero duration",
            path.display()
        )));
    }

    let total_seconds = duration.as_secs_f64();
    let window_start = total_seconds * start_pct / 100.0;
    let window_end = total_seconds * end_pct / 100.0;

    log::debug!(
        "Searching for poster frame in [{window_start:.1}s, {window_end:.1}s) of {}",
        path.display()
    );

    let mut best: Option<ScoredFrame> = None;
    let mut attempts = 0;

    while attempts < options.max_attempts {
        if options.is_cancelled() {
            log::debug!("Frame extraction cancelled after {attempts} attempt(s)");
            return Err(PosterError::Cancelled);
        }

        attempts += 1;
        let timestamp = Duration::from_secs_f64(rng.gen_range(window_start..window_end));

        let frame = match source.frame_at(path, timestamp) {
            Ok(frame) => frame,
            Err(
                error @ (PosterError::FileOpen { .. }
                | PosterError::NoVideoStream
                | PosterError::InvalidInput(_)),
            ) => return Err(error),
            Err(error) => {
                log::debug!("Attempt {attempts}: decode at {timestamp:?} failed: {error}");
                continue;
            }
        };

        let quality = match FrameQuality::measure(&frame) {
            Ok(quality) => quality,
            Err(error) => {
                log::debug!("Attempt {attempts}: analysis failed: {error}");
                continue;
            }
        };

        log::debug!(
            "Attempt {attempts}: t={timestamp:?} brightness={:.3} sharpness={:.1} score={:.3}",
            quality.brightness,
            quality.sharpness,
            quality.score,
        );

        if quality.is_good_enough() {
            log::debug!("Accepting frame at {timestamp:?} (clears both quality floors)");
            return Ok(ScoredFrame {
                image: frame,
                quality,
                timestamp,
            });
        }

        // Track the best-scored candidate; replacing drops the old buffer.
        if best
            .as_ref()
            .is_none_or(|current| quality.score > current.quality.score)
        {
            best = Some(ScoredFrame {
                image: frame,
                quality,
                timestamp,
            });
        }

        if attempts > EARLY_EXIT_MIN_ATTEMPTS
            && best
                .as_ref()
                .is_some_and(|current| current.quality.score > EARLY_EXIT_SCORE)
        {
            log::debug!("Early exit after {attempts} attempts (best score clears {EARLY_EXIT_SCORE})");
            break;
        }
    }

    best.ok_or(PosterError::NoUsableFrame { attempts })
}

/// Downscale to the analysis resolution (longest side ≈ 200 px).
///
/// Frames already small enough are analysed as-is.
fn analysis_copy(image: &DynamicImage) -> DynamicImage {
    let longest = image.width().max(image.height());
    if longest <= ANALYSIS_MAX_DIMENSION {
        return image.clone();
    }
    let scale = ANALYSIS_MAX_DIMENSION as f64 / longest as f64;
    let width = ((image.width() as f64) * scale).round().max(1.0) as u32;
    let height = ((image.height() as f64) * scale).round().max(1.0) as u32;
    image.resize_exact(width, height, FilterType::Triangle)
}

/// BT.709 luma plane (0..255) of an image.
fn bt709_luma(image: &DynamicImage) -> Vec<f64> {
    let rgb = image.to_rgb8();
    rgb.pixels()
        .map(|pixel| {
            let [r, g, b] = pixel.0;
            0.2126 * r as f64 + 0.7152 * g as f64 + 0.0722 * b as f64
        })
        .collect()
}

/// Mean luma normalised to 0..1.
fn mean_brightness(luma: &[f64]) -> f64 {
    if luma.is_empty() {
        return 0.0;
    }
    luma.iter().sum::<f64>() / luma.len() as f64 / 255.0
}

/// Mean squared 4-neighbour Laplacian over interior pixels.
///
/// `4*center − top − bottom − left − right`, averaged as the square across
/// every pixel not on the border. Images narrower than 3 px in either axis
/// have no interior and score 0.
fn laplacian_sharpness(luma: &[f64], width: usize, height: usize) -> f64 {
    if width < 3 || height < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut count = 0u64;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = luma[y * width + x];
            let response = 4.0 * center
                - luma[(y - 1) * width + x]
                - luma[(y + 1) * width + x]
                - luma[y * width + x - 1]
                - luma[y * width + x + 1];
            sum += response * response;
            count += 1;
        }
    }
    sum / count as f64
}

/// Weighted average of the normalised metrics, each capped at 1.0.
fn combined_score(brightness: f64, sharpness: f64) -> f64 {
    let brightness_component = (brightness / BRIGHTNESS_FLOOR).min(1.0);
    let sharpness_component = (sharpness / SHARPNESS_FLOOR).min(1.0);
    0.5 * brightness_component + 0.5 * sharpness_component
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_score_monotone_in_brightness() {
        let low = combined_score(0.1, 50.0);
        let high = combined_score(0.2, 50.0);
        assert!(high > low);
    }

    #[test]
    fn combined_score_monotone_in_sharpness() {
        let low = combined_score(0.1, 20.0);
        let high = combined_score(0.1, 80.0);
        assert!(high > low);
    }

    #[test]
    fn combined_score_caps_at_one() {
        let score = combined_score(10.0, 100_000.0);
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn uniform_image_has_zero_sharpness() {
        let luma = vec![128.0; 25];
        assert_eq!(laplacian_sharpness(&luma, 5, 5), 0.0);
    }

    #[test]
    fn tiny_image_has_zero_sharpness() {
        let luma = vec![10.0, 240.0];
        assert_eq!(laplacian_sharpness(&luma, 2, 1), 0.0);
    }

    #[test]
    fn resolved_window_clamps_out_of_range_percentages() {
        let options = ExtractOptions::new().with_window(-10.0, 150.0);
        assert_eq!(options.resolved_window(), (0.0, 100.0));
    }

    #[test]
    fn resolved_window_rejects_inverted_and_non_finite() {
        let inverted = ExtractOptions::new().with_window(90.0, 10.0);
        assert_eq!(inverted.resolved_window(), DEFAULT_WINDOW);

        let nan = ExtractOptions::new().with_window(f64::NAN, 50.0);
        assert_eq!(nan.resolved_window(), DEFAULT_WINDOW);

        let infinite = ExtractOptions::new().with_window(20.0, f64::INFINITY);
        assert_eq!(infinite.resolved_window(), DEFAULT_WINDOW);

        // Clamping can collapse the window; that also falls back.
        let both_negative = ExtractOptions::new().with_window(-30.0, -10.0);
        assert_eq!(both_negative.resolved_window(), DEFAULT_WINDOW);
    }
}
