//! Letterbox and pillarbox detection.
//!
//! Broadcast masters and scene releases frequently bake black bars into the
//! picture to preserve the original aspect ratio. A poster cropped from such
//! a frame inherits the bars, so the compositor runs every extracted frame
//! through this detector before reshaping it.
//!
//! Detection scans each edge of the luma plane inward, counting a row or
//! column as a bar when a configurable fraction of its pixels sits at or
//! below a black threshold. The crop is rejected outright when it would
//! remove more than 75% of either dimension; an over-aggressive crop on a
//! dark frame is worse than leaving the bars in place.

use image::{DynamicImage, GenericImageView};

/// Smallest fraction of the source dimensions a crop may leave behind.
const MIN_REMAINING_FRACTION: f64 = 0.25;

/// Options for black-bar detection.
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct LetterboxOptions {
    /// Luma value (0–255) at or below which a pixel counts as black.
    /// Default 32; raise it for HDR content with elevated black levels.
    pub black_threshold: u8,
    /// Fraction of black pixels (percent, clamped to 50–100) a row or
    /// column needs to count as a bar. Default 85.
    pub confidence_pct: f32,
}

impl Default for LetterboxOptions {
    fn default() -> Self {
        Self {
            black_threshold: 32,
            confidence_pct: 85.0,
        }
    }
}

impl LetterboxOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the black luma threshold (0–255).
    pub fn with_black_threshold(mut self, threshold: u8) -> Self {
        self.black_threshold = threshold;
        self
    }

    /// Set the per-line black-pixel confidence. Clamped to 50–100%.
    pub fn with_confidence_pct(mut self, confidence: f32) -> Self {
        self.confidence_pct = confidence.clamp(50.0, 100.0);
        self
    }

    fn confidence_fraction(&self) -> f64 {
        f64::from(self.confidence_pct.clamp(50.0, 100.0)) / 100.0
    }
}

/// Pixel offsets to remove from each edge of a bitmap.
///
/// Invariants: `left + right < width`, `top + bottom < height`, and the
/// remaining dimensions are at least 25% of the source in both axes.
/// [`detect_letterbox`] only ever returns bounds satisfying these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBounds {
    /// Columns to remove from the left edge.
    pub left: u32,
    /// Rows to remove from the top edge.
    pub top: u32,
    /// Columns to remove from the right edge.
    pub right: u32,
    /// Rows to remove from the bottom edge.
    pub bottom: u32,
}

impl CropBounds {
    /// Whether any edge has bars at all.
    pub fn is_empty(&self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }

    /// Dimensions remaining after applying these bounds to a `width`×`height`
    /// source. Saturates instead of underflowing.
    pub fn remaining(&self, width: u32, height: u32) -> (u32, u32) {
        (
            width.saturating_sub(self.left + self.right),
            height.saturating_sub(self.top + self.bottom),
        )
    }
}

/// Detect letterbox/pillarbox bars and compute safe crop bounds.
///
/// Returns `None` when no safe crop exists: no bars found on any edge, the
/// resulting rectangle is degenerate, or the crop would shrink either
/// dimension below 25% of the source.
pub fn detect_letterbox(image: &DynamicImage, options: &LetterboxOptions) -> Option<CropBounds> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let luma = image.to_luma8();
    let pixels = luma.as_raw();
    let (width_usize, height_usize) = (width as usize, height as usize);
    let threshold = options.black_threshold;
    let confidence = options.confidence_fraction();

    let row_is_bar = |y: usize| {
        let row = &pixels[y * width_usize..(y + 1) * width_usize];
        let black = row.iter().filter(|&&value| value <= threshold).count();
        black as f64 / width_usize as f64 >= confidence
    };
    let column_is_bar = |x: usize| {
        let black = (0..height_usize)
            .filter(|&y| pixels[y * width_usize + x] <= threshold)
            .count();
        black as f64 / height_usize as f64 >= confidence
    };

    // Scan each edge inward, stopping at the first non-bar line.
    let top = (0..height_usize).take_while(|&y| row_is_bar(y)).count() as u32;
    let bottom = (0..height_usize)
        .rev()
        .take_while(|&y| row_is_bar(y))
        .count() as u32;
    let left = (0..width_usize).take_while(|&x| column_is_bar(x)).count() as u32;
    let right = (0..width_usize)
        .rev()
        .take_while(|&x| column_is_bar(x))
        .count() as u32;

    let bounds = CropBounds {
        left,
        top,
        right,
        bottom,
    };

    if bounds.is_empty() {
        return None;
    }

    let (remaining_width, remaining_height) = bounds.remaining(width, height);
    if remaining_width == 0
        || remaining_height == 0
        || remaining_width > width
        || remaining_height > height
    {
        log::debug!("Letterbox crop rejected: degenerate result {remaining_width}x{remaining_height}");
        return None;
    }

    // Safety floor: a crop that removes most of the picture is almost
    // certainly a dark scene, not bars.
    if (remaining_width as f64) < (width as f64) * MIN_REMAINING_FRACTION
        || (remaining_height as f64) < (height as f64) * MIN_REMAINING_FRACTION
    {
        log::debug!(
            "Letterbox crop rejected: {remaining_width}x{remaining_height} is below 25% of {width}x{height}"
        );
        return None;
    }

    Some(bounds)
}

/// Detect bars and crop them away.
///
/// Returns a newly allocated bitmap containing the interior rectangle, or
/// the input unchanged when no safe crop was found. The caller owns both
/// and drops whichever it no longer needs.
pub fn crop_letterbox(image: DynamicImage, options: &LetterboxOptions) -> DynamicImage {
    let Some(bounds) = detect_letterbox(&image, options) else {
        return image;
    };

    let (remaining_width, remaining_height) = bounds.remaining(image.width(), image.height());
    log::debug!(
        "Cropping letterbox bars (l={} t={} r={} b={}) -> {remaining_width}x{remaining_height}",
        bounds.left,
        bounds.top,
        bounds.right,
        bounds.bottom,
    );

    image.crop_imm(bounds.left, bounds.top, remaining_width, remaining_height)
}
