//! Aspect-ratio fill transforms.
//!
//! Posters are displayed at a fixed ratio (commonly 16:9 or 2:3) that rarely
//! matches the source video. [`apply_fill`] reconciles the two with one of
//! three strategies: leave the frame alone, center-crop it to the target
//! ratio, or stretch it non-uniformly.

use image::{DynamicImage, imageops::FilterType};

/// Ratios closer than this are treated as already matching; resampling a
/// frame that is within a hundredth of the target gains nothing.
const RATIO_EPSILON: f64 = 0.01;

/// Strategy for reconciling the source ratio with the target ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    /// Keep the source dimensions unchanged.
    #[default]
    Original,
    /// Center-crop to the target ratio (crop-zoom, no scaling).
    Fit,
    /// Stretch non-uniformly to the target ratio; may distort content.
    Fill,
}

impl FillMode {
    /// Parse a mode name. Accepts any case. Returns `None` for unknown names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "original" => Some(FillMode::Original),
            "fit" => Some(FillMode::Fit),
            "fill" => Some(FillMode::Fill),
            _ => None,
        }
    }
}

/// A target aspect ratio and the strategy used to reach it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillSpec {
    /// Target width:height ratio as a fraction (16:9 → ≈1.778).
    pub ratio: f64,
    /// The fill strategy.
    pub mode: FillMode,
}

impl FillSpec {
    /// The fallback ratio used when parsing fails.
    pub const DEFAULT_RATIO: f64 = 16.0 / 9.0;

    /// Build a spec from a `"W:H"` ratio string.
    ///
    /// Malformed strings (missing separator, non-numeric or non-positive
    /// components) fall back to 16:9 with a warning; ratio parsing never
    /// fails the pipeline.
    pub fn parse(ratio: &str, mode: FillMode) -> Self {
        match parse_ratio(ratio) {
            Some(value) => Self { ratio: value, mode },
            None => {
                log::warn!("Could not parse aspect ratio {ratio:?}, falling back to 16:9");
                Self {
                    ratio: Self::DEFAULT_RATIO,
                    mode,
                }
            }
        }
    }
}

/// Parse `"W:H"` into a ratio fraction.
fn parse_ratio(value: &str) -> Option<f64> {
    let (width, height) = value.split_once(':')?;
    let width: f64 = width.trim().parse().ok()?;
    let height: f64 = height.trim().parse().ok()?;
    if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
        Some(width / height)
    } else {
        None
    }
}

/// Reshape a bitmap to the target aspect ratio.
///
/// `Original` mode and near-matching ratios (within 0.01) return the input
/// unchanged. The other modes allocate a new bitmap; the superseded one is
/// the caller's to drop.
pub fn apply_fill(image: DynamicImage, spec: &FillSpec) -> DynamicImage {
    if spec.mode == FillMode::Original {
        return image;
    }

    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return image;
    }

    let current_ratio = width as f64 / height as f64;
    if (current_ratio - spec.ratio).abs() < RATIO_EPSILON {
        return image;
    }

    match spec.mode {
        FillMode::Original => image,
        FillMode::Fit => center_crop_to_ratio(image, current_ratio, spec.ratio),
        FillMode::Fill => stretch_to_ratio(image, spec.ratio),
    }
}

/// Crop-zoom: keep the constraining dimension, center-crop the other.
fn center_crop_to_ratio(image: DynamicImage, current_ratio: f64, target_ratio: f64) -> DynamicImage {
    let (width, height) = (image.width(), image.height());

    let (target_width, target_height) = if current_ratio > target_ratio {
        // Source is wider than the target: keep full height, trim the sides.
        let target_width = ((height as f64) * target_ratio).round() as u32;
        (target_width.clamp(1, width), height)
    } else {
        // Source is taller: keep full width, trim top and bottom.
        let target_height = ((width as f64) / target_ratio).round() as u32;
        (width, target_height.clamp(1, height))
    };

    let x = (width - target_width) / 2;
    let y = (height - target_height) / 2;
    log::debug!("Fit crop {width}x{height} -> {target_width}x{target_height} at ({x},{y})");
    image.crop_imm(x, y, target_width, target_height)
}

/// Stretch: anchor on the larger source dimension and scale non-uniformly.
fn stretch_to_ratio(image: DynamicImage, target_ratio: f64) -> DynamicImage {
    let (width, height) = (image.width(), image.height());

    let (target_width, target_height) = if width >= height {
        let target_height = ((width as f64) / target_ratio).round().max(1.0) as u32;
        (width, target_height)
    } else {
        let target_width = ((height as f64) * target_ratio).round().max(1.0) as u32;
        (target_width, height)
    };

    log::debug!("Fill stretch {width}x{height} -> {target_width}x{target_height}");
    image.resize_exact(target_width, target_height, FilterType::Lanczos3)
}
