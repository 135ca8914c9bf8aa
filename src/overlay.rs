//! Overlay tint and graphic compositing.
//!
//! After the frame is reshaped, the compositor darkens or tints it so that
//! text drawn on top stays legible, then optionally places a static graphic
//! (network logo, watermark) inside the safe area. Both operations mutate
//! the working canvas in place.

use std::path::PathBuf;

use image::{DynamicImage, Rgba, RgbaImage, imageops, imageops::FilterType};

use crate::error::PosterError;

/// Direction of a two-colour gradient overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientDirection {
    /// Primary colour on the left edge, secondary on the right.
    LeftToRight,
    /// Primary colour on the bottom edge, secondary on the top.
    BottomToTop,
    /// Primary in the top-left corner, secondary in the bottom-right.
    TopLeftToBottomRight,
    /// Primary in the bottom-left corner, secondary in the top-right.
    BottomLeftToTopRight,
}

/// The overlay tint applied across the whole canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlaySpec {
    /// No tint.
    #[default]
    None,
    /// A single colour blended over every pixel. The colour's alpha channel
    /// controls the tint strength.
    Solid(Rgba<u8>),
    /// A per-pixel blend between two colours along a direction.
    Gradient {
        /// Colour at the gradient origin.
        primary: Rgba<u8>,
        /// Colour at the gradient terminus.
        secondary: Rgba<u8>,
        /// Which way the blend runs.
        direction: GradientDirection,
    },
}

/// Apply the overlay tint to the canvas in place.
pub fn apply_overlay(canvas: &mut RgbaImage, spec: &OverlaySpec) {
    match *spec {
        OverlaySpec::None => {}
        OverlaySpec::Solid(color) => {
            log::debug!("Applying solid overlay {:?}", color.0);
            for pixel in canvas.pixels_mut() {
                *pixel = blend_over(*pixel, color);
            }
        }
        OverlaySpec::Gradient {
            primary,
            secondary,
            direction,
        } => {
            log::debug!("Applying {direction:?} gradient overlay");
            let (width, height) = canvas.dimensions();
            for (x, y, pixel) in canvas.enumerate_pixels_mut() {
                let t = gradient_position(x, y, width, height, direction);
                let color = lerp_color(primary, secondary, t);
                *pixel = blend_over(*pixel, color);
            }
        }
    }
}

/// Fractional position of a pixel along the gradient axis, 0.0 at the
/// primary colour and 1.0 at the secondary.
fn gradient_position(
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    direction: GradientDirection,
) -> f32 {
    let max_x = width.saturating_sub(1).max(1) as f32;
    let max_y = height.saturating_sub(1).max(1) as f32;
    let x = x as f32;
    let y = y as f32;

    match direction {
        GradientDirection::LeftToRight => x / max_x,
        GradientDirection::BottomToTop => (max_y - y) / max_y,
        GradientDirection::TopLeftToBottomRight => (x + y) / (max_x + max_y),
        GradientDirection::BottomLeftToTopRight => (x + (max_y - y)) / (max_x + max_y),
    }
}

/// Linear interpolation between two RGBA colours.
fn lerp_color(from: Rgba<u8>, to: Rgba<u8>, t: f32) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 4];
    for (index, slot) in out.iter_mut().enumerate() {
        let a = f32::from(from.0[index]);
        let b = f32::from(to.0[index]);
        *slot = (a + (b - a) * t).round() as u8;
    }
    Rgba(out)
}

/// Source-over blend of `top` onto `bottom`.
fn blend_over(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_alpha = f32::from(top.0[3]) / 255.0;
    let bottom_alpha = f32::from(bottom.0[3]) / 255.0;
    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);

    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for index in 0..3 {
        let top_channel = f32::from(top.0[index]) * top_alpha;
        let bottom_channel = f32::from(bottom.0[index]) * bottom_alpha * (1.0 - top_alpha);
        out[index] = ((top_channel + bottom_channel) / out_alpha).round().min(255.0) as u8;
    }
    out[3] = (out_alpha * 255.0).round().min(255.0) as u8;
    Rgba(out)
}

/// Vertical placement of the graphic inside the safe area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalPosition {
    /// Flush with the top of the safe area.
    Top,
    /// Vertically centred.
    Center,
    /// Flush with the bottom of the safe area.
    #[default]
    Bottom,
}

/// Horizontal alignment of the graphic inside the safe area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlignment {
    /// Flush with the left of the safe area.
    Left,
    /// Horizontally centred.
    #[default]
    Center,
    /// Flush with the right of the safe area.
    Right,
}

/// A static graphic to composite over the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicSpec {
    /// Path to the graphic image file.
    pub path: PathBuf,
    /// Maximum graphic width as a percentage of the canvas width.
    pub width_pct: f32,
    /// Maximum graphic height as a percentage of the canvas height.
    pub height_pct: f32,
    /// Vertical placement within the safe area.
    pub vertical: VerticalPosition,
    /// Horizontal alignment within the safe area.
    pub horizontal: HorizontalAlignment,
}

impl GraphicSpec {
    /// Create a spec with default sizing (25% × 25%) and placement
    /// (bottom-center).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width_pct: 25.0,
            height_pct: 25.0,
            vertical: VerticalPosition::default(),
            horizontal: HorizontalAlignment::default(),
        }
    }

    /// Set the maximum width and height as percentages of the canvas.
    #[must_use]
    pub fn with_size_pct(mut self, width_pct: f32, height_pct: f32) -> Self {
        self.width_pct = width_pct;
        self.height_pct = height_pct;
        self
    }

    /// Set the placement within the safe area.
    #[must_use]
    pub fn with_placement(
        mut self,
        vertical: VerticalPosition,
        horizontal: HorizontalAlignment,
    ) -> Self {
        self.vertical = vertical;
        self.horizontal = horizontal;
        self
    }
}

/// Composite the graphic onto the canvas inside the safe-area rectangle.
///
/// The graphic keeps its own aspect ratio; the width% and height%
/// constraints are resolved by whichever is more restrictive.
///
/// # Errors
///
/// Returns [`PosterError::ImageError`] if the graphic cannot be loaded, or
/// [`PosterError::InvalidInput`] if it has degenerate dimensions.
pub fn composite_graphic(
    canvas: &mut RgbaImage,
    spec: &GraphicSpec,
    safe_area_pct: f32,
) -> Result<(), PosterError> {
    let graphic: DynamicImage = image::open(&spec.path)?;
    let (graphic_width, graphic_height) = (graphic.width(), graphic.height());
    if graphic_width == 0 || graphic_height == 0 {
        return Err(PosterError::InvalidInput(format!(
            "Graphic at {} has degenerate dimensions",
            spec.path.display()
        )));
    }

    let (canvas_width, canvas_height) = canvas.dimensions();

    // Scale to fit the more restrictive of the width/height constraints.
    let max_width = (canvas_width as f32) * spec.width_pct / 100.0;
    let max_height = (canvas_height as f32) * spec.height_pct / 100.0;
    let scale = (max_width / graphic_width as f32).min(max_height / graphic_height as f32);
    let scaled_width = ((graphic_width as f32) * scale).round().max(1.0) as u32;
    let scaled_height = ((graphic_height as f32) * scale).round().max(1.0) as u32;
    let scaled = graphic.resize_exact(scaled_width, scaled_height, FilterType::Lanczos3);

    // Safe-area rectangle: canvas inset by safe_area_pct on every side.
    let inset_x = ((canvas_width as f32) * safe_area_pct / 100.0).round() as i64;
    let inset_y = ((canvas_height as f32) * safe_area_pct / 100.0).round() as i64;
    let safe_left = inset_x;
    let safe_top = inset_y;
    let safe_right = i64::from(canvas_width) - inset_x;
    let safe_bottom = i64::from(canvas_height) - inset_y;

    let x = match spec.horizontal {
        HorizontalAlignment::Left => safe_left,
        HorizontalAlignment::Center => (safe_left + safe_right - i64::from(scaled_width)) / 2,
        HorizontalAlignment::Right => safe_right - i64::from(scaled_width),
    };
    let y = match spec.vertical {
        VerticalPosition::Top => safe_top,
        VerticalPosition::Center => (safe_top + safe_bottom - i64::from(scaled_height)) / 2,
        VerticalPosition::Bottom => safe_bottom - i64::from(scaled_height),
    };

    log::debug!(
        "Compositing graphic {} at ({x},{y}) as {scaled_width}x{scaled_height}",
        spec.path.display()
    );
    imageops::overlay(canvas, &scaled.to_rgba8(), x, y);
    Ok(())
}
