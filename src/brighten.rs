//! Linear brightness adjustment.
//!
//! Frames pulled from HDR masters often look crushed once tone-mapped to an
//! 8-bit poster. [`brighten_in_place`] applies a simple per-channel linear
//! gain to lift the exposure; it is deliberately not a tone-mapping
//! operator.

use image::RgbaImage;

/// Multiply each colour channel by `1 + percent/100`, clamping to 255.
///
/// A `percent` of zero or less is a no-op. Alpha is left untouched, and the
/// adjustment happens in place on the working canvas.
///
/// # Example
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use postergen::brighten_in_place;
///
/// let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([100, 100, 100, 255]));
/// brighten_in_place(&mut canvas, 25.0);
/// assert_eq!(canvas.get_pixel(0, 0), &Rgba([125, 125, 125, 255]));
/// ```
pub fn brighten_in_place(canvas: &mut RgbaImage, percent: f32) {
    if percent <= 0.0 {
        return;
    }

    let gain = 1.0 + percent / 100.0;
    log::debug!("Applying brightness gain {gain:.3}");

    for pixel in canvas.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = ((f32::from(*channel) * gain).round()).min(255.0) as u8;
        }
    }
}
