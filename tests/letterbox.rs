//! Letterbox/pillarbox detection tests over synthetic bitmaps.

use image::{DynamicImage, Rgba, RgbaImage};

use postergen::{LetterboxOptions, crop_letterbox, detect_letterbox};

fn uniform(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([value, value, value, 255]),
    ))
}

/// Bright content with pure-black horizontal bands top and bottom.
fn letterboxed(width: u32, height: u32, band: u32) -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([180, 180, 180, 255]));
    for (_, y, pixel) in canvas.enumerate_pixels_mut() {
        if y < band || y >= height - band {
            *pixel = Rgba([0, 0, 0, 255]);
        }
    }
    DynamicImage::ImageRgba8(canvas)
}

/// Bright content with pure-black vertical bands left and right.
fn pillarboxed(width: u32, height: u32, band: u32) -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([180, 180, 180, 255]));
    for (x, _, pixel) in canvas.enumerate_pixels_mut() {
        if x < band || x >= width - band {
            *pixel = Rgba([0, 0, 0, 255]);
        }
    }
    DynamicImage::ImageRgba8(canvas)
}

#[test]
fn uniform_mid_gray_frame_is_not_cropped() {
    // Scenario: 1920x1080 mid-gray, threshold 25, confidence 85%.
    let image = uniform(1920, 1080, 128);
    let options = LetterboxOptions::new()
        .with_black_threshold(25)
        .with_confidence_pct(85.0);

    assert!(detect_letterbox(&image, &options).is_none());

    let result = crop_letterbox(image, &options);
    assert_eq!((result.width(), result.height()), (1920, 1080));
}

#[test]
fn letterbox_bands_are_detected_and_cropped() {
    // Scenario: 140px pure-black bands top and bottom -> ~1920x800.
    let image = letterboxed(1920, 1080, 140);
    let options = LetterboxOptions::new();

    let bounds = detect_letterbox(&image, &options).expect("Bands should be detected");
    assert_eq!(bounds.top, 140);
    assert_eq!(bounds.bottom, 140);
    assert_eq!(bounds.left, 0);
    assert_eq!(bounds.right, 0);

    let result = crop_letterbox(image, &options);
    assert_eq!((result.width(), result.height()), (1920, 800));
}

#[test]
fn pillarbox_bands_are_detected_and_cropped() {
    let image = pillarboxed(1920, 1080, 240);
    let options = LetterboxOptions::new();

    let bounds = detect_letterbox(&image, &options).expect("Bands should be detected");
    assert_eq!(bounds.left, 240);
    assert_eq!(bounds.right, 240);

    let result = crop_letterbox(image, &options);
    assert_eq!((result.width(), result.height()), (1440, 1080));
}

#[test]
fn over_aggressive_crop_is_rejected() {
    // Bands so deep the remaining height would be under 25% of the source:
    // the frame is returned unchanged.
    let image = letterboxed(1920, 1080, 420);
    let options = LetterboxOptions::new();

    assert!(detect_letterbox(&image, &options).is_none());

    let result = crop_letterbox(image, &options);
    assert_eq!((result.width(), result.height()), (1920, 1080));
}

#[test]
fn fully_black_frame_is_rejected() {
    let image = uniform(640, 360, 0);
    let options = LetterboxOptions::new();
    assert!(detect_letterbox(&image, &options).is_none());
}

#[test]
fn near_black_bands_respect_threshold() {
    // Bands at luma 40 are above the default threshold of 32 and must not
    // count as bars; raising the threshold finds them.
    let mut canvas = RgbaImage::from_pixel(640, 360, Rgba([180, 180, 180, 255]));
    for (_, y, pixel) in canvas.enumerate_pixels_mut() {
        if y < 40 || y >= 320 {
            *pixel = Rgba([40, 40, 40, 255]);
        }
    }
    let image = DynamicImage::ImageRgba8(canvas);

    assert!(detect_letterbox(&image, &LetterboxOptions::new()).is_none());

    let hdr_options = LetterboxOptions::new().with_black_threshold(64);
    let bounds = detect_letterbox(&image, &hdr_options).expect("Raised threshold finds bands");
    assert_eq!(bounds.top, 40);
    assert_eq!(bounds.bottom, 40);
}

#[test]
fn noisy_band_needs_confidence_fraction() {
    // A band where only 60% of pixels are black fails the 85% default but
    // passes at 50% confidence.
    let mut canvas = RgbaImage::from_pixel(200, 100, Rgba([180, 180, 180, 255]));
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        if y < 10 && x % 5 < 3 {
            *pixel = Rgba([0, 0, 0, 255]);
        }
    }
    let image = DynamicImage::ImageRgba8(canvas);

    assert!(detect_letterbox(&image, &LetterboxOptions::new()).is_none());

    let lenient = LetterboxOptions::new().with_confidence_pct(50.0);
    let bounds = detect_letterbox(&image, &lenient).expect("Lenient confidence finds the band");
    assert_eq!(bounds.top, 10);
}

#[test]
fn confidence_is_clamped_to_valid_range() {
    let options = LetterboxOptions::new().with_confidence_pct(10.0);
    assert_eq!(options.confidence_pct, 50.0);

    let options = LetterboxOptions::new().with_confidence_pct(150.0);
    assert_eq!(options.confidence_pct, 100.0);
}
