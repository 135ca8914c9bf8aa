//! End-to-end pipeline tests through [`PosterComposer`].
//!
//! A scripted [`FrameSource`] stands in for the FFmpeg decoder, so the full
//! pipeline runs without fixture videos. Encoded outputs are decoded back
//! with the `image` crate to verify dimensions and pixels.

use std::{path::Path, time::Duration};

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use rand::{SeedableRng, rngs::StdRng};

use postergen::{
    EpisodeInfo, FillMode, FrameSource, GraphicSpec, OverlaySpec, PosterComposer, PosterError,
    PosterFormat, PosterSettings, TextRenderer,
};

struct StubSource {
    duration: Duration,
    frame: Option<DynamicImage>,
}

impl StubSource {
    fn new(duration_seconds: u64, frame: DynamicImage) -> Self {
        Self {
            duration: Duration::from_secs(duration_seconds),
            frame: Some(frame),
        }
    }

    fn failing(duration_seconds: u64) -> Self {
        Self {
            duration: Duration::from_secs(duration_seconds),
            frame: None,
        }
    }
}

impl FrameSource for StubSource {
    fn duration(&mut self, _path: &Path) -> Result<Duration, PosterError> {
        Ok(self.duration)
    }

    fn frame_at(
        &mut self,
        _path: &Path,
        _timestamp: Duration,
    ) -> Result<DynamicImage, PosterError> {
        match &self.frame {
            Some(frame) => Ok(frame.clone()),
            None => Err(PosterError::DecodeError("scripted failure".to_string())),
        }
    }
}

/// 640x360 gray frame with 40px pure-black bands top and bottom.
fn letterboxed_frame() -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(640, 360, Rgba([180, 180, 180, 255]));
    for (_, y, pixel) in canvas.enumerate_pixels_mut() {
        if y < 40 || y >= 320 {
            *pixel = Rgba([0, 0, 0, 255]);
        }
    }
    DynamicImage::ImageRgba8(canvas)
}

fn video_path() -> &'static Path {
    Path::new("stub.mkv")
}

#[test]
fn disabled_extraction_yields_blank_canvas_at_fallback_dimensions() {
    // Extraction off: the source is never consulted and the output is a
    // fully transparent canvas at the fallback size.
    let settings = PosterSettings::new()
        .with_extract_poster(false)
        .with_fallback_dimensions(320, 180)
        .with_file_type(PosterFormat::Png);
    let composer = PosterComposer::new(settings);

    let mut source = StubSource::failing(600);
    let mut rng = StdRng::seed_from_u64(1);
    let (encoded, report) = composer
        .compose_with_report(&mut source, Some(video_path()), &EpisodeInfo::default(), &mut rng)
        .expect("Blank-canvas composition should succeed");

    assert_eq!(report.canvas_width, 320);
    assert_eq!(report.canvas_height, 180);
    assert!(report.frame_quality.is_none());

    let decoded = image::load_from_memory(&encoded.bytes).expect("Output should decode");
    assert_eq!((decoded.width(), decoded.height()), (320, 180));
    assert_eq!(decoded.get_pixel(160, 90), Rgba([0, 0, 0, 0]));
}

#[test]
fn full_pipeline_crops_letterbox_and_brightens() {
    // One extraction attempt, letterbox crop, no fill change, 25% boost.
    let settings = PosterSettings::new()
        .with_max_attempts(1)
        .with_brighten_hdr_pct(25.0)
        .with_file_type(PosterFormat::Png);
    let composer = PosterComposer::new(settings);

    let mut source = StubSource::new(600, letterboxed_frame());
    let mut rng = StdRng::seed_from_u64(2);
    let (encoded, report) = composer
        .compose_with_report(&mut source, Some(video_path()), &EpisodeInfo::default(), &mut rng)
        .expect("Composition should succeed");

    assert!(report.frame_quality.is_some());

    let decoded = image::load_from_memory(&encoded.bytes).expect("Output should decode");
    assert_eq!((decoded.width(), decoded.height()), (640, 280));
    // 180 gray boosted by 25% is 225.
    assert_eq!(decoded.get_pixel(320, 140), Rgba([225, 225, 225, 255]));
}

#[test]
fn fill_runs_after_letterbox_crop() {
    // The cropped 640x280 frame is then stretched to 2:1.
    let settings = PosterSettings::new()
        .with_max_attempts(1)
        .with_fill(FillMode::Fill, "2:1")
        .with_file_type(PosterFormat::Png);
    let composer = PosterComposer::new(settings);

    let mut source = StubSource::new(600, letterboxed_frame());
    let mut rng = StdRng::seed_from_u64(3);
    let encoded = composer
        .compose(&mut source, Some(video_path()), &EpisodeInfo::default(), &mut rng)
        .expect("Composition should succeed");

    let decoded = image::load_from_memory(&encoded.bytes).expect("Output should decode");
    assert_eq!((decoded.width(), decoded.height()), (640, 320));
}

#[test]
fn extraction_failure_short_circuits_the_pipeline() {
    let settings = PosterSettings::new().with_max_attempts(4);
    let composer = PosterComposer::new(settings);

    let mut source = StubSource::failing(600);
    let mut rng = StdRng::seed_from_u64(4);
    let error = composer
        .compose(&mut source, Some(video_path()), &EpisodeInfo::default(), &mut rng)
        .expect_err("Composition should fail");

    assert!(matches!(error, PosterError::NoUsableFrame { attempts: 4 }));
}

#[test]
fn solid_overlay_tints_a_blank_canvas() {
    let settings = PosterSettings::new()
        .with_extract_poster(false)
        .with_fallback_dimensions(64, 64)
        .with_overlay(OverlaySpec::Solid(Rgba([200, 40, 40, 128])))
        .with_file_type(PosterFormat::Png);
    let composer = PosterComposer::new(settings);

    let mut source = StubSource::failing(600);
    let mut rng = StdRng::seed_from_u64(5);
    let encoded = composer
        .compose(&mut source, Some(video_path()), &EpisodeInfo::default(), &mut rng)
        .expect("Composition should succeed");

    // Over a transparent canvas, source-over keeps the overlay colour and
    // its alpha unchanged.
    let decoded = image::load_from_memory(&encoded.bytes).expect("Output should decode");
    assert_eq!(decoded.get_pixel(32, 32), Rgba([200, 40, 40, 128]));
}

#[test]
fn graphic_is_scaled_and_placed_inside_safe_area() {
    let dir = tempfile::tempdir().expect("Temp directory should be created");
    let graphic_path = dir.path().join("logo.png");
    let logo = RgbaImage::from_pixel(10, 10, Rgba([0, 255, 0, 255]));
    logo.save(&graphic_path).expect("Logo should be written");

    // 200x100 canvas, no inset: a 10% x 20% budget gives a 20x20 logo at
    // bottom-center, so its top-left corner is (90, 80).
    let settings = PosterSettings::new()
        .with_extract_poster(false)
        .with_fallback_dimensions(200, 100)
        .with_safe_area_pct(0.0)
        .with_graphic(GraphicSpec::new(&graphic_path).with_size_pct(10.0, 20.0))
        .with_file_type(PosterFormat::Png);
    let composer = PosterComposer::new(settings);

    let mut source = StubSource::failing(600);
    let mut rng = StdRng::seed_from_u64(6);
    let encoded = composer
        .compose(&mut source, Some(video_path()), &EpisodeInfo::default(), &mut rng)
        .expect("Composition should succeed");

    let decoded = image::load_from_memory(&encoded.bytes).expect("Output should decode");
    let inside = decoded.get_pixel(95, 90);
    assert!(inside.0[1] > 200, "Expected the logo's green at (95, 90)");
    assert_eq!(inside.0[3], 255);
    assert_eq!(decoded.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
}

#[test]
fn missing_graphic_file_is_an_error() {
    let settings = PosterSettings::new()
        .with_extract_poster(false)
        .with_fallback_dimensions(64, 64)
        .with_graphic(GraphicSpec::new("does-not-exist.png"));
    let composer = PosterComposer::new(settings);

    let mut source = StubSource::failing(600);
    let mut rng = StdRng::seed_from_u64(7);
    let error = composer
        .compose(&mut source, Some(video_path()), &EpisodeInfo::default(), &mut rng)
        .expect_err("Composition should fail");

    assert!(matches!(error, PosterError::ImageError(_)));
}

/// Stamps a magenta marker pixel so the hand-off can be observed.
struct MarkerRenderer;

impl TextRenderer for MarkerRenderer {
    fn render_text(
        &self,
        mut canvas: RgbaImage,
        _info: &EpisodeInfo,
    ) -> Result<RgbaImage, PosterError> {
        canvas.put_pixel(0, 0, Rgba([255, 0, 255, 255]));
        Ok(canvas)
    }
}

#[test]
fn text_renderer_receives_the_composited_canvas() {
    let settings = PosterSettings::new()
        .with_extract_poster(false)
        .with_fallback_dimensions(32, 32)
        .with_file_type(PosterFormat::Png);
    let composer = PosterComposer::new(settings).with_text_renderer(Box::new(MarkerRenderer));

    let mut source = StubSource::failing(600);
    let mut rng = StdRng::seed_from_u64(8);
    let encoded = composer
        .compose(&mut source, Some(video_path()), &EpisodeInfo::default(), &mut rng)
        .expect("Composition should succeed");

    let decoded = image::load_from_memory(&encoded.bytes).expect("Output should decode");
    assert_eq!(decoded.get_pixel(0, 0), Rgba([255, 0, 255, 255]));
}

#[test]
fn compose_to_file_writes_the_configured_format() {
    let dir = tempfile::tempdir().expect("Temp directory should be created");
    let output = dir.path().join("poster.jpg");

    let settings = PosterSettings::new()
        .with_max_attempts(1)
        .with_file_type(PosterFormat::Jpeg);
    let composer = PosterComposer::new(settings);

    let mut source = StubSource::new(600, letterboxed_frame());
    let mut rng = StdRng::seed_from_u64(9);
    composer
        .compose_to_file(
            &mut source,
            Some(video_path()),
            &EpisodeInfo::default(),
            &mut rng,
            &output,
        )
        .expect("File should be written");

    let bytes = std::fs::read(&output).expect("Output file should exist");
    assert!(bytes.starts_with(&[0xFF, 0xD8]), "Expected a JPEG SOI marker");
}
