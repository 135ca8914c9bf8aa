//! Poster composition pipeline.
//!
//! [`PosterComposer`] sequences the full pipeline for one video: frame
//! extraction, letterbox removal, aspect fill, brightness adjustment,
//! overlay tint, graphic compositing, typography hand-off, and final
//! encoding. [`PosterSettings`] is the configuration surface the host
//! application exposes; every knob has a clamped, sensible default.
//!
//! Each invocation is self-contained: no state is shared between runs, and
//! every intermediate bitmap is an owned value dropped by the stage that
//! supersedes it, on success and failure paths alike.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use postergen::{
//!     EpisodeInfo, FfmpegFrameSource, FillMode, PosterComposer, PosterFormat, PosterSettings,
//! };
//!
//! let settings = PosterSettings::new()
//!     .with_fill(FillMode::Fit, "2:3")
//!     .with_file_type(PosterFormat::Jpeg)
//!     .with_brighten_hdr_pct(10.0);
//!
//! let composer = PosterComposer::new(settings);
//! let mut source = FfmpegFrameSource::new();
//! let poster = composer.compose(
//!     &mut source,
//!     Some(Path::new("episode.mkv")),
//!     &EpisodeInfo::default(),
//!     &mut rand::thread_rng(),
//! )?;
//! std::fs::write("poster.jpg", &poster.bytes)?;
//! # Ok::<(), postergen::PosterError>(())
//! ```

use std::path::Path;

use image::{DynamicImage, RgbaImage};
use rand::Rng;

use crate::{
    brighten::brighten_in_place,
    encode::{EncodedImage, PosterFormat, encode_poster},
    error::PosterError,
    extract::{ExtractOptions, FrameQuality, extract_best_frame},
    fill::{FillMode, FillSpec, apply_fill},
    letterbox::{LetterboxOptions, crop_letterbox},
    overlay::{GraphicSpec, OverlaySpec, apply_overlay, composite_graphic},
    progress::CancellationToken,
    source::FrameSource,
    text::{EpisodeInfo, NoOpTextRenderer, TextRenderer},
};

/// The configuration surface consumed by the poster pipeline.
///
/// Builder-style; resolves into the per-stage option structs. Out-of-range
/// values are clamped rather than rejected; configuration loading never
/// fails.
#[derive(Debug, Clone)]
#[must_use]
pub struct PosterSettings {
    /// Whether to extract a frame from the video at all. When `false` the
    /// pipeline starts from a blank transparent canvas. Default `true`.
    pub extract_poster: bool,
    /// Start of the extraction seek window (% of duration). Default 20.
    pub extract_window_start_pct: f64,
    /// End of the extraction seek window (% of duration). Default 80.
    pub extract_window_end_pct: f64,
    /// Maximum frame decode attempts. Default 30.
    pub max_attempts: u32,
    /// Linear brightness boost (%) for HDR exposure correction. Values ≤ 0
    /// disable the adjustment. Default 0.
    pub brighten_hdr_pct: f32,
    /// Whether to run letterbox/pillarbox detection. Default `true`.
    pub enable_letterbox_detection: bool,
    /// Luma threshold (0–255) for letterbox black pixels. Default 32.
    pub letterbox_black_threshold: u8,
    /// Per-line black-pixel confidence (%, clamped 50–100). Default 85.
    pub letterbox_confidence_pct: f32,
    /// Aspect fill strategy. Default [`FillMode::Original`].
    pub fill_mode: FillMode,
    /// Target aspect ratio as a `"W:H"` string; malformed values fall back
    /// to 16:9 with a warning. Default `"16:9"`.
    pub dimension_ratio: String,
    /// Safe-area inset (% per side, clamped 0–25) that graphic and text
    /// layers must respect. Default 5.
    pub safe_area_pct: f32,
    /// Output encoding. Default JPEG.
    pub file_type: PosterFormat,
    /// Canvas width used when extraction is disabled or no source exists.
    /// Default 1920.
    pub fallback_width: u32,
    /// Canvas height used when extraction is disabled or no source exists.
    /// Default 1080.
    pub fallback_height: u32,
    /// Overlay tint applied over the whole canvas. Default none.
    pub overlay: OverlaySpec,
    /// Optional static graphic composited inside the safe area.
    pub graphic: Option<GraphicSpec>,
}

impl Default for PosterSettings {
    fn default() -> Self {
        Self {
            extract_poster: true,
            extract_window_start_pct: 20.0,
            extract_window_end_pct: 80.0,
            max_attempts: 30,
            brighten_hdr_pct: 0.0,
            enable_letterbox_detection: true,
            letterbox_black_threshold: 32,
            letterbox_confidence_pct: 85.0,
            fill_mode: FillMode::Original,
            dimension_ratio: "16:9".to_string(),
            safe_area_pct: 5.0,
            file_type: PosterFormat::Jpeg,
            fallback_width: 1920,
            fallback_height: 1080,
            overlay: OverlaySpec::None,
            graphic: None,
        }
    }
}

impl PosterSettings {
    /// Create settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable frame extraction (Scenario: disabled runs produce
    /// a blank canvas at the fallback dimensions).
    pub fn with_extract_poster(mut self, extract: bool) -> Self {
        self.extract_poster = extract;
        self
    }

    /// Set the extraction seek window as percentages of the duration.
    pub fn with_extract_window(mut self, start_pct: f64, end_pct: f64) -> Self {
        self.extract_window_start_pct = start_pct;
        self.extract_window_end_pct = end_pct;
        self
    }

    /// Set the maximum number of frame decode attempts. Clamped to ≥ 1.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the HDR brightness boost percentage.
    pub fn with_brighten_hdr_pct(mut self, percent: f32) -> Self {
        self.brighten_hdr_pct = percent;
        self
    }

    /// Configure letterbox detection.
    pub fn with_letterbox_detection(
        mut self,
        enabled: bool,
        black_threshold: u8,
        confidence_pct: f32,
    ) -> Self {
        self.enable_letterbox_detection = enabled;
        self.letterbox_black_threshold = black_threshold;
        self.letterbox_confidence_pct = confidence_pct.clamp(50.0, 100.0);
        self
    }

    /// Set the fill mode and target ratio string.
    pub fn with_fill(mut self, mode: FillMode, dimension_ratio: &str) -> Self {
        self.fill_mode = mode;
        self.dimension_ratio = dimension_ratio.to_string();
        self
    }

    /// Set the safe-area inset percentage. Clamped to 0–25 per side.
    pub fn with_safe_area_pct(mut self, percent: f32) -> Self {
        self.safe_area_pct = percent.clamp(0.0, 25.0);
        self
    }

    /// Set the output format.
    pub fn with_file_type(mut self, format: PosterFormat) -> Self {
        self.file_type = format;
        self
    }

    /// Set the blank-canvas dimensions used when extraction is disabled.
    pub fn with_fallback_dimensions(mut self, width: u32, height: u32) -> Self {
        self.fallback_width = width.max(1);
        self.fallback_height = height.max(1);
        self
    }

    /// Set the overlay tint.
    pub fn with_overlay(mut self, overlay: OverlaySpec) -> Self {
        self.overlay = overlay;
        self
    }

    /// Set the static graphic.
    pub fn with_graphic(mut self, graphic: GraphicSpec) -> Self {
        self.graphic = Some(graphic);
        self
    }

    /// Resolve the fill spec, parsing the ratio string (16:9 fallback).
    pub fn fill_spec(&self) -> FillSpec {
        FillSpec::parse(&self.dimension_ratio, self.fill_mode)
    }

    fn letterbox_options(&self) -> LetterboxOptions {
        LetterboxOptions::new()
            .with_black_threshold(self.letterbox_black_threshold)
            .with_confidence_pct(self.letterbox_confidence_pct)
    }

    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions::new()
            .with_window(self.extract_window_start_pct, self.extract_window_end_pct)
            .with_max_attempts(self.max_attempts)
    }
}

/// Quality details of a finished composition, reported alongside the bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeReport {
    /// Quality of the selected frame; `None` for blank-canvas runs.
    pub frame_quality: Option<FrameQuality>,
    /// Final canvas dimensions before encoding.
    pub canvas_width: u32,
    /// Final canvas dimensions before encoding.
    pub canvas_height: u32,
}

/// Orchestrates the full poster pipeline.
///
/// Holds the settings, the typography collaborator, and an optional
/// cancellation token. The composer itself is stateless across
/// invocations; a single instance may serve many videos.
pub struct PosterComposer {
    settings: PosterSettings,
    text_renderer: Box<dyn TextRenderer>,
    cancellation: Option<CancellationToken>,
}

impl PosterComposer {
    /// Create a composer with the default (no-op) typography collaborator.
    pub fn new(settings: PosterSettings) -> Self {
        Self {
            settings,
            text_renderer: Box::new(NoOpTextRenderer),
            cancellation: None,
        }
    }

    /// Replace the typography collaborator.
    #[must_use]
    pub fn with_text_renderer(mut self, renderer: Box<dyn TextRenderer>) -> Self {
        self.text_renderer = renderer;
        self
    }

    /// Attach a cancellation token, honoured by the extraction retry loop.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The settings this composer was built with.
    pub fn settings(&self) -> &PosterSettings {
        &self.settings
    }

    /// Run the full pipeline and return the encoded poster.
    ///
    /// When extraction is enabled and a video path is given, the pipeline
    /// runs extractor → letterbox detector → aspect fill → brightness over
    /// the decoded frame; otherwise it starts from a blank transparent
    /// canvas at the fallback dimensions. Either way the canvas then
    /// receives the overlay tint, the optional graphic, the typography
    /// pass, and the final encode.
    ///
    /// # Errors
    ///
    /// The first terminal stage failure short-circuits the rest and is
    /// returned as-is; intermediate buffers are dropped on every path.
    pub fn compose<S, R>(
        &self,
        source: &mut S,
        video_path: Option<&Path>,
        info: &EpisodeInfo,
        rng: &mut R,
    ) -> Result<EncodedImage, PosterError>
    where
        S: FrameSource,
        R: Rng + ?Sized,
    {
        self.compose_with_report(source, video_path, info, rng)
            .map(|(encoded, _)| encoded)
    }

    /// Like [`compose`](PosterComposer::compose), also returning a
    /// [`ComposeReport`] with the selected frame's quality metrics.
    pub fn compose_with_report<S, R>(
        &self,
        source: &mut S,
        video_path: Option<&Path>,
        info: &EpisodeInfo,
        rng: &mut R,
    ) -> Result<(EncodedImage, ComposeReport), PosterError>
    where
        S: FrameSource,
        R: Rng + ?Sized,
    {
        let mut report = ComposeReport::default();

        // Stage 1: source canvas, extracted or blank.
        let mut canvas: RgbaImage = match video_path {
            Some(path) if self.settings.extract_poster => {
                let mut options = self.settings.extract_options();
                if let Some(token) = &self.cancellation {
                    options = options.with_cancellation(token.clone());
                }

                let best = extract_best_frame(source, path, &options, rng)?;
                report.frame_quality = Some(best.quality);

                let mut frame = best.image;
                if self.settings.enable_letterbox_detection {
                    frame = crop_letterbox(frame, &self.settings.letterbox_options());
                }
                frame = apply_fill(frame, &self.settings.fill_spec());

                let mut rgba = frame.into_rgba8();
                brighten_in_place(&mut rgba, self.settings.brighten_hdr_pct);
                rgba
            }
            _ => {
                log::debug!(
                    "Extraction disabled or no source, starting from blank {}x{} canvas",
                    self.settings.fallback_width,
                    self.settings.fallback_height,
                );
                RgbaImage::new(self.settings.fallback_width, self.settings.fallback_height)
            }
        };

        // Stage 2: overlay tint.
        apply_overlay(&mut canvas, &self.settings.overlay);

        // Stage 3: static graphic inside the safe area.
        if let Some(graphic) = &self.settings.graphic {
            composite_graphic(&mut canvas, graphic, self.settings.safe_area_pct)?;
        }

        // Stage 4: typography collaborator.
        let canvas = self.text_renderer.render_text(canvas, info)?;

        report.canvas_width = canvas.width();
        report.canvas_height = canvas.height();

        // Stage 5: final encode.
        let encoded = encode_poster(&DynamicImage::ImageRgba8(canvas), self.settings.file_type)?;
        Ok((encoded, report))
    }

    /// Run the pipeline and write the encoded bytes to `output`.
    ///
    /// The extension of `output` is not consulted; the configured
    /// [`PosterFormat`] decides the encoding.
    pub fn compose_to_file<S, R>(
        &self,
        source: &mut S,
        video_path: Option<&Path>,
        info: &EpisodeInfo,
        rng: &mut R,
        output: &Path,
    ) -> Result<(), PosterError>
    where
        S: FrameSource,
        R: Rng + ?Sized,
    {
        let encoded = self.compose(source, video_path, info, rng)?;
        std::fs::write(output, &encoded.bytes)?;
        log::debug!(
            "Wrote {} byte(s) of {} to {}",
            encoded.bytes.len(),
            encoded.mime(),
            output.display()
        );
        Ok(())
    }
}
