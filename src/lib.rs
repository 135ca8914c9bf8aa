//! # postergen
//!
//! Generate poster images from video files — smart frame selection,
//! letterbox removal, aspect fill, exposure adjustment, and overlay
//! compositing, powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate and the
//! [`image`](https://crates.io/crates/image) crate.
//!
//! The pipeline picks a representative still from a video instead of a
//! fixed timestamp: candidate frames are sampled at random timestamps
//! inside a configurable window, scored for brightness and sharpness, and
//! the best one is promoted. The selected frame then has its black bars
//! removed, is reshaped to the target poster ratio, exposure-corrected,
//! tinted, composited with an optional graphic, and encoded.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use postergen::{
//!     EpisodeInfo, FfmpegFrameSource, FillMode, PosterComposer, PosterFormat, PosterSettings,
//! };
//!
//! let settings = PosterSettings::new()
//!     .with_fill(FillMode::Fit, "16:9")
//!     .with_file_type(PosterFormat::Jpeg);
//!
//! let composer = PosterComposer::new(settings);
//! let mut source = FfmpegFrameSource::new();
//! let poster = composer.compose(
//!     &mut source,
//!     Some(Path::new("episode.mkv")),
//!     &EpisodeInfo::default(),
//!     &mut rand::thread_rng(),
//! )?;
//!
//! std::fs::write("poster.jpg", &poster.bytes)?;
//! # Ok::<(), postergen::PosterError>(())
//! ```
//!
//! ## Pipeline stages
//!
//! 1. **Frame extraction** ([`extract_best_frame`]) — quality-scored random
//!    sampling with bounded retries, early accept, and cancellation.
//! 2. **Letterbox detection** ([`crop_letterbox`]) — edge scanning with a
//!    25% over-crop safety floor.
//! 3. **Aspect fill** ([`apply_fill`]) — Original / Fit (center crop) /
//!    Fill (stretch) against a `"W:H"` target ratio.
//! 4. **Brightness** ([`brighten_in_place`]) — linear HDR exposure gain.
//! 5. **Compositing** ([`PosterComposer`]) — solid or gradient overlay,
//!    safe-area graphic placement, typography hand-off, and encoding to
//!    JPEG/PNG/WEBP/GIF.
//!
//! Every stage consumes and (potentially) replaces the bitmap it receives;
//! ownership transfers on return and superseded buffers are dropped by the
//! stage that replaced them. The pipeline holds no shared mutable state, so
//! callers may run many compositions concurrently.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod brighten;
pub mod compose;
pub mod encode;
pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod fill;
pub mod letterbox;
pub mod overlay;
pub mod progress;
pub mod source;
pub mod text;

pub use brighten::brighten_in_place;
pub use compose::{ComposeReport, PosterComposer, PosterSettings};
pub use encode::{EncodedImage, PosterFormat, encode_poster};
pub use error::PosterError;
pub use extract::{ExtractOptions, FrameQuality, ScoredFrame, extract_best_frame};
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use fill::{FillMode, FillSpec, apply_fill};
pub use letterbox::{CropBounds, LetterboxOptions, crop_letterbox, detect_letterbox};
pub use overlay::{
    GradientDirection, GraphicSpec, HorizontalAlignment, OverlaySpec, VerticalPosition,
    apply_overlay, composite_graphic,
};
pub use progress::CancellationToken;
pub use source::{FfmpegFrameSource, FrameSource};
pub use text::{EpisodeInfo, NoOpTextRenderer, TextRenderer};
