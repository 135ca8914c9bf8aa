//! Frame decoding.
//!
//! This module defines [`FrameSource`], the seam between the poster pipeline
//! and the video decoding engine, and [`FfmpegFrameSource`], the production
//! implementation backed by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! The extractor only ever needs two capabilities from a decoder: the media
//! duration, and one decoded frame at one timestamp. Keeping the seam that
//! narrow lets tests drive the whole pipeline with a stub source that
//! synthesises frames in memory.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::error::PosterError;

/// A source of decoded video frames.
///
/// Implementations must be safely callable from worker-pool contexts; each
/// call is self-contained and no state is shared between invocations.
///
/// # Example
///
/// ```no_run
/// use std::{path::Path, time::Duration};
///
/// use postergen::{FfmpegFrameSource, FrameSource, PosterError};
///
/// let mut source = FfmpegFrameSource::new();
/// let duration = source.duration(Path::new("episode.mkv"))?;
/// let frame = source.frame_at(Path::new("episode.mkv"), duration / 2)?;
/// frame.save("midpoint.png")?;
/// # Ok::<(), PosterError>(())
/// ```
pub trait FrameSource {
    /// Total duration of the media at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PosterError::FileOpen`] if the file cannot be opened.
    fn duration(&mut self, path: &Path) -> Result<Duration, PosterError>;

    /// Decode a single frame at (or just after) `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`PosterError::NoVideoStream`] if the file has no video,
    /// [`PosterError::InvalidTimestamp`] if the timestamp exceeds the
    /// duration, or [`PosterError::DecodeError`] if decoding fails.
    fn frame_at(&mut self, path: &Path, timestamp: Duration)
    -> Result<DynamicImage, PosterError>;
}

/// FFmpeg-backed [`FrameSource`].
///
/// Each call opens a fresh demuxer, seeks to the nearest keyframe before
/// the target timestamp, decodes forward until the target is reached, and
/// converts the frame to RGB. The demuxer and decoder are dropped when the
/// call returns, so concurrent pipeline runs never share decoder state.
#[derive(Debug, Default)]
pub struct FfmpegFrameSource;

impl FfmpegFrameSource {
    /// Create a new FFmpeg frame source.
    pub fn new() -> Self {
        Self
    }

    fn open_input(path: &Path) -> Result<Input, PosterError> {
        let canonical_path: PathBuf = path.to_path_buf();

        // Initialise ffmpeg (safe to call multiple times).
        ffmpeg_next::init().map_err(|error| PosterError::FileOpen {
            path: canonical_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        ffmpeg_next::format::input(&path).map_err(|error| PosterError::FileOpen {
            path: canonical_path,
            reason: error.to_string(),
        })
    }

    fn container_duration(input_context: &Input) -> Duration {
        let duration_microseconds = input_context.duration();
        if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn duration(&mut self, path: &Path) -> Result<Duration, PosterError> {
        let input_context = Self::open_input(path)?;
        Ok(Self::container_duration(&input_context))
    }

    fn frame_at(
        &mut self,
        path: &Path,
        timestamp: Duration,
    ) -> Result<DynamicImage, PosterError> {
        log::debug!("Decoding frame at {:?} from {}", timestamp, path.display());

        let mut input_context = Self::open_input(path)?;

        let duration = Self::container_duration(&input_context);
        if !duration.is_zero() && timestamp > duration {
            return Err(PosterError::InvalidTimestamp(timestamp));
        }

        let video_stream_index = input_context
            .streams()
            .best(Type::Video)
            .map(|stream| stream.index())
            .ok_or(PosterError::NoVideoStream)?;

        // Build a fresh decoder from the stream parameters.
        let stream = input_context
            .stream(video_stream_index)
            .ok_or(PosterError::NoVideoStream)?;
        let time_base = stream.time_base();
        let codec_parameters = stream.parameters();
        let decoder_context = CodecContext::from_parameters(codec_parameters)?;
        let mut decoder = decoder_context.decoder().video()?;

        let target_width = decoder.width();
        let target_height = decoder.height();

        // Set up the pixel-format converter (source format → RGB24).
        let mut scaler = ScalingContext::get(
            decoder.format(),
            target_width,
            target_height,
            Pixel::RGB24,
            target_width,
            target_height,
            ScalingFlags::BILINEAR,
        )?;

        // Seek container-level in AV_TIME_BASE (microseconds) to the nearest
        // keyframe before the target, then decode forward.
        let seek_timestamp = timestamp.as_micros() as i64;
        input_context.seek(seek_timestamp, ..seek_timestamp)?;

        let target_seconds = timestamp.as_secs_f64();
        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        for (stream, packet) in input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame.pts().unwrap_or(0);
                let frame_seconds = pts_to_seconds(pts, time_base);

                if frame_seconds >= target_seconds {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    return convert_frame_to_image(&rgb_frame, target_width, target_height);
                }
            }
        }

        // Flush the decoder.
        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let pts = decoded_frame.pts().unwrap_or(0);
            if pts_to_seconds(pts, time_base) >= target_seconds {
                scaler.run(&decoded_frame, &mut rgb_frame)?;
                return convert_frame_to_image(&rgb_frame, target_width, target_height);
            }
        }

        Err(PosterError::DecodeError(format!(
            "Could not decode a frame at {target_seconds:.2}s from the video stream"
        )))
    }
}

/// Rescale a PTS value from stream time base to seconds.
fn pts_to_seconds(pts: i64, time_base: ffmpeg_next::Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert a scaled RGB24 video frame to an [`image::DynamicImage`].
fn convert_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, PosterError> {
    let buffer = frame_to_rgb_buffer(rgb_frame, width, height);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        PosterError::DecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}

/// Copy pixel data from an FFmpeg video frame into a tightly-packed RGB buffer.
///
/// FFmpeg rows may carry alignment padding; the `image` crate expects tight
/// packing, so padded rows are copied one at a time.
fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}
