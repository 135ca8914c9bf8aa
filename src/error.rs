//! Error types for the `postergen` crate.
//!
//! This module defines [`PosterError`], the unified error type returned by all
//! fallible operations in the crate. Errors carry rich context to aid debugging,
//! including file paths, attempt counts, and upstream error messages.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `postergen` operations.
///
/// Every public method that can fail returns `Result<T, PosterError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
///
/// Recoverable conditions never surface here: a malformed aspect-ratio
/// string falls back to 16:9 with a warning, and per-attempt decode errors
/// are retried inside the extractor. Only terminal failures propagate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PosterError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the decoder.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// A required input was missing or structurally invalid. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A candidate frame could not be decoded. Retried per attempt inside
    /// the extraction loop; surfaces only when every attempt failed.
    #[error("Failed to decode video frame: {0}")]
    DecodeError(String),

    /// A decoded frame could not be analysed (degenerate dimensions,
    /// corrupt pixel data). The attempt is skipped and retried.
    #[error("Failed to analyse candidate frame: {0}")]
    AnalysisError(String),

    /// The requested timestamp exceeds the media duration.
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(Duration),

    /// Extraction exhausted its retry budget without a single usable frame.
    #[error("No usable frame found after {attempts} attempt(s)")]
    NoUsableFrame {
        /// How many extraction attempts were made.
        attempts: u32,
    },

    /// Final image encoding failed. Terminal for the current request.
    #[error("Poster encoding error: {0}")]
    EncodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during pixel processing.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for PosterError {
    fn from(error: FfmpegError) -> Self {
        PosterError::FfmpegError(error.to_string())
    }
}
