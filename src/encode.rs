//! Final poster encoding.
//!
//! The composited canvas leaves the pipeline as an [`EncodedImage`]: an
//! in-memory byte buffer plus a format tag. Callers either hand the bytes
//! to the host application or write them to disk themselves; the pipeline
//! never owns output paths.

use image::{
    DynamicImage,
    codecs::{
        gif::GifEncoder,
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType as PngFilterType, PngEncoder},
        webp::WebPEncoder,
    },
};

use crate::error::PosterError;

/// JPEG quality used for poster output. High enough that artefacts stay
/// invisible at poster sizes, low enough to keep files reasonable.
const JPEG_QUALITY: u8 = 90;

/// Supported poster output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PosterFormat {
    /// Lossy JPEG at quality 90. No alpha.
    #[default]
    Jpeg,
    /// Lossless PNG at best compression.
    Png,
    /// Lossless WebP.
    Webp,
    /// Single-frame GIF.
    Gif,
}

impl PosterFormat {
    /// Parse a format name or file extension. Accepts any case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(PosterFormat::Jpeg),
            "png" => Some(PosterFormat::Png),
            "webp" => Some(PosterFormat::Webp),
            "gif" => Some(PosterFormat::Gif),
            _ => None,
        }
    }

    /// The canonical file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            PosterFormat::Jpeg => "jpg",
            PosterFormat::Png => "png",
            PosterFormat::Webp => "webp",
            PosterFormat::Gif => "gif",
        }
    }

    /// The MIME type for this format.
    pub fn mime(self) -> &'static str {
        match self {
            PosterFormat::Jpeg => "image/jpeg",
            PosterFormat::Png => "image/png",
            PosterFormat::Webp => "image/webp",
            PosterFormat::Gif => "image/gif",
        }
    }
}

/// The terminal pipeline artifact: encoded bytes plus their format tag.
///
/// The caller owns the buffer and is the only party responsible for it.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// The encoded image data.
    pub bytes: Vec<u8>,
    /// Which format the bytes are encoded in.
    pub format: PosterFormat,
}

impl EncodedImage {
    /// The MIME type of the encoded data.
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }
}

/// Encode the canvas into the requested format.
///
/// JPEG is encoded at quality 90 from an alpha-free copy; PNG uses best
/// compression (lossless); WebP is lossless; GIF is written as a single
/// frame.
///
/// # Errors
///
/// Returns [`PosterError::EncodeError`] when the underlying encoder fails.
/// Encoding failures are terminal for the request.
pub fn encode_poster(
    image: &DynamicImage,
    format: PosterFormat,
) -> Result<EncodedImage, PosterError> {
    log::debug!(
        "Encoding {}x{} poster as {format:?}",
        image.width(),
        image.height()
    );

    let mut bytes: Vec<u8> = Vec::new();

    match format {
        PosterFormat::Jpeg => {
            // JPEG has no alpha channel; flatten first.
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
            rgb.write_with_encoder(encoder)
                .map_err(|error| PosterError::EncodeError(error.to_string()))?;
        }
        PosterFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, PngFilterType::Adaptive);
            image
                .write_with_encoder(encoder)
                .map_err(|error| PosterError::EncodeError(error.to_string()))?;
        }
        PosterFormat::Webp => {
            let encoder = WebPEncoder::new_lossless(&mut bytes);
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_with_encoder(encoder)
                .map_err(|error| PosterError::EncodeError(error.to_string()))?;
        }
        PosterFormat::Gif => {
            let mut encoder = GifEncoder::new_with_speed(&mut bytes, 10);
            let frame = image::Frame::new(image.to_rgba8());
            encoder
                .encode_frame(frame)
                .map_err(|error| PosterError::EncodeError(error.to_string()))?;
        }
    }

    Ok(EncodedImage { bytes, format })
}
