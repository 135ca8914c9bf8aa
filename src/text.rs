//! Typography collaborator seam.
//!
//! Text and logo rendering (fonts, layout, drop shadows) lives outside this
//! crate. The compositor hands the finished canvas to a [`TextRenderer`]
//! and receives it back with text drawn on top; the default implementation
//! draws nothing.

use image::RgbaImage;

use crate::error::PosterError;

/// Episode metadata handed to the typography collaborator.
///
/// All fields are optional; renderers decide what to draw from what is
/// present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeInfo {
    /// Series name, e.g. "Some Show".
    pub series: Option<String>,
    /// Episode title.
    pub title: Option<String>,
    /// Season number.
    pub season: Option<u32>,
    /// Episode number within the season.
    pub episode: Option<u32>,
}

/// Draws text and logos onto a composited canvas.
///
/// Implementations must be [`Send`] and [`Sync`]; the compositor may be
/// driven from worker-pool contexts.
pub trait TextRenderer: Send + Sync {
    /// Render text over the canvas and return it.
    ///
    /// The canvas is passed by value; the renderer owns it for the duration
    /// of the call and hands ownership back on return.
    ///
    /// # Errors
    ///
    /// Renderer-specific failures are terminal for the current request.
    fn render_text(
        &self,
        canvas: RgbaImage,
        info: &EpisodeInfo,
    ) -> Result<RgbaImage, PosterError>;
}

/// The default renderer: returns the canvas untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTextRenderer;

impl TextRenderer for NoOpTextRenderer {
    fn render_text(
        &self,
        canvas: RgbaImage,
        _info: &EpisodeInfo,
    ) -> Result<RgbaImage, PosterError> {
        Ok(canvas)
    }
}
