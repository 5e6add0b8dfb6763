//! Render Invocation - Single Call Into the Synthesis Engine

use image::DynamicImage;
use thiserror::Error;

use crate::template::Configuration;

/// Ordered pages returned by one render call; index order is page order.
pub type PageSequence = Vec<DynamicImage>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter {key}: {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("Parameter validation failed: {0}")]
    ValidationFailed(String),

    #[error("Renderer failure: {0}")]
    Engine(String),
}

/// A handwriting synthesis engine.
///
/// Pagination, defaults for absent parameters and stroke synthesis all
/// belong to the implementation.
pub trait TextRenderer {
    fn render(&self, text: &str, config: &Configuration) -> Result<PageSequence, RenderError>;
}

/// Call the renderer exactly once and hand back its pages untouched.
pub fn render_pages(
    renderer: &dyn TextRenderer,
    text: &str,
    config: &Configuration,
) -> Result<PageSequence, RenderError> {
    log::debug!("Rendering {} character(s)", text.chars().count());
    let pages = renderer.render(text, config)?;
    log::info!("Renderer produced {} page(s)", pages.len());
    Ok(pages)
}
