//! Handwriting Pipeline - Single Entry Point
//!
//! resolve -> load template -> render once -> persist. Every stage runs to
//! completion before the next starts, and nothing is written to disk
//! before the renderer has returned.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::decode::{DecodeError, FontDecoder, ImageDecoder, RasterImageDecoder, TrueTypeFontDecoder};
use crate::output::{Clock, OutputBatch, OutputWriter, SystemClock};
use crate::preview::PreviewRenderer;
use crate::project::Project;
use crate::render::{render_pages, RenderError, TextRenderer};
use crate::template::TemplateLoader;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing project file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("No file named '{prefix}.*' in {}", .dir.display())]
    NoMatchingFile { dir: PathBuf, prefix: String },

    #[error("Template parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write page {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// The handwriting pipeline - owns the engine, the decoders and the clock
pub struct HandwritingPipeline {
    renderer: Box<dyn TextRenderer>,
    images: Box<dyn ImageDecoder>,
    fonts: Box<dyn FontDecoder>,
    writer: OutputWriter,
}

impl HandwritingPipeline {
    pub fn new(renderer: Box<dyn TextRenderer>) -> Self {
        Self {
            renderer,
            images: Box::new(RasterImageDecoder),
            fonts: Box::new(TrueTypeFontDecoder),
            writer: OutputWriter::new(Box::new(SystemClock)),
        }
    }

    pub fn with_decoders(mut self, images: Box<dyn ImageDecoder>, fonts: Box<dyn FontDecoder>) -> Self {
        self.images = images;
        self.fonts = fonts;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.writer = OutputWriter::new(clock);
        self
    }

    /// Run one project end to end and return the written batch.
    ///
    /// Any failure aborts the run. Resolution, parse, decode and render
    /// failures leave no output directory behind.
    pub fn run(&self, project: &Project) -> Result<OutputBatch, PipelineError> {
        log::info!("Running project {}", project.root().display());

        let text = project.read_text()?;
        let config = TemplateLoader::new(self.images.as_ref(), self.fonts.as_ref()).load(project)?;
        let pages = render_pages(self.renderer.as_ref(), &text, &config)?;

        self.writer.persist(project, &pages)
    }

    /// `run`, then print the summary to stdout unless `quiet`.
    pub fn run_and_report(&self, project: &Project, quiet: bool) -> Result<OutputBatch, PipelineError> {
        let batch = self.run(project)?;
        batch
            .report(quiet, &mut io::stdout().lock())
            .map_err(|source| PipelineError::Io {
                path: PathBuf::from("<stdout>"),
                source,
            })?;
        Ok(batch)
    }
}

impl Default for HandwritingPipeline {
    fn default() -> Self {
        Self::new(Box::new(PreviewRenderer::new()))
    }
}
