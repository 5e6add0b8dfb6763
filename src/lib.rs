//! Handwrite Core - Handwriting Project Runner
//!
//! # Contracts
//! 1. Projects Are Read-Only
//! 2. Absent Parameters Belong To The Renderer
//! 3. One Render Call Per Run
//! 4. Page Order Is File Order
//! 5. Failures Before Rendering Leave No Output

pub mod project;
pub mod decode;
pub mod template;
pub mod render;
pub mod validation;
pub mod preview;
pub mod output;
pub mod pipeline;

pub use project::Project;
pub use decode::{DecodeError, FontDecoder, FontFace, ImageDecoder};
pub use template::{Configuration, ParamKey, Parameters, TemplateLoader};
pub use render::{render_pages, PageSequence, RenderError, TextRenderer};
pub use preview::PreviewRenderer;
pub use output::{batch_dir_name, Clock, FixedClock, OutputBatch, OutputWriter, SystemClock};
pub use pipeline::{HandwritingPipeline, PipelineError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
