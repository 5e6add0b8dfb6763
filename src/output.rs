//! Output Writer - Timestamped Batches of Numbered Pages
//!
//! Each run writes into `<project>/out/<seconds><micros>/`. Two runs that
//! read the same microsecond share a directory; nothing else guards against
//! that.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat};
use serde::Serialize;

use crate::pipeline::PipelineError;
use crate::project::{Project, OUTPUT_FORMAT};

/// Wall-clock source for batch names.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// `"%.6f"` of the Unix time with the decimal point dropped.
///
/// Instants before the epoch keep `"%.6f"`'s sign-and-magnitude form, so
/// -1.5 s is `-1500000`.
pub fn batch_dir_name(at: DateTime<Utc>) -> String {
    // Leap seconds report up to 1_999_999 µs.
    let micros = at.timestamp_subsec_micros().min(999_999);
    let total = at.timestamp() as i128 * 1_000_000 + micros as i128;
    let sign = if total < 0 { "-" } else { "" };
    let magnitude = total.unsigned_abs();
    format!("{}{}{:06}", sign, magnitude / 1_000_000, magnitude % 1_000_000)
}

pub fn page_file_name(index: usize) -> String {
    format!("{}.{}", index, OUTPUT_FORMAT)
}

/// One run's output directory and the pages written into it, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputBatch {
    pub dir: PathBuf,
    pub created_at: DateTime<Utc>,
    pub files: Vec<PathBuf>,
}

impl OutputBatch {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Successfully generated {} images! See folder {}.",
            self.len(),
            self.dir.display()
        )
    }

    /// Print the summary unless `quiet`. Never touches the filesystem.
    pub fn report(&self, quiet: bool, out: &mut impl Write) -> io::Result<()> {
        if quiet {
            return Ok(());
        }
        writeln!(out, "{}", self.summary())
    }
}

pub struct OutputWriter {
    clock: Box<dyn Clock>,
}

impl OutputWriter {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Create (idempotently) the batch directory for the current instant.
    pub fn prepare_dir(&self, project: &Project) -> Result<(PathBuf, DateTime<Utc>), PipelineError> {
        let created_at = self.clock.now();
        let dir = project.output_root().join(batch_dir_name(created_at));
        create_dir(&dir)?;
        log::debug!("Output directory {}", dir.display());
        Ok((dir, created_at))
    }

    /// Write every page as `<index>.png`. A failed page aborts the batch;
    /// earlier pages stay on disk.
    pub fn persist(&self, project: &Project, pages: &[DynamicImage]) -> Result<OutputBatch, PipelineError> {
        let (dir, created_at) = self.prepare_dir(project)?;

        let mut files = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            let path = dir.join(page_file_name(index));
            write_page(page, &path)?;
            files.push(path);
        }

        log::info!("Wrote {} page(s) to {}", files.len(), dir.display());
        Ok(OutputBatch {
            dir,
            created_at,
            files,
        })
    }
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

pub fn create_dir(dir: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(dir).map_err(|source| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_page(page: &DynamicImage, path: &Path) -> Result<(), PipelineError> {
    page.save_with_format(path, ImageFormat::Png)
        .map_err(|source| PipelineError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}
