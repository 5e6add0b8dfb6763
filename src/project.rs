//! Project Resolution - Fixed Four-File Convention
//!
//! A project is a directory holding `content.txt`, `template.yml`,
//! exactly one `font.*` and exactly one `background.*`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::pipeline::PipelineError;

pub const TEXT_FILE: &str = "content.txt";
pub const TEMPLATE_FILE: &str = "template.yml";
pub const FONT_PREFIX: &str = "font";
pub const BACKGROUND_PREFIX: &str = "background";
pub const OUTPUT_DIRECTORY: &str = "out";
pub const OUTPUT_FORMAT: &str = "png";

/// A handwriting project directory. Read-only input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the content file. Existence is not checked here.
    pub fn text_path(&self) -> PathBuf {
        self.root.join(TEXT_FILE)
    }

    /// Path of the template file. Existence is not checked here.
    pub fn template_path(&self) -> PathBuf {
        self.root.join(TEMPLATE_FILE)
    }

    pub fn font_path(&self) -> Result<PathBuf, PipelineError> {
        find_by_prefix(&self.root, FONT_PREFIX)
    }

    pub fn background_path(&self) -> Result<PathBuf, PipelineError> {
        find_by_prefix(&self.root, BACKGROUND_PREFIX)
    }

    pub fn output_root(&self) -> PathBuf {
        self.root.join(OUTPUT_DIRECTORY)
    }

    /// Read the whole content file as UTF-8, unsplit.
    pub fn read_text(&self) -> Result<String, PipelineError> {
        let path = self.text_path();
        read_project_file(&path)
    }
}

/// Read a fixed-name project file, mapping absence to `MissingFile`.
pub(crate) fn read_project_file(path: &Path) -> Result<String, PipelineError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => PipelineError::MissingFile(path.to_path_buf()),
        _ => PipelineError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Find the file named `prefix.<anything>` in `dir`.
///
/// Matches are ordered by file name and the first is returned, so the
/// choice does not depend on the filesystem's listing order. When several
/// files match, the ignored ones are logged.
pub fn find_by_prefix(dir: &Path, prefix: &str) -> Result<PathBuf, PipelineError> {
    let io_err = |source| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let wanted = format!("{}.", prefix);
    let mut matches = vec![];

    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(&wanted) {
            continue;
        }
        // Directories never count as a project resource.
        if entry.path().is_dir() {
            continue;
        }
        matches.push(name.to_string());
    }

    matches.sort();

    let Some(first) = matches.first() else {
        return Err(PipelineError::NoMatchingFile {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        });
    };

    if matches.len() > 1 {
        log::warn!(
            "{} files match '{}*' in {}; using {} and ignoring {:?}",
            matches.len(),
            wanted,
            dir.display(),
            first,
            &matches[1..]
        );
    }

    log::debug!("Resolved '{}*' to {}", wanted, first);
    Ok(dir.join(first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn test_prefix_ignores_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "font.otf");
        let found = find_by_prefix(dir.path(), FONT_PREFIX).unwrap();
        assert_eq!(found, dir.path().join("font.otf"));
    }

    #[test]
    fn test_prefix_requires_dot() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "fonts.ttf");
        touch(dir.path(), "font");
        let err = find_by_prefix(dir.path(), FONT_PREFIX).unwrap_err();
        assert!(matches!(err, PipelineError::NoMatchingFile { .. }));
    }

    #[test]
    fn test_prefix_tie_break_is_lexicographic() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "background.png");
        touch(dir.path(), "background.jpg");
        touch(dir.path(), "background.bmp");
        let found = find_by_prefix(dir.path(), BACKGROUND_PREFIX).unwrap();
        assert_eq!(found, dir.path().join("background.bmp"));
    }

    #[test]
    fn test_prefix_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("font.d")).unwrap();
        touch(dir.path(), "font.ttf");
        let found = find_by_prefix(dir.path(), FONT_PREFIX).unwrap();
        assert_eq!(found, dir.path().join("font.ttf"));
    }

    #[test]
    fn test_prefix_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("nope");
        let err = find_by_prefix(&gone, FONT_PREFIX).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[test]
    fn test_exact_paths_are_not_checked() {
        let dir = TempDir::new().unwrap();
        let project = Project::new(dir.path());
        assert_eq!(project.text_path(), dir.path().join(TEXT_FILE));
        assert_eq!(project.template_path(), dir.path().join(TEMPLATE_FILE));
    }

    #[test]
    fn test_missing_text_file() {
        let dir = TempDir::new().unwrap();
        let err = Project::new(dir.path()).read_text().unwrap_err();
        match err {
            PipelineError::MissingFile(path) => assert_eq!(path, dir.path().join(TEXT_FILE)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_text_is_verbatim() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(TEXT_FILE), "第一行\nsecond line\n").unwrap();
        let text = Project::new(dir.path()).read_text().unwrap();
        assert_eq!(text, "第一行\nsecond line\n");
    }
}
