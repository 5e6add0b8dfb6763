//! Contract Invariant Tests
//!
//! These tests verify the guarantees of one pipeline run.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use image::{DynamicImage, RgbaImage};
use tempfile::TempDir;

use handwrite_core::{
    decode::{DecodeError, FontDecoder, FontFace},
    Configuration, FixedClock, HandwritingPipeline, PageSequence, ParamKey, PipelineError,
    PreviewRenderer, Project, RenderError, TextRenderer,
};

#[derive(Default)]
struct Calls {
    texts: Vec<String>,
    parameters: Vec<serde_json::Value>,
    background_sizes: Vec<(u32, u32)>,
}

/// Returns `pages` images whose widths are 1, 2, 3, ... so order is visible.
struct RecordingRenderer {
    pages: u32,
    calls: Rc<RefCell<Calls>>,
}

impl TextRenderer for RecordingRenderer {
    fn render(&self, text: &str, config: &Configuration) -> Result<PageSequence, RenderError> {
        let mut calls = self.calls.borrow_mut();
        calls.texts.push(text.to_string());
        calls.parameters.push(config.parameters.to_json().unwrap());
        calls
            .background_sizes
            .push((config.background.width(), config.background.height()));
        Ok((1..=self.pages)
            .map(|w| DynamicImage::ImageRgba8(RgbaImage::new(w, 1)))
            .collect())
    }
}

struct FailingRenderer;

impl TextRenderer for FailingRenderer {
    fn render(&self, _text: &str, _config: &Configuration) -> Result<PageSequence, RenderError> {
        Err(RenderError::Engine("stroke synthesis crashed".to_string()))
    }
}

/// Accepts any file and reports a 1000-unit em.
struct StubFontDecoder;

impl FontDecoder for StubFontDecoder {
    fn decode_font(&self, path: &Path) -> Result<FontFace, DecodeError> {
        let data = fs::read(path).map_err(|e| DecodeError::font(path, e))?;
        Ok(FontFace {
            path: path.to_path_buf(),
            data: Arc::new(data),
            family: Some("Stub".to_string()),
            units_per_em: 1000,
            glyph_count: 1,
            base_size: 10,
        })
    }
}

fn at(secs: i64, micros: u32) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, micros * 1_000).unwrap()
}

fn create_project(text: &str, template: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("content.txt"), text).unwrap();
    fs::write(dir.path().join("template.yml"), template).unwrap();
    fs::write(dir.path().join("font.ttf"), b"stub font").unwrap();
    RgbaImage::from_pixel(600, 800, image::Rgba([250, 250, 240, 255]))
        .save(dir.path().join("background.png"))
        .unwrap();
    dir
}

fn create_pipeline(renderer: impl TextRenderer + 'static, clock: DateTime<Utc>) -> HandwritingPipeline {
    HandwritingPipeline::new(Box::new(renderer))
        .with_decoders(Box::new(handwrite_core::decode::RasterImageDecoder), Box::new(StubFontDecoder))
        .with_clock(Box::new(FixedClock(clock)))
}

fn recording(pages: u32) -> (RecordingRenderer, Rc<RefCell<Calls>>) {
    let calls = Rc::new(RefCell::new(Calls::default()));
    (
        RecordingRenderer {
            pages,
            calls: calls.clone(),
        },
        calls,
    )
}

#[test]
fn invariant_hello_scenario() {
    let dir = create_project("hello", "font_size: 100\n");
    let (renderer, calls) = recording(2);
    let pipeline = create_pipeline(renderer, at(1_700_000_000, 123_456));

    let batch = pipeline.run(&Project::new(dir.path())).unwrap();

    let expected_dir = dir.path().join("out").join("1700000000123456");
    assert_eq!(batch.dir, expected_dir);
    assert!(expected_dir.join("0.png").is_file());
    assert!(expected_dir.join("1.png").is_file());
    assert!(!expected_dir.join("2.png").exists());

    // Only the key present in the template reaches the renderer
    let calls = calls.borrow();
    assert_eq!(calls.parameters.len(), 1);
    assert_eq!(calls.parameters[0], serde_json::json!({"font_size": 100}));
    assert_eq!(calls.background_sizes[0], (600, 800));
    assert_eq!(calls.texts[0], "hello");
}

#[test]
fn invariant_page_order_is_file_order() {
    let dir = create_project("text", "{}\n");
    let (renderer, _) = recording(5);
    let batch = create_pipeline(renderer, at(1, 0))
        .run(&Project::new(dir.path()))
        .unwrap();

    let entries = fs::read_dir(&batch.dir).unwrap().count();
    assert_eq!(entries, 5);
    assert_eq!(batch.len(), 5);

    for i in 0..5u32 {
        let page = image::open(batch.dir.join(format!("{}.png", i))).unwrap();
        assert_eq!(page.width(), i + 1);
    }
}

#[test]
fn invariant_text_reaches_renderer_unsplit() {
    let text = "line one\nline two\n\n第三行\n";
    let dir = create_project(text, "font_size: 10\n");
    let (renderer, calls) = recording(1);
    create_pipeline(renderer, at(1, 0))
        .run(&Project::new(dir.path()))
        .unwrap();

    assert_eq!(calls.borrow().texts, vec![text.to_string()]);
}

#[test]
fn invariant_reruns_do_not_overlap() {
    let dir = create_project("hello", "font_size: 100\n");
    let project = Project::new(dir.path());

    let (first_renderer, _) = recording(2);
    let first = create_pipeline(first_renderer, at(1_700_000_000, 1))
        .run(&project)
        .unwrap();

    let (second_renderer, _) = recording(3);
    let second = create_pipeline(second_renderer, at(1_700_000_000, 2))
        .run(&project)
        .unwrap();

    assert_ne!(first.dir, second.dir);
    assert!(first.files.iter().all(|f| f.starts_with(&first.dir)));
    assert!(second.files.iter().all(|f| f.starts_with(&second.dir)));
    assert_eq!(fs::read_dir(&first.dir).unwrap().count(), 2);
    assert_eq!(fs::read_dir(&second.dir).unwrap().count(), 3);
}

#[test]
fn invariant_same_instant_reuses_directory() {
    let dir = create_project("hello", "font_size: 100\n");
    let project = Project::new(dir.path());

    let (a, _) = recording(1);
    let (b, _) = recording(1);
    let first = create_pipeline(a, at(42, 0)).run(&project).unwrap();
    let second = create_pipeline(b, at(42, 0)).run(&project).unwrap();

    assert_eq!(first.dir, second.dir);
}

#[test]
fn invariant_absent_sigmas_stay_absent() {
    let template = "margin:\n  left: 150\n  right: 150\n  top: 200\n  bottom: 200\nline_spacing: 150\nfont_size: 100\n";
    let dir = create_project("hello", template);
    let (renderer, calls) = recording(1);
    create_pipeline(renderer, at(1, 0))
        .run(&Project::new(dir.path()))
        .unwrap();

    let params = &calls.borrow().parameters[0];
    for key in [
        ParamKey::LineSpacingSigma,
        ParamKey::FontSizeSigma,
        ParamKey::WordSpacingSigma,
        ParamKey::PerturbXSigma,
        ParamKey::PerturbYSigma,
        ParamKey::PerturbThetaSigma,
        ParamKey::WordSpacing,
        ParamKey::Color,
    ] {
        assert!(params.get(key.as_str()).is_none(), "{} should be absent", key.as_str());
    }
    assert_eq!(params["margin"]["top"], 200);
}

#[test]
fn invariant_missing_font_fails_before_output() {
    let dir = create_project("hello", "font_size: 100\n");
    fs::remove_file(dir.path().join("font.ttf")).unwrap();
    let (renderer, calls) = recording(1);

    let err = create_pipeline(renderer, at(1, 0))
        .run(&Project::new(dir.path()))
        .unwrap_err();

    assert!(matches!(err, PipelineError::NoMatchingFile { ref prefix, .. } if prefix == "font"));
    assert!(calls.borrow().texts.is_empty());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn invariant_missing_background_fails_before_output() {
    let dir = create_project("hello", "font_size: 100\n");
    fs::remove_file(dir.path().join("background.png")).unwrap();
    let (renderer, _) = recording(1);

    let err = create_pipeline(renderer, at(1, 0))
        .run(&Project::new(dir.path()))
        .unwrap_err();

    assert!(matches!(err, PipelineError::NoMatchingFile { ref prefix, .. } if prefix == "background"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn invariant_invalid_template_fails_before_render() {
    let dir = create_project("hello", "margin: {left: 1\nfont_size: [\n");
    let (renderer, calls) = recording(1);

    let err = create_pipeline(renderer, at(1, 0))
        .run(&Project::new(dir.path()))
        .unwrap_err();

    assert!(matches!(err, PipelineError::Parse { .. }));
    assert!(err.to_string().contains("template.yml"));
    assert!(calls.borrow().texts.is_empty());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn invariant_missing_text_is_missing_file() {
    let dir = create_project("hello", "font_size: 100\n");
    fs::remove_file(dir.path().join("content.txt")).unwrap();
    let (renderer, _) = recording(1);

    let err = create_pipeline(renderer, at(1, 0))
        .run(&Project::new(dir.path()))
        .unwrap_err();

    match err {
        PipelineError::MissingFile(path) => assert!(path.ends_with("content.txt")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invariant_corrupt_background_is_decode_error() {
    let dir = create_project("hello", "font_size: 100\n");
    fs::write(dir.path().join("background.png"), b"garbage").unwrap();
    let (renderer, _) = recording(1);

    let err = create_pipeline(renderer, at(1, 0))
        .run(&Project::new(dir.path()))
        .unwrap_err();

    assert!(matches!(err, PipelineError::Decode(_)));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn invariant_renderer_error_propagates_unchanged() {
    let dir = create_project("hello", "font_size: 100\n");

    let err = create_pipeline(FailingRenderer, at(1, 0))
        .run(&Project::new(dir.path()))
        .unwrap_err();

    assert!(matches!(err, PipelineError::Render(RenderError::Engine(_))));
    assert_eq!(err.to_string(), "Renderer failure: stroke synthesis crashed");
    assert!(!dir.path().join("out").exists());
}

#[test]
fn invariant_preview_renderer_end_to_end() {
    // 600 - 2*100 = 400px wide at a 100px advance: 4 chars per line.
    // 800 - 2*100 = 600px tall: (600 - 100) / 250 + 1 = 3 lines per page.
    let template = "margin: {left: 100, right: 100, top: 100, bottom: 100}\nline_spacing: 250\nfont_size: 100\n";
    let dir = create_project("abcdefghijklmnop", template);

    let batch = create_pipeline(PreviewRenderer::new(), at(7, 7))
        .run(&Project::new(dir.path()))
        .unwrap();

    assert_eq!(batch.len(), 2);
    let page = image::open(&batch.files[1]).unwrap();
    assert_eq!((page.width(), page.height()), (600, 800));
}

#[test]
fn invariant_preview_renderer_requires_layout_keys() {
    let dir = create_project("hello", "font_size: 100\n");

    let err = create_pipeline(PreviewRenderer::new(), at(1, 0))
        .run(&Project::new(dir.path()))
        .unwrap_err();

    assert!(matches!(err, PipelineError::Render(RenderError::MissingParameter(_))));
    assert!(!dir.path().join("out").exists());
}
