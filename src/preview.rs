//! Layout Preview Renderer
//!
//! Built-in `TextRenderer` used by the CLI. It owns the engine defaults,
//! validates the resolved parameters and paginates the text, then emits one
//! copy of the background per page. It does not draw strokes.

use image::DynamicImage;
use serde::Serialize;
use serde_yaml_ng::Value;

use crate::render::{PageSequence, RenderError, TextRenderer};
use crate::template::{Configuration, ParamKey, Parameters, Side};
use crate::validation::{PageSize, Validator};

pub const DEFAULT_WORD_SPACING: f64 = 0.0;
pub const DEFAULT_COLOR: &str = "black";
pub const DEFAULT_PERTURB_THETA_SIGMA: f64 = 0.07;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margin {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Fully populated engine parameters. Only the renderer builds these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineParams {
    pub margin: Margin,
    pub line_spacing: f64,
    pub font_size: f64,
    pub word_spacing: f64,
    pub color: String,
    pub line_spacing_sigma: f64,
    pub font_size_sigma: f64,
    pub word_spacing_sigma: f64,
    pub perturb_x_sigma: f64,
    pub perturb_y_sigma: f64,
    pub perturb_theta_sigma: f64,
}

impl EngineParams {
    /// Fill in engine defaults for every absent optional key.
    ///
    /// Margins, `line_spacing` and `font_size` have no default.
    pub fn resolve(params: &Parameters) -> Result<Self, RenderError> {
        let margin = Margin {
            left: required_margin(params, Side::Left)?,
            right: required_margin(params, Side::Right)?,
            top: required_margin(params, Side::Top)?,
            bottom: required_margin(params, Side::Bottom)?,
        };
        let line_spacing = required(params, ParamKey::LineSpacing)?;
        let font_size = required(params, ParamKey::FontSize)?;

        let sigma = |key, fallback| Ok::<_, RenderError>(optional(params, key)?.unwrap_or(fallback));

        Ok(Self {
            margin,
            line_spacing,
            font_size,
            word_spacing: optional(params, ParamKey::WordSpacing)?.unwrap_or(DEFAULT_WORD_SPACING),
            color: color(params)?,
            line_spacing_sigma: sigma(ParamKey::LineSpacingSigma, font_size / 32.0)?,
            font_size_sigma: sigma(ParamKey::FontSizeSigma, font_size / 64.0)?,
            word_spacing_sigma: sigma(ParamKey::WordSpacingSigma, font_size / 32.0)?,
            perturb_x_sigma: sigma(ParamKey::PerturbXSigma, font_size / 32.0)?,
            perturb_y_sigma: sigma(ParamKey::PerturbYSigma, font_size / 32.0)?,
            perturb_theta_sigma: sigma(ParamKey::PerturbThetaSigma, DEFAULT_PERTURB_THETA_SIGMA)?,
        })
    }

    pub fn sigmas(&self) -> [(&'static str, f64); 6] {
        [
            ("line_spacing_sigma", self.line_spacing_sigma),
            ("font_size_sigma", self.font_size_sigma),
            ("word_spacing_sigma", self.word_spacing_sigma),
            ("perturb_x_sigma", self.perturb_x_sigma),
            ("perturb_y_sigma", self.perturb_y_sigma),
            ("perturb_theta_sigma", self.perturb_theta_sigma),
        ]
    }
}

fn number(key: &str, value: &Value) -> Result<f64, RenderError> {
    value.as_f64().ok_or_else(|| RenderError::InvalidParameter {
        key: key.to_string(),
        reason: format!("expected a number, found {:?}", value),
    })
}

fn optional(params: &Parameters, key: ParamKey) -> Result<Option<f64>, RenderError> {
    params.param(key).map(|v| number(key.as_str(), v)).transpose()
}

fn required(params: &Parameters, key: ParamKey) -> Result<f64, RenderError> {
    optional(params, key)?.ok_or_else(|| RenderError::MissingParameter(key.as_str().to_string()))
}

fn required_margin(params: &Parameters, side: Side) -> Result<f64, RenderError> {
    let key = format!("margin.{}", side.as_str());
    match params.margin(side) {
        Some(value) => number(&key, value),
        None => Err(RenderError::MissingParameter(key)),
    }
}

fn color(params: &Parameters) -> Result<String, RenderError> {
    match params.param(ParamKey::Color) {
        None => Ok(DEFAULT_COLOR.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(RenderError::InvalidParameter {
            key: ParamKey::Color.as_str().to_string(),
            reason: format!("expected a color name or code, found {:?}", other),
        }),
    }
}

/// How a text splits into lines and pages at the resolved metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub chars_per_line: usize,
    pub lines_per_page: usize,
    pub pages: Vec<Vec<String>>,
}

impl Layout {
    /// Every glyph is laid out on a `font_size + word_spacing` advance.
    /// Hard line breaks start a new line; an empty text is one blank page.
    pub fn compute(text: &str, params: &EngineParams, page: PageSize) -> Self {
        let m = &params.margin;
        let usable_width = page.width as f64 - m.left - m.right;
        let usable_height = page.height as f64 - m.top - m.bottom;

        // Counts never exceed what the text needs, whatever the metrics.
        let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0).max(1);
        let advance = params.font_size + params.word_spacing;
        let chars_per_line = if advance > 0.0 {
            ((usable_width / advance).floor() as usize).clamp(1, longest)
        } else {
            1
        };
        let lines_fit = ((usable_height - params.font_size).max(0.0) / params.line_spacing)
            .floor() as usize;

        let mut lines = vec![];
        for paragraph in text.lines() {
            let chars: Vec<char> = paragraph.chars().collect();
            if chars.is_empty() {
                lines.push(String::new());
                continue;
            }
            lines.extend(chars.chunks(chars_per_line).map(|c| c.iter().collect::<String>()));
        }

        let lines_per_page = lines_fit.saturating_add(1).clamp(1, lines.len().max(1));
        let mut pages: Vec<Vec<String>> = lines
            .chunks(lines_per_page)
            .map(|chunk| chunk.to_vec())
            .collect();
        if pages.is_empty() {
            pages.push(vec![]);
        }

        Self {
            chars_per_line,
            lines_per_page,
            pages,
        }
    }
}

#[derive(Default)]
pub struct PreviewRenderer {
    validator: Validator,
}

impl PreviewRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextRenderer for PreviewRenderer {
    fn render(&self, text: &str, config: &Configuration) -> Result<PageSequence, RenderError> {
        let params = EngineParams::resolve(&config.parameters)?;
        let page = PageSize {
            width: config.background.width(),
            height: config.background.height(),
        };

        let result = self.validator.validate(&params, page);
        for warning in result.warnings() {
            log::warn!("{}: {}", warning.rule, warning.message);
        }
        if !result.valid {
            let messages: Vec<_> = result
                .errors()
                .map(|v| format!("{}: {}", v.rule, v.message))
                .collect();
            return Err(RenderError::ValidationFailed(messages.join("; ")));
        }

        let layout = Layout::compute(text, &params, page);
        log::debug!(
            "Layout: {} char(s)/line, {} line(s)/page, {} page(s)",
            layout.chars_per_line,
            layout.lines_per_page,
            layout.pages.len()
        );

        let sheet = DynamicImage::ImageRgba8(config.background.to_rgba8());
        Ok(layout.pages.iter().map(|_| sheet.clone()).collect())
    }
}
