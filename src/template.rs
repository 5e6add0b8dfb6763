//! Template Loader - Sparse Parameters Plus Decoded Resources
//!
//! The loader copies whatever the template document holds and nothing
//! more. An absent key means "let the renderer decide"; the loader never
//! fills in numbers of its own and never checks ranges or types.

use image::DynamicImage;
use serde::Serialize;
use serde_yaml_ng::{Mapping, Value};

use crate::decode::{FontDecoder, FontFace, ImageDecoder};
use crate::pipeline::PipelineError;
use crate::project::{read_project_file, Project};

/// Keys under which the decoded resources are injected.
pub const BACKGROUND_KEY: &str = "background";
pub const FONT_KEY: &str = "font";

/// Parameter keys the renderer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Margin,
    LineSpacing,
    FontSize,
    WordSpacing,
    Color,
    LineSpacingSigma,
    FontSizeSigma,
    WordSpacingSigma,
    PerturbXSigma,
    PerturbYSigma,
    PerturbThetaSigma,
}

impl ParamKey {
    pub const ALL: [ParamKey; 11] = [
        ParamKey::Margin,
        ParamKey::LineSpacing,
        ParamKey::FontSize,
        ParamKey::WordSpacing,
        ParamKey::Color,
        ParamKey::LineSpacingSigma,
        ParamKey::FontSizeSigma,
        ParamKey::WordSpacingSigma,
        ParamKey::PerturbXSigma,
        ParamKey::PerturbYSigma,
        ParamKey::PerturbThetaSigma,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParamKey::Margin => "margin",
            ParamKey::LineSpacing => "line_spacing",
            ParamKey::FontSize => "font_size",
            ParamKey::WordSpacing => "word_spacing",
            ParamKey::Color => "color",
            ParamKey::LineSpacingSigma => "line_spacing_sigma",
            ParamKey::FontSizeSigma => "font_size_sigma",
            ParamKey::WordSpacingSigma => "word_spacing_sigma",
            ParamKey::PerturbXSigma => "perturb_x_sigma",
            ParamKey::PerturbYSigma => "perturb_y_sigma",
            ParamKey::PerturbThetaSigma => "perturb_theta_sigma",
        }
    }
}

/// Sides of the `margin` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
        }
    }
}

/// Only the keys present in the template document, keys and values
/// untouched. Keys need not be strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Parameters {
    entries: Mapping,
}

impl Parameters {
    /// Parse a template document. An empty document is an empty set;
    /// any top-level value other than a mapping is rejected.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml_ng::Error> {
        let doc: Value = serde_yaml_ng::from_str(source)?;
        match doc {
            Value::Null => Ok(Self::default()),
            other => Ok(Self {
                entries: serde_yaml_ng::from_value(other)?,
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn param(&self, key: ParamKey) -> Option<&Value> {
        self.get(key.as_str())
    }

    /// Value of `margin.<side>`, if both levels are present.
    pub fn margin(&self, side: Side) -> Option<&Value> {
        self.param(ParamKey::Margin)?
            .as_mapping()?
            .get(side.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// JSON view of the parameters. Fails on keys JSON cannot hold.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Everything the renderer receives besides the text.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub parameters: Parameters,
    pub background: DynamicImage,
    pub font: FontFace,
}

/// Builds a `Configuration` from a project directory.
pub struct TemplateLoader<'a> {
    images: &'a dyn ImageDecoder,
    fonts: &'a dyn FontDecoder,
}

impl<'a> TemplateLoader<'a> {
    pub fn new(images: &'a dyn ImageDecoder, fonts: &'a dyn FontDecoder) -> Self {
        Self { images, fonts }
    }

    pub fn load(&self, project: &Project) -> Result<Configuration, PipelineError> {
        let template_path = project.template_path();
        let source = read_project_file(&template_path)?;
        let mut parameters =
            Parameters::from_yaml(&source).map_err(|source| PipelineError::Parse {
                path: template_path.clone(),
                source,
            })?;

        for reserved in [BACKGROUND_KEY, FONT_KEY] {
            if parameters.remove(reserved).is_some() {
                log::warn!(
                    "Key '{}' in {} is replaced by the project's {} file",
                    reserved,
                    template_path.display(),
                    reserved
                );
            }
        }

        let background = self.images.decode_image(&project.background_path()?)?;
        let font = self.fonts.decode_font(&project.font_path()?)?;

        log::info!(
            "Loaded template {} with {} parameter(s)",
            template_path.display(),
            parameters.len()
        );
        log::debug!("Template keys: {:?}", parameters.keys().collect::<Vec<_>>());

        Ok(Configuration {
            parameters,
            background,
            font,
        })
    }
}
