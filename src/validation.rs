//! Engine Parameter Validation - Rule/Policy Separation
//!
//! Rules produce structured violations against resolved engine parameters.
//! Policy: errors block rendering, warnings are logged and ignored.

use serde::Serialize;

use crate::preview::EngineParams;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations.iter().filter(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations.iter().filter(|v| v.severity == ViolationSeverity::Warning)
    }
}

/// Page the parameters are checked against, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, params: &EngineParams, page: PageSize) -> Vec<ValidationViolation>;
}

/// Smallest glyph size or line pitch the engine lays out, in pixels.
pub const MIN_METRIC_PX: f64 = 1.0;

pub struct PositiveMetricsRule;

impl ValidationRule for PositiveMetricsRule {
    fn name(&self) -> &'static str { "positive_metrics" }

    fn validate(&self, params: &EngineParams, _page: PageSize) -> Vec<ValidationViolation> {
        [("font_size", params.font_size), ("line_spacing", params.line_spacing)]
            .into_iter()
            .filter(|(_, value)| !(value.is_finite() && *value >= MIN_METRIC_PX))
            .map(|(key, value)| ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: format!("{} must be a finite size of at least {}px", key, MIN_METRIC_PX),
                expected: Some(format!(">= {}", MIN_METRIC_PX)),
                actual: Some(value.to_string()),
            })
            .collect()
    }
}

pub struct MarginsFitPageRule;

impl ValidationRule for MarginsFitPageRule {
    fn name(&self) -> &'static str { "margins_fit_page" }

    fn validate(&self, params: &EngineParams, page: PageSize) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        let m = &params.margin;

        if m.left < 0.0 || m.right < 0.0 || m.top < 0.0 || m.bottom < 0.0 {
            violations.push(ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: "Margins must not be negative".to_string(),
                expected: Some(">= 0".to_string()),
                actual: Some(format!("{}/{}/{}/{}", m.left, m.right, m.top, m.bottom)),
            });
        }

        if m.left + m.right >= page.width as f64 {
            violations.push(ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: "Horizontal margins leave no room for text".to_string(),
                expected: Some(format!("left + right < {}", page.width)),
                actual: Some(format!("{}", m.left + m.right)),
            });
        }

        if m.top + m.bottom >= page.height as f64 {
            violations.push(ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: "Vertical margins leave no room for text".to_string(),
                expected: Some(format!("top + bottom < {}", page.height)),
                actual: Some(format!("{}", m.top + m.bottom)),
            });
        }

        violations
    }
}

pub struct SigmaRangeRule;

impl ValidationRule for SigmaRangeRule {
    fn name(&self) -> &'static str { "sigma_range" }

    fn validate(&self, params: &EngineParams, _page: PageSize) -> Vec<ValidationViolation> {
        params
            .sigmas()
            .into_iter()
            .filter(|(_, sigma)| *sigma < 0.0 || !sigma.is_finite())
            .map(|(key, sigma)| ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: format!("{} must be a finite, non-negative σ", key),
                expected: Some(">= 0".to_string()),
                actual: Some(sigma.to_string()),
            })
            .collect()
    }
}

pub struct LineOverlapRule;

impl ValidationRule for LineOverlapRule {
    fn name(&self) -> &'static str { "line_overlap" }

    fn validate(&self, params: &EngineParams, _page: PageSize) -> Vec<ValidationViolation> {
        if params.line_spacing < params.font_size {
            vec![ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Warning,
                message: "Lines will overlap".to_string(),
                expected: Some(format!("line_spacing >= {}", params.font_size)),
                actual: Some(params.line_spacing.to_string()),
            }]
        } else {
            vec![]
        }
    }
}

/// Validator runs every rule and applies the blocking policy
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(PositiveMetricsRule),
                Box::new(MarginsFitPageRule),
                Box::new(SigmaRangeRule),
                Box::new(LineOverlapRule),
            ],
        }
    }

    pub fn validate(&self, params: &EngineParams, page: PageSize) -> ValidationResult {
        let violations: Vec<_> = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(params, page))
            .collect();

        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        ValidationResult { valid, violations }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
