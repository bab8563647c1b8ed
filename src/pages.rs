//! HTML pages for the browser front end
//!
//! Two templates, `index.html` and `result.html`, are compiled into the
//! binary. A templates directory may override either one by file name, which
//! lets a deployment restyle the pages without rebuilding. Templates go
//! through `minijinja` with HTML auto-escaping, so user text is safe to echo.
//!
//! Both pages load [`SCRIPT_PATH`]: input bounds and a loading overlay on the
//! home page, animated confidence and probability bars on the result page.

use std::path::Path;

use minijinja::{context, Environment};
use serde::Serialize;
use tracing::info;

use crate::classifier::Prediction;
use crate::error::{MedspecError, Result};

/// Home page template name
pub const INDEX_TEMPLATE: &str = "index.html";
/// Result page template name
pub const RESULT_TEMPLATE: &str = "result.html";

/// URL the page script is served from
pub const SCRIPT_PATH: &str = "/static/js/script.js";
/// Page script, compiled into the binary
pub const SCRIPT_SOURCE: &str = include_str!("../static/js/script.js");

const INDEX_SOURCE: &str = include_str!("../templates/index.html");
const RESULT_SOURCE: &str = include_str!("../templates/result.html");

/// Maximum recursion depth for templates
const MAX_RECURSION_DEPTH: usize = 32;

/// One row of the probability table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityRow {
    /// Specialty name
    pub name: String,
    /// Probability in percent, two decimals
    pub percent: String,
}

/// Data rendered into `result.html`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    /// Analyzed text
    pub text: Option<String>,
    /// Predicted specialty
    pub specialty: Option<String>,
    /// Confidence in percent, two decimals
    pub confidence: Option<String>,
    /// All specialties, most likely first
    pub probabilities: Vec<ProbabilityRow>,
    /// User-facing error message; set instead of the fields above
    pub error: Option<String>,
}

impl ResultView {
    /// View of a successful prediction
    #[must_use]
    pub fn success(text: &str, prediction: &Prediction) -> Self {
        let probabilities = prediction
            .ranked()
            .into_iter()
            .map(|(name, percent)| ProbabilityRow {
                name,
                percent: format!("{percent:.2}"),
            })
            .collect();
        Self {
            text: Some(text.to_string()),
            specialty: Some(prediction.specialty.clone()),
            confidence: Some(format!("{:.2}", prediction.confidence)),
            probabilities,
            error: None,
        }
    }

    /// View showing only an error message
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            text: None,
            specialty: None,
            confidence: None,
            probabilities: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Renders the front-end pages
#[derive(Debug)]
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    /// Create a renderer with the built-in templates
    ///
    /// # Errors
    ///
    /// Returns error if a built-in template fails to compile.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_recursion_limit(MAX_RECURSION_DEPTH);
        env.add_template(INDEX_TEMPLATE, INDEX_SOURCE)?;
        env.add_template(RESULT_TEMPLATE, RESULT_SOURCE)?;
        Ok(Self { env })
    }

    /// Create a renderer, letting files in `dir` replace built-in templates
    ///
    /// Files that don't exist in `dir` keep the built-in version.
    ///
    /// # Errors
    ///
    /// Returns error if an override can't be read or doesn't compile.
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        let mut renderer = Self::new()?;
        for name in [INDEX_TEMPLATE, RESULT_TEMPLATE] {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }
            let source = std::fs::read_to_string(&path).map_err(|e| MedspecError::IoError {
                message: format!("Failed to read template {}: {e}", path.display()),
            })?;
            renderer.env.add_template_owned(name, source)?;
            info!(template = name, path = %path.display(), "using template override");
        }
        Ok(renderer)
    }

    /// Render the home page
    ///
    /// # Errors
    ///
    /// Returns error if rendering fails.
    pub fn index(&self) -> Result<String> {
        let template = self.env.get_template(INDEX_TEMPLATE)?;
        Ok(template.render(context! {})?)
    }

    /// Render the result page
    ///
    /// # Errors
    ///
    /// Returns error if rendering fails.
    pub fn result(&self, view: &ResultView) -> Result<String> {
        let template = self.env.get_template(RESULT_TEMPLATE)?;
        Ok(template.render(view)?)
    }
}
