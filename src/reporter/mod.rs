//! Report generation module.
//!
//! This module renders analyses and modification runs as:
//! - JSON: Machine-readable structured output
//! - Text: Human-readable CLI output
//!
//! # Example
//!
//! ```rust,no_run
//! use tfscope::reporter::Reporter;
//! use tfscope::types::ReportFormat;
//! use tfscope::{Config, Pipeline};
//!
//! # async fn run() -> tfscope::Result<()> {
//! let config = Config::default();
//! let analysis = Pipeline::new(config.clone()).analyze_path("./infra", false).await?;
//! let report = Reporter::new(&config).analysis(&analysis, ReportFormat::Text, None)?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

mod json;
mod text;

use crate::config::Config;
use crate::error::Result;
use crate::types::{Analysis, ModificationRun, ReportFormat};

pub use json::JsonReporter;
pub use text::TextReporter;

/// Report generator that supports multiple output formats.
pub struct Reporter {
    config: Config,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn generator(&self, format: ReportFormat) -> Box<dyn ReportGenerator> {
        match format {
            ReportFormat::Json => Box::new(JsonReporter::new(&self.config)),
            ReportFormat::Text => Box::new(TextReporter::new(&self.config)),
        }
    }

    /// Render an analysis, marking files whose path contains `highlight`.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn analysis(&self, analysis: &Analysis, format: ReportFormat, highlight: Option<&str>) -> Result<String> {
        self.generator(format).analysis(analysis, highlight)
    }

    /// Render a modification run.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn modification(&self, run: &ModificationRun, format: ReportFormat) -> Result<String> {
        self.generator(format).modification(run)
    }
}

/// Trait for report generators.
pub trait ReportGenerator {
    /// Generate a report from an analysis.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn analysis(&self, analysis: &Analysis, highlight: Option<&str>) -> Result<String>;

    /// Generate a report from a modification run.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn modification(&self, run: &ModificationRun) -> Result<String>;
}
