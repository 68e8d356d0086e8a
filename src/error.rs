//! Error types for tfscope.
//!
//! All library operations return [`Result`], backed by the `thiserror`
//! enum [`TfScopeError`]. Every variant records the source location where
//! it was raised; use the [`err!`](crate::err) macro to fill those fields.
//!
//! # Error Categories
//!
//! - **IO errors**: reading Terraform files, writing modified files
//! - **Parse errors**: HCL / Terraform JSON syntax failures
//! - **Git errors**: cloning and updating working copies
//! - **Config errors**: invalid or missing configuration
//! - **Model errors**: generative model requests and responses
//!
//! # Example
//!
//! ```rust
//! use tfscope::error::{Result, ResultExt};
//!
//! fn read(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_path(path)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(ConfigMissing { key: "llm.api_key".to_string() }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident $(: $value:expr)?),* $(,)? }) => {
        $crate::error::TfScopeError::$variant {
            $($field $(: $value)?,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for tfscope operations.
pub type Result<T> = std::result::Result<T, TfScopeError>;

/// The main error type for tfscope.
#[derive(Error, Debug)]
pub enum TfScopeError {
    // =========================================================================
    // I/O and File System Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        src_path: &'static str,
        src_line: u32,
    },

    /// File not found.
    #[error("File not found: {path} ({src_path}:{src_line})")]
    FileNotFound {
        path: PathBuf,
        src_path: &'static str,
        src_line: u32,
    },

    /// Directory not found.
    #[error("Directory not found: {path} ({src_path}:{src_line})")]
    DirectoryNotFound {
        path: PathBuf,
        src_path: &'static str,
        src_line: u32,
    },

    /// A write target escapes the repository root.
    #[error("Refusing to write outside the repository: {path} ({src_path}:{src_line})")]
    UnsafePath {
        path: PathBuf,
        src_path: &'static str,
        src_line: u32,
    },

    // =========================================================================
    // Parsing Errors
    // =========================================================================
    /// HCL or Terraform JSON parsing error.
    #[error("Failed to parse '{file}' \n\t({src_path}:{src_line}): {message}")]
    HclParse {
        file: PathBuf,
        message: String,
        src_path: &'static str,
        src_line: u32,
    },

    // =========================================================================
    // Git Errors
    // =========================================================================
    /// Git operation error.
    #[error("Git error ({src_path}:{src_line}): {message}")]
    Git {
        message: String,
        src_path: &'static str,
        src_line: u32,
    },

    /// Git clone error.
    #[error("Failed to clone repository '{url}' ({src_path}:{src_line}): {message}")]
    GitClone {
        url: String,
        message: String,
        src_path: &'static str,
        src_line: u32,
    },

    /// Invalid Git URL.
    #[error("Invalid Git URL '{url}' ({src_path}:{src_line}): {message}")]
    InvalidGitUrl {
        url: String,
        message: String,
        src_path: &'static str,
        src_line: u32,
    },

    /// The fetched working copy holds nothing but `.git`.
    #[error("Repository at '{path}' is empty after fetching ({src_path}:{src_line})")]
    EmptyRepository {
        path: PathBuf,
        src_path: &'static str,
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        src_path: &'static str,
        src_line: u32,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}' ({src_path}:{src_line}): {message}")]
    ConfigValue {
        key: String,
        message: String,
        src_path: &'static str,
        src_line: u32,
    },

    /// Missing required configuration.
    #[error("Missing required configuration: {key} ({src_path}:{src_line})")]
    ConfigMissing {
        key: String,
        src_path: &'static str,
        src_line: u32,
    },

    // =========================================================================
    // Generative Model Errors
    // =========================================================================
    /// HTTP request to the model API failed.
    #[error("Model request failed ({src_path}:{src_line}): {message}")]
    Llm {
        message: String,
        /// HTTP status code (if available)
        status_code: Option<u16>,
        src_path: &'static str,
        src_line: u32,
    },

    /// The model answered but the payload was not usable.
    #[error("Unusable model response ({src_path}:{src_line}): {message}")]
    LlmResponse {
        message: String,
        src_path: &'static str,
        src_line: u32,
    },

    // =========================================================================
    // Report Errors
    // =========================================================================
    /// Report or export generation error.
    #[error("Failed to generate report ({src_path}:{src_line}): {message}")]
    ReportGeneration {
        message: String,
        src_path: &'static str,
        src_line: u32,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Internal error (should not happen in normal operation).
    #[error("Internal error ({src_path}:{src_line}): {message}")]
    Internal {
        message: String,
        src_path: &'static str,
        src_line: u32,
    },
}

impl TfScopeError {
    /// Creates an `HclParse` error.
    #[must_use]
    pub fn hcl_parse(file: impl Into<PathBuf>, message: impl Into<String>, src_path: &'static str, src_line: u32) -> Self {
        Self::HclParse { file: file.into(), message: message.into(), src_path, src_line }
    }

    /// Creates a `Git` error.
    #[must_use]
    pub fn git(message: impl Into<String>, src_path: &'static str, src_line: u32) -> Self {
        Self::Git { message: message.into(), src_path, src_line }
    }

    /// Creates a `ConfigParse` error.
    #[must_use]
    pub fn config_parse(message: String, source: Option<Box<dyn std::error::Error + Send + Sync>>, src_path: &'static str, src_line: u32) -> Self {
        Self::ConfigParse { message, source, src_path, src_line }
    }

    /// Returns the process exit code for the error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => 13,
            Self::FileNotFound { .. } => 14,
            Self::DirectoryNotFound { .. } => 15,
            Self::EmptyRepository { .. } => 16,
            Self::GitClone { .. } | Self::Git { .. } | Self::InvalidGitUrl { .. } => 17,
            Self::ConfigParse { .. } => 18,
            Self::ConfigValue { .. } => 19,
            Self::ConfigMissing { .. } => 20,
            Self::Llm { .. } | Self::LlmResponse { .. } => 22,
            _ => 1,
        }
    }
}

/// Extension trait for `Result` to add context to errors.
pub trait ResultExt<T> {
    /// Attaches a file path to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| TfScopeError::Io {
            path: path.into(),
            source,
            src_path: file!(),
            src_line: line!(),
        })
    }
}

impl From<std::io::Error> for TfScopeError {
    fn from(source: std::io::Error) -> Self {
        // Prefer `with_path` where the path is known.
        Self::Io {
            path: PathBuf::new(),
            source,
            src_path: file!(),
            src_line: line!(),
        }
    }
}

impl From<serde_json::Error> for TfScopeError {
    fn from(source: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON serialization/deserialization error: {source}"),
            src_path: file!(),
            src_line: line!(),
        }
    }
}
