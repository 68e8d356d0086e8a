//! Configuration module for tfscope.
//!
//! Configuration is loaded from:
//! - YAML configuration files (`tfscope.yaml`)
//! - Environment variables
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # tfscope.yaml
//!
//! scan:
//!   exclude_patterns:
//!     - "test*"
//!   continue_on_error: true
//!   max_depth: 100
//!
//! git:
//!   token: ${GITHUB_TOKEN}
//!   branch: main
//!
//! llm:
//!   provider: generative_language
//!   model: gemini-1.5-flash-002
//!   api_key: ${GEMINI_API_KEY}
//!
//! output:
//!   directory: ./terraform_analysis
//!   colored: true
//! ```

use crate::error::{Result, TfScopeError};
use crate::err;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

/// Default file names probed when no `--config` is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["tfscope.yaml", "tfscope.yml", ".tfscope.yaml"];

/// Scanning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// File or directory names to skip (glob patterns matched against the entry name).
    pub exclude_patterns: Vec<String>,

    /// Keep building the graph when a file fails to parse.
    pub continue_on_error: bool,

    /// Maximum depth for recursive directory scanning.
    pub max_depth: usize,

    /// Follow symbolic links while scanning.
    pub follow_links: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            continue_on_error: true,
            max_depth: 100,
            follow_links: false,
        }
    }
}

/// Git options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitOptions {
    /// Branch to check out. `None` uses the remote's default branch.
    pub branch: Option<String>,

    /// HTTPS token injected into clone URLs.
    pub token: Option<String>,

    /// Clone depth (0 for a full clone).
    pub depth: i32,
}

impl Default for GitOptions {
    fn default() -> Self {
        Self { branch: None, token: None, depth: 1 }
    }
}

/// Which hosted endpoint serves `generateContent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// `generativelanguage.googleapis.com`, authenticated with an API key.
    #[default]
    GenerativeLanguage,
    /// Vertex AI, authenticated with an OAuth access token.
    VertexAi,
}

/// Generative model options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmOptions {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub project: Option<String>,
    pub location: String,
    /// Overrides the endpoint host, e.g. for a proxy.
    pub base_url: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Concurrent description requests.
    pub concurrency: usize,
    /// File content beyond this many characters is cut before prompting.
    pub max_content_chars: usize,
}

impl Default for LlmOptions {
    fn default() -> Self {
        Self {
            provider: LlmProvider::GenerativeLanguage,
            model: "gemini-1.5-flash-002".to_string(),
            api_key: None,
            access_token: None,
            project: None,
            location: "us-central1".to_string(),
            base_url: None,
            temperature: 0.2,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 8192,
            timeout_secs: 120,
            max_retries: 3,
            retry_delay_ms: 500,
            concurrency: 4,
            max_content_chars: 10_000,
        }
    }
}

impl LlmOptions {
    /// Returns true when credentials for the configured provider are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        match self.provider {
            LlmProvider::GenerativeLanguage => self.api_key.is_some(),
            LlmProvider::VertexAi => self.access_token.is_some() && self.project.is_some(),
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Working directory for clones and exported graphs.
    pub directory: PathBuf,

    /// Use colored output.
    pub colored: bool,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./terraform_analysis"),
            colored: true,
            pretty: true,
        }
    }
}

impl OutputOptions {
    /// Where the repository working copy lives.
    #[must_use]
    pub fn repo_dir(&self) -> PathBuf {
        self.directory.join("repo")
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub scan: ScanOptions,
    pub git: GitOptions,
    pub llm: LlmOptions,
    pub output: OutputOptions,
}

impl Config {
    /// Load configuration from a YAML string, expanding `${VAR}` and `$VAR`.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);

        let config: Config = serde_yaml::from_str(&expanded).map_err(|e| {
            TfScopeError::config_parse(e.to_string(), Some(Box::new(e)), file!(), line!())
        })?;

        tracing::debug!(
            exclude_patterns = config.scan.exclude_patterns.len(),
            provider = ?config.llm.provider,
            model = %config.llm.model,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Fill unset secrets and endpoint settings from the environment.
    pub fn load_from_env(&mut self) {
        fn non_empty(var: &str) -> Option<String> {
            std::env::var(var).ok().filter(|v| !v.is_empty())
        }

        if self.git.token.is_none() {
            self.git.token = non_empty("TFSCOPE_GIT_TOKEN");
        }
        if self.llm.api_key.is_none() {
            self.llm.api_key = non_empty("TFSCOPE_LLM_API_KEY").or_else(|| non_empty("GEMINI_API_KEY"));
        }
        if self.llm.access_token.is_none() {
            self.llm.access_token = non_empty("TFSCOPE_LLM_ACCESS_TOKEN");
        }
        if self.llm.project.is_none() {
            self.llm.project = non_empty("TFSCOPE_LLM_PROJECT");
        }
        if let Some(location) = non_empty("TFSCOPE_LLM_LOCATION") {
            self.llm.location = location;
        }
        if let Some(model) = non_empty("TFSCOPE_LLM_MODEL") {
            self.llm.model = model;
        }

        tracing::debug!(
            git_token_set = self.git.token.is_some(),
            llm_credentials = self.llm.has_credentials(),
            "Environment overrides applied"
        );
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValue` for the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: String| {
            Err(err!(ConfigValue { key: key.to_string(), message }))
        };

        for pattern in &self.scan.exclude_patterns {
            if let Err(e) = glob::Pattern::new(pattern) {
                return invalid("scan.exclude_patterns", format!("'{pattern}': {e}"));
            }
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return invalid("llm.temperature", format!("{} is outside 0.0..=2.0", self.llm.temperature));
        }
        if !(0.0..=1.0).contains(&self.llm.top_p) {
            return invalid("llm.top_p", format!("{} is outside 0.0..=1.0", self.llm.top_p));
        }
        if self.llm.concurrency == 0 {
            return invalid("llm.concurrency", "must be at least 1".to_string());
        }
        if self.llm.max_content_chars == 0 {
            return invalid("llm.max_content_chars", "must be at least 1".to_string());
        }
        if self.llm.model.trim().is_empty() {
            return invalid("llm.model", "must not be empty".to_string());
        }
        Ok(())
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# tfscope configuration file

# Scanning options
scan:
  # File or directory names to skip (glob patterns)
  exclude_patterns: []
  #   - "test*"

  # Keep building the graph when a file fails to parse
  continue_on_error: true

  # Maximum depth for recursive directory scanning
  max_depth: 100

# Git options (for cloning repositories)
git:
  # Authentication token (can use environment variable)
  # token: ${GITHUB_TOKEN}

  # Branch to checkout (default: repository's default branch)
  # branch: main

  # Clone depth (0 for full history)
  depth: 1

# Generative model options
llm:
  # generative_language (API key) or vertex_ai (access token + project)
  provider: generative_language
  model: gemini-1.5-flash-002
  # api_key: ${GEMINI_API_KEY}
  # access_token: ${VERTEX_ACCESS_TOKEN}
  # project: my-gcp-project
  location: us-central1

  temperature: 0.2
  top_p: 0.8
  top_k: 40
  max_output_tokens: 8192

  timeout_secs: 120
  max_retries: 3
  concurrency: 4

  # Characters of file content sent per prompt
  max_content_chars: 10000

# Output options
output:
  directory: ./terraform_analysis
  colored: true
  pretty: true
"#
        .to_string()
    }
}

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}|\$([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex")
});

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax; unset variables are left as written.
fn expand_env_vars(content: &str) -> String {
    ENV_VAR
        .replace_all(content, |caps: &regex::Captures<'_>| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
