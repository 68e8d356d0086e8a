//! Terraform parsing: file discovery, document parsing and module sources.
//!
//! # Supported Constructs
//!
//! - `.tf` files (HCL native syntax) via `hcl-rs`
//! - `.tf.json` files (Terraform JSON syntax)
//! - `module` blocks in either the mapping or list-of-mappings encoding
//!
//! # Example
//!
//! ```rust,no_run
//! use tfscope::config::ScanOptions;
//! use tfscope::parser::{extract_module_calls, find_terraform_files, parse_document};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     for file in find_terraform_files(Path::new("./terraform"), &ScanOptions::default())? {
//!         let document = parse_document(&file)?;
//!         for call in extract_module_calls(&document) {
//!             println!("{}: module {} -> {}", file.display(), call.name, call.source);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod hcl;
mod scan;
mod source;

pub use hcl::{extract_module_calls, is_json_document, parse_document, parse_document_str, Document};
pub use scan::{find_terraform_files, is_terraform_file};
pub use source::{classify_source, normalize_path, resolve_module_source};

/// File extensions to scan for Terraform files.
pub const TERRAFORM_EXTENSIONS: &[&str] = &[".tf", ".tf.json"];

/// Directory names never descended into.
pub const SKIP_DIRS: &[&str] = &[".terraform", ".terragrunt-cache", ".git"];
