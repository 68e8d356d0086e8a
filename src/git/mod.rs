//! Repository acquisition.
//!
//! - [`url`]: turns browser URLs into cloneable ones
//! - [`RepoFetcher`]: clones or updates the local working copy
//!
//! # Example
//!
//! ```rust,no_run
//! use tfscope::git::RepoFetcher;
//! use tfscope::Config;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = RepoFetcher::new(&Config::default());
//!     let path = fetcher
//!         .fetch(
//!             "https://github.com/terraform-aws-modules/terraform-aws-vpc/tree/master",
//!             None,
//!             Path::new("./terraform_analysis/repo"),
//!         )
//!         .await?;
//!     println!("Working copy at {}", path.display());
//!     Ok(())
//! }
//! ```

mod fetcher;
pub mod url;

pub use fetcher::RepoFetcher;
pub use url::{branch_from_web_url, normalize_repo_url};
