//! Model-driven stages of the pipeline.
//!
//! # Stages
//!
//! 1. **Describe**: attach a short summary to every graph node.
//! 2. **Select**: ask which files a modification request implicates.
//! 3. **Modify**: ask for the complete rewritten content of each selected file.
//!
//! All stages take a [`LanguageModel`](crate::llm::LanguageModel) and degrade
//! instead of failing: missing descriptions get a default, a failed selection
//! selects everything, a failed rewrite skips that file.
//!
//! # Example
//!
//! ```rust,no_run
//! use tfscope::assistant::{Describer, Modifier, RelevanceSelector};
//! use tfscope::graph::GraphBuilder;
//! use tfscope::llm::GeminiClient;
//! use tfscope::Config;
//! use std::path::Path;
//!
//! # async fn run() -> tfscope::Result<()> {
//! let config = Config::default();
//! let model = GeminiClient::new(&config.llm)?;
//! let mut outcome = GraphBuilder::new(&config).build(Path::new("./infra"))?;
//!
//! Describer::new(Some(&model), &config.llm).describe_graph(&mut outcome.graph).await;
//! let files = RelevanceSelector::new(&model).select(&outcome.graph, &outcome.root, "Add tags").await;
//! let changes = Modifier::new(&model).generate(&outcome.graph, &outcome.root, "Add tags", &files).await;
//! # Ok(())
//! # }
//! ```

mod describe;
mod modify;
mod prompts;
mod select;

pub use describe::{summarize_file, DescribeStats, Describer, DEFAULT_DESCRIPTION};
pub use modify::{extract_code, Modifier};
pub use select::{parse_file_list, validate_paths, RelevanceSelector};
