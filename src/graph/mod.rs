//! Dependency graph of Terraform files.
//!
//! # Structure
//!
//! ```text
//!   main.tf ──┬──module "network"──▶ modules/network/main.tf
//!             └──module "network"──▶ modules/network/outputs.tf
//! ```
//!
//! Nodes are files keyed by repository-relative path. A directed edge
//! `A -> B` means file `A` contains a `module` block whose local source
//! directory holds file `B`. Edges carry the module block's label.
//!
//! # Data Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │ .tf/.tf.json│────▶│   Parser    │────▶│ ModuleCall   │
//! └─────────────┘     └─────────────┘     └──────────────┘
//!                                                │ resolve_module_source
//!                                                ▼
//!                                         ┌──────────────┐
//!                                         │ GraphBuilder │
//!                                         └──────────────┘
//!                                                │
//!                           ┌────────────────────┼───────────────────┐
//!                           ▼                    ▼                   ▼
//!                    ┌─────────────┐      ┌─────────────┐     ┌─────────────┐
//!                    │  Describer  │      │  Exporter   │     │  Selector   │
//!                    │ (summaries) │      │ (JSON/DOT)  │     │ (prompts)   │
//!                    └─────────────┘      └─────────────┘     └─────────────┘
//! ```

mod builder;
mod export;
mod types;

pub use builder::{relative_id, BuildOutcome, GraphBuilder};
pub use export::export_graph;
pub use types::{DependencyEdge, DependencyGraph, EdgeKind, EdgeView, FileNode, NodeId, NodeKind};
