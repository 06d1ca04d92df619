//! Codeplan: Plan-Driven Code Changes
//!
//! Ingests a source directory into a tree, annotates every file through a
//! model provider, selects the files relevant to a change plan, generates
//! changes for them and reconciles the results for diff presentation.

pub mod annotation;
pub mod backend;
pub mod changes;
pub mod config;
pub mod diff;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod plan;
pub mod progress;
pub mod provider;
pub mod selection;
pub mod tooling;
pub mod tree;
pub mod types;

pub use error::ApiError;
pub use pipeline::PipelineSession;
