//! Integration tests for the codeplan pipeline

mod extraction_properties;
mod pipeline_flow;
mod support;
mod tree_properties;
