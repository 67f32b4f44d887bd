pub mod assemble;
pub mod catalog;
pub mod config;
pub mod directive;
pub mod error;
pub mod fault;
pub mod general;
pub mod operation;
pub mod resolve;
pub mod schema;
pub mod source;
pub mod spec;

/// A generated file with path and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}
