//! High-level API module.
//!
//! # Example
//!
//! ```ignore
//! use lectio_core::api::{extract_markdown, order_json};
//! use lectio_core::converter::MarkdownOptions;
//! use lectio_core::order::OrderParams;
//!
//! let data = std::fs::read("regions.json")?;
//! let (doc, _report) = order_json(&data, None, OrderParams::default())?;
//! let md = extract_markdown(&doc, MarkdownOptions::default())?;
//! ```

pub mod high_level;

// Re-export for convenience
pub use high_level::{
    build_engine, document_from_json, document_to_json, extract_markdown, extract_markdown_to_fp,
    extract_text, extract_text_to_fp, order_document, order_json,
};
