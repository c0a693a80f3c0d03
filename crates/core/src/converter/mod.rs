//! Output converters for ordered pages.
//!
//! - MarkdownConverter: Markdown with headings, pipe tables and display math
//! - TextConverter: plain text, one paragraph per region

mod markdown;
mod text;

pub use markdown::{
    MarkdownConverter, MarkdownOptions, clean_text, document_to_markdown, markdown_table,
};
pub use text::{TextConverter, region_text};
