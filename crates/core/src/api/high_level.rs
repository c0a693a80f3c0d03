//! High-level ordering API.
//!
//! - `order_json()` - parse a JSON document, order it, return it
//! - `order_document()` - order an in-memory document with validated params
//! - `extract_markdown()` / `extract_text()` - render an ordered document
//! - `document_from_json()` / `document_to_json()` - interchange helpers

use std::io::Write;
use std::sync::Arc;

use tracing::debug;

use crate::converter::{MarkdownConverter, MarkdownOptions, TextConverter};
use crate::error::Result;
use crate::model::Document;
use crate::order::{DocumentReport, OrderParams, RankingSignal, ReadingOrderEngine};

/// Parses a document from JSON bytes.
pub fn document_from_json(data: &[u8]) -> Result<Document> {
    Ok(serde_json::from_slice(data)?)
}

/// Serializes a document, reading orders included, as pretty JSON.
pub fn document_to_json(document: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Builds an engine after validating `params`.
pub fn build_engine(
    signal: Option<Arc<dyn RankingSignal>>,
    params: OrderParams,
) -> Result<ReadingOrderEngine> {
    params.validate()?;
    Ok(match signal {
        Some(signal) => ReadingOrderEngine::with_signal(signal, params),
        None => ReadingOrderEngine::new(params),
    })
}

/// Orders every page of `document` in place.
///
/// # Errors
/// Only invalid `params` fail the call; per-page failures are reported in
/// the returned [`DocumentReport`].
pub fn order_document(
    document: &mut Document,
    signal: Option<Arc<dyn RankingSignal>>,
    params: OrderParams,
) -> Result<DocumentReport> {
    let engine = build_engine(signal, params)?;
    let report = engine.order_document(document);
    debug!(
        pages = document.pages.len(),
        ordered = report.ordered_pages(),
        fallback = report.fallback_pages(),
        "document ordered"
    );
    Ok(report)
}

/// Parses, orders and returns a JSON document.
///
/// # Example
/// ```ignore
/// use lectio_core::api::order_json;
/// use lectio_core::order::OrderParams;
///
/// let data = std::fs::read("regions.json")?;
/// let (doc, report) = order_json(&data, None, OrderParams::default())?;
/// ```
pub fn order_json(
    data: &[u8],
    signal: Option<Arc<dyn RankingSignal>>,
    params: OrderParams,
) -> Result<(Document, DocumentReport)> {
    let mut document = document_from_json(data)?;
    let report = order_document(&mut document, signal, params)?;
    Ok((document, report))
}

/// Writes an ordered document as Markdown.
pub fn extract_markdown_to_fp<W: Write>(
    document: &Document,
    outfp: &mut W,
    options: MarkdownOptions,
) -> Result<()> {
    MarkdownConverter::new(outfp, options).receive_document(document)?;
    Ok(())
}

/// Renders an ordered document as Markdown.
pub fn extract_markdown(document: &Document, options: MarkdownOptions) -> Result<String> {
    let mut output = Vec::new();
    extract_markdown_to_fp(document, &mut output, options)?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Writes an ordered document as plain text.
pub fn extract_text_to_fp<W: Write>(
    document: &Document,
    outfp: &mut W,
    showpageno: bool,
) -> Result<()> {
    let mut converter = TextConverter::new(outfp, showpageno);
    for page in &document.pages {
        converter.receive_page(page)?;
    }
    outfp.flush()?;
    Ok(())
}

/// Renders an ordered document as plain text.
pub fn extract_text(document: &Document) -> Result<String> {
    let mut output = Vec::new();
    extract_text_to_fp(document, &mut output, false)?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrderError;

    const DOC: &str = r#"{
        "pages": [{
            "width": 1000, "height": 1000,
            "regions": [
                {"type": "text", "text": "second", "bbox": [100, 500, 900, 600]},
                {"type": "title", "text": "Heading", "bbox": [100, 100, 900, 150]}
            ]
        }]
    }"#;

    #[test]
    fn test_order_json_and_render() {
        let (doc, report) = order_json(DOC.as_bytes(), None, OrderParams::default()).unwrap();
        assert_eq!(report.ordered_pages(), 1);
        let md = extract_markdown(&doc, MarkdownOptions::default()).unwrap();
        assert_eq!(md, "## Heading\n\nsecond\n");
        assert_eq!(extract_text(&doc).unwrap(), "Heading\n\nsecond\n\n\x0c");
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = OrderParams {
            column_gap: -1.0,
            ..OrderParams::default()
        };
        let err = order_json(DOC.as_bytes(), None, params).unwrap_err();
        assert!(matches!(err, OrderError::InvalidParams(_)));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            document_from_json(b"{not json"),
            Err(OrderError::Json(_))
        ));
    }
}
