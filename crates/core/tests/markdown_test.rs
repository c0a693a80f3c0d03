//! End-to-end tests: JSON region documents in, ordered Markdown/JSON out.

use lectio_core::api::{
    document_from_json, document_to_json, extract_markdown, extract_text, order_json,
};
use lectio_core::converter::MarkdownOptions;
use lectio_core::model::RegionLabel;
use lectio_core::order::OrderParams;

const TWO_PAGES: &str = r#"{
    "source": "paper.pdf",
    "pages": [
        {
            "width": 1000, "height": 1400,
            "regions": [
                {"type": "text", "text": "Right column.", "bbox": [550, 200, 950, 600]},
                {"type": "footer", "text": "1", "bbox": [850, 1350, 950, 1380]},
                {"type": "text", "text": "Left   column\nwraps.", "bbox": [50, 200, 450, 600]},
                {"type": "title", "text": "Results", "font_size": 16, "bbox": [50, 100, 450, 150]},
                {"type": "figure", "bbox": [550, 650, 950, 900], "caption": "Figure 1"},
                {"type": "table", "bbox": [50, 1000, 950, 1300], "confidence": 0.8,
                 "headers": ["Model", "Score"],
                 "rows": [["A", "0.91"], ["", ""], ["B|C", "0.87"]]}
            ]
        },
        {
            "width": 1000, "height": 1400,
            "regions": [
                {"type": "formula", "latex": "a^2 + b^2 = c^2", "bbox": [300, 400, 700, 450]},
                {"type": "text", "text": "[Abandon]", "bbox": [50, 100, 950, 150]},
                {"type": "text", "text": "After the\u200b table.", "bbox": [50, 200, 950, 300]}
            ]
        }
    ]
}"#;

#[test]
fn test_markdown_follows_reading_order() {
    let (doc, report) = order_json(TWO_PAGES.as_bytes(), None, OrderParams::default()).unwrap();
    assert_eq!(report.ordered_pages(), 2);

    let md = extract_markdown(&doc, MarkdownOptions::default()).unwrap();
    let expected = "## Results\n\n\
                    Left column wraps.\n\n\
                    | Model | Score |\n| :--- | :--- |\n| A | 0.91 |\n| B\\|C | 0.87 |\n\n\
                    Right column.\n\n\
                    1\n\n\
                    After the table.\n\n\
                    $$\na^2 + b^2 = c^2\n$$\n";
    assert_eq!(md, expected);
}

#[test]
fn test_page_separator_and_figure_captions() {
    let (doc, _) = order_json(TWO_PAGES.as_bytes(), None, OrderParams::default()).unwrap();
    let options = MarkdownOptions {
        page_separator: "\n\n---\n\n".to_string(),
        skip_figures: false,
        ..MarkdownOptions::default()
    };
    let md = extract_markdown(&doc, options).unwrap();
    assert!(md.contains("Right column.\n\n*Figure 1*\n\n1\n\n---\n\nAfter the table."));
}

#[test]
fn test_plain_text_output() {
    let (doc, _) = order_json(TWO_PAGES.as_bytes(), None, OrderParams::default()).unwrap();
    let text = extract_text(&doc).unwrap();
    let pages: Vec<&str> = text.split('\x0c').collect();
    assert_eq!(pages.len(), 3);
    assert!(pages[0].starts_with("Results\n\n"));
    assert!(pages[1].starts_with("[Abandon]\n\nAfter the"));
}

#[test]
fn test_json_round_trip_keeps_reading_order() {
    let (doc, _) = order_json(TWO_PAGES.as_bytes(), None, OrderParams::default()).unwrap();
    let json = document_to_json(&doc).unwrap();
    let back = document_from_json(json.as_bytes()).unwrap();

    assert_eq!(back, doc);
    assert_eq!(back.source.as_deref(), Some("paper.pdf"));
    let title = &back.pages[0].regions()[3];
    assert_eq!(title.label(), RegionLabel::Title);
    assert_eq!(title.reading_order, Some(1));
    assert_eq!(back.pages[1].index(), 1);
    assert_eq!(back.pages[1].regions()[0].page_index(), 1);
}

#[test]
fn test_unordered_input_renders_in_detection_order() {
    let doc = document_from_json(TWO_PAGES.as_bytes()).unwrap();
    let md = extract_markdown(&doc, MarkdownOptions::default()).unwrap();
    assert!(md.starts_with("Right column.\n\n1\n\nLeft column wraps."));
}

#[test]
fn test_out_of_range_confidence_is_clamped_on_load() {
    let json = r#"{"pages": [{"regions": [
        {"type": "title", "text": "Over", "bbox": [0, 0, 10, 10], "confidence": 7.5},
        {"type": "text", "text": "Under", "bbox": [0, 20, 10, 30], "confidence": -2},
        {"type": "text", "text": "Unknown", "bbox": [0, 40, 10, 50], "confidence": null}
    ]}]}"#;
    let doc = document_from_json(json.as_bytes()).unwrap();
    let confidences: Vec<f64> = doc.pages[0].regions().iter().map(|r| r.confidence).collect();
    assert_eq!(confidences, vec![1.0, 0.0, 0.0]);
}
