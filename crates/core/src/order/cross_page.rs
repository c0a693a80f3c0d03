//! Cross-page continuation hints.

use crate::model::{Document, Page, RegionLabel};

fn marks_continuation(label: RegionLabel) -> bool {
    label == RegionLabel::Table
}

fn has_height(page: &Page) -> bool {
    page.height.is_finite() && page.height > 0.0
}

/// Flags tables that probably run across a page break.
///
/// For every pair of consecutive pages, a table ending inside the bottom
/// `edge_band` fraction of the first page is marked `continues_on_next`,
/// and a table starting inside the top `edge_band` fraction of the second
/// page is marked `continued_from_previous`. Existing flags are kept.
pub fn mark_continuations(document: &mut Document, edge_band: f64) {
    let count = document.pages.len();
    if count < 2 {
        return;
    }

    for page in &mut document.pages[..count - 1] {
        if !has_height(page) {
            continue;
        }
        let bottom_edge = page.height * (1.0 - edge_band);
        for region in page.regions_mut() {
            if marks_continuation(region.label()) && region.bbox.y2 > bottom_edge {
                region.continuation.continues_on_next = true;
            }
        }
    }

    for page in &mut document.pages[1..] {
        if !has_height(page) {
            continue;
        }
        let top_edge = page.height * edge_band;
        for region in page.regions_mut() {
            if marks_continuation(region.label()) && region.bbox.y1 < top_edge {
                region.continuation.continued_from_previous = true;
            }
        }
    }
}
