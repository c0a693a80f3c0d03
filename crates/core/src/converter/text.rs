//! Text Converter - outputs plain text in reading order.

use std::io::{self, Write};

use crate::model::{Page, Region, RegionKind};

/// Text Converter - outputs plain text.
///
/// Each region becomes one paragraph; every page ends with a form feed.
pub struct TextConverter<'a, W: Write> {
    /// Output writer
    outfp: &'a mut W,
    /// Whether to show page numbers
    showpageno: bool,
}

impl<'a, W: Write> TextConverter<'a, W> {
    /// Create a new text converter.
    pub fn new(outfp: &'a mut W, showpageno: bool) -> Self {
        Self { outfp, showpageno }
    }

    /// Check if page numbers are shown.
    pub fn show_pageno(&self) -> bool {
        self.showpageno
    }

    /// Write text to output.
    pub fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.outfp.write_all(text.as_bytes())
    }

    /// Receive and render a page.
    pub fn receive_page(&mut self, page: &Page) -> io::Result<()> {
        if self.showpageno {
            let header = format!("Page {}\n", page.index() + 1);
            self.write_text(&header)?;
        }

        for region in page.ordered_regions() {
            if let Some(text) = region_text(region) {
                self.write_text(&text)?;
                self.write_text("\n\n")?;
            }
        }

        // Form feed at end of page
        self.write_text("\x0c")
    }
}

/// Plain text carried by a region, if any.
pub fn region_text(region: &Region) -> Option<String> {
    let text = match &region.kind {
        RegionKind::Table(table) => {
            let mut lines = Vec::with_capacity(table.rows.len() + 1);
            if !table.headers.is_empty() {
                lines.push(table.headers.join("\t"));
            }
            lines.extend(table.rows.iter().map(|row| row.join("\t")));
            lines.join("\n")
        }
        RegionKind::Formula(f) => f.latex.clone(),
        RegionKind::Figure(f) => f.caption.clone().unwrap_or_default(),
        other => other.text().map(|b| b.text.clone()).unwrap_or_default(),
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    #[test]
    fn test_text_follows_reading_order() {
        let mut a = Region::new(RegionKind::body("second"), BBox::new(0.0, 0.0, 1.0, 1.0), 1.0);
        a.reading_order = Some(2);
        let mut b = Region::new(RegionKind::title("first"), BBox::new(0.0, 5.0, 1.0, 6.0), 1.0);
        b.reading_order = Some(1);
        let page = Page::with_regions(0, 10.0, 10.0, vec![a, b]);

        let mut out = Vec::new();
        TextConverter::new(&mut out, true).receive_page(&page).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Page 1\nfirst\n\nsecond\n\n\x0c"
        );
    }

    #[test]
    fn test_table_text_is_tab_separated() {
        let r = Region::new(
            RegionKind::table(vec!["a".into(), "b".into()], vec![vec!["1".into(), "2".into()]]),
            BBox::new(0.0, 0.0, 1.0, 1.0),
            1.0,
        );
        assert_eq!(region_text(&r).as_deref(), Some("a\tb\n1\t2"));
        let fig = Region::new(RegionKind::figure(), BBox::new(0.0, 0.0, 1.0, 1.0), 1.0);
        assert_eq!(region_text(&fig), None);
    }
}
