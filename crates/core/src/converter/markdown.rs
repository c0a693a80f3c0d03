//! Markdown Converter - renders ordered regions as Markdown.

use std::io::{self, Write};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::model::{Document, Page, Region, RegionKind, TableBlock, TextBlock};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Options for Markdown rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownOptions {
    /// Written between consecutive non-empty pages.
    pub page_separator: String,
    /// Drop figure regions entirely instead of emitting their caption.
    pub skip_figures: bool,
    /// Minimum font sizes for heading levels 1 through 5; smaller titles
    /// become level 6.
    pub title_thresholds: [f64; 5],
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            page_separator: "\n\n".to_string(),
            skip_figures: true,
            title_thresholds: [18.0, 16.0, 14.0, 12.0, 10.0],
        }
    }
}

/// Removes zero-width characters and collapses whitespace.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|&c| c != '\u{200b}' && c != '\u{feff}')
        .collect();
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Detector placeholders such as `[Figure]` or `[Abandon]` carry no content.
fn is_placeholder(text: &str) -> bool {
    let t = text.trim();
    t.starts_with('[') && t.ends_with(']')
}

fn clean_cell(cell: &str) -> String {
    let c = WHITESPACE.replace_all(cell.trim(), " ").replace('|', "\\|");
    if c.is_empty() { " ".to_string() } else { c }
}

fn row_is_empty(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

fn pipe_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

/// Renders a table as a pipe table.
///
/// All-empty rows are dropped. Without a header row the first remaining row
/// is promoted to header. Returns an empty string when no cell has content.
pub fn markdown_table(table: &TableBlock) -> String {
    let mut rows: Vec<&Vec<String>> = table.rows.iter().filter(|r| !row_is_empty(r)).collect();
    if rows.is_empty() {
        return String::new();
    }

    let headers: Vec<String> = if table.headers.is_empty() {
        rows.remove(0).clone()
    } else {
        table.headers.clone()
    };
    let width = headers
        .len()
        .max(rows.iter().map(|r| r.len()).max().unwrap_or(0));

    let pad = |cells: &[String]| -> Vec<String> {
        (0..width)
            .map(|i| clean_cell(cells.get(i).map(String::as_str).unwrap_or("")))
            .collect()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(pipe_row(&pad(&headers)));
    lines.push(pipe_row(&vec![":---".to_string(); width]));
    for row in rows {
        lines.push(pipe_row(&pad(row)));
    }
    lines.join("\n")
}

/// Markdown Converter.
///
/// Regions are emitted per page in ascending reading order; blocks are
/// separated by a blank line.
pub struct MarkdownConverter<'a, W: Write> {
    outfp: &'a mut W,
    options: MarkdownOptions,
    pages_written: usize,
}

impl<'a, W: Write> MarkdownConverter<'a, W> {
    pub fn new(outfp: &'a mut W, options: MarkdownOptions) -> Self {
        Self {
            outfp,
            options,
            pages_written: 0,
        }
    }

    /// Number of non-empty pages written so far.
    pub fn pages_written(&self) -> usize {
        self.pages_written
    }

    fn title_level(&self, block: &TextBlock, confidence: f64) -> usize {
        match block.font_size {
            Some(size) => self
                .options
                .title_thresholds
                .iter()
                .position(|&t| size >= t)
                .map_or(6, |i| i + 1),
            None if confidence >= 0.9 => 2,
            None if confidence >= 0.7 => 3,
            None => 4,
        }
    }

    /// Renders one region to a Markdown block, or an empty string when the
    /// region has nothing to show.
    pub fn render_region(&self, region: &Region) -> String {
        match &region.kind {
            RegionKind::Title(block) => {
                if is_placeholder(&block.text) {
                    return String::new();
                }
                let text = clean_text(&block.text);
                if text.is_empty() {
                    return String::new();
                }
                let level = self.title_level(block, region.confidence);
                format!("{} {}", "#".repeat(level), text)
            }
            RegionKind::Table(table) => markdown_table(table),
            RegionKind::Formula(formula) => {
                let latex = clean_text(&formula.latex);
                if latex.is_empty() {
                    String::new()
                } else {
                    format!("$$\n{}\n$$", latex)
                }
            }
            RegionKind::Figure(figure) => match &figure.caption {
                Some(caption) if !self.options.skip_figures && !is_placeholder(caption) => {
                    let text = clean_text(caption);
                    if text.is_empty() {
                        String::new()
                    } else {
                        format!("*{}*", text)
                    }
                }
                _ => String::new(),
            },
            RegionKind::Text(block)
            | RegionKind::Caption(block)
            | RegionKind::Header(block)
            | RegionKind::Footer(block)
            | RegionKind::Other(block) => {
                if is_placeholder(&block.text) {
                    String::new()
                } else {
                    clean_text(&block.text)
                }
            }
        }
    }

    /// Renders a page body without writing it.
    pub fn render_page(&self, page: &Page) -> String {
        let blocks: Vec<String> = page
            .ordered_regions()
            .into_iter()
            .map(|r| self.render_region(r))
            .filter(|b| !b.is_empty())
            .collect();
        debug!(page = page.index(), blocks = blocks.len(), "rendered page");
        blocks.join("\n\n")
    }

    /// Receive and render a page.
    pub fn receive_page(&mut self, page: &Page) -> io::Result<()> {
        let body = self.render_page(page);
        if body.is_empty() {
            return Ok(());
        }
        if self.pages_written > 0 {
            self.outfp.write_all(self.options.page_separator.as_bytes())?;
        }
        self.outfp.write_all(body.as_bytes())?;
        self.pages_written += 1;
        Ok(())
    }

    /// Renders every page, then terminates the output with a newline.
    pub fn receive_document(&mut self, document: &Document) -> io::Result<()> {
        for page in &document.pages {
            self.receive_page(page)?;
        }
        self.finish()
    }

    pub fn finish(&mut self) -> io::Result<()> {
        if self.pages_written > 0 {
            self.outfp.write_all(b"\n")?;
        }
        self.outfp.flush()
    }
}

/// Renders a whole document to a Markdown string.
pub fn document_to_markdown(document: &Document, options: MarkdownOptions) -> String {
    let mut out: Vec<u8> = Vec::new();
    {
        let mut converter = MarkdownConverter::new(&mut out, options);
        // Writing into a Vec cannot fail.
        let _ = converter.receive_document(document);
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn region(kind: RegionKind) -> Region {
        Region::new(kind, BBox::new(0.0, 0.0, 10.0, 10.0), 0.95)
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a\u{200b}b \n\t c\u{feff} "), "ab c");
    }

    #[test]
    fn test_title_levels() {
        let mut out = Vec::new();
        let conv = MarkdownConverter::new(&mut out, MarkdownOptions::default());
        let big = region(RegionKind::Title(TextBlock::new("Big").with_font_size(20.0)));
        let small = region(RegionKind::Title(TextBlock::new("Small").with_font_size(8.0)));
        let plain = region(RegionKind::title("Plain"));
        assert_eq!(conv.render_region(&big), "# Big");
        assert_eq!(conv.render_region(&small), "###### Small");
        assert_eq!(conv.render_region(&plain), "## Plain");

        let unsure = Region::new(RegionKind::title("Maybe"), BBox::new(0.0, 0.0, 1.0, 1.0), 0.5);
        assert_eq!(conv.render_region(&unsure), "#### Maybe");
    }

    #[test]
    fn test_placeholders_and_figures_are_skipped() {
        let mut out = Vec::new();
        let conv = MarkdownConverter::new(&mut out, MarkdownOptions::default());
        assert_eq!(conv.render_region(&region(RegionKind::body("[Figure]"))), "");
        assert_eq!(conv.render_region(&region(RegionKind::figure())), "");
    }

    #[test]
    fn test_figure_caption_when_figures_kept() {
        let mut out = Vec::new();
        let options = MarkdownOptions {
            skip_figures: false,
            ..MarkdownOptions::default()
        };
        let conv = MarkdownConverter::new(&mut out, options);
        let fig = region(RegionKind::Figure(crate::model::FigureBlock {
            caption: Some("A chart".into()),
        }));
        assert_eq!(conv.render_region(&fig), "*A chart*");
    }

    #[test]
    fn test_formula_block() {
        let mut out = Vec::new();
        let conv = MarkdownConverter::new(&mut out, MarkdownOptions::default());
        let f = region(RegionKind::formula("E =  mc^2\n"));
        assert_eq!(conv.render_region(&f), "$$\nE = mc^2\n$$");
    }

    #[test]
    fn test_markdown_table() {
        let table = TableBlock {
            headers: vec!["Name".into(), "Value".into()],
            rows: vec![
                vec!["a|b".into(), "1".into()],
                vec!["".into(), " ".into()],
                vec!["c".into()],
            ],
        };
        assert_eq!(
            markdown_table(&table),
            "| Name | Value |\n| :--- | :--- |\n| a\\|b | 1 |\n| c |   |"
        );
    }

    #[test]
    fn test_markdown_table_promotes_first_row() {
        let table = TableBlock {
            headers: vec![],
            rows: vec![vec!["h1".into(), "h2".into()], vec!["x".into(), "y".into()]],
        };
        assert_eq!(
            markdown_table(&table),
            "| h1 | h2 |\n| :--- | :--- |\n| x | y |"
        );
        assert_eq!(markdown_table(&TableBlock::default()), "");
    }
}
