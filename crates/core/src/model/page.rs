//! Pages and documents.

use serde::{Deserialize, Serialize};

use super::region::Region;

/// Page width used when the detector does not report one.
pub const DEFAULT_PAGE_WIDTH: f64 = 1000.0;
/// Page height used when the detector does not report one.
pub const DEFAULT_PAGE_HEIGHT: f64 = 1000.0;

/// One page of detected regions.
///
/// The page owns its regions exclusively and stamps its index onto every
/// region it receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PageRecord")]
pub struct Page {
    index: usize,
    pub width: f64,
    pub height: f64,
    regions: Vec<Region>,
}

impl Page {
    pub fn new(index: usize, width: f64, height: f64) -> Self {
        Self {
            index,
            width,
            height,
            regions: Vec::new(),
        }
    }

    /// Creates a page from regions in detection order.
    pub fn with_regions(index: usize, width: f64, height: f64, regions: Vec<Region>) -> Self {
        let mut page = Self::new(index, width, height);
        for region in regions {
            page.push(region);
        }
        page
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn push(&mut self, mut region: Region) {
        region.page_index = self.index;
        self.regions.push(region);
    }

    /// Regions in detection order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn regions_mut(&mut self) -> &mut [Region] {
        &mut self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions by ascending reading order.
    ///
    /// Regions without an assigned order follow the ordered ones, in
    /// detection order.
    pub fn ordered_regions(&self) -> Vec<&Region> {
        let mut out: Vec<&Region> = self.regions.iter().collect();
        out.sort_by_key(|r| r.reading_order.unwrap_or(u32::MAX));
        out
    }

    /// Clears every assigned reading order.
    pub fn reset_reading_order(&mut self) {
        for region in &mut self.regions {
            region.reading_order = None;
        }
    }
}

fn default_width() -> f64 {
    DEFAULT_PAGE_WIDTH
}

fn default_height() -> f64 {
    DEFAULT_PAGE_HEIGHT
}

/// Wire form of a page, before regions are stamped with the page index.
#[derive(Debug, Deserialize)]
struct PageRecord {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default = "default_width")]
    width: f64,
    #[serde(default = "default_height")]
    height: f64,
    #[serde(default)]
    regions: Vec<Region>,
}

impl PageRecord {
    fn into_page(self, fallback_index: usize) -> Page {
        Page::with_regions(
            self.index.unwrap_or(fallback_index),
            self.width,
            self.height,
            self.regions,
        )
    }
}

impl From<PageRecord> for Page {
    fn from(record: PageRecord) -> Self {
        record.into_page(0)
    }
}

/// A paginated document: pages in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "DocumentRecord")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            source: None,
            pages,
        }
    }

    pub fn region_count(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }
}

#[derive(Debug, Deserialize)]
struct DocumentRecord {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    pages: Vec<PageRecord>,
}

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        Self {
            source: record.source,
            pages: record
                .pages
                .into_iter()
                .enumerate()
                .map(|(i, p)| p.into_page(i))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, RegionKind};

    #[test]
    fn test_page_stamps_region_index() {
        let r = Region::new(RegionKind::body("a"), BBox::new(0.0, 0.0, 1.0, 1.0), 0.9);
        let page = Page::with_regions(4, 100.0, 100.0, vec![r]);
        assert_eq!(page.regions()[0].page_index(), 4);
    }

    #[test]
    fn test_document_json_defaults() {
        let json = r#"{
            "pages": [
                {"regions": [{"type": "text", "text": "a", "bbox": [0, 0, 10, 10]}]},
                {"index": 7, "width": 612, "height": 792, "regions": []}
            ]
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].index(), 0);
        assert_eq!(doc.pages[0].width, DEFAULT_PAGE_WIDTH);
        assert_eq!(doc.pages[0].regions()[0].page_index(), 0);
        assert_eq!(doc.pages[1].index(), 7);
        assert_eq!(doc.pages[1].height, 792.0);
        assert_eq!(doc.region_count(), 1);
    }

    #[test]
    fn test_ordered_regions_puts_unassigned_last() {
        let mut page = Page::new(0, 100.0, 100.0);
        for _ in 0..3 {
            page.push(Region::new(RegionKind::body(""), BBox::new(0.0, 0.0, 1.0, 1.0), 1.0));
        }
        page.regions_mut()[0].reading_order = Some(2);
        page.regions_mut()[2].reading_order = Some(1);
        let ordered: Vec<u32> = page
            .ordered_regions()
            .iter()
            .map(|r| r.reading_order.unwrap_or(0))
            .collect();
        assert_eq!(ordered, vec![1, 2, 0]);
    }
}
