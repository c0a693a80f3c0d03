//! Document data model: regions, pages and documents.

pub mod page;
pub mod region;

pub use page::{DEFAULT_PAGE_HEIGHT, DEFAULT_PAGE_WIDTH, Document, Page};
pub use region::{
    BBox, Continuation, FigureBlock, FormulaBlock, Region, RegionKind, RegionLabel, TableBlock,
    TextBlock,
};
