//! Detected content regions.
//!
//! A [`Region`] is one element produced by the upstream layout detector: its
//! kind (with kind-specific content), its bounding box in page pixels, the
//! detector confidence and, once the engine has run, its reading order.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Axis-aligned rectangle in page-pixel coordinates (origin top-left).
///
/// Invariant: `x2 >= x1` and `y2 >= y1`. [`BBox::new`] and deserialization
/// swap inverted corners so the invariant always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    #[inline]
    pub fn center_x(&self) -> f64 {
        (self.x1 + self.x2) / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f64 {
        (self.y1 + self.y2) / 2.0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// True when every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }
}

impl From<[f64; 4]> for BBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Text payload shared by the text-bearing kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBlock {
    pub text: String,
    /// Dominant font size in points, when the recognizer reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: None,
        }
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }
}

/// Table payload: an optional header row and body rows of cell text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableBlock {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Formula payload in LaTeX.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaBlock {
    pub latex: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Closed set of region kinds, each carrying its own content.
///
/// The kind is fixed when the region is built; nothing downstream re-tags it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionKind {
    Title(TextBlock),
    Text(TextBlock),
    Table(TableBlock),
    Formula(FormulaBlock),
    Figure(FigureBlock),
    Caption(TextBlock),
    Header(TextBlock),
    Footer(TextBlock),
    Other(TextBlock),
}

/// Payload-free discriminant of [`RegionKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionLabel {
    Title,
    Text,
    Table,
    Formula,
    Figure,
    Caption,
    Header,
    Footer,
    Other,
}

impl RegionLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Text => "text",
            Self::Table => "table",
            Self::Formula => "formula",
            Self::Figure => "figure",
            Self::Caption => "caption",
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Other => "other",
        }
    }

    /// Kinds whose x-centers drive column clustering.
    pub fn is_text_bearing(self) -> bool {
        matches!(self, Self::Title | Self::Text)
    }

    /// Running headers and footers, which span the page rather than a column.
    pub fn is_page_furniture(self) -> bool {
        matches!(self, Self::Header | Self::Footer)
    }
}

impl fmt::Display for RegionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RegionKind {
    pub fn label(&self) -> RegionLabel {
        match self {
            Self::Title(_) => RegionLabel::Title,
            Self::Text(_) => RegionLabel::Text,
            Self::Table(_) => RegionLabel::Table,
            Self::Formula(_) => RegionLabel::Formula,
            Self::Figure(_) => RegionLabel::Figure,
            Self::Caption(_) => RegionLabel::Caption,
            Self::Header(_) => RegionLabel::Header,
            Self::Footer(_) => RegionLabel::Footer,
            Self::Other(_) => RegionLabel::Other,
        }
    }

    /// Text payload for the text-bearing kinds.
    pub fn text(&self) -> Option<&TextBlock> {
        match self {
            Self::Title(t)
            | Self::Text(t)
            | Self::Caption(t)
            | Self::Header(t)
            | Self::Footer(t)
            | Self::Other(t) => Some(t),
            Self::Table(_) | Self::Formula(_) | Self::Figure(_) => None,
        }
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self::Title(TextBlock::new(text))
    }

    pub fn body(text: impl Into<String>) -> Self {
        Self::Text(TextBlock::new(text))
    }

    pub fn header(text: impl Into<String>) -> Self {
        Self::Header(TextBlock::new(text))
    }

    pub fn footer(text: impl Into<String>) -> Self {
        Self::Footer(TextBlock::new(text))
    }

    pub fn caption(text: impl Into<String>) -> Self {
        Self::Caption(TextBlock::new(text))
    }

    pub fn figure() -> Self {
        Self::Figure(FigureBlock::default())
    }

    pub fn formula(latex: impl Into<String>) -> Self {
        Self::Formula(FormulaBlock {
            latex: latex.into(),
        })
    }

    pub fn table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self::Table(TableBlock { headers, rows })
    }
}

/// Cross-page continuation hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Continuation {
    /// Region sits at the bottom edge and probably continues on the next page.
    pub continues_on_next: bool,
    /// Region sits at the top edge and probably continues the previous page.
    pub continued_from_previous: bool,
}

impl Continuation {
    pub fn is_empty(&self) -> bool {
        !self.continues_on_next && !self.continued_from_previous
    }
}

fn default_confidence() -> f64 {
    1.0
}

/// Clamps into `[0, 1]`; NaN becomes 0.
fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// An explicit `null` reads as no confidence at all.
fn deserialize_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(clamp_confidence(value.unwrap_or(f64::NAN)))
}

/// One detected content element on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(flatten)]
    pub kind: RegionKind,
    pub bbox: BBox,
    #[serde(
        default = "default_confidence",
        deserialize_with = "deserialize_confidence"
    )]
    pub confidence: f64,
    /// 1-based position in the page's reading sequence; `None` until assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Continuation::is_empty")]
    pub continuation: Continuation,
    /// Set by the owning [`Page`](super::Page); never changed afterwards.
    #[serde(skip)]
    pub(crate) page_index: usize,
}

impl Region {
    /// Creates a region. Confidence is clamped into `[0, 1]`.
    pub fn new(kind: RegionKind, bbox: BBox, confidence: f64) -> Self {
        Self {
            kind,
            bbox,
            confidence: clamp_confidence(confidence),
            reading_order: None,
            continuation: Continuation::default(),
            page_index: 0,
        }
    }

    #[inline]
    pub fn label(&self) -> RegionLabel {
        self.kind.label()
    }

    #[inline]
    pub fn page_index(&self) -> usize {
        self.page_index
    }
}
