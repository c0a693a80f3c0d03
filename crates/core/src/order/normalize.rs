//! Coordinate normalization onto the canonical 0..1000 grid.
//!
//! Ranking models are trained on page-size independent coordinates, so every
//! bbox is rescaled from page pixels to a fixed `1000 × 1000` grid before the
//! signal sees it. Width and height scale independently.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::BBox;

/// Size of the canonical grid along each axis.
pub const GRID_SIZE: u32 = 1000;

/// A bbox on the canonical grid. Invariant: `right >= left`, `bottom >= top`,
/// all coordinates within `0..=GRID_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct NormalizedBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl NormalizedBox {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        let left = left.min(GRID_SIZE);
        let top = top.min(GRID_SIZE);
        Self {
            left,
            top,
            right: right.clamp(left, GRID_SIZE),
            bottom: bottom.clamp(top, GRID_SIZE),
        }
    }

    pub fn as_array(&self) -> [u32; 4] {
        [self.left, self.top, self.right, self.bottom]
    }
}

impl From<[u32; 4]> for NormalizedBox {
    fn from(v: [u32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<NormalizedBox> for [u32; 4] {
    fn from(b: NormalizedBox) -> Self {
        b.as_array()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("page dimensions must be positive, got {width} x {height}")]
    PageSize { width: f64, height: f64 },

    #[error("region {index} has non-finite coordinates")]
    NonFinite { index: usize },
}

/// Maps one page coordinate onto the grid: clamp to the page, scale, round,
/// clamp to the grid.
#[inline]
fn scale(v: f64, extent: f64) -> u32 {
    let clamped = v.clamp(0.0, extent);
    let scaled = (clamped * f64::from(GRID_SIZE) / extent).round();
    scaled.clamp(0.0, f64::from(GRID_SIZE)) as u32
}

/// Normalizes a single bbox against a page of known-good size.
fn normalize_one(bbox: &BBox, width: f64, height: f64) -> NormalizedBox {
    NormalizedBox::new(
        scale(bbox.x1, width),
        scale(bbox.y1, height),
        scale(bbox.x2, width),
        scale(bbox.y2, height),
    )
}

/// Rescales bboxes from page pixels onto the 0..1000 grid.
///
/// Coordinates outside the page are clamped to it first, so slightly
/// out-of-bounds detector output is tolerated.
///
/// # Errors
/// `GeometryError::PageSize` if either page dimension is not a positive
/// finite number, `GeometryError::NonFinite` if a bbox has NaN or infinite
/// coordinates.
pub fn normalize_boxes<'a, I>(
    bboxes: I,
    width: f64,
    height: f64,
) -> Result<Vec<NormalizedBox>, GeometryError>
where
    I: IntoIterator<Item = &'a BBox>,
{
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(GeometryError::PageSize { width, height });
    }

    bboxes
        .into_iter()
        .enumerate()
        .map(|(index, bbox)| {
            if bbox.is_finite() {
                Ok(normalize_one(bbox, width, height))
            } else {
                Err(GeometryError::NonFinite { index })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scales_each_axis_independently() {
        let boxes = [BBox::new(306.0, 396.0, 612.0, 792.0)];
        let out = normalize_boxes(&boxes, 612.0, 792.0).unwrap();
        assert_eq!(out, vec![NormalizedBox::new(500, 500, 1000, 1000)]);
    }

    #[test]
    fn test_rounds_to_nearest() {
        // 1 / 3 * 1000 = 333.33, 2 / 3 * 1000 = 666.67
        let boxes = [BBox::new(1.0, 2.0, 2.0, 3.0)];
        let out = normalize_boxes(&boxes, 3.0, 3.0).unwrap();
        assert_eq!(out[0].as_array(), [333, 667, 667, 1000]);
    }

    #[test]
    fn test_clamps_out_of_page_coordinates() {
        let boxes = [BBox::new(-20.0, -5.0, 1200.0, 40.0)];
        let out = normalize_boxes(&boxes, 1000.0, 100.0).unwrap();
        assert_eq!(out[0].as_array(), [0, 0, 1000, 400]);
    }

    #[test]
    fn test_box_entirely_outside_page_collapses_to_edge() {
        let boxes = [BBox::new(1500.0, 10.0, 1800.0, 20.0)];
        let out = normalize_boxes(&boxes, 1000.0, 1000.0).unwrap();
        assert_eq!(out[0].left, 1000);
        assert_eq!(out[0].right, 1000);
    }

    #[test]
    fn test_rejects_non_positive_page() {
        let boxes = [BBox::new(0.0, 0.0, 1.0, 1.0)];
        assert!(matches!(
            normalize_boxes(&boxes, 0.0, 100.0),
            Err(GeometryError::PageSize { .. })
        ));
        assert!(normalize_boxes(&boxes, 100.0, -1.0).is_err());
        assert!(normalize_boxes(&boxes, f64::NAN, 100.0).is_err());
    }

    #[test]
    fn test_rejects_non_finite_bbox() {
        let boxes = [
            BBox::new(0.0, 0.0, 1.0, 1.0),
            BBox {
                x1: f64::NAN,
                y1: 0.0,
                x2: 1.0,
                y2: 1.0,
            },
        ];
        assert_eq!(
            normalize_boxes(&boxes, 10.0, 10.0),
            Err(GeometryError::NonFinite { index: 1 })
        );
    }

    #[test]
    fn test_normalized_box_new_enforces_ordering() {
        let b = NormalizedBox::new(600, 700, 100, 1200);
        assert_eq!(b.as_array(), [600, 700, 600, 1000]);
    }
}
