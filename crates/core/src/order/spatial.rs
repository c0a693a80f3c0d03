//! Geometry-only ordering.

use ordered_float::OrderedFloat;

use crate::model::{Region, RegionLabel};

/// Sort priority of a region kind: headers first, then titles, body content,
/// and footers last.
pub fn type_priority(label: RegionLabel) -> i8 {
    match label {
        RegionLabel::Header => -1,
        RegionLabel::Title => 0,
        RegionLabel::Footer => 2,
        _ => 1,
    }
}

type SpatialKey = (i8, OrderedFloat<f64>, OrderedFloat<f64>);

fn spatial_key(region: &Region) -> SpatialKey {
    (
        type_priority(region.label()),
        OrderedFloat(region.bbox.y1),
        OrderedFloat(region.bbox.x1),
    )
}

/// Orders a subset of `regions` by `(type_priority, top, left)`.
///
/// `indices` selects the regions to sort; the result is those indices in
/// reading order. Equal keys keep their input order.
pub fn spatial_order_of(regions: &[Region], indices: &[usize]) -> Vec<usize> {
    let mut out = indices.to_vec();
    out.sort_by_cached_key(|&i| spatial_key(&regions[i]));
    out
}

/// Orders all regions by `(type_priority, top, left)`, returning indices.
pub fn spatial_order(regions: &[Region]) -> Vec<usize> {
    let all: Vec<usize> = (0..regions.len()).collect();
    spatial_order_of(regions, &all)
}
