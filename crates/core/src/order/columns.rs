//! Column detection for multi-column pages.

use itertools::Itertools;

use crate::model::Region;

/// Splits regions into left-to-right columns.
///
/// Text-bearing regions are clustered by x-center: sorted by center, a new
/// column starts wherever the gap to the previous center exceeds `gap`.
/// Every other region joins the column whose mean text center is nearest
/// (leftmost on ties). Each column lists region indices in detection order.
///
/// Headers and footers span the page rather than a column; they are left out
/// of every group and the caller places them around the columns.
///
/// With fewer than two text regions, or fewer than two columns, the result is
/// a single group holding every other index.
pub fn detect_columns(regions: &[Region], gap: f64) -> Vec<Vec<usize>> {
    let single = || {
        vec![
            (0..regions.len())
                .filter(|&i| !regions[i].label().is_page_furniture())
                .collect::<Vec<_>>(),
        ]
    };

    let text: Vec<usize> = (0..regions.len())
        .filter(|&i| regions[i].label().is_text_bearing())
        .collect();
    if text.len() < 2 {
        return single();
    }

    let by_center: Vec<usize> = text
        .iter()
        .copied()
        .sorted_by(|&a, &b| {
            regions[a]
                .bbox
                .center_x()
                .total_cmp(&regions[b].bbox.center_x())
        })
        .collect();

    let mut columns: Vec<Vec<usize>> = vec![vec![by_center[0]]];
    for (&prev, &cur) in by_center.iter().tuple_windows() {
        let step = regions[cur].bbox.center_x() - regions[prev].bbox.center_x();
        if step > gap {
            columns.push(vec![cur]);
        } else if let Some(last) = columns.last_mut() {
            last.push(cur);
        }
    }
    if columns.len() < 2 {
        return single();
    }

    let means: Vec<f64> = columns
        .iter()
        .map(|col| col.iter().map(|&i| regions[i].bbox.center_x()).sum::<f64>() / col.len() as f64)
        .collect();

    for (i, region) in regions.iter().enumerate() {
        let label = region.label();
        if label.is_text_bearing() || label.is_page_furniture() {
            continue;
        }
        let cx = region.bbox.center_x();
        let nearest = means
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (cx - **a).abs().total_cmp(&(cx - **b).abs()))
            .map(|(c, _)| c)
            .unwrap_or(0);
        columns[nearest].push(i);
    }

    for col in &mut columns {
        col.sort_unstable();
    }
    columns
}
