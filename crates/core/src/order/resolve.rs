//! Score matrix to permutation.
//!
//! Each region first claims its best-scoring rank. Regions colliding on a
//! rank are separated pass by pass: the strongest claimant (by its score for
//! that rank, smaller index on ties) keeps it, the others fall back to their
//! next preference, and a region with no preferences left takes the lowest
//! free rank. Passes are capped at `2 × N`; hitting the cap leaves the
//! assignment as is and flags it.

use indexmap::IndexMap;
use tracing::warn;

use super::signal::ScoreMatrix;

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// `order[i]` is the 0-based rank assigned to region `i`.
    pub order: Vec<usize>,
    /// Conflict-resolution passes executed.
    pub passes: usize,
    /// True when the pass cap was reached with ranks still shared.
    pub unresolved: bool,
}

impl Resolution {
    /// True if `order` is a permutation of `0..N`.
    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.order.len()];
        for &rank in &self.order {
            match seen.get_mut(rank) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }
}

/// Candidate ranks of one row, ascending by score so the best is on top.
///
/// The sort is stable: among equal scores the higher column sits nearer the
/// top of the stack.
fn candidate_stack(row: &[f64]) -> Vec<usize> {
    let mut cols: Vec<usize> = (0..row.len()).collect();
    cols.sort_by(|&a, &b| row[a].total_cmp(&row[b]));
    cols
}

/// Ranks held by more than one region, keyed in order of first appearance
/// when scanning regions by index.
fn conflicts(order: &[usize]) -> IndexMap<usize, Vec<usize>> {
    let mut by_rank: IndexMap<usize, Vec<usize>> = IndexMap::new();
    for (idx, &rank) in order.iter().enumerate() {
        by_rank.entry(rank).or_default().push(idx);
    }
    by_rank.retain(|_, holders| holders.len() > 1);
    by_rank
}

/// Lowest rank in `0..n` not currently held by any region.
fn lowest_free_rank(order: &[usize]) -> Option<usize> {
    let mut used = vec![false; order.len()];
    for &rank in order {
        if let Some(slot) = used.get_mut(rank) {
            *slot = true;
        }
    }
    used.iter().position(|&u| !u)
}

/// Turns a score matrix into a rank per region.
///
/// The result is deterministic for a given matrix. For `N = 0` the order is
/// empty and for `N = 1` it is `[0]`.
pub fn resolve(matrix: &ScoreMatrix) -> Resolution {
    let n = matrix.size();
    if n <= 1 {
        return Resolution {
            order: vec![0; n],
            passes: 0,
            unresolved: false,
        };
    }

    let mut stacks: Vec<Vec<usize>> = (0..n).map(|i| candidate_stack(matrix.row(i))).collect();
    // Every stack holds n >= 2 candidates here.
    let mut order: Vec<usize> = stacks
        .iter_mut()
        .map(|stack| stack.pop().unwrap_or(0))
        .collect();

    let cap = 2 * n;
    let mut passes = 0;
    let mut pending = conflicts(&order);

    while !pending.is_empty() && passes < cap {
        for (rank, mut holders) in pending {
            // Stable sort: equal scores keep ascending index order.
            holders.sort_by(|&a, &b| matrix.get(b, rank).total_cmp(&matrix.get(a, rank)));
            for &loser in &holders[1..] {
                order[loser] = match stacks[loser].pop() {
                    Some(next) => next,
                    None => lowest_free_rank(&order).unwrap_or(order[loser]),
                };
            }
        }
        passes += 1;
        pending = conflicts(&order);
    }

    let unresolved = !pending.is_empty();
    if unresolved {
        warn!(
            regions = n,
            passes,
            conflicts = pending.len(),
            "rank conflicts left unresolved"
        );
    }

    Resolution {
        order,
        passes,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[f64]]) -> ScoreMatrix {
        ScoreMatrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn test_degenerate_sizes() {
        let r = resolve(&ScoreMatrix::from_rows(vec![]).unwrap());
        assert!(r.order.is_empty());
        assert!(!r.unresolved);

        let r = resolve(&matrix(&[&[0.3]]));
        assert_eq!(r.order, vec![0]);
    }

    #[test]
    fn test_no_conflicts_takes_row_maxima() {
        let m = matrix(&[&[9.0, 1.0, 0.0], &[0.0, 9.0, 1.0], &[1.0, 0.0, 9.0]]);
        let r = resolve(&m);
        assert_eq!(r.order, vec![0, 1, 2]);
        assert_eq!(r.passes, 0);
        assert!(r.is_permutation());
    }

    #[test]
    fn test_higher_score_keeps_contested_rank() {
        let r = resolve(&matrix(&[&[5.0, 1.0], &[4.0, 2.0]]));
        assert_eq!(r.order, vec![0, 1]);
        assert_eq!(r.passes, 1);

        // Same preference, but region 1 holds the stronger claim.
        let r = resolve(&matrix(&[&[4.0, 2.0], &[5.0, 1.0]]));
        assert_eq!(r.order, vec![1, 0]);
    }

    #[test]
    fn test_equal_scores_favor_smaller_index() {
        let r = resolve(&matrix(&[&[3.0, 1.0], &[3.0, 2.0]]));
        assert_eq!(r.order, vec![0, 1]);
    }

    #[test]
    fn test_equal_row_scores_pop_higher_column_first() {
        // Both rows are flat, so both claim column 1 first.
        let r = resolve(&matrix(&[&[1.0, 1.0], &[1.0, 1.0]]));
        assert_eq!(r.order, vec![1, 0]);
    }

    #[test]
    fn test_cascading_conflicts() {
        // All three want rank 0; the losers then collide on rank 1.
        let m = matrix(&[
            &[9.0, 5.0, 1.0],
            &[8.0, 6.0, 2.0],
            &[7.0, 4.0, 3.0],
        ]);
        let r = resolve(&m);
        assert_eq!(r.order, vec![0, 1, 2]);
        assert_eq!(r.passes, 2);
    }

    #[test]
    fn test_is_deterministic() {
        let m = matrix(&[
            &[0.1, 0.9, 0.4, 0.4],
            &[0.2, 0.9, 0.4, 0.1],
            &[0.9, 0.9, 0.9, 0.9],
            &[0.5, 0.5, 0.0, 0.0],
        ]);
        let first = resolve(&m);
        for _ in 0..10 {
            assert_eq!(resolve(&m), first);
        }
        assert!(first.is_permutation());
    }

    #[test]
    fn test_nan_scores_still_yield_permutation() {
        let m = matrix(&[&[f64::NAN, 1.0], &[f64::NAN, 2.0]]);
        assert!(resolve(&m).is_permutation());
    }

    #[test]
    fn test_lowest_free_rank() {
        assert_eq!(lowest_free_rank(&[1, 1, 3, 0]), Some(2));
        assert_eq!(lowest_free_rank(&[1, 0]), None);
    }

    #[test]
    fn test_conflicts_keep_first_appearance_order() {
        let c = conflicts(&[2, 0, 2, 0, 1]);
        let keys: Vec<usize> = c.keys().copied().collect();
        assert_eq!(keys, vec![2, 0]);
        assert_eq!(c[&2], vec![0, 2]);
    }
}
