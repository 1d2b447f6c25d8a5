//! Feature-matrix helpers for training.
//!
//! Training operates on an `ArrayView2<f64>` with rows as samples and
//! columns as features. The only derived artifact is [`ColumnOrder`], the
//! per-column argsort the tree grower walks during split search. It is
//! computed once per `fit` and shared by every boosting iteration.

use ndarray::ArrayView2;

// =============================================================================
// ColumnOrder
// =============================================================================

/// Per-column sort order of a feature matrix.
///
/// `column(j)` yields the row indices sorted ascending by feature `j`.
/// Ties keep their original row order, so the artifact is deterministic for
/// a given matrix.
#[derive(Debug, Clone)]
pub struct ColumnOrder {
    /// Concatenated sorted row indices, one block of `n_rows` per feature.
    order: Vec<u32>,
    n_rows: usize,
    n_features: usize,
}

impl ColumnOrder {
    /// Argsort every column of `features`.
    pub fn from_features(features: ArrayView2<'_, f64>) -> Self {
        let (n_rows, n_features) = features.dim();
        let mut order = Vec::with_capacity(n_rows * n_features);

        for feature in 0..n_features {
            let column = features.column(feature);
            let start = order.len();
            order.extend(0..n_rows as u32);
            order[start..].sort_by(|&a, &b| {
                column[a as usize]
                    .partial_cmp(&column[b as usize])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        Self {
            order,
            n_rows,
            n_features,
        }
    }

    /// Row indices sorted by feature `feature`.
    #[inline]
    pub fn column(&self, feature: usize) -> &[u32] {
        debug_assert!(feature < self.n_features);
        let start = feature * self.n_rows;
        &self.order[start..start + self.n_rows]
    }

    /// Number of rows in the underlying matrix.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of features in the underlying matrix.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn column_order_sorts_each_feature_independently() {
        let x = arr2(&[[3.0, 0.1], [1.0, 0.3], [2.0, 0.2]]);
        let order = ColumnOrder::from_features(x.view());

        assert_eq!(order.column(0), &[1, 2, 0]);
        assert_eq!(order.column(1), &[0, 2, 1]);
    }

    #[test]
    fn column_order_is_stable_for_ties() {
        let x = arr2(&[[5.0], [5.0], [1.0]]);
        let order = ColumnOrder::from_features(x.view());

        assert_eq!(order.column(0), &[2, 0, 1]);
    }

    #[test]
    fn column_order_dims() {
        let x = arr2(&[[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        let order = ColumnOrder::from_features(x.view());

        assert_eq!(order.n_rows(), 2);
        assert_eq!(order.n_features(), 3);
    }
}
