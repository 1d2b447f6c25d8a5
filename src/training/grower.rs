//! Regression-tree induction over presorted feature columns.
//!
//! [`TreeGrower`] is the induction service the boosting driver calls once
//! per iteration: given per-row targets (pseudo-residuals) and a boolean row
//! mask, it grows a depth-bounded tree minimizing total squared error over
//! the masked rows and reports which leaf every masked row landed in.
//!
//! Split search is exhaustive: each node walks every feature's presorted
//! order ([`ColumnOrder`]) restricted to the node's rows, evaluating the
//! error reduction of every boundary between distinct adjacent values via
//! prefix sums. No randomness is involved, so induction is deterministic.

use ndarray::{ArrayView1, ArrayView2};

use crate::data::ColumnOrder;
use crate::repr::{NodeId, Tree};

// =============================================================================
// GrowerParams
// =============================================================================

/// Stopping and split constraints for tree induction.
#[derive(Debug, Clone)]
pub struct GrowerParams {
    /// Maximum number of split levels below the root.
    pub max_depth: usize,
    /// Minimum rows a node needs to be considered for splitting.
    pub min_samples_split: usize,
    /// Minimum rows each child of a split must keep.
    pub min_samples_leaf: usize,
    /// Minimum squared-error reduction a split must achieve (exclusive).
    pub min_gain: f64,
}

impl Default for GrowerParams {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_split: 1,
            min_samples_leaf: 1,
            min_gain: 0.0,
        }
    }
}

// =============================================================================
// TerminalRegions
// =============================================================================

/// Per-sample leaf assignment of one induced tree.
///
/// `None` marks rows outside the induction mask. This is an owned, per-call
/// output of [`TreeGrower::grow`], consumed by the loss refinement step and
/// dropped at the end of the iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalRegions {
    slots: Vec<Option<NodeId>>,
}

impl TerminalRegions {
    fn new(n_rows: usize) -> Self {
        Self {
            slots: vec![None; n_rows],
        }
    }

    #[cfg(test)]
    pub(crate) fn from_slots(slots: Vec<Option<NodeId>>) -> Self {
        Self { slots }
    }

    fn assign(&mut self, row: usize, leaf: NodeId) {
        self.slots[row] = Some(leaf);
    }

    /// Leaf id for `row`, or `None` if the row was outside the mask.
    #[inline]
    pub fn leaf(&self, row: usize) -> Option<NodeId> {
        self.slots[row]
    }

    /// Number of rows covered (masked and unmasked).
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no rows are covered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over `(row, leaf assignment)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<NodeId>)> + '_ {
        self.slots.iter().enumerate().map(|(row, &slot)| (row, slot))
    }
}

// =============================================================================
// TreeGrower
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Grows squared-error regression trees for the boosting driver.
pub struct TreeGrower<'a, 'o> {
    features: ArrayView2<'a, f64>,
    order: &'o ColumnOrder,
    params: GrowerParams,
}

impl<'a, 'o> TreeGrower<'a, 'o> {
    /// Create a grower over `features` and its pre-sort artifact.
    pub fn new(
        features: ArrayView2<'a, f64>,
        order: &'o ColumnOrder,
        params: GrowerParams,
    ) -> Self {
        debug_assert_eq!(features.nrows(), order.n_rows());
        debug_assert_eq!(features.ncols(), order.n_features());
        Self {
            features,
            order,
            params,
        }
    }

    /// Grow one tree fitting `targets` over the rows where `mask` is true.
    ///
    /// Returns `None` when the mask selects no rows, since there is nothing to
    /// induce a tree from.
    pub fn grow(
        &self,
        targets: ArrayView1<'_, f64>,
        mask: &[bool],
    ) -> Option<(Tree, TerminalRegions)> {
        let n_rows = self.features.nrows();
        debug_assert_eq!(targets.len(), n_rows);
        debug_assert_eq!(mask.len(), n_rows);

        let n_in = mask.iter().filter(|&&m| m).count();
        if n_in == 0 {
            return None;
        }

        let mut tree = Tree::new();
        let mut regions = TerminalRegions::new(n_rows);
        self.build_node(targets, mask.to_vec(), n_in, 0, &mut tree, &mut regions);
        Some((tree, regions))
    }

    fn build_node(
        &self,
        targets: ArrayView1<'_, f64>,
        node_mask: Vec<bool>,
        n_node: usize,
        depth: usize,
        tree: &mut Tree,
        regions: &mut TerminalRegions,
    ) -> NodeId {
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for (row, &in_node) in node_mask.iter().enumerate() {
            if in_node {
                let y = targets[row];
                sum += y;
                sum_sq += y * y;
            }
        }
        let mean = sum / n_node as f64;

        let splittable = depth < self.params.max_depth
            && n_node >= self.params.min_samples_split
            && n_node >= 2 * self.params.min_samples_leaf
            && sum_sq - sum * sum / n_node as f64 > 0.0;
        if !splittable {
            return Self::make_leaf(tree, regions, &node_mask, mean);
        }

        let split = match self.find_best_split(targets, &node_mask, n_node, sum) {
            Some(split) => split,
            None => return Self::make_leaf(tree, regions, &node_mask, mean),
        };

        let column = self.features.column(split.feature);
        let mut left_mask = vec![false; node_mask.len()];
        let mut right_mask = vec![false; node_mask.len()];
        let mut n_left = 0usize;
        for (row, &in_node) in node_mask.iter().enumerate() {
            if !in_node {
                continue;
            }
            if column[row] < split.threshold {
                left_mask[row] = true;
                n_left += 1;
            } else {
                right_mask[row] = true;
            }
        }
        // A midpoint between adjacent floats can round onto one of them and
        // leave a child empty; treat the node as unsplittable instead.
        if n_left == 0 || n_left == n_node {
            return Self::make_leaf(tree, regions, &node_mask, mean);
        }

        let node = tree.push_split(split.feature, split.threshold, mean, split.gain);
        let left = self.build_node(targets, left_mask, n_left, depth + 1, tree, regions);
        let right = self.build_node(targets, right_mask, n_node - n_left, depth + 1, tree, regions);
        tree.set_children(node, left, right);
        node
    }

    fn make_leaf(
        tree: &mut Tree,
        regions: &mut TerminalRegions,
        node_mask: &[bool],
        value: f64,
    ) -> NodeId {
        let leaf = tree.push_leaf(value);
        for (row, &in_node) in node_mask.iter().enumerate() {
            if in_node {
                regions.assign(row, leaf);
            }
        }
        leaf
    }

    /// Best squared-error split for a node, if any boundary satisfies the
    /// leaf-size constraint and improves the error by more than `min_gain`.
    ///
    /// The gain is the exact reduction in total squared error,
    /// `Σ_L²/n_L + Σ_R²/n_R - Σ²/n`, accumulated in sorted order per feature.
    fn find_best_split(
        &self,
        targets: ArrayView1<'_, f64>,
        node_mask: &[bool],
        n_node: usize,
        total_sum: f64,
    ) -> Option<SplitCandidate> {
        let min_leaf = self.params.min_samples_leaf;
        let parent_score = total_sum * total_sum / n_node as f64;
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..self.features.ncols() {
            let column = self.features.column(feature);
            let mut left_sum = 0.0;
            let mut left_count = 0usize;
            let mut prev_value = f64::NAN;

            for &sorted_row in self.order.column(feature) {
                let row = sorted_row as usize;
                if !node_mask[row] {
                    continue;
                }
                let value = column[row];

                if value > prev_value
                    && left_count >= min_leaf
                    && n_node - left_count >= min_leaf
                {
                    let right_sum = total_sum - left_sum;
                    let right_count = (n_node - left_count) as f64;
                    let gain = left_sum * left_sum / left_count as f64
                        + right_sum * right_sum / right_count
                        - parent_score;
                    let improves = match best {
                        Some(b) => gain > b.gain,
                        None => true,
                    };
                    if gain > self.params.min_gain && improves {
                        best = Some(SplitCandidate {
                            feature,
                            threshold: 0.5 * (prev_value + value),
                            gain,
                        });
                    }
                }

                left_sum += targets[row];
                left_count += 1;
                prev_value = value;
            }
        }

        best
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array1, Array2};

    fn grow(
        x: &Array2<f64>,
        y: &Array1<f64>,
        mask: &[bool],
        params: GrowerParams,
    ) -> Option<(Tree, TerminalRegions)> {
        let order = ColumnOrder::from_features(x.view());
        TreeGrower::new(x.view(), &order, params).grow(y.view(), mask)
    }

    #[test]
    fn stump_splits_at_the_obvious_boundary() {
        let x = arr2(&[[0.0], [1.0], [10.0], [11.0]]);
        let y = arr1(&[0.0, 0.0, 5.0, 5.0]);
        let params = GrowerParams {
            max_depth: 1,
            ..Default::default()
        };
        let (tree, _) = grow(&x, &y, &[true; 4], params).unwrap();

        assert_eq!(tree.n_nodes(), 3);
        assert!(!tree.is_leaf(0));
        assert_eq!(tree.split_feature(0), 0);
        assert!((tree.threshold(0) - 5.5).abs() < 1e-12);
        assert_eq!(tree.predict_row(arr1(&[0.5]).view()), 0.0);
        assert_eq!(tree.predict_row(arr1(&[10.5]).view()), 5.0);
    }

    #[test]
    fn unconstrained_depth_fits_distinct_rows_exactly() {
        let x = arr2(&[[0.0], [1.0], [2.0]]);
        let y = arr1(&[0.0, 2.0, 4.0]);
        let params = GrowerParams {
            max_depth: 32,
            ..Default::default()
        };
        let (tree, _) = grow(&x, &y, &[true; 3], params).unwrap();

        for (row, &target) in x.rows().into_iter().zip(y.iter()) {
            assert_eq!(tree.predict_row(row), target);
        }
    }

    #[test]
    fn constant_targets_collapse_to_a_single_leaf() {
        let x = arr2(&[[0.0], [1.0], [2.0]]);
        let y = arr1(&[3.0, 3.0, 3.0]);
        let (tree, regions) = grow(&x, &y, &[true; 3], GrowerParams::default()).unwrap();

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.value(0), 3.0);
        assert!(regions.iter().all(|(_, slot)| slot == Some(0)));
    }

    #[test]
    fn min_samples_leaf_blocks_unbalanced_splits() {
        // The only payoff split isolates one row; forbidding 1-row leaves
        // must suppress it.
        let x = arr2(&[[0.0], [1.0], [2.0], [3.0]]);
        let y = arr1(&[0.0, 0.0, 0.0, 9.0]);
        let params = GrowerParams {
            max_depth: 1,
            min_samples_leaf: 2,
            ..Default::default()
        };
        let (tree, _) = grow(&x, &y, &[true; 4], params).unwrap();

        if !tree.is_leaf(0) {
            // If it split anyway, both children must hold >= 2 rows, so the
            // boundary sits between rows 1 and 2.
            assert!((tree.threshold(0) - 1.5).abs() < 1e-12);
        }
    }

    #[test]
    fn min_samples_split_forces_a_leaf() {
        let x = arr2(&[[0.0], [1.0], [2.0]]);
        let y = arr1(&[0.0, 1.0, 2.0]);
        let params = GrowerParams {
            min_samples_split: 4,
            ..Default::default()
        };
        let (tree, _) = grow(&x, &y, &[true; 3], params).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.value(0), 1.0);
    }

    #[test]
    fn mask_restricts_training_rows() {
        // Row 3 carries an extreme target but is masked out; the tree must
        // ignore it entirely.
        let x = arr2(&[[0.0], [1.0], [2.0], [3.0]]);
        let y = arr1(&[1.0, 1.0, 1.0, 100.0]);
        let mask = [true, true, true, false];
        let (tree, regions) = grow(&x, &y, &mask, GrowerParams::default()).unwrap();

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.value(0), 1.0);
        assert_eq!(regions.leaf(3), None);
        assert!(regions.leaf(0).is_some());
    }

    #[test]
    fn empty_mask_yields_none() {
        let x = arr2(&[[0.0], [1.0]]);
        let y = arr1(&[0.0, 1.0]);
        assert!(grow(&x, &y, &[false, false], GrowerParams::default()).is_none());
    }

    #[test]
    fn terminal_regions_agree_with_traversal() {
        let x = arr2(&[[0.0, 5.0], [1.0, 4.0], [2.0, 3.0], [3.0, 2.0], [4.0, 1.0]]);
        let y = arr1(&[0.0, 0.5, 3.0, 3.5, 4.0]);
        let (tree, regions) = grow(&x, &y, &[true; 5], GrowerParams::default()).unwrap();

        for (row, slot) in regions.iter() {
            let leaf = slot.expect("all rows are in the mask");
            assert_eq!(leaf, tree.leaf_for(x.row(row)));
        }
    }

    #[test]
    fn deeper_trees_never_increase_training_error() {
        let x = arr2(&[[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0]]);
        let y = arr1(&[0.0, 1.0, 1.5, 3.0, 2.5, 5.0, 4.5, 7.0]);

        let sse = |max_depth: usize| {
            let params = GrowerParams {
                max_depth,
                ..Default::default()
            };
            let (tree, _) = grow(&x, &y, &[true; 8], params).unwrap();
            x.rows()
                .into_iter()
                .zip(y.iter())
                .map(|(row, &target)| (tree.predict_row(row) - target).powi(2))
                .sum::<f64>()
        };

        assert!(sse(2) <= sse(1) + 1e-12);
        assert!(sse(3) <= sse(2) + 1e-12);
    }
}
