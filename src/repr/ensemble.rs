//! Fitted additive ensemble: initial score plus shrunken tree outputs.

use ndarray::{Array1, ArrayView2};

use super::Tree;

// =============================================================================
// Ensemble
// =============================================================================

/// The artifact produced by boosting.
///
/// Append-only while the driver runs, immutable afterwards. Each estimator
/// instance owns its ensemble exclusively; prediction is a pure read.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    base_score: f64,
    shrinkage: f64,
    n_features: usize,
    trees: Vec<Tree>,
}

impl Ensemble {
    /// Create an empty ensemble seeded with the fitted initial score.
    pub(crate) fn new(base_score: f64, shrinkage: f64, n_features: usize) -> Self {
        Self {
            base_score,
            shrinkage,
            n_features,
            trees: Vec::new(),
        }
    }

    /// Append the tree of a completed boosting iteration.
    pub(crate) fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    /// Constant prediction before any tree contributes.
    #[inline]
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Learning rate applied to every tree's output.
    #[inline]
    pub fn shrinkage(&self) -> f64 {
        self.shrinkage
    }

    /// Number of features the ensemble was fit on.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of retained trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Iterate over the retained trees in boosting order.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Access a single tree by boosting iteration.
    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Raw additive score for every row of `features`:
    /// `base_score + shrinkage * Σ tree(row)`.
    pub fn predict_raw(&self, features: ArrayView2<'_, f64>) -> Array1<f64> {
        let mut scores = Array1::from_elem(features.nrows(), self.base_score);
        for tree in &self.trees {
            for (row, score) in features.rows().into_iter().zip(scores.iter_mut()) {
                *score += self.shrinkage * tree.predict_row(row);
            }
        }
        scores
    }

    // =========================================================================
    // Importance
    // =========================================================================

    /// Per-feature importances: squared split gains averaged over trees,
    /// rescaled so the maximum equals 100.
    ///
    /// An ensemble whose trees never split (all stumps collapsed to single
    /// leaves) has all-zero importances; the rescale is skipped rather than
    /// dividing by zero.
    pub fn feature_importances(&self) -> Array1<f64> {
        let mut importances = Array1::zeros(self.n_features);
        for tree in &self.trees {
            tree.accumulate_importances(&mut importances);
        }
        if !self.trees.is_empty() {
            importances /= self.trees.len() as f64;
        }

        let max = importances.iter().cloned().fold(0.0f64, f64::max);
        if max > 0.0 {
            importances *= 100.0 / max;
        }
        importances
    }
}

// =============================================================================
// Tests
// =============================================================================
