//! Loss functions for stage-wise boosting.
//!
//! Each variant of [`Loss`] fixes four pieces of numerical policy:
//!
//! - the constant initial prediction ([`Loss::initial_value`])
//! - the deviance used for monitoring ([`Loss::deviance`])
//! - the per-sample pseudo-residual ([`Loss::negative_gradient_into`])
//! - the terminal-region refinement applied after tree induction
//!   ([`Loss::update_terminal_regions`])
//!
//! The refinement step is what makes boosting correct for losses other than
//! squared error: the induced tree minimizes squared error on the pseudo-
//! residual, which is only a first-order proxy, so LAD and binomial deviance
//! re-derive each leaf's output from the true targets before the leaf is
//! folded into the running prediction.

use std::str::FromStr;

use ndarray::{ArrayView1, ArrayViewMut1};

use crate::repr::Tree;
use crate::training::grower::TerminalRegions;
use crate::utils::{log1p_exp, median, sigmoid};

// =============================================================================
// Loss
// =============================================================================

/// Loss family for boosting, dispatched on the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Loss {
    /// Squared error regression (`"ls"`).
    #[default]
    LeastSquares,
    /// Least absolute deviation regression (`"lad"`).
    LeastAbsoluteDeviation,
    /// Binomial deviance for binary classification (`"deviance"`).
    BinomialDeviance,
}

impl Loss {
    /// Short tag used in configuration and log output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LeastSquares => "ls",
            Self::LeastAbsoluteDeviation => "lad",
            Self::BinomialDeviance => "deviance",
        }
    }

    /// Optimal constant prediction for `targets`, used to seed the ensemble.
    ///
    /// Mean for squared error, median for LAD, and the prior log-odds
    /// `ln(Σy / Σ(1-y))` for binomial deviance (targets in {0, 1}).
    pub fn initial_value(&self, targets: ArrayView1<'_, f64>) -> f64 {
        let n = targets.len();
        match self {
            Self::LeastSquares => targets.sum() / n as f64,
            Self::LeastAbsoluteDeviation => {
                let values: Vec<f64> = targets.iter().cloned().collect();
                median(&values, &mut Vec::new())
            }
            Self::BinomialDeviance => {
                let pos = targets.sum();
                let neg = n as f64 - pos;
                (pos / neg).ln()
            }
        }
    }

    // =========================================================================
    // Deviance
    // =========================================================================

    /// Loss value over all rows.
    ///
    /// Mean squared error, mean absolute error, or the binomial deviance
    /// `-2 * mean(y*pred - ln(1 + exp(pred)))` computed through the stable
    /// [`log1p_exp`] so large |pred| cannot overflow.
    pub fn deviance(&self, targets: ArrayView1<'_, f64>, pred: ArrayView1<'_, f64>) -> f64 {
        self.deviance_over(targets.iter().zip(pred.iter()).map(|(&y, &p)| (y, p)))
    }

    /// Loss value over the rows where `mask[row] == keep`.
    ///
    /// An empty selection yields 0.0 so deviance traces stay finite.
    pub(crate) fn deviance_where(
        &self,
        targets: ArrayView1<'_, f64>,
        pred: ArrayView1<'_, f64>,
        mask: &[bool],
        keep: bool,
    ) -> f64 {
        self.deviance_over(
            targets
                .iter()
                .zip(pred.iter())
                .zip(mask.iter())
                .filter(|(_, &m)| m == keep)
                .map(|((&y, &p), _)| (y, p)),
        )
    }

    fn deviance_over(&self, rows: impl Iterator<Item = (f64, f64)>) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for (y, p) in rows {
            sum += match self {
                Self::LeastSquares => {
                    let diff = y - p;
                    diff * diff
                }
                Self::LeastAbsoluteDeviation => (y - p).abs(),
                Self::BinomialDeviance => y * p - log1p_exp(p),
            };
            count += 1;
        }
        if count == 0 {
            return 0.0;
        }
        match self {
            Self::BinomialDeviance => -2.0 * sum / count as f64,
            _ => sum / count as f64,
        }
    }

    // =========================================================================
    // Negative Gradient
    // =========================================================================

    /// Write the per-sample pseudo-residual into `residual`.
    ///
    /// `y - pred` for squared error, `sign(y - pred)` (with `sign(0) = 0`)
    /// for LAD, `y - sigmoid(pred)` for binomial deviance.
    pub fn negative_gradient_into(
        &self,
        targets: ArrayView1<'_, f64>,
        pred: ArrayView1<'_, f64>,
        mut residual: ArrayViewMut1<'_, f64>,
    ) {
        for ((&y, &p), r) in targets.iter().zip(pred.iter()).zip(residual.iter_mut()) {
            *r = match self {
                Self::LeastSquares => y - p,
                Self::LeastAbsoluteDeviation => {
                    let diff = y - p;
                    if diff > 0.0 {
                        1.0
                    } else if diff < 0.0 {
                        -1.0
                    } else {
                        0.0
                    }
                }
                Self::BinomialDeviance => y - sigmoid(p),
            };
        }
    }

    // =========================================================================
    // Terminal-Region Refinement
    // =========================================================================

    /// Refine the leaf values of a freshly induced tree, then fold the tree
    /// into the running prediction.
    ///
    /// Least squares keeps the tree's own squared-error leaf fit. LAD
    /// rewrites each leaf to the median of `y - pred` over its rows.
    /// Binomial deviance takes one Newton step per leaf,
    /// `Σ residual / Σ (y - residual)(1 - y + residual)`; a leaf whose
    /// denominator is exactly zero gets value 0.0; degenerate leaves stall
    /// rather than abort.
    ///
    /// Afterwards, every row with a defined leaf assignment advances by
    /// `learn_rate * leaf_value`. Rows outside the induction mask keep their
    /// previous prediction; the driver updates them separately.
    pub fn update_terminal_regions(
        &self,
        tree: &mut Tree,
        regions: &TerminalRegions,
        targets: ArrayView1<'_, f64>,
        residual: ArrayView1<'_, f64>,
        mut pred: ArrayViewMut1<'_, f64>,
        learn_rate: f64,
    ) {
        match self {
            Self::LeastSquares => {}
            Self::LeastAbsoluteDeviation => {
                let mut diffs = Vec::new();
                let mut scratch = Vec::new();
                for (leaf, rows) in rows_by_leaf(tree, regions) {
                    diffs.clear();
                    diffs.extend(rows.iter().map(|&row| targets[row] - pred[row]));
                    tree.set_leaf_value(leaf, median(&diffs, &mut scratch));
                }
            }
            Self::BinomialDeviance => {
                for (leaf, rows) in rows_by_leaf(tree, regions) {
                    let mut numerator = 0.0;
                    let mut denominator = 0.0;
                    for &row in &rows {
                        let y = targets[row];
                        let r = residual[row];
                        numerator += r;
                        denominator += (y - r) * (1.0 - y + r);
                    }
                    let value = if denominator == 0.0 {
                        0.0
                    } else {
                        numerator / denominator
                    };
                    tree.set_leaf_value(leaf, value);
                }
            }
        }

        for (row, slot) in regions.iter() {
            if let Some(leaf) = slot {
                pred[row] += learn_rate * tree.value(leaf);
            }
        }
    }
}

/// Group assigned rows by leaf, skipping leaves no masked row reached.
fn rows_by_leaf(tree: &Tree, regions: &TerminalRegions) -> Vec<(crate::repr::NodeId, Vec<usize>)> {
    let mut rows: Vec<Vec<usize>> = vec![Vec::new(); tree.n_nodes()];
    for (row, slot) in regions.iter() {
        if let Some(leaf) = slot {
            rows[leaf as usize].push(row);
        }
    }
    rows.into_iter()
        .enumerate()
        .filter(|(_, leaf_rows)| !leaf_rows.is_empty())
        .map(|(leaf, leaf_rows)| (leaf as crate::repr::NodeId, leaf_rows))
        .collect()
}

// =============================================================================
// Loss Parsing
// =============================================================================

/// Error returned when a loss tag is not one of `"ls"`, `"lad"`,
/// `"deviance"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown loss '{0}', expected one of: ls, lad, deviance")]
pub struct UnknownLossError(pub String);

impl FromStr for Loss {
    type Err = UnknownLossError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "ls" => Ok(Self::LeastSquares),
            "lad" => Ok(Self::LeastAbsoluteDeviation),
            "deviance" => Ok(Self::BinomialDeviance),
            other => Err(UnknownLossError(other.to_string())),
        }
    }
}

// =============================================================================
// InitPredictor
// =============================================================================

/// Constant predictor that seeds the ensemble before boosting.
///
/// Normally produced by the loss family via [`InitPredictor::fit`]; callers
/// may instead supply a pre-fit constant through the configuration. An
/// unfitted custom predictor is rejected when the configuration is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitPredictor {
    value: Option<f64>,
}

impl InitPredictor {
    /// A predictor with no fitted value yet.
    pub fn unfitted() -> Self {
        Self { value: None }
    }

    /// A pre-fit predictor returning `value` for every row.
    pub fn constant(value: f64) -> Self {
        Self { value: Some(value) }
    }

    /// Fit the constant from `targets` under `loss`.
    pub fn fit(&mut self, targets: ArrayView1<'_, f64>, loss: Loss) {
        self.value = Some(loss.initial_value(targets));
    }

    /// The fitted constant, if any.
    #[inline]
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Whether [`InitPredictor::fit`] ran or a constant was supplied.
    #[inline]
    pub fn is_fitted(&self) -> bool {
        self.value.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
