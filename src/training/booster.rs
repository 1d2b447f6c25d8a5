//! The stage-wise boosting driver.
//!
//! [`Booster`] owns one `fit` run: it seeds predictions with the initial
//! constant, then per iteration computes the pseudo-residual, asks the
//! grower for a squared-error tree over the (possibly subsampled) rows,
//! lets the loss refine the tree's leaves and fold them into the running
//! prediction, records train/out-of-bag deviance, and finally offers the
//! iteration to an optional monitor which may halt the loop.
//!
//! `fit` runs to completion (or early halt) within one call; all working
//! state (residual vector, row mask, terminal regions) is iteration-scoped
//! and never escapes. Failure of any single iteration aborts the run; there
//! are no retries and no partially fitted result.

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::ColumnOrder;
use crate::repr::Ensemble;
use crate::training::callback::{FitProgress, Monitor};
use crate::training::grower::{GrowerParams, TreeGrower};
use crate::training::logger::{TrainingLogger, Verbosity};
use crate::training::loss::Loss;
use crate::training::sampling::RowSampler;

// =============================================================================
// BoostParams
// =============================================================================

/// Parameters consumed by the driver.
///
/// This is the mid-level, already-validated parameter set; the model layer's
/// `BoostingConfig` validates user input eagerly and converts to this.
#[derive(Debug, Clone)]
pub struct BoostParams {
    /// Loss family to optimize.
    pub loss: Loss,
    /// Shrinkage applied to every tree's contribution.
    pub learn_rate: f64,
    /// Number of boosting iterations.
    pub n_estimators: usize,
    /// Maximum depth of each regression tree.
    pub max_depth: usize,
    /// Minimum rows a tree node needs to be split.
    pub min_samples_split: usize,
    /// Minimum rows per tree leaf.
    pub min_samples_leaf: usize,
    /// Bernoulli row-inclusion probability per iteration, in (0, 1].
    pub subsample: f64,
    /// Pre-fit initial score; `None` lets the loss fit one from the targets.
    pub init_score: Option<f64>,
    /// Seed for the subsampling generator.
    pub seed: u64,
    /// Training output level.
    pub verbosity: Verbosity,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            loss: Loss::LeastSquares,
            learn_rate: 0.1,
            n_estimators: 100,
            max_depth: 3,
            min_samples_split: 1,
            min_samples_leaf: 1,
            subsample: 1.0,
            init_score: None,
            seed: 42,
            verbosity: Verbosity::Silent,
        }
    }
}

// =============================================================================
// FitError
// =============================================================================

/// Errors raised while fitting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FitError {
    /// Feature matrix and target vector disagree on the number of rows.
    #[error("number of targets ({n_targets}) does not match number of samples ({n_samples})")]
    ShapeMismatch {
        /// Rows in the feature matrix.
        n_samples: usize,
        /// Entries in the target vector.
        n_targets: usize,
    },

    /// The training set has no rows.
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    /// A subsampling draw selected zero rows, leaving nothing to induce a
    /// tree from.
    #[error("subsample draw at iteration {iteration} selected no rows")]
    EmptySubsample {
        /// Iteration at which the draw came up empty.
        iteration: usize,
    },

    /// Classification targets did not form exactly two classes.
    #[error("expected exactly 2 classes, found {n_classes}")]
    NonBinaryTarget {
        /// Number of distinct labels observed.
        n_classes: usize,
    },
}

// =============================================================================
// FitOutcome
// =============================================================================

/// Everything a completed (or halted) fit produces.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// The fitted additive model.
    pub ensemble: Ensemble,
    /// Training deviance per completed iteration.
    pub train_deviance: Vec<f64>,
    /// Out-of-bag deviance per completed iteration; empty unless
    /// `subsample < 1`.
    pub oob_deviance: Vec<f64>,
}

// =============================================================================
// Booster
// =============================================================================

/// Runs the boosting iterations for one estimator.
pub struct Booster {
    params: BoostParams,
}

impl Booster {
    /// Create a driver over the given parameters.
    pub fn new(params: BoostParams) -> Self {
        Self { params }
    }

    /// Access the driver's parameters.
    pub fn params(&self) -> &BoostParams {
        &self.params
    }

    /// Fit an ensemble on `(features, targets)`.
    ///
    /// The monitor, when present, is invoked once per completed iteration;
    /// returning `true` halts the loop immediately while keeping every tree
    /// appended so far. Identical seed, data, and parameters reproduce the
    /// returned ensemble exactly.
    pub fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        mut monitor: Option<&mut dyn Monitor>,
    ) -> Result<FitOutcome, FitError> {
        let (n_rows, n_features) = features.dim();
        if targets.len() != n_rows {
            return Err(FitError::ShapeMismatch {
                n_samples: n_rows,
                n_targets: targets.len(),
            });
        }
        if n_rows == 0 {
            return Err(FitError::EmptyTrainingSet);
        }
        let params = &self.params;

        // Fit the initial constant predictor unless a pre-fit one was given.
        let base_score = params
            .init_score
            .unwrap_or_else(|| params.loss.initial_value(targets));

        let order = ColumnOrder::from_features(features);
        let grower = TreeGrower::new(
            features,
            &order,
            GrowerParams {
                max_depth: params.max_depth,
                min_samples_split: params.min_samples_split,
                min_samples_leaf: params.min_samples_leaf,
                min_gain: 0.0,
            },
        );
        let sampler = RowSampler::new(params.subsample);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        let logger = TrainingLogger::new(params.verbosity);

        let mut ensemble = Ensemble::new(base_score, params.learn_rate, n_features);
        let mut predictions = Array1::from_elem(n_rows, base_score);
        let mut residual = Array1::zeros(n_rows);
        let mut mask = vec![true; n_rows];
        let mut train_deviance = Vec::with_capacity(params.n_estimators);
        let mut oob_deviance = Vec::new();

        logger.start_training(params.loss.name(), params.n_estimators);

        for iteration in 0..params.n_estimators {
            if sampler.is_enabled() {
                sampler.draw_into(&mut rng, &mut mask);
            }

            // Pseudo-residuals for every row; the mask only restricts which
            // rows the tree trains on.
            params
                .loss
                .negative_gradient_into(targets, predictions.view(), residual.view_mut());

            let (mut tree, regions) = grower
                .grow(residual.view(), &mask)
                .ok_or(FitError::EmptySubsample { iteration })?;

            // Refine leaves against the true targets and advance in-bag
            // predictions.
            params.loss.update_terminal_regions(
                &mut tree,
                &regions,
                targets,
                residual.view(),
                predictions.view_mut(),
                params.learn_rate,
            );

            // Held-out rows advance by the newest tree's contribution only,
            // then score the out-of-bag deviance.
            if sampler.is_enabled() {
                for (row, &in_bag) in mask.iter().enumerate() {
                    if !in_bag {
                        predictions[row] +=
                            params.learn_rate * tree.predict_row(features.row(row));
                    }
                }
                oob_deviance.push(params.loss.deviance_where(
                    targets,
                    predictions.view(),
                    &mask,
                    false,
                ));
            }

            train_deviance.push(params.loss.deviance_where(
                targets,
                predictions.view(),
                &mask,
                true,
            ));
            logger.log_round(
                iteration,
                train_deviance[iteration],
                oob_deviance.last().copied(),
            );

            ensemble.push_tree(tree);

            if let Some(monitor) = monitor.as_deref_mut() {
                let progress = FitProgress {
                    iteration,
                    ensemble: &ensemble,
                    train_deviance: &train_deviance,
                    oob_deviance: &oob_deviance,
                };
                if monitor.observe(&progress) {
                    logger.log_halt(iteration);
                    break;
                }
            }
        }

        logger.finish_training(ensemble.n_trees());

        Ok(FitOutcome {
            ensemble,
            train_deviance,
            oob_deviance,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn ramp() -> (ndarray::Array2<f64>, Array1<f64>) {
        let x = arr2(&[[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0]]);
        let y = arr1(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        (x, y)
    }

    #[test]
    fn shape_mismatch_is_rejected_before_boosting() {
        let x = arr2(&[[0.0], [1.0]]);
        let y = arr1(&[0.0, 1.0, 2.0]);
        let err = Booster::new(BoostParams::default())
            .fit(x.view(), y.view(), None)
            .unwrap_err();
        assert_eq!(
            err,
            FitError::ShapeMismatch {
                n_samples: 2,
                n_targets: 3
            }
        );
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let x = ndarray::Array2::<f64>::zeros((0, 1));
        let y = Array1::<f64>::zeros(0);
        let err = Booster::new(BoostParams::default())
            .fit(x.view(), y.view(), None)
            .unwrap_err();
        assert_eq!(err, FitError::EmptyTrainingSet);
    }

    #[test]
    fn ensemble_holds_one_tree_per_iteration() {
        let (x, y) = ramp();
        let params = BoostParams {
            n_estimators: 7,
            ..Default::default()
        };
        let outcome = Booster::new(params).fit(x.view(), y.view(), None).unwrap();
        assert_eq!(outcome.ensemble.n_trees(), 7);
        assert_eq!(outcome.train_deviance.len(), 7);
        assert!(outcome.oob_deviance.is_empty());
    }

    #[test]
    fn train_deviance_decreases_on_clean_data() {
        let (x, y) = ramp();
        let params = BoostParams {
            n_estimators: 20,
            ..Default::default()
        };
        let outcome = Booster::new(params).fit(x.view(), y.view(), None).unwrap();
        let first = outcome.train_deviance[0];
        let last = *outcome.train_deviance.last().unwrap();
        assert!(last < first, "deviance went from {} to {}", first, last);
    }

    #[test]
    fn base_score_is_the_target_mean_for_least_squares() {
        let (x, y) = ramp();
        let outcome = Booster::new(BoostParams::default())
            .fit(x.view(), y.view(), None)
            .unwrap();
        assert!((outcome.ensemble.base_score() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn pre_fit_init_score_overrides_the_loss_fit() {
        let (x, y) = ramp();
        let params = BoostParams {
            init_score: Some(-2.0),
            n_estimators: 1,
            ..Default::default()
        };
        let outcome = Booster::new(params).fit(x.view(), y.view(), None).unwrap();
        assert_eq!(outcome.ensemble.base_score(), -2.0);
    }

    #[test]
    fn subsampling_records_oob_deviance_each_iteration() {
        let (x, y) = ramp();
        let params = BoostParams {
            n_estimators: 10,
            subsample: 0.6,
            seed: 9,
            ..Default::default()
        };
        let outcome = Booster::new(params).fit(x.view(), y.view(), None).unwrap();
        assert_eq!(outcome.oob_deviance.len(), 10);
        assert!(outcome.oob_deviance.iter().all(|d| d.is_finite()));
    }

    #[test]
    fn fits_are_bit_identical_for_a_fixed_seed() {
        let (x, y) = ramp();
        let params = BoostParams {
            n_estimators: 12,
            subsample: 0.7,
            seed: 1234,
            ..Default::default()
        };
        let a = Booster::new(params.clone())
            .fit(x.view(), y.view(), None)
            .unwrap();
        let b = Booster::new(params).fit(x.view(), y.view(), None).unwrap();

        assert_eq!(a.ensemble, b.ensemble);
        assert_eq!(a.train_deviance, b.train_deviance);
        assert_eq!(a.oob_deviance, b.oob_deviance);
    }

    #[test]
    fn monitor_halts_and_keeps_completed_iterations() {
        let (x, y) = ramp();
        let params = BoostParams {
            n_estimators: 100,
            ..Default::default()
        };
        let mut halt_at_three = |progress: &FitProgress<'_>| progress.iteration == 3;
        let outcome = Booster::new(params)
            .fit(x.view(), y.view(), Some(&mut halt_at_three))
            .unwrap();

        // Iterations 0..=3 completed.
        assert_eq!(outcome.ensemble.n_trees(), 4);
        assert_eq!(outcome.train_deviance.len(), 4);
    }

    #[test]
    fn monitor_sees_the_current_iterations_tree() {
        let (x, y) = ramp();
        let params = BoostParams {
            n_estimators: 3,
            ..Default::default()
        };
        let mut observed = Vec::new();
        let mut record = |progress: &FitProgress<'_>| {
            observed.push((progress.iteration, progress.ensemble.n_trees()));
            false
        };
        Booster::new(params)
            .fit(x.view(), y.view(), Some(&mut record))
            .unwrap();
        assert_eq!(observed, vec![(0, 1), (1, 2), (2, 3)]);
    }
}
