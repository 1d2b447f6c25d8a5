//! Gradient boosting for regression.

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::repr::Ensemble;
use crate::training::{Booster, FitError, Loss, Monitor};

use super::{BoostingConfig, ConfigError, PredictError};

// =============================================================================
// GradientBoostingRegressor
// =============================================================================

/// Stage-wise additive regression model.
///
/// Each boosting iteration fits a regression tree to the negative gradient
/// of the configured loss (`ls` or `lad`) and folds its shrunken
/// contribution into the running prediction.
///
/// The estimator exclusively owns its fitted ensemble; `fit` replaces it
/// wholesale and `predict` is a pure read. Callers that share an instance
/// across threads must serialize `fit` themselves; `&mut self` enforces
/// this within safe code.
///
/// # Example
///
/// ```
/// use ndarray::{arr1, arr2};
/// use stagewise::model::{BoostingConfig, GradientBoostingRegressor};
///
/// let x = arr2(&[[0.0], [1.0], [2.0], [3.0]]);
/// let y = arr1(&[0.0, 1.0, 2.0, 3.0]);
///
/// let config = BoostingConfig::builder().n_estimators(50).build().unwrap();
/// let mut model = GradientBoostingRegressor::new(config).unwrap();
/// model.fit(x.view(), y.view()).unwrap();
///
/// let pred = model.predict(x.view()).unwrap();
/// assert!((pred[3] - 3.0).abs() < 0.5);
/// ```
#[derive(Debug)]
pub struct GradientBoostingRegressor {
    config: BoostingConfig,
    ensemble: Option<Ensemble>,
    train_deviance: Vec<f64>,
    oob_deviance: Vec<f64>,
}

impl GradientBoostingRegressor {
    /// Create an unfitted regressor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedLoss`] if the configured loss is
    /// not a regression loss.
    pub fn new(config: BoostingConfig) -> Result<Self, ConfigError> {
        if config.loss == Loss::BinomialDeviance {
            return Err(ConfigError::UnsupportedLoss {
                loss: config.loss.name(),
                task: "regression",
            });
        }
        Ok(Self {
            config,
            ensemble: None,
            train_deviance: Vec::new(),
            oob_deviance: Vec::new(),
        })
    }

    /// Access the configuration.
    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    /// Fit on `(features, targets)`; rows are samples.
    pub fn fit(
        &mut self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> Result<(), FitError> {
        self.fit_impl(features, targets, None)
    }

    /// Fit with a per-iteration monitor; the monitor returning `true` halts
    /// boosting while keeping the trees fit so far.
    pub fn fit_with_monitor(
        &mut self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        monitor: &mut dyn Monitor,
    ) -> Result<(), FitError> {
        self.fit_impl(features, targets, Some(monitor))
    }

    fn fit_impl(
        &mut self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        monitor: Option<&mut dyn Monitor>,
    ) -> Result<(), FitError> {
        // A failed fit leaves the estimator unfit rather than half-updated.
        self.ensemble = None;
        self.train_deviance.clear();
        self.oob_deviance.clear();

        let outcome =
            Booster::new(self.config.to_boost_params()).fit(features, targets, monitor)?;
        self.ensemble = Some(outcome.ensemble);
        self.train_deviance = outcome.train_deviance;
        self.oob_deviance = outcome.oob_deviance;
        Ok(())
    }

    /// Predict the target for every row of `features`.
    pub fn predict(
        &self,
        features: ArrayView2<'_, f64>,
    ) -> Result<Array1<f64>, PredictError> {
        let ensemble = self.ensemble.as_ref().ok_or(PredictError::NotFitted)?;
        Ok(ensemble.predict_raw(features))
    }

    /// Per-feature importances, rescaled so the maximum equals 100.
    pub fn feature_importances(&self) -> Result<Array1<f64>, PredictError> {
        let ensemble = self.ensemble.as_ref().ok_or(PredictError::NotFitted)?;
        Ok(ensemble.feature_importances())
    }

    /// The fitted ensemble, if `fit` has succeeded.
    pub fn ensemble(&self) -> Option<&Ensemble> {
        self.ensemble.as_ref()
    }

    /// Training deviance per completed boosting iteration.
    pub fn train_deviance(&self) -> &[f64] {
        &self.train_deviance
    }

    /// Out-of-bag deviance per iteration; empty unless `subsample < 1`.
    pub fn oob_deviance(&self) -> &[f64] {
        &self.oob_deviance
    }
}

// =============================================================================
// Tests
// =============================================================================
