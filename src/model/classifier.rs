//! Gradient boosting for binary classification.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::repr::Ensemble;
use crate::training::{Booster, FitError, Loss, Monitor};
use crate::utils::sigmoid;

use super::{BoostingConfig, ConfigError, PredictError};

// =============================================================================
// GradientBoostingClassifier
// =============================================================================

/// Stage-wise additive binary classifier.
///
/// Boosting runs on the binomial deviance: each iteration fits a regression
/// tree to `y - sigmoid(score)` and refines its leaves with a Newton step.
/// The raw additive score is a log-odds; `predict` thresholds it at zero and
/// `predict_proba` maps it through the sigmoid.
///
/// Targets may use any two distinct labels; they are mapped onto {0, 1} by
/// sorted order at fit time and mapped back on prediction.
///
/// # Example
///
/// ```
/// use ndarray::{arr1, arr2};
/// use stagewise::model::{BoostingConfig, GradientBoostingClassifier};
/// use stagewise::training::Loss;
///
/// let x = arr2(&[[0.0], [0.2], [3.0], [3.2]]);
/// let y = arr1(&[0.0, 0.0, 1.0, 1.0]);
///
/// let config = BoostingConfig::builder()
///     .loss(Loss::BinomialDeviance)
///     .n_estimators(20)
///     .build()
///     .unwrap();
/// let mut model = GradientBoostingClassifier::new(config).unwrap();
/// model.fit(x.view(), y.view()).unwrap();
///
/// assert_eq!(model.predict(x.view()).unwrap().to_vec(), vec![0.0, 0.0, 1.0, 1.0]);
/// ```
#[derive(Debug)]
pub struct GradientBoostingClassifier {
    config: BoostingConfig,
    classes: Option<[f64; 2]>,
    ensemble: Option<Ensemble>,
    train_deviance: Vec<f64>,
    oob_deviance: Vec<f64>,
}

impl GradientBoostingClassifier {
    /// Create an unfitted classifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedLoss`] unless the configured loss
    /// is [`Loss::BinomialDeviance`].
    pub fn new(config: BoostingConfig) -> Result<Self, ConfigError> {
        if config.loss != Loss::BinomialDeviance {
            return Err(ConfigError::UnsupportedLoss {
                loss: config.loss.name(),
                task: "binary classification",
            });
        }
        Ok(Self {
            config,
            classes: None,
            ensemble: None,
            train_deviance: Vec::new(),
            oob_deviance: Vec::new(),
        })
    }

    /// Access the configuration.
    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    /// Fit on `(features, labels)`; labels must take exactly two distinct
    /// values.
    pub fn fit(
        &mut self,
        features: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
    ) -> Result<(), FitError> {
        self.fit_impl(features, labels, None)
    }

    /// Fit with a per-iteration monitor; the monitor returning `true` halts
    /// boosting while keeping the trees fit so far.
    pub fn fit_with_monitor(
        &mut self,
        features: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
        monitor: &mut dyn Monitor,
    ) -> Result<(), FitError> {
        self.fit_impl(features, labels, Some(monitor))
    }

    fn fit_impl(
        &mut self,
        features: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
        monitor: Option<&mut dyn Monitor>,
    ) -> Result<(), FitError> {
        // A failed fit leaves the estimator unfit rather than half-updated.
        self.classes = None;
        self.ensemble = None;
        self.train_deviance.clear();
        self.oob_deviance.clear();

        let mut classes: Vec<f64> = labels.iter().cloned().collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        classes.dedup();
        if classes.len() != 2 {
            return Err(FitError::NonBinaryTarget {
                n_classes: classes.len(),
            });
        }
        let positive = classes[1];
        let encoded = labels.mapv(|label| if label == positive { 1.0 } else { 0.0 });

        let outcome = Booster::new(self.config.to_boost_params()).fit(
            features,
            encoded.view(),
            monitor,
        )?;
        self.classes = Some([classes[0], classes[1]]);
        self.ensemble = Some(outcome.ensemble);
        self.train_deviance = outcome.train_deviance;
        self.oob_deviance = outcome.oob_deviance;
        Ok(())
    }

    /// Predicted class label for every row: the raw score thresholded at 0.
    pub fn predict(
        &self,
        features: ArrayView2<'_, f64>,
    ) -> Result<Array1<f64>, PredictError> {
        let classes = self.classes.ok_or(PredictError::NotFitted)?;
        let scores = self.predict_raw(features)?;
        Ok(scores.mapv(|score| if score >= 0.0 { classes[1] } else { classes[0] }))
    }

    /// Class probabilities, one `[p(class 0), p(class 1)]` row per sample.
    pub fn predict_proba(
        &self,
        features: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, PredictError> {
        let scores = self.predict_raw(features)?;
        let mut probabilities = Array2::zeros((scores.len(), 2));
        for (row, &score) in scores.iter().enumerate() {
            let positive = sigmoid(score);
            probabilities[[row, 0]] = 1.0 - positive;
            probabilities[[row, 1]] = positive;
        }
        Ok(probabilities)
    }

    /// Raw additive log-odds score.
    pub fn predict_raw(
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

    /// The two class labels in sorted order, once fitted.
    pub fn classes(&self) -> Option<[f64; 2]> {
        self.classes
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

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn deviance_config(n_estimators: usize) -> BoostingConfig {
        BoostingConfig::builder()
            .loss(Loss::BinomialDeviance)
            .n_estimators(n_estimators)
            .build()
            .unwrap()
    }

    #[test]
    fn regression_losses_are_rejected() {
        let err = GradientBoostingClassifier::new(BoostingConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedLoss {
                loss: "ls",
                task: "binary classification"
            }
        ));
    }

    #[test]
    fn predict_before_fit_is_a_usage_error() {
        let model = GradientBoostingClassifier::new(deviance_config(5)).unwrap();
        let x = arr2(&[[0.0]]);
        assert_eq!(model.predict(x.view()), Err(PredictError::NotFitted));
        assert_eq!(model.predict_proba(x.view()), Err(PredictError::NotFitted));
        assert_eq!(model.feature_importances(), Err(PredictError::NotFitted));
    }

    #[test]
    fn more_than_two_classes_is_rejected() {
        let x = arr2(&[[0.0], [1.0], [2.0]]);
        let y = arr1(&[0.0, 1.0, 2.0]);
        let mut model = GradientBoostingClassifier::new(deviance_config(5)).unwrap();
        assert_eq!(
            model.fit(x.view(), y.view()),
            Err(FitError::NonBinaryTarget { n_classes: 3 })
        );
        assert!(model.classes().is_none());
    }

    #[test]
    fn single_class_is_rejected() {
        let x = arr2(&[[0.0], [1.0]]);
        let y = arr1(&[1.0, 1.0]);
        let mut model = GradientBoostingClassifier::new(deviance_config(5)).unwrap();
        assert_eq!(
            model.fit(x.view(), y.view()),
            Err(FitError::NonBinaryTarget { n_classes: 1 })
        );
    }

    #[test]
    fn recovers_labels_on_separated_data() {
        let x = arr2(&[[0.0], [0.5], [1.0], [9.0], [9.5], [10.0]]);
        let y = arr1(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);

        let mut model = GradientBoostingClassifier::new(deviance_config(30)).unwrap();
        model.fit(x.view(), y.view()).unwrap();

        assert_eq!(model.predict(x.view()).unwrap().to_vec(), y.to_vec());
        assert_eq!(model.classes(), Some([0.0, 1.0]));
    }

    #[test]
    fn arbitrary_labels_map_back() {
        let x = arr2(&[[0.0], [0.5], [9.0], [9.5]]);
        let y = arr1(&[-1.0, -1.0, 7.0, 7.0]);

        let mut model = GradientBoostingClassifier::new(deviance_config(25)).unwrap();
        model.fit(x.view(), y.view()).unwrap();

        assert_eq!(model.classes(), Some([-1.0, 7.0]));
        assert_eq!(model.predict(x.view()).unwrap().to_vec(), y.to_vec());
    }

    #[test]
    fn probabilities_sum_to_one_and_track_labels() {
        let x = arr2(&[[0.0], [0.5], [9.0], [9.5]]);
        let y = arr1(&[0.0, 0.0, 1.0, 1.0]);

        let mut model = GradientBoostingClassifier::new(deviance_config(25)).unwrap();
        model.fit(x.view(), y.view()).unwrap();

        let proba = model.predict_proba(x.view()).unwrap();
        for row in 0..proba.nrows() {
            let total = proba[[row, 0]] + proba[[row, 1]];
            assert!((total - 1.0).abs() < 1e-12);
        }
        assert!(proba[[0, 0]] > 0.5);
        assert!(proba[[3, 1]] > 0.5);
    }
}
