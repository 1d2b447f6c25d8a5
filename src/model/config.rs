//! Estimator configuration with eager validation.
//!
//! [`BoostingConfig`] is the user-facing hyperparameter surface. The builder
//! (via `bon`) validates everything at `build()` time, so a bad value is a
//! [`ConfigError`] at construction rather than an error deferred into the
//! boosting loop.
//!
//! # Example
//!
//! ```
//! use stagewise::model::BoostingConfig;
//! use stagewise::training::Loss;
//!
//! // All defaults: squared-error regression, 100 rounds.
//! let config = BoostingConfig::builder().build().unwrap();
//!
//! // Stochastic LAD boosting.
//! let config = BoostingConfig::builder()
//!     .loss(Loss::LeastAbsoluteDeviation)
//!     .n_estimators(200)
//!     .learn_rate(0.05)
//!     .subsample(0.8)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//! ```

use bon::Builder;

use crate::training::{
    BoostParams, InitPredictor, Loss, UnknownLossError, Verbosity,
};

// =============================================================================
// ConfigError
// =============================================================================

/// Configuration validation errors, raised at construction time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// learn_rate must be > 0.
    #[error("learn_rate must be greater than 0, got {0}")]
    InvalidLearnRate(f64),

    /// n_estimators must be >= 1.
    #[error("n_estimators must be greater than 0")]
    InvalidNEstimators,

    /// max_depth must be >= 1.
    #[error("max_depth must be greater than 0")]
    InvalidMaxDepth,

    /// min_samples_split must be >= 1.
    #[error("min_samples_split must be greater than 0")]
    InvalidMinSamplesSplit,

    /// min_samples_leaf must be >= 1.
    #[error("min_samples_leaf must be greater than 0")]
    InvalidMinSamplesLeaf,

    /// subsample must be in (0, 1].
    #[error("subsample must be in (0, 1], got {0}")]
    InvalidSubsample(f64),

    /// A custom initial predictor must be fit before it is configured.
    #[error("custom init predictor holds no fitted value")]
    UnfittedInit,

    /// The loss tag did not name a known loss.
    #[error(transparent)]
    UnknownLoss(#[from] UnknownLossError),

    /// The loss does not apply to the estimator's task.
    #[error("loss '{loss}' is not supported for {task}")]
    UnsupportedLoss {
        /// Tag of the rejected loss.
        loss: &'static str,
        /// The estimator task ("regression" or "binary classification").
        task: &'static str,
    },
}

// =============================================================================
// BoostingConfig
// =============================================================================

/// Hyperparameters for gradient boosting estimators.
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct BoostingConfig {
    /// Loss family. Default: [`Loss::LeastSquares`].
    #[builder(default)]
    pub loss: Loss,

    /// Shrinkage applied to every tree's contribution. Default: 0.1.
    #[builder(default = 0.1)]
    pub learn_rate: f64,

    /// Number of boosting iterations. Default: 100.
    #[builder(default = 100)]
    pub n_estimators: usize,

    /// Maximum depth of each regression tree. Default: 3.
    #[builder(default = 3)]
    pub max_depth: usize,

    /// Minimum rows required to split a tree node. Default: 1.
    #[builder(default = 1)]
    pub min_samples_split: usize,

    /// Minimum rows required at a tree leaf. Default: 1.
    #[builder(default = 1)]
    pub min_samples_leaf: usize,

    /// Row-inclusion probability per iteration; values below 1 give
    /// stochastic gradient boosting. Default: 1.0.
    #[builder(default = 1.0)]
    pub subsample: f64,

    /// Optional pre-fit constant initial predictor. `None` lets the loss
    /// fit one from the targets.
    pub init: Option<InitPredictor>,

    /// Seed for the subsampling generator; fits are reproducible given the
    /// same seed, data, and configuration. Default: 42.
    #[builder(default = 42)]
    pub seed: u64,

    /// Training output level. Default: silent.
    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: boosting_config_builder::IsComplete> BoostingConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any out-of-range hyperparameter or an
    /// unfitted custom init predictor.
    pub fn build(self) -> Result<BoostingConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl BoostingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.learn_rate > 0.0) {
            return Err(ConfigError::InvalidLearnRate(self.learn_rate));
        }
        if self.n_estimators == 0 {
            return Err(ConfigError::InvalidNEstimators);
        }
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidMaxDepth);
        }
        if self.min_samples_split == 0 {
            return Err(ConfigError::InvalidMinSamplesSplit);
        }
        if self.min_samples_leaf == 0 {
            return Err(ConfigError::InvalidMinSamplesLeaf);
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ConfigError::InvalidSubsample(self.subsample));
        }
        if let Some(init) = &self.init {
            if !init.is_fitted() {
                return Err(ConfigError::UnfittedInit);
            }
        }
        Ok(())
    }

    /// Convert to the driver-level parameter set.
    pub(crate) fn to_boost_params(&self) -> BoostParams {
        BoostParams {
            loss: self.loss,
            learn_rate: self.learn_rate,
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            subsample: self.subsample,
            init_score: self.init.as_ref().and_then(InitPredictor::value),
            seed: self.seed,
            verbosity: self.verbosity,
        }
    }
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self::builder().build().expect("default config is valid")
    }
}

// =============================================================================
// Tests
// =============================================================================
