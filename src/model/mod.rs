//! High-level estimators with a fit/predict contract.
//!
//! - [`GradientBoostingRegressor`]: `ls` / `lad` regression
//! - [`GradientBoostingClassifier`]: binary classification on binomial
//!   deviance
//! - [`BoostingConfig`]: the shared, eagerly validated hyperparameter
//!   surface

mod classifier;
mod config;
mod regressor;

pub use classifier::GradientBoostingClassifier;
pub use config::{BoostingConfig, ConfigError};
pub use regressor::GradientBoostingRegressor;

// =============================================================================
// PredictError
// =============================================================================

/// Usage errors on the read paths of an estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PredictError {
    /// `predict` or `feature_importances` was called before a successful
    /// `fit`.
    #[error("estimator is not fitted; call `fit` first")]
    NotFitted,
}
