//! stagewise: stage-wise additive gradient boosting in Rust.
//!
//! Gradient boosting for regression (squared error, least absolute
//! deviation) and binary classification (binomial deviance), built from a
//! pluggable loss family, sequential regression-tree induction, and a
//! driver that refines each tree's leaves against the true loss before
//! folding it into the ensemble.
//!
//! # Key Types
//!
//! - [`GradientBoostingRegressor`] / [`GradientBoostingClassifier`] -
//!   estimators with fit/predict
//! - [`BoostingConfig`] - hyperparameter builder with eager validation
//! - [`Loss`] - loss family selector
//! - [`Monitor`] / [`EarlyStopping`] - per-iteration hooks for early halting
//!
//! # Training
//!
//! Build a [`BoostingConfig`], construct an estimator, call `fit`. See the
//! [`model`] module for examples.
//!
//! Training is single-threaded and synchronous: `fit` runs to completion
//! (or a monitor-triggered halt) within one call, and an estimator's fitted
//! state is owned exclusively by that instance. Fits are reproducible:
//! identical seed, data, and configuration yield identical ensembles.

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod data;
pub mod model;
pub mod repr;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Estimators and configuration (most users want these)
pub use model::{
    BoostingConfig, ConfigError, GradientBoostingClassifier, GradientBoostingRegressor,
    PredictError,
};

// Training types (losses, driver, monitoring)
pub use training::{
    Booster, EarlyStopping, FitError, FitOutcome, FitProgress, InitPredictor, Loss, Monitor,
    Verbosity,
};

// Fitted-model representation
pub use repr::{Ensemble, Tree};
