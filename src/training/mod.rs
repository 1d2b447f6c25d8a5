//! Training infrastructure for stage-wise boosting.
//!
//! - [`Loss`]: the loss family (squared error, LAD, binomial deviance)
//! - [`Booster`]: the per-fit boosting driver
//! - [`TreeGrower`]: regression-tree induction service
//! - [`RowSampler`]: Bernoulli subsampling
//! - [`Monitor`], [`FitProgress`], [`EarlyStopping`]: per-iteration hooks
//! - [`TrainingLogger`], [`Verbosity`]: per-round output

mod booster;
mod callback;
pub mod grower;
mod logger;
mod loss;
mod sampling;

pub use booster::{BoostParams, Booster, FitError, FitOutcome};
pub use callback::{EarlyStopping, FitProgress, Monitor};
pub use grower::{GrowerParams, TerminalRegions, TreeGrower};
pub use logger::{TrainingLogger, Verbosity};
pub use loss::{InitPredictor, Loss, UnknownLossError};
pub use sampling::RowSampler;
