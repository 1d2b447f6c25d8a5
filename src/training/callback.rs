//! Per-iteration monitoring and early stopping.
//!
//! The driver invokes the monitor once after each completed boosting
//! iteration with a read-only [`FitProgress`] snapshot; returning `true`
//! halts the loop immediately, keeping every tree appended so far. This is
//! the only early-stopping channel the driver exposes.

use crate::repr::Ensemble;

// =============================================================================
// FitProgress
// =============================================================================

/// Snapshot of the boosting state after iteration `iteration`.
#[derive(Debug)]
pub struct FitProgress<'a> {
    /// Zero-based index of the iteration that just completed.
    pub iteration: usize,
    /// Ensemble accumulated so far, including this iteration's tree.
    pub ensemble: &'a Ensemble,
    /// Training deviance per completed iteration.
    pub train_deviance: &'a [f64],
    /// Out-of-bag deviance per completed iteration; empty unless
    /// subsampling is active.
    pub oob_deviance: &'a [f64],
}

// =============================================================================
// Monitor
// =============================================================================

/// Callback observing each completed boosting iteration.
pub trait Monitor {
    /// Return `true` to halt boosting after this iteration.
    fn observe(&mut self, progress: &FitProgress<'_>) -> bool;
}

impl<F> Monitor for F
where
    F: FnMut(&FitProgress<'_>) -> bool,
{
    fn observe(&mut self, progress: &FitProgress<'_>) -> bool {
        self(progress)
    }
}

// =============================================================================
// EarlyStopping
// =============================================================================

/// Monitor that halts when the deviance stops improving.
///
/// Tracks the best deviance seen so far (out-of-bag when subsampling is
/// active, training deviance otherwise) and stops once no improvement has
/// been observed for `patience` consecutive iterations.
pub struct EarlyStopping {
    patience: usize,
    best_value: Option<f64>,
    best_round: usize,
    current_round: usize,
}

impl EarlyStopping {
    /// Create an early-stopping monitor with the given patience window.
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_value: None,
            best_round: 0,
            current_round: 0,
        }
    }

    /// Feed one deviance value; `true` means the window is exhausted.
    fn should_stop(&mut self, value: f64) -> bool {
        let improved = match self.best_value {
            None => true,
            Some(best) => value < best,
        };
        if improved {
            self.best_value = Some(value);
            self.best_round = self.current_round;
        }
        self.current_round += 1;
        self.current_round - self.best_round > self.patience
    }

    /// Best deviance observed so far.
    pub fn best_value(&self) -> Option<f64> {
        self.best_value
    }

    /// Iteration at which the best deviance was observed.
    pub fn best_round(&self) -> usize {
        self.best_round
    }

    /// Forget all observed values, e.g. before a re-fit.
    pub fn reset(&mut self) {
        self.best_value = None;
        self.best_round = 0;
        self.current_round = 0;
    }
}

impl Monitor for EarlyStopping {
    fn observe(&mut self, progress: &FitProgress<'_>) -> bool {
        let value = progress
            .oob_deviance
            .last()
            .or(progress.train_deviance.last())
            .copied();
        match value {
            Some(value) => self.should_stop(value),
            None => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
