//! In-sample fit quality measures

use serde::Serialize;

/// Fit quality of a model evaluated on its own training data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitMetrics {
    pub mae: f64,
    pub r_squared: f64,
    pub mse: f64,
    /// Rows the model was trained and evaluated on
    pub samples: usize,
}

impl FitMetrics {
    /// Evaluate predictions against targets of the same length.
    pub fn evaluate(predictions: &[f64], targets: &[f64]) -> Self {
        Self {
            mae: mean_absolute_error(predictions, targets),
            r_squared: r_squared(predictions, targets),
            mse: mean_squared_error(predictions, targets),
            samples: targets.len(),
        }
    }
}

/// Mean absolute error
pub fn mean_absolute_error(predictions: &[f64], targets: &[f64]) -> f64 {
    if predictions.is_empty() || predictions.len() != targets.len() {
        return f64::NAN;
    }

    let sum: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).abs())
        .sum();
    sum / predictions.len() as f64
}

/// Mean squared error
pub fn mean_squared_error(predictions: &[f64], targets: &[f64]) -> f64 {
    if predictions.is_empty() || predictions.len() != targets.len() {
        return f64::NAN;
    }

    let sum: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).powi(2))
        .sum();
    sum / predictions.len() as f64
}

/// Coefficient of determination.
///
/// A constant target yields 1.0 when predicted exactly and 0.0 otherwise.
pub fn r_squared(predictions: &[f64], targets: &[f64]) -> f64 {
    if predictions.is_empty() || predictions.len() != targets.len() {
        return f64::NAN;
    }

    let mean = targets.iter().sum::<f64>() / targets.len() as f64;
    let ss_tot: f64 = targets.iter().map(|t| (t - mean).powi(2)).sum();
    let ss_res: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (t - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
