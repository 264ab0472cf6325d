//! Ordinary least squares model

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use super::ForecastMode;
use crate::error::{AnalysisError, Result};

/// A fitted linear regressor. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    mode: ForecastMode,
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    training_samples: usize,
}

/// Serializable view of a model's parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub mode: ForecastMode,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub training_samples: usize,
}

impl TrainedModel {
    /// Mode the model was fit for
    pub fn mode(&self) -> ForecastMode {
        self.mode
    }

    /// Feature names in coefficient order, frozen at fit time
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn training_samples(&self) -> usize {
        self.training_samples
    }

    /// Predict for a single feature vector
    pub fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(AnalysisError::Fit(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }

        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }

    /// Predict for multiple feature vectors
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            mode: self.mode,
            feature_names: self.feature_names.clone(),
            coefficients: self.coefficients.clone(),
            intercept: self.intercept,
            training_samples: self.training_samples,
        }
    }

    /// Get model information as a string
    pub fn info(&self) -> String {
        let terms: Vec<String> = self
            .feature_names
            .iter()
            .zip(&self.coefficients)
            .map(|(name, c)| format!("{}={:.4}", name, c))
            .collect();
        format!(
            "TrainedModel(mode={}, samples={}, intercept={:.4}, {})",
            self.mode,
            self.training_samples,
            self.intercept,
            terms.join(", ")
        )
    }
}

/// Builder for training a model
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    /// Whether to fit intercept
    fit_intercept: bool,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self {
            fit_intercept: true,
        }
    }
}

impl ModelBuilder {
    /// Create a new model builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to fit intercept
    pub fn fit_intercept(mut self, fit: bool) -> Self {
        self.fit_intercept = fit;
        self
    }

    /// Fit `targets ≈ intercept + rows · coefficients` by least squares.
    ///
    /// Solved through the SVD of the centered design matrix; directions with
    /// negligible singular values get zero weight, so constant or collinear
    /// columns yield the minimum-norm solution instead of an error.
    pub fn train(
        &self,
        mode: ForecastMode,
        rows: &[Vec<f64>],
        targets: &[f64],
    ) -> Result<TrainedModel> {
        if rows.is_empty() || targets.is_empty() {
            return Err(AnalysisError::InsufficientData {
                needed: mode.min_observations(),
                got: 0,
            });
        }

        if rows.len() != targets.len() {
            return Err(AnalysisError::Fit(format!(
                "feature and target lengths mismatch: {} vs {}",
                rows.len(),
                targets.len()
            )));
        }

        let feature_names = mode.feature_names();
        let n_samples = rows.len();
        let n_features = feature_names.len();

        if let Some(bad) = rows.iter().find(|r| r.len() != n_features) {
            return Err(AnalysisError::Fit(format!(
                "expected {} features, got {}",
                n_features,
                bad.len()
            )));
        }

        let mut x = DMatrix::from_fn(n_samples, n_features, |i, j| rows[i][j]);
        let mut y = DVector::from_column_slice(targets);

        let (x_means, y_mean) = if self.fit_intercept {
            let means: Vec<f64> = (0..n_features).map(|j| x.column(j).mean()).collect();
            (means, y.mean())
        } else {
            (vec![0.0; n_features], 0.0)
        };

        for (j, mean) in x_means.iter().enumerate() {
            x.column_mut(j).add_scalar_mut(-mean);
        }
        y.add_scalar_mut(-y_mean);

        let svd = x.svd(true, true);
        let tolerance = svd.singular_values.max() * n_samples.max(n_features) as f64 * f64::EPSILON;
        let solution = svd
            .solve(&y, tolerance)
            .map_err(|e| AnalysisError::Fit(e.to_string()))?;

        let coefficients: Vec<f64> = solution.iter().copied().collect();
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_means)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AnalysisError::Fit("non-finite coefficients".to_string()));
        }

        Ok(TrainedModel {
            mode,
            feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
            coefficients,
            intercept,
            training_samples: n_samples,
        })
    }
}
