//! Regression accuracy metrics.

use std::collections::BTreeMap;

use super::features::FeatureVector;
use crate::error::{EvaluationError, MetricsError};
use crate::traits::Regressor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    /// Mean squared error
    pub mse: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Coefficient of determination
    pub r2: f64,
    pub mean_true: f64,
    pub mean_predicted: f64,
}

impl RegressionMetrics {
    /// Metrics keyed by name.
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("mse", self.mse),
            ("rmse", self.rmse),
            ("mae", self.mae),
            ("r2", self.r2),
            ("mean_true", self.mean_true),
            ("mean_predicted", self.mean_predicted),
        ])
    }

    pub fn log(&self) {
        tracing::info!("Mean Squared Error (MSE): {:.4}", self.mse);
        tracing::info!("Root Mean Squared Error (RMSE): {:.4}", self.rmse);
        tracing::info!("Mean Absolute Error (MAE): {:.4}", self.mae);
        tracing::info!("R^2 Score: {:.4}", self.r2);
        tracing::info!(
            "Mean true: {:.4}, mean predicted: {:.4}",
            self.mean_true,
            self.mean_predicted
        );
    }
}

/// Compare predictions against ground truth.
///
/// When the ground truth is constant, R² is 1 for exact predictions and 0
/// otherwise.
pub fn calculate_metrics(y_true: &[f64], y_pred: &[f64]) -> Result<RegressionMetrics, MetricsError> {
    if y_true.is_empty() || y_pred.is_empty() {
        return Err(MetricsError::Empty);
    }
    if y_true.len() != y_pred.len() {
        return Err(MetricsError::LengthMismatch {
            y_true: y_true.len(),
            y_pred: y_pred.len(),
        });
    }
    if let Some(i) = y_true.iter().position(|v| !v.is_finite()) {
        return Err(MetricsError::NonFinite("y_true", i));
    }
    if let Some(i) = y_pred.iter().position(|v| !v.is_finite()) {
        return Err(MetricsError::NonFinite("y_pred", i));
    }

    let n = y_true.len() as f64;
    let mean_true = y_true.iter().sum::<f64>() / n;
    let mean_predicted = y_pred.iter().sum::<f64>() / n;

    let (ss_res, abs_err) = y_true
        .iter()
        .zip(y_pred)
        .fold((0.0, 0.0), |(sq, abs), (t, p)| {
            (sq + (t - p).powi(2), abs + (t - p).abs())
        });
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();

    let mse = ss_res / n;
    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    Ok(RegressionMetrics {
        mse,
        rmse: mse.sqrt(),
        mae: abs_err / n,
        r2,
        mean_true,
        mean_predicted,
    })
}

/// Predict with `model`, then score against `y_true`.
pub fn evaluate_predictions<R: Regressor + ?Sized>(
    model: &R,
    features: &[FeatureVector],
    y_true: &[f64],
) -> Result<RegressionMetrics, EvaluationError> {
    let y_pred = model.predict(features)?;
    let metrics = calculate_metrics(y_true, &y_pred)?;
    metrics.log();
    Ok(metrics)
}
