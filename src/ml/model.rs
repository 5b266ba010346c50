//! ML model wrapper for Linear Regression

use linfa::prelude::*;
use linfa_linear::{FittedLinearRegression, LinearRegression};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::features::{FeatureVector, NUM_FEATURES};
use crate::error::{PredictError, TrainingError};
use crate::traits::Regressor;

/// A fitted usage model as stored in the model artifact
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModel {
    /// The underlying linear regression model
    regression: FittedLinearRegression<f64>,
}

impl TrainedModel {
    /// Fit ordinary least squares with an intercept.
    ///
    /// Used to produce artifacts; the pipelines only load them.
    pub fn fit(features: &[FeatureVector], targets: &[f64]) -> Result<Self, TrainingError> {
        if features.is_empty() || targets.is_empty() {
            return Err(TrainingError::InsufficientData(0));
        }
        if features.len() != targets.len() {
            return Err(TrainingError::MismatchedLengths {
                features: features.len(),
                targets: targets.len(),
            });
        }

        let records =
            feature_matrix(features).map_err(|e| TrainingError::Array(e.to_string()))?;
        let dataset = Dataset::new(records, Array1::from_vec(targets.to_vec()));

        let regression = LinearRegression::default()
            .with_intercept(true)
            .fit(&dataset)
            .map_err(|e: linfa_linear::LinearError<f64>| TrainingError::Fit(e.to_string()))?;

        Ok(Self { regression })
    }

    pub fn kind(&self) -> &'static str {
        "linear"
    }

    pub fn intercept(&self) -> f64 {
        self.regression.intercept()
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        self.regression.params()
    }

    /// Check the parameters fit the feature layout and are finite.
    pub fn validate(&self) -> Result<(), String> {
        let coefficients = self.coefficients();
        if coefficients.len() != NUM_FEATURES {
            return Err(format!(
                "linear model has {} coefficients, expected {}",
                coefficients.len(),
                NUM_FEATURES
            ));
        }
        if !self.intercept().is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err("linear model has non-finite parameters".to_string());
        }
        Ok(())
    }

    /// Predict usage for multiple feature vectors
    pub fn predict_batch(&self, features: &[FeatureVector]) -> Result<Vec<f64>, PredictError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        // linfa asserts the column count matches the parameters
        self.validate().map_err(PredictError::Model)?;

        let records = feature_matrix(features).map_err(|e| PredictError::Model(e.to_string()))?;
        Ok(self.regression.predict(&records).to_vec())
    }
}

/// One row per feature vector, columns in `FEATURE_NAMES` order.
fn feature_matrix(features: &[FeatureVector]) -> Result<Array2<f64>, ndarray::ShapeError> {
    let flat: Vec<f64> = features.iter().flat_map(|f| f.to_array()).collect();
    Array2::from_shape_vec((features.len(), NUM_FEATURES), flat)
}

impl Regressor for TrainedModel {
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>, PredictError> {
        self.predict_batch(features)
    }

    fn describe(&self) -> String {
        format!(
            "linear(intercept={:.3}, coefficients={:?})",
            self.intercept(),
            self.coefficients().to_vec()
        )
    }
}
