//! Gym usage prediction with a pre-trained regression model
//!
//! The model artifact is a versioned JSON document (see `persistence`). The
//! predictor loads it once and scores feature rows extracted from the merged
//! hourly table.

pub mod features;
pub mod metrics;
pub mod model;
pub mod persistence;

use std::path::PathBuf;

use crate::config::{DEFAULT_MODEL_PATH, DataConfig};
use crate::error::PredictError;
use crate::traits::Regressor;

pub use features::{FeatureColumns, FeatureVector, extract_features};
pub use metrics::{RegressionMetrics, calculate_metrics, evaluate_predictions};
pub use model::TrainedModel;
pub use persistence::{PersistedModel, PersistenceError};

/// Configuration for the predictor
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Path of the JSON model artifact
    pub model_path: PathBuf,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl From<&DataConfig> for PredictorConfig {
    fn from(data: &DataConfig) -> Self {
        Self {
            model_path: data.model_path.clone(),
        }
    }
}

/// Loaded model ready to score feature rows
pub struct PredictorModel {
    regressor: Box<dyn Regressor>,
}

impl std::fmt::Debug for PredictorModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictorModel")
            .field("regressor", &self.regressor.describe())
            .finish()
    }
}

impl PredictorModel {
    /// Load the configured model artifact
    pub fn load(config: &PredictorConfig) -> Result<Self, PersistenceError> {
        match PersistedModel::load(&config.model_path) {
            Ok(persisted) => {
                tracing::info!(
                    "Model loaded successfully from {}: {}",
                    config.model_path.display(),
                    persisted.summary()
                );
                Ok(Self::with_regressor(persisted.model))
            }
            Err(e) => {
                tracing::error!("Error loading model: {}", e);
                Err(e)
            }
        }
    }

    /// Wrap any regressor, e.g. a test double
    pub fn with_regressor<R: Regressor + 'static>(regressor: R) -> Self {
        Self {
            regressor: Box::new(regressor),
        }
    }

    /// Predict usage for every feature row
    ///
    /// The model must return one finite prediction per row.
    pub fn predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>, PredictError> {
        let result = self.checked_predict(features);
        match &result {
            Ok(predictions) => {
                tracing::info!("Prediction made successfully for {} rows", predictions.len())
            }
            Err(e) => tracing::error!("Error making prediction: {}", e),
        }
        result
    }

    fn checked_predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>, PredictError> {
        let predictions = self.regressor.predict(features)?;
        if predictions.len() != features.len() {
            return Err(PredictError::OutputLength {
                expected: features.len(),
                actual: predictions.len(),
            });
        }
        if let Some(row) = predictions.iter().position(|p| !p.is_finite()) {
            return Err(PredictError::NonFinite(row));
        }
        Ok(predictions)
    }
}
