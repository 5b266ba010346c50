//! Model persistence - save and load model artifacts as JSON

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::features::FeatureVector;
use super::model::TrainedModel;

/// Serializable model together with the metadata needed to use it safely
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedModel {
    /// Version for backward compatibility
    pub version: u32,
    /// When the artifact was written
    pub created_at: DateTime<Utc>,
    /// Feature names in the order the model expects them
    pub feature_names: Vec<String>,
    /// Fitted regression parameters
    pub model: TrainedModel,
    /// How the model was trained, if recorded
    #[serde(default)]
    pub training: Option<TrainingSummary>,
}

/// Training metadata carried along with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Number of samples used for training
    pub samples: usize,
    /// Training MSE
    pub training_mse: f64,
    /// Validation MSE (if available)
    pub validation_mse: Option<f64>,
}

impl PersistedModel {
    /// Current version number
    pub const CURRENT_VERSION: u32 = 1;

    /// Wrap a model for the current feature layout
    pub fn new(model: TrainedModel, training: Option<TrainingSummary>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            created_at: Utc::now(),
            feature_names: FeatureVector::feature_names(),
            model,
            training,
        }
    }

    /// Save as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PersistenceError::IoError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PersistenceError::SerializeError(e.to_string()))?;

        fs::write(path, json).map_err(|e| PersistenceError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Load from a file and check it fits the current feature layout
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        if !path.exists() {
            return Err(PersistenceError::FileNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let json = fs::read_to_string(path).map_err(|e| PersistenceError::IoError(e.to_string()))?;

        let persisted: Self = serde_json::from_str(&json)
            .map_err(|e| PersistenceError::DeserializeError(e.to_string()))?;

        // Version check
        if persisted.version > Self::CURRENT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: Self::CURRENT_VERSION,
                found: persisted.version,
            });
        }

        let expected = FeatureVector::feature_names();
        if persisted.feature_names != expected {
            return Err(PersistenceError::FeatureMismatch {
                expected,
                found: persisted.feature_names,
            });
        }

        persisted
            .model
            .validate()
            .map_err(PersistenceError::InvalidModel)?;

        Ok(persisted)
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        let training = self
            .training
            .as_ref()
            .map(|t| {
                format!(
                    "{} samples, train_mse={:.2}, val_mse={}",
                    t.samples,
                    t.training_mse,
                    t.validation_mse
                        .map(|v| format!("{:.2}", v))
                        .unwrap_or_else(|| "N/A".to_string())
                )
            })
            .unwrap_or_else(|| "no training summary".to_string());

        format!(
            "Model v{} ({}): {}, created {}",
            self.version,
            self.model.kind(),
            training,
            self.created_at.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

/// Errors that can occur during model persistence
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// File not found
    FileNotFound(String),
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
    /// Version mismatch
    VersionMismatch { expected: u32, found: u32 },
    /// Model was trained on different features
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// Model parameters are incomplete or unusable
    InvalidModel(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::FileNotFound(path) => write!(f, "Model file not found: {}", path),
            PersistenceError::IoError(e) => write!(f, "IO error: {}", e),
            PersistenceError::SerializeError(e) => write!(f, "Serialization error: {}", e),
            PersistenceError::DeserializeError(e) => write!(f, "Deserialization error: {}", e),
            PersistenceError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Model version mismatch: expected v{}, found v{}",
                    expected, found
                )
            }
            PersistenceError::FeatureMismatch { expected, found } => {
                write!(
                    f,
                    "Model feature mismatch: expected {:?}, found {:?}",
                    expected, found
                )
            }
            PersistenceError::InvalidModel(e) => write!(f, "Invalid model: {}", e),
        }
    }
}

impl std::error::Error for PersistenceError {}
