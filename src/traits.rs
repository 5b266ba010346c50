//! Abstraction over the regression model to enable testing.
//!
//! `Regressor` is implemented by the deserialized model artifact and by
//! `MockRegressor`, which lets tests drive the predictor without a file.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::PredictError;
use crate::ml::features::FeatureVector;

// ==================== Regressor Trait ====================

/// A model mapping feature rows to one usage prediction each.
pub trait Regressor: Send + Sync {
    /// Predict for every row, in order.
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>, PredictError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

// ==================== Mock Regressor ====================

#[derive(Debug, Clone)]
enum MockBehavior {
    Constant(f64),
    Values(Vec<f64>),
    Fail(String),
}

/// Regressor with scripted output that counts its calls.
#[derive(Debug, Clone)]
pub struct MockRegressor {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockRegressor {
    /// Predict `value` for every row.
    pub fn constant(value: f64) -> Self {
        Self::with_behavior(MockBehavior::Constant(value))
    }

    /// Return `values` as-is, whatever the input length.
    pub fn returning(values: Vec<f64>) -> Self {
        Self::with_behavior(MockBehavior::Values(values))
    }

    /// Fail every call with `message`.
    pub fn failing(message: &str) -> Self {
        Self::with_behavior(MockBehavior::Fail(message.to_string()))
    }

    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `predict` calls so far, shared across clones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Regressor for MockRegressor {
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>, PredictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Constant(value) => Ok(vec![*value; features.len()]),
            MockBehavior::Values(values) => Ok(values.clone()),
            MockBehavior::Fail(message) => Err(PredictError::Model(message.clone())),
        }
    }

    fn describe(&self) -> String {
        "MockRegressor".to_string()
    }
}
