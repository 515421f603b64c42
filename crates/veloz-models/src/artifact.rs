//! Coefficient artifacts produced by the offline training jobs.
//!
//! ```json
//! { "feature_names": ["rel_aggr", "size_depth_ratio"],
//!   "coefficients": [1.8, 4.2],
//!   "intercept": -0.3 }
//! ```

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Linear-model coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl ModelArtifact {
    /// Load and validate an artifact against a fixed feature count.
    pub fn load(path: impl AsRef<Path>, expected_features: usize) -> ModelResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let artifact = Self::from_json(&raw, expected_features)?;
        info!(
            path = %path.display(),
            features = ?artifact.feature_names,
            "Loaded model artifact"
        );
        Ok(artifact)
    }

    pub fn from_json(raw: &str, expected_features: usize) -> ModelResult<Self> {
        let artifact: Self = serde_json::from_str(raw)?;
        artifact.validate(expected_features)?;
        Ok(artifact)
    }

    pub fn validate(&self, expected_features: usize) -> ModelResult<()> {
        if self.coefficients.len() != expected_features {
            return Err(ModelError::InvalidArtifact(format!(
                "expected {expected_features} coefficients, found {}",
                self.coefficients.len()
            )));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != self.coefficients.len() {
            return Err(ModelError::InvalidArtifact(format!(
                "{} feature names for {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::InvalidArtifact(
                "non-finite coefficient".to_string(),
            ));
        }
        Ok(())
    }

    /// `intercept + coefficients . features`
    pub fn linear(&self, features: &[f64]) -> ModelResult<f64> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::FeatureMismatch {
                expected: self.coefficients.len(),
                got: features.len(),
            });
        }
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let artifact = ModelArtifact::from_json(
            r#"{"feature_names":["a","b"],"coefficients":[1.0,2.0],"intercept":0.5}"#,
            2,
        )
        .unwrap();
        assert_eq!(artifact.linear(&[1.0, 1.0]).unwrap(), 3.5);
    }

    #[test]
    fn test_wrong_count_rejected() {
        let result = ModelArtifact::from_json(r#"{"coefficients":[1.0],"intercept":0.0}"#, 2);
        assert!(matches!(result, Err(ModelError::InvalidArtifact(_))));
    }

    #[test]
    fn test_name_count_mismatch_rejected() {
        let result = ModelArtifact::from_json(
            r#"{"feature_names":["a"],"coefficients":[1.0,2.0],"intercept":0.0}"#,
            2,
        );
        assert!(matches!(result, Err(ModelError::InvalidArtifact(_))));
    }

    #[test]
    fn test_missing_intercept_rejected() {
        let result = ModelArtifact::from_json(r#"{"coefficients":[1.0,2.0]}"#, 2);
        assert!(matches!(result, Err(ModelError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ModelArtifact::load("/nonexistent/model.json", 2);
        assert!(matches!(result, Err(ModelError::Io { .. })));
    }

    #[test]
    fn test_linear_feature_mismatch() {
        let artifact = ModelArtifact {
            feature_names: vec![],
            coefficients: vec![1.0, 1.0],
            intercept: 0.0,
        };
        assert!(matches!(
            artifact.linear(&[1.0]),
            Err(ModelError::FeatureMismatch { expected: 2, got: 1 })
        ));
    }
}
