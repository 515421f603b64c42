//! Scorer capability and the native linear models.

use crate::artifact::ModelArtifact;
use crate::error::{ModelError, ModelResult};
use crate::remote::RemoteScorer;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Maps a feature vector to a score.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, features: &[f64]) -> ModelResult<f64>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// How a raw linear score is turned into the model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerKind {
    /// Regression: the linear score itself.
    Linear,
    /// Classification: sigmoid of the linear score, in [0, 1].
    Logistic,
}

/// Where a model comes from, as configured.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScorerSource {
    /// Coefficient file on disk.
    Artifact { path: PathBuf },
    /// Remote inference endpoint.
    Remote {
        url: String,
        #[serde(default = "default_remote_timeout_ms")]
        timeout_ms: u64,
    },
}

fn default_remote_timeout_ms() -> u64 {
    1000
}

/// Build a shared scorer from its configured source.
pub fn build_scorer(
    source: &ScorerSource,
    kind: ScorerKind,
    expected_features: usize,
) -> ModelResult<Arc<dyn Scorer>> {
    match source {
        ScorerSource::Artifact { path } => {
            let artifact = ModelArtifact::load(path, expected_features)?;
            Ok(match kind {
                ScorerKind::Linear => Arc::new(LinearScorer::new(artifact)),
                ScorerKind::Logistic => Arc::new(LogisticScorer::new(artifact)),
            })
        }
        ScorerSource::Remote { url, timeout_ms } => Ok(Arc::new(RemoteScorer::new(
            url.clone(),
            *timeout_ms,
            kind,
            expected_features,
        )?)),
    }
}

/// Linear regression scorer.
#[derive(Debug, Clone)]
pub struct LinearScorer {
    artifact: ModelArtifact,
}

impl LinearScorer {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }
}

#[async_trait]
impl Scorer for LinearScorer {
    async fn score(&self, features: &[f64]) -> ModelResult<f64> {
        self.artifact.linear(features)
    }

    fn describe(&self) -> String {
        format!("linear({} features)", self.artifact.coefficients.len())
    }
}

/// Logistic regression scorer; outputs the positive-class probability.
#[derive(Debug, Clone)]
pub struct LogisticScorer {
    artifact: ModelArtifact,
}

impl LogisticScorer {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }
}

#[async_trait]
impl Scorer for LogisticScorer {
    async fn score(&self, features: &[f64]) -> ModelResult<f64> {
        let z = self.artifact.linear(features)?;
        let p = sigmoid(z);
        if p.is_nan() {
            return Err(ModelError::InvalidScore(p));
        }
        Ok(p)
    }

    fn describe(&self) -> String {
        format!("logistic({} features)", self.artifact.coefficients.len())
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(coefficients: Vec<f64>, intercept: f64) -> ModelArtifact {
        ModelArtifact {
            feature_names: vec![],
            coefficients,
            intercept,
        }
    }

    #[tokio::test]
    async fn test_logistic_baseline_is_sigmoid_of_intercept() {
        let scorer = LogisticScorer::new(artifact(vec![3.0, -2.0], 0.0));
        let p = scorer.score(&[0.0, 0.0]).await.unwrap();
        assert_eq!(p, 0.5);
    }

    #[tokio::test]
    async fn test_logistic_extremes_stay_finite() {
        let scorer = LogisticScorer::new(artifact(vec![1.0, 0.0], 0.0));
        assert!(scorer.score(&[1e6, 0.0]).await.unwrap() <= 1.0);
        assert!(scorer.score(&[-1e6, 0.0]).await.unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn test_linear_scorer() {
        let scorer = LinearScorer::new(artifact(vec![1.0, 2.0, 0.0, 0.001], 0.1));
        let s = scorer.score(&[0.01, 10.0, 5e6, 1000.0]).await.unwrap();
        assert!((s - (0.1 + 0.01 + 20.0 + 1.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_feature_mismatch_propagates() {
        let scorer = LinearScorer::new(artifact(vec![1.0, 2.0], 0.0));
        assert!(matches!(
            scorer.score(&[1.0]).await,
            Err(ModelError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_source_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            classifier: ScorerSource,
            regressor: ScorerSource,
        }
        let parsed: Wrapper = serde_json::from_value(serde_json::json!({
            "classifier": {"kind": "artifact", "path": "models/mt.json"},
            "regressor": {"kind": "remote", "url": "http://localhost:9000/score"}
        }))
        .unwrap();

        assert!(matches!(parsed.classifier, ScorerSource::Artifact { .. }));
        match parsed.regressor {
            ScorerSource::Remote { timeout_ms, .. } => assert_eq!(timeout_ms, 1000),
            other => panic!("Expected remote, got {other:?}"),
        }
    }

    #[test]
    fn test_build_from_missing_artifact_fails() {
        let source = ScorerSource::Artifact {
            path: PathBuf::from("/nonexistent.json"),
        };
        assert!(build_scorer(&source, ScorerKind::Logistic, 2).is_err());
    }
}
