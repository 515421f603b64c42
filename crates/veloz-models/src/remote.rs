//! Remote inference scorer.
//!
//! POSTs `{"features": [...]}` to the configured endpoint and reads
//! `{"score": x}` back.

use crate::error::{ModelError, ModelResult};
use crate::scorer::{Scorer, ScorerKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    features: &'a [f64],
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: f64,
}

/// Scorer backed by an HTTP inference service.
pub struct RemoteScorer {
    client: Client,
    url: String,
    kind: ScorerKind,
    expected_features: usize,
}

impl RemoteScorer {
    pub fn new(
        url: impl Into<String>,
        timeout_ms: u64,
        kind: ScorerKind,
        expected_features: usize,
    ) -> ModelResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ModelError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            kind,
            expected_features,
        })
    }

    fn check(&self, score: f64) -> ModelResult<f64> {
        let in_range = match self.kind {
            ScorerKind::Linear => score.is_finite(),
            ScorerKind::Logistic => (0.0..=1.0).contains(&score),
        };
        if in_range {
            Ok(score)
        } else {
            Err(ModelError::InvalidScore(score))
        }
    }
}

#[async_trait]
impl Scorer for RemoteScorer {
    async fn score(&self, features: &[f64]) -> ModelResult<f64> {
        if features.len() != self.expected_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.expected_features,
                got: features.len(),
            });
        }

        let response = self
            .client
            .post(&self.url)
            .json(&ScoreRequest { features })
            .send()
            .await
            .map_err(|e| ModelError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::HttpClient(format!("HTTP {status}: {body}")));
        }

        let body: ScoreResponse = response
            .json()
            .await
            .map_err(|e| ModelError::HttpClient(format!("Failed to parse response: {e}")))?;

        debug!(url = %self.url, score = body.score, "Remote score");
        self.check(body.score)
    }

    fn describe(&self) -> String {
        format!("remote({})", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_string(&ScoreRequest {
            features: &[0.5, 0.25],
        })
        .unwrap();
        assert_eq!(json, r#"{"features":[0.5,0.25]}"#);
    }

    #[test]
    fn test_probability_range_enforced() {
        let scorer = RemoteScorer::new("http://127.0.0.1:1/score", 100, ScorerKind::Logistic, 2)
            .unwrap();
        assert!(scorer.check(0.7).is_ok());
        assert!(matches!(scorer.check(1.2), Err(ModelError::InvalidScore(_))));
    }

    #[tokio::test]
    async fn test_wrong_arity_rejected_before_request() {
        let scorer =
            RemoteScorer::new("http://127.0.0.1:1/score", 100, ScorerKind::Linear, 4).unwrap();
        assert!(matches!(
            scorer.score(&[1.0]).await,
            Err(ModelError::FeatureMismatch { expected: 4, got: 1 })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let scorer =
            RemoteScorer::new("http://127.0.0.1:1/score", 200, ScorerKind::Linear, 1).unwrap();
        assert!(matches!(
            scorer.score(&[1.0]).await,
            Err(ModelError::HttpClient(_))
        ));
    }
}
