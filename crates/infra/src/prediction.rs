//! Predictor implementations behind `POST /api/predictions`.

use std::sync::Arc;

use labtrack_ai::{AiError, ItemPrediction, PredictionInput, parse_prediction_reply, render_prompt};

use crate::config::{Config, PredictionBackend};
use crate::external::GeminiClient;

pub const MISSING_API_KEY: &str = "API key configuration error";

#[async_trait::async_trait]
pub trait ExpiryPredictor: Send + Sync {
    async fn predict(&self, input: &PredictionInput) -> Result<ItemPrediction, AiError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Offline rule-based predictor.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicPredictor;

#[async_trait::async_trait]
impl ExpiryPredictor for HeuristicPredictor {
    async fn predict(&self, input: &PredictionInput) -> Result<ItemPrediction, AiError> {
        input.validate()?;
        labtrack_ai::predict_expiry(input)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// Generative-API predictor.
///
/// Without a client (no API key configured) every request fails with a
/// configuration error.
#[derive(Debug, Clone)]
pub struct GeminiPredictor {
    client: Option<GeminiClient>,
}

impl GeminiPredictor {
    pub fn new(client: Option<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ExpiryPredictor for GeminiPredictor {
    async fn predict(&self, input: &PredictionInput) -> Result<ItemPrediction, AiError> {
        let Some(client) = &self.client else {
            tracing::error!("gemini backend selected but GEMINI_API_KEY is missing");
            return Err(AiError::Configuration(MISSING_API_KEY.to_string()));
        };
        input.validate()?;

        let prompt = render_prompt(input);
        let reply = client.generate_json(&prompt).await?;
        parse_prediction_reply(&reply, input).inspect_err(|e| {
            tracing::error!(error = %e, reply = %reply, "unusable prediction reply");
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

pub fn predictor_from_config(config: &Config) -> Arc<dyn ExpiryPredictor> {
    match config.prediction_backend {
        PredictionBackend::Heuristic => Arc::new(HeuristicPredictor),
        PredictionBackend::Gemini => {
            let client = config.gemini.api_key.clone().map(|key| {
                GeminiClient::new(key, config.gemini.model.clone())
                    .with_base_url(config.gemini.api_url.clone())
            });
            Arc::new(GeminiPredictor::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use axum::{Json, Router, routing::post};
    use chrono::NaiveDate;
    use serde_json::{Value, json};

    use labtrack_ai::{EnvironmentalFactors, RiskLevel};

    fn input() -> PredictionInput {
        PredictionInput {
            name: "Hydrogen peroxide 30%".to_string(),
            cas_number: Some("7722-84-1".to_string()),
            manufacture_date: None,
            original_expiry_date: NaiveDate::from_ymd_opt(2027, 2, 1),
            storage_conditions: Some("Refrigerate, light sensitive".to_string()),
            quantity_original: 1.0,
            quantity_current: 0.5,
            factors: EnvironmentalFactors::default(),
        }
    }

    async fn fake_gemini(reply: Value) -> SocketAddr {
        let app = Router::new().route(
            "/v1beta/models/:model",
            post(move || {
                let reply = reply.clone();
                async move { Json(reply) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn heuristic_rejects_incomplete_input() {
        let mut i = input();
        i.original_expiry_date = None;
        let err = HeuristicPredictor.predict(&i).await.unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn gemini_without_key_is_a_configuration_error() {
        let err = GeminiPredictor::new(None).predict(&input()).await.unwrap_err();
        assert_eq!(err.to_string(), MISSING_API_KEY);
    }

    #[tokio::test]
    async fn gemini_reply_is_parsed() {
        let text = json!([{
            "predicted_expiry": "2026-12-15",
            "risk_level": "high",
            "confidence_score": 0.75,
            "contributing_factors": ["decomposes over time", "opened container"]
        }])
        .to_string();
        let addr = fake_gemini(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
        .await;

        let client = GeminiClient::new("test-key".into(), "gemini-test".into())
            .with_base_url(format!("http://{addr}/v1beta"));
        let prediction = GeminiPredictor::new(Some(client))
            .predict(&input())
            .await
            .unwrap();

        assert_eq!(prediction.name, "Hydrogen peroxide 30%");
        assert_eq!(prediction.risk_level, RiskLevel::High);
        assert_eq!(prediction.predicted_expiry, NaiveDate::from_ymd_opt(2026, 12, 15));
        assert_eq!(prediction.factors.len(), 2);
    }

    #[tokio::test]
    async fn gemini_without_candidates_is_an_invalid_response() {
        let addr = fake_gemini(json!({ "candidates": [] })).await;
        let client = GeminiClient::new("k".into(), "m".into())
            .with_base_url(format!("http://{addr}/v1beta"));
        let err = GeminiPredictor::new(Some(client))
            .predict(&input())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::InvalidResponse(_)));
    }
}
