//! AI Grading Client
//!
//! Client for the remote produce-grading model. The model returns tier
//! percentages for a sample photo; the assay service feeds them through the
//! same override path as manual entry, so nothing downstream changes.

use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::TierSplit;

use crate::config::GradingConfig;
use crate::error::{AppError, AppResult};

/// Client for the AI grading microservice
#[derive(Clone)]
pub struct AiGradingClient {
    api_endpoint: String,
    api_key: String,
    http_client: Client,
}

/// Request to grade a harvest sample
#[derive(Debug, Serialize)]
pub struct GradeSampleRequest<'a> {
    pub crop_key: &'a str,
    pub total_quantity_kg: Decimal,
    pub image_url: &'a str,
}

/// Response from the grading API
#[derive(Debug, Deserialize)]
pub struct GradeSampleResponse {
    pub request_id: String,
    pub tier1_percent: i32,
    pub tier2_percent: i32,
    pub tier3_percent: i32,
    pub confidence_score: f32,
}

impl From<GradeSampleResponse> for TierSplit {
    fn from(r: GradeSampleResponse) -> Self {
        TierSplit::new(r.tier1_percent, r.tier2_percent, r.tier3_percent)
    }
}

impl AiGradingClient {
    /// Create a new AI grading client
    pub fn new(api_endpoint: String, api_key: String, timeout: Duration) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_endpoint,
            api_key,
            http_client,
        })
    }

    /// Create a client from configuration; `None` when no endpoint is set
    pub fn from_config(config: &GradingConfig) -> AppResult<Option<Self>> {
        let Some(endpoint) = config.api_endpoint.clone() else {
            return Ok(None);
        };
        let api_key = config.api_key.clone().unwrap_or_default();
        Self::new(endpoint, api_key, Duration::from_secs(config.timeout_secs)).map(Some)
    }

    /// Ask the model for a tier split of one sample
    pub async fn grade_sample(&self, request: GradeSampleRequest<'_>) -> AppResult<TierSplit> {
        let response = self
            .http_client
            .post(&self.api_endpoint)
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::AiGradingError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::AiGradingError(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let result: GradeSampleResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiGradingError(format!("Failed to parse response: {}", e)))?;

        tracing::debug!(
            request_id = %result.request_id,
            confidence = result.confidence_score,
            "AI grading returned a split"
        );

        Ok(result.into())
    }
}
