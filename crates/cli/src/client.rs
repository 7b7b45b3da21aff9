//! API client for communicating with the Learning Advisor service

use advisor_lib::models::{AdaptiveReport, StudentFeatures, SuccessEstimate};
use advisor_lib::predictor::QuestionOutcome;
use advisor_lib::registry::ModelInfo;
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Non-success answer from the service
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service explained the failure with a structured error body
    #[error("{body}")]
    Api { status: u16, body: ErrorResponse },

    #[error("API error ({status}): {body}")]
    Http { status: u16, body: String },
}

impl ClientError {
    pub fn status(&self) -> u16 {
        match self {
            ClientError::Api { status, .. } | ClientError::Http { status, .. } => *status,
        }
    }
}

/// API client for the Learning Advisor service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// GET whose body is meaningful whatever the status, as for health probes
    pub async fn get_with_status<T: DeserializeOwned>(&self, path: &str) -> Result<(u16, T)> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status().as_u16();
        let body = response.json().await.context("Failed to parse response")?;
        Ok((status, body))
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let err = match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(body) => ClientError::Api { status, body },
                Err(_) => ClientError::Http { status, body: text },
            };
            return Err(err.into());
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn models(&self) -> Result<ModelsResponse> {
        self.get("api/v1/models").await
    }

    pub async fn recommend(&self, features: &StudentFeatures) -> Result<AdaptiveReport> {
        self.post("api/v1/recommendations", features).await
    }

    pub async fn analyze_session(&self, session: &SessionRequest) -> Result<SessionResponse> {
        self.post("api/v1/sessions/analyze", session).await
    }

    pub async fn predict_performance(&self, features: &StudentFeatures) -> Result<SuccessEstimate> {
        self.post("api/v1/predictions/performance", features).await
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub available: BTreeSet<String>,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub outcomes: Vec<QuestionOutcome>,
    #[serde(default)]
    pub history: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub features: StudentFeatures,
    pub report: AdaptiveReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.code)?;
        if let Some(details) = &self.details {
            write!(f, ": {}", details)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_models_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "available": ["learner-classification"],
                    "models": [
                        {"name": "learner-classification", "loaded": true, "accuracy": 0.9,
                         "feature_count": 14, "classes": ["advanced", "moderate", "struggling"]},
                        {"name": "engagement-analysis", "loaded": false,
                         "error": "artifact not found at models/artifacts/engagement_analysis_rf.json"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let models = client.models().await.unwrap();

        mock.assert_async().await;
        assert_eq!(models.available.len(), 1);
        assert_eq!(models.models[0].feature_count, Some(14));
        assert!(!models.models[1].loaded);
    }

    #[tokio::test]
    async fn test_unavailable_recommendation_is_typed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/recommendations")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error": "No recommendation is available for this learner",
                    "code": "recommendation_unavailable",
                    "details": "model `engagement-analysis` is not loaded"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .recommend(&StudentFeatures::new().with("accuracy", 0.5))
            .await
            .unwrap_err();

        let err = err.downcast::<ClientError>().unwrap();
        assert_eq!(err.status(), 503);
        match &err {
            ClientError::Api { body, .. } => assert_eq!(body.code, "recommendation_unavailable"),
            other => panic!("expected structured error, got {:?}", other),
        }
        assert!(err.to_string().contains("engagement-analysis"));
    }

    #[tokio::test]
    async fn test_plain_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/models")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.models().await.unwrap_err();
        let err = err.downcast::<ClientError>().unwrap();
        assert!(matches!(err, ClientError::Http { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_health_body_read_on_503() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/healthz")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "unhealthy", "components": {}}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let (status, body): (u16, serde_json::Value) =
            client.get_with_status("healthz").await.unwrap();
        assert_eq!(status, 503);
        assert_eq!(body["status"], "unhealthy");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
