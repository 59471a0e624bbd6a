//! HTTP transport to the generative model service

use super::wire::{GenerateContentRequest, GenerateContentResponse};
use crate::config::AppConfig;
use crate::{MediZenError, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use tracing::{debug, instrument};

/// A single `generateContent` call against a named model
pub trait GenerativeModel: Send + Sync {
    fn generate<'a>(
        &'a self,
        model: &'a str,
        request: &'a GenerateContentRequest,
    ) -> BoxFuture<'a, Result<GenerateContentResponse>>;
}

/// Error body returned by the service
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// REST client for the Gemini API
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| MediZenError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, model)
    }

    #[instrument(skip(self, request), fields(contents = request.contents.len()))]
    async fn call(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        if self.api_key.trim().is_empty() {
            return Err(MediZenError::ConfigError("API_KEY_MISSING".to_string()));
        }

        let response = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| MediZenError::ApiError {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| MediZenError::ApiError {
            status: status.as_u16(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        debug!("Model {} answered with {} bytes", model, body.len());
        serde_json::from_str(&body).map_err(|e| MediZenError::ParseError(e.to_string()))
    }
}

/// Build an error carrying both the numeric status and the service's status name,
/// so quota markers like `RESOURCE_EXHAUSTED` survive into classification
fn api_error(status: u16, body: &str) -> MediZenError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.status.is_empty() => envelope.error.message,
        Ok(envelope) => format!("{}: {}", envelope.error.status, envelope.error.message),
        Err(_) => body.trim().to_string(),
    };
    MediZenError::ApiError { status, message }
}

impl GenerativeModel for GeminiClient {
    fn generate<'a>(
        &'a self,
        model: &'a str,
        request: &'a GenerateContentRequest,
    ) -> BoxFuture<'a, Result<GenerateContentResponse>> {
        self.call(model, request).boxed()
    }
}
