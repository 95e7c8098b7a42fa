use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Body of a non-streaming generate call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InferencePayload {
    pub model: String,
    pub prompt: String,
    pub images: Vec<String>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct InferenceReply {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: String,
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("The request to the Ollama server timed out.")]
    Timeout,

    #[error("Could not connect to Ollama server at {url}.")]
    Unreachable { url: String },

    #[error("Ollama API error: {detail}")]
    Upstream { status: StatusCode, detail: String },

    #[error("An unexpected server error occurred: {0}")]
    Internal(String),
}

/// Client for the local model server's generate endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    url: String,
    model: String,
}

impl InferenceClient {
    pub fn new(url: &str, model: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            model: model.to_string(),
        })
    }

    pub fn payload(&self, prompt: &str, image_base64: &str) -> InferencePayload {
        InferencePayload {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            images: vec![image_base64.to_string()],
            stream: false,
        }
    }

    /// Sends one generate request and returns the trimmed `response` text.
    /// There is exactly one attempt; every failure is classified.
    pub async fn generate(&self, prompt: &str, image_base64: &str) -> Result<String, InferenceError> {
        let payload = self.payload(prompt, image_base64);

        info!(
            "Sending request to Ollama at {} for model {}...",
            self.url, self.model
        );

        let result = self.send(&payload).await;
        match &result {
            Ok(_) => info!("Received response from Ollama."),
            Err(InferenceError::Upstream { status, detail }) => {
                error!("Ollama API ({}) error: {} - {}", self.url, status.as_u16(), detail)
            }
            Err(err) => error!("Request to Ollama ({}) failed: {}", self.url, err),
        }
        result
    }

    async fn send(&self, payload: &InferencePayload) -> Result<String, InferenceError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if status.is_client_error() || status.is_server_error() {
            return Err(InferenceError::Upstream {
                status,
                detail: error_detail(status, &body),
            });
        }

        let reply: InferenceReply = serde_json::from_str(&body)
            .map_err(|e| InferenceError::Internal(format!("invalid response from model server: {e}")))?;

        Ok(reply.response.unwrap_or_default().trim().to_string())
    }

    fn classify(&self, err: reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout
        } else if err.is_connect() {
            InferenceError::Unreachable {
                url: self.url.clone(),
            }
        } else {
            InferenceError::Internal(err.to_string())
        }
    }
}

/// `error` field of a JSON body, else the raw body, else the status reason.
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<UpstreamErrorBody>(body) {
        return parsed.error;
    }
    if !body.trim().is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Unknown Ollama API error")
        .to_string()
}
