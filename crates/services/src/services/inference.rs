use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model used for both feasibility analysis and task generation.
pub const DEFAULT_MODEL: &str = "ibm-granite/granite-3.1-2b-instruct";

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("inference endpoint returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("prediction did not expose a stream URL")]
    MissingStreamUrl,
}

/// Boundary to the hosted text-generation model. The caller hands over a
/// single opaque prompt string and gets the full concatenated output back;
/// streaming is only used to assemble that string, never for incremental
/// processing.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, InferenceError>;
}

/// Replicate-backed implementation. The API token is constructor state,
/// never written into the process environment.
#[derive(Clone)]
pub struct ReplicateClient {
    http: reqwest::Client,
    api_token: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct CreatePrediction<'a> {
    input: PredictionInput<'a>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    urls: PredictionUrls,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    stream: Option<String>,
}

impl ReplicateClient {
    pub fn new(api_token: String) -> Self {
        Self::with_base_url(api_token, "https://api.replicate.com".to_string())
    }

    pub fn with_base_url(api_token: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_token,
            base_url,
        }
    }

    async fn create_prediction(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<Prediction, InferenceError> {
        let url = format!("{}/v1/models/{}/predictions", self.base_url, model);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&CreatePrediction {
                input: PredictionInput { prompt },
                stream: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api { status, body });
        }
        Ok(response.json().await?)
    }

    /// Read the SSE stream to completion, concatenating `output` event
    /// payloads. The `done` event terminates the stream.
    async fn collect_stream(&self, stream_url: &str) -> Result<String, InferenceError> {
        let response = self
            .http
            .get(stream_url)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api { status, body });
        }

        let mut body = response.bytes_stream();
        let mut buffer = String::new();
        let mut event = String::new();
        let mut output = String::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline).collect();
                let line = line.trim_end_matches(['\r', '\n']);

                if let Some(name) = line.strip_prefix("event:") {
                    event = name.trim().to_string();
                } else if let Some(data) = line.strip_prefix("data:") {
                    if event == "done" {
                        return Ok(output);
                    }
                    if event.is_empty() || event == "output" {
                        output.push_str(data.strip_prefix(' ').unwrap_or(data));
                    }
                }
            }
        }
        Ok(output)
    }
}

#[async_trait]
impl CompletionModel for ReplicateClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, InferenceError> {
        let prediction = self.create_prediction(model, prompt).await?;
        let stream_url = prediction
            .urls
            .stream
            .ok_or(InferenceError::MissingStreamUrl)?;
        self.collect_stream(&stream_url).await
    }
}
