use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use ceiba_core::config::LlmConfig;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Client for the Gemini `generateContent` endpoint.
///
/// Completions run at temperature zero; the model is only asked to pick a
/// tool or phrase a final answer, so sampling variety buys nothing here.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    max_retries: u32,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("could not build the model HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.google_api_key.clone(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1beta/{}:generateContent", self.base_url, self.model);
        let request = GenerateContentRequest {
            contents: vec![Content { role: "user", parts: vec![Part { text: prompt }] }],
            generation_config: GenerationConfig { temperature: 0.0 },
        };

        let mut attempt: u32 = 0;
        loop {
            let response = self
                .client
                .post(&url)
                .query(&[("key", self.api_key.expose_secret())])
                .json(&request)
                .send()
                .await
                .context("model request could not be sent")?;

            let status = response.status();
            if status.is_success() {
                let body: GenerateContentResponse =
                    response.json().await.context("could not decode the model response")?;
                return candidate_text(body);
            }

            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok());
            let throttled = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if throttled && attempt < self.max_retries {
                let wait_secs = retry_after.unwrap_or(1u64 << attempt.min(4));
                warn!(%status, attempt, wait_secs, "model request throttled, retrying");
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                attempt += 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            bail!("model request failed with status {status}: {body}");
        }
    }
}

fn candidate_text(body: GenerateContentResponse) -> Result<String> {
    let text = body
        .candidates
        .into_iter()
        .next()
        .map(|candidate| {
            candidate.content.parts.into_iter().map(|part| part.text).collect::<String>()
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        bail!("model returned an empty completion");
    }
    Ok(text)
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}
