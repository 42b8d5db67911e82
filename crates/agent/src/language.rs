use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::error;
use whatlang::Lang;

use ceiba_core::config::TranslatorConfig;

/// Fixed reply when the answer could not be brought into Spanish.
pub const APOLOGY_ES: &str = "Lo siento, hubo un error al procesar tu solicitud.";

const TRANSLATE_TIMEOUT_SECS: u64 = 15;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate_to_spanish(&self, text: &str) -> Result<String>;
}

/// Client for the public Google Translate `gtx` endpoint.
pub struct GoogleTranslator {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TRANSLATE_TIMEOUT_SECS))
            .build()
            .context("could not build the translation HTTP client")?;
        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string() })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate_to_spanish(&self, text: &str) -> Result<String> {
        let url = format!("{}/translate_a/single", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("client", "gtx"), ("sl", "auto"), ("tl", "es"), ("dt", "t"), ("q", text)])
            .send()
            .await
            .context("translation request could not be sent")?
            .error_for_status()
            .context("translation service rejected the request")?;

        let body: Value = response.json().await.context("could not decode the translation")?;
        // The endpoint answers a bare array: element 0 holds the translated
        // segments, each segment an array whose first entry is the text.
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .context("unexpected translation response shape")?;
        let mut translated = String::new();
        for segment in segments {
            if let Some(chunk) = segment.get(0).and_then(Value::as_str) {
                translated.push_str(chunk);
            }
        }
        if translated.is_empty() {
            bail!("translation service returned no segments");
        }
        Ok(translated)
    }
}

/// Brings a model answer into Spanish before it reaches the user.
///
/// Detection that cannot tell the language apart leaves the text alone; a
/// failed translation turns into the fixed apology rather than an error, so
/// the user always gets natural-language text back.
pub async fn ensure_spanish(translator: &dyn Translator, response: &str) -> String {
    match whatlang::detect_lang(response) {
        Some(lang) if lang != Lang::Spa => match translator.translate_to_spanish(response).await {
            Ok(translated) => translated,
            Err(error) => {
                error!(%error, "translation failed");
                APOLOGY_ES.to_string()
            }
        },
        _ => response.to_string(),
    }
}
