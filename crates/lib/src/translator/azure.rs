//! Azure Translator v3 REST client (`POST {endpoint}/translate?api-version=3.0&to=..`).
//! One request per call, with a request timeout and bounded retry on transient failures.

use crate::config::TranslatorConfig;
use crate::language::Language;
use crate::translator::{Translate, Translation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_VERSION: &str = "3.0";
const DEFAULT_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Translation service not configured")]
    NotConfigured,
    #[error("translator request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("translator api error: {status} {body}")]
    Api { status: u16, body: String },
    #[error("unexpected translator response: {0}")]
    Malformed(String),
}

impl TranslateError {
    /// Transport failures, throttling and server errors are worth another attempt.
    fn is_retryable(&self) -> bool {
        match self {
            TranslateError::Request(_) => true,
            TranslateError::Api { status, .. } => *status == 429 || *status >= 500,
            TranslateError::NotConfigured | TranslateError::Malformed(_) => false,
        }
    }
}

/// Client for the Azure Translator HTTP API.
#[derive(Clone)]
pub struct TranslatorClient {
    endpoint: String,
    key: Option<String>,
    region: String,
    max_retries: u32,
    backoff: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TranslateRequestItem<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponseItem {
    #[serde(default)]
    translations: Vec<TranslationText>,
    #[serde(default)]
    detected_language: Option<DetectedLanguage>,
}

#[derive(Debug, Deserialize)]
struct TranslationText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct DetectedLanguage {
    language: String,
}

impl TranslatorClient {
    pub fn new(config: &TranslatorConfig) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            key: config
                .key
                .as_ref()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            region: config.region.clone(),
            max_retries: config.max_retries,
            backoff: DEFAULT_BACKOFF,
            client,
        })
    }

    /// Base delay between retries; doubled after each failed attempt.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// POST /translate once and parse the first result.
    async fn translate_once(
        &self,
        key: &str,
        text: &str,
        target: Language,
    ) -> Result<Translation, TranslateError> {
        let url = format!("{}/translate", self.endpoint);
        let res = self
            .client
            .post(&url)
            .query(&[("api-version", API_VERSION), ("to", target.code())])
            .header("Ocp-Apim-Subscription-Key", key)
            .header("Ocp-Apim-Subscription-Region", &self.region)
            .json(&[TranslateRequestItem { text }])
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(TranslateError::Api {
                status: status.as_u16(),
                body,
            });
        }
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<Translation, TranslateError> {
    let items: Vec<TranslateResponseItem> =
        serde_json::from_str(body).map_err(|e| TranslateError::Malformed(e.to_string()))?;
    let first = items
        .into_iter()
        .next()
        .ok_or_else(|| TranslateError::Malformed("empty result list".to_string()))?;
    let text = first
        .translations
        .into_iter()
        .next()
        .map(|t| t.text)
        .ok_or_else(|| TranslateError::Malformed("no translations in result".to_string()))?;
    Ok(Translation {
        text,
        detected_language: first.detected_language.map(|d| d.language),
    })
}

#[async_trait]
impl Translate for TranslatorClient {
    async fn translate(&self, text: &str, target: Language) -> Result<Translation, TranslateError> {
        let key = self.key.as_deref().ok_or(TranslateError::NotConfigured)?;
        let mut attempt: u32 = 0;
        loop {
            match self.translate_once(key, text, target).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff * 2u32.saturating_pow(attempt);
                    log::warn!(
                        "translate attempt {} failed, retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("Translation error: {}", e);
                    return Err(e);
                }
                Ok(t) => return Ok(t),
            }
        }
    }
}
