use super::{split_chunks, Translation, Translator};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_RESPONSE_SIZE: usize = 1024 * 1024; // 1MB

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Rate limited by translation service")]
    RateLimited,
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large")]
    ResponseTooLarge,
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl TranslateError {
    /// Returns true if this error is transient and the request should be retried.
    fn is_retryable(&self) -> bool {
        match self {
            TranslateError::Timeout | TranslateError::Network(_) | TranslateError::RateLimited => {
                true
            }
            TranslateError::HttpStatus(status) => *status >= 500,
            TranslateError::ResponseTooLarge
            | TranslateError::Malformed(_)
            | TranslateError::InvalidUrl(_) => false,
        }
    }
}

/// Client for the public Google translate endpoint.
///
/// Long texts are split into sentence chunks, each translated separately.
/// Transient failures (timeouts, network errors, 429, 5xx) are retried with
/// exponential backoff starting at `backoff_base`.
#[derive(Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    base_url: String,
    source_lang: String,
    max_chunk_chars: usize,
    max_retries: u32,
    backoff_base: Duration,
    max_response_bytes: usize,
}

impl GoogleTranslator {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            source_lang: "en".to_string(),
            max_chunk_chars: 500,
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            max_response_bytes: MAX_RESPONSE_SIZE,
        }
    }

    /// Overrides the endpoint, e.g. to point at a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_source_lang(mut self, lang: impl Into<String>) -> Self {
        self.source_lang = lang.into();
        self
    }

    pub fn with_max_chunk_chars(mut self, max: usize) -> Self {
        self.max_chunk_chars = max.max(1);
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff_base = backoff_base;
        self
    }

    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    async fn translate_chunk(&self, chunk: &str, target: &str) -> Result<String, TranslateError> {
        let mut retry_count = 0;

        loop {
            match self.request(chunk, target).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && retry_count < self.max_retries => {
                    let delay = self.backoff_base * (1u32 << retry_count); // 1s, 2s, 4s
                    tracing::debug!(
                        error = %e,
                        retry = retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying translation after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request(&self, chunk: &str, target: &str) -> Result<String, TranslateError> {
        let url = Url::parse_with_params(
            &format!("{}/translate_a/single", self.base_url),
            &[
                ("client", "gtx"),
                ("sl", self.source_lang.as_str()),
                ("tl", target),
                ("dt", "t"),
                ("q", chunk),
            ],
        )?;

        let response = tokio::time::timeout(REQUEST_TIMEOUT, self.client.get(url).send())
            .await
            .map_err(|_| TranslateError::Timeout)?
            .map_err(TranslateError::Network)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TranslateError::RateLimited);
        }
        if !status.is_success() {
            return Err(TranslateError::HttpStatus(status.as_u16()));
        }

        let bytes = read_limited_bytes(response, self.max_response_bytes).await?;
        parse_response(&bytes)
    }
}

/// Reads the body, giving up as soon as it exceeds `limit`.
async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, TranslateError> {
    if response
        .content_length()
        .is_some_and(|len| len as usize > limit)
    {
        return Err(TranslateError::ResponseTooLarge);
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(TranslateError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Extracts the translated text from the endpoint's nested-array reply:
/// `[[["translated", "original", ...], ...], ...]`.
fn parse_response(bytes: &[u8]) -> Result<String, TranslateError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| TranslateError::Malformed(e.to_string()))?;

    let segments = value
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| TranslateError::Malformed("missing segment list".to_string()))?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|s| s.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(TranslateError::Malformed("empty translation".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target: &str) -> Translation {
        let chunks = split_chunks(text, self.max_chunk_chars);
        if chunks.is_empty() {
            return Translation::Translated(String::new());
        }

        let mut parts = Vec::with_capacity(chunks.len());
        let mut failed = 0;
        let mut last_error = None;

        for chunk in &chunks {
            match self.translate_chunk(chunk, target).await {
                Ok(translated) => parts.push(translated),
                Err(e) => {
                    tracing::warn!(error = %e, target = %target, "Translation failed, keeping original text");
                    failed += 1;
                    parts.push(chunk.clone());
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            None => Translation::Translated(parts.join(" ")),
            Some(e) if failed == chunks.len() => Translation::Failed {
                original: text.to_string(),
                reason: e.to_string(),
            },
            Some(_) => Translation::Degraded {
                text: parts.join(" "),
                failed_chunks: failed,
            },
        }
    }
}
