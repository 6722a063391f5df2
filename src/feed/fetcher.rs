use crate::feed::parser::parse_feed;
use crate::feed::{Article, FeedSource, RawEntry};
use crate::util::{clean_html, truncate_chars};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while retrieving a single feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// Feed XML could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Anything that can turn a feed URL into raw entries.
///
/// The HTTP implementation is [`HttpEntrySource`]; tests substitute canned
/// entries or failures.
#[async_trait]
pub trait EntrySource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>, FetchError>;
}

/// Fetches feeds over HTTP and parses them with `feed-rs`.
#[derive(Clone)]
pub struct HttpEntrySource {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpEntrySource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl EntrySource for HttpEntrySource {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>, FetchError> {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        // Failures are not retried here: the next scheduled run retries naturally
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
        parse_feed(&bytes).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

/// How raw entries are shaped into [`Article`]s.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Only the first N entries of each feed are considered.
    pub max_entries_per_source: usize,
    /// Summaries longer than this many characters are cut with "...".
    pub summary_max_chars: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_entries_per_source: 20,
            summary_max_chars: 300,
        }
    }
}

/// Outcome of fetching one configured source.
#[derive(Debug)]
pub struct SourceReport {
    pub source: FeedSource,
    /// Number of articles produced, or the error that stopped this source.
    pub result: Result<usize, FetchError>,
    /// Entries dropped for lacking a link or a timestamp.
    pub skipped: usize,
}

/// Articles from every source that could be fetched, in configured order.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub articles: Vec<Article>,
    pub reports: Vec<SourceReport>,
}

impl FetchOutcome {
    pub fn failed_sources(&self) -> usize {
        self.reports.iter().filter(|r| r.result.is_err()).count()
    }
}

/// Fetches every source in order and concatenates the normalized articles.
///
/// A failing source is logged and contributes zero articles; it never stops
/// the remaining sources. Articles keep their native feed order.
pub async fn fetch_all(
    client: &dyn EntrySource,
    sources: &[FeedSource],
    options: NormalizeOptions,
) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();

    for feed in sources {
        match client.fetch(&feed.url).await {
            Ok(entries) => {
                let total = entries.len().min(options.max_entries_per_source);
                let articles: Vec<Article> = entries
                    .into_iter()
                    .take(options.max_entries_per_source)
                    .filter_map(|entry| normalize(feed, entry, &options))
                    .collect();
                let skipped = total - articles.len();

                if skipped > 0 {
                    tracing::warn!(
                        source = %feed.source,
                        skipped = skipped,
                        "Entries without link or date skipped"
                    );
                }
                tracing::info!(
                    source = %feed.source,
                    url = %feed.url,
                    articles = articles.len(),
                    "Fetched feed"
                );

                outcome.reports.push(SourceReport {
                    source: feed.clone(),
                    result: Ok(articles.len()),
                    skipped,
                });
                outcome.articles.extend(articles);
            }
            Err(e) => {
                tracing::warn!(
                    source = %feed.source,
                    url = %feed.url,
                    error = %e,
                    "Feed fetch failed, continuing with remaining sources"
                );
                outcome.reports.push(SourceReport {
                    source: feed.clone(),
                    result: Err(e),
                    skipped: 0,
                });
            }
        }
    }

    outcome
}

/// Converts a raw entry into an article, or `None` if it has no link or no
/// timestamp (it could be neither identified nor aged).
fn normalize(feed: &FeedSource, entry: RawEntry, options: &NormalizeOptions) -> Option<Article> {
    let link = entry.link?;
    let published_at = entry.published_at?;

    let title = entry
        .title
        .map(|t| clean_html(&t))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());
    let summary = entry
        .summary
        .map(|s| clean_html(&s))
        .map(|s| truncate_chars(&s, options.summary_max_chars).into_owned())
        .unwrap_or_default();

    Some(
        Article::new(feed.source, title, summary, link, published_at)
            .with_categories(entry.categories)
            .with_author(entry.author),
    )
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
