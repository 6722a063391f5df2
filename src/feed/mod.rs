//! Feed retrieval and normalization.
//!
//! - [`parser`] turns RSS/Atom bytes into [`RawEntry`] values using `feed-rs`
//! - [`fetcher`] fetches each configured source over HTTP and normalizes the
//!   entries into immutable [`Article`]s, tolerating per-source failures
//!
//! # Example
//!
//! ```ignore
//! use newsbot::feed::{fetch_all, FeedSource, HttpEntrySource, NormalizeOptions};
//!
//! let client = HttpEntrySource::new(reqwest::Client::new());
//! let outcome = fetch_all(&client, &FeedSource::defaults(), NormalizeOptions::default()).await;
//! println!("{} articles, {} sources failed", outcome.articles.len(), outcome.failed_sources());
//! ```

mod fetcher;
mod parser;
mod types;

pub use fetcher::{
    fetch_all, EntrySource, FetchError, FetchOutcome, HttpEntrySource, NormalizeOptions,
    SourceReport,
};
pub use parser::parse_feed;
pub use types::{Article, FeedSource, RawEntry, Source};
