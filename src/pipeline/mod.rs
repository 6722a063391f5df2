//! One run of the bot: fetch, filter, translate, post.
//!
//! [`Pipeline`] performs a single run against its collaborators. The
//! [`actor`] module wraps it in a task that serializes scheduled and manual
//! runs and owns the daily trigger state.

mod actor;
mod report;

pub use actor::{PipelineActor, PipelineError, PipelineHandle, PipelineStatus};
pub use report::{ChannelReport, RunOutcome, RunReport, RunSummary};

use crate::discord::{MessageSink, NewsPost, OutgoingMessage};
use crate::feed::{fetch_all, EntrySource, FeedSource, NormalizeOptions};
use crate::filter::{select, FilterPolicy};
use crate::translate::Translator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Scheduled,
    Manual,
    Mention,
}

/// Where a run posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Every configured channel.
    Configured,
    /// Only the given channel (mention replies).
    Channel(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub trigger: Trigger,
    pub destination: Destination,
    /// Further caps the policy's `max_per_post` for this run.
    pub max_articles: Option<usize>,
}

impl RunRequest {
    pub fn scheduled() -> Self {
        Self {
            trigger: Trigger::Scheduled,
            destination: Destination::Configured,
            max_articles: None,
        }
    }

    pub fn manual() -> Self {
        Self {
            trigger: Trigger::Manual,
            destination: Destination::Configured,
            max_articles: None,
        }
    }

    /// A mention reply: at most two articles, posted where the bot was asked.
    pub fn mention(channel: u64) -> Self {
        Self {
            trigger: Trigger::Mention,
            destination: Destination::Channel(channel),
            max_articles: Some(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub sources: Vec<FeedSource>,
    pub normalize: NormalizeOptions,
    pub policy: FilterPolicy,
    pub channels: Vec<u64>,
    pub target_language: String,
    /// Pause between articles in the same channel.
    pub post_delay: Duration,
    /// Pause before moving on to the next channel.
    pub channel_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            sources: FeedSource::defaults(),
            normalize: NormalizeOptions::default(),
            policy: FilterPolicy::default(),
            channels: Vec::new(),
            target_language: "mn".to_string(),
            post_delay: Duration::from_secs(1),
            channel_delay: Duration::from_secs(3),
        }
    }
}

pub struct Pipeline {
    feeds: Arc<dyn EntrySource>,
    translator: Arc<dyn Translator>,
    sink: Arc<dyn MessageSink>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        feeds: Arc<dyn EntrySource>,
        translator: Arc<dyn Translator>,
        sink: Arc<dyn MessageSink>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            feeds,
            translator,
            sink,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Runs once. `now` is the reference time for the recency window.
    ///
    /// Never fails: fetch, translation and delivery problems are logged and
    /// reflected in the returned report.
    pub async fn run(&self, request: &RunRequest, now: DateTime<Utc>) -> RunReport {
        tracing::info!(trigger = ?request.trigger, "Starting news run");

        let fetched = fetch_all(
            self.feeds.as_ref(),
            &self.settings.sources,
            self.settings.normalize,
        )
        .await;

        let mut policy = self.settings.policy.clone();
        if let Some(max) = request.max_articles {
            policy.max_per_post = policy.max_per_post.min(max);
        }
        let selection = select(&fetched.articles, now, &policy);

        let mut report = RunReport {
            trigger: request.trigger,
            started_at: now,
            fetched: fetched.articles.len(),
            failed_sources: fetched.failed_sources(),
            qualified: selection.qualified,
            selected: selection.articles.len(),
            untranslated: 0,
            channels: Vec::new(),
            outcome: RunOutcome::NothingToPost,
        };

        if selection.articles.is_empty() {
            tracing::info!(
                fetched = report.fetched,
                failed_sources = report.failed_sources,
                "No recent tech news to post"
            );
            return report.conclude();
        }

        // Translate once, post the same messages everywhere
        let mut messages = Vec::with_capacity(selection.articles.len());
        for article in &selection.articles {
            let post = NewsPost::build(
                article,
                self.translator.as_ref(),
                &self.settings.target_language,
            )
            .await;
            if !post.translated {
                report.untranslated += 1;
            }
            messages.push(OutgoingMessage::News(post));
        }

        let channels = match request.destination {
            Destination::Configured => self.settings.channels.clone(),
            Destination::Channel(id) => vec![id],
        };
        if channels.is_empty() {
            tracing::warn!("No destination channels configured");
        }

        for (index, channel) in channels.iter().copied().enumerate() {
            if index > 0 && !self.settings.channel_delay.is_zero() {
                tokio::time::sleep(self.settings.channel_delay).await;
            }
            report.channels.push(self.deliver(channel, &messages).await);
        }

        let report = report.conclude();
        tracing::info!(
            trigger = ?report.trigger,
            fetched = report.fetched,
            selected = report.selected,
            untranslated = report.untranslated,
            delivered = report.delivered(),
            outcome = ?report.outcome,
            "News run finished"
        );
        report
    }

    async fn deliver(&self, channel: u64, messages: &[OutgoingMessage]) -> ChannelReport {
        let mut report = ChannelReport {
            channel,
            delivered: 0,
            failed: 0,
            error: None,
        };

        for (index, message) in messages.iter().enumerate() {
            if index > 0 && !self.settings.post_delay.is_zero() {
                tokio::time::sleep(self.settings.post_delay).await;
            }

            match self.sink.post(channel, message).await {
                Ok(()) => report.delivered += 1,
                Err(e) if e.abandons_channel() => {
                    tracing::error!(channel = channel, error = %e, "Abandoning channel for this run");
                    report.failed += messages.len() - index;
                    report.error = Some(e);
                    break;
                }
                Err(e) => {
                    tracing::warn!(channel = channel, error = %e, "Failed to post article");
                    report.failed += 1;
                    report.error = Some(e);
                }
            }
        }

        tracing::info!(
            channel = channel,
            delivered = report.delivered,
            failed = report.failed,
            "Channel done"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discord::PostError;
    use crate::feed::{FetchError, RawEntry, Source};
    use crate::translate::{NoopTranslator, Translation, Translator};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticFeeds(Vec<RawEntry>);

    #[async_trait]
    impl EntrySource for StaticFeeds {
        async fn fetch(&self, _url: &str) -> Result<Vec<RawEntry>, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        posts: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn post(&self, channel: u64, _message: &OutgoingMessage) -> Result<(), PostError> {
            self.posts.lock().unwrap().push(channel);
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    fn entry(n: usize) -> RawEntry {
        RawEntry {
            title: Some(format!("Google releases update {}", n)),
            summary: Some("A new software release.".into()),
            link: Some(format!("https://example.com/{}", n)),
            published_at: Some(now() - chrono::TimeDelta::hours(1)),
            ..Default::default()
        }
    }

    fn pipeline(sink: Arc<RecordingSink>, channels: Vec<u64>) -> Pipeline {
        Pipeline::new(
            Arc::new(StaticFeeds((0..5).map(entry).collect())),
            Arc::new(NoopTranslator),
            sink,
            PipelineSettings {
                sources: vec![FeedSource::new(Source::Cnet, "https://cnet.test/rss")],
                channels,
                post_delay: Duration::ZERO,
                channel_delay: Duration::ZERO,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_mention_run_posts_two_to_requesting_channel() {
        let sink = Arc::new(RecordingSink::default());
        let report = pipeline(sink.clone(), vec![1, 2])
            .run(&RunRequest::mention(99), now())
            .await;

        assert_eq!(report.selected, 2);
        assert_eq!(report.qualified, 5);
        assert_eq!(report.outcome, RunOutcome::Delivered);
        assert_eq!(*sink.posts.lock().unwrap(), vec![99, 99]);
    }

    #[tokio::test]
    async fn test_manual_run_posts_to_all_channels() {
        let sink = Arc::new(RecordingSink::default());
        let report = pipeline(sink.clone(), vec![1, 2])
            .run(&RunRequest::manual(), now())
            .await;

        assert_eq!(report.selected, 3);
        assert_eq!(report.delivered(), 6);
        assert_eq!(*sink.posts.lock().unwrap(), vec![1, 1, 1, 2, 2, 2]);
    }

    /// Translates titles only; summaries come back untouched.
    struct TitleOnlyTranslator;

    #[async_trait]
    impl Translator for TitleOnlyTranslator {
        async fn translate(&self, text: &str, _target: &str) -> Translation {
            if text.starts_with("Google") {
                Translation::Translated(format!("[mn] {}", text))
            } else {
                Translation::Failed {
                    original: text.to_string(),
                    reason: "HTTP 429".into(),
                }
            }
        }
    }

    #[tokio::test]
    async fn test_untranslated_posts_are_counted_and_still_sent() {
        let sink = Arc::new(RecordingSink::default());
        let mut pipeline = pipeline(sink.clone(), vec![1]);
        pipeline.translator = Arc::new(TitleOnlyTranslator);

        let report = pipeline.run(&RunRequest::manual(), now()).await;

        assert_eq!(report.selected, 3);
        assert_eq!(report.untranslated, 3);
        assert_eq!(report.outcome, RunOutcome::Delivered);
        assert_eq!(sink.posts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_fully_translated_run_counts_nothing_untranslated() {
        let sink = Arc::new(RecordingSink::default());
        let report = pipeline(sink, vec![1]).run(&RunRequest::manual(), now()).await;
        assert_eq!(report.untranslated, 0);
    }

    #[tokio::test]
    async fn test_no_channels_is_failed() {
        let sink = Arc::new(RecordingSink::default());
        let report = pipeline(sink, vec![]).run(&RunRequest::manual(), now()).await;
        assert_eq!(report.outcome, RunOutcome::Failed);
    }

    #[tokio::test]
    async fn test_nothing_recent_posts_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let later = now() + chrono::TimeDelta::days(3);
        let report = pipeline(sink.clone(), vec![1])
            .run(&RunRequest::scheduled(), later)
            .await;
        assert_eq!(report.outcome, RunOutcome::NothingToPost);
        assert!(sink.posts.lock().unwrap().is_empty());
    }
}
