use super::OutgoingMessage;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Delivery failures, split by how the caller should react.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostError {
    /// The bot may not post here. Remaining articles for this channel are skipped.
    #[error("Missing permission to post in channel {0}")]
    PermissionDenied(u64),
    /// The channel does not exist or is not visible to the bot.
    #[error("Channel {0} not found")]
    NotFound(u64),
    /// Anything else (rate limits, network). Only the current message is lost.
    #[error("Failed to post: {0}")]
    Other(String),
}

impl PostError {
    /// True if further posts to the same channel are pointless this run.
    pub fn abandons_channel(&self) -> bool {
        matches!(self, PostError::PermissionDenied(_) | PostError::NotFound(_))
    }
}

/// Destination for formatted messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn post(&self, channel: u64, message: &OutgoingMessage) -> Result<(), PostError>;
}

/// Writes messages to the log instead of sending them. Used for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl MessageSink for LogSink {
    async fn post(&self, channel: u64, message: &OutgoingMessage) -> Result<(), PostError> {
        tracing::info!(
            channel = channel,
            message = %message.plain_text(),
            "Dry run: message not sent"
        );
        Ok(())
    }
}

/// Retries rich messages as plain text when the channel refuses them.
///
/// Channels that deny Embed Links answer embeds with 403 but still accept
/// text. Only a second 403 on the text form abandons the channel.
pub struct TextFallbackSink {
    inner: Arc<dyn MessageSink>,
}

impl TextFallbackSink {
    pub fn new(inner: Arc<dyn MessageSink>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl MessageSink for TextFallbackSink {
    async fn post(&self, channel: u64, message: &OutgoingMessage) -> Result<(), PostError> {
        match self.inner.post(channel, message).await {
            Err(PostError::PermissionDenied(_)) if !matches!(message, OutgoingMessage::Text(_)) => {
                tracing::warn!(channel = channel, "Embed rejected, retrying as plain text");
                let text = OutgoingMessage::Text(message.plain_text());
                self.inner.post(channel, &text).await
            }
            result => result,
        }
    }
}
