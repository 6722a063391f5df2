use super::format::{Card, NewsPost, FOOTER_ICON, FOOTER_TEXT};
use super::{MessageSink, OutgoingMessage, PostError};
use async_trait::async_trait;
use serenity::all::{
    ChannelId, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage, Http, Timestamp,
};
use std::sync::Arc;

/// Posts through Discord's REST API using serenity's HTTP client.
#[derive(Clone)]
pub struct SerenitySink {
    http: Arc<Http>,
}

impl SerenitySink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MessageSink for SerenitySink {
    async fn post(&self, channel: u64, message: &OutgoingMessage) -> Result<(), PostError> {
        // Snowflakes are non-zero
        if channel == 0 {
            return Err(PostError::NotFound(channel));
        }

        let builder = match message {
            OutgoingMessage::News(post) => CreateMessage::new().embed(news_embed(post)),
            OutgoingMessage::Card(card) => CreateMessage::new().embed(card_embed(card)),
            OutgoingMessage::Text(text) => CreateMessage::new().content(text),
        };

        ChannelId::new(channel)
            .send_message(&self.http, builder)
            .await
            .map(|_| ())
            .map_err(|e| classify_error(channel, e))
    }
}

/// Maps serenity errors onto [`PostError`] by HTTP status.
pub(crate) fn classify_error(channel: u64, err: serenity::Error) -> PostError {
    let status = match &err {
        serenity::Error::Http(http_err) => http_err.status_code().map(|s| s.as_u16()),
        _ => None,
    };
    match status {
        Some(403) => PostError::PermissionDenied(channel),
        Some(404) => PostError::NotFound(channel),
        _ => PostError::Other(err.to_string()),
    }
}

pub(crate) fn news_embed(post: &NewsPost) -> CreateEmbed {
    let source = post.source;
    let mut embed = CreateEmbed::new()
        .title(&post.title)
        .url(&post.url)
        .colour(super::format::BRAND_COLOR)
        .field("📰 Анхны гарчиг", format!("```{}```", post.original_title), false)
        .field(
            "📅 Огноо",
            post.published_at.format("%Y-%m-%d %H:%M").to_string(),
            true,
        )
        .field("✍️ Зохиогч", &post.author, true)
        .field(
            "🔗 Эх сурвалж",
            format!("[{}]({})", source.display_name(), source.homepage()),
            true,
        )
        .author(
            CreateEmbedAuthor::new(format!("{} • Tech News", source.display_name()))
                .icon_url(source.icon_url())
                .url(source.homepage()),
        )
        .thumbnail(source.logo_url())
        .footer(CreateEmbedFooter::new(FOOTER_TEXT).icon_url(FOOTER_ICON));

    if !post.description.is_empty() {
        embed = embed.description(&post.description);
    }
    if let Ok(ts) = Timestamp::from_unix_timestamp(post.published_at.timestamp()) {
        embed = embed.timestamp(ts);
    }
    embed
}

pub(crate) fn card_embed(card: &Card) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(&card.title)
        .description(&card.description)
        .colour(card.color)
        .thumbnail(FOOTER_ICON)
        .footer(CreateEmbedFooter::new(FOOTER_TEXT).icon_url(FOOTER_ICON));
    for field in &card.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }
    embed
}
