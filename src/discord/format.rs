//! Platform-neutral message shapes.
//!
//! Posts are built here without any Discord types so the pipeline and its
//! tests stay independent of the gateway client. The serenity sink converts
//! them to embeds at the edge.
use crate::feed::{Article, Source};
use crate::translate::{Translation, Translator};
use crate::util::truncate_chars;
use chrono::{DateTime, Utc};

/// Discord embed limits (characters)
const EMBED_TITLE_LIMIT: usize = 250;
const EMBED_DESCRIPTION_LIMIT: usize = 4000;
const EMBED_FIELD_LIMIT: usize = 1000;

pub const BRAND_COLOR: u32 = 0x4285f4;
pub const WARN_COLOR: u32 = 0xffa500;
pub const ERROR_COLOR: u32 = 0xff6b6b;
pub const SUCCESS_COLOR: u32 = 0x51cf66;

pub const FOOTER_TEXT: &str = "🚀 Технологийн мэдээ • GDG Ulaanbaatar • Mongolia";
pub const FOOTER_ICON: &str = "https://res.cloudinary.com/startup-grind/image/upload/c_fill,dpr_2.0,f_auto,g_center,h_1080,q_100,w_1080/v1/gcs/platform-data-goog/events/google-developers-group-gdg-icon_0.png";

/// A news article ready to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsPost {
    pub title: String,
    pub description: String,
    pub url: String,
    pub original_title: String,
    pub published_at: DateTime<Utc>,
    pub author: String,
    pub source: Source,
    /// True only if both title and description were fully translated.
    pub translated: bool,
}

impl NewsPost {
    /// Translates the article's title and summary and assembles the post.
    ///
    /// Translation failures fall back to the original text; the post is
    /// always produced.
    pub async fn build(article: &Article, translator: &dyn Translator, target: &str) -> Self {
        let title = translator.translate(article.title(), target).await;
        let description = if article.summary().is_empty() {
            Translation::Translated(String::new())
        } else {
            translator.translate(article.summary(), target).await
        };

        for (field, outcome) in [("title", &title), ("description", &description)] {
            match outcome {
                Translation::Translated(_) => {}
                Translation::Degraded { failed_chunks, .. } => tracing::warn!(
                    link = %article.link(),
                    field = field,
                    failed_chunks = failed_chunks,
                    "Partially translated"
                ),
                Translation::Failed { reason, .. } => tracing::warn!(
                    link = %article.link(),
                    field = field,
                    reason = %reason,
                    "Posting untranslated"
                ),
            }
        }

        let translated = title.is_translated() && description.is_translated();
        Self {
            title: truncate_chars(title.text(), EMBED_TITLE_LIMIT).into_owned(),
            description: truncate_chars(description.text(), EMBED_DESCRIPTION_LIMIT).into_owned(),
            url: article.link().to_string(),
            original_title: truncate_chars(article.title(), EMBED_FIELD_LIMIT).into_owned(),
            published_at: article.published_at(),
            author: article.author().to_string(),
            source: article.source(),
            translated,
        }
    }

    /// Fallback rendering for channels where embeds are not allowed.
    pub fn plain_text(&self) -> String {
        let mut text = format!("**{}**\n", self.title);
        if !self.description.is_empty() {
            text.push_str(&self.description);
            text.push('\n');
        }
        text.push_str(&format!(
            "🔗 {}\n📅 {}",
            self.url,
            self.published_at.format("%Y-%m-%d %H:%M")
        ));
        text
    }
}

/// A simple titled card with fields, used for command replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<CardField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Card {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: truncate_chars(&value.into(), EMBED_FIELD_LIMIT).into_owned(),
            inline,
        });
        self
    }

    pub fn plain_text(&self) -> String {
        let mut text = format!("**{}**\n{}", self.title, self.description);
        for field in &self.fields {
            text.push_str(&format!("\n{}: {}", field.name, field.value));
        }
        text
    }
}

/// Anything the bot can send to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingMessage {
    News(NewsPost),
    Card(Card),
    Text(String),
}

impl OutgoingMessage {
    pub fn plain_text(&self) -> String {
        match self {
            OutgoingMessage::News(post) => post.plain_text(),
            OutgoingMessage::Card(card) => card.plain_text(),
            OutgoingMessage::Text(text) => text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::NoopTranslator;
    use async_trait::async_trait;

    struct FailingTranslator;

    #[async_trait]
    impl Translator for FailingTranslator {
        async fn translate(&self, text: &str, _target: &str) -> Translation {
            Translation::Failed {
                original: text.to_string(),
                reason: "rate limited".into(),
            }
        }
    }

    fn article() -> Article {
        Article::new(
            Source::Cnet,
            "Google ships Android 15",
            "The update is rolling out.",
            "https://example.com/android-15",
            "2024-05-01T12:30:00Z".parse().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_build_with_translation() {
        let post = NewsPost::build(&article(), &NoopTranslator, "mn").await;
        assert!(post.translated);
        assert_eq!(post.original_title, "Google ships Android 15");
        assert_eq!(post.author, "CNET");
        assert_eq!(post.source, Source::Cnet);
    }

    #[tokio::test]
    async fn test_build_falls_back_to_original_text() {
        let post = NewsPost::build(&article(), &FailingTranslator, "mn").await;
        assert!(!post.translated);
        assert_eq!(post.title, "Google ships Android 15");
        assert_eq!(post.description, "The update is rolling out.");
    }

    #[tokio::test]
    async fn test_plain_text_rendering() {
        let post = NewsPost::build(&article(), &NoopTranslator, "mn").await;
        let text = post.plain_text();
        assert!(text.starts_with("**Google ships Android 15**\n"));
        assert!(text.contains("🔗 https://example.com/android-15"));
        assert!(text.contains("📅 2024-05-01 12:30"));
    }

    #[test]
    fn test_card_plain_text_lists_fields() {
        let card = Card::new("Status", "All good", BRAND_COLOR).field("Channels", "2", true);
        assert_eq!(card.plain_text(), "**Status**\nAll good\nChannels: 2");
    }
}
