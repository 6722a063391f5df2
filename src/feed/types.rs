use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Sources
// ============================================================================

/// News outlet an article came from. Drives branding in posted messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    TheVerge,
    Cnet,
}

impl Source {
    /// Human-readable outlet name.
    pub fn display_name(self) -> &'static str {
        match self {
            Source::TheVerge => "The Verge",
            Source::Cnet => "CNET",
        }
    }

    pub fn homepage(self) -> &'static str {
        match self {
            Source::TheVerge => "https://www.theverge.com",
            Source::Cnet => "https://www.cnet.com",
        }
    }

    /// Small icon shown next to the outlet name.
    pub fn icon_url(self) -> &'static str {
        match self {
            Source::TheVerge => {
                "https://cdn.vox-cdn.com/uploads/chorus_asset/file/7395359/favicon-16x16.0.png"
            }
            Source::Cnet => "https://www.cnet.com/a/fly/bundles/cnetcss/images/core/logo/cnet_logo.png",
        }
    }

    /// Larger logo used as the message thumbnail.
    pub fn logo_url(self) -> &'static str {
        match self {
            Source::TheVerge => {
                "https://cdn.vox-cdn.com/uploads/chorus_asset/file/13668586/the_verge_logo.0.png"
            }
            Source::Cnet => "https://www.cnet.com/a/fly/bundles/cnetcss/images/core/logo/cnet_logo.png",
        }
    }

    /// Default RSS endpoint for this outlet.
    pub fn default_feed_url(self) -> &'static str {
        match self {
            Source::TheVerge => "https://www.theverge.com/rss/index.xml",
            Source::Cnet => "https://www.cnet.com/rss/news/",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A configured feed endpoint paired with the outlet it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub source: Source,
    pub url: String,
}

impl FeedSource {
    pub fn new(source: Source, url: impl Into<String>) -> Self {
        Self {
            source,
            url: url.into(),
        }
    }

    /// The two outlets at their default endpoints.
    pub fn defaults() -> Vec<FeedSource> {
        [Source::TheVerge, Source::Cnet]
            .into_iter()
            .map(|s| FeedSource::new(s, s.default_feed_url()))
            .collect()
    }
}

// ============================================================================
// Entries and Articles
// ============================================================================

/// An entry as delivered by an [`EntrySource`](super::EntrySource), before
/// normalization. Fields the feed omitted stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    /// Description or content body, possibly containing HTML.
    pub summary: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
    pub author: Option<String>,
}

/// A normalized news item.
///
/// Immutable once built: the fetcher constructs it, the filter and the
/// formatter only read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    title: String,
    summary: String,
    link: String,
    published_at: DateTime<Utc>,
    source: Source,
    categories: BTreeSet<String>,
    author: Option<String>,
}

impl Article {
    pub fn new(
        source: Source,
        title: impl Into<String>,
        summary: impl Into<String>,
        link: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            link: link.into(),
            published_at,
            source,
            categories: BTreeSet::new(),
            author: None,
        }
    }

    /// Replaces the category set. Blank categories are dropped.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories
            .into_iter()
            .map(Into::into)
            .map(|c: String| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    /// Author name, falling back to the outlet name.
    pub fn author(&self) -> &str {
        self.author
            .as_deref()
            .unwrap_or_else(|| self.source.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Article {
        Article::new(
            Source::TheVerge,
            "Title",
            "Summary",
            "https://example.com/a",
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_categories_trimmed_and_blank_dropped() {
        let article = sample().with_categories(["  Tech ", "", "AI", "Tech"]);
        let cats: Vec<_> = article.categories().iter().cloned().collect();
        assert_eq!(cats, vec!["AI".to_string(), "Tech".to_string()]);
    }

    #[test]
    fn test_author_falls_back_to_source() {
        assert_eq!(sample().author(), "The Verge");
        assert_eq!(sample().with_author(Some("  ".into())).author(), "The Verge");
        assert_eq!(
            sample().with_author(Some("Jane Doe".into())).author(),
            "Jane Doe"
        );
    }

    #[test]
    fn test_source_serde_names() {
        let json = serde_json::to_string(&Source::TheVerge).unwrap();
        assert_eq!(json, "\"the_verge\"");
        let parsed: Source = serde_json::from_str("\"cnet\"").unwrap();
        assert_eq!(parsed, Source::Cnet);
    }

    #[test]
    fn test_default_sources_in_order() {
        let sources = FeedSource::defaults();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source, Source::TheVerge);
        assert_eq!(sources[1].source, Source::Cnet);
    }
}
