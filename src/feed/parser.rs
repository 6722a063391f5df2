use crate::feed::RawEntry;
use anyhow::Result;
use feed_rs::parser;

/// Parses RSS or Atom bytes into raw entries, preserving feed order.
///
/// Prefers the entry summary (RSS `<description>`) and falls back to the
/// content body. The publish time falls back to the updated time. Category
/// labels are used when present, otherwise the category term.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<RawEntry>> {
    let feed = parser::parse(bytes)?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .filter(|href| !href.is_empty());
            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body));
            let categories = entry
                .categories
                .into_iter()
                .map(|c| c.label.unwrap_or(c.term))
                .collect();
            let author = entry.authors.into_iter().next().map(|p| p.name);

            RawEntry {
                title: entry.title.map(|t| t.content),
                summary,
                link,
                published_at: entry.published.or(entry.updated),
                categories,
                author,
            }
        })
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Example</title>
    <item>
        <title>Apple unveils new chip</title>
        <link>https://example.com/apple-chip</link>
        <description><![CDATA[<p>The <b>M5</b> is here.</p>]]></description>
        <pubDate>Wed, 01 May 2024 12:00:00 GMT</pubDate>
        <category>Tech</category>
        <category>Apple</category>
    </item>
    <item>
        <title>No date here</title>
        <link>https://example.com/undated</link>
    </item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Atom Example</title>
    <id>urn:example</id>
    <updated>2024-05-01T12:00:00Z</updated>
    <entry>
        <title>Google ships Android update</title>
        <id>urn:example:1</id>
        <link href="https://example.com/android"/>
        <updated>2024-05-01T10:00:00Z</updated>
        <author><name>Jane Doe</name></author>
        <category term="Google" label="Google"/>
        <content type="html">&lt;p&gt;Update notes&lt;/p&gt;</content>
    </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_entries_in_order() {
        let entries = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title.as_deref(), Some("Apple unveils new chip"));
        assert_eq!(first.link.as_deref(), Some("https://example.com/apple-chip"));
        assert_eq!(
            first.published_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(first.categories, vec!["Tech".to_string(), "Apple".to_string()]);
        assert!(first.summary.as_deref().unwrap().contains("M5"));

        assert_eq!(entries[1].published_at, None);
    }

    #[test]
    fn test_parse_atom_falls_back_to_updated_and_content() {
        let entries = parse_feed(ATOM.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(
            entry.published_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(entry.author.as_deref(), Some("Jane Doe"));
        assert_eq!(entry.categories, vec!["Google".to_string()]);
        assert!(entry.summary.as_deref().unwrap().contains("Update notes"));
    }

    #[test]
    fn test_parse_invalid_xml_errors() {
        assert!(parse_feed(b"<not valid xml").is_err());
    }

    #[test]
    fn test_parse_empty_channel() {
        let rss = r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#;
        let entries = parse_feed(rss.as_bytes()).unwrap();
        assert!(entries.is_empty());
    }
}
