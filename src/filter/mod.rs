//! Tech-relevance filtering.
//!
//! [`select`] applies, in order:
//!
//! 1. the recency window (`now - published_at <= cutoff`)
//! 2. intra-run deduplication by link
//! 3. the two-tier classifier (category table, then keyword table)
//! 4. truncation to `max_per_post`, keeping fetch order
//!
//! Every article gets a [`FilterDecision`] for diagnostic logging.

mod rules;

pub use rules::{MatchMode, Rule, RuleAction, RuleHit, RuleTable, TableVerdict};

use crate::feed::Article;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;

/// Which table produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Category,
    Keyword,
}

/// Why an article was kept or dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// Older than the recency cutoff.
    Stale,
    /// A previous article in this run had the same link.
    Duplicate,
    /// Strict filtering is off; only recency applied.
    FilterDisabled,
    Included(Tier, RuleHit),
    Excluded(Tier, RuleHit),
    /// Neither table had an opinion.
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDecision {
    pub include: bool,
    pub reason: Reason,
}

impl FilterDecision {
    fn keep(reason: Reason) -> Self {
        Self {
            include: true,
            reason,
        }
    }

    fn drop(reason: Reason) -> Self {
        Self {
            include: false,
            reason,
        }
    }
}

/// Everything [`select`] needs to know.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    pub cutoff: TimeDelta,
    pub max_per_post: usize,
    pub strict: bool,
    pub categories: RuleTable,
    pub keywords: RuleTable,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            cutoff: TimeDelta::hours(24),
            max_per_post: 3,
            strict: true,
            categories: RuleTable::default_categories(),
            keywords: RuleTable::default_keywords(),
        }
    }
}

impl FilterPolicy {
    /// Classifies content only; recency and dedup are handled by [`select`].
    pub fn classify(&self, article: &Article) -> FilterDecision {
        if !self.strict {
            return FilterDecision::keep(Reason::FilterDisabled);
        }

        if !article.categories().is_empty() {
            let categories: Vec<String> = article
                .categories()
                .iter()
                .map(|c| c.to_lowercase())
                .collect();
            match self.categories.evaluate(&categories) {
                TableVerdict::Include(hit) => {
                    return FilterDecision::keep(Reason::Included(Tier::Category, hit))
                }
                TableVerdict::Exclude(hit) => {
                    return FilterDecision::drop(Reason::Excluded(Tier::Category, hit))
                }
                TableVerdict::NoSignal => {}
            }
        }

        let content = format!("{} {}", article.title(), article.summary()).to_lowercase();
        match self.keywords.evaluate(&[content]) {
            TableVerdict::Include(hit) => FilterDecision::keep(Reason::Included(Tier::Keyword, hit)),
            TableVerdict::Exclude(hit) => FilterDecision::drop(Reason::Excluded(Tier::Keyword, hit)),
            TableVerdict::NoSignal => FilterDecision::drop(Reason::NoMatch),
        }
    }

    fn is_recent(&self, article: &Article, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(article.published_at()) <= self.cutoff
    }
}

/// Output of [`select`].
#[derive(Debug, Default)]
pub struct Selection {
    /// Articles to post, at most `max_per_post`, in fetch order.
    pub articles: Vec<Article>,
    /// How many articles qualified before truncation.
    pub qualified: usize,
    /// One decision per input article, in input order.
    pub decisions: Vec<(String, FilterDecision)>,
}

/// Picks the articles worth posting.
pub fn select(articles: &[Article], now: DateTime<Utc>, policy: &FilterPolicy) -> Selection {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut selection = Selection::default();

    for article in articles {
        let decision = if !policy.is_recent(article, now) {
            FilterDecision::drop(Reason::Stale)
        } else if !seen.insert(article.link()) {
            FilterDecision::drop(Reason::Duplicate)
        } else {
            policy.classify(article)
        };

        tracing::debug!(
            link = %article.link(),
            include = decision.include,
            reason = ?decision.reason,
            "Filter decision"
        );

        if decision.include {
            selection.qualified += 1;
            if selection.articles.len() < policy.max_per_post {
                selection.articles.push(article.clone());
            }
        }
        selection
            .decisions
            .push((article.link().to_string(), decision));
    }

    selection
}
