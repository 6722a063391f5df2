//! Property tests for article selection.
//!
//! Articles are generated with random ages, titles drawn from a small
//! vocabulary (so both tech and non-tech titles appear) and links from a
//! small pool (so duplicates appear).

use chrono::{DateTime, TimeDelta, Utc};
use newsbot::feed::{Article, Source};
use newsbot::filter::{select, FilterPolicy, Reason};
use proptest::prelude::*;
use std::collections::HashSet;

const TITLES: &[&str] = &[
    "Apple unveils new chip",
    "Senate debates new budget bill",
    "Google ships Android update",
    "Box office weekend recap",
    "Startup raises funding for robotics",
    "Local bakery opens",
    "Microsoft and the election",
];

fn now() -> DateTime<Utc> {
    "2024-05-01T12:00:00Z".parse().unwrap()
}

fn arb_article() -> impl Strategy<Value = Article> {
    (0..TITLES.len(), -120i64..=3 * 24 * 60, 0usize..8, any::<bool>()).prop_map(
        |(title, age_minutes, link, verge)| {
            Article::new(
                if verge { Source::TheVerge } else { Source::Cnet },
                TITLES[title],
                "",
                format!("https://example.com/{}", link),
                now() - TimeDelta::minutes(age_minutes),
            )
        },
    )
}

fn policy(max_per_post: usize, strict: bool) -> FilterPolicy {
    FilterPolicy {
        max_per_post,
        strict,
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn selected_articles_are_recent(
        articles in prop::collection::vec(arb_article(), 0..30),
        max in 1usize..6,
        strict in any::<bool>(),
    ) {
        let policy = policy(max, strict);
        let selection = select(&articles, now(), &policy);
        for article in &selection.articles {
            prop_assert!(now() - article.published_at() <= policy.cutoff);
        }
    }

    #[test]
    fn selection_is_bounded_unique_and_in_fetch_order(
        articles in prop::collection::vec(arb_article(), 0..30),
        max in 1usize..6,
        strict in any::<bool>(),
    ) {
        let selection = select(&articles, now(), &policy(max, strict));

        prop_assert!(selection.articles.len() <= max);
        prop_assert_eq!(selection.articles.len(), selection.qualified.min(max));
        prop_assert_eq!(selection.decisions.len(), articles.len());

        let links: HashSet<&str> = selection.articles.iter().map(|a| a.link()).collect();
        prop_assert_eq!(links.len(), selection.articles.len());

        // Selected articles are the first included decisions, in input order
        let expected: Vec<&str> = selection
            .decisions
            .iter()
            .filter(|(_, d)| d.include)
            .map(|(link, _)| link.as_str())
            .take(max)
            .collect();
        let actual: Vec<&str> = selection.articles.iter().map(|a| a.link()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn disabled_filter_keeps_every_recent_unique_article(
        articles in prop::collection::vec(arb_article(), 0..30),
    ) {
        let policy = policy(usize::MAX, false);
        let selection = select(&articles, now(), &policy);

        let mut seen = HashSet::new();
        let expected = articles
            .iter()
            .filter(|a| now() - a.published_at() <= policy.cutoff)
            .filter(|a| seen.insert(a.link().to_string()))
            .count();
        prop_assert_eq!(selection.articles.len(), expected);
        prop_assert!(selection
            .decisions
            .iter()
            .all(|(_, d)| !d.include || d.reason == Reason::FilterDisabled));
    }

    #[test]
    fn classification_does_not_depend_on_position(
        articles in prop::collection::vec(arb_article(), 1..10),
    ) {
        let policy = FilterPolicy::default();
        let reversed: Vec<Article> = articles.iter().rev().cloned().collect();
        for article in &articles {
            let forward = policy.classify(article);
            let backward = policy.classify(reversed.iter().find(|a| *a == article).unwrap());
            prop_assert_eq!(forward, backward);
        }
    }
}
