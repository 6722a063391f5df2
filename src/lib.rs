//! Discord bot that posts the day's tech news from RSS feeds, translated to
//! Mongolian.
//!
//! The pieces, bottom-up:
//!
//! - [`feed`]: fetch and normalize RSS/Atom entries into [`feed::Article`]s
//! - [`filter`]: recency, dedup and the rule-table relevance classifier
//! - [`schedule`]: the once-a-day UTC trigger
//! - [`translate`]: translation with chunking, retries and fallback
//! - [`discord`]: message formatting, delivery and chat commands
//! - [`pipeline`]: one run end to end, and the actor that serializes runs
//! - [`health`]: HTTP liveness endpoint
//! - [`config`]: TOML file plus environment overrides

pub mod config;
pub mod discord;
pub mod feed;
pub mod filter;
pub mod health;
pub mod pipeline;
pub mod schedule;
pub mod state;
pub mod translate;
pub mod util;
