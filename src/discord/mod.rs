//! Everything that talks to Discord, plus the message shapes posted there.
//!
//! - [`format`] builds platform-neutral [`OutgoingMessage`]s
//! - [`MessageSink`] is the delivery seam; [`SerenitySink`] posts for real,
//!   [`LogSink`] only logs (dry runs), [`TextFallbackSink`] resends refused
//!   embeds as text
//! - [`commands`] parses chat commands and builds replies
//! - [`Handler`] is the gateway event handler wiring commands to the pipeline

mod client;
pub mod commands;
pub mod format;
mod handler;
mod sink;

pub use client::SerenitySink;
pub use commands::{AdminPolicy, Caller};
pub use format::{Card, NewsPost, OutgoingMessage};
pub use handler::Handler;
pub use sink::{LogSink, MessageSink, PostError, TextFallbackSink};
