use crate::feed::FeedSource;
use crate::pipeline::{RunReport, RunRequest, RunSummary};
use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Pipeline service unavailable")]
    ServiceUnavailable,
}

/// Snapshot for `!status`.
#[derive(Debug, Clone)]
pub struct PipelineStatus {
    pub last_run: Option<RunSummary>,
    pub last_fired: Option<NaiveDate>,
    pub next_scheduled: DateTime<Utc>,
    pub trigger_hour: u32,
    pub poll_interval: Duration,
    pub channels: Vec<u64>,
    pub strict_filter: bool,
    pub sources: Vec<FeedSource>,
}

pub enum PipelineMessage {
    /// Periodic check of the daily trigger. Runs if the trigger fires.
    Tick {
        now: DateTime<Utc>,
        reply: Option<oneshot::Sender<Option<RunReport>>>,
    },

    /// Run now, bypassing the trigger gate.
    Run {
        request: RunRequest,
        reply: oneshot::Sender<RunReport>,
    },

    Status {
        reply: oneshot::Sender<PipelineStatus>,
    },
}
