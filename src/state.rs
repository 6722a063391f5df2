use crate::pipeline::RunSummary;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Process-wide facts shared by the gateway handler, the pipeline actor and
/// the health server.
#[derive(Debug)]
pub struct BotState {
    started_at: DateTime<Utc>,
    connected: AtomicBool,
    last_run: RwLock<Option<RunSummary>>,
}

impl BotState {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            connected: AtomicBool::new(false),
            last_run: RwLock::new(None),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime_secs(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.started_at).num_seconds().max(0)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    pub async fn last_run(&self) -> Option<RunSummary> {
        self.last_run.read().await.clone()
    }

    pub async fn record_run(&self, summary: RunSummary) {
        *self.last_run.write().await = Some(summary);
    }
}

impl Default for BotState {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}
