use super::messages::{PipelineError, PipelineMessage, PipelineStatus};
use crate::pipeline::{RunReport, RunRequest};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

/// Cloneable front door to the pipeline actor.
///
/// Requests are queued and handled one at a time, so a manual run sent while
/// a scheduled run is in progress waits for it to finish.
#[derive(Clone)]
pub struct PipelineHandle {
    sender: mpsc::Sender<PipelineMessage>,
}

impl PipelineHandle {
    pub fn new(sender: mpsc::Sender<PipelineMessage>) -> Self {
        Self { sender }
    }

    /// Runs immediately (after anything already queued) and returns the report.
    pub async fn run(&self, request: RunRequest) -> Result<RunReport, PipelineError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(PipelineMessage::Run { request, reply })
            .await
            .map_err(|_| PipelineError::ServiceUnavailable)?;
        rx.await.map_err(|_| PipelineError::ServiceUnavailable)
    }

    /// Checks the daily trigger at `now` and waits for the run if it fired.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<Option<RunReport>, PipelineError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(PipelineMessage::Tick {
                now,
                reply: Some(reply),
            })
            .await
            .map_err(|_| PipelineError::ServiceUnavailable)?;
        rx.await.map_err(|_| PipelineError::ServiceUnavailable)
    }

    pub async fn status(&self) -> Result<PipelineStatus, PipelineError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(PipelineMessage::Status { reply })
            .await
            .map_err(|_| PipelineError::ServiceUnavailable)?;
        rx.await.map_err(|_| PipelineError::ServiceUnavailable)
    }

    /// Fire-and-forget tick from the interval timer.
    pub(super) async fn send_timer_tick(&self, now: DateTime<Utc>) -> bool {
        self.sender
            .send(PipelineMessage::Tick { now, reply: None })
            .await
            .is_ok()
    }
}
