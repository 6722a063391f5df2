use super::handle::PipelineHandle;
use super::messages::{PipelineMessage, PipelineStatus};
use crate::pipeline::{Pipeline, RunReport, RunRequest, RunSummary};
use crate::schedule::{DailyTrigger, ScheduleState};
use crate::state::BotState;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const MAILBOX_CAPACITY: usize = 32;

/// Owns the pipeline and the daily trigger state.
pub struct PipelineActor {
    pipeline: Pipeline,
    trigger: DailyTrigger,
    schedule: ScheduleState,
    poll_interval: Duration,
    last_run: Option<RunSummary>,
    state: Arc<BotState>,
    receiver: mpsc::Receiver<PipelineMessage>,
}

impl PipelineActor {
    /// Creates the actor together with a handle to its mailbox.
    pub fn new(
        pipeline: Pipeline,
        trigger: DailyTrigger,
        poll_interval: Duration,
        state: Arc<BotState>,
    ) -> (Self, PipelineHandle) {
        let (sender, receiver) = mpsc::channel(MAILBOX_CAPACITY);
        let actor = Self {
            pipeline,
            trigger,
            schedule: ScheduleState::default(),
            poll_interval,
            last_run: None,
            state,
            receiver,
        };
        (actor, PipelineHandle::new(sender))
    }

    /// Starts the interval timer that feeds `Tick`s into the mailbox.
    ///
    /// The first tick is immediate, so a bot started during the trigger hour
    /// posts right away.
    pub fn spawn_timer(&self, handle: PipelineHandle) -> JoinHandle<()> {
        let period = self.poll_interval;
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                timer.tick().await;
                if !handle.send_timer_tick(Utc::now()).await {
                    break;
                }
            }
        })
    }

    pub async fn run(mut self) {
        tracing::info!(
            trigger_hour = self.trigger.hour(),
            poll_minutes = self.poll_interval.as_secs() / 60,
            "Pipeline actor started"
        );

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }

        tracing::info!("Pipeline actor stopped");
    }

    async fn handle_message(&mut self, msg: PipelineMessage) {
        match msg {
            PipelineMessage::Tick { now, reply } => {
                let report = self.on_tick(now).await;
                if let Some(reply) = reply {
                    let _ = reply.send(report);
                }
            }

            PipelineMessage::Run { request, reply } => {
                let report = self.execute(&request, Utc::now()).await;
                let _ = reply.send(report);
            }

            PipelineMessage::Status { reply } => {
                let _ = reply.send(self.status(Utc::now()));
            }
        }
    }

    async fn on_tick(&mut self, now: DateTime<Utc>) -> Option<RunReport> {
        if !self.trigger.check(now, &mut self.schedule) {
            tracing::debug!(
                now = %now,
                trigger_hour = self.trigger.hour(),
                "Daily trigger not due"
            );
            return None;
        }

        tracing::info!(date = %now.date_naive(), "Daily trigger fired");
        Some(self.execute(&RunRequest::scheduled(), now).await)
    }

    async fn execute(&mut self, request: &RunRequest, now: DateTime<Utc>) -> RunReport {
        let report = self.pipeline.run(request, now).await;
        let summary = RunSummary::from(&report);
        self.state.record_run(summary.clone()).await;
        self.last_run = Some(summary);
        report
    }

    fn status(&self, now: DateTime<Utc>) -> PipelineStatus {
        let settings = self.pipeline.settings();
        PipelineStatus {
            last_run: self.last_run.clone(),
            last_fired: self.schedule.last_fired(),
            next_scheduled: self.trigger.next_fire_after(now, &self.schedule),
            trigger_hour: self.trigger.hour(),
            poll_interval: self.poll_interval,
            channels: settings.channels.clone(),
            strict_filter: settings.policy.strict,
            sources: settings.sources.clone(),
        }
    }
}
