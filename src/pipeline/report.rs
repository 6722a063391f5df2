use super::Trigger;
use crate::discord::PostError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How a run ended, from the audience's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Nothing recent and relevant was found.
    NothingToPost,
    /// Every channel received every selected article.
    Delivered,
    /// Some channels or articles failed, at least one post went out.
    Partial,
    /// Nothing was delivered (no reachable channel).
    Failed,
}

/// Delivery result for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: u64,
    pub delivered: usize,
    pub failed: usize,
    /// The error that abandoned the channel, or the last per-article error.
    pub error: Option<PostError>,
}

/// Everything a single run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub trigger: Trigger,
    pub started_at: DateTime<Utc>,
    pub fetched: usize,
    pub failed_sources: usize,
    /// Articles that passed the filter before truncation.
    pub qualified: usize,
    pub selected: usize,
    /// Selected articles posted at least partly in the source language.
    pub untranslated: usize,
    pub channels: Vec<ChannelReport>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub(crate) fn conclude(mut self) -> Self {
        self.outcome = if self.selected == 0 {
            RunOutcome::NothingToPost
        } else if self.channels.iter().all(|c| c.delivered == 0) {
            RunOutcome::Failed
        } else if self
            .channels
            .iter()
            .all(|c| c.error.is_none() && c.delivered == self.selected)
        {
            RunOutcome::Delivered
        } else {
            RunOutcome::Partial
        };
        self
    }

    pub fn delivered(&self) -> usize {
        self.channels.iter().map(|c| c.delivered).sum()
    }
}

/// Compact, serializable view of the last run for `!status` and `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub at: DateTime<Utc>,
    pub trigger: Trigger,
    pub outcome: RunOutcome,
    pub fetched: usize,
    pub selected: usize,
    pub channels_ok: usize,
    pub channels_total: usize,
}

impl From<&RunReport> for RunSummary {
    fn from(report: &RunReport) -> Self {
        Self {
            at: report.started_at,
            trigger: report.trigger,
            outcome: report.outcome,
            fetched: report.fetched,
            selected: report.selected,
            channels_ok: report.channels.iter().filter(|c| c.error.is_none()).count(),
            channels_total: report.channels.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(selected: usize, channels: Vec<ChannelReport>) -> RunReport {
        RunReport {
            trigger: Trigger::Scheduled,
            started_at: "2024-05-01T01:00:00Z".parse().unwrap(),
            fetched: 10,
            failed_sources: 0,
            qualified: selected,
            selected,
            untranslated: 0,
            channels,
            outcome: RunOutcome::Failed,
        }
        .conclude()
    }

    fn channel(channel: u64, delivered: usize, error: Option<PostError>) -> ChannelReport {
        ChannelReport {
            channel,
            delivered,
            failed: if error.is_some() { 1 } else { 0 },
            error,
        }
    }

    #[test]
    fn test_outcomes() {
        assert_eq!(report(0, vec![]).outcome, RunOutcome::NothingToPost);
        assert_eq!(report(2, vec![]).outcome, RunOutcome::Failed);
        assert_eq!(
            report(2, vec![channel(1, 2, None), channel(2, 2, None)]).outcome,
            RunOutcome::Delivered
        );
        assert_eq!(
            report(
                2,
                vec![channel(1, 2, None), channel(2, 0, Some(PostError::PermissionDenied(2)))]
            )
            .outcome,
            RunOutcome::Partial
        );
        assert_eq!(
            report(2, vec![channel(1, 0, Some(PostError::NotFound(1)))]).outcome,
            RunOutcome::Failed
        );
    }

    #[test]
    fn test_summary_counts_healthy_channels() {
        let report = report(
            1,
            vec![channel(1, 1, None), channel(2, 0, Some(PostError::NotFound(2)))],
        );
        let summary = RunSummary::from(&report);
        assert_eq!(summary.channels_ok, 1);
        assert_eq!(summary.channels_total, 2);
        assert_eq!(summary.outcome, RunOutcome::Partial);
        assert_eq!(report.delivered(), 1);
    }
}
