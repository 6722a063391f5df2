//! Daily trigger gate.
//!
//! The pipeline is polled on a fixed cadence (hourly by default). The gate
//! fires once per UTC calendar day, on the first poll that lands in the
//! configured trigger hour. State lives in a [`ScheduleState`] passed in by
//! the caller, so tests can walk through several days without touching the
//! wall clock.
use chrono::{DateTime, Days, NaiveDate, TimeZone, Timelike, Utc};

/// Process-lifetime record of the last day the daily job fired.
///
/// Resets on restart; the daily cycle is re-derived from wall-clock time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleState {
    last_fired: Option<NaiveDate>,
}

impl ScheduleState {
    pub fn last_fired(&self) -> Option<NaiveDate> {
        self.last_fired
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTrigger {
    hour: u32,
}

impl DailyTrigger {
    /// Creates a trigger for the given UTC hour, or `None` if `hour > 23`.
    pub fn new(hour: u32) -> Option<Self> {
        (hour < 24).then_some(Self { hour })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// Returns true if `now` is a new firing, recording it in `state`.
    ///
    /// Repeated checks within the trigger hour return true only once.
    pub fn check(&self, now: DateTime<Utc>, state: &mut ScheduleState) -> bool {
        let today = now.date_naive();
        if now.hour() != self.hour || state.last_fired == Some(today) {
            return false;
        }
        state.last_fired = Some(today);
        true
    }

    /// The start of the next trigger hour that would fire after `now`.
    pub fn next_fire_after(&self, now: DateTime<Utc>, state: &ScheduleState) -> DateTime<Utc> {
        let today = now.date_naive();
        let fired_today = state.last_fired == Some(today);

        let day = if now.hour() < self.hour || (now.hour() == self.hour && !fired_today) {
            today
        } else {
            today.checked_add_days(Days::new(1)).unwrap_or(today)
        };

        let start = day
            .and_hms_opt(self.hour, 0, 0)
            .unwrap_or_else(|| day.and_time(chrono::NaiveTime::MIN));
        let start = Utc.from_utc_datetime(&start);

        // Inside an unfired trigger hour the next poll will fire
        if start < now {
            now
        } else {
            start
        }
    }
}

impl Default for DailyTrigger {
    fn default() -> Self {
        Self { hour: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_rejects_invalid_hour() {
        assert!(DailyTrigger::new(24).is_none());
        assert_eq!(DailyTrigger::new(23).map(|t| t.hour()), Some(23));
    }

    #[test]
    fn test_fires_once_within_trigger_hour() {
        let trigger = DailyTrigger::default();
        let mut state = ScheduleState::default();

        assert!(trigger.check(at("2024-05-01T01:00:05Z"), &mut state));
        assert!(!trigger.check(at("2024-05-01T01:45:00Z"), &mut state));
        assert_eq!(state.last_fired(), NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn test_fires_again_next_day() {
        let trigger = DailyTrigger::default();
        let mut state = ScheduleState::default();

        assert!(trigger.check(at("2024-05-01T01:10:00Z"), &mut state));
        assert!(!trigger.check(at("2024-05-01T01:50:00Z"), &mut state));
        assert!(trigger.check(at("2024-05-02T01:10:00Z"), &mut state));
    }

    #[test]
    fn test_hourly_polling_fires_every_day() {
        // Off-the-hour start: no poll lands on 01:00 exactly
        let trigger = DailyTrigger::default();
        let mut state = ScheduleState::default();
        let start = at("2024-05-01T00:30:00Z");
        let fired = (0..72)
            .map(|i| start + chrono::TimeDelta::minutes(60 * i))
            .filter(|now| trigger.check(*now, &mut state))
            .count();
        assert_eq!(fired, 3);
    }

    #[test]
    fn test_does_not_fire_outside_trigger_hour() {
        let trigger = DailyTrigger::default();
        let mut state = ScheduleState::default();

        assert!(!trigger.check(at("2024-05-01T00:59:59Z"), &mut state));
        assert!(!trigger.check(at("2024-05-01T02:00:00Z"), &mut state));
        assert_eq!(state.last_fired(), None);
    }

    #[test]
    fn test_next_fire_before_trigger_hour_is_today() {
        let trigger = DailyTrigger::new(9).unwrap();
        let state = ScheduleState::default();
        assert_eq!(
            trigger.next_fire_after(at("2024-05-01T03:00:00Z"), &state),
            at("2024-05-01T09:00:00Z")
        );
    }

    #[test]
    fn test_next_fire_after_firing_is_tomorrow() {
        let trigger = DailyTrigger::default();
        let mut state = ScheduleState::default();
        let now = at("2024-05-31T01:20:00Z");
        assert!(trigger.check(now, &mut state));
        assert_eq!(
            trigger.next_fire_after(now, &state),
            at("2024-06-01T01:00:00Z")
        );
    }

    #[test]
    fn test_next_fire_inside_unfired_hour_is_now() {
        let trigger = DailyTrigger::default();
        let state = ScheduleState::default();
        let now = at("2024-05-01T01:30:00Z");
        assert_eq!(trigger.next_fire_after(now, &state), now);
    }
}
