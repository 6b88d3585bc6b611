//! Recurrence evaluation for the scheduler loop.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use reportd_core::{ReportdError, ReportdResult};
use reportd_domain::Recurrence;

#[derive(Debug)]
pub struct RecurrenceSchedule {
    schedule: Schedule,
}

impl RecurrenceSchedule {
    pub fn new(recurrence: &Recurrence) -> ReportdResult<Self> {
        let expr = recurrence.to_cron_expression();
        let schedule = Schedule::from_str(&expr).map_err(|e| ReportdError::InvalidRecurrence {
            expr,
            message: e.to_string(),
        })?;
        Ok(Self { schedule })
    }

    pub fn validate(recurrence: &Recurrence) -> ReportdResult<()> {
        Self::new(recurrence).map(|_| ())
    }

    pub fn next_after(&self, when: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&when).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn next_fire_time_respects_the_fields() {
        let recurrence = Recurrence::new("30", "6", "*");
        let schedule = RecurrenceSchedule::new(&recurrence).unwrap();

        let now = Utc.with_ymd_and_hms(2024, 1, 15, 7, 0, 0).unwrap();
        let next = schedule.next_after(now).unwrap();

        assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 16, 6, 30, 0).unwrap());
    }

    #[test]
    fn wildcard_recurrence_fires_every_minute() {
        let schedule = RecurrenceSchedule::new(&Recurrence::default()).unwrap();

        let now = Utc.with_ymd_and_hms(2024, 1, 15, 7, 0, 30).unwrap();
        let next = schedule.next_after(now).unwrap();

        assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 15, 7, 1, 0).unwrap());
    }

    #[test]
    fn invalid_fields_are_rejected_with_the_expression() {
        let recurrence = Recurrence::new("61", "*", "*");
        let err = RecurrenceSchedule::new(&recurrence).unwrap_err();

        match err {
            ReportdError::InvalidRecurrence { expr, .. } => {
                assert_eq!(expr, "0 61 * * * *");
            }
            other => panic!("expected InvalidRecurrence, got {other:?}"),
        }
    }
}
