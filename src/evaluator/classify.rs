use chrono::{Local, NaiveDateTime, NaiveTime};

use crate::model::attendance::{AttendanceKind, AttendanceStatus};

/// Source of "now" in organization-local time. Injected so the 08:00
/// boundary can be tested with fixed timestamps.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Late rule for self-service submissions. A check-in at or after the
/// school's cutoff is late; check-out carries no lateness rule.
pub fn classify(kind: AttendanceKind, time: NaiveTime, cutoff: NaiveTime) -> AttendanceStatus {
    match kind {
        AttendanceKind::CheckIn if time >= cutoff => AttendanceStatus::Late,
        _ => AttendanceStatus::Present,
    }
}

#[cfg(test)]
pub struct FixedClock(pub NaiveDateTime);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn check_in_before_cutoff_is_present() {
        assert_eq!(
            classify(AttendanceKind::CheckIn, t(7, 59), t(8, 0)),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn cutoff_is_inclusive_on_the_late_side() {
        assert_eq!(
            classify(AttendanceKind::CheckIn, t(8, 0), t(8, 0)),
            AttendanceStatus::Late
        );
        assert_eq!(
            classify(AttendanceKind::CheckIn, t(8, 1), t(8, 0)),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn check_out_has_no_lateness_rule() {
        assert_eq!(
            classify(AttendanceKind::CheckOut, t(17, 30), t(8, 0)),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn cutoff_is_per_school_configuration() {
        assert_eq!(
            classify(AttendanceKind::CheckIn, t(8, 30), t(9, 0)),
            AttendanceStatus::Present
        );
        assert_eq!(
            classify(AttendanceKind::CheckIn, t(7, 0), t(6, 45)),
            AttendanceStatus::Late
        );
    }
}
