use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

/// Per-status counts and integer percentages over a queried record set.
/// Derived on demand for reporting; never persisted.
#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct AttendanceStats {
    pub present: u32,
    pub late: u32,
    pub permitted: u32,
    pub sick: u32,
    pub absent: u32,
    pub total: u32,
    pub present_pct: u8,
    pub late_pct: u8,
    pub permitted_pct: u8,
    pub sick_pct: u8,
    pub absent_pct: u8,
}

fn percentage(count: u32, total: u32) -> u8 {
    // total clamped to 1 so an empty set yields 0% everywhere.
    (count as f64 * 100.0 / total.max(1) as f64).round() as u8
}

impl AttendanceStats {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AttendanceRecord>,
    {
        let mut stats = Self::default();
        for record in records {
            match record.status {
                AttendanceStatus::Present => stats.present += 1,
                AttendanceStatus::Late => stats.late += 1,
                AttendanceStatus::Permitted => stats.permitted += 1,
                AttendanceStatus::Sick => stats.sick += 1,
                AttendanceStatus::Absent => stats.absent += 1,
            }
            stats.total += 1;
        }
        stats.present_pct = percentage(stats.present, stats.total);
        stats.late_pct = percentage(stats.late, stats.total);
        stats.permitted_pct = percentage(stats.permitted, stats.total);
        stats.sick_pct = percentage(stats.sick, stats.total);
        stats.absent_pct = percentage(stats.absent, stats.total);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceKind;
    use chrono::{NaiveDate, NaiveTime};

    fn record(status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: 0,
            school_id: 1,
            subject_id: 7,
            subject_name: "Budi".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
            time: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            kind: AttendanceKind::CheckIn,
            status,
            latitude: None,
            longitude: None,
            created_at: None,
        }
    }

    #[test]
    fn nineteen_present_one_sick_out_of_twenty() {
        let mut records: Vec<_> = (0..19).map(|_| record(AttendanceStatus::Present)).collect();
        records.push(record(AttendanceStatus::Sick));

        let stats = AttendanceStats::from_records(&records);
        assert_eq!(stats.total, 20);
        assert_eq!(stats.present_pct, 95);
        assert_eq!(stats.sick_pct, 5);
        assert_eq!(stats.late_pct, 0);
        assert_eq!(stats.permitted_pct, 0);
        assert_eq!(stats.absent_pct, 0);
    }

    #[test]
    fn empty_set_yields_zero_everywhere() {
        let stats = AttendanceStats::from_records(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.present_pct, 0);
        assert_eq!(stats.absent_pct, 0);
    }

    #[test]
    fn rounding_is_half_up() {
        // 1 of 3 = 33.33 -> 33; 2 of 3 = 66.67 -> 67; 1 of 8 = 12.5 -> 13
        let records = vec![
            record(AttendanceStatus::Present),
            record(AttendanceStatus::Late),
            record(AttendanceStatus::Late),
        ];
        let stats = AttendanceStats::from_records(&records);
        assert_eq!(stats.present_pct, 33);
        assert_eq!(stats.late_pct, 67);

        let mut eighth: Vec<_> = (0..7).map(|_| record(AttendanceStatus::Present)).collect();
        eighth.push(record(AttendanceStatus::Sick));
        assert_eq!(AttendanceStats::from_records(&eighth).sick_pct, 13);
    }
}
