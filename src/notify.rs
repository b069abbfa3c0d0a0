use sqlx::MySqlPool;
use tracing::{debug, warn};

use crate::model::attendance::AttendanceKind;
use crate::store::NewRecord;

/// Fire-and-forget notification after a committed attendance write.
/// Both the geofenced and the operator manual flow go through here.
///
/// Rows land in the `notifications` outbox table for the external
/// messaging dispatcher to pick up. A failure here is logged and never
/// rolls back or shadows the attendance record.
pub fn dispatch_after_commit(pool: MySqlPool, record: &NewRecord) {
    let subject_name = record.subject_name.clone();
    let kind = record.kind;
    let date = record.date;
    let time = record.time;
    let message = format_message(record);

    actix_web::rt::spawn(async move {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (subject_name, kind, date, time, message)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&subject_name)
        .bind(kind)
        .bind(date)
        .bind(time)
        .bind(&message)
        .execute(&pool)
        .await;

        match result {
            Ok(_) => debug!(subject = %subject_name, %kind, "Notification queued"),
            Err(e) => warn!(error = %e, subject = %subject_name, "Notification dispatch failed"),
        }
    });
}

fn format_message(record: &NewRecord) -> String {
    let action = match record.kind {
        AttendanceKind::CheckIn => "checked in",
        AttendanceKind::CheckOut => "checked out",
    };
    format!(
        "{} {} on {} at {}",
        record.subject_name,
        action,
        record.date.format("%Y-%m-%d"),
        record.time.format("%H:%M")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::{NaiveDate, NaiveTime};

    fn record(kind: AttendanceKind, status: AttendanceStatus) -> NewRecord {
        NewRecord {
            school_id: 1,
            subject_id: 7,
            subject_name: "Budi".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
            time: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            kind,
            status,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn message_names_subject_action_and_moment() {
        let msg = format_message(&record(AttendanceKind::CheckIn, AttendanceStatus::Present));
        assert_eq!(msg, "Budi checked in on 2026-08-03 at 07:30");
    }

    #[test]
    fn manual_entries_produce_the_same_outbox_message() {
        // Operator-assigned records carry no coordinates and a selected
        // status; the notification contract is identical.
        let msg = format_message(&record(AttendanceKind::CheckIn, AttendanceStatus::Sick));
        assert_eq!(msg, "Budi checked in on 2026-08-03 at 07:30");

        let msg = format_message(&record(AttendanceKind::CheckOut, AttendanceStatus::Present));
        assert_eq!(msg, "Budi checked out on 2026-08-03 at 07:30");
    }
}
