//! Attendance evaluator: geofence eligibility, duplicate guard, status
//! classification and the guarded write. Every check resolves before the
//! insert; once the insert commits nothing reverses it.

pub mod classify;
pub mod stats;

use chrono::NaiveDate;

use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceKind, AttendanceStatus};
use crate::model::geo::{FenceCheck, GeoPoint};
use crate::model::school::SchoolPolicy;
use crate::store::{NewRecord, RecordFilter, RecordStore};

use classify::{Clock, classify};

/// A self-service kiosk submission.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub school_id: u64,
    pub subject_id: u64,
    pub subject_name: String,
    pub kind: AttendanceKind,
    pub location: Option<GeoPoint>,
}

/// The committed record plus the measured distance for user messaging.
#[derive(Debug)]
pub struct Submission {
    pub id: u64,
    pub record: NewRecord,
    pub distance_m: Option<f64>,
}

/// Geofenced self-service flow: location -> fence -> duplicate guard ->
/// classification -> single append.
pub async fn submit<S: RecordStore>(
    store: &S,
    policy: &SchoolPolicy,
    clock: &impl Clock,
    request: &CheckRequest,
) -> Result<Submission, AttendanceError> {
    let location = request.location.ok_or(AttendanceError::LocationUnavailable)?;

    let distance_m = match policy.fence.evaluate(&location) {
        FenceCheck::NotConfigured => return Err(AttendanceError::ConfigurationMissing),
        FenceCheck::Outside { distance_m } => {
            return Err(AttendanceError::OutOfRange {
                distance_m,
                radius_m: policy.fence.radius_m,
            });
        }
        FenceCheck::Within { distance_m } => distance_m,
    };

    let now = clock.now();
    guard_duplicate(store, request.subject_id, now.date(), request.kind).await?;

    let record = NewRecord {
        school_id: request.school_id,
        subject_id: request.subject_id,
        subject_name: request.subject_name.clone(),
        date: now.date(),
        time: now.time(),
        kind: request.kind,
        status: classify(request.kind, now.time(), policy.late_cutoff),
        latitude: Some(location.latitude),
        longitude: Some(location.longitude),
    };
    let id = store.insert(&record).await?;

    Ok(Submission { id, record, distance_m: Some(distance_m) })
}

/// Operator flow (QR/manual entry): no geofence, status is assigned by the
/// operator rather than computed. The per-day uniqueness still applies.
pub async fn submit_manual<S: RecordStore>(
    store: &S,
    clock: &impl Clock,
    school_id: u64,
    subject_id: u64,
    subject_name: String,
    date: Option<NaiveDate>,
    status: AttendanceStatus,
) -> Result<Submission, AttendanceError> {
    let now = clock.now();
    let date = date.unwrap_or_else(|| now.date());
    let kind = AttendanceKind::CheckIn;

    guard_duplicate(store, subject_id, date, kind).await?;

    let record = NewRecord {
        school_id,
        subject_id,
        subject_name,
        date,
        time: now.time(),
        kind,
        status,
        latitude: None,
        longitude: None,
    };
    let id = store.insert(&record).await?;

    Ok(Submission { id, record, distance_m: None })
}

/// Best-effort pre-check; the unique index on (subject_id, date, kind) is
/// the authoritative backstop for concurrent submissions.
async fn guard_duplicate<S: RecordStore>(
    store: &S,
    subject_id: u64,
    date: NaiveDate,
    kind: AttendanceKind,
) -> Result<(), AttendanceError> {
    let existing = store
        .count(&RecordFilter::duplicate_probe(subject_id, date, kind))
        .await?;
    if existing > 0 {
        return Err(AttendanceError::DuplicateSubmission);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::evaluator::classify::FixedClock;
    use crate::model::attendance::AttendanceRecord;
    use crate::model::geo::GeofenceConfig;
    use chrono::{NaiveDateTime, NaiveTime};
    use std::cell::RefCell;

    /// In-memory stand-in for the MySQL store, enforcing the same
    /// (subject_id, date, kind) uniqueness the schema index does.
    #[derive(Default)]
    struct MemStore {
        rows: RefCell<Vec<AttendanceRecord>>,
    }

    impl MemStore {
        fn matches(record: &AttendanceRecord, filter: &RecordFilter) -> bool {
            filter.school_id.is_none_or(|v| record.school_id == v)
                && filter.subject_id.is_none_or(|v| record.subject_id == v)
                && filter.kind.is_none_or(|v| record.kind == v)
                && filter.status.is_none_or(|v| record.status == v)
                && filter.from.is_none_or(|v| record.date >= v)
                && filter.to.is_none_or(|v| record.date <= v)
        }
    }

    impl RecordStore for MemStore {
        async fn find(&self, filter: &RecordFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
            Ok(self
                .rows
                .borrow()
                .iter()
                .filter(|r| Self::matches(r, filter))
                .cloned()
                .collect())
        }

        async fn count(&self, filter: &RecordFilter) -> Result<i64, StoreError> {
            Ok(self.find(filter).await?.len() as i64)
        }

        async fn insert(&self, record: &NewRecord) -> Result<u64, StoreError> {
            let mut rows = self.rows.borrow_mut();
            if rows.iter().any(|r| {
                r.subject_id == record.subject_id && r.date == record.date && r.kind == record.kind
            }) {
                return Err(StoreError::Duplicate);
            }
            let id = rows.len() as u64 + 1;
            rows.push(AttendanceRecord {
                id,
                school_id: record.school_id,
                subject_id: record.subject_id,
                subject_name: record.subject_name.clone(),
                date: record.date,
                time: record.time,
                kind: record.kind,
                status: record.status,
                latitude: record.latitude,
                longitude: record.longitude,
                created_at: None,
            });
            Ok(id)
        }
    }

    fn policy(center: Option<GeoPoint>, radius_m: f64, cutoff: (u32, u32)) -> SchoolPolicy {
        SchoolPolicy {
            fence: GeofenceConfig { center, radius_m },
            late_cutoff: NaiveTime::from_hms_opt(cutoff.0, cutoff.1, 0).unwrap(),
        }
    }

    fn at(date: (i32, u32, u32), time: (u32, u32)) -> FixedClock {
        FixedClock(NaiveDateTime::new(
            chrono::NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap(),
        ))
    }

    fn budi_request(location: Option<GeoPoint>) -> CheckRequest {
        CheckRequest {
            school_id: 1,
            subject_id: 7,
            subject_name: "Budi".to_string(),
            kind: AttendanceKind::CheckIn,
            location,
        }
    }

    const SCHOOL: GeoPoint = GeoPoint { latitude: -6.2, longitude: 106.8166 };

    #[actix_web::test]
    async fn on_time_check_in_then_duplicate_rejected() {
        let store = MemStore::default();
        let policy = policy(Some(SCHOOL), 100.0, (8, 0));
        let clock = at((2026, 8, 3), (7, 30));

        let submission = submit(&store, &policy, &clock, &budi_request(Some(SCHOOL)))
            .await
            .unwrap();
        assert_eq!(submission.record.status, AttendanceStatus::Present);
        assert_eq!(submission.distance_m, Some(0.0));
        assert_eq!(store.count(&RecordFilter::default()).await.unwrap(), 1);

        let second = submit(&store, &policy, &clock, &budi_request(Some(SCHOOL))).await;
        assert!(matches!(second, Err(AttendanceError::DuplicateSubmission)));
        assert_eq!(store.count(&RecordFilter::default()).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn late_check_in_at_cutoff() {
        let store = MemStore::default();
        let policy = policy(Some(SCHOOL), 100.0, (8, 0));
        let clock = at((2026, 8, 3), (8, 0));

        let submission = submit(&store, &policy, &clock, &budi_request(Some(SCHOOL)))
            .await
            .unwrap();
        assert_eq!(submission.record.status, AttendanceStatus::Late);
    }

    #[actix_web::test]
    async fn check_out_same_day_is_a_separate_slot() {
        let store = MemStore::default();
        let policy = policy(Some(SCHOOL), 100.0, (8, 0));

        submit(&store, &policy, &at((2026, 8, 3), (7, 30)), &budi_request(Some(SCHOOL)))
            .await
            .unwrap();

        let mut out = budi_request(Some(SCHOOL));
        out.kind = AttendanceKind::CheckOut;
        let submission = submit(&store, &policy, &at((2026, 8, 3), (16, 5)), &out)
            .await
            .unwrap();
        // Lateness never applies to check-out.
        assert_eq!(submission.record.status, AttendanceStatus::Present);
        assert_eq!(store.count(&RecordFilter::default()).await.unwrap(), 2);
    }

    #[actix_web::test]
    async fn out_of_range_is_rejected_with_distance() {
        let store = MemStore::default();
        let policy = policy(Some(SCHOOL), 100.0, (8, 0));
        // ~1 km north of the school.
        let far = GeoPoint { latitude: -6.2 + 0.009, longitude: 106.8166 };

        let result = submit(&store, &policy, &at((2026, 8, 3), (7, 30)), &budi_request(Some(far))).await;
        match result {
            Err(AttendanceError::OutOfRange { distance_m, radius_m }) => {
                assert!((distance_m - 1000.0).abs() < 10.0);
                assert_eq!(radius_m, 100.0);
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
        assert_eq!(store.count(&RecordFilter::default()).await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn missing_location_and_missing_fence_are_distinct() {
        let store = MemStore::default();

        let no_reading = submit(
            &store,
            &policy(Some(SCHOOL), 100.0, (8, 0)),
            &at((2026, 8, 3), (7, 30)),
            &budi_request(None),
        )
        .await;
        assert!(matches!(no_reading, Err(AttendanceError::LocationUnavailable)));

        let no_fence = submit(
            &store,
            &policy(None, 100.0, (8, 0)),
            &at((2026, 8, 3), (7, 30)),
            &budi_request(Some(SCHOOL)),
        )
        .await;
        assert!(matches!(no_fence, Err(AttendanceError::ConfigurationMissing)));
    }

    #[actix_web::test]
    async fn manual_entry_honours_the_duplicate_guard() {
        let store = MemStore::default();
        let clock = at((2026, 8, 3), (9, 15));

        let submission = submit_manual(
            &store,
            &clock,
            1,
            7,
            "Budi".to_string(),
            None,
            AttendanceStatus::Sick,
        )
        .await
        .unwrap();
        assert_eq!(submission.record.status, AttendanceStatus::Sick);
        assert_eq!(submission.distance_m, None);

        let second = submit_manual(
            &store,
            &clock,
            1,
            7,
            "Budi".to_string(),
            None,
            AttendanceStatus::Present,
        )
        .await;
        assert!(matches!(second, Err(AttendanceError::DuplicateSubmission)));
    }

    #[actix_web::test]
    async fn insert_race_maps_duplicate_key_to_domain_error() {
        // Simulate the race the pre-check cannot see: the row appears
        // between the guard and the insert. MemStore's uniqueness check
        // plays the part of the schema index.
        let store = MemStore::default();
        let clock = at((2026, 8, 3), (7, 30));
        store
            .insert(&NewRecord {
                school_id: 1,
                subject_id: 7,
                subject_name: "Budi".to_string(),
                date: clock.0.date(),
                time: clock.0.time(),
                kind: AttendanceKind::CheckIn,
                status: AttendanceStatus::Present,
                latitude: None,
                longitude: None,
            })
            .await
            .unwrap();

        let err = store
            .insert(&NewRecord {
                school_id: 1,
                subject_id: 7,
                subject_name: "Budi".to_string(),
                date: clock.0.date(),
                time: clock.0.time(),
                kind: AttendanceKind::CheckIn,
                status: AttendanceStatus::Present,
                latitude: None,
                longitude: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(AttendanceError::from(err), AttendanceError::DuplicateSubmission));
    }
}
