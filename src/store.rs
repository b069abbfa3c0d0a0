use chrono::{NaiveDate, NaiveTime};
use sqlx::MySqlPool;

use crate::error::StoreError;
use crate::model::attendance::{AttendanceKind, AttendanceRecord, AttendanceStatus};

/// Structured filter over the attendance log. Handlers and the evaluator
/// build these instead of ad hoc SQL so the duplicate guard and the
/// aggregation queries stay backend-agnostic.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub school_id: Option<u64>,
    pub subject_id: Option<u64>,
    pub kind: Option<AttendanceKind>,
    pub status: Option<AttendanceStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl RecordFilter {
    /// The exact-match probe the duplicate guard runs before an insert.
    pub fn duplicate_probe(subject_id: u64, date: NaiveDate, kind: AttendanceKind) -> Self {
        Self {
            subject_id: Some(subject_id),
            kind: Some(kind),
            from: Some(date),
            to: Some(date),
            ..Self::default()
        }
    }
}

/// A record not yet written. Insertion is a single atomic append; there is
/// no partial-write state to clean up on failure.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub school_id: u64,
    pub subject_id: u64,
    pub subject_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub kind: AttendanceKind,
    pub status: AttendanceStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// The attendance log, append-only. The MySQL implementation backs this
/// with a unique index on (subject_id, date, kind).
pub trait RecordStore {
    async fn find(&self, filter: &RecordFilter) -> Result<Vec<AttendanceRecord>, StoreError>;
    async fn count(&self, filter: &RecordFilter) -> Result<i64, StoreError>;
    async fn insert(&self, record: &NewRecord) -> Result<u64, StoreError>;
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(&'static str),
    Date(NaiveDate),
}

fn build_where(filter: &RecordFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(school_id) = filter.school_id {
        where_sql.push_str(" AND school_id = ?");
        args.push(FilterValue::U64(school_id));
    }
    if let Some(subject_id) = filter.subject_id {
        where_sql.push_str(" AND subject_id = ?");
        args.push(FilterValue::U64(subject_id));
    }
    if let Some(kind) = filter.kind {
        where_sql.push_str(" AND kind = ?");
        args.push(FilterValue::Str(match kind {
            AttendanceKind::CheckIn => "check_in",
            AttendanceKind::CheckOut => "check_out",
        }));
    }
    if let Some(status) = filter.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(match status {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Permitted => "permitted",
            AttendanceStatus::Sick => "sick",
            AttendanceStatus::Absent => "absent",
        }));
    }
    if let Some(from) = filter.from {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Date(from));
    }
    if let Some(to) = filter.to {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Date(to));
    }

    (where_sql, args)
}

pub struct MySqlRecordStore<'a> {
    pool: &'a MySqlPool,
}

impl<'a> MySqlRecordStore<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }
}

impl RecordStore for MySqlRecordStore<'_> {
    async fn find(&self, filter: &RecordFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        let (where_sql, args) = build_where(filter);

        let mut data_sql = format!(
            "SELECT id, school_id, subject_id, subject_name, date, time, kind, status, \
             latitude, longitude, created_at \
             FROM attendance_records{} ORDER BY date DESC, time DESC",
            where_sql
        );
        if filter.limit.is_some() {
            data_sql.push_str(" LIMIT ? OFFSET ?");
        }

        let mut q = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
        for arg in args {
            q = match arg {
                FilterValue::U64(v) => q.bind(v),
                FilterValue::Str(s) => q.bind(s),
                FilterValue::Date(d) => q.bind(d),
            };
        }
        if let Some(limit) = filter.limit {
            q = q.bind(limit).bind(filter.offset.unwrap_or(0));
        }

        q.fetch_all(self.pool).await.map_err(StoreError::from_sqlx)
    }

    async fn count(&self, filter: &RecordFilter) -> Result<i64, StoreError> {
        let (where_sql, args) = build_where(filter);
        let count_sql = format!("SELECT COUNT(*) FROM attendance_records{}", where_sql);

        let mut q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in args {
            q = match arg {
                FilterValue::U64(v) => q.bind(v),
                FilterValue::Str(s) => q.bind(s),
                FilterValue::Date(d) => q.bind(d),
            };
        }

        q.fetch_one(self.pool).await.map_err(StoreError::from_sqlx)
    }

    async fn insert(&self, record: &NewRecord) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_records
                (school_id, subject_id, subject_name, date, time, kind, status, latitude, longitude)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.school_id)
        .bind(record.subject_id)
        .bind(&record.subject_name)
        .bind(record.date)
        .bind(record.time)
        .bind(record.kind)
        .bind(record.status)
        .bind(record.latitude)
        .bind(record.longitude)
        .execute(self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(result.last_insert_id())
    }
}
