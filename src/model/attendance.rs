use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AttendanceKind {
    CheckIn,
    CheckOut,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Permitted,
    Sick,
    Absent,
}

impl AttendanceStatus {
    /// Statuses an operator may assign in the manual-entry flow.
    /// Late is only ever computed from the clock.
    pub fn operator_assignable(&self) -> bool {
        !matches!(self, AttendanceStatus::Late)
    }
}

/// One attendance event. Append-only: rows are never updated after insert,
/// and the schema enforces at most one row per (subject_id, date, kind).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub school_id: u64,
    pub subject_id: u64,
    pub subject_name: String,
    #[schema(example = "2026-08-23", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "07:30:00", value_type = String)]
    pub time: NaiveTime,
    pub kind: AttendanceKind,
    pub status: AttendanceStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[schema(example = "2026-08-23T00:30:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}
