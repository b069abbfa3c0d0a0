use crate::api::attendance::{CheckPayload, ManualEntry, RecordListResponse, RecordQuery};
use crate::api::report::SummaryQuery;
use crate::api::school::UpdateGeofence;
use crate::evaluator::stats::AttendanceStats;
use crate::model::attendance::{AttendanceKind, AttendanceRecord, AttendanceStatus};
use crate::model::geo::GeoPoint;
use crate::model::school::School;
use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Presensi API",
        version = "1.0.0",
        description = r#"
## School Attendance Tracking System

This API powers a school/organization attendance backend: geofenced
self-service check-in, operator-assigned manual entry, and attendance
reporting.

### Key Features
- **Self-service Check-in / Check-out**
  - Haversine geofence check against the school's registered location
  - Late/on-time classification against a per-school cutoff time
  - One record per subject, day and type, enforced by the schema
- **Manual Entry**
  - Operator-assigned statuses (present, sick, permitted, absent)
- **Reporting**
  - Per-status counts and percentages over any subject/date-range filter

### Security
Most endpoints are protected using **JWT Bearer authentication**.
Geofence administration is restricted to the **Admin** role; manual entry
to **Teacher/Staff/Admin**.

### Response Format
- JSON-based RESTful responses
- Pagination supported for the record list

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::manual_entry,
        crate::api::attendance::list_records,

        crate::api::report::summary,

        crate::api::school::get_geofence,
        crate::api::school::update_geofence
    ),
    components(
        schemas(
            GeoPoint,
            AttendanceKind,
            AttendanceStatus,
            AttendanceRecord,
            AttendanceStats,
            CheckPayload,
            ManualEntry,
            RecordQuery,
            RecordListResponse,
            SummaryQuery,
            School,
            UpdateGeofence
        )
    ),
    tags(
        (name = "Attendance", description = "Check-in, check-out and manual entry APIs"),
        (name = "Reports", description = "Attendance statistics APIs"),
        (name = "Schools", description = "Geofence configuration APIs"),
    )
)]
pub struct ApiDoc;
