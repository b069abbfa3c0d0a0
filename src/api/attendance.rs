use crate::auth::auth::AuthUser;
use crate::error::AttendanceError;
use crate::evaluator::{self, CheckRequest, classify::SystemClock};
use crate::model::attendance::{AttendanceKind, AttendanceRecord, AttendanceStatus};
use crate::model::geo::GeoPoint;
use crate::notify;
use crate::store::{MySqlRecordStore, RecordFilter, RecordStore};
use crate::utils::geofence_cache;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CheckPayload {
    /// Device latitude in decimal degrees; absent if the reading failed
    #[schema(example = -6.2)]
    pub latitude: Option<f64>,
    #[schema(example = 106.8166)]
    pub longitude: Option<f64>,
}

impl CheckPayload {
    fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ManualEntry {
    #[schema(example = 1001)]
    pub subject_id: u64,
    #[schema(example = "Budi")]
    pub subject_name: String,
    /// Defaults to today when omitted
    #[schema(example = "2026-08-23", format = "date", value_type = String)]
    pub date: Option<NaiveDate>,
    #[schema(example = "sick")]
    pub status: AttendanceStatus,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RecordQuery {
    #[schema(example = 1001)]
    /// Filter by attendance subject
    pub subject_id: Option<u64>,
    /// Filter by check_in / check_out
    pub kind: Option<AttendanceKind>,
    /// Filter by status
    pub status: Option<AttendanceStatus>,
    #[schema(example = "2026-08-01", format = "date", value_type = String)]
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-08-31", format = "date", value_type = String)]
    pub to: Option<NaiveDate>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct RecordListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

async fn submit_geofenced(
    auth: &AuthUser,
    pool: &MySqlPool,
    payload: &CheckPayload,
    kind: AttendanceKind,
) -> actix_web::Result<HttpResponse> {
    let subject_id: u64 = auth
        .subject_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No attendance subject profile"))?;
    let school_id: u64 = auth
        .school_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No school assigned"))?;

    let policy = geofence_cache::school_policy(pool, school_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, school_id, "Failed to load school policy");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        // No school row yet behaves like an unset geofence.
        .ok_or(AttendanceError::ConfigurationMissing)?;

    let store = MySqlRecordStore::new(pool);
    let request = CheckRequest {
        school_id,
        subject_id,
        subject_name: auth.username.clone(),
        kind,
        location: payload.location(),
    };

    let submission = evaluator::submit(&store, &policy, &SystemClock, &request).await?;

    // Post-commit, fire-and-forget: a notification failure never touches
    // the record that was just written.
    notify::dispatch_after_commit(pool.clone(), &submission.record);

    tracing::info!(
        subject_id,
        school_id,
        %kind,
        status = %submission.record.status,
        "Attendance recorded"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": match kind {
            AttendanceKind::CheckIn => "Checked in successfully",
            AttendanceKind::CheckOut => "Checked out successfully",
        },
        "status": submission.record.status,
        "date": submission.record.date,
        "time": submission.record.time,
        "distance_m": submission.distance_m.map(|d| (d * 10.0).round() / 10.0),
    })))
}

/// Geofenced self-service check-in
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body = CheckPayload,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "status": "present",
            "distance_m": 12.4
        })),
        (status = 400, description = "Missing location or already submitted today"),
        (status = 403, description = "Outside the allowed radius", body = Object, example = json!({
            "message": "You are outside the allowed check-in area",
            "distance_m": 412.7,
            "radius_m": 100.0
        })),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "School location not configured yet"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CheckPayload>,
) -> actix_web::Result<impl Responder> {
    submit_geofenced(&auth, pool.get_ref(), &payload, AttendanceKind::CheckIn).await
}

/// Geofenced self-service check-out (no lateness rule)
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    request_body = CheckPayload,
    responses(
        (status = 200, description = "Checked out successfully"),
        (status = 400, description = "Missing location or already submitted today"),
        (status = 403, description = "Outside the allowed radius"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "School location not configured yet"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CheckPayload>,
) -> actix_web::Result<impl Responder> {
    submit_geofenced(&auth, pool.get_ref(), &payload, AttendanceKind::CheckOut).await
}

/// Operator-assigned attendance entry (QR/manual flow)
#[utoipa::path(
    post,
    path = "/api/v1/attendance/manual",
    request_body = ManualEntry,
    responses(
        (status = 200, description = "Attendance recorded", body = Object, example = json!({
            "message": "Attendance recorded",
            "status": "sick"
        })),
        (status = 400, description = "Invalid status or already submitted for that day"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn manual_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ManualEntry>,
) -> actix_web::Result<impl Responder> {
    auth.require_operator()?;

    let school_id: u64 = auth
        .school_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No school assigned"))?;

    if !payload.status.operator_assignable() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid status. Allowed: present, sick, permitted, absent"
        })));
    }

    let store = MySqlRecordStore::new(pool.get_ref());
    let submission = evaluator::submit_manual(
        &store,
        &SystemClock,
        school_id,
        payload.subject_id,
        payload.subject_name.clone(),
        payload.date,
        payload.status,
    )
    .await?;

    // Manual insertions notify the same way the kiosk flow does.
    notify::dispatch_after_commit(pool.get_ref().clone(), &submission.record);

    tracing::info!(
        operator = auth.user_id,
        subject_id = payload.subject_id,
        status = %submission.record.status,
        date = %submission.record.date,
        "Manual attendance entry"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance recorded",
        "status": submission.record.status,
        "date": submission.record.date,
    })))
}

/// Paginated attendance record list
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(RecordQuery),
    responses(
        (status = 200, description = "Paginated attendance records", body = RecordListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_records(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RecordQuery>,
) -> actix_web::Result<impl Responder> {
    let (page, per_page, offset) = page_params(query.page, query.per_page);

    // Students only ever see their own log.
    let subject_id = if auth.is_student() {
        auth.subject_id
    } else {
        query.subject_id
    };

    let filter = RecordFilter {
        school_id: auth.school_id,
        subject_id,
        kind: query.kind,
        status: query.status,
        from: query.from,
        to: query.to,
        limit: Some(per_page),
        offset: Some(offset),
    };

    let store = MySqlRecordStore::new(pool.get_ref());
    let total = store.count(&filter).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count attendance records");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    let records = store.find(&filter).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch attendance records");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(RecordListResponse {
        data: records,
        page,
        per_page,
        total,
    }))
}

fn page_params(page: Option<u64>, per_page: Option<u64>) -> (u64, u64, u64) {
    let per_page = per_page.unwrap_or(10).min(100);
    let page = page.unwrap_or(1).max(1);
    (page, per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(page_params(None, None), (1, 10, 0));
        assert_eq!(page_params(Some(0), Some(500)), (1, 100, 0));
        assert_eq!(page_params(Some(3), Some(25)), (3, 25, 50));
    }

    #[test]
    fn large_page_numbers_survive_the_response() {
        let big = 5_000_000_000u64; // past u32::MAX
        let (page, per_page, offset) = page_params(Some(big), Some(20));
        assert_eq!(page, big);
        assert_eq!(offset, (big - 1) * 20);

        let response = RecordListResponse {
            data: Vec::new(),
            page,
            per_page,
            total: 0,
        };
        assert_eq!(response.page, big);
    }
}
