use crate::auth::auth::AuthUser;
use crate::evaluator::stats::AttendanceStats;
use crate::store::{MySqlRecordStore, RecordFilter, RecordStore};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SummaryQuery {
    #[schema(example = 1001)]
    /// Restrict to one subject; omit for a whole-school summary
    pub subject_id: Option<u64>,
    #[schema(example = "2026-08-01", format = "date", value_type = String)]
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-08-31", format = "date", value_type = String)]
    pub to: Option<NaiveDate>,
}

/// Attendance summary: per-status counts and percentages
#[utoipa::path(
    get,
    path = "/api/v1/reports/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Aggregated attendance statistics", body = AttendanceStats),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SummaryQuery>,
) -> actix_web::Result<impl Responder> {
    // Students see their own numbers; operators may aggregate anyone.
    let subject_id = if auth.is_student() {
        auth.subject_id
    } else {
        query.subject_id
    };

    let filter = RecordFilter {
        school_id: auth.school_id,
        subject_id,
        from: query.from,
        to: query.to,
        ..RecordFilter::default()
    };

    let store = MySqlRecordStore::new(pool.get_ref());
    let records = store.find(&filter).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch records for summary");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(AttendanceStats::from_records(&records)))
}
