use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Errors from the record store, kept separate so the evaluator can tell
/// a uniqueness violation apart from an outage.
#[derive(Debug, Display)]
pub enum StoreError {
    /// The unique index on (subject_id, date, kind) rejected the insert.
    #[display(fmt = "duplicate attendance row")]
    Duplicate,
    #[display(fmt = "record store unavailable: {}", _0)]
    Unavailable(sqlx::Error),
}

impl StoreError {
    /// MySQL reports unique-key violations under SQLSTATE 23000.
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return StoreError::Duplicate;
            }
        }
        StoreError::Unavailable(e)
    }
}

/// Domain errors of the attendance evaluator. Everything here is decided
/// before the record insert; once the insert commits nothing reverses it.
#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(fmt = "outside allowed radius: {:.0}m away, limit {:.0}m", distance_m, radius_m)]
    OutOfRange { distance_m: f64, radius_m: f64 },

    #[display(fmt = "no location reading supplied")]
    LocationUnavailable,

    #[display(fmt = "school location not configured yet")]
    ConfigurationMissing,

    #[display(fmt = "already submitted this type today")]
    DuplicateSubmission,

    #[display(fmt = "store error: {}", _0)]
    Store(StoreError),
}

impl From<StoreError> for AttendanceError {
    fn from(e: StoreError) -> Self {
        match e {
            // Close the check-then-write race: a duplicate-key failure on
            // insert is the same domain outcome as the guard firing.
            StoreError::Duplicate => AttendanceError::DuplicateSubmission,
            other => AttendanceError::Store(other),
        }
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::OutOfRange { .. } => StatusCode::FORBIDDEN,
            AttendanceError::LocationUnavailable => StatusCode::BAD_REQUEST,
            AttendanceError::ConfigurationMissing => StatusCode::CONFLICT,
            AttendanceError::DuplicateSubmission => StatusCode::BAD_REQUEST,
            AttendanceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AttendanceError::OutOfRange { distance_m, radius_m } => {
                HttpResponse::build(self.status_code()).json(json!({
                    "message": "You are outside the allowed check-in area",
                    "distance_m": (*distance_m * 10.0).round() / 10.0,
                    "radius_m": radius_m,
                }))
            }
            AttendanceError::LocationUnavailable => {
                HttpResponse::build(self.status_code()).json(json!({
                    "message": "Location reading required for check-in"
                }))
            }
            AttendanceError::ConfigurationMissing => {
                HttpResponse::build(self.status_code()).json(json!({
                    "message": "Positioning detected, but school location is not configured yet"
                }))
            }
            AttendanceError::DuplicateSubmission => {
                HttpResponse::build(self.status_code()).json(json!({
                    "message": "Already submitted attendance for this type today"
                }))
            }
            AttendanceError::Store(e) => {
                tracing::error!(error = %e, "Record store failure");
                HttpResponse::build(self.status_code()).json(json!({
                    "message": "Internal Server Error"
                }))
            }
        }
    }
}
