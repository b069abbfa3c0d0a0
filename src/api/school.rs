use crate::auth::auth::AuthUser;
use crate::model::school::School;
use crate::utils::geofence_cache;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveTime;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateGeofence {
    #[schema(example = -6.2)]
    pub latitude: f64,
    #[schema(example = 106.8166)]
    pub longitude: f64,
    #[schema(example = 100.0)]
    pub radius_m: f64,
    /// Check-ins at or after this local time are marked late
    #[schema(example = "08:00:00", value_type = String)]
    pub late_cutoff: Option<NaiveTime>,
}

/// Current geofence and late-cutoff configuration
#[utoipa::path(
    get,
    path = "/api/v1/schools/{school_id}/geofence",
    params(
        ("school_id" = u64, Path, description = "School ID")
    ),
    responses(
        (status = 200, description = "School configuration", body = School),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "School not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schools"
)]
pub async fn get_geofence(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let school_id = path.into_inner();

    let school = geofence_cache::fetch_school(pool.get_ref(), school_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, school_id, "Failed to fetch school");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match school {
        Some(school) => Ok(HttpResponse::Ok().json(school)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "School not found"
        }))),
    }
}

/// Register or move the school location (Admin)
#[utoipa::path(
    put,
    path = "/api/v1/schools/{school_id}/geofence",
    params(
        ("school_id" = u64, Path, description = "School ID")
    ),
    request_body = UpdateGeofence,
    responses(
        (status = 200, description = "Geofence updated", body = Object, example = json!({
            "message": "Geofence updated"
        })),
        (status = 400, description = "Invalid radius"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "School not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schools"
)]
pub async fn update_geofence(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateGeofence>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let school_id = path.into_inner();

    if payload.radius_m <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "radius_m must be positive"
        })));
    }

    let result = sqlx::query(
        r#"
        UPDATE schools
        SET latitude = ?,
            longitude = ?,
            radius_m = ?,
            late_cutoff = COALESCE(?, late_cutoff)
        WHERE id = ?
        "#,
    )
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.radius_m)
    .bind(payload.late_cutoff)
    .bind(school_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, school_id, "Geofence update failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "School not found"
        })));
    }

    // Check-ins must see the new fence immediately, not after the TTL.
    geofence_cache::invalidate(school_id).await;

    tracing::info!(school_id, admin = auth.user_id, "Geofence updated");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Geofence updated"
    })))
}
