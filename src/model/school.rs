use chrono::NaiveTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::geo::GeofenceConfig;

/// A school row as stored. Geofence columns are nullable until an admin
/// registers the location.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct School {
    pub id: u64,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[schema(example = 100.0)]
    pub radius_m: f64,
    #[schema(example = "08:00:00", value_type = String)]
    pub late_cutoff: NaiveTime,
}

/// The slice of school configuration the check-in path needs.
/// Read-only from the evaluator's perspective; mutated only through
/// the admin geofence endpoint.
#[derive(Debug, Clone, Copy)]
pub struct SchoolPolicy {
    pub fence: GeofenceConfig,
    pub late_cutoff: NaiveTime,
}

impl School {
    pub fn policy(&self) -> SchoolPolicy {
        SchoolPolicy {
            fence: GeofenceConfig::from_columns(self.latitude, self.longitude, self.radius_m),
            late_cutoff: self.late_cutoff,
        }
    }
}
