use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single latitude/longitude reading in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = -6.2)]
    pub latitude: f64,
    #[schema(example = 106.8166)]
    pub longitude: f64,
}

/// Earth mean radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points (Haversine).
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Per-school geofence. `center` is None until an admin registers
/// the school location.
#[derive(Debug, Clone, Copy)]
pub struct GeofenceConfig {
    pub center: Option<GeoPoint>,
    pub radius_m: f64,
}

/// Outcome of a fence evaluation. Deliberately tri-state: an unset
/// center must not be reported as either allowed or blocked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FenceCheck {
    /// Position obtained, but the school has no registered location yet.
    NotConfigured,
    Within { distance_m: f64 },
    Outside { distance_m: f64 },
}

impl GeofenceConfig {
    pub fn from_columns(latitude: Option<f64>, longitude: Option<f64>, radius_m: f64) -> Self {
        let center = match (latitude, longitude) {
            // Legacy rows store an unset center as a zero-valued pair.
            (Some(lat), Some(lon)) if lat != 0.0 || lon != 0.0 => {
                Some(GeoPoint { latitude: lat, longitude: lon })
            }
            _ => None,
        };
        Self { center, radius_m }
    }

    /// Boundary is inclusive: distance == radius counts as within.
    pub fn evaluate(&self, current: &GeoPoint) -> FenceCheck {
        let Some(center) = self.center else {
            return FenceCheck::NotConfigured;
        };
        let distance_m = distance_meters(current, &center);
        if distance_m <= self.radius_m {
            FenceCheck::Within { distance_m }
        } else {
            FenceCheck::Outside { distance_m }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint { latitude, longitude }
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = point(-6.2, 106.8166);
        assert_eq!(distance_meters(&p, &p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(-6.2, 106.8166);
        let b = point(-6.1751, 106.865);
        assert_eq!(distance_meters(&a, &b), distance_meters(&b, &a));
    }

    #[test]
    fn one_km_along_a_meridian() {
        // ~0.009 degrees of latitude is ~1000 m.
        let a = point(-6.2, 106.8166);
        let b = point(-6.2 + 0.009, 106.8166);
        let d = distance_meters(&a, &b);
        assert!((d - 1000.0).abs() < 10.0, "expected ~1000m, got {d}");
    }

    #[test]
    fn fence_boundary_is_inclusive() {
        let center = point(-6.2, 106.8166);
        let current = point(-6.2 + 0.0009, 106.8166); // ~100 m north
        let d = distance_meters(&current, &center);
        let fence = GeofenceConfig { center: Some(center), radius_m: d };
        assert_eq!(fence.evaluate(&current), FenceCheck::Within { distance_m: d });

        let tighter = GeofenceConfig { center: Some(center), radius_m: d - 0.001 };
        assert_eq!(tighter.evaluate(&current), FenceCheck::Outside { distance_m: d });
    }

    #[test]
    fn unset_center_is_a_distinct_state() {
        let fence = GeofenceConfig::from_columns(None, None, 100.0);
        assert_eq!(fence.evaluate(&point(-6.2, 106.8166)), FenceCheck::NotConfigured);

        // Zero-valued pair means unset, not "off the coast of Africa".
        let zeroed = GeofenceConfig::from_columns(Some(0.0), Some(0.0), 100.0);
        assert_eq!(zeroed.evaluate(&point(-6.2, 106.8166)), FenceCheck::NotConfigured);
    }

    #[test]
    fn inside_a_generous_radius() {
        let center = point(-6.2, 106.8166);
        let fence = GeofenceConfig { center: Some(center), radius_m: 100.0 };
        assert_eq!(fence.evaluate(&center), FenceCheck::Within { distance_m: 0.0 });
    }
}
