use crate::core::error::{ScoutError, ScoutResult};
use crate::core::types::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two coordinates.
///
/// Uses the haversine formula on a sphere of radius [`EARTH_RADIUS_KM`].
/// Inputs are re-validated because `Coordinate` fields are public and a
/// NaN here would silently flip the threshold decision.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> ScoutResult<f64> {
    for c in [a, b] {
        if !c.is_valid() {
            return Err(ScoutError::InvalidArgument(format!(
                "cannot measure distance from invalid coordinate ({}, {})",
                c.lat, c.lon
            )));
        }
    }

    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    Ok(2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_identical_points() {
        for p in [c(0.0, 0.0), c(28.6315, 77.2167), c(-89.9, 179.9)] {
            assert_eq!(haversine_km(p, p).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_known_distance() {
        let d = haversine_km(c(28.6315, 77.2167), c(28.6291627, 77.2249081)).unwrap();
        assert!((d - 0.86).abs() <= 0.05, "got {d}");
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            (c(28.6, 77.2), c(19.07, 72.87)),
            (c(-33.86, 151.2), c(51.5, -0.12)),
            (c(0.0, 179.5), c(0.0, -179.5)),
        ];
        for (a, b) in pairs {
            let ab = haversine_km(a, b).unwrap();
            let ba = haversine_km(b, a).unwrap();
            assert!((ab - ba).abs() < 1e-9);
        }
    }

    #[test]
    fn test_antipodal() {
        let d = haversine_km(c(0.0, 0.0), c(0.0, 180.0)).unwrap();
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let bad = Coordinate {
            lat: f64::NAN,
            lon: 0.0,
        };
        assert!(matches!(
            haversine_km(bad, c(0.0, 0.0)),
            Err(ScoutError::InvalidArgument(_))
        ));
        let bad = Coordinate {
            lat: 95.0,
            lon: 0.0,
        };
        assert!(haversine_km(c(0.0, 0.0), bad).is_err());
    }
}
