pub mod coords;
pub mod distance;

pub use coords::{extract_coordinates, extract_with_source, CoordinateSource};
pub use distance::{haversine_km, EARTH_RADIUS_KM};
