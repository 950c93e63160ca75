use crate::model::{Coordinate, PointEntity};

pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

/// Mean Earth radius used by the web map for `distanceTo`.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters (haversine).
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon * 0.5).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// First entity strictly closer than `radius_m`, in scan order.
///
/// This is a linear scan, not a nearest-neighbour search: when several
/// entities fall inside the radius the earliest one wins.
pub fn resolve<'a, I>(point: Coordinate, entities: I, radius_m: f64) -> Option<&'a PointEntity>
where
    I: IntoIterator<Item = &'a PointEntity>,
{
    entities
        .into_iter()
        .find(|e| distance_meters(point, e.location) < radius_m)
}
