// Geographic helpers used by the simulation and launch validation.

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Speed of sound at sea level, in meters per second.
pub const SPEED_OF_SOUND_MPS: f64 = 343.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    // Time of flight is undefined for zero, negative or non-finite speeds.
    NonPositiveSpeed,
}

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Great-circle distance between two coordinates in meters.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = to_radians(a.latitude);
    let lat2 = to_radians(b.latitude);
    let dlat = lat2 - lat1;
    let dlon = to_radians(b.longitude) - to_radians(a.longitude);

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Seconds needed to cover `distance_meters` at `speed_mach`.
pub fn time_of_flight(distance_meters: f64, speed_mach: f64) -> Result<f64, GeoError> {
    if !speed_mach.is_finite() || speed_mach <= 0.0 {
        return Err(GeoError::NonPositiveSpeed);
    }
    Ok(distance_meters / (speed_mach * SPEED_OF_SOUND_MPS))
}

/// Euclidean distance in raw degree space.
///
/// The engine steers in this planar approximation rather than along the great circle.
pub fn planar_distance(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = b.latitude - a.latitude;
    let dlon = b.longitude - a.longitude;
    (dlat * dlat + dlon * dlon).sqrt()
}

/// Moves `current` toward `target` by `step` degrees.
///
/// Lands exactly on the target when the remaining distance is within one step, and
/// returns the target unchanged when already there (no direction exists at zero length).
pub fn bearing_step(current: Coordinate, target: Coordinate, step: f64) -> Coordinate {
    let remaining = planar_distance(current, target);
    if remaining == 0.0 || remaining <= step {
        return target;
    }

    let dir_lat = (target.latitude - current.latitude) / remaining;
    let dir_lon = (target.longitude - current.longitude) / remaining;
    Coordinate {
        latitude: current.latitude + dir_lat * step,
        longitude: current.longitude + dir_lon * step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_YORK: Coordinate = Coordinate::new(40.7128, -74.0060);
    const LOS_ANGELES: Coordinate = Coordinate::new(34.0522, -118.2437);

    #[test]
    fn when_points_are_equal_then_distance_is_zero() {
        assert_eq!(distance(NEW_YORK, NEW_YORK), 0.0);
    }

    #[test]
    fn when_measuring_new_york_to_los_angeles_then_distance_matches_known_value() {
        let meters = distance(NEW_YORK, LOS_ANGELES);
        // Roughly 3936 km on a spherical Earth.
        assert!((meters - 3_936_000.0).abs() < 20_000.0, "got {meters}");
    }

    #[test]
    fn when_distance_is_swapped_then_result_is_symmetric() {
        let forward = distance(NEW_YORK, LOS_ANGELES);
        let back = distance(LOS_ANGELES, NEW_YORK);
        assert!((forward - back).abs() < 1e-6);
    }

    #[test]
    fn when_speed_is_positive_then_time_of_flight_divides_by_mach_speed() {
        let secs = time_of_flight(686.0, 2.0).expect("positive speed");
        assert!((secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn when_speed_is_zero_or_invalid_then_time_of_flight_errors() {
        assert_eq!(time_of_flight(1000.0, 0.0), Err(GeoError::NonPositiveSpeed));
        assert_eq!(time_of_flight(1000.0, -1.0), Err(GeoError::NonPositiveSpeed));
        assert_eq!(
            time_of_flight(1000.0, f64::NAN),
            Err(GeoError::NonPositiveSpeed)
        );
    }

    #[test]
    fn when_current_equals_target_then_step_is_a_no_op() {
        let next = bearing_step(NEW_YORK, NEW_YORK, 0.25);
        assert_eq!(next, NEW_YORK);
        assert!(next.latitude.is_finite() && next.longitude.is_finite());
    }

    #[test]
    fn when_target_is_far_then_step_moves_exactly_step_length() {
        let start = Coordinate::new(0.0, 0.0);
        let target = Coordinate::new(3.0, 4.0);
        let next = bearing_step(start, target, 1.0);
        assert!((next.latitude - 0.6).abs() < 1e-9);
        assert!((next.longitude - 0.8).abs() < 1e-9);
    }

    #[test]
    fn when_target_is_within_one_step_then_step_lands_on_target() {
        let start = Coordinate::new(0.0, 0.0);
        let target = Coordinate::new(0.1, 0.1);
        assert_eq!(bearing_step(start, target, 0.25), target);
    }
}
