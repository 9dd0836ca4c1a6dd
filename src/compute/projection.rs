//! Web-Mercator projection into the unit square.
//!
//! `x` grows eastwards from 0 at -180° to 1 at 180°. `y` grows southwards
//! from 0 at the northern Mercator limit to 1 at the southern one.

use std::f64::consts::PI;

/// Project a longitude to `[0, 1]`.
#[inline]
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Project a latitude to `[0, 1]`, clamping beyond the Mercator limits.
#[inline]
pub fn lat_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

/// Inverse of [`lng_x`].
#[inline]
pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Inverse of [`lat_y`].
#[inline]
pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_origin_projects_to_center() {
        assert!((lng_x(0.0) - 0.5).abs() < EPSILON);
        assert!((lat_y(0.0) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_longitude_edges() {
        assert_eq!(lng_x(-180.0), 0.0);
        assert_eq!(lng_x(180.0), 1.0);
    }

    #[test]
    fn test_poles_are_clamped() {
        assert_eq!(lat_y(90.0), 0.0);
        assert_eq!(lat_y(-90.0), 1.0);
    }

    #[test]
    fn test_north_is_up() {
        assert!(lat_y(40.0) < lat_y(-40.0));
    }

    #[test]
    fn test_inverse_projection() {
        for (lng, lat) in [(-74.006, 40.7128), (151.2093, -33.8688), (0.0, 0.0)] {
            assert!((x_lng(lng_x(lng)) - lng).abs() < EPSILON);
            assert!((y_lat(lat_y(lat)) - lat).abs() < 1e-6);
        }
    }
}
