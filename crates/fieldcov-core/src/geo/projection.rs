//! Geographic to Cartesian embedding.
//!
//! Coordinates are projected onto a sphere of mean Earth radius so that
//! Euclidean (chord) distance can stand in for surface distance in proximity
//! queries. The chord never exceeds the arc, so a radius query over the
//! embedding cannot miss a true neighbour; at the tens-of-metres radii used
//! here the sphere/ellipsoid discrepancy is orders of magnitude below the
//! query tolerance.

/// Mean Earth radius, metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Project one latitude/longitude pair (degrees) onto the sphere.
///
/// Non-finite input propagates as non-finite output; callers filter NaN
/// coordinates before projecting.
pub fn project(latitude_deg: f64, longitude_deg: f64) -> [f64; 3] {
    let lat = latitude_deg.to_radians();
    let lon = longitude_deg.to_radians();
    [
        EARTH_RADIUS_M * lat.cos() * lon.cos(),
        EARTH_RADIUS_M * lat.cos() * lon.sin(),
        EARTH_RADIUS_M * lat.sin(),
    ]
}

/// Project a sequence of `(latitude, longitude)` pairs.
pub fn project_all(coords: &[(f64, f64)]) -> Vec<[f64; 3]> {
    coords.iter().map(|&(lat, lon)| project(lat, lon)).collect()
}

/// Euclidean distance between two embedded points.
pub fn chord_distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Distance, Haversine, Point};
    use proptest::prelude::*;

    #[test]
    fn test_poles_and_equator() {
        let north = project(90.0, 0.0);
        assert!((north[2] - EARTH_RADIUS_M).abs() < 1e-6);
        assert!(north[0].abs() < 1e-6);

        let origin = project(0.0, 0.0);
        assert!((origin[0] - EARTH_RADIUS_M).abs() < 1e-6);
        assert!(origin[1].abs() < 1e-6);
        assert!(origin[2].abs() < 1e-6);
    }

    #[test]
    fn test_chord_distance_close_to_surface_distance_at_small_scale() {
        // Two points ~10 m apart along the equator.
        let meters_per_degree = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        let a = project(0.0, 0.0);
        let b = project(0.0, 10.0 / meters_per_degree);
        let chord = chord_distance(a, b);
        assert!((chord - 10.0).abs() < 0.01, "chord {chord}");
    }

    #[test]
    fn test_non_finite_input_propagates() {
        let p = project(f64::NAN, 0.0);
        assert!(p.iter().any(|c| c.is_nan()));
    }

    proptest! {
        // The chord is bounded by the Haversine surface distance: two points
        // within R metres of each other on the surface are within R metres in
        // the embedding, so radius queries never miss true neighbours. At the
        // sub-kilometre spans generated here the two distances also agree to
        // well under the sphere-approximation tolerance.
        #[test]
        fn chord_never_exceeds_surface_distance(
            lat in -60.0..60.0f64,
            lon in -179.0..179.0f64,
            dlat in -0.005..0.005f64,
            dlon in -0.005..0.005f64,
        ) {
            let a = project(lat, lon);
            let b = project(lat + dlat, lon + dlon);
            let chord = chord_distance(a, b);
            // geo's Haversine takes lon/lat points and uses its own mean
            // radius, slightly larger than ours, so it upper-bounds the arc.
            let surface = Haversine.distance(
                Point::new(lon, lat),
                Point::new(lon + dlon, lat + dlat),
            );
            prop_assert!(chord <= surface * (1.0 + 1e-9) + 1e-9);
            prop_assert!(surface - chord <= surface * 1e-4 + 1e-6);
        }
    }
}
