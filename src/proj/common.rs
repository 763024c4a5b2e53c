//! Common helpers for projection math (isometric latitude, authalic q, great-circle geometry).

use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Wrap an angle into `[-π, π)`.
pub fn wrap_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can return TAU itself for tiny negative inputs
    if wrapped >= PI { wrapped - TAU } else { wrapped }
}

/// m(φ) = cos φ / sqrt(1 - e² sin² φ)
pub fn msfn(phi: f64, e2: f64) -> f64 {
    let sin_phi = phi.sin();
    phi.cos() / (1.0 - e2 * sin_phi * sin_phi).sqrt()
}

/// t(φ) = tan(π/4 - φ/2) / ((1 - e·sin φ) / (1 + e·sin φ))^(e/2)
pub fn tsfn(phi: f64, e: f64) -> f64 {
    let esin = e * phi.sin();
    (0.5 * (FRAC_PI_2 - phi)).tan() / ((1.0 - esin) / (1.0 + esin)).powf(0.5 * e)
}

/// Invert `tsfn` by fixed-point iteration.
pub fn phi_from_ts(ts: f64, e: f64) -> f64 {
    let half_e = 0.5 * e;
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..15 {
        let esin = e * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (ts * ((1.0 - esin) / (1.0 + esin)).powf(half_e)).atan();
        let delta = next - phi;
        phi = next;
        if delta.abs() < 1e-14 {
            break;
        }
    }
    phi
}

/// Meridian arc from the equator to `phi`, in units of the semi-major axis
/// (Snyder 3-21).
pub fn mlfn(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin()
}

/// Invert `mlfn` by Newton iteration.
pub fn inv_mlfn(arc: f64, e2: f64) -> f64 {
    let mut phi = arc;
    for _ in 0..20 {
        let sin_phi = phi.sin();
        let w = 1.0 - e2 * sin_phi * sin_phi;
        let step = (arc - mlfn(phi, e2)) * w * w.sqrt() / (1.0 - e2);
        phi += step;
        if step.abs() < 1e-14 {
            break;
        }
    }
    phi
}

/// Authalic q(φ) used by the equal-area conic.
pub fn qsfn(phi: f64, e: f64) -> f64 {
    let sin_phi = phi.sin();
    if e < 1e-12 {
        return 2.0 * sin_phi;
    }
    let esin = e * sin_phi;
    (1.0 - e * e) * (sin_phi / (1.0 - esin * esin) - (0.5 / e) * ((1.0 - esin) / (1.0 + esin)).ln())
}

/// Cosine of the great-circle angle between two points on the unit sphere.
pub fn cos_angular_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    (lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * (lon2 - lon1).cos()).clamp(-1.0, 1.0)
}

/// Great-circle angle between two points (radians).
pub fn angular_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    // haversine form keeps precision for short distances
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// Initial bearing from point 1 to point 2, clockwise from north.
pub fn azimuth(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let dlon = lon2 - lon1;
    (dlon.sin() * lat2.cos()).atan2(lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos())
}

/// Point reached travelling `distance` radians from (lon, lat) along `bearing`.
///
/// Works on unit vectors so that a start at either pole stays well defined:
/// there, bearing 0 heads down the meridian `lon + π`, matching `azimuth`.
pub fn destination(lon: f64, lat: f64, bearing: f64, distance: f64) -> (f64, f64) {
    let (sin_lon, cos_lon) = lon.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_b, cos_b) = bearing.sin_cos();
    let (sin_d, cos_d) = distance.sin_cos();

    let centre = [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat];
    let north = [-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat];
    let east = [-sin_lon, cos_lon, 0.0];

    let p = [0, 1, 2].map(|i| cos_d * centre[i] + sin_d * (cos_b * north[i] + sin_b * east[i]));
    (p[1].atan2(p[0]), p[2].atan2(p[0].hypot(p[1])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::WGS84;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_wrap_pi() {
        assert_relative_eq!(wrap_pi(0.0), 0.0);
        assert_relative_eq!(wrap_pi(PI), -PI);
        assert_relative_eq!(wrap_pi(-PI), -PI);
        assert_relative_eq!(wrap_pi(3.0 * PI / 2.0), -FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(wrap_pi(-5.0 * PI / 2.0), -FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_tsfn_roundtrip() {
        let e = WGS84.eccentricity();
        for deg in [-80.0_f64, -45.0, 0.0, 10.0, 60.0, 89.0] {
            let phi = deg.to_radians();
            let ts = tsfn(phi, e);
            assert_relative_eq!(phi_from_ts(ts, e), phi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_msfn_equator_is_one() {
        assert_relative_eq!(msfn(0.0, WGS84.e2), 1.0);
    }

    #[test]
    fn test_meridian_arc() {
        let arc = mlfn(45f64.to_radians(), WGS84.e2) * WGS84.a;
        assert_relative_eq!(arc, 4_984_944.378, epsilon = 0.05);
        assert_relative_eq!(mlfn(0.7, 0.0), 0.7);
        for deg in [-89.0_f64, -30.0, 0.0, 12.5, 60.0, 90.0] {
            let phi = deg.to_radians();
            assert_relative_eq!(inv_mlfn(mlfn(phi, WGS84.e2), WGS84.e2), phi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_qsfn_sphere_limit() {
        let phi = FRAC_PI_4;
        assert_relative_eq!(qsfn(phi, 0.0), 2.0 * phi.sin());
        // Ellipsoidal q at the pole is slightly under 2
        let q_pole = qsfn(FRAC_PI_2, WGS84.eccentricity());
        assert!(q_pole < 2.0 && q_pole > 1.99, "q_pole = {q_pole}");
    }

    #[test]
    fn test_destination_and_distance_agree() {
        let (lon0, lat0) = (10.0_f64.to_radians(), 45.0_f64.to_radians());
        let bearing = 60.0_f64.to_radians();
        let d = 30.0_f64.to_radians();
        let (lon1, lat1) = destination(lon0, lat0, bearing, d);
        assert_relative_eq!(angular_distance(lon0, lat0, lon1, lat1), d, epsilon = 1e-12);
        assert_relative_eq!(azimuth(lon0, lat0, lon1, lat1), bearing, epsilon = 1e-12);
    }

    #[test]
    fn test_destination_from_pole() {
        // bearing 0 from the north pole heads down the opposite meridian
        let (lon, lat) = destination(0.5, FRAC_PI_2, 0.0, 30.0_f64.to_radians());
        assert_relative_eq!(wrap_pi(lon - 0.5).abs(), PI, epsilon = 1e-12);
        assert_relative_eq!(lat, 60.0_f64.to_radians(), epsilon = 1e-12);
        let back = azimuth(0.5, FRAC_PI_2, lon, lat);
        assert_relative_eq!(back.abs(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cos_distance_antipode() {
        let c = cos_angular_distance(0.0, 0.0, PI, 0.0);
        assert_relative_eq!(c, -1.0);
    }
}
