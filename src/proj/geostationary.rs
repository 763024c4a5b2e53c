//! Geostationary satellite view on the ellipsoid, sweeping about the y axis.
//!
//! Coordinates are the scan angles seen from a satellite `h` metres above
//! the equator at λ₀, multiplied by `h`. Points on the far side of the
//! ellipsoid have no image.

use crate::error::ProjError;
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;

/// Height of the geostationary orbit above the WGS84 equator, metres.
pub const GEOSTATIONARY_HEIGHT: f64 = 35_785_831.0;

pub struct Geostationary {
    a: f64,
    lon0: f64,
    /// h / a
    height_ratio: f64,
    /// Distance of the satellite from the earth's centre, in units of `a`.
    orbit: f64,
    /// b / a and its square.
    polar_ratio: f64,
    polar_ratio2: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Geostationary {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        height: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let height_ratio = height / ellipsoid.a;
        let polar_ratio2 = 1.0 - ellipsoid.e2;
        Self {
            a: ellipsoid.a,
            lon0,
            height_ratio,
            orbit: 1.0 + height_ratio,
            polar_ratio: polar_ratio2.sqrt(),
            polar_ratio2,
            false_easting,
            false_northing,
        }
    }

    /// Angular radius of the horizon on a sphere of radius `a`. Everything
    /// within it is visible on the ellipsoid too.
    pub fn horizon(&self) -> f64 {
        (1.0 / self.orbit).acos()
    }
}

impl Projection for Geostationary {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let dlon = lon - self.lon0;
        let lat_c = (self.polar_ratio2 * lat.tan()).atan();
        let (sin_c, cos_c) = lat_c.sin_cos();
        let r = self.polar_ratio / (self.polar_ratio * cos_c).hypot(sin_c);
        let vx = r * dlon.cos() * cos_c;
        let vy = r * dlon.sin() * cos_c;
        let vz = r * sin_c;

        if (self.orbit - vx) * vx - vy * vy - vz * vz / self.polar_ratio2 < 0.0 {
            return Err(ProjError::OutOfDomain(format!(
                "({:.6}°, {:.6}°) is hidden from the satellite",
                lon.to_degrees(),
                lat.to_degrees()
            )));
        }
        let along = self.orbit - vx;
        let scale = self.a * self.height_ratio;
        Ok((
            self.false_easting + scale * (vy / along).atan(),
            self.false_northing + scale * (vz / vy.hypot(along)).atan(),
        ))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let scale = self.a * self.height_ratio;
        // Direction of the view ray, with the satellite looking down -x.
        let vy = ((x - self.false_easting) / scale).tan();
        let vz = ((y - self.false_northing) / scale).tan() * vy.hypot(1.0);

        let qa = vy * vy + (vz / self.polar_ratio).powi(2) + 1.0;
        let qb = -2.0 * self.orbit;
        let det = qb * qb - 4.0 * qa * (self.orbit * self.orbit - 1.0);
        if det < 0.0 {
            return Err(ProjError::OutOfDomain(format!(
                "({x:.3}, {y:.3}) looks past the earth"
            )));
        }
        let k = (-qb - det.sqrt()) / (2.0 * qa);
        let px = self.orbit - k;
        let (py, pz) = (vy * k, vz * k);

        let dlon = py.atan2(px);
        let lat_c = (pz * dlon.cos() / px).atan();
        Ok((self.lon0 + dlon, (lat_c.tan() / self.polar_ratio2).atan()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::WGS84;
    use approx::assert_relative_eq;

    fn deg(v: f64) -> f64 {
        v.to_radians()
    }

    fn goes_east() -> Geostationary {
        Geostationary::new(WGS84, deg(-75.0), GEOSTATIONARY_HEIGHT, 0.0, 0.0)
    }

    #[test]
    fn test_sub_satellite_point_is_origin() {
        let proj = Geostationary::new(WGS84, deg(-75.0), GEOSTATIONARY_HEIGHT, 100.0, -50.0);
        let (x, y) = proj.forward(deg(-75.0), 0.0).unwrap();
        assert_relative_eq!(x, 100.0, epsilon = 1e-6);
        assert_relative_eq!(y, -50.0, epsilon = 1e-6);
    }

    #[test]
    fn test_equator_scan_angle() {
        let proj = goes_east();
        let (x, y) = proj.forward(deg(-65.0), 0.0).unwrap();
        assert_relative_eq!(x, 1_104_210.446, epsilon = 1e-2);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);
        let (x_west, _) = proj.forward(deg(-85.0), 0.0).unwrap();
        assert_relative_eq!(x_west, -x, epsilon = 1e-6);
        assert_relative_eq!(proj.horizon().to_degrees(), 81.299_476_768, epsilon = 1e-8);
    }

    #[test]
    fn test_roundtrip_on_visible_disk() {
        let proj = goes_east();
        for &(lon, lat) in &[(-75.0, 0.0), (-40.0, 30.0), (-100.0, -50.0), (-75.0, 75.0), (-140.0, 10.0)] {
            let (x, y) = proj.forward(deg(lon), deg(lat)).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, deg(lon), epsilon = 1e-9);
            assert_relative_eq!(lat2, deg(lat), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_far_side_and_sky() {
        let proj = goes_east();
        assert!(matches!(
            proj.forward(deg(25.0), 0.0),
            Err(ProjError::OutOfDomain(_))
        ));
        assert!(matches!(
            proj.inverse(6_000_000.0, 0.0),
            Err(ProjError::OutOfDomain(_))
        ));
    }
}
