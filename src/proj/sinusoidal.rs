//! Sinusoidal on the sphere: parallels keep their true length.
//!
//!   x = R·(λ - λ₀)·cos φ,  y = R·φ

use std::f64::consts::FRAC_PI_2;

use crate::error::ProjError;
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;

pub struct Sinusoidal {
    sphere: Ellipsoid,
    lon0: f64,
    origin: (f64, f64),
}

impl Sinusoidal {
    pub fn new(sphere: Ellipsoid, lon0: f64, false_easting: f64, false_northing: f64) -> Self {
        Self {
            sphere,
            lon0,
            origin: (false_easting, false_northing),
        }
    }
}

impl Projection for Sinusoidal {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let r = self.sphere.a;
        Ok((
            self.origin.0 + r * (lon - self.lon0) * lat.cos(),
            self.origin.1 + r * lat,
        ))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let r = self.sphere.a;
        let lat = (y - self.origin.1) / r;
        if lat.abs() > FRAC_PI_2 + 1e-12 {
            return Err(ProjError::OutOfDomain(format!(
                "northing {y:.3} beyond the sinusoidal poles"
            )));
        }
        let lat = lat.clamp(-FRAC_PI_2, FRAC_PI_2);
        let width = r * lat.cos();
        // every longitude meets at the pole
        let dlon = if width < 1e-9 { 0.0 } else { (x - self.origin.0) / width };
        if dlon.abs() > std::f64::consts::PI + 1e-9 {
            return Err(ProjError::OutOfDomain(format!(
                "easting {x:.3} outside the sinusoidal outline at northing {y:.3}"
            )));
        }
        Ok((self.lon0 + dlon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::WGS84_SPHERE;
    use approx::assert_relative_eq;

    #[test]
    fn test_roundtrip_with_false_origin() {
        let proj = Sinusoidal::new(WGS84_SPHERE, 0.5, 1000.0, -500.0);
        for &(lon, lat) in &[(0.5, 0.0), (1.2, 0.7), (-2.0, -1.3), (3.6, 0.2)] {
            let (x, y) = proj.forward(lon, lat).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, lon, epsilon = 1e-10);
            assert_relative_eq!(lat2, lat, epsilon = 1e-10);
        }
        let (x, y) = proj.forward(0.5, 0.0).unwrap();
        assert_relative_eq!(x, 1000.0);
        assert_relative_eq!(y, -500.0);
    }

    #[test]
    fn test_poles_collapse() {
        let proj = Sinusoidal::new(WGS84_SPHERE, 0.0, 0.0, 0.0);
        let (x, y) = proj.forward(2.0, FRAC_PI_2).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(y, FRAC_PI_2 * WGS84_SPHERE.a);
        let (lon, _) = proj.inverse(0.0, y).unwrap();
        assert_eq!(lon, 0.0);
    }

    #[test]
    fn test_inverse_outside_outline() {
        let proj = Sinusoidal::new(WGS84_SPHERE, 0.0, 0.0, 0.0);
        let a = WGS84_SPHERE.a;
        assert!(matches!(proj.inverse(0.0, 2.0 * a), Err(ProjError::OutOfDomain(_))));
        // 60°N is half as wide as the equator
        assert!(matches!(proj.inverse(0.6 * std::f64::consts::PI * a, a * FRAC_PI_2 / 1.5), Err(ProjError::OutOfDomain(_))));
    }
}
