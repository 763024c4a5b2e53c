//! Equidistant conic on the ellipsoid: meridians keep their true length.
//!
//!   ρ = a·G - M(φ), θ = n·(λ - λ₀)
//!   x = ρ·sin θ, y = ρ₀ - ρ·cos θ
//!
//! `M` is the meridian arc. Two distinct standard parallels fix the cone
//! constant `n`; equal parallels give `n = sin φ₁`.

use crate::error::ProjError;
use crate::proj::common::{inv_mlfn, mlfn, msfn};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;
use std::f64::consts::FRAC_PI_2;

pub struct EquidistantConic {
    ellipsoid: Ellipsoid,
    lon0: f64,
    cone: f64,
    /// G, in units of `a`.
    g: f64,
    /// ρ₀ in metres.
    origin_radius: f64,
    false_easting: f64,
    false_northing: f64,
}

impl EquidistantConic {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        lat1: f64,
        lat2: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let e2 = ellipsoid.e2;
        let (m1, ml1) = (msfn(lat1, e2), mlfn(lat1, e2));
        let cone = if (lat1 - lat2).abs() > 1e-10 {
            (m1 - msfn(lat2, e2)) / (mlfn(lat2, e2) - ml1)
        } else {
            lat1.sin()
        };
        let g = m1 / cone + ml1;
        Self {
            origin_radius: ellipsoid.a * (g - mlfn(lat0, e2)),
            ellipsoid,
            lon0,
            cone,
            g,
            false_easting,
            false_northing,
        }
    }
}

impl Projection for EquidistantConic {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let rho = self.ellipsoid.a * (self.g - mlfn(lat, self.ellipsoid.e2));
        let (sin_t, cos_t) = (self.cone * (lon - self.lon0)).sin_cos();
        Ok((
            self.false_easting + rho * sin_t,
            self.false_northing + self.origin_radius - rho * cos_t,
        ))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let mut dx = x - self.false_easting;
        let mut dy = self.origin_radius - (y - self.false_northing);
        if self.cone < 0.0 {
            dx = -dx;
            dy = -dy;
        }
        let rho = dx.hypot(dy).copysign(self.cone);
        let arc = self.g - rho / self.ellipsoid.a;
        let quarter = mlfn(FRAC_PI_2, self.ellipsoid.e2);
        if arc.abs() > quarter + 1e-12 {
            return Err(ProjError::OutOfDomain(format!(
                "({x:.3}, {y:.3}) lies beyond the poles of the cone"
            )));
        }
        Ok((
            self.lon0 + dx.atan2(dy) / self.cone,
            inv_mlfn(arc.clamp(-quarter, quarter), self.ellipsoid.e2),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::{WGS84, WGS84_SPHERE};
    use approx::assert_relative_eq;

    fn deg(v: f64) -> f64 {
        v.to_radians()
    }

    #[test]
    fn test_roundtrip_over_the_cone() {
        let proj = EquidistantConic::new(WGS84, deg(-96.0), deg(23.0), deg(29.5), deg(45.5), 0.0, 0.0);
        for &(lon, lat) in &[(-96.0, 23.0), (-74.0, 40.7), (-120.0, 60.0), (-150.0, -70.0), (60.0, 89.0)] {
            let (x, y) = proj.forward(deg(lon), deg(lat)).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, deg(lon), epsilon = 1e-9);
            assert_relative_eq!(lat2, deg(lat), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_central_meridian_is_true_length() {
        let proj = EquidistantConic::new(WGS84, 0.0, 0.0, deg(20.0), deg(50.0), 500.0, -300.0);
        let (x0, y0) = proj.forward(0.0, 0.0).unwrap();
        assert_relative_eq!(x0, 500.0, epsilon = 1e-6);
        assert_relative_eq!(y0, -300.0, epsilon = 1e-6);
        let (_, y45) = proj.forward(0.0, deg(45.0)).unwrap();
        assert_relative_eq!(y45 - y0, 4_984_944.378, epsilon = 0.05);
    }

    #[test]
    fn test_tangent_and_southern_cones() {
        let tangent = EquidistantConic::new(WGS84_SPHERE, 0.0, deg(40.0), deg(40.0), deg(40.0), 0.0, 0.0);
        assert_relative_eq!(tangent.cone, deg(40.0).sin(), epsilon = 1e-12);

        let south = EquidistantConic::new(WGS84, deg(135.0), deg(-30.0), deg(-15.0), deg(-40.0), 0.0, 0.0);
        assert!(south.cone < 0.0);
        let (x, y) = south.forward(deg(145.0), deg(-37.8)).unwrap();
        let (lon, lat) = south.inverse(x, y).unwrap();
        assert_relative_eq!(lon, deg(145.0), epsilon = 1e-9);
        assert_relative_eq!(lat, deg(-37.8), epsilon = 1e-9);
    }

    #[test]
    fn test_inverse_past_the_pole() {
        let proj = EquidistantConic::new(WGS84, 0.0, 0.0, deg(20.0), deg(50.0), 0.0, 0.0);
        let (_, y_pole) = proj.forward(0.0, FRAC_PI_2).unwrap();
        assert!(matches!(
            proj.inverse(0.0, y_pole + 1_000.0),
            Err(ProjError::OutOfDomain(_))
        ));
    }
}
