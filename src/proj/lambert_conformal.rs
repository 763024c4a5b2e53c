//! Lambert conformal conic on the ellipsoid.
//!
//!   ρ = a·F·tⁿ, θ = n·(λ - λ₀)
//!   x = ρ·sin θ, y = ρ₀ - ρ·cos θ
//!
//! Two distinct standard parallels fix the cone constant `n`; equal
//! parallels give the tangent cone with `n = sin φ₁`. The pole the cone
//! opens from maps to the apex; the opposite pole has no image.

use crate::error::ProjError;
use crate::proj::common::{msfn, phi_from_ts, tsfn};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;
use std::f64::consts::FRAC_PI_2;

const FAR_POLE_EPS: f64 = 1e-10;

pub struct LambertConformalConic {
    ellipsoid: Ellipsoid,
    lon0: f64,
    /// Cone constant `n`, negative for southern cones.
    cone: f64,
    /// a·F, the radius scale of the parallels.
    radius_scale: f64,
    /// ρ₀: radius of the origin parallel.
    origin_radius: f64,
    false_easting: f64,
    false_northing: f64,
}

impl LambertConformalConic {
    pub fn new_2sp(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        lat1: f64,
        lat2: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let e = ellipsoid.eccentricity();
        let (m1, t1) = (msfn(lat1, ellipsoid.e2), tsfn(lat1, e));
        let cone = if (lat1 - lat2).abs() > 1e-10 {
            let (m2, t2) = (msfn(lat2, ellipsoid.e2), tsfn(lat2, e));
            (m1 / m2).ln() / (t1 / t2).ln()
        } else {
            lat1.sin()
        };
        let radius_scale = ellipsoid.a * m1 / (cone * t1.powf(cone));
        let origin_radius = radius_scale * tsfn(lat0, e).powf(cone);

        Self {
            ellipsoid,
            lon0,
            cone,
            radius_scale,
            origin_radius,
            false_easting,
            false_northing,
        }
    }

    pub fn cone_constant(&self) -> f64 {
        self.cone
    }
}

impl Projection for LambertConformalConic {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        if lat * self.cone.signum() <= -FRAC_PI_2 + FAR_POLE_EPS {
            return Err(ProjError::SingularPoint(format!(
                "latitude {:.6}° is the far pole of the cone",
                lat.to_degrees()
            )));
        }
        let rho = self.radius_scale * tsfn(lat, self.ellipsoid.eccentricity()).powf(self.cone);
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
        // ρ takes the sign of n so the ratio to a·F stays positive
        let rho = dx.hypot(dy).copysign(self.cone);
        let ts = (rho / self.radius_scale).powf(1.0 / self.cone);
        Ok((
            self.lon0 + dx.atan2(dy) / self.cone,
            phi_from_ts(ts, self.ellipsoid.eccentricity()),
        ))
    }
}
