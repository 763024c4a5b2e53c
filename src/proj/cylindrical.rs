//! Spherical cylindrical projections: Miller and Lambert cylindrical equal-area.
//!
//! Miller:  x = R·(λ - λ₀), y = 1.25·R·ln tan(π/4 + 0.4·φ)
//! cea:     x = R·(λ - λ₀), y = R·sin φ

use std::f64::consts::FRAC_PI_4;

use crate::error::ProjError;
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;

pub struct Miller {
    ellipsoid: Ellipsoid,
    lon0: f64,
}

impl Miller {
    pub fn new(ellipsoid: Ellipsoid, lon0: f64) -> Self {
        Self { ellipsoid, lon0 }
    }
}

impl Projection for Miller {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let r = self.ellipsoid.a;
        let x = r * (lon - self.lon0);
        let y = 1.25 * r * (FRAC_PI_4 + 0.4 * lat).tan().ln();
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let r = self.ellipsoid.a;
        let lat = 2.5 * (0.8 * y / r).exp().atan() - 0.625 * std::f64::consts::PI;
        Ok((self.lon0 + x / r, lat))
    }
}

pub struct LambertCylindrical {
    ellipsoid: Ellipsoid,
    lon0: f64,
}

impl LambertCylindrical {
    pub fn new(ellipsoid: Ellipsoid, lon0: f64) -> Self {
        Self { ellipsoid, lon0 }
    }
}

impl Projection for LambertCylindrical {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let r = self.ellipsoid.a;
        Ok((r * (lon - self.lon0), r * lat.sin()))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let r = self.ellipsoid.a;
        let s = y / r;
        if s.abs() > 1.0 + 1e-12 {
            return Err(ProjError::OutOfDomain(format!(
                "northing {y:.3} beyond the equal-area cylinder"
            )));
        }
        Ok((self.lon0 + x / r, s.clamp(-1.0, 1.0).asin()))
    }
}
