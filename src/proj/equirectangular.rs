//! Equirectangular (Plate Carrée) projection.
//!
//! forward: x = s·(λ - λ₀), y = s·φ
//! inverse: λ = λ₀ + x/s, φ = y/s
//!
//! `s` is 180/π: this is the degree-valued plate carrée used as the
//! geographic display CRS.

use crate::error::ProjError;
use crate::proj::Projection;

pub struct Equirectangular {
    scale: f64,
    lon0: f64,
}

impl Equirectangular {
    /// Plate carrée with coordinates in degrees of longitude/latitude
    /// relative to `lon0`.
    pub fn degrees(lon0: f64) -> Self {
        Self {
            scale: 180.0 / std::f64::consts::PI,
            lon0,
        }
    }
}

impl Projection for Equirectangular {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        Ok((self.scale * (lon - self.lon0), self.scale * lat))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        Ok((self.lon0 + x / self.scale, y / self.scale))
    }
}
