//! Spherical azimuthal projections sharing one centre/azimuth layout.
//!
//! For angular distance `c` from the centre (φ₀, λ₀):
//!
//!   x = R·k'·cos φ·sin Δλ
//!   y = R·k'·(cos φ₀·sin φ - sin φ₀·cos φ·cos Δλ)
//!
//! where `k'` depends on the family (Snyder, ch. 20-25).

use crate::error::ProjError;
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;

/// Tolerance on `cos c` at the horizon of bounded families.
const HORIZON_EPS: f64 = 1e-10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AzimuthalKind {
    Orthographic,
    Equidistant,
    EqualArea,
    /// Viewpoint at `p` sphere radii from the centre of the sphere.
    NearsidePerspective { p: f64 },
}

pub struct Azimuthal {
    ellipsoid: Ellipsoid,
    kind: AzimuthalKind,
    lon0: f64,
    sin_lat0: f64,
    cos_lat0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Azimuthal {
    pub fn new(
        ellipsoid: Ellipsoid,
        kind: AzimuthalKind,
        lon0: f64,
        lat0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let (sin_lat0, cos_lat0) = lat0.sin_cos();
        Self {
            ellipsoid,
            kind,
            lon0,
            sin_lat0,
            cos_lat0,
            false_easting,
            false_northing,
        }
    }

    /// Nearside perspective from a satellite at `height` metres above the sphere.
    pub fn perspective_distance(ellipsoid: &Ellipsoid, height: f64) -> f64 {
        1.0 + height / ellipsoid.a
    }

    fn scale(&self, cos_c: f64) -> Result<f64, ProjError> {
        match self.kind {
            AzimuthalKind::Orthographic => {
                if cos_c < -HORIZON_EPS {
                    return Err(ProjError::OutOfDomain("beyond the orthographic horizon".into()));
                }
                Ok(1.0)
            }
            AzimuthalKind::Equidistant => {
                if cos_c <= -1.0 + 1e-15 {
                    return Err(ProjError::SingularPoint("antipode of the centre".into()));
                }
                let c = cos_c.acos();
                if c < 1e-12 {
                    Ok(1.0)
                } else {
                    Ok(c / c.sin())
                }
            }
            AzimuthalKind::EqualArea => {
                if cos_c <= -1.0 + 1e-15 {
                    return Err(ProjError::SingularPoint("antipode of the centre".into()));
                }
                Ok((2.0 / (1.0 + cos_c)).sqrt())
            }
            AzimuthalKind::NearsidePerspective { p } => {
                if cos_c < 1.0 / p - HORIZON_EPS {
                    return Err(ProjError::OutOfDomain("hidden from the perspective point".into()));
                }
                Ok((p - 1.0) / (p - cos_c))
            }
        }
    }

    /// Angular distance `c` from the centre for a planar radius `rho`.
    fn angular_distance(&self, rho: f64) -> Result<f64, ProjError> {
        let r = self.ellipsoid.a;
        let c = match self.kind {
            AzimuthalKind::Orthographic => {
                let s = rho / r;
                if s > 1.0 + 1e-12 {
                    return Err(ProjError::OutOfDomain("outside the orthographic disc".into()));
                }
                s.min(1.0).asin()
            }
            AzimuthalKind::Equidistant => {
                let c = rho / r;
                if c > std::f64::consts::PI + 1e-12 {
                    return Err(ProjError::OutOfDomain("outside the equidistant disc".into()));
                }
                c
            }
            AzimuthalKind::EqualArea => {
                let s = rho / (2.0 * r);
                if s > 1.0 + 1e-12 {
                    return Err(ProjError::OutOfDomain("outside the equal-area disc".into()));
                }
                2.0 * s.min(1.0).asin()
            }
            AzimuthalKind::NearsidePerspective { p } => {
                // Snyder (23-16)
                let rr = rho / (r * (p - 1.0));
                let radicand = 1.0 - rr * rr * (p * p - 1.0);
                if radicand < -1e-12 {
                    return Err(ProjError::OutOfDomain("outside the perspective disc".into()));
                }
                let sin_c = (p - radicand.max(0.0).sqrt()) / (1.0 / rr + rr);
                sin_c.clamp(-1.0, 1.0).asin()
            }
        };
        Ok(c)
    }
}

impl Projection for Azimuthal {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let dlon = lon - self.lon0;
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_dlon, cos_dlon) = dlon.sin_cos();
        let cos_c =
            (self.sin_lat0 * sin_lat + self.cos_lat0 * cos_lat * cos_dlon).clamp(-1.0, 1.0);
        let k = self.ellipsoid.a * self.scale(cos_c)?;

        let x = k * cos_lat * sin_dlon + self.false_easting;
        let y = k * (self.cos_lat0 * sin_lat - self.sin_lat0 * cos_lat * cos_dlon)
            + self.false_northing;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let xd = x - self.false_easting;
        let yd = y - self.false_northing;
        let rho = xd.hypot(yd);
        if rho < 1e-9 {
            return Ok((self.lon0, self.sin_lat0.atan2(self.cos_lat0)));
        }
        let c = self.angular_distance(rho)?;
        let (sin_c, cos_c) = c.sin_cos();

        let lat = (cos_c * self.sin_lat0 + yd * sin_c * self.cos_lat0 / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let lon = self.lon0
            + (xd * sin_c).atan2(rho * self.cos_lat0 * cos_c - yd * self.sin_lat0 * sin_c);
        Ok((lon, lat))
    }
}
