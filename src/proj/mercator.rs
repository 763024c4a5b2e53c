//! Ellipsoidal Mercator with a latitude of true scale.
//!
//!   x = a·k·(λ - λ₀),  y = -a·k·ln t(φ),  k = m(φ_ts)
//!
//! Northing diverges at the poles, so callers clip latitude first.

use std::f64::consts::FRAC_PI_2;

use crate::error::ProjError;
use crate::proj::common::{msfn, phi_from_ts, tsfn};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;

pub struct Mercator {
    ellipsoid: Ellipsoid,
    lon0: f64,
    /// a·k: metres per radian of longitude.
    stretch: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Mercator {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat_ts: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        Self {
            stretch: ellipsoid.a * msfn(lat_ts, ellipsoid.e2),
            ellipsoid,
            lon0,
            false_easting,
            false_northing,
        }
    }
}

impl Projection for Mercator {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        if lat.abs() >= FRAC_PI_2 - 1e-10 {
            return Err(ProjError::SingularPoint(format!(
                "no finite northing at latitude {:.6}°",
                lat.to_degrees()
            )));
        }
        let ts = tsfn(lat, self.ellipsoid.eccentricity());
        Ok((
            self.false_easting + self.stretch * (lon - self.lon0),
            self.false_northing - self.stretch * ts.ln(),
        ))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let ts = ((self.false_northing - y) / self.stretch).exp();
        Ok((
            self.lon0 + (x - self.false_easting) / self.stretch,
            phi_from_ts(ts, self.ellipsoid.eccentricity()),
        ))
    }
}
