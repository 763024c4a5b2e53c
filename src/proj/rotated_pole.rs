//! Pole rotation between geographic and rotated-pole frames.
//!
//! The rotated north pole sits at geographic (λp, φp); the geographic
//! meridian λp + 180° becomes the rotated prime meridian.

use crate::proj::common::wrap_pi;

#[derive(Clone, Copy, Debug)]
pub struct PoleRotation {
    pole_lon: f64,
    sin_p: f64,
    cos_p: f64,
}

impl PoleRotation {
    /// Rotation for a pole at (`pole_lon`, `pole_lat`), radians.
    pub fn new(pole_lon: f64, pole_lat: f64) -> Self {
        let (sin_p, cos_p) = pole_lat.sin_cos();
        Self {
            pole_lon,
            sin_p,
            cos_p,
        }
    }

    /// Geographic (lon, lat) to rotated-frame (lon, lat).
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (sin_lat, cos_lat) = lat.sin_cos();
        let dlon = lon - self.pole_lon;
        let x = cos_lat * dlon.cos();
        let y = cos_lat * dlon.sin();
        let z = sin_lat;

        let xr = self.sin_p * x - self.cos_p * z;
        let zr = self.cos_p * x + self.sin_p * z;
        let lon_r = (-y).atan2(-xr);
        let lat_r = zr.atan2(xr.hypot(y));
        (lon_r, lat_r)
    }

    /// Rotated-frame (lon, lat) back to geographic (lon, lat).
    pub fn inverse(&self, lon_r: f64, lat_r: f64) -> (f64, f64) {
        let (sin_lat, cos_lat) = lat_r.sin_cos();
        let xr = -cos_lat * lon_r.cos();
        let y = -cos_lat * lon_r.sin();
        let zr = sin_lat;

        let x = self.sin_p * xr + self.cos_p * zr;
        let z = -self.cos_p * xr + self.sin_p * zr;
        let lon = wrap_pi(y.atan2(x) + self.pole_lon);
        let lat = z.atan2(x.hypot(y));
        (lon, lat)
    }
}
