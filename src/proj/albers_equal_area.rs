//! Albers equal-area conic on the ellipsoid.
//!
//!   ρ(φ) = a·sqrt(C - n·q(φ)) / n,  θ = n·(λ - λ₀)
//!
//! Both poles have an image: the apex for the pole the cone opens from, an
//! outer arc for the other.

use std::f64::consts::FRAC_PI_2;

use crate::error::ProjError;
use crate::proj::common::{msfn, qsfn};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;

pub struct AlbersEqualArea {
    ellipsoid: Ellipsoid,
    lon0: f64,
    cone: f64,
    /// C = m₁² + n·q₁.
    big_c: f64,
    origin_radius: f64,
    /// q at the north pole; -q_pole at the south.
    q_pole: f64,
    false_easting: f64,
    false_northing: f64,
}

impl AlbersEqualArea {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        lat1: f64,
        lat2: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let e = ellipsoid.eccentricity();
        let m1 = msfn(lat1, ellipsoid.e2);
        let q1 = qsfn(lat1, e);
        let cone = if (lat1 - lat2).abs() > 1e-10 {
            let m2 = msfn(lat2, ellipsoid.e2);
            (m1 * m1 - m2 * m2) / (qsfn(lat2, e) - q1)
        } else {
            lat1.sin()
        };
        let mut albers = Self {
            ellipsoid,
            lon0,
            cone,
            big_c: m1 * m1 + cone * q1,
            origin_radius: 0.0,
            q_pole: qsfn(FRAC_PI_2, e),
            false_easting,
            false_northing,
        };
        albers.origin_radius = albers.radius(lat0);
        albers
    }

    fn radius(&self, lat: f64) -> f64 {
        let q = qsfn(lat, self.ellipsoid.eccentricity());
        self.ellipsoid.a * (self.big_c - self.cone * q).abs().sqrt() / self.cone
    }

    /// Newton inversion of `qsfn`, starting from the spherical answer.
    fn latitude_of(&self, q: f64) -> f64 {
        let e = self.ellipsoid.eccentricity();
        let one_e2 = 1.0 - self.ellipsoid.e2;
        let mut lat = (0.5 * q).clamp(-1.0, 1.0).asin();
        for _ in 0..15 {
            let esin = e * lat.sin();
            let w = 1.0 - esin * esin;
            let step = (q - qsfn(lat, e)) * w * w / (2.0 * one_e2 * lat.cos());
            lat += step;
            if step.abs() < 1e-12 {
                break;
            }
        }
        lat
    }
}

impl Projection for AlbersEqualArea {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let rho = self.radius(lat);
        let (sin_t, cos_t) = (self.cone * (lon - self.lon0)).sin_cos();
        Ok((
            self.false_easting + rho * sin_t,
            self.false_northing + self.origin_radius - rho * cos_t,
        ))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let sign = self.cone.signum();
        let dx = sign * (x - self.false_easting);
        let dy = sign * (self.origin_radius - (y - self.false_northing));

        let scaled = dx.hypot(dy) * self.cone / self.ellipsoid.a;
        let q = (self.big_c - scaled * scaled) / self.cone;
        if q.abs() > self.q_pole + 1e-9 {
            return Err(ProjError::OutOfDomain(format!(
                "({x:.3}, {y:.3}) lies outside the Albers annulus"
            )));
        }
        let lon = self.lon0 + dx.atan2(dy) / self.cone;
        let lat = if q.abs() >= self.q_pole - 1e-12 {
            FRAC_PI_2.copysign(q)
        } else {
            self.latitude_of(q)
        };
        Ok((lon, lat))
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

    /// Conterminous-US parallels 29.5°/45.5°, origin 23°N 96°W.
    fn conus(fe: f64, fn_: f64) -> AlbersEqualArea {
        AlbersEqualArea::new(WGS84, deg(-96.0), deg(23.0), deg(29.5), deg(45.5), fe, fn_)
    }

    #[test]
    fn test_roundtrip_over_the_globe() {
        let proj = conus(0.0, 0.0);
        for &(lon, lat) in &[(-96.0, 23.0), (-74.0, 40.7), (-122.4, 37.8), (60.0, -45.0), (170.0, 10.0)] {
            let (x, y) = proj.forward(deg(lon), deg(lat)).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, deg(lon), epsilon = 1e-9);
            assert_relative_eq!(lat2, deg(lat), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_false_origin() {
        let proj = conus(1_000_000.0, -250_000.0);
        let (x, y) = proj.forward(deg(-96.0), deg(23.0)).unwrap();
        assert_relative_eq!(x, 1_000_000.0, epsilon = 1e-6);
        assert_relative_eq!(y, -250_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_equal_area_band() {
        // Area of a 1° x 1° cell depends on latitude only.
        let proj = conus(0.0, 0.0);
        let cell = |lon: f64| {
            let corners = [(lon, 40.0), (lon + 1.0, 40.0), (lon + 1.0, 41.0), (lon, 41.0)]
                .map(|(a, b)| proj.forward(deg(a), deg(b)).unwrap());
            let twice: f64 = (0..4)
                .map(|i| {
                    let (x1, y1) = corners[i];
                    let (x2, y2) = corners[(i + 1) % 4];
                    x1 * y2 - x2 * y1
                })
                .sum();
            twice.abs() / 2.0
        };
        assert_relative_eq!(cell(-100.0), cell(-80.0), max_relative = 1e-9);
    }

    #[test]
    fn test_poles_roundtrip() {
        let proj = AlbersEqualArea::new(WGS84, 0.0, 0.0, deg(20.0), deg(50.0), 0.0, 0.0);
        for pole in [FRAC_PI_2, -FRAC_PI_2] {
            let (x, y) = proj.forward(0.3, pole).unwrap();
            let (_, lat) = proj.inverse(x, y).unwrap();
            assert_relative_eq!(lat, pole, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_outside_annulus() {
        let proj = conus(0.0, 0.0);
        assert!(matches!(
            proj.inverse(0.0, 4.0e7),
            Err(ProjError::OutOfDomain(_))
        ));
    }
}
