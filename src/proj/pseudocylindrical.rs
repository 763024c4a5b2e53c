//! Spherical pseudo-cylindrical projections: Mollweide and the six Eckert
//! projections.
//!
//! Straight parallels, meridians curving towards a pole line (Eckert) or a
//! pole point (Mollweide). Mollweide, Eckert IV and Eckert VI solve for an
//! auxiliary angle θ from the latitude by Newton iteration.

use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};

use crate::error::ProjError;
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;

const MAX_ITER: usize = 30;
const TOL: f64 = 1e-13;

/// Solve `f(θ) = target` for θ in [-π/2, π/2] given `f` and its derivative.
fn solve_theta(lat: f64, target: f64, f: impl Fn(f64) -> f64, df: impl Fn(f64) -> f64) -> f64 {
    if (lat.abs() - FRAC_PI_2).abs() < 1e-12 {
        return FRAC_PI_2.copysign(lat);
    }
    let mut theta = 0.5 * lat;
    for _ in 0..MAX_ITER {
        let delta = (f(theta) - target) / df(theta);
        theta = (theta - delta).clamp(-FRAC_PI_2, FRAC_PI_2);
        if delta.abs() < TOL {
            break;
        }
    }
    theta
}

fn asin_checked(v: f64, what: &str) -> Result<f64, ProjError> {
    if v.abs() > 1.0 + 1e-12 {
        return Err(ProjError::OutOfDomain(format!("{what} outside the map outline")));
    }
    Ok(v.clamp(-1.0, 1.0).asin())
}

/// Latitude from a linear northing `y = c·φ`, rejecting points past the poles.
fn linear_lat(y: f64, c: f64) -> Result<f64, ProjError> {
    let lat = y / c;
    if lat.abs() > FRAC_PI_2 + 1e-12 {
        return Err(ProjError::OutOfDomain(format!(
            "northing {y:.3} beyond the pole line"
        )));
    }
    Ok(lat.clamp(-FRAC_PI_2, FRAC_PI_2))
}

pub struct Mollweide {
    sphere: Ellipsoid,
    lon0: f64,
}

impl Mollweide {
    pub fn new(sphere: Ellipsoid, lon0: f64) -> Self {
        Self { sphere, lon0 }
    }

    /// Auxiliary angle: 2θ + sin 2θ = π sin φ.
    fn theta(lat: f64) -> f64 {
        solve_theta(
            lat,
            PI * lat.sin(),
            |t| 2.0 * t + (2.0 * t).sin(),
            |t| 2.0 + 2.0 * (2.0 * t).cos(),
        )
    }

    /// Northing of the parallel at `lat`.
    pub fn northing(&self, lat: f64) -> f64 {
        SQRT_2 * self.sphere.a * Self::theta(lat).sin()
    }
}

impl Projection for Mollweide {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let theta = Self::theta(lat);
        let r = self.sphere.a;
        let x = 2.0 * SQRT_2 / PI * r * (lon - self.lon0) * theta.cos();
        let y = SQRT_2 * r * theta.sin();
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let r = self.sphere.a;
        let theta = asin_checked(y / (SQRT_2 * r), "northing")?;
        let lat = asin_checked((2.0 * theta + (2.0 * theta).sin()) / PI, "latitude")?;
        let cos_t = theta.cos();
        if cos_t < 1e-15 {
            return Ok((self.lon0, lat));
        }
        let lon = self.lon0 + PI * x / (2.0 * SQRT_2 * r * cos_t);
        Ok((lon, lat))
    }
}

/// Which of Eckert's six projections. II, IV and VI are equal-area; I, III
/// and V space the parallels evenly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EckertKind {
    I,
    II,
    III,
    IV,
    V,
    VI,
}

// Eckert I: 2·sqrt(2 / 3π).
const ECK1_C: f64 = 0.921_317_731_923_561_3;
// Eckert II: 2 / sqrt(6π) and sqrt(2π / 3).
const ECK2_CX: f64 = 0.460_658_865_961_780_64;
const ECK2_CY: f64 = 1.447_202_509_116_535_3;
// Eckert III and IV share the x constant 2 / sqrt(π(4 + π)).
const ECK3_CX: f64 = 0.422_238_200_315_771_25;
const ECK3_CY: f64 = 0.844_476_400_631_542_5;
const ECK3_B: f64 = 0.405_284_734_569_351_1; // 4 / π²
const ECK4_CY: f64 = 1.326_500_428_177_002_3; // 2·sqrt(π / (4 + π))
const ECK4_CP: f64 = 3.570_796_326_794_896_6; // 2 + π/2
// Eckert V: y constant 2 / sqrt(2 + π), x constant half of it.
const ECK5_CX: f64 = 0.441_012_771_724_551_5;
const ECK5_CY: f64 = 0.882_025_543_449_102_96;
// Eckert VI: θ + sin θ = (1 + π/2) sin φ.
const ECK6_N: f64 = 1.0 + FRAC_PI_2;

pub struct Eckert {
    sphere: Ellipsoid,
    lon0: f64,
    kind: EckertKind,
}

impl Eckert {
    pub fn new(sphere: Ellipsoid, lon0: f64, kind: EckertKind) -> Self {
        Self { sphere, lon0, kind }
    }

    fn eck6_cy() -> f64 {
        (2.0 / ECK6_N).sqrt()
    }

    /// Unit-sphere (x, y) for a longitude offset `dlon`.
    fn unit_forward(&self, dlon: f64, lat: f64) -> (f64, f64) {
        match self.kind {
            EckertKind::I => (ECK1_C * dlon * (1.0 - lat.abs() / PI), ECK1_C * lat),
            EckertKind::II => {
                let s = (4.0 - 3.0 * lat.abs().sin()).sqrt();
                (ECK2_CX * dlon * s, (ECK2_CY * (2.0 - s)).copysign(lat))
            }
            EckertKind::III => {
                let w = (1.0 - ECK3_B * lat * lat).max(0.0).sqrt();
                (ECK3_CX * dlon * (1.0 + w), ECK3_CY * lat)
            }
            EckertKind::IV => {
                // θ + sin θ cos θ + 2 sin θ = (2 + π/2) sin φ
                let theta = solve_theta(
                    lat,
                    ECK4_CP * lat.sin(),
                    |t| t + t.sin() * t.cos() + 2.0 * t.sin(),
                    |t| 2.0 * t.cos() * (1.0 + t.cos()),
                );
                (ECK3_CX * dlon * (1.0 + theta.cos()), ECK4_CY * theta.sin())
            }
            EckertKind::V => (ECK5_CX * dlon * (1.0 + lat.cos()), ECK5_CY * lat),
            EckertKind::VI => {
                let theta = solve_theta(lat, ECK6_N * lat.sin(), |t| t + t.sin(), |t| 1.0 + t.cos());
                let cy = Self::eck6_cy();
                (0.5 * cy * dlon * (1.0 + theta.cos()), cy * theta)
            }
        }
    }

    /// Unit-sphere (x, y) back to (dlon, lat).
    fn unit_inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        match self.kind {
            EckertKind::I => {
                let lat = linear_lat(y, ECK1_C)?;
                Ok((x / (ECK1_C * (1.0 - lat.abs() / PI)), lat))
            }
            EckertKind::II => {
                let s = 2.0 - y.abs() / ECK2_CY;
                if s < 1.0 - 1e-12 {
                    return Err(ProjError::OutOfDomain(format!(
                        "northing {y:.6} beyond the pole line"
                    )));
                }
                let s = s.max(1.0);
                let lat = asin_checked((4.0 - s * s) / 3.0, "latitude")?.copysign(y);
                Ok((x / (ECK2_CX * s), lat))
            }
            EckertKind::III => {
                let lat = linear_lat(y, ECK3_CY)?;
                let w = (1.0 - ECK3_B * lat * lat).max(0.0).sqrt();
                Ok((x / (ECK3_CX * (1.0 + w)), lat))
            }
            EckertKind::IV => {
                let theta = asin_checked(y / ECK4_CY, "northing")?;
                let (s, c) = theta.sin_cos();
                let lat = asin_checked((theta + s * c + 2.0 * s) / ECK4_CP, "latitude")?;
                Ok((x / (ECK3_CX * (1.0 + c)), lat))
            }
            EckertKind::V => {
                let lat = linear_lat(y, ECK5_CY)?;
                Ok((x / (ECK5_CX * (1.0 + lat.cos())), lat))
            }
            EckertKind::VI => {
                let cy = Self::eck6_cy();
                let theta = linear_lat(y, cy)?;
                let lat = asin_checked((theta + theta.sin()) / ECK6_N, "latitude")?;
                Ok((x / (0.5 * cy * (1.0 + theta.cos())), lat))
            }
        }
    }
}

impl Projection for Eckert {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let r = self.sphere.a;
        let (x, y) = self.unit_forward(lon - self.lon0, lat);
        Ok((r * x, r * y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let r = self.sphere.a;
        let (dlon, lat) = self.unit_inverse(x / r, y / r)?;
        Ok((self.lon0 + dlon, lat))
    }
}
