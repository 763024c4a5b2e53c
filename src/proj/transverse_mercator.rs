//! Transverse Mercator via the Krüger series in the third flattening `n`,
//! carried to sixth order (Karney 2011). The ellipsoid is first mapped
//! conformally to the sphere, then the spherical transverse Mercator
//! `(ξ', η')` is corrected to the ellipsoidal `(ξ, η)` by the α series; the
//! β series undoes it.
//!
//! Points a quarter turn or more from the central meridian have no image.

use std::f64::consts::FRAC_PI_2;

use crate::error::ProjError;
use crate::proj::ellipsoid::{Ellipsoid, WGS84};
use crate::proj::Projection;

const ORDER: usize = 6;

/// Row `k` holds the coefficients of n¹..n⁶ in α₍ₖ₊₁₎.
const ALPHA: [[f64; ORDER]; ORDER] = [
    [1.0 / 2.0, -2.0 / 3.0, 5.0 / 16.0, 41.0 / 180.0, -127.0 / 288.0, 7891.0 / 37800.0],
    [0.0, 13.0 / 48.0, -3.0 / 5.0, 557.0 / 1440.0, 281.0 / 630.0, -1983433.0 / 1935360.0],
    [0.0, 0.0, 61.0 / 240.0, -103.0 / 140.0, 15061.0 / 26880.0, 167603.0 / 181440.0],
    [0.0, 0.0, 0.0, 49561.0 / 161280.0, -179.0 / 168.0, 6601661.0 / 7257600.0],
    [0.0, 0.0, 0.0, 0.0, 34729.0 / 80640.0, -3418889.0 / 1995840.0],
    [0.0, 0.0, 0.0, 0.0, 0.0, 212378941.0 / 319334400.0],
];

/// Same layout for β.
const BETA: [[f64; ORDER]; ORDER] = [
    [1.0 / 2.0, -2.0 / 3.0, 37.0 / 96.0, -1.0 / 360.0, -81.0 / 512.0, 96199.0 / 604800.0],
    [0.0, 1.0 / 48.0, 1.0 / 15.0, -437.0 / 1440.0, 46.0 / 105.0, -1118711.0 / 3870720.0],
    [0.0, 0.0, 17.0 / 480.0, -37.0 / 840.0, -209.0 / 4480.0, 5569.0 / 90720.0],
    [0.0, 0.0, 0.0, 4397.0 / 161280.0, -11.0 / 504.0, -830251.0 / 7257600.0],
    [0.0, 0.0, 0.0, 0.0, 4583.0 / 161280.0, -108847.0 / 3991680.0],
    [0.0, 0.0, 0.0, 0.0, 0.0, 20648693.0 / 638668800.0],
];

fn series(table: &[[f64; ORDER]; ORDER], n: f64) -> [f64; ORDER] {
    table.map(|row| row.iter().rev().fold(0.0, |acc, c| (acc + c) * n))
}

/// Add `sign · Σ cₖ·(sin 2kξ cosh 2kη, cos 2kξ sinh 2kη)` to `(ξ, η)`.
fn perturb(coeffs: &[f64; ORDER], sign: f64, xi: f64, eta: f64) -> (f64, f64) {
    coeffs
        .iter()
        .enumerate()
        .fold((xi, eta), |(x, e), (i, c)| {
            let k = 2.0 * (i + 1) as f64;
            (
                x + sign * c * (k * xi).sin() * (k * eta).cosh(),
                e + sign * c * (k * xi).cos() * (k * eta).sinh(),
            )
        })
}

/// Central meridian of a UTM zone, radians.
pub fn utm_central_meridian(zone: u8) -> f64 {
    (f64::from(zone) * 6.0 - 183.0).to_radians()
}

pub struct TransverseMercator {
    ellipsoid: Ellipsoid,
    lon0: f64,
    /// k₀ times the rectifying radius A.
    scale: f64,
    alpha: [f64; ORDER],
    beta: [f64; ORDER],
    /// ξ of the origin on the central meridian.
    xi0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl TransverseMercator {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let n = ellipsoid.n;
        let rectifying = ellipsoid.a / (1.0 + n) * (1.0 + n * n / 4.0 + n.powi(4) / 64.0);
        let mut tm = Self {
            scale: k0 * rectifying,
            alpha: series(&ALPHA, n),
            beta: series(&BETA, n),
            xi0: 0.0,
            ellipsoid,
            lon0,
            false_easting,
            false_northing,
        };
        tm.xi0 = tm.ellipsoidal(lat0, 0.0).0;
        tm
    }

    /// WGS84 UTM zone (1..=60) with the usual 500 km false easting and a
    /// 10 000 km false northing in the south.
    pub fn utm_zone(zone: u8, south: bool) -> Self {
        let false_northing = if south { 10_000_000.0 } else { 0.0 };
        Self::new(WGS84, utm_central_meridian(zone), 0.0, 0.9996, 500_000.0, false_northing)
    }

    /// σ in τ' = τ·sqrt(1 + σ²) - σ·sqrt(1 + τ²).
    fn sigma(&self, tau: f64) -> f64 {
        let e = self.ellipsoid.eccentricity();
        (e * (e * tau / tau.hypot(1.0)).atanh()).sinh()
    }

    fn conformal_tan(&self, tau: f64) -> f64 {
        let sigma = self.sigma(tau);
        tau * sigma.hypot(1.0) - sigma * tau.hypot(1.0)
    }

    /// Newton inversion of `conformal_tan`.
    fn geodetic_tan(&self, tau_c: f64) -> f64 {
        let one_e2 = 1.0 - self.ellipsoid.e2;
        let mut tau = tau_c / one_e2;
        for _ in 0..10 {
            let guess = self.conformal_tan(tau);
            let step = (tau_c - guess) * (1.0 + one_e2 * tau * tau)
                / (one_e2 * tau.hypot(1.0) * guess.hypot(1.0));
            tau += step;
            if step.abs() < 1e-13 * tau.abs().max(1.0) {
                break;
            }
        }
        tau
    }

    /// (ξ, η) for latitude `lat` at `dlam` from the central meridian.
    fn ellipsoidal(&self, lat: f64, dlam: f64) -> (f64, f64) {
        let tau_c = self.conformal_tan(lat.tan());
        let (sin_l, cos_l) = dlam.sin_cos();
        let xi = tau_c.atan2(cos_l);
        let eta = (sin_l / tau_c.hypot(cos_l)).asinh();
        perturb(&self.alpha, 1.0, xi, eta)
    }
}

impl Projection for TransverseMercator {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let dlam = lon - self.lon0;
        if dlam.abs() >= FRAC_PI_2 - 1e-10 {
            return Err(ProjError::SingularPoint(format!(
                "{:.3}° from the central meridian",
                dlam.to_degrees()
            )));
        }
        let (xi, eta) = self.ellipsoidal(lat, dlam);
        Ok((
            self.false_easting + self.scale * eta,
            self.false_northing + self.scale * (xi - self.xi0),
        ))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let eta = (x - self.false_easting) / self.scale;
        let xi = (y - self.false_northing) / self.scale + self.xi0;
        let (xi_s, eta_s) = perturb(&self.beta, -1.0, xi, eta);

        let sinh_eta = eta_s.sinh();
        let (sin_xi, cos_xi) = xi_s.sin_cos();
        let tau_c = sin_xi / sinh_eta.hypot(cos_xi);
        Ok((
            self.lon0 + sinh_eta.atan2(cos_xi),
            self.geodetic_tan(tau_c).atan(),
        ))
    }
}
