//! Stereographic: a polar form for centres at either pole and an oblique
//! double projection (ellipsoid -> Gauss conformal sphere -> plane) for
//! every other centre. Both have a single singular point, the antipode of
//! the centre.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::error::ProjError;
use crate::proj::common::{phi_from_ts, tsfn};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;

const ANTIPODE_EPS: f64 = 1e-10;

fn antipode() -> ProjError {
    ProjError::SingularPoint("antipode of the stereographic centre".into())
}

pub struct PolarStereographic {
    ellipsoid: Ellipsoid,
    lon0: f64,
    /// +1 for a north-pole centre, -1 for south.
    hemisphere: f64,
    /// 2·a·k₀ / sqrt((1+e)^(1+e)·(1-e)^(1-e)), so that ρ = scale·t(φ).
    scale: f64,
    false_easting: f64,
    false_northing: f64,
}

impl PolarStereographic {
    /// `k0` is the scale factor at the pole.
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        is_north: bool,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let e = ellipsoid.eccentricity();
        let denom = ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt();
        Self {
            scale: 2.0 * ellipsoid.a * k0 / denom,
            ellipsoid,
            lon0,
            hemisphere: if is_north { 1.0 } else { -1.0 },
            false_easting,
            false_northing,
        }
    }
}

impl Projection for PolarStereographic {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        // Work as if the centre were the north pole.
        let phi = self.hemisphere * lat;
        if phi <= -FRAC_PI_2 + ANTIPODE_EPS {
            return Err(antipode());
        }
        let rho = self.scale * tsfn(phi, self.ellipsoid.eccentricity());
        let (sin_l, cos_l) = (lon - self.lon0).sin_cos();
        Ok((
            self.false_easting + self.hemisphere * rho * sin_l,
            self.false_northing - self.hemisphere * rho * cos_l,
        ))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let east = self.hemisphere * (x - self.false_easting);
        let south = -self.hemisphere * (y - self.false_northing);
        let phi = phi_from_ts(east.hypot(south) / self.scale, self.ellipsoid.eccentricity());
        Ok((self.lon0 + east.atan2(south), self.hemisphere * phi))
    }
}

/// Gauss conformal sphere tangent to the ellipsoid along the origin parallel.
struct GaussSphere {
    e: f64,
    /// Longitude stretch C.
    c: f64,
    k: f64,
    /// Conformal latitude of the origin.
    chi0: f64,
    /// Radius of the sphere in units of `a`.
    radius: f64,
}

impl GaussSphere {
    fn new(ellipsoid: &Ellipsoid, lat0: f64) -> Self {
        let e = ellipsoid.eccentricity();
        let es = ellipsoid.e2;
        let (sin0, cos0) = lat0.sin_cos();
        let c = (1.0 + es * cos0.powi(4) / (1.0 - es)).sqrt();
        let chi0 = (sin0 / c).asin();
        let k = (0.5 * chi0 + FRAC_PI_4).tan()
            / ((0.5 * lat0 + FRAC_PI_4).tan().powf(c) * Self::ratio(e * sin0, 0.5 * c * e));
        Self {
            e,
            c,
            k,
            chi0,
            radius: (1.0 - es).sqrt() / (1.0 - es * sin0 * sin0),
        }
    }

    fn ratio(esin: f64, exp: f64) -> f64 {
        ((1.0 - esin) / (1.0 + esin)).powf(exp)
    }

    /// Geodetic (Δλ, φ) onto the sphere.
    fn to_sphere(&self, dlon: f64, lat: f64) -> (f64, f64) {
        let w = self.k
            * (0.5 * lat + FRAC_PI_4).tan().powf(self.c)
            * Self::ratio(self.e * lat.sin(), 0.5 * self.c * self.e);
        (self.c * dlon, 2.0 * w.atan() - FRAC_PI_2)
    }

    fn from_sphere(&self, lambda: f64, chi: f64) -> (f64, f64) {
        let base = ((0.5 * chi + FRAC_PI_4).tan() / self.k).powf(1.0 / self.c);
        let mut phi = chi;
        for _ in 0..20 {
            let next = 2.0 * (base * Self::ratio(self.e * phi.sin(), -0.5 * self.e)).atan() - FRAC_PI_2;
            let done = (next - phi).abs() < 1e-14;
            phi = next;
            if done {
                break;
            }
        }
        (lambda / self.c, phi)
    }
}

pub struct ObliqueStereographic {
    lon0: f64,
    sphere: GaussSphere,
    /// 2·R·k₀ in metres.
    diameter: f64,
    false_easting: f64,
    false_northing: f64,
}

impl ObliqueStereographic {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let sphere = GaussSphere::new(&ellipsoid, lat0);
        Self {
            diameter: 2.0 * sphere.radius * ellipsoid.a * k0,
            sphere,
            lon0,
            false_easting,
            false_northing,
        }
    }
}

impl Projection for ObliqueStereographic {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let (lambda, chi) = self.sphere.to_sphere(lon - self.lon0, lat);
        let (sin_c, cos_c) = chi.sin_cos();
        let (sin_c0, cos_c0) = self.sphere.chi0.sin_cos();
        let (sin_l, cos_l) = lambda.sin_cos();

        let denom = 1.0 + sin_c0 * sin_c + cos_c0 * cos_c * cos_l;
        if denom < ANTIPODE_EPS {
            return Err(antipode());
        }
        let k = self.diameter / denom;
        Ok((
            self.false_easting + k * cos_c * sin_l,
            self.false_northing + k * (cos_c0 * sin_c - sin_c0 * cos_c * cos_l),
        ))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let dx = x - self.false_easting;
        let dy = y - self.false_northing;
        let rho = dx.hypot(dy);
        let (lambda, chi) = if rho < ANTIPODE_EPS {
            (0.0, self.sphere.chi0)
        } else {
            let (sin_c0, cos_c0) = self.sphere.chi0.sin_cos();
            let (sin_a, cos_a) = (2.0 * rho.atan2(self.diameter)).sin_cos();
            (
                (dx * sin_a).atan2(rho * cos_c0 * cos_a - dy * sin_c0 * sin_a),
                (cos_a * sin_c0 + dy * sin_a * cos_c0 / rho).clamp(-1.0, 1.0).asin(),
            )
        };
        let (dlon, lat) = self.sphere.from_sphere(lambda, chi);
        Ok((self.lon0 + dlon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::WGS84;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn deg(v: f64) -> f64 {
        v.to_radians()
    }

    fn assert_roundtrip(proj: &dyn Projection, points: &[(f64, f64)]) {
        for &(lon, lat) in points {
            let (x, y) = proj.forward(deg(lon), deg(lat)).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, deg(lon), epsilon = 1e-9);
            assert_relative_eq!(lat2, deg(lat), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_polar_roundtrips() {
        let south = PolarStereographic::new(WGS84, 0.0, false, 0.994, 2_000_000.0, 2_000_000.0);
        assert_roundtrip(&south, &[(0.0, -75.0), (90.0, -80.0), (-120.0, -10.0), (170.0, 30.0)]);
        let north = PolarStereographic::new(WGS84, deg(-45.0), true, 1.0, 0.0, 0.0);
        assert_roundtrip(&north, &[(-45.0, 75.0), (0.0, 20.0), (90.0, -40.0), (-179.0, 85.0)]);
    }

    #[test]
    fn test_polar_centre_and_antipode() {
        let proj = PolarStereographic::new(WGS84, 0.0, false, 0.994, 2_000_000.0, 2_000_000.0);
        let (x, y) = proj.forward(1.0, -FRAC_PI_2).unwrap();
        assert_relative_eq!(x, 2_000_000.0, epsilon = 1e-6);
        assert_relative_eq!(y, 2_000_000.0, epsilon = 1e-6);
        assert!(matches!(proj.forward(0.0, FRAC_PI_2), Err(ProjError::SingularPoint(_))));
    }

    #[test]
    fn test_polar_central_meridian_points_down() {
        let proj = PolarStereographic::new(WGS84, deg(30.0), true, 1.0, 0.0, 0.0);
        let (x, y) = proj.forward(deg(30.0), deg(60.0)).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert!(y < 0.0);
    }

    #[test]
    fn test_oblique_roundtrip() {
        let proj = ObliqueStereographic::new(WGS84, deg(5.4), deg(52.2), 0.9999, 155_000.0, 463_000.0);
        assert_roundtrip(&proj, &[(5.4, 52.2), (4.9, 52.4), (-40.0, 10.0), (120.0, -20.0)]);
        let (x, y) = proj.forward(deg(5.4), deg(52.2)).unwrap();
        assert_relative_eq!(x, 155_000.0, epsilon = 1e-6);
        assert_relative_eq!(y, 463_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_oblique_antipode_is_singular() {
        let proj = ObliqueStereographic::new(WGS84, 0.0, 0.0, 1.0, 0.0, 0.0);
        assert!(matches!(proj.forward(PI, 0.0), Err(ProjError::SingularPoint(_))));
    }

    #[test]
    fn test_oblique_equator_centre_is_symmetric() {
        let proj = ObliqueStereographic::new(WGS84, 0.0, 0.0, 1.0, 0.0, 0.0);
        let (x1, y1) = proj.forward(deg(20.0), deg(10.0)).unwrap();
        let (x2, y2) = proj.forward(deg(-20.0), deg(-10.0)).unwrap();
        assert_relative_eq!(x1, -x2, epsilon = 1e-6);
        assert_relative_eq!(y1, -y2, epsilon = 1e-6);
    }
}
