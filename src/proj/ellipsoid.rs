/// Figure of the earth. Only `a`, `e2` and `n` are read by the projection
/// math; spherical families use a zero-flattening instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis in metres.
    pub a: f64,
    /// e² = f·(2 - f)
    pub e2: f64,
    /// Third flattening f / (2 - f).
    pub n: f64,
}

impl Ellipsoid {
    pub const fn from_flattening(a: f64, f: f64) -> Self {
        Self {
            a,
            e2: f * (2.0 - f),
            n: f / (2.0 - f),
        }
    }

    pub const fn sphere(radius: f64) -> Self {
        Self::from_flattening(radius, 0.0)
    }

    pub fn eccentricity(&self) -> f64 {
        self.e2.sqrt()
    }
}

pub const WGS84: Ellipsoid = Ellipsoid::from_flattening(6_378_137.0, 1.0 / 298.257_223_563);

/// Sphere of radius WGS84 `a`.
pub const WGS84_SPHERE: Ellipsoid = Ellipsoid::sphere(6_378_137.0);
