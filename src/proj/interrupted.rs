//! Interrupted Goode homolosine on the sphere.
//!
//! Sinusoidal between the parallels of 40°44'11.8", Mollweide poleward of
//! them, shifted so the two meet. Each hemisphere is cut into lobes, each
//! with its own central meridian; the cuts run from the pole to the equator.

use std::f64::consts::PI;

use crate::error::ProjError;
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::pseudocylindrical::Mollweide;
use crate::proj::sinusoidal::Sinusoidal;
use crate::proj::Projection;

/// Latitude where sinusoidal and Mollweide parallels have the same length.
const JOIN_LAT_DEG: f64 = 40.0 + 44.0 / 60.0 + 11.8 / 3600.0;

/// Goode's lobes as (west edge, central meridian), degrees from the central
/// longitude, west to east. A lobe runs to the next one's west edge.
const GOODE_NORTH: [(f64, f64); 2] = [(-180.0, -100.0), (-40.0, 30.0)];
const GOODE_SOUTH: [(f64, f64); 4] = [(-180.0, -160.0), (-100.0, -60.0), (-20.0, 20.0), (80.0, 140.0)];

/// Slack when checking which lobe an inverse result belongs to.
const LOBE_EPS: f64 = 1e-9;

struct Lobe {
    /// Radians from the central longitude.
    west: f64,
    centre: f64,
    sinusoidal: Sinusoidal,
    mollweide: Mollweide,
}

impl Lobe {
    fn new(sphere: Ellipsoid, lon0: f64, (west, centre): (f64, f64)) -> Self {
        let (west, centre) = (west.to_radians(), centre.to_radians());
        Self {
            west,
            centre,
            sinusoidal: Sinusoidal::new(sphere, lon0 + centre, sphere.a * centre, 0.0),
            mollweide: Mollweide::new(sphere, lon0 + centre),
        }
    }
}

pub struct InterruptedGoodeHomolosine {
    radius: f64,
    lon0: f64,
    join_lat: f64,
    /// Mollweide northing minus sinusoidal northing at the join latitude.
    shift: f64,
    north: Vec<Lobe>,
    south: Vec<Lobe>,
}

impl InterruptedGoodeHomolosine {
    pub fn new(sphere: Ellipsoid, lon0: f64) -> Self {
        let join_lat = JOIN_LAT_DEG.to_radians();
        let shift = Mollweide::new(sphere, lon0).northing(join_lat) - sphere.a * join_lat;
        Self {
            radius: sphere.a,
            lon0,
            join_lat,
            shift,
            north: GOODE_NORTH.iter().map(|&l| Lobe::new(sphere, lon0, l)).collect(),
            south: GOODE_SOUTH.iter().map(|&l| Lobe::new(sphere, lon0, l)).collect(),
        }
    }

    /// Interruption meridians of one hemisphere, radians from the central
    /// longitude, west to east.
    pub fn interruptions(&self, north: bool) -> Vec<f64> {
        let lobes = if north { &self.north } else { &self.south };
        lobes.iter().skip(1).map(|l| l.west).collect()
    }

    fn lobes(&self, north: bool) -> &[Lobe] {
        if north {
            &self.north
        } else {
            &self.south
        }
    }

    /// The lobe holding `rel`; a point on an interruption belongs to the
    /// lobe west of it.
    fn lobe(&self, rel: f64, lat: f64) -> &Lobe {
        let lobes = self.lobes(lat >= 0.0);
        lobes
            .iter()
            .rev()
            .find(|l| rel > l.west)
            .unwrap_or(&lobes[0])
    }
}

impl Projection for InterruptedGoodeHomolosine {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let lobe = self.lobe(lon - self.lon0, lat);
        if lat.abs() <= self.join_lat {
            return lobe.sinusoidal.forward(lon, lat);
        }
        let (x, y) = lobe.mollweide.forward(lon, lat)?;
        Ok((x + self.radius * lobe.centre, y - self.shift.copysign(lat)))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let lobes = self.lobes(y >= 0.0);
        let sinusoidal = y.abs() <= self.radius * self.join_lat;
        for (i, lobe) in lobes.iter().enumerate() {
            let found = if sinusoidal {
                lobe.sinusoidal.inverse(x, y)
            } else {
                lobe.mollweide
                    .inverse(x - self.radius * lobe.centre, y + self.shift.copysign(y))
            };
            let Ok((lon, lat)) = found else {
                continue;
            };
            let east = lobes.get(i + 1).map_or(PI, |l| l.west);
            let rel = lon - self.lon0;
            if rel >= lobe.west - LOBE_EPS && rel <= east + LOBE_EPS {
                return Ok((lon, lat));
            }
        }
        Err(ProjError::OutOfDomain(format!(
            "({x:.3}, {y:.3}) falls in an interruption of the Goode homolosine"
        )))
    }
}
