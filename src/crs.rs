//! A resolved coordinate reference system: projection math, optional pole
//! rotation, valid region and the sampled projected domain.

use std::fmt;
use std::sync::Arc;

use crate::domain::{Domain, Region};
use crate::error::ProjError;
use crate::proj::common::wrap_pi;
use crate::proj::rotated_pole::PoleRotation;
use crate::proj::Projection;
use crate::spec::ProjectionSpec;

/// What a family builder hands back for a validated spec.
pub struct Model {
    pub projection: Box<dyn Projection>,
    pub rotation: Option<PoleRotation>,
    pub region: Region,
}

/// A resolved CRS, shared as `Arc<Crs>` from the registry cache.
///
/// All angles are radians. "Frame" coordinates are geographic coordinates
/// after the pole rotation (identical to geographic for unrotated families);
/// `rel` is a frame longitude measured from the region's central longitude.
pub struct Crs {
    spec: Arc<ProjectionSpec>,
    projection: Box<dyn Projection>,
    rotation: Option<PoleRotation>,
    domain: Domain,
}

impl Crs {
    pub fn new(spec: Arc<ProjectionSpec>, model: Model) -> Self {
        let Model {
            projection,
            rotation,
            region,
        } = model;
        let lon0 = region.lon0();
        let domain = Domain::sample(region, |rel, lat| {
            projection
                .forward(lon0 + rel, lat)
                .ok()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
        });
        Self {
            spec,
            projection,
            rotation,
            domain,
        }
    }

    pub fn spec(&self) -> &Arc<ProjectionSpec> {
        &self.spec
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn region(&self) -> &Region {
        self.domain.region()
    }

    /// Geographic (lon, lat) to frame (lon, lat).
    pub fn geo_to_frame(&self, lon: f64, lat: f64) -> (f64, f64) {
        match &self.rotation {
            Some(rot) => rot.forward(lon, lat),
            None => (lon, lat),
        }
    }

    /// Frame (lon, lat) to geographic (lon, lat), longitude wrapped to [-π, π).
    pub fn frame_to_geo(&self, lon: f64, lat: f64) -> (f64, f64) {
        match &self.rotation {
            Some(rot) => rot.inverse(lon, lat),
            None => (wrap_pi(lon), lat),
        }
    }

    /// Project a frame point given as (`rel`, `lat`). `rel` is not
    /// normalized: ±π select the right/left side of a wrapping seam.
    pub fn forward_frame(&self, rel: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let (x, y) = self.projection.forward(self.domain.region().lon0() + rel, lat)?;
        if x.is_finite() && y.is_finite() {
            Ok((x, y))
        } else {
            Err(ProjError::SingularPoint(format!(
                "{} has no finite image at ({:.6}°, {:.6}°)",
                self.spec,
                rel.to_degrees(),
                lat.to_degrees()
            )))
        }
    }

    /// Geographic (lon, lat) radians to projected (x, y).
    pub fn from_geographic(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(ProjError::SingularPoint("non-finite geographic input".into()));
        }
        let (lon_f, lat_f) = self.geo_to_frame(lon, lat);
        let region = self.domain.region();
        let rel = wrap_pi(lon_f - region.lon0());
        if !region.contains(rel, lat_f) {
            return Err(ProjError::OutOfDomain(format!(
                "({:.6}°, {:.6}°) lies outside {}",
                lon.to_degrees(),
                lat.to_degrees(),
                self.spec
            )));
        }
        self.forward_frame(rel, lat_f)
    }

    /// Projected (x, y) to geographic (lon, lat) radians.
    pub fn to_geographic(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjError::SingularPoint("non-finite projected input".into()));
        }
        let (lon_f, lat_f) = self.projection.inverse(x, y)?;
        if !lon_f.is_finite() || !lat_f.is_finite() {
            return Err(ProjError::SingularPoint(format!(
                "({x}, {y}) has no inverse under {}",
                self.spec
            )));
        }
        let region = self.domain.region();
        // The inverse reports longitudes around lon0; anything past half a
        // turn came from outside the projected outline.
        if !region.contains(lon_f - region.lon0(), lat_f) {
            return Err(ProjError::OutOfDomain(format!(
                "({x}, {y}) lies outside the domain of {}",
                self.spec
            )));
        }
        Ok(self.frame_to_geo(lon_f, lat_f))
    }
}

impl fmt::Debug for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crs")
            .field("spec", &self.spec)
            .field("rotated", &self.rotation.is_some())
            .field("domain", &self.domain)
            .finish()
    }
}
