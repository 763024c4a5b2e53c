//! Point transformer: source CRS → geographic → target CRS.

use std::sync::Arc;

use ndarray::{Array2, ArrayView2, Axis};

use crate::crs::Crs;
use crate::error::{CrsError, ProjError};
use crate::geometry::Coordinate;
use crate::proj::common::wrap_pi;
use crate::registry::Registry;
use crate::spec::ProjectionSpec;

/// A source/target pair of resolved CRSs.
///
/// Structurally equal specs short-circuit to the identity, so coordinates
/// pass through bit-for-bit.
#[derive(Clone, Debug)]
pub struct Transformer {
    source: Arc<Crs>,
    target: Arc<Crs>,
    identity: bool,
}

impl Transformer {
    /// Resolve both specs through the registry cache.
    pub fn new(
        registry: &Registry,
        source: &ProjectionSpec,
        target: &ProjectionSpec,
    ) -> Result<Self, CrsError> {
        Ok(Self::from_crs(registry.resolve(source)?, registry.resolve(target)?))
    }

    pub fn from_crs(source: Arc<Crs>, target: Arc<Crs>) -> Self {
        let identity = source.spec() == target.spec();
        Self {
            source,
            target,
            identity,
        }
    }

    pub fn source(&self) -> &Arc<Crs> {
        &self.source
    }

    pub fn target(&self) -> &Arc<Crs> {
        &self.target
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Project a tagged coordinate. A coordinate tagged with any spec other
    /// than the source is rejected rather than reinterpreted.
    pub fn project(&self, coord: &Coordinate) -> Result<Coordinate, ProjError> {
        if coord.spec() != self.source.spec() {
            return Err(ProjError::OutOfDomain(format!(
                "coordinate is expressed in {}, expected {}",
                coord.spec(),
                self.source.spec()
            )));
        }
        let (x, y) = self.project_xy(coord.x(), coord.y())?;
        Ok(Coordinate::new(x, y, self.target.spec().clone()))
    }

    /// Project raw source (x, y) to target (x, y).
    pub fn project_xy(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        if self.identity {
            return Ok((x, y));
        }
        let (lon, lat) = self.source.to_geographic(x, y)?;
        self.target.from_geographic(lon, lat)
    }

    /// Project coordinates in place; failed points are left untouched and
    /// reported at their index.
    pub fn project_batch(&self, coords: &mut [(f64, f64)]) -> Vec<Result<(), ProjError>> {
        coords
            .iter_mut()
            .map(|c| {
                *c = self.project_xy(c.0, c.1)?;
                Ok(())
            })
            .collect()
    }

    /// Project an `(n, 2)` array of source points. Rows without an image are
    /// NaN in the output.
    pub fn project_array(&self, points: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = Array2::from_elem((points.nrows(), 2), f64::NAN);
        if points.ncols() < 2 {
            return out;
        }
        for (src, mut dst) in points.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
            if let Ok((x, y)) = self.project_xy(src[0], src[1]) {
                dst[0] = x;
                dst[1] = y;
            }
        }
        out
    }

    /// Source (x, y) to geographic (lon, lat) radians.
    pub fn to_geographic(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        self.source.to_geographic(x, y)
    }

    /// Geographic (lon, lat) radians to target (x, y).
    pub fn from_geographic(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        self.target.from_geographic(lon, lat)
    }

    /// Source (x, y) to a target frame node: longitude relative to the
    /// target's central longitude, wrapped to `[-π, π)`, and latitude.
    pub(crate) fn frame_node(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let (lon, lat) = self.source.to_geographic(x, y)?;
        let (lon_f, lat_f) = self.target.geo_to_frame(lon, lat);
        Ok((wrap_pi(lon_f - self.target.region().lon0()), lat_f))
    }
}
