pub mod albers_equal_area;
pub mod azimuthal;
pub mod common;
pub mod cylindrical;
pub mod ellipsoid;
pub mod equirectangular;
pub mod equidistant_conic;
pub mod geostationary;
pub mod interrupted;
pub mod lambert_conformal;
pub mod mercator;
pub mod pseudocylindrical;
pub mod rotated_pole;
pub mod sinusoidal;
pub mod stereographic;
pub mod transverse_mercator;

use crate::error::ProjError;

/// Planar math of one family, shared across threads by the registry cache.
///
/// `forward` receives longitudes already brought within half a turn of the
/// central meridian and latitudes inside the family's region; it only
/// reports points the formulas themselves cannot place.
pub trait Projection: Send + Sync {
    /// Geographic radians to projected metres (degrees for plate carrée).
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError>;

    /// Projected coordinates back to geographic radians.
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError>;
}
