//! Valid regions, projected domains and discontinuity queries.
//!
//! A [`Region`] lives in a CRS's frame (geographic coordinates after any
//! pole rotation) and is expressed relative to the frame's central
//! longitude. Its boundary is a closed loop parameterized counter-clockwise
//! by a position `s` in `[0, perimeter)`:
//!
//! - rectangles: `[0, 1)` bottom edge west to east, `[1, 2)` east edge
//!   south to north, `[2, 3)` top edge east to west, `[3, 4)` west edge
//!   north to south;
//! - caps: `[0, 1)` one turn of decreasing azimuth around the centre;
//! - lobed globes: one unit per straight leg of the outline, running along
//!   the south pole line west to east with a detour up and down both banks
//!   of every southern interruption, up the east edge, back along the north
//!   pole line with a detour down and up every northern interruption, and
//!   down the west edge.
//!
//! The geometry reprojector walks this loop to close polygons cut by the
//! boundary.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::geometry::Coordinate;
use crate::proj::common::{angular_distance, azimuth, destination, wrap_pi};
use crate::reproject::trace::{trace_path, Tracer};
use crate::reproject::DEFAULT_SAMPLES_PER_SEGMENT;
use crate::transform::Transformer;

/// Angular slack, in radians, for region membership.
pub const EPS: f64 = 1e-12;

/// Boundary samples per rectangle edge.
const EDGE_SAMPLES: usize = 90;

/// Boundary samples around a cap.
const CAP_SAMPLES: usize = 180;

/// Offset of the east bank of an interruption from its meridian. A frame
/// longitude equal to the meridian belongs to the lobe on its west.
pub const BANK_OFFSET: f64 = 1e-12;

/// Which copy of the frame longitude range an unwrapped longitude is on,
/// and whether the point lies inside the region there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Locus {
    pub sheet: i32,
    pub inside: bool,
    /// Frame (rel, lat) with `rel` taken on `sheet`.
    pub local: (f64, f64),
}

/// A point on the region boundary: frame position plus loop position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryPoint {
    pub rel: f64,
    pub lat: f64,
    pub s: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Bottom,
    Right,
    Top,
    Left,
}

/// Straight stretch of a lobed outline in frame (rel, lat).
#[derive(Clone, Copy, Debug, PartialEq)]
struct Leg {
    from: (f64, f64),
    to: (f64, f64),
}

impl Leg {
    fn new(from: (f64, f64), to: (f64, f64)) -> Self {
        Self { from, to }
    }

    fn is_meridian(&self) -> bool {
        self.from.0 == self.to.0
    }

    fn at(&self, f: f64) -> (f64, f64) {
        (
            self.from.0 + f * (self.to.0 - self.from.0),
            self.from.1 + f * (self.to.1 - self.from.1),
        )
    }

    /// Fraction along the leg of the point closest to `p`.
    fn fraction(&self, p: (f64, f64)) -> f64 {
        let (dx, dy) = (self.to.0 - self.from.0, self.to.1 - self.from.1);
        let len2 = dx * dx + dy * dy;
        if len2 == 0.0 {
            return 0.0;
        }
        (((p.0 - self.from.0) * dx + (p.1 - self.from.1) * dy) / len2).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Region {
    /// Longitude band `lon0 ± half_width` by latitude band. A half width of
    /// half a turn covers every longitude and its east/west edges coincide
    /// on the antimeridian of `lon0`.
    Rect {
        lon0: f64,
        half_width: f64,
        lat_min: f64,
        lat_max: f64,
    },
    /// Spherical cap of angular `radius` around (`lon0`, `lat0`).
    Cap { lon0: f64, lat0: f64, radius: f64 },
    /// Whole globe cut along meridians that run from a pole to the equator.
    /// `north` and `south` hold the cut meridians as sorted `rel` values
    /// strictly inside half a turn.
    Lobed {
        lon0: f64,
        north: Vec<f64>,
        south: Vec<f64>,
    },
}

impl Region {
    pub fn globe(lon0: f64) -> Self {
        Self::band(lon0, PI, -PI / 2.0, PI / 2.0)
    }

    pub fn band(lon0: f64, half_width: f64, lat_min: f64, lat_max: f64) -> Self {
        Region::Rect {
            lon0,
            half_width,
            lat_min,
            lat_max,
        }
    }

    pub fn cap(lon0: f64, lat0: f64, radius: f64) -> Self {
        Region::Cap { lon0, lat0, radius }
    }

    pub fn lobed(lon0: f64, mut north: Vec<f64>, mut south: Vec<f64>) -> Self {
        north.sort_by(f64::total_cmp);
        south.sort_by(f64::total_cmp);
        Region::Lobed { lon0, north, south }
    }

    /// Central frame longitude; `rel` values are measured from it.
    pub fn lon0(&self) -> f64 {
        match *self {
            Region::Rect { lon0, .. } | Region::Cap { lon0, .. } | Region::Lobed { lon0, .. } => {
                lon0
            }
        }
    }

    /// True when the region's east and west edges meet: paths may leave one
    /// side of the map and continue on the other.
    pub fn wraps(&self) -> bool {
        match *self {
            Region::Rect { half_width, .. } => half_width >= PI - EPS,
            Region::Cap { .. } => false,
            Region::Lobed { .. } => true,
        }
    }

    pub fn perimeter(&self) -> f64 {
        match self {
            Region::Rect { .. } => 4.0,
            Region::Cap { .. } => 1.0,
            Region::Lobed { north, south, .. } => (3 * (north.len() + south.len()) + 4) as f64,
        }
    }

    /// Frame (rel, lat) of the region's centre.
    pub fn centre(&self) -> (f64, f64) {
        match *self {
            Region::Rect {
                lat_min, lat_max, ..
            } => (0.0, 0.5 * (lat_min + lat_max)),
            Region::Cap { lat0, .. } => (0.0, lat0),
            Region::Lobed { .. } => (0.0, 0.0),
        }
    }

    /// Outline legs of a lobed region in loop order; empty for other kinds.
    fn legs(&self) -> Vec<Leg> {
        let Region::Lobed { north, south, .. } = self else {
            return Vec::new();
        };
        let (s, n) = (-FRAC_PI_2, FRAC_PI_2);
        let mut legs = Vec::with_capacity(3 * (north.len() + south.len()) + 4);
        let mut west = -PI;
        for &c in south {
            let bank = c + BANK_OFFSET;
            legs.push(Leg::new((west, s), (c, s)));
            legs.push(Leg::new((c, s), (c, 0.0)));
            legs.push(Leg::new((bank, 0.0), (bank, s)));
            west = bank;
        }
        legs.push(Leg::new((west, s), (PI, s)));
        legs.push(Leg::new((PI, s), (PI, n)));
        let mut east = PI;
        for &c in north.iter().rev() {
            let bank = c + BANK_OFFSET;
            legs.push(Leg::new((east, n), (bank, n)));
            legs.push(Leg::new((bank, n), (bank, 0.0)));
            legs.push(Leg::new((c, 0.0), (c, n)));
            east = c;
        }
        legs.push(Leg::new((east, n), (-PI, n)));
        legs.push(Leg::new((-PI, n), (-PI, s)));
        legs
    }

    /// Boundary point on the meridian leg at `rel` in the given hemisphere.
    fn meridian_point(&self, rel: f64, north: bool, lat: f64) -> BoundaryPoint {
        let legs = self.legs();
        let found = legs.iter().enumerate().find(|(_, leg)| {
            leg.is_meridian()
                && leg.from.0 == rel
                && (leg.from.1 * leg.to.1 < 0.0 || (leg.from.1 + leg.to.1 > 0.0) == north)
        });
        match found {
            Some((k, leg)) => {
                let lat = if north {
                    lat.clamp(0.0, FRAC_PI_2)
                } else {
                    lat.clamp(-FRAC_PI_2, 0.0)
                };
                let f = leg.fraction((rel, lat));
                self.loop_point(k, f)
            }
            None => BoundaryPoint { rel, lat, s: 0.0 },
        }
    }

    /// Boundary point at fraction `f` along lobed leg `k`.
    fn loop_point(&self, k: usize, f: f64) -> BoundaryPoint {
        let legs = self.legs();
        let (rel, lat) = legs.get(k).map_or((0.0, 0.0), |leg| leg.at(f));
        BoundaryPoint {
            rel,
            lat,
            s: (k as f64 + f).min(self.perimeter() - f64::EPSILON * 4.0).max(0.0),
        }
    }

    /// First interruption crossed on the straight frame step `a -> b`, as
    /// the (exit, entry) pair of bank points. Always `None` for regions
    /// without interruptions.
    pub fn interruption_crossing(
        &self,
        a: (f64, f64),
        b: (f64, f64),
    ) -> Option<(BoundaryPoint, BoundaryPoint)> {
        let Region::Lobed { north, south, .. } = self else {
            return None;
        };
        if a.0 == b.0 {
            return None;
        }
        let cuts = north.iter().map(|&c| (c, true)).chain(south.iter().map(|&c| (c, false)));
        let (_, c, is_north, lat) = cuts
            .filter_map(|(c, is_north)| {
                if (a.0 > c) == (b.0 > c) {
                    return None;
                }
                let t = (c - a.0) / (b.0 - a.0);
                let lat = a.1 + t * (b.1 - a.1);
                let on_cut = if is_north { lat > 0.0 } else { lat < 0.0 };
                on_cut.then_some((t, c, is_north, lat))
            })
            .min_by(|x, y| x.0.total_cmp(&y.0))?;
        let west = self.meridian_point(c, is_north, lat);
        let east = self.meridian_point(c + BANK_OFFSET, is_north, lat);
        Some(if b.0 > a.0 { (west, east) } else { (east, west) })
    }

    /// Membership of a frame point with `rel` taken at face value.
    pub fn contains(&self, rel: f64, lat: f64) -> bool {
        match *self {
            Region::Rect {
                half_width,
                lat_min,
                lat_max,
                ..
            } => rel.abs() <= half_width + EPS && lat >= lat_min - EPS && lat <= lat_max + EPS,
            Region::Cap { lon0, lat0, radius } => {
                angular_distance(lon0, lat0, lon0 + rel, lat) <= radius + EPS
            }
            Region::Lobed { .. } => rel.abs() <= PI + EPS && lat.abs() <= FRAC_PI_2 + EPS,
        }
    }

    /// Locus of an unwrapped `rel`, staying on `prev` while the point is
    /// within half a turn (plus slack) of that sheet's centre.
    pub fn locus(&self, rel: f64, lat: f64, prev: i32) -> Locus {
        let sheet = if (rel - TAU * f64::from(prev)).abs() <= PI + EPS {
            prev
        } else {
            (rel / TAU).round() as i32
        };
        let local = rel - TAU * f64::from(sheet);
        Locus {
            sheet,
            inside: self.contains(local, lat),
            local: (local, lat),
        }
    }

    /// Whether moving from `a` to `b` crosses the boundary, the seam of a
    /// wrapping region or an interruption.
    pub fn crossing(&self, a: Locus, b: Locus) -> bool {
        if a.inside != b.inside {
            return true;
        }
        if !a.inside {
            return false;
        }
        if a.sheet != b.sheet {
            return self.wraps();
        }
        self.interruption_crossing(a.local, b.local).is_some()
    }

    /// Exit and entry points for a path crossing the seam of a wrapping
    /// region at latitude `lat`, moving east when `dir > 0`.
    pub fn seam_crossing(&self, dir: i32, lat: f64) -> (BoundaryPoint, BoundaryPoint) {
        let (east, west) = match self {
            Region::Lobed { .. } => (
                self.meridian_point(PI, lat >= 0.0, lat),
                self.meridian_point(-PI, lat >= 0.0, lat),
            ),
            _ => (
                self.edge_point(Edge::Right, PI, lat),
                self.edge_point(Edge::Left, -PI, lat),
            ),
        };
        if dir > 0 {
            (east, west)
        } else {
            (west, east)
        }
    }

    /// Boundary point between an inside and an outside frame point, both
    /// given as local `rel` on the inside point's sheet.
    pub fn snap(&self, inside: (f64, f64), outside: (f64, f64)) -> BoundaryPoint {
        match *self {
            Region::Rect {
                half_width: w,
                lat_min,
                lat_max,
                ..
            } => {
                let (rel, lat) = inside;
                let candidates = [
                    (Edge::Right, outside.0 > w + EPS, w - rel),
                    (Edge::Left, outside.0 < -w - EPS, rel + w),
                    (Edge::Top, outside.1 > lat_max + EPS, lat_max - lat),
                    (Edge::Bottom, outside.1 < lat_min - EPS, lat - lat_min),
                ];
                let any_violated = candidates.iter().any(|c| c.1);
                let edge = candidates
                    .iter()
                    .filter(|c| c.1 || !any_violated)
                    .min_by(|a, b| a.2.total_cmp(&b.2))
                    .map_or(Edge::Right, |c| c.0);
                self.edge_point(edge, rel, lat)
            }
            Region::Cap { lon0, lat0, radius } => {
                let from = if angular_distance(lon0, lat0, lon0 + inside.0, inside.1) < 1e-12 {
                    outside
                } else {
                    inside
                };
                let bearing = azimuth(lon0, lat0, lon0 + from.0, from.1);
                let (lon, lat) = destination(lon0, lat0, bearing, radius);
                BoundaryPoint {
                    rel: wrap_pi(lon - lon0),
                    lat,
                    s: (-bearing).rem_euclid(TAU) / TAU,
                }
            }
            Region::Lobed { .. } => {
                let legs = self.legs();
                let dist2 = |leg: &Leg| {
                    let (rel, lat) = leg.at(leg.fraction(inside));
                    (rel - inside.0).powi(2) + (lat - inside.1).powi(2)
                };
                let nearest = legs
                    .iter()
                    .enumerate()
                    .min_by(|a, b| dist2(a.1).total_cmp(&dist2(b.1)));
                match nearest {
                    Some((k, leg)) => self.loop_point(k, leg.fraction(inside)),
                    None => BoundaryPoint {
                        rel: inside.0,
                        lat: inside.1,
                        s: 0.0,
                    },
                }
            }
        }
    }

    fn edge_point(&self, edge: Edge, rel: f64, lat: f64) -> BoundaryPoint {
        let Region::Rect {
            half_width: w,
            lat_min,
            lat_max,
            ..
        } = *self
        else {
            return BoundaryPoint { rel, lat, s: 0.0 };
        };
        let rel = rel.clamp(-w, w);
        let lat = lat.clamp(lat_min, lat_max);
        let height = lat_max - lat_min;
        let (rel, lat, s) = match edge {
            Edge::Bottom => (rel, lat_min, (rel + w) / (2.0 * w)),
            Edge::Right => (w, lat, 1.0 + (lat - lat_min) / height),
            Edge::Top => (rel, lat_max, 2.0 + (w - rel) / (2.0 * w)),
            Edge::Left => (-w, lat, 3.0 + (lat_max - lat) / height),
        };
        BoundaryPoint {
            rel,
            lat,
            s: s.min(self.perimeter() - f64::EPSILON * 4.0).max(0.0),
        }
    }

    /// Frame (rel, lat) at loop position `s` (taken modulo the perimeter).
    pub fn point_at(&self, s: f64) -> (f64, f64) {
        let s = s.rem_euclid(self.perimeter());
        match self {
            Region::Rect {
                half_width: w,
                lat_min,
                lat_max,
                ..
            } => {
                let (w, lat_min, lat_max) = (*w, *lat_min, *lat_max);
                let edge = (s.floor() as usize).min(3);
                let f = s - edge as f64;
                let height = lat_max - lat_min;
                match edge {
                    0 => (-w + 2.0 * w * f, lat_min),
                    1 => (w, lat_min + f * height),
                    2 => (w - 2.0 * w * f, lat_max),
                    _ => (-w, lat_max - f * height),
                }
            }
            Region::Cap { lon0, lat0, radius } => {
                let (lon, lat) = destination(*lon0, *lat0, -TAU * s, *radius);
                (wrap_pi(lon - lon0), lat)
            }
            Region::Lobed { .. } => {
                let legs = self.legs();
                let k = (s.floor() as usize).min(legs.len().saturating_sub(1));
                legs.get(k).map_or((0.0, 0.0), |leg| leg.at(s - k as f64))
            }
        }
    }

    fn loop_samples(&self) -> usize {
        match self {
            Region::Rect { .. } => 4 * EDGE_SAMPLES,
            Region::Cap { .. } => CAP_SAMPLES,
            Region::Lobed { .. } => self.perimeter() as usize * EDGE_SAMPLES,
        }
    }

    /// Boundary samples strictly between `from` and `from + span`, walking
    /// counter-clockwise. Samples fall on a fixed grid so that walks over the
    /// same stretch of boundary agree.
    pub fn walk(&self, from: f64, span: f64) -> Vec<(f64, f64)> {
        let step = self.perimeter() / self.loop_samples() as f64;
        let to = from + span;
        let mut out = Vec::new();
        let mut j = (from / step).floor() as i64 + 1;
        loop {
            let g = j as f64 * step;
            if g >= to - 1e-12 {
                break;
            }
            if g > from + 1e-12 {
                out.push(self.point_at(g));
            }
            j += 1;
        }
        out
    }

    /// The full boundary loop, starting at position 0, not closed.
    pub fn outline(&self) -> Vec<(f64, f64)> {
        let n = self.loop_samples();
        let step = self.perimeter() / n as f64;
        (0..n).map(|j| self.point_at(j as f64 * step)).collect()
    }
}

/// Where the projected image of a CRS breaks.
#[derive(Clone, Debug, PartialEq)]
pub enum Discontinuity {
    /// Bounded region with no interior seam.
    None,
    /// The image wraps at this frame longitude, in degrees.
    Antimeridian { longitude: f64 },
    /// The image wraps at `longitude` and is also cut along the `north`
    /// meridians from the north pole to the equator and along the `south`
    /// meridians from the south pole to the equator. All in degrees.
    Interrupted {
        longitude: f64,
        north: Vec<f64>,
        south: Vec<f64>,
    },
}

/// Projected extent of a CRS plus the region it was sampled from.
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    x_limits: (f64, f64),
    y_limits: (f64, f64),
    discontinuity: Discontinuity,
    region: Region,
}

impl Domain {
    /// Sample the projected outline of `region` through `forward`, which maps
    /// frame (rel, lat) to (x, y) or `None` where the image is undefined.
    pub(crate) fn sample(
        region: Region,
        forward: impl Fn(f64, f64) -> Option<(f64, f64)>,
    ) -> Self {
        let mut x_limits = (f64::INFINITY, f64::NEG_INFINITY);
        let mut y_limits = (f64::INFINITY, f64::NEG_INFINITY);
        for (x, y) in region
            .outline()
            .into_iter()
            .chain(std::iter::once(region.centre()))
            .filter_map(|(rel, lat)| forward(rel, lat))
        {
            x_limits = (x_limits.0.min(x), x_limits.1.max(x));
            y_limits = (y_limits.0.min(y), y_limits.1.max(y));
        }
        let longitude = wrap_pi(region.lon0() + PI).to_degrees();
        let discontinuity = match &region {
            Region::Lobed { lon0, north, south } => {
                let degrees = |cuts: &[f64]| -> Vec<f64> { cuts.iter().map(|c| wrap_pi(lon0 + c).to_degrees()).collect() };
                Discontinuity::Interrupted {
                    longitude,
                    north: degrees(north),
                    south: degrees(south),
                }
            }
            r if r.wraps() => Discontinuity::Antimeridian { longitude },
            _ => Discontinuity::None,
        };
        Self {
            x_limits,
            y_limits,
            discontinuity,
            region,
        }
    }

    pub fn x_limits(&self) -> (f64, f64) {
        self.x_limits
    }

    pub fn y_limits(&self) -> (f64, f64) {
        self.y_limits
    }

    pub fn discontinuity(&self) -> &Discontinuity {
        &self.discontinuity
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Default densification tolerance: a thousandth of the smaller extent.
    pub fn threshold(&self) -> f64 {
        let width = self.x_limits.1 - self.x_limits.0;
        let height = self.y_limits.1 - self.y_limits.0;
        width.min(height) / 1000.0
    }
}

/// Whether the straight source-space segment `p1 -> p2` crosses the target
/// discontinuity or region boundary. Endpoints without a geographic image
/// report no crossing.
pub fn crosses_discontinuity(transformer: &Transformer, p1: (f64, f64), p2: (f64, f64)) -> bool {
    let tracer = Tracer::new(transformer, DEFAULT_SAMPLES_PER_SEGMENT);
    !trace_path(&tracer, &[(0, p1), (1, p2)], false)
        .crossings
        .is_empty()
}

/// First point along `p1 -> p2` where the segment must be cut, in source
/// coordinates, or `None` if the segment stays on one side.
pub fn split_point(
    transformer: &Transformer,
    p1: (f64, f64),
    p2: (f64, f64),
) -> Option<Coordinate> {
    let tracer = Tracer::new(transformer, DEFAULT_SAMPLES_PER_SEGMENT);
    let trace = trace_path(&tracer, &[(0, p1), (1, p2)], false);
    let crossing = trace.crossings.first()?;
    let target = transformer.target();
    let (rel, lat) = crossing.point;
    let (lon_f, lat_f) = (target.region().lon0() + rel, lat);
    let (lon, lat) = target.frame_to_geo(lon_f, lat_f);
    let (x, y) = transformer
        .source()
        .from_geographic(lon, lat)
        .unwrap_or_else(|_| {
            let t = crossing.t;
            (p1.0 + t * (p2.0 - p1.0), p1.1 + t * (p2.1 - p1.1))
        });
    Some(Coordinate::new(x, y, transformer.source().spec().clone()))
}
