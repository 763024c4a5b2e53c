//! Whole-geometry reprojection.
//!
//! Points go straight through the [`Transformer`]. Lines and polygon rings
//! are traced against the target region (see [`trace`]), cut where they
//! leave it, and polygons are reassembled along the region boundary (see
//! [`rejoin`]).

pub(crate) mod densify;
pub(crate) mod rejoin;
pub(crate) mod trace;

use std::sync::Arc;

use geo_types::{LineString, Point, Polygon};
use log::debug;

use crate::error::{ProjError, ReprojectError};
use crate::geometry::{open_ring, Coordinate, Geometry, Leaf, Shape};
use crate::registry::Registry;
use crate::spec::ProjectionSpec;
use crate::transform::Transformer;

use densify::Densifier;
use rejoin::reproject_polygon;
use trace::{trace_path, Tracer};

/// Source-space samples taken along every segment when looking for
/// boundary crossings.
pub const DEFAULT_SAMPLES_PER_SEGMENT: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReprojectOptions {
    /// Maximum deviation, in target units, between a projected segment and
    /// the image of the source segment. `None` keeps only original vertices
    /// and boundary points.
    pub densify: Option<f64>,
    pub samples_per_segment: usize,
}

impl Default for ReprojectOptions {
    fn default() -> Self {
        Self {
            densify: None,
            samples_per_segment: DEFAULT_SAMPLES_PER_SEGMENT,
        }
    }
}

/// How faithfully the output represents the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Every vertex was projected and nothing was cut.
    Exact,
    /// The geometry was cut at the target's discontinuity or boundary.
    Split,
    /// Some source vertices have no image in the target.
    Partial,
    /// Nothing of a non-empty input survived.
    Empty,
}

/// A source vertex left out of the output.
#[derive(Clone, Debug, PartialEq)]
pub struct DroppedVertex {
    /// Index of the leaf part in the flattened input.
    pub part: usize,
    /// Ring within a polygon (0 is the exterior); 0 for points and lines.
    pub ring: usize,
    pub vertex: usize,
    pub coordinate: Coordinate,
    pub error: ProjError,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransformResult {
    pub shape: Shape,
    pub status: Status,
    pub dropped: Vec<DroppedVertex>,
}

/// Reproject `shape` into `target` with default options.
pub fn reproject(
    registry: &Registry,
    shape: &Shape,
    target: &ProjectionSpec,
) -> Result<TransformResult, ReprojectError> {
    reproject_with(registry, shape, target, &ReprojectOptions::default())
}

pub fn reproject_with(
    registry: &Registry,
    shape: &Shape,
    target: &ProjectionSpec,
    options: &ReprojectOptions,
) -> Result<TransformResult, ReprojectError> {
    shape.geometry().validate()?;
    let transformer = Transformer::new(registry, shape.spec(), target)?;
    let target_spec = Arc::clone(transformer.target().spec());

    if transformer.is_identity() {
        return Ok(TransformResult {
            shape: Shape::new(shape.geometry().clone(), target_spec),
            status: Status::Exact,
            dropped: Vec::new(),
        });
    }

    let tracer = Tracer::new(&transformer, options.samples_per_segment);
    let mut job = Job {
        tracer: &tracer,
        options,
        source: shape.spec(),
        dropped: Vec::new(),
        crossings: 0,
    };

    let leaves = shape.geometry().parts();
    let input_parts = leaves.len();
    let mut outputs: Vec<Geometry> = Vec::new();
    for (part, leaf) in leaves.into_iter().enumerate() {
        outputs.extend(job.leaf(part, leaf));
    }

    let status = if outputs.is_empty() && input_parts > 0 {
        Status::Empty
    } else if !job.dropped.is_empty() {
        Status::Partial
    } else if job.crossings > 0 || outputs.len() > input_parts {
        Status::Split
    } else {
        Status::Exact
    };
    debug!(
        "reprojected {} part(s) from {} to {}: {} part(s) out, {} vertices dropped, {} boundary points, {status:?}",
        input_parts,
        shape.spec(),
        target_spec,
        outputs.len(),
        job.dropped.len(),
        job.crossings
    );

    let geometry = match (shape.geometry(), outputs.len()) {
        (Geometry::Multi(_), _) => Geometry::Multi(outputs),
        (_, 1) => outputs.remove(0),
        _ => Geometry::Multi(outputs),
    };
    Ok(TransformResult {
        shape: Shape::new(geometry, target_spec),
        status,
        dropped: job.dropped,
    })
}

/// Per-call state shared by every leaf of one geometry.
struct Job<'t, 'a> {
    tracer: &'t Tracer<'a>,
    options: &'t ReprojectOptions,
    source: &'t Arc<ProjectionSpec>,
    dropped: Vec<DroppedVertex>,
    crossings: usize,
}

impl Job<'_, '_> {
    fn leaf(&mut self, part: usize, leaf: Leaf<'_>) -> Vec<Geometry> {
        match leaf {
            Leaf::Point(p) => self.point(part, p).into_iter().collect(),
            Leaf::LineString(ls) => self.line(part, ls),
            Leaf::Polygon(poly) => self.polygon(part, poly),
        }
    }

    fn drop_vertex(&mut self, part: usize, ring: usize, vertex: usize, xy: (f64, f64), error: ProjError) {
        self.dropped.push(DroppedVertex {
            part,
            ring,
            vertex,
            coordinate: Coordinate::new(xy.0, xy.1, Arc::clone(self.source)),
            error,
        });
    }

    fn point(&mut self, part: usize, p: &Point<f64>) -> Option<Geometry> {
        match self.tracer.transformer().project_xy(p.x(), p.y()) {
            Ok((x, y)) => Some(Geometry::Point(Point::new(x, y))),
            Err(e) => {
                self.drop_vertex(part, 0, 0, p.x_y(), e);
                None
            }
        }
    }

    fn line(&mut self, part: usize, ls: &LineString<f64>) -> Vec<Geometry> {
        let vertices: Vec<(usize, (f64, f64))> =
            ls.0.iter().map(|c| c.x_y()).enumerate().collect();
        let trace = trace_path(self.tracer, &vertices, false);
        self.crossings += trace.crossings.len();
        for (v, e) in trace.dropped {
            self.drop_vertex(part, 0, v, vertices[v].1, e);
        }

        let densifier = self
            .options
            .densify
            .map(|tol| Densifier::new(self.tracer, tol, &trace.vertices, false));
        trace
            .chains
            .into_iter()
            .filter_map(|mut chain| {
                if let Some(d) = &densifier {
                    d.densify(&mut chain);
                }
                let mut xy: Vec<(f64, f64)> = chain.points.iter().map(|p| p.xy).collect();
                xy.dedup();
                (xy.len() >= 2).then(|| Geometry::LineString(LineString::from(xy)))
            })
            .collect()
    }

    fn polygon(&mut self, part: usize, poly: &Polygon<f64>) -> Vec<Geometry> {
        let rings: Vec<Vec<(f64, f64)>> = std::iter::once(poly.exterior())
            .chain(poly.interiors())
            .map(open_ring)
            .collect();
        let parts = reproject_polygon(self.tracer, poly, self.options.densify);
        self.crossings += parts.crossings;
        for (ring, v, e) in parts.dropped {
            self.drop_vertex(part, ring, v, rings[ring][v], e);
        }
        parts.polygons.into_iter().map(Geometry::Polygon).collect()
    }
}
