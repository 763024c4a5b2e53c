//! Coordinate and shape value types over `geo-types` primitives.

use std::sync::Arc;

use geo::{Area, Contains};
use geo_types::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};

use crate::error::ReprojectError;
use crate::spec::ProjectionSpec;

/// An (x, y) pair tagged with the projection it is expressed in.
#[derive(Clone, Debug, PartialEq)]
pub struct Coordinate {
    coord: Coord<f64>,
    spec: Arc<ProjectionSpec>,
}

impl Coordinate {
    pub fn new(x: f64, y: f64, spec: Arc<ProjectionSpec>) -> Self {
        Self {
            coord: Coord { x, y },
            spec,
        }
    }

    pub fn x(&self) -> f64 {
        self.coord.x
    }

    pub fn y(&self) -> f64 {
        self.coord.y
    }

    pub fn xy(&self) -> (f64, f64) {
        self.coord.x_y()
    }

    pub fn coord(&self) -> Coord<f64> {
        self.coord
    }

    pub fn spec(&self) -> &Arc<ProjectionSpec> {
        &self.spec
    }
}

/// Geometry tree. Polygon rings follow `geo-types` conventions: closed, with
/// the first coordinate repeated at the end.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    Polygon(Polygon<f64>),
    Multi(Vec<Geometry>),
}

impl Geometry {
    /// An empty collection, the shape of a result with no valid parts.
    pub fn empty() -> Self {
        Geometry::Multi(Vec::new())
    }

    /// Number of leaf parts.
    pub fn part_count(&self) -> usize {
        match self {
            Geometry::Multi(members) => members.iter().map(Geometry::part_count).sum(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.part_count() == 0
    }

    /// Leaf parts in order.
    pub fn parts(&self) -> Vec<Leaf<'_>> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<Leaf<'a>>) {
        match self {
            Geometry::Point(p) => out.push(Leaf::Point(p)),
            Geometry::LineString(ls) => out.push(Leaf::LineString(ls)),
            Geometry::Polygon(p) => out.push(Leaf::Polygon(p)),
            Geometry::Multi(members) => members.iter().for_each(|m| m.collect_leaves(out)),
        }
    }

    /// Total vertex count; closing coordinates of rings are not counted.
    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::LineString(ls) => ls.0.len(),
            Geometry::Polygon(p) => std::iter::once(p.exterior())
                .chain(p.interiors())
                .map(|r| open_ring(r).len())
                .sum(),
            Geometry::Multi(members) => members.iter().map(Geometry::vertex_count).sum(),
        }
    }

    /// Enclosed planar area of all polygon parts, holes subtracted.
    pub fn area(&self) -> f64 {
        match self {
            Geometry::Polygon(p) => p.unsigned_area(),
            Geometry::Multi(members) => members.iter().map(Geometry::area).sum(),
            _ => 0.0,
        }
    }

    /// Reject structurally malformed input.
    pub fn validate(&self) -> Result<(), ReprojectError> {
        match self {
            Geometry::Point(p) => check_finite(std::iter::once(p.0)),
            Geometry::LineString(ls) => {
                check_finite(ls.0.iter().copied())?;
                let pts: Vec<(f64, f64)> = ls.0.iter().map(|c| c.x_y()).collect();
                let distinct = distinct_count(&pts);
                if distinct < 2 {
                    return Err(ReprojectError::InvalidGeometry(format!(
                        "line string needs at least 2 distinct vertices, got {distinct}"
                    )));
                }
                Ok(())
            }
            Geometry::Polygon(p) => {
                for ring in std::iter::once(p.exterior()).chain(p.interiors()) {
                    check_finite(ring.0.iter().copied())?;
                    let distinct = distinct_count(&open_ring(ring));
                    if distinct < 3 {
                        return Err(ReprojectError::InvalidGeometry(format!(
                            "polygon ring needs at least 3 distinct vertices, got {distinct}"
                        )));
                    }
                }
                Ok(())
            }
            Geometry::Multi(members) => members.iter().try_for_each(Geometry::validate),
        }
    }
}

impl From<Point<f64>> for Geometry {
    fn from(p: Point<f64>) -> Self {
        Geometry::Point(p)
    }
}

impl From<LineString<f64>> for Geometry {
    fn from(ls: LineString<f64>) -> Self {
        Geometry::LineString(ls)
    }
}

impl From<Polygon<f64>> for Geometry {
    fn from(p: Polygon<f64>) -> Self {
        Geometry::Polygon(p)
    }
}

impl From<MultiPoint<f64>> for Geometry {
    fn from(mp: MultiPoint<f64>) -> Self {
        Geometry::Multi(mp.0.into_iter().map(Geometry::Point).collect())
    }
}

impl From<MultiLineString<f64>> for Geometry {
    fn from(mls: MultiLineString<f64>) -> Self {
        Geometry::Multi(mls.0.into_iter().map(Geometry::LineString).collect())
    }
}

impl From<MultiPolygon<f64>> for Geometry {
    fn from(mp: MultiPolygon<f64>) -> Self {
        Geometry::Multi(mp.0.into_iter().map(Geometry::Polygon).collect())
    }
}

/// A leaf of the geometry tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Leaf<'a> {
    Point(&'a Point<f64>),
    LineString(&'a LineString<f64>),
    Polygon(&'a Polygon<f64>),
}

/// A geometry together with the single projection all its coordinates are
/// expressed in.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    geometry: Geometry,
    spec: Arc<ProjectionSpec>,
}

impl Shape {
    pub fn new(geometry: impl Into<Geometry>, spec: Arc<ProjectionSpec>) -> Self {
        Self {
            geometry: geometry.into(),
            spec,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn spec(&self) -> &Arc<ProjectionSpec> {
        &self.spec
    }

    pub fn into_geometry(self) -> Geometry {
        self.geometry
    }
}

/// Ring vertices without the closing repeat.
pub(crate) fn open_ring(ring: &LineString<f64>) -> Vec<(f64, f64)> {
    let mut pts: Vec<(f64, f64)> = ring.0.iter().map(|c| c.x_y()).collect();
    if pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    pts
}

/// Polygon over an open ring of vertices.
pub(crate) fn ring_polygon(ring: &[(f64, f64)]) -> Polygon<f64> {
    Polygon::new(LineString::from(ring.to_vec()), Vec::new())
}

/// Shoelace area of an open ring; positive for counter-clockwise rings.
pub(crate) fn signed_area(ring: &[(f64, f64)]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    ring_polygon(ring).signed_area()
}

/// Whether `pt` lies strictly inside the open ring.
pub(crate) fn point_in_ring(pt: (f64, f64), ring: &[(f64, f64)]) -> bool {
    ring.len() >= 3 && ring_polygon(ring).contains(&Coord::from(pt))
}

fn check_finite(coords: impl Iterator<Item = Coord<f64>>) -> Result<(), ReprojectError> {
    for c in coords {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(ReprojectError::InvalidGeometry(format!(
                "non-finite coordinate ({}, {})",
                c.x, c.y
            )));
        }
    }
    Ok(())
}

fn distinct_count(pts: &[(f64, f64)]) -> usize {
    let mut keys: Vec<(u64, u64)> = pts
        .iter()
        .map(|&(x, y)| ((x + 0.0).to_bits(), (y + 0.0).to_bits()))
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{line_string, point, polygon};

    #[test]
    fn test_signed_area_orientation() {
        let ccw = [(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0)];
        assert_relative_eq!(signed_area(&ccw), 2.0);
        let cw: Vec<_> = ccw.iter().rev().copied().collect();
        assert_relative_eq!(signed_area(&cw), -2.0);
    }

    #[test]
    fn test_point_in_ring() {
        let sq = [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        assert!(point_in_ring((1.0, 1.0), &sq));
        assert!(!point_in_ring((3.0, 1.0), &sq));
        assert!(!point_in_ring((2.0, 1.0), &sq));
        assert!(!point_in_ring((0.5, 0.5), &sq[..2]));
    }

    #[test]
    fn test_area_subtracts_holes() {
        let poly = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 1.0, y: 2.0), (x: 2.0, y: 2.0), (x: 2.0, y: 1.0)]]
        );
        let g = Geometry::from(poly);
        assert_relative_eq!(g.area(), 15.0);
        assert_eq!(g.vertex_count(), 8);
    }

    #[test]
    fn test_validate_rejects_malformed() {
        let short = Geometry::from(line_string![(x: 0.0, y: 0.0)]);
        assert!(matches!(short.validate(), Err(ReprojectError::InvalidGeometry(_))));

        let stutter = Geometry::from(line_string![(x: 10.0, y: 10.0), (x: 10.0, y: 10.0)]);
        assert!(matches!(stutter.validate(), Err(ReprojectError::InvalidGeometry(_))));
        let signed_zero = Geometry::from(line_string![(x: 0.0, y: 1.0), (x: -0.0, y: 1.0)]);
        assert!(matches!(signed_zero.validate(), Err(ReprojectError::InvalidGeometry(_))));
        let back_and_forth =
            Geometry::from(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 0.0, y: 0.0)]);
        assert!(back_and_forth.validate().is_ok());

        let sliver = Geometry::from(polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 0.0, y: 0.0)]);
        assert!(matches!(sliver.validate(), Err(ReprojectError::InvalidGeometry(_))));

        let nan = Geometry::from(point!(x: f64::NAN, y: 0.0));
        assert!(matches!(nan.validate(), Err(ReprojectError::InvalidGeometry(_))));

        assert!(Geometry::empty().validate().is_ok());
    }

    #[test]
    fn test_parts_flatten_nested_multi() {
        let g = Geometry::Multi(vec![
            Geometry::from(point!(x: 0.0, y: 0.0)),
            Geometry::Multi(vec![Geometry::from(point!(x: 1.0, y: 1.0))]),
        ]);
        assert_eq!(g.part_count(), 2);
        let parts = g.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1], Leaf::Point(&point!(x: 1.0, y: 1.0)));
        assert!(Geometry::empty().is_empty());
        assert!(Geometry::empty().parts().is_empty());
    }
}
