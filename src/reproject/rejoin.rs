//! Polygon reassembly.
//!
//! Each ring is traced on its own. Rings that stay inside the target region
//! come back whole. The chains of rings that cross the region boundary are
//! stitched back together by walking counter-clockwise along the boundary
//! from every chain's exit to the nearest following entry. The resulting
//! rings are sorted into shells and holes by their projected orientation.

use geo_types::{LineString, Polygon};
use log::debug;

use crate::error::ProjError;
use crate::geometry::{open_ring, point_in_ring, signed_area};
use crate::reproject::densify::Densifier;
use crate::reproject::trace::{trace_path, Chain, PathPoint, Trace, Tracer};

/// Relative tolerance below which a boundary sample is considered to lie on
/// the line through its neighbours.
const COLLINEAR_EPS: f64 = 1e-9;

/// The reprojected pieces of one source polygon.
#[derive(Debug, Default)]
pub(crate) struct PolygonParts {
    pub polygons: Vec<Polygon<f64>>,
    /// (ring, vertex, error) for source vertices without an image.
    pub dropped: Vec<(usize, usize, ProjError)>,
    pub crossings: usize,
}

/// A finished target ring.
#[derive(Debug)]
struct Piece {
    points: Vec<(f64, f64)>,
    /// (source ring, lowest source vertex) used to order the output.
    order: (usize, usize),
    /// A point that came from the source ring rather than the boundary.
    anchor: (f64, f64),
}

impl Piece {
    fn new(points: Vec<(f64, f64)>, order: (usize, usize), source: &[PathPoint]) -> Self {
        let anchor = source
            .iter()
            .find(|p| p.origin.is_some())
            .map(|p| p.xy)
            .or_else(|| points.first().copied())
            .unwrap_or((f64::NAN, f64::NAN));
        Self {
            points,
            order,
            anchor,
        }
    }

    fn contains(&self, pt: (f64, f64)) -> bool {
        point_in_ring(pt, &self.points)
    }
}

pub(crate) fn reproject_polygon(
    tracer: &Tracer<'_>,
    polygon: &Polygon<f64>,
    densify: Option<f64>,
) -> PolygonParts {
    let exterior = indexed(polygon.exterior());
    let exterior_cw = signed_area(&xy_of(&exterior)) < 0.0;
    let mut rings = vec![oriented(exterior, true)];
    rings.extend(
        polygon
            .interiors()
            .iter()
            .map(|r| oriented(indexed(r), false)),
    );

    let mut out = PolygonParts::default();
    let mut open: Vec<(usize, Chain)> = Vec::new();
    let mut pieces: Vec<Piece> = Vec::new();
    let mut exterior_closed = false;

    for (ring_idx, ring) in rings.iter().enumerate() {
        let Trace {
            vertices,
            chains,
            closed,
            dropped,
            crossings,
        } = trace_path(tracer, ring, true);
        out.crossings += crossings.len();
        out.dropped
            .extend(dropped.into_iter().map(|(v, e)| (ring_idx, v, e)));
        let densifier = densify.map(|tol| Densifier::new(tracer, tol, &vertices, true));

        if let Some(mut chain) = closed {
            if let Some(d) = &densifier {
                d.densify_ring(&mut chain);
            }
            let points = clean(&chain.points, &[]);
            if points.len() >= 3 {
                exterior_closed |= ring_idx == 0;
                pieces.push(Piece::new(points, chain_order(ring_idx, &chain), &chain.points));
            }
        }
        for mut chain in chains {
            if let Some(d) = &densifier {
                d.densify(&mut chain);
            }
            open.push((ring_idx, chain));
        }
    }

    pieces.extend(join_chains(tracer, &open));

    let (mut shells, mut holes): (Vec<Piece>, Vec<Piece>) = pieces
        .into_iter()
        .filter(|p| signed_area(&p.points) != 0.0)
        .partition(|p| signed_area(&p.points) > 0.0);
    shells.sort_by_key(|p| p.order);
    holes.sort_by_key(|p| p.order);

    let mut interiors: Vec<Vec<Piece>> = shells.iter().map(|_| Vec::new()).collect();
    let mut orphans = Vec::new();
    for hole in holes {
        match shells.iter().position(|s| s.contains(hole.anchor)) {
            Some(i) => interiors[i].push(hole),
            None => orphans.push(hole),
        }
    }

    if open.is_empty() && !exterior_closed && (!orphans.is_empty() || centre_in_source(tracer, &rings)) {
        let outline = region_outline(tracer);
        if outline.len() >= 3 {
            debug!(
                "polygon encloses the whole target region ({} holes inside)",
                orphans.len()
            );
            shells.push(Piece {
                anchor: outline[0],
                points: outline,
                order: (0, usize::MAX),
            });
            interiors.push(std::mem::take(&mut orphans));
        }
    }
    if !orphans.is_empty() {
        debug!("dropping {} holes outside every shell", orphans.len());
    }

    out.polygons = shells
        .into_iter()
        .zip(interiors)
        .map(|(shell, holes)| {
            Polygon::new(
                to_line(shell.points, exterior_cw),
                holes
                    .into_iter()
                    .map(|h| to_line(h.points, exterior_cw))
                    .collect(),
            )
        })
        .collect();
    out
}

/// Stitch boundary-crossing chains into rings.
fn join_chains(tracer: &Tracer<'_>, chains: &[(usize, Chain)]) -> Vec<Piece> {
    let region = tracer.region();
    let perimeter = region.perimeter();
    let mut used = vec![false; chains.len()];
    let mut pieces = Vec::new();

    for first in 0..chains.len() {
        if used[first] {
            continue;
        }
        let mut path: Vec<PathPoint> = Vec::new();
        let mut walked: Vec<bool> = Vec::new();
        let mut order = (usize::MAX, usize::MAX);
        let mut cur = first;

        for _ in 0..chains.len() {
            used[cur] = true;
            let (ring, chain) = &chains[cur];
            order = order.min(chain_order(*ring, chain));
            path.extend_from_slice(&chain.points);
            walked.extend(chain.points.iter().map(|_| false));

            let Some(s_out) = chain.end else {
                break;
            };
            let next = (0..chains.len())
                .filter(|&j| j == first || !used[j])
                .filter_map(|j| {
                    let s_in = chains[j].1.start?;
                    Some((j, (s_in - s_out).rem_euclid(perimeter)))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            let Some((j, span)) = next else {
                break;
            };

            for (rel, lat) in region.walk(s_out, span) {
                if let Ok(xy) = tracer.forward(rel, lat) {
                    path.push(PathPoint {
                        xy,
                        frame: (rel, lat),
                        origin: None,
                    });
                    walked.push(true);
                }
            }
            if j == first {
                break;
            }
            cur = j;
        }

        let points = clean(&path, &walked);
        if points.len() >= 3 {
            pieces.push(Piece::new(points, order, &path));
        }
    }
    pieces
}

/// Ring coordinates with repeated points removed. Points flagged in
/// `walked` are boundary samples and are also removed when they add
/// nothing to the outline.
fn clean(path: &[PathPoint], walked: &[bool]) -> Vec<(f64, f64)> {
    let n = path.len();
    let mut kept: Vec<(f64, f64)> = Vec::with_capacity(n);
    for i in 0..n {
        let b = path[i].xy;
        let prev = kept.last().copied().unwrap_or(path[(i + n - 1) % n].xy);
        if b == prev && i > 0 {
            continue;
        }
        if walked.get(i).copied().unwrap_or(false) {
            let c = path[(i + 1) % n].xy;
            if b == prev || collinear(prev, b, c) {
                continue;
            }
        }
        kept.push(b);
    }
    while kept.len() > 1 && kept.first() == kept.last() {
        kept.pop();
    }
    kept
}

fn collinear(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> bool {
    let ab = (b.0 - a.0, b.1 - a.1);
    let bc = (c.0 - b.0, c.1 - b.1);
    let cross = ab.0 * bc.1 - ab.1 * bc.0;
    cross.abs() <= COLLINEAR_EPS * ab.0.hypot(ab.1) * bc.0.hypot(bc.1)
}

fn chain_order(ring: usize, chain: &Chain) -> (usize, usize) {
    let key = chain
        .points
        .iter()
        .filter_map(|p| p.origin.map(|o| o.key))
        .min()
        .unwrap_or(usize::MAX);
    (ring, key)
}

/// Whether the target region's centre falls inside the source polygon.
fn centre_in_source(tracer: &Tracer<'_>, rings: &[Vec<(usize, (f64, f64))>]) -> bool {
    let transformer = tracer.transformer();
    let region = tracer.region();
    let (rel, lat) = region.centre();
    let (lon, lat) = transformer.target().frame_to_geo(region.lon0() + rel, lat);
    let Ok(pt) = transformer.source().from_geographic(lon, lat) else {
        return false;
    };
    let mut rings = rings.iter().map(|r| xy_of(r));
    let in_exterior = rings.next().is_some_and(|r| point_in_ring(pt, &r));
    in_exterior && !rings.any(|r| point_in_ring(pt, &r))
}

fn region_outline(tracer: &Tracer<'_>) -> Vec<(f64, f64)> {
    let path: Vec<PathPoint> = tracer
        .region()
        .outline()
        .into_iter()
        .filter_map(|(rel, lat)| {
            tracer.forward(rel, lat).ok().map(|xy| PathPoint {
                xy,
                frame: (rel, lat),
                origin: None,
            })
        })
        .collect();
    let walked = vec![true; path.len()];
    clean(&path, &walked)
}

fn indexed(ring: &LineString<f64>) -> Vec<(usize, (f64, f64))> {
    open_ring(ring).into_iter().enumerate().collect()
}

fn xy_of(ring: &[(usize, (f64, f64))]) -> Vec<(f64, f64)> {
    ring.iter().map(|&(_, xy)| xy).collect()
}

/// Counter-clockwise when `ccw`, clockwise otherwise. Vertex indices travel
/// with their coordinates.
fn oriented(mut ring: Vec<(usize, (f64, f64))>, ccw: bool) -> Vec<(usize, (f64, f64))> {
    if (signed_area(&xy_of(&ring)) > 0.0) != ccw {
        ring.reverse();
    }
    ring
}

fn to_line(mut points: Vec<(f64, f64)>, reverse: bool) -> LineString<f64> {
    if reverse {
        points.reverse();
    }
    LineString::from(points)
}
