//! Adaptive densification of traced chains.
//!
//! Between two consecutive points that come from the same source segment,
//! the exact image of the segment midpoint is compared with the straight
//! line between the projected endpoints. Segments whose midpoint deviates by
//! more than the tolerance are split and both halves examined again.

use crate::reproject::trace::{continue_rel, lerp, Chain, Origin, PathPoint, Tracer};

/// Deepest subdivision of a single traced segment.
const MAX_DEPTH: usize = 20;

/// Chain densifier using recursive midpoint subdivision.
pub(crate) struct Densifier<'t, 'a> {
    tracer: &'t Tracer<'a>,
    /// Maximum allowed deviation in target units.
    tolerance: f64,
    vertices: &'t [(usize, (f64, f64))],
    closed: bool,
}

impl<'t, 'a> Densifier<'t, 'a> {
    pub(crate) fn new(
        tracer: &'t Tracer<'a>,
        tolerance: f64,
        vertices: &'t [(usize, (f64, f64))],
        closed: bool,
    ) -> Self {
        Self {
            tracer,
            tolerance,
            vertices,
            closed,
        }
    }

    pub(crate) fn densify(&self, chain: &mut Chain) {
        if chain.points.len() < 2 || !(self.tolerance > 0.0) {
            return;
        }
        let mut out = Vec::with_capacity(chain.points.len());
        out.push(chain.points[0]);
        for pair in chain.points.windows(2) {
            let (p, q) = (pair[0], pair[1]);
            if let Some((seg, t0, t1)) = self.span(&p, &q) {
                self.subdivide(seg, &p, t0, &q, t1, 0, &mut out);
            }
            out.push(q);
        }
        chain.points = out;
    }

    /// Densify a ring, including the segment that closes it.
    pub(crate) fn densify_ring(&self, chain: &mut Chain) {
        let Some(&first) = chain.points.first() else {
            return;
        };
        chain.points.push(first);
        self.densify(chain);
        chain.points.pop();
    }

    /// Segment and parameter range joining `p` to `q`, when both lie on one
    /// source segment.
    fn span(&self, p: &PathPoint, q: &PathPoint) -> Option<(usize, f64, f64)> {
        let (a, b) = (p.origin?, q.origin?);
        if a.seg == b.seg && b.t > a.t {
            return Some((a.seg, a.t, b.t));
        }
        if b.t == 0.0 && b.seg == self.seg_end(a.seg) {
            return Some((a.seg, a.t, 1.0));
        }
        None
    }

    fn seg_end(&self, seg: usize) -> usize {
        if self.closed {
            (seg + 1) % self.vertices.len()
        } else {
            seg + 1
        }
    }

    /// Insert into `out` the points needed strictly between `p` and `q`.
    #[allow(clippy::too_many_arguments)]
    fn subdivide(
        &self,
        seg: usize,
        p: &PathPoint,
        t0: f64,
        q: &PathPoint,
        t1: f64,
        depth: usize,
        out: &mut Vec<PathPoint>,
    ) {
        if depth >= MAX_DEPTH {
            return;
        }
        let t = 0.5 * (t0 + t1);
        let Some(mid) = self.point(seg, t, p) else {
            return;
        };

        // Deviation of the exact midpoint from the chord
        let err_x = (mid.xy.0 - 0.5 * (p.xy.0 + q.xy.0)).abs();
        let err_y = (mid.xy.1 - 0.5 * (p.xy.1 + q.xy.1)).abs();
        if err_x.max(err_y) <= self.tolerance {
            return;
        }

        self.subdivide(seg, p, t0, &mid, t, depth + 1, out);
        out.push(mid);
        self.subdivide(seg, &mid, t, q, t1, depth + 1, out);
    }

    /// Projected point at parameter `t` of segment `seg`, continued onto the
    /// sheet of `near`.
    fn point(&self, seg: usize, t: f64, near: &PathPoint) -> Option<PathPoint> {
        let a = self.vertices[seg].1;
        let b = self.vertices[self.seg_end(seg)].1;
        let (raw, lat) = self.tracer.node(lerp(a, b, t)).ok()?;
        let rel = continue_rel(near.frame.0, raw, lat);
        if !self.tracer.region().contains(rel, lat) {
            return None;
        }
        let xy = self.tracer.forward(rel, lat).ok()?;
        Some(PathPoint {
            xy,
            frame: (rel, lat),
            origin: Some(Origin {
                key: self.vertices[seg].0,
                seg,
                t,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::reproject::trace::trace_path;
    use crate::transform::Transformer;

    fn plate_carree_to_orthographic(reg: &Registry) -> Transformer {
        let src = reg.instance::<&str>("PlateCarree", &[]).unwrap();
        let dst = reg.instance::<&str>("Orthographic", &[]).unwrap();
        Transformer::new(reg, &src, &dst).unwrap()
    }

    #[test]
    fn test_curved_segment_gains_points() {
        let reg = Registry::with_builtins();
        let t = plate_carree_to_orthographic(&reg);
        let tracer = Tracer::new(&t, 1);
        let line = [(0, (0.0, -60.0)), (1, (60.0, 60.0))];
        let trace = trace_path(&tracer, &line, false);
        let mut chain = trace.chains[0].clone();
        assert_eq!(chain.points.len(), 2);

        Densifier::new(&tracer, 1_000.0, &trace.vertices, false).densify(&mut chain);
        assert!(chain.points.len() > 8);
        let ts: Vec<f64> = chain.points.iter().map(|p| p.origin.unwrap().t).collect();
        assert!(ts[1..ts.len() - 1].windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_straight_image_is_untouched() {
        let reg = Registry::with_builtins();
        let src = reg.instance::<&str>("PlateCarree", &[]).unwrap();
        let dst = reg.instance::<&str>("Mercator", &[]).unwrap();
        let t = Transformer::new(&reg, &src, &dst).unwrap();
        let tracer = Tracer::new(&t, 1);
        let trace = trace_path(&tracer, &[(0, (-60.0, 10.0)), (1, (60.0, 10.0))], false);
        let mut chain = trace.chains[0].clone();
        Densifier::new(&tracer, 1.0, &trace.vertices, false).densify(&mut chain);
        assert_eq!(chain.points.len(), 2);
    }

    #[test]
    fn test_zero_tolerance_is_a_no_op() {
        let reg = Registry::with_builtins();
        let t = plate_carree_to_orthographic(&reg);
        let tracer = Tracer::new(&t, 1);
        let trace = trace_path(&tracer, &[(0, (0.0, -60.0)), (1, (60.0, 60.0))], false);
        let mut chain = trace.chains[0].clone();
        Densifier::new(&tracer, 0.0, &trace.vertices, false).densify(&mut chain);
        assert_eq!(chain.points.len(), 2);
    }
}
