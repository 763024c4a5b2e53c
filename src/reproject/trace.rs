//! Path tracing against the target region.
//!
//! Every source segment is sampled at a fixed count in source space. Each
//! sample is mapped into the target frame and its longitude unwrapped along
//! the path, so a path that walks across the target's seam shows up as a
//! change of sheet. A change of locus between two samples is located by
//! bisection and turned into boundary events that cut the path into
//! chains lying inside the region.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use log::trace;

use crate::domain::{BoundaryPoint, Locus, Region};
use crate::error::ProjError;
use crate::proj::common::wrap_pi;
use crate::transform::Transformer;

/// Bisection steps per located crossing.
const BISECT_STEPS: usize = 60;

/// Upper bound on crossings located between two adjacent samples.
const MAX_EVENTS_PER_STEP: usize = 8;

/// Latitude beyond which a frame longitude carries no information.
const POLE_EPS: f64 = 1e-12;

/// Where a traced point came from: the segment starting at vertex `seg` of
/// the traced vertex list, at parameter `t`. `key` is the caller's index of
/// that starting vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Origin {
    pub key: usize,
    pub seg: usize,
    pub t: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PathPoint {
    pub xy: (f64, f64),
    /// Frame (rel, lat) with `rel` local to the sheet the point was reached on.
    pub frame: (f64, f64),
    /// `None` for points added along the region boundary.
    pub origin: Option<Origin>,
}

/// A maximal inside stretch of a path. `start`/`end` hold boundary loop
/// positions when the chain begins or ends on the region boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Chain {
    pub points: Vec<PathPoint>,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Crossing {
    pub seg: usize,
    pub t: f64,
    /// Frame (rel, lat) of the first boundary point of the crossing.
    pub point: (f64, f64),
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Trace {
    /// Vertices the segment indices refer to. For rings this excludes
    /// vertices that have no geographic image.
    pub vertices: Vec<(usize, (f64, f64))>,
    pub chains: Vec<Chain>,
    /// A ring lying wholly inside the region.
    pub closed: Option<Chain>,
    pub dropped: Vec<(usize, ProjError)>,
    pub crossings: Vec<Crossing>,
}

/// Maps source points into the target frame for one transformer.
pub(crate) struct Tracer<'a> {
    transformer: &'a Transformer,
    samples: usize,
}

#[derive(Clone, Copy, Debug)]
struct Sample {
    seg: usize,
    t: f64,
    rel: f64,
    lat: f64,
    vertex: Option<usize>,
}

#[derive(Clone, Copy, Debug)]
struct State {
    t: f64,
    rel: f64,
    lat: f64,
    locus: Locus,
}

enum Event {
    Exit(BoundaryPoint, f64),
    Entry(BoundaryPoint, f64),
}

impl<'a> Tracer<'a> {
    pub(crate) fn new(transformer: &'a Transformer, samples: usize) -> Self {
        Self {
            transformer,
            samples: samples.max(1),
        }
    }

    pub(crate) fn transformer(&self) -> &Transformer {
        self.transformer
    }

    pub(crate) fn region(&self) -> &Region {
        self.transformer.target().region()
    }

    /// Source point to (wrapped rel, lat) in the target frame.
    pub(crate) fn node(&self, p: (f64, f64)) -> Result<(f64, f64), ProjError> {
        self.transformer.frame_node(p.0, p.1)
    }

    pub(crate) fn forward(&self, rel: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        self.transformer.target().forward_frame(rel, lat)
    }
}

/// Continue an unwrapped longitude from `prev` to a wrapped `raw` value.
pub(crate) fn continue_rel(prev: f64, raw: f64, lat: f64) -> f64 {
    if lat.abs() >= FRAC_PI_2 - POLE_EPS {
        prev
    } else {
        prev + wrap_pi(raw - prev)
    }
}

pub(crate) fn lerp(a: (f64, f64), b: (f64, f64), t: f64) -> (f64, f64) {
    (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1))
}

/// Trace `vertices` (caller index, source xy) against the target region.
///
/// Open paths are cut wherever a vertex has no image and are traced run by
/// run. Closed paths drop vertices without a geographic image and bridge
/// their neighbours.
pub(crate) fn trace_path(
    tracer: &Tracer<'_>,
    vertices: &[(usize, (f64, f64))],
    closed: bool,
) -> Trace {
    let mut out = Trace::default();
    let mut nodes = Vec::with_capacity(vertices.len());
    for &(key, p) in vertices {
        match tracer.node(p) {
            Ok(node) => {
                out.vertices.push((key, p));
                nodes.push(Some(node));
            }
            Err(e) if closed => out.dropped.push((key, e)),
            Err(e) => {
                out.dropped.push((key, e));
                out.vertices.push((key, p));
                nodes.push(None);
            }
        }
    }

    if closed {
        if out.vertices.len() >= 2 {
            let run: Vec<usize> = (0..out.vertices.len()).collect();
            let node_values: Vec<(f64, f64)> = nodes.iter().flatten().copied().collect();
            RunTracer::new(tracer, &mut out, true).trace(&run, &node_values);
        }
        return out;
    }

    let mut start = 0;
    while start < nodes.len() {
        if nodes[start].is_none() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < nodes.len() && nodes[end].is_some() {
            end += 1;
        }
        let run: Vec<usize> = (start..end).collect();
        let node_values: Vec<(f64, f64)> = nodes[start..end].iter().flatten().copied().collect();
        RunTracer::new(tracer, &mut out, false).trace(&run, &node_values);
        start = end;
    }
    out
}

/// Traces one run of consecutive vertices that all have frame nodes.
struct RunTracer<'t, 'a> {
    tracer: &'t Tracer<'a>,
    out: &'t mut Trace,
    closed: bool,
    current: Option<Chain>,
    chains: Vec<Chain>,
    crossings_before: usize,
}

impl<'t, 'a> RunTracer<'t, 'a> {
    fn new(tracer: &'t Tracer<'a>, out: &'t mut Trace, closed: bool) -> Self {
        let crossings_before = out.crossings.len();
        Self {
            tracer,
            out,
            closed,
            current: None,
            chains: Vec::new(),
            crossings_before,
        }
    }

    fn seg_end(&self, seg: usize) -> usize {
        if self.closed {
            (seg + 1) % self.out.vertices.len()
        } else {
            seg + 1
        }
    }

    fn trace(mut self, run: &[usize], nodes: &[(f64, f64)]) {
        let samples = self.sample(run, nodes);
        let Some(first) = samples.first() else {
            return;
        };
        let tracer = self.tracer;
        let region = tracer.region();

        let mut prev = State {
            t: first.t,
            rel: first.rel,
            lat: first.lat,
            locus: region.locus(first.rel, first.lat, 0),
        };
        let start_inside = prev.locus.inside;
        self.visit_vertex(first, prev.locus);

        let mut prev_seg = first.seg;
        for sample in &samples[1..] {
            let locus = region.locus(sample.rel, sample.lat, prev.locus.sheet);
            // A sample on the next segment closes the current one at t = 1.
            let t = if sample.seg == prev_seg { sample.t } else { 1.0 };
            let next = State {
                t,
                rel: sample.rel,
                lat: sample.lat,
                locus,
            };
            if region.crossing(prev.locus, locus) {
                self.locate(region, prev_seg, prev, next);
            }
            self.visit_vertex(sample, locus);
            prev = State {
                t: sample.t,
                ..next
            };
            prev_seg = sample.seg;
        }

        if let Some(chain) = self.current.take() {
            self.chains.push(chain);
        }
        self.finish(start_inside);
    }

    /// Samples along every segment of the run, with unwrapped longitudes
    /// anchored so the first point off the seam lies on sheet 0.
    fn sample(&self, run: &[usize], nodes: &[(f64, f64)]) -> Vec<Sample> {
        let m = run.len();
        let segs = if self.closed { m } else { m.saturating_sub(1) };
        let n = self.tracer.samples;
        let mut samples = Vec::with_capacity(segs * n + 1);

        for j in 0..segs {
            let (a, b) = (run[j], run[(j + 1) % m]);
            let (pa, pb) = (self.out.vertices[a].1, self.out.vertices[b].1);
            samples.push(Sample {
                seg: a,
                t: 0.0,
                rel: nodes[j].0,
                lat: nodes[j].1,
                vertex: Some(a),
            });
            for k in 1..n {
                let t = k as f64 / n as f64;
                if let Ok((rel, lat)) = self.tracer.node(lerp(pa, pb, t)) {
                    samples.push(Sample {
                        seg: a,
                        t,
                        rel,
                        lat,
                        vertex: None,
                    });
                }
            }
        }
        if self.closed {
            samples.push(Sample {
                seg: run[m - 1],
                t: 1.0,
                rel: nodes[0].0,
                lat: nodes[0].1,
                vertex: None,
            });
        } else if let (Some(&last), Some(&(rel, lat))) = (run.last(), nodes.last()) {
            samples.push(Sample {
                seg: last,
                t: 0.0,
                rel,
                lat,
                vertex: Some(last),
            });
        }

        for k in 1..samples.len() {
            samples[k].rel = continue_rel(samples[k - 1].rel, samples[k].rel, samples[k].lat);
        }
        let anchor = samples
            .iter()
            .find(|s| wrap_pi(s.rel - PI).abs() > 1e-9)
            .or(samples.first())
            .map_or(0.0, |s| TAU * ((s.rel + PI) / TAU).floor());
        for s in &mut samples {
            s.rel -= anchor;
        }
        samples
    }

    /// Bisect between `lo` and `hi` (parameters on segment `seg`) until every
    /// change of locus is located, emitting the boundary events.
    fn locate(&mut self, region: &Region, seg: usize, mut lo: State, hi_end: State) {
        let (p0, p1) = (
            self.out.vertices[seg].1,
            self.out.vertices[self.seg_end(seg)].1,
        );
        for _ in 0..MAX_EVENTS_PER_STEP {
            if !region.crossing(lo.locus, hi_end.locus) {
                break;
            }
            let mut a = lo;
            let mut b = hi_end;
            for _ in 0..BISECT_STEPS {
                let t = 0.5 * (a.t + b.t);
                match self.tracer.node(lerp(p0, p1, t)) {
                    Ok((raw, lat)) => {
                        let rel = continue_rel(a.rel, raw, lat);
                        let locus = region.locus(rel, lat, a.locus.sheet);
                        let mid = State { t, rel, lat, locus };
                        if region.crossing(a.locus, locus) {
                            b = mid;
                        } else {
                            a = mid;
                        }
                    }
                    Err(_) => a.t = t,
                }
            }
            for event in events(region, a, b) {
                self.emit(seg, event);
            }
            lo = b;
        }
    }

    fn emit(&mut self, seg: usize, event: Event) {
        let key = self.out.vertices[seg].0;
        let (bp, t, is_exit) = match event {
            Event::Exit(bp, t) => (bp, t, true),
            Event::Entry(bp, t) => (bp, t, false),
        };
        trace!(
            "{} at segment {seg} t={t:.6}: frame ({:.6}°, {:.6}°), boundary position {:.6}",
            if is_exit { "exit" } else { "entry" },
            bp.rel.to_degrees(),
            bp.lat.to_degrees(),
            bp.s
        );
        self.out.crossings.push(Crossing {
            seg,
            t,
            point: (bp.rel, bp.lat),
        });
        let point = self.tracer.forward(bp.rel, bp.lat).ok().map(|xy| PathPoint {
            xy,
            frame: (bp.rel, bp.lat),
            origin: Some(Origin { key, seg, t }),
        });
        if is_exit {
            let mut chain = self.current.take().unwrap_or_default();
            chain.points.extend(point);
            chain.end = Some(bp.s);
            self.chains.push(chain);
        } else {
            if let Some(chain) = self.current.take() {
                self.chains.push(chain);
            }
            self.current = Some(Chain {
                points: point.into_iter().collect(),
                start: Some(bp.s),
                end: None,
            });
        }
    }

    /// Record or append an original vertex reached at `locus`.
    fn visit_vertex(&mut self, sample: &Sample, locus: Locus) {
        let Some(v) = sample.vertex else {
            return;
        };
        let (key, _) = self.out.vertices[v];
        if !locus.inside {
            self.out
                .dropped
                .push((key, ProjError::OutOfDomain("outside the target region".into())));
            return;
        }
        let local = sample.rel - TAU * f64::from(locus.sheet);
        match self.tracer.forward(local, sample.lat) {
            Ok(xy) => {
                self.current.get_or_insert_with(Chain::default).points.push(PathPoint {
                    xy,
                    frame: (local, sample.lat),
                    origin: Some(Origin {
                        key,
                        seg: v,
                        t: 0.0,
                    }),
                });
            }
            Err(e) => {
                self.out.dropped.push((key, e));
                if !self.closed {
                    if let Some(chain) = self.current.take() {
                        self.chains.push(chain);
                    }
                }
            }
        }
    }

    fn finish(mut self, start_inside: bool) {
        let had_crossings = self.out.crossings.len() > self.crossings_before;
        if self.closed {
            if !had_crossings {
                if start_inside {
                    self.out.closed = self.chains.pop();
                }
                return;
            }
            // A ring that starts inside runs from its last chain into its first.
            let open_ends = self.chains.len() >= 2
                && self.chains.first().is_some_and(|c| c.start.is_none())
                && self.chains.last().is_some_and(|c| c.end.is_none());
            if open_ends {
                let first = self.chains.remove(0);
                if let Some(mut last) = self.chains.pop() {
                    last.points.extend(first.points);
                    last.end = first.end;
                    self.chains.insert(0, last);
                }
            }
        }
        self.out.chains.append(&mut self.chains);
    }
}

/// Boundary events for a located change of locus from `a` to `b`.
fn events(region: &Region, a: State, b: State) -> Vec<Event> {
    let local = |s: &State, sheet: i32| (s.rel - TAU * f64::from(sheet), s.lat);
    match (a.locus.inside, b.locus.inside) {
        (true, true) if a.locus.sheet != b.locus.sheet => {
            let dir = (b.locus.sheet - a.locus.sheet).signum();
            let (exit, entry) = region.seam_crossing(dir, a.lat);
            vec![Event::Exit(exit, a.t), Event::Entry(entry, b.t)]
        }
        (true, true) => region
            .interruption_crossing(a.locus.local, b.locus.local)
            .map(|(exit, entry)| vec![Event::Exit(exit, a.t), Event::Entry(entry, b.t)])
            .unwrap_or_default(),
        (true, false) => {
            let bp = region.snap(local(&a, a.locus.sheet), local(&b, a.locus.sheet));
            vec![Event::Exit(bp, a.t)]
        }
        (false, true) => {
            let bp = region.snap(local(&b, b.locus.sheet), local(&a, b.locus.sheet));
            vec![Event::Entry(bp, b.t)]
        }
        (false, false) => Vec::new(),
    }
}
