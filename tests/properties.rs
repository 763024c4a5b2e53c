use std::sync::Arc;

use approx::assert_relative_eq;
use carto_reproject::{
    parse_proj_string, proj_params, reproject, to_proj_string, CrsError, Leaf, ParamValue,
    ProjectionSpec, Registry, Shape, Status, Transformer,
};
use geo_types::{LineString, Polygon};
use proptest::prelude::*;

fn spec(reg: &Registry, family: &str, overrides: &[(&str, f64)]) -> Arc<ProjectionSpec> {
    let overrides: Vec<(&str, ParamValue)> =
        overrides.iter().map(|&(k, v)| (k, ParamValue::from(v))).collect();
    Arc::new(reg.instance(family, &overrides).expect("valid spec"))
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn x_width(ls: &LineString<f64>) -> f64 {
    let xs = ls.0.iter().map(|c| c.x);
    xs.clone().fold(f64::MIN, f64::max) - xs.fold(f64::MAX, f64::min)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn identity_returns_geometry_unchanged(
        pts in proptest::collection::vec((-180.0..180.0f64, -90.0..90.0f64), 2..12)
    ) {
        let reg = Registry::with_builtins();
        let pc = spec(&reg, "PlateCarree", &[]);
        let shape = Shape::new(LineString::from(pts), pc.clone());
        let result = reproject(&reg, &shape, &pc).expect("reproject");
        prop_assert_eq!(result.status, Status::Exact);
        prop_assert_eq!(result.shape, shape);
    }

    #[test]
    fn interior_points_round_trip(
        lon in -170.0..170.0f64,
        lat in -70.0..70.0f64,
        family in prop::sample::select(vec![
            "Mercator", "Miller", "LambertCylindrical", "Sinusoidal", "Mollweide",
            "EckertI", "EckertII", "EckertIII", "EckertIV", "EckertV", "EckertVI",
            "InterruptedGoodeHomolosine", "AlbersEqualArea", "EquidistantConic",
            "RotatedPole", "LambertAzimuthalEqualArea",
        ]),
    ) {
        let reg = Registry::with_builtins();
        let pc = spec(&reg, "PlateCarree", &[]);
        let target = Arc::new(reg.default_instance(family).expect("defaults"));
        let there = Transformer::new(&reg, &pc, &target).expect("transformer");
        let back = Transformer::new(&reg, &target, &pc).expect("transformer");

        let (x, y) = there.project_xy(lon, lat).expect("forward");
        let (lon2, lat2) = back.project_xy(x, y).expect("inverse");
        prop_assert!((lon2 - lon).abs() < 1e-6, "{family}: lon {lon} -> {lon2}");
        prop_assert!((lat2 - lat).abs() < 1e-6, "{family}: lat {lat} -> {lat2}");
    }

    #[test]
    fn parameters_survive_the_text_form(
        lon0 in -180.0..180.0f64,
        sp1 in 20.0..60.0f64,
        sp2 in 20.0..60.0f64,
        fe in -1.0e6..1.0e6f64,
    ) {
        let reg = Registry::with_builtins();
        let spec = reg
            .instance(
                "AlbersEqualArea",
                &[
                    ("central_longitude", lon0.into()),
                    ("standard_parallel_1", sp1.into()),
                    ("standard_parallel_2", sp2.into()),
                    ("false_easting", fe.into()),
                ],
            )
            .expect("valid spec");
        let text = to_proj_string(&reg, &spec).expect("render");
        let back = parse_proj_string(&reg, &text).expect("parse");
        prop_assert_eq!(&back, &spec);

        let tokens = proj_params(&reg, &spec).expect("tokens");
        prop_assert!(tokens.contains("proj=aea"));
        prop_assert!(tokens.contains("no_defs"));
        prop_assert_eq!(tokens, proj_params(&reg, &back).expect("tokens"));
    }

    #[test]
    fn line_across_dateline_splits_in_two(
        west in 0.5..60.0f64,
        east in 0.5..60.0f64,
        lat in -80.0..80.0f64,
    ) {
        let reg = Registry::with_builtins();
        let pc = spec(&reg, "PlateCarree", &[]);
        let pc180 = spec(&reg, "PlateCarree", &[("central_longitude", 180.0)]);
        let line = LineString::from(vec![(-180.0 + west, lat), (180.0 - east, lat)]);
        let result = reproject(&reg, &Shape::new(line, pc), &pc180).expect("reproject");

        prop_assert_eq!(result.status, Status::Split);
        let parts = result.shape.geometry().parts();
        prop_assert_eq!(parts.len(), 2);
        for part in parts {
            let Leaf::LineString(ls) = part else {
                return Err(TestCaseError::fail(format!("expected a line, got {part:?}")));
            };
            prop_assert!(x_width(ls) < 360.0);
        }
    }

    #[test]
    fn antipode_of_orthographic_centre_is_dropped(
        lon0 in -180.0..180.0f64,
        lat0 in -80.0..80.0f64,
    ) {
        let reg = Registry::with_builtins();
        let pc = spec(&reg, "PlateCarree", &[]);
        let ortho = spec(
            &reg,
            "Orthographic",
            &[("central_longitude", lon0), ("central_latitude", lat0)],
        );
        let antipode = if lon0 > 0.0 { lon0 - 180.0 } else { lon0 + 180.0 };
        let point = geo_types::Point::new(antipode, -lat0);
        let result = reproject(&reg, &Shape::new(point, pc), &ortho).expect("reproject");
        prop_assert_eq!(result.status, Status::Empty);
        prop_assert!(result.shape.geometry().is_empty());
        prop_assert_eq!(result.dropped.len(), 1);
    }

    #[test]
    fn ring_across_seam_closes_into_two_rings(
        half in 1.0..30.0f64,
        centre in -40.0..40.0f64,
        shift in -0.5..0.5f64,
    ) {
        let reg = Registry::with_builtins();
        let pc = spec(&reg, "PlateCarree", &[]);
        let pc180 = spec(&reg, "PlateCarree", &[("central_longitude", 180.0)]);
        let (x0, x1) = (shift * half - half, shift * half + half);
        let ring = Polygon::new(
            LineString::from(vec![
                (x0, centre - half),
                (x1, centre - half),
                (x1, centre + half),
                (x0, centre + half),
            ]),
            vec![],
        );
        let shape = Shape::new(ring, pc180);
        let result = reproject(&reg, &shape, &pc).expect("reproject");

        let geometry = result.shape.geometry();
        prop_assert_eq!(geometry.part_count(), 2);
        prop_assert_eq!(geometry.vertex_count(), 4 + 2 * 2);
        prop_assert!((geometry.area() - shape.geometry().area()).abs() < 1e-6 * shape.geometry().area());
    }

    #[test]
    fn c_shape_across_seam_splits_into_three(
        west in 2.0..40.0f64,
        spine in 0.2..0.9f64,
        east in 1.0..40.0f64,
        arm in 1.0..10.0f64,
        gap in 1.0..10.0f64,
        base in -60.0..20.0f64,
    ) {
        let reg = Registry::with_builtins();
        let pc = spec(&reg, "PlateCarree", &[]);
        let pc180 = spec(&reg, "PlateCarree", &[("central_longitude", 180.0)]);
        // The spine lies west of the seam and both arms reach across it.
        let (xw, xi, xe) = (-west, -west * (1.0 - spine), east);
        let (y1, y2) = (base + arm, base + arm + gap);
        let y3 = y2 + arm;
        let ring = Polygon::new(
            LineString::from(vec![
                (xw, base),
                (xe, base),
                (xe, y1),
                (xi, y1),
                (xi, y2),
                (xe, y2),
                (xe, y3),
                (xw, y3),
            ]),
            vec![],
        );
        let shape = Shape::new(ring, pc);
        let result = reproject(&reg, &shape, &pc180).expect("reproject");

        prop_assert_eq!(result.status, Status::Split);
        let geometry = result.shape.geometry();
        prop_assert_eq!(geometry.part_count(), 3);
        let expected = 2.0 * arm * (xe - xw) + gap * (xi - xw);
        prop_assert!((shape.geometry().area() - expected).abs() < 1e-9 * expected);
        prop_assert!((geometry.area() - expected).abs() < 1e-6 * expected);
    }
}

#[test]
fn unknown_family_is_rejected() {
    let reg = Registry::with_builtins();
    assert!(matches!(
        reg.default_instance("NoSuchProjection"),
        Err(CrsError::UnknownFamily(_))
    ));
}

#[test]
fn out_of_range_parameter_is_rejected() {
    let reg = Registry::with_builtins();
    let err = reg
        .instance("Mercator", &[("central_longitude", ParamValue::Number(200.0))])
        .unwrap_err();
    assert!(matches!(err, CrsError::InvalidParameter { ref param, .. } if param == "central_longitude"));
}

#[test]
fn wrong_kind_and_unknown_name_are_rejected() {
    let reg = Registry::with_builtins();
    assert!(matches!(
        reg.instance("UTM", &[("zone", ParamValue::Number(33.5))]),
        Err(CrsError::InvalidParameter { .. })
    ));
    assert!(matches!(
        reg.instance("Mercator", &[("zone", ParamValue::Integer(3))]),
        Err(CrsError::InvalidParameter { .. })
    ));
}

#[test]
fn missing_required_parameter_is_reported() {
    let reg = Registry::with_builtins();
    assert!(matches!(
        reg.default_instance("UTM"),
        Err(CrsError::MissingRequiredParameter { ref param, .. }) if param == "zone"
    ));
}

#[test]
fn compound_validators_run() {
    let reg = Registry::with_builtins();
    assert!(matches!(
        reg.instance(
            "LambertConformal",
            &[
                ("standard_parallel_1", ParamValue::Number(30.0)),
                ("standard_parallel_2", ParamValue::Number(-30.0)),
            ],
        ),
        Err(CrsError::InvalidParameter { .. })
    ));
    assert!(matches!(
        reg.instance(
            "Mercator",
            &[
                ("min_latitude", ParamValue::Number(50.0)),
                ("max_latitude", ParamValue::Number(10.0)),
            ],
        ),
        Err(CrsError::InvalidParameter { .. })
    ));
    assert!(matches!(
        reg.instance(
            "RotatedPole",
            &[
                ("pole_longitude", ParamValue::Number(10.0)),
                ("pole_latitude", ParamValue::Number(90.0)),
            ],
        ),
        Err(CrsError::InvalidParameter { .. })
    ));
}

#[test]
fn preset_equals_explicit_spec() {
    init_logging();
    let reg = Registry::with_builtins();
    let preset = reg.default_instance("EuroPP").expect("preset");
    let explicit = reg
        .instance("UTM", &[("zone", ParamValue::Integer(32))])
        .expect("explicit");
    assert_eq!(preset, explicit);
    assert_eq!(preset.family(), "UTM");
}

#[test]
fn domain_limits_are_cached_and_stable() {
    init_logging();
    let reg = Registry::with_builtins();
    let pc = reg.default_instance("PlateCarree").expect("defaults");
    let a = reg.domain_of(&pc).expect("domain");
    let b = reg.domain_of(&pc).expect("domain");
    assert_eq!(a, b);
    assert_relative_eq!(a.x_limits().0, -180.0, epsilon = 1e-9);
    assert_relative_eq!(a.x_limits().1, 180.0, epsilon = 1e-9);
    assert_relative_eq!(a.y_limits().1, 90.0, epsilon = 1e-9);
}
