//! Built-in projection families and presets.
//!
//! Angles in parameters are degrees; builders convert to radians. Spherical
//! families use a sphere with the WGS84 semi-major axis.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::crs::Model;
use crate::domain::Region;
use crate::error::CrsError;
use crate::proj::albers_equal_area::AlbersEqualArea;
use crate::proj::azimuthal::{Azimuthal, AzimuthalKind};
use crate::proj::cylindrical::{LambertCylindrical, Miller};
use crate::proj::ellipsoid::{WGS84, WGS84_SPHERE};
use crate::proj::equidistant_conic::EquidistantConic;
use crate::proj::equirectangular::Equirectangular;
use crate::proj::geostationary::{Geostationary, GEOSTATIONARY_HEIGHT};
use crate::proj::interrupted::InterruptedGoodeHomolosine;
use crate::proj::lambert_conformal::LambertConformalConic;
use crate::proj::mercator::Mercator;
use crate::proj::pseudocylindrical::{Eckert, EckertKind, Mollweide};
use crate::proj::rotated_pole::PoleRotation;
use crate::proj::sinusoidal::Sinusoidal;
use crate::proj::stereographic::{ObliqueStereographic, PolarStereographic};
use crate::proj::transverse_mercator::{utm_central_meridian, TransverseMercator};
use crate::proj::Projection;
use crate::registry::{Builder, FamilySchema, ParamSchema, Preset, Validator};
use crate::spec::{ParamValue, ProjectionSpec};

/// Half width of the longitude band kept by transverse Mercator families.
const TM_HALF_WIDTH_DEG: f64 = 40.0;

/// Angular radius kept by azimuthal families defined up to the antipode.
const NEAR_ANTIPODE_DEG: f64 = 179.0;

/// Margin kept inside the geostationary horizon.
const HORIZON_MARGIN: f64 = 1e-9;

const MAX_OFFSET: f64 = 1.0e9;

/// Metres per degree of longitude on the equator of the WGS84 sphere.
const DEGREE_METRES: &str = "111319.49079327357";

fn central_longitude(default: f64) -> ParamSchema {
    ParamSchema::number("central_longitude", "lon_0", -180.0, 180.0, default)
}

fn central_latitude(default: f64) -> ParamSchema {
    ParamSchema::number("central_latitude", "lat_0", -90.0, 90.0, default)
}

fn false_origin() -> [ParamSchema; 2] {
    [
        ParamSchema::number("false_easting", "x_0", -MAX_OFFSET, MAX_OFFSET, 0.0),
        ParamSchema::number("false_northing", "y_0", -MAX_OFFSET, MAX_OFFSET, 0.0),
    ]
}

fn scale_factor(default: f64) -> ParamSchema {
    ParamSchema::number("scale_factor", "k_0", 1e-6, 10.0, default)
}

fn standard_parallels(first: f64, second: f64) -> [ParamSchema; 2] {
    [
        ParamSchema::number("standard_parallel_1", "lat_1", -90.0, 90.0, first),
        ParamSchema::number("standard_parallel_2", "lat_2", -90.0, 90.0, second),
    ]
}

fn family(
    name: &str,
    proj_name: &str,
    params: Vec<ParamSchema>,
    validate: Option<Validator>,
    build: Builder,
) -> FamilySchema {
    FamilySchema {
        name: name.to_string(),
        proj_name: proj_name.to_string(),
        fixed_tokens: Vec::new(),
        params,
        validate,
        build,
    }
}

fn invalid(spec: &ProjectionSpec, param: &str, reason: impl Into<String>) -> CrsError {
    CrsError::InvalidParameter {
        family: spec.family().to_string(),
        param: param.to_string(),
        reason: reason.into(),
    }
}

fn false_origin_of(spec: &ProjectionSpec) -> Result<(f64, f64), CrsError> {
    Ok((spec.number("false_easting")?, spec.number("false_northing")?))
}

fn validate_mercator(spec: &ProjectionSpec) -> Result<(), CrsError> {
    let (min, max) = (spec.number("min_latitude")?, spec.number("max_latitude")?);
    if min >= max {
        return Err(invalid(
            spec,
            "min_latitude",
            format!("must be below max_latitude ({min} >= {max})"),
        ));
    }
    Ok(())
}

/// A conic family with standard parallels mirrored about the equator has
/// no cone.
fn validate_conic(spec: &ProjectionSpec) -> Result<(), CrsError> {
    let (sp1, sp2) = (
        spec.number("standard_parallel_1")?,
        spec.number("standard_parallel_2")?,
    );
    if (sp1 + sp2).abs() < 1e-10 {
        return Err(invalid(
            spec,
            "standard_parallel_2",
            format!("standard parallels {sp1} and {sp2} are symmetric about the equator"),
        ));
    }
    if sp1.abs() >= 90.0 && sp2.abs() >= 90.0 {
        return Err(invalid(spec, "standard_parallel_1", "both standard parallels are poles"));
    }
    Ok(())
}

/// With the rotated pole on a geographic pole the pole longitude is
/// meaningless; only 0 is accepted so the spec stays unique.
fn validate_rotated_pole(spec: &ProjectionSpec) -> Result<(), CrsError> {
    let (pole_lon, pole_lat) = (spec.number("pole_longitude")?, spec.number("pole_latitude")?);
    if pole_lat.abs() >= 90.0 && pole_lon != 0.0 {
        return Err(invalid(
            spec,
            "pole_longitude",
            format!("must be 0 when pole_latitude is {pole_lat}"),
        ));
    }
    Ok(())
}

fn build_plate_carree(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    Ok(Model {
        projection: Box::new(Equirectangular::degrees(lon0)),
        rotation: None,
        region: Region::globe(lon0),
    })
}

fn build_mercator(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    let (fe, fn_) = false_origin_of(spec)?;
    Ok(Model {
        projection: Box::new(Mercator::new(
            WGS84,
            lon0,
            spec.radians("latitude_true_scale")?,
            fe,
            fn_,
        )),
        rotation: None,
        region: Region::band(
            lon0,
            PI,
            spec.radians("min_latitude")?,
            spec.radians("max_latitude")?,
        ),
    })
}

fn build_miller(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    Ok(Model {
        projection: Box::new(Miller::new(WGS84_SPHERE, lon0)),
        rotation: None,
        region: Region::globe(lon0),
    })
}

fn build_lambert_cylindrical(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    Ok(Model {
        projection: Box::new(LambertCylindrical::new(WGS84_SPHERE, lon0)),
        rotation: None,
        region: Region::globe(lon0),
    })
}

fn build_sinusoidal(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    let (fe, fn_) = false_origin_of(spec)?;
    Ok(Model {
        projection: Box::new(Sinusoidal::new(WGS84_SPHERE, lon0, fe, fn_)),
        rotation: None,
        region: Region::globe(lon0),
    })
}

fn build_mollweide(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    Ok(Model {
        projection: Box::new(Mollweide::new(WGS84_SPHERE, lon0)),
        rotation: None,
        region: Region::globe(lon0),
    })
}

fn build_eckert(spec: &ProjectionSpec, kind: EckertKind) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    Ok(Model {
        projection: Box::new(Eckert::new(WGS84_SPHERE, lon0, kind)),
        rotation: None,
        region: Region::globe(lon0),
    })
}

fn build_eckert_i(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    build_eckert(spec, EckertKind::I)
}

fn build_eckert_ii(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    build_eckert(spec, EckertKind::II)
}

fn build_eckert_iii(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    build_eckert(spec, EckertKind::III)
}

fn build_eckert_iv(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    build_eckert(spec, EckertKind::IV)
}

fn build_eckert_v(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    build_eckert(spec, EckertKind::V)
}

fn build_eckert_vi(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    build_eckert(spec, EckertKind::VI)
}

fn build_goode(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    let igh = InterruptedGoodeHomolosine::new(WGS84_SPHERE, lon0);
    let region = Region::lobed(lon0, igh.interruptions(true), igh.interruptions(false));
    Ok(Model {
        projection: Box::new(igh),
        rotation: None,
        region,
    })
}

fn build_rotated_pole(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_rotated_longitude")?;
    Ok(Model {
        projection: Box::new(Equirectangular::degrees(lon0)),
        rotation: Some(PoleRotation::new(
            spec.radians("pole_longitude")?,
            spec.radians("pole_latitude")?,
        )),
        region: Region::globe(lon0),
    })
}

fn build_lambert_conformal(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    let (fe, fn_) = false_origin_of(spec)?;
    let lcc = LambertConformalConic::new_2sp(
        WGS84,
        lon0,
        spec.radians("central_latitude")?,
        spec.radians("standard_parallel_1")?,
        spec.radians("standard_parallel_2")?,
        fe,
        fn_,
    );
    // The cone opens away from its apex pole; the cutoff bounds the far side.
    let cutoff = spec.radians("cutoff")?;
    let region = if lcc.cone_constant() > 0.0 {
        Region::band(lon0, PI, cutoff, FRAC_PI_2)
    } else {
        Region::band(lon0, PI, -FRAC_PI_2, -cutoff)
    };
    Ok(Model {
        projection: Box::new(lcc),
        rotation: None,
        region,
    })
}

fn build_albers(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    let (fe, fn_) = false_origin_of(spec)?;
    Ok(Model {
        projection: Box::new(AlbersEqualArea::new(
            WGS84,
            lon0,
            spec.radians("central_latitude")?,
            spec.radians("standard_parallel_1")?,
            spec.radians("standard_parallel_2")?,
            fe,
            fn_,
        )),
        rotation: None,
        region: Region::globe(lon0),
    })
}

fn build_equidistant_conic(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    let (fe, fn_) = false_origin_of(spec)?;
    Ok(Model {
        projection: Box::new(EquidistantConic::new(
            WGS84,
            lon0,
            spec.radians("central_latitude")?,
            spec.radians("standard_parallel_1")?,
            spec.radians("standard_parallel_2")?,
            fe,
            fn_,
        )),
        rotation: None,
        region: Region::globe(lon0),
    })
}

fn build_azimuthal(
    spec: &ProjectionSpec,
    kind: AzimuthalKind,
    radius: f64,
    false_origin: (f64, f64),
) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    let lat0 = spec.radians("central_latitude")?;
    Ok(Model {
        projection: Box::new(Azimuthal::new(
            WGS84_SPHERE,
            kind,
            lon0,
            lat0,
            false_origin.0,
            false_origin.1,
        )),
        rotation: None,
        region: Region::cap(lon0, lat0, radius),
    })
}

fn build_orthographic(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    build_azimuthal(spec, AzimuthalKind::Orthographic, FRAC_PI_2, (0.0, 0.0))
}

fn build_equidistant(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let origin = false_origin_of(spec)?;
    build_azimuthal(
        spec,
        AzimuthalKind::Equidistant,
        NEAR_ANTIPODE_DEG.to_radians(),
        origin,
    )
}

fn build_equal_area(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let origin = false_origin_of(spec)?;
    build_azimuthal(
        spec,
        AzimuthalKind::EqualArea,
        NEAR_ANTIPODE_DEG.to_radians(),
        origin,
    )
}

fn build_nearside_perspective(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let origin = false_origin_of(spec)?;
    let p = Azimuthal::perspective_distance(&WGS84_SPHERE, spec.number("satellite_height")?);
    build_azimuthal(
        spec,
        AzimuthalKind::NearsidePerspective { p },
        (1.0 / p).acos(),
        origin,
    )
}

fn build_geostationary(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    let (fe, fn_) = false_origin_of(spec)?;
    let geos = Geostationary::new(WGS84, lon0, spec.number("satellite_height")?, fe, fn_);
    let region = Region::cap(lon0, 0.0, geos.horizon() - HORIZON_MARGIN);
    Ok(Model {
        projection: Box::new(geos),
        rotation: None,
        region,
    })
}

fn build_stereographic(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    let lat0_deg = spec.number("central_latitude")?;
    let k0 = spec.number("scale_factor")?;
    let (fe, fn_) = false_origin_of(spec)?;
    let lat0 = lat0_deg.to_radians();
    let projection: Box<dyn Projection> = if lat0_deg.abs() >= 90.0 {
        Box::new(PolarStereographic::new(WGS84, lon0, lat0_deg > 0.0, k0, fe, fn_))
    } else {
        Box::new(ObliqueStereographic::new(WGS84, lon0, lat0, k0, fe, fn_))
    };
    Ok(Model {
        projection,
        rotation: None,
        region: Region::cap(lon0, lat0, FRAC_PI_2),
    })
}

fn build_transverse_mercator(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let lon0 = spec.radians("central_longitude")?;
    let (fe, fn_) = false_origin_of(spec)?;
    Ok(Model {
        projection: Box::new(TransverseMercator::new(
            WGS84,
            lon0,
            spec.radians("central_latitude")?,
            spec.number("scale_factor")?,
            fe,
            fn_,
        )),
        rotation: None,
        region: Region::band(lon0, TM_HALF_WIDTH_DEG.to_radians(), -FRAC_PI_2, FRAC_PI_2),
    })
}

fn build_utm(spec: &ProjectionSpec) -> Result<Model, CrsError> {
    let zone = match spec.get("zone") {
        Some(ParamValue::Integer(z)) => {
            u8::try_from(z).map_err(|_| invalid(spec, "zone", "not a zone number"))?
        }
        _ => {
            return Err(CrsError::MissingRequiredParameter {
                family: spec.family().to_string(),
                param: "zone".to_string(),
            })
        }
    };
    let south = spec.flag("south")?;
    Ok(Model {
        projection: Box::new(TransverseMercator::utm_zone(zone, south)),
        rotation: None,
        region: Region::band(
            utm_central_meridian(zone),
            TM_HALF_WIDTH_DEG.to_radians(),
            (-80.0_f64).to_radians(),
            84.0_f64.to_radians(),
        ),
    })
}

pub(crate) fn builtin_families() -> Vec<FamilySchema> {
    let [fe, fn_] = false_origin();
    let mut plate_carree = family(
        "PlateCarree",
        "eqc",
        vec![central_longitude(0.0)],
        None,
        build_plate_carree,
    );
    plate_carree.fixed_tokens = vec![format!("to_meter={DEGREE_METRES}")];

    let mut rotated_pole = family(
        "RotatedPole",
        "ob_tran",
        vec![
            ParamSchema::number("pole_longitude", "o_lon_p", -180.0, 180.0, 0.0),
            ParamSchema::number("pole_latitude", "o_lat_p", -90.0, 90.0, 90.0),
            ParamSchema::number("central_rotated_longitude", "lon_0", -180.0, 180.0, 0.0),
        ],
        Some(validate_rotated_pole),
        build_rotated_pole,
    );
    rotated_pole.fixed_tokens = vec!["o_proj=latlon".to_string()];

    let [sp1, sp2] = standard_parallels(33.0, 45.0);
    let lambert_conformal = family(
        "LambertConformal",
        "lcc",
        vec![
            central_longitude(-96.0),
            central_latitude(39.0),
            sp1,
            sp2,
            fe.clone(),
            fn_.clone(),
            ParamSchema::number("cutoff", "cutoff", -90.0, 89.0, -30.0),
        ],
        Some(validate_conic),
        build_lambert_conformal,
    );

    let [sp1, sp2] = standard_parallels(20.0, 50.0);
    let albers = family(
        "AlbersEqualArea",
        "aea",
        vec![
            central_longitude(0.0),
            central_latitude(0.0),
            sp1,
            sp2,
            fe.clone(),
            fn_.clone(),
        ],
        Some(validate_conic),
        build_albers,
    );

    let [sp1, sp2] = standard_parallels(20.0, 50.0);
    let equidistant_conic = family(
        "EquidistantConic",
        "eqdc",
        vec![
            central_longitude(0.0),
            central_latitude(0.0),
            sp1,
            sp2,
            fe.clone(),
            fn_.clone(),
        ],
        Some(validate_conic),
        build_equidistant_conic,
    );

    vec![
        plate_carree,
        family(
            "Mercator",
            "merc",
            vec![
                central_longitude(0.0),
                ParamSchema::number("latitude_true_scale", "lat_ts", -89.0, 89.0, 0.0),
                ParamSchema::number("min_latitude", "lat_min", -90.0, 90.0, -80.0),
                ParamSchema::number("max_latitude", "lat_max", -90.0, 90.0, 84.0),
                fe.clone(),
                fn_.clone(),
            ],
            Some(validate_mercator),
            build_mercator,
        ),
        family("Miller", "mill", vec![central_longitude(0.0)], None, build_miller),
        family(
            "LambertCylindrical",
            "cea",
            vec![central_longitude(0.0)],
            None,
            build_lambert_cylindrical,
        ),
        family(
            "Sinusoidal",
            "sinu",
            vec![central_longitude(0.0), fe.clone(), fn_.clone()],
            None,
            build_sinusoidal,
        ),
        family("Mollweide", "moll", vec![central_longitude(0.0)], None, build_mollweide),
        family("EckertI", "eck1", vec![central_longitude(0.0)], None, build_eckert_i),
        family("EckertII", "eck2", vec![central_longitude(0.0)], None, build_eckert_ii),
        family("EckertIII", "eck3", vec![central_longitude(0.0)], None, build_eckert_iii),
        family("EckertIV", "eck4", vec![central_longitude(0.0)], None, build_eckert_iv),
        family("EckertV", "eck5", vec![central_longitude(0.0)], None, build_eckert_v),
        family("EckertVI", "eck6", vec![central_longitude(0.0)], None, build_eckert_vi),
        family(
            "InterruptedGoodeHomolosine",
            "igh",
            vec![central_longitude(0.0)],
            None,
            build_goode,
        ),
        rotated_pole,
        lambert_conformal,
        albers,
        equidistant_conic,
        family(
            "Orthographic",
            "ortho",
            vec![central_longitude(0.0), central_latitude(0.0)],
            None,
            build_orthographic,
        ),
        family(
            "Stereographic",
            "stere",
            vec![
                central_longitude(0.0),
                central_latitude(0.0),
                scale_factor(1.0),
                fe.clone(),
                fn_.clone(),
            ],
            None,
            build_stereographic,
        ),
        family(
            "AzimuthalEquidistant",
            "aeqd",
            vec![central_longitude(0.0), central_latitude(0.0), fe.clone(), fn_.clone()],
            None,
            build_equidistant,
        ),
        family(
            "LambertAzimuthalEqualArea",
            "laea",
            vec![central_longitude(0.0), central_latitude(0.0), fe.clone(), fn_.clone()],
            None,
            build_equal_area,
        ),
        family(
            "NearsidePerspective",
            "nsper",
            vec![
                central_longitude(0.0),
                central_latitude(0.0),
                ParamSchema::number("satellite_height", "h", 1.0, 1.0e10, GEOSTATIONARY_HEIGHT),
                fe.clone(),
                fn_.clone(),
            ],
            None,
            build_nearside_perspective,
        ),
        family(
            "Geostationary",
            "geos",
            vec![
                central_longitude(0.0),
                ParamSchema::number("satellite_height", "h", 1.0, 1.0e10, GEOSTATIONARY_HEIGHT),
                fe.clone(),
                fn_.clone(),
            ],
            None,
            build_geostationary,
        ),
        family(
            "TransverseMercator",
            "tmerc",
            vec![
                central_longitude(0.0),
                central_latitude(0.0),
                scale_factor(1.0),
                fe,
                fn_,
            ],
            None,
            build_transverse_mercator,
        ),
        family(
            "UTM",
            "utm",
            vec![
                ParamSchema::integer("zone", "zone", 1, 60, None),
                ParamSchema::flag("south", "south", false),
            ],
            None,
            build_utm,
        ),
    ]
}

pub(crate) fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::new(
            "NorthPolarStereo",
            "Stereographic",
            &[("central_latitude", ParamValue::Number(90.0))],
        ),
        Preset::new(
            "SouthPolarStereo",
            "Stereographic",
            &[("central_latitude", ParamValue::Number(-90.0))],
        ),
        Preset::new("EuroPP", "UTM", &[("zone", ParamValue::Integer(32))]),
        Preset::new(
            "OSGB",
            "TransverseMercator",
            &[
                ("central_longitude", ParamValue::Number(-2.0)),
                ("central_latitude", ParamValue::Number(49.0)),
                ("scale_factor", ParamValue::Number(0.999_601_271_7)),
                ("false_easting", ParamValue::Number(400_000.0)),
                ("false_northing", ParamValue::Number(-100_000.0)),
            ],
        ),
        Preset::new(
            "OSNI",
            "TransverseMercator",
            &[
                ("central_longitude", ParamValue::Number(-8.0)),
                ("central_latitude", ParamValue::Number(53.5)),
                ("scale_factor", ParamValue::Number(1.000_035)),
                ("false_easting", ParamValue::Number(200_000.0)),
                ("false_northing", ParamValue::Number(250_000.0)),
            ],
        ),
        Preset::new("Geodetic", "PlateCarree", &[]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Discontinuity;
    use crate::registry::Registry;
    use approx::assert_relative_eq;

    #[test]
    fn test_every_family_resolves_with_defaults() {
        let reg = Registry::with_builtins();
        let names = reg.family_names();
        for expected in [
            "EckertI",
            "EckertII",
            "EckertIII",
            "EckertV",
            "EckertVI",
            "EquidistantConic",
            "Geostationary",
            "InterruptedGoodeHomolosine",
        ] {
            assert!(names.iter().any(|n| n == expected), "{expected} missing");
        }
        for name in names {
            if name == "UTM" {
                continue;
            }
            let spec = reg.default_instance(&name).unwrap();
            let crs = reg.resolve(&spec).unwrap();
            let (x0, x1) = crs.domain().x_limits();
            let (y0, y1) = crs.domain().y_limits();
            assert!(x0 < x1 && y0 < y1, "{name}: degenerate limits");
            assert!(x0.is_finite() && y1.is_finite(), "{name}: non-finite limits");
        }
    }

    #[test]
    fn test_every_preset_resolves() {
        let reg = Registry::with_builtins();
        for name in reg.preset_names() {
            let spec = reg.default_instance(&name).unwrap();
            assert!(reg.resolve(&spec).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_plate_carree_limits() {
        let reg = Registry::with_builtins();
        let spec = reg.default_instance("PlateCarree").unwrap();
        let d = reg.domain_of(&spec).unwrap();
        assert_relative_eq!(d.x_limits().0, -180.0, epsilon = 1e-9);
        assert_relative_eq!(d.x_limits().1, 180.0, epsilon = 1e-9);
        assert_relative_eq!(d.y_limits().0, -90.0, epsilon = 1e-9);
        assert_relative_eq!(d.y_limits().1, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_orthographic_limits_are_the_sphere_radius() {
        let reg = Registry::with_builtins();
        let spec = reg.default_instance("Orthographic").unwrap();
        let d = reg.domain_of(&spec).unwrap();
        assert_relative_eq!(d.x_limits().1, WGS84_SPHERE.a, max_relative = 1e-9);
        assert_relative_eq!(d.y_limits().0, -WGS84_SPHERE.a, max_relative = 1e-9);
    }

    #[test]
    fn test_lambert_conformal_region_follows_cone() {
        let reg = Registry::with_builtins();
        let north = reg.resolve(&reg.default_instance("LambertConformal").unwrap()).unwrap();
        assert!(matches!(north.region(), Region::Rect { lat_max, .. } if (*lat_max - FRAC_PI_2).abs() < 1e-12));

        let south_spec = reg
            .instance(
                "LambertConformal",
                &[
                    ("central_latitude", (-39.0).into()),
                    ("standard_parallel_1", (-33.0).into()),
                    ("standard_parallel_2", (-45.0).into()),
                ],
            )
            .unwrap();
        let south = reg.resolve(&south_spec).unwrap();
        match south.region() {
            Region::Rect { lat_min, lat_max, .. } => {
                assert_relative_eq!(*lat_min, -FRAC_PI_2);
                assert_relative_eq!(*lat_max, 30.0_f64.to_radians(), epsilon = 1e-12);
            }
            other => panic!("unexpected region {other:?}"),
        }
    }

    #[test]
    fn test_polar_stereo_presets_use_polar_formulas() {
        let reg = Registry::with_builtins();
        let spec = reg.default_instance("NorthPolarStereo").unwrap();
        let crs = reg.resolve(&spec).unwrap();
        let (x, y) = crs.from_geographic(0.0, FRAC_PI_2).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);
        assert!(crs.from_geographic(0.0, -0.1).is_err());
    }

    #[test]
    fn test_osgb_preset_matches_national_grid_origin() {
        let reg = Registry::with_builtins();
        let spec = reg.default_instance("OSGB").unwrap();
        let crs = reg.resolve(&spec).unwrap();
        let (x, y) = crs
            .from_geographic((-2.0_f64).to_radians(), 49.0_f64.to_radians())
            .unwrap();
        assert_relative_eq!(x, 400_000.0, epsilon = 1e-2);
        assert_relative_eq!(y, -100_000.0, epsilon = 1e-2);
    }

    #[test]
    fn test_osni_preset_matches_irish_grid_origin() {
        let reg = Registry::with_builtins();
        let spec = reg.default_instance("OSNI").unwrap();
        assert_eq!(spec.number("scale_factor").unwrap(), 1.000_035);
        let crs = reg.resolve(&spec).unwrap();
        let (x, y) = crs
            .from_geographic((-8.0_f64).to_radians(), 53.5_f64.to_radians())
            .unwrap();
        assert_relative_eq!(x, 200_000.0, epsilon = 1e-2);
        assert_relative_eq!(y, 250_000.0, epsilon = 1e-2);
    }

    #[test]
    fn test_goode_region_is_lobed() {
        let reg = Registry::with_builtins();
        let spec = reg
            .instance("InterruptedGoodeHomolosine", &[("central_longitude", 20.0.into())])
            .unwrap();
        let crs = reg.resolve(&spec).unwrap();
        match crs.region() {
            Region::Lobed { lon0, north, south } => {
                assert_relative_eq!(*lon0, 20.0_f64.to_radians());
                assert_eq!((north.len(), south.len()), (1, 3));
            }
            other => panic!("unexpected region {other:?}"),
        }
        let d = crs.domain();
        assert!(matches!(d.discontinuity(), Discontinuity::Interrupted { north, .. } if (north[0] + 20.0).abs() < 1e-9));
        // Full width of the equator is the sphere's circumference.
        assert_relative_eq!(d.x_limits().1 - d.x_limits().0, 2.0 * PI * WGS84_SPHERE.a, max_relative = 1e-9);
    }

    #[test]
    fn test_geostationary_disk_limits() {
        let reg = Registry::with_builtins();
        let spec = reg
            .instance("Geostationary", &[("central_longitude", (-75.0).into())])
            .unwrap();
        let crs = reg.resolve(&spec).unwrap();
        let (x0, x1) = crs.domain().x_limits();
        // The earth's limb seen from orbit, about 8.7° off nadir.
        assert_relative_eq!(x1, -x0, max_relative = 1e-6);
        assert!(x1 > 5.3e6 && x1 < 5.5e6, "{x1}");
        assert!(crs.from_geographic(30.0_f64.to_radians(), 0.0).is_err());
        assert!(crs.from_geographic((-75.0_f64).to_radians(), 0.3).is_ok());
    }

    #[test]
    fn test_utm_band() {
        let reg = Registry::with_builtins();
        let spec = reg.default_instance("EuroPP").unwrap();
        let crs = reg.resolve(&spec).unwrap();
        let (x, _) = crs.from_geographic(9.0_f64.to_radians(), 0.0).unwrap();
        assert_relative_eq!(x, 500_000.0, epsilon = 1e-6);
        assert!(crs
            .from_geographic(9.0_f64.to_radians(), (-85.0_f64).to_radians())
            .is_err());
        assert!(crs.from_geographic(60.0_f64.to_radians(), 0.0).is_err());
    }
}
