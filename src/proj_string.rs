//! Textual parameter form: `+proj=<name> +key=value ... +ellps=WGS84 +no_defs`.
//!
//! Only the parameters a family declares are understood; this is a
//! round-trip format for specs, not a general PROJ parser.

use std::collections::BTreeSet;

use crate::error::CrsError;
use crate::registry::{FamilySchema, ParamKind, Registry};
use crate::spec::{ParamValue, ProjectionSpec};

const ELLIPSOID: &str = "WGS84";

/// Render `spec` in textual form. Flags appear as a bare `+key` when set
/// and are left out otherwise.
pub fn to_proj_string(registry: &Registry, spec: &ProjectionSpec) -> Result<String, CrsError> {
    Ok(tokens(registry, spec)?
        .iter()
        .map(|t| format!("+{t}"))
        .collect::<Vec<_>>()
        .join(" "))
}

/// The tokens of [`to_proj_string`] without their `+`, for comparisons
/// that ignore order.
pub fn proj_params(registry: &Registry, spec: &ProjectionSpec) -> Result<BTreeSet<String>, CrsError> {
    Ok(tokens(registry, spec)?.into_iter().collect())
}

fn tokens(registry: &Registry, spec: &ProjectionSpec) -> Result<Vec<String>, CrsError> {
    let schema = registry.lookup(spec.family())?;
    let mut out = vec![format!("proj={}", schema.proj_name)];
    out.extend(schema.fixed_tokens.iter().cloned());
    for param in &schema.params {
        let Some(value) = spec.get(&param.name) else {
            continue;
        };
        match value {
            ParamValue::Flag(true) => out.push(param.proj_key.clone()),
            ParamValue::Flag(false) => {}
            other => out.push(format!("{}={other}", param.proj_key)),
        }
    }
    out.push(format!("ellps={ELLIPSOID}"));
    out.push("no_defs".to_string());
    Ok(out)
}

/// Parse the textual form back into a validated spec.
pub fn parse_proj_string(registry: &Registry, text: &str) -> Result<ProjectionSpec, CrsError> {
    let mut proj_name = None;
    let mut pairs: Vec<(&str, Option<&str>)> = Vec::new();
    for token in text.split_whitespace() {
        let body = token.strip_prefix('+').ok_or_else(|| {
            CrsError::MalformedProjString(format!("token {token:?} does not start with '+'"))
        })?;
        let (key, value) = match body.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (body, None),
        };
        if key.is_empty() {
            return Err(CrsError::MalformedProjString(format!("empty key in {token:?}")));
        }
        if key == "proj" {
            proj_name = value;
        } else {
            pairs.push((key, value));
        }
    }

    let proj_name =
        proj_name.ok_or_else(|| CrsError::UnknownFamily("no +proj token".to_string()))?;
    let schema = registry
        .by_proj_name(proj_name)
        .ok_or_else(|| CrsError::UnknownFamily(format!("+proj={proj_name}")))?;

    let mut overrides: Vec<(String, ParamValue)> = Vec::new();
    for (key, value) in pairs {
        if is_fixed(&schema, key, value) || (key == "no_defs" && value.is_none()) {
            continue;
        }
        if key == "ellps" {
            if value == Some(ELLIPSOID) {
                continue;
            }
            return Err(invalid(&schema, key, format!("unsupported ellipsoid {value:?}")));
        }
        let param = schema
            .param_by_key(key)
            .ok_or_else(|| invalid(&schema, key, "unknown parameter".to_string()))?;
        let parsed = match (param.kind, value) {
            (ParamKind::Flag, None) => ParamValue::Flag(true),
            (ParamKind::Flag, Some(v)) => {
                return Err(CrsError::MalformedProjString(format!(
                    "flag +{key} takes no value, got {v:?}"
                )))
            }
            (_, None) => {
                return Err(CrsError::MalformedProjString(format!("+{key} needs a value")))
            }
            (ParamKind::Integer { .. }, Some(v)) => ParamValue::Integer(v.parse().map_err(|_| {
                CrsError::MalformedProjString(format!("+{key}={v} is not an integer"))
            })?),
            (ParamKind::Number { .. }, Some(v)) => ParamValue::Number(v.parse().map_err(|_| {
                CrsError::MalformedProjString(format!("+{key}={v} is not a number"))
            })?),
        };
        overrides.push((param.name.clone(), parsed));
    }

    registry.instance(&schema.name, &overrides)
}

fn is_fixed(schema: &FamilySchema, key: &str, value: Option<&str>) -> bool {
    schema.fixed_tokens.iter().any(|t| match (t.split_once('='), value) {
        (Some((k, v)), Some(value)) => k == key && v == value,
        (None, None) => t == key,
        _ => false,
    })
}

fn invalid(schema: &FamilySchema, key: &str, reason: String) -> CrsError {
    CrsError::InvalidParameter {
        family: schema.name.clone(),
        param: key.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mercator_string() {
        let reg = Registry::with_builtins();
        let spec = reg
            .instance("Mercator", &[("central_longitude", 10.0.into())])
            .unwrap();
        let text = to_proj_string(&reg, &spec).unwrap();
        assert!(text.starts_with("+proj=merc "));
        assert!(text.contains("+lon_0=10"));
        assert!(text.ends_with("+ellps=WGS84 +no_defs"));
    }

    #[test]
    fn test_round_trip_every_default() {
        let reg = Registry::with_builtins();
        for family in reg.family_names() {
            let spec = reg.default_instance(&family);
            let Ok(spec) = spec else {
                continue;
            };
            let text = to_proj_string(&reg, &spec).unwrap();
            let back = parse_proj_string(&reg, &text).unwrap();
            assert_eq!(back, spec, "{text}");
        }
    }

    #[test]
    fn test_flags_and_integers() {
        let reg = Registry::with_builtins();
        let spec = reg
            .instance("UTM", &[("zone", 33.into()), ("south", true.into())])
            .unwrap();
        let params = proj_params(&reg, &spec).unwrap();
        assert!(params.contains("proj=utm"));
        assert!(params.contains("zone=33"));
        assert!(params.contains("south"));
        assert!(params.contains("no_defs"));

        let north = reg.instance("UTM", &[("zone", 33.into())]).unwrap();
        assert!(!proj_params(&reg, &north).unwrap().contains("south"));
    }

    #[test]
    fn test_token_order_does_not_matter() {
        let reg = Registry::with_builtins();
        let a = parse_proj_string(&reg, "+proj=merc +lon_0=20 +ellps=WGS84 +no_defs").unwrap();
        let b = parse_proj_string(&reg, "+no_defs +lon_0=20 +proj=merc").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_errors() {
        let reg = Registry::with_builtins();
        assert!(matches!(
            parse_proj_string(&reg, "+lon_0=0"),
            Err(CrsError::UnknownFamily(_))
        ));
        assert!(matches!(
            parse_proj_string(&reg, "+proj=nope"),
            Err(CrsError::UnknownFamily(_))
        ));
        assert!(matches!(
            parse_proj_string(&reg, "+proj=merc +bogus=1"),
            Err(CrsError::InvalidParameter { .. })
        ));
        assert!(matches!(
            parse_proj_string(&reg, "+proj=merc +lon_0=abc"),
            Err(CrsError::MalformedProjString(_))
        ));
        assert!(matches!(
            parse_proj_string(&reg, "proj=merc"),
            Err(CrsError::MalformedProjString(_))
        ));
        assert!(matches!(
            parse_proj_string(&reg, "+proj=merc +ellps=GRS80"),
            Err(CrsError::InvalidParameter { .. })
        ));
    }
}
