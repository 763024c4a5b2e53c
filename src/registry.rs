//! Projection registry: family schemas, presets and the resolved-CRS cache.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use log::debug;

use crate::crs::{Crs, Model};
use crate::domain::Domain;
use crate::error::CrsError;
use crate::families;
use crate::spec::{ParamValue, ProjectionSpec};

/// Value kind and accepted range of a parameter. Bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamKind {
    Number { min: f64, max: f64 },
    Integer { min: i64, max: i64 },
    Flag,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParamSchema {
    pub name: String,
    /// Key used in the textual parameter form.
    pub proj_key: String,
    pub kind: ParamKind,
    /// `None` makes the parameter required.
    pub default: Option<ParamValue>,
}

impl ParamSchema {
    pub fn number(name: &str, proj_key: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            proj_key: proj_key.to_string(),
            kind: ParamKind::Number { min, max },
            default: Some(ParamValue::Number(default)),
        }
    }

    pub fn integer(name: &str, proj_key: &str, min: i64, max: i64, default: Option<i64>) -> Self {
        Self {
            name: name.to_string(),
            proj_key: proj_key.to_string(),
            kind: ParamKind::Integer { min, max },
            default: default.map(ParamValue::Integer),
        }
    }

    pub fn flag(name: &str, proj_key: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            proj_key: proj_key.to_string(),
            kind: ParamKind::Flag,
            default: Some(ParamValue::Flag(default)),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Check `value` against this parameter's kind and range. Integers are
    /// accepted for numeric parameters and widened.
    fn check(&self, family: &str, value: ParamValue) -> Result<ParamValue, CrsError> {
        let invalid = |reason: String| CrsError::InvalidParameter {
            family: family.to_string(),
            param: self.name.clone(),
            reason,
        };
        match (self.kind, value) {
            (ParamKind::Number { min, max }, ParamValue::Number(_) | ParamValue::Integer(_)) => {
                let v = value.as_f64().unwrap_or(f64::NAN);
                if !v.is_finite() {
                    return Err(invalid(format!("{v} is not finite")));
                }
                if v < min || v > max {
                    return Err(invalid(format!("{v} is outside [{min}, {max}]")));
                }
                Ok(ParamValue::Number(v))
            }
            (ParamKind::Integer { min, max }, ParamValue::Integer(v)) => {
                if v < min || v > max {
                    return Err(invalid(format!("{v} is outside [{min}, {max}]")));
                }
                Ok(value)
            }
            (ParamKind::Flag, ParamValue::Flag(_)) => Ok(value),
            (kind, other) => Err(invalid(format!(
                "expected {}, got {}",
                match kind {
                    ParamKind::Number { .. } => "number",
                    ParamKind::Integer { .. } => "integer",
                    ParamKind::Flag => "flag",
                },
                other.kind_name()
            ))),
        }
    }
}

/// Cross-parameter check run after per-parameter validation.
pub type Validator = fn(&ProjectionSpec) -> Result<(), CrsError>;

/// Builds the projection math and valid region for a validated spec.
pub type Builder = fn(&ProjectionSpec) -> Result<Model, CrsError>;

#[derive(Clone, Debug)]
pub struct FamilySchema {
    pub name: String,
    /// Value of the `proj` token in the textual form.
    pub proj_name: String,
    /// Literal tokens always present in the textual form.
    pub fixed_tokens: Vec<String>,
    pub params: Vec<ParamSchema>,
    pub validate: Option<Validator>,
    pub build: Builder,
}

impl FamilySchema {
    pub fn param(&self, name: &str) -> Option<&ParamSchema> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn param_by_key(&self, proj_key: &str) -> Option<&ParamSchema> {
        self.params.iter().find(|p| p.proj_key == proj_key)
    }

    /// Validate overrides and produce the complete spec.
    fn instantiate<'a, I>(&self, overrides: I) -> Result<ProjectionSpec, CrsError>
    where
        I: IntoIterator<Item = (&'a str, ParamValue)>,
    {
        let mut given: BTreeMap<&str, ParamValue> = BTreeMap::new();
        for (name, value) in overrides {
            let param = self.param(name).ok_or_else(|| CrsError::InvalidParameter {
                family: self.name.clone(),
                param: name.to_string(),
                reason: "unknown parameter".to_string(),
            })?;
            given.insert(param.name.as_str(), param.check(&self.name, value)?);
        }

        let params = self
            .params
            .iter()
            .map(|p| {
                given
                    .get(p.name.as_str())
                    .copied()
                    .or(p.default)
                    .map(|v| (p.name.clone(), v))
                    .ok_or_else(|| CrsError::MissingRequiredParameter {
                        family: self.name.clone(),
                        param: p.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let spec = ProjectionSpec::new(self.name.clone(), params);
        if let Some(validate) = self.validate {
            validate(&spec)?;
        }
        Ok(spec)
    }
}

/// Named configuration record: a family plus overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    pub name: String,
    pub family: String,
    pub overrides: Vec<(String, ParamValue)>,
}

impl Preset {
    pub fn new(name: &str, family: &str, overrides: &[(&str, ParamValue)]) -> Self {
        Self {
            name: name.to_string(),
            family: family.to_string(),
            overrides: overrides
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }
}

/// Catalog of projection families and presets, and the cache of resolved
/// CRS instances. `Send + Sync`; registration is expected during setup.
pub struct Registry {
    families: RwLock<BTreeMap<String, Arc<FamilySchema>>>,
    presets: RwLock<BTreeMap<String, Arc<Preset>>>,
    resolved: DashMap<ProjectionSpec, Arc<Crs>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Registry {
    /// A registry with no families.
    pub fn empty() -> Self {
        Self {
            families: RwLock::new(BTreeMap::new()),
            presets: RwLock::new(BTreeMap::new()),
            resolved: DashMap::new(),
        }
    }

    /// A registry holding the built-in families and presets.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        {
            let mut family_table = registry.families.write().unwrap_or_else(PoisonError::into_inner);
            for schema in families::builtin_families() {
                family_table.insert(schema.name.clone(), Arc::new(schema));
            }
            let mut preset_table = registry.presets.write().unwrap_or_else(PoisonError::into_inner);
            for preset in families::builtin_presets() {
                preset_table.insert(preset.name.clone(), Arc::new(preset));
            }
            debug!(
                "registry initialised with {} families and {} presets",
                family_table.len(),
                preset_table.len()
            );
        }
        registry
    }

    pub fn lookup(&self, family: &str) -> Result<Arc<FamilySchema>, CrsError> {
        self.families
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(family)
            .cloned()
            .ok_or_else(|| CrsError::UnknownFamily(family.to_string()))
    }

    pub fn preset(&self, name: &str) -> Option<Arc<Preset>> {
        self.presets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Family whose textual `proj` name is `proj_name`.
    pub fn by_proj_name(&self, proj_name: &str) -> Option<Arc<FamilySchema>> {
        self.families
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|f| f.proj_name == proj_name)
            .cloned()
    }

    pub fn family_names(&self) -> Vec<String> {
        self.families
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn preset_names(&self) -> Vec<String> {
        self.presets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn default_instance(&self, family: &str) -> Result<ProjectionSpec, CrsError> {
        self.instance::<&str>(family, &[])
    }

    /// Spec for a family or preset `name` with `overrides` applied on top of
    /// the preset's own overrides. Later overrides of the same name win.
    pub fn instance<S: AsRef<str>>(
        &self,
        name: &str,
        overrides: &[(S, ParamValue)],
    ) -> Result<ProjectionSpec, CrsError> {
        let extra = overrides.iter().map(|(k, v)| (k.as_ref(), *v));
        if let Ok(schema) = self.lookup(name) {
            return schema.instantiate(extra);
        }
        let preset = self
            .preset(name)
            .ok_or_else(|| CrsError::UnknownFamily(name.to_string()))?;
        let schema = self.lookup(&preset.family)?;
        schema.instantiate(
            preset
                .overrides
                .iter()
                .map(|(k, v)| (k.as_str(), *v))
                .chain(extra),
        )
    }

    /// Add a family. Names and textual `proj` names must be unique, and
    /// every default must satisfy its own parameter's kind and range.
    pub fn register(&self, schema: FamilySchema) -> Result<(), CrsError> {
        for param in &schema.params {
            if let Some(default) = param.default {
                param.check(&schema.name, default)?;
            }
        }
        let mut families = self.families.write().unwrap_or_else(PoisonError::into_inner);
        if families.contains_key(&schema.name) {
            return Err(CrsError::DuplicateFamily(schema.name));
        }
        if families.values().any(|f| f.proj_name == schema.proj_name) {
            return Err(CrsError::DuplicateFamily(format!(
                "{} (+proj={})",
                schema.name, schema.proj_name
            )));
        }
        debug!(
            "registered projection family {} (+proj={}, {} parameters)",
            schema.name,
            schema.proj_name,
            schema.params.len()
        );
        families.insert(schema.name.clone(), Arc::new(schema));
        Ok(())
    }

    /// Add a preset, validated like any other instance request.
    pub fn register_preset(&self, preset: Preset) -> Result<(), CrsError> {
        if self.lookup(&preset.name).is_ok() || self.preset(&preset.name).is_some() {
            return Err(CrsError::DuplicateFamily(preset.name));
        }
        let schema = self.lookup(&preset.family)?;
        let spec = schema.instantiate(preset.overrides.iter().map(|(k, v)| (k.as_str(), *v)))?;
        debug!("registered preset {} = {}", preset.name, spec);
        self.presets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(preset.name.clone(), Arc::new(preset));
        Ok(())
    }

    /// Resolved CRS for `spec`, built once and cached. Concurrent callers
    /// may both build; the first insert wins.
    pub fn resolve(&self, spec: &ProjectionSpec) -> Result<Arc<Crs>, CrsError> {
        if let Some(crs) = self.resolved.get(spec) {
            return Ok(crs.clone());
        }
        let schema = self.lookup(spec.family())?;
        let model = (schema.build)(spec)?;
        let crs = Arc::new(Crs::new(Arc::new(spec.clone()), model));
        debug!(
            "resolved {}: x_limits={:?} y_limits={:?}",
            spec,
            crs.domain().x_limits(),
            crs.domain().y_limits()
        );
        let entry = self.resolved.entry(spec.clone()).or_insert(crs);
        Ok(entry.value().clone())
    }

    pub fn domain_of(&self, spec: &ProjectionSpec) -> Result<Domain, CrsError> {
        Ok(self.resolve(spec)?.domain().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Region;
    use crate::proj::equirectangular::Equirectangular;
    use approx::assert_relative_eq;

    fn custom_family(name: &str, proj_name: &str) -> FamilySchema {
        FamilySchema {
            name: name.to_string(),
            proj_name: proj_name.to_string(),
            fixed_tokens: Vec::new(),
            params: vec![ParamSchema::number("central_longitude", "lon_0", -180.0, 180.0, 0.0)],
            validate: None,
            build: |spec| {
                let lon0 = spec.radians("central_longitude")?;
                Ok(Model {
                    projection: Box::new(Equirectangular::degrees(lon0)),
                    rotation: None,
                    region: Region::globe(lon0),
                })
            },
        }
    }

    #[test]
    fn test_lookup_unknown_family() {
        let reg = Registry::with_builtins();
        assert!(matches!(reg.lookup("Nope"), Err(CrsError::UnknownFamily(_))));
        assert!(matches!(
            reg.default_instance("Nope"),
            Err(CrsError::UnknownFamily(_))
        ));
    }

    #[test]
    fn test_defaults_fill_every_parameter() {
        let reg = Registry::with_builtins();
        let spec = reg.default_instance("LambertConformal").unwrap();
        let schema = reg.lookup("LambertConformal").unwrap();
        assert_eq!(spec.params().len(), schema.params.len());
        assert_relative_eq!(spec.number("central_longitude").unwrap(), -96.0);
    }

    #[test]
    fn test_structural_equality_across_construction_paths() {
        let reg = Registry::with_builtins();
        let a = reg.default_instance("Mercator").unwrap();
        let b = reg
            .instance("Mercator", &[("central_longitude", ParamValue::Integer(0))])
            .unwrap();
        assert_eq!(a, b);

        let preset = reg.default_instance("EuroPP").unwrap();
        let explicit = reg
            .instance("UTM", &[("zone", ParamValue::Integer(32))])
            .unwrap();
        assert_eq!(preset, explicit);
        assert_eq!(preset.family(), "UTM");
    }

    #[test]
    fn test_parameter_errors() {
        let reg = Registry::with_builtins();
        let out_of_range = reg.instance("Mercator", &[("central_longitude", 200.0.into())]);
        assert!(matches!(out_of_range, Err(CrsError::InvalidParameter { .. })));

        let unknown = reg.instance("Mercator", &[("colour", 1.0.into())]);
        assert!(matches!(unknown, Err(CrsError::InvalidParameter { .. })));

        let wrong_kind = reg.instance("UTM", &[("zone", 32.5.into())]);
        assert!(matches!(wrong_kind, Err(CrsError::InvalidParameter { .. })));

        let missing = reg.default_instance("UTM");
        assert!(matches!(
            missing,
            Err(CrsError::MissingRequiredParameter { ref param, .. }) if param == "zone"
        ));

        let nan = reg.instance("Mercator", &[("central_longitude", f64::NAN.into())]);
        assert!(matches!(nan, Err(CrsError::InvalidParameter { .. })));
    }

    #[test]
    fn test_compound_validation() {
        let reg = Registry::with_builtins();
        let symmetric = reg.instance(
            "LambertConformal",
            &[
                ("standard_parallel_1", (-30.0).into()),
                ("standard_parallel_2", 30.0.into()),
            ],
        );
        assert!(matches!(symmetric, Err(CrsError::InvalidParameter { .. })));

        let inverted = reg.instance(
            "Mercator",
            &[("min_latitude", 10.0.into()), ("max_latitude", 5.0.into())],
        );
        assert!(matches!(inverted, Err(CrsError::InvalidParameter { .. })));

        let ambiguous_pole = reg.instance(
            "RotatedPole",
            &[("pole_latitude", 90.0.into()), ("pole_longitude", 10.0.into())],
        );
        assert!(matches!(ambiguous_pole, Err(CrsError::InvalidParameter { .. })));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let reg = Registry::with_builtins();
        assert!(matches!(
            reg.register(custom_family("Mercator", "xyz")),
            Err(CrsError::DuplicateFamily(_))
        ));
        assert!(matches!(
            reg.register(custom_family("Other", "merc")),
            Err(CrsError::DuplicateFamily(_))
        ));
        reg.register(custom_family("Custom", "custom")).unwrap();
        let spec = reg.default_instance("Custom").unwrap();
        assert!(reg.resolve(&spec).is_ok());
    }

    #[test]
    fn test_register_preset_validates() {
        let reg = Registry::with_builtins();
        let bad = Preset::new("Broken", "UTM", &[("zone", 99.into())]);
        assert!(matches!(
            reg.register_preset(bad),
            Err(CrsError::InvalidParameter { .. })
        ));
        let clash = Preset::new("Mercator", "PlateCarree", &[]);
        assert!(matches!(
            reg.register_preset(clash),
            Err(CrsError::DuplicateFamily(_))
        ));
        let ok = Preset::new("Pacific", "PlateCarree", &[("central_longitude", 180.0.into())]);
        reg.register_preset(ok).unwrap();
        let spec = reg
            .instance("Pacific", &[("central_longitude", 170.0.into())])
            .unwrap();
        assert_relative_eq!(spec.number("central_longitude").unwrap(), 170.0);
    }

    #[test]
    fn test_resolve_is_cached() {
        let reg = Registry::with_builtins();
        let spec = reg.default_instance("Mollweide").unwrap();
        let a = reg.resolve(&spec).unwrap();
        let b = reg.resolve(&spec.clone()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.domain_of(&spec).unwrap(), a.domain().clone());
    }

    #[test]
    fn test_concurrent_resolve_shares_one_crs() {
        let reg = Registry::with_builtins();
        let spec = reg
            .instance("InterruptedGoodeHomolosine", &[("central_longitude", 20.0.into())])
            .unwrap();
        let (reg, spec) = (&reg, &spec);
        let resolved: Vec<Arc<Crs>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(move || reg.resolve(spec).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let first = &resolved[0];
        for crs in &resolved[1..] {
            assert!(Arc::ptr_eq(first, crs));
            assert_eq!(crs.domain(), first.domain());
        }
        assert!(Arc::ptr_eq(first, &reg.resolve(spec).unwrap()));
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
