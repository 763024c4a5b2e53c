//! Projection identity: family name plus a complete, ordered parameter set.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::CrsError;

/// A single parameter value.
#[derive(Clone, Copy, Debug)]
pub enum ParamValue {
    Number(f64),
    Integer(i64),
    Flag(bool),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ParamValue::Number(v) => Some(v),
            ParamValue::Integer(v) => Some(v as f64),
            ParamValue::Flag(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            ParamValue::Flag(v) => Some(v),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Number(_) => "number",
            ParamValue::Integer(_) => "integer",
            ParamValue::Flag(_) => "flag",
        }
    }

    /// Bit pattern used for structural equality; `-0.0` folds onto `0.0`.
    fn number_bits(v: f64) -> u64 {
        if v == 0.0 {
            0.0_f64.to_bits()
        } else {
            v.to_bits()
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (ParamValue::Number(a), ParamValue::Number(b)) => {
                Self::number_bits(a) == Self::number_bits(b)
            }
            (ParamValue::Integer(a), ParamValue::Integer(b)) => a == b,
            (ParamValue::Flag(a), ParamValue::Flag(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match *self {
            ParamValue::Number(v) => Self::number_bits(v).hash(state),
            ParamValue::Integer(v) => v.hash(state),
            ParamValue::Flag(v) => v.hash(state),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Integer(i64::from(v))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Flag(v)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(v) => write!(f, "{v}"),
            ParamValue::Integer(v) => write!(f, "{v}"),
            ParamValue::Flag(v) => write!(f, "{v}"),
        }
    }
}

/// Immutable identity of a projection instance.
///
/// Every parameter of the family's schema is present, in schema order, so
/// two specs built from the same effective values compare equal no matter
/// how they were constructed (defaults, overrides, presets, text).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProjectionSpec {
    family: String,
    params: Vec<(String, ParamValue)>,
}

impl ProjectionSpec {
    /// Only the registry builds specs; values are assumed validated.
    pub(crate) fn new(family: impl Into<String>, params: Vec<(String, ParamValue)>) -> Self {
        Self {
            family: family.into(),
            params,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn params(&self) -> &[(String, ParamValue)] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Numeric parameter value (integers widen to `f64`).
    pub fn number(&self, name: &str) -> Result<f64, CrsError> {
        self.get(name)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| self.missing(name))
    }

    pub fn flag(&self, name: &str) -> Result<bool, CrsError> {
        self.get(name)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| self.missing(name))
    }

    /// Numeric parameter converted from degrees to radians.
    pub fn radians(&self, name: &str) -> Result<f64, CrsError> {
        self.number(name).map(f64::to_radians)
    }

    fn missing(&self, name: &str) -> CrsError {
        CrsError::MissingRequiredParameter {
            family: self.family.clone(),
            param: name.to_string(),
        }
    }
}

impl fmt::Display for ProjectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.family)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}
