/// Typed parameters of processing steps

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::region::Span;
use crate::error::{Error, Result};

/// A parameter value as stored in the tree and passed to actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Spans(Vec<Span>),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            ParamValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to the representation expected by `ty`
    pub fn coerce(&self, ty: ParamType) -> Option<ParamValue> {
        match ty {
            ParamType::Bool => match self {
                ParamValue::Bool(b) => Some(ParamValue::Bool(*b)),
                ParamValue::Int(v) => Some(ParamValue::Bool(*v != 0)),
                ParamValue::Str(s) => match s.to_lowercase().as_str() {
                    "true" => Some(ParamValue::Bool(true)),
                    "false" => Some(ParamValue::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            ParamType::Int => self.as_i64().map(ParamValue::Int),
            ParamType::Float => self.as_f64().map(ParamValue::Float),
            ParamType::Str | ParamType::List => match self {
                ParamValue::Str(s) => Some(ParamValue::Str(s.clone())),
                ParamValue::Spans(_) => None,
                other => Some(ParamValue::Str(other.to_string())),
            },
            ParamType::RegionGroup => None,
        }
    }

    /// Rendering used in exported scripts
    pub fn to_script_literal(&self) -> String {
        match self {
            ParamValue::Bool(true) => "True".to_string(),
            ParamValue::Bool(false) => "False".to_string(),
            ParamValue::Int(v) => v.to_string(),
            ParamValue::Float(v) => format_float(*v),
            ParamValue::Str(s) => format!("{:?}", s),
            ParamValue::Spans(spans) => format_ranges(spans),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", format_float(*v)),
            ParamValue::Str(s) => write!(f, "{}", s),
            ParamValue::Spans(spans) => write!(f, "{}", format_ranges(spans)),
        }
    }
}

/// Float with at least one decimal so it reads back as a float
fn format_float(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// `[[low, high], ...]`
pub fn format_ranges(spans: &[Span]) -> String {
    let inner: Vec<String> = spans
        .iter()
        .map(|s| format!("[{}, {}]", format_float(s.low), format_float(s.high)))
        .collect();
    format!("[{}]", inner.join(", "))
}

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Bool,
    Int,
    Float,
    Str,
    List,
    #[serde(rename = "regiongroup")]
    RegionGroup,
}

/// Parameter template as written in the processor catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub ty: ParamType,
    #[serde(default)]
    pub value: Option<ParamValue>,
    #[serde(default)]
    pub limits: Option<[f64; 2]>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub tip: String,
    #[serde(default)]
    pub readonly: bool,
}

impl ParamSpec {
    fn default_value(&self) -> ParamValue {
        let fallback = match self.ty {
            ParamType::Bool => ParamValue::Bool(false),
            ParamType::Int => ParamValue::Int(0),
            ParamType::Float => ParamValue::Float(0.0),
            ParamType::Str | ParamType::RegionGroup => ParamValue::Str(String::new()),
            ParamType::List => {
                ParamValue::Str(self.values.first().cloned().unwrap_or_default())
            }
        };
        self.value
            .as_ref()
            .and_then(|v| v.coerce(self.ty))
            .unwrap_or(fallback)
    }
}

/// A live parameter of a processing step
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub title: String,
    pub ty: ParamType,
    pub value: ParamValue,
    pub limits: Option<[f64; 2]>,
    pub values: Vec<String>,
    pub tip: String,
    pub readonly: bool,
}

impl Param {
    pub fn from_spec(spec: &ParamSpec) -> Self {
        Self {
            name: spec.name.clone(),
            title: spec.title.clone().unwrap_or_else(|| spec.name.clone()),
            ty: spec.ty,
            value: spec.default_value(),
            limits: spec.limits,
            values: spec.values.clone(),
            tip: spec.tip.clone(),
            readonly: spec.readonly,
        }
    }

    /// Validate and store a new value; returns the value actually stored
    pub fn set_value(&mut self, value: ParamValue) -> Result<ParamValue> {
        if self.readonly {
            return Err(Error::ReadOnly(self.name.clone()));
        }
        self.assign(value)
    }

    /// Store a value bypassing the read-only flag (state restore)
    pub(crate) fn assign(&mut self, value: ParamValue) -> Result<ParamValue> {
        let mut coerced = value.coerce(self.ty).ok_or_else(|| {
            Error::Parse(format!("`{}` is not a valid {:?} for `{}`", value, self.ty, self.name))
        })?;
        if let Some([lo, hi]) = self.limits.filter(|[lo, hi]| lo <= hi) {
            coerced = match coerced {
                ParamValue::Float(v) => ParamValue::Float(v.clamp(lo, hi)),
                ParamValue::Int(v) => ParamValue::Int(v.clamp(lo as i64, hi as i64)),
                other => other,
            };
        }
        if self.ty == ParamType::List && !self.values.is_empty() {
            let s = coerced.as_str().unwrap_or_default();
            if !self.values.iter().any(|v| v == s) {
                return Err(Error::Parse(format!(
                    "`{}` is not one of {:?} for `{}`",
                    s, self.values, self.name
                )));
            }
        }
        self.value = coerced.clone();
        Ok(coerced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_spec() -> ParamSpec {
        ParamSpec {
            name: "factor".into(),
            title: None,
            ty: ParamType::Float,
            value: Some(ParamValue::Int(2)),
            limits: Some([0.0, 10.0]),
            values: vec![],
            tip: String::new(),
            readonly: false,
        }
    }

    #[test]
    fn test_default_value_is_coerced() {
        let p = Param::from_spec(&float_spec());
        assert_eq!(p.value, ParamValue::Float(2.0));
        assert_eq!(p.title, "factor");
    }

    #[test]
    fn test_set_value_clamps_to_limits() {
        let mut p = Param::from_spec(&float_spec());
        let stored = p.set_value(ParamValue::Float(42.0)).unwrap();
        assert_eq!(stored, ParamValue::Float(10.0));
    }

    #[test]
    fn test_readonly_rejects() {
        let mut spec = float_spec();
        spec.readonly = true;
        let mut p = Param::from_spec(&spec);
        assert!(matches!(
            p.set_value(ParamValue::Float(1.0)),
            Err(Error::ReadOnly(_))
        ));
    }

    #[test]
    fn test_list_membership() {
        let spec = ParamSpec {
            name: "kind".into(),
            title: None,
            ty: ParamType::List,
            value: None,
            limits: None,
            values: vec!["undefined".into(), "mask".into()],
            tip: String::new(),
            readonly: false,
        };
        let mut p = Param::from_spec(&spec);
        assert_eq!(p.value, ParamValue::Str("undefined".into()));
        assert!(p.set_value(ParamValue::Str("mask".into())).is_ok());
        assert!(p.set_value(ParamValue::Str("peak".into())).is_err());
    }

    #[test]
    fn test_untagged_json_forms() {
        let v: ParamValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, ParamValue::Float(2.5));
        let v: ParamValue = serde_json::from_str("3").unwrap();
        assert_eq!(v, ParamValue::Int(3));
        let v: ParamValue = serde_json::from_str("\"2.0, 5.0\"").unwrap();
        assert_eq!(v, ParamValue::Str("2.0, 5.0".into()));
    }

    #[test]
    fn test_script_literals() {
        assert_eq!(ParamValue::Float(2.0).to_script_literal(), "2.0");
        assert_eq!(ParamValue::Bool(true).to_script_literal(), "True");
        assert_eq!(ParamValue::Str("a".into()).to_script_literal(), "\"a\"");
        assert_eq!(
            ParamValue::Spans(vec![Span::new(2.0, 5.0)]).to_script_literal(),
            "[[2.0, 5.0]]"
        );
    }
}
