/// Function registry
///
/// Maps the `action` names of the catalog to Rust functions. Every function
/// takes the working dataset by value and returns the transformed one, so a
/// replay is a plain fold over the action list.

use std::collections::HashMap;
use std::fmt;

use super::params::ParamValue;
use super::processing;
use crate::data::dataset::Dataset;
use crate::data::region::Span;
use crate::error::{Error, Result};

/// Signature of a processing function
pub type ProcessFn = fn(Dataset, &Kwargs) -> Result<Dataset>;

/// Ordered keyword arguments of an action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kwargs(Vec<(String, ParamValue)>);

impl Kwargs {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, name: &str, value: ParamValue) {
        self.0.push((name.to_string(), value));
    }

    pub fn with(mut self, name: &str, value: ParamValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn invalid(action: &str, name: &str, reason: &str) -> Error {
        Error::InvalidArgument {
            action: action.to_string(),
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Float argument, `default` when absent
    pub fn f64_or(&self, action: &str, name: &str, default: f64) -> Result<f64> {
        match self.get(name) {
            None => Ok(default),
            Some(v) => v
                .as_f64()
                .filter(|x| x.is_finite())
                .ok_or_else(|| Self::invalid(action, name, "expected a finite number")),
        }
    }

    /// Integer argument, `default` when absent
    pub fn i64_or(&self, action: &str, name: &str, default: i64) -> Result<i64> {
        match self.get(name) {
            None => Ok(default),
            Some(v) => v
                .as_i64()
                .ok_or_else(|| Self::invalid(action, name, "expected an integer")),
        }
    }

    pub fn str_or<'a>(&'a self, action: &str, name: &str, default: &'a str) -> Result<&'a str> {
        match self.get(name) {
            None => Ok(default),
            Some(v) => v
                .as_str()
                .ok_or_else(|| Self::invalid(action, name, "expected a string")),
        }
    }

    /// Span list; a `"low, high"` string is accepted as a single span
    pub fn spans(&self, action: &str, name: &str) -> Result<Vec<Span>> {
        match self.get(name) {
            None => Ok(Vec::new()),
            Some(ParamValue::Spans(s)) => Ok(s.clone()),
            Some(ParamValue::Str(s)) => Ok(vec![s.parse()?]),
            Some(_) => Err(Self::invalid(action, name, "expected a list of ranges")),
        }
    }
}

/// One entry of the processing action list
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Step that produced the action
    pub step: String,
    /// Function name in the registry
    pub name: String,
    pub kwargs: Kwargs,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self
            .kwargs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v.to_script_literal()))
            .collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}

/// Named processing functions
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, ProcessFn>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FunctionRegistry {
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registry holding every built-in processing function
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("define_region", processing::define_region);
        registry.register("output", processing::output);
        registry.register("scale", processing::scale);
        registry.register("offset", processing::offset);
        registry.register("baseline", processing::baseline);
        registry.register("smooth", processing::smooth);
        registry.register("em", processing::em);
        registry.register("fft", processing::fft);
        registry.register("normalize", processing::normalize);
        registry.register("transpose", processing::transpose);
        registry
    }

    pub fn register(&mut self, name: &str, function: ProcessFn) {
        self.functions.insert(name.to_string(), function);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn call(&self, name: &str, dataset: Dataset, kwargs: &Kwargs) -> Result<Dataset> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| Error::UnknownAction(name.to_string()))?;
        function(dataset, kwargs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::catalog::Catalog;

    #[test]
    fn test_every_catalog_action_is_registered() {
        let registry = FunctionRegistry::builtin();
        let catalog = Catalog::bundled().unwrap();
        for t in catalog.processors() {
            assert!(registry.contains(&t.action), "missing {}", t.action);
        }
        assert!(registry.contains(&catalog.output().action));
    }

    #[test]
    fn test_unknown_action() {
        let registry = FunctionRegistry::builtin();
        let ds = Dataset::from_values("a", vec![1.0]);
        assert!(matches!(
            registry.call("nope", ds, &Kwargs::new()),
            Err(Error::UnknownAction(_))
        ));
    }

    #[test]
    fn test_kwargs_accessors() {
        let kwargs = Kwargs::new()
            .with("factor", ParamValue::Int(2))
            .with("name", ParamValue::Str("x".into()))
            .with("range", ParamValue::Str("1.0, 2.0".into()));
        assert_eq!(kwargs.f64_or("scale", "factor", 1.0).unwrap(), 2.0);
        assert_eq!(kwargs.f64_or("scale", "missing", 1.5).unwrap(), 1.5);
        assert!(kwargs.f64_or("scale", "name", 1.0).is_err());
        assert_eq!(kwargs.str_or("output", "name", "").unwrap(), "x");
        assert_eq!(
            kwargs.spans("define_region", "range").unwrap(),
            vec![Span::new(1.0, 2.0)]
        );
    }

    #[test]
    fn test_action_display() {
        let action = Action {
            step: "scale#0".into(),
            name: "scale".into(),
            kwargs: Kwargs::new().with("factor", ParamValue::Float(2.0)),
        };
        assert_eq!(action.to_string(), "scale(factor=2.0)");
    }
}
