/// Spans and region kinds
///
/// A span is an interval `(low, high)` on the x dimension of a dataset.
/// Spans are stored in the parameter tree as `"low, high"` strings with one
/// decimal, so parsing and formatting go through this module only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// What a region is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    #[default]
    Undefined,
    Baseline,
    Integral,
    Mask,
}

impl RegionKind {
    pub const ALL: [RegionKind; 4] = [
        RegionKind::Undefined,
        RegionKind::Baseline,
        RegionKind::Integral,
        RegionKind::Mask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Undefined => "undefined",
            RegionKind::Baseline => "baseline",
            RegionKind::Integral => "integral",
            RegionKind::Mask => "mask",
        }
    }

    pub fn is_defined(&self) -> bool {
        *self != RegionKind::Undefined
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "undefined" | "" => Ok(RegionKind::Undefined),
            "baseline" => Ok(RegionKind::Baseline),
            "integral" => Ok(RegionKind::Integral),
            "mask" => Ok(RegionKind::Mask),
            other => Err(Error::Parse(format!("unknown region kind `{}`", other))),
        }
    }
}

/// An interval on one dataset dimension.
///
/// Serialized as a two-element array `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Span {
    pub low: f64,
    pub high: f64,
}

impl Span {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Span centred on `mid` extending `half_width` on each side
    pub fn centered(mid: f64, half_width: f64) -> Self {
        Self::new(mid - half_width, mid + half_width)
    }

    /// Default span for a new region: centred on the visible range,
    /// 1/50th of the visible width on each side.
    pub fn default_for_view(view: (f64, f64)) -> Self {
        let (a, b) = view;
        let mid = (a + b) / 2.0;
        let w = (b - a).abs() / 50.0;
        Self::centered(mid, w)
    }

    /// Lower and upper bound regardless of the order the user dragged them in
    pub fn ordered(&self) -> (f64, f64) {
        if self.low <= self.high {
            (self.low, self.high)
        } else {
            (self.high, self.low)
        }
    }

    /// Half-open containment test on the ordered bounds
    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = self.ordered();
        x >= lo && x < hi
    }

    pub fn is_finite(&self) -> bool {
        self.low.is_finite() && self.high.is_finite()
    }

    /// Value as it is displayed and persisted in the parameter tree
    pub fn to_param_string(&self) -> String {
        format!("{:.1}, {:.1}", self.low, self.high)
    }
}

impl From<[f64; 2]> for Span {
    fn from(v: [f64; 2]) -> Self {
        Span::new(v[0], v[1])
    }
}

impl From<Span> for [f64; 2] {
    fn from(s: Span) -> Self {
        [s.low, s.high]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}, {:.1}", self.low, self.high)
    }
}

impl FromStr for Span {
    type Err = Error;

    /// Accepts `"2.0, 5.0"`, `"(2.0, 5.0)"` and `"[2, 5]"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .trim_start_matches(['(', '['])
            .trim_end_matches([')', ']']);
        let parts: Vec<&str> = inner
            .split([',', ';'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 2 {
            return Err(Error::InvalidSpan(s.to_string()));
        }
        let low: f64 = parts[0]
            .parse()
            .map_err(|_| Error::InvalidSpan(s.to_string()))?;
        let high: f64 = parts[1]
            .parse()
            .map_err(|_| Error::InvalidSpan(s.to_string()))?;
        let span = Span::new(low, high);
        if !span.is_finite() {
            return Err(Error::InvalidSpan(s.to_string()));
        }
        Ok(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let a: Span = "2.0, 5.0".parse().unwrap();
        let b: Span = "(2.0, 5.0)".parse().unwrap();
        let c: Span = "[2, 5]".parse().unwrap();
        assert_eq!(a, Span::new(2.0, 5.0));
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("undefined".parse::<Span>().is_err());
        assert!("1.0".parse::<Span>().is_err());
        assert!("1.0, 2.0, 3.0".parse::<Span>().is_err());
        assert!("nan, 2.0".parse::<Span>().is_err());
    }

    #[test]
    fn test_param_string_one_decimal() {
        let s = Span::new(1.234, 5.678);
        assert_eq!(s.to_param_string(), "1.2, 5.7");
        assert_eq!(s.to_string(), "1.2, 5.7");
    }

    #[test]
    fn test_default_for_view() {
        let s = Span::default_for_view((0.0, 100.0));
        assert!((s.low - 48.0).abs() < 1e-9);
        assert!((s.high - 52.0).abs() < 1e-9);
    }

    #[test]
    fn test_contains_is_half_open_on_ordered_bounds() {
        let s = Span::new(5.0, 2.0);
        assert!(s.contains(2.0));
        assert!(s.contains(4.9));
        assert!(!s.contains(5.0));
    }

    #[test]
    fn test_kind_parse_and_display() {
        assert_eq!("Mask".parse::<RegionKind>().unwrap(), RegionKind::Mask);
        assert_eq!(RegionKind::Baseline.to_string(), "baseline");
        assert!("peak".parse::<RegionKind>().is_err());
    }

    #[test]
    fn test_span_serializes_as_pair() {
        let json = serde_json::to_string(&Span::new(2.0, 5.0)).unwrap();
        assert_eq!(json, "[2.0,5.0]");
    }
}
