/// Region registry
///
/// Each region-definition step owns one registry mapping
/// `"{kind}_{paramName}"` to the overlay drawn on the plot and the name of
/// the region parameter it mirrors. The registry, the region parameters and
/// the overlays are kept consistent: every parameter edit or overlay drag
/// goes through here.

use std::collections::BTreeMap;

use crate::data::region::{RegionKind, Span};
use crate::error::{Error, Result};

/// RGBA overlay color
pub type Rgba = [u8; 4];

/// Value of a region parameter that has no span yet
pub const UNDEFINED_SPAN: &str = "undefined";

/// Fixed overlay color per kind
pub fn color_for(kind: RegionKind) -> Rgba {
    match kind {
        RegionKind::Mask => [200, 200, 200, 60],
        RegionKind::Baseline => [0, 200, 0, 60],
        RegionKind::Integral => [0, 0, 200, 60],
        RegionKind::Undefined => [254, 0, 0, 60],
    }
}

/// A span child of a region group, as shown in the parameter tree
#[derive(Debug, Clone, PartialEq)]
pub struct RegionParam {
    pub name: String,
    pub title: String,
    /// `"low, high"` with one decimal, or `"undefined"`
    pub value: String,
}

impl RegionParam {
    pub fn new(name: &str, value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            title: "Range".to_string(),
            value: value.unwrap_or(UNDEFINED_SPAN).to_string(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        self.value.parse().ok()
    }
}

/// Plot overlay of a region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOverlay {
    pub key: String,
    pub span: Span,
    pub color: Rgba,
    pub hovered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionItem {
    pub overlay: RegionOverlay,
    /// Name of the owning region parameter
    pub param: String,
}

#[derive(Debug, Clone)]
pub struct Regions {
    kind: RegionKind,
    color: Rgba,
    items: BTreeMap<String, RegionItem>,
}

impl Default for Regions {
    fn default() -> Self {
        Self::new(RegionKind::Undefined)
    }
}

impl Regions {
    pub fn new(kind: RegionKind) -> Self {
        Self {
            kind,
            color: color_for(kind),
            items: BTreeMap::new(),
        }
    }

    pub fn key(kind: RegionKind, name: &str) -> String {
        format!("{}_{}", kind, name)
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Register an overlay for `param`.
    ///
    /// With an undefined kind nothing happens and `None` is returned. The
    /// span is, in order of preference, the one supplied, the one stored
    /// in the parameter, or a default span in the middle of `view`. The
    /// parameter value is rewritten with the formatted span.
    pub fn add_region(
        &mut self,
        param: &mut RegionParam,
        kind: RegionKind,
        span: Option<Span>,
        view: (f64, f64),
    ) -> Result<Option<&RegionItem>> {
        if !kind.is_defined() {
            return Ok(None);
        }
        self.change_kind(kind);

        let span = match span {
            Some(s) => s,
            None if param.value == UNDEFINED_SPAN => Span::default_for_view(view),
            None => param.value.parse()?,
        };
        param.value = span.to_param_string();

        let key = Self::key(kind, &param.name);
        let item = RegionItem {
            overlay: RegionOverlay {
                key: key.clone(),
                span,
                color: self.color,
                hovered: false,
            },
            param: param.name.clone(),
        };
        log::debug!("{} region added: {} [{}]", kind, param.name, span);
        self.items.insert(key.clone(), item);
        Ok(self.items.get(&key))
    }

    /// All entries registered under `kind`
    pub fn get_regions(&self, kind: RegionKind) -> Vec<(&str, &RegionItem)> {
        let prefix = format!("{}_", kind);
        self.items
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    /// Look up the entry of parameter `name` under `kind`
    pub fn find_region(&self, name: &str, kind: RegionKind) -> Result<&RegionItem> {
        let key = Self::key(kind, name);
        self.items.get(&key).ok_or(Error::RegionNotFound(key))
    }

    /// The overlay was dragged: move it and rewrite the parameter value
    pub fn region_changed(&mut self, param: &mut RegionParam, span: Span) -> Result<()> {
        let key = Self::key(self.kind, &param.name);
        let item = self
            .items
            .get_mut(&key)
            .ok_or_else(|| Error::RegionNotFound(key.clone()))?;
        item.overlay.span = span;
        param.value = span.to_param_string();
        Ok(())
    }

    /// The region parameter was removed: drop its overlay
    pub fn region_removed(&mut self, param_name: &str) -> Result<RegionItem> {
        let key = Self::key(self.kind, param_name);
        let item = self
            .items
            .remove(&key)
            .ok_or(Error::RegionNotFound(key))?;
        log::debug!("{} region removed: {}", self.kind, param_name);
        Ok(item)
    }

    /// Drop every overlay; returns the names of the released parameters
    pub fn remove_all(&mut self) -> Vec<String> {
        let removed: Vec<String> = self.items.values().map(|i| i.param.clone()).collect();
        self.items.clear();
        removed
    }

    /// Switch kind and recolor the overlays
    pub fn change_kind(&mut self, kind: RegionKind) {
        if kind == self.kind {
            return;
        }
        self.kind = kind;
        self.color = color_for(kind);
        let items = std::mem::take(&mut self.items);
        for (_, mut item) in items {
            item.overlay.color = self.color;
            item.overlay.key = Self::key(kind, &item.param);
            self.items.insert(item.overlay.key.clone(), item);
        }
    }

    /// Highlight one region, un-highlight the others of the same kind
    pub fn select(&mut self, name: &str) -> Result<()> {
        let key = Self::key(self.kind, name);
        if !self.items.contains_key(&key) {
            return Err(Error::RegionNotFound(key));
        }
        for (k, item) in self.items.iter_mut() {
            item.overlay.hovered = *k == key;
        }
        Ok(())
    }

    pub fn overlays(&self) -> impl Iterator<Item = &RegionOverlay> {
        self.items.values().map(|i| &i.overlay)
    }

    pub fn items(&self) -> impl Iterator<Item = &RegionItem> {
        self.items.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: (f64, f64) = (0.0, 100.0);

    #[test]
    fn test_undefined_kind_is_a_noop() {
        let mut regions = Regions::default();
        let mut p = RegionParam::new("0.0", None);
        let added = regions
            .add_region(&mut p, RegionKind::Undefined, None, VIEW)
            .unwrap();
        assert!(added.is_none());
        assert!(regions.is_empty());
        assert_eq!(p.value, UNDEFINED_SPAN);
    }

    #[test]
    fn test_default_span_written_back() {
        let mut regions = Regions::default();
        let mut p = RegionParam::new("0.0", None);
        regions
            .add_region(&mut p, RegionKind::Baseline, None, VIEW)
            .unwrap();
        assert_eq!(p.value, "48.0, 52.0");
        let item = regions.find_region("0.0", RegionKind::Baseline).unwrap();
        assert_eq!(item.overlay.key, "baseline_0.0");
        assert_eq!(item.overlay.color, [0, 200, 0, 60]);
    }

    #[test]
    fn test_stored_value_is_used() {
        let mut regions = Regions::default();
        let mut p = RegionParam::new("0.1", Some("2.04, 5.0"));
        regions.add_region(&mut p, RegionKind::Mask, None, VIEW).unwrap();
        assert_eq!(p.value, "2.0, 5.0");
    }

    #[test]
    fn test_find_missing_is_an_error() {
        let regions = Regions::new(RegionKind::Mask);
        assert!(matches!(
            regions.find_region("nope", RegionKind::Mask),
            Err(Error::RegionNotFound(_))
        ));
    }

    #[test]
    fn test_get_regions_filters_by_kind() {
        let mut regions = Regions::default();
        let mut a = RegionParam::new("0.0", Some("1, 2"));
        let mut b = RegionParam::new("0.1", Some("3, 4"));
        regions.add_region(&mut a, RegionKind::Integral, None, VIEW).unwrap();
        regions.add_region(&mut b, RegionKind::Integral, None, VIEW).unwrap();
        assert_eq!(regions.get_regions(RegionKind::Integral).len(), 2);
        assert!(regions.get_regions(RegionKind::Mask).is_empty());
    }

    #[test]
    fn test_drag_updates_param_and_removal_cascades() {
        let mut regions = Regions::default();
        let mut p = RegionParam::new("0.0", Some("1, 2"));
        regions.add_region(&mut p, RegionKind::Mask, None, VIEW).unwrap();

        regions.region_changed(&mut p, Span::new(10.0, 20.25)).unwrap();
        assert_eq!(p.value, "10.0, 20.2");
        let item = regions.find_region("0.0", RegionKind::Mask).unwrap();
        assert_eq!(item.overlay.span, Span::new(10.0, 20.25));

        regions.region_removed("0.0").unwrap();
        assert!(regions.is_empty());
        assert!(regions.region_removed("0.0").is_err());
    }

    #[test]
    fn test_remove_all_and_select() {
        let mut regions = Regions::default();
        let mut a = RegionParam::new("0.0", Some("1, 2"));
        let mut b = RegionParam::new("0.1", Some("3, 4"));
        regions.add_region(&mut a, RegionKind::Mask, None, VIEW).unwrap();
        regions.add_region(&mut b, RegionKind::Mask, None, VIEW).unwrap();

        regions.select("0.1").unwrap();
        let hovered: Vec<bool> = regions.overlays().map(|o| o.hovered).collect();
        assert_eq!(hovered, vec![false, true]);

        let released = regions.remove_all();
        assert_eq!(released, vec!["0.0".to_string(), "0.1".to_string()]);
        assert!(regions.is_empty());
    }

    #[test]
    fn test_colors() {
        assert_eq!(color_for(RegionKind::Mask), [200, 200, 200, 60]);
        assert_eq!(color_for(RegionKind::Integral), [0, 0, 200, 60]);
        assert_eq!(color_for(RegionKind::Undefined), [254, 0, 0, 60]);
    }
}
