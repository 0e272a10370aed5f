/// Pipeline model
///
/// The ordered collection of processing steps edited in the pipeline
/// panel. The terminal `output` step is always last. Every mutation records
/// one or more [`TreeChange`]s; the controller drains them as a single batch
/// per user action with [`Pipeline::take_changes`].

use std::collections::HashMap;
use std::sync::Arc;

use super::catalog::{Catalog, Template, OUTPUT_KEY};
use super::functions::{Action, Kwargs};
use super::params::{Param, ParamType, ParamValue};
use super::regions::{RegionItem, RegionParam, Regions};
use super::state::{Children, StateNode};
use crate::data::region::{RegionKind, Span};
use crate::error::{Error, Result};

/// Name of the kind parameter of region-definition steps
pub const KIND_PARAM: &str = "kind";

/// Name of the region group parameter of region-definition steps
pub const GROUP_PARAM: &str = "regiongroup";

/// Neighbour to swap with when moving a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Value,
    Expanded,
    ReadOnly,
    Moved,
}

/// One atomic change of the tree: `path` is `"step"` or `"step/param"`
#[derive(Debug, Clone, PartialEq)]
pub struct TreeChange {
    pub path: String,
    pub kind: ChangeKind,
    pub value: Option<ParamValue>,
}

impl TreeChange {
    fn new(path: impl Into<String>, kind: ChangeKind, value: Option<ParamValue>) -> Self {
        Self {
            path: path.into(),
            kind,
            value,
        }
    }

    /// Name of the step the change belongs to
    pub fn step(&self) -> &str {
        self.path.split('/').next().unwrap_or(&self.path)
    }
}

// ============================================================================
// Region definition
// ============================================================================

/// Ordered spans of one region-definition step
#[derive(Debug, Clone)]
pub struct RegionGroup {
    /// Name of the owning step
    pub owner: String,
    pub entries: Vec<RegionParam>,
    pub expanded: bool,
    current_index: usize,
}

impl RegionGroup {
    fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            entries: Vec::new(),
            expanded: false,
            current_index: 0,
        }
    }

    /// `"{stepIndex}.{n}"`
    fn next_name(&mut self) -> String {
        let index = self.owner.rsplit('#').next().unwrap_or(&self.owner);
        let name = format!("{}.{}", index, self.current_index);
        self.current_index += 1;
        name
    }

    pub fn entry(&self, name: &str) -> Option<&RegionParam> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut RegionParam> {
        self.entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::RegionNotFound(name.to_string()))
    }

    /// Parsed spans in group order
    pub fn spans(&self) -> Result<Vec<Span>> {
        self.entries.iter().map(|e| e.value.parse()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct RegionDefinition {
    pub group: RegionGroup,
    pub regions: Regions,
}

// ============================================================================
// Processing step
// ============================================================================

#[derive(Debug, Clone)]
pub struct ProcessingStep {
    /// `"{key}#{index}"`, or `"output"`
    pub name: String,
    pub key: String,
    pub title: String,
    pub action: String,
    pub tip: String,
    pub enabled: bool,
    pub expanded: bool,
    pub removable: bool,
    pub context: Vec<(Direction, &'static str)>,
    pub params: Vec<Param>,
    pub region: Option<RegionDefinition>,
}

impl ProcessingStep {
    fn from_template(template: &Template, name: String) -> Self {
        let region = template.is_region_definition().then(|| RegionDefinition {
            group: RegionGroup::new(&name),
            regions: Regions::default(),
        });
        Self {
            key: template.key.clone(),
            title: template.title.clone(),
            action: template.action.clone(),
            tip: template.tip.clone(),
            enabled: template.default_enabled,
            expanded: false,
            removable: template.removable,
            context: template.context.clone(),
            params: template.params.iter().map(Param::from_spec).collect(),
            region,
            name,
        }
    }

    pub fn is_output(&self) -> bool {
        self.name == OUTPUT_KEY
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    fn param_mut(&mut self, name: &str) -> Result<&mut Param> {
        let step = self.name.clone();
        self.params
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or(Error::UnknownParam {
                step,
                param: name.to_string(),
            })
    }

    /// Region kind; always `Undefined` for ordinary steps
    pub fn kind(&self) -> RegionKind {
        self.param(KIND_PARAM)
            .filter(|_| self.region.is_some())
            .and_then(|p| p.value.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn kind_locked(&self) -> bool {
        self.param(KIND_PARAM).map(|p| p.readonly).unwrap_or(false)
    }

    /// Keyword arguments of the step's action
    pub fn kwargs(&self) -> Result<Kwargs> {
        let mut kwargs = Kwargs::new();
        match &self.region {
            Some(def) => {
                kwargs.push(KIND_PARAM, ParamValue::Str(self.kind().to_string()));
                kwargs.push("range", ParamValue::Spans(def.group.spans()?));
            }
            None => {
                for p in &self.params {
                    kwargs.push(&p.name, p.value.clone());
                }
            }
        }
        Ok(kwargs)
    }

    fn save(&self) -> StateNode {
        let mut children = Children::default();
        for p in &self.params {
            let node = match (&self.region, p.ty) {
                (Some(def), ParamType::RegionGroup) => StateNode {
                    expanded: def.group.expanded,
                    children: def
                        .group
                        .entries
                        .iter()
                        .map(|e| {
                            (
                                e.name.clone(),
                                StateNode::with_value(ParamValue::Str(e.value.clone())),
                            )
                        })
                        .collect(),
                    ..Default::default()
                },
                _ => StateNode {
                    value: Some(p.value.clone()),
                    readonly: p.readonly,
                    ..Default::default()
                },
            };
            children.insert(p.name.clone(), node);
        }
        StateNode {
            value: Some(ParamValue::Bool(self.enabled)),
            expanded: self.expanded,
            readonly: false,
            children,
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Debug, Clone)]
pub struct Pipeline {
    catalog: Arc<Catalog>,
    steps: Vec<ProcessingStep>,
    counters: HashMap<String, usize>,
    /// Visible x range, used to place new regions
    view: (f64, f64),
    changes: Vec<TreeChange>,
}

impl Pipeline {
    /// Empty pipeline holding only the output step
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let output = ProcessingStep::from_template(catalog.output(), OUTPUT_KEY.to_string());
        Self {
            catalog,
            steps: vec![output],
            counters: HashMap::new(),
            view: (0.0, 1.0),
            changes: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn steps(&self) -> &[ProcessingStep] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&ProcessingStep> {
        self.steps.iter().find(|s| s.name == name)
    }

    fn step_mut(&mut self, name: &str) -> Result<&mut ProcessingStep> {
        self.steps
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::UnknownStep(name.to_string()))
    }

    pub fn output(&self) -> Option<&ProcessingStep> {
        self.steps.last().filter(|s| s.is_output())
    }

    pub fn set_view(&mut self, view: (f64, f64)) {
        self.view = view;
    }

    pub fn view(&self) -> (f64, f64) {
        self.view
    }

    /// Drain the changes recorded since the last call
    pub fn take_changes(&mut self) -> Vec<TreeChange> {
        std::mem::take(&mut self.changes)
    }

    fn record(&mut self, path: impl Into<String>, kind: ChangeKind, value: Option<ParamValue>) {
        self.changes.push(TreeChange::new(path, kind, value));
    }

    // ------------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------------

    /// Instantiate a step from the catalog just before the output step
    pub fn add_step(&mut self, key: &str) -> Result<&ProcessingStep> {
        let template = self
            .catalog
            .processors()
            .iter()
            .find(|t| t.key == key)
            .ok_or_else(|| Error::UnknownProcessor(key.to_string()))?;

        let counter = self.counters.entry(key.to_string()).or_insert(0);
        let name = format!("{}#{}", key, *counter);
        *counter += 1;

        let step = ProcessingStep::from_template(template, name.clone());
        let pos = self.steps.len().saturating_sub(1);
        self.steps.insert(pos, step);
        log::debug!("New processor added: {}", name);
        self.record(name, ChangeKind::Added, None);
        Ok(&self.steps[pos])
    }

    /// Remove a step and all its regions
    pub fn remove_step(&mut self, name: &str) -> Result<ProcessingStep> {
        let pos = self
            .steps
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| Error::UnknownStep(name.to_string()))?;
        if !self.steps[pos].removable {
            return Err(Error::NotRemovable(name.to_string()));
        }
        let mut step = self.steps.remove(pos);

        if let Some(def) = step.region.as_mut() {
            for param in def.regions.remove_all() {
                self.changes.push(TreeChange::new(
                    format!("{}/{}/{}", name, GROUP_PARAM, param),
                    ChangeKind::Removed,
                    None,
                ));
            }
        }
        for p in &step.params {
            self.changes.push(TreeChange::new(
                format!("{}/{}", name, p.name),
                ChangeKind::Removed,
                None,
            ));
        }
        self.record(name, ChangeKind::Removed, None);
        log::debug!("Processor removed: {}", name);
        Ok(step)
    }

    /// Swap a step with its neighbour. Returns whether the order changed.
    ///
    /// The output step never moves and is never swapped with.
    pub fn move_step(&mut self, name: &str, direction: Direction) -> Result<bool> {
        let pos = self
            .steps
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| Error::UnknownStep(name.to_string()))?;
        if self.steps[pos].is_output() {
            return Ok(false);
        }
        let movable = self.steps.iter().filter(|s| !s.is_output()).count();
        let target = match direction {
            Direction::Before if pos > 0 => pos - 1,
            Direction::After if pos + 1 < movable => pos + 1,
            _ => return Ok(false),
        };
        self.steps.swap(pos, target);
        self.record(name, ChangeKind::Moved, None);
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let step = self.step_mut(name)?;
        if step.enabled == enabled {
            return Ok(());
        }
        step.enabled = enabled;
        self.record(name, ChangeKind::Value, Some(ParamValue::Bool(enabled)));
        Ok(())
    }

    pub fn set_expanded(&mut self, name: &str, expanded: bool) -> Result<()> {
        let step = self.step_mut(name)?;
        if step.expanded == expanded {
            return Ok(());
        }
        step.expanded = expanded;
        self.record(name, ChangeKind::Expanded, Some(ParamValue::Bool(expanded)));
        Ok(())
    }

    pub fn set_group_expanded(&mut self, name: &str, expanded: bool) -> Result<()> {
        let step = self.step_mut(name)?;
        let def = step
            .region
            .as_mut()
            .ok_or_else(|| Error::UnknownParam {
                step: name.to_string(),
                param: GROUP_PARAM.to_string(),
            })?;
        if def.group.expanded == expanded {
            return Ok(());
        }
        def.group.expanded = expanded;
        self.record(
            format!("{}/{}", name, GROUP_PARAM),
            ChangeKind::Expanded,
            Some(ParamValue::Bool(expanded)),
        );
        Ok(())
    }

    /// Collapse every step without recording changes
    pub fn collapse_all(&mut self) {
        for step in &mut self.steps {
            step.expanded = false;
        }
    }

    /// Set a parameter of a step. The kind of a region step goes through
    /// [`Pipeline::set_kind`].
    pub fn set_param(&mut self, name: &str, param: &str, value: ParamValue) -> Result<ParamValue> {
        let step = self.step_mut(name)?;
        if step.region.is_some() && param == KIND_PARAM {
            let kind: RegionKind = value
                .as_str()
                .ok_or_else(|| Error::Parse(format!("`{}` is not a region kind", value)))?
                .parse()?;
            self.set_kind(name, kind)?;
            return Ok(ParamValue::Str(kind.to_string()));
        }
        let stored = step.param_mut(param)?.set_value(value)?;
        self.record(
            format!("{}/{}", name, param),
            ChangeKind::Value,
            Some(stored.clone()),
        );
        Ok(stored)
    }

    /// Set the kind of a region step; a defined kind locks it
    pub fn set_kind(&mut self, name: &str, kind: RegionKind) -> Result<()> {
        let step = self.step_mut(name)?;
        if step.region.is_none() {
            return Err(Error::UnknownParam {
                step: name.to_string(),
                param: KIND_PARAM.to_string(),
            });
        }
        let param = step.param_mut(KIND_PARAM)?;
        param.set_value(ParamValue::Str(kind.to_string()))?;
        let locked = kind.is_defined();
        if locked {
            param.readonly = true;
        }
        if let Some(def) = step.region.as_mut() {
            def.regions.change_kind(kind);
        }
        let path = format!("{}/{}", name, KIND_PARAM);
        self.record(&path, ChangeKind::Value, Some(ParamValue::Str(kind.to_string())));
        if locked {
            self.record(path, ChangeKind::ReadOnly, Some(ParamValue::Bool(true)));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------------

    fn region_mut(&mut self, name: &str) -> Result<(RegionKind, &mut RegionDefinition)> {
        let step = self.step_mut(name)?;
        let kind = step.kind();
        let def = step.region.as_mut().ok_or_else(|| Error::UnknownParam {
            step: name.to_string(),
            param: GROUP_PARAM.to_string(),
        })?;
        Ok((kind, def))
    }

    /// Add a span to the region group of a step.
    ///
    /// Returns the name of the new region parameter, or `None` when the
    /// kind is still undefined.
    pub fn add_region(&mut self, name: &str, span: Option<Span>) -> Result<Option<String>> {
        let view = self.view;
        let (kind, def) = self.region_mut(name)?;
        if !kind.is_defined() {
            log::warn!("Kind is undefined: select a kind before adding a region");
            return Ok(None);
        }
        let mut param = RegionParam::new(&def.group.next_name(), None);
        def.regions.add_region(&mut param, kind, span, view)?;
        let (region, value) = (param.name.clone(), param.value.clone());
        def.group.entries.push(param);
        log::debug!("> new {} region added to {} ({})", kind, name, region);
        self.record(
            format!("{}/{}/{}", name, GROUP_PARAM, region),
            ChangeKind::Added,
            Some(ParamValue::Str(value)),
        );
        Ok(Some(region))
    }

    pub fn remove_region(&mut self, name: &str, region: &str) -> Result<()> {
        let (_, def) = self.region_mut(name)?;
        let pos = def
            .group
            .entries
            .iter()
            .position(|e| e.name == region)
            .ok_or_else(|| Error::RegionNotFound(region.to_string()))?;
        def.group.entries.remove(pos);
        def.regions.region_removed(region)?;
        self.record(
            format!("{}/{}/{}", name, GROUP_PARAM, region),
            ChangeKind::Removed,
            None,
        );
        Ok(())
    }

    /// A region overlay was dragged on the plot
    pub fn region_changed(&mut self, name: &str, region: &str, span: Span) -> Result<()> {
        let (_, def) = self.region_mut(name)?;
        let param = def.group.entry_mut(region)?;
        def.regions.region_changed(param, span)?;
        let value = param.value.clone();
        self.record(
            format!("{}/{}/{}", name, GROUP_PARAM, region),
            ChangeKind::Value,
            Some(ParamValue::Str(value)),
        );
        Ok(())
    }

    pub fn select_region(&mut self, name: &str, region: &str) -> Result<()> {
        let (_, def) = self.region_mut(name)?;
        def.regions.select(region)
    }

    /// Regions of the expanded region steps, with their owning step
    pub fn visible_overlays(&self) -> impl Iterator<Item = (&str, &RegionItem)> {
        self.steps
            .iter()
            .filter(|s| s.expanded && s.kind().is_defined())
            .filter_map(|s| s.region.as_ref().map(|d| (s.name.as_str(), d)))
            .flat_map(|(name, d)| d.regions.items().map(move |i| (name, i)))
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// One action per enabled step, in collection order
    pub fn processing_actions(&self) -> Result<Vec<Action>> {
        let mut actions = Vec::new();
        for step in self.steps.iter().filter(|s| s.enabled) {
            actions.push(Action {
                step: step.name.clone(),
                name: step.action.clone(),
                kwargs: step.kwargs()?,
            });
        }
        log::debug!("ACTIONS: {:?}", actions);
        Ok(actions)
    }

    /// Name of the enabled output, if it is not `untitled`
    pub fn output_name(&self) -> Option<&str> {
        self.output()
            .filter(|s| s.enabled)
            .and_then(|s| s.param("name"))
            .and_then(|p| p.value.as_str())
            .filter(|n| !n.is_empty() && *n != "untitled")
    }

    // ------------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------------

    pub fn save_state(&self) -> StateNode {
        StateNode {
            value: None,
            expanded: true,
            readonly: false,
            children: self
                .steps
                .iter()
                .map(|s| (s.name.clone(), s.save()))
                .collect(),
        }
    }

    /// Rebuild the pipeline from a saved tree.
    ///
    /// Steps are re-created through [`Pipeline::add_step`], so their names
    /// are renumbered from 0 per key. Unknown keys, values that do not fit
    /// their parameter and malformed region groups are skipped with a
    /// warning. No changes are recorded.
    pub fn restore_state(&mut self, saved: &StateNode) {
        let output = ProcessingStep::from_template(self.catalog.output(), OUTPUT_KEY.to_string());
        self.steps = vec![output];
        self.counters.clear();

        if let Some(node) = saved.child(OUTPUT_KEY) {
            if let Some(step) = self.steps.last_mut() {
                apply_saved(step, node);
            }
        }

        for (key, node) in saved.children.iter().filter(|(k, _)| *k != OUTPUT_KEY) {
            let template_key = key.split('#').next().unwrap_or(key.as_str());
            let name = match self.add_step(template_key) {
                Ok(step) => step.name.clone(),
                Err(e) => {
                    log::warn!("Saved step `{}` skipped: {}", key, e);
                    continue;
                }
            };
            let view = self.view;
            let Ok(step) = self.step_mut(&name) else {
                continue;
            };
            apply_saved(step, node);
            if step.region.is_some() {
                restore_regions(step, node, view);
            }
        }

        self.changes.clear();
        log::debug!("Pipeline restored ({} steps)", self.steps.len());
    }
}

/// Re-apply enabled flag, expansion and plain parameter values
fn apply_saved(step: &mut ProcessingStep, node: &StateNode) {
    if let Some(enabled) = node.bool_value() {
        step.enabled = enabled;
    }
    step.expanded = node.expanded;
    let is_region = step.region.is_some();
    for p in step.params.iter_mut() {
        if p.ty == ParamType::RegionGroup || (is_region && p.name == KIND_PARAM) {
            continue;
        }
        if let Some(value) = node.child(&p.name).and_then(|n| n.value.clone()) {
            if let Err(e) = p.assign(value) {
                log::warn!("{}: saved value ignored: {}", step.name, e);
            }
        }
    }
}

/// Re-apply the kind (locking it when defined) and re-create the spans
fn restore_regions(step: &mut ProcessingStep, node: &StateNode, view: (f64, f64)) {
    let kind = node
        .at(&[KIND_PARAM])
        .and_then(StateNode::str_value)
        .and_then(|s| s.parse::<RegionKind>().ok())
        .unwrap_or_default();
    if let Some(p) = step.params.iter_mut().find(|p| p.name == KIND_PARAM) {
        p.value = ParamValue::Str(kind.to_string());
        p.readonly = kind.is_defined();
    }

    let Some(def) = step.region.as_mut() else {
        return;
    };
    def.regions.change_kind(kind);

    let Some(group) = node.at(&[GROUP_PARAM]) else {
        return;
    };
    def.group.expanded = group.expanded;
    if !kind.is_defined() {
        return;
    }
    for (saved_name, entry) in group.children.iter() {
        let Some(value) = entry.str_value() else {
            log::warn!("{}: region `{}` has no span", step.name, saved_name);
            continue;
        };
        let mut param = RegionParam::new(&def.group.next_name(), Some(value));
        match def.regions.add_region(&mut param, kind, None, view) {
            Ok(_) => def.group.entries.push(param),
            Err(e) => log::warn!("{}: region `{}` skipped: {}", step.name, saved_name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::new(Arc::new(Catalog::bundled().unwrap()))
    }

    fn names(p: &Pipeline) -> Vec<&str> {
        p.steps().iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_add_step_inserts_before_output() {
        let mut p = pipeline();
        p.add_step("scale").unwrap();
        p.add_step("offset").unwrap();
        p.add_step("scale").unwrap();
        assert_eq!(names(&p), vec!["scale#0", "offset#0", "scale#1", "output"]);
        assert!(!p.step("scale#0").unwrap().enabled);
        assert!(p.add_step("nope").is_err());
        assert!(p.add_step("output").is_err());
    }

    #[test]
    fn test_disabled_steps_are_not_actions() {
        let mut p = pipeline();
        p.add_step("scale").unwrap();
        p.add_step("offset").unwrap();
        p.set_enabled("offset#0", true).unwrap();
        let actions = p.processing_actions().unwrap();
        let steps: Vec<&str> = actions.iter().map(|a| a.step.as_str()).collect();
        assert_eq!(steps, vec!["offset#0"]);
        assert_eq!(actions[0].name, "offset");
        assert_eq!(actions[0].kwargs.get("value"), Some(&ParamValue::Float(0.0)));
    }

    #[test]
    fn test_region_step_actions() {
        let mut p = pipeline();
        p.set_view((0.0, 10.0));
        p.add_step("define regions").unwrap();
        p.set_enabled("define regions#0", true).unwrap();
        p.set_kind("define regions#0", RegionKind::Mask).unwrap();
        p.add_region("define regions#0", Some(Span::new(2.0, 5.0)))
            .unwrap();
        let actions = p.processing_actions().unwrap();
        assert_eq!(actions[0].name, "define_region");
        assert_eq!(
            actions[0].kwargs.get("kind"),
            Some(&ParamValue::Str("mask".into()))
        );
        assert_eq!(
            actions[0].kwargs.get("range"),
            Some(&ParamValue::Spans(vec![Span::new(2.0, 5.0)]))
        );
    }

    #[test]
    fn test_add_region_requires_a_kind() {
        let mut p = pipeline();
        p.add_step("define regions").unwrap();
        assert_eq!(p.add_region("define regions#0", None).unwrap(), None);
        p.set_kind("define regions#0", RegionKind::Baseline).unwrap();
        let name = p.add_region("define regions#0", None).unwrap();
        assert_eq!(name.as_deref(), Some("0.0"));
    }

    #[test]
    fn test_kind_lock() {
        let mut p = pipeline();
        p.add_step("define regions").unwrap();
        p.set_kind("define regions#0", RegionKind::Undefined).unwrap();
        assert!(!p.step("define regions#0").unwrap().kind_locked());

        p.set_kind("define regions#0", RegionKind::Mask).unwrap();
        assert!(p.step("define regions#0").unwrap().kind_locked());
        assert!(matches!(
            p.set_kind("define regions#0", RegionKind::Baseline),
            Err(Error::ReadOnly(_))
        ));
        assert!(p
            .set_param(
                "define regions#0",
                KIND_PARAM,
                ParamValue::Str("integral".into())
            )
            .is_err());
        assert_eq!(p.step("define regions#0").unwrap().kind(), RegionKind::Mask);
    }

    #[test]
    fn test_move_boundaries_are_noops() {
        let mut p = pipeline();
        p.add_step("scale").unwrap();
        p.add_step("offset").unwrap();
        p.take_changes();

        assert!(!p.move_step("scale#0", Direction::Before).unwrap());
        assert!(!p.move_step("offset#0", Direction::After).unwrap());
        assert!(!p.move_step("output", Direction::Before).unwrap());
        assert_eq!(names(&p), vec!["scale#0", "offset#0", "output"]);
        assert!(p.take_changes().is_empty());

        assert!(p.move_step("scale#0", Direction::After).unwrap());
        assert_eq!(names(&p), vec!["offset#0", "scale#0", "output"]);
    }

    #[test]
    fn test_remove_step_cascades() {
        let mut p = pipeline();
        p.add_step("define regions").unwrap();
        p.set_kind("define regions#0", RegionKind::Mask).unwrap();
        p.add_region("define regions#0", Some(Span::new(1.0, 2.0)))
            .unwrap();
        p.add_region("define regions#0", Some(Span::new(3.0, 4.0)))
            .unwrap();
        p.take_changes();

        let removed = p.remove_step("define regions#0").unwrap();
        assert!(removed.region.unwrap().regions.is_empty());
        let changes = p.take_changes();
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Removed));
        assert_eq!(changes.len(), 5);
        assert_eq!(changes.last().unwrap().path, "define regions#0");

        assert!(matches!(p.remove_step("output"), Err(Error::NotRemovable(_))));
    }

    #[test]
    fn test_state_round_trip() {
        let mut p = pipeline();
        p.add_step("scale").unwrap();
        p.set_enabled("scale#0", true).unwrap();
        p.set_param("scale#0", "factor", ParamValue::Float(2.5))
            .unwrap();
        p.add_step("define regions").unwrap();
        p.set_enabled("define regions#0", true).unwrap();
        p.set_kind("define regions#0", RegionKind::Baseline).unwrap();
        p.add_region("define regions#0", Some(Span::new(1.04, 2.0)))
            .unwrap();
        p.add_region("define regions#0", Some(Span::new(7.0, 9.96)))
            .unwrap();
        p.set_group_expanded("define regions#0", true).unwrap();

        let state = p.save_state();
        let json = serde_json::to_string(&state).unwrap();
        let back: StateNode = serde_json::from_str(&json).unwrap();

        let mut q = pipeline();
        q.restore_state(&back);
        assert_eq!(names(&q), vec!["scale#0", "define regions#0", "output"]);
        assert_eq!(
            q.step("scale#0").unwrap().param("factor").unwrap().value,
            ParamValue::Float(2.5)
        );
        let region = q.step("define regions#0").unwrap();
        assert!(region.enabled);
        assert!(region.kind_locked());
        assert_eq!(region.kind(), RegionKind::Baseline);
        let def = region.region.as_ref().unwrap();
        assert!(def.group.expanded);
        assert_eq!(
            def.group.spans().unwrap(),
            vec![Span::new(1.0, 2.0), Span::new(7.0, 10.0)]
        );
        assert_eq!(def.regions.len(), 2);
        assert!(q.take_changes().is_empty());
        assert_eq!(q.save_state(), p.save_state());
    }

    #[test]
    fn test_restore_tolerates_malformed_entries() {
        let json = r#"{"children": {
            "ghost#0": {"value": true},
            "define regions#3": {"value": true, "children": {"kind": {"value": "mask"}}},
            "scale#7": {"value": true, "children": {"factor": {"value": "abc"}}},
            "output": {"value": false, "children": {"name": {"value": "untitled"}}}
        }}"#;
        let saved: StateNode = serde_json::from_str(json).unwrap();
        let mut p = pipeline();
        p.restore_state(&saved);
        assert_eq!(names(&p), vec!["define regions#0", "scale#0", "output"]);
        let region = p.step("define regions#0").unwrap();
        assert_eq!(region.kind(), RegionKind::Mask);
        assert!(region.region.as_ref().unwrap().group.entries.is_empty());
        assert_eq!(
            p.step("scale#0").unwrap().param("factor").unwrap().value,
            ParamValue::Float(1.0)
        );
    }

    #[test]
    fn test_output_name() {
        let mut p = pipeline();
        assert_eq!(p.output_name(), None);
        p.set_enabled("output", true).unwrap();
        assert_eq!(p.output_name(), None);
        p.set_param("output", "name", ParamValue::Str("smoothed".into()))
            .unwrap();
        assert_eq!(p.output_name(), Some("smoothed"));
    }
}
