/// Pipeline controller
///
/// Owns the pipeline model of the selected dataset and replays it whenever
/// the tree changes. Re-entrancy is modelled by [`ControllerState`]: change
/// batches that arrive while the controller is initializing or processing,
/// or while no dataset is selected, are dropped and never queued.
///
/// Replay always starts from a copy of the selected dataset and writes the
/// result to its `processed_data` / `processed_mask`; the raw `data` is
/// never touched.

use std::path::Path;
use std::sync::Arc;

use super::catalog::{Catalog, OUTPUT_KEY};
use super::functions::{Action, FunctionRegistry};
use super::model::{ChangeKind, Direction, Pipeline, TreeChange};
use super::params::ParamValue;
use super::state::{Children, StateNode};
use crate::data::dataset::Dataset;
use crate::data::region::{RegionKind, Span};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    Initializing,
    Processing,
}

/// Why the selected dataset is (re)loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetChange {
    /// A different dataset was selected: the pipeline is rebuilt
    Select,
    /// The selected dataset was replaced in the project
    Updated,
}

/// A user edit of the pipeline panel or the plot
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    AddStep(String),
    RemoveStep(String),
    SetEnabled { step: String, enabled: bool },
    SetParam { step: String, param: String, value: ParamValue },
    SetKind { step: String, kind: RegionKind },
    AddRegion { step: String, span: Option<Span> },
    RemoveRegion { step: String, region: String },
    DragRegion { step: String, region: String, span: Span },
    SelectRegion { step: String, region: String },
    SetExpanded { step: String, expanded: bool },
    SetGroupExpanded { step: String, expanded: bool },
    Move { step: String, direction: Direction },
}

/// What the GUI has to do after an edit
#[derive(Debug, Default)]
pub struct Outcome {
    /// The saved state changed: the project is dirty
    pub dirty: bool,
    /// The edit arrived while busy and was ignored
    pub dropped: bool,
    /// Materialized output dataset to register in the project
    pub output: Option<Dataset>,
    /// The replay flipped the orientation of the dataset
    pub reset_zoom: bool,
    pub redraw: bool,
    /// The edit was stored but replaying it failed; processed data is stale
    pub replay_error: Option<Error>,
}

impl Outcome {
    fn dropped() -> Self {
        Self {
            dropped: true,
            ..Default::default()
        }
    }

    fn merge(&mut self, other: Outcome) {
        self.dirty |= other.dirty;
        self.dropped |= other.dropped;
        self.reset_zoom |= other.reset_zoom;
        self.redraw |= other.redraw;
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.replay_error.is_some() {
            self.replay_error = other.replay_error;
        }
    }

    /// Keep the outcome of a replay, or its error next to the stored edit
    fn absorb(&mut self, replay: Result<Outcome>) {
        match replay {
            Ok(other) => self.merge(other),
            Err(e) => {
                self.redraw = true;
                self.replay_error = Some(e);
            }
        }
    }
}

#[derive(Debug)]
pub struct Controller {
    catalog: Arc<Catalog>,
    functions: FunctionRegistry,
    pipeline: Option<Pipeline>,
    state: ControllerState,
    /// Name of the dataset the pipeline belongs to
    selected: Option<String>,
}

impl Controller {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            functions: FunctionRegistry::builtin(),
            pipeline: None,
            state: ControllerState::Idle,
            selected: None,
        }
    }

    /// Controller over the catalog at `path`, or the bundled one.
    ///
    /// A catalog that cannot be loaded is fatal: no controller is built.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let catalog = match path {
            Some(p) => Catalog::load(p)?,
            None => Catalog::bundled()?,
        };
        Ok(Self::new(catalog))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.pipeline.as_ref()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Visible x range of the plot, used to place new regions
    pub fn set_view(&mut self, view: (f64, f64)) {
        if let Some(p) = self.pipeline.as_mut() {
            p.set_view(view);
        }
    }

    /// Forget the pipeline and the selection
    pub fn clear(&mut self) {
        self.pipeline = None;
        self.selected = None;
        self.state = ControllerState::Idle;
    }

    // ------------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------------

    pub fn on_dataset_changed(
        &mut self,
        dataset: Option<&mut Dataset>,
        change: DatasetChange,
    ) -> Result<Outcome> {
        let Some(dataset) = dataset else {
            self.clear();
            return Ok(Outcome {
                redraw: true,
                ..Default::default()
            });
        };
        log::debug!("Update controller: {}", dataset.name);
        if change == DatasetChange::Select {
            self.pipeline = None;
        }
        let mut outcome = self.initialize(dataset)?;
        outcome.reset_zoom = true;
        Ok(outcome)
    }

    /// Build or restore the pipeline of `dataset` and replay it once
    pub fn initialize(&mut self, dataset: &mut Dataset) -> Result<Outcome> {
        log::debug!("initialize controller");
        self.state = ControllerState::Initializing;
        let result = self.initialize_inner(dataset);
        self.state = ControllerState::Idle;
        log::debug!("Initialisation finished");
        result
    }

    fn initialize_inner(&mut self, dataset: &mut Dataset) -> Result<Outcome> {
        let catalog = Arc::clone(&self.catalog);
        let pipeline = match self.pipeline.take() {
            Some(p) if dataset.state.is_some() => p,
            _ => Pipeline::new(catalog),
        };
        let pipeline = self.pipeline.insert(pipeline);
        pipeline.set_view(dataset.x_range());

        if let Some(saved) = dataset.state.as_ref() {
            log::debug!("Restore state");
            pipeline.restore_state(saved);
        }
        dataset.state = Some(pipeline.save_state());
        // a failing replay still leaves the pipeline editable
        self.selected = Some(dataset.name.clone());

        let outcome = self.perform_processing(dataset);
        if let Some(p) = self.pipeline.as_mut() {
            p.collapse_all();
            p.take_changes();
        }
        outcome
    }

    // ------------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------------

    /// Apply one user edit to the pipeline and process the resulting batch
    pub fn apply(&mut self, dataset: &mut Dataset, edit: Edit) -> Result<Outcome> {
        if self.state != ControllerState::Idle || self.selected.is_none() {
            log::debug!("edit dropped while {:?}: {:?}", self.state, edit);
            return Ok(Outcome::dropped());
        }
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Ok(Outcome::dropped());
        };

        match edit {
            Edit::AddStep(key) => {
                pipeline.add_step(&key)?;
            }
            Edit::RemoveStep(step) => {
                pipeline.remove_step(&step)?;
            }
            Edit::SetEnabled { step, enabled } => pipeline.set_enabled(&step, enabled)?,
            Edit::SetParam { step, param, value } => {
                pipeline.set_param(&step, &param, value)?;
            }
            Edit::SetKind { step, kind } => pipeline.set_kind(&step, kind)?,
            Edit::AddRegion { step, span } => {
                pipeline.add_region(&step, span)?;
            }
            Edit::RemoveRegion { step, region } => pipeline.remove_region(&step, &region)?,
            Edit::DragRegion { step, region, span } => {
                pipeline.region_changed(&step, &region, span)?
            }
            Edit::SelectRegion { step, region } => {
                pipeline.select_region(&step, &region)?;
                return Ok(Outcome {
                    redraw: true,
                    ..Default::default()
                });
            }
            Edit::SetExpanded { step, expanded } => pipeline.set_expanded(&step, expanded)?,
            Edit::SetGroupExpanded { step, expanded } => {
                pipeline.set_group_expanded(&step, expanded)?
            }
            Edit::Move { step, direction } => {
                pipeline.move_step(&step, direction)?;
            }
        }

        let changes = pipeline.take_changes();
        self.change(dataset, changes)
    }

    /// Handle one batch of tree changes.
    ///
    /// Dropped while not idle or without a selected dataset. A batch that
    /// leaves the saved state unchanged is ignored; otherwise the state is
    /// stored on the dataset and the pipeline is replayed. A replay error
    /// comes back in [`Outcome::replay_error`] since the edit itself is kept.
    pub fn change(&mut self, dataset: &mut Dataset, changes: Vec<TreeChange>) -> Result<Outcome> {
        if self.state != ControllerState::Idle || self.selected.is_none() {
            log::debug!("{} changes dropped while {:?}", changes.len(), self.state);
            return Ok(Outcome::dropped());
        }
        let Some(pipeline) = self.pipeline.as_ref() else {
            return Ok(Outcome::dropped());
        };
        if changes.is_empty() {
            return Ok(Outcome::default());
        }

        let state = pipeline.save_state();
        if dataset.state.as_ref() == Some(&state) {
            return Ok(Outcome::default());
        }
        dataset.state = Some(state);
        let mut outcome = Outcome {
            dirty: true,
            ..Default::default()
        };
        log::debug!("{} changed `{:?}`", changes[0].step(), changes);

        if changes.iter().any(|c| c.kind == ChangeKind::Moved) {
            let replay = self.move_parameters(dataset);
            outcome.absorb(replay);
            return Ok(outcome);
        }
        if changes.iter().all(|c| c.kind == ChangeKind::Expanded) {
            outcome.redraw = true;
            return Ok(outcome);
        }
        if changes
            .iter()
            .all(|c| c.kind == ChangeKind::Added && !c.path.contains('/'))
        {
            // new steps start disabled
            return Ok(outcome);
        }

        log::debug!("processing changed -> execute actions");
        self.state = ControllerState::Processing;
        let replay = self.perform_processing(dataset);
        self.state = ControllerState::Idle;
        outcome.absorb(replay);
        Ok(outcome)
    }

    /// The step order changed: store it and rebuild the whole pipeline
    fn move_parameters(&mut self, dataset: &mut Dataset) -> Result<Outcome> {
        if let Some(p) = self.pipeline.as_ref() {
            dataset.state = Some(p.save_state());
        }
        self.initialize(dataset)
    }

    // ------------------------------------------------------------------------
    // Replay
    // ------------------------------------------------------------------------

    /// Save the state, then replay every enabled step on a copy of `dataset`
    pub fn perform_processing(&mut self, dataset: &mut Dataset) -> Result<Outcome> {
        let Some(pipeline) = self.pipeline.as_ref() else {
            return Ok(Outcome::default());
        };
        dataset.state = Some(pipeline.save_state());
        let actions = pipeline.processing_actions()?;
        let output_name = pipeline.output_name().map(str::to_string);

        let transposed = dataset.transposed;
        if transposed {
            dataset.transpose();
        }
        if let Err(e) = self.propagate_actions(dataset, &actions) {
            if dataset.transposed != transposed {
                dataset.transpose();
            }
            log::error!("Processing of {} failed: {}", dataset.name, e);
            return Err(e);
        }

        let mut outcome = Outcome {
            redraw: true,
            reset_zoom: dataset.transposed != transposed,
            ..Default::default()
        };
        if let Some(name) = output_name {
            if dataset.processed_data.is_some() {
                outcome.output = Some(Self::processing_output(dataset, &name));
            }
        }
        Ok(outcome)
    }

    /// Thread a copy of `dataset` through every action
    pub fn propagate_actions(&self, dataset: &mut Dataset, actions: &[Action]) -> Result<()> {
        if actions.is_empty() {
            dataset.clear_processed();
            return Ok(());
        }

        let mut new = dataset.clone();
        new.clear_processed();
        for action in actions {
            log::debug!("Action running: {}", action);
            new = self.functions.call(&action.name, new, &action.kwargs)?;
        }

        if new.transposed {
            dataset.transpose();
        }
        dataset.processed_x = (new.x != dataset.x).then_some(new.x);
        dataset.processed_data = Some(new.data);
        dataset.processed_mask = Some(new.mask);
        Ok(())
    }

    /// New dataset `"{subproject}/{name}"` holding the processed data of
    /// `dataset` as raw data, with a pipeline reduced to a disabled output
    /// step.
    pub fn processing_output(dataset: &Dataset, name: &str) -> Dataset {
        let mut new = dataset.duplicate(&format!("{}/{}", dataset.subproject(), name));

        if let Some(state) = new.state.as_mut() {
            state.children.retain(|key, _| key.trim() == OUTPUT_KEY);
            if let Some(output) = state.children.get_mut(OUTPUT_KEY) {
                output.value = Some(ParamValue::Bool(false));
                let mut name_node = output.child("name").cloned().unwrap_or_default();
                name_node.value = Some(ParamValue::Str("untitled".to_string()));
                output.children.insert("name".to_string(), name_node);
            } else {
                let mut output = StateNode::with_value(ParamValue::Bool(false));
                output.children = std::iter::once((
                    "name".to_string(),
                    StateNode::with_value(ParamValue::Str("untitled".to_string())),
                ))
                .collect::<Children>();
                state.children.insert(OUTPUT_KEY.to_string(), output);
            }
        }

        if let Some(data) = new.processed_data.take() {
            new.data = data;
            new.mask = new
                .processed_mask
                .take()
                .unwrap_or_else(|| vec![false; new.data.len()]);
            if let Some(x) = new.processed_x.take() {
                new.x = x;
            }
        }
        new.clear_processed();
        new.transposed = false;
        log::info!("Processed output stored as {}", new.name);
        new
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> Controller {
        Controller::load(None).unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::from_values("sample/original", vec![1.0, 2.0, 3.0, 4.0])
    }

    fn edit(c: &mut Controller, ds: &mut Dataset, e: Edit) -> Outcome {
        c.apply(ds, e).unwrap()
    }

    fn set_float(step: &str, param: &str, v: f64) -> Edit {
        Edit::SetParam {
            step: step.into(),
            param: param.into(),
            value: ParamValue::Float(v),
        }
    }

    fn enable(step: &str) -> Edit {
        Edit::SetEnabled {
            step: step.into(),
            enabled: true,
        }
    }

    /// scale ×2 then offset +1, both enabled
    fn scale_then_offset(c: &mut Controller, ds: &mut Dataset) {
        c.on_dataset_changed(Some(&mut *ds), DatasetChange::Select)
            .unwrap();
        edit(c, ds, Edit::AddStep("scale".into()));
        edit(c, ds, set_float("scale#0", "factor", 2.0));
        edit(c, ds, enable("scale#0"));
        edit(c, ds, Edit::AddStep("offset".into()));
        edit(c, ds, set_float("offset#0", "value", 1.0));
        edit(c, ds, enable("offset#0"));
    }

    #[test]
    fn test_initialize_saves_state_and_clears_processing() {
        let mut c = controller();
        let mut ds = dataset();
        c.on_dataset_changed(Some(&mut ds), DatasetChange::Select)
            .unwrap();
        assert_eq!(c.state(), ControllerState::Idle);
        assert_eq!(c.selected(), Some("sample/original"));
        let state = ds.state.as_ref().unwrap();
        assert_eq!(state.children.keys().collect::<Vec<_>>(), vec!["output"]);
        assert!(ds.processed_data.is_none());
    }

    #[test]
    fn test_order_sensitivity() {
        let mut c = controller();
        let mut ds = dataset();
        scale_then_offset(&mut c, &mut ds);
        assert_eq!(ds.processed_data, Some(vec![3.0, 5.0, 7.0, 9.0]));
        assert_eq!(ds.data, vec![1.0, 2.0, 3.0, 4.0]);

        let outcome = edit(
            &mut c,
            &mut ds,
            Edit::Move {
                step: "offset#0".into(),
                direction: Direction::Before,
            },
        );
        assert!(outcome.dirty);
        let names: Vec<&str> = ds
            .state
            .as_ref()
            .unwrap()
            .children
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["offset#0", "scale#0", "output"]);
        assert_eq!(ds.processed_data, Some(vec![4.0, 6.0, 8.0, 10.0]));
    }

    #[test]
    fn test_replay_is_idempotent() {
        let mut c = controller();
        let mut ds = dataset();
        scale_then_offset(&mut c, &mut ds);
        let first = (ds.processed_data.clone(), ds.processed_mask.clone());
        c.perform_processing(&mut ds).unwrap();
        assert_eq!((ds.processed_data.clone(), ds.processed_mask.clone()), first);
    }

    #[test]
    fn test_disabled_step_has_no_effect() {
        let mut c = controller();
        let mut ds = dataset();
        scale_then_offset(&mut c, &mut ds);
        edit(
            &mut c,
            &mut ds,
            Edit::SetEnabled {
                step: "scale#0".into(),
                enabled: false,
            },
        );
        assert_eq!(ds.processed_data, Some(vec![2.0, 3.0, 4.0, 5.0]));

        edit(
            &mut c,
            &mut ds,
            Edit::SetEnabled {
                step: "offset#0".into(),
                enabled: false,
            },
        );
        assert!(ds.processed_data.is_none());
    }

    #[test]
    fn test_changes_dropped_while_busy() {
        let mut c = controller();
        let mut ds = dataset();

        let outcome = edit(&mut c, &mut ds, Edit::AddStep("scale".into()));
        assert!(outcome.dropped);
        assert!(ds.state.is_none());

        c.on_dataset_changed(Some(&mut ds), DatasetChange::Select)
            .unwrap();
        let saved = ds.state.clone();
        c.state = ControllerState::Initializing;
        let outcome = edit(&mut c, &mut ds, Edit::AddStep("scale".into()));
        assert!(outcome.dropped);
        c.state = ControllerState::Processing;
        let batch = vec![TreeChange {
            path: "output".into(),
            kind: ChangeKind::Value,
            value: Some(ParamValue::Bool(true)),
        }];
        assert!(c.change(&mut ds, batch).unwrap().dropped);
        assert_eq!(ds.state, saved);
    }

    #[test]
    fn test_unchanged_state_is_ignored() {
        let mut c = controller();
        let mut ds = dataset();
        c.on_dataset_changed(Some(&mut ds), DatasetChange::Select)
            .unwrap();
        let outcome = edit(
            &mut c,
            &mut ds,
            Edit::SetEnabled {
                step: "output".into(),
                enabled: false,
            },
        );
        assert!(!outcome.dirty && !outcome.dropped);
    }

    #[test]
    fn test_mask_region_through_pipeline() {
        let mut c = controller();
        let mut ds = Dataset::from_values("s/original", (0..8).map(|i| i as f64).collect());
        c.on_dataset_changed(Some(&mut ds), DatasetChange::Select)
            .unwrap();
        edit(&mut c, &mut ds, Edit::AddStep("define regions".into()));
        edit(
            &mut c,
            &mut ds,
            Edit::SetKind {
                step: "define regions#0".into(),
                kind: RegionKind::Mask,
            },
        );
        edit(&mut c, &mut ds, enable("define regions#0"));
        edit(
            &mut c,
            &mut ds,
            Edit::AddRegion {
                step: "define regions#0".into(),
                span: Some(Span::new(2.0, 5.0)),
            },
        );
        let mask = ds.processed_mask.clone().unwrap();
        assert_eq!(
            mask,
            vec![false, false, true, true, true, false, false, false]
        );
        assert!(ds.mask.iter().all(|m| !m));

        let err = c.apply(
            &mut ds,
            Edit::SetKind {
                step: "define regions#0".into(),
                kind: RegionKind::Baseline,
            },
        );
        assert!(err.is_err());
        assert_eq!(c.state(), ControllerState::Idle);
    }

    /// 8-point dataset with an enabled mask step holding region `0.0`
    fn masked(c: &mut Controller) -> Dataset {
        let mut ds = Dataset::from_values("s/original", (0..8).map(|i| i as f64).collect());
        c.on_dataset_changed(Some(&mut ds), DatasetChange::Select)
            .unwrap();
        edit(c, &mut ds, Edit::AddStep("define regions".into()));
        edit(
            c,
            &mut ds,
            Edit::SetKind {
                step: "define regions#0".into(),
                kind: RegionKind::Mask,
            },
        );
        edit(c, &mut ds, enable("define regions#0"));
        edit(
            c,
            &mut ds,
            Edit::AddRegion {
                step: "define regions#0".into(),
                span: Some(Span::new(2.0, 5.0)),
            },
        );
        ds
    }

    fn drag_off_axis() -> Edit {
        Edit::DragRegion {
            step: "define regions#0".into(),
            region: "0.0".into(),
            span: Span::new(50.0, 60.0),
        }
    }

    #[test]
    fn test_failed_replay_keeps_edit_dirty() {
        let mut c = controller();
        let mut ds = masked(&mut c);
        let before = ds.state.clone();

        let outcome = c.apply(&mut ds, drag_off_axis()).unwrap();
        assert!(outcome.dirty);
        assert!(outcome.output.is_none());
        assert!(matches!(
            outcome.replay_error,
            Some(Error::SpanOutOfRange { .. })
        ));
        assert_ne!(ds.state, before);
        assert_eq!(c.state(), ControllerState::Idle);
    }

    #[test]
    fn test_failing_saved_state_stays_editable() {
        let mut c = controller();
        let mut ds = masked(&mut c);
        c.apply(&mut ds, drag_off_axis()).unwrap();

        let mut fresh = controller();
        let init = fresh.on_dataset_changed(Some(&mut ds), DatasetChange::Select);
        assert!(init.is_err());
        assert!(fresh.pipeline().is_some());
        assert_eq!(fresh.selected(), Some("s/original"));

        let outcome = edit(
            &mut fresh,
            &mut ds,
            Edit::SetEnabled {
                step: "define regions#0".into(),
                enabled: false,
            },
        );
        assert!(!outcome.dropped);
        assert!(outcome.dirty);
        assert!(outcome.replay_error.is_none());
        assert!(ds.processed_data.is_none());
    }

    #[test]
    fn test_output_materialization() {
        let mut c = controller();
        let mut ds = dataset();
        scale_then_offset(&mut c, &mut ds);
        edit(&mut c, &mut ds, enable("output"));
        let outcome = c
            .apply(
                &mut ds,
                Edit::SetParam {
                    step: "output".into(),
                    param: "name".into(),
                    value: ParamValue::Str("shifted".into()),
                },
            )
            .unwrap();

        let out = outcome.output.unwrap();
        assert_eq!(out.name, "sample/shifted");
        assert_ne!(out.id, ds.id);
        assert_eq!(Some(out.data.clone()), ds.processed_data);
        assert!(out.processed_data.is_none());
        assert!(out.processed_mask.is_none());

        let state = out.state.as_ref().unwrap();
        assert_eq!(state.children.keys().collect::<Vec<_>>(), vec!["output"]);
        let output = state.child("output").unwrap();
        assert_eq!(output.bool_value(), Some(false));
        assert_eq!(
            output.child("name").and_then(StateNode::str_value),
            Some("untitled")
        );
    }

    #[test]
    fn test_transpose_step_transposes_original() {
        let mut c = controller();
        let mut ds = Dataset::new(
            "grid/original",
            crate::data::dataset::Coord::index(3),
            Some(crate::data::dataset::Coord::index(2)),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )
        .unwrap();
        c.on_dataset_changed(Some(&mut ds), DatasetChange::Select)
            .unwrap();
        edit(&mut c, &mut ds, Edit::AddStep("transpose".into()));
        let outcome = edit(&mut c, &mut ds, enable("transpose#0"));
        assert!(outcome.reset_zoom);
        assert!(ds.transposed);
        assert_eq!(ds.shape(), (3, 2));
        assert_eq!(ds.processed_data.as_ref().unwrap(), &ds.data);

        let outcome = edit(
            &mut c,
            &mut ds,
            Edit::SetEnabled {
                step: "transpose#0".into(),
                enabled: false,
            },
        );
        assert!(outcome.reset_zoom);
        assert!(!ds.transposed);
        assert_eq!(ds.data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_missing_catalog_is_fatal() {
        assert!(Controller::load(Some(Path::new("/nonexistent.yaml"))).is_err());
    }
}
