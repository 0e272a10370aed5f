/// Processing pipeline panel: the parameter tree of the selected dataset
///
/// Renders the steps of the pipeline in processing order and turns every
/// user interaction into a single [`Edit`] for the controller.

use std::collections::HashMap;

use egui::collapsing_header::CollapsingState;

use crate::data::region::{RegionKind, Span};
use crate::pipeline::catalog::Catalog;
use crate::pipeline::controller::Edit;
use crate::pipeline::model::{Pipeline, ProcessingStep, KIND_PARAM};
use crate::pipeline::params::{Param, ParamType, ParamValue};

/// UI-only state of the panel
#[derive(Debug, Clone, Default)]
pub struct PipelinePanelState {
    /// Template key picked in the "Add process" combo box
    pub add_choice: Option<String>,
    /// Text being typed in string and region fields, keyed by path
    edit_buffers: HashMap<String, String>,
}

impl PipelinePanelState {
    /// Forget pending text edits (new dataset selected)
    pub fn reset(&mut self) {
        self.edit_buffers.clear();
    }
}

pub fn show_pipeline_panel(
    ui: &mut egui::Ui,
    state: &mut PipelinePanelState,
    pipeline: Option<&Pipeline>,
    catalog: Option<&Catalog>,
) -> Option<Edit> {
    let mut edit = None;

    ui.vertical_centered(|ui| {
        ui.heading("⚙️ Processing");
    });
    ui.separator();

    let (Some(pipeline), Some(catalog)) = (pipeline, catalog) else {
        ui.add_space(12.0);
        ui.label(
            egui::RichText::new("Select a dataset to edit its pipeline.")
                .size(12.5)
                .color(egui::Color32::from_rgb(0x88, 0x8C, 0x94)),
        );
        return edit;
    };

    add_process_row(ui, state, catalog, &mut edit);
    ui.separator();

    for step in pipeline.steps() {
        show_step(ui, state, step, &mut edit);
    }

    edit
}

fn add_process_row(
    ui: &mut egui::Ui,
    state: &mut PipelinePanelState,
    catalog: &Catalog,
    edit: &mut Option<Edit>,
) {
    ui.horizontal(|ui| {
        let selected_title = state
            .add_choice
            .as_deref()
            .and_then(|k| catalog.get(k))
            .map(|t| t.title.clone())
            .unwrap_or_else(|| "Add process …".to_string());
        egui::ComboBox::from_id_salt("add_process")
            .selected_text(selected_title)
            .show_ui(ui, |ui| {
                for t in catalog.processors() {
                    ui.selectable_value(&mut state.add_choice, Some(t.key.clone()), t.title.as_str())
                        .on_hover_text(t.tip.as_str());
                }
            });
        if ui
            .add_enabled(state.add_choice.is_some(), egui::Button::new("＋ Add"))
            .clicked()
        {
            if let Some(key) = state.add_choice.take() {
                *edit = Some(Edit::AddStep(key));
            }
        }
    });
}

fn show_step(
    ui: &mut egui::Ui,
    state: &mut PipelinePanelState,
    step: &ProcessingStep,
    edit: &mut Option<Edit>,
) {
    let id = ui.make_persistent_id(("step", &step.name));
    let mut collapsing = CollapsingState::load_with_default_open(ui.ctx(), id, step.expanded);
    collapsing.set_open(step.expanded);

    let (toggle, _, _) = collapsing
        .show_header(ui, |ui| {
            let mut enabled = step.enabled;
            if ui.checkbox(&mut enabled, "").changed() {
                *edit = Some(Edit::SetEnabled {
                    step: step.name.clone(),
                    enabled,
                });
            }
            let title = if step.is_output() {
                step.title.clone()
            } else {
                format!("{}  ·  {}", step.title, step.name)
            };
            let label = ui.label(egui::RichText::new(title).strong()).on_hover_text(step.tip.as_str());
            label.context_menu(|ui| {
                for (direction, text) in &step.context {
                    if ui.button(*text).clicked() {
                        *edit = Some(Edit::Move {
                            step: step.name.clone(),
                            direction: *direction,
                        });
                        ui.close_menu();
                    }
                }
                if step.removable && ui.button("🗑 Remove").clicked() {
                    *edit = Some(Edit::RemoveStep(step.name.clone()));
                    ui.close_menu();
                }
            });
        })
        .body(|ui| {
            for param in &step.params {
                match param.ty {
                    ParamType::RegionGroup => show_region_group(ui, state, step, edit),
                    _ if step.region.is_some() && param.name == KIND_PARAM => {
                        show_kind(ui, step, param, edit)
                    }
                    _ => show_param(ui, state, step, param, edit),
                }
            }
        });

    if toggle.clicked() {
        *edit = Some(Edit::SetExpanded {
            step: step.name.clone(),
            expanded: !step.expanded,
        });
    }
}

fn show_kind(ui: &mut egui::Ui, step: &ProcessingStep, param: &Param, edit: &mut Option<Edit>) {
    let current = step.kind();
    ui.horizontal(|ui| {
        ui.label(param.title.as_str());
        ui.add_enabled_ui(!param.readonly, |ui| {
            let mut choice = current;
            egui::ComboBox::from_id_salt(("kind", &step.name))
                .selected_text(current.as_str())
                .show_ui(ui, |ui| {
                    for kind in RegionKind::ALL {
                        ui.selectable_value(&mut choice, kind, kind.as_str());
                    }
                });
            if choice != current {
                *edit = Some(Edit::SetKind {
                    step: step.name.clone(),
                    kind: choice,
                });
            }
        })
        .response
        .on_hover_text(param.tip.as_str());
    });
}

fn show_param(
    ui: &mut egui::Ui,
    state: &mut PipelinePanelState,
    step: &ProcessingStep,
    param: &Param,
    edit: &mut Option<Edit>,
) {
    let mut set = |value: ParamValue| {
        *edit = Some(Edit::SetParam {
            step: step.name.clone(),
            param: param.name.clone(),
            value,
        });
    };

    ui.horizontal(|ui| {
        ui.label(param.title.as_str()).on_hover_text(param.tip.as_str());
        ui.add_enabled_ui(!param.readonly, |ui| match param.ty {
            ParamType::Float => {
                let mut v = param.value.as_f64().unwrap_or(0.0);
                let mut drag = egui::DragValue::new(&mut v).speed(0.1);
                if let Some([lo, hi]) = param.limits {
                    drag = drag.range(lo..=hi);
                }
                if ui.add(drag).changed() {
                    set(ParamValue::Float(v));
                }
            }
            ParamType::Int => {
                let mut v = param.value.as_i64().unwrap_or(0);
                let mut drag = egui::DragValue::new(&mut v).speed(0.2);
                if let Some([lo, hi]) = param.limits {
                    drag = drag.range(lo as i64..=hi as i64);
                }
                if ui.add(drag).changed() {
                    set(ParamValue::Int(v));
                }
            }
            ParamType::Bool => {
                let mut v = param.value.as_bool().unwrap_or(false);
                if ui.checkbox(&mut v, "").changed() {
                    set(ParamValue::Bool(v));
                }
            }
            ParamType::List => {
                let current = param.value.as_str().unwrap_or_default().to_string();
                let mut choice = current.clone();
                egui::ComboBox::from_id_salt((&step.name, &param.name))
                    .selected_text(current.as_str())
                    .show_ui(ui, |ui| {
                        for v in &param.values {
                            ui.selectable_value(&mut choice, v.clone(), v.as_str());
                        }
                    });
                if choice != current {
                    set(ParamValue::Str(choice));
                }
            }
            ParamType::Str | ParamType::RegionGroup => {
                let key = format!("{}/{}", step.name, param.name);
                let current = param.value.to_string();
                let buffer = state
                    .edit_buffers
                    .entry(key.clone())
                    .or_insert_with(|| current.clone());
                let response = ui.text_edit_singleline(buffer);
                if response.lost_focus() {
                    let text = buffer.trim().to_string();
                    state.edit_buffers.remove(&key);
                    if text != current {
                        set(ParamValue::Str(text));
                    }
                } else if !response.has_focus() && *buffer != current {
                    *buffer = current;
                }
            }
        });
    });
}

fn show_region_group(
    ui: &mut egui::Ui,
    state: &mut PipelinePanelState,
    step: &ProcessingStep,
    edit: &mut Option<Edit>,
) {
    let Some(def) = step.region.as_ref() else {
        return;
    };
    let kind = step.kind();

    let id = ui.make_persistent_id(("regions", &step.name));
    let mut collapsing = CollapsingState::load_with_default_open(ui.ctx(), id, def.group.expanded);
    collapsing.set_open(def.group.expanded);

    let (toggle, _, _) = collapsing
        .show_header(ui, |ui| {
            ui.label(format!("Regions ({})", def.group.entries.len()));
            let add = ui
                .add_enabled(kind.is_defined(), egui::Button::new("＋").small())
                .on_hover_text("Add a region in the visible range");
            let add = if kind.is_defined() {
                add
            } else {
                add.on_disabled_hover_text("Select a kind first")
            };
            if add.clicked() {
                *edit = Some(Edit::AddRegion {
                    step: step.name.clone(),
                    span: None,
                });
            }
        })
        .body(|ui| {
            for entry in &def.group.entries {
                let key = format!("{}/{}", step.name, entry.name);
                ui.horizontal(|ui| {
                    if ui.small_button(entry.name.as_str()).clicked() {
                        *edit = Some(Edit::SelectRegion {
                            step: step.name.clone(),
                            region: entry.name.clone(),
                        });
                    }
                    let buffer = state
                        .edit_buffers
                        .entry(key.clone())
                        .or_insert_with(|| entry.value.clone());
                    let response =
                        ui.add(egui::TextEdit::singleline(buffer).desired_width(110.0));
                    if response.lost_focus() {
                        let parsed = buffer.parse::<Span>();
                        state.edit_buffers.remove(&key);
                        match parsed {
                            Ok(span) => {
                                *edit = Some(Edit::DragRegion {
                                    step: step.name.clone(),
                                    region: entry.name.clone(),
                                    span,
                                });
                            }
                            Err(e) => log::warn!("{}: {}", entry.name, e),
                        }
                    } else if !response.has_focus() && *buffer != entry.value {
                        *buffer = entry.value.clone();
                    }
                    if ui.small_button("✕").on_hover_text("Remove region").clicked() {
                        *edit = Some(Edit::RemoveRegion {
                            step: step.name.clone(),
                            region: entry.name.clone(),
                        });
                    }
                });
            }
        });

    if toggle.clicked() {
        *edit = Some(Edit::SetGroupExpanded {
            step: step.name.clone(),
            expanded: !def.group.expanded,
        });
    }
}
