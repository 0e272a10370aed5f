/// Preferences dialog: edits a copy of the preferences until applied

use std::path::PathBuf;

use crate::preferences::Preferences;

#[derive(Debug, Clone, Default)]
pub struct PreferencesDialogState {
    pub open: bool,
    pub draft: Preferences,
}

impl PreferencesDialogState {
    pub fn open_with(&mut self, prefs: &Preferences) {
        self.draft = prefs.clone();
        self.open = true;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreferencesAction {
    None,
    Apply(Preferences),
    Cancel,
}

fn path_row(ui: &mut egui::Ui, label: &str, path: &mut Option<PathBuf>, pick_dir: bool) {
    ui.horizontal(|ui| {
        ui.label(label);
        let text = path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(default)".to_string());
        ui.label(egui::RichText::new(text).monospace().size(11.5));
        if ui.small_button("…").clicked() {
            let picked = if pick_dir {
                rfd::FileDialog::new().pick_folder()
            } else {
                rfd::FileDialog::new()
                    .add_filter("YAML", &["yaml", "yml"])
                    .pick_file()
            };
            if picked.is_some() {
                *path = picked;
            }
        }
        if path.is_some() && ui.small_button("✕").clicked() {
            *path = None;
        }
    });
}

pub fn show_preferences_dialog(
    ctx: &egui::Context,
    state: &mut PreferencesDialogState,
) -> PreferencesAction {
    if !state.open {
        return PreferencesAction::None;
    }

    let mut action = PreferencesAction::None;
    let mut open = state.open;

    egui::Window::new("⚙ Preferences")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(440.0)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            let draft = &mut state.draft;

            ui.group(|ui| {
                ui.label("🗂 Projects");
                let mut dir = Some(draft.project_directory.clone());
                path_row(ui, "Project directory:", &mut dir, true);
                if let Some(dir) = dir {
                    draft.project_directory = dir;
                }
                ui.checkbox(&mut draft.autoload, "Reopen the last project at startup");
                ui.horizontal(|ui| {
                    ui.checkbox(&mut draft.autosave, "Autosave every");
                    ui.add_enabled(
                        draft.autosave,
                        egui::DragValue::new(&mut draft.autosave_interval_secs)
                            .speed(1)
                            .range(5..=3600)
                            .suffix(" s"),
                    );
                });
            });

            ui.add_space(4.0);

            ui.group(|ui| {
                ui.label("⚙ Processing");
                path_row(ui, "Processor catalog:", &mut draft.catalog_path, false);
                ui.label(
                    egui::RichText::new("A new catalog is used after a restart.")
                        .italics()
                        .size(11.0),
                );
            });

            ui.add_space(4.0);

            ui.group(|ui| {
                ui.label("📋 Logging");
                ui.horizontal(|ui| {
                    ui.label("Log filter:");
                    ui.text_edit_singleline(&mut draft.log_filter);
                });
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("✔ Apply").clicked() {
                    action = PreferencesAction::Apply(draft.clone());
                }
                if ui.button("Cancel").clicked() {
                    action = PreferencesAction::Cancel;
                }
            });
        });

    if !open || action != PreferencesAction::None {
        open = false;
    }
    state.open = open;
    action
}
