/// Toolbar: top menu bar with project operations and quick actions

use std::path::{Path, PathBuf};

use crate::data::loader::SUPPORTED_EXTENSIONS;
use crate::data::project::PROJECT_EXTENSION;
use crate::export::script::SCRIPT_EXTENSION;

/// Actions that can be triggered from the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    NewProject,
    OpenProject,
    SaveProject,
    SaveProjectAs,
    CloseProject,
    ImportData,
    ExportScript,
    Preferences,
    ToggleConsole,
    ZoomReset,
    ThemeToggle,
    ShowAbout,
    Quit,
}

/// What the menus can offer in the current session
pub struct ToolbarContext<'a> {
    pub theme_label: &'a str,
    pub has_project: bool,
    pub has_selection: bool,
    pub dirty: bool,
}

/// Render the toolbar and return any triggered action
pub fn show_toolbar(ctx: &egui::Context, tc: &ToolbarContext<'_>) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("📁 File", |ui| {
                if ui.button("🆕 New Project").clicked() {
                    action = ToolbarAction::NewProject;
                    ui.close_menu();
                }
                if ui.button("📂 Open Project…").clicked() {
                    action = ToolbarAction::OpenProject;
                    ui.close_menu();
                }
                ui.add_enabled_ui(tc.has_project, |ui| {
                    if ui.button("💾 Save Project").clicked() {
                        action = ToolbarAction::SaveProject;
                        ui.close_menu();
                    }
                    if ui.button("💾 Save Project As…").clicked() {
                        action = ToolbarAction::SaveProjectAs;
                        ui.close_menu();
                    }
                    if ui.button("✕ Close Project").clicked() {
                        action = ToolbarAction::CloseProject;
                        ui.close_menu();
                    }
                });
                ui.separator();
                if ui.button("📥 Import Data…").clicked() {
                    action = ToolbarAction::ImportData;
                    ui.close_menu();
                }
                if ui
                    .add_enabled(tc.has_selection, egui::Button::new("📜 Export Script…"))
                    .clicked()
                {
                    action = ToolbarAction::ExportScript;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("⚙ Preferences…").clicked() {
                    action = ToolbarAction::Preferences;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("⏻ Quit").clicked() {
                    action = ToolbarAction::Quit;
                    ui.close_menu();
                }
            });

            ui.menu_button("🔍 View", |ui| {
                if ui.button("🔄 Reset Zoom").clicked() {
                    action = ToolbarAction::ZoomReset;
                    ui.close_menu();
                }
                if ui.button("📋 Log Console").clicked() {
                    action = ToolbarAction::ToggleConsole;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button(format!("🎨 Theme: {}", tc.theme_label)).clicked() {
                    action = ToolbarAction::ThemeToggle;
                    ui.close_menu();
                }
            });

            ui.menu_button("❓ Help", |ui| {
                if ui.button("ℹ About").clicked() {
                    action = ToolbarAction::ShowAbout;
                    ui.close_menu();
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(egui::Button::new(egui::RichText::new(tc.theme_label).size(12.0)).corner_radius(12.0))
                    .clicked()
                {
                    action = ToolbarAction::ThemeToggle;
                }
                if tc.dirty {
                    ui.separator();
                    ui.label(egui::RichText::new("● unsaved").size(11.5));
                }
            });
        });
    });

    // Keyboard shortcuts
    ctx.input_mut(|i| {
        if i.consume_key(egui::Modifiers::COMMAND, egui::Key::S) {
            action = ToolbarAction::SaveProject;
        }
        if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) {
            action = ToolbarAction::OpenProject;
        }
    });

    action
}

/// Show file-open dialog for data files
pub fn import_data_dialog(dir: &Path) -> Option<Vec<PathBuf>> {
    rfd::FileDialog::new()
        .set_title("Import Spectroscopic Data")
        .set_directory(dir)
        .add_filter("Supported formats", SUPPORTED_EXTENSIONS)
        .add_filter("JCAMP-DX", &["dx", "jdx", "jcamp"])
        .add_filter("Delimited text", &["csv", "tsv", "txt"])
        .add_filter("All Files", &["*"])
        .pick_files()
}

pub fn open_project_dialog(dir: &Path) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open Project")
        .set_directory(dir)
        .add_filter("Project", &[PROJECT_EXTENSION])
        .pick_file()
}

pub fn save_project_dialog(dir: &Path, name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Save Project")
        .set_directory(dir)
        .set_file_name(format!("{}.{}", name, PROJECT_EXTENSION))
        .add_filter("Project", &[PROJECT_EXTENSION])
        .save_file()
}

pub fn save_script_dialog(dir: &Path, name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export Processing Script")
        .set_directory(dir)
        .set_file_name(format!("{}.{}", name, SCRIPT_EXTENSION))
        .add_filter("Script", &[SCRIPT_EXTENSION])
        .save_file()
}
