/// Project tree panel: sub-projects and their datasets

use crate::data::project::Project;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectTreeAction {
    None,
    Select(String),
    /// Ask for confirmation, then remove
    Remove(String),
}

pub fn show_project_tree(
    ui: &mut egui::Ui,
    project: Option<&Project>,
    selected: Option<&str>,
) -> ProjectTreeAction {
    let mut action = ProjectTreeAction::None;

    let Some(project) = project else {
        ui.label(
            egui::RichText::new("No project open.\nFile → Import Data to start one.")
                .size(12.0)
                .color(egui::Color32::from_rgb(0x88, 0x8C, 0x94)),
        );
        return action;
    };

    ui.label(egui::RichText::new(format!("🗂 {}", project.name)).strong());
    if project.is_empty() {
        ui.label(
            egui::RichText::new("Empty project")
                .italics()
                .color(egui::Color32::from_rgb(0x88, 0x8C, 0x94)),
        );
    }

    for sub in &project.subprojects {
        egui::CollapsingHeader::new(&sub.name)
            .id_salt(("subproject", &sub.name))
            .default_open(true)
            .show(ui, |ui| {
                for dataset in &sub.datasets {
                    let is_selected = selected == Some(dataset.name.as_str());
                    let label = format!(
                        "{} ({}×{})",
                        dataset.short_name(),
                        dataset.y.len(),
                        dataset.x.len()
                    );
                    let response = ui.selectable_label(is_selected, label);
                    if response.clicked() && !is_selected {
                        action = ProjectTreeAction::Select(dataset.name.clone());
                    }
                    response.context_menu(|ui| {
                        let text = if dataset.is_original() {
                            "🗑 Remove sub-project"
                        } else {
                            "🗑 Remove dataset"
                        };
                        if ui.button(text).clicked() {
                            action = ProjectTreeAction::Remove(dataset.name.clone());
                            ui.close_menu();
                        }
                    });
                }
            });
    }

    action
}

/// Confirmation dialog for a pending removal.
///
/// Returns `Some(true)` when confirmed, `Some(false)` when declined.
pub fn confirm_remove(ctx: &egui::Context, name: &str, is_original: bool) -> Option<bool> {
    let mut answer = None;
    egui::Window::new("Confirm removal")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            if is_original {
                ui.label(format!(
                    "Removing {} deletes its whole sub-project.\nContinue?",
                    name
                ));
            } else {
                ui.label(format!("Remove {}?", name));
            }
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui.button("Remove").clicked() {
                    answer = Some(true);
                }
                if ui.button("Cancel").clicked() {
                    answer = Some(false);
                }
            });
        });
    answer
}
