/// Log console window: the lines captured by the logging backend

use log::Level;

use super::theme::ThemeColors;
use crate::logging::ConsoleLog;

#[derive(Debug, Clone)]
pub struct ConsoleState {
    pub open: bool,
    /// Least severe level shown
    pub level: Level,
    pub filter: String,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self {
            open: false,
            level: Level::Info,
            filter: String::new(),
        }
    }
}

fn level_color(level: Level, colors: &ThemeColors) -> egui::Color32 {
    match level {
        Level::Error => colors.error,
        Level::Warn => colors.warning,
        Level::Info => colors.status_text,
        Level::Debug | Level::Trace => colors.text_muted,
    }
}

pub fn show_console(
    ctx: &egui::Context,
    state: &mut ConsoleState,
    log: &ConsoleLog,
    colors: &ThemeColors,
) {
    if !state.open {
        return;
    }

    let mut open = state.open;
    egui::Window::new("📋 Log Console")
        .open(&mut open)
        .default_width(720.0)
        .default_height(320.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                egui::ComboBox::from_id_salt("console_level")
                    .selected_text(state.level.as_str())
                    .show_ui(ui, |ui| {
                        for level in [Level::Error, Level::Warn, Level::Info, Level::Debug, Level::Trace] {
                            ui.selectable_value(&mut state.level, level, level.as_str());
                        }
                    });
                ui.label("Filter:");
                ui.text_edit_singleline(&mut state.filter);
                if ui.button("🗑 Clear").clicked() {
                    log.clear();
                }
                ui.label(format!("{} lines", log.len()));
            });
            ui.separator();

            let filter = state.filter.to_lowercase();
            let lines: Vec<_> = log
                .snapshot()
                .into_iter()
                .filter(|l| l.level <= state.level)
                .filter(|l| filter.is_empty() || l.message.to_lowercase().contains(&filter))
                .collect();

            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for line in &lines {
                        ui.label(
                            egui::RichText::new(line.to_text())
                                .monospace()
                                .size(11.5)
                                .color(level_color(line.level, colors)),
                        );
                    }
                });
        });
    state.open = open;
}
