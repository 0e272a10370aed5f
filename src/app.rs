/// Main application state and eframe::App implementation
///
/// Ties together the session, the pipeline controller, the preferences and
/// the GUI panels. Panels return actions or edits; they are applied here,
/// after the panels are drawn.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use eframe::egui;

use crate::data::loader;
use crate::data::project::Update;
use crate::export::script::Script;
use crate::gui::console::{self, ConsoleState};
use crate::gui::pipeline_panel::{self, PipelinePanelState};
use crate::gui::plot_view::{self, PlotViewState};
use crate::gui::preferences_dialog::{self, PreferencesAction, PreferencesDialogState};
use crate::gui::project_tree::{self, ProjectTreeAction};
use crate::gui::theme::{self, AppTheme, ThemeColors};
use crate::gui::toolbar::{self, ToolbarAction, ToolbarContext};
use crate::logging::ConsoleLog;
use crate::pipeline::controller::{Controller, DatasetChange, Edit, Outcome};
use crate::preferences::Preferences;
use crate::session::{Autosave, DatasetEvent, Event, ProjectEvent, Save, Session, UNTITLED};

/// The main application
pub struct SpectroApp {
    session: Session,
    /// `None` when the processor catalog could not be loaded
    controller: Option<Controller>,
    preferences: Preferences,
    console_log: ConsoleLog,

    /// GUI sub-states
    pipeline_state: PipelinePanelState,
    plot_state: PlotViewState,
    console_state: ConsoleState,
    preferences_state: PreferencesDialogState,

    /// Dataset waiting for the removal confirmation
    pending_remove: Option<String>,

    status_message: String,
    show_about: bool,

    current_theme: AppTheme,
    theme_colors: ThemeColors,

    /// Dropped files buffer
    dropped_files: Vec<PathBuf>,
}

impl SpectroApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        preferences: Preferences,
        console_log: ConsoleLog,
    ) -> Self {
        let default_theme = AppTheme::Light;
        theme::apply_theme(&cc.egui_ctx, default_theme);

        let mut style = (*cc.egui_ctx.style()).clone();
        style.spacing.item_spacing = egui::vec2(8.0, 5.0);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);
        style.spacing.indent = 18.0;
        cc.egui_ctx.set_style(style);

        let mut status_message = "Ready. Import a data file or open a project to begin".to_string();
        let controller = match Controller::load(preferences.catalog_path.as_deref()) {
            Ok(c) => {
                log::info!("{} processors available", c.catalog().processors().len());
                Some(c)
            }
            Err(e) => {
                log::error!("Processing disabled: {}", e);
                status_message = format!("Processing disabled: {}", e);
                None
            }
        };

        let autosave = Autosave::new(preferences.autosave, preferences.autosave_interval());
        let mut app = Self {
            session: Session::new(autosave),
            controller,
            preferences,
            console_log,
            pipeline_state: PipelinePanelState::default(),
            plot_state: PlotViewState::default(),
            console_state: ConsoleState::default(),
            preferences_state: PreferencesDialogState::default(),
            pending_remove: None,
            status_message,
            show_about: false,
            current_theme: default_theme,
            theme_colors: ThemeColors::from_theme(default_theme),
            dropped_files: Vec::new(),
        };

        if let Some(path) = app.preferences.autoload_project().map(Path::to_path_buf) {
            log::info!("Reopening {}", path.display());
            app.open_project(&path);
        }
        app
    }

    // ========================================================================
    // Project operations
    // ========================================================================

    fn import_files(&mut self, paths: Vec<PathBuf>) {
        let mut last = None;
        for path in paths {
            match loader::load_dataset(&path) {
                Ok(dataset) => {
                    let name = self.session.add_dataset(dataset);
                    self.status_message = format!("Imported {}", name);
                    last = Some(name);
                }
                Err(e) => {
                    log::error!("Import of {} failed: {}", path.display(), e);
                    self.status_message = format!("Import failed: {}", e);
                }
            }
        }
        if let Some(name) = last {
            self.select(&name);
        }
    }

    fn open_project(&mut self, path: &Path) {
        match self.session.open(path) {
            Ok(()) => {
                self.preferences.record_last_project(path);
                self.save_preferences();
                self.status_message = format!("Project opened: {}", path.display());
            }
            Err(e) => {
                log::error!("Cannot open {}: {}", path.display(), e);
                self.status_message = format!("Open failed: {}", e);
            }
        }
    }

    fn save_project(&mut self, force: bool) {
        match self.session.save(force) {
            Ok(Save::Saved(path)) => {
                self.status_message = format!("Project saved: {}", path.display());
            }
            Ok(Save::Skipped) => {
                self.status_message = "No unsaved changes".to_string();
            }
            Ok(Save::NeedsPath) => self.save_project_as(),
            Err(e) => {
                log::error!("Save failed: {}", e);
                self.status_message = format!("Save failed: {}", e);
            }
        }
    }

    fn save_project_as(&mut self) {
        let name = self
            .session
            .project()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| UNTITLED.to_string());
        let Some(path) = toolbar::save_project_dialog(&self.preferences.project_directory, &name)
        else {
            return;
        };
        match self.session.save_as(&path) {
            Ok(path) => {
                self.preferences.record_last_project(&path);
                self.save_preferences();
                self.status_message = format!("Project saved: {}", path.display());
            }
            Err(e) => {
                log::error!("Save failed: {}", e);
                self.status_message = format!("Save failed: {}", e);
            }
        }
    }

    fn export_script(&mut self) {
        let (Some(dataset), Some(pipeline)) = (
            self.session.selected_dataset(),
            self.controller.as_ref().and_then(|c| c.pipeline()),
        ) else {
            self.status_message = "Select a dataset to export its processing".to_string();
            return;
        };
        let script = match Script::from_pipeline(pipeline, dataset) {
            Ok(s) => s,
            Err(e) => {
                log::error!("Script export failed: {}", e);
                self.status_message = format!("Script export failed: {}", e);
                return;
            }
        };
        let name = dataset.short_name().to_string();
        let Some(path) = toolbar::save_script_dialog(&self.preferences.project_directory, &name)
        else {
            return;
        };
        match script.save(&path) {
            Ok(()) => {
                log::info!("Script with {} steps written to {}", script.len(), path.display());
                self.status_message = format!("Script exported: {}", path.display());
            }
            Err(e) => {
                log::error!("Script export failed: {}", e);
                self.status_message = format!("Script export failed: {}", e);
            }
        }
    }

    fn save_preferences(&self) {
        if let Err(e) = self.preferences.save() {
            log::warn!("Cannot save preferences: {}", e);
        }
    }

    fn apply_preferences(&mut self, prefs: Preferences) {
        self.session.autosave.enabled = prefs.autosave;
        self.session.autosave.interval = prefs.autosave_interval();
        if prefs.catalog_path != self.preferences.catalog_path {
            self.status_message = "Processor catalog changes apply after a restart".to_string();
        }
        self.preferences = prefs;
        self.save_preferences();
    }

    fn select(&mut self, name: &str) {
        if let Err(e) = self.session.select_dataset(name) {
            log::warn!("{}", e);
            self.status_message = e.to_string();
        }
    }

    fn remove(&mut self, name: &str) {
        match self.session.remove_dataset(name) {
            Ok(removed) => {
                self.status_message = format!("Removed {}", removed.join(", "));
            }
            Err(e) => {
                log::warn!("{}", e);
                self.status_message = e.to_string();
            }
        }
    }

    // ========================================================================
    // Controller wiring
    // ========================================================================

    /// Forward the session events of this frame to the controller
    fn process_events(&mut self) {
        for event in self.session.take_events() {
            match event {
                Event::Dataset(DatasetEvent::Select(_)) => {
                    self.pipeline_state.reset();
                    self.dataset_changed(DatasetChange::Select);
                }
                Event::Dataset(DatasetEvent::Updated(_)) => {
                    self.dataset_changed(DatasetChange::Updated);
                }
                Event::Dataset(DatasetEvent::Deselect) => {
                    self.pipeline_state.reset();
                    if let Some(c) = self.controller.as_mut() {
                        c.clear();
                    }
                }
                Event::Project(ProjectEvent::Opened(name)) => {
                    log::info!("Project {} opened", name);
                }
                Event::Project(ProjectEvent::Closed) => {
                    if let Some(c) = self.controller.as_mut() {
                        c.clear();
                    }
                }
                Event::Project(ProjectEvent::Renamed(name)) => {
                    log::info!("Project renamed to {}", name);
                }
                Event::Project(ProjectEvent::DatasetAdded(name)) => {
                    log::debug!("Dataset {} added", name);
                }
                Event::Project(ProjectEvent::DatasetRemoved(name)) => {
                    log::debug!("Dataset {} removed", name);
                }
            }
        }
    }

    fn dataset_changed(&mut self, change: DatasetChange) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        let result = controller.on_dataset_changed(self.session.selected_dataset_mut(), change);
        match result {
            Ok(outcome) => self.handle_outcome(outcome),
            Err(e) => {
                log::error!("Pipeline initialisation failed: {}", e);
                self.status_message = format!("Processing failed: {}", e);
            }
        }
    }

    fn apply_edit(&mut self, edit: Edit) {
        let (Some(controller), Some(dataset)) =
            (self.controller.as_mut(), self.session.selected_dataset_mut())
        else {
            return;
        };
        let result = controller.apply(dataset, edit);
        match result {
            Ok(outcome) => self.handle_outcome(outcome),
            Err(e) => {
                log::warn!("Edit rejected: {}", e);
                self.status_message = e.to_string();
            }
        }
    }

    fn handle_outcome(&mut self, outcome: Outcome) {
        if outcome.dropped {
            log::debug!("edit dropped, controller busy");
            return;
        }
        if outcome.dirty {
            self.session.mark_dirty();
        }
        if let Some(e) = &outcome.replay_error {
            self.status_message = format!("Processing failed: {}", e);
        }
        if outcome.reset_zoom {
            self.plot_state.reset_zoom();
        }
        let Some(output) = outcome.output else {
            return;
        };
        if self.session.selected() == Some(output.name.as_str()) {
            log::warn!("Output {} would replace the dataset it is computed from", output.name);
            self.status_message = format!("Output name {} is the selected dataset", output.name);
            return;
        }
        let name = output.name.clone();
        match self.session.update_dataset(output) {
            Ok(Update::Added) => self.status_message = format!("Output {} added", name),
            Ok(Update::Replaced) => self.status_message = format!("Output {} updated", name),
            Ok(Update::Ignored) => {}
            Err(e) => {
                log::error!("Cannot store output {}: {}", name, e);
                self.status_message = e.to_string();
            }
        }
    }

    // ========================================================================
    // Toolbar
    // ========================================================================

    fn handle_toolbar_action(&mut self, ctx: &egui::Context, action: ToolbarAction) {
        match action {
            ToolbarAction::NewProject => {
                self.session.new_project(UNTITLED);
                self.status_message = "New project".to_string();
            }
            ToolbarAction::OpenProject => {
                if let Some(path) = toolbar::open_project_dialog(&self.preferences.project_directory) {
                    self.open_project(&path);
                }
            }
            ToolbarAction::SaveProject => {
                if self.session.project().is_some() {
                    self.save_project(true);
                }
            }
            ToolbarAction::SaveProjectAs => {
                if self.session.project().is_some() {
                    self.save_project_as();
                }
            }
            ToolbarAction::CloseProject => {
                self.session.close();
                self.status_message = "Project closed".to_string();
            }
            ToolbarAction::ImportData => {
                if let Some(paths) = toolbar::import_data_dialog(&self.preferences.project_directory) {
                    self.import_files(paths);
                }
            }
            ToolbarAction::ExportScript => self.export_script(),
            ToolbarAction::Preferences => self.preferences_state.open_with(&self.preferences),
            ToolbarAction::ToggleConsole => self.console_state.open = !self.console_state.open,
            ToolbarAction::ZoomReset => {
                self.plot_state.reset_zoom();
                self.status_message = "Zoom reset".to_string();
            }
            ToolbarAction::ThemeToggle => {
                self.current_theme = self.current_theme.next();
                self.theme_colors = ThemeColors::from_theme(self.current_theme);
            }
            ToolbarAction::ShowAbout => self.show_about = true,
            ToolbarAction::Quit => {
                if self.session.is_dirty() && self.session.path().is_some() {
                    self.save_project(false);
                }
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            ToolbarAction::None => {}
        }
    }
}

impl eframe::App for SpectroApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        theme::apply_theme(ctx, self.current_theme);

        // Handle drag-and-drop
        ctx.input(|i| {
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    self.dropped_files.push(path.clone());
                }
            }
        });
        if !self.dropped_files.is_empty() {
            let paths = std::mem::take(&mut self.dropped_files);
            self.import_files(paths);
        }

        self.process_events();

        match self.session.poll_autosave(Instant::now()) {
            Ok(true) => self.status_message = "Project autosaved".to_string(),
            Ok(false) => {}
            Err(e) => {
                log::error!("Autosave failed: {}", e);
                self.status_message = format!("Autosave failed: {}", e);
            }
        }
        ctx.request_repaint_after(Duration::from_secs(1));

        // ── Toolbar ──
        let tc = ToolbarContext {
            theme_label: self.current_theme.label(),
            has_project: self.session.project().is_some(),
            has_selection: self.session.selected().is_some(),
            dirty: self.session.is_dirty(),
        };
        let toolbar_action = toolbar::show_toolbar(ctx, &tc);
        if toolbar_action != ToolbarAction::None {
            self.handle_toolbar_action(ctx, toolbar_action);
        }

        // ── Status Bar ──
        let colors = self.theme_colors.clone();
        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                egui::Frame::new()
                    .fill(colors.status_bar_bg)
                    .inner_margin(egui::Margin::symmetric(12, 4)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(11.5)
                            .color(colors.status_text),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let state = self
                            .controller
                            .as_ref()
                            .map(|c| format!("{:?}", c.state()))
                            .unwrap_or_else(|| "no catalog".to_string());
                        ui.label(egui::RichText::new(state).size(11.0).color(colors.text_muted));
                        if let Some(path) = self.session.path() {
                            ui.separator();
                            ui.label(
                                egui::RichText::new(path.display().to_string())
                                    .size(11.0)
                                    .color(colors.text_muted),
                            );
                        }
                    });
                });
            });

        // ── Left Panel: Project ──
        let mut tree_action = ProjectTreeAction::None;
        egui::SidePanel::left("project_panel")
            .resizable(true)
            .default_width(240.0)
            .min_width(180.0)
            .max_width(400.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        tree_action = project_tree::show_project_tree(
                            ui,
                            self.session.project(),
                            self.session.selected(),
                        );
                    });
            });

        // ── Right Panel: Processing Pipeline ──
        let mut pipeline_edit = None;
        egui::SidePanel::right("pipeline_panel")
            .resizable(true)
            .default_width(300.0)
            .min_width(220.0)
            .max_width(480.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        let controller = self.controller.as_ref();
                        pipeline_edit = pipeline_panel::show_pipeline_panel(
                            ui,
                            &mut self.pipeline_state,
                            controller.and_then(|c| c.pipeline()),
                            controller.map(|c| c.catalog()),
                        );
                    });
            });

        // ── Central Panel: Plot ──
        let mut plot_edit = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            match self.session.selected_dataset() {
                Some(dataset) => {
                    let pipeline = self.controller.as_ref().and_then(|c| c.pipeline());
                    let resp =
                        plot_view::show_plot(ui, dataset, pipeline, &mut self.plot_state, &colors);
                    if let (Some(view), Some(c)) = (resp.view, self.controller.as_mut()) {
                        c.set_view(view);
                    }
                    plot_edit = resp.edit;
                }
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.heading("Select or import a dataset");
                    });
                }
            }
        });

        // Handle deferred actions
        match tree_action {
            ProjectTreeAction::Select(name) => self.select(&name),
            ProjectTreeAction::Remove(name) => self.pending_remove = Some(name),
            ProjectTreeAction::None => {}
        }
        if let Some(edit) = pipeline_edit.or(plot_edit) {
            self.apply_edit(edit);
        }

        // ── Removal confirmation ──
        if let Some(name) = self.pending_remove.clone() {
            let is_original = self
                .session
                .dataset(&name)
                .is_some_and(|d| d.is_original());
            match project_tree::confirm_remove(ctx, &name, is_original) {
                Some(true) => {
                    self.pending_remove = None;
                    self.remove(&name);
                }
                Some(false) => self.pending_remove = None,
                None => {}
            }
        }

        // ── Preferences Dialog ──
        match preferences_dialog::show_preferences_dialog(ctx, &mut self.preferences_state) {
            PreferencesAction::Apply(prefs) => self.apply_preferences(prefs),
            PreferencesAction::Cancel | PreferencesAction::None => {}
        }

        // ── Log Console ──
        console::show_console(ctx, &mut self.console_state, &self.console_log, &colors);

        // ── About Dialog ──
        if self.show_about {
            egui::Window::new("About")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.heading("📈 Spectroscopy Processing GUI");
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(10.0);
                    ui.label("Built with Rust + egui");
                    ui.add_space(10.0);
                    ui.label("• Editable processing pipelines replayed on every change");
                    ui.label("• Baseline, integral and mask regions drawn on the plot");
                    ui.label("• Projects of datasets and their processed outputs");
                    ui.label("• Processing exported as a script");
                });
        }
    }
}
