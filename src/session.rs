/// Session state
///
/// The open project, its file, the dirty flag, the autosave timer and the
/// selected dataset. Every change is announced through a queue of
/// [`Event`]s that the GUI drains once per frame.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::data::dataset::Dataset;
use crate::data::project::{Project, Update, PROJECT_EXTENSION};
use crate::error::{Error, Result};

pub const UNTITLED: &str = "untitled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectEvent {
    Opened(String),
    Closed,
    Renamed(String),
    DatasetAdded(String),
    DatasetRemoved(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetEvent {
    Select(String),
    /// The selected dataset was replaced
    Updated(String),
    Deselect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Project(ProjectEvent),
    Dataset(DatasetEvent),
}

/// Result of [`Session::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Save {
    Saved(PathBuf),
    /// Nothing changed since the last save
    Skipped,
    /// The project has no file yet: ask for one and call `save_as`
    NeedsPath,
}

#[derive(Debug, Clone)]
pub struct Autosave {
    pub enabled: bool,
    pub interval: Duration,
    last: Instant,
}

impl Autosave {
    pub fn new(enabled: bool, interval: Duration) -> Self {
        Self {
            enabled,
            interval,
            last: Instant::now(),
        }
    }

    pub fn due(&self, now: Instant) -> bool {
        self.enabled && now.duration_since(self.last) >= self.interval
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }
}

#[derive(Debug)]
pub struct Session {
    project: Option<Project>,
    path: Option<PathBuf>,
    dirty: bool,
    pub autosave: Autosave,
    selected: Option<String>,
    events: Vec<Event>,
}

impl Session {
    pub fn new(autosave: Autosave) -> Self {
        Self {
            project: None,
            path: None,
            dirty: false,
            autosave,
            selected: None,
            events: Vec::new(),
        }
    }

    fn emit(&mut self, event: Event) {
        log::debug!("session event: {:?}", event);
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.project.as_ref().and_then(|p| p.get(name))
    }

    pub fn selected_dataset(&self) -> Option<&Dataset> {
        self.selected.as_deref().and_then(|n| self.dataset(n))
    }

    pub fn selected_dataset_mut(&mut self) -> Option<&mut Dataset> {
        let name = self.selected.as_deref()?;
        self.project.as_mut().and_then(|p| p.get_mut(name))
    }

    // ------------------------------------------------------------------------
    // Project lifecycle
    // ------------------------------------------------------------------------

    pub fn new_project(&mut self, name: &str) {
        self.close();
        self.project = Some(Project::new(name));
        self.dirty = false;
        self.emit(Event::Project(ProjectEvent::Opened(name.to_string())));
    }

    pub fn open(&mut self, path: &Path) -> Result<()> {
        let project = Project::load(path)?;
        self.close();
        let name = project.name.clone();
        self.project = Some(project);
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        self.autosave.reset(Instant::now());
        self.emit(Event::Project(ProjectEvent::Opened(name)));
        Ok(())
    }

    pub fn close(&mut self) {
        if self.project.take().is_none() {
            return;
        }
        self.path = None;
        self.dirty = false;
        if self.selected.take().is_some() {
            self.emit(Event::Dataset(DatasetEvent::Deselect));
        }
        self.emit(Event::Project(ProjectEvent::Closed));
    }

    /// Save to the current file. A non-forced save of a clean project is
    /// skipped; an untitled project needs a path first.
    pub fn save(&mut self, force: bool) -> Result<Save> {
        let project = self.project.as_ref().ok_or(Error::NoProject)?;
        if !force && !self.dirty {
            return Ok(Save::Skipped);
        }
        let path = match &self.path {
            Some(p) if project.name != UNTITLED => p.clone(),
            _ => return Ok(Save::NeedsPath),
        };
        project.save(&path)?;
        self.dirty = false;
        self.autosave.reset(Instant::now());
        Ok(Save::Saved(path))
    }

    /// Save under a new file; the project takes the file's name
    pub fn save_as(&mut self, path: &Path) -> Result<PathBuf> {
        let path = path.with_extension(PROJECT_EXTENSION);
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| UNTITLED.to_string());
        let project = self.project.as_mut().ok_or(Error::NoProject)?;
        let renamed = project.name != name;
        project.name = name.clone();
        project.save(&path)?;
        self.path = Some(path.clone());
        self.dirty = false;
        self.autosave.reset(Instant::now());
        if renamed {
            self.emit(Event::Project(ProjectEvent::Renamed(name)));
        }
        Ok(path)
    }

    /// Save when the autosave timer fired, the project is dirty and it
    /// already has a file. Returns whether a save happened.
    pub fn poll_autosave(&mut self, now: Instant) -> Result<bool> {
        if !self.autosave.due(now) {
            return Ok(false);
        }
        self.autosave.reset(now);
        if !self.dirty || self.project.is_none() {
            return Ok(false);
        }
        match self.save(false)? {
            Save::Saved(path) => {
                log::info!("Autosaved {}", path.display());
                Ok(true)
            }
            Save::Skipped | Save::NeedsPath => Ok(false),
        }
    }

    // ------------------------------------------------------------------------
    // Datasets
    // ------------------------------------------------------------------------

    /// Import a dataset as the original of a new sub-project, creating an
    /// untitled project when none is open
    pub fn add_dataset(&mut self, dataset: Dataset) -> String {
        if self.project.is_none() {
            self.new_project(UNTITLED);
        }
        let project = self.project.get_or_insert_with(|| Project::new(UNTITLED));
        let name = project.add_dataset(dataset);
        self.dirty = true;
        self.emit(Event::Project(ProjectEvent::DatasetAdded(name.clone())));
        name
    }

    /// Remove a dataset (its whole sub-project for an original)
    pub fn remove_dataset(&mut self, name: &str) -> Result<Vec<String>> {
        let project = self.project.as_mut().ok_or(Error::NoProject)?;
        let removed = project.remove_dataset(name)?;
        self.dirty = true;
        if self
            .selected
            .as_ref()
            .is_some_and(|s| removed.contains(s))
        {
            self.selected = None;
            self.emit(Event::Dataset(DatasetEvent::Deselect));
        }
        for n in &removed {
            self.emit(Event::Project(ProjectEvent::DatasetRemoved(n.clone())));
        }
        Ok(removed)
    }

    pub fn update_dataset(&mut self, dataset: Dataset) -> Result<Update> {
        let project = self.project.as_mut().ok_or(Error::NoProject)?;
        let name = dataset.name.clone();
        let update = project.update_dataset(dataset)?;
        match update {
            Update::Ignored => {}
            Update::Added => {
                self.dirty = true;
                self.emit(Event::Project(ProjectEvent::DatasetAdded(name)));
            }
            Update::Replaced => {
                self.dirty = true;
                if self.selected.as_deref() == Some(name.as_str()) {
                    self.emit(Event::Dataset(DatasetEvent::Updated(name)));
                }
            }
        }
        Ok(update)
    }

    /// Select a dataset by name; selecting the current one does nothing.
    /// Returns whether the selection changed.
    pub fn select_dataset(&mut self, name: &str) -> Result<bool> {
        if self.selected.as_deref() == Some(name) {
            return Ok(false);
        }
        if self.dataset(name).is_none() {
            return Err(Error::DatasetNotFound(name.to_string()));
        }
        self.selected = Some(name.to_string());
        self.emit(Event::Dataset(DatasetEvent::Select(name.to_string())));
        Ok(true)
    }

    pub fn deselect(&mut self) {
        if self.selected.take().is_some() {
            self.emit(Event::Dataset(DatasetEvent::Deselect));
        }
    }
}
