/// Project tree
///
/// A project is a named list of sub-projects; each sub-project holds the
/// imported `original` dataset and the datasets derived from it (processed
/// outputs). As long as a sub-project exists its `"{name}/original"`
/// dataset exists too: removing the original removes the sub-project.
///
/// Only originals are written to disk (`.scproj`, JSON). Their saved
/// pipeline state is enough to recompute every derived dataset on reload.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::dataset::Dataset;
use crate::error::{Error, Result};

/// Project file extension
pub const PROJECT_EXTENSION: &str = "scproj";

const ORIGINAL: &str = "original";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subproject {
    pub name: String,
    pub datasets: Vec<Dataset>,
}

impl Subproject {
    pub fn original(&self) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.short_name() == ORIGINAL)
    }
}

/// Result of [`Project::update_dataset`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// `untitled` datasets are never stored
    Ignored,
    Added,
    Replaced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub subprojects: Vec<Subproject>,
}

impl Project {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subprojects: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let project: Project = serde_json::from_str(&text)?;
        for dataset in project.subprojects.iter().flat_map(|s| &s.datasets) {
            dataset.validate()?;
        }
        log::info!(
            "Project {} loaded ({} sub-projects)",
            project.name,
            project.subprojects.len()
        );
        Ok(project)
    }

    /// Write the saved form of the project (see [`Project::to_saved`])
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_saved())?;
        std::fs::write(path, json)?;
        log::info!("Project {} saved to {}", self.name, path.display());
        Ok(())
    }

    /// Copy holding only the original datasets, untransposed and without
    /// processed data
    pub fn to_saved(&self) -> Project {
        let subprojects = self
            .subprojects
            .iter()
            .map(|sub| Subproject {
                name: sub.name.clone(),
                datasets: sub
                    .datasets
                    .iter()
                    .filter(|d| d.short_name() == ORIGINAL)
                    .map(|d| {
                        let mut d = d.clone();
                        d.clear_processed();
                        if d.transposed {
                            d.transpose();
                        }
                        d
                    })
                    .collect(),
            })
            .collect();
        Project {
            name: self.name.clone(),
            subprojects,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subprojects.is_empty()
    }

    pub fn subproject(&self, name: &str) -> Option<&Subproject> {
        self.subprojects.iter().find(|s| s.name == name)
    }

    pub fn datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.subprojects.iter().flat_map(|s| s.datasets.iter())
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets().find(|d| d.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Dataset> {
        self.subprojects
            .iter_mut()
            .flat_map(|s| s.datasets.iter_mut())
            .find(|d| d.name == name)
    }

    fn unique_subproject_name(&self, base: &str) -> String {
        let base = if base.is_empty() { "dataset" } else { base };
        if self.subproject(base).is_none() {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{}_{}", base, i))
            .find(|n| self.subproject(n).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// Store an imported dataset as `"{name}/original"` of a new
    /// sub-project; returns the canonical name
    pub fn add_dataset(&mut self, mut dataset: Dataset) -> String {
        let base = dataset.short_name().replace('/', "_");
        let sub = self.unique_subproject_name(&base);
        dataset.name = format!("{}/{}", sub, ORIGINAL);
        let name = dataset.name.clone();
        self.subprojects.push(Subproject {
            name: sub,
            datasets: vec![dataset],
        });
        log::info!("Dataset {} added to project {}", name, self.name);
        name
    }

    /// Remove a dataset; removing an original removes its whole
    /// sub-project. Returns the names of every removed dataset.
    pub fn remove_dataset(&mut self, name: &str) -> Result<Vec<String>> {
        let (sub_name, short) = name
            .split_once('/')
            .ok_or_else(|| Error::DatasetNotFound(name.to_string()))?;
        let index = self
            .subprojects
            .iter()
            .position(|s| s.name == sub_name)
            .ok_or_else(|| Error::SubprojectNotFound(sub_name.to_string()))?;

        if short == ORIGINAL {
            let sub = self.subprojects.remove(index);
            log::info!("Sub-project {} removed", sub.name);
            return Ok(sub.datasets.into_iter().map(|d| d.name).collect());
        }

        let sub = &mut self.subprojects[index];
        let pos = sub
            .datasets
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| Error::DatasetNotFound(name.to_string()))?;
        let removed = sub.datasets.remove(pos);
        Ok(vec![removed.name])
    }

    /// Replace the dataset of the same name, keeping its id, or add it to
    /// its sub-project
    pub fn update_dataset(&mut self, mut dataset: Dataset) -> Result<Update> {
        if dataset.name.contains("untitled") {
            return Ok(Update::Ignored);
        }
        let sub_name = dataset.subproject().to_string();
        let sub = self
            .subprojects
            .iter_mut()
            .find(|s| s.name == sub_name)
            .ok_or_else(|| Error::SubprojectNotFound(sub_name.clone()))?;

        match sub.datasets.iter_mut().find(|d| d.name == dataset.name) {
            Some(existing) => {
                dataset.id = existing.id;
                *existing = dataset;
                Ok(Update::Replaced)
            }
            None => {
                sub.datasets.push(dataset);
                Ok(Update::Added)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> (Project, String) {
        let mut p = Project::new("test");
        let name = p.add_dataset(Dataset::from_values("sample", vec![1.0, 2.0, 3.0]));
        (p, name)
    }

    #[test]
    fn test_add_creates_subproject() {
        let (mut p, name) = project();
        assert_eq!(name, "sample/original");
        let second = p.add_dataset(Dataset::from_values("sample", vec![0.0]));
        assert_eq!(second, "sample_1/original");
        assert!(p.subproject("sample").unwrap().original().is_some());
    }

    #[test]
    fn test_update_keeps_id_and_ignores_untitled() {
        let (mut p, name) = project();
        let id = p.get(&name).unwrap().id;
        let replacement = Dataset::from_values(&name, vec![9.0]);
        assert_eq!(p.update_dataset(replacement).unwrap(), Update::Replaced);
        assert_eq!(p.get(&name).unwrap().id, id);
        assert_eq!(p.get(&name).unwrap().data, vec![9.0]);

        let ignored = Dataset::from_values("sample/untitled", vec![1.0]);
        assert_eq!(p.update_dataset(ignored).unwrap(), Update::Ignored);
        assert!(p.get("sample/untitled").is_none());

        let derived = Dataset::from_values("sample/smoothed", vec![1.0]);
        assert_eq!(p.update_dataset(derived).unwrap(), Update::Added);
        assert!(p.get("sample/smoothed").is_some());

        let orphan = Dataset::from_values("nowhere/x", vec![1.0]);
        assert!(matches!(
            p.update_dataset(orphan),
            Err(Error::SubprojectNotFound(_))
        ));
    }

    #[test]
    fn test_remove_original_removes_subproject() {
        let (mut p, name) = project();
        p.update_dataset(Dataset::from_values("sample/out", vec![1.0]))
            .unwrap();

        let removed = p.remove_dataset("sample/out").unwrap();
        assert_eq!(removed, vec!["sample/out".to_string()]);
        assert!(p.subproject("sample").is_some());

        p.update_dataset(Dataset::from_values("sample/out", vec![1.0]))
            .unwrap();
        let removed = p.remove_dataset(&name).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(p.is_empty());
        assert!(p.remove_dataset(&name).is_err());
    }

    #[test]
    fn test_saved_form_keeps_clean_originals() {
        let (mut p, name) = project();
        {
            let ds = p.get_mut(&name).unwrap();
            ds.processed_data = Some(vec![2.0, 4.0, 6.0]);
            ds.processed_mask = Some(vec![false; 3]);
            ds.transpose();
        }
        p.update_dataset(Dataset::from_values("sample/out", vec![1.0]))
            .unwrap();

        let saved = p.to_saved();
        let sub = saved.subproject("sample").unwrap();
        assert_eq!(sub.datasets.len(), 1);
        let original = &sub.datasets[0];
        assert!(original.processed_data.is_none());
        assert!(original.processed_mask.is_none());
        assert!(!original.transposed);
        assert_eq!(original.shape(), (1, 3));
    }

    #[test]
    fn test_file_roundtrip() {
        let (p, name) = project();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.scproj");
        p.save(&path).unwrap();
        let back = Project::load(&path).unwrap();
        assert_eq!(back.name, "test");
        assert_eq!(back.get(&name).unwrap().data, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_load_rejects_malformed_dataset() {
        let (mut p, name) = project();
        p.get_mut(&name).unwrap().data.push(4.0);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.scproj");
        std::fs::write(&path, serde_json::to_string(&p).unwrap()).unwrap();
        assert!(matches!(Project::load(&path), Err(Error::Shape(_))));
    }
}
