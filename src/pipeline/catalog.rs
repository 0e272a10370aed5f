/// Processor catalog
///
/// Reads the declarative list of processing step templates from YAML.
/// Loading is all-or-nothing: a missing file, invalid YAML, a missing
/// category or a missing `basis.output` template is an error and no
/// partial catalog is ever returned.

use std::path::Path;

use serde::Deserialize;

use super::model::Direction;
use super::params::{ParamSpec, ParamType};
use crate::error::{Error, Result};

/// Catalog shipped with the application
pub const BUNDLED_CATALOG: &str = include_str!("../../processors.yaml");

/// Key of the terminal output template
pub const OUTPUT_KEY: &str = "output";

/// Template as written in the YAML file
#[derive(Debug, Deserialize)]
struct RawTemplate {
    #[serde(default)]
    title: Option<String>,
    action: String,
    #[serde(default)]
    tip: String,
    #[serde(default)]
    children: Vec<ParamSpec>,
}

/// A step template, decorated for use in the parameter tree
#[derive(Debug, Clone)]
pub struct Template {
    pub key: String,
    pub title: String,
    pub action: String,
    pub tip: String,
    /// Steps are created unchecked
    pub default_enabled: bool,
    pub removable: bool,
    /// Context-menu entries offered on the step
    pub context: Vec<(Direction, &'static str)>,
    pub params: Vec<ParamSpec>,
}

impl Template {
    fn decorate(key: &str, raw: RawTemplate) -> Self {
        let is_output = key == OUTPUT_KEY;
        let title = if is_output {
            "Final output".to_string()
        } else {
            raw.title.unwrap_or_else(|| key.to_string())
        };
        Self {
            key: key.to_string(),
            title,
            action: raw.action,
            tip: raw.tip,
            default_enabled: false,
            removable: !is_output,
            context: if is_output {
                Vec::new()
            } else {
                vec![
                    (Direction::Before, "Move before"),
                    (Direction::After, "Move after"),
                ]
            },
            params: raw.children,
        }
    }

    /// Whether steps built from this template own a region group
    pub fn is_region_definition(&self) -> bool {
        self.params.iter().any(|p| p.ty == ParamType::RegionGroup)
    }
}

/// All templates, grouped by category, in file order
#[derive(Debug, Clone)]
pub struct Catalog {
    processing: Vec<Template>,
    basis: Vec<Template>,
    output: Template,
}

impl Catalog {
    /// Load the catalog from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Catalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_yaml_str(&text)?;
        log::info!(
            "Loaded {} processors from {}",
            catalog.processing.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Catalog embedded in the binary
    pub fn bundled() -> Result<Self> {
        Self::from_yaml_str(BUNDLED_CATALOG)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let doc: serde_yaml::Mapping = serde_yaml::from_str(text)?;
        let processing = Self::category(&doc, "processing")?
            .into_iter()
            .filter(|t| {
                if t.key == OUTPUT_KEY {
                    log::warn!("`output` belongs to the basis category, ignored in processing");
                    false
                } else {
                    true
                }
            })
            .collect();
        let basis = Self::category(&doc, "basis")?;
        let output = basis
            .iter()
            .find(|t| t.key == OUTPUT_KEY)
            .cloned()
            .ok_or_else(|| Error::Catalog("missing `basis.output` template".to_string()))?;
        Ok(Self {
            processing,
            basis,
            output,
        })
    }

    fn category(doc: &serde_yaml::Mapping, name: &str) -> Result<Vec<Template>> {
        let section = doc
            .get(name)
            .and_then(serde_yaml::Value::as_mapping)
            .ok_or_else(|| Error::Catalog(format!("missing `{}` category", name)))?;

        let mut templates = Vec::with_capacity(section.len());
        for (k, v) in section {
            let key = k
                .as_str()
                .ok_or_else(|| Error::Catalog(format!("non-string key in `{}`", name)))?;
            let raw: RawTemplate = serde_yaml::from_value(v.clone())
                .map_err(|e| Error::Catalog(format!("template `{}`: {}", key, e)))?;
            templates.push(Template::decorate(key, raw));
        }
        Ok(templates)
    }

    /// Templates of the "Add process ..." menu
    pub fn processors(&self) -> &[Template] {
        &self.processing
    }

    pub fn get(&self, key: &str) -> Option<&Template> {
        self.processing
            .iter()
            .chain(self.basis.iter())
            .find(|t| t.key == key)
    }

    pub fn output(&self) -> &Template {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bundled_catalog_loads() {
        let cat = Catalog::bundled().unwrap();
        let keys: Vec<&str> = cat.processors().iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys[0], "define regions");
        assert!(keys.contains(&"scale"));
        assert!(!keys.contains(&"output"));
        assert!(cat.get("define regions").unwrap().is_region_definition());
    }

    #[test]
    fn test_decoration() {
        let cat = Catalog::bundled().unwrap();
        let scale = cat.get("scale").unwrap();
        assert!(scale.removable);
        assert!(!scale.default_enabled);
        assert_eq!(scale.context.len(), 2);

        let output = cat.output();
        assert_eq!(output.title, "Final output");
        assert!(!output.removable);
        assert!(output.context.is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Catalog::load(Path::new("/nonexistent/processors.yaml"));
        assert!(matches!(err, Err(Error::Catalog(_))));
    }

    #[test]
    fn test_missing_output_is_an_error() {
        let yaml = "processing:\n  scale:\n    action: scale\nbasis: {}\n";
        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(Error::Catalog(_))
        ));
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "processing: [unclosed").unwrap();
        assert!(Catalog::load(file.path()).is_err());
    }

    #[test]
    fn test_template_without_action_is_rejected() {
        let yaml = "processing:\n  scale:\n    title: Scale\nbasis:\n  output:\n    action: output\n";
        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(Error::Catalog(_))
        ));
    }
}
