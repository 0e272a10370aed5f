/// Processing script export
///
/// Writes the enabled pipeline of a dataset as a short, human-readable
/// script that reproduces the processing outside the GUI:
///
/// ```text
/// # Spectroscopy processing script
/// # Generated by spectro_gui v0.3.0 on 2024-05-01 10:12:00
/// # Dataset: sample/original
/// # Source: /data/sample.jdx
/// #
/// baseline_ranges = [[2.0, 5.0]]
/// dataset = baseline(dataset, order=1)
/// dataset = scale(dataset, factor=2.0)
/// ```
///
/// Region-definition steps emit `{kind}_ranges = [...]` instead of a call.

use std::path::Path;

use chrono::{DateTime, Local};

use crate::data::dataset::Dataset;
use crate::error::Result;
use crate::pipeline::functions::Action;
use crate::pipeline::model::Pipeline;
use crate::pipeline::params::ParamValue;

/// Script file extension offered by the save dialog
pub const SCRIPT_EXTENSION: &str = "py";

/// One exported line and the step it comes from
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub step: String,
    pub code: String,
}

impl ScriptLine {
    fn from_action(action: &Action) -> Self {
        let code = if action.name == "define_region" {
            let kind = action
                .kwargs
                .get("kind")
                .and_then(ParamValue::as_str)
                .unwrap_or("undefined");
            let ranges = action
                .kwargs
                .get("range")
                .map(ParamValue::to_script_literal)
                .unwrap_or_else(|| "[]".to_string());
            format!("{}_ranges = {}", kind, ranges)
        } else {
            let args: Vec<String> = action
                .kwargs
                .iter()
                .map(|(k, v)| format!("{}={}", k, v.to_script_literal()))
                .collect();
            if args.is_empty() {
                format!("dataset = {}(dataset)", action.name)
            } else {
                format!("dataset = {}(dataset, {})", action.name, args.join(", "))
            }
        };
        Self {
            step: action.step.clone(),
            code,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Script {
    pub generated: DateTime<Local>,
    pub dataset: String,
    pub source: Option<String>,
    pub software_version: String,
    pub lines: Vec<ScriptLine>,
}

impl Script {
    /// Script of the enabled steps of `pipeline`, in processing order
    pub fn from_pipeline(pipeline: &Pipeline, dataset: &Dataset) -> Result<Self> {
        let lines = pipeline
            .processing_actions()?
            .iter()
            .map(ScriptLine::from_action)
            .collect();
        Ok(Self {
            generated: Local::now(),
            dataset: dataset.name.clone(),
            source: dataset.source.as_ref().map(|p| p.display().to_string()),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            lines,
        })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("# Spectroscopy processing script\n");
        out.push_str(&format!(
            "# Generated by spectro_gui v{} on {}\n",
            self.software_version,
            self.generated.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("# Dataset: {}\n", self.dataset));
        if let Some(source) = &self.source {
            out.push_str(&format!("# Source: {}\n", source));
        }
        out.push_str("#\n");
        for line in &self.lines {
            out.push_str(&line.code);
            out.push('\n');
        }
        out
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_text())?;
        log::info!(
            "Script of {} ({} steps) written to {}",
            self.dataset,
            self.lines.len(),
            path.display()
        );
        Ok(())
    }
}
