/// Dataset container
///
/// A dataset is a row-major 2D array of intensities (a 1D spectrum is a
/// single row) with one coordinate per dimension, a mask of the same shape,
/// and the processed data produced by replaying the processing pipeline.
/// The raw `data` is never modified by the pipeline: results land in
/// `processed_data` / `processed_mask`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::region::{RegionKind, Span};
use crate::error::{Error, Result};
use crate::pipeline::state::StateNode;

/// Coordinate along one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub title: String,
    pub units: String,
    pub values: Vec<f64>,
}

impl Coord {
    pub fn new(title: &str, units: &str, values: Vec<f64>) -> Self {
        Self {
            title: title.to_string(),
            units: units.to_string(),
            values,
        }
    }

    /// Plain point-index coordinate `0, 1, …, n-1`
    pub fn index(n: usize) -> Self {
        Self::new("index", "", (0..n).map(|i| i as f64).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// (min, max) of the coordinate values
    pub fn range(&self) -> Option<(f64, f64)> {
        let finite = self.values.iter().copied().filter(|v| v.is_finite());
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for v in finite {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if lo <= hi {
            Some((lo, hi))
        } else {
            None
        }
    }

    /// Axis label as shown under the plot
    pub fn label(&self) -> String {
        if self.units.is_empty() {
            self.title.clone()
        } else {
            format!("{} / {}", self.title, self.units)
        }
    }
}

/// Free-form dataset metadata.
///
/// `regions` is filled by region-definition steps whose kind is not `mask`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<BTreeMap<RegionKind, Vec<Span>>>,
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Meta {
    /// Store ranges for a region kind, creating the kind table on first use
    pub fn set_regions(&mut self, kind: RegionKind, ranges: Vec<Span>) {
        let regions = self.regions.get_or_insert_with(|| {
            [RegionKind::Baseline, RegionKind::Integral, RegionKind::Undefined]
                .into_iter()
                .map(|k| (k, Vec::new()))
                .collect()
        });
        regions.insert(kind, ranges);
    }

    pub fn regions(&self, kind: RegionKind) -> &[Span] {
        self.regions
            .as_ref()
            .and_then(|r| r.get(&kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// A spectroscopic dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    /// Canonical name `"{subproject}/{dataset}"` once inside a project
    pub name: String,
    pub title: String,
    pub units: String,
    /// Fast (column) dimension
    pub x: Coord,
    /// Slow (row) dimension; a single entry for a 1D spectrum
    pub y: Coord,
    pub data: Vec<f64>,
    pub mask: Vec<bool>,
    /// Output of the last pipeline replay; `None` when nothing is applied
    #[serde(default)]
    pub processed_data: Option<Vec<f64>>,
    #[serde(default)]
    pub processed_mask: Option<Vec<bool>>,
    /// Coordinate of the processed arrays when the replay changed it (FFT)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_x: Option<Coord>,
    #[serde(default)]
    pub transposed: bool,
    #[serde(default)]
    pub meta: Meta,
    /// Saved parameter tree of the processing pipeline
    #[serde(default)]
    pub state: Option<StateNode>,
    #[serde(default)]
    pub source: Option<PathBuf>,
}

impl Dataset {
    /// Build a dataset from row-major data. `y` defaults to a single row.
    pub fn new(name: &str, x: Coord, y: Option<Coord>, data: Vec<f64>) -> Result<Self> {
        let y = y.unwrap_or_else(|| Coord::new("", "", vec![0.0]));
        let expected = x.len() * y.len();
        if data.len() != expected {
            return Err(Error::Shape(format!(
                "{} values for a {}x{} dataset",
                data.len(),
                y.len(),
                x.len()
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            title: "intensity".to_string(),
            units: String::new(),
            mask: vec![false; data.len()],
            x,
            y,
            data,
            processed_data: None,
            processed_mask: None,
            processed_x: None,
            transposed: false,
            meta: Meta::default(),
            state: None,
            source: None,
        })
    }

    /// 1D spectrum with an index coordinate
    pub fn from_values(name: &str, values: Vec<f64>) -> Self {
        let x = Coord::index(values.len());
        let mask = vec![false; values.len()];
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            title: "intensity".to_string(),
            units: String::new(),
            x,
            y: Coord::new("", "", vec![0.0]),
            data: values,
            mask,
            processed_data: None,
            processed_mask: None,
            processed_x: None,
            transposed: false,
            meta: Meta::default(),
            state: None,
            source: None,
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.y.len(), self.x.len())
    }

    /// Number of non-degenerate dimensions
    pub fn ndim(&self) -> usize {
        if self.y.len() > 1 {
            2
        } else {
            1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sub-project part of the canonical name
    pub fn subproject(&self) -> &str {
        self.name.split('/').next().unwrap_or(&self.name)
    }

    /// Dataset part of the canonical name
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn is_original(&self) -> bool {
        self.short_name() == "original" && self.name.contains('/')
    }

    pub fn row(&self, r: usize) -> &[f64] {
        let cols = self.x.len();
        &self.data[r * cols..(r + 1) * cols]
    }

    pub fn mask_row(&self, r: usize) -> &[bool] {
        let cols = self.x.len();
        &self.mask[r * cols..(r + 1) * cols]
    }

    /// Coordinate the processed arrays are laid out on
    pub fn processed_coord(&self) -> &Coord {
        self.processed_x.as_ref().unwrap_or(&self.x)
    }

    /// Drop the result of the last replay
    pub fn clear_processed(&mut self) {
        self.processed_data = None;
        self.processed_mask = None;
        self.processed_x = None;
    }

    pub fn processed_row(&self, r: usize) -> Option<&[f64]> {
        let cols = self.processed_coord().len();
        self.processed_data
            .as_ref()
            .filter(|p| p.len() >= (r + 1) * cols)
            .map(|p| &p[r * cols..(r + 1) * cols])
    }

    pub fn processed_mask_row(&self, r: usize) -> Option<&[bool]> {
        let cols = self.processed_coord().len();
        self.processed_mask
            .as_ref()
            .filter(|m| m.len() >= (r + 1) * cols)
            .map(|m| &m[r * cols..(r + 1) * cols])
    }

    /// Apply `f` to every row of the raw data in place
    pub fn map_rows<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut [f64], &[bool]),
    {
        let cols = self.x.len();
        if cols == 0 {
            return;
        }
        for (row, mask) in self.data.chunks_mut(cols).zip(self.mask.chunks(cols)) {
            f(row, mask);
        }
    }

    /// Visible x range used to place new regions
    pub fn x_range(&self) -> (f64, f64) {
        self.x.range().unwrap_or((0.0, 1.0))
    }

    /// Swap rows and columns of data and mask, and toggle `transposed`.
    ///
    /// Processed arrays are left alone: the controller keeps their
    /// orientation in step with the raw data itself.
    pub fn transpose(&mut self) {
        let (rows, cols) = self.shape();
        let mut data = vec![0.0; self.data.len()];
        let mut mask = vec![false; self.mask.len()];
        for r in 0..rows {
            for c in 0..cols {
                data[c * rows + r] = self.data[r * cols + c];
                mask[c * rows + r] = self.mask[r * cols + c];
            }
        }
        self.data = data;
        self.mask = mask;
        std::mem::swap(&mut self.x, &mut self.y);
        self.transposed = !self.transposed;
    }

    /// Mask every column whose x coordinate falls in `span` (all rows).
    ///
    /// Returns the number of columns masked. A span that does not overlap
    /// the coordinate range at all is an error.
    pub fn mask_span(&mut self, span: Span) -> Result<usize> {
        if !span.is_finite() {
            return Err(Error::InvalidSpan(span.to_string()));
        }
        let (lo, hi) = span.ordered();
        let (cmin, cmax) = self.x.range().ok_or_else(|| Error::SpanOutOfRange {
            low: lo,
            high: hi,
            axis: self.x.title.clone(),
        })?;
        if hi < cmin || lo > cmax {
            return Err(Error::SpanOutOfRange {
                low: lo,
                high: hi,
                axis: self.x.title.clone(),
            });
        }

        let cols: Vec<usize> = self
            .x
            .values
            .iter()
            .enumerate()
            .filter(|(_, &v)| span.contains(v))
            .map(|(i, _)| i)
            .collect();
        let ncols = self.x.len();
        for r in 0..self.y.len() {
            for &c in &cols {
                self.mask[r * ncols + c] = true;
            }
        }
        Ok(cols.len())
    }

    /// Copy under a new identity
    pub fn duplicate(&self, name: &str) -> Self {
        let mut new = self.clone();
        new.id = Uuid::new_v4();
        new.name = name.to_string();
        new
    }

    /// Check array lengths against the coordinates, for datasets read
    /// from disk
    pub fn validate(&self) -> Result<()> {
        let expected = self.x.len() * self.y.len();
        if self.data.len() != expected {
            return Err(Error::Shape(format!(
                "{}: {} values for a {}x{} dataset",
                self.name,
                self.data.len(),
                self.y.len(),
                self.x.len()
            )));
        }
        if self.mask.len() != self.data.len() {
            return Err(Error::Shape(format!(
                "{}: mask of {} for {} values",
                self.name,
                self.mask.len(),
                self.data.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Dataset {
        Dataset::new(
            "grid",
            Coord::index(3),
            Some(Coord::new("time", "s", vec![10.0, 20.0])),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )
        .unwrap()
    }

    #[test]
    fn test_new_checks_shape() {
        let err = Dataset::new("bad", Coord::index(3), None, vec![1.0, 2.0]);
        assert!(matches!(err, Err(Error::Shape(_))));
    }

    #[test]
    fn test_validate_rejects_inconsistent_arrays() {
        let mut ds = grid();
        assert!(ds.validate().is_ok());
        ds.mask.truncate(1);
        assert!(matches!(ds.validate(), Err(Error::Shape(_))));

        let mut ds = grid();
        ds.data.pop();
        ds.mask.pop();
        assert!(matches!(ds.validate(), Err(Error::Shape(_))));
    }

    #[test]
    fn test_transpose_swaps_layout() {
        let mut ds = grid();
        ds.mask[1] = true;
        ds.transpose();
        assert!(ds.transposed);
        assert_eq!(ds.shape(), (3, 2));
        assert_eq!(ds.data, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert!(ds.mask[2]);
        assert_eq!(ds.x.title, "time");

        ds.transpose();
        assert!(!ds.transposed);
        assert_eq!(ds.data, grid().data);
    }

    #[test]
    fn test_mask_span_uses_coordinates() {
        let mut ds = Dataset::from_values("s", (0..10).map(|v| v as f64).collect());
        let n = ds.mask_span(Span::new(2.0, 5.0)).unwrap();
        assert_eq!(n, 3);
        let masked: Vec<usize> = ds
            .mask
            .iter()
            .enumerate()
            .filter(|(_, &m)| m)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(masked, vec![2, 3, 4]);
    }

    #[test]
    fn test_mask_span_out_of_range() {
        let mut ds = Dataset::from_values("s", vec![1.0; 10]);
        let err = ds.mask_span(Span::new(50.0, 60.0));
        assert!(matches!(err, Err(Error::SpanOutOfRange { .. })));
        assert!(ds.mask.iter().all(|m| !m));
    }

    #[test]
    fn test_mask_span_masks_all_rows() {
        let mut ds = grid();
        ds.mask_span(Span::new(1.0, 2.0)).unwrap();
        assert_eq!(ds.mask, vec![false, true, false, false, true, false]);
    }

    #[test]
    fn test_meta_regions_initialized_on_first_use() {
        let mut meta = Meta::default();
        meta.set_regions(RegionKind::Baseline, vec![Span::new(2.0, 5.0)]);
        let regions = meta.regions.as_ref().unwrap();
        assert_eq!(regions.len(), 3);
        assert!(regions[&RegionKind::Integral].is_empty());
        assert_eq!(meta.regions(RegionKind::Baseline), &[Span::new(2.0, 5.0)]);
    }

    #[test]
    fn test_names() {
        let mut ds = grid();
        ds.name = "sample/original".to_string();
        assert_eq!(ds.subproject(), "sample");
        assert_eq!(ds.short_name(), "original");
        assert!(ds.is_original());
    }

    #[test]
    fn test_json_roundtrip_keeps_meta() {
        let mut ds = grid();
        ds.meta.set_regions(RegionKind::Integral, vec![Span::new(0.0, 1.0)]);
        ds.meta
            .extra
            .insert("colormap".to_string(), serde_json::json!("viridis"));
        let json = serde_json::to_string(&ds).unwrap();
        let back: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back.meta, ds.meta);
        assert_eq!(back.id, ds.id);
    }
}
