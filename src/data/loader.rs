/// Dataset import
///
/// Dispatches on the file extension:
///   - `.dx`, `.jdx`, `.jcamp` → JCAMP-DX reader
///   - `.csv`, `.tsv`, `.txt`  → delimited table (first column is x,
///     every following column is one row of the dataset)
///   - `.json`                 → native serialized dataset

use std::path::Path;

use super::dataset::{Coord, Dataset};
use super::jcamp;
use crate::error::{Error, Result};

/// Extensions accepted by [`load_dataset`], for the open dialog filter
pub const SUPPORTED_EXTENSIONS: &[&str] = &["dx", "jdx", "jcamp", "csv", "tsv", "txt", "json"];

/// Load a dataset from `path`
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset".to_string());

    let mut dataset = match ext.as_str() {
        "dx" | "jdx" | "jcamp" => jcamp::read_jcamp_file(path)?,
        "csv" => parse_table(&std::fs::read_to_string(path)?, &stem, Some(','))?,
        "tsv" => parse_table(&std::fs::read_to_string(path)?, &stem, Some('\t'))?,
        "txt" => parse_table(&std::fs::read_to_string(path)?, &stem, None)?,
        "json" => {
            let text = std::fs::read_to_string(path)?;
            let mut ds: Dataset = serde_json::from_str(&text)?;
            ds.validate()?;
            ds.id = uuid::Uuid::new_v4();
            ds.clear_processed();
            ds
        }
        other => {
            return Err(Error::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                format!(".{}", other)
            }))
        }
    };
    dataset.source = Some(path.to_path_buf());
    log::info!(
        "Loaded {} ({} x {}) from {}",
        dataset.name,
        dataset.y.len(),
        dataset.x.len(),
        path.display()
    );
    Ok(dataset)
}

fn split_fields(line: &str, delimiter: Option<char>) -> Vec<&str> {
    match delimiter {
        Some(d) => line.split(d).map(str::trim).collect(),
        None => line.split_whitespace().collect(),
    }
}

/// Parse a delimited table; `None` splits on whitespace.
///
/// A first line that does not parse as numbers is a header: its first
/// field titles the x axis and the others label the rows.
pub fn parse_table(content: &str, name: &str, delimiter: Option<char>) -> Result<Dataset> {
    let mut header: Option<Vec<String>> = None;
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = split_fields(line, delimiter);
        let values: std::result::Result<Vec<f64>, _> =
            fields.iter().map(|f| f.parse::<f64>()).collect();

        match values {
            Ok(values) => {
                if columns.is_empty() {
                    if values.len() < 2 {
                        return Err(Error::Parse(format!(
                            "line {}: expected at least two columns",
                            lineno + 1
                        )));
                    }
                    columns = vec![Vec::new(); values.len()];
                }
                if values.len() != columns.len() {
                    return Err(Error::Parse(format!(
                        "line {}: {} columns, expected {}",
                        lineno + 1,
                        values.len(),
                        columns.len()
                    )));
                }
                for (column, v) in columns.iter_mut().zip(values) {
                    column.push(v);
                }
            }
            Err(_) if columns.is_empty() && header.is_none() => {
                header = Some(fields.iter().map(|f| f.trim_matches('"').to_string()).collect());
            }
            Err(e) => {
                return Err(Error::Parse(format!("line {}: {}", lineno + 1, e)));
            }
        }
    }

    if columns.is_empty() {
        return Err(Error::Parse(format!("no numeric data in {}", name)));
    }

    let x_values = columns.remove(0);
    let nrows = columns.len();
    let x_title = header
        .as_ref()
        .and_then(|h| h.first().cloned())
        .unwrap_or_else(|| "x".to_string());

    let labels: Option<Vec<f64>> = header.as_ref().and_then(|h| {
        h.iter()
            .skip(1)
            .map(|s| s.parse::<f64>().ok())
            .collect::<Option<Vec<f64>>>()
            .filter(|v| v.len() == nrows)
    });
    let y = if nrows == 1 {
        None
    } else {
        Some(match labels {
            Some(values) => Coord::new("y", "", values),
            None => Coord::index(nrows),
        })
    };

    let data: Vec<f64> = columns.into_iter().flatten().collect();
    let mut dataset = Dataset::new(name, Coord::new(&x_title, "", x_values), y, data)?;
    if nrows == 1 {
        if let Some(title) = header.as_ref().and_then(|h| h.get(1)) {
            dataset.title = title.clone();
        }
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_with_header() {
        let ds = parse_table("wavenumber,absorbance\n1,10\n2,20\n3,30\n", "ir", Some(',')).unwrap();
        assert_eq!(ds.shape(), (1, 3));
        assert_eq!(ds.x.title, "wavenumber");
        assert_eq!(ds.title, "absorbance");
        assert_eq!(ds.data, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_columns_become_rows() {
        let ds = parse_table("x\t0.5\t1.5\n1\t10\t100\n2\t20\t200\n", "t", Some('\t')).unwrap();
        assert_eq!(ds.shape(), (2, 2));
        assert_eq!(ds.y.values, vec![0.5, 1.5]);
        assert_eq!(ds.row(0), &[10.0, 20.0]);
        assert_eq!(ds.row(1), &[100.0, 200.0]);
    }

    #[test]
    fn test_whitespace_table_without_header() {
        let ds = parse_table("# comment\n1 2 3\n4 5 6\n", "w", None).unwrap();
        assert_eq!(ds.shape(), (2, 2));
        assert_eq!(ds.x.values, vec![1.0, 4.0]);
        assert_eq!(ds.y.values, vec![0.0, 1.0]);
        assert_eq!(ds.data, vec![2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_ragged_table_is_an_error() {
        assert!(matches!(
            parse_table("1,2\n3,4,5\n", "r", Some(',')),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_load_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("sample.csv");
        std::fs::write(&csv, "1,2\n3,4\n").unwrap();
        let ds = load_dataset(&csv).unwrap();
        assert_eq!(ds.name, "sample");
        assert_eq!(ds.source.as_deref(), Some(csv.as_path()));

        let json = dir.path().join("copy.json");
        std::fs::write(&json, serde_json::to_string(&ds).unwrap()).unwrap();
        let back = load_dataset(&json).unwrap();
        assert_eq!(back.data, ds.data);
        assert_ne!(back.id, ds.id);

        let unknown = dir.path().join("data.xyz");
        std::fs::write(&unknown, "").unwrap();
        assert!(matches!(
            load_dataset(&unknown),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_json_with_truncated_mask_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut ds = Dataset::from_values("broken", vec![1.0, 2.0, 3.0, 4.0]);
        ds.mask.truncate(1);
        let json = dir.path().join("broken.json");
        std::fs::write(&json, serde_json::to_string(&ds).unwrap()).unwrap();
        assert!(matches!(load_dataset(&json), Err(Error::Shape(_))));
    }
}
