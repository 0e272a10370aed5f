/// JCAMP-DX spectral data reader
///
/// JCAMP-DX is a text-based format widely used for spectral data exchange.
///
/// File extensions: `.dx`, `.jdx`, `.jcamp`
///
/// Format overview:
///   - Lines starting with `##` are labeled data records (LDR)
///   - `##TITLE= ...`, `##DATA TYPE= ...`
///   - `##XUNITS= ...`, `##YUNITS= ...`
///   - `##FIRSTX= ...`, `##LASTX= ...`, `##NPOINTS= ...`
///   - `##XFACTOR= ...`, `##YFACTOR= ...`
///   - `##XYDATA= (X++(Y..Y))` compressed data table (ASDF)
///   - `##XYPOINTS= (XY..XY)` simple X,Y pairs
///
/// ASDF (ASCII Squeezed Difference Form) character classes:
///   - SQZ: `@`=0, `A`..`I` = 1..9, `a`..`i` = -1..-9 (absolute value)
///   - DIF: `%`=0, `J`..`R` = 1..9, `j`..`r` = -1..-9 (difference)
///   - DUP: `S`..`Z` = 1..9, `s` = 9 (repeat count, including the value itself)

use std::path::Path;

use super::dataset::{Coord, Dataset};
use crate::error::{Error, Result};

#[derive(Debug)]
struct JcampHeader {
    title: String,
    data_type: String,
    x_units: String,
    y_units: String,
    first_x: f64,
    last_x: f64,
    x_factor: f64,
    y_factor: f64,
    npoints: usize,
}

impl Default for JcampHeader {
    fn default() -> Self {
        Self {
            title: String::new(),
            data_type: String::new(),
            x_units: String::new(),
            y_units: String::new(),
            first_x: 0.0,
            last_x: 0.0,
            x_factor: 1.0,
            y_factor: 1.0,
            npoints: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Table {
    /// `(X++(Y..Y))`
    Asdf,
    /// `(XY..XY)`
    Points,
}

/// Read a JCAMP-DX file into a 1D dataset
pub fn read_jcamp_file(path: &Path) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)?;
    let fallback = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "jcamp".to_string());
    let mut dataset = parse_jcamp(&content, &fallback)?;
    dataset.source = Some(path.to_path_buf());
    Ok(dataset)
}

/// Parse JCAMP-DX content; `fallback_name` is used when there is no title
pub fn parse_jcamp(content: &str, fallback_name: &str) -> Result<Dataset> {
    let mut header = JcampHeader::default();
    let mut data_lines: Vec<&str> = Vec::new();
    let mut table: Option<Table> = None;
    let mut in_data_block = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(record) = trimmed.strip_prefix("##") {
            in_data_block = false;
            let Some((key, value)) = record.split_once('=') else {
                continue;
            };
            let key = key.trim().to_uppercase();
            let value = value.trim();
            match key.as_str() {
                "TITLE" => header.title = value.to_string(),
                "DATA TYPE" | "DATATYPE" => header.data_type = value.to_uppercase(),
                "XUNITS" => header.x_units = value.to_uppercase(),
                "YUNITS" => header.y_units = value.to_uppercase(),
                "FIRSTX" => header.first_x = parse_jcamp_float(value)?,
                "LASTX" => header.last_x = parse_jcamp_float(value)?,
                "XFACTOR" => header.x_factor = parse_jcamp_float(value)?,
                "YFACTOR" => header.y_factor = parse_jcamp_float(value)?,
                "NPOINTS" | "NUMPOINTS" => header.npoints = parse_jcamp_float(value)? as usize,
                "XYDATA" => {
                    table = Some(if value.contains("X++") {
                        Table::Asdf
                    } else {
                        Table::Points
                    });
                    in_data_block = true;
                }
                "XYPOINTS" => {
                    table = Some(Table::Points);
                    in_data_block = true;
                }
                "NTUPLES" => {
                    return Err(Error::UnsupportedFormat("JCAMP-DX NTUPLES blocks".to_string()));
                }
                _ => {}
            }
        } else if in_data_block && !trimmed.is_empty() && !trimmed.starts_with("$$") {
            data_lines.push(trimmed);
        }
    }

    let (x, y) = match table {
        Some(Table::Asdf) => parse_asdf_data(&data_lines, &header),
        Some(Table::Points) => parse_xy_pairs(&data_lines, &header),
        None => return Err(Error::Parse("no data block in JCAMP-DX file".to_string())),
    };
    if y.is_empty() {
        return Err(Error::Parse("empty JCAMP-DX data block".to_string()));
    }

    let name = if header.title.is_empty() {
        fallback_name.to_string()
    } else {
        header.title.clone()
    };
    let (x_title, x_units) = axis_label(&header.x_units);
    let mut dataset = Dataset::new(&name, Coord::new(x_title, &x_units, x), None, y)?;
    dataset.title = if header.data_type.is_empty() {
        "intensity".to_string()
    } else {
        header.data_type.to_lowercase()
    };
    dataset.units = header.y_units.to_lowercase();
    log::info!(
        "JCAMP-DX: {} ({} points, {})",
        dataset.name,
        dataset.x.len(),
        dataset.x.label()
    );
    Ok(dataset)
}

fn axis_label(units: &str) -> (&'static str, String) {
    match units {
        "1/CM" => ("wavenumbers", "cm^-1".to_string()),
        "PPM" => ("chemical shift", "ppm".to_string()),
        "HZ" => ("frequency", "Hz".to_string()),
        "NANOMETERS" | "NM" => ("wavelength", "nm".to_string()),
        "SECONDS" | "S" => ("time", "s".to_string()),
        other => ("x", other.to_lowercase()),
    }
}

/// Parse a numeric field value
fn parse_jcamp_float(s: &str) -> Result<f64> {
    s.split_whitespace()
        .next()
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| Error::Parse(format!("`{}` is not a number", s.trim())))
}

/// `(XY..XY)`: comma, semicolon or whitespace separated pairs
fn parse_xy_pairs(lines: &[&str], header: &JcampHeader) -> (Vec<f64>, Vec<f64>) {
    let mut x_data = Vec::new();
    let mut y_data = Vec::new();

    for line in lines {
        let tokens: Vec<&str> = line
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();
        for pair in tokens.chunks_exact(2) {
            if let (Ok(x), Ok(y)) = (pair[0].parse::<f64>(), pair[1].parse::<f64>()) {
                x_data.push(x * header.x_factor);
                y_data.push(y * header.y_factor);
            }
        }
    }
    (x_data, y_data)
}

/// `(X++(Y..Y))`: each line is an X checkpoint followed by Y values.
///
/// In difference form the first Y of a line repeats the last Y of the
/// previous line (Y checkpoint); it is dropped.
fn parse_asdf_data(lines: &[&str], header: &JcampHeader) -> (Vec<f64>, Vec<f64>) {
    let mut all_y: Vec<f64> = Vec::new();
    let mut previous_dif = false;

    for line in lines {
        let (mut values, ends_in_dif) = decode_asdf_line(line);
        if previous_dif && values.first() == all_y.last() {
            values.remove(0);
        }
        all_y.extend(values);
        previous_dif = ends_in_dif;
    }

    let npoints = if header.npoints > 0 {
        header.npoints
    } else {
        all_y.len()
    };
    all_y.resize(npoints, 0.0);
    let y_data: Vec<f64> = all_y.iter().map(|&v| v * header.y_factor).collect();

    let first = header.first_x * header.x_factor;
    let last = header.last_x * header.x_factor;
    let x_data: Vec<f64> = if npoints > 1 {
        let dx = (last - first) / (npoints - 1) as f64;
        (0..npoints).map(|i| first + i as f64 * dx).collect()
    } else {
        vec![first]
    };
    (x_data, y_data)
}

/// Decode one data line, skipping the leading X value.
///
/// Returns the Y values and whether the line ended in difference mode.
fn decode_asdf_line(line: &str) -> (Vec<f64>, bool) {
    let trimmed = line.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+')))
        .unwrap_or(trimmed.len());
    if split == 0 {
        // continuation line without X
        return decode_asdf_values(trimmed);
    }
    decode_asdf_values(&trimmed[split..])
}

fn is_asdf_char(c: char) -> bool {
    matches!(c, '@' | 'A'..='I' | 'a'..='i' | '%' | 'J'..='R' | 'j'..='r' | 'S'..='Z' | 's')
}

/// Decode plain or ASDF-encoded Y values
fn decode_asdf_values(s: &str) -> (Vec<f64>, bool) {
    if !s.chars().any(is_asdf_char) {
        let values = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter_map(|t| t.parse::<f64>().ok())
            .collect();
        return (values, false);
    }

    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();
    let mut values: Vec<f64> = Vec::new();
    let mut last_diff = 0.0;
    let mut in_dif_mode = false;
    let mut i = 0;

    while i < n {
        let ch = chars[i];
        match ch {
            '@' | 'A'..='I' | 'a'..='i' => {
                let (digit, negative) = match ch {
                    '@' => (0, false),
                    'A'..='I' => (ch as u32 - 'A' as u32 + 1, false),
                    _ => (ch as u32 - 'a' as u32 + 1, true),
                };
                let (value, next) = read_digits(&chars, i + 1, digit, negative);
                values.push(value);
                in_dif_mode = false;
                i = next;
            }
            '%' | 'J'..='R' | 'j'..='r' => {
                let (digit, negative) = match ch {
                    '%' => (0, false),
                    'J'..='R' => (ch as u32 - 'J' as u32 + 1, false),
                    _ => (ch as u32 - 'j' as u32 + 1, true),
                };
                let (diff, next) = read_digits(&chars, i + 1, digit, negative);
                let base = values.last().copied().unwrap_or(0.0);
                values.push(base + diff);
                last_diff = diff;
                in_dif_mode = true;
                i = next;
            }
            'S'..='Z' | 's' => {
                let digit = if ch == 's' { 9 } else { ch as u32 - 'S' as u32 + 1 };
                let (count, next) = read_digits(&chars, i + 1, digit, false);
                let base = values.last().copied().unwrap_or(0.0);
                for k in 1..count as usize {
                    if in_dif_mode {
                        values.push(base + last_diff * k as f64);
                    } else {
                        values.push(base);
                    }
                }
                i = next;
            }
            c if c.is_ascii_digit() || c == '+' || c == '-' || c == '.' => {
                let start = i;
                i += 1;
                while i < n && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let token: String = chars[start..i].iter().collect();
                if let Ok(v) = token.parse::<f64>() {
                    values.push(v);
                    in_dif_mode = false;
                }
            }
            _ => i += 1,
        }
    }
    (values, in_dif_mode)
}

/// Value made of a leading digit and the plain digits that follow
fn read_digits(chars: &[char], start: usize, first: u32, negative: bool) -> (f64, usize) {
    let mut value = first as f64;
    let mut i = start;
    while let Some(d) = chars.get(i).and_then(|c| c.to_digit(10)) {
        value = value * 10.0 + d as f64;
        i += 1;
    }
    (if negative { -value } else { value }, i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jcamp_float() {
        assert!((parse_jcamp_float("123.456").unwrap() - 123.456).abs() < 1e-9);
        assert!((parse_jcamp_float("  -1.5E2  ").unwrap() + 150.0).abs() < 1e-9);
        assert!(parse_jcamp_float("abc").is_err());
    }

    #[test]
    fn test_sqz_values() {
        assert_eq!(decode_asdf_values("A23b45@").0, vec![123.0, -245.0, 0.0]);
    }

    #[test]
    fn test_dif_values() {
        let (values, dif) = decode_asdf_values("A0JjK");
        assert_eq!(values, vec![10.0, 11.0, 10.0, 12.0]);
        assert!(dif);
    }

    #[test]
    fn test_dup_counts_include_the_value() {
        assert_eq!(decode_asdf_values("A0T").0, vec![10.0, 10.0]);
        assert_eq!(decode_asdf_values("A0JU").0, vec![10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(decode_asdf_line("100 1 2 3").0, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_xypoints_file() {
        let content = "##TITLE= sample\n##XUNITS= 1/CM\n##YUNITS= ABSORBANCE\n\
                       ##XYPOINTS= (XY..XY)\n4000.0, 0.1; 3999.0, 0.2\n3998.0, 0.4\n##END=\n";
        let ds = parse_jcamp(content, "fallback").unwrap();
        assert_eq!(ds.name, "sample");
        assert_eq!(ds.x.values, vec![4000.0, 3999.0, 3998.0]);
        assert_eq!(ds.data, vec![0.1, 0.2, 0.4]);
        assert_eq!(ds.x.title, "wavenumbers");
        assert_eq!(ds.units, "absorbance");
    }

    #[test]
    fn test_asdf_file_with_checkpoints() {
        let content = "##TITLE=\n##FIRSTX= 0\n##LASTX= 5\n##NPOINTS= 6\n##YFACTOR= 0.5\n\
                       ##XYDATA= (X++(Y..Y))\n0 A0JJ\n3 A2JJ\n##END=\n";
        let ds = parse_jcamp(content, "file").unwrap();
        assert_eq!(ds.name, "file");
        assert_eq!(ds.x.values, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(ds.data, vec![5.0, 5.5, 6.0, 6.5, 7.0, 0.0]);
    }

    #[test]
    fn test_missing_data_block() {
        assert!(parse_jcamp("##TITLE= nothing\n##END=\n", "x").is_err());
    }
}
