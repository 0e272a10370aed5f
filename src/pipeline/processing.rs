/// Built-in processing functions
///
/// Each function takes the working dataset by value, transforms its raw
/// `data` / `mask` and returns it. The controller threads the result of one
/// step into the next, so nothing here touches `processed_data`.

use std::f64::consts::PI;

use num_complex::Complex;
use rustfft::FftPlanner;

use super::functions::Kwargs;
use crate::data::dataset::{Coord, Dataset};
use crate::data::region::RegionKind;
use crate::error::{Error, Result};

// =========================================================================
//  Regions
// =========================================================================

/// Apply region spans: `mask` masks them, other kinds store them in
/// `meta.regions[kind]`.
pub fn define_region(mut dataset: Dataset, kwargs: &Kwargs) -> Result<Dataset> {
    let kind: RegionKind = kwargs
        .str_or("define_region", "kind", "undefined")?
        .parse()?;
    let ranges = kwargs.spans("define_region", "range")?;

    if kind == RegionKind::Mask {
        for span in ranges {
            let n = dataset.mask_span(span)?;
            log::debug!("masked {} columns in [{}]", n, span);
        }
    } else {
        dataset.meta.set_regions(kind, ranges);
    }
    Ok(dataset)
}

/// Terminal output step. The materialization happens in the controller
/// once the whole replay has run.
pub fn output(dataset: Dataset, _kwargs: &Kwargs) -> Result<Dataset> {
    Ok(dataset)
}

// =========================================================================
//  Arithmetic
// =========================================================================

pub fn scale(mut dataset: Dataset, kwargs: &Kwargs) -> Result<Dataset> {
    let factor = kwargs.f64_or("scale", "factor", 1.0)?;
    dataset.map_rows(|row, _| row.iter_mut().for_each(|v| *v *= factor));
    Ok(dataset)
}

pub fn offset(mut dataset: Dataset, kwargs: &Kwargs) -> Result<Dataset> {
    let value = kwargs.f64_or("offset", "value", 0.0)?;
    dataset.map_rows(|row, _| row.iter_mut().for_each(|v| *v += value));
    Ok(dataset)
}

/// Scale every row so its largest unmasked absolute value is 1
pub fn normalize(mut dataset: Dataset, _kwargs: &Kwargs) -> Result<Dataset> {
    dataset.map_rows(|row, mask| {
        let max = row
            .iter()
            .zip(mask)
            .filter(|&(v, &m)| !m && v.is_finite())
            .fold(0.0f64, |acc, (v, _)| acc.max(v.abs()));
        if max > 0.0 {
            row.iter_mut().for_each(|v| *v /= max);
        }
    });
    Ok(dataset)
}

pub fn transpose(mut dataset: Dataset, _kwargs: &Kwargs) -> Result<Dataset> {
    dataset.transpose();
    Ok(dataset)
}

// =========================================================================
//  Baseline Correction
// =========================================================================

/// Polynomial baseline correction.
///
/// The polynomial is fitted on the unmasked points lying in the baseline
/// regions stored in the metadata, or on the first/last 10% of each row
/// when no baseline region is defined.
pub fn baseline(mut dataset: Dataset, kwargs: &Kwargs) -> Result<Dataset> {
    let order = kwargs.i64_or("baseline", "order", 1)?;
    if order < 0 {
        return Err(Error::InvalidArgument {
            action: "baseline".into(),
            name: "order".into(),
            reason: "must be positive".into(),
        });
    }
    let n = dataset.x.len();
    if n == 0 {
        return Ok(dataset);
    }

    let xs = dataset.x.values.clone();
    let regions = dataset.meta.regions(RegionKind::Baseline).to_vec();
    let in_baseline: Vec<bool> = if regions.is_empty() {
        let edge = ((n as f64 * 0.1) as usize).max(1);
        (0..n).map(|i| i < edge || i >= n - edge).collect()
    } else {
        xs.iter()
            .map(|&x| regions.iter().any(|s| s.contains(x)))
            .collect()
    };

    let (lo, hi) = dataset.x.range().unwrap_or((0.0, 1.0));
    let center = (lo + hi) / 2.0;
    let half = if hi > lo { (hi - lo) / 2.0 } else { 1.0 };
    let u: Vec<f64> = xs.iter().map(|x| (x - center) / half).collect();

    let cols = n;
    let rows = dataset.y.len();
    for r in 0..rows {
        let range = r * cols..(r + 1) * cols;
        let (fit_x, fit_y): (Vec<f64>, Vec<f64>) = (0..cols)
            .filter(|&i| in_baseline[i] && !dataset.mask[range.start + i])
            .map(|i| (u[i], dataset.data[range.start + i]))
            .filter(|(_, y)| y.is_finite())
            .unzip();
        if fit_x.is_empty() {
            return Err(Error::InvalidArgument {
                action: "baseline".into(),
                name: "order".into(),
                reason: "no unmasked point in the baseline regions".into(),
            });
        }
        let degree = (order as usize).min(fit_x.len() - 1);
        let coeffs = polyfit(&fit_x, &fit_y, degree).ok_or_else(|| Error::InvalidArgument {
            action: "baseline".into(),
            name: "order".into(),
            reason: "singular fit".into(),
        })?;
        for (v, &x) in dataset.data[range].iter_mut().zip(&u) {
            *v -= polyval(&coeffs, x);
        }
    }

    log::debug!(
        "Baseline correction (order {}, {} regions)",
        order,
        regions.len()
    );
    Ok(dataset)
}

/// Least-squares polynomial coefficients, lowest degree first
fn polyfit(xs: &[f64], ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    let m = degree + 1;
    // Normal equations [A | b]
    let mut a = vec![vec![0.0; m + 1]; m];
    let mut powers = vec![1.0; 2 * m - 1];
    for (&x, &y) in xs.iter().zip(ys) {
        for k in 1..powers.len() {
            powers[k] = powers[k - 1] * x;
        }
        for i in 0..m {
            for j in 0..m {
                a[i][j] += powers[i + j];
            }
            a[i][m] += powers[i] * y;
        }
    }

    for col in 0..m {
        let pivot = (col..m).max_by(|&p, &q| a[p][col].abs().total_cmp(&a[q][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        let pivot_row = a[col].clone();
        for (r, row) in a.iter_mut().enumerate() {
            if r == col {
                continue;
            }
            let f = row[col] / pivot_row[col];
            for c in col..=m {
                row[c] -= f * pivot_row[c];
            }
        }
    }
    Some((0..m).map(|i| a[i][m] / a[i][i]).collect())
}

fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

// =========================================================================
//  Smoothing / Apodization
// =========================================================================

/// Centered moving average; masked points are left out of the averages
pub fn smooth(mut dataset: Dataset, kwargs: &Kwargs) -> Result<Dataset> {
    let window = kwargs.i64_or("smooth", "window", 5)?.max(1) as usize;
    let half = window / 2;
    dataset.map_rows(|row, mask| {
        let src = row.to_vec();
        let n = src.len();
        for i in 0..n {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            let (sum, count) = (start..end)
                .filter(|&j| !mask[j] && src[j].is_finite())
                .fold((0.0, 0usize), |(s, c), j| (s + src[j], c + 1));
            if count > 0 {
                row[i] = sum / count as f64;
            }
        }
    });
    Ok(dataset)
}

/// Exponential multiplication `exp(-π·lb·t)`, `t` measured from the first
/// x coordinate
pub fn em(mut dataset: Dataset, kwargs: &Kwargs) -> Result<Dataset> {
    let lb = kwargs.f64_or("em", "lb", 1.0)?;
    let t0 = dataset.x.values.first().copied().unwrap_or(0.0);
    let factors: Vec<f64> = dataset
        .x
        .values
        .iter()
        .map(|&x| (-PI * lb * (x - t0).abs()).exp())
        .collect();
    dataset.map_rows(|row, _| {
        for (v, f) in row.iter_mut().zip(&factors) {
            *v *= f;
        }
    });
    Ok(dataset)
}

// =========================================================================
//  Fourier Transform
// =========================================================================

/// Next power of two >= n
pub fn next_power_of_two(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

/// Magnitude spectrum of every row.
///
/// Rows are zero-filled to a power of two and FFT-shifted so that zero
/// frequency sits in the middle. The x coordinate becomes the frequency
/// axis and the mask is reset.
pub fn fft(mut dataset: Dataset, _kwargs: &Kwargs) -> Result<Dataset> {
    let n = dataset.x.len();
    if n == 0 {
        return Ok(dataset);
    }
    let size = next_power_of_two(n);
    let half = size / 2;
    let dt = match dataset.x.values.as_slice() {
        [a, b, ..] if b != a => (b - a).abs(),
        _ => 1.0,
    };

    let mut planner = FftPlanner::new();
    let plan = planner.plan_fft_forward(size);
    let rows = dataset.y.len();
    let mut out = Vec::with_capacity(rows * size);
    for r in 0..rows {
        let mut buffer: Vec<Complex<f64>> = dataset
            .row(r)
            .iter()
            .zip(dataset.mask_row(r))
            .map(|(&v, &m)| Complex::new(if m { 0.0 } else { v }, 0.0))
            .collect();
        buffer.resize(size, Complex::new(0.0, 0.0));
        plan.process(&mut buffer);
        out.extend((0..size).map(|i| buffer[(i + half) % size].norm()));
    }

    let units = match dataset.x.units.as_str() {
        "s" => "Hz".to_string(),
        "" => String::new(),
        u => format!("1/{}", u),
    };
    let freqs = (0..size)
        .map(|k| (k as f64 - half as f64) / (size as f64 * dt))
        .collect();
    dataset.x = Coord::new("frequency", &units, freqs);
    dataset.data = out;
    dataset.mask = vec![false; rows * size];
    log::debug!("FFT ({} -> {} points)", n, size);
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::region::Span;
    use crate::pipeline::params::ParamValue;
    use approx::assert_abs_diff_eq;

    fn ramp(n: usize) -> Dataset {
        Dataset::from_values("ramp", (0..n).map(|i| i as f64).collect())
    }

    fn region_kwargs(kind: &str, spans: Vec<Span>) -> Kwargs {
        Kwargs::new()
            .with("kind", ParamValue::Str(kind.into()))
            .with("range", ParamValue::Spans(spans))
    }

    #[test]
    fn test_mask_region_masks_half_open_span() {
        let ds = define_region(ramp(8), &region_kwargs("mask", vec![Span::new(2.0, 5.0)])).unwrap();
        let masked: Vec<usize> = (0..8).filter(|&i| ds.mask[i]).collect();
        assert_eq!(masked, vec![2, 3, 4]);
        assert_eq!(ds.data, ramp(8).data);
        assert!(ds.meta.regions.is_none());
    }

    #[test]
    fn test_baseline_region_is_metadata_only() {
        let ds = define_region(
            ramp(8),
            &region_kwargs("baseline", vec![Span::new(2.0, 5.0)]),
        )
        .unwrap();
        assert!(ds.mask.iter().all(|m| !m));
        assert_eq!(ds.meta.regions(RegionKind::Baseline), &[Span::new(2.0, 5.0)]);
        let kinds: Vec<RegionKind> = ds.meta.regions.as_ref().unwrap().keys().copied().collect();
        assert_eq!(
            kinds,
            vec![RegionKind::Undefined, RegionKind::Baseline, RegionKind::Integral]
        );
    }

    #[test]
    fn test_mask_out_of_range_is_an_error() {
        let err = define_region(ramp(8), &region_kwargs("mask", vec![Span::new(50.0, 60.0)]));
        assert!(matches!(err, Err(Error::SpanOutOfRange { .. })));
    }

    #[test]
    fn test_scale_and_offset() {
        let kw = Kwargs::new().with("factor", ParamValue::Float(2.0));
        let ds = scale(ramp(3), &kw).unwrap();
        assert_eq!(ds.data, vec![0.0, 2.0, 4.0]);
        let kw = Kwargs::new().with("value", ParamValue::Float(1.0));
        let ds = offset(ds, &kw).unwrap();
        assert_eq!(ds.data, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_baseline_removes_linear_trend() {
        let mut ds = Dataset::from_values(
            "trend",
            (0..100).map(|i| 3.0 + 0.5 * i as f64).collect(),
        );
        ds.data[50] += 10.0;
        let kw = Kwargs::new().with("order", ParamValue::Int(1));
        let ds = baseline(ds, &kw).unwrap();
        assert_abs_diff_eq!(ds.data[0], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ds.data[99], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ds.data[50], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_baseline_uses_region_metadata() {
        let ds = Dataset::from_values("flat", vec![5.0; 20]);
        let ds = define_region(
            ds,
            &region_kwargs("baseline", vec![Span::new(0.0, 4.0)]),
        )
        .unwrap();
        let ds = baseline(ds, &Kwargs::new().with("order", ParamValue::Int(0))).unwrap();
        assert!(ds.data.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_smooth_keeps_constants() {
        let ds = Dataset::from_values("c", vec![2.0; 10]);
        let ds = smooth(ds, &Kwargs::new().with("window", ParamValue::Int(3))).unwrap();
        assert!(ds.data.iter().all(|v| (*v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_normalize() {
        let ds = Dataset::from_values("n", vec![1.0, -4.0, 2.0]);
        let ds = normalize(ds, &Kwargs::new()).unwrap();
        assert_eq!(ds.data, vec![0.25, -1.0, 0.5]);
    }

    #[test]
    fn test_em_decays() {
        let ds = Dataset::from_values("fid", vec![1.0; 4]);
        let ds = em(ds, &Kwargs::new().with("lb", ParamValue::Float(0.1))).unwrap();
        assert_abs_diff_eq!(ds.data[0], 1.0);
        assert!(ds.data[1] < 1.0 && ds.data[3] < ds.data[1]);
    }

    #[test]
    fn test_fft_peak_position() {
        let n = 64;
        let values = (0..n)
            .map(|i| (2.0 * PI * 8.0 * i as f64 / n as f64).cos())
            .collect();
        let ds = fft(Dataset::from_values("cos", values), &Kwargs::new()).unwrap();
        assert_eq!(ds.x.len(), 64);
        let (imax, _) = ds
            .data
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert_abs_diff_eq!(ds.x.values[imax].abs(), 8.0 / 64.0, epsilon = 1e-12);
    }

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(100), 128);
        assert_eq!(next_power_of_two(128), 128);
    }

    #[test]
    fn test_transpose_flips_flag() {
        let ds = transpose(ramp(3), &Kwargs::new()).unwrap();
        assert!(ds.transposed);
        assert_eq!(ds.shape(), (3, 1));
    }
}
