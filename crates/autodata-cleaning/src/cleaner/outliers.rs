//! Outlier detection and treatment for numeric columns.

use crate::config::{OutlierAction, OutlierMethod};
use crate::utils::numeric_values;
use polars::prelude::*;
use tracing::debug;

/// Inclusive range of values considered normal for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }
}

/// Quantile of sorted values using linear interpolation between ranks.
pub(crate) fn quantile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// IQR bounds: `[Q1 - k*IQR, Q3 + k*IQR]`.
pub(crate) fn iqr_bounds(values: &[f64], k: f64) -> Option<Bounds> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q1 = quantile_linear(&sorted, 0.25)?;
    let q3 = quantile_linear(&sorted, 0.75)?;
    let iqr = q3 - q1;
    Some(Bounds {
        lower: q1 - k * iqr,
        upper: q3 + k * iqr,
    })
}

/// Z-score bounds: `mean ± t*std` with the population standard deviation.
/// A constant column has no bounds.
pub(crate) fn zscore_bounds(values: &[f64], threshold: f64) -> Option<Bounds> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std == 0.0 || !std.is_finite() {
        return None;
    }
    // |z| >= threshold is an outlier, so the normal range is open; shrink it
    // by one ulp to keep `contains` inclusive.
    Some(Bounds {
        lower: next_up(mean - threshold * std),
        upper: next_down(mean + threshold * std),
    })
}

fn next_up(v: f64) -> f64 {
    if v.is_nan() || v == f64::INFINITY {
        return v;
    }
    let bits = v.to_bits();
    let next = if v == 0.0 {
        1
    } else if v > 0.0 {
        bits + 1
    } else {
        bits - 1
    };
    f64::from_bits(next)
}

fn next_down(v: f64) -> f64 {
    -next_up(-v)
}

fn column_bounds(
    series: &Series,
    method: OutlierMethod,
    threshold: f64,
) -> PolarsResult<Option<Bounds>> {
    let values: Vec<f64> = numeric_values(series)?.into_iter().map(|(_, v)| v).collect();
    Ok(match method {
        OutlierMethod::Iqr => iqr_bounds(&values, threshold),
        OutlierMethod::ZScore => zscore_bounds(&values, threshold),
    })
}

/// Remove rows holding outliers in any of `columns`. Returns rows removed.
///
/// IQR is applied column by column, each on the frame left by the previous
/// column. Z-scores are computed for all columns on the same frame and a row
/// goes if any of its values is an outlier. Nulls never count as outliers.
pub(crate) fn remove_outliers(
    df: &mut DataFrame,
    columns: &[String],
    method: OutlierMethod,
    threshold: f64,
) -> PolarsResult<usize> {
    let before = df.height();

    match method {
        OutlierMethod::Iqr => {
            for column in columns {
                let series = df.column(column)?.as_materialized_series().clone();
                let Some(bounds) = column_bounds(&series, method, threshold)? else {
                    continue;
                };
                let mask = keep_mask(&series, &[bounds], df.height())?;
                let removed = mask.iter().filter(|keep| !**keep).count();
                if removed > 0 {
                    debug!("Column '{}': {} IQR outliers", column, removed);
                    *df = df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?;
                }
            }
        }
        OutlierMethod::ZScore => {
            let mut mask = vec![true; df.height()];
            for column in columns {
                let series = df.column(column)?.as_materialized_series().clone();
                let Some(bounds) = column_bounds(&series, method, threshold)? else {
                    continue;
                };
                let column_mask = keep_mask(&series, &[bounds], df.height())?;
                for (keep, column_keep) in mask.iter_mut().zip(column_mask) {
                    *keep &= column_keep;
                }
            }
            if mask.iter().any(|keep| !keep) {
                *df = df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?;
            }
        }
    }

    Ok(before - df.height())
}

fn keep_mask(series: &Series, bounds: &[Bounds], height: usize) -> PolarsResult<Vec<bool>> {
    let mut mask = vec![true; height];
    for (i, v) in numeric_values(series)? {
        if !bounds.iter().all(|b| b.contains(v)) {
            mask[i] = false;
        }
    }
    Ok(mask)
}

/// Clamp outlying values in `columns` to the detection bounds. Returns the
/// number of values changed. Capped columns become Float64.
pub(crate) fn cap_outliers(
    df: &mut DataFrame,
    columns: &[String],
    method: OutlierMethod,
    threshold: f64,
) -> PolarsResult<usize> {
    let mut capped_total = 0;

    for column in columns {
        let series = df.column(column)?.as_materialized_series().clone();
        let Some(bounds) = column_bounds(&series, method, threshold)? else {
            continue;
        };

        let floats = series.cast(&DataType::Float64)?;
        let ca = floats.f64()?;
        let capped_count = ca
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan() && !bounds.contains(*v))
            .count();
        if capped_count == 0 {
            continue;
        }

        let capped = ca.apply(|v| v.map(|val| val.clamp(bounds.lower, bounds.upper)));
        df.replace(column, capped.into_series())?;
        debug!("Column '{}': capped {} outliers", column, capped_count);
        capped_total += capped_count;
    }

    Ok(capped_total)
}

/// Name of an action, for step messages.
pub(crate) fn action_verb(action: OutlierAction) -> &'static str {
    match action {
        OutlierAction::Remove => "removed",
        OutlierAction::Cap => "capped",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_quantile_linear() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_linear(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile_linear(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile_linear(&sorted, 0.75), Some(3.25));
        assert_eq!(quantile_linear(&[], 0.5), None);
    }

    #[test]
    fn test_iqr_bounds() {
        let b = iqr_bounds(&[1.0, 2.0, 3.0, 4.0, 100.0], 1.5).unwrap();
        // Q1 = 2, Q3 = 4, IQR = 2
        assert_eq!(b.lower, -1.0);
        assert_eq!(b.upper, 7.0);
    }

    #[test]
    fn test_zscore_bounds_constant_column() {
        assert!(zscore_bounds(&[5.0, 5.0, 5.0], 3.0).is_none());
    }

    #[test]
    fn test_remove_outliers_iqr_keeps_nulls() {
        let mut df = df![
            "v" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(100.0), None],
        ]
        .unwrap();
        let removed = remove_outliers(&mut df, &names(&["v"]), OutlierMethod::Iqr, 1.5).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(df.height(), 5);
        assert_eq!(df.column("v").unwrap().null_count(), 1);
    }

    #[test]
    fn test_remove_outliers_zscore_any_column() {
        let mut df = df![
            "a" => [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 50.0],
            "b" => [10.0, 11.0, 10.0, 11.0, 10.0, 11.0, 10.0, 11.0, 10.0, 11.0],
        ]
        .unwrap();
        let removed =
            remove_outliers(&mut df, &names(&["a", "b"]), OutlierMethod::ZScore, 2.0).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(df.height(), 9);
    }

    #[test]
    fn test_remove_outliers_zscore_ignores_nulls() {
        let mut df = df![
            "a" => [
                Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0),
                Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(50.0), None,
            ],
        ]
        .unwrap();
        // mean 5.9 and population std 14.7 over the ten values, so z(50) = 3
        let removed = remove_outliers(&mut df, &names(&["a"]), OutlierMethod::ZScore, 3.0).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(df.height(), 10);
        assert_eq!(df.column("a").unwrap().null_count(), 1);
    }

    #[test]
    fn test_zscore_threshold_is_inclusive() {
        // mean 0, population std 1: values at exactly |z| = 1
        let values = [-1.0, 1.0, -1.0, 1.0];
        let b = zscore_bounds(&values, 1.0).unwrap();
        assert!(!b.contains(1.0));
        assert!(!b.contains(-1.0));
        assert!(b.contains(0.5));
    }

    #[test]
    fn test_cap_outliers() {
        let mut df = df!["v" => [1i64, 2, 3, 4, 100]].unwrap();
        let capped = cap_outliers(&mut df, &names(&["v"]), OutlierMethod::Iqr, 1.5).unwrap();
        assert_eq!(capped, 1);
        assert_eq!(df.height(), 5);
        let v = df.column("v").unwrap().as_materialized_series().clone();
        assert_eq!(v.f64().unwrap().get(4), Some(7.0));
    }
}
