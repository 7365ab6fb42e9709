// analysis/statistics.rs — Descriptive statistics and histograms

use serde::Serialize;

pub const DEFAULT_HISTOGRAM_BINS: usize = 32;

/// Edge spacing used when every value is identical.
const FLAT_BIN_WIDTH: f64 = 0.001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub p25: f64,
    pub p75: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub bins: Vec<usize>,
    /// `bins.len() + 1` edges, or empty with `bins`.
    pub bin_edges: Vec<f64>,
}

/// Min, max, mean, median, population standard deviation and quartiles.
/// Empty input yields all zeros.
pub fn compute_statistics(values: &[f64]) -> Statistics {
    let n = values.len();
    if n == 0 {
        return Statistics::default();
    }

    let (min, max, sum) = values.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(lo, hi, s), &v| (lo.min(v), hi.max(v), s + v),
    );
    let mean = sum / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let percentile = |p: f64| {
        let idx = p / 100.0 * (n - 1) as f64;
        let lo = idx.floor() as usize;
        let hi = idx.ceil() as usize;
        if lo == hi {
            sorted[lo]
        } else {
            sorted[lo] + (sorted[hi] - sorted[lo]) * (idx - lo as f64)
        }
    };

    Statistics {
        min,
        max,
        mean,
        median: percentile(50.0),
        std_dev: variance.sqrt(),
        p25: percentile(25.0),
        p75: percentile(75.0),
    }
}

/// Equal-width histogram over `[min, max]`. The maximum lands in the last
/// bin. Flat data puts everything in bin 0.
pub fn compute_histogram(values: &[f64], bin_count: usize) -> Histogram {
    if values.is_empty() || bin_count == 0 {
        return Histogram::default();
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let mut bins = vec![0usize; bin_count];
    if max == min {
        bins[0] = values.len();
        let bin_edges = (0..=bin_count)
            .map(|i| min + i as f64 * FLAT_BIN_WIDTH)
            .collect();
        return Histogram { bins, bin_edges };
    }

    let width = (max - min) / bin_count as f64;
    let bin_edges = (0..=bin_count).map(|i| min + i as f64 * width).collect();
    for &v in values {
        let idx = ((v - min) / width).floor();
        let idx = if idx.is_nan() || idx < 0.0 { 0 } else { (idx as usize).min(bin_count - 1) };
        bins[idx] += 1;
    }

    Histogram { bins, bin_edges }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_statistics_are_zero() {
        assert_eq!(compute_statistics(&[]), Statistics::default());
    }

    #[test]
    fn constant_input() {
        let s = compute_statistics(&[2.5; 10]);
        assert_eq!(s.min, 2.5);
        assert_eq!(s.max, 2.5);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.median, 2.5);
    }

    #[test]
    fn quartiles_interpolate() {
        let s = compute_statistics(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.mean, 2.5);
        assert!((s.median - 2.5).abs() < 1e-12);
        assert!((s.p25 - 1.75).abs() < 1e-12);
        assert!((s.p75 - 3.25).abs() < 1e-12);
        assert!((s.std_dev - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<f64> = (0..100).map(|i| i as f64 / 10.0).collect();
        let h = compute_histogram(&values, 8);
        assert_eq!(h.bins.len(), 8);
        assert_eq!(h.bin_edges.len(), 9);
        assert_eq!(h.bins.iter().sum::<usize>(), values.len());
        assert!(h.bins[7] > 0);
    }

    #[test]
    fn flat_histogram_fills_first_bin() {
        let h = compute_histogram(&[1.0; 5], 4);
        assert_eq!(h.bins, vec![5, 0, 0, 0]);
        assert!((h.bin_edges[4] - 1.004).abs() < 1e-12);
    }

    #[test]
    fn empty_histogram() {
        assert_eq!(compute_histogram(&[], 32), Histogram::default());
        assert_eq!(compute_histogram(&[1.0, 2.0], 0), Histogram::default());
    }
}
