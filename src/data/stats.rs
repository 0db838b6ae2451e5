use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use super::model::{BookDataset, BookRecord};

/// Number of rows in the top-outlier table.
pub const TOP_OUTLIERS: usize = 10;

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Platform {
    Goodreads,
    Amazon,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Goodreads => write!(f, "Goodreads"),
            Platform::Amazon => write!(f, "Amazon"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformComparison {
    pub goodreads_mean: f64,
    pub amazon_mean: f64,
    /// Absolute gap between the two means.
    pub gap: f64,
    /// Amazon only when its mean is strictly greater.
    pub higher: Platform,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    /// Rows with a usable price.
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Pearson correlation between price and Amazon rating.
    pub amazon_correlation: Option<f64>,
}

/// Aggregates over a filtered view. `None` means "no data".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub row_count: usize,
    pub mean_rating_difference: Option<f64>,
    pub outlier_count: usize,
    /// Absent when the dataset has no `price` column.
    pub price: Option<PriceSummary>,
    pub top_outliers: Vec<BookRecord>,
    pub platform: Option<PlatformComparison>,
}

impl Summary {
    pub fn compute(dataset: &BookDataset) -> Self {
        let records = &dataset.records;

        let platform = match (
            mean(records.iter().filter_map(|r| r.goodreads_rating_norm)),
            mean(records.iter().filter_map(|r| r.amazon_rating_norm)),
        ) {
            (Some(goodreads_mean), Some(amazon_mean)) => Some(PlatformComparison {
                goodreads_mean,
                amazon_mean,
                gap: (goodreads_mean - amazon_mean).abs(),
                higher: if amazon_mean > goodreads_mean {
                    Platform::Amazon
                } else {
                    Platform::Goodreads
                },
            }),
            _ => None,
        };

        Summary {
            row_count: records.len(),
            mean_rating_difference: mean(records.iter().filter_map(|r| r.rating_difference)),
            outlier_count: records.iter().filter(|r| r.is_outlier).count(),
            price: dataset.has_price().then(|| price_summary(records)),
            top_outliers: top_outliers(records, TOP_OUTLIERS),
            platform,
        }
    }
}

fn price_summary(records: &[BookRecord]) -> PriceSummary {
    let prices: Vec<f64> = records.iter().filter_map(BookRecord::price_value).collect();
    let pairs: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| Some((r.price_value()?, r.amazon_rating_norm?)))
        .collect();

    PriceSummary {
        count: prices.len(),
        mean: mean(prices.iter().copied()),
        min: prices.iter().copied().reduce(f64::min),
        max: prices.iter().copied().reduce(f64::max),
        amazon_correlation: pearson(&pairs),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Arithmetic mean; `None` for an empty input.
pub fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Pearson correlation; `None` with fewer than two pairs or zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let mx = mean(pairs.iter().map(|p| p.0))?;
    let my = mean(pairs.iter().map(|p| p.1))?;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    let r = sxy / (sxx * syy).sqrt();
    r.is_finite().then_some(r.clamp(-1.0, 1.0))
}

/// Outlier rows by `rating_difference`, largest first.
///
/// The sort is stable so ties keep dataset order; missing or NaN differences go last.
pub fn top_outliers(records: &[BookRecord], n: usize) -> Vec<BookRecord> {
    let mut outliers: Vec<&BookRecord> = records.iter().filter(|r| r.is_outlier).collect();
    let difference = |r: &BookRecord| r.rating_difference.filter(|d| !d.is_nan());
    outliers.sort_by(|a, b| match (difference(a), difference(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    outliers.into_iter().take(n).cloned().collect()
}

/// One equal-width histogram bin, `[start, end)` except the last which is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins spanning the finite values.
pub fn histogram(values: impl Iterator<Item = f64>, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    let (Some(lo), Some(hi)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if hi == lo {
        return vec![HistogramBin {
            start: lo,
            end: hi,
            count: values.len(),
        }];
    }

    let width = (hi - lo) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: lo + width * i as f64,
            end: lo + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Render an optional statistic, "N/A" when there is no data.
pub fn fmt_stat(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, COL_PRICE};

    fn outlier(title: &str, diff: f64) -> BookRecord {
        BookRecord {
            title: Some(title.into()),
            authors_goodreads: None,
            goodreads_rating_norm: Some(5.0),
            amazon_rating_norm: Some(5.0),
            rating_difference: Some(diff),
            is_outlier: true,
            price: None,
        }
    }

    #[test]
    fn empty_dataset_reports_no_data() {
        let summary = Summary::compute(&BookDataset {
            records: vec![],
            columns: vec![COL_PRICE.into()],
        });
        assert_eq!(summary.row_count, 0);
        assert_eq!(summary.mean_rating_difference, None);
        assert_eq!(summary.outlier_count, 0);
        assert!(summary.top_outliers.is_empty());
        assert_eq!(summary.platform, None);

        let price = summary.price.unwrap();
        assert_eq!(price.count, 0);
        assert_eq!(price.mean, None);
        assert_eq!(price.min, None);
        assert_eq!(price.amazon_correlation, None);
        assert_eq!(fmt_stat(price.mean, 2), "N/A");
    }

    #[test]
    fn top_ten_is_stable_on_ties() {
        let diffs = [5.0, 4.0, 4.0, 3.0, 2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let records: Vec<_> = diffs
            .iter()
            .enumerate()
            .map(|(i, d)| outlier(&format!("b{i}"), *d))
            .collect();

        let top = top_outliers(&records, TOP_OUTLIERS);
        let titles: Vec<_> = top.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(
            titles,
            vec!["b0", "b1", "b2", "b3", "b4", "b5", "b6", "b7", "b8", "b9"]
        );
    }

    #[test]
    fn nan_differences_sort_last_without_panicking() {
        let csv: String = std::iter::once(
            "title,authors_goodreads,goodreads_rating_norm,amazon_rating_norm,rating_difference,is_outlier\n"
                .to_string(),
        )
        .chain((0..64).map(|i| {
            let diff = if i % 3 == 0 { "NAN".to_string() } else { format!("{}", i % 7) };
            format!("b{i},a,5,5,{diff},True\n")
        }))
        .collect();
        let ds = crate::data::loader::decode_csv(csv.as_bytes()).unwrap();
        assert!(ds.records.iter().any(|r| r.rating_difference.is_none()));

        let top = top_outliers(&ds.records, TOP_OUTLIERS);
        assert_eq!(top.len(), TOP_OUTLIERS);
        assert_eq!(top[0].rating_difference, Some(6.0));
        assert!(top.iter().all(|r| r.rating_difference.is_some()));

        let mut records: Vec<_> = (0..30).map(|i| outlier(&format!("r{i}"), (i % 5) as f64)).collect();
        for rec in records.iter_mut().step_by(2) {
            rec.rating_difference = Some(f64::NAN);
        }
        let top = top_outliers(&records, records.len());
        assert_eq!(top[0].rating_difference, Some(4.0));
        assert!(top[15..].iter().all(|r| r.rating_difference.unwrap().is_nan()));
    }

    #[test]
    fn mean_difference_skips_nan_text() {
        let csv = "\
title,authors_goodreads,goodreads_rating_norm,amazon_rating_norm,rating_difference,is_outlier
A,x,5,5,1.0,False
B,y,5,5,-nan,False
C,z,5,5,3.0,False
";
        let ds = crate::data::loader::decode_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.records[1].rating_difference, None);
        assert_eq!(Summary::compute(&ds).mean_rating_difference, Some(2.0));
    }

    #[test]
    fn top_outliers_skip_non_outliers_and_sort_missing_last() {
        let mut plain = outlier("plain", 9.0);
        plain.is_outlier = false;
        let mut unknown = outlier("unknown", 0.0);
        unknown.rating_difference = None;
        let records = vec![unknown, plain, outlier("a", 2.5), outlier("b", 3.0)];

        let top = top_outliers(&records, TOP_OUTLIERS);
        let titles: Vec<_> = top.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, vec!["b", "a", "unknown"]);
    }

    #[test]
    fn pearson_on_known_data() {
        let perfect = [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        assert!((pearson(&perfect).unwrap() - 1.0).abs() < 1e-12);

        let inverse = [(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)];
        assert!((pearson(&inverse).unwrap() + 1.0).abs() < 1e-12);

        assert_eq!(pearson(&[(1.0, 2.0)]), None);
        assert_eq!(pearson(&[(1.0, 2.0), (1.0, 5.0)]), None);
    }

    #[test]
    fn price_summary_uses_rows_with_price() {
        let mut records = vec![outlier("a", 1.0), outlier("b", 2.0), outlier("c", 3.0)];
        records[0].price = Some(CellValue::Float(10.0));
        records[0].amazon_rating_norm = Some(6.0);
        records[1].price = Some(CellValue::Float(20.0));
        records[1].amazon_rating_norm = Some(8.0);
        let summary = Summary::compute(&BookDataset {
            records,
            columns: vec![COL_PRICE.into()],
        });

        let price = summary.price.unwrap();
        assert_eq!(price.count, 2);
        assert_eq!(price.mean, Some(15.0));
        assert_eq!(price.min, Some(10.0));
        assert_eq!(price.max, Some(20.0));
        assert!((price.amazon_correlation.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(summary.mean_rating_difference, Some(2.0));
        assert_eq!(summary.outlier_count, 3);
    }

    #[test]
    fn no_price_column_skips_price_summary() {
        let summary = Summary::compute(&BookDataset {
            records: vec![outlier("a", 1.0)],
            columns: vec![],
        });
        assert_eq!(summary.price, None);
    }

    #[test]
    fn platform_ties_label_goodreads() {
        let records = vec![outlier("a", 0.0)];
        let tie = Summary::compute(&BookDataset { records, columns: vec![] });
        let platform = tie.platform.unwrap();
        assert_eq!(platform.higher, Platform::Goodreads);
        assert_eq!(platform.gap, 0.0);

        let mut amazon = outlier("b", 1.0);
        amazon.amazon_rating_norm = Some(7.0);
        let ahead = Summary::compute(&BookDataset {
            records: vec![amazon],
            columns: vec![],
        });
        let platform = ahead.platform.unwrap();
        assert_eq!(platform.higher, Platform::Amazon);
        assert_eq!(platform.gap, 2.0);
    }

    #[test]
    fn histogram_bins() {
        assert!(histogram(std::iter::empty(), 5).is_empty());

        let single = histogram([2.0, 2.0].into_iter(), 5);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].count, 2);

        let bins = histogram([0.0, 1.0, 2.0, 3.0, 4.0].into_iter(), 2);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[1].count, 3);
        assert_eq!(bins[1].end, 4.0);
    }
}
