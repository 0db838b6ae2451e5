use serde::{Deserialize, Serialize};

use super::model::{BookDataset, BookRecord};

/// Lower and upper end of the normalized rating scale.
pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;

// ---------------------------------------------------------------------------
// Filter predicate
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` bound on a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Missing values never fall inside a range.
    pub fn contains(&self, value: Option<f64>) -> bool {
        value.is_some_and(|v| v >= self.min && v <= self.max)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::new(RATING_MIN, RATING_MAX)
    }
}

/// The active dashboard filters. Every option is ANDed with the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub outliers_only: bool,
    pub goodreads_range: Range,
    pub amazon_range: Range,
    /// Ignored when the dataset has no `price` column.
    pub price_range: Option<Range>,
    /// Case-insensitive substring match on title or author. Surrounding
    /// whitespace is trimmed first, so `"  dune "` matches `Dune`; blank
    /// means no filter.
    pub search_text: Option<String>,
}

impl FilterSpec {
    fn needle(&self) -> Option<String> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Return indices of books that pass all active filters, in dataset order.
///
/// Boolean and numeric checks run before the substring search.
pub fn filtered_indices(dataset: &BookDataset, spec: &FilterSpec) -> Vec<usize> {
    let price_range = spec.price_range.filter(|_| dataset.has_price());
    let needle = spec.needle();

    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            if spec.outliers_only && !rec.is_outlier {
                return false;
            }
            if !spec.goodreads_range.contains(rec.goodreads_rating_norm)
                || !spec.amazon_range.contains(rec.amazon_rating_norm)
            {
                return false;
            }
            if let Some(range) = &price_range {
                if !range.contains(rec.price_value()) {
                    return false;
                }
            }
            match &needle {
                Some(needle) => matches_search(rec, needle),
                None => true,
            }
        })
        .map(|(i, _)| i)
        .collect()
}

/// Build the filtered view as a new dataset; the input is left untouched.
pub fn filter(dataset: &BookDataset, spec: &FilterSpec) -> BookDataset {
    dataset.subset(&filtered_indices(dataset, spec))
}

/// `needle` must already be lowercase.
fn matches_search(rec: &BookRecord, needle: &str) -> bool {
    [&rec.title, &rec.authors_goodreads]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(needle))
}
