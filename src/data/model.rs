use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const COL_TITLE: &str = "title";
pub const COL_AUTHORS: &str = "authors_goodreads";
pub const COL_GOODREADS: &str = "goodreads_rating_norm";
pub const COL_AMAZON: &str = "amazon_rating_norm";
pub const COL_DIFFERENCE: &str = "rating_difference";
pub const COL_OUTLIER: &str = "is_outlier";
pub const COL_PRICE: &str = "price";
/// Legacy name some exports use for `price`.
pub const COL_PRICE_AVG: &str = "price_avg";

/// Columns every source is expected to provide.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_TITLE,
    COL_AUTHORS,
    COL_GOODREADS,
    COL_AMAZON,
    COL_DIFFERENCE,
    COL_OUTLIER,
];

// ---------------------------------------------------------------------------
// CellValue – a single raw cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as delivered by a source.
///
/// CSV cells stay as [`CellValue::Text`]; typed sources (MySQL, Parquet)
/// keep their native type. Coercion happens per field, see the `as_*` methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

/// Markers treated as missing when reading text cells (the pandas defaults).
const NA_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl CellValue {
    /// Wrap a raw text cell, mapping NA markers to [`CellValue::Null`].
    pub fn from_text(raw: &str) -> Self {
        if NA_MARKERS.contains(&raw.trim()) {
            CellValue::Null
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    /// Numeric coercion. Unparseable text, NaN and infinities are missing, not an error.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Bool(_) | CellValue::Null => None,
        };
        value.filter(|v| v.is_finite())
    }

    pub fn as_bool(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Integer(i) => *i != 0,
            CellValue::Float(v) => *v != 0.0 && !v.is_nan(),
            CellValue::Text(s) => matches!(
                s.trim(),
                "true" | "True" | "TRUE" | "1" | "yes" | "Yes" | "YES"
            ),
            CellValue::Null => false,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, ""),
        }
    }
}

/// One decoded source row: column name → cell.
pub type RawRow = BTreeMap<String, CellValue>;

// ---------------------------------------------------------------------------
// BookRecord – one row of the dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecord {
    pub title: Option<String>,
    pub authors_goodreads: Option<String>,
    pub goodreads_rating_norm: Option<f64>,
    pub amazon_rating_norm: Option<f64>,
    /// Precomputed upstream; sign convention is the source's.
    pub rating_difference: Option<f64>,
    /// Precomputed upstream.
    pub is_outlier: bool,
    /// Raw until sanitized, then always `Float`.
    pub price: Option<CellValue>,
}

impl BookRecord {
    /// Decode a raw row. Missing columns and uncoercible cells read as missing.
    pub fn from_row(row: &RawRow) -> Self {
        let cell = |col: &str| row.get(col).filter(|c| !c.is_null());
        BookRecord {
            title: cell(COL_TITLE).and_then(CellValue::as_text),
            authors_goodreads: cell(COL_AUTHORS).and_then(CellValue::as_text),
            goodreads_rating_norm: cell(COL_GOODREADS).and_then(CellValue::as_f64),
            amazon_rating_norm: cell(COL_AMAZON).and_then(CellValue::as_f64),
            rating_difference: cell(COL_DIFFERENCE).and_then(CellValue::as_f64),
            is_outlier: cell(COL_OUTLIER).is_some_and(CellValue::as_bool),
            price: cell(COL_PRICE).cloned(),
        }
    }

    /// Price coerced to a finite number, if any.
    pub fn price_value(&self) -> Option<f64> {
        self.price
            .as_ref()
            .and_then(CellValue::as_f64)
            .filter(|p| p.is_finite())
    }
}

// ---------------------------------------------------------------------------
// BookDataset – a loaded or derived table of books
// ---------------------------------------------------------------------------

/// Ordered book rows plus the column names the source provided.
///
/// The base dataset is never mutated after loading; filtering and
/// sanitizing build new datasets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookDataset {
    pub records: Vec<BookRecord>,
    /// Source column names after normalization, in source order.
    pub columns: Vec<String>,
}

impl BookDataset {
    /// Build a dataset from decoded rows, renaming `price_avg` to `price`.
    pub fn from_rows(columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        let has_price = columns.iter().any(|c| c == COL_PRICE);
        let columns = normalize_columns(columns);

        let records = rows
            .into_iter()
            .map(|mut row| {
                if let Some(avg) = row.remove(COL_PRICE_AVG) {
                    if !has_price {
                        row.insert(COL_PRICE.to_string(), avg);
                    }
                }
                BookRecord::from_row(&row)
            })
            .collect();

        let dataset = BookDataset { records, columns };
        let missing = dataset.missing_required_columns();
        if !missing.is_empty() {
            log::warn!("Source is missing expected columns {missing:?}; treating them as empty");
        }
        dataset
    }

    /// Derived dataset holding the rows at `indices`, in the given order.
    pub fn subset(&self, indices: &[usize]) -> Self {
        BookDataset {
            records: indices
                .iter()
                .filter_map(|&i| self.records.get(i).cloned())
                .collect(),
            columns: self.columns.clone(),
        }
    }

    pub fn has_price(&self) -> bool {
        self.columns.iter().any(|c| c == COL_PRICE)
    }

    pub fn missing_required_columns(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|req| !self.columns.iter().any(|c| c == req))
            .collect()
    }

    /// Number of books.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// `price_avg` becomes `price`; if both exist, `price` wins.
fn normalize_columns(columns: Vec<String>) -> Vec<String> {
    let has_price = columns.iter().any(|c| c == COL_PRICE);
    columns
        .into_iter()
        .filter_map(|c| match c.as_str() {
            COL_PRICE_AVG if has_price => None,
            COL_PRICE_AVG => Some(COL_PRICE.to_string()),
            _ => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, CellValue)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn text_cells_coerce_per_field() {
        assert_eq!(CellValue::from_text(" NaN "), CellValue::Null);
        assert_eq!(CellValue::from_text("").as_f64(), None);
        assert_eq!(CellValue::from_text(" 4.5 ").as_f64(), Some(4.5));
        assert_eq!(CellValue::from_text("abc").as_f64(), None);
        assert!(CellValue::from_text("True").as_bool());
        assert!(!CellValue::from_text("False").as_bool());
        assert!(CellValue::Integer(1).as_bool());
        assert_eq!(CellValue::Integer(1984).as_text().as_deref(), Some("1984"));
    }

    #[test]
    fn na_markers_and_non_finite_numbers_read_as_missing() {
        for marker in ["n/a", "<NA>", "#N/A", "-nan", "-NaN", "1.#QNAN", "NULL"] {
            assert_eq!(CellValue::from_text(marker), CellValue::Null, "{marker}");
        }
        for text in ["NAN", "-NAN", "+nan", "inf", "-Infinity"] {
            assert_eq!(CellValue::from_text(text).as_f64(), None, "{text}");
        }
        assert_eq!(CellValue::Float(f64::NAN).as_f64(), None);

        let rec = BookRecord::from_row(&row(&[
            (COL_TITLE, CellValue::from_text("<NA>")),
            (COL_DIFFERENCE, CellValue::from_text("NAN")),
        ]));
        assert_eq!(rec.title, None);
        assert_eq!(rec.rating_difference, None);
    }

    #[test]
    fn record_decodes_typed_and_text_cells() {
        let rec = BookRecord::from_row(&row(&[
            (COL_TITLE, CellValue::Text("The Hobbit".into())),
            (COL_AUTHORS, CellValue::Null),
            (COL_GOODREADS, CellValue::Text("8.6".into())),
            (COL_AMAZON, CellValue::Float(9.2)),
            (COL_DIFFERENCE, CellValue::Text("oops".into())),
            (COL_OUTLIER, CellValue::Text("True".into())),
            (COL_PRICE, CellValue::Text("12.99".into())),
        ]));
        assert_eq!(rec.title.as_deref(), Some("The Hobbit"));
        assert_eq!(rec.authors_goodreads, None);
        assert_eq!(rec.goodreads_rating_norm, Some(8.6));
        assert_eq!(rec.amazon_rating_norm, Some(9.2));
        assert_eq!(rec.rating_difference, None);
        assert!(rec.is_outlier);
        assert_eq!(rec.price_value(), Some(12.99));
    }

    #[test]
    fn price_avg_is_renamed_to_price() {
        let ds = BookDataset::from_rows(
            vec![COL_TITLE.into(), COL_PRICE_AVG.into()],
            vec![row(&[
                (COL_TITLE, CellValue::Text("Dune".into())),
                (COL_PRICE_AVG, CellValue::Float(9.5)),
            ])],
        );
        assert!(ds.has_price());
        assert_eq!(ds.columns, vec![COL_TITLE.to_string(), COL_PRICE.to_string()]);
        assert_eq!(ds.records[0].price_value(), Some(9.5));
    }

    #[test]
    fn price_wins_over_price_avg() {
        let ds = BookDataset::from_rows(
            vec![COL_PRICE.into(), COL_PRICE_AVG.into()],
            vec![row(&[
                (COL_PRICE, CellValue::Float(3.0)),
                (COL_PRICE_AVG, CellValue::Float(7.0)),
            ])],
        );
        assert_eq!(ds.columns, vec![COL_PRICE.to_string()]);
        assert_eq!(ds.records[0].price_value(), Some(3.0));
    }

    #[test]
    fn missing_columns_are_reported_not_fatal() {
        let ds = BookDataset::from_rows(vec![COL_TITLE.into()], vec![row(&[])]);
        assert_eq!(ds.len(), 1);
        assert!(!ds.has_price());
        assert_eq!(ds.missing_required_columns().len(), 5);
        assert!(!ds.records[0].is_outlier);
    }
}
