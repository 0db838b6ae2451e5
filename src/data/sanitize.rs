use super::model::{BookDataset, CellValue};

/// Prices at or above this are treated as data-entry errors.
pub const PRICE_CEILING: f64 = 500.0;

/// A sanitized dataset plus the coverage counts callers report
/// ("X of Y books have price data").
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    pub dataset: BookDataset,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl Sanitized {
    pub fn rows_dropped(&self) -> usize {
        self.rows_before - self.rows_after
    }
}

/// Keep only rows whose price coerces to a finite number in `(0, 500)`.
///
/// Retained prices are stored as `Float`. Without a `price` column the
/// dataset passes through untouched.
pub fn sanitize(dataset: BookDataset) -> Sanitized {
    let rows_before = dataset.len();
    if !dataset.has_price() {
        return Sanitized {
            dataset,
            rows_before,
            rows_after: rows_before,
        };
    }

    let BookDataset { records, columns } = dataset;
    let records: Vec<_> = records
        .into_iter()
        .filter_map(|mut rec| {
            let price = rec.price_value().filter(|p| *p > 0.0 && *p < PRICE_CEILING)?;
            rec.price = Some(CellValue::Float(price));
            Some(rec)
        })
        .collect();

    let rows_after = records.len();
    if rows_after < rows_before {
        log::info!(
            "Price sanitizer dropped {} of {rows_before} rows",
            rows_before - rows_after
        );
    }

    Sanitized {
        dataset: BookDataset { records, columns },
        rows_before,
        rows_after,
    }
}
