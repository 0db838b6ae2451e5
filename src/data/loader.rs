use std::sync::Arc;

use arrow::array::{
    Array, AsArray, BooleanArray, Decimal128Array, Float32Array, Float64Array, Int32Array,
    Int64Array,
};
use arrow::datatypes::DataType;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{BookDataset, CellValue, RawRow};
use super::source::SourceError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Object encodings the object-storage reader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFormat {
    Csv,
    Parquet,
    Json,
}

impl ObjectFormat {
    /// Dispatch by key extension; anything unrecognised is read as CSV.
    pub fn from_key(key: &str) -> Self {
        let ext = key
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "parquet" | "pq" => ObjectFormat::Parquet,
            "json" => ObjectFormat::Json,
            _ => ObjectFormat::Csv,
        }
    }
}

/// Decode an object body into a dataset.
pub fn decode_object(format: ObjectFormat, body: Bytes) -> Result<BookDataset, SourceError> {
    match format {
        ObjectFormat::Csv => decode_csv(&body),
        ObjectFormat::Parquet => decode_parquet(body),
        ObjectFormat::Json => decode_json(&body),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Header row with column names; every cell is kept as text and coerced
/// later per field.
pub fn decode_csv(body: &[u8]) -> Result<BookDataset, SourceError> {
    let mut reader = csv::Reader::from_reader(body);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), CellValue::from_text(value)))
            .collect();
        rows.push(row);
    }

    Ok(BookDataset::from_rows(headers, rows))
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "title": "Dune", "goodreads_rating_norm": 8.5, "is_outlier": false },
///   ...
/// ]
/// ```
pub fn decode_json(body: &[u8]) -> Result<BookDataset, SourceError> {
    let root: JsonValue = serde_json::from_slice(body)?;
    let records = root
        .as_array()
        .ok_or_else(|| SourceError::Format("expected top-level JSON array".into()))?;

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| SourceError::Format(format!("row {i} is not a JSON object")))?;

        let mut row = RawRow::new();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            row.insert(key.clone(), json_to_cell(val));
        }
        rows.push(row);
    }

    Ok(BookDataset::from_rows(columns, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::from_text(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Flat Parquet table as written by `df.to_parquet()` or Polars.
pub fn decode_parquet(body: Bytes) -> Result<BookDataset, SourceError> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(body)?.build()?;

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.map_err(|e| SourceError::Format(e.to_string()))?;
        let schema = batch.schema();
        if columns.is_empty() {
            columns = schema.fields().iter().map(|f| f.name().clone()).collect();
        }

        for row_idx in 0..batch.num_rows() {
            let row: RawRow = schema
                .fields()
                .iter()
                .enumerate()
                .map(|(col_idx, field)| {
                    (field.name().clone(), extract_cell(batch.column(col_idx), row_idx))
                })
                .collect();
            rows.push(row);
        }
    }

    Ok(BookDataset::from_rows(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => CellValue::from_text(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => CellValue::from_text(col.as_string::<i64>().value(row)),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |a| CellValue::Bool(a.value(row))),
        DataType::Decimal128(_, _) => any
            .downcast_ref::<Decimal128Array>()
            .map_or(CellValue::Null, |a| CellValue::Text(a.value_as_string(row))),
        other => {
            log::debug!("Unsupported parquet column type {other:?}; reading as missing");
            CellValue::Null
        }
    }
}
