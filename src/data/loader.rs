use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset, DeviceRecord, REQUIRED_COLUMNS};
use crate::error::DataLoadError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the dataset, or an empty one plus the error to show the user.
pub fn load_or_empty(path: &Path) -> (Dataset, Option<DataLoadError>) {
    match load_dataset(path) {
        Ok(dataset) => (dataset, None),
        Err(err) => {
            log::error!("{err}");
            (Dataset::default(), Some(err))
        }
    }
}

/// Load a device dataset, wrapping any failure in a [`DataLoadError`].
pub fn load_dataset(path: &Path) -> Result<Dataset, DataLoadError> {
    let dataset = load_file(path).map_err(|source| DataLoadError {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "Loaded {} devices ({} brands) from {}",
        dataset.len(),
        dataset.brands.len(),
        path.display()
    );
    Ok(dataset)
}

/// Load a device dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names (recommended)
/// * `.json`    – `[{ "brand": "Dell", "price": 999.0, ... }, ...]`
/// * `.parquet` – one column per field, as written by Pandas or Polars
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn check_required(columns: &[String]) -> Result<()> {
    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| c == required) {
            bail!("missing required column '{required}'");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    check_required(&headers)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cells: BTreeMap<String, CellValue> = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.clone(), CellValue::guess(value)))
            .collect();
        records.push(DeviceRecord::from_cells(cells));
    }

    Ok(Dataset::from_records(records, headers))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut column_names: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut cells = BTreeMap::new();
        for (key, val) in obj {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
            cells.insert(key.clone(), json_to_cell(val));
        }
        records.push(DeviceRecord::from_cells(cells));
    }

    check_required(&column_names)?;
    Ok(Dataset::from_records(records, column_names))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    check_required(&column_names)?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut cells = BTreeMap::new();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = extract_cell(batch.column(col_idx), row);
                cells.insert(field.name().clone(), value);
            }
            records.push(DeviceRecord::from_cells(cells));
        }
    }

    Ok(Dataset::from_records(records, column_names))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| CellValue::String(s.value(row).to_string()))
            .unwrap_or(CellValue::Null),
        DataType::LargeUtf8 => {
            let s = col.as_string::<i64>();
            CellValue::String(s.value(row).to_string())
        }
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(i64::from(a.value(row))))
            .unwrap_or(CellValue::Null),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row)))
            .unwrap_or(CellValue::Null),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(f64::from(a.value(row))))
            .unwrap_or(CellValue::Null),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row)))
            .unwrap_or(CellValue::Null),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row)))
            .unwrap_or(CellValue::Null),
        other => {
            log::debug!("Unsupported parquet column type {other:?}, treating as null");
            CellValue::Null
        }
    }
}
