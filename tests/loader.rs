use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use rigscope::data::loader::{load_dataset, load_or_empty};
use rigscope::data::model::CellValue;
use rigscope::data::stats::value_counts;

fn write_parquet(path: &std::path::Path, columns: Vec<(&str, ArrayRef)>) {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, a)| Field::new(*name, a.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    let batch =
        RecordBatch::try_new(schema.clone(), columns.into_iter().map(|(_, a)| a).collect())
            .unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn strings(values: &[&str]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

fn floats(values: &[Option<f64>]) -> ArrayRef {
    Arc::new(Float64Array::from(values.to_vec()))
}

#[test]
fn parquet_dataset_loads_typed_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prices.parquet");
    write_parquet(
        &path,
        vec![
            ("brand", strings(&["Dell", "HP", "Dell"])),
            ("device_type", strings(&["Laptop", "Laptop", "Desktop"])),
            ("cpu_brand", strings(&["Intel", "AMD", "Intel"])),
            ("cpu_cores", Arc::new(Int64Array::from(vec![8, 6, 12]))),
            ("ram_gb", floats(&[Some(16.0), Some(8.0), Some(32.0)])),
            ("storage_gb", floats(&[Some(512.0), Some(256.0), Some(1024.0)])),
            ("gpu_brand", strings(&["NVIDIA", "AMD", "NVIDIA"])),
            ("display_size_in", floats(&[Some(15.6), Some(14.0), None])),
            ("price", floats(&[Some(1299.0), Some(749.5), Some(1899.0)])),
            ("release_year", Arc::new(Int64Array::from(vec![2022, 2021, 2023]))),
            ("os", strings(&["Windows", "Linux", "Windows"])),
        ],
    );

    let ds = load_dataset(&path).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.brands, ["Dell", "HP"]);
    assert_eq!(ds.brand_counts["Dell"], 2);
    assert_eq!(ds.records[0].cpu_cores, Some(8.0));
    assert_eq!(ds.records[1].release_year, Some(2021));
    assert_eq!(ds.records[2].display_size_in, None);
    assert_eq!(ds.records[0].cell("os"), CellValue::String("Windows".into()));
    assert_eq!(value_counts(&ds, "os")[0], ("Windows".to_string(), 2));
}

#[test]
fn parquet_missing_required_column_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.parquet");
    write_parquet(
        &path,
        vec![
            ("brand", strings(&["Dell"])),
            ("price", floats(&[Some(999.0)])),
        ],
    );

    let (ds, err) = load_or_empty(&path);
    assert!(ds.is_empty());
    let err = err.expect("load error reported");
    assert_eq!(err.path, path);
    assert!(format!("{err}").contains("device_type"));
}
