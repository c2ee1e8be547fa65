//! Writes a synthetic hardware price table as CSV and Parquet.
//!
//! Usage: `generate_sample [OUTPUT_CSV]` (default `data/computer_prices_all.csv`).
//! The Parquet copy is written next to it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use rigscope::config::DEFAULT_DATA_PATH;
use rigscope::rng::SimpleRng;

const ROWS: usize = 2_000;

/// (brand, price multiplier)
const BRANDS: [(&str, f64); 10] = [
    ("Dell", 1.00),
    ("HP", 0.95),
    ("Lenovo", 0.97),
    ("Apple", 1.45),
    ("Asus", 0.92),
    ("Acer", 0.85),
    ("MSI", 1.10),
    ("Samsung", 1.05),
    ("Razer", 1.35),
    ("Gigabyte", 0.98),
];
const DEVICE_TYPES: [&str; 2] = ["Laptop", "Desktop"];
const CPU_BRANDS: [(&str, &str); 3] = [("Intel", "Core i"), ("AMD", "Ryzen "), ("Apple", "M")];
const GPU_BRANDS: [&str; 4] = ["NVIDIA", "AMD", "Intel", "Apple"];
const RAM_OPTIONS: [f64; 5] = [8.0, 16.0, 32.0, 64.0, 128.0];
const STORAGE_OPTIONS: [f64; 5] = [256.0, 512.0, 1024.0, 2048.0, 4096.0];
const STORAGE_TYPES: [&str; 3] = ["SSD", "NVMe", "HDD"];
const OS_OPTIONS: [&str; 3] = ["Windows", "Linux", "ChromeOS"];

#[derive(Debug, Serialize)]
struct Row {
    brand: String,
    device_type: String,
    cpu_brand: String,
    cpu_model: String,
    cpu_cores: i64,
    ram_gb: f64,
    storage_gb: f64,
    storage_type: String,
    gpu_brand: String,
    display_size_in: f64,
    os: String,
    warranty_months: i64,
    release_year: i64,
    price: f64,
}

fn pick<'a, T>(rng: &mut SimpleRng, items: &'a [T]) -> &'a T {
    &items[rng.index(items.len())]
}

fn generate_row(rng: &mut SimpleRng) -> Row {
    let &(brand, brand_factor) = pick(rng, &BRANDS);
    let device_type = *pick(rng, &DEVICE_TYPES);
    let laptop = device_type == "Laptop";

    let (cpu_brand, cpu_prefix) = if brand == "Apple" {
        CPU_BRANDS[2]
    } else {
        *pick(rng, &CPU_BRANDS[..2])
    };
    let tier = 3 + 2 * rng.index(4);
    let cpu_model = format!("{cpu_prefix}{tier} {}", 1000 + rng.index(9000));
    let cpu_cores = (tier as i64 + rng.index(3) as i64) * 2;

    let ram_gb = *pick(rng, &RAM_OPTIONS);
    let storage_gb = *pick(rng, &STORAGE_OPTIONS);
    let gpu_brand = if brand == "Apple" {
        "Apple"
    } else {
        *pick(rng, &GPU_BRANDS[..3])
    };
    let display_size_in = if laptop {
        (rng.uniform(13.0, 17.3) * 10.0).round() / 10.0
    } else {
        (rng.uniform(21.5, 34.0) * 10.0).round() / 10.0
    };
    let os = if brand == "Apple" {
        "macOS"
    } else {
        *pick(rng, &OS_OPTIONS)
    };
    let release_year = 2018 + rng.index(7) as i64;

    let mut price = 250.0
        + cpu_cores as f64 * 35.0
        + ram_gb * 9.0
        + storage_gb * 0.18
        + if gpu_brand == "NVIDIA" { 300.0 } else { 0.0 }
        + if laptop { 120.0 } else { 0.0 };
    price *= brand_factor;
    price += rng.gauss(0.0, price * 0.08);

    Row {
        brand: brand.to_owned(),
        device_type: device_type.to_owned(),
        cpu_brand: cpu_brand.to_owned(),
        cpu_model,
        cpu_cores,
        ram_gb,
        storage_gb,
        storage_type: pick(rng, &STORAGE_TYPES).to_string(),
        gpu_brand: gpu_brand.to_owned(),
        display_size_in,
        os: os.to_owned(),
        warranty_months: 12 * (1 + rng.index(3) as i64),
        release_year,
        price: (price.max(150.0) * 100.0).round() / 100.0,
    }
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    fn text(rows: &[Row], f: impl Fn(&Row) -> &str) -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    }
    fn float(rows: &[Row], f: impl Fn(&Row) -> f64) -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    }
    fn int(rows: &[Row], f: impl Fn(&Row) -> i64) -> ArrayRef {
        Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    }

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("brand", text(rows, |r| r.brand.as_str())),
        ("device_type", text(rows, |r| r.device_type.as_str())),
        ("cpu_brand", text(rows, |r| r.cpu_brand.as_str())),
        ("cpu_model", text(rows, |r| r.cpu_model.as_str())),
        ("cpu_cores", int(rows, |r| r.cpu_cores)),
        ("ram_gb", float(rows, |r| r.ram_gb)),
        ("storage_gb", float(rows, |r| r.storage_gb)),
        ("storage_type", text(rows, |r| r.storage_type.as_str())),
        ("gpu_brand", text(rows, |r| r.gpu_brand.as_str())),
        ("display_size_in", float(rows, |r| r.display_size_in)),
        ("os", text(rows, |r| r.os.as_str())),
        ("warranty_months", int(rows, |r| r.warranty_months)),
        ("release_year", int(rows, |r| r.release_year)),
        ("price", float(rows, |r| r.price)),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let csv_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
    if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut rng = SimpleRng::new(42);
    let rows: Vec<Row> = (0..ROWS).map(|_| generate_row(&mut rng)).collect();

    write_csv(&csv_path, &rows)?;
    let parquet_path = csv_path.with_extension("parquet");
    write_parquet(&parquet_path, &rows)?;

    println!(
        "Wrote {} devices to {} and {}",
        rows.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
