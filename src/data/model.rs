use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::rng::Fnv64;

// ---------------------------------------------------------------------------
// CellValue – a single cell of an optional column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Used as a `BTreeMap` / `BTreeSet` key downstream so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                String(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            // Mixed numeric columns sort by value, ints before equal floats.
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(std::cmp::Ordering::Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(std::cmp::Ordering::Greater),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64`. Numeric strings are accepted because
    /// JSON and Parquet sources sometimes carry numbers as text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Interpret the value as text. Numbers are rendered, nulls are `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) if s.is_empty() => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Best-effort type inference for text cells (CSV).
    pub fn guess(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// DeviceRecord – one row of the DataFrame
// ---------------------------------------------------------------------------

pub const BRAND: &str = "brand";
pub const DEVICE_TYPE: &str = "device_type";
pub const CPU_BRAND: &str = "cpu_brand";
pub const CPU_CORES: &str = "cpu_cores";
pub const RAM_GB: &str = "ram_gb";
pub const STORAGE_GB: &str = "storage_gb";
pub const GPU_BRAND: &str = "gpu_brand";
pub const DISPLAY_SIZE_IN: &str = "display_size_in";
pub const PRICE: &str = "price";
pub const RELEASE_YEAR: &str = "release_year";

/// Columns every dataset file must have (values may still be null).
pub const REQUIRED_COLUMNS: [&str; 10] = [
    BRAND,
    DEVICE_TYPE,
    CPU_BRAND,
    CPU_CORES,
    RAM_GB,
    STORAGE_GB,
    GPU_BRAND,
    DISPLAY_SIZE_IN,
    PRICE,
    RELEASE_YEAR,
];

/// A single hardware listing. Required columns are typed; anything else
/// lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceRecord {
    pub brand: Option<String>,
    pub device_type: Option<String>,
    pub cpu_brand: Option<String>,
    pub cpu_cores: Option<f64>,
    pub ram_gb: Option<f64>,
    pub storage_gb: Option<f64>,
    pub gpu_brand: Option<String>,
    pub display_size_in: Option<f64>,
    pub price: Option<f64>,
    pub release_year: Option<i64>,
    /// Optional columns: column_name → value.
    pub extra: BTreeMap<String, CellValue>,
}

impl DeviceRecord {
    /// Split a row of named cells into typed required fields and extras.
    pub fn from_cells(mut cells: BTreeMap<String, CellValue>) -> Self {
        let mut take_text = |key: &str| cells.remove(key).and_then(|v| v.as_text());
        let brand = take_text(BRAND);
        let device_type = take_text(DEVICE_TYPE);
        let cpu_brand = take_text(CPU_BRAND);
        let gpu_brand = take_text(GPU_BRAND);

        let mut take_num = |key: &str| cells.remove(key).and_then(|v| v.as_f64());
        let cpu_cores = take_num(CPU_CORES);
        let ram_gb = take_num(RAM_GB);
        let storage_gb = take_num(STORAGE_GB);
        let display_size_in = take_num(DISPLAY_SIZE_IN);
        let price = take_num(PRICE);
        let release_year = take_num(RELEASE_YEAR).map(|y| y.round() as i64);

        Self {
            brand,
            device_type,
            cpu_brand,
            cpu_cores,
            ram_gb,
            storage_gb,
            gpu_brand,
            display_size_in,
            price,
            release_year,
            extra: cells.into_iter().filter(|(_, v)| !v.is_null()).collect(),
        }
    }

    /// Value of any column as a cell, required or optional.
    pub fn cell(&self, column: &str) -> CellValue {
        fn text(v: &Option<String>) -> CellValue {
            v.clone().map(CellValue::String).unwrap_or(CellValue::Null)
        }
        fn num(v: Option<f64>) -> CellValue {
            v.map(CellValue::Float).unwrap_or(CellValue::Null)
        }
        match column {
            BRAND => text(&self.brand),
            DEVICE_TYPE => text(&self.device_type),
            CPU_BRAND => text(&self.cpu_brand),
            GPU_BRAND => text(&self.gpu_brand),
            CPU_CORES => num(self.cpu_cores),
            RAM_GB => num(self.ram_gb),
            STORAGE_GB => num(self.storage_gb),
            DISPLAY_SIZE_IN => num(self.display_size_in),
            PRICE => num(self.price),
            RELEASE_YEAR => self
                .release_year
                .map(CellValue::Integer)
                .unwrap_or(CellValue::Null),
            other => self.extra.get(other).cloned().unwrap_or(CellValue::Null),
        }
    }

    /// Text of an optional column, if present.
    pub fn text(&self, column: &str) -> Option<String> {
        self.cell(column).as_text()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed indices.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All records, in file order.
    pub records: Vec<DeviceRecord>,
    /// Column names as they appeared in the source file.
    pub column_names: Vec<String>,
    /// Distinct brands in first-seen order.
    pub brands: Vec<String>,
    /// Number of devices per brand.
    pub brand_counts: BTreeMap<String, usize>,
    fingerprint: u64,
}

impl Dataset {
    /// Build indices from the loaded records.
    pub fn from_records(records: Vec<DeviceRecord>, column_names: Vec<String>) -> Self {
        let mut brands = Vec::new();
        let mut brand_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut hasher = Fnv64::new();

        for name in &column_names {
            hasher.update(name.as_bytes());
        }
        for rec in &records {
            if let Some(brand) = &rec.brand {
                let count = brand_counts.entry(brand.clone()).or_insert(0);
                if *count == 0 {
                    brands.push(brand.clone());
                }
                *count += 1;
            }
            hasher.update(format!("{rec:?}").as_bytes());
        }

        Dataset {
            records,
            column_names,
            brands,
            brand_counts,
            fingerprint: hasher.finish(),
        }
    }

    /// Content hash, used as the dataset's identity by session caches.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Sorted distinct values of a column, nulls excluded.
    pub fn unique_values(&self, column: &str) -> BTreeSet<CellValue> {
        self.records
            .iter()
            .map(|r| r.cell(column))
            .filter(|v| !v.is_null())
            .collect()
    }

    /// Sorted distinct text values of a column (form drop-downs).
    pub fn unique_text(&self, column: &str) -> Vec<String> {
        let set: BTreeSet<String> = self.records.iter().filter_map(|r| r.text(column)).collect();
        set.into_iter().collect()
    }

    /// Min and max of a numeric column, if any value is present.
    pub fn numeric_range(&self, column: &str) -> Option<(f64, f64)> {
        self.records
            .iter()
            .filter_map(|r| r.cell(column).as_f64())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
