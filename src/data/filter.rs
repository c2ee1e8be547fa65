use std::collections::{BTreeMap, BTreeSet};

use super::model::{BRAND, DEVICE_TYPE, Dataset, DeviceRecord, RAM_GB};

// ---------------------------------------------------------------------------
// Side panel filter: release year range plus per-column selections
// ---------------------------------------------------------------------------

/// Columns the side panel offers checkbox filters for.
pub const FILTER_COLUMNS: [&str; 2] = [BRAND, DEVICE_TYPE];

/// Selection state for the side panel.
///
/// `selected` maps column_name → set of selected values. If a column is
/// absent it is unconstrained; if its set is empty nothing passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub year_range: Option<(i64, i64)>,
    pub selected: BTreeMap<String, BTreeSet<String>>,
}

impl FilterState {
    /// Everything selected, full year range.
    pub fn new(dataset: &Dataset) -> Self {
        let year_range = dataset
            .records
            .iter()
            .filter_map(|r| r.release_year)
            .fold(None, |acc: Option<(i64, i64)>, y| match acc {
                None => Some((y, y)),
                Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
            });
        let selected = FILTER_COLUMNS
            .iter()
            .map(|col| {
                let values: BTreeSet<String> = dataset.unique_text(col).into_iter().collect();
                (col.to_string(), values)
            })
            .collect();
        Self {
            year_range,
            selected,
        }
    }

    pub fn passes(&self, record: &DeviceRecord) -> bool {
        if let Some((lo, hi)) = self.year_range {
            match record.release_year {
                Some(y) if y >= lo && y <= hi => {}
                _ => return false,
            }
        }
        for (col, selected) in &self.selected {
            match record.text(col) {
                Some(v) if selected.contains(&v) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Return indices of records that pass all active filters.
pub fn filtered_indices(dataset: &Dataset, filters: &FilterState) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| filters.passes(r))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Ad-hoc query from the questions page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Brand,
    DeviceType,
    Os,
}

impl GroupBy {
    pub fn column(self) -> &'static str {
        match self {
            GroupBy::Brand => BRAND,
            GroupBy::DeviceType => DEVICE_TYPE,
            GroupBy::Os => "os",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupBy::Brand => "By brand",
            GroupBy::DeviceType => "By device type",
            GroupBy::Os => "By operating system",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilter {
    pub min_ram_gb: f64,
    pub max_price: f64,
    /// Case-insensitive substring of `cpu_model`; empty means no constraint.
    pub cpu_search: String,
    pub group_by: GroupBy,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            min_ram_gb: 8.0,
            max_price: 2000.0,
            cpu_search: String::new(),
            group_by: GroupBy::Brand,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// (group value, device count), most frequent first.
    pub groups: Vec<(String, usize)>,
    pub total: usize,
    pub mean_price: Option<f64>,
}

impl QueryFilter {
    pub fn matches(&self, record: &DeviceRecord) -> bool {
        let ram_ok = record.ram_gb.is_some_and(|r| r >= self.min_ram_gb);
        let price_ok = record.price.is_some_and(|p| p <= self.max_price);
        if !(ram_ok && price_ok) {
            return false;
        }
        let needle = self.cpu_search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        record
            .text("cpu_model")
            .is_some_and(|m| m.to_lowercase().contains(&needle))
    }

    pub fn run(&self, dataset: &Dataset) -> QueryResult {
        let hits: Vec<&DeviceRecord> = dataset.records.iter().filter(|r| self.matches(r)).collect();
        let groups = super::stats::count_by(hits.iter().copied(), self.group_by.column());
        let prices: Vec<f64> = hits.iter().filter_map(|r| r.price).collect();
        QueryResult {
            groups,
            total: hits.len(),
            mean_price: super::stats::mean(&prices),
        }
    }
}

/// Devices comparable to a prediction input: same brand and type, RAM within
/// ±4 GB.
pub fn similar_devices<'a>(
    dataset: &'a Dataset,
    brand: &str,
    device_type: &str,
    ram_gb: f64,
) -> impl Iterator<Item = &'a DeviceRecord> + 'a {
    let brand = brand.to_owned();
    let device_type = device_type.to_owned();
    dataset.records.iter().filter(move |r| {
        r.brand.as_deref() == Some(brand.as_str())
            && r.device_type.as_deref() == Some(device_type.as_str())
            && r.cell(RAM_GB)
                .as_f64()
                .is_some_and(|ram| (ram - ram_gb).abs() <= 4.0)
    })
}
