//! Aggregations drawn by the statistics, dynamics and questions pages.

use std::collections::BTreeMap;

use super::model::{CellValue, Dataset, DeviceRecord, PRICE};

/// Count records per distinct value of `column`, most frequent first; ties
/// are broken by value. Nulls are skipped.
pub fn count_by<'a>(
    records: impl IntoIterator<Item = &'a DeviceRecord>,
    column: &str,
) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for rec in records {
        if let Some(v) = rec.text(column) {
            *counts.entry(v).or_insert(0) += 1;
        }
    }
    let mut out: Vec<(String, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// [`count_by`] over the whole dataset.
pub fn value_counts(dataset: &Dataset, column: &str) -> Vec<(String, usize)> {
    count_by(&dataset.records, column)
}

/// Counts keyed by the cell itself, so numeric columns come out in numeric
/// order.
pub fn value_counts_sorted<'a>(
    records: impl IntoIterator<Item = &'a DeviceRecord>,
    column: &str,
) -> Vec<(CellValue, usize)> {
    let mut counts: BTreeMap<CellValue, usize> = BTreeMap::new();
    for rec in records {
        let v = rec.cell(column);
        if !v.is_null() {
            *counts.entry(v).or_insert(0) += 1;
        }
    }
    counts.into_iter().collect()
}

/// Number of devices released per (year, brand).
pub fn yearly_brand_counts<'a>(
    records: impl IntoIterator<Item = &'a DeviceRecord>,
) -> BTreeMap<(i64, String), usize> {
    let mut out = BTreeMap::new();
    for rec in records {
        if let (Some(year), Some(brand)) = (rec.release_year, &rec.brand) {
            *out.entry((year, brand.clone())).or_insert(0) += 1;
        }
    }
    out
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

pub fn price_summary<'a>(
    records: impl IntoIterator<Item = &'a DeviceRecord>,
) -> Option<PriceSummary> {
    let prices: Vec<f64> = records
        .into_iter()
        .filter_map(|r| r.cell(PRICE).as_f64())
        .collect();
    let mean = mean(&prices)?;
    let (min, max) = prices
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
            (lo.min(p), hi.max(p))
        });
    Some(PriceSummary { min, max, mean })
}

/// The brand with the most devices; ties go to the alphabetically first.
pub fn most_popular_brand(dataset: &Dataset) -> Option<(&str, usize)> {
    dataset
        .brand_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(brand, n)| (brand.as_str(), *n))
}

/// Per-brand figures for the manufacturers details panel.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandSummary {
    pub devices: usize,
    pub mean_price: Option<f64>,
    pub top_device_type: Option<String>,
    pub release_years: Option<(i64, i64)>,
}

/// `None` when no record carries `brand`.
pub fn brand_summary<'a>(
    records: impl IntoIterator<Item = &'a DeviceRecord>,
    brand: &str,
) -> Option<BrandSummary> {
    let own: Vec<&DeviceRecord> = records
        .into_iter()
        .filter(|r| r.brand.as_deref() == Some(brand))
        .collect();
    if own.is_empty() {
        return None;
    }
    let prices: Vec<f64> = own.iter().filter_map(|r| r.price).collect();
    let top_device_type = count_by(own.iter().copied(), "device_type")
        .into_iter()
        .next()
        .map(|(t, _)| t);
    let release_years = own
        .iter()
        .filter_map(|r| r.release_year)
        .fold(None, |acc, y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((i64::min(lo, y), i64::max(hi, y))),
        });
    Some(BrandSummary {
        devices: own.len(),
        mean_price: mean(&prices),
        top_device_type,
        release_years,
    })
}

/// Histogram buckets for `storage_gb`, upper bounds inclusive.
pub const STORAGE_GROUPS: [(f64, &str); 5] = [
    (256.0, "≤256GB"),
    (512.0, "257-512GB"),
    (1024.0, "513GB-1TB"),
    (2048.0, "1-2TB"),
    (f64::INFINITY, ">2TB"),
];

pub fn storage_group(storage_gb: f64) -> Option<&'static str> {
    if storage_gb <= 0.0 {
        return None;
    }
    STORAGE_GROUPS
        .iter()
        .find(|(upper, _)| storage_gb <= *upper)
        .map(|(_, label)| *label)
}

/// Counts per storage group, in bucket order, empty buckets included.
pub fn storage_group_counts<'a>(
    records: impl IntoIterator<Item = &'a DeviceRecord>,
) -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> =
        STORAGE_GROUPS.iter().map(|(_, label)| (*label, 0)).collect();
    for rec in records {
        if let Some(label) = rec.storage_gb.and_then(storage_group) {
            if let Some(slot) = counts.iter_mut().find(|(l, _)| *l == label) {
                slot.1 += 1;
            }
        }
    }
    counts
}
