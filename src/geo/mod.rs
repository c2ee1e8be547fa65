//! Brand headquarters lookup with a three-tier fallback chain:
//! geocoder → static table → seeded placeholder.

pub mod cache;
pub mod client;
pub mod fallback;
pub mod service;

pub use client::{Geocoder, NominatimClient};
pub use service::{GeoService, MAX_BRANDS};

/// Which tier of the fallback chain produced a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Api,
    StaticTable,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrandLocation {
    pub brand: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Display name from the geocoder, a city, or "unknown".
    pub label: String,
    pub device_count: usize,
    pub source: LocationSource,
}

impl BrandLocation {
    /// True only when the external lookup succeeded.
    pub fn is_resolved(&self) -> bool {
        self.source == LocationSource::Api
    }

    /// First comma-separated part of the label.
    pub fn short_label(&self) -> &str {
        self.label.split(',').next().unwrap_or(&self.label).trim()
    }
}
