//! Declarative description of the optional columns and how the statistics
//! page charts them. The page iterates [`OPTIONAL_CHARTS`] and skips entries
//! whose column the loaded dataset does not have.

use super::model::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Share of each category.
    Pie,
    /// Horizontal bars, most frequent first.
    Bar,
    /// Vertical bars in value order (numeric columns).
    Histogram,
    /// Fixed buckets from [`super::stats::STORAGE_GROUPS`].
    StorageGroups,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Overview,
    CpuMemory,
    GraphicsDisplay,
    PriceWarranty,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Overview,
        Section::CpuMemory,
        Section::GraphicsDisplay,
        Section::PriceWarranty,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Overview => "Main characteristics",
            Section::CpuMemory => "Processors and memory",
            Section::GraphicsDisplay => "Graphics and displays",
            Section::PriceWarranty => "Prices and warranty",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSpec {
    pub column: &'static str,
    pub title: &'static str,
    pub kind: ChartKind,
    pub section: Section,
    /// Keep only the N most frequent values.
    pub top_n: Option<usize>,
}

const fn chart(
    column: &'static str,
    title: &'static str,
    kind: ChartKind,
    section: Section,
    top_n: Option<usize>,
) -> ChartSpec {
    ChartSpec {
        column,
        title,
        kind,
        section,
        top_n,
    }
}

pub const OPTIONAL_CHARTS: &[ChartSpec] = &[
    chart("device_type", "Device types", ChartKind::Pie, Section::Overview, None),
    chart("brand", "Top 10 brands", ChartKind::Bar, Section::Overview, Some(10)),
    chart("os", "Operating systems", ChartKind::Pie, Section::Overview, Some(8)),
    chart("form_factor", "Form factors", ChartKind::Bar, Section::Overview, None),
    chart("cpu_brand", "CPU brands", ChartKind::Pie, Section::CpuMemory, None),
    chart("cpu_tier", "CPU tiers", ChartKind::Bar, Section::CpuMemory, None),
    chart("cpu_cores", "CPU cores", ChartKind::Histogram, Section::CpuMemory, None),
    chart("ram_gb", "RAM (GB)", ChartKind::Histogram, Section::CpuMemory, None),
    chart("storage_type", "Storage types", ChartKind::Pie, Section::CpuMemory, None),
    chart("storage_gb", "Storage size groups", ChartKind::StorageGroups, Section::CpuMemory, None),
    chart("storage_drive_count", "Drives per device", ChartKind::Pie, Section::CpuMemory, None),
    chart("gpu_brand", "GPU brands", ChartKind::Pie, Section::GraphicsDisplay, None),
    chart("gpu_tier", "GPU tiers", ChartKind::Bar, Section::GraphicsDisplay, None),
    chart("vram_gb", "VRAM (GB)", ChartKind::Histogram, Section::GraphicsDisplay, None),
    chart("display_type", "Display types", ChartKind::Pie, Section::GraphicsDisplay, None),
    chart("resolution", "Resolutions", ChartKind::Bar, Section::GraphicsDisplay, Some(10)),
    chart("refresh_hz", "Refresh rate (Hz)", ChartKind::Histogram, Section::GraphicsDisplay, None),
    chart("warranty_months", "Warranty (months)", ChartKind::Histogram, Section::PriceWarranty, None),
    chart("battery_wh", "Battery (Wh)", ChartKind::Histogram, Section::PriceWarranty, None),
];

/// Charts of a section whose column exists in the dataset.
pub fn available_charts(dataset: &Dataset, section: Section) -> Vec<&'static ChartSpec> {
    OPTIONAL_CHARTS
        .iter()
        .filter(|c| c.section == section && dataset.has_column(c.column))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_columns_are_skipped() {
        let ds = Dataset::from_records(vec![], vec!["brand".into(), "os".into()]);
        let charts: Vec<&str> = available_charts(&ds, Section::Overview)
            .iter()
            .map(|c| c.column)
            .collect();
        assert_eq!(charts, vec!["brand", "os"]);
        assert!(available_charts(&ds, Section::GraphicsDisplay).is_empty());
    }

    #[test]
    fn every_section_has_charts() {
        for section in Section::ALL {
            assert!(OPTIONAL_CHARTS.iter().any(|c| c.section == section));
        }
    }
}
