use std::collections::BTreeMap;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use rigscope::geo::BrandLocation;

use crate::color::{BrandColors, series_color};
use crate::state::YearlyChart;

// ---------------------------------------------------------------------------
// Category charts
// ---------------------------------------------------------------------------

/// One bar per category, hover shows the category name.
pub fn count_bars(ui: &mut Ui, id: &str, counts: &[(String, usize)], horizontal: bool) {
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (label, n))| {
            Bar::new(i as f64, *n as f64)
                .name(label)
                .fill(series_color(i))
                .width(0.7)
        })
        .collect();

    let mut chart = BarChart::new(bars).name("devices");
    if horizontal {
        chart = chart.horizontal();
    }

    Plot::new(id)
        .height(220.0)
        .show_axes([!horizontal, horizontal])
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// Share of each category in percent. egui_plot has no pie chart, so the
/// shares are drawn as bars and listed next to the plot.
pub fn share_bars(ui: &mut Ui, id: &str, counts: &[(String, usize)]) {
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        ui.label("No values.");
        return;
    }
    let shares: Vec<(String, f64)> = counts
        .iter()
        .map(|(label, n)| (label.clone(), *n as f64 * 100.0 / total as f64))
        .collect();

    ui.horizontal(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            for (i, (label, pct)) in shares.iter().enumerate() {
                ui.colored_label(series_color(i), format!("{label}: {pct:.1}%"));
            }
        });

        let bars: Vec<Bar> = shares
            .iter()
            .enumerate()
            .map(|(i, (label, pct))| Bar::new(i as f64, *pct).name(label).fill(series_color(i)))
            .collect();
        Plot::new(id)
            .height(200.0)
            .include_y(100.0)
            .allow_drag(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars).name("%")));
    });
}

// ---------------------------------------------------------------------------
// Release dynamics
// ---------------------------------------------------------------------------

/// `[year, count]` points for one brand, in year order.
fn brand_series(counts: &BTreeMap<(i64, String), usize>, brand: &str) -> Vec<[f64; 2]> {
    counts
        .iter()
        .filter(|((_, b), _)| b == brand)
        .map(|((year, _), n)| [*year as f64, *n as f64])
        .collect()
}

/// Offset from the year tick and bar width for brand `slot` of `n` brands
/// sharing one year.
fn bar_slot(slot: usize, n: usize) -> (f64, f64) {
    let width = 0.8 / n.max(1) as f64;
    let offset = (slot as f64 - (n.max(1) - 1) as f64 / 2.0) * width;
    (offset, width)
}

/// Devices released per year, one series per brand, drawn as lines or as
/// grouped bars.
pub fn yearly_chart(
    ui: &mut Ui,
    counts: &BTreeMap<(i64, String), usize>,
    brands: &[String],
    colors: &BrandColors,
    kind: YearlyChart,
) {
    let present: Vec<(&String, Vec<[f64; 2]>)> = brands
        .iter()
        .map(|b| (b, brand_series(counts, b)))
        .filter(|(_, points)| !points.is_empty())
        .collect();

    Plot::new("yearly_chart")
        .legend(Legend::default())
        .x_axis_label("Release year")
        .y_axis_label("Devices")
        .height(320.0)
        .show(ui, |plot_ui| {
            for (slot, (brand, points)) in present.iter().enumerate() {
                let color = colors.color_for(brand);
                match kind {
                    YearlyChart::Lines => plot_ui.line(
                        Line::new(PlotPoints::from(points.clone()))
                            .name(brand)
                            .color(color)
                            .width(1.5),
                    ),
                    YearlyChart::Bars => {
                        let (offset, width) = bar_slot(slot, present.len());
                        let bars = points
                            .iter()
                            .map(|[year, n]| Bar::new(year + offset, *n).width(width).fill(color))
                            .collect();
                        plot_ui.bar_chart(BarChart::new(bars).name(brand).color(color));
                    }
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Headquarters map
// ---------------------------------------------------------------------------

/// Scatter of headquarters in lon/lat space. Geocoded points and fallback
/// points are separate series so the legend tells them apart.
pub fn location_map(ui: &mut Ui, locations: &[BrandLocation]) {
    let max_count = locations.iter().map(|l| l.device_count).max().unwrap_or(1).max(1);
    let radius = |count: usize| 4.0 + 12.0 * count as f32 / max_count as f32;

    Plot::new("hq_map")
        .legend(Legend::default())
        .data_aspect(1.0)
        .include_x(-180.0)
        .include_x(180.0)
        .include_y(-60.0)
        .include_y(80.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .height(360.0)
        .show(ui, |plot_ui| {
            for loc in locations {
                let (series, color) = if loc.is_resolved() {
                    ("Geocoded", Color32::from_rgb(60, 160, 90))
                } else {
                    ("Fallback", Color32::from_rgb(220, 120, 50))
                };
                plot_ui.points(
                    Points::new(vec![[loc.longitude, loc.latitude]])
                        .radius(radius(loc.device_count))
                        .color(color)
                        .name(series),
                );
                plot_ui.text(
                    egui_plot::Text::new(
                        egui_plot::PlotPoint::new(loc.longitude, loc.latitude + 3.0),
                        loc.brand.as_str(),
                    )
                    .color(Color32::LIGHT_GRAY),
                );
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_series_keeps_year_order_and_skips_other_brands() {
        let counts = BTreeMap::from([
            ((2022, "Dell".to_string()), 4),
            ((2020, "Dell".to_string()), 1),
            ((2021, "HP".to_string()), 7),
        ]);
        assert_eq!(brand_series(&counts, "Dell"), vec![[2020.0, 1.0], [2022.0, 4.0]]);
        assert!(brand_series(&counts, "Asus").is_empty());
    }

    #[test]
    fn bar_slots_are_centred_on_the_year() {
        assert_eq!(bar_slot(0, 1), (0.0, 0.8));
        let (left, w) = bar_slot(0, 2);
        let (right, _) = bar_slot(1, 2);
        assert!((w - 0.4).abs() < 1e-12);
        assert!((left + 0.2).abs() < 1e-12);
        assert!((right - 0.2).abs() < 1e-12);
    }
}
