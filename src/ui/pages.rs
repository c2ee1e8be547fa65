use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use rigscope::data::filter::{GroupBy, similar_devices};
use rigscope::data::model::REQUIRED_COLUMNS;
use rigscope::data::schema::{ChartKind, Section, available_charts};
use rigscope::data::stats::{
    brand_summary, count_by, most_popular_brand, price_summary, storage_group_counts,
    value_counts_sorted, yearly_brand_counts,
};
use rigscope::geo::MAX_BRANDS;
use rigscope::pricing::ArtifactOrigin;

use crate::state::{
    AppState, CORES_FALLBACK, DISPLAY_FALLBACK, Page, RAM_FALLBACK, STORAGE_FALLBACK, YearlyChart,
    slider_range,
};
use crate::ui::plot;

/// Render the active page in the central panel.
pub fn central_page(ui: &mut Ui, state: &mut AppState) {
    ui.heading(state.page.title());
    ui.separator();

    if !state.has_data() && state.page != Page::Chat {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data. Open a dataset  (File → Open…)");
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.page {
            Page::About => about(ui, state),
            Page::Statistics => statistics(ui, state),
            Page::Dynamics => dynamics(ui, state),
            Page::Questions => questions(ui, state),
            Page::Manufacturers => manufacturers(ui, state),
            Page::Prediction => prediction(ui, state),
            Page::Chat => chat(ui, state),
        });
}

// ---------------------------------------------------------------------------
// About
// ---------------------------------------------------------------------------

const PREVIEW_ROWS: usize = 20;

fn about(ui: &mut Ui, state: &AppState) {
    let ds = &state.dataset;
    ui.label(format!(
        "{} devices, {} columns, {} brands.",
        ds.len(),
        ds.column_names.len(),
        ds.brands.len()
    ));
    if let Some(s) = price_summary(&ds.records) {
        ui.label(format!(
            "Prices from {:.0} to {:.0}, mean {:.0}.",
            s.min, s.max, s.mean
        ));
    }
    ui.add_space(8.0);

    ui.strong(format!("First {PREVIEW_ROWS} rows"));
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .columns(Column::auto().at_least(60.0), REQUIRED_COLUMNS.len())
        .header(20.0, |mut header| {
            for col in REQUIRED_COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|mut body| {
            for rec in ds.records.iter().take(PREVIEW_ROWS) {
                body.row(18.0, |mut row| {
                    for col in REQUIRED_COLUMNS {
                        row.col(|ui: &mut Ui| {
                            ui.label(rec.cell(col).to_string());
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

fn statistics(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for section in Section::ALL {
            ui.selectable_value(&mut state.section, section, section.title());
        }
    });
    ui.separator();

    let charts = available_charts(&state.dataset, state.section);
    if charts.is_empty() {
        ui.label("The dataset has no columns for this section.");
        return;
    }

    for chart in charts {
        ui.strong(chart.title);
        let id = format!("chart_{}", chart.column);
        match chart.kind {
            ChartKind::Pie | ChartKind::Bar => {
                let mut counts = count_by(state.visible_records(), chart.column);
                if let Some(n) = chart.top_n {
                    counts.truncate(n);
                }
                if chart.kind == ChartKind::Pie {
                    plot::share_bars(ui, &id, &counts);
                } else {
                    plot::count_bars(ui, &id, &counts, true);
                }
            }
            ChartKind::Histogram => {
                let counts: Vec<(String, usize)> =
                    value_counts_sorted(state.visible_records(), chart.column)
                        .into_iter()
                        .map(|(v, n)| (v.to_string(), n))
                        .collect();
                plot::count_bars(ui, &id, &counts, false);
            }
            ChartKind::StorageGroups => {
                let counts: Vec<(String, usize)> = storage_group_counts(state.visible_records())
                    .into_iter()
                    .map(|(label, n)| (label.to_owned(), n))
                    .collect();
                plot::count_bars(ui, &id, &counts, false);
            }
        }
        ui.add_space(12.0);
    }
}

// ---------------------------------------------------------------------------
// Dynamics
// ---------------------------------------------------------------------------

fn dynamics(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Chart type:");
        for kind in YearlyChart::ALL {
            ui.radio_value(&mut state.yearly_chart, kind, kind.label());
        }
    });

    let counts = yearly_brand_counts(state.visible_records());
    if counts.is_empty() {
        ui.label("No release years in the current selection.");
        return;
    }
    plot::yearly_chart(
        ui,
        &counts,
        &state.dataset.brands,
        &state.brand_colors,
        state.yearly_chart,
    );
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

fn questions(ui: &mut Ui, state: &mut AppState) {
    let (ram_lo, ram_hi) = state.dataset.numeric_range("ram_gb").unwrap_or((0.0, 128.0));
    let (price_lo, price_hi) = state.dataset.numeric_range("price").unwrap_or((0.0, 10_000.0));

    egui::Grid::new("query_form").num_columns(2).show(ui, |ui: &mut Ui| {
        ui.label("Minimum RAM (GB)");
        ui.add(egui::Slider::new(&mut state.query.min_ram_gb, ram_lo..=ram_hi));
        ui.end_row();

        ui.label("Maximum price");
        ui.add(egui::Slider::new(&mut state.query.max_price, price_lo..=price_hi));
        ui.end_row();

        ui.label("CPU model contains");
        ui.text_edit_singleline(&mut state.query.cpu_search);
        ui.end_row();

        ui.label("Group by");
        egui::ComboBox::from_id_salt("group_by")
            .selected_text(state.query.group_by.label())
            .show_ui(ui, |ui: &mut Ui| {
                for g in [GroupBy::Brand, GroupBy::DeviceType, GroupBy::Os] {
                    ui.selectable_value(&mut state.query.group_by, g, g.label());
                }
            });
        ui.end_row();
    });
    ui.separator();

    let result = state.query.run(&state.dataset);
    match result.mean_price {
        Some(mean) => ui.label(format!("{} devices match, mean price {mean:.0}.", result.total)),
        None => ui.label("No devices match."),
    };
    if !result.groups.is_empty() {
        plot::count_bars(ui, "query_groups", &result.groups, true);
    }
}

// ---------------------------------------------------------------------------
// Manufacturers
// ---------------------------------------------------------------------------

fn manufacturers(ui: &mut Ui, state: &mut AppState) {
    let ds = &state.dataset;
    ui.label(format!(
        "{} distinct brands, {} devices in total.",
        ds.brand_counts.len(),
        ds.len()
    ));
    if let Some((brand, n)) = most_popular_brand(ds) {
        ui.label(format!("Most popular: {brand} with {n} devices."));
    }
    ui.add_space(6.0);

    ui.label(format!(
        "Headquarters of the first {MAX_BRANDS} brands. Lookups pause between requests, so the first run takes a few seconds."
    ));
    if ui.button("Locate headquarters").clicked() {
        state.resolve_locations();
    }
    if state.locations.is_empty() {
        return;
    }

    let (resolved, total) = state.resolved_share();
    ui.label(format!("Resolved via API for {resolved} of {total} brands."));
    plot::location_map(ui, &state.locations);
    ui.add_space(8.0);

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Search brand:");
        ui.text_edit_singleline(&mut state.brand_search);
    });

    let mut clicked: Option<String> = None;
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(80.0))
        .column(Column::auto().at_least(60.0))
        .column(Column::auto().at_least(140.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["Brand", "Devices", "Coordinates", "Location"] {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for loc in state.matching_locations() {
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        let selected = state.selected_brand.as_deref() == Some(loc.brand.as_str());
                        let text = RichText::new(&loc.brand)
                            .color(state.brand_colors.color_for(&loc.brand));
                        if ui.selectable_label(selected, text).clicked() {
                            clicked = Some(loc.brand.clone());
                        }
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(loc.device_count.to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.4}, {:.4}", loc.latitude, loc.longitude));
                    });
                    row.col(|ui: &mut Ui| {
                        let text = RichText::new(loc.short_label());
                        if loc.is_resolved() {
                            ui.label(text);
                        } else {
                            ui.label(text.italics()).on_hover_text("Fallback location");
                        }
                    });
                });
            }
        });
    if let Some(brand) = clicked {
        state.selected_brand = if state.selected_brand.as_ref() == Some(&brand) {
            None
        } else {
            Some(brand)
        };
    }

    let Some(brand) = &state.selected_brand else {
        return;
    };
    let Some(loc) = state.locations.iter().find(|l| &l.brand == brand) else {
        return;
    };
    ui.separator();
    ui.strong(format!("{} - {}", loc.brand, loc.short_label()));
    ui.label(format!("Location: {}", loc.label));
    ui.label(format!("Devices in dataset: {}", loc.device_count));
    ui.label(format!(
        "Source: {}",
        if loc.is_resolved() { "geocoder" } else { "fallback table" }
    ));
    if let Some(summary) = brand_summary(&state.dataset.records, brand) {
        if let Some(p) = summary.mean_price {
            ui.label(format!("Mean price: {p:.2}"));
        }
        if let Some(t) = &summary.top_device_type {
            ui.label(format!("Most common type: {t}"));
        }
        if let Some((lo, hi)) = summary.release_years {
            ui.label(format!("Release years: {lo}-{hi}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

fn category_combo(ui: &mut Ui, id: &str, value: &mut String, options: &[String]) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(value.as_str())
        .show_ui(ui, |ui: &mut Ui| {
            for opt in options {
                ui.selectable_value(value, opt.clone(), opt);
            }
        });
}

fn prediction(ui: &mut Ui, state: &mut AppState) {
    let brands = state.dataset.unique_text("brand");
    let device_types = state.dataset.unique_text("device_type");
    let cpu_brands = state.dataset.unique_text("cpu_brand");
    let gpu_brands = state.dataset.unique_text("gpu_brand");
    let cores = slider_range(&state.dataset, "cpu_cores", CORES_FALLBACK);
    let ram = slider_range(&state.dataset, "ram_gb", RAM_FALLBACK);
    let storage = slider_range(&state.dataset, "storage_gb", STORAGE_FALLBACK);
    let display = slider_range(&state.dataset, "display_size_in", DISPLAY_FALLBACK);

    let q = &mut state.prediction.query;
    egui::Grid::new("prediction_form").num_columns(2).show(ui, |ui: &mut Ui| {
        ui.label("Brand");
        category_combo(ui, "pred_brand", &mut q.brand, &brands);
        ui.end_row();
        ui.label("Device type");
        category_combo(ui, "pred_type", &mut q.device_type, &device_types);
        ui.end_row();
        ui.label("CPU brand");
        category_combo(ui, "pred_cpu", &mut q.cpu_brand, &cpu_brands);
        ui.end_row();
        ui.label("CPU cores");
        ui.add(egui::Slider::new(&mut q.cpu_cores, cores).step_by(1.0));
        ui.end_row();
        ui.label("RAM (GB)");
        ui.add(egui::Slider::new(&mut q.ram_gb, ram));
        ui.end_row();
        ui.label("Storage (GB)");
        ui.add(egui::Slider::new(&mut q.storage_gb, storage));
        ui.end_row();
        ui.label("GPU brand");
        category_combo(ui, "pred_gpu", &mut q.gpu_brand, &gpu_brands);
        ui.end_row();
        ui.label("Display (in)");
        ui.add(egui::Slider::new(&mut q.display_size_in, display).step_by(0.1));
        ui.end_row();
    });

    if ui.button("Predict price").clicked() {
        state.run_prediction();
    }

    if let Some(err) = &state.model_error {
        ui.label(RichText::new(format!("Prediction unavailable: {err}")).color(Color32::RED));
        return;
    }

    if let Some(outcome) = state.prediction.result {
        ui.add_space(6.0);
        ui.heading(format!("Estimated price: {:.0}", outcome.price));
        match outcome.similar_price {
            Some(p) => {
                let diff = outcome.price - p;
                ui.label(format!(
                    "Similar devices average {p:.0} ({}{diff:.0}).",
                    if diff >= 0.0 { "+" } else { "" }
                ));
            }
            None => {
                ui.label("No similar devices in the dataset.");
            }
        }
        let q = &state.prediction.query;
        let n_similar = similar_devices(&state.dataset, &q.brand, &q.device_type, q.ram_gb).count();
        ui.label(format!("{n_similar} similar devices (same brand and type, RAM ±4 GB)."));
    }

    if let Some((artifact, origin)) = &state.model {
        ui.separator();
        let origin = match origin {
            ArtifactOrigin::Memory => "in memory",
            ArtifactOrigin::Disk => "loaded from disk",
            ArtifactOrigin::Trained => "freshly trained",
        };
        ui.label(format!(
            "Model {origin}: MAE {:.1}, R² {:.3} ({} train / {} eval rows).",
            artifact.metrics.mae, artifact.metrics.r2, artifact.train_rows, artifact.eval_rows
        ));
        let importances: Vec<(String, usize)> = artifact
            .sorted_importances()
            .into_iter()
            .map(|f| (f.feature, (f.importance * 1000.0).round() as usize))
            .collect();
        ui.strong("Feature importance (‰)");
        plot::count_bars(ui, "importances", &importances, true);
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

fn chat(ui: &mut Ui, state: &mut AppState) {
    if state.chat_client.is_none() {
        if let Some(err) = &state.chat_error {
            ui.label(RichText::new(err).color(Color32::RED));
        }
        return;
    }

    if ui.button("Clear history").clicked() {
        state.clear_chat();
    }
    ui.separator();

    if state.session.transcript.is_empty() {
        ui.label("Ask anything about computer hardware.");
    }
    for msg in state.session.transcript.messages() {
        let who = match msg.role {
            rigscope::chat::Role::User => "You",
            rigscope::chat::Role::Assistant => "Assistant",
        };
        ui.horizontal(|ui: &mut Ui| {
            ui.strong(who);
            ui.weak(&msg.timestamp);
        });
        ui.label(&msg.content);
        if let Some(source) = &msg.source {
            ui.small(source);
        }
        ui.add_space(6.0);
    }

    if let Some(err) = &state.chat_error {
        ui.label(RichText::new(err).color(Color32::RED));
    }

    ui.separator();
    ui.add(
        egui::TextEdit::multiline(&mut state.chat_input)
            .id_salt(("chat_input", state.session.input_key))
            .hint_text("Your question")
            .desired_width(f32::INFINITY),
    );
    if ui.button("Send").clicked() {
        state.send_chat();
    }
}
