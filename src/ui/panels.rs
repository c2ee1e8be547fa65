use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use rigscope::data::filter::FILTER_COLUMNS;

use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Left side panel – navigation and filters
// ---------------------------------------------------------------------------

/// Render the left panel: page list, then filter widgets.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("RigScope");
    ui.separator();

    for page in Page::ALL {
        if ui
            .selectable_label(state.page == page, page.title())
            .clicked()
        {
            state.open_page(page);
        }
    }

    ui.add_space(8.0);
    ui.heading("Filters");
    ui.separator();

    if !state.has_data() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            year_range(ui, state);
            ui.separator();

            for col in FILTER_COLUMNS {
                let all_values = state.dataset.unique_text(col);
                let n_selected = state.filters.selected.get(col).map_or(0, |s| s.len());
                let header_text = format!("{col}  ({n_selected}/{})", all_values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(col);
                            }
                        });

                        for val in &all_values {
                            let mut checked = state
                                .filters
                                .selected
                                .get(col)
                                .is_some_and(|s| s.contains(val));
                            let mut text = RichText::new(val);
                            if col == "brand" {
                                text = text.color(state.brand_colors.color_for(val));
                            }
                            if ui.checkbox(&mut checked, text).changed() {
                                state.toggle_filter_value(col, val);
                            }
                        }
                    });
            }
        });
}

fn year_range(ui: &mut Ui, state: &mut AppState) {
    let Some((min_year, max_year)) = state
        .dataset
        .numeric_range("release_year")
        .map(|(lo, hi)| (lo as i64, hi as i64))
    else {
        return;
    };
    let Some((lo, hi)) = state.filters.year_range.as_mut() else {
        return;
    };

    ui.strong("Release year");
    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        changed |= ui
            .add(egui::DragValue::new(lo).range(min_year..=*hi))
            .changed();
        ui.label("–");
        changed |= ui
            .add(egui::DragValue::new(hi).range(*lo..=max_year))
            .changed();
    });
    if changed {
        state.refilter();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if state.has_data() {
            ui.label(format!(
                "{} devices loaded, {} visible",
                state.dataset.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open hardware price data")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open_dataset(&path);
    }
}
