use eframe::egui;

use rigscope::AppConfig;

use crate::state::AppState;
use crate::ui::{pages, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RigScopeApp {
    pub state: AppState,
}

impl RigScopeApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(&config),
        }
    }
}

impl eframe::App for RigScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: navigation + filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: active page ----
        egui::CentralPanel::default().show(ctx, |ui| {
            pages::central_page(ui, &mut self.state);
        });
    }
}
