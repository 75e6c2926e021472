use eframe::egui::{self, ScrollArea};

use getaround_insights::AppConfig;

use crate::state::{DashboardState, Page};
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct InsightsApp {
    pub state: DashboardState,
}

impl InsightsApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: DashboardState::new(config),
        }
    }
}

impl eframe::App for InsightsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: navigation + sliders ----
        egui::SidePanel::left("side_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: current page ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match self.state.page {
                    Page::DelayAnalysis => panels::delay_page(ui, &mut self.state),
                    Page::PricePrediction => panels::prediction_page(ui, &mut self.state),
                });
        });
    }
}
