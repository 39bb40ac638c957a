use eframe::egui;

use crate::executor::Executor;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyCorrApp {
    pub state: AppState,
    /// Reused for every "Open folder…" run.
    executor: Executor,
}

impl RustyCorrApp {
    pub fn new(state: AppState, executor: Executor) -> Self {
        Self { state, executor }
    }
}

impl eframe::App for RustyCorrApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state, &self.executor);
        });

        // ---- Left side panel: ranked pairs ----
        egui::SidePanel::left("pair_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::pair_plot(ui, &self.state);
        });
    }
}
