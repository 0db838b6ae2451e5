use eframe::egui;

use book_ratings::state::AppState;

use crate::ui::{panels, plot, tables};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct BookRatingsApp {
    pub state: AppState,
}

impl BookRatingsApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for BookRatingsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Nothing loaded: blocking error only ----
        if let Some(message) = &self.state.error {
            let retry = egui::CentralPanel::default()
                .show(ctx, |ui| panels::blocking_error(ui, message))
                .inner;
            if retry {
                self.state.reload();
            }
            return;
        }

        // ---- Top panel: title, provenance, counts ----
        let reload = egui::TopBottomPanel::top("top_bar")
            .show(ctx, |ui| panels::top_bar(ui, &self.state))
            .inner;
        if reload {
            self.state.reload();
        }

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: metrics, charts, tables ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    panels::metrics(ui, &self.state);
                    ui.separator();
                    plot::charts(ui, &self.state);
                    ui.separator();
                    tables::top_outliers(ui, &self.state);
                    ui.separator();
                    tables::filtered_books(ui, &self.state);
                });
        });
    }
}
