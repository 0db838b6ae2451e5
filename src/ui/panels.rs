use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use book_ratings::data::filter::{Range, RATING_MAX, RATING_MIN};
use book_ratings::data::stats::fmt_stat;
use book_ratings::state::AppState;

// ---------------------------------------------------------------------------
// Blocking error (no data at all)
// ---------------------------------------------------------------------------

/// Returns `true` when the user asks to retry loading.
pub fn blocking_error(ui: &mut Ui, message: &str) -> bool {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(ui.available_height() / 3.0);
        ui.label(
            RichText::new(message)
                .color(Color32::RED)
                .size(18.0),
        );
        ui.add_space(12.0);
        ui.button("⟳ Retry").clicked()
    })
    .inner
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🔍 Filters");
    ui.separator();

    let Some(dashboard) = &state.dashboard else {
        ui.label("No dataset loaded.");
        return;
    };
    let price_bounds = dashboard.price_bounds();
    let priced_books = dashboard.priced_books();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.checkbox(
                &mut state.draft.outliers_only,
                "Show only outliers (>2 pts difference)",
            );
            ui.add_space(6.0);

            ui.strong("Goodreads Rating");
            range_sliders(ui, &mut state.draft.goodreads_range, RATING_MIN..=RATING_MAX);
            ui.add_space(6.0);

            ui.strong("Amazon Rating");
            range_sliders(ui, &mut state.draft.amazon_range, RATING_MIN..=RATING_MAX);
            ui.add_space(6.0);

            // ---- Price filter: only when the data has prices ----
            if let Some(bounds) = price_bounds {
                ui.strong("Price Range");
                ui.small(format!("{priced_books} books have price data"));
                ui.checkbox(&mut state.price_filter_enabled, "Enable price filter");
                if state.price_filter_enabled {
                    range_sliders(ui, &mut state.price_draft, bounds.min..=bounds.max);
                }
                ui.add_space(6.0);
            }

            ui.strong("🔎 Search");
            let mut text = state.draft.search_text.clone().unwrap_or_default();
            let response = ui.add(
                egui::TextEdit::singleline(&mut text).hint_text("Search by title or author"),
            );
            if response.changed() {
                state.draft.search_text = Some(text);
            }
            ui.add_space(10.0);

            if ui.button("Clear filters").clicked() {
                state.clear_filters();
            }
        });

    // Recompute the view after any widget changes.
    state.refilter();
}

/// Two sliders editing an inclusive range; `max` follows `min` upward.
fn range_sliders(ui: &mut Ui, range: &mut Range, bounds: RangeInclusive<f64>) {
    ui.add(egui::Slider::new(&mut range.min, bounds.clone()).text("min"));
    ui.add(egui::Slider::new(&mut range.max, bounds).text("max"));
    if range.min > range.max {
        range.max = range.min;
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Title, data source and book counts. Returns `true` when Reload is clicked.
pub fn top_bar(ui: &mut Ui, state: &AppState) -> bool {
    ui.horizontal(|ui: &mut Ui| {
        let reload = ui.button("⟳ Reload").clicked();
        ui.heading("📚 Amazon vs Goodreads: Rating Analysis");
        ui.separator();

        if let Some(ds) = &state.dashboard {
            ui.label(format!("Data Source: {}", ds.provenance));
            ui.separator();
            ui.label(format!(
                "Books: {} ({} visible)",
                ds.base().len(),
                ds.view.len()
            ));
            for warning in &ds.warnings {
                ui.separator();
                ui.label(RichText::new(warning).color(Color32::YELLOW));
            }
        }
        reload
    })
    .inner
}

// ---------------------------------------------------------------------------
// Metrics row
// ---------------------------------------------------------------------------

/// Headline aggregates for the filtered view.
pub fn metrics(ui: &mut Ui, state: &AppState) {
    let Some(ds) = &state.dashboard else {
        return;
    };
    let summary = &ds.summary;

    egui::Grid::new("metrics")
        .num_columns(4)
        .spacing([32.0, 6.0])
        .show(ui, |ui: &mut Ui| {
            metric(ui, "Books shown", summary.row_count.to_string());
            metric(ui, "Avg difference", fmt_stat(summary.mean_rating_difference, 2));
            metric(ui, "Outliers", summary.outlier_count.to_string());
            match &summary.platform {
                Some(p) => metric(ui, "Higher rated", format!("{} (+{:.2})", p.higher, p.gap)),
                None => metric(ui, "Higher rated", "N/A".to_string()),
            }
            ui.end_row();

            let platform = summary.platform.as_ref();
            metric(
                ui,
                "Goodreads avg",
                fmt_stat(platform.map(|p| p.goodreads_mean), 2),
            );
            metric(ui, "Amazon avg", fmt_stat(platform.map(|p| p.amazon_mean), 2));
            ui.end_row();

            if let Some(price) = &summary.price {
                metric(ui, "Books with price", price.count.to_string());
                metric(ui, "Avg price", format!("${}", fmt_stat(price.mean, 2)));
                let range = match (price.min, price.max) {
                    (Some(lo), Some(hi)) => format!("${lo:.2} – ${hi:.2}"),
                    _ => "N/A".to_string(),
                };
                metric(ui, "Price range", range);
                metric(
                    ui,
                    "Price ↔ Amazon corr.",
                    fmt_stat(price.amazon_correlation, 3),
                );
                ui.end_row();
            }
        });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.small(label);
        ui.label(RichText::new(value).strong().size(20.0));
    });
}
