use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use book_ratings::data::model::BookRecord;
use book_ratings::data::stats::{fmt_stat, TOP_OUTLIERS};
use book_ratings::state::AppState;

const ROW_HEIGHT: f32 = 18.0;
const TABLE_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Book tables (central panel)
// ---------------------------------------------------------------------------

pub fn top_outliers(ui: &mut Ui, state: &AppState) {
    let Some(ds) = &state.dashboard else {
        return;
    };
    ui.strong(format!("🔥 Top {TOP_OUTLIERS} outliers by rating difference"));
    if ds.summary.top_outliers.is_empty() {
        ui.label("No outliers in the current selection.");
        return;
    }
    ui.push_id("top_outliers", |ui: &mut Ui| {
        book_table(ui, &ds.summary.top_outliers, false);
    });
}

pub fn filtered_books(ui: &mut Ui, state: &AppState) {
    let Some(ds) = &state.dashboard else {
        return;
    };
    ui.strong(format!("📋 Filtered books ({})", ds.view.len()));
    if ds.view.is_empty() {
        ui.label("No books match the current filters.");
        return;
    }
    ui.push_id("filtered_books", |ui: &mut Ui| {
        book_table(ui, &ds.view.records, ds.view.has_price());
    });
}

fn book_table(ui: &mut Ui, records: &[BookRecord], with_price: bool) {
    let mut headers = vec!["Title", "Author", "Goodreads", "Amazon", "Difference", "Outlier"];
    if with_price {
        headers.push("Price");
    }

    let mut table = TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(TABLE_HEIGHT)
        .column(Column::remainder().at_least(160.0).clip(true))
        .column(Column::auto().at_least(120.0).clip(true));
    for _ in 2..headers.len() {
        table = table.column(Column::auto().at_least(60.0));
    }

    table
        .header(ROW_HEIGHT + 4.0, |mut header| {
            for h in &headers {
                header.col(|ui: &mut Ui| {
                    ui.strong(*h);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, records.len(), |mut row| {
                let rec = &records[row.index()];
                row.col(|ui: &mut Ui| {
                    ui.label(rec.title.as_deref().unwrap_or("N/A"));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(rec.authors_goodreads.as_deref().unwrap_or("N/A"));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(fmt_stat(rec.goodreads_rating_norm, 2));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(fmt_stat(rec.amazon_rating_norm, 2));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(fmt_stat(rec.rating_difference, 2));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(if rec.is_outlier { "yes" } else { "" });
                });
                if with_price {
                    row.col(|ui: &mut Ui| {
                        ui.label(match rec.price_value() {
                            Some(p) => format!("${p:.2}"),
                            None => String::new(),
                        });
                    });
                }
            });
        });

    ui.label(egui::RichText::new(format!("{} rows", records.len())).weak().small());
}
