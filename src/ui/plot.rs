use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};

use book_ratings::color::ColorScale;
use book_ratings::data::model::BookRecord;
use book_ratings::state::{AppState, Dashboard};

/// Colour groups in the scatter plots.
const COLOR_BUCKETS: usize = 5;
const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Charts (central panel)
// ---------------------------------------------------------------------------

pub fn charts(ui: &mut Ui, state: &AppState) {
    let Some(ds) = &state.dashboard else {
        return;
    };

    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].strong("Goodreads vs Amazon");
        rating_scatter(&mut cols[0], ds, &state.colors);

        cols[1].strong("Rating difference distribution");
        difference_histogram(&mut cols[1], ds);
    });

    if ds.summary.price.is_some() {
        ui.add_space(8.0);
        ui.strong("Price vs Amazon rating");
        price_scatter(ui, ds, &state.colors);
    }
}

/// A single-colour group of scatter points.
struct Series {
    points: Vec<[f64; 2]>,
    color: Color32,
    name: String,
}

impl Series {
    fn draw(self, plot_ui: &mut egui_plot::PlotUi) {
        plot_ui.points(
            Points::new(PlotPoints::from(self.points))
                .radius(2.5)
                .color(self.color)
                .name(self.name),
        );
    }
}

/// One series per colour bucket, plus grey for unknown differences.
fn bucketed_series<F>(records: &[BookRecord], colors: &ColorScale, xy: F) -> Vec<Series>
where
    F: Fn(&BookRecord) -> Option<[f64; 2]>,
{
    let mut buckets: Vec<Vec<[f64; 2]>> = vec![Vec::new(); COLOR_BUCKETS];
    let mut unknown: Vec<[f64; 2]> = Vec::new();

    for rec in records {
        let Some(point) = xy(rec) else {
            continue;
        };
        match colors.bucket(rec.rating_difference, COLOR_BUCKETS) {
            Some(b) => buckets[b].push(point),
            None => unknown.push(point),
        }
    }

    let mut series: Vec<Series> = buckets
        .into_iter()
        .enumerate()
        .filter(|(_, pts)| !pts.is_empty())
        .map(|(i, points)| {
            let (lo, hi) = colors.bucket_bounds(i, COLOR_BUCKETS);
            Series {
                points,
                color: colors.bucket_color(i, COLOR_BUCKETS),
                name: format!("Δ {lo:.1}–{hi:.1}"),
            }
        })
        .collect();

    if !unknown.is_empty() {
        series.push(Series {
            points: unknown,
            color: colors.missing_color(),
            name: "Δ unknown".to_string(),
        });
    }
    series
}

fn rating_scatter(ui: &mut Ui, ds: &Dashboard, colors: &ColorScale) {
    let series = bucketed_series(&ds.view.records, colors, |r| {
        Some([r.goodreads_rating_norm?, r.amazon_rating_norm?])
    });

    Plot::new("rating_scatter")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Goodreads rating (0–10)")
        .y_axis_label("Amazon rating (0–10)")
        .data_aspect(1.0)
        .show(ui, |plot_ui| {
            for s in series {
                s.draw(plot_ui);
            }
        });
}

fn price_scatter(ui: &mut Ui, ds: &Dashboard, colors: &ColorScale) {
    let series = bucketed_series(&ds.view.records, colors, |r| {
        Some([r.price_value()?, r.amazon_rating_norm?])
    });

    Plot::new("price_scatter")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Price ($)")
        .y_axis_label("Amazon rating (0–10)")
        .show(ui, |plot_ui| {
            for s in series {
                s.draw(plot_ui);
            }
        });
}

fn difference_histogram(ui: &mut Ui, ds: &Dashboard) {
    let bars: Vec<Bar> = ds
        .histogram
        .iter()
        .map(|bin| {
            let width = (bin.end - bin.start).max(0.05);
            Bar::new((bin.start + bin.end) / 2.0, bin.count as f64).width(width)
        })
        .collect();

    Plot::new("difference_histogram")
        .height(CHART_HEIGHT)
        .x_axis_label("Rating difference")
        .y_axis_label("Books")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .color(Color32::LIGHT_BLUE)
                    .name("Books"),
            );
        });
}
