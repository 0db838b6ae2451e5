mod app;
mod ui;

use anyhow::{bail, Context, Result};
use app::BookRatingsApp;
use book_ratings::config::Config;
use book_ratings::data::filter::{FilterSpec, Range, RATING_MAX, RATING_MIN};
use book_ratings::report::Report;
use book_ratings::state::AppState;
use clap::Parser;
use eframe::egui;

#[derive(Debug, Parser)]
#[command(name = "book-ratings", about = "Amazon vs Goodreads rating analysis")]
struct Cli {
    /// Print a JSON report to stdout instead of opening the dashboard.
    #[arg(long)]
    report: bool,

    /// Keep only books flagged as outliers.
    #[arg(long)]
    outliers_only: bool,

    #[arg(long, default_value_t = RATING_MIN)]
    goodreads_min: f64,
    #[arg(long, default_value_t = RATING_MAX)]
    goodreads_max: f64,
    #[arg(long, default_value_t = RATING_MIN)]
    amazon_min: f64,
    #[arg(long, default_value_t = RATING_MAX)]
    amazon_max: f64,

    /// Price filter bounds; both must be given.
    #[arg(long, requires = "price_max")]
    price_min: Option<f64>,
    #[arg(long, requires = "price_min")]
    price_max: Option<f64>,

    /// Case-insensitive search over title and author.
    #[arg(long)]
    search: Option<String>,
}

impl Cli {
    fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            outliers_only: self.outliers_only,
            goodreads_range: Range::new(self.goodreads_min, self.goodreads_max),
            amazon_range: Range::new(self.amazon_min, self.amazon_max),
            price_range: self.price_min.zip(self.price_max).map(|(lo, hi)| Range::new(lo, hi)),
            search_text: self.search.clone(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::from_env().context("reading configuration")?;

    if cli.report {
        return run_report(&cli, &config);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Books Rating Analysis",
        options,
        Box::new(move |_cc| Ok(Box::new(BookRatingsApp::new(AppState::load(&config))))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}

fn run_report(cli: &Cli, config: &Config) -> Result<()> {
    let mut state = AppState::load(config);
    let Some(dashboard) = state.dashboard.as_mut() else {
        bail!(
            "{}",
            state.error.unwrap_or_else(|| "no data available".to_string())
        );
    };
    dashboard.set_filters(cli.filter_spec());

    let report = Report::new(dashboard);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serializing report")?
    );
    Ok(())
}
