use crate::color::ColorScale;
use crate::config::Config;
use crate::data::fallback::{FallbackLoader, LoadOutcome};
use crate::data::filter::{filter, FilterSpec, Range};
use crate::data::model::BookDataset;
use crate::data::sanitize::sanitize;
use crate::data::source::Provenance;
use crate::data::stats::{histogram, HistogramBin, Summary};

/// Bins in the rating-difference histogram.
pub const HISTOGRAM_BINS: usize = 30;

// ---------------------------------------------------------------------------
// Dashboard: the pipeline output for one loaded dataset
// ---------------------------------------------------------------------------

/// Sanitized base dataset plus everything derived from the current filters.
///
/// The base is never mutated; every filter change rebuilds `view`,
/// `summary` and `histogram` from it.
#[derive(Debug, Clone)]
pub struct Dashboard {
    base: BookDataset,
    pub provenance: Provenance,
    pub warnings: Vec<String>,
    /// Rows delivered by the source, before price sanitization.
    pub rows_loaded: usize,
    pub filters: FilterSpec,
    pub view: BookDataset,
    pub summary: Summary,
    pub histogram: Vec<HistogramBin>,
}

impl Dashboard {
    /// `None` when no source produced data.
    pub fn from_outcome(outcome: LoadOutcome) -> Option<Self> {
        if outcome.is_unavailable() {
            return None;
        }
        let sanitized = sanitize(outcome.dataset);
        let mut dashboard = Dashboard {
            base: sanitized.dataset,
            provenance: outcome.provenance,
            warnings: outcome.warnings,
            rows_loaded: sanitized.rows_before,
            filters: FilterSpec::default(),
            view: BookDataset::default(),
            summary: Summary::compute(&BookDataset::default()),
            histogram: Vec::new(),
        };
        dashboard.recompute();
        Some(dashboard)
    }

    pub fn base(&self) -> &BookDataset {
        &self.base
    }

    /// Min/max of valid prices in the base dataset, for the price slider.
    pub fn price_bounds(&self) -> Option<Range> {
        if !self.base.has_price() {
            return None;
        }
        let prices = self.base.records.iter().filter_map(|r| r.price_value());
        let (min, max) = prices.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p), hi.max(p))
        });
        (min <= max).then(|| Range::new(min, max))
    }

    /// Books in the base dataset with price data.
    pub fn priced_books(&self) -> usize {
        self.base
            .records
            .iter()
            .filter(|r| r.price_value().is_some())
            .count()
    }

    /// Apply new filters. Returns `false` (and does no work) when unchanged.
    pub fn set_filters(&mut self, filters: FilterSpec) -> bool {
        if filters == self.filters {
            return false;
        }
        self.filters = filters;
        self.recompute();
        true
    }

    fn recompute(&mut self) {
        self.view = filter(&self.base, &self.filters);
        self.summary = Summary::compute(&self.view);
        self.histogram = histogram(
            self.view.records.iter().filter_map(|r| r.rating_difference),
            HISTOGRAM_BINS,
        );
        log::debug!("{} of {} books match filters", self.view.len(), self.base.len());
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// `None` when loading failed; `error` then says why.
    pub dashboard: Option<Dashboard>,

    /// Blocking error shown instead of the dashboard.
    pub error: Option<String>,

    /// Filters as edited in the side panel.
    pub draft: FilterSpec,

    /// Whether the price slider takes part in filtering.
    pub price_filter_enabled: bool,

    /// Bounds currently shown on the price slider.
    pub price_draft: Range,

    /// Point colours for the scatter plots.
    pub colors: ColorScale,

    /// This session's loader; reloads go through its dataset cache.
    loader: Option<FallbackLoader>,
}

impl AppState {
    /// Run the fallback chain and build the dashboard.
    pub fn load(config: &Config) -> Self {
        let mut loader = match FallbackLoader::from_config(config) {
            Ok(loader) => loader,
            Err(e) => {
                log::error!("Failed to set up data sources: {e}");
                return Self::failed(format!("Could not set up data sources: {e}"), None);
            }
        };
        let outcome = loader.load();
        Self::from_outcome(outcome, Some(loader))
    }

    pub fn from_outcome(outcome: LoadOutcome, loader: Option<FallbackLoader>) -> Self {
        let warnings = outcome.warnings.clone();
        match Dashboard::from_outcome(outcome) {
            Some(dashboard) => {
                let price_draft = dashboard.price_bounds().unwrap_or_default();
                let colors = ColorScale::for_dataset(dashboard.base());
                Self {
                    dashboard: Some(dashboard),
                    error: None,
                    draft: FilterSpec::default(),
                    price_filter_enabled: false,
                    price_draft,
                    colors,
                    loader,
                }
            }
            None => {
                let mut message =
                    "Could not load data from MySQL or object storage.".to_string();
                for w in &warnings {
                    message.push_str("\n• ");
                    message.push_str(w);
                }
                Self::failed(message, loader)
            }
        }
    }

    fn failed(message: String, loader: Option<FallbackLoader>) -> Self {
        Self {
            dashboard: None,
            error: Some(message),
            draft: FilterSpec::default(),
            price_filter_enabled: false,
            price_draft: Range::default(),
            colors: ColorScale::default(),
            loader,
        }
    }

    /// Run the fallback chain again through the session cache.
    ///
    /// Sources that already succeeded answer from the cache; failed ones are
    /// retried. Edited filters survive a successful reload.
    pub fn reload(&mut self) {
        let Some(mut loader) = self.loader.take() else {
            log::warn!("No data sources configured; nothing to reload");
            return;
        };
        log::info!("Reloading ({} source(s) cached)", loader.cached_sources());
        let outcome = loader.load();

        let draft = std::mem::take(&mut self.draft);
        let price_filter_enabled = self.price_filter_enabled;
        *self = Self::from_outcome(outcome, Some(loader));
        if self.dashboard.is_some() {
            self.draft = draft;
            self.price_filter_enabled = price_filter_enabled;
            self.refilter();
        }
    }

    /// Push the edited filters into the dashboard.
    pub fn refilter(&mut self) {
        let mut spec = self.draft.clone();
        spec.price_range = self.price_filter_enabled.then_some(self.price_draft);
        if let Some(dashboard) = &mut self.dashboard {
            dashboard.set_filters(spec);
        }
    }

    /// Reset every filter to its default.
    pub fn clear_filters(&mut self) {
        self.draft = FilterSpec::default();
        self.price_filter_enabled = false;
        if let Some(bounds) = self.dashboard.as_ref().and_then(Dashboard::price_bounds) {
            self.price_draft = bounds;
        }
        self.refilter();
    }
}
