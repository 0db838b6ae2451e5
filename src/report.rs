use serde::Serialize;

use crate::data::filter::FilterSpec;
use crate::data::source::Provenance;
use crate::data::stats::Summary;
use crate::state::Dashboard;

/// Headless output of one pipeline pass.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub provenance: Provenance,
    pub warnings: Vec<String>,
    pub rows_loaded: usize,
    pub rows_after_sanitize: usize,
    pub filters: FilterSpec,
    pub summary: Summary,
}

impl Report {
    pub fn new(dashboard: &Dashboard) -> Self {
        Self {
            provenance: dashboard.provenance,
            warnings: dashboard.warnings.clone(),
            rows_loaded: dashboard.rows_loaded,
            rows_after_sanitize: dashboard.base().len(),
            filters: dashboard.filters.clone(),
            summary: dashboard.summary.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fallback::LoadOutcome;
    use crate::data::model::{BookDataset, BookRecord, RawRow};

    #[test]
    fn report_serializes_provenance_and_no_data_markers() {
        let mut rec = BookRecord::from_row(&RawRow::new());
        rec.title = Some("Dune".into());
        let dashboard = Dashboard::from_outcome(LoadOutcome {
            dataset: BookDataset {
                records: vec![rec],
                columns: vec![],
            },
            provenance: Provenance::Relational,
            warnings: vec![],
        })
        .unwrap();

        let json = serde_json::to_value(Report::new(&dashboard)).unwrap();
        assert_eq!(json["provenance"], "relational");
        assert_eq!(json["rows_loaded"], 1);
        assert_eq!(json["summary"]["row_count"], 0);
        assert!(json["summary"]["mean_rating_difference"].is_null());
        assert!(json["summary"]["price"].is_null());
    }
}
