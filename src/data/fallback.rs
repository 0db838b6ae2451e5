use std::sync::Arc;

use super::cache::DatasetCache;
use super::model::BookDataset;
use super::source::{BookSource, ObjectStorageSource, Provenance, RelationalSource, SourceError};
use crate::config::Config;

/// Result of running the fallback chain.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub dataset: BookDataset,
    pub provenance: Provenance,
    /// Notices from sources that failed before one succeeded (or all failed).
    pub warnings: Vec<String>,
}

impl LoadOutcome {
    /// `true` when no source produced data; callers must stop here.
    pub fn is_unavailable(&self) -> bool {
        self.provenance == Provenance::None || self.dataset.is_empty()
    }
}

/// Tries each source in priority order and returns the first non-empty table.
///
/// Reader failures never propagate: they become warnings and the next
/// source is tried.
pub struct FallbackLoader {
    sources: Vec<Box<dyn BookSource>>,
    cache: DatasetCache,
}

impl FallbackLoader {
    pub fn new(sources: Vec<Box<dyn BookSource>>) -> Self {
        Self {
            sources,
            cache: DatasetCache::new(),
        }
    }

    /// Relational first (only with full credentials), object storage second.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let runtime = Arc::new(
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?,
        );

        let mut sources: Vec<Box<dyn BookSource>> = Vec::new();
        match &config.database {
            Some(db) => sources.push(Box::new(RelationalSource::new(
                db.clone(),
                config.io_timeout,
                runtime.clone(),
            ))),
            None => log::info!("MySQL credentials not set; skipping relational source"),
        }
        sources.push(Box::new(ObjectStorageSource::new(
            config.object_storage.clone(),
            config.io_timeout,
            runtime,
        )));

        Ok(Self::new(sources))
    }

    pub fn load(&mut self) -> LoadOutcome {
        let mut warnings = Vec::new();

        for source in &self.sources {
            let provenance = source.provenance();
            let key = source.key();

            if let Some(cached) = self.cache.get(&key) {
                log::debug!("Using cached {provenance} dataset ({} rows)", cached.len());
                return LoadOutcome {
                    dataset: cached.clone(),
                    provenance,
                    warnings,
                };
            }

            let result = source.fetch().and_then(|ds| {
                if ds.is_empty() {
                    Err(SourceError::EmptyResult)
                } else {
                    Ok(ds)
                }
            });

            match result {
                Ok(dataset) => {
                    log::info!("Loaded {} books from {provenance}", dataset.len());
                    self.cache.insert(key, dataset.clone());
                    return LoadOutcome {
                        dataset,
                        provenance,
                        warnings,
                    };
                }
                Err(e) => {
                    log::warn!("{provenance} source failed: {e}");
                    warnings.push(failure_notice(provenance, &e));
                }
            }
        }

        log::error!("No source produced data");
        LoadOutcome {
            dataset: BookDataset::default(),
            provenance: Provenance::None,
            warnings,
        }
    }

    pub fn cached_sources(&self) -> usize {
        self.cache.len()
    }
}

fn failure_notice(provenance: Provenance, err: &SourceError) -> String {
    match (provenance, err) {
        (Provenance::Relational, SourceError::UnknownDatabase(db)) => {
            format!("Database '{db}' not found. Falling back to object storage.")
        }
        (Provenance::Relational, SourceError::AccessDenied) => {
            "MySQL credentials rejected. Falling back to object storage.".to_string()
        }
        (Provenance::Relational, SourceError::MissingTable(table)) => {
            format!("Table '{table}' does not exist. Falling back to object storage.")
        }
        (Provenance::Relational, other) => {
            format!("MySQL unavailable ({other}). Falling back to object storage.")
        }
        (_, other) => format!("Could not read from {provenance}: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::data::model::BookRecord;
    use crate::data::source::SourceKey;

    struct FakeSource {
        provenance: Provenance,
        rows: Option<usize>,
        calls: Rc<Cell<usize>>,
    }

    impl BookSource for FakeSource {
        fn provenance(&self) -> Provenance {
            self.provenance
        }

        fn key(&self) -> SourceKey {
            SourceKey::ObjectStorage {
                bucket: self.provenance.label().into(),
                key: "k".into(),
                region: "r".into(),
            }
        }

        fn fetch(&self) -> Result<BookDataset, SourceError> {
            self.calls.set(self.calls.get() + 1);
            match self.rows {
                Some(n) => Ok(BookDataset {
                    records: vec![BookRecord::from_row(&Default::default()); n],
                    columns: vec![],
                }),
                None => Err(SourceError::AccessDenied),
            }
        }
    }

    fn fake(provenance: Provenance, rows: Option<usize>) -> (Box<dyn BookSource>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let source = FakeSource {
            provenance,
            rows,
            calls: calls.clone(),
        };
        (Box::new(source), calls)
    }

    #[test]
    fn relational_wins_when_it_succeeds() {
        let (db, _) = fake(Provenance::Relational, Some(3));
        let (s3, s3_calls) = fake(Provenance::ObjectStorage, Some(5));
        let outcome = FallbackLoader::new(vec![db, s3]).load();

        assert_eq!(outcome.provenance, Provenance::Relational);
        assert_eq!(outcome.dataset.len(), 3);
        assert!(outcome.warnings.is_empty());
        assert_eq!(s3_calls.get(), 0);
    }

    #[test]
    fn empty_relational_result_falls_through() {
        let (db, _) = fake(Provenance::Relational, Some(0));
        let (s3, _) = fake(Provenance::ObjectStorage, Some(2));
        let outcome = FallbackLoader::new(vec![db, s3]).load();

        assert_eq!(outcome.provenance, Provenance::ObjectStorage);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn access_denied_produces_fallback_warning() {
        let (db, _) = fake(Provenance::Relational, None);
        let (s3, _) = fake(Provenance::ObjectStorage, Some(1));
        let outcome = FallbackLoader::new(vec![db, s3]).load();

        assert_eq!(outcome.provenance, Provenance::ObjectStorage);
        assert_eq!(
            outcome.warnings,
            vec!["MySQL credentials rejected. Falling back to object storage.".to_string()]
        );
    }

    #[test]
    fn repeated_loads_hit_the_cache() {
        let (s3, calls) = fake(Provenance::ObjectStorage, Some(4));
        let mut loader = FallbackLoader::new(vec![s3]);

        let first = loader.load();
        let second = loader.load();
        assert_eq!(first.dataset, second.dataset);
        assert_eq!(calls.get(), 1);
        assert_eq!(loader.cached_sources(), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let (s3, calls) = fake(Provenance::ObjectStorage, None);
        let mut loader = FallbackLoader::new(vec![s3]);

        assert!(loader.load().is_unavailable());
        assert!(loader.load().is_unavailable());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn config_without_credentials_has_only_object_storage() {
        let loader = FallbackLoader::from_config(&Config::default()).unwrap();
        assert_eq!(loader.sources.len(), 1);
        assert_eq!(loader.sources[0].provenance(), Provenance::ObjectStorage);
    }
}
