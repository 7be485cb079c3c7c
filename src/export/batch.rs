// src/export/batch.rs
//
// Runs over many bulletins and destinations where one failure is counted and
// logged, never fatal to the rest.

use std::path::PathBuf;
use tracing::{error, info};

use super::file::{export_file, FileExportOptions};
use super::store::{export_to_store, ExistPolicy, RecordStore};
use crate::bulletin::Bulletin;
use crate::config::BulletinConfig;
use crate::process::ExplicitDate;
use crate::schema::TableName;

/// Where and how one bulletin's tables go.
pub struct ExportPlan<'a> {
    pub tables: &'a [TableName],
    /// Output template for file exports; `None` skips files.
    pub template: Option<&'a str>,
    pub options: FileExportOptions,
    pub stores: &'a [Box<dyn RecordStore>],
    pub policy: ExistPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub inputs: usize,
    pub failed_inputs: usize,
    pub failed_exports: usize,
}

/// Export every planned table of `bulletin` to every destination. Returns how
/// many table exports failed.
pub fn export_tables(bulletin: &Bulletin, plan: &ExportPlan<'_>) -> usize {
    let mut failures = 0;
    for &table in plan.tables {
        if let Some(template) = plan.template {
            match export_file(bulletin, table, template, &plan.options) {
                Ok(path) => info!(%table, path = %path.display(), "file written"),
                Err(e) => {
                    error!(%table, error = %e, "file export failed");
                    failures += 1;
                }
            }
        }
        for store in plan.stores {
            match export_to_store(store.as_ref(), bulletin, table, plan.policy) {
                Ok(summary) => info!(
                    %table,
                    destination = store.name(),
                    written = summary.written,
                    overwritten = summary.overwritten,
                    skipped = summary.skipped,
                    "store export done"
                ),
                Err(e) => {
                    error!(%table, destination = store.name(), error = %e, "store export failed");
                    failures += 1;
                }
            }
        }
    }
    failures
}

/// Parse each workbook in `paths` and export it. A bulletin that cannot be
/// read or normalized is counted and skipped.
#[tracing::instrument(level = "info", skip_all, fields(inputs = paths.len()))]
pub fn export_bulletins(
    paths: &[PathBuf],
    explicit: Option<&ExplicitDate>,
    config: &BulletinConfig,
    plan: &ExportPlan<'_>,
) -> RunSummary {
    let mut summary = RunSummary {
        inputs: paths.len(),
        ..Default::default()
    };
    for path in paths {
        match Bulletin::from_path(path, explicit.cloned(), config) {
            Ok(bulletin) => summary.failed_exports += export_tables(&bulletin, plan),
            Err(e) => {
                error!(path = %path.display(), error = %e, "bulletin rejected");
                summary.failed_inputs += 1;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BulletinError, Result};
    use crate::export::store::tests::MemoryStore;
    use crate::export::IdentityStrategy;
    use crate::process::fixtures::{init_test_logging, sample_sheet, write_sample_bulletin};
    use crate::schema::Record;
    use tempfile::tempdir;

    /// Refuses every write to one table.
    struct BrokenTable {
        inner: MemoryStore,
        broken: &'static str,
    }

    impl RecordStore for BrokenTable {
        fn name(&self) -> &str {
            "broken"
        }

        fn identity(&self) -> &IdentityStrategy {
            self.inner.identity()
        }

        fn exists(&self, table: &str, key: &str) -> Result<bool> {
            self.inner.exists(table, key)
        }

        fn put(&self, table: &str, key: &str, record: &Record, overwrite: bool) -> Result<()> {
            if table == self.broken {
                return Err(BulletinError::DestinationRejected {
                    destination: "broken".to_string(),
                    status: 503,
                });
            }
            self.inner.put(table, key, record, overwrite)
        }
    }

    fn bulletin() -> Bulletin {
        Bulletin::from_sheet(sample_sheet(), None, &BulletinConfig::default()).unwrap()
    }

    #[test]
    fn one_failing_table_does_not_stop_the_rest() {
        init_test_logging();
        let dir = tempdir().unwrap();
        let template = dir.path().join("boletim_[DD].csv");
        let template = template.to_str().unwrap();

        let broken = BrokenTable {
            inner: MemoryStore::new(IdentityStrategy::content_hash()),
            broken: TableName::Capacity.as_str(),
        };
        let healthy = MemoryStore::new(IdentityStrategy::content_hash());
        let stores: Vec<Box<dyn RecordStore>> = vec![Box::new(broken), Box::new(healthy)];
        let tables = [TableName::Facilities, TableName::Capacity, TableName::Occupancy];
        let plan = ExportPlan {
            tables: &tables,
            template: Some(template),
            options: FileExportOptions::default(),
            stores: &stores,
            policy: ExistPolicy::Ignore,
        };

        let bulletin = bulletin();
        assert_eq!(export_tables(&bulletin, &plan), 1);

        for table in tables {
            let file = dir.path().join(format!("boletim_11_{table}.csv"));
            assert!(file.exists(), "{}", file.display());
        }
        // the broken store still holds the tables it accepts
        let expected = bulletin.facilities().len() + bulletin.occupancy().len();
        let counts: Vec<usize> = stores
            .iter()
            .map(|s| {
                tables
                    .iter()
                    .map(|t| {
                        let frame = bulletin.frame(*t).unwrap();
                        let keyed = s.identity().keyed_records(frame, bulletin.date()).unwrap();
                        keyed
                            .iter()
                            .filter(|(k, _)| s.exists(t.as_str(), k).unwrap())
                            .count()
                    })
                    .sum()
            })
            .collect();
        assert_eq!(counts[0], expected);
        assert_eq!(counts[1], expected + bulletin.capacity().len());
    }

    #[test]
    fn rejected_bulletin_does_not_stop_the_others() {
        init_test_logging();
        let dir = tempdir().unwrap();
        let good = dir.path().join("boletim.xlsx");
        write_sample_bulletin(&good).unwrap();
        let paths = vec![dir.path().join("missing.xlsx"), good];

        let store = MemoryStore::new(IdentityStrategy::content_hash());
        let stores: Vec<Box<dyn RecordStore>> = vec![Box::new(store)];
        let tables = [TableName::Facilities];
        let plan = ExportPlan {
            tables: &tables,
            template: None,
            options: FileExportOptions::default(),
            stores: &stores,
            policy: ExistPolicy::Fail,
        };

        let summary = export_bulletins(&paths, None, &BulletinConfig::default(), &plan);
        assert_eq!(
            summary,
            RunSummary {
                inputs: 2,
                failed_inputs: 1,
                failed_exports: 0,
            }
        );
    }
}
