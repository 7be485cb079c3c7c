// src/export/store.rs

use chrono::NaiveDate;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::{collections::HashSet, fmt, str::FromStr};
use tracing::{debug, info, warn};

use crate::bulletin::Bulletin;
use crate::config::{fields, SEAP_SOURCE};
use crate::error::{BulletinError, Result};
use crate::process::utils::hex;
use crate::schema::{Frame, Record, TableName};

/// Column holding the record key in document stores.
pub const DOCUMENT_KEY: &str = "_id";

/// What to do when a record's identity already exists at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistPolicy {
    /// Abort before writing anything.
    Fail,
    /// Leave the stored record alone.
    Ignore,
    /// Replace the stored record.
    Overwrite,
}

impl FromStr for ExistPolicy {
    type Err = BulletinError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(ExistPolicy::Fail),
            "ignore" => Ok(ExistPolicy::Ignore),
            "force" | "update" => Ok(ExistPolicy::Overwrite),
            _ => Err(BulletinError::InvalidPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ExistPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExistPolicy::Fail => "fail",
            ExistPolicy::Ignore => "ignore",
            ExistPolicy::Overwrite => "force",
        })
    }
}

/// How a destination derives a record's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityStrategy {
    /// Key is the SHA-256 of the whole date-stamped row, stored in `hash_column`.
    ContentHash {
        date_column: String,
        hash_column: String,
    },
    /// Key is the SHA-256 of `{unidadeId, date, source}`, stored as `_id`.
    FacilityDateSource {
        date_column: String,
        source_column: String,
        source: String,
    },
}

impl IdentityStrategy {
    pub fn content_hash() -> Self {
        IdentityStrategy::ContentHash {
            date_column: "registroData".to_string(),
            hash_column: "registroSHA256".to_string(),
        }
    }

    pub fn facility_date_source(source: &str) -> Self {
        IdentityStrategy::FacilityDateSource {
            date_column: "registroData".to_string(),
            source_column: "registroFonte".to_string(),
            source: source.to_string(),
        }
    }

    /// Stamp the frame and return each row with its key, in row order.
    pub fn keyed_records(&self, frame: Frame, date: NaiveDate) -> Result<Vec<(String, Record)>> {
        let stamp = Value::String(date.format("%Y-%m-%d").to_string());
        match self {
            IdentityStrategy::ContentHash {
                date_column,
                hash_column,
            } => {
                let frame = frame.with_column(date_column, stamp);
                let mut out = Vec::with_capacity(frame.len());
                for mut row in frame.rows {
                    let key = sha256_hex(&serde_json::to_vec(&row)?);
                    row.insert(hash_column.clone(), Value::String(key.clone()));
                    out.push((key, row));
                }
                Ok(out)
            }
            IdentityStrategy::FacilityDateSource {
                date_column,
                source_column,
                source,
            } => {
                let frame = frame
                    .with_column(date_column, stamp)
                    .with_column(source_column, Value::String(source.clone()));
                let mut out = Vec::with_capacity(frame.len());
                for mut row in frame.rows {
                    let mut identity = Map::new();
                    for column in [fields::ID, date_column.as_str(), source_column.as_str()] {
                        let value = row.get(column).cloned().unwrap_or(Value::Null);
                        identity.insert(column.to_string(), value);
                    }
                    let key = sha256_hex(&serde_json::to_vec(&identity)?);
                    row.insert(DOCUMENT_KEY.to_string(), Value::String(key.clone()));
                    out.push((key, row));
                }
                Ok(out)
            }
        }
    }
}

impl Default for IdentityStrategy {
    fn default() -> Self {
        Self::facility_date_source(SEAP_SOURCE)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex(&Sha256::digest(bytes))
}

/// Keyed record storage one destination kind implements.
pub trait RecordStore {
    /// Label used in logs and errors.
    fn name(&self) -> &str;

    fn identity(&self) -> &IdentityStrategy;

    fn exists(&self, table: &str, key: &str) -> Result<bool>;

    /// Store `record` under `key`. Without `overwrite` an existing record is a
    /// `DuplicateRecord` error.
    fn put(&self, table: &str, key: &str, record: &Record, overwrite: bool) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub table: String,
    pub written: usize,
    pub overwritten: usize,
    pub skipped: usize,
}

/// Push one bulletin table into `store`, row at a time.
///
/// Not transactional: an error mid-way leaves the rows already written. Under
/// `ExistPolicy::Fail` every key is checked before the first write.
#[tracing::instrument(level = "info", skip(store, bulletin), fields(destination = store.name()))]
pub fn export_to_store<S: RecordStore + ?Sized>(
    store: &S,
    bulletin: &Bulletin,
    table: TableName,
    policy: ExistPolicy,
) -> Result<ExportSummary> {
    let frame = bulletin.frame(table)?;
    let records = store.identity().keyed_records(frame, bulletin.date())?;
    let table_name = table.as_str();

    if policy == ExistPolicy::Fail {
        let mut batch = HashSet::with_capacity(records.len());
        for (key, _) in &records {
            if !batch.insert(key.as_str()) || store.exists(table_name, key)? {
                return Err(BulletinError::DuplicateRecord {
                    destination: store.name().to_string(),
                    key: key.clone(),
                });
            }
        }
        debug!(records = records.len(), "no existing keys found");
    }

    let mut summary = ExportSummary {
        table: table_name.to_string(),
        ..Default::default()
    };
    for (key, record) in &records {
        match policy {
            ExistPolicy::Fail => {
                store.put(table_name, key, record, false)?;
                summary.written += 1;
            }
            ExistPolicy::Ignore => {
                if store.exists(table_name, key)? {
                    summary.skipped += 1;
                } else {
                    store.put(table_name, key, record, false)?;
                    summary.written += 1;
                }
            }
            ExistPolicy::Overwrite => {
                let existed = store.exists(table_name, key)?;
                store.put(table_name, key, record, true)?;
                if existed {
                    summary.overwritten += 1;
                } else {
                    summary.written += 1;
                }
            }
        }
    }

    if summary.skipped > 0 {
        warn!(
            table = table_name,
            skipped = summary.skipped,
            "records already present were skipped"
        );
    }
    info!(
        table = table_name,
        written = summary.written,
        overwritten = summary.overwritten,
        "store export finished"
    );
    Ok(summary)
}
