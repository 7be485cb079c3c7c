// src/export/table_service.rs

use reqwest::blocking::Client;
use std::env;
use tracing::debug;
use url::Url;

use super::http::{build_client, check_put_status, exists_from_status, send};
use super::store::{IdentityStrategy, RecordStore};
use crate::error::{BulletinError, Result};
use crate::schema::Record;

pub const TOKEN_ENV: &str = "SEAP_TABLES_TOKEN";

/// Explicit token first, then the environment; blank values do not count.
pub fn resolve_token(explicit: Option<String>, from_env: Option<String>) -> Result<String> {
    explicit
        .filter(|t| !t.trim().is_empty())
        .or_else(|| from_env.filter(|t| !t.trim().is_empty()))
        .ok_or_else(|| {
            BulletinError::MissingCredential(format!(
                "no table service token given and {TOKEN_ENV} is not set"
            ))
        })
}

/// Hosted data-table service: one row per key under
/// `{base}/tables/{table}/rows/{key}`, keyed by content hash.
pub struct TableServiceStore {
    client: Client,
    base: String,
    token: String,
    table: Option<String>,
    identity: IdentityStrategy,
}

impl TableServiceStore {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let token = resolve_token(token, env::var(TOKEN_ENV).ok())?;
        let base = Url::parse(base_url)
            .map_err(|e| BulletinError::Config(format!("table service url '{base_url}': {e}")))?;
        let base = base.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            client: build_client(&base)?,
            base,
            token,
            table: None,
            identity: IdentityStrategy::content_hash(),
        })
    }

    /// Write every bulletin table into `table` instead of one table per name.
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    fn row_url(&self, table: &str, key: &str) -> String {
        let table = self.table.as_deref().unwrap_or(table);
        format!("{}/tables/{}/rows/{}", self.base, table, key)
    }
}

impl RecordStore for TableServiceStore {
    fn name(&self) -> &str {
        &self.base
    }

    fn identity(&self) -> &IdentityStrategy {
        &self.identity
    }

    fn exists(&self, table: &str, key: &str) -> Result<bool> {
        let request = self
            .client
            .get(self.row_url(table, key))
            .bearer_auth(&self.token);
        let response = send(&self.base, request)?;
        exists_from_status(&self.base, response.status())
    }

    fn put(&self, table: &str, key: &str, record: &Record, overwrite: bool) -> Result<()> {
        let url = self.row_url(table, key);
        debug!(%url, overwrite, "putting row");
        let mut request = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .json(record);
        if !overwrite {
            request = request.header("If-None-Match", "*");
        }
        let response = send(&self.base, request)?;
        check_put_status(&self.base, key, response.status())
    }
}
