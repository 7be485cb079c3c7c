// src/export/document.rs

use reqwest::blocking::{Client, RequestBuilder};
use std::env;
use tracing::debug;
use url::Url;

use super::http::{build_client, check_put_status, exists_from_status, send};
use super::store::{IdentityStrategy, RecordStore};
use crate::error::{BulletinError, Result};
use crate::schema::Record;

pub const URL_ENV: &str = "SEAP_DOCSTORE_URL";

/// Document database behind a REST endpoint: one document per `_id` under
/// `{connection}/{database}/{collection}/{_id}`, collection = table name.
pub struct DocumentStore {
    client: Client,
    base: String,
    credentials: Option<(String, Option<String>)>,
    database: String,
    identity: IdentityStrategy,
}

impl DocumentStore {
    /// `connection` falls back to `SEAP_DOCSTORE_URL`. Userinfo in the URL is
    /// sent as basic auth and never logged.
    pub fn new(connection: Option<&str>, database: &str, source: &str) -> Result<Self> {
        let connection = match connection {
            Some(c) => c.to_string(),
            None => env::var(URL_ENV).map_err(|_| {
                BulletinError::MissingCredential(format!(
                    "no document store connection given and {URL_ENV} is not set"
                ))
            })?,
        };
        let mut url = Url::parse(&connection)
            .map_err(|e| BulletinError::Config(format!("document store url: {e}")))?;

        let credentials = if url.username().is_empty() {
            None
        } else {
            Some((
                url.username().to_string(),
                url.password().map(str::to_string),
            ))
        };
        // only fails for cannot-be-a-base urls, which have no userinfo anyway
        let _ = url.set_username("");
        let _ = url.set_password(None);
        let base = url.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            client: build_client(&base)?,
            base,
            credentials,
            database: database.to_string(),
            identity: IdentityStrategy::facility_date_source(source),
        })
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}/{}", self.base, self.database, collection, id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, password.as_ref()),
            None => request,
        }
    }
}

impl RecordStore for DocumentStore {
    fn name(&self) -> &str {
        &self.base
    }

    fn identity(&self) -> &IdentityStrategy {
        &self.identity
    }

    fn exists(&self, table: &str, key: &str) -> Result<bool> {
        let request = self.authorize(self.client.get(self.document_url(table, key)));
        let response = send(&self.base, request)?;
        exists_from_status(&self.base, response.status())
    }

    fn put(&self, table: &str, key: &str, record: &Record, overwrite: bool) -> Result<()> {
        let url = self.document_url(table, key);
        debug!(%url, overwrite, "putting document");
        let mut request = self.authorize(self.client.put(url)).json(record);
        if !overwrite {
            request = request.header("If-None-Match", "*");
        }
        let response = send(&self.base, request)?;
        check_put_status(&self.base, key, response.status())
    }
}
