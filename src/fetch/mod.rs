// src/fetch/mod.rs
//
// Retrieval of bulletin workbooks published over HTTP.

use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::{
    fs,
    path::{Path, PathBuf},
    thread::sleep,
    time::Duration,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{BulletinError, Result};

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_FILE_NAME: &str = "bulletin.xlsx";

fn unavailable(url: &str, reason: impl ToString) -> BulletinError {
    BulletinError::SourceUnavailable {
        path: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Client for index pages and downloads; keeps cookies between requests.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .cookie_store(true)
        .gzip(true)
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(120))
        .build()
        .map_err(|e| unavailable("http client", e))
}

/// Download the workbook at `url` into `dest_dir`, named after the last URL
/// path segment. Returns the saved path.
#[tracing::instrument(level = "info", skip(client, dest_dir))]
pub fn download_bulletin(client: &Client, url: &str, dest_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    let parsed = Url::parse(url).map_err(|e| unavailable(url, e))?;
    let filename = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILE_NAME);
    let dest_path = dest_dir.join(filename);

    fs::create_dir_all(dest_dir).map_err(|e| BulletinError::io(dest_dir, e))?;

    let resp = client
        .get(parsed.as_str())
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| unavailable(url, e))?;
    let bytes = resp.bytes().map_err(|e| unavailable(url, e))?;
    fs::write(&dest_path, &bytes).map_err(|e| BulletinError::io(&dest_path, e))?;

    info!(path = %dest_path.display(), bytes = bytes.len(), "bulletin downloaded");
    Ok(dest_path)
}

/// Links to `.xlsx` files on the page at `index_url`, resolved against it,
/// in page order and without repeats.
#[tracing::instrument(level = "info", skip(client))]
pub fn find_bulletin_links(client: &Client, index_url: &str) -> Result<Vec<Url>> {
    let base = Url::parse(index_url).map_err(|e| unavailable(index_url, e))?;
    let selector = Selector::parse("a[href]").expect("Invalid CSS selector for anchors");

    let mut attempt = 0;
    // retry loop
    let html = loop {
        attempt += 1;
        let resp = client.get(base.as_str()).send();
        match resp {
            Ok(resp) if resp.status().is_success() => match resp.text() {
                Ok(html) => break html,
                Err(e) if attempt < MAX_RETRIES => {
                    warn!(attempt, error = %e, "reading index page failed, retrying");
                    sleep(RETRY_DELAY);
                }
                Err(e) => return Err(unavailable(index_url, e)),
            },
            Err(e) if attempt < MAX_RETRIES => {
                warn!(attempt, error = %e, "fetching index page failed, retrying");
                sleep(RETRY_DELAY);
            }
            Ok(resp) => {
                return Err(unavailable(index_url, format!("HTTP error: {}", resp.status())))
            }
            Err(e) => return Err(unavailable(index_url, e)),
        }
    };

    let mut links: Vec<Url> = Vec::new();
    for href in Html::parse_document(&html)
        .select(&selector)
        .filter_map(|e| e.value().attr("href"))
    {
        let Ok(url) = base.join(href.trim()) else {
            continue;
        };
        if url.path().to_lowercase().ends_with(".xlsx") && !links.contains(&url) {
            links.push(url);
        }
    }
    debug!(count = links.len(), "bulletin links found");
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn finds_xlsx_links_only() {
        let server = MockServer::start();
        let page = server.mock(|when, then| {
            when.method(GET).path("/boletins");
            then.status(200).body(
                r#"<html><body>
                <a href="arquivos/boletim-2020-08-11.xlsx">11/08</a>
                <a href="/arquivos/BOLETIM-2020-08-04.XLSX">04/08</a>
                <a href="arquivos/boletim-2020-08-11.xlsx">again</a>
                <a href="relatorio.pdf">pdf</a>
                <a href="https://cdn.example.org/b.xlsx?download=1">cdn</a>
                <a>no href</a>
                </body></html>"#,
            );
        });

        let client = build_client().unwrap();
        let links = find_bulletin_links(&client, &server.url("/boletins")).unwrap();
        page.assert();

        let links: Vec<String> = links.into_iter().map(|u| u.to_string()).collect();
        assert_eq!(
            links,
            vec![
                server.url("/arquivos/boletim-2020-08-11.xlsx"),
                server.url("/arquivos/BOLETIM-2020-08-04.XLSX"),
                "https://cdn.example.org/b.xlsx?download=1".to_string(),
            ]
        );
    }

    #[test]
    fn index_errors_are_source_unavailable() {
        let server = MockServer::start();
        let gone = server.mock(|when, then| {
            when.method(GET).path("/boletins");
            then.status(500);
        });
        let client = build_client().unwrap();
        let err = find_bulletin_links(&client, &server.url("/boletins")).unwrap_err();
        assert!(matches!(err, BulletinError::SourceUnavailable { .. }));
        gone.assert_calls(1);
    }

    #[test]
    fn downloads_under_url_file_name() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/arquivos/boletim.xlsx");
            then.status(200).body("PK-bytes");
        });
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("PK-root");
        });

        let dir = tempdir().unwrap();
        let client = build_client().unwrap();
        let path =
            download_bulletin(&client, &server.url("/arquivos/boletim.xlsx"), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("boletim.xlsx"));
        assert_eq!(fs::read(&path).unwrap(), b"PK-bytes");

        let path = download_bulletin(&client, &server.url("/"), dir.path().join("sub")).unwrap();
        assert_eq!(path, dir.path().join("sub").join(DEFAULT_FILE_NAME));
    }

    #[test]
    fn missing_download_is_source_unavailable() {
        let server = MockServer::start();
        let dir = tempdir().unwrap();
        let client = build_client().unwrap();
        let err =
            download_bulletin(&client, &server.url("/nada.xlsx"), dir.path()).unwrap_err();
        assert!(matches!(err, BulletinError::SourceUnavailable { .. }));
        assert!(!dir.path().join("nada.xlsx").exists());
    }
}
