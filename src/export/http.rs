// src/export/http.rs
//
// Plumbing shared by the HTTP-backed record stores.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::trace;

use crate::error::{BulletinError, Result};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub fn build_client(destination: &str) -> Result<Client> {
    build_client_with(destination, REQUEST_TIMEOUT)
}

/// Client whose whole request, connect included, must finish within `timeout`.
pub fn build_client_with(destination: &str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| BulletinError::DestinationUnavailable {
            destination: destination.to_string(),
            reason: e.to_string(),
        })
}

/// Send `request`; transport failures and timeouts make the destination unavailable.
pub fn send(destination: &str, request: RequestBuilder) -> Result<Response> {
    request.send().map_err(|e| {
        let reason = if e.is_timeout() {
            format!("timed out: {e}")
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            e.to_string()
        };
        BulletinError::DestinationUnavailable {
            destination: destination.to_string(),
            reason,
        }
    })
}

/// 2xx means the record exists, 404 that it does not.
pub fn exists_from_status(destination: &str, status: StatusCode) -> Result<bool> {
    trace!(destination, %status, "existence check");
    if status.is_success() {
        Ok(true)
    } else if status == StatusCode::NOT_FOUND {
        Ok(false)
    } else {
        Err(BulletinError::DestinationRejected {
            destination: destination.to_string(),
            status: status.as_u16(),
        })
    }
}

/// A failed `If-None-Match: *` precondition means the key is already taken.
pub fn check_put_status(destination: &str, key: &str, status: StatusCode) -> Result<()> {
    trace!(destination, key, %status, "record written");
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::PRECONDITION_FAILED {
        Err(BulletinError::DuplicateRecord {
            destination: destination.to_string(),
            key: key.to_string(),
        })
    } else {
        Err(BulletinError::DestinationRejected {
            destination: destination.to_string(),
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn status_mapping() {
        assert!(exists_from_status("d", StatusCode::OK).unwrap());
        assert!(!exists_from_status("d", StatusCode::NOT_FOUND).unwrap());
        assert!(matches!(
            exists_from_status("d", StatusCode::UNAUTHORIZED),
            Err(BulletinError::DestinationRejected { status: 401, .. })
        ));

        assert!(check_put_status("d", "k", StatusCode::CREATED).is_ok());
        assert!(matches!(
            check_put_status("d", "k", StatusCode::PRECONDITION_FAILED),
            Err(BulletinError::DuplicateRecord { key, .. }) if key == "k"
        ));
        assert!(matches!(
            check_put_status("d", "k", StatusCode::INTERNAL_SERVER_ERROR),
            Err(BulletinError::DestinationRejected { status: 500, .. })
        ));
    }

    #[test]
    fn slow_destination_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rows/k");
            then.status(200).delay(Duration::from_millis(1_500));
        });

        let client = build_client_with("slow", Duration::from_millis(200)).unwrap();
        let err = send("slow", client.get(server.url("/rows/k"))).unwrap_err();
        match err {
            BulletinError::DestinationUnavailable { destination, reason } => {
                assert_eq!(destination, "slow");
                assert!(reason.starts_with("timed out"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn refused_connection_is_unavailable() {
        let client = build_client("local").unwrap();
        let err = send("local", client.get("http://127.0.0.1:9/")).unwrap_err();
        assert!(matches!(err, BulletinError::DestinationUnavailable { .. }));
    }
}
