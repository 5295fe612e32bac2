//! Shared plumbing for the JSON web services the reports talk to.

use reqwest::{header::ACCEPT, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// A failed GET against one of the remote services.
///
/// URLs are stored without their query string, so access keys never end up in
/// error messages or logs.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: StatusCode },
    #[error("malformed response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HttpError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Fetches `url` and decodes the JSON body as `T`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
) -> Result<T, HttpError> {
    let shown = redacted(&url);
    debug!(url = %shown, "GET");
    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| HttpError::Request {
            url: shown.clone(),
            source: e.without_url(),
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(HttpError::Status { url: shown, status });
    }
    let body = response.text().await.map_err(|e| HttpError::Request {
        url: shown.clone(),
        source: e.without_url(),
    })?;
    serde_json::from_str(&body).map_err(|source| HttpError::Decode { url: shown, source })
}

/// Makes `url` usable as a base for [`Url::join`] and [`endpoint`].
pub(crate) fn service_root(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url
}

/// Appends path `segments` to `root`, percent-encoding each one.
pub(crate) fn endpoint(root: &Url, segments: &[&str]) -> Url {
    let mut url = root.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}
