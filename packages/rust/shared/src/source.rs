//! Source locations and the shared HTTP client.
//!
//! Both build inputs are either fetched over HTTP or read from a local
//! copy. Either way a failure to obtain the content is fatal for the build.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{MimegenError, Result};

/// User-Agent string for all build requests.
const USER_AGENT: &str = concat!("mimegen/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Where a build input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Fetched with an HTTP GET.
    Remote(Url),
    /// Read from disk.
    Local(PathBuf),
}

impl FromStr for Source {
    type Err = MimegenError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MimegenError::config("source location is empty"));
        }

        if s.starts_with("http://") || s.starts_with("https://") {
            let url = Url::parse(s)
                .map_err(|e| MimegenError::config(format!("invalid source URL '{s}': {e}")))?;
            return Ok(Self::Remote(url));
        }

        if s.starts_with("file://") {
            let path = Url::parse(s)
                .ok()
                .and_then(|u| u.to_file_path().ok())
                .ok_or_else(|| MimegenError::config(format!("invalid file URL '{s}'")))?;
            return Ok(Self::Local(path));
        }

        Ok(Self::Local(PathBuf::from(s)))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Source {
    /// Fetch or read the whole content. Any failure is fatal.
    pub async fn read_to_string(&self, client: &Client) -> Result<String> {
        match self {
            Self::Remote(url) => fetch_required(client, url).await,
            Self::Local(path) => {
                debug!(path = %path.display(), "reading local source");
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| MimegenError::io(path, e))
            }
        }
    }
}

/// Build the reqwest client shared by every phase of a build.
pub fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| MimegenError::Network(format!("failed to build HTTP client: {e}")))
}

/// GET a URL whose content the build cannot do without.
///
/// Transport errors and non-success statuses both map to
/// [`MimegenError::Network`].
pub async fn fetch_required(client: &Client, url: &Url) -> Result<String> {
    debug!(%url, "fetching");

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| MimegenError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(MimegenError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| MimegenError::Network(format!("{url}: failed to read body: {e}")))
}
