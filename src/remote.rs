//! WebDAV client for the remote snapshot directory.
//!
//! One store instance talks to exactly one remote collection. Listing uses
//! PROPFIND with depth 1, uploads PUT directly to the final name, downloads
//! stream to a caller-provided local path.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use reqwest::{Client, Method, StatusCode};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::config::RemoteConfig;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} for {name}")]
    Status { status: StatusCode, name: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client for a single remote snapshot collection.
pub struct RemoteStore {
    base_url: String,
    user: String,
    password: String,
    client: Client,
}

impl RemoteStore {
    /// Build a client for `<url>/<dir>/`. Absent configuration never reaches
    /// this point; standalone mode is decided by [`crate::Config`].
    pub fn connect(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let base_url = format!(
            "{}/{}/",
            config.url.trim_end_matches('/'),
            config.dir.trim_matches('/')
        );
        Ok(Self {
            base_url,
            user: config.user.clone(),
            password: config.password.clone(),
            client: Client::builder().build()?,
        })
    }

    /// Make sure the remote collection exists: list it, and if that fails try
    /// to create it. A second failure is logged and swallowed; later calls
    /// keep failing until an operator fixes remote access.
    pub async fn ensure_reachable(&self) {
        if self.propfind().await.is_ok() {
            return;
        }
        info!(url = %self.base_url, "remote directory missing, creating");
        if let Err(err) = self.mkcol().await {
            warn!(
                error = %err,
                url = %self.base_url,
                "could not create remote directory, continuing degraded"
            );
        }
    }

    /// Entry names in the remote collection, unordered. The collection itself
    /// and nested collections are excluded.
    pub async fn list(&self) -> Result<Vec<String>, RemoteError> {
        let body = self.propfind().await?;
        Ok(parse_href_names(&body))
    }

    /// Upload a local file under `name`. The upload targets the final name
    /// directly; there is no partial-name visibility contract to rely on.
    pub async fn upload(&self, local: &Path, name: &str) -> Result<(), RemoteError> {
        let file = tokio::fs::File::open(local).await?;
        let response = self
            .client
            .put(self.entry_url(name))
            .basic_auth(&self.user, Some(&self.password))
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;
        check(response.status(), name)
    }

    /// Download `name` to a local path. Only a success status leaves a fully
    /// written file behind.
    pub async fn download(&self, name: &str, local: &Path) -> Result<(), RemoteError> {
        let mut response = self
            .client
            .get(self.entry_url(name))
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;
        check(response.status(), name)?;

        let mut file = tokio::fs::File::create(local).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    pub async fn delete(&self, name: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .request(Method::DELETE, self.entry_url(name))
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;
        check(response.status(), name)
    }

    async fn propfind(&self) -> Result<String, RemoteError> {
        let method = Method::from_bytes(b"PROPFIND").expect("static method name");
        let response = self
            .client
            .request(method, &self.base_url)
            .basic_auth(&self.user, Some(&self.password))
            .header("Depth", "1")
            .send()
            .await?;
        check(response.status(), "")?;
        Ok(response.text().await?)
    }

    async fn mkcol(&self) -> Result<(), RemoteError> {
        let method = Method::from_bytes(b"MKCOL").expect("static method name");
        let response = self
            .client
            .request(method, &self.base_url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;
        check(response.status(), "")
    }

    fn entry_url(&self, name: &str) -> String {
        format!("{}{}", self.base_url, name)
    }
}

fn check(status: StatusCode, name: &str) -> Result<(), RemoteError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(RemoteError::Status {
            status,
            name: name.to_string(),
        })
    }
}

fn href_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)<[^>]*href[^>]*>([^<]+)</").expect("valid pattern"))
}

/// Leaf entry names from a PROPFIND multistatus body. Hrefs ending in `/`
/// are collections (including the listed collection itself) and are skipped.
fn parse_href_names(body: &str) -> Vec<String> {
    href_pattern()
        .captures_iter(body)
        .filter_map(|captures| {
            let href = captures[1].trim();
            if href.ends_with('/') {
                return None;
            }
            href.rsplit('/').next().map(str::to_string)
        })
        .filter(|name| !name.is_empty())
        .collect()
}
