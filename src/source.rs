//! Document identities and byte sources.
//!
//! A reference to another document is turned into a [`DocumentId`] relative
//! to the including document, then read from the first source that has it:
//!
//! ```text
//! local path                 → the file
//! well-known profile URL     → <profile_dir>/<file>, then the bundled copy
//! other URL                  → <profile_dir>/<sha256(url)>.xmi, then the
//!                              Fetcher (written through to the store)
//! ```
//!
//! The default fetcher is [`HttpFetcher`] (feature `http`, on by default);
//! [`OfflineFetcher`] refuses the network.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
#[cfg(feature = "http")]
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::base::constants::PROFILE_URL_PREFIXES;
use crate::config::LoaderConfig;
use crate::error::ModelError;

#[cfg(feature = "http")]
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Profiles shipped with the crate, by file name.
const BUNDLED_PROFILES: &[(&str, &str)] = &[(
    "default-uml14.xmi",
    include_str!("../data/profiles/default-uml14.xmi"),
)];

// ============================================================================
// IDENTITY
// ============================================================================

/// Resolved identity of a document, the memoization key of a session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentId {
    /// Local file (canonical when it exists).
    Path(PathBuf),
    /// Network location.
    Url(String),
    /// In-memory document, named by the caller.
    Inline(String),
}

impl DocumentId {
    /// Identify `reference` as seen from the document `from`.
    ///
    /// `file://` URLs become paths; relative references resolve against the
    /// including document's location.
    pub fn identify(reference: &str, from: Option<&DocumentId>) -> Self {
        if is_url(reference) {
            return DocumentId::Url(reference.to_string());
        }
        if let Some(path) = reference.strip_prefix("file://") {
            return DocumentId::from_path(path);
        }
        let path = Path::new(reference);
        if path.is_absolute() {
            return DocumentId::from_path(path);
        }
        match from {
            Some(DocumentId::Url(base)) => {
                let dir = base.rsplit_once('/').map(|(dir, _)| dir).unwrap_or(base);
                DocumentId::Url(format!("{dir}/{reference}"))
            }
            Some(DocumentId::Path(base)) => {
                let dir = base.parent().unwrap_or(Path::new(""));
                DocumentId::from_path(dir.join(path))
            }
            Some(DocumentId::Inline(_)) | None => DocumentId::from_path(path),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        DocumentId::Path(fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()))
    }

    pub fn is_url(&self) -> bool {
        matches!(self, DocumentId::Url(_))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Path(path) => write!(f, "{}", path.display()),
            DocumentId::Url(url) => f.write_str(url),
            DocumentId::Inline(name) => f.write_str(name),
        }
    }
}

fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

// ============================================================================
// FETCHING
// ============================================================================

/// Source of network documents.
pub trait Fetcher: fmt::Debug {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ModelError>;
}

/// Refuses every network access.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineFetcher;

impl Fetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ModelError> {
        Err(ModelError::fetch(url, "network access is disabled"))
    }
}

/// Blocking HTTP(S) GET; non-success statuses are fetch errors.
#[cfg(feature = "http")]
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: Option<reqwest::blocking::Client>,
    timeout: Duration,
}

#[cfg(feature = "http")]
impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            client: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, headers, TLS roots).
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self {
            client: Some(client),
            ..Self::default()
        }
    }

    /// Timeout of the client built on demand.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn client(&self, url: &str) -> Result<reqwest::blocking::Client, ModelError> {
        match &self.client {
            Some(client) => Ok(client.clone()),
            None => reqwest::blocking::Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| ModelError::fetch(url, e.to_string())),
        }
    }
}

#[cfg(feature = "http")]
impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ModelError> {
        tracing::debug!(url, "fetching");
        let response = self
            .client(url)?
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| ModelError::fetch(url, e.to_string()))?;
        let bytes = response
            .bytes()
            .map_err(|e| ModelError::fetch(url, e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Fetcher of a default session: HTTP when built with it, else offline.
pub fn default_fetcher() -> Box<dyn Fetcher> {
    #[cfg(feature = "http")]
    {
        Box::new(HttpFetcher::new())
    }
    #[cfg(not(feature = "http"))]
    {
        Box::new(OfflineFetcher)
    }
}

/// File name of a well-known profile URL.
pub fn profile_file_name(url: &str) -> Option<&str> {
    PROFILE_URL_PREFIXES
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))
        .and_then(|rest| rest.rsplit('/').next())
        .filter(|name| !name.is_empty())
}

/// Store file name of a fetched URL.
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{}.xmi", hex::encode(hasher.finalize()))
}

/// Read the bytes of a document.
pub fn read_document(id: &DocumentId, config: &LoaderConfig) -> Result<Vec<u8>, ModelError> {
    match id {
        DocumentId::Path(path) => Ok(fs::read(path)?),
        DocumentId::Url(url) => match profile_file_name(url) {
            Some(file) => read_profile(url, file, config),
            None => read_url(url, config),
        },
        DocumentId::Inline(name) => Err(ModelError::NotFound(format!(
            "in-memory document {name} has no source"
        ))),
    }
}

fn read_profile(url: &str, file: &str, config: &LoaderConfig) -> Result<Vec<u8>, ModelError> {
    let mut searched = Vec::new();
    if let Some(dir) = &config.profile_dir {
        let path = dir.join(file);
        if path.is_file() {
            tracing::debug!(url, path = %path.display(), "profile from local store");
            return Ok(fs::read(&path)?);
        }
        searched.push(path);
    }
    if config.bundled_profiles {
        if let Some((_, text)) = BUNDLED_PROFILES.iter().find(|(name, _)| *name == file) {
            tracing::debug!(url, "bundled profile");
            return Ok(text.as_bytes().to_vec());
        }
        searched.push(PathBuf::from("<bundled>").join(file));
    }
    Err(ModelError::ProfileNotFound {
        url: url.to_string(),
        searched,
    })
}

fn read_url(url: &str, config: &LoaderConfig) -> Result<Vec<u8>, ModelError> {
    let cached = config.profile_dir.as_ref().map(|dir| dir.join(cache_key(url)));
    if let Some(path) = &cached {
        if path.is_file() {
            tracing::debug!(url, path = %path.display(), "document already fetched");
            return Ok(fs::read(path)?);
        }
    }
    let bytes = config.fetcher.fetch(url)?;
    if let Some(path) = &cached {
        if let Err(e) = store(path, &bytes) {
            tracing::warn!(url, path = %path.display(), error = %e, "cannot cache fetched document");
        }
    }
    Ok(bytes)
}

fn store(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, bytes)
}
