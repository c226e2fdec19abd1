//! IANA RDAP bootstrap registry: TLD to RDAP service URLs.
//!
//! The registry is published as JSON at `https://data.iana.org/rdap/dns.json`
//! and changes rarely, so it is cached on disk and reused for up to a week.
//! Acquisition order: fresh disk cache, then network fetch (persisted back to
//! disk atomically), then a stale disk copy when the fetch fails. Only when
//! none of those produce a parseable registry does RDAP report an error.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use serde::Deserialize;

use crate::error::DothuntError;

/// Default location of the published registry.
pub const DEFAULT_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/dns.json";

/// File name of the on-disk cache inside the cache directory.
pub const CACHE_FILE: &str = "rdap-dns.json";

/// Hard cap on the bootstrap response body.
const MAX_BOOTSTRAP_BYTES: usize = 10 << 20;

/// Parsed bootstrap registry: lowercase TLD to ordered candidate base URLs.
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    tld_to_urls: HashMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct BootstrapJson {
    services: Vec<Vec<Vec<String>>>,
}

impl Bootstrap {
    /// Candidate RDAP base URLs for a TLD, in registry order.
    ///
    /// Unknown TLDs yield an empty slice.
    pub fn urls_for_tld(&self, tld: &str) -> &[String] {
        self.tld_to_urls
            .get(&tld.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of TLDs in the registry.
    pub fn len(&self) -> usize {
        self.tld_to_urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tld_to_urls.is_empty()
    }

    /// Parse the IANA bootstrap JSON.
    ///
    /// Service entries that are not a `[tlds, urls]` pair are skipped, as are
    /// blank or unparseable URLs; surviving URLs are deduplicated per TLD
    /// with their published order preserved.
    pub fn parse(bytes: &[u8]) -> Result<Self, DothuntError> {
        let raw: BootstrapJson = serde_json::from_slice(bytes)
            .map_err(|e| DothuntError::bootstrap(format!("invalid bootstrap json: {}", e)))?;

        let mut map: HashMap<String, Vec<String>> = HashMap::with_capacity(2048);
        for svc in &raw.services {
            if svc.len() != 2 {
                continue;
            }
            let (tlds, urls) = (&svc[0], &svc[1]);

            let mut clean: Vec<String> = Vec::with_capacity(urls.len());
            for u in urls {
                let u = u.trim();
                if u.is_empty() || url::Url::parse(u).is_err() {
                    continue;
                }
                if clean.iter().any(|seen| seen == u) {
                    continue;
                }
                clean.push(u.to_string());
            }

            for tld in tlds {
                let tld = tld.trim().to_lowercase();
                if tld.is_empty() {
                    continue;
                }
                map.insert(tld, clean.clone());
            }
        }

        Ok(Self { tld_to_urls: map })
    }
}

/// Default cache directory: `<user cache dir>/dothuntcli`.
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("dothuntcli"))
}

/// Load the bootstrap registry: fresh cache, then network, then stale cache.
pub(crate) async fn load_bootstrap(
    http: &reqwest::Client,
    src_url: &str,
    cache_path: Option<&Path>,
    ttl: Duration,
) -> Result<Bootstrap, DothuntError> {
    if let Some(path) = cache_path {
        if cache_is_fresh(path, ttl) {
            if let Some(bs) = read_cache(path) {
                tracing::debug!(path = %path.display(), tlds = bs.len(), "rdap bootstrap loaded from cache");
                return Ok(bs);
            }
        }
    }

    let body = match fetch_bootstrap(http, src_url).await {
        Ok(body) => body,
        Err(err) => {
            // A stale copy beats no registry at all.
            if let Some(bs) = cache_path.and_then(read_cache) {
                tracing::warn!(error = %err, "rdap bootstrap fetch failed, using stale cache");
                return Ok(bs);
            }
            return Err(err);
        }
    };

    let bs = Bootstrap::parse(&body)?;

    if let Some(path) = cache_path {
        if let Err(err) = persist_cache(path, &body) {
            tracing::debug!(path = %path.display(), error = %err, "failed to persist rdap bootstrap cache");
        }
    }

    tracing::debug!(url = src_url, tlds = bs.len(), "rdap bootstrap fetched");
    Ok(bs)
}

async fn fetch_bootstrap(http: &reqwest::Client, src_url: &str) -> Result<Vec<u8>, DothuntError> {
    let resp = http
        .get(src_url)
        .send()
        .await
        .map_err(|e| DothuntError::bootstrap(format!("fetch failed: {}", e)))?;

    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        return Err(DothuntError::bootstrap(format!(
            "http {}",
            status.as_u16()
        )));
    }

    let mut body = Vec::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DothuntError::bootstrap(format!("read failed: {}", e)))?;
        if body.len() + chunk.len() > MAX_BOOTSTRAP_BYTES {
            return Err(DothuntError::bootstrap("response exceeds 10 MiB cap"));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn cache_is_fresh(path: &Path, ttl: Duration) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    if ttl.is_zero() {
        return true;
    }
    match meta.modified() {
        Ok(modified) => match modified.elapsed() {
            Ok(age) => age <= ttl,
            // Future mtimes (clock skew) count as fresh.
            Err(_) => true,
        },
        Err(_) => false,
    }
}

fn read_cache(path: &Path) -> Option<Bootstrap> {
    let bytes = std::fs::read(path).ok()?;
    Bootstrap::parse(&bytes).ok()
}

/// Write-temp-then-rename so readers never observe a partial file.
fn persist_cache(path: &Path, body: &[u8]) -> Result<(), DothuntError> {
    let dir = path
        .parent()
        .ok_or_else(|| DothuntError::internal("cache path has no parent directory"))?;
    std::fs::create_dir_all(dir)
        .map_err(|e| DothuntError::internal(format!("create cache dir: {}", e)))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| DothuntError::internal(format!("create temp file: {}", e)))?;
    tmp.write_all(body)
        .map_err(|e| DothuntError::internal(format!("write temp file: {}", e)))?;
    tmp.persist(path)
        .map_err(|e| DothuntError::internal(format!("rename into place: {}", e)))?;
    Ok(())
}
