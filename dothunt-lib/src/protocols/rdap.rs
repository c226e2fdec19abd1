//! RDAP (Registration Data Access Protocol) lookups.
//!
//! RDAP is tried before WHOIS because its answers are unambiguous: a 200 on
//! `/domain/<name>` means the domain exists, a 404 means it does not. The
//! response body is never interpreted, only drained; the status code is the
//! whole signal.

use std::path::PathBuf;
use std::time::Duration;

use futures::StreamExt;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::DothuntError;
use crate::normalize::last_label;
use crate::protocols::bootstrap::{
    default_cache_dir, load_bootstrap, Bootstrap, CACHE_FILE, DEFAULT_BOOTSTRAP_URL,
};
use crate::types::{Confidence, DomainStatus};

/// Characters escaped when a domain is placed into a URL path segment.
pub(crate) const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// How much of an RDAP body to drain before dropping the connection.
const BODY_DRAIN_CAP: usize = 512;

/// Configuration for [`RdapClient`].
#[derive(Debug, Clone)]
pub struct RdapOptions {
    /// Where to fetch the IANA bootstrap registry from
    pub bootstrap_url: String,
    /// Directory for the on-disk bootstrap cache; `None` disables caching
    pub cache_dir: Option<PathBuf>,
    /// Maximum age of the on-disk cache before it is refreshed
    pub cache_ttl: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for RdapOptions {
    fn default() -> Self {
        Self {
            bootstrap_url: DEFAULT_BOOTSTRAP_URL.to_string(),
            cache_dir: default_cache_dir(),
            cache_ttl: Duration::from_secs(7 * 24 * 3600),
            timeout: Duration::from_secs(8),
        }
    }
}

/// What one RDAP lookup saw. A non-unknown status is terminal for RDAP.
#[derive(Debug, Clone)]
pub struct RdapEvidence {
    pub status: DomainStatus,
    pub confidence: Confidence,
    pub reason: String,
    pub url: Option<String>,
    pub http_status: Option<u16>,
    pub error: Option<DothuntError>,
}

impl RdapEvidence {
    fn unknown(reason: impl Into<String>, error: Option<DothuntError>) -> Self {
        Self {
            status: DomainStatus::Unknown,
            confidence: Confidence::Low,
            reason: reason.into(),
            url: None,
            http_status: None,
            error,
        }
    }
}

/// RDAP client with a lazily acquired, per-client bootstrap registry.
pub struct RdapClient {
    opts: RdapOptions,
    http: reqwest::Client,
    bootstrap: tokio::sync::OnceCell<Bootstrap>,
}

impl RdapClient {
    pub fn new(opts: RdapOptions) -> Result<Self, DothuntError> {
        let http = reqwest::Client::builder()
            .timeout(opts.timeout)
            .build()
            .map_err(|e| {
                DothuntError::network_with_source("failed to build rdap http client", e.to_string())
            })?;
        Ok(Self {
            opts,
            http,
            bootstrap: tokio::sync::OnceCell::new(),
        })
    }

    /// Look up a domain against every candidate RDAP service for its TLD.
    ///
    /// The first definitive answer wins; if every candidate is inconclusive
    /// the evidence reports the last error seen.
    pub async fn lookup_domain(&self, domain: &str) -> RdapEvidence {
        let tld = last_label(domain);
        if tld.is_empty() {
            return RdapEvidence::unknown(
                "invalid domain",
                Some(DothuntError::invalid_domain(domain, "missing tld")),
            );
        }

        let bootstrap = match self.bootstrap().await {
            Ok(bs) => bs,
            Err(err) => {
                return RdapEvidence::unknown("rdap bootstrap unavailable", Some(err));
            }
        };

        let urls = bootstrap.urls_for_tld(tld);
        if urls.is_empty() {
            return RdapEvidence::unknown("no rdap service for tld", None);
        }

        let mut last_err = None;
        for base in urls {
            let ev = self.lookup_one(base, domain).await;
            if ev.status != DomainStatus::Unknown {
                return ev;
            }
            if let Some(err) = ev.error {
                last_err = Some(err);
            }
        }

        RdapEvidence::unknown("rdap lookup failed", last_err)
    }

    async fn lookup_one(&self, base: &str, domain: &str) -> RdapEvidence {
        let rdap_url = format!(
            "{}/domain/{}",
            base.trim_end_matches('/'),
            utf8_percent_encode(domain, PATH_SEGMENT)
        );
        tracing::debug!(url = %rdap_url, "rdap lookup");

        let resp = match self
            .http
            .get(&rdap_url)
            .header(
                reqwest::header::ACCEPT,
                "application/rdap+json, application/json",
            )
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                let mut ev = RdapEvidence::unknown("network error", Some(err.into()));
                ev.url = Some(rdap_url);
                return ev;
            }
        };

        let code = resp.status().as_u16();
        drain_body(resp).await;

        match code {
            200 => RdapEvidence {
                status: DomainStatus::Taken,
                confidence: Confidence::High,
                reason: "rdap 200".to_string(),
                url: Some(rdap_url),
                http_status: Some(code),
                error: None,
            },
            404 => RdapEvidence {
                status: DomainStatus::Available,
                confidence: Confidence::High,
                reason: "rdap 404".to_string(),
                url: Some(rdap_url),
                http_status: Some(code),
                error: None,
            },
            _ => RdapEvidence {
                status: DomainStatus::Unknown,
                confidence: Confidence::Low,
                reason: format!("rdap http {}", code),
                url: Some(rdap_url),
                http_status: Some(code),
                error: Some(DothuntError::rdap_with_status(
                    domain,
                    format!("rdap http {}", code),
                    code,
                )),
            },
        }
    }

    async fn bootstrap(&self) -> Result<&Bootstrap, DothuntError> {
        self.bootstrap
            .get_or_try_init(|| {
                let cache_path = self.opts.cache_dir.as_ref().map(|d| d.join(CACHE_FILE));
                async move {
                    load_bootstrap(
                        &self.http,
                        &self.opts.bootstrap_url,
                        cache_path.as_deref(),
                        self.opts.cache_ttl,
                    )
                    .await
                }
            })
            .await
    }
}

/// Read and discard a small prefix of the body so the connection can be
/// reused, then drop the rest.
async fn drain_body(resp: reqwest::Response) {
    let mut drained = 0usize;
    let mut stream = resp.bytes_stream();
    while let Some(Ok(chunk)) = stream.next().await {
        drained += chunk.len();
        if drained >= BODY_DRAIN_CAP {
            break;
        }
    }
}
