//! WHOIS fallback over raw TCP port 43.
//!
//! WHOIS servers are fragile: most rate-limit aggressively, some drop
//! connections under mild concurrency, and responses are free-form text.
//! The client therefore serializes traffic per server (bounded concurrency
//! plus a minimum inter-request delay), retries transient failures with
//! capped exponential backoff, and classifies response text into a
//! three-valued status with the matched pattern recorded for diagnostics.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;

use crate::error::DothuntError;
use crate::normalize::last_label;
use crate::types::{Confidence, DomainStatus};

/// Registry of the root WHOIS database used for server discovery.
pub const IANA_WHOIS_SERVER: &str = "whois.iana.org";

const WHOIS_PORT: u16 = 43;
const MAX_RESPONSE_BYTES: u64 = 1 << 20;
const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Not-found needles checked, in order, against the lowercased body.
const NOT_FOUND_PATTERNS: &[(&str, &str)] = &[
    ("no match for", "no_match_for"),
    ("no data found", "no_data_found"),
    ("no entries found", "no_entries_found"),
    ("domain not found", "domain_not_found"),
    ("no such domain", "no_such_domain"),
    ("status: free", "status_free"),
    ("not found", "not_found"),
];

/// Configuration for [`WhoisClient`].
#[derive(Debug, Clone)]
pub struct WhoisOptions {
    /// Per-attempt timeout covering dial, write and read
    pub timeout: Duration,
    /// Server used for TLD-to-server discovery
    pub iana_server: String,
    /// In-flight request cap per WHOIS server
    pub max_concurrent_per_server: usize,
    /// Minimum gap between request starts against one server
    pub min_delay_per_server: Duration,
    /// Additional attempts after the first; 0 means exactly one attempt
    pub retries: u32,
    /// Initial retry backoff, doubled per attempt up to a 2 s cap
    pub backoff: Duration,
}

impl Default for WhoisOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            iana_server: IANA_WHOIS_SERVER.to_string(),
            max_concurrent_per_server: 1,
            min_delay_per_server: Duration::from_millis(250),
            retries: 2,
            backoff: Duration::from_millis(250),
        }
    }
}

/// What one WHOIS lookup saw. A non-unknown status is terminal for WHOIS.
#[derive(Debug, Clone)]
pub struct WhoisEvidence {
    pub status: DomainStatus,
    pub confidence: Confidence,
    pub reason: String,
    pub server: Option<String>,
    pub pattern: Option<String>,
    pub error: Option<DothuntError>,
}

impl WhoisEvidence {
    fn unknown(reason: impl Into<String>, error: Option<DothuntError>) -> Self {
        Self {
            status: DomainStatus::Unknown,
            confidence: Confidence::Low,
            reason: reason.into(),
            server: None,
            pattern: None,
            error,
        }
    }
}

/// Per-server pacing state: a concurrency permit plus the earliest instant
/// the next request may start.
struct ServerState {
    sem: Semaphore,
    next_start: Mutex<tokio::time::Instant>,
}

#[derive(Default)]
struct Caches {
    tld_to_server: HashMap<String, String>,
    server_state: HashMap<String, Arc<ServerState>>,
}

/// WHOIS client with per-client TLD-to-server and pacing caches.
pub struct WhoisClient {
    opts: WhoisOptions,
    caches: Mutex<Caches>,
}

impl WhoisClient {
    pub fn new(opts: WhoisOptions) -> Self {
        Self {
            opts,
            caches: Mutex::new(Caches::default()),
        }
    }

    /// Discover the authoritative server for the domain's TLD, query it, and
    /// classify the response.
    pub async fn lookup_domain(&self, domain: &str) -> WhoisEvidence {
        let tld = last_label(domain);
        if tld.is_empty() {
            return WhoisEvidence::unknown(
                "invalid domain",
                Some(DothuntError::invalid_domain(domain, "missing tld")),
            );
        }

        let server = match self.server_for_tld(tld).await {
            Ok(server) => server,
            Err(err) => return WhoisEvidence::unknown("no whois server", Some(err)),
        };

        let body = match self.query(&server, domain).await {
            Ok(body) => body,
            Err(err) => {
                let mut ev = WhoisEvidence::unknown("whois query failed", Some(err));
                ev.server = Some(server);
                return ev;
            }
        };

        let (status, pattern) = classify(domain, &body);
        match status {
            DomainStatus::Available => WhoisEvidence {
                status,
                confidence: Confidence::Medium,
                reason: "whois not-found pattern".to_string(),
                server: Some(server),
                pattern,
                error: None,
            },
            DomainStatus::Taken => WhoisEvidence {
                status,
                confidence: Confidence::Medium,
                reason: "whois record found".to_string(),
                server: Some(server),
                pattern,
                error: None,
            },
            DomainStatus::Unknown => {
                let mut ev = WhoisEvidence::unknown("whois ambiguous", None);
                ev.server = Some(server);
                ev
            }
        }
    }

    /// Resolve and cache the authoritative WHOIS server for a TLD by asking
    /// the IANA root database.
    async fn server_for_tld(&self, tld: &str) -> Result<String, DothuntError> {
        let tld = tld.trim().to_lowercase();
        if tld.is_empty() {
            return Err(DothuntError::whois(tld, "empty tld"));
        }

        {
            let caches = self.lock_caches()?;
            if let Some(server) = caches.tld_to_server.get(&tld) {
                if !server.is_empty() {
                    return Ok(server.clone());
                }
            }
        }

        let iana = self.opts.iana_server.clone();
        let body = self.query(&iana, &tld).await?;

        match parse_iana_response(&body) {
            Some(server) => {
                tracing::debug!(tld = %tld, server = %server, "whois server discovered");
                let mut caches = self.lock_caches()?;
                caches.tld_to_server.insert(tld, server.clone());
                Ok(server)
            }
            None => Err(DothuntError::whois(
                tld.clone(),
                format!("whois server not found for tld {:?}", tld),
            )),
        }
    }

    /// Query a server with retries for transient failures.
    async fn query(&self, server: &str, q: &str) -> Result<String, DothuntError> {
        let attempts = self.opts.retries.saturating_add(1);
        let mut backoff = if self.opts.backoff.is_zero() {
            Duration::from_millis(250)
        } else {
            self.opts.backoff
        };

        let mut last_err = DothuntError::whois(q, "no attempts made");
        for attempt in 0..attempts {
            match self.query_once(server, q).await {
                Ok(body) => return Ok(body),
                Err(err) => {
                    let retry = attempt + 1 < attempts && is_retryable(&err);
                    tracing::debug!(
                        server = server,
                        query = q,
                        attempt = attempt + 1,
                        retry,
                        error = %err,
                        "whois attempt failed"
                    );
                    last_err = err;
                    if !retry {
                        break;
                    }
                }
            }
            tokio::time::sleep(backoff).await;
            backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
        }

        Err(last_err)
    }

    /// One paced attempt: reserve a start slot, sleep until it, then dial,
    /// send `<query>\r\n`, and read up to 1 MiB.
    ///
    /// The pacing sleep happens before the timeout clock starts, so waiting
    /// in line is never charged against the attempt.
    async fn query_once(&self, server: &str, q: &str) -> Result<String, DothuntError> {
        let state = self.state_for(server)?;

        let _permit = state
            .sem
            .acquire()
            .await
            .map_err(|_| DothuntError::internal("whois semaphore closed"))?;

        if !self.opts.min_delay_per_server.is_zero() {
            let scheduled = {
                let mut next = state
                    .next_start
                    .lock()
                    .map_err(|_| DothuntError::internal("whois pacing lock poisoned"))?;
                let now = tokio::time::Instant::now();
                let scheduled = if now < *next { *next } else { now };
                *next = scheduled + self.opts.min_delay_per_server;
                scheduled
            };
            tokio::time::sleep_until(scheduled).await;
        }

        let (host, port) = host_port(server);
        let io = tokio::time::timeout(self.opts.timeout, async {
            let mut stream = TcpStream::connect((host, port)).await?;
            stream.write_all(q.as_bytes()).await?;
            stream.write_all(b"\r\n").await?;

            let mut body = Vec::new();
            stream.take(MAX_RESPONSE_BYTES).read_to_end(&mut body).await?;
            Ok::<_, std::io::Error>(body)
        })
        .await;

        match io {
            Err(_) => Err(DothuntError::timeout("whois query", self.opts.timeout)),
            Ok(Err(err)) => Err(err.into()),
            Ok(Ok(body)) => Ok(String::from_utf8_lossy(&body).into_owned()),
        }
    }

    fn state_for(&self, server: &str) -> Result<Arc<ServerState>, DothuntError> {
        let mut caches = self.lock_caches()?;
        let state = caches
            .server_state
            .entry(server.to_string())
            .or_insert_with(|| {
                Arc::new(ServerState {
                    sem: Semaphore::new(self.opts.max_concurrent_per_server.max(1)),
                    next_start: Mutex::new(tokio::time::Instant::now()),
                })
            });
        Ok(Arc::clone(state))
    }

    fn lock_caches(&self) -> Result<std::sync::MutexGuard<'_, Caches>, DothuntError> {
        self.caches
            .lock()
            .map_err(|_| DothuntError::internal("whois cache lock poisoned"))
    }
}

/// First `whois:` header wins; its value is the first whitespace token.
fn parse_iana_response(body: &str) -> Option<String> {
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(prefix) = line.get(..6) else {
            continue;
        };
        if prefix.eq_ignore_ascii_case("whois:") {
            if let Some(server) = line[6..].split_whitespace().next() {
                return Some(server.to_string());
            }
        }
    }
    None
}

/// Classify a WHOIS response body for `domain` into a status plus the
/// pattern that matched.
///
/// Needles run against the lowercased body; the exact-name regexes run
/// against the original-case body because some registries spell the label
/// uppercase in their records.
pub(crate) fn classify(domain: &str, body: &str) -> (DomainStatus, Option<String>) {
    let lower = body.to_lowercase();
    for (needle, pattern) in NOT_FOUND_PATTERNS {
        if lower.contains(needle) {
            return (DomainStatus::Available, Some((*pattern).to_string()));
        }
    }

    // A record line explicitly naming the domain.
    let escaped = regex::escape(domain);
    for pattern in [
        format!(r"(?im)^domain name:\s*{}\s*$", escaped),
        format!(r"(?im)^domain:\s*{}\s*$", escaped),
        format!(r"(?im)^domain\s*:\s*{}\s*$", escaped),
    ] {
        if let Ok(re) = Regex::new(&pattern) {
            if re.is_match(body) {
                return (DomainStatus::Taken, Some(pattern));
            }
        }
    }

    if lower.contains("domain name:") || lower.contains("registrar:") {
        return (
            DomainStatus::Taken,
            Some("heuristic_record_fields".to_string()),
        );
    }

    (DomainStatus::Unknown, None)
}

fn is_retryable(err: &DothuntError) -> bool {
    if err.is_timeout() {
        return true;
    }
    let msg = err.to_string().to_lowercase();
    msg.contains("timed out")
        || msg.contains("connection reset")
        || msg.contains("broken pipe")
        || msg.contains("unexpected eof")
}

/// Accept `host` (default WHOIS port) or `host:port` server strings.
fn host_port(server: &str) -> (&str, u16) {
    if let Some((host, port)) = server.rsplit_once(':') {
        if let Ok(port) = port.parse::<u16>() {
            return (host, port);
        }
    }
    (server, WHOIS_PORT)
}
