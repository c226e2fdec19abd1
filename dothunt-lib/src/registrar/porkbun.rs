//! Porkbun registrar client.
//!
//! Porkbun's `checkDomain` endpoint reports availability-to-buy, pricing,
//! and the caller's current rate-limit budget. The budget is advisory and
//! changes per response, so the client paces itself adaptively: a mutex-
//! guarded reservation clock spaces out request starts, and successful
//! responses that carry `TTL`/`limit` raise the spacing monotonically.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use percent_encoding::utf8_percent_encode;
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::error::DothuntError;
use crate::protocols::rdap::PATH_SEGMENT;
use crate::registrar::{DomainCheck, RegistrarClient};
use crate::types::RegistrarLimits;

/// Porkbun JSON API v3.
pub const DEFAULT_BASE_URL: &str = "https://api.porkbun.com/api/json/v3";

const MAX_RESPONSE_BYTES: usize = 1 << 20;
const MAX_DYNAMIC_DELAY: Duration = Duration::from_secs(5);

/// Configuration for [`PorkbunClient`].
#[derive(Debug, Clone)]
pub struct PorkbunOptions {
    pub api_key: String,
    pub secret_api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Floor for the gap between request starts
    pub min_delay: Duration,
    /// In-flight request cap across the whole client
    pub max_concurrent: usize,
    pub user_agent: String,
}

impl Default for PorkbunOptions {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(8),
            min_delay: Duration::from_millis(200),
            max_concurrent: 2,
            user_agent: "dothunt/registrar-porkbun".to_string(),
        }
    }
}

#[derive(Debug)]
struct PaceState {
    next_request_at: tokio::time::Instant,
    dynamic_min_delay: Duration,
}

/// Porkbun API client with client-side adaptive pacing.
#[derive(Debug)]
pub struct PorkbunClient {
    opts: PorkbunOptions,
    http: reqwest::Client,
    sem: Semaphore,
    pace: Mutex<PaceState>,
}

impl PorkbunClient {
    pub fn new(mut opts: PorkbunOptions) -> Result<Self, DothuntError> {
        opts.api_key = opts.api_key.trim().to_string();
        opts.secret_api_key = opts.secret_api_key.trim().to_string();
        if opts.api_key.is_empty() || opts.secret_api_key.is_empty() {
            return Err(DothuntError::config(
                "missing porkbun api keys (set PORKBUN_API_KEY and PORKBUN_SECRET_API_KEY)",
            ));
        }
        if opts.base_url.is_empty() {
            opts.base_url = DEFAULT_BASE_URL.to_string();
        }
        if opts.timeout.is_zero() {
            opts.timeout = Duration::from_secs(8);
        }
        if opts.min_delay.is_zero() {
            opts.min_delay = Duration::from_millis(200);
        }
        if opts.max_concurrent == 0 {
            opts.max_concurrent = 2;
        }

        let http = reqwest::Client::builder()
            .timeout(opts.timeout)
            .build()
            .map_err(|e| {
                DothuntError::network_with_source(
                    "failed to build porkbun http client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            sem: Semaphore::new(opts.max_concurrent),
            pace: Mutex::new(PaceState {
                next_request_at: tokio::time::Instant::now(),
                dynamic_min_delay: Duration::ZERO,
            }),
            opts,
            http,
        })
    }

    /// Reserve a start slot and sleep until it.
    async fn throttle(&self) -> Result<(), DothuntError> {
        let scheduled = {
            let mut pace = self
                .pace
                .lock()
                .map_err(|_| DothuntError::internal("porkbun pacing lock poisoned"))?;

            let min_delay = std::cmp::max(self.opts.min_delay, pace.dynamic_min_delay);
            let now = tokio::time::Instant::now();
            let scheduled = std::cmp::max(now, pace.next_request_at);
            pace.next_request_at = scheduled + min_delay;
            scheduled
        };
        tokio::time::sleep_until(scheduled).await;
        Ok(())
    }

    /// Raise the pacing floor from a provider-reported budget, never lowering
    /// it, capped so one odd response cannot stall a bulk run.
    fn update_dynamic_delay(&self, limits: &RegistrarLimits) {
        if limits.ttl_seconds <= 0 || limits.limit <= 0 {
            return;
        }
        let per = Duration::from_secs_f64(limits.ttl_seconds as f64 / limits.limit as f64);
        if per.is_zero() {
            return;
        }
        let per = std::cmp::min(per, MAX_DYNAMIC_DELAY);

        if let Ok(mut pace) = self.pace.lock() {
            if per > pace.dynamic_min_delay {
                tracing::debug!(delay_ms = per.as_millis() as u64, "porkbun pacing raised");
                pace.dynamic_min_delay = per;
            }
        }
    }
}

#[async_trait]
impl RegistrarClient for PorkbunClient {
    fn name(&self) -> &str {
        "porkbun"
    }

    async fn check_domain(&self, domain: &str) -> Result<DomainCheck, DothuntError> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(DothuntError::registrar("porkbun", "empty domain"));
        }

        let _permit = self
            .sem
            .acquire()
            .await
            .map_err(|_| DothuntError::internal("porkbun semaphore closed"))?;

        self.throttle().await?;

        let url = format!(
            "{}/domain/checkDomain/{}",
            self.opts.base_url.trim_end_matches('/'),
            utf8_percent_encode(domain, PATH_SEGMENT)
        );

        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, &self.opts.user_agent)
            .json(&serde_json::json!({
                "apikey": self.opts.api_key,
                "secretapikey": self.opts.secret_api_key,
            }))
            .send()
            .await
            .map_err(DothuntError::from)?;

        let status = resp.status().as_u16();
        let body = read_capped(resp).await?;

        if status != 200 {
            let text = String::from_utf8_lossy(&body);
            return Err(DothuntError::registrar(
                "porkbun",
                format!("http {}: {}", status, text.trim()),
            ));
        }

        let decoded: CheckDomainResponse = serde_json::from_slice(&body)
            .map_err(|e| DothuntError::registrar("porkbun", format!("decode error: {}", e)))?;

        if !decoded.status.eq_ignore_ascii_case("success") {
            let msg = decoded.message.trim();
            let msg = if msg.is_empty() { "unknown error" } else { msg };
            return Err(DothuntError::registrar("porkbun", msg));
        }

        let mut check = DomainCheck {
            buyable: yes_no(&decoded.response.avail),
            premium: yes_no(&decoded.response.premium),
            price: decoded.response.price.trim().to_string(),
            regular_price: decoded.response.regular_price.trim().to_string(),
            currency: String::new(),
            min_duration: decoded.response.min_duration,
            first_year_promo: yes_no(&decoded.response.first_year_promo),
            limits: None,
        };

        if let Some(limits) = decoded.limits.and_then(parse_limits) {
            self.update_dynamic_delay(&limits);
            check.limits = Some(limits);
        }

        Ok(check)
    }
}

async fn read_capped(resp: reqwest::Response) -> Result<Vec<u8>, DothuntError> {
    let mut body = Vec::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(DothuntError::from)?;
        if body.len() + chunk.len() > MAX_RESPONSE_BYTES {
            return Err(DothuntError::registrar(
                "porkbun",
                "response exceeds 1 MiB cap",
            ));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[derive(Deserialize)]
struct CheckDomainResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    response: CheckDomainPayload,
    #[serde(default)]
    limits: Option<ApiLimits>,
}

#[derive(Deserialize, Default)]
struct CheckDomainPayload {
    #[serde(default)]
    avail: String,
    #[serde(default)]
    price: String,
    #[serde(default, rename = "regularPrice")]
    regular_price: String,
    #[serde(default)]
    premium: String,
    #[serde(default, rename = "minDuration")]
    min_duration: u32,
    #[serde(default, rename = "firstYearPromo")]
    first_year_promo: String,
}

#[derive(Deserialize, Default)]
struct ApiLimits {
    #[serde(default, rename = "TTL")]
    ttl: String,
    #[serde(default)]
    limit: String,
    #[serde(default)]
    used: i64,
    #[serde(default, rename = "naturalLanguage")]
    natural_language: String,
}

fn parse_limits(raw: ApiLimits) -> Option<RegistrarLimits> {
    let ttl = raw.ttl.trim().parse::<i64>().unwrap_or(0);
    let limit = raw.limit.trim().parse::<i64>().unwrap_or(0);
    let natural_language = raw.natural_language.trim().to_string();
    if ttl == 0 && limit == 0 && raw.used == 0 && natural_language.is_empty() {
        return None;
    }
    Some(RegistrarLimits {
        ttl_seconds: ttl,
        limit,
        used: raw.used,
        natural_language,
    })
}

/// Porkbun booleans arrive as strings.
fn yes_no(s: &str) -> bool {
    matches!(s.trim().to_lowercase().as_str(), "yes" | "true" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: String) -> PorkbunClient {
        PorkbunClient::new(PorkbunOptions {
            api_key: "pk".to_string(),
            secret_api_key: "sk".to_string(),
            base_url,
            timeout: Duration::from_secs(2),
            min_delay: Duration::from_millis(1),
            ..PorkbunOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn yes_no_accepted_forms() {
        for s in ["yes", "YES", " true ", "1"] {
            assert!(yes_no(s), "{:?}", s);
        }
        for s in ["no", "false", "0", "", "2"] {
            assert!(!yes_no(s), "{:?}", s);
        }
    }

    #[test]
    fn missing_keys_is_a_config_error() {
        let err = PorkbunClient::new(PorkbunOptions::default()).unwrap_err();
        assert!(err.to_string().contains("PORKBUN_API_KEY"));
    }

    #[test]
    fn parse_limits_requires_content() {
        assert!(parse_limits(ApiLimits::default()).is_none());

        let limits = parse_limits(ApiLimits {
            ttl: "10".to_string(),
            limit: "100".to_string(),
            used: 1,
            natural_language: "example".to_string(),
        })
        .unwrap();
        assert_eq!(limits.ttl_seconds, 10);
        assert_eq!(limits.limit, 100);
        assert_eq!(limits.used, 1);
        assert_eq!(limits.natural_language, "example");
    }

    #[tokio::test]
    async fn success_response_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/domain/checkDomain/example.com"))
            .and(body_json(serde_json::json!({
                "apikey": "pk",
                "secretapikey": "sk",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "SUCCESS",
                "response": {
                    "avail": "yes",
                    "price": "10.29",
                    "premium": "no",
                    "minDuration": 1,
                    "firstYearPromo": "no"
                },
                "limits": {
                    "TTL": "10",
                    "limit": "100",
                    "used": 1,
                    "naturalLanguage": "example"
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let check = client.check_domain("example.com").await.unwrap();

        assert!(check.buyable);
        assert!(!check.premium);
        assert_eq!(check.price, "10.29");
        assert_eq!(check.min_duration, 1);
        assert!(!check.first_year_promo);
        let limits = check.limits.unwrap();
        assert_eq!((limits.ttl_seconds, limits.limit, limits.used), (10, 100, 1));
        assert_eq!(limits.natural_language, "example");
    }

    #[tokio::test]
    async fn error_status_surfaces_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ERROR",
                "message": "nope"
            })))
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let err = client.check_domain("example.com").await.unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn non_200_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let err = client.check_domain("example.com").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("http 403"));
        assert!(msg.contains("forbidden"));
    }

    #[tokio::test]
    async fn dynamic_delay_rises_monotonically_and_is_capped() {
        let server = MockServer::start().await;
        let client = client_for(server.uri());

        client.update_dynamic_delay(&RegistrarLimits {
            ttl_seconds: 10,
            limit: 100,
            ..RegistrarLimits::default()
        });
        assert_eq!(
            client.pace.lock().unwrap().dynamic_min_delay,
            Duration::from_millis(100)
        );

        // Lower budgets never reduce the delay.
        client.update_dynamic_delay(&RegistrarLimits {
            ttl_seconds: 1,
            limit: 100,
            ..RegistrarLimits::default()
        });
        assert_eq!(
            client.pace.lock().unwrap().dynamic_min_delay,
            Duration::from_millis(100)
        );

        // Extreme budgets are capped at 5 s.
        client.update_dynamic_delay(&RegistrarLimits {
            ttl_seconds: 600,
            limit: 2,
            ..RegistrarLimits::default()
        });
        assert_eq!(
            client.pace.lock().unwrap().dynamic_min_delay,
            Duration::from_secs(5)
        );
    }
}
