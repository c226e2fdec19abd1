//! The availability checker: per-domain NORM → RDAP → WHOIS pipeline with
//! bounded fan-out.
//!
//! Results come back in input order regardless of completion order, and the
//! output always has exactly one result per input. Lookup failures never
//! abort the run; they end up in the result's diagnostic fields.

use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use futures::StreamExt;

use crate::normalize::{normalize, split_domain};
use crate::protocols::rdap::RdapClient;
use crate::protocols::whois::WhoisClient;
use crate::types::{CheckMethod, DomainResult, DomainStatus};

/// Configuration for [`Checker`].
#[derive(Clone, Default)]
pub struct CheckerOptions {
    /// RDAP client; `None` skips RDAP entirely
    pub rdap: Option<Arc<RdapClient>>,
    /// WHOIS client; `None` skips the fallback
    pub whois: Option<Arc<WhoisClient>>,
    /// Disable the WHOIS fallback even when a client is configured
    pub no_whois: bool,
    /// Maximum concurrent per-domain pipelines
    pub concurrency: usize,
}

/// Checks a batch of inputs concurrently and assembles ordered results.
#[derive(Clone)]
pub struct Checker {
    opts: CheckerOptions,
}

impl Checker {
    pub fn new(mut opts: CheckerOptions) -> Self {
        if opts.concurrency == 0 {
            opts.concurrency = 16;
        }
        Self { opts }
    }

    /// Check every input, producing one result per input in input order.
    pub async fn check_domains(&self, inputs: &[String]) -> Vec<DomainResult> {
        let workers = self.opts.concurrency.max(1);

        let mut slots: Vec<Option<DomainResult>> = Vec::with_capacity(inputs.len());
        slots.resize_with(inputs.len(), || None);

        let mut stream = futures::stream::iter(inputs.iter().cloned().enumerate())
            .map(|(idx, input)| {
                let checker = self.clone();
                async move { (idx, checker.check_one(&input).await) }
            })
            .buffer_unordered(workers);

        while let Some((idx, result)) = stream.next().await {
            slots[idx] = Some(result);
        }

        slots.into_iter().flatten().collect()
    }

    /// Check a single input through the full pipeline.
    pub async fn check_one(&self, input: &str) -> DomainResult {
        let started = Instant::now();
        let mut r = DomainResult::pending(input);

        let ascii = match normalize(input) {
            Ok(ascii) => ascii,
            Err(err) => {
                r.domain = input.trim().to_string();
                r.error = Some(err.to_string());
                r.detail = Some("invalid input".to_string());
                return finish(r, started);
            }
        };

        r.domain = ascii.clone();
        let (label, tld) = split_domain(&ascii);
        r.label = non_empty(label);
        r.tld = non_empty(tld);
        if r.input.as_deref() == Some(ascii.as_str()) {
            r.input = None;
        }

        if let Some(rdap) = &self.opts.rdap {
            let ev = rdap.lookup_domain(&ascii).await;
            r.method = CheckMethod::Rdap;
            r.rdap_status = Some(ev.status.to_string());
            r.rdap_reason = non_empty(ev.reason.clone());
            r.rdap_url = ev.url.clone();
            r.rdap_http_status = ev.http_status;
            if let Some(err) = &ev.error {
                r.rdap_error = Some(err.to_string());
                if r.error.is_none() {
                    r.error = r.rdap_error.clone();
                }
            }
            if ev.status != DomainStatus::Unknown {
                r.status = ev.status;
                r.registered = Some(ev.status == DomainStatus::Taken);
                r.confidence = ev.confidence;
                r.detail = Some(ev.reason);
                r.error = None;
                return finish(r, started);
            }
        }

        if !self.opts.no_whois {
            if let Some(whois) = &self.opts.whois {
                let ev = whois.lookup_domain(&ascii).await;
                r.method = CheckMethod::Whois;
                r.whois_status = Some(ev.status.to_string());
                r.whois_reason = non_empty(ev.reason.clone());
                r.whois_server = ev.server.clone();
                r.whois_pattern = ev.pattern.clone();
                if let Some(err) = &ev.error {
                    r.whois_error = Some(err.to_string());
                    r.error = r.whois_error.clone();
                }
                if ev.status != DomainStatus::Unknown {
                    r.status = ev.status;
                    r.registered = Some(ev.status == DomainStatus::Taken);
                    r.confidence = ev.confidence;
                    r.detail = Some(ev.reason);
                    r.error = None;
                    return finish(r, started);
                }
            }
        }

        // Still unknown: summarize the per-method reasons on one line.
        r.detail = Some(
            match (r.rdap_reason.as_deref(), r.whois_reason.as_deref()) {
                (Some(rdap), Some(whois)) => format!("rdap: {}; whois: {}", rdap, whois),
                (Some(rdap), None) => format!("rdap: {}", rdap),
                (None, Some(whois)) => format!("whois: {}", whois),
                (None, None) => "lookup unavailable".to_string(),
            },
        );

        finish(r, started)
    }
}

fn finish(mut r: DomainResult, started: Instant) -> DomainResult {
    r.checked_at = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
    r.duration_ms = started.elapsed().as_millis() as i64;
    r
}

pub(crate) fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Confidence;

    fn offline_checker(concurrency: usize) -> Checker {
        Checker::new(CheckerOptions {
            rdap: None,
            whois: None,
            no_whois: true,
            concurrency,
        })
    }

    #[tokio::test]
    async fn output_matches_input_length_and_order() {
        let inputs: Vec<String> = (0..20).map(|i| format!("name-{}.example", i)).collect();
        let results = offline_checker(4).check_domains(&inputs).await;

        assert_eq!(results.len(), inputs.len());
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.domain, format!("name-{}.example", i));
        }
    }

    #[tokio::test]
    async fn invalid_input_is_reported_not_dropped() {
        let inputs = vec![
            "localhost".to_string(),
            " ".to_string(),
            "ok.example".to_string(),
        ];
        let results = offline_checker(2).check_domains(&inputs).await;

        assert_eq!(results.len(), 3);
        for r in &results[..2] {
            assert_eq!(r.status, DomainStatus::Unknown);
            assert_eq!(r.method, CheckMethod::None);
            assert_eq!(r.detail.as_deref(), Some("invalid input"));
            assert!(r.error.is_some());
        }
        assert_eq!(results[2].detail.as_deref(), Some("lookup unavailable"));
        assert!(results[2].error.is_none());
    }

    #[tokio::test]
    async fn normalized_fields_are_populated() {
        let results = offline_checker(1)
            .check_domains(&[" HTTPS://Sub.Example.COM/path ".to_string()])
            .await;

        let r = &results[0];
        assert_eq!(r.domain, "sub.example.com");
        assert_eq!(r.label.as_deref(), Some("sub.example"));
        assert_eq!(r.tld.as_deref(), Some("com"));
        assert_eq!(r.input.as_deref(), Some("HTTPS://Sub.Example.COM/path"));
        assert_eq!(r.confidence, Confidence::Low);
        assert!(r.duration_ms >= 0);
        assert!(r.checked_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn input_omitted_when_already_normalized() {
        let results = offline_checker(1)
            .check_domains(&["example.com".to_string()])
            .await;
        assert!(results[0].input.is_none());
    }
}
