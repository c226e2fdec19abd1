//! Registrar enrichment: can this domain actually be bought, and for what?
//!
//! Availability from RDAP/WHOIS says whether a name is registered; a
//! registrar says whether it is purchasable right now and at what price.
//! Enrichment is a second, optional fan-out over already-checked results,
//! driven by a caller-supplied predicate.

pub mod porkbun;

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use crate::checker::non_empty;
use crate::error::DothuntError;
use crate::types::{DomainResult, RegistrarLimits};

/// A registrar that can report buyability and pricing for a domain.
#[async_trait]
pub trait RegistrarClient: Send + Sync {
    /// Short provider identifier, e.g. `porkbun`.
    fn name(&self) -> &str;

    /// Query the registrar for one domain.
    async fn check_domain(&self, domain: &str) -> Result<DomainCheck, DothuntError>;
}

/// Decoded registrar answer for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainCheck {
    pub buyable: bool,
    pub premium: bool,
    /// Price for the minimum duration (usually one year)
    pub price: String,
    /// Non-promo price when the registrar distinguishes one
    pub regular_price: String,
    pub currency: String,
    /// Minimum registration period in years
    pub min_duration: u32,
    pub first_year_promo: bool,
    /// Provider rate-limit details when the response carries them
    pub limits: Option<RegistrarLimits>,
}

/// Decorate selected results with registrar data, in place.
///
/// Results without a domain or with a recorded lookup error are skipped.
/// On success the decoded fields overwrite any previous enrichment and
/// `registrar_error` is cleared; on failure only `registrar` and
/// `registrar_error` are touched.
pub async fn enrich_results<F>(
    registrar: Arc<dyn RegistrarClient>,
    concurrency: usize,
    results: &mut [DomainResult],
    should_check: F,
) where
    F: Fn(&DomainResult) -> bool,
{
    let name = registrar.name().to_string();

    let jobs: Vec<(usize, String)> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.domain.is_empty() && r.error.is_none() && should_check(r))
        .map(|(idx, r)| (idx, r.domain.clone()))
        .collect();

    let mut stream = futures::stream::iter(jobs)
        .map(|(idx, domain)| {
            let registrar = Arc::clone(&registrar);
            async move { (idx, registrar.check_domain(&domain).await) }
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((idx, outcome)) = stream.next().await {
        let r = &mut results[idx];
        r.registrar = Some(name.clone());
        match outcome {
            Ok(check) => {
                r.buyable = Some(check.buyable);
                r.premium = Some(check.premium);
                r.price = non_empty(check.price);
                r.regular_price = non_empty(check.regular_price);
                r.currency = non_empty(check.currency);
                r.min_duration = (check.min_duration != 0).then_some(check.min_duration);
                r.first_year_promo = Some(check.first_year_promo);
                r.registrar_limits = check.limits;
                r.registrar_error = None;
            }
            Err(err) => {
                r.registrar_error = Some(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CheckMethod, Confidence, DomainStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeRegistrar {
        calls: AtomicUsize,
        fail_domain: Option<String>,
    }

    #[async_trait]
    impl RegistrarClient for FakeRegistrar {
        fn name(&self) -> &str {
            "fake"
        }

        async fn check_domain(&self, domain: &str) -> Result<DomainCheck, DothuntError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_domain.as_deref() == Some(domain) {
                return Err(DothuntError::registrar("fake", "boom"));
            }
            Ok(DomainCheck {
                buyable: true,
                premium: false,
                price: "10.29".to_string(),
                min_duration: 1,
                ..DomainCheck::default()
            })
        }
    }

    fn result_with(domain: &str, status: DomainStatus) -> DomainResult {
        let mut r = DomainResult::pending(domain);
        r.input = None;
        r.domain = domain.to_string();
        r.status = status;
        r.method = CheckMethod::Rdap;
        r.confidence = Confidence::High;
        r
    }

    #[tokio::test]
    async fn enriches_only_selected_results() {
        let registrar = Arc::new(FakeRegistrar {
            calls: AtomicUsize::new(0),
            fail_domain: None,
        });
        let mut results = vec![
            result_with("free.com", DomainStatus::Available),
            result_with("busy.com", DomainStatus::Taken),
        ];

        enrich_results(registrar.clone(), 2, &mut results, |r| {
            r.status == DomainStatus::Available
        })
        .await;

        assert_eq!(registrar.calls.load(Ordering::SeqCst), 1);
        assert_eq!(results[0].registrar.as_deref(), Some("fake"));
        assert_eq!(results[0].buyable, Some(true));
        assert_eq!(results[0].premium, Some(false));
        assert_eq!(results[0].price.as_deref(), Some("10.29"));
        assert_eq!(results[0].min_duration, Some(1));
        assert!(results[1].registrar.is_none());
        assert!(results[1].buyable.is_none());
    }

    #[tokio::test]
    async fn skips_errored_and_empty_results() {
        let registrar = Arc::new(FakeRegistrar {
            calls: AtomicUsize::new(0),
            fail_domain: None,
        });

        let mut errored = result_with("broken.com", DomainStatus::Unknown);
        errored.error = Some("lookup failed".to_string());
        let mut empty = result_with("", DomainStatus::Unknown);
        empty.domain = String::new();

        let mut results = vec![errored, empty];
        enrich_results(registrar.clone(), 2, &mut results, |_| true).await;

        assert_eq!(registrar.calls.load(Ordering::SeqCst), 0);
        assert!(results.iter().all(|r| r.registrar.is_none()));
    }

    #[tokio::test]
    async fn errors_touch_only_registrar_fields() {
        let registrar = Arc::new(FakeRegistrar {
            calls: AtomicUsize::new(0),
            fail_domain: Some("free.com".to_string()),
        });
        let mut results = vec![result_with("free.com", DomainStatus::Available)];

        enrich_results(registrar, 1, &mut results, |_| true).await;

        let r = &results[0];
        assert_eq!(r.registrar.as_deref(), Some("fake"));
        assert!(r.registrar_error.as_deref().unwrap().contains("boom"));
        assert!(r.buyable.is_none());
        assert!(r.price.is_none());
    }
}
