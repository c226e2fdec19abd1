//! Core data types for domain availability checking.
//!
//! The central type is [`DomainResult`], the unit of output for every checked
//! domain. Optional fields use `Option` and are omitted from serialized
//! output when absent, so NDJSON consumers only ever see fields that carry
//! information.

use serde::{Deserialize, Serialize};

/// Three-valued availability status of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    Available,
    Taken,
    Unknown,
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainStatus::Available => write!(f, "available"),
            DomainStatus::Taken => write!(f, "taken"),
            DomainStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Transport that produced (or last attempted to produce) the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMethod {
    Rdap,
    Whois,
    None,
}

impl std::fmt::Display for CheckMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckMethod::Rdap => write!(f, "rdap"),
            CheckMethod::Whois => write!(f, "whois"),
            CheckMethod::None => write!(f, "none"),
        }
    }
}

/// How much to trust a status answer.
///
/// RDAP status codes are definitive (`high`); WHOIS text classification is
/// `medium`; anything inferred from errors or silence is `low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// Provider-reported rate limit details, when the registrar returns them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrarLimits {
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub ttl_seconds: i64,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub limit: i64,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub used: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub natural_language: String,
}

fn is_zero_i64(n: &i64) -> bool {
    *n == 0
}

/// Result of checking one input domain.
///
/// Built by the availability checker, optionally decorated by a registrar
/// enricher, then emitted; not mutated afterwards. The `rdap_*` and `whois_*`
/// groups record what each transport saw and are most useful when `status`
/// is `unknown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainResult {
    /// Raw user input, omitted when it already equals `domain`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Search phrase that produced this candidate (search mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,

    /// Generator score for this candidate (search mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,

    /// ASCII domain after normalization (empty if normalization failed)
    pub domain: String,

    /// Everything before the final dot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// The final label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tld: Option<String>,

    pub status: DomainStatus,

    /// Derived from `status`: `Some(false)` for available, `Some(true)` for
    /// taken, `None` when unknown. Never collapsed to a plain bool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<bool>,

    pub method: CheckMethod,
    pub confidence: Confidence,

    /// Single-line human summary of how the status was determined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Surfaced error message, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// RFC3339 nanosecond UTC timestamp taken when the check finished
    pub checked_at: String,

    /// Wall-clock duration of the check, from a monotonic clock
    pub duration_ms: i64,

    // RDAP diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdap_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdap_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdap_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdap_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdap_http_status: Option<u16>,

    // WHOIS diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_pattern: Option<String>,

    // Registrar enrichment (present only when a registrar client ran)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_year_promo: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar_limits: Option<RegistrarLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar_error: Option<String>,
}

impl DomainResult {
    /// A result skeleton before any lookup has run.
    pub(crate) fn pending(input: &str) -> Self {
        Self {
            input: Some(input.trim().to_string()),
            phrase: None,
            score: None,
            domain: String::new(),
            label: None,
            tld: None,
            status: DomainStatus::Unknown,
            registered: None,
            method: CheckMethod::None,
            confidence: Confidence::Low,
            detail: None,
            error: None,
            checked_at: String::new(),
            duration_ms: 0,
            rdap_status: None,
            rdap_reason: None,
            rdap_error: None,
            rdap_url: None,
            rdap_http_status: None,
            whois_status: None,
            whois_reason: None,
            whois_error: None,
            whois_server: None,
            whois_pattern: None,
            registrar: None,
            buyable: None,
            premium: None,
            price: None,
            regular_price: None,
            currency: None,
            min_duration: None,
            first_year_promo: None,
            registrar_limits: None,
            registrar_error: None,
        }
    }

    /// True when the result carries any registrar data worth displaying.
    pub fn has_registrar_data(&self) -> bool {
        self.buyable.is_some()
            || self.premium.is_some()
            || self.price.is_some()
            || self.registrar.is_some()
    }
}
