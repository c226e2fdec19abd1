//! # dothunt library
//!
//! Answers one question per input domain: is this name currently registered,
//! and if not, is it offered for sale by a configured registrar?
//!
//! The engine normalizes arbitrary user input into registrable ASCII names,
//! queries RDAP over HTTPS (service URLs discovered via the IANA bootstrap
//! registry, cached on disk), falls back to WHOIS over raw TCP with
//! per-server pacing and retry, and classifies the heterogeneous responses
//! into a three-valued status. Results can optionally be enriched with
//! buyability and pricing from a registrar API, and a deterministic label
//! generator expands free-text phrases into scored candidates for search.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dothunt_lib::{Checker, CheckerOptions, RdapClient, RdapOptions, WhoisClient, WhoisOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = Checker::new(CheckerOptions {
//!         rdap: Some(Arc::new(RdapClient::new(RdapOptions::default())?)),
//!         whois: Some(Arc::new(WhoisClient::new(WhoisOptions::default()))),
//!         ..CheckerOptions::default()
//!     });
//!
//!     let results = checker.check_domains(&["example.com".to_string()]).await;
//!     println!("{} -> {}", results[0].domain, results[0].status);
//!     Ok(())
//! }
//! ```
//!
//! Everything is best-effort: lookup failures land in the result's
//! diagnostic fields as `status = unknown` rather than aborting the batch.

pub use checker::{Checker, CheckerOptions};
pub use error::DothuntError;
pub use generate::{Candidate, GenerateOptions, Generator};
pub use normalize::{normalize, split_domain};
pub use protocols::bootstrap::{default_cache_dir, Bootstrap, DEFAULT_BOOTSTRAP_URL};
pub use protocols::rdap::{RdapClient, RdapEvidence, RdapOptions};
pub use protocols::whois::{WhoisClient, WhoisEvidence, WhoisOptions, IANA_WHOIS_SERVER};
pub use registrar::porkbun::{PorkbunClient, PorkbunOptions};
pub use registrar::{enrich_results, DomainCheck, RegistrarClient};
pub use types::{CheckMethod, Confidence, DomainResult, DomainStatus, RegistrarLimits};

mod checker;
mod error;
pub mod generate;
mod normalize;
mod protocols;
pub mod registrar;
mod types;

/// Convenience alias for fallible library operations.
pub type Result<T> = std::result::Result<T, DothuntError>;
