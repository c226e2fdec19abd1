//! Protocol clients used to resolve domain availability.
//!
//! `rdap` is the primary source (definitive HTTP status codes), `whois` the
//! fallback (classified free-form text), and `bootstrap` supplies the IANA
//! TLD-to-RDAP-service mapping that `rdap` consumes.

pub mod bootstrap;
pub mod rdap;
pub mod whois;
