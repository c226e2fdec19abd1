//! Turning arbitrary user input into an ASCII registrable domain name.
//!
//! Agents and humans paste URLs, host:port pairs, uppercase names, names with
//! trailing dots, and internationalized names. [`normalize`] is intentionally
//! permissive about the wrapping and strict about the result: whatever comes
//! out is a lowercase ASCII name that a registry lookup (RDAP or WHOIS) will
//! accept, or a distinct error explaining the rejection.

use crate::error::DothuntError;

/// Normalize user input into an ASCII domain name suitable for registry
/// lookups.
///
/// Deterministic and side-effect free; `normalize(normalize(x))` equals
/// `normalize(x)` for any accepted input.
pub fn normalize(input: &str) -> Result<String, DothuntError> {
    let mut s = input.trim().to_string();
    if s.is_empty() {
        return Err(DothuntError::invalid_domain(input, "empty domain"));
    }

    // Full URLs (or things that look like them): keep only the host.
    if s.contains("://") {
        if let Ok(parsed) = url::Url::parse(&s) {
            if let Some(host) = parsed.host_str() {
                s = host.to_string();
            }
        }
    }

    // Strip path-ish suffixes.
    if let Some(i) = s.find(['/', '?', '#']) {
        s.truncate(i);
    }

    // Strip a trailing :port (best effort; the common "example.com:443" case).
    if let Some(i) = s.rfind(':') {
        if i > 0 && i < s.len() - 1 && s[i + 1..].bytes().all(|b| b.is_ascii_digit()) {
            s.truncate(i);
        }
    }

    let s = s.trim_end_matches('.').trim().to_lowercase();
    if s.is_empty() {
        return Err(DothuntError::invalid_domain(input, "empty domain"));
    }

    let ascii = idna::domain_to_ascii(&s)
        .map_err(|e| DothuntError::invalid_domain(input, format!("idna: {}", e)))?;

    // Single-label names are not registrable domains.
    if !ascii.contains('.') {
        return Err(DothuntError::invalid_domain(
            input,
            "domain must contain a dot",
        ));
    }

    validate_ascii_domain(input, &ascii)?;

    Ok(ascii)
}

/// Split a normalized domain into (label, tld) on the final dot.
///
/// Returns empty strings when there is no interior dot.
pub fn split_domain(domain: &str) -> (String, String) {
    match domain.rfind('.') {
        Some(i) if i < domain.len() - 1 => (domain[..i].to_string(), domain[i + 1..].to_string()),
        _ => (String::new(), String::new()),
    }
}

/// The last label of a domain, or empty when there is none.
pub(crate) fn last_label(domain: &str) -> &str {
    match domain.rfind('.') {
        Some(i) if i < domain.len() - 1 => &domain[i + 1..],
        _ => "",
    }
}

/// Pragmatic validation for registrable ASCII names.
fn validate_ascii_domain(input: &str, s: &str) -> Result<(), DothuntError> {
    if s.len() > 253 {
        return Err(DothuntError::invalid_domain(input, "name exceeds 253 bytes"));
    }
    for label in s.split('.') {
        if label.is_empty() {
            return Err(DothuntError::invalid_domain(input, "empty label"));
        }
        if label.len() > 63 {
            return Err(DothuntError::invalid_domain(input, "label exceeds 63 bytes"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(DothuntError::invalid_domain(
                input,
                "label starts or ends with a hyphen",
            ));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(DothuntError::invalid_domain(
                input,
                "label contains characters outside [a-z0-9-]",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_input_reduces_to_host() {
        assert_eq!(
            normalize(" https://OpenAI.COM:443/foo?x ").unwrap(),
            "openai.com"
        );
        assert_eq!(normalize("http://example.com/path#frag").unwrap(), "example.com");
    }

    #[test]
    fn bare_host_forms() {
        assert_eq!(normalize("Example.COM.").unwrap(), "example.com");
        assert_eq!(normalize("example.com:8080").unwrap(), "example.com");
        assert_eq!(normalize("example.com?q=1").unwrap(), "example.com");
    }

    #[test]
    fn idn_converts_to_punycode() {
        assert_eq!(normalize("münchen.de").unwrap(), "xn--mnchen-3ya.de");
    }

    #[test]
    fn rejects_single_label() {
        assert!(normalize("localhost").is_err());
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(normalize("").is_err());
        assert!(normalize("   ").is_err());
        assert!(normalize(".").is_err());
        assert!(normalize("exa mple.com").is_err());
        assert!(normalize("-bad.com").is_err());
        assert!(normalize("bad-.com").is_err());
    }

    #[test]
    fn rejects_oversized_labels_and_names() {
        let long_label = format!("{}.com", "a".repeat(64));
        assert!(normalize(&long_label).is_err());

        let long_name = format!("{}.com", vec!["a".repeat(63); 4].join("."));
        assert!(long_name.len() > 253);
        assert!(normalize(&long_name).is_err());
    }

    #[test]
    fn idempotent_for_valid_inputs() {
        for input in ["https://OpenAI.COM:443/foo?x", "Example.Org.", "münchen.de"] {
            let once = normalize(input).unwrap();
            assert_eq!(normalize(&once).unwrap(), once);
        }
    }

    #[test]
    fn split_domain_takes_final_dot() {
        assert_eq!(
            split_domain("example.com"),
            ("example".to_string(), "com".to_string())
        );
        assert_eq!(
            split_domain("a.b.co.uk"),
            ("a.b.co".to_string(), "uk".to_string())
        );
        assert_eq!(split_domain("nodot"), (String::new(), String::new()));
    }
}
