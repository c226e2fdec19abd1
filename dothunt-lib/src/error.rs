//! Error handling for domain availability operations.
//!
//! Lookup failures are normally folded into the diagnostic fields of a
//! [`DomainResult`](crate::types::DomainResult) and never abort a run; this
//! error type surfaces them to callers that want the cause, and carries the
//! fatal configuration/setup failures that do abort.

use std::fmt;
use std::time::Duration;

/// Main error type for the dothunt library.
#[derive(Debug, Clone)]
pub enum DothuntError {
    /// Input could not be normalized into a registrable domain name
    InvalidDomain { domain: String, reason: String },

    /// Network-level failures (connect, read, write)
    Network {
        message: String,
        source: Option<String>,
    },

    /// RDAP protocol failures, optionally with the HTTP status seen
    Rdap {
        domain: String,
        message: String,
        status: Option<u16>,
    },

    /// WHOIS protocol failures
    Whois { domain: String, message: String },

    /// IANA bootstrap registry acquisition or parse failures
    Bootstrap { message: String },

    /// Registrar API failures
    Registrar { provider: String, message: String },

    /// Malformed response bodies
    Parse { message: String },

    /// Invalid or missing configuration
    Config { message: String },

    /// An operation exceeded its deadline
    Timeout { operation: String, duration: Duration },

    /// Anything that does not fit the categories above
    Internal { message: String },
}

impl DothuntError {
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn rdap<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::Rdap {
            domain: domain.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn rdap_with_status<D: Into<String>, M: Into<String>>(
        domain: D,
        message: M,
        status: u16,
    ) -> Self {
        Self::Rdap {
            domain: domain.into(),
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn whois<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::Whois {
            domain: domain.into(),
            message: message.into(),
        }
    }

    pub fn bootstrap<M: Into<String>>(message: M) -> Self {
        Self::Bootstrap {
            message: message.into(),
        }
    }

    pub fn registrar<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        Self::Registrar {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for deadline-style failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl fmt::Display for DothuntError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "invalid domain {:?}: {}", domain, reason)
            }
            Self::Network { message, source } => match source {
                Some(source) => write!(f, "network error: {}: {}", message, source),
                None => write!(f, "network error: {}", message),
            },
            Self::Rdap {
                domain,
                message,
                status,
            } => match status {
                Some(code) => write!(f, "rdap {} (http {}): {}", domain, code, message),
                None => write!(f, "rdap {}: {}", domain, message),
            },
            Self::Whois { domain, message } => write!(f, "whois {}: {}", domain, message),
            Self::Bootstrap { message } => write!(f, "rdap bootstrap: {}", message),
            Self::Registrar { provider, message } => write!(f, "{}: {}", provider, message),
            Self::Parse { message } => write!(f, "parse error: {}", message),
            Self::Config { message } => write!(f, "configuration error: {}", message),
            Self::Timeout {
                operation,
                duration,
            } => write!(f, "{} timed out after {:?}", operation, duration),
            Self::Internal { message } => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for DothuntError {}

impl From<reqwest::Error> for DothuntError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("http request", Duration::ZERO)
        } else if err.is_connect() {
            Self::network_with_source("connection failed", err.to_string())
        } else {
            Self::network_with_source("http request failed", err.to_string())
        }
    }
}

impl From<std::io::Error> for DothuntError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::TimedOut {
            Self::timeout("i/o", Duration::ZERO)
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DothuntError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("json: {}", err))
    }
}
