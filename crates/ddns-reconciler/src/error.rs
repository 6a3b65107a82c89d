//! Error types for the DDNS reconciler
//!
//! Errors fall into two classes:
//! - **Batch-fatal** ([`Error::MissingParameters`], [`Error::NoValidAddress`],
//!   [`Error::AuthenticationFailed`]): reported once, no domain is processed.
//! - **Per-domain**: everything else. These are absorbed into the
//!   [`BatchReport`](crate::engine::BatchReport) and never stop the batch.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// Credential or domain list missing from the request
    #[error("Parameter(s) missing or invalid")]
    MissingParameters,

    /// Neither candidate address passed validation
    #[error("Neither IPv4 nor IPv6 available.")]
    NoValidAddress,

    /// The provider rejected the credential during the capability probe
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Domain name has fewer than two labels (or an empty label)
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// No active zone matches the domain's last two labels
    #[error("Could not determine zone id for '{0}'")]
    ZoneNotFound(String),

    /// Existing records for a domain could not be listed
    #[error("Could not list records for '{name}': {message}")]
    RecordLookupFailed {
        /// Domain name
        name: String,
        /// Underlying provider message
        message: String,
    },

    /// More than one record of the requested type exists for a name
    #[error("Found {count} {record_type} records for '{name}', refusing to pick one")]
    AmbiguousRecord {
        /// Domain name
        name: String,
        /// Record type ("A" or "AAAA")
        record_type: &'static str,
        /// Number of matching records
        count: usize,
    },

    /// The provider rejected a create or update call
    #[error("Could not {action} {record_type} record for '{name}': {message}")]
    RecordWriteFailed {
        /// "create" or "update"
        action: &'static str,
        /// Domain name
        name: String,
        /// Record type ("A" or "AAAA")
        record_type: &'static str,
        /// Underlying provider message
        message: String,
    },

    /// Record absent where the update-only variant requires one
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    /// Create an invalid domain error
    pub fn invalid_domain(domain: impl Into<String>) -> Self {
        Self::InvalidDomain(domain.into())
    }

    /// Create a zone-not-found error
    pub fn zone_not_found(domain: impl Into<String>) -> Self {
        Self::ZoneNotFound(domain.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole batch instead of a single domain
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingParameters | Self::NoValidAddress | Self::AuthenticationFailed(_)
        )
    }
}
