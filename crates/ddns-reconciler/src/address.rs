// # Address Validation
//
// Syntactic checks for candidate IPv4/IPv6 strings supplied by the caller.
//
// Both checks are deliberately shallow: the provider is the final authority
// on what it accepts, so `999.1.1.1` passes here and is rejected (if at all)
// by the provider's own validation. Candidates are kept as strings so the
// record content written is exactly what the caller sent, and comparisons
// against existing records are plain string equality.

use serde::{Deserialize, Serialize};
use std::fmt;

/// DNS address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    #[serde(rename = "A")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Parse a provider-reported type; anything other than A/AAAA is `None`
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "A" => Some(RecordType::A),
            "AAAA" => Some(RecordType::Aaaa),
            _ => None,
        }
    }

    /// Human name of the address family
    pub fn family(&self) -> &'static str {
        match self {
            RecordType::A => "ipv4",
            RecordType::Aaaa => "ipv6",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept four dot-separated groups of 1-3 decimal digits.
///
/// Octets are not range-checked.
pub fn validate_ipv4(candidate: &str) -> Option<&str> {
    let mut groups = 0;
    for group in candidate.split('.') {
        groups += 1;
        if group.is_empty() || group.len() > 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    (groups == 4).then_some(candidate)
}

/// Accept a non-empty string made only of hex digits and colons.
pub fn validate_ipv6(candidate: &str) -> Option<&str> {
    let valid = !candidate.is_empty()
        && candidate
            .bytes()
            .all(|b| b.is_ascii_hexdigit() || b == b':');

    valid.then_some(candidate)
}

/// The validated addresses of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSet {
    /// Validated IPv4 candidate
    pub ipv4: Option<String>,
    /// Validated IPv6 candidate
    pub ipv6: Option<String>,
}

impl AddressSet {
    /// Build a set from raw candidates, silently dropping invalid ones
    pub fn from_candidates(ipv4: Option<&str>, ipv6: Option<&str>) -> Self {
        Self {
            ipv4: ipv4.and_then(validate_ipv4).map(str::to_string),
            ipv6: ipv6.and_then(validate_ipv6).map(str::to_string),
        }
    }

    /// True when neither family has a usable address
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_none() && self.ipv6.is_none()
    }

    /// Present addresses paired with their record type, A before AAAA
    pub fn entries(&self) -> impl Iterator<Item = (RecordType, &str)> {
        let v4 = self.ipv4.as_deref().map(|ip| (RecordType::A, ip));
        let v6 = self.ipv6.as_deref().map(|ip| (RecordType::Aaaa, ip));
        v4.into_iter().chain(v6)
    }
}
